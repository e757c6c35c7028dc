//! Ordered conversation state and incremental assistant text.

use std::collections::{HashMap, HashSet};

use crate::progress::ProgressUpdate;
use crate::types::{ConversationEntry, ProgressEntry};

/// Owns the ordered entry list.
///
/// Assistant text for an id accumulates until that id is finalized; after
/// that, late or duplicate deltas for the id are dropped.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    entries: Vec<ConversationEntry>,
    index: HashMap<String, usize>,
    streaming: HashSet<String>,
    finalized: HashSet<String>,
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swap in a whole new conversation. Every id it contains is final.
    pub fn replace_all(&mut self, entries: Vec<ConversationEntry>) {
        self.index.clear();
        self.streaming.clear();
        self.finalized.clear();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(id) = entry.id() {
                self.index.insert(id.to_string(), i);
            }
            if let ConversationEntry::AssistantText { id, .. } = entry {
                self.finalized.insert(id.clone());
            }
        }
        self.entries = entries;
    }

    pub fn push(&mut self, entry: ConversationEntry) {
        if let Some(id) = entry.id() {
            self.index.insert(id.to_string(), self.entries.len());
        }
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = ConversationEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Append a text fragment for `message_id`. Returns `false` when the
    /// fragment was dropped.
    pub fn append_text(&mut self, message_id: &str, fragment: &str) -> bool {
        if fragment.is_empty() {
            return false;
        }
        if self.finalized.contains(message_id) {
            tracing::debug!(message_id, "dropping delta for finalized message");
            return false;
        }
        self.streaming.insert(message_id.to_string());
        match self.index.get(message_id).copied() {
            Some(i) => match &self.entries[i] {
                ConversationEntry::AssistantText { text, .. } => {
                    let mut joined = String::with_capacity(text.len() + fragment.len());
                    joined.push_str(text);
                    joined.push_str(fragment);
                    self.entries[i] = ConversationEntry::assistant(message_id, joined);
                }
                other => {
                    tracing::warn!(message_id, entry = ?other, "text delta collides with a non-text entry");
                    return false;
                }
            },
            None => self.push(ConversationEntry::assistant(message_id, fragment)),
        }
        true
    }

    /// Close every message that received text since the last call.
    pub fn finalize_streaming(&mut self) {
        self.finalized.extend(self.streaming.drain());
    }

    pub fn is_finalized(&self, message_id: &str) -> bool {
        self.finalized.contains(message_id)
    }

    pub fn apply_progress(&mut self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::Append(entry) => self.push(ConversationEntry::Progress(entry)),
            ProgressUpdate::Replace(entry) => self.replace_progress(entry),
        }
    }

    fn replace_progress(&mut self, entry: ProgressEntry) {
        match self.index.get(&entry.id).copied() {
            Some(i) => self.entries[i] = ConversationEntry::Progress(entry),
            None => {
                tracing::debug!(id = %entry.id, "progress entry vanished; appending");
                self.push(ConversationEntry::Progress(entry));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_id_accumulates_in_place() {
        let mut a = MessageAssembler::new();
        a.push(ConversationEntry::user("hi"));
        a.append_text("m1", "Hel");
        a.append_text("m1", "lo!");
        assert_eq!(
            a.entries(),
            &[
                ConversationEntry::user("hi"),
                ConversationEntry::assistant("m1", "Hello!")
            ]
        );
    }

    #[test]
    fn snapshots_are_unaffected_by_later_deltas() {
        let mut a = MessageAssembler::new();
        a.append_text("m1", "a");
        let before = a.snapshot();
        a.append_text("m1", "b");
        assert_eq!(before, vec![ConversationEntry::assistant("m1", "a")]);
        assert_eq!(a.entries()[0], ConversationEntry::assistant("m1", "ab"));
    }

    #[test]
    fn empty_fragment_creates_nothing() {
        let mut a = MessageAssembler::new();
        assert!(!a.append_text("m1", ""));
        assert!(a.is_empty());
    }

    #[test]
    fn finalized_ids_ignore_late_deltas() {
        let mut a = MessageAssembler::new();
        a.append_text("m1", "done");
        a.finalize_streaming();
        assert!(!a.append_text("m1", " again"));
        assert_eq!(a.entries(), &[ConversationEntry::assistant("m1", "done")]);
        assert!(a.append_text("m2", "next"));
    }

    #[test]
    fn replace_all_indexes_and_finalizes() {
        let mut a = MessageAssembler::new();
        a.replace_all(vec![
            ConversationEntry::user("q"),
            ConversationEntry::assistant("m1", "old"),
        ]);
        assert!(a.is_finalized("m1"));
        assert!(!a.append_text("m1", "x"));
        a.replace_all(Vec::new());
        assert!(a.append_text("m1", "x"));
    }

    #[test]
    fn progress_replaces_by_id() {
        let mut a = MessageAssembler::new();
        a.apply_progress(ProgressUpdate::Append(ProgressEntry {
            id: "p".into(),
            label: "Fetching links".into(),
            percent: 0,
        }));
        a.append_text("m1", "text");
        a.apply_progress(ProgressUpdate::Replace(ProgressEntry {
            id: "p".into(),
            label: "Fetching links".into(),
            percent: 50,
        }));
        assert_eq!(a.len(), 2);
        assert_eq!(a.entries()[0], ConversationEntry::progress("p", "Fetching links", 50));
    }
}
