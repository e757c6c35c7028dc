//! Tool name → handler table.

use std::collections::HashMap;
use std::sync::OnceLock;

use strum::Display;

/// How a tool's parsed payload becomes conversation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ToolHandler {
    /// The payload becomes one `ToolResult` entry as-is.
    Passthrough,
    /// Like `Passthrough`, but the real array sits under `list`.
    UnwrapList,
    /// Search/read tools: `search_result` becomes a `source_list` entry.
    SourceList,
    /// `[status, chain]`: switch the wallet network, no entry.
    SwitchNetwork,
    /// `[status, detail]`: an ERC-20 approval transaction.
    ApproveErc20,
    /// `[status, detail]`: a chain-specific swap transaction.
    Swap,
}

pub const PASSTHROUGH_TOOLS: &[&str] = &[
    "get_wallet_balance",
    "get_token_balance",
    "get_token_price",
    "get_token_info",
    "get_swap_quote",
    "get_block_info",
    "get_transaction_receipt",
    "get_gas_price",
    "get_portfolio",
    "connect_wallet",
    "send_native_token",
];

pub const LIST_TRANSACTIONS_TOOL: &str = "list_transaction_records";
pub const SEARCH_TOOLS: &[&str] = &["web_search", "read_links", "search_and_read"];
pub const SWITCH_NETWORK_TOOL: &str = "switch_network";
pub const APPROVE_TOOL: &str = "approve_erc20";
pub const SWAP_TOOL: &str = "swap_tokens";

/// Table of tools the dispatcher understands. Names outside the table are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTable {
    handlers: HashMap<String, ToolHandler>,
}

impl Default for ToolTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for name in PASSTHROUGH_TOOLS {
            table.insert(*name, ToolHandler::Passthrough);
        }
        table.insert(LIST_TRANSACTIONS_TOOL, ToolHandler::UnwrapList);
        for name in SEARCH_TOOLS {
            table.insert(*name, ToolHandler::SourceList);
        }
        table.insert(SWITCH_NETWORK_TOOL, ToolHandler::SwitchNetwork);
        table.insert(APPROVE_TOOL, ToolHandler::ApproveErc20);
        table.insert(SWAP_TOOL, ToolHandler::Swap);
        table
    }
}

impl ToolTable {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Shared instance of the built-in table.
    pub fn builtin() -> &'static ToolTable {
        static BUILTIN: OnceLock<ToolTable> = OnceLock::new();
        BUILTIN.get_or_init(ToolTable::default)
    }

    /// Register (or override) a tool.
    pub fn insert(&mut self, name: impl Into<String>, handler: ToolHandler) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn with(mut self, name: impl Into<String>, handler: ToolHandler) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<ToolHandler> {
        self.handlers.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_group() {
        let table = ToolTable::builtin();
        assert_eq!(table.get("get_gas_price"), Some(ToolHandler::Passthrough));
        assert_eq!(table.get("list_transaction_records"), Some(ToolHandler::UnwrapList));
        assert_eq!(table.get("read_links"), Some(ToolHandler::SourceList));
        assert_eq!(table.get("swap_tokens"), Some(ToolHandler::Swap));
        assert_eq!(table.get("unknown"), None);
    }

    #[test]
    fn adding_a_tool_is_an_insertion() {
        let table = ToolTable::default().with("get_nft_floor", ToolHandler::Passthrough);
        assert_eq!(table.get("get_nft_floor"), Some(ToolHandler::Passthrough));
        assert_eq!(ToolTable::builtin().get("get_nft_floor"), None);
    }

    #[test]
    fn handlers_display_in_snake_case() {
        assert_eq!(ToolHandler::SourceList.to_string(), "source_list");
        assert_eq!(ToolHandler::UnwrapList.to_string(), "unwrap_list");
    }
}
