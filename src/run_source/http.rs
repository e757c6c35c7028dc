//! HTTP run source: SSE event streams over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{RunEventStream, RunInput, RunSource};
use crate::config::ClientConfig;
use crate::error::{ChatError, Result};
use crate::types::RunEvent;

/// Run source backed by the agent service's streaming endpoint.
#[derive(Debug, Clone)]
pub struct HttpRunSource {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpRunSource {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            if let Ok(val) = HeaderValue::from_str(key) {
                headers.insert("x-api-key", val);
            }
        }
        headers
    }

    fn run_body(&self, input: &RunInput) -> Value {
        let ctx = &input.context;
        json!({
            "assistant_id": self.config.assistant_id,
            "input": {
                "messages": [{"role": "user", "content": input.message}]
            },
            "config": {
                "configurable": {
                    "model": ctx.model,
                    "chain_id": ctx.chain_id,
                    "wallet_address": ctx.wallet_address,
                    "user_id": ctx.user_id,
                }
            },
            "stream_mode": ["events"],
        })
    }
}

#[async_trait]
impl RunSource for HttpRunSource {
    async fn open_run(&self, input: &RunInput, cancel: CancellationToken) -> Result<RunEventStream> {
        let url = format!(
            "{}/threads/{}/runs/stream",
            self.config.api_root(),
            input.thread_id
        );
        debug!(thread_id = %input.thread_id, "opening run stream");

        let request = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&self.run_body(input))
            .send();
        let resp = tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(futures::stream::empty().boxed());
            }
            resp = request => resp?,
        };

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            futures::pin_mut!(byte_stream);

            'read: loop {
                let chunk = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("run stream canceled");
                        break 'read;
                    }
                    chunk = byte_stream.next() => chunk,
                };
                let chunk = match chunk {
                    Some(Ok(c)) => c,
                    Some(Err(e)) => {
                        yield Err(ChatError::Network(e));
                        break 'read;
                    }
                    None => break 'read,
                };

                for frame in decoder.push(&chunk) {
                    if cancel.is_cancelled() {
                        debug!("run stream canceled");
                        break 'read;
                    }
                    match frame.event.as_deref() {
                        Some("end") => break 'read,
                        Some("metadata") => continue,
                        Some("error") => {
                            yield Err(ChatError::Stream(frame.data));
                            break 'read;
                        }
                        _ => {}
                    }
                    match RunEvent::from_json(&frame.data) {
                        Ok(Some(event)) => yield Ok(event),
                        Ok(None) => {}
                        Err(e) => debug!(error = %e, data = %frame.data, "skipping unparseable frame"),
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    async fn share_run(&self, run_id: &str) -> Result<String> {
        let url = format!("{}/runs/{}/share", self.config.api_root(), run_id);
        let resp = self
            .client
            .patch(&url)
            .headers(self.headers())
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &body));
        }
        let value: Value = serde_json::from_str(&body)?;
        share_url_from(&value, self.config.share_base_url.as_deref())
            .ok_or_else(|| ChatError::Stream(format!("share response has no link: {body}")))
    }
}

fn share_url_from(value: &Value, share_base_url: Option<&str>) -> Option<String> {
    if let Some(url) = ["url", "share_url"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
    {
        return Some(url.to_string());
    }
    let token = value.get("token").and_then(Value::as_str)?;
    let base = share_base_url?;
    Some(format!("{}/{}", base.trim_end_matches('/'), token))
}

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE decoder over raw body chunks.
///
/// Bytes are held until they form complete UTF-8, so a character split
/// across two network chunks decodes the same as an unsplit one.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    text: String,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);
        decode_utf8(&mut self.pending, &mut self.text);
        drain_frames(&mut self.text)
    }
}

/// Move the decodable prefix of `pending` into `out`. An incomplete trailing
/// sequence stays in `pending`; invalid bytes become U+FFFD.
fn decode_utf8(pending: &mut Vec<u8>, out: &mut String) {
    loop {
        match std::str::from_utf8(pending) {
            Ok(valid) => {
                out.push_str(valid);
                pending.clear();
                return;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    None => {
                        pending.drain(..valid);
                        return;
                    }
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + len);
                    }
                }
            }
        }
    }
}

/// Remove every complete frame (terminated by a blank line) from `buffer`.
pub(crate) fn drain_frames(buffer: &mut String) -> Vec<SseFrame> {
    let mut frames = Vec::new();
    let mut event: Option<String> = None;
    let mut data: Vec<String> = Vec::new();
    let mut consumed = 0;

    while let Some(line_end) = buffer[consumed..].find('\n') {
        let line = buffer[consumed..consumed + line_end].trim_end_matches('\r');
        if line.is_empty() {
            if !data.is_empty() {
                frames.push(SseFrame {
                    event: event.take(),
                    data: data.join("\n"),
                });
            }
            event = None;
            data.clear();
        } else if line.starts_with(':') {
            // comment / keep-alive
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else if let Some(value) = line.strip_prefix("event:") {
            event = Some(value.trim().to_string());
        }
        consumed += line_end + 1;
        if line.is_empty() {
            buffer.drain(..consumed);
            consumed = 0;
        }
    }
    frames
}

/// Map an HTTP error status to an error.
pub fn status_to_error(status: u16, body: &str) -> ChatError {
    match status {
        401 | 403 => ChatError::Authentication(body.to_string()),
        429 => ChatError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ChatError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("retry_after")
            .and_then(Value::as_f64)
            .map(|s| (s * 1000.0) as u64)
    })
}
