//! Wallet side effects requested by tool results.
//!
//! Switching networks and prompting the user belong to the UI shell. The
//! dispatcher only describes them; the live session executes them through a
//! [`WalletBridge`] before the next event is consumed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chain identifier as the agent reports it: a numeric EVM id (`"8453"`) or
/// a network name (`"solana"`).
///
/// EVM ids are kept in decimal, so the hex form wallets report (`"0x2105"`)
/// compares equal to the decimal one tools emit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into().trim().to_ascii_lowercase();
        let numeric = match id.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => id.parse::<u64>().ok(),
        };
        match numeric {
            Some(n) => Self(n.to_string()),
            None => Self(id),
        }
    }

    /// Accept either a JSON string or a JSON number.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::new(s)),
            Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-facing notices that need action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// A transaction is ready but no wallet network is connected.
    ConnectWallet,
}

/// A side effect requested while dispatching a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    SwitchNetwork(ChainId),
    Notify(Notice),
}

/// The UI shell's wallet integration.
pub trait WalletBridge: Send + Sync {
    /// Chain the wallet is connected to right now, if any.
    fn connected_chain(&self) -> Option<ChainId>;

    /// Ask the wallet to switch. Returns `true` if the switch took effect.
    fn switch_network(&self, chain: &ChainId) -> bool;

    fn notify(&self, notice: Notice);
}

/// Bridge for sessions without a wallet: nothing is connected and every
/// request is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWallet;

impl WalletBridge for NoWallet {
    fn connected_chain(&self) -> Option<ChainId> {
        None
    }

    fn switch_network(&self, chain: &ChainId) -> bool {
        tracing::debug!(chain = %chain, "no wallet bridge; network switch ignored");
        false
    }

    fn notify(&self, notice: Notice) {
        tracing::debug!(?notice, "no wallet bridge; notice ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_ids_normalize() {
        assert_eq!(ChainId::from_json(&json!(8453)), Some(ChainId::new("8453")));
        assert_eq!(ChainId::from_json(&json!(" Solana ")), Some(ChainId::new("solana")));
        assert_eq!(ChainId::from_json(&json!("")), None);
        assert_eq!(ChainId::from_json(&json!(null)), None);
    }

    #[test]
    fn hex_and_decimal_evm_ids_are_equal() {
        assert_eq!(ChainId::new("0x2105"), ChainId::new("8453"));
        assert_eq!(ChainId::new("0X1"), ChainId::new("1"));
        assert_eq!(ChainId::new("0x2105").as_str(), "8453");
        assert_eq!(ChainId::new("0xnotanumber").as_str(), "0xnotanumber");
        let parsed: ChainId = serde_json::from_value(json!("0x89")).unwrap();
        assert_eq!(parsed, ChainId::new("137"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("137"));
    }
}
