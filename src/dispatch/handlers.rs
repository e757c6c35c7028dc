//! Per-handler extraction logic.

use serde_json::{json, Value};

use super::payload::{as_tuple, field, PayloadError};
use super::{DispatchContext, DispatchError, Expansion, Mode};
use crate::classify::PHASES;
use crate::types::ConversationEntry;
use crate::wallet::{ChainId, Notice, SideEffect};

pub const SOURCE_LIST_ENTRY: &str = "source_list";
pub const APPROVE_ENTRY: &str = "generate_approve_erc20";
pub const EVM_TX_ENTRY: &str = "send_evm_transaction";
pub const SOLANA_TX_ENTRY: &str = "send_solana_transaction";

pub(super) fn passthrough(name: &str, id: &str, payload: Value) -> Expansion {
    Expansion::entry(ConversationEntry::tool(name, payload, id))
}

pub(super) fn unwrap_list(name: &str, id: &str, mut payload: Value) -> Expansion {
    let args = match payload.get_mut("list") {
        Some(list) => list.take(),
        None => {
            tracing::warn!(tool = name, "payload has no `list`; passing it through");
            payload
        }
    };
    Expansion::entry(ConversationEntry::tool(name, args, id))
}

/// History carries no partial state, so a replayed search also yields its
/// fan-out phases, already complete.
pub(super) fn source_list(name: &str, id: &str, payload: &Value, mode: Mode) -> Expansion {
    let sources = match payload.get("search_result") {
        Some(Value::Array(items)) => items.clone(),
        _ => {
            tracing::warn!(tool = name, "payload has no `search_result` array");
            Vec::new()
        }
    };
    let mut expansion = Expansion::entry(ConversationEntry::tool(
        SOURCE_LIST_ENTRY,
        json!({ "sources": sources }),
        id,
    ));
    if mode == Mode::Replay {
        for phase in PHASES {
            expansion.entries.push(ConversationEntry::progress(
                format!("{id}-{}", phase.start_node),
                phase.label,
                100,
            ));
        }
    }
    expansion
}

pub(super) fn switch_network(payload: &Value) -> Result<Expansion, DispatchError> {
    let (_, chain) = as_tuple(payload)?;
    let chain = ChainId::from_json(chain).ok_or(PayloadError::MissingField("chain"))?;
    Ok(Expansion {
        entries: Vec::new(),
        effects: vec![SideEffect::SwitchNetwork(chain)],
    })
}

pub(super) fn approve_erc20(
    tool: &str,
    id: &str,
    payload: &Value,
    ctx: &DispatchContext,
) -> Result<Expansion, DispatchError> {
    let (_, detail) = as_tuple(payload)?;
    let tx_data = field(detail, "txData", "tx_data").ok_or(PayloadError::MissingField("txData"))?;
    let tx_detail = field(detail, "tx_detail", "txDetail").cloned().unwrap_or(Value::Null);
    let target = field(&tx_detail, "chainId", "chain_id").and_then(ChainId::from_json);

    let mut expansion = Expansion::entry(ConversationEntry::tool(
        APPROVE_ENTRY,
        json!({
            "txData": tx_data,
            "name": display_name(detail, tool),
            "tx_detail": tx_detail,
        }),
        id,
    ));
    match (&ctx.connected_chain, target) {
        (None, _) => expansion.effects.push(SideEffect::Notify(Notice::ConnectWallet)),
        (Some(current), Some(target)) if *current != target => {
            expansion.effects.push(SideEffect::SwitchNetwork(target));
        }
        _ => {}
    }
    Ok(expansion)
}

pub(super) fn swap(
    tool: &str,
    id: &str,
    payload: &Value,
    ctx: &DispatchContext,
) -> Result<Expansion, DispatchError> {
    let (_, detail) = as_tuple(payload)?;
    if !detail.get("success").and_then(Value::as_bool).unwrap_or(false) {
        tracing::debug!(tool, "swap was not successful; nothing to sign");
        return Ok(Expansion::default());
    }
    let swap_data =
        field(detail, "swap_data", "swapData").ok_or(PayloadError::MissingField("swap_data"))?;
    let chain_type = swap_data
        .get("chain_type")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("chain_type"))?;
    let entry_name = match chain_type {
        "evm" => EVM_TX_ENTRY,
        "solana" => SOLANA_TX_ENTRY,
        other => return Err(DispatchError::UnsupportedChain(other.to_string())),
    };
    let order_info = field(swap_data, "orderInfo", "order_info")
        .or_else(|| field(detail, "orderInfo", "order_info"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut expansion = Expansion::entry(ConversationEntry::tool(
        entry_name,
        json!({
            "txData": field(swap_data, "txData", "tx_data").cloned().unwrap_or(Value::Null),
            "name": display_name(detail, tool),
            "orderInfo": order_info,
            "tx_detail": field(detail, "tx_detail", "txDetail").cloned().unwrap_or(Value::Null),
        }),
        id,
    ));
    if ctx.connected_chain.is_none() {
        expansion.effects.push(SideEffect::Notify(Notice::ConnectWallet));
    }
    Ok(expansion)
}

fn display_name(detail: &Value, tool: &str) -> Value {
    detail
        .get("name")
        .filter(|v| v.is_string())
        .cloned()
        .unwrap_or_else(|| Value::String(tool.to_string()))
}
