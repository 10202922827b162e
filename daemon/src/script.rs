//! Call scripts: a JSON list of engine calls replayed in order.
//!
//! ```json
//! [
//!   { "caller": "0x…", "at": 1000, "call": { "transfer": { "to": "0x…", "amount": "100" } } },
//!   { "caller": "0x…", "at": 1010, "call": "claim" }
//! ]
//! ```
//!
//! Amounts are decimal strings in whole tokens ("12.5") and are scaled by the
//! deployment's decimals.

use anyhow::{anyhow, bail, Context};
use nxd_engine::{Engine, EngineError};
use nxd_types::{Address, Amount, CallContext, Timestamp, TransferId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    pub caller: Address,
    #[serde(default)]
    pub at: u64,
    pub call: Call,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Transfer { to: Address, amount: String },
    Approve { spender: Address, amount: String },
    TransferFrom { from: Address, to: Address, amount: String },
    Mint { to: Address, amount: String },
    Burn { amount: String },
    SetMinter { minter: Address, enabled: bool },
    TransferOwnership { new_owner: Address },
    Stake { amount: String },
    Unstake { amount: String },
    Claim,
    Checkpoint,
    FundRewards { amount: String },
    SetRewardRate { rate: u64 },
    BridgeLock { amount: String, destination_chain: u64, remote_recipient: String },
    BridgeConfirm { id: TransferId },
    BridgeRegisterInbound { id: TransferId, recipient: Address, amount: String },
    BridgeRelease { id: TransferId, recipient: Address, amount: String },
    BridgeRevert { id: TransferId },
    SetBridgeOperator { operator: Address },
    Resume,
}

/// What happened to one step.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<nxd_engine::ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn parse(json: &str) -> anyhow::Result<Vec<Step>> {
    serde_json::from_str(json).context("invalid call script")
}

/// Scale a decimal token string ("12", "0.25") to raw units.
pub fn parse_tokens(s: &str, decimals: u8) -> anyhow::Result<Amount> {
    let (whole, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if frac.len() > usize::from(decimals) {
        bail!("amount {s} has more than {decimals} decimal places");
    }
    let digits = format!("{whole}{frac:0<width$}", width = usize::from(decimals));
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("amount {s} is not a decimal number");
    }
    let raw: u128 = digits
        .parse()
        .map_err(|_| anyhow!("amount {s} does not fit in 128 bits"))?;
    Ok(Amount::new(raw))
}

fn parse_recipient(hex_str: &str) -> anyhow::Result<[u8; 32]> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = hex::decode(digits).with_context(|| format!("remote recipient {hex_str}"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("remote recipient must be 32 bytes"))
}

/// Run one step. Script errors (bad amounts) abort the replay; engine
/// rejections are reported in the outcome.
pub fn apply(engine: &mut Engine, index: usize, step: &Step) -> anyhow::Result<Outcome> {
    let ctx = CallContext::new(step.caller, Timestamp::new(step.at));
    let decimals = engine.ledger().decimals();
    let tokens = |s: &str| parse_tokens(s, decimals).with_context(|| format!("step {index}"));

    let result: Result<Option<String>, EngineError> = match &step.call {
        Call::Transfer { to, amount } => engine.transfer(&ctx, to, tokens(amount)?).map(|_| None),
        Call::Approve { spender, amount } => {
            engine.approve(&ctx, spender, tokens(amount)?).map(|_| None)
        }
        Call::TransferFrom { from, to, amount } => engine
            .transfer_from(&ctx, from, to, tokens(amount)?)
            .map(|_| None),
        Call::Mint { to, amount } => engine.mint(&ctx, to, tokens(amount)?).map(|_| None),
        Call::Burn { amount } => engine.burn(&ctx, tokens(amount)?).map(|_| None),
        Call::SetMinter { minter, enabled } => engine
            .set_minter(&ctx, minter, *enabled)
            .map(|changed| Some(changed.to_string())),
        Call::TransferOwnership { new_owner } => {
            engine.transfer_ownership(&ctx, new_owner).map(|_| None)
        }
        Call::Stake { amount } => engine.stake(&ctx, tokens(amount)?).map(|_| None),
        Call::Unstake { amount } => engine
            .unstake(&ctx, tokens(amount)?)
            .map(|r| Some(r.total().to_string())),
        Call::Claim => engine.claim(&ctx).map(|paid| Some(paid.to_string())),
        Call::Checkpoint => engine.checkpoint(&ctx).map(|c| Some(c.to_string())),
        Call::FundRewards { amount } => engine.fund_rewards(&ctx, tokens(amount)?).map(|_| None),
        Call::SetRewardRate { rate } => engine
            .set_reward_rate(&ctx, u128::from(*rate))
            .map(|_| None),
        Call::BridgeLock {
            amount,
            destination_chain,
            remote_recipient,
        } => engine
            .bridge_lock(
                &ctx,
                tokens(amount)?,
                *destination_chain,
                parse_recipient(remote_recipient)?,
            )
            .map(|id| Some(id.to_string())),
        Call::BridgeConfirm { id } => engine.bridge_confirm(&ctx, id).map(|_| None),
        Call::BridgeRegisterInbound {
            id,
            recipient,
            amount,
        } => engine
            .bridge_register_inbound(&ctx, *id, recipient, tokens(amount)?)
            .map(|_| None),
        Call::BridgeRelease {
            id,
            recipient,
            amount,
        } => engine
            .bridge_release(&ctx, *id, recipient, tokens(amount)?)
            .map(|_| None),
        Call::BridgeRevert { id } => engine.bridge_revert(&ctx, id).map(|_| None),
        Call::SetBridgeOperator { operator } => {
            engine.set_bridge_operator(&ctx, operator).map(|_| None)
        }
        Call::Resume => engine.resume(&ctx).map(|_| None),
    };

    Ok(match result {
        Ok(result) => Outcome {
            step: index,
            ok: true,
            result,
            kind: None,
            error: None,
        },
        Err(err) => {
            tracing::warn!(step = index, caller = %step.caller, error = %err, "step rejected");
            Outcome {
                step: index,
                ok: false,
                result: None,
                kind: Some(err.kind()),
                error: Some(err.to_string()),
            }
        }
    })
}
