use base64::{prelude::BASE64_STANDARD, Engine};
use borsh::{BorshDeserialize, BorshSerialize};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    address::Address, math::ifixed_point::IFixedPoint, state::position::PositionHealth,
};

#[repr(u8)]
#[derive(
    Clone, Copy, Debug, PartialEq, BorshSerialize, BorshDeserialize, IntoPrimitive, TryFromPrimitive,
)]
#[borsh(use_discriminant = true)]
pub enum CauldronEventTag {
    Accrue = 0,
    ExchangeRateUpdated = 1,
    Borrow = 2,
    Repay = 3,
    AddCollateral = 4,
    WithdrawCollateral = 5,
    RewardsPaid = 6,
    Liquidate = 7,
    LiquidationSettled = 8,
    WithdrawFees = 9,
    ConfigUpdated = 10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AccrueEvent {
    pub market: Address,
    pub interest: u64,
    /// Total debt after accrual
    pub total_elastic: u64,
    pub fees_earned: u64,
    pub unix_timestamp: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ExchangeRateEvent {
    pub market: Address,
    pub previous_rate: IFixedPoint,
    pub rate: IFixedPoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct BorrowEvent {
    pub market: Address,
    pub borrower: Address,
    pub recipient: Address,
    pub amount: u64,
    pub opening_fee: u64,
    pub base: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RepayEvent {
    pub market: Address,
    pub payer: Address,
    pub account: Address,
    pub base: u64,
    pub amount: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CollateralEvent {
    pub market: Address,
    pub from: Address,
    pub to: Address,
    /// Collateral ledger units credited or debited
    pub amount: u64,
    /// Token actually moved and its amount
    pub token: Address,
    pub token_amount: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RewardEvent {
    pub market: Address,
    pub account: Address,
    pub token: Address,
    pub amount: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LiquidateEvent {
    pub market: Address,
    pub liquidator: Address,
    pub account: Address,
    pub health_before_liquidation: PositionHealth,
    pub principal: u64,
    pub debt_repaid: u64,
    pub liquidation_fee: u64,
    pub collateral_seized: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LiquidationSettledEvent {
    pub market: Address,
    pub liquidator: Address,
    pub recipient: Address,
    pub accounts_liquidated: u32,
    pub total_principal: u64,
    pub total_debt_repaid: u64,
    pub total_collateral_seized: u64,
    pub sold_collateral: bool,
    pub swap_output: u64,
    pub top_up: u64,
    pub protocol_cut: u64,
    pub to_recipient: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct WithdrawFeesEvent {
    pub market: Address,
    pub fee_to: Address,
    pub amount: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ConfigUpdatedEvent {
    pub market: Address,
    pub max_ltv: IFixedPoint,
    pub liquidation_fee: IFixedPoint,
    pub fee_to: Address,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "event")
)]
pub enum CauldronEvent {
    Accrue(AccrueEvent),
    ExchangeRateUpdated(ExchangeRateEvent),
    Borrow(BorrowEvent),
    Repay(RepayEvent),
    AddCollateral(CollateralEvent),
    WithdrawCollateral(CollateralEvent),
    RewardsPaid(RewardEvent),
    Liquidate(LiquidateEvent),
    LiquidationSettled(LiquidationSettledEvent),
    WithdrawFees(WithdrawFeesEvent),
    ConfigUpdated(ConfigUpdatedEvent),
}

impl CauldronEvent {
    pub fn tag(&self) -> CauldronEventTag {
        match self {
            CauldronEvent::Accrue(_) => CauldronEventTag::Accrue,
            CauldronEvent::ExchangeRateUpdated(_) => CauldronEventTag::ExchangeRateUpdated,
            CauldronEvent::Borrow(_) => CauldronEventTag::Borrow,
            CauldronEvent::Repay(_) => CauldronEventTag::Repay,
            CauldronEvent::AddCollateral(_) => CauldronEventTag::AddCollateral,
            CauldronEvent::WithdrawCollateral(_) => CauldronEventTag::WithdrawCollateral,
            CauldronEvent::RewardsPaid(_) => CauldronEventTag::RewardsPaid,
            CauldronEvent::Liquidate(_) => CauldronEventTag::Liquidate,
            CauldronEvent::LiquidationSettled(_) => CauldronEventTag::LiquidationSettled,
            CauldronEvent::WithdrawFees(_) => CauldronEventTag::WithdrawFees,
            CauldronEvent::ConfigUpdated(_) => CauldronEventTag::ConfigUpdated,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<CauldronEvent> {
        CauldronEvent::try_from_slice(bytes).ok()
    }

    /// Renders the event as base64 log lines between start and end markers.
    pub fn to_log_lines(&self) -> Vec<String> {
        let mut bytes = Vec::with_capacity(MAX_EVENT_SIZE);
        if let Err(err) = self.serialize(&mut bytes) {
            tracing::error!("Failed to serialize event {:?}: {}", self.tag(), err);
            return Vec::new();
        }
        let mut lines = Vec::with_capacity(2 + bytes.len() / MAX_EVENT_SIZE + 1);
        lines.push(EVENT_START_PREFFIX.to_string());
        lines.extend(
            bytes
                .chunks(MAX_EVENT_SIZE)
                .map(|chunk| BASE64_STANDARD.encode(chunk)),
        );
        lines.push(EVENT_END_PREFFIX.to_string());
        lines
    }
}

const EVENT_START_PREFFIX: &str = "event_start";
const EVENT_END_PREFFIX: &str = "event_end";

pub const MAX_EVENT_SIZE_CHAR: usize = 255;
pub const MAX_EVENT_SIZE: usize = MAX_EVENT_SIZE_CHAR * 3 / 4;

pub fn event_chunks(logs: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut current_chunk = Vec::new();
    let mut inside_log = false;
    for log in logs {
        let log = log.as_ref();
        if log.starts_with(EVENT_START_PREFFIX) {
            if !current_chunk.is_empty() {
                tracing::warn!("Invalid log sequence, unclosed event found, event will be discarded");
            }
            current_chunk = Vec::with_capacity(MAX_EVENT_SIZE);
            inside_log = true;
        } else if log.starts_with(EVENT_END_PREFFIX) {
            if !current_chunk.is_empty() {
                chunks.push(current_chunk);
                current_chunk = Vec::with_capacity(MAX_EVENT_SIZE);
            }
            inside_log = false;
        } else if inside_log {
            match BASE64_STANDARD.decode(log) {
                Ok(data) => current_chunk.extend(data),
                Err(_) => {
                    tracing::warn!("Invalid base64 in event log, event will be discarded");
                    current_chunk.clear();
                    inside_log = false;
                }
            }
        }
    }
    chunks
}

#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CauldronEvents {
    pub events: Vec<CauldronEvent>,
}

impl CauldronEvents {
    pub fn from_logs(logs: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let events_bytes = event_chunks(logs);
        let mut events = Vec::with_capacity(events_bytes.len());
        for bytes in events_bytes {
            if let Some(event) = CauldronEvent::from_bytes(&bytes) {
                events.push(event);
            }
        }
        CauldronEvents { events }
    }

    pub fn to_logs(&self) -> Vec<String> {
        self.events
            .iter()
            .flat_map(CauldronEvent::to_log_lines)
            .collect()
    }
}

impl BorshSerialize for CauldronEvent {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> Result<(), std::io::Error> {
        self.tag().serialize(writer)?;
        match self {
            CauldronEvent::Accrue(event) => event.serialize(writer),
            CauldronEvent::ExchangeRateUpdated(event) => event.serialize(writer),
            CauldronEvent::Borrow(event) => event.serialize(writer),
            CauldronEvent::Repay(event) => event.serialize(writer),
            CauldronEvent::AddCollateral(event) => event.serialize(writer),
            CauldronEvent::WithdrawCollateral(event) => event.serialize(writer),
            CauldronEvent::RewardsPaid(event) => event.serialize(writer),
            CauldronEvent::Liquidate(event) => event.serialize(writer),
            CauldronEvent::LiquidationSettled(event) => event.serialize(writer),
            CauldronEvent::WithdrawFees(event) => event.serialize(writer),
            CauldronEvent::ConfigUpdated(event) => event.serialize(writer),
        }
    }
}

impl BorshDeserialize for CauldronEvent {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> Result<Self, std::io::Error> {
        let tag = CauldronEventTag::deserialize_reader(reader)?;
        Ok(match tag {
            CauldronEventTag::Accrue => CauldronEvent::Accrue(<_>::deserialize_reader(reader)?),
            CauldronEventTag::ExchangeRateUpdated => {
                CauldronEvent::ExchangeRateUpdated(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::Borrow => CauldronEvent::Borrow(<_>::deserialize_reader(reader)?),
            CauldronEventTag::Repay => CauldronEvent::Repay(<_>::deserialize_reader(reader)?),
            CauldronEventTag::AddCollateral => {
                CauldronEvent::AddCollateral(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::WithdrawCollateral => {
                CauldronEvent::WithdrawCollateral(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::RewardsPaid => {
                CauldronEvent::RewardsPaid(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::Liquidate => {
                CauldronEvent::Liquidate(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::LiquidationSettled => {
                CauldronEvent::LiquidationSettled(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::WithdrawFees => {
                CauldronEvent::WithdrawFees(<_>::deserialize_reader(reader)?)
            }
            CauldronEventTag::ConfigUpdated => {
                CauldronEvent::ConfigUpdated(<_>::deserialize_reader(reader)?)
            }
        })
    }
}
