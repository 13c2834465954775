pub mod collateral_ledger;
pub mod debt_ledger;
pub mod market;
pub mod market_config;
pub mod position;
