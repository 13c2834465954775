//! In-memory collaborators and fixtures for driving a [`Cauldron`](crate::state::market::Cauldron)
//! outside of any chain.

mod fixtures;
mod sim_env;

pub use fixtures::*;
pub use sim_env::*;
