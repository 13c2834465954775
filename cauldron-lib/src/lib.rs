pub mod address;
pub mod constant;
pub mod env;
pub mod error;
pub mod event;
pub mod interest_rate;
pub mod math;
pub mod operation;
pub mod oracle;
pub mod state;
pub mod summary;
pub mod swap;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
