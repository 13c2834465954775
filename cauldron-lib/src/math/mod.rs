pub mod bps;
pub mod ifixed_point;
pub mod macros;
pub mod rebase;
pub mod rounding;
pub mod safe_math;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod ufixed_point;
