//! Channel element types that need more structure than a scalar.
//!
//! Most channels carry plain domain records from [`crate::model`]; the error
//! list carries the [`errors::RunError`] event defined here.

pub mod errors;

pub use errors::{ErrorScope, RunError};
