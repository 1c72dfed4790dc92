//! Model-based testing support.
//!
//! [`Operation`]s are generated randomly and replayed against a
//! [`crate::SimDriver`]. For the subset of operations it covers,
//! [`ModelField`] predicts the observable outcome independently, and tests
//! compare the two.

mod field;
mod operation;

pub use field::ModelField;
pub use operation::{CHARSET, KeyChoice, Operation};
