//! Evaluation engine boundary
//!
//! The shell treats the engine as an external collaborator: it hands the
//! engine a [`crate::shell::LineFeeder`] to pull raw lines from, and gets
//! back opaque results carrying a category tag and a display string. The
//! reference engine here is deliberately small, enough to drive the
//! feeder, presenter, and completion subsystems end to end, but the
//! interface is the contract, not the arithmetic.

pub mod definitions;
pub mod evaluation;
pub mod value;

pub use definitions::Definitions;
pub use evaluation::{EngineError, Evaluation};
pub use value::{EvalResult, OutputForm, Query, ResultKind};
