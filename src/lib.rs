//! MathShell
//!
//! An interactive terminal shell for a symbolic-expression evaluation
//! engine. The shell turns raw terminal interaction into well-formed
//! evaluation requests and renders engine results with numbered,
//! indented, optionally highlighted output.
//!
//! Two interchangeable input backends implement the same line-feeding
//! contract:
//!
//! - [`shell::MinimalShell`]: a rustyline line editor with persistent
//!   history and tab completion
//! - [`shell::RichShell`]: a raw-mode prompt session with live syntax
//!   highlighting, a status toolbar, and configurable key bindings

#![warn(rust_2018_idioms)]

// Public modules
pub mod engine;
pub mod shell;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

/// Shell version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shell name
pub const NAME: &str = "MathShell";
