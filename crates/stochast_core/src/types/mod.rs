//! Core type definitions shared across the workspace.

mod error;

pub use error::NumericError;
