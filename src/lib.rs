//! vidsplit library
//!
//! Splits video files into fixed-length segments starting from an offset and
//! names every segment after the moment it was recorded.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{BatchRequest, MediaInfo, SplitOutput, SplitRequest, TimeSpec};
pub use error::{SplitError, SplitResult};

