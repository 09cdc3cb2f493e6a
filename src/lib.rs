pub mod analyzer;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod ui;
pub mod warning;
pub mod workflow;

pub use error::{FlowError, Result};
