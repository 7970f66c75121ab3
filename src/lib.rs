pub mod changelog;
pub mod checks;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod steps;
pub mod ui;
pub mod version;

pub use error::{ReleaseError, Result};
