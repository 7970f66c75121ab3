pub mod orchestration;

pub use orchestration::{ReleaseController, ReleaseSummary, Stage};
