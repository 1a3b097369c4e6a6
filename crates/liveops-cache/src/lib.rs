pub mod cache;
pub mod clock;
pub mod fingerprint;

pub use cache::*;
pub use clock::*;
pub use fingerprint::*;

// Re-export common types for convenience
pub use liveops_core::{LiveOpsError, Result, SummaryResult};
