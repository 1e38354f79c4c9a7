pub mod git;
pub mod time;

// Re-exports
pub use git::*;
pub use time::*;
