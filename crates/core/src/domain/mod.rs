pub mod identity;
pub mod message;
pub mod run;
pub mod trigger;

// Re-exports for convenience
pub use identity::*;
pub use message::*;
pub use run::*;
pub use trigger::*;
