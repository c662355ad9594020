// DataFrame implementations module
pub mod base;
pub mod verbs;

// Re-exports for convenience
pub use base::{DataFrame, Field, Schema};
pub use verbs::SortKey;
