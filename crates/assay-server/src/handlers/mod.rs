//! HTTP request handlers
//!
//! Each submodule contains handlers for a specific API area.

pub mod answer;
pub mod status;

// Re-export all handlers for use in router
pub use answer::*;
pub use status::*;
