//! Cross-crate integration scenarios.

pub mod support;

mod finality;
mod rotation;
mod span_lifecycle;
