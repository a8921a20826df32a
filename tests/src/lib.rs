//! # Zena Test Suite
//!
//! Unified integration crate exercising the consensus stack end to end
//! against in-process collaborators.
//!
//! ## Structure
//!
//! ```text
//! tests/src/integration/
//! ├── support.rs        # System-contract simulator + in-memory chain
//! ├── rotation.rs       # Weighted proposer rotation across many steps
//! ├── span_lifecycle.rs # Span handoff and state-sync drains via finalize
//! └── finality.rs       # Checkpoint/milestone whitelisting and resilience
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p zena-tests
//! cargo test -p zena-tests integration::finality
//! ```

pub mod integration;
