//! Property-based soundness tests.
//!
//! Run with: `cargo test --test property`

mod credit_basis;
mod discovery;
