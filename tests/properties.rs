//! Property tests for Tessera.
//!
//! Properties use randomized input generation to explore edge cases and
//! protect invariants like "never panics", "priority holds" and
//! "round-trips".
//!
//! Run with: `cargo test --test properties`

mod common;

#[path = "properties/key_path.rs"]
mod key_path;

#[path = "properties/layer_stack.rs"]
mod layer_stack;

#[path = "properties/dispatch.rs"]
mod dispatch;
