//! Common test utilities for Tessera contract and scenario tests.
//!
//! This module provides:
//! - `TestEnv`: a dispatcher wired to an in-memory controller
//! - Fixtures: the school and network schemas used across tests

#![allow(dead_code)]

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
