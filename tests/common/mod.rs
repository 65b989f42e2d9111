//! Shared helpers for the integration tests
#![allow(dead_code)]

pub mod fake_server;
pub mod fixtures;

pub use fake_server::{FakeResponse, FakeServer};
pub use fixtures::*;
