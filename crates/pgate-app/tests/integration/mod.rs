//! Integration tests for the popup gate service.
//!
//! These tests run the real session, HTTP host and HTTP notifier against a
//! mock backend.

pub mod common;
