//! Integration tests for the page store lifecycle.
//!
//! These tests run a store over a flash image file and reboot it between
//! steps (init → flush → drop → init again), the way firmware sees the
//! device across power cycles. Unit tests in the crates cover the codec,
//! the retry policy and the recovery rules in isolation.

#[path = "../common/mod.rs"]
mod common;

mod append_log;
mod restart;
