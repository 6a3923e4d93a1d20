//! Common test utilities for the grouping engine integration tests

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
