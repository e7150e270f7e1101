//! Scenario and property test suites for the block registry
//!
//! Unit tests live next to the code they cover; this module holds the tests
//! that exercise several modules together.

#[cfg(test)]
mod pipeline_tests;
