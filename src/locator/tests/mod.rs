//! Locator tests against synthetic archives on disk.

pub mod discovery_tests;
