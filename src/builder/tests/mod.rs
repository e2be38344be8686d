//! Builder tests against synthetic archives on disk.

pub mod validation_tests;
