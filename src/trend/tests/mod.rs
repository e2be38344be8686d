//! Trend estimator tests over in-memory stacks.
