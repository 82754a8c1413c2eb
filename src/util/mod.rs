//! Utility modules: fixed-interval polling.

pub mod poll;
