//! Core traits for memtrail.

mod history_sink;

pub use history_sink::*;
