//! Core types for memtrail.

mod event_kind;
mod record;

pub use event_kind::EventKind;
pub use record::{
    format_timestamp, limits, parse_timestamp, AppendOptions, HistoryQuery, HistoryRecord,
};
