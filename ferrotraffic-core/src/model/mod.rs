//! Data model for live traffic ingestion
//!
//! Contains the traffic report types and the street network they are applied to.

pub mod report;
pub mod streets;

pub use report::{Point, ReportBatch, ReportEntry, UpdateMode, ValueType};
pub use streets::{EdgeFlags, SpeedEncoder, StreetEdge, StreetGraph, StreetNode};
