//! Street network model

pub mod components;
pub mod encoder;
pub mod network;

pub use components::{StreetEdge, StreetNode};
pub use encoder::{EdgeFlags, SpeedEncoder};
pub use network::{IndexedPoint, IndexedSegment, StreetGraph};
