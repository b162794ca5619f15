//! Projection engine: fact tables onto spreadsheet grids

pub mod projector;
pub mod sink;

pub use projector::GridProjector;
pub use sink::GridSink;
