//! Line-crossing counting

pub mod aggregate;
pub mod counter;

pub use aggregate::CountAggregate;
pub use counter::{CrossingEvent, LineCrossingCounter};
