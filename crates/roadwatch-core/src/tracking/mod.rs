pub mod line;
pub mod store;

pub use line::CountingLine;
pub use store::{TrackRecord, TrackStore};
