//! Frame-by-frame session pipeline

pub mod config;
pub mod events;
pub mod session;

pub use config::{CountingConfig, EventConfig, Mode, SessionConfig, ViolationConfig};
pub use events::{EventBus, SessionEvent};
pub use session::{FrameReport, Session, SessionStats};
