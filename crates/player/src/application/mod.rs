//! Application layer: the event log and the reconcilers that read it.
//!
//! Everything here is synchronous and runtime-agnostic. Time is passed in,
//! I/O goes through the outbound ports, and presentation is expressed as
//! effect values the caller renders.

pub mod combat;
pub mod event_log;
pub mod movement;
pub mod notifications;
pub mod session;

pub use event_log::{DedupKey, EventLog, LogCursor};
pub use notifications::{Notice, NoticeKind, NotificationAggregator};
pub use session::{GameSession, SessionEffect};
