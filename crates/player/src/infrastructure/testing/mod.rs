//! Test doubles and event fixtures shared by unit tests.

mod fixtures;
mod transport;

pub use fixtures::*;
pub use transport::RecordingTransport;
