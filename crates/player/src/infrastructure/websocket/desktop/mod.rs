//! Desktop WebSocket implementation using tokio-tungstenite

mod client;

pub use client::DesktopTransport;
