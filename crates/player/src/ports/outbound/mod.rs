//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the reconcilers and the connection manager to interact with
//! external systems without depending on concrete implementations.

pub mod api_error;
pub mod message_count_port;
pub mod position_store_port;
pub mod transport_port;
pub mod zone_map_port;

pub use api_error::ApiError;
pub use message_count_port::MessageCountPort;
pub use position_store_port::{PositionStorePort, StoredPosition};
pub use transport_port::{AttemptId, TransportError, TransportEvent, TransportEventKind, TransportPort};
pub use zone_map_port::ZoneMapPort;

#[cfg(any(test, feature = "testing"))]
pub use message_count_port::MockMessageCountPort;
#[cfg(any(test, feature = "testing"))]
pub use position_store_port::MockPositionStorePort;
#[cfg(any(test, feature = "testing"))]
pub use transport_port::MockTransportPort;
#[cfg(any(test, feature = "testing"))]
pub use zone_map_port::MockZoneMapPort;
