//! Player port definitions.
//!
//! Outbound ports are the seams between the synchronization core and the
//! outside world: the socket transport, the REST collaborators and local
//! storage. Adapters live in `crate::infrastructure`.

pub mod outbound;
