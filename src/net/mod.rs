//! Networking: the request dispatcher and the transport it drives.
//!
//! SYSTEM CONTEXT
//! ==============
//! `dispatcher` is the only path auth operations use to reach the backend.
//! `transport` is the seam between dispatch logic and reqwest, and `types`
//! holds the error taxonomy and request shapes.

pub mod dispatcher;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::Dispatcher;
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiError, HttpMethod, OutboundRequest, PendingRequest, TransportResponse};
