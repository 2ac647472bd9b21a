//! Endpoint methods of the management API.
//!
//! Every method takes per-call [`RequestOption`](crate::RequestOption)s that
//! are applied after the client's defaults.

mod server;
mod warehouse;
