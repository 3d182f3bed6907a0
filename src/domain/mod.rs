//! Domain types for a multi-order dispatch and the port to the remote service.

pub mod order;
pub mod ports;
pub mod remote;
