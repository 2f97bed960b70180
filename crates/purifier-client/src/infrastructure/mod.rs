//! Infrastructure layer for the client.
//!
//! Contains OS-facing adapters: the `reqwest` HTTP transport, the SSDP
//! discovery socket, and config file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `purifier_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
