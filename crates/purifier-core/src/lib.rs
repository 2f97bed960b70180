//! # purifier-core
//!
//! Shared library for talking to networked air purifiers.  It contains the
//! key exchange, the session cipher and payload envelope, and the parsers for
//! the SSDP / UPnP discovery messages.
//!
//! It has zero dependencies on network sockets or HTTP clients: every function
//! here takes bytes or text in and returns bytes or text out.  The
//! `purifier-client` crate drives the actual network conversation.
//!
//! # Architecture overview (for beginners)
//!
//! The appliance speaks plain HTTP on the LAN, but the JSON it sends and
//! receives is encrypted.  Getting from "plain HTTP" to "encrypted JSON" takes
//! two steps:
//!
//! 1. A Diffie-Hellman **key exchange** over the appliance's `security`
//!    endpoint.  Both sides end up with the same shared secret, of which the
//!    first 16 bytes become a temporary AES key.
//! 2. The appliance sends the real **session key**, encrypted with that
//!    temporary key.  From then on every payload is AES-CBC encrypted with the
//!    session key and base64 encoded.
//!
//! This crate is organised as:
//!
//! - **`crypto`** – big-integer arithmetic, the key exchange, the CBC cipher,
//!   and the `"\n\n" + JSON` envelope.
//!
//! - **`protocol`** – the SSDP search request and reply parser, the UPnP
//!   description parser, and the table of appliance HTTP endpoints.

pub mod crypto;
pub mod protocol;

pub use crypto::envelope::{open_envelope, seal_envelope};
pub use crypto::key_exchange::{KeyExchangeParams, KeyExchangeState};
pub use crypto::session_key::SessionKey;
pub use crypto::ProtocolError;
pub use protocol::upnp::DeviceIdentity;
pub use protocol::{ApplianceEndpoint, DiscoveryParseError};
