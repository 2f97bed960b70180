//! purifier-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does purifier-client do? (for beginners)
//!
//! `purifier-core` knows how to *compute* every message of the appliance
//! protocol.  This crate *sends* them:
//!
//! 1. **Discovery** multicasts an SSDP search on the LAN, waits a few seconds
//!    for replies, downloads each replying device's UPnP description, and
//!    returns a list of [`purifier_core::DeviceIdentity`] records.
//! 2. **SecureSession** performs the Diffie-Hellman handshake against one
//!    appliance over HTTP and keeps the resulting session key.
//! 3. **ApplianceClient** uses that session to read the encrypted status
//!    endpoints and to write control commands.
//!
//! The `purifier` binary wraps all three in a small command-line tool.

/// Application layer: the transport seam, the handshake, and the appliance client.
pub mod application;

/// Infrastructure layer: HTTP transport, SSDP socket, and config file storage.
pub mod infrastructure;
