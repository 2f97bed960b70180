//! Application layer use cases for the client.
//!
//! # What use cases does the client have?
//!
//! - **`session`** – Runs the key-exchange handshake against one appliance and
//!   holds the resulting session key.  Every later payload is encrypted and
//!   decrypted through it.
//!
//! - **`control`** – Reads status endpoints and writes control commands
//!   through an established session, and offers a typed view of the `air`
//!   status document.
//!
//! Both depend only on the [`transport::Transport`] trait, so they can be
//! tested against in-memory fakes without a real appliance on the network.

pub mod control;
pub mod session;
pub mod transport;
