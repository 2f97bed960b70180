//! Network infrastructure for the client.
//!
//! # Sub-modules
//!
//! - **`http`** – [`http::ReqwestTransport`], the production implementation of
//!   the application layer's `Transport` trait.  Every appliance request and
//!   every UPnP description download goes through it.
//!
//! - **`discovery`** – Sends the SSDP `M-SEARCH` multicast, collects replies
//!   until a deadline, and resolves each reply's description document into a
//!   `DeviceIdentity`.

pub mod discovery;
pub mod http;
