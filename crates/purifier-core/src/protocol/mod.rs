//! Text protocols spoken with the appliance: SSDP discovery, UPnP
//! descriptions, and the HTTP endpoint layout.

pub mod endpoints;
pub mod ssdp;
pub mod upnp;

pub use endpoints::{describe_error_code, ApplianceEndpoint};
pub use ssdp::{build_search_request, parse_reply_headers, SsdpHeaders};
pub use upnp::{parse_description, DeviceIdentity};

use thiserror::Error;

/// Why a single discovery reply was rejected.
///
/// These never escape a discovery run: the reply is dropped and the search
/// carries on with the others.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryParseError {
    /// A header line had no `:` separator.
    #[error("malformed SSDP header line: {0:?}")]
    MalformedHeader(String),

    /// The reply carried no `LOCATION` header.
    #[error("SSDP reply has no LOCATION header")]
    MissingLocation,

    /// The `LOCATION` value is not an absolute URL with a host.
    #[error("invalid description URL {url:?}: {reason}")]
    InvalidLocation { url: String, reason: String },

    /// The description document is not well-formed XML.
    #[error("malformed UPnP description: {0}")]
    MalformedXml(String),

    /// A required element is absent from the description.
    #[error("UPnP description is missing <{0}>")]
    MissingElement(&'static str),
}
