//! SSDP (Simple Service Discovery Protocol) messages.
//!
//! # How SSDP discovery works (for beginners)
//!
//! SSDP is the discovery half of UPnP.  A client multicasts a small
//! HTTP-looking request, `M-SEARCH`, to the well-known group
//! `239.255.255.250:1900`.  Every device that matches the requested search
//! target (`ST`) answers with a unicast UDP datagram shaped like an HTTP
//! response: a status line followed by `Name: Value` headers.  The most
//! useful header is `LOCATION`, the URL of the device's XML description.
//!
//! ```text
//! M-SEARCH * HTTP / 1.1              HTTP/1.1 200 OK
//! HOST: 239.255.255.250:1900         CACHE-CONTROL: max-age=1800
//! MAN: "ssdp:discover"        ──►    EXT:
//! MX: 1                              LOCATION: http://10.0.0.1/upnp/description.xml
//! ST: urn:philips-com:...            ST: urn:philips-com:device:DiProduct:1
//! ```
//!
//! The request line is `HTTP / 1.1` with spaces, which is what the appliance
//! has always been sent and answers to.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::protocol::DiscoveryParseError;

/// SSDP multicast group.
pub const SSDP_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// Search target advertised by Philips air purifiers.
pub const DEFAULT_SEARCH_TARGET: &str = "urn:philips-com:device:DiProduct:1";

/// Maximum wait, in seconds, a device may delay its reply (`MX` header).
pub const SEARCH_MX_SECS: u8 = 1;

/// The multicast destination of an `M-SEARCH`.
pub fn ssdp_multicast_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(SSDP_GROUP, SSDP_PORT))
}

/// Builds the `M-SEARCH` request sent to `group`.
///
/// Lines are CRLF-joined and the block ends with an empty line.
///
/// # Examples
///
/// ```rust
/// use purifier_core::protocol::ssdp::{build_search_request, ssdp_multicast_addr};
///
/// let req = build_search_request(ssdp_multicast_addr(), "ssdp:all");
/// assert!(req.starts_with("M-SEARCH * HTTP / 1.1\r\nHOST: 239.255.255.250:1900\r\n"));
/// assert!(req.ends_with("ST: ssdp:all\r\n\r\n"));
/// ```
pub fn build_search_request(group: SocketAddr, search_target: &str) -> String {
    [
        "M-SEARCH * HTTP / 1.1".to_string(),
        format!("HOST: {}:{}", group.ip(), group.port()),
        "MAN: \"ssdp:discover\"".to_string(),
        format!("MX: {SEARCH_MX_SECS}"),
        format!("ST: {search_target}"),
        String::new(),
        String::new(),
    ]
    .join("\r\n")
}

/// Header block of one SSDP reply.
///
/// Names are kept exactly as received (lookups are case-sensitive).  A header
/// with an empty value is present with an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsdpHeaders {
    headers: HashMap<String, String>,
}

impl SsdpHeaders {
    /// Value of header `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The description URL from the `LOCATION` header.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryParseError::MissingLocation`] if the header is absent
    /// or blank.
    pub fn location(&self) -> Result<&str, DiscoveryParseError> {
        match self.get("LOCATION").map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(DiscoveryParseError::MissingLocation),
        }
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// `true` when the reply carried no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Consumes the block and returns the raw name → value map.
    pub fn into_map(self) -> HashMap<String, String> {
        self.headers
    }
}

/// Parses the header block of an SSDP reply.
///
/// - The first line (the status line) is discarded.
/// - Each following line is split at its first `:`; leading spaces and tabs
///   are removed from the value, trailing whitespace is kept.
/// - A line starting with a space or tab continues the previous header.
/// - Parsing stops at the first empty line.
/// - A repeated header keeps its last value.
///
/// # Errors
///
/// Returns [`DiscoveryParseError::MalformedHeader`] for a non-empty line with
/// no `:` that is not a continuation.
pub fn parse_reply_headers(reply: &str) -> Result<SsdpHeaders, DiscoveryParseError> {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut last_name: Option<String> = None;

    let body = match reply.find('\n') {
        Some(i) => &reply[i + 1..],
        None => "",
    };

    for raw_line in body.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            break;
        }

        if line.starts_with([' ', '\t']) {
            if let Some(value) = last_name.as_ref().and_then(|n| headers.get_mut(n)) {
                value.push(' ');
                value.push_str(line.trim_start_matches([' ', '\t']));
                continue;
            }
            return Err(DiscoveryParseError::MalformedHeader(line.to_string()));
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| DiscoveryParseError::MalformedHeader(line.to_string()))?;
        let value = value.trim_start_matches([' ', '\t']);

        headers.insert(name.to_string(), value.to_string());
        last_name = Some(name.to_string());
    }

    Ok(SsdpHeaders { headers })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
