//! UPnP device description documents.
//!
//! The `LOCATION` of an SSDP reply points to an XML document like:
//!
//! ```xml
//! <root xmlns="urn:schemas-upnp-org:device-1-0">
//!   <device>
//!     <manufacturer>Royal Philips Electronics</manufacturer>
//!     <modelName>AirPurifier</modelName>
//!     <modelNumber>AC2729</modelNumber>
//!     <UDN>uuid:12345678-1234-1234-1234-123456789012</UDN>
//!   </device>
//! </root>
//! ```
//!
//! Only the four fields above are read; everything else is ignored.

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::protocol::DiscoveryParseError;

/// XML namespace of UPnP device descriptions.
pub const UPNP_DEVICE_NAMESPACE: &str = "urn:schemas-upnp-org:device-1-0";

/// Identity of one discovered appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// `host` or `host:port` of the description URL; also the address to
    /// open a session against.
    pub network_location: String,
    /// `device/manufacturer`.
    pub manufacturer: String,
    /// `device/modelName`.
    pub model_name: String,
    /// `device/modelNumber`.
    pub model_number: String,
    /// `device/UDN` without its `uuid:` prefix.
    pub uuid: String,
}

impl DeviceIdentity {
    /// Short display name, e.g. `"AirPurifier AC2729"`.
    pub fn name(&self) -> String {
        format!("{} {}", self.model_name, self.model_number)
    }

    /// One-line description: manufacturer, model, number and id joined by `" - "`.
    pub fn description(&self) -> String {
        [
            self.manufacturer.as_str(),
            self.model_name.as_str(),
            self.model_number.as_str(),
            self.uuid.as_str(),
        ]
        .join(" - ")
    }
}

/// Returns the `host[:port]` part of a description URL.
///
/// # Errors
///
/// Returns [`DiscoveryParseError::InvalidLocation`] if `location` is not an
/// absolute URL with a host.
pub fn network_location(location: &str) -> Result<String, DiscoveryParseError> {
    let invalid = |reason: String| DiscoveryParseError::InvalidLocation {
        url: location.to_string(),
        reason,
    };

    let url = Url::parse(location).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid("URL has no host".to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Parses a description document fetched from `location`.
///
/// # Errors
///
/// - [`DiscoveryParseError::InvalidLocation`] if `location` has no host.
/// - [`DiscoveryParseError::MalformedXml`] if `xml` is not well-formed.
/// - [`DiscoveryParseError::MissingElement`] if `device` or one of its four
///   required children is absent.
pub fn parse_description(location: &str, xml: &str) -> Result<DeviceIdentity, DiscoveryParseError> {
    let network_location = network_location(location)?;

    let doc = Document::parse(xml.trim_start_matches('\u{feff}').trim_start())
        .map_err(|e| DiscoveryParseError::MalformedXml(e.to_string()))?;

    let device = upnp_child(doc.root_element(), "device")?;
    let text_of = |name: &'static str| -> Result<String, DiscoveryParseError> {
        let node = upnp_child(device, name)?;
        Ok(node.text().unwrap_or_default().trim().to_string())
    };

    let udn = text_of("UDN")?;
    let uuid = udn.replace("uuid:", "");

    Ok(DeviceIdentity {
        network_location,
        manufacturer: text_of("manufacturer")?,
        model_name: text_of("modelName")?,
        model_number: text_of("modelNumber")?,
        uuid,
    })
}

/// First child element of `parent` named `name` in the UPnP device namespace.
fn upnp_child<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, DiscoveryParseError> {
    parent
        .children()
        .find(|n| n.has_tag_name((UPNP_DEVICE_NAMESPACE, name)))
        .ok_or(DiscoveryParseError::MissingElement(name))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
