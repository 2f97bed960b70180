//! Discovery against a loopback SSDP responder.
//!
//! The responder stands in for the multicast group: it waits for the
//! `M-SEARCH`, then answers with a mix of good, duplicate, and broken replies.
//! Description documents are served by an in-memory transport.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use purifier_client::application::transport::{Transport, TransportError};
use purifier_client::infrastructure::network::discovery::{DiscoveryConfig, SsdpDiscovery};
use tokio::net::UdpSocket;

const GOOD_LOCATION: &str = "http://192.168.1.20:80/upnp/description.xml";
const BROKEN_LOCATION: &str = "http://192.168.1.21/upnp/description.xml";

const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:philips-com:device:DiProduct:1</deviceType>
    <friendlyName>Living room</friendlyName>
    <manufacturer>Royal Philips Electronics</manufacturer>
    <modelName>AirPurifier</modelName>
    <modelNumber>AC2889</modelNumber>
    <UDN>uuid:12345678-1234-1234-1234-e8c1d700ab12</UDN>
  </device>
</root>"#;

/// Serves description documents by URL and counts requests.
#[derive(Default)]
struct DescriptionServer {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for DescriptionServer {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn put(&self, url: &str, _body: String) -> Result<String, TransportError> {
        Err(TransportError::Status {
            url: url.to_string(),
            status: 405,
        })
    }
}

fn reply(location: Option<&str>) -> String {
    let mut lines = vec![
        "HTTP/1.1 200 OK".to_string(),
        "CACHE-CONTROL: max-age=1800".to_string(),
        "EXT:".to_string(),
    ];
    if let Some(location) = location {
        lines.push(format!("LOCATION: {location}"));
    }
    lines.push("ST: urn:philips-com:device:DiProduct:1".to_string());
    lines.push("USN: uuid:12345678-1234-1234-1234-e8c1d700ab12".to_string());
    lines.join("\r\n") + "\r\n\r\n"
}

/// Binds a loopback responder that answers the first datagram with `replies`.
async fn spawn_responder(replies: Vec<String>) -> SocketAddr {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        let (len, client) = socket.recv_from(&mut buf).await.unwrap();
        let query = String::from_utf8_lossy(&buf[..len]).into_owned();
        assert!(query.starts_with("M-SEARCH * HTTP / 1.1\r\n"));
        assert!(query.contains("MAN: \"ssdp:discover\"\r\n"));

        for reply in replies {
            socket.send_to(reply.as_bytes(), client).await.unwrap();
        }
    });

    addr
}

fn loopback_config(group: SocketAddr) -> DiscoveryConfig {
    DiscoveryConfig {
        group,
        bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        ..DiscoveryConfig::default()
    }
}

#[tokio::test]
async fn test_discover_keeps_only_resolvable_unique_devices() {
    // Arrange
    let group = spawn_responder(vec![
        reply(Some(GOOD_LOCATION)),
        reply(None),
        "garbage without headers\r\nno colon here\r\n\r\n".to_string(),
        reply(Some(BROKEN_LOCATION)),
        reply(Some(GOOD_LOCATION)),
    ])
    .await;
    let server = Arc::new(DescriptionServer {
        documents: HashMap::from([(GOOD_LOCATION.to_string(), DESCRIPTION.to_string())]),
        ..DescriptionServer::default()
    });
    let discovery = SsdpDiscovery::new(loopback_config(group), server.clone());

    // Act
    let devices = discovery
        .discover("urn:philips-com:device:DiProduct:1", Duration::from_millis(500))
        .await
        .unwrap();

    // Assert
    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.network_location, "192.168.1.20");
    assert_eq!(device.manufacturer, "Royal Philips Electronics");
    assert_eq!(device.name(), "AirPurifier AC2889");
    assert_eq!(device.uuid, "12345678-1234-1234-1234-e8c1d700ab12");

    let requests = server.requests.lock().unwrap().clone();
    assert_eq!(requests, vec![GOOD_LOCATION.to_string(), BROKEN_LOCATION.to_string()]);
}

#[tokio::test]
async fn test_discover_with_only_broken_replies_returns_empty() {
    // Arrange
    let group = spawn_responder(vec![reply(None), reply(Some(BROKEN_LOCATION))]).await;
    let discovery = SsdpDiscovery::new(
        loopback_config(group),
        Arc::new(DescriptionServer::default()),
    );

    // Act
    let devices = discovery
        .discover("ssdp:all", Duration::from_millis(300))
        .await
        .unwrap();

    // Assert
    assert!(devices.is_empty());
}
