//! SSDP multicast discovery of appliances on the LAN.
//!
//! A discovery run:
//!
//! 1. Opens a UDP socket with `SO_REUSEADDR` and a multicast TTL (default 2).
//! 2. Sends one `M-SEARCH` request to the SSDP group `239.255.255.250:1900`.
//! 3. Reads replies until the deadline passes.
//! 4. For each distinct `LOCATION` header, downloads the UPnP description and
//!    parses it into a [`DeviceIdentity`].
//!
//! # How SSDP works (for beginners)
//!
//! SSDP (Simple Service Discovery Protocol) is the discovery half of UPnP.
//! A control point sends an HTTP-formatted request over UDP multicast:
//!
//! ```text
//! M-SEARCH * HTTP / 1.1
//! HOST: 239.255.255.250:1900
//! MAN: "ssdp:discover"
//! MX: 1
//! ST: urn:philips-com:device:DiProduct:1
//! ```
//!
//! Every device on the LAN that matches the search target (`ST`) answers with
//! a unicast UDP datagram whose `LOCATION` header is the URL of an XML
//! document describing the device.  The replies carry no guarantee of
//! arrival or ordering, so the search simply listens for a fixed time.
//!
//! # Error handling
//!
//! Only failing to create the socket or to send the query is an error.  A
//! reply that cannot be parsed, lacks `LOCATION`, or whose description cannot
//! be fetched is logged and dropped; the search continues.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use purifier_core::protocol::ssdp::ssdp_multicast_addr;
use purifier_core::protocol::{build_search_request, parse_description, parse_reply_headers};
use purifier_core::{DeviceIdentity, DiscoveryParseError};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::application::transport::{Transport, TransportError};

/// Receive buffer size; one SSDP reply always fits.
pub const RECV_BUFFER_LEN: usize = 4096;

/// Default multicast TTL for the search request.
pub const DEFAULT_MULTICAST_TTL: u32 = 2;

/// Error type for a discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be created, configured, or bound.
    #[error("failed to open discovery socket on {addr}: {source}")]
    SocketSetup {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The search request could not be sent.
    #[error("failed to send M-SEARCH to {group}: {source}")]
    SendFailed {
        group: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Why one reply produced no device.
#[derive(Debug, Error)]
enum ReplyError {
    #[error(transparent)]
    Parse(#[from] DiscoveryParseError),

    #[error("description fetch failed: {0}")]
    Fetch(#[from] TransportError),
}

/// Socket-level settings for a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Where the search request is sent.
    pub group: SocketAddr,
    /// Local address the socket binds to.
    pub bind_addr: SocketAddr,
    /// Multicast TTL of the search request.
    pub multicast_ttl: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: ssdp_multicast_addr(),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            multicast_ttl: DEFAULT_MULTICAST_TTL,
        }
    }
}

/// Runs SSDP searches and resolves replies into device identities.
pub struct SsdpDiscovery {
    config: DiscoveryConfig,
    transport: Arc<dyn Transport>,
}

impl SsdpDiscovery {
    /// Creates a discovery service that fetches descriptions over `transport`.
    pub fn new(config: DiscoveryConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Searches for devices matching `search_target` for `timeout`.
    ///
    /// Returns one identity per distinct description URL, in reply order.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] only if the socket cannot be opened or the
    /// query cannot be sent.
    pub async fn discover(
        &self,
        search_target: &str,
        timeout: Duration,
    ) -> Result<Vec<DeviceIdentity>, DiscoveryError> {
        let socket = open_socket(&self.config)?;
        let group = self.config.group;

        let query = build_search_request(group, search_target);
        socket
            .send_to(query.as_bytes(), group)
            .await
            .map_err(|source| DiscoveryError::SendFailed { group, source })?;
        info!("sent M-SEARCH for {search_target} to {group}");

        let replies = collect_replies(&socket, timeout).await;
        debug!("collected {} SSDP replies", replies.len());

        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for (src, reply) in replies {
            match self.identify(&reply, &mut seen).await {
                Ok(Some(device)) => {
                    info!("found {} at {}", device.name(), device.network_location);
                    devices.push(device);
                }
                Ok(None) => {}
                Err(ReplyError::Parse(e)) => debug!("dropping SSDP reply from {src}: {e}"),
                Err(e) => warn!("dropping SSDP reply from {src}: {e}"),
            }
        }

        Ok(devices)
    }

    /// Resolves one reply.  `Ok(None)` means its location was already seen.
    async fn identify(
        &self,
        reply: &str,
        seen: &mut HashSet<String>,
    ) -> Result<Option<DeviceIdentity>, ReplyError> {
        let headers = parse_reply_headers(reply)?;
        let location = headers.location()?.trim().to_string();
        if !seen.insert(location.clone()) {
            return Ok(None);
        }

        let xml = self.transport.get(&location).await?;
        Ok(Some(parse_description(&location, &xml)?))
    }
}

/// Creates the UDP socket through `socket2` and hands it to tokio.
fn open_socket(config: &DiscoveryConfig) -> Result<UdpSocket, DiscoveryError> {
    let addr = config.bind_addr;
    let setup = |source: std::io::Error| DiscoveryError::SocketSetup { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(setup)?;
    socket.set_reuse_address(true).map_err(setup)?;
    if addr.is_ipv4() {
        socket
            .set_multicast_ttl_v4(config.multicast_ttl)
            .map_err(setup)?;
    }
    socket.set_nonblocking(true).map_err(setup)?;
    socket.bind(&addr.into()).map_err(setup)?;

    UdpSocket::from_std(socket.into()).map_err(setup)
}

/// Reads datagrams until `timeout` has elapsed.  Deadline expiry is the
/// normal exit.
async fn collect_replies(socket: &UdpSocket, timeout: Duration) -> Vec<(SocketAddr, String)> {
    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; RECV_BUFFER_LEN];
    let mut replies = Vec::new();

    loop {
        match timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Err(_) => break,
            Ok(Ok((len, src))) => {
                replies.push((src, String::from_utf8_lossy(&buf[..len]).into_owned()));
            }
            Ok(Err(e)) if is_transient_error(&e) => {
                debug!("ignoring transient recv error: {e}");
            }
            Ok(Err(e)) => {
                warn!("discovery recv error, ending search early: {e}");
                break;
            }
        }
    }

    replies
}

/// Returns `true` for errors that say nothing about later datagrams, such as
/// an ICMP port-unreachable surfacing as `ConnectionReset` on Windows.
fn is_transient_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
