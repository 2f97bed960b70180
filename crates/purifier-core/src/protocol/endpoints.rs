//! HTTP endpoint layout of the appliance and its status error codes.
//!
//! Every endpoint lives under `http://{host}/di/v1/products/{n}/`.  Product
//! `0` is the network module (security, firmware, Wi-Fi), product `1` is the
//! purifier itself.

use std::fmt;
use std::str::FromStr;

/// One HTTP resource exposed by the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplianceEndpoint {
    /// Firmware version information.
    Firmware,
    /// Key exchange; the only endpoint spoken in plain JSON.
    Security,
    /// Paired user information.
    UserInfo,
    /// Wi-Fi configuration.
    Wifi,
    /// Live air status and the control surface for writes.
    Air,
    /// Device name and type.
    Device,
    /// Filter status.
    Filter,
}

impl ApplianceEndpoint {
    /// Every endpoint, in table order.
    pub const ALL: [ApplianceEndpoint; 7] = [
        ApplianceEndpoint::Firmware,
        ApplianceEndpoint::Security,
        ApplianceEndpoint::UserInfo,
        ApplianceEndpoint::Wifi,
        ApplianceEndpoint::Air,
        ApplianceEndpoint::Device,
        ApplianceEndpoint::Filter,
    ];

    /// The URL path of this endpoint.
    pub fn path(self) -> &'static str {
        match self {
            ApplianceEndpoint::Firmware => "/di/v1/products/0/firmware",
            ApplianceEndpoint::Security => "/di/v1/products/0/security",
            ApplianceEndpoint::UserInfo => "/di/v1/products/0/userinfo",
            ApplianceEndpoint::Wifi => "/di/v1/products/0/wifi",
            ApplianceEndpoint::Air => "/di/v1/products/1/air",
            ApplianceEndpoint::Device => "/di/v1/products/1/device",
            ApplianceEndpoint::Filter => "/di/v1/products/1/fltsts",
        }
    }

    /// The short name used on the command line and in logs.
    pub fn name(self) -> &'static str {
        match self {
            ApplianceEndpoint::Firmware => "firmware",
            ApplianceEndpoint::Security => "security",
            ApplianceEndpoint::UserInfo => "userinfo",
            ApplianceEndpoint::Wifi => "wifi",
            ApplianceEndpoint::Air => "air",
            ApplianceEndpoint::Device => "device",
            ApplianceEndpoint::Filter => "filter",
        }
    }

    /// Full URL of this endpoint on `host` (`ip` or `ip:port`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use purifier_core::ApplianceEndpoint;
    ///
    /// assert_eq!(
    ///     ApplianceEndpoint::Air.url("10.0.0.1"),
    ///     "http://10.0.0.1/di/v1/products/1/air"
    /// );
    /// ```
    pub fn url(self, host: &str) -> String {
        format!("http://{host}{}", self.path())
    }

    /// `false` only for [`ApplianceEndpoint::Security`], whose body is plain JSON.
    pub fn is_encrypted(self) -> bool {
        self != ApplianceEndpoint::Security
    }
}

impl fmt::Display for ApplianceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApplianceEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplianceEndpoint::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| format!("unknown endpoint {s:?}"))
    }
}

/// Human-readable text for a value of the `err` status field.
///
/// Returns `None` for `0` (no error) and for codes the firmware has not been
/// seen to send.
pub fn describe_error_code(code: u64) -> Option<&'static str> {
    match code {
        32768 => Some("Water tank is removed"),
        49408 => Some("Water refill alert"),
        49411 => Some("Pre-filter and wick cleaning alert"),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
