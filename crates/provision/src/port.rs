//! Port resolution: explicit `--port`, or discovery by USB VID:PID.
//!
//! Ports are matched on their hardware identifier only. Nothing here opens a
//! port, so a match says a known USB-serial bridge is attached, not that the
//! device behind it is alive.

use core::fmt;
use std::io;

use serialport::SerialPortType;

use crate::error::UploadError;

/// A USB-serial chip commonly found on ESP32 boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbBridge {
    /// USB vendor ID.
    pub vid: u16,
    /// USB product ID.
    pub pid: u16,
    /// Human-readable chip name.
    pub label: &'static str,
}

/// Bridges recognised during autodetection, in no particular priority.
pub const KNOWN_BRIDGES: &[UsbBridge] = &[
    UsbBridge {
        vid: 0x10c4,
        pid: 0xea60,
        label: "Silicon Labs CP210x",
    },
    UsbBridge {
        vid: 0x1a86,
        pid: 0x7523,
        label: "WCH CH340",
    },
    UsbBridge {
        vid: 0x0403,
        pid: 0x6001,
        label: "FTDI FT232R",
    },
    UsbBridge {
        vid: 0x303a,
        pid: 0x1001,
        label: "ESP32-S3 USB Serial/JTAG",
    },
];

/// Look up a VID:PID pair in [`KNOWN_BRIDGES`].
#[must_use]
pub fn bridge_for(vid: u16, pid: u16) -> Option<&'static UsbBridge> {
    KNOWN_BRIDGES.iter().find(|b| b.vid == vid && b.pid == pid)
}

/// A serial port as seen by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS device name (`/dev/ttyUSB0`, `COM3`).
    pub name: String,
    /// USB VID:PID, `None` for non-USB ports.
    pub usb_id: Option<(u16, u16)>,
}

/// Source of the serial ports present on this host.
pub trait PortEnumerator {
    /// List serial ports.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the ports cannot be listed.
    fn ports(&self) -> io::Result<Vec<PortInfo>>;
}

/// [`PortEnumerator`] backed by the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn ports(&self) -> io::Result<Vec<PortInfo>> {
        let ports = serialport::available_ports().map_err(io::Error::from)?;
        Ok(ports
            .into_iter()
            .map(|p| PortInfo {
                usb_id: match p.port_type {
                    SerialPortType::UsbPort(usb) => Some((usb.vid, usb.pid)),
                    _ => None,
                },
                name: p.port_name,
            })
            .collect())
    }
}

/// How the port was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSource {
    /// Given with `--port`.
    Explicit,
    /// Matched a known bridge.
    Detected {
        /// Bridge behind the chosen port.
        bridge: &'static str,
        /// Every matching port, chosen one first.
        matches: Vec<String>,
    },
}

/// The port the flasher will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPort {
    /// OS device name.
    pub name: String,
    /// How it was chosen.
    pub source: PortSource,
}

impl fmt::Display for ResolvedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            PortSource::Explicit => write!(f, "{} (from --port)", self.name),
            PortSource::Detected { bridge, .. } => write!(f, "{} ({})", self.name, bridge),
        }
    }
}

/// Sort key for device names: the trailing unit number compares as a number,
/// so `/dev/ttyUSB2` sorts before `/dev/ttyUSB10` and `COM3` before `COM10`.
fn port_order(name: &str) -> (&str, Option<u64>, &str) {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let unit = name.get(stem.len()..).and_then(|d| d.parse().ok());
    (stem, unit, name)
}

/// Pick the serial port for the flasher.
///
/// An explicit port is used as given. Otherwise the enumerated ports are
/// filtered to [`KNOWN_BRIDGES`], sorted by name (unit numbers compared
/// numerically), and the first is taken.
///
/// # Errors
///
/// Returns [`UploadError::PortNotFound`] if no explicit port was given and
/// no known bridge is attached (or the ports cannot be listed).
pub fn resolve_port(
    explicit: Option<&str>,
    enumerator: &impl PortEnumerator,
) -> Result<ResolvedPort, UploadError> {
    if let Some(name) = explicit {
        return Ok(ResolvedPort {
            name: name.to_string(),
            source: PortSource::Explicit,
        });
    }

    let ports = enumerator.ports().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "serial port enumeration failed");
        Vec::new()
    });

    let mut found: Vec<(String, &'static UsbBridge)> = ports
        .into_iter()
        .filter_map(|p| {
            let (vid, pid) = p.usb_id?;
            bridge_for(vid, pid).map(|b| (p.name, b))
        })
        .collect();
    found.sort_by(|a, b| port_order(&a.0).cmp(&port_order(&b.0)));
    tracing::debug!(matches = found.len(), "serial ports matched known bridges");

    let matches: Vec<String> = found.iter().map(|(name, _)| name.clone()).collect();
    let (name, bridge) = found.into_iter().next().ok_or(UploadError::PortNotFound)?;

    Ok(ResolvedPort {
        name,
        source: PortSource::Detected {
            bridge: bridge.label,
            matches,
        },
    })
}
