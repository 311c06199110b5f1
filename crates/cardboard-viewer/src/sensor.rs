//! Orientation sources.
//!
//! - `udp`: JSON datagrams `{"alpha", "beta", "gamma"}` in degrees, as sent
//!   by a phone relaying its `deviceorientation` events.
//! - `pointer`: the cursor position stands in for head heading and tilt.
//!
//! Every source reports through [`ViewerEvent`]s so samples reach the head
//! frame on the event-loop thread.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::runtime::Handle;

use cardboard_engine::coords::SurfaceSize;
use cardboard_engine::window::EventProxy;

use crate::event::{Permission, ViewerEvent};
use crate::orientation::{sample_for, OrientationSample};

/// Largest datagram accepted; orientation JSON is far smaller.
const MAX_DATAGRAM: usize = 1024;

/// Tilt reached at the top and bottom window edges, in degrees.
pub const POINTER_MAX_TILT: f64 = 89.0;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("invalid sensor address {addr:?}: {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed orientation datagram: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parses one orientation datagram.
pub fn decode_datagram(bytes: &[u8]) -> Result<OrientationSample, SensorError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn parse_bind_addr(addr: &str) -> Result<SocketAddr, SensorError> {
    addr.parse().map_err(|source| SensorError::Address { addr: addr.to_string(), source })
}

// ── udp ───────────────────────────────────────────────────────────────────

/// Binds the UDP sensor and streams samples until the event loop closes.
///
/// Binding is the permission request: success posts `Granted` before any
/// sample, failure posts `Denied` and ends the task.
pub fn spawn_udp(handle: &Handle, bind: String, proxy: EventProxy<ViewerEvent>) {
    handle.spawn(async move {
        let socket = match bind_udp(&bind).await {
            Ok(socket) => socket,
            Err(e) => {
                log::warn!("udp sensor unavailable: {e}");
                proxy.send(ViewerEvent::PermissionResolved(Permission::Denied));
                return;
            }
        };

        if let Ok(addr) = socket.local_addr() {
            log::info!("udp sensor listening on {addr}");
        }
        if !proxy.send(ViewerEvent::PermissionResolved(Permission::Granted)) {
            return;
        }

        run_udp(socket, proxy).await;
    });
}

async fn bind_udp(bind: &str) -> Result<UdpSocket, SensorError> {
    let addr = parse_bind_addr(bind)?;
    UdpSocket::bind(addr)
        .await
        .map_err(|source| SensorError::Bind { addr, source })
}

/// Delay before retrying a failed receive. Doubles per consecutive error.
#[derive(Debug)]
struct RecvBackoff {
    next: Duration,
}

impl RecvBackoff {
    const MIN: Duration = Duration::from_millis(10);
    const MAX: Duration = Duration::from_secs(1);

    fn new() -> Self {
        Self { next: Self::MIN }
    }

    fn failed(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(Self::MAX);
        delay
    }

    fn succeeded(&mut self) {
        self.next = Self::MIN;
    }
}

async fn run_udp(socket: UdpSocket, proxy: EventProxy<ViewerEvent>) {
    let mut buf = [0u8; MAX_DATAGRAM];
    let mut backoff = RecvBackoff::new();
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(r) => {
                backoff.succeeded();
                r
            }
            Err(e) => {
                // ICMP port-unreachable and friends surface here; keep listening.
                let delay = backoff.failed();
                log::debug!("udp sensor recv error, retrying in {delay:?}: {e}");
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        match decode_datagram(&buf[..len]) {
            Ok(sample) => {
                if !proxy.send(ViewerEvent::Orientation(sample)) {
                    log::debug!("event loop closed; udp sensor stopping");
                    return;
                }
            }
            Err(e) => log::debug!("dropping datagram from {peer}: {e}"),
        }
    }
}

// ── pointer ───────────────────────────────────────────────────────────────

/// Maps cursor positions to orientation samples.
///
/// The left edge looks to heading +180°, the right edge to -180°; the top
/// edge tilts up by [`POINTER_MAX_TILT`], the bottom edge down by the same.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerSensor {
    size: SurfaceSize,
}

impl PointerSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    /// Sample for a cursor at `(x, y)` physical pixels, or `None` before the
    /// window has a size.
    pub fn sample_at(&self, x: f32, y: f32) -> Option<OrientationSample> {
        if !self.size.is_valid() {
            return None;
        }
        let u = (x as f64 / self.size.width as f64).clamp(0.0, 1.0);
        let v = (y as f64 / self.size.height as f64).clamp(0.0, 1.0);

        let heading = 180.0 - 360.0 * u;
        let tilt = POINTER_MAX_TILT - 2.0 * POINTER_MAX_TILT * v;
        Some(sample_for(heading, tilt))
    }
}
