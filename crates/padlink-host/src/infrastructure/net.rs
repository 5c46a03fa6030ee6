//! LAN address detection for advertised URLs.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::{debug, warn};

/// Public address used only to pick a route; no packet is sent.
const ROUTE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// The local address the OS would use to reach the wider network, or
/// 127.0.0.1 when there is no route (offline machine, no interfaces up).
pub fn detect_lan_ip() -> IpAddr {
    match route_source_ip() {
        Ok(ip) if !ip.is_unspecified() => {
            debug!("detected LAN address {ip}");
            ip
        }
        Ok(_) => fallback("no routable interface"),
        Err(e) => fallback(&e.to_string()),
    }
}

fn route_source_ip() -> std::io::Result<IpAddr> {
    // Connecting a UDP socket only selects a route and source address.
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}

fn fallback(reason: &str) -> IpAddr {
    warn!("cannot detect LAN address ({reason}); advertising 127.0.0.1");
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
