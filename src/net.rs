// src/net.rs

//! Picks the address the dev server and live-reload proxy bind to.

use std::net::{IpAddr, Ipv4Addr};

use tracing::{debug, warn};

/// Returned when no interface qualifies.
pub const FALLBACK_BIND_ADDRESS: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Snapshot of one interface address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub addr: IpAddr,
    /// Loopback or otherwise host-internal.
    pub internal: bool,
}

impl InterfaceAddr {
    pub fn new(name: impl Into<String>, addr: IpAddr, internal: bool) -> Self {
        Self {
            name: name.into(),
            addr,
            internal,
        }
    }
}

/// First IPv4 address that is neither `127.0.0.1` nor internal, in
/// enumeration order; [`FALLBACK_BIND_ADDRESS`] otherwise.
pub fn select_bind_address(interfaces: &[InterfaceAddr]) -> Ipv4Addr {
    interfaces
        .iter()
        .find_map(|iface| match iface.addr {
            IpAddr::V4(v4) if v4 != Ipv4Addr::LOCALHOST && !iface.internal => Some(v4),
            _ => None,
        })
        .unwrap_or(FALLBACK_BIND_ADDRESS)
}

/// Current interface addresses of this host.
pub fn host_interfaces() -> std::io::Result<Vec<InterfaceAddr>> {
    let interfaces = if_addrs::get_if_addrs()?;
    Ok(interfaces
        .into_iter()
        .map(|iface| {
            let internal = iface.is_loopback();
            InterfaceAddr::new(iface.name.clone(), iface.ip(), internal)
        })
        .collect())
}

/// Resolve the bind address from the host's interfaces.
///
/// If the interfaces cannot be listed at all, the fallback is used.
pub fn get_bind_address() -> Ipv4Addr {
    match host_interfaces() {
        Ok(interfaces) => {
            debug!(?interfaces, "enumerated network interfaces");
            select_bind_address(&interfaces)
        }
        Err(err) => {
            warn!("could not list network interfaces: {err}; binding to {FALLBACK_BIND_ADDRESS}");
            FALLBACK_BIND_ADDRESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn picks_first_external_ipv4() {
        let interfaces = vec![
            InterfaceAddr::new("lo", v4(127, 0, 0, 1), true),
            InterfaceAddr::new("eth0", v4(192, 168, 1, 5), false),
        ];
        assert_eq!(select_bind_address(&interfaces), Ipv4Addr::new(192, 168, 1, 5));
    }

    #[test]
    fn falls_back_to_unspecified() {
        let interfaces = vec![
            InterfaceAddr::new("lo", v4(127, 0, 0, 1), true),
            InterfaceAddr::new("docker0", v4(172, 17, 0, 1), true),
        ];
        assert_eq!(select_bind_address(&interfaces), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(select_bind_address(&[]), FALLBACK_BIND_ADDRESS);
    }

    #[test]
    fn ipv6_and_loopback_are_never_chosen() {
        let interfaces = vec![
            InterfaceAddr::new("eth0", "fe80::1".parse().unwrap(), false),
            InterfaceAddr::new("weird", v4(127, 0, 0, 1), false),
            InterfaceAddr::new("wlan0", v4(10, 0, 0, 7), false),
            InterfaceAddr::new("eth1", v4(10, 0, 0, 8), false),
        ];
        assert_eq!(select_bind_address(&interfaces), Ipv4Addr::new(10, 0, 0, 7));
    }
}
