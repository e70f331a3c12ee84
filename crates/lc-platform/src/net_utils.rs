use local_ip_address::list_afinet_netifas;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{info, warn};

use lc_core::ResolutionError;

/// Detect the primary LAN IPv4 address other nodes can reach us on.
///
/// 检测其他节点可以访问到本机的主要局域网 IPv4 地址。
///
/// # Preference / 优先级
/// 1. Private IPv4 (10.*, 172.16-31.*, 192.168.*) on a physical interface
/// 2. Any other non-loopback, non-link-local IPv4 on a physical interface
///
/// Tunnel interfaces (utun, tun, tap) and Clash TUN addresses (198.18.0.0/15)
/// are never picked.
pub fn primary_lan_ipv4() -> Result<Ipv4Addr, ResolutionError> {
    let interfaces =
        list_afinet_netifas().map_err(|e| ResolutionError::Interfaces(e.to_string()))?;

    let candidates: Vec<(String, Ipv4Addr)> = interfaces
        .into_iter()
        .filter_map(|(name, ip)| match ip {
            IpAddr::V4(v4) => Some((name, v4)),
            IpAddr::V6(_) => None,
        })
        .collect();

    match pick_lan_ipv4(&candidates) {
        Some((name, ip)) => {
            info!(ip = %ip, interface = %name, "detected LAN IP");
            Ok(ip)
        }
        None => {
            warn!("no suitable LAN IP found");
            Err(ResolutionError::NoRoutableAddress)
        }
    }
}

fn pick_lan_ipv4(candidates: &[(String, Ipv4Addr)]) -> Option<(String, Ipv4Addr)> {
    let usable = || {
        candidates.iter().filter(|(name, v4)| {
            !v4.is_loopback()
                && !v4.is_link_local()
                && !v4.is_unspecified()
                && !is_tunnel_interface(name)
                && !is_clash_tun_address(*v4)
        })
    };

    usable()
        .find(|(_, v4)| is_private_ipv4(*v4))
        .or_else(|| usable().next())
        .cloned()
}

fn is_tunnel_interface(name: &str) -> bool {
    name.contains("utun") || name.contains("tun") || name.contains("tap")
}

fn is_clash_tun_address(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 198 && (18..=19).contains(&octets[1])
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    match octets[0] {
        10 => true,
        172 => (16..=31).contains(&octets[1]),
        192 => octets[1] == 168,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, a: u8, b: u8, c: u8, d: u8) -> (String, Ipv4Addr) {
        (name.to_string(), Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn private_ranges_detected() {
        assert!(is_private_ipv4(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_private_ipv4(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_private_ipv4(Ipv4Addr::new(172, 31, 255, 254)));
        assert!(is_private_ipv4(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!is_private_ipv4(Ipv4Addr::LOCALHOST));
        assert!(!is_private_ipv4(Ipv4Addr::new(172, 32, 0, 1)));
    }

    #[test]
    fn clash_tun_addresses_detected() {
        assert!(is_clash_tun_address(Ipv4Addr::new(198, 18, 0, 1)));
        assert!(is_clash_tun_address(Ipv4Addr::new(198, 19, 0, 1)));
        assert!(!is_clash_tun_address(Ipv4Addr::new(198, 20, 0, 1)));
        assert!(!is_clash_tun_address(Ipv4Addr::new(198, 17, 0, 1)));
    }

    #[test]
    fn tunnel_interfaces_detected() {
        assert!(is_tunnel_interface("utun3"));
        assert!(is_tunnel_interface("tap0"));
        assert!(!is_tunnel_interface("en0"));
        assert!(!is_tunnel_interface("wlan0"));
    }

    #[test]
    fn prefers_private_physical_address() {
        let candidates = vec![
            iface("lo", 127, 0, 0, 1),
            iface("utun2", 10, 8, 0, 2),
            iface("en1", 198, 18, 0, 1),
            iface("en0", 203, 0, 113, 9),
            iface("en2", 192, 168, 1, 40),
        ];
        assert_eq!(
            pick_lan_ipv4(&candidates).map(|(_, ip)| ip),
            Some(Ipv4Addr::new(192, 168, 1, 40))
        );
    }

    #[test]
    fn falls_back_to_any_routable_address() {
        let candidates = vec![
            iface("lo", 127, 0, 0, 1),
            iface("eth0", 169, 254, 3, 3),
            iface("eth1", 203, 0, 113, 9),
        ];
        assert_eq!(
            pick_lan_ipv4(&candidates).map(|(_, ip)| ip),
            Some(Ipv4Addr::new(203, 0, 113, 9))
        );
    }

    #[test]
    fn loopback_only_yields_nothing() {
        assert_eq!(pick_lan_ipv4(&[iface("lo", 127, 0, 0, 1)]), None);
    }
}
