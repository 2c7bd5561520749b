//! Resolves the target host to an IP address before any scanning starts.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use hickory_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};
use log::debug;

/// Resolves a host string to a single IP address.
///
/// IP literals parse directly. Hostnames first go through the system resolver
/// via [`tokio::net::lookup_host`] and fall back to a DNS lookup with the
/// resolver derived by [`get_resolver`]. IPv4 answers are preferred when both
/// families come back. Returns `None` when the host cannot be resolved at
/// all; callers treat that as fatal since every probe would fail the same
/// way.
pub async fn resolve_host(host: &str, resolver: Option<&str>) -> Option<IpAddr> {
    if let Ok(ip) = IpAddr::from_str(host) {
        return Some(ip);
    }

    if let Ok(addrs) = tokio::net::lookup_host((host, 0)).await {
        let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        if let Some(ip) = pick_address(&ips) {
            return Some(ip);
        }
    }

    debug!("system lookup failed for {host}, falling back to DNS resolver");
    let resolver = get_resolver(resolver).await;
    let lookup = resolver.lookup_ip(host).await.ok()?;
    let ips: Vec<IpAddr> = lookup.iter().collect();
    pick_address(&ips)
}

fn pick_address(ips: &[IpAddr]) -> Option<IpAddr> {
    ips.iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| ips.first())
        .copied()
}

/// Derives a DNS resolver.
///
/// 1. if the `resolver` parameter has been set, parse it as a
///    comma-separated list of nameserver IPs.
/// 2. otherwise attempt to derive a resolver from the system config
///    (e.g. `/etc/resolv.conf` on *nix), finally falling back to a
///    CloudFlare-based resolver.
async fn get_resolver(resolver: Option<&str>) -> TokioAsyncResolver {
    match resolver {
        Some(r) => {
            let mut config = ResolverConfig::new();
            for ip in r.split(',').filter_map(|r| IpAddr::from_str(r.trim()).ok()) {
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(ip, 53),
                    Protocol::Udp,
                ));
            }
            TokioAsyncResolver::tokio(config, ResolverOpts::default())
        }
        None => TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
            TokioAsyncResolver::tokio(ResolverConfig::cloudflare_tls(), ResolverOpts::default())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_host;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn resolves_ipv4_literal_without_lookup() {
        let ip = resolve_host("127.0.0.1", None).await;
        assert_eq!(ip, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }

    #[tokio::test]
    async fn resolves_ipv6_literal_without_lookup() {
        let ip = resolve_host("::1", None).await;
        assert_eq!(ip, Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[tokio::test]
    async fn resolves_localhost_name() {
        let ip = resolve_host("localhost", None).await;
        assert!(ip.is_some());
        assert!(ip.unwrap().is_loopback());
    }
}
