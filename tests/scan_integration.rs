//! End-to-end scans against real loopback listeners.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use portsweep::input::parse_port_spec;
use portsweep::report::{MemoryReporter, Reporter};
use portsweep::scanner::Scanner;

async fn bind_loopback() -> (TcpListener, u16) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn finds_every_listening_port_in_a_parsed_spec() {
    let (first_listener, first) = bind_loopback().await;
    let (second_listener, second) = bind_loopback().await;

    // A port we know is free right now.
    let (probe, closed) = bind_loopback().await;
    drop(probe);

    let spec = format!("{first},{second},{closed}");
    let ports = parse_port_spec(&spec).unwrap();

    let reporter = Arc::new(MemoryReporter::new());
    let scanner = Scanner::new(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        ports,
        10,
        Duration::from_millis(500),
        Duration::ZERO,
        false,
        true,
        Arc::clone(&reporter) as Arc<dyn Reporter>,
    );
    let report = scanner.run().await;
    drop((first_listener, second_listener));

    let mut expected = vec![first, second];
    expected.sort_unstable();
    assert_eq!(report.open_ports, expected);
    assert_eq!(report.outcomes.len(), 3);

    // One progress line per probe, in completion order.
    let lines = reporter.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().any(|l| l == &format!("Port {first}: open")));
    assert!(lines.iter().any(|l| l.starts_with(&format!("Port {closed}: closed ("))));
}

#[tokio::test]
async fn pacing_delay_does_not_change_the_open_set() {
    let (listener, port) = bind_loopback().await;
    let ports: Vec<u16> = (port.saturating_sub(20)..=port).collect();

    let run = |delay: Duration, ports: Vec<u16>| {
        let reporter = Arc::new(MemoryReporter::new()) as Arc<dyn Reporter>;
        Scanner::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            ports,
            8,
            Duration::from_millis(500),
            delay,
            true,
            true,
            reporter,
        )
    };

    let unpaced = run(Duration::ZERO, ports.clone()).run().await;
    let paced = run(Duration::from_millis(2), ports).run().await;
    drop(listener);

    assert_eq!(unpaced.open_ports, paced.open_ports);
    assert!(paced.open_ports.contains(&port));
}

#[tokio::test]
async fn spec_parsing_fails_before_any_scan() {
    for bad in ["100-50", "0", "70000", "abc", "1-", "-5"] {
        assert!(parse_port_spec(bad).is_err(), "spec {bad:?} should fail");
    }
}
