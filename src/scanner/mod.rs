//! Core functionality for actual scanning behaviour.
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;
use futures::stream::{self, StreamExt};
use log::debug;
use tokio::{io::AsyncWriteExt, net::TcpStream, time};

use crate::report::Reporter;

/// The observed state of a single probed port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortState {
    /// The connection attempt succeeded.
    Open,
    /// The connection attempt failed with the given OS error code.
    Closed(i32),
    /// The attempt failed without an OS error code; holds a short detail
    /// string. Timeouts land here as `"timed out"`.
    Error(String),
}

impl PortState {
    /// Whether this state counts toward the open-port set.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed(code) => write!(f, "closed ({code})"),
            Self::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// The outcome of one probe. Every submitted port produces exactly one of
/// these, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOutcome {
    /// The probed port.
    pub port: u16,
    /// What the probe observed.
    pub state: PortState,
}

/// The aggregate result of a finished scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Ports whose probe succeeded, sorted ascending.
    pub open_ports: Vec<u16>,
    /// One outcome per submitted port, in completion order.
    pub outcomes: Vec<PortOutcome>,
    /// Wall-clock time from first submission to last collected outcome.
    pub elapsed: Duration,
}

#[derive(Debug)]
struct Prober {
    timeout: Duration,
}

impl Prober {
    /// Attempts one TCP connection to `socket` within `self.timeout`.
    ///
    /// The socket is owned by the connect future and released on every exit
    /// path, so no descriptor outlives the probe. Failures never propagate;
    /// they are folded into the returned [`PortState`].
    async fn probe(&self, socket: SocketAddr) -> PortOutcome {
        let state = match time::timeout(self.timeout, TcpStream::connect(socket)).await {
            Ok(Ok(mut stream)) => {
                debug!("connection to {socket} succeeded, shutting down stream");
                if let Err(e) = stream.shutdown().await {
                    debug!("shutdown error on {socket}: {e}");
                }
                PortState::Open
            }
            Ok(Err(e)) => match e.raw_os_error() {
                Some(code) => PortState::Closed(code),
                None => PortState::Error(e.to_string()),
            },
            Err(_) => PortState::Error(String::from("timed out")),
        };

        PortOutcome {
            port: socket.port(),
            state,
        }
    }
}

/// Drives one connection probe per port with bounded concurrency.
///
/// `batch_size` caps how many connection attempts are in flight at once,
/// independent of the port-set size. `delay` is applied by the single
/// consumer after each collected outcome; besides pacing result processing it
/// defers admission of new probes, throttling the effective outbound
/// connection rate.
pub struct Scanner {
    addr: IpAddr,
    ports: Vec<u16>,
    batch_size: u16,
    delay: Duration,
    greppable: bool,
    accessible: bool,
    reporter: Arc<dyn Reporter>,
    prober: Arc<Prober>,
}

#[allow(clippy::too_many_arguments)]
impl Scanner {
    /// Builds a scanner over `ports` on `addr`.
    #[must_use]
    pub fn new(
        addr: IpAddr,
        ports: Vec<u16>,
        batch_size: u16,
        timeout: Duration,
        delay: Duration,
        greppable: bool,
        accessible: bool,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            addr,
            ports,
            batch_size,
            delay,
            greppable,
            accessible,
            reporter,
            prober: Arc::new(Prober { timeout }),
        }
    }

    /// Runs the scan to completion and returns the aggregated report.
    ///
    /// Outcomes are collected in completion order; the returned open-port
    /// list is sorted ascending so the result is deterministic regardless of
    /// how completions interleave. An empty port set returns immediately.
    pub async fn run(&self) -> ScanReport {
        let start = Instant::now();

        debug!(
            "start scanning {} ports on {} with batch size {}",
            self.ports.len(),
            self.addr,
            self.batch_size
        );

        let mut outcomes_stream = stream::iter(self.ports.iter().copied())
            .map(|port| {
                let prober = Arc::clone(&self.prober);
                let socket = SocketAddr::new(self.addr, port);
                async move { prober.probe(socket).await }
            })
            .buffer_unordered(usize::from(self.batch_size).max(1));

        let mut outcomes = Vec::with_capacity(self.ports.len());
        let mut open_ports = Vec::new();

        while let Some(outcome) = outcomes_stream.next().await {
            if !self.greppable {
                self.report_outcome(&outcome);
            }
            if outcome.state.is_open() {
                open_ports.push(outcome.port);
            }
            outcomes.push(outcome);

            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
        }

        open_ports.sort_unstable();
        debug!("open ports found: {open_ports:?}");

        ScanReport {
            open_ports,
            outcomes,
            elapsed: start.elapsed(),
        }
    }

    fn report_outcome(&self, outcome: &PortOutcome) {
        let line = if outcome.state.is_open() && !self.accessible {
            format!("Port {}: {}", outcome.port, "open".purple())
        } else {
            format!("Port {}: {}", outcome.port, outcome.state)
        };
        self.reporter.record(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    fn scanner(addr: IpAddr, ports: Vec<u16>, batch_size: u16) -> (Scanner, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        let scanner = Scanner::new(
            addr,
            ports,
            batch_size,
            Duration::from_millis(500),
            Duration::ZERO,
            false,
            true,
            Arc::clone(&reporter) as Arc<dyn Reporter>,
        );
        (scanner, reporter)
    }

    async fn loopback_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn listening_port_reports_open() {
        let (listener, port) = loopback_listener().await;

        let (scanner, reporter) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), vec![port], 10);
        let report = scanner.run().await;
        drop(listener);

        assert_eq!(report.open_ports, vec![port]);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].state, PortState::Open);
        assert_eq!(reporter.lines(), vec![format!("Port {port}: open")]);
    }

    #[tokio::test]
    async fn refused_port_reports_closed_with_code() {
        // Bind then drop to find a port with nothing listening on it.
        let (listener, port) = loopback_listener().await;
        drop(listener);

        let (scanner, _reporter) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), vec![port], 10);
        let report = scanner.run().await;

        assert!(report.open_ports.is_empty());
        match &report.outcomes[0].state {
            PortState::Closed(code) => assert_ne!(*code, 0),
            other => panic!("expected refused connection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_port_produces_exactly_one_outcome() {
        let (listener, port) = loopback_listener().await;

        let mut ports: Vec<u16> = (port.saturating_sub(100)..port).collect();
        ports.push(port);
        let expected = ports.len();

        let (scanner, reporter) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), ports.clone(), 16);
        let report = scanner.run().await;
        drop(listener);

        assert_eq!(report.outcomes.len(), expected);
        assert_eq!(reporter.lines().len(), expected);

        let mut seen: Vec<u16> = report.outcomes.iter().map(|o| o.port).collect();
        seen.sort_unstable();
        assert_eq!(seen, ports);

        // The sorted open list must be a subsequence of the input ports.
        assert!(report.open_ports.windows(2).all(|w| w[0] < w[1]));
        assert!(report.open_ports.iter().all(|p| ports.contains(p)));
        assert!(report.open_ports.contains(&port));
    }

    #[tokio::test]
    async fn open_set_is_invariant_under_batch_size() {
        let (listener, port) = loopback_listener().await;
        let ports: Vec<u16> = (port.saturating_sub(50)..=port).collect();

        let (serial, _) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), ports.clone(), 1);
        let (wide, _) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), ports, 64);

        let first = serial.run().await;
        let second = wide.run().await;
        drop(listener);

        assert_eq!(first.open_ports, second.open_ports);
    }

    #[tokio::test]
    async fn empty_port_set_completes_immediately() {
        let (scanner, reporter) = scanner(IpAddr::V4(Ipv4Addr::LOCALHOST), vec![], 10);
        let report = scanner.run().await;

        assert!(report.open_ports.is_empty());
        assert!(report.outcomes.is_empty());
        assert!(reporter.lines().is_empty());
        assert!(report.elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn unresponsive_address_times_out_without_hanging() {
        // RFC 5737 TEST-NET-1, nothing routable should answer.
        let addr: IpAddr = "192.0.2.1".parse().unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let scanner = Scanner::new(
            addr,
            vec![81],
            1,
            Duration::from_millis(200),
            Duration::ZERO,
            true,
            true,
            reporter as Arc<dyn Reporter>,
        );

        let started = Instant::now();
        let report = scanner.run().await;

        assert!(report.open_ports.is_empty());
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].state.is_open());
        // Bounded by the probe timeout, with generous slack for slow CI.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn greppable_mode_records_no_progress_lines() {
        let (listener, port) = loopback_listener().await;
        let reporter = Arc::new(MemoryReporter::new());
        let scanner = Scanner::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            vec![port],
            10,
            Duration::from_millis(500),
            Duration::ZERO,
            true,
            true,
            Arc::clone(&reporter) as Arc<dyn Reporter>,
        );

        let report = scanner.run().await;
        drop(listener);

        assert_eq!(report.open_ports, vec![port]);
        assert!(reporter.lines().is_empty());
    }
}
