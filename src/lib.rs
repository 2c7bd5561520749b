//! Internal functionality of the `portsweep` TCP toolkit.
//!
//! The crate ships three binaries: the `portsweep` port scanner, a small
//! line-oriented `echo-server`, and an interactive `echo-client`. The scanner
//! is the core: it probes every port of a parsed port set with a bounded
//! number of concurrent TCP connect attempts and reports which ports accepted
//! a connection.
//!
//! ## Architecture Overview
//!
//! 1. **Input Processing**: the port specification and CLI flags are parsed
//!    and validated ([`input`]).
//! 2. **Resolution**: the target host is resolved exactly once, before any
//!    scanning ([`address`]).
//! 3. **Scanning**: [`Scanner`](crate::scanner::Scanner) drives one connect
//!    probe per port, bounded by the configured batch size.
//! 4. **Reporting**: every probe outcome goes through an injected
//!    [`Reporter`](crate::report::Reporter); the final open-port list is
//!    sorted so output is deterministic regardless of completion order.
//!
//! ## Basic Usage Example
//!
//! ```no_run
//! use std::{net::IpAddr, sync::Arc, time::Duration};
//!
//! use portsweep::input::parse_port_spec;
//! use portsweep::report::StdoutReporter;
//! use portsweep::scanner::Scanner;
//!
//! #[tokio::main]
//! async fn main() {
//!     let addr = "127.0.0.1".parse::<IpAddr>().unwrap();
//!     let ports = parse_port_spec("22,80,8000-8010").unwrap();
//!
//!     let scanner = Scanner::new(
//!         addr,
//!         ports,
//!         50,                            // concurrent probes
//!         Duration::from_millis(500),    // per-probe timeout
//!         Duration::from_millis(10),     // pacing delay between completions
//!         false,                         // greppable
//!         false,                         // accessible
//!         Arc::new(StdoutReporter),
//!     );
//!
//!     let report = scanner.run().await;
//!     println!("open: {:?}", report.open_ports);
//! }
//! ```
#![warn(missing_docs)]

pub mod address;

pub mod echo;

pub mod input;

pub mod report;

pub mod scanner;
