//! The `portsweep` binary: parse options, resolve the target once, run the
//! scan, print the summary.
//!
//! Exit codes: 0 when the scan ran to completion (whether or not any port was
//! open), 2 for invalid arguments including a malformed port specification
//! (clap's error status, raised before any I/O), 3 when the host cannot be
//! resolved.

use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::debug;

use portsweep::address::resolve_host;
use portsweep::input::{Config, Opts};
use portsweep::report::{Reporter, StdoutReporter};
use portsweep::scanner::Scanner;

const EXIT_BAD_ARGUMENTS: i32 = 2;
const EXIT_RESOLVE_FAILURE: i32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut opts = Opts::read();
    let config = Config::read(opts.config_path.clone());
    opts.merge(&config);

    debug!("main() `opts` arguments are {opts:?}");

    // The clap value parsers already reject these; the config file does not.
    if !(opts.timeout.is_finite() && opts.timeout > 0.0)
        || !(opts.delay.is_finite() && opts.delay >= 0.0)
    {
        eprintln!(
            "ERROR: timeout must be > 0 and delay >= 0 (got timeout={}, delay={})",
            opts.timeout, opts.delay
        );
        exit(EXIT_BAD_ARGUMENTS);
    }

    let ports = opts.ports.clone().unwrap_or_default();
    let reporter: Arc<dyn Reporter> = Arc::new(StdoutReporter);

    let Some(addr) = resolve_host(&opts.host, opts.resolver.as_deref()).await else {
        eprintln!("ERROR: host resolution failed for {}", opts.host);
        exit(EXIT_RESOLVE_FAILURE);
    };

    if !opts.greppable {
        reporter.record(&format!(
            "Starting scan on {} ({addr}) - {} ports (timeout={}, threads={})",
            opts.host,
            ports.len(),
            opts.timeout,
            opts.threads
        ));
    }

    let scanner = Scanner::new(
        addr,
        ports,
        opts.threads,
        Duration::from_secs_f64(opts.timeout),
        Duration::from_secs_f64(opts.delay),
        opts.greppable,
        opts.accessible,
        Arc::clone(&reporter),
    );
    let report = scanner.run().await;

    if opts.greppable {
        println!("{addr} -> {:?}", report.open_ports);
    } else {
        reporter.record(&format!(
            "Scan complete in {:.2}s. Open ports: {:?}",
            report.elapsed.as_secs_f64(),
            report.open_ports
        ));
    }

    Ok(())
}
