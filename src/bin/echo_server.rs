//! Standalone line-oriented TCP echo server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use portsweep::echo;
use portsweep::report::{Reporter, StdoutReporter};

#[derive(Parser, Debug)]
#[command(name = "echo-server", version = env!("CARGO_PKG_VERSION"))]
/// Simple TCP echo server. Echoes every received line back with a
/// "Server echo: " prefix. One task per connection.
struct Opts {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value = "9000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let listener = TcpListener::bind((opts.host.as_str(), opts.port))
        .await
        .with_context(|| format!("could not bind {}:{}", opts.host, opts.port))?;

    let reporter: Arc<dyn Reporter> = Arc::new(StdoutReporter);
    reporter.record(&format!("Server listening on {}:{}", opts.host, opts.port));

    echo::serve(listener, reporter).await?;
    Ok(())
}
