//! Interactive line client for the echo server.
//!
//! Reads lines from stdin, sends each to the server, and prints the reply.
//! EOF or the server closing the connection ends the session cleanly.

use std::io::ErrorKind;
use std::process::exit;

use anyhow::Result;
use clap::Parser;
use tokio::io::{stdin, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use portsweep::report::{Reporter, StdoutReporter};

#[derive(Parser, Debug)]
#[command(name = "echo-client", version = env!("CARGO_PKG_VERSION"))]
/// Simple TCP client for the echo server. Type messages and press Enter;
/// Ctrl+D to quit.
struct Opts {
    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value = "9000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let reporter = StdoutReporter;

    reporter.record(&format!("Connecting to {}:{} ...", opts.host, opts.port));
    let stream = match TcpStream::connect((opts.host.as_str(), opts.port)).await {
        Ok(stream) => stream,
        Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
            eprintln!(
                "ERROR: could not connect to {}:{} (connection refused)",
                opts.host, opts.port
            );
            exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    reporter.record("Connected.");
    println!("Type messages and press Enter. Ctrl+D to quit.");

    let (read_half, mut write_half) = stream.into_split();
    let mut replies = BufReader::new(read_half).lines();
    let mut input = BufReader::new(stdin()).lines();

    while let Some(line) = input.next_line().await? {
        if line.is_empty() {
            continue;
        }

        write_half.write_all(format!("{line}\n").as_bytes()).await?;
        match replies.next_line().await? {
            Some(reply) => reporter.record(&format!("Server replied: {reply}")),
            None => {
                reporter.record("Server closed connection.");
                break;
            }
        }
    }

    reporter.record("Client exiting.");
    Ok(())
}
