//! Line-oriented TCP echo service.
//!
//! Each accepted connection gets its own tokio task that reads
//! newline-delimited messages and replies with a `Server echo: ` prefix.
//! A failing connection is recorded and dropped; it never takes down the
//! accept loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::report::Reporter;

/// Accepts connections on `listener` forever, echoing lines back to each
/// client. Returns only when the listener itself fails.
pub async fn serve(listener: TcpListener, reporter: Arc<dyn Reporter>) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        reporter.record(&format!("Connection from {peer}"));

        let reporter = Arc::clone(&reporter);
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, peer, &*reporter).await {
                reporter.record(&format!("Error with {peer}: {e}"));
            }
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    reporter: &dyn Reporter,
) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        debug!("received {} bytes from {peer}", line.len());
        reporter.record(&format!("Received from {peer}: {text}"));
        write_half
            .write_all(format!("Server echo: {text}\n").as_bytes())
            .await?;
    }

    reporter.record(&format!("{peer} disconnected"));
    Ok(())
}
