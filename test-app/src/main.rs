// rfidlib test application -- CLI tool for exercising the MF700 reader
// backend against real hardware or a mock transport.
//
// Usage:
//   rfidlib-test-app --port /dev/ttyUSB0 monitor
//   rfidlib-test-app --port /dev/ttyUSB0 --baud 9600 monitor --duration 30
//   rfidlib-test-app --mock monitor
//   rfidlib-test-app --mock --mock-tags 0006541358,0001234567 monitor

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use rfidlib::mf700::{Mf700Builder, Mf700Reader};
use rfidlib::ReaderEvent;
use rfidlib_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rfidlib test application -- exercises the MF700 backend from the command
/// line.
#[derive(Parser)]
#[command(name = "rfidlib-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Override the default baud rate (9600).
    #[arg(long)]
    baud: Option<u32>,

    /// Use a mock transport instead of a real serial port.
    /// Useful for verifying CLI parsing and driver wiring without hardware.
    #[arg(long)]
    mock: bool,

    /// Comma-separated tag identifiers to play back through the mock
    /// transport. Only valid with --mock.
    #[arg(long, value_delimiter = ',')]
    mock_tags: Vec<String>,

    /// Log filter, e.g. "info" or "rfidlib_mf700=debug".
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Subscribe to tag detections and print them in real time.
    Monitor {
        /// Duration in seconds (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        duration: u64,

        /// Also print protocol diagnostics (malformed frames, overflows).
        #[arg(long)]
        diagnostics: bool,
    },
}

// ---------------------------------------------------------------------------
// Reader construction
// ---------------------------------------------------------------------------

/// Wire bytes for one well-formed MF700 tag frame.
fn mock_frame(tag: &str) -> Vec<u8> {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(tag.as_bytes());
    bytes.extend_from_slice(&[0x0D, 0x0A, 0x03]);
    bytes
}

/// Construct a reader from CLI arguments, either on a real serial port or
/// wrapped around a scripted mock transport.
async fn create_reader(cli: &Cli) -> Result<Mf700Reader> {
    if cli.mock {
        if cli.port.is_some() {
            bail!("--port is not valid with --mock");
        }

        let mut mock = MockTransport::new();
        let tags: Vec<&str> = if cli.mock_tags.is_empty() {
            vec!["0006541358", "0001234567"]
        } else {
            cli.mock_tags.iter().map(String::as_str).collect()
        };
        for tag in &tags {
            mock.push_chunk(&mock_frame(tag));
        }

        println!("Connected (mock transport) -- {} scripted tag(s)", tags.len());
        Ok(Mf700Builder::new().build_with_transport(Box::new(mock)))
    } else {
        if !cli.mock_tags.is_empty() {
            bail!("--mock-tags is only valid with --mock");
        }

        let port = cli
            .port
            .as_deref()
            .context("--port is required when not using --mock")?;
        let mut builder = Mf700Builder::new().serial_port(port);
        if let Some(baud) = cli.baud {
            builder = builder.baud_rate(baud);
        }

        let reader = builder
            .build()
            .await
            .with_context(|| format!("failed to open reader on {port}"))?;

        println!("Connected to {port}");
        Ok(reader)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_monitor(reader: &Mf700Reader, duration_secs: u64, diagnostics: bool) -> Result<()> {
    let mut events = reader.subscribe();
    let mut diags = reader.subscribe_diagnostics();
    reader.start().await?;

    println!("Monitoring tag detections (Ctrl-C to stop)...");

    let deadline = if duration_secs > 0 {
        Some(Instant::now() + Duration::from_secs(duration_secs))
    } else {
        None
    };

    let mut tag_count: u64 = 0;

    loop {
        let timeout = match deadline {
            Some(dl) => {
                let remaining = dl.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    println!("Monitor duration elapsed.");
                    break;
                }
                remaining
            }
            None => Duration::from_secs(3600),
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted.");
                break;
            }

            event = tokio::time::timeout(timeout, events.recv()) => match event {
                Ok(Ok(ReaderEvent::TagDetected(tag))) => {
                    tag_count += 1;
                    println!("[tag] {tag}");
                }
                Ok(Ok(ReaderEvent::Connected)) => {
                    println!("[event] reader connected");
                }
                Ok(Ok(ReaderEvent::Disconnected)) => {
                    println!("[event] reader disconnected");
                    break;
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                    println!("[warning] missed {n} events (consumer too slow)");
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                    println!("Event channel closed.");
                    break;
                }
                Err(_) => {
                    if deadline.is_some() {
                        println!("Monitor duration elapsed.");
                    }
                    break;
                }
            },

            diag = diags.recv(), if diagnostics => {
                if let Ok(diag) = diag {
                    println!("[diagnostic] {diag}");
                }
            }
        }
    }

    reader.stop().await?;
    println!();
    println!("{tag_count} tag(s) detected.");

    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log)
                .map_err(|e| anyhow::anyhow!("invalid --log filter: {e}"))?,
        )
        .init();

    let reader = create_reader(&cli).await?;

    let result = match &cli.command {
        Command::Monitor {
            duration,
            diagnostics,
        } => cmd_monitor(&reader, *duration, *diagnostics).await,
    };

    reader.close().await.ok();
    result
}
