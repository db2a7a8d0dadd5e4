//! Monitor real-time tag detections.
//!
//! Demonstrates subscribing to the tag event stream and printing every
//! detection as it arrives, alongside the diagnostics channel so line
//! problems (garbled frames, a dropped port) are visible too. This is the
//! skeleton of an access-control or attendance front end.
//!
//! # Requirements
//!
//! - An MF700 reader connected via a USB serial adapter
//! - Serial port path adjusted for your system
//!
//! # Usage
//!
//! ```sh
//! cargo run -p rfidlib --example monitor_tags
//! ```

use std::time::Duration;

use rfidlib::mf700::Mf700Builder;
use rfidlib::ReaderEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let serial_port = "/dev/ttyUSB0";

    println!("Connecting to MF700 on {}...", serial_port);

    let reader = Mf700Builder::new().serial_port(serial_port).build().await?;

    // Subscribe before starting so the Connected event is not missed.
    let mut events = reader.subscribe();
    let mut diags = reader.subscribe_diagnostics();

    reader.start().await?;
    println!("Listening for 60 seconds. Hold a tag to the reader...\n");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    let start = tokio::time::Instant::now();

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        tokio::select! {
            event = tokio::time::timeout(remaining, events.recv()) => match event {
                Ok(Ok(event)) => {
                    let elapsed = start.elapsed();
                    let timestamp =
                        format!("{:>6}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis());

                    match event {
                        ReaderEvent::TagDetected(tag) => {
                            println!("{} TagDetected   {}", timestamp, tag);
                        }
                        ReaderEvent::Connected => {
                            println!("{} Connected", timestamp);
                        }
                        ReaderEvent::Disconnected => {
                            println!("{} Disconnected", timestamp);
                            break;
                        }
                    }
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                    println!("(missed {} events due to lag)", n);
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                    println!("Event channel closed.");
                    break;
                }
                Err(_) => {
                    // Timeout -- monitoring period elapsed.
                    break;
                }
            },

            diag = diags.recv() => {
                if let Ok(diag) = diag {
                    println!("(diagnostic: {diag})");
                }
            }
        }
    }

    reader.close().await?;
    println!("\nMonitoring complete.");
    Ok(())
}
