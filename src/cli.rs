// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands besides serving
//!
//! - Probing a running bridge
//! - Printing the effective configuration

use depth_bridge::BridgeConfig;
use depth_bridge::backends::depth::DEPTH_VALUE_CHANNEL;
use depth_bridge::bridge::reply::Reply;
use std::path::Path;
use std::time::{Duration, Instant};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// How long the probe waits for each reply
const PROBE_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Send `count` requests to the bridge at `endpoint` and summarize each reply
pub fn probe(endpoint: &str, count: u32, payload: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let mut socket = ReqSocket::new();
        socket.connect(endpoint).await?;
        println!("Connected to {}", endpoint);
        println!();

        for index in 0..count {
            let started = Instant::now();
            socket.send(ZmqMessage::from(payload.to_string())).await?;

            // A REQ socket cannot send again until it gets a reply, so stop here
            let Ok(message) = tokio::time::timeout(PROBE_REPLY_TIMEOUT, socket.recv()).await else {
                println!(
                    "  [{}] no reply within {}s (the bridge drops requests whose grab failed)",
                    index,
                    PROBE_REPLY_TIMEOUT.as_secs()
                );
                return Err("no reply from bridge".into());
            };
            let bytes: Vec<u8> = message?
                .into_vec()
                .into_iter()
                .flat_map(|frame| frame.to_vec())
                .collect();
            let elapsed = started.elapsed();

            match Reply::from_bytes(&bytes)? {
                Reply::Depth(parsed) => {
                    let buffer = parsed.to_buffer()?;
                    println!(
                        "  [{}] {} ({} values, {} bytes) in {:.1} ms",
                        index,
                        buffer.resolution(),
                        parsed.data.len(),
                        bytes.len(),
                        elapsed.as_secs_f64() * 1000.0
                    );
                    match buffer.channel_stats(DEPTH_VALUE_CHANNEL) {
                        Some(stats) => println!(
                            "      depth: min {:.3}  max {:.3}  mean {:.3}  ({} valid)",
                            stats.min, stats.max, stats.mean, stats.valid
                        ),
                        None => println!("      depth: no valid samples"),
                    }
                }
                Reply::Error(document) => {
                    println!(
                        "  [{}] {} failed: {}",
                        index, document.error.stage, document.error.code
                    );
                }
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Print the configuration the bridge would run with
pub fn print_config(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = BridgeConfig::load(path)?;
    match path.map(Path::to_path_buf).or_else(BridgeConfig::default_path) {
        Some(path) if path.is_file() => eprintln!("# from {}", path.display()),
        _ => eprintln!("# defaults"),
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
