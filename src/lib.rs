// SPDX-License-Identifier: GPL-3.0-only

//! Depth Bridge - serves depth maps from a stereo depth camera on request
//!
//! A single loop waits on a ZeroMQ REP socket; each request triggers one
//! capture, one depth retrieval into a reusable buffer, and one JSON reply.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Depth camera contract and the simulated provider
//! - [`bridge`]: Request/reply loop, reply encoding and shutdown signalling
//! - [`config`]: Bridge configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let (trigger, signal) = shutdown_channel();
//! trigger.install_ctrlc_handler()?;
//! bridge::serve(SimulatedCamera::new(), &BridgeConfig::default(), None, signal).await?;
//! ```

pub mod backends;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use backends::depth::{DepthBuffer, DepthCamera, Resolution, SimulatedCamera};
pub use bridge::shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use bridge::{Bridge, BridgeSummary};
pub use config::BridgeConfig;
pub use errors::{BridgeError, BridgeResult};
