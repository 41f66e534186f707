// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::backends::depth::Resolution;
use std::time::Duration;

/// Endpoint the reply socket binds to
pub const DEFAULT_ENDPOINT: &str = "tcp://127.0.0.1:5555";

/// Resolution depth maps are resampled to before being sent
///
/// Independent of the camera's native resolution.
pub const DEFAULT_OUTPUT_RESOLUTION: Resolution = Resolution::new(720, 404);

/// Pause after each request/reply cycle
pub const CYCLE_DELAY: Duration = Duration::from_millis(200);

/// Payload sent by the probe client
pub const DEFAULT_PROBE_PAYLOAD: &str = "ping";

/// Longest request payload echoed into the log, in bytes
pub const REQUEST_LOG_LIMIT: usize = 64;

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "depth-bridge";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";
