// SPDX-License-Identifier: GPL-3.0-only

//! Command-line source token parsing
//!
//! The bridge accepts at most one positional token that selects either the
//! input (recorded `.svo` file or network stream) or the capture resolution.
//! Parsing never fails: a token that matches nothing yields
//! [`SourceArg::Unrecognized`] and leaves the camera defaults untouched.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use super::types::{CameraResolution, InitParameters, InputSource};

/// Interpretation of the positional source token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceArg {
    /// Play back a recorded capture file
    Svo(PathBuf),
    /// Network stream with an explicit port (`A.B.C.D:PORT`)
    StreamWithPort { ip: Ipv4Addr, port: u16 },
    /// Network stream addressed by IP only (`A.B.C.D`)
    Stream(String),
    /// Requested capture resolution
    Resolution(CameraResolution),
    /// Token matched none of the accepted forms
    Unrecognized,
}

impl SourceArg {
    /// Parse a token, checking the accepted forms in priority order
    pub fn parse(token: &str) -> Self {
        if token.contains(".svo") {
            return SourceArg::Svo(PathBuf::from(token));
        }

        if let Some((ip, port)) = token.split_once(':')
            && let Some(ip) = parse_octets(ip)
            && let Some(port) = parse_digits::<u16>(port)
        {
            return SourceArg::StreamWithPort { ip, port };
        }

        if !token.contains(':')
            && let Some(ip) = parse_octets(token)
        {
            return SourceArg::Stream(ip.to_string());
        }

        // SVGA is checked before VGA, and VGA is skipped whenever SVGA is present
        for (keyword, resolution) in CameraResolution::KEYWORDS {
            if resolution == CameraResolution::Vga && token.contains("SVGA") {
                continue;
            }
            if token.contains(keyword) {
                return SourceArg::Resolution(resolution);
            }
        }

        debug!(token, "Source token matched no accepted form");
        SourceArg::Unrecognized
    }

    /// Apply this token to the open parameters
    pub fn apply(&self, params: &mut InitParameters) {
        match self {
            SourceArg::Svo(path) => {
                info!(path = %path.display(), "Using SVO file input");
                params.input = InputSource::Svo(path.clone());
            }
            SourceArg::StreamWithPort { ip, port } => {
                info!(%ip, port, "Stream input mode");
                params.input = InputSource::Stream {
                    host: ip.to_string(),
                    port: Some(*port),
                };
            }
            SourceArg::Stream(host) => {
                info!(host = %host, "Stream input mode");
                params.input = InputSource::Stream {
                    host: host.clone(),
                    port: None,
                };
            }
            SourceArg::Resolution(resolution) => {
                info!(mode = resolution.keyword(), "Using camera resolution");
                params.camera_resolution = *resolution;
            }
            SourceArg::Unrecognized => {}
        }
    }
}

/// Four dot-separated decimal octets; zero padding such as `001` is accepted
fn parse_octets(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        *octet = parse_digits(parts.next()?)?;
    }
    parts.next().is_none().then(|| Ipv4Addr::from(octets))
}

/// Plain decimal digits only, no sign or whitespace
fn parse_digits<T: FromStr>(text: &str) -> Option<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Build open parameters from defaults and an optional source token
pub fn resolve_init_parameters(base: InitParameters, token: Option<&str>) -> InitParameters {
    let mut params = base;
    if let Some(token) = token {
        SourceArg::parse(token).apply(&mut params);
    }
    params
}
