// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for depth providers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Number of interleaved `f32` channels per depth sample
pub const DEPTH_CHANNELS: usize = 4;

/// Channel carrying the depth value (`[X, Y, Z, depth]`)
pub const DEPTH_VALUE_CHANNEL: usize = 3;

/// Output resolution of a depth retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in the grid
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of `f32` values in a flattened 4-channel grid
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * DEPTH_CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Fixed-size grid of 4-channel `f32` depth samples
///
/// Pixels are stored row-major (`y * width + x`), each pixel holding its four
/// channels contiguously. The buffer is allocated once and then overwritten
/// in place by every retrieval.
#[derive(Clone, PartialEq)]
pub struct DepthBuffer {
    resolution: Resolution,
    pixels: Vec<[f32; DEPTH_CHANNELS]>,
}

impl DepthBuffer {
    /// Allocate a zeroed buffer for the given resolution
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            pixels: vec![[0.0; DEPTH_CHANNELS]; resolution.pixel_count()],
        }
    }

    /// Rebuild a buffer from a flat, channel-interleaved sample sequence
    ///
    /// Returns `None` when `samples.len()` does not match the resolution.
    pub fn from_flat(resolution: Resolution, samples: &[f32]) -> Option<Self> {
        if samples.len() != resolution.sample_count() {
            return None;
        }
        let pixels = bytemuck::cast_slice::<f32, [f32; DEPTH_CHANNELS]>(samples).to_vec();
        Some(Self { resolution, pixels })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// All samples as one flat slice in row-major, channel-interleaved order
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixels(&self) -> &[[f32; DEPTH_CHANNELS]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[f32; DEPTH_CHANNELS]] {
        &mut self.pixels
    }

    /// Sample at column `x`, row `y`
    pub fn get(&self, x: u32, y: u32) -> Option<&[f32; DEPTH_CHANNELS]> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.resolution.width as usize + x as usize)
    }

    /// Address of the backing storage, used to check the buffer is reused
    pub fn storage_ptr(&self) -> *const f32 {
        self.as_flat().as_ptr()
    }

    /// Statistics over the finite values of one channel
    pub fn channel_stats(&self, channel: usize) -> Option<ChannelStats> {
        if channel >= DEPTH_CHANNELS {
            return None;
        }
        let mut stats = ChannelStats {
            valid: 0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            mean: 0.0,
        };
        let mut sum = 0.0f64;
        for value in self.pixels.iter().map(|px| px[channel]).filter(|v| v.is_finite()) {
            stats.valid += 1;
            stats.min = stats.min.min(value);
            stats.max = stats.max.max(value);
            sum += value as f64;
        }
        if stats.valid == 0 {
            return None;
        }
        stats.mean = (sum / stats.valid as f64) as f32;
        Some(stats)
    }
}

/// Summary of one channel of a [`DepthBuffer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    /// Number of finite samples
    pub valid: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl fmt::Debug for DepthBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DepthBuffer({}, {} samples)",
            self.resolution,
            self.resolution.sample_count()
        )
    }
}

/// Capture resolution requested from the camera at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraResolution {
    Hd2k,
    Hd1200,
    Hd1080,
    Hd720,
    Svga,
    Vga,
    /// Let the camera pick its default mode
    #[default]
    Auto,
}

impl CameraResolution {
    /// Keywords recognised on the command line, in match priority order
    pub const KEYWORDS: [(&'static str, CameraResolution); 6] = [
        ("HD2K", CameraResolution::Hd2k),
        ("HD1200", CameraResolution::Hd1200),
        ("HD1080", CameraResolution::Hd1080),
        ("HD720", CameraResolution::Hd720),
        ("SVGA", CameraResolution::Svga),
        ("VGA", CameraResolution::Vga),
    ];

    /// Sensor image size for this mode
    pub fn native_size(&self) -> Resolution {
        match self {
            CameraResolution::Hd2k => Resolution::new(2208, 1242),
            CameraResolution::Hd1200 => Resolution::new(1920, 1200),
            CameraResolution::Hd1080 => Resolution::new(1920, 1080),
            CameraResolution::Hd720 | CameraResolution::Auto => Resolution::new(1280, 720),
            CameraResolution::Svga => Resolution::new(960, 600),
            CameraResolution::Vga => Resolution::new(672, 376),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            CameraResolution::Hd2k => "HD2K",
            CameraResolution::Hd1200 => "HD1200",
            CameraResolution::Hd1080 => "HD1080",
            CameraResolution::Hd720 => "HD720",
            CameraResolution::Svga => "SVGA",
            CameraResolution::Vga => "VGA",
            CameraResolution::Auto => "AUTO",
        }
    }
}

/// Depth computation quality/speed trade-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    #[default]
    Performance,
    Quality,
    Ultra,
}

/// Unit of the measurements written into the depth buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateUnits {
    Millimeter,
    Centimeter,
    #[default]
    Meter,
}

impl CoordinateUnits {
    /// Factor converting meters into this unit
    pub fn per_meter(&self) -> f32 {
        match self {
            CoordinateUnits::Millimeter => 1000.0,
            CoordinateUnits::Centimeter => 100.0,
            CoordinateUnits::Meter => 1.0,
        }
    }
}

/// Axis convention for 3D measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    Image,
    #[default]
    RightHandedYUp,
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Locally attached camera
    #[default]
    Live,
    /// Playback of a recorded `.svo` capture
    Svo(PathBuf),
    /// Network stream from another host
    Stream { host: String, port: Option<u16> },
}

impl InputSource {
    pub fn kind(&self) -> &'static str {
        match self {
            InputSource::Live => "live",
            InputSource::Svo(_) => "svo",
            InputSource::Stream { .. } => "stream",
        }
    }
}

/// Parameters used to open a depth camera
#[derive(Debug, Clone, PartialEq)]
pub struct InitParameters {
    pub input: InputSource,
    pub camera_resolution: CameraResolution,
    pub depth_mode: DepthMode,
    pub coordinate_units: CoordinateUnits,
    pub coordinate_system: CoordinateSystem,
}

impl Default for InitParameters {
    fn default() -> Self {
        Self {
            input: InputSource::Live,
            camera_resolution: CameraResolution::Auto,
            depth_mode: DepthMode::Performance,
            coordinate_units: CoordinateUnits::Meter,
            coordinate_system: CoordinateSystem::RightHandedYUp,
        }
    }
}

/// Information reported by an opened camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInformation {
    pub model: String,
    pub serial_number: u32,
    pub native_resolution: Resolution,
    pub input_kind: &'static str,
}

/// Status codes reported by depth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Failure,
    CameraNotDetected,
    CameraNotInitialized,
    InvalidResolution,
    InvalidSvoFile,
    EndOfSvoFileReached,
    CameraStreamFailedToStart,
    NoGpuCompatible,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Failure => "FAILURE",
            ErrorCode::CameraNotDetected => "CAMERA NOT DETECTED",
            ErrorCode::CameraNotInitialized => "CAMERA NOT INITIALIZED",
            ErrorCode::InvalidResolution => "INVALID RESOLUTION",
            ErrorCode::InvalidSvoFile => "INVALID SVO FILE",
            ErrorCode::EndOfSvoFileReached => "END OF SVOFILE REACHED",
            ErrorCode::CameraStreamFailedToStart => "CAMERA STREAM FAILED TO START",
            ErrorCode::NoGpuCompatible => "NO GPU COMPATIBLE",
            ErrorCode::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ErrorCode {}

/// Failure while copying a measurement into the caller's buffer
#[derive(Debug, Clone, PartialEq)]
pub enum RetrieveError {
    /// `grab` has not produced a measurement yet
    NoMeasurement,
    /// Buffer size does not match the requested resolution
    BufferMismatch {
        expected: Resolution,
        actual: Resolution,
    },
    /// Requested resolution is zero or larger than the sensor
    InvalidResolution(Resolution),
    /// Provider-specific failure
    Provider(String),
}

impl fmt::Display for RetrieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrieveError::NoMeasurement => write!(f, "No measurement available"),
            RetrieveError::BufferMismatch { expected, actual } => write!(
                f,
                "Buffer is {} but {} was requested",
                actual, expected
            ),
            RetrieveError::InvalidResolution(res) => {
                write!(f, "Invalid output resolution: {}", res)
            }
            RetrieveError::Provider(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RetrieveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count() {
        let res = Resolution::new(720, 404);
        assert_eq!(res.pixel_count(), 290_880);
        assert_eq!(res.sample_count(), 720 * 404 * DEPTH_CHANNELS);
        assert_eq!(res.sample_count(), 1_163_520);
    }

    #[test]
    fn test_flat_layout_is_row_major() {
        let res = Resolution::new(3, 2);
        let mut buffer = DepthBuffer::new(res);
        for (i, px) in buffer.pixels_mut().iter_mut().enumerate() {
            let base = i as f32 * 10.0;
            *px = [base, base + 1.0, base + 2.0, base + 3.0];
        }

        let flat = buffer.as_flat();
        assert_eq!(flat.len(), 24);
        // Pixel (x=1, y=1) is the 5th pixel
        assert_eq!(buffer.get(1, 1), Some(&[40.0, 41.0, 42.0, 43.0]));
        assert_eq!(&flat[16..20], &[40.0, 41.0, 42.0, 43.0]);
        assert_eq!(buffer.get(3, 0), None);
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        let res = Resolution::new(2, 2);
        assert!(DepthBuffer::from_flat(res, &[0.0; 15]).is_none());

        let samples: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let buffer = DepthBuffer::from_flat(res, &samples).unwrap();
        assert_eq!(buffer.as_flat(), samples.as_slice());
    }

    #[test]
    fn test_channel_stats_skip_non_finite() {
        let res = Resolution::new(3, 1);
        let samples = [
            0.0, 0.0, 0.0, 1.0, //
            0.0, 0.0, 0.0, f32::NAN, //
            0.0, 0.0, 0.0, 3.0,
        ];
        let buffer = DepthBuffer::from_flat(res, &samples).unwrap();

        let stats = buffer.channel_stats(3).unwrap();
        assert_eq!(stats.valid, 2);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, 2.0);
        assert!(buffer.channel_stats(4).is_none());
    }

    #[test]
    fn test_keyword_priority_order() {
        let order: Vec<&str> = CameraResolution::KEYWORDS.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, ["HD2K", "HD1200", "HD1080", "HD720", "SVGA", "VGA"]);
        for (keyword, mode) in CameraResolution::KEYWORDS {
            assert_eq!(mode.keyword(), keyword);
        }
    }
}
