// SPDX-License-Identifier: GPL-3.0-only

//! Simulated stereo depth camera
//!
//! Stands in for a vendor SDK: it honours the open/grab/retrieve/close
//! contract and renders a deterministic synthetic scene, a rippled surface
//! in front of the camera that drifts a little on every grab. Samples are
//! written as `[X, Y, Z, depth]` in the configured units.
//!
//! Failures can be scripted with the `with_*` builders so the bridge's
//! error paths can be exercised without hardware.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use tracing::{debug, info, warn};

use super::DepthCamera;
use super::types::*;

/// Horizontal focal length as a fraction of the image width
const FOCAL_RATIO: f32 = 0.7;
/// Mean distance of the synthetic surface, in meters
const BASE_DEPTH_M: f32 = 1.5;
/// Amplitude of the surface ripple, in meters
const RIPPLE_M: f32 = 0.4;
/// Phase advance of the ripple per grabbed frame
const PHASE_STEP: f32 = 0.1;

/// Synthetic depth camera
#[derive(Debug, Default)]
pub struct SimulatedCamera {
    params: Option<InitParameters>,
    serial_number: u32,
    frame_index: u64,
    has_measurement: bool,
    open_error: Option<ErrorCode>,
    /// Per-grab outcome, `Some` fails that grab; empty means succeed
    grab_script: VecDeque<Option<ErrorCode>>,
    /// Per-retrieval outcome, `true` fails that retrieval; empty means succeed
    retrieve_script: VecDeque<bool>,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            serial_number: 10_000_001,
            ..Default::default()
        }
    }

    /// Make `open` fail with `code`
    pub fn with_open_error(mut self, code: ErrorCode) -> Self {
        self.open_error = Some(code);
        self
    }

    /// Make the next grabs fail, one code per grab, in order
    pub fn with_grab_failures(self, codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        self.with_grab_script(codes.into_iter().map(Some))
    }

    /// Script upcoming grabs: `None` succeeds, `Some(code)` fails with `code`
    pub fn with_grab_script(mut self, script: impl IntoIterator<Item = Option<ErrorCode>>) -> Self {
        self.grab_script.extend(script);
        self
    }

    /// Make the next `count` retrievals fail
    pub fn with_retrieve_failures(self, count: usize) -> Self {
        self.with_retrieve_script(std::iter::repeat_n(true, count))
    }

    /// Script upcoming retrievals: `true` fails, `false` succeeds
    pub fn with_retrieve_script(mut self, script: impl IntoIterator<Item = bool>) -> Self {
        self.retrieve_script.extend(script);
        self
    }

    pub fn with_serial_number(mut self, serial_number: u32) -> Self {
        self.serial_number = serial_number;
        self
    }

    /// Number of successful grabs since open
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn is_open(&self) -> bool {
        self.params.is_some()
    }

    fn render(&self, params: &InitParameters, buffer: &mut DepthBuffer) {
        let resolution = buffer.resolution();
        let width = resolution.width as f32;
        let height = resolution.height as f32;
        let focal = FOCAL_RATIO * width;
        let (cx, cy) = (width / 2.0, height / 2.0);
        let phase = self.frame_index as f32 * PHASE_STEP;
        let scale = params.coordinate_units.per_meter();
        let y_up = params.coordinate_system == CoordinateSystem::RightHandedYUp;

        let row_len = resolution.width as usize;
        for (row, pixels) in buffer.pixels_mut().chunks_mut(row_len).enumerate() {
            let py = row as f32 + 0.5;
            let v = py / height;
            for (col, pixel) in pixels.iter_mut().enumerate() {
                let px = col as f32 + 0.5;
                let u = px / width;
                let depth = BASE_DEPTH_M + RIPPLE_M * (u * TAU + phase).sin() * (v * PI).cos();

                let x = (px - cx) / focal * depth;
                let y_down = (py - cy) / focal * depth;
                let (y, z) = if y_up {
                    (-y_down, -depth)
                } else {
                    (y_down, depth)
                };

                *pixel = [x * scale, y * scale, z * scale, depth * scale];
            }
        }
    }
}

impl DepthCamera for SimulatedCamera {
    fn open(&mut self, params: &InitParameters) -> Result<(), ErrorCode> {
        if let Some(code) = self.open_error {
            warn!(%code, "Simulated camera refused to open");
            return Err(code);
        }

        if let InputSource::Svo(path) = &params.input
            && !path.is_file()
        {
            warn!(path = %path.display(), "SVO file not found");
            return Err(ErrorCode::InvalidSvoFile);
        }

        info!(
            input = params.input.kind(),
            resolution = params.camera_resolution.keyword(),
            depth_mode = ?params.depth_mode,
            units = ?params.coordinate_units,
            "Simulated camera opened"
        );

        self.params = Some(params.clone());
        self.frame_index = 0;
        self.has_measurement = false;
        Ok(())
    }

    fn grab(&mut self) -> Result<(), ErrorCode> {
        if self.params.is_none() {
            return Err(ErrorCode::CameraNotInitialized);
        }
        if let Some(code) = self.grab_script.pop_front().flatten() {
            debug!(%code, "Injected grab failure");
            return Err(code);
        }

        self.frame_index += 1;
        self.has_measurement = true;
        Ok(())
    }

    fn retrieve_depth(
        &mut self,
        buffer: &mut DepthBuffer,
        resolution: Resolution,
    ) -> Result<(), RetrieveError> {
        let Some(params) = self.params.as_ref() else {
            return Err(RetrieveError::NoMeasurement);
        };
        if !self.has_measurement {
            return Err(RetrieveError::NoMeasurement);
        }

        let native = params.camera_resolution.native_size();
        if resolution.is_empty()
            || resolution.width > native.width
            || resolution.height > native.height
        {
            return Err(RetrieveError::InvalidResolution(resolution));
        }
        if buffer.resolution() != resolution {
            return Err(RetrieveError::BufferMismatch {
                expected: resolution,
                actual: buffer.resolution(),
            });
        }
        if self.retrieve_script.pop_front().unwrap_or(false) {
            return Err(RetrieveError::Provider(
                "injected retrieve failure".to_string(),
            ));
        }

        self.render(params, buffer);
        Ok(())
    }

    fn close(&mut self) {
        if self.params.take().is_some() {
            debug!(frames = self.frame_index, "Simulated camera closed");
        }
        self.has_measurement = false;
    }

    fn camera_information(&self) -> CameraInformation {
        let params = self.params.clone().unwrap_or_default();
        CameraInformation {
            model: "Simulated Stereo Camera".to_string(),
            serial_number: self.serial_number,
            native_resolution: params.camera_resolution.native_size(),
            input_kind: params.input.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn opened() -> SimulatedCamera {
        let mut camera = SimulatedCamera::new();
        camera.open(&InitParameters::default()).unwrap();
        camera
    }

    #[test]
    fn test_grab_requires_open() {
        let mut camera = SimulatedCamera::new();
        assert_eq!(camera.grab(), Err(ErrorCode::CameraNotInitialized));
    }

    #[test]
    fn test_missing_svo_is_rejected() {
        let mut camera = SimulatedCamera::new();
        let params = InitParameters {
            input: InputSource::Svo(PathBuf::from("/nonexistent/capture.svo")),
            ..Default::default()
        };
        assert_eq!(camera.open(&params), Err(ErrorCode::InvalidSvoFile));
        assert!(!camera.is_open());
    }

    #[test]
    fn test_retrieve_before_grab() {
        let mut camera = opened();
        let res = Resolution::new(4, 4);
        let mut buffer = DepthBuffer::new(res);
        assert_eq!(
            camera.retrieve_depth(&mut buffer, res),
            Err(RetrieveError::NoMeasurement)
        );
    }

    #[test]
    fn test_retrieve_fills_in_place() {
        let mut camera = opened();
        let res = Resolution::new(720, 404);
        let mut buffer = DepthBuffer::new(res);
        let ptr = buffer.storage_ptr();

        camera.grab().unwrap();
        camera.retrieve_depth(&mut buffer, res).unwrap();

        assert_eq!(buffer.storage_ptr(), ptr);
        let center = buffer.get(360, 202).unwrap();
        assert!(center[3] > BASE_DEPTH_M - RIPPLE_M && center[3] < BASE_DEPTH_M + RIPPLE_M);
        // Y-up right-handed: points in front of the camera have negative Z
        assert_eq!(center[2], -center[3]);
    }

    #[test]
    fn test_units_scale_measurements() {
        let res = Resolution::new(8, 8);
        let mut meters = opened();
        let mut millimeters = SimulatedCamera::new();
        millimeters
            .open(&InitParameters {
                coordinate_units: CoordinateUnits::Millimeter,
                ..Default::default()
            })
            .unwrap();

        let mut a = DepthBuffer::new(res);
        let mut b = DepthBuffer::new(res);
        meters.grab().unwrap();
        millimeters.grab().unwrap();
        meters.retrieve_depth(&mut a, res).unwrap();
        millimeters.retrieve_depth(&mut b, res).unwrap();

        let da = a.get(3, 3).unwrap()[3];
        let db = b.get(3, 3).unwrap()[3];
        assert!((db - da * 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_resolution_larger_than_sensor() {
        let mut camera = SimulatedCamera::new();
        camera
            .open(&InitParameters {
                camera_resolution: CameraResolution::Vga,
                ..Default::default()
            })
            .unwrap();
        camera.grab().unwrap();

        let res = Resolution::new(720, 404);
        let mut buffer = DepthBuffer::new(res);
        assert_eq!(
            camera.retrieve_depth(&mut buffer, res),
            Err(RetrieveError::InvalidResolution(res))
        );
    }

    #[test]
    fn test_scripted_failures_are_consumed() {
        let mut camera = SimulatedCamera::new()
            .with_grab_failures([ErrorCode::Timeout])
            .with_retrieve_failures(1);
        camera.open(&InitParameters::default()).unwrap();

        assert_eq!(camera.grab(), Err(ErrorCode::Timeout));
        assert_eq!(camera.grab(), Ok(()));

        let res = Resolution::new(2, 2);
        let mut buffer = DepthBuffer::new(res);
        assert!(matches!(
            camera.retrieve_depth(&mut buffer, res),
            Err(RetrieveError::Provider(_))
        ));
        assert_eq!(buffer.as_flat(), &[0.0; 16]);
        assert!(camera.retrieve_depth(&mut buffer, res).is_ok());
        assert_eq!(camera.frame_index(), 1);
    }
}
