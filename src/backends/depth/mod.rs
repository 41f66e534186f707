// SPDX-License-Identifier: GPL-3.0-only

//! Depth provider abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │     Bridge loop     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    CameraSession    │  ← Scoped ownership, closes on drop
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  DepthCamera trait  │  ← open / grab / retrieve / close
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │  Simulated  │  ← Concrete implementation
//!     └─────────────┘
//! ```

pub mod simulated;
pub mod source_arg;
pub mod types;

pub use simulated::SimulatedCamera;
pub use source_arg::{SourceArg, resolve_init_parameters};
pub use types::*;

use std::ops::{Deref, DerefMut};
use tracing::info;

/// Depth camera contract consumed by the bridge
///
/// Implementations wrap a vendor SDK or a stand-in. All calls are blocking
/// and are made from a single thread.
pub trait DepthCamera {
    /// Open the device with the given parameters
    fn open(&mut self, params: &InitParameters) -> Result<(), ErrorCode>;

    /// Capture one frame and compute its depth measurement
    fn grab(&mut self) -> Result<(), ErrorCode>;

    /// Copy the latest depth measurement, resampled to `resolution`, into `buffer`
    ///
    /// `buffer` is overwritten in place. On error its contents are left as
    /// they were before the call.
    fn retrieve_depth(
        &mut self,
        buffer: &mut DepthBuffer,
        resolution: Resolution,
    ) -> Result<(), RetrieveError>;

    /// Release the device
    fn close(&mut self);

    /// Static information about the opened device
    fn camera_information(&self) -> CameraInformation;
}

/// An opened camera that is closed exactly once
///
/// Closing happens on [`CameraSession::close`] or when the session is
/// dropped, whichever comes first.
pub struct CameraSession<C: DepthCamera> {
    camera: C,
    closed: bool,
}

impl<C: DepthCamera> CameraSession<C> {
    /// Open `camera`; on failure nothing is acquired and the camera is dropped
    pub fn open(mut camera: C, params: &InitParameters) -> Result<Self, ErrorCode> {
        camera.open(params)?;
        Ok(Self {
            camera,
            closed: false,
        })
    }

    pub fn close(&mut self) {
        if !self.closed {
            info!("Closing depth camera");
            self.camera.close();
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<C: DepthCamera> Deref for CameraSession<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.camera
    }
}

impl<C: DepthCamera> DerefMut for CameraSession<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.camera
    }
}

impl<C: DepthCamera> Drop for CameraSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingCamera {
        closes: Rc<Cell<u32>>,
        open_result: Result<(), ErrorCode>,
    }

    impl DepthCamera for CountingCamera {
        fn open(&mut self, _params: &InitParameters) -> Result<(), ErrorCode> {
            self.open_result
        }

        fn grab(&mut self) -> Result<(), ErrorCode> {
            Ok(())
        }

        fn retrieve_depth(
            &mut self,
            _buffer: &mut DepthBuffer,
            _resolution: Resolution,
        ) -> Result<(), RetrieveError> {
            Ok(())
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }

        fn camera_information(&self) -> CameraInformation {
            CameraInformation {
                model: "counting".to_string(),
                serial_number: 0,
                native_resolution: Resolution::new(1, 1),
                input_kind: "live",
            }
        }
    }

    #[test]
    fn test_session_closes_once() {
        let closes = Rc::new(Cell::new(0));
        let camera = CountingCamera {
            closes: closes.clone(),
            open_result: Ok(()),
        };

        let mut session = CameraSession::open(camera, &InitParameters::default()).unwrap();
        session.close();
        session.close();
        assert!(session.is_closed());
        drop(session);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_session_closes_on_drop() {
        let closes = Rc::new(Cell::new(0));
        let camera = CountingCamera {
            closes: closes.clone(),
            open_result: Ok(()),
        };

        {
            let _session = CameraSession::open(camera, &InitParameters::default()).unwrap();
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_failed_open_never_closes() {
        let closes = Rc::new(Cell::new(0));
        let camera = CountingCamera {
            closes: closes.clone(),
            open_result: Err(ErrorCode::CameraNotDetected),
        };

        let result = CameraSession::open(camera, &InitParameters::default());
        assert_eq!(result.err(), Some(ErrorCode::CameraNotDetected));
        assert_eq!(closes.get(), 0);
    }
}
