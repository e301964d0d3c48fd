//! OpenCV webcam backend and preview window (`camera` feature).
//!
//! [`OpenCvCamera`] implements [`CaptureDevice`] on top of
//! `videoio::VideoCapture` and runs on the capture thread.  [`LiveWindow`]
//! is the matching [`PreviewDisplay`]: it draws a translucent HUD strip with
//! the latest caption and status and polls for the `q` key.  Every `highgui`
//! call lives in `LiveWindow` or [`show_still`], both used from the main
//! thread only.

use std::time::Instant;

use image::ImageFormat;
use opencv::core::{self, Mat, Point, Rect, Scalar, Vector};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc, videoio};

use crate::config::ConfigError;
use crate::pipeline::DetectorStatus;

use super::{CaptureDevice, Frame, FrameError, PreviewDisplay, PreviewEvent};

const LIVE_WINDOW: &str = "Shop Detector (q to quit)";
const STILL_WINDOW: &str = "Shop Detector (image)";
const JPEG_QUALITY: i32 = 90;

// ---------------------------------------------------------------------------
// OpenCvCamera
// ---------------------------------------------------------------------------

pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
    frame: Mat,
}

impl OpenCvCamera {
    /// Open webcam `index`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::CameraOpen`] when the device cannot be opened.
    pub fn open(index: i32) -> Result<Self, ConfigError> {
        let open_err = |reason: String| ConfigError::CameraOpen { index, reason };

        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| open_err(e.to_string()))?;
        if !capture.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("device did not open".into()));
        }

        log::info!("camera: opened device {index}");
        Ok(Self {
            capture,
            frame: Mat::default(),
        })
    }
}

impl CaptureDevice for OpenCvCamera {
    type Preview = Mat;

    fn grab(&mut self) -> Result<(), FrameError> {
        match self.capture.read(&mut self.frame) {
            Ok(true) if self.frame.rows() > 0 => Ok(()),
            Ok(_) => Err(FrameError::Read("camera returned an empty frame".into())),
            Err(e) => Err(FrameError::Read(e.to_string())),
        }
    }

    fn encode(&mut self, captured_at: Instant) -> Result<Frame, FrameError> {
        let mut buf = Vector::<u8>::new();
        let params = Vector::<i32>::from_slice(&[imgcodecs::IMWRITE_JPEG_QUALITY, JPEG_QUALITY]);
        imgcodecs::imencode(".jpg", &self.frame, &mut buf, &params)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(Frame::encoded(buf.to_vec(), ImageFormat::Jpeg, captured_at))
    }

    fn preview_frame(&mut self) -> Option<Mat> {
        match self.frame.try_clone() {
            Ok(copy) => Some(copy),
            Err(e) => {
                log::warn!("camera: cannot copy frame for preview: {e}");
                None
            }
        }
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("camera: release failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// LiveWindow
// ---------------------------------------------------------------------------

/// Live preview window.  Create and drive it on the main thread.
#[derive(Default)]
pub struct LiveWindow {
    _main_thread_only: std::marker::PhantomData<*const ()>,
}

impl LiveWindow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewDisplay for LiveWindow {
    type Frame = Mat;

    fn show(&mut self, frame: Mat, status: &DetectorStatus) -> PreviewEvent {
        let shown = draw_hud(&frame, status).and_then(|hud| highgui::imshow(LIVE_WINDOW, &hud));
        if let Err(e) = shown {
            log::warn!("preview: {e}");
        }

        match highgui::wait_key(1) {
            Ok(key) if key & 0xFF == i32::from(b'q') => PreviewEvent::Quit,
            _ => PreviewEvent::Continue,
        }
    }
}

impl Drop for LiveWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}

// ---------------------------------------------------------------------------
// Still preview (image mode)
// ---------------------------------------------------------------------------

/// Show `frame` with the HUD until any key is pressed.
pub fn show_still(frame: &Frame, status: &DetectorStatus) -> Result<(), FrameError> {
    let encoded = Vector::<u8>::from_slice(&frame.data);
    let image = imgcodecs::imdecode(&encoded, imgcodecs::IMREAD_COLOR)
        .map_err(|e| FrameError::Read(e.to_string()))?;

    let shown = draw_hud(&image, status)
        .and_then(|hud| highgui::imshow(STILL_WINDOW, &hud))
        .and_then(|()| highgui::wait_key(0).map(|_| ()))
        .and_then(|()| highgui::destroy_all_windows());
    shown.map_err(|e| FrameError::Read(e.to_string()))
}

// ---------------------------------------------------------------------------
// HUD drawing
// ---------------------------------------------------------------------------

fn draw_hud(frame: &Mat, status: &DetectorStatus) -> opencv::Result<Mat> {
    let size = frame.size()?;
    let (w, h) = (size.width, size.height);

    let mut overlay = frame.try_clone()?;
    imgproc::rectangle(
        &mut overlay,
        Rect::new(0, (h - 80).max(0), w, 80.min(h)),
        Scalar::all(0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;

    let mut hud = Mat::default();
    core::add_weighted(&overlay, 0.4, frame, 0.6, 0.0, &mut hud, -1)?;

    imgproc::put_text(
        &mut hud,
        &status.caption_line(),
        Point::new(16, h - 46),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.6,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        imgproc::LINE_AA,
        false,
    )?;

    let colour = if status.is_positive_or_ready() {
        Scalar::new(0.0, 255.0, 0.0, 0.0)
    } else {
        Scalar::new(0.0, 165.0, 255.0, 0.0)
    };
    imgproc::put_text(
        &mut hud,
        &status.label,
        Point::new(16, h - 16),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        colour,
        2,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(hud)
}
