//! V4L2 camera source.

use std::path::Path;

use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};
use yuvutils_rs::{yuyv422_to_rgb, YuvRange, YuvStandardMatrix};

use crate::error::{Result, TeachableError};
use crate::vision::{Frame, FrameSource};

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;
const BUFFER_COUNT: u32 = 4;

pub struct V4l2Source {
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
}

impl V4l2Source {
    pub fn open(path: &Path) -> Result<Self> {
        let device = Device::with_path(path).map_err(|e| {
            TeachableError::Camera(format!("Failed to open camera {}: {}", path.display(), e))
        })?;
        // The stream borrows the device for as long as frames flow; leak it
        // for a 'static capture handle.
        let device = Box::leak(Box::new(device));

        let mut fmt = device
            .format()
            .map_err(|e| TeachableError::Camera(format!("Failed to query camera format: {}", e)))?;
        fmt.width = CAPTURE_WIDTH;
        fmt.height = CAPTURE_HEIGHT;
        fmt.fourcc = FourCC::new(b"YUYV");
        let fmt = device
            .set_format(&fmt)
            .map_err(|e| TeachableError::Camera(format!("Failed to set camera format: {}", e)))?;
        if &fmt.fourcc.repr != b"YUYV" {
            return Err(TeachableError::Camera(format!(
                "Camera does not support YUYV capture (offered {})",
                fmt.fourcc
            )));
        }

        let stream = MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| TeachableError::Camera(format!("Failed to start capture stream: {}", e)))?;

        log::info!(
            "Camera {} streaming {}x{} YUYV",
            path.display(),
            fmt.width,
            fmt.height
        );
        Ok(Self {
            stream,
            width: fmt.width,
            height: fmt.height,
        })
    }
}

impl FrameSource for V4l2Source {
    fn next_frame(&mut self) -> Result<Frame> {
        let (buf, _meta) = self
            .stream
            .next()
            .map_err(|e| TeachableError::Camera(format!("Frame capture failed: {}", e)))?;

        let packed_len = self.width as usize * self.height as usize * 2;
        if buf.len() < packed_len {
            return Err(TeachableError::Camera(format!(
                "Short frame from camera: {} bytes, expected {}",
                buf.len(),
                packed_len
            )));
        }

        let mut rgb = vec![0u8; self.width as usize * self.height as usize * 3];
        yuyv422_to_rgb(
            &buf[..packed_len],
            self.width * 2,
            &mut rgb,
            self.width * 3,
            self.width,
            self.height,
            YuvRange::Limited,
            YuvStandardMatrix::Bt601,
        );

        Frame::new(self.width, self.height, rgb)
    }
}
