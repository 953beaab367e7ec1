//! Frame ingestion.
//!
//! Sources produce RGB [`Frame`]s for the classification loop: the V4L2
//! camera on real hardware (feature `camera`), or [`StubSource`] for tests
//! and bring-up.

#[cfg(all(feature = "camera", target_os = "linux"))]
pub mod v4l2;

use image::imageops::FilterType;
use image::RgbImage;

use crate::error::{Result, TeachableError};

/// An owned RGB8 image, row major.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(TeachableError::InvalidInput(format!(
                "Frame data is {} bytes, expected {} for {}x{} RGB",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Single-color frame, handy for tests.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Scaled copy of the frame (no-op when the size already matches).
    pub fn resized(&self, width: u32, height: u32) -> Result<Frame> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img: RgbImage = RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| {
                TeachableError::InvalidInput("Frame buffer does not match its dimensions".into())
            })?;
        let resized = image::imageops::resize(&img, width, height, FilterType::Triangle);
        Ok(Frame {
            width,
            height,
            data: resized.into_raw(),
        })
    }
}

/// Produces frames for the classification loop.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Replays a fixed set of frames, cycling when exhausted.
pub struct StubSource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl StubSource {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(TeachableError::InvalidInput(
                "StubSource needs at least one frame".into(),
            ));
        }
        Ok(Self { frames, cursor: 0 })
    }
}

impl FrameSource for StubSource {
    fn next_frame(&mut self) -> Result<Frame> {
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
        assert!(Frame::new(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn solid_frames_have_uniform_pixels() {
        let frame = Frame::solid(4, 2, [1, 2, 3]);
        assert_eq!(frame.data().len(), 4 * 2 * 3);
        assert!(frame.data().chunks(3).all(|px| px == [1, 2, 3]));
    }

    #[test]
    fn resized_changes_dimensions() {
        let frame = Frame::solid(8, 8, [10, 20, 30]);
        let small = frame.resized(2, 2).unwrap();
        assert_eq!((small.width(), small.height()), (2, 2));
        assert_eq!(small.data().len(), 2 * 2 * 3);
    }

    #[test]
    fn stub_source_cycles() {
        let red = Frame::solid(1, 1, [255, 0, 0]);
        let blue = Frame::solid(1, 1, [0, 0, 255]);
        let mut source = StubSource::new(vec![red, blue]).unwrap();
        assert_eq!(source.next_frame().unwrap().data()[0], 255);
        assert_eq!(source.next_frame().unwrap().data()[0], 0);
        assert_eq!(source.next_frame().unwrap().data()[0], 255);
    }

    #[test]
    fn stub_source_requires_frames() {
        assert!(StubSource::new(Vec::new()).is_err());
    }
}
