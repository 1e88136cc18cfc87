//! # External Encoder
//!
//! The encoder is treated as a black-box collaborator: something that takes
//! a raw pixel buffer and produces PNG/JPEG bytes. [`ImageEncoder`] is the
//! one concrete implementation, built on the `image` crate.

use crate::capture::{PixelFormat, RawFrame};
use crate::core::Mime;
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use image::{ImageBuffer, Rgba};
use std::io::Cursor;

/// A black-box encoder: raw pixels plus a target format/quality in, encoded
/// bytes out. Failures are never fatal to the owning session — the producer
/// loop drops the frame and continues.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, frame: &RawFrame, mime: Mime, quality: u32) -> CaptureResult<Vec<u8>>;
}

/// Encoder backed by the `image` crate's PNG/JPEG writers.
pub struct ImageEncoder;

#[async_trait]
impl Encoder for ImageEncoder {
    async fn encode(&self, frame: &RawFrame, mime: Mime, quality: u32) -> CaptureResult<Vec<u8>> {
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || encode_blocking(&frame, mime, quality))
            .await
            .map_err(|e| CaptureError::external("tokio::task", e))?
    }
}

fn encode_blocking(frame: &RawFrame, mime: Mime, quality: u32) -> CaptureResult<Vec<u8>> {
    let rgba = to_rgba8(frame)?;
    let mut out = Vec::new();
    match mime {
        Mime::Png => {
            rgba.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| CaptureError::processing("encode", e.to_string()))?;
        }
        Mime::Jpeg => {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut out,
                quality.clamp(1, 100) as u8,
            );
            encoder
                .encode_image(&rgba)
                .map_err(|e| CaptureError::processing("encode", e.to_string()))?;
        }
    }
    Ok(out)
}

fn to_rgba8(frame: &RawFrame) -> CaptureResult<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let mut rgba = vec![0u8; frame.width as usize * frame.height as usize * 4];
    match frame.format {
        PixelFormat::Bgra => {
            for (src, dst) in frame.data.chunks_exact(4).zip(rgba.chunks_exact_mut(4)) {
                dst[0] = src[2];
                dst[1] = src[1];
                dst[2] = src[0];
                dst[3] = 255;
            }
        }
        PixelFormat::Rgb => {
            for (src, dst) in frame.data.chunks_exact(3).zip(rgba.chunks_exact_mut(4)) {
                dst[0] = src[0];
                dst[1] = src[1];
                dst[2] = src[2];
                dst[3] = 255;
            }
        }
    }
    ImageBuffer::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| CaptureError::processing("encode", "buffer size does not match dimensions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(w: u32, h: u32) -> RawFrame {
        RawFrame {
            data: vec![10u8; (w * h * 4) as usize],
            width: w,
            height: h,
            format: PixelFormat::Bgra,
            monotonic_capture_ns: 0,
        }
    }

    #[tokio::test]
    async fn test_png_encode_produces_nonempty_bytes() {
        let encoder = ImageEncoder;
        let bytes = encoder
            .encode(&flat_frame(4, 4), Mime::Png, 85)
            .await
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_jpeg_encode_produces_nonempty_bytes() {
        let encoder = ImageEncoder;
        let bytes = encoder
            .encode(&flat_frame(4, 4), Mime::Jpeg, 80)
            .await
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }
}
