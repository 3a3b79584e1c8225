use serde::{Deserialize, Serialize};

use crate::error::{TexlinkError, TexlinkResult};
use crate::types::{VideoEncodedFrameFormat, VideoFrameFormat};

/// Bytes per pixel of the packed RGBA layout surfaces hold.
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Description of a raw frame delivered by the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFrameParam {
    /// Pixel layout of the frame.
    pub format: VideoFrameFormat,
    /// Per-plane row stride in bytes. Zero means tightly packed.
    pub strides: [u32; 4],
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Clockwise rotation in degrees the UI should apply.
    pub rotation: i32,
}

impl VideoFrameParam {
    /// A tightly packed RGBA32 frame of the given size.
    pub fn rgba(width: u32, height: u32) -> Self {
        Self {
            format: VideoFrameFormat::Rgba32,
            strides: [width * RGBA_BYTES_PER_PIXEL as u32, 0, 0, 0],
            width,
            height,
            rotation: 0,
        }
    }

    /// Row stride of the first plane, falling back to `width * 4`.
    pub fn stride(&self) -> usize {
        match self.strides[0] {
            0 => self.width as usize * RGBA_BYTES_PER_PIXEL,
            s => s as usize,
        }
    }

    /// Minimum number of bytes the first plane must hold.
    pub fn required_len(&self) -> usize {
        self.stride() * self.height as usize
    }
}

/// Description of an encoded remote frame. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFrameParam {
    pub format: VideoEncodedFrameFormat,
    pub is_key_frame: bool,
    pub rotation: i32,
    pub width: u32,
    pub height: u32,
    /// Supplemental enhancement information carried with the frame, if any.
    pub sei_data: Option<Vec<u8>>,
}

/// The raw RGBA backing store of a texture surface.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    /// Raw pixel data, `stride * height` bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub stride: u32,
}

impl FrameBuffer {
    /// Create a zeroed (transparent black) buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width * RGBA_BYTES_PER_PIXEL as u32;
        Self {
            data: vec![0u8; stride as usize * height as usize],
            width,
            height,
            stride,
        }
    }

    /// Copy a raw frame into this buffer, reallocating when the size changes.
    ///
    /// Only packed 32-bit frames whose stride holds a full row are accepted.
    /// Only the first `stride * height` bytes of `src` are copied; trailing
    /// padding the engine may append is ignored.
    pub fn copy_from(&mut self, src: &[u8], param: &VideoFrameParam) -> TexlinkResult<()> {
        if param.width == 0 || param.height == 0 {
            return Err(TexlinkError::invalid_frame(
                "zero-sized frame",
                param.width,
                param.height,
                src.len(),
            ));
        }
        let Some(bytes_per_pixel) = param.format.bytes_per_pixel() else {
            return Err(TexlinkError::invalid_frame(
                format!("unsupported pixel format {:?}", param.format),
                param.width,
                param.height,
                src.len(),
            ));
        };
        let row_len = param.width as usize * bytes_per_pixel;
        if param.stride() < row_len {
            return Err(TexlinkError::invalid_frame(
                format!("stride {} shorter than a {}-byte row", param.stride(), row_len),
                param.width,
                param.height,
                src.len(),
            ));
        }
        let required = param.required_len();
        if src.len() < required {
            return Err(TexlinkError::invalid_frame(
                format!("buffer shorter than {} bytes", required),
                param.width,
                param.height,
                src.len(),
            ));
        }

        self.data.clear();
        self.data.extend_from_slice(&src[..required]);
        self.width = param.width;
        self.height = param.height;
        self.stride = param.stride() as u32;
        Ok(())
    }

    /// Premultiply the color channels of every pixel by its alpha.
    pub fn premultiply_alpha(&mut self) {
        premultiply_alpha(
            &mut self.data,
            self.width,
            self.height,
            self.stride as usize,
        );
    }
}

/// Premultiply an RGBA buffer in place.
///
/// Each of the first three channels becomes `(c * a + 127) / 255`. The alpha
/// channel is left as is. Rows that do not fit in `data` are skipped.
pub fn premultiply_alpha(data: &mut [u8], width: u32, height: u32, stride: usize) {
    let row_len = width as usize * RGBA_BYTES_PER_PIXEL;
    for y in 0..height as usize {
        let start = y * stride;
        let Some(row) = data.get_mut(start..start + row_len) else {
            break;
        };
        for px in row.chunks_exact_mut(RGBA_BYTES_PER_PIXEL) {
            let a = px[3] as u32;
            px[0] = ((px[0] as u32 * a + 127) / 255) as u8;
            px[1] = ((px[1] as u32 * a + 127) / 255) as u8;
            px[2] = ((px[2] as u32 * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premultiply_full_alpha_is_identity() {
        for v in 0..=255u8 {
            let mut px = [v, v, v, 255];
            premultiply_alpha(&mut px, 1, 1, 4);
            assert_eq!(px, [v, v, v, 255]);
        }
    }

    #[test]
    fn test_premultiply_zero_alpha_clears_color() {
        let mut data = vec![200, 100, 50, 0, 255, 255, 255, 0];
        premultiply_alpha(&mut data, 2, 1, 8);
        assert_eq!(data, vec![0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_premultiply_rounds_half_up() {
        // 200 * 128 = 25600, (25600 + 127) / 255 = 100
        let mut px = [200, 1, 255, 128];
        premultiply_alpha(&mut px, 1, 1, 4);
        assert_eq!(px, [100, 1, 128, 128]);
    }

    #[test]
    fn test_premultiply_skips_row_padding() {
        // 1 pixel wide, stride 8: bytes 4..8 are padding and must not change.
        let mut data = vec![10, 20, 30, 0, 9, 9, 9, 9, 40, 50, 60, 0];
        premultiply_alpha(&mut data, 1, 2, 8);
        assert_eq!(&data[4..8], &[9, 9, 9, 9]);
        assert_eq!(&data[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_copy_from_resizes() {
        let mut fb = FrameBuffer::new(2, 2);
        let param = VideoFrameParam::rgba(3, 1);
        let src = vec![1u8; 12];
        fb.copy_from(&src, &param).unwrap();
        assert_eq!(fb.width, 3);
        assert_eq!(fb.height, 1);
        assert_eq!(fb.stride, 12);
        assert_eq!(fb.data, src);
    }

    #[test]
    fn test_copy_from_rejects_stride_narrower_than_row() {
        let mut fb = FrameBuffer::new(1, 1);
        let mut param = VideoFrameParam::rgba(4, 4);
        param.strides[0] = 4;
        let err = fb.copy_from(&[0u8; 16], &param).unwrap_err();
        assert!(matches!(err, TexlinkError::InvalidFrame { width: 4, height: 4, .. }));
        assert_eq!((fb.width, fb.height, fb.stride), (1, 1, 4));
    }

    #[test]
    fn test_copy_from_rejects_planar_format() {
        let mut fb = FrameBuffer::default();
        let mut param = VideoFrameParam::rgba(2, 2);
        param.format = VideoFrameFormat::I420;
        let err = fb.copy_from(&[0u8; 16], &param).unwrap_err();
        assert!(err.to_string().contains("I420"));
        assert!(fb.data.is_empty());
    }

    #[test]
    fn test_copy_from_keeps_padded_stride() {
        let mut fb = FrameBuffer::default();
        let mut param = VideoFrameParam::rgba(1, 2);
        param.strides[0] = 8;
        fb.copy_from(&[7u8; 20], &param).unwrap();
        assert_eq!(fb.stride, 8);
        assert_eq!(fb.data.len(), 16);
    }

    #[test]
    fn test_copy_from_rejects_short_buffer() {
        let mut fb = FrameBuffer::new(1, 1);
        let param = VideoFrameParam::rgba(4, 4);
        let err = fb.copy_from(&[0u8; 10], &param).unwrap_err();
        assert!(matches!(err, TexlinkError::InvalidFrame { .. }));
        assert_eq!(fb.width, 1);
    }

    #[test]
    fn test_stride_fallback() {
        let mut param = VideoFrameParam::rgba(10, 2);
        param.strides[0] = 0;
        assert_eq!(param.stride(), 40);
        param.strides[0] = 64;
        assert_eq!(param.required_len(), 128);
    }
}
