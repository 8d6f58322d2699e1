//! Image codec: raw sensor frames to JPEG, JPEG to a transport-safe string.
//!
//! Two stages, both pure:
//! 1. [`encode`] turns a [`RawFrame`] into JPEG bytes. Planar YUV 4:2:0
//!    frames are reassembled into an NV21 buffer (Y, then V, then U) and
//!    compressed at [`COMPRESS_QUALITY`]; JPEG frames pass through.
//! 2. [`to_transport`] re-compresses at [`TRANSPORT_QUALITY`] and encodes
//!    with standard base64 (no line breaks). [`to_data_url`] prefixes the
//!    result with [`DATA_URL_PREFIX`].

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat, RgbImage};
use tracing::debug;

use crate::error::ErrorKind;

/// JPEG quality used when compressing a planar frame.
pub const COMPRESS_QUALITY: u8 = 90;

/// JPEG quality used for the transport re-compression.
pub const TRANSPORT_QUALITY: u8 = 80;

/// Prefix of every transport image handed to the UI layer.
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Platform code for three-plane YUV 4:2:0.
const FORMAT_CODE_YUV_420_888: i32 = 0x23;

/// Platform code for a compressed JPEG frame.
const FORMAT_CODE_JPEG: i32 = 0x100;

/// Chroma value meaning "no colour".
const NEUTRAL_CHROMA: u8 = 128;

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Largest width or height a baseline JPEG can describe.
pub const MAX_DIMENSION: u32 = 65_535;

/// A planar buffer must hold at least `expected / SHORT_BUFFER_DIVISOR`
/// bytes before the missing tail is padded.
const SHORT_BUFFER_DIVISOR: usize = 2;

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Three separate planes: Y, U, V.
    Yuv420Planar,
    /// Single plane holding a complete JPEG file.
    Jpeg,
    /// Any other platform format code.
    Other(i32),
}

impl PixelFormat {
    /// Map a platform format code.
    pub fn from_code(code: i32) -> Self {
        match code {
            FORMAT_CODE_YUV_420_888 => Self::Yuv420Planar,
            FORMAT_CODE_JPEG => Self::Jpeg,
            other => Self::Other(other),
        }
    }

    /// Platform format code.
    pub fn code(self) -> i32 {
        match self {
            Self::Yuv420Planar => FORMAT_CODE_YUV_420_888,
            Self::Jpeg => FORMAT_CODE_JPEG,
            Self::Other(code) => code,
        }
    }
}

/// One plane of pixel data, holding exactly its remaining bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    /// Plane bytes.
    pub data: Vec<u8>,
    /// Distance in bytes between two consecutive samples of this plane.
    ///
    /// Fully planar chroma has stride 1. Hardware chroma buffers that share
    /// memory with the other chroma plane have stride 2, in which case the
    /// V plane already reads as interleaved V/U pairs.
    pub pixel_stride: u32,
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Plane {
    /// Wrap tightly packed plane bytes (pixel stride 1).
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_stride(data, 1)
    }

    /// Wrap plane bytes whose samples are `pixel_stride` bytes apart.
    pub fn with_stride(data: Vec<u8>, pixel_stride: u32) -> Self {
        Self { data, pixel_stride }
    }

    /// Number of readable bytes.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

/// Frame as returned by the capture hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Pixel layout.
    pub format: PixelFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel planes, in platform order.
    pub planes: Vec<Plane>,
}

impl RawFrame {
    /// Planar YUV 4:2:0 frame from tightly packed Y, U and V planes.
    pub fn yuv420(width: u32, height: u32, y: Vec<u8>, u: Vec<u8>, v: Vec<u8>) -> Self {
        Self {
            format: PixelFormat::Yuv420Planar,
            width,
            height,
            planes: vec![Plane::new(y), Plane::new(u), Plane::new(v)],
        }
    }

    /// Pre-compressed JPEG frame.
    pub fn jpeg(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            format: PixelFormat::Jpeg,
            width,
            height,
            planes: vec![Plane::new(bytes)],
        }
    }
}

/// Convert a raw frame into JPEG bytes.
///
/// # Errors
///
/// - [`ErrorKind::InvalidBuffer`] when a required plane is missing or empty
///   (checked before any compression work).
/// - [`ErrorKind::UnsupportedFormat`] for any layout other than planar
///   YUV or JPEG.
/// - [`ErrorKind::EncodingFailed`] when compression fails or a JPEG frame
///   does not start with a JPEG marker.
pub fn encode(frame: &RawFrame) -> Result<Vec<u8>, ErrorKind> {
    match frame.format {
        PixelFormat::Yuv420Planar => {
            let nv21 = interleave_nv21(&frame.planes)?;
            let rgb = nv21_to_rgb(&nv21, frame.width, frame.height)?;
            compress(&rgb, COMPRESS_QUALITY)
        }
        PixelFormat::Jpeg => {
            let plane = frame
                .planes
                .first()
                .ok_or_else(|| ErrorKind::InvalidBuffer("jpeg frame has no planes".to_owned()))?;
            if plane.remaining() == 0 {
                return Err(ErrorKind::InvalidBuffer("jpeg plane is empty".to_owned()));
            }
            if !plane.data.starts_with(&JPEG_SOI) {
                return Err(ErrorKind::EncodingFailed(
                    "jpeg plane lacks start-of-image marker".to_owned(),
                ));
            }
            Ok(plane.data.clone())
        }
        PixelFormat::Other(code) => Err(ErrorKind::UnsupportedFormat(format!(
            "format code {code:#x}"
        ))),
    }
}

/// Re-compress JPEG bytes and encode them as line-break-free base64.
///
/// # Errors
///
/// Returns [`ErrorKind::EncodingFailed`] if the bytes do not decode as a
/// JPEG image or re-compression fails.
pub fn to_transport(bytes: &[u8]) -> Result<String, ErrorKind> {
    if bytes.is_empty() {
        return Err(ErrorKind::EncodingFailed("no image bytes".to_owned()));
    }
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| ErrorKind::EncodingFailed(format!("jpeg decode failed: {e}")))?;
    let jpeg = compress(&image.to_rgb8(), TRANSPORT_QUALITY)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
}

/// Full transport value: [`DATA_URL_PREFIX`] followed by [`to_transport`].
///
/// # Errors
///
/// Same as [`to_transport`].
pub fn to_data_url(bytes: &[u8]) -> Result<String, ErrorKind> {
    let encoded = to_transport(bytes)?;
    Ok(format!("{DATA_URL_PREFIX}{encoded}"))
}

/// Reassemble Y, U, V planes into one NV21-ordered buffer (Y, V, U).
///
/// Chroma planes with a pixel stride of 2 or more are appended as they
/// are, since the V plane already interleaves V/U. Packed chroma (stride 1)
/// is interleaved sample by sample, padding the shorter plane with neutral
/// chroma.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidBuffer`] if fewer than three planes are
/// present or any of them is empty.
pub fn interleave_nv21(planes: &[Plane]) -> Result<Vec<u8>, ErrorKind> {
    let (y, u, v) = match planes {
        [y, u, v, ..] => (y, u, v),
        _ => {
            return Err(ErrorKind::InvalidBuffer(format!(
                "expected 3 planes, got {}",
                planes.len()
            )))
        }
    };

    if y.remaining() == 0 || u.remaining() == 0 || v.remaining() == 0 {
        return Err(ErrorKind::InvalidBuffer(format!(
            "plane sizes Y={}, U={}, V={}",
            y.remaining(),
            u.remaining(),
            v.remaining()
        )));
    }

    let total = y
        .remaining()
        .saturating_add(u.remaining().max(v.remaining()).saturating_mul(2));
    let mut nv21 = Vec::with_capacity(total);
    nv21.extend_from_slice(&y.data);
    if u.pixel_stride > 1 || v.pixel_stride > 1 {
        nv21.extend_from_slice(&v.data);
        nv21.extend_from_slice(&u.data);
    } else {
        for i in 0..u.remaining().max(v.remaining()) {
            nv21.push(v.data.get(i).copied().unwrap_or(NEUTRAL_CHROMA));
            nv21.push(u.data.get(i).copied().unwrap_or(NEUTRAL_CHROMA));
        }
    }
    Ok(nv21)
}

/// Convert an NV21 buffer to RGB over the `width` x `height` rectangle.
///
/// Samples past the end of a short buffer read as black luma and
/// neutral chroma. Oversized frames and buffers holding less than half the
/// frame are rejected before the image is allocated.
fn nv21_to_rgb(nv21: &[u8], width: u32, height: u32) -> Result<RgbImage, ErrorKind> {
    if width == 0 || height == 0 {
        return Err(ErrorKind::EncodingFailed(format!(
            "frame has no area ({width}x{height})"
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ErrorKind::EncodingFailed(format!(
            "frame {width}x{height} exceeds {MAX_DIMENSION} pixels per side"
        )));
    }

    let w = to_index(width);
    let luma_len = w
        .checked_mul(to_index(height))
        .ok_or_else(|| ErrorKind::EncodingFailed("frame dimensions overflow".to_owned()))?;
    let chroma_stride = w.div_ceil(2).saturating_mul(2);
    let chroma_rows = to_index(height).div_ceil(2);
    let expected = luma_len.saturating_add(chroma_stride.saturating_mul(chroma_rows));
    if nv21.len() < expected.saturating_div(SHORT_BUFFER_DIVISOR) {
        return Err(ErrorKind::EncodingFailed(format!(
            "buffer holds {} bytes, {width}x{height} frame needs {expected}",
            nv21.len()
        )));
    }
    if nv21.len() < expected {
        debug!(
            have = nv21.len(),
            expected, "nv21 buffer shorter than frame, padding missing samples"
        );
    }

    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels_mut() {
        let col = to_index(x);
        let row = to_index(y);

        let luma_at = row.saturating_mul(w).saturating_add(col);
        let chroma_at = luma_len
            .saturating_add(row.saturating_div(2).saturating_mul(chroma_stride))
            .saturating_add(col.saturating_div(2).saturating_mul(2));

        let luma = nv21.get(luma_at).copied().unwrap_or(0);
        let v = nv21.get(chroma_at).copied().unwrap_or(NEUTRAL_CHROMA);
        let u = nv21
            .get(chroma_at.saturating_add(1))
            .copied()
            .unwrap_or(NEUTRAL_CHROMA);

        pixel.0 = yuv_to_rgb(luma, u, v);
    }
    Ok(rgb)
}

/// Full-range BT.601 conversion in 8.8 fixed point.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = i32::from(y);
    let d = i32::from(u).saturating_sub(128);
    let e = i32::from(v).saturating_sub(128);

    let r = c.saturating_add(e.saturating_mul(359).saturating_div(256));
    let g = c.saturating_sub(
        d.saturating_mul(88)
            .saturating_add(e.saturating_mul(183))
            .saturating_div(256),
    );
    let b = c.saturating_add(d.saturating_mul(454).saturating_div(256));

    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

fn clamp_u8(value: i32) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

fn to_index(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn compress(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ErrorKind> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ErrorKind::EncodingFailed(format!("jpeg compression failed: {e}")))?;
    Ok(out)
}
