//! Frame encoding and transport encoding.

use base64::Engine as _;
use sentinel::codec::{self, PixelFormat, Plane, RawFrame, DATA_URL_PREFIX};
use sentinel::error::ErrorKind;

fn gradient_frame(width: u32, height: u32) -> RawFrame {
    let w = usize::try_from(width).expect("width fits");
    let h = usize::try_from(height).expect("height fits");
    let luma: Vec<u8> = (0..w.saturating_mul(h))
        .map(|i| u8::try_from(i & 0xFF).expect("masked to a byte"))
        .collect();
    let chroma_len = w.div_ceil(2).saturating_mul(h.div_ceil(2));
    RawFrame::yuv420(width, height, luma, vec![90; chroma_len], vec![170; chroma_len])
}

fn decode_payload(data_url: &str) -> Vec<u8> {
    let payload = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .expect("data url should carry the jpeg prefix");
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .expect("payload should be valid base64")
}

#[test]
fn planar_frame_becomes_jpeg_data_url() {
    let jpeg = codec::encode(&gradient_frame(32, 24)).expect("planar frame should encode");
    assert!(jpeg.starts_with(&[0xFF, 0xD8]));

    let url = codec::to_data_url(&jpeg).expect("jpeg should re-encode");
    let decoded = decode_payload(&url);
    assert!(decoded.starts_with(&[0xFF, 0xD8]));
    assert!(!url.contains('\n'));
}

#[test]
fn odd_dimensions_encode() {
    let jpeg = codec::encode(&gradient_frame(15, 9)).expect("odd frame should encode");
    let url = codec::to_data_url(&jpeg).expect("jpeg should re-encode");
    assert!(url.starts_with(DATA_URL_PREFIX));
}

#[test]
fn transport_is_plain_base64() {
    let jpeg = codec::encode(&gradient_frame(16, 16)).expect("frame should encode");
    let transport = codec::to_transport(&jpeg).expect("jpeg should re-encode");
    assert!(!transport.starts_with("data:"));
    assert!(transport
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='));
}

#[test]
fn empty_plane_is_invalid_buffer() {
    for empty in 0..3 {
        let mut frame = gradient_frame(8, 8);
        frame.planes[empty] = Plane::new(Vec::new());
        let result = codec::encode(&frame);
        assert!(
            matches!(result, Err(ErrorKind::InvalidBuffer(_))),
            "plane {empty} empty should be rejected, got {result:?}"
        );
    }
}

#[test]
fn missing_plane_is_invalid_buffer() {
    let mut frame = gradient_frame(8, 8);
    frame.planes.truncate(2);
    assert!(matches!(
        codec::encode(&frame),
        Err(ErrorKind::InvalidBuffer(_))
    ));
}

#[test]
fn short_planes_are_padded() {
    let frame = RawFrame::yuv420(16, 16, vec![200; 250], vec![128; 60], vec![128; 60]);
    assert!(codec::encode(&frame).is_ok());
}

#[test]
fn mostly_missing_buffer_fails_encoding() {
    let frame = RawFrame::yuv420(16, 16, vec![200; 10], vec![128; 1], vec![128; 1]);
    assert!(matches!(
        codec::encode(&frame),
        Err(ErrorKind::EncodingFailed(_))
    ));
}

#[test]
fn oversized_dimensions_fail_before_allocating() {
    let huge = RawFrame::yuv420(u32::MAX, u32::MAX, vec![1], vec![1], vec![1]);
    assert!(matches!(
        codec::encode(&huge),
        Err(ErrorKind::EncodingFailed(_))
    ));

    let too_wide = codec::MAX_DIMENSION.saturating_add(1);
    let wide = RawFrame::yuv420(too_wide, 1, vec![1], vec![1], vec![1]);
    assert!(matches!(
        codec::encode(&wide),
        Err(ErrorKind::EncodingFailed(_))
    ));

    let large = RawFrame::yuv420(60_000, 60_000, vec![1], vec![1], vec![1]);
    assert!(matches!(
        codec::encode(&large),
        Err(ErrorKind::EncodingFailed(_))
    ));
}

#[test]
fn packed_chroma_keeps_uniform_colour() {
    let frame = RawFrame::yuv420(16, 16, vec![128; 256], vec![96; 64], vec![160; 64]);
    let jpeg = codec::encode(&frame).expect("uniform frame should encode");
    let image = image::load_from_memory(&jpeg)
        .expect("output should decode")
        .to_rgb8();

    let top = image.get_pixel(3, 2).0;
    let bottom = image.get_pixel(12, 13).0;
    for channel in 0..3 {
        assert!(
            top[channel].abs_diff(bottom[channel]) <= 4,
            "top {top:?} and bottom {bottom:?} should match"
        );
    }
    // V above neutral and U below: red leads, blue trails.
    assert!(top[0] > top[2], "expected a warm colour, got {top:?}");
}

#[test]
fn strided_chroma_is_read_as_nv21() {
    // Stride-2 V plane already holds V/U pairs; U is the same memory shifted.
    let mut vu = Vec::new();
    for _ in 0..64 {
        vu.extend([160_u8, 96]);
    }
    let uv: Vec<u8> = vu.iter().skip(1).copied().collect();
    let frame = RawFrame {
        format: PixelFormat::Yuv420Planar,
        width: 16,
        height: 16,
        planes: vec![
            Plane::new(vec![128; 256]),
            Plane::with_stride(uv, 2),
            Plane::with_stride(vu, 2),
        ],
    };
    let jpeg = codec::encode(&frame).expect("strided frame should encode");
    let image = image::load_from_memory(&jpeg)
        .expect("output should decode")
        .to_rgb8();
    let top = image.get_pixel(3, 2).0;
    let bottom = image.get_pixel(12, 13).0;
    assert!(top[0] > top[2] && bottom[0] > bottom[2]);
}

#[test]
fn zero_area_fails_encoding() {
    let frame = RawFrame::yuv420(0, 8, vec![1], vec![1], vec![1]);
    assert!(matches!(
        codec::encode(&frame),
        Err(ErrorKind::EncodingFailed(_))
    ));
}

#[test]
fn unknown_format_is_unsupported() {
    let frame = RawFrame {
        format: PixelFormat::from_code(0x20),
        width: 4,
        height: 4,
        planes: vec![Plane::new(vec![1; 16])],
    };
    assert!(matches!(
        codec::encode(&frame),
        Err(ErrorKind::UnsupportedFormat(_))
    ));
}

#[test]
fn format_codes_map() {
    assert_eq!(PixelFormat::from_code(35), PixelFormat::Yuv420Planar);
    assert_eq!(PixelFormat::from_code(256), PixelFormat::Jpeg);
    assert_eq!(PixelFormat::from_code(17), PixelFormat::Other(17));
}

#[test]
fn jpeg_frame_passes_through() {
    let jpeg = codec::encode(&gradient_frame(16, 16)).expect("frame should encode");
    let frame = RawFrame::jpeg(16, 16, jpeg.clone());
    assert_eq!(codec::encode(&frame).expect("jpeg frame"), jpeg);
}

#[test]
fn jpeg_frame_without_marker_fails() {
    let frame = RawFrame::jpeg(4, 4, b"not a jpeg".to_vec());
    assert!(matches!(
        codec::encode(&frame),
        Err(ErrorKind::EncodingFailed(_))
    ));

    let empty = RawFrame::jpeg(4, 4, Vec::new());
    assert!(matches!(
        codec::encode(&empty),
        Err(ErrorKind::InvalidBuffer(_))
    ));
}

#[test]
fn garbage_does_not_transport() {
    assert!(matches!(
        codec::to_transport(&[0xFF, 0xD8, 0x00, 0x01]),
        Err(ErrorKind::EncodingFailed(_))
    ));
    assert!(matches!(
        codec::to_transport(&[]),
        Err(ErrorKind::EncodingFailed(_))
    ));
}

#[test]
fn nv21_order_is_y_v_u() {
    let planes = [
        Plane::new(vec![1, 2, 3, 4]),
        Plane::new(vec![10]),
        Plane::new(vec![20]),
    ];
    let nv21 = codec::interleave_nv21(&planes).expect("planes are non-empty");
    assert_eq!(nv21, vec![1, 2, 3, 4, 20, 10]);
}
