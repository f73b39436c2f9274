//! Minimal EXIF reader for the orientation tag.
//!
//! Orientation values in the wild use several integer encodings and are
//! sometimes out of range. Values are normalized here before they reach the
//! pixel transform so a corrupt tag can never abort hashing.

use image::metadata::Orientation;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const TIFF_MAGIC: u16 = 42;
const ORIENTATION_TAG: u16 = 0x0112;

/// Orientation as stored, widened to `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOrientation(pub u32);

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, bytes: &[u8], at: usize) -> Option<u16> {
        let b: [u8; 2] = bytes.get(at..at + 2)?.try_into().ok()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        })
    }

    fn u32(self, bytes: &[u8], at: usize) -> Option<u32> {
        let b: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        })
    }
}

/// Find the orientation entry of IFD0 in a raw EXIF block.
///
/// Accepts blocks with or without the `Exif\0\0` prefix. Byte, short, long,
/// signed short and signed long encodings are understood; signed values are
/// sign-extended. Any other encoding or a malformed block yields `None`.
pub fn read_orientation(exif: &[u8]) -> Option<RawOrientation> {
    let tiff = exif.strip_prefix(EXIF_HEADER).unwrap_or(exif);
    let order = match tiff.get(0..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if order.u16(tiff, 2)? != TIFF_MAGIC {
        return None;
    }
    let ifd = order.u32(tiff, 4)? as usize;
    let entries = order.u16(tiff, ifd)? as usize;
    (0..entries).find_map(|i| {
        let entry = ifd + 2 + i * 12;
        if order.u16(tiff, entry)? != ORIENTATION_TAG {
            return None;
        }
        let value = entry + 8;
        let raw = match order.u16(tiff, entry + 2)? {
            1 => u32::from(*tiff.get(value)?),
            3 => u32::from(order.u16(tiff, value)?),
            4 => order.u32(tiff, value)?,
            8 => order.u16(tiff, value)? as i16 as i32 as u32,
            9 => order.u32(tiff, value)?,
            _ => return None,
        };
        Some(RawOrientation(raw))
    })
}

/// Clamp to the valid EXIF range `1..=9`.
pub fn sanitize_orientation(raw: RawOrientation) -> u32 {
    raw.0.clamp(1, 9)
}

/// Pixel transform for a sanitized orientation. `9` (undefined) and `1` need none.
pub fn orientation_transform(sanitized: u32) -> Option<Orientation> {
    u8::try_from(sanitized)
        .ok()
        .and_then(Orientation::from_exif)
        .filter(|o| *o != Orientation::NoTransforms)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Little-endian TIFF block with one IFD0 entry.
    fn block_le(kind: u16, value: [u8; 4]) -> Vec<u8> {
        let mut b = Vec::from(EXIF_HEADER);
        b.extend_from_slice(b"II");
        b.extend_from_slice(&42u16.to_le_bytes());
        b.extend_from_slice(&8u32.to_le_bytes());
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&ORIENTATION_TAG.to_le_bytes());
        b.extend_from_slice(&kind.to_le_bytes());
        b.extend_from_slice(&1u32.to_le_bytes());
        b.extend_from_slice(&value);
        b.extend_from_slice(&0u32.to_le_bytes());
        b
    }

    #[test]
    fn test_short_and_byte() {
        assert_eq!(read_orientation(&block_le(3, [6, 0, 0, 0])), Some(RawOrientation(6)));
        assert_eq!(read_orientation(&block_le(1, [3, 0, 0, 0])), Some(RawOrientation(3)));
        assert_eq!(read_orientation(&block_le(4, [8, 0, 0, 0])), Some(RawOrientation(8)));
    }

    #[test]
    fn test_signed_values_sign_extend() {
        let raw = read_orientation(&block_le(8, [0xFF, 0xFF, 0, 0])).unwrap();
        assert_eq!(raw, RawOrientation(u32::MAX));
        assert_eq!(sanitize_orientation(raw), 9);
        let raw = read_orientation(&block_le(9, [2, 0, 0, 0])).unwrap();
        assert_eq!(raw, RawOrientation(2));
    }

    #[test]
    fn test_big_endian_without_prefix() {
        let mut b = Vec::new();
        b.extend_from_slice(b"MM");
        b.extend_from_slice(&42u16.to_be_bytes());
        b.extend_from_slice(&8u32.to_be_bytes());
        b.extend_from_slice(&2u16.to_be_bytes());
        // unrelated entry first
        b.extend_from_slice(&0x010Fu16.to_be_bytes());
        b.extend_from_slice(&[0, 2, 0, 0, 0, 1, 0, 0, 0, 0]);
        b.extend_from_slice(&ORIENTATION_TAG.to_be_bytes());
        b.extend_from_slice(&3u16.to_be_bytes());
        b.extend_from_slice(&1u32.to_be_bytes());
        b.extend_from_slice(&[0, 5, 0, 0]);
        assert_eq!(read_orientation(&b), Some(RawOrientation(5)));
    }

    #[test]
    fn test_unsupported_or_malformed() {
        // RATIONAL
        assert_eq!(read_orientation(&block_le(5, [1, 0, 0, 0])), None);
        assert_eq!(read_orientation(b"Exif\0\0XX"), None);
        assert_eq!(read_orientation(&block_le(3, [1, 0, 0, 0])[..16]), None);
        assert_eq!(read_orientation(&[]), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_orientation(RawOrientation(0)), 1);
        assert_eq!(sanitize_orientation(RawOrientation(7)), 7);
        assert_eq!(sanitize_orientation(RawOrientation(70_000)), 9);
    }

    #[test]
    fn test_transforms() {
        assert_eq!(orientation_transform(1), None);
        assert_eq!(orientation_transform(9), None);
        assert_eq!(orientation_transform(6), Some(Orientation::Rotate90));
        assert_eq!(orientation_transform(3), Some(Orientation::Rotate180));
    }
}
