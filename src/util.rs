//! Byte-to-text decoding for book files.

use std::borrow::Cow;

/// Decode bytes to a string, handling the encodings authoring tools emit.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from a `<meta charset>` or similar)
/// 3. Falls back to Windows-1252 (common in hand-edited legacy books)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(decode_text("Hello".as_bytes(), None), "Hello");
/// ```
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF<html></html>";
        assert_eq!(decode_text(bytes, None), "<html></html>");
    }

    #[test]
    fn test_decode_falls_back_to_cp1252() {
        // 0xE9 is 'é' in Windows-1252 and invalid as a lone UTF-8 byte
        let bytes = b"caf\xE9";
        assert_eq!(decode_text(bytes, None), "café");
    }
}
