//! Recipe images travel as base64 inside JSON and are stored as raw bytes.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::{PipelineError, Result};

/// A decoded image ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Decodes either a data URI (`data:image/png;base64,...`) or bare base64.
///
/// Bare base64 must start with a recognizable PNG, JPEG, GIF or WebP header.
pub fn decode_image(input: &str) -> Result<DecodedImage> {
    let input = input.trim();

    let (declared_mime, encoded) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| invalid("Malformed data URI"))?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| invalid("Only base64 data URIs are supported"))?;
            if !mime.starts_with("image/") {
                return Err(invalid("Upload a valid image"));
            }
            (Some(mime.to_string()), data)
        }
        None => (None, input),
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| invalid(format!("Invalid base64 data: {e}")))?;

    if bytes.is_empty() {
        return Err(invalid("The submitted image is empty"));
    }

    let mime = match declared_mime {
        Some(mime) => mime,
        None => sniff_mime(&bytes)
            .ok_or_else(|| invalid("Upload a valid image"))?
            .to_string(),
    };

    Ok(DecodedImage { bytes, mime })
}

/// Renders stored image bytes as a data URI.
pub fn encode_image(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::validation("image", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_uri() {
        let image = decode_image(&format!("data:image/png;base64,{PNG_B64}")).unwrap();

        assert_eq!(image.mime, "image/png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_bare_base64_sniffs_mime() {
        let image = decode_image(PNG_B64).unwrap();
        assert_eq!(image.mime, "image/png");
    }

    #[test]
    fn test_encode_produces_data_uri() {
        let image = decode_image(PNG_B64).unwrap();
        let uri = encode_image(&image.bytes, &image.mime);

        assert_eq!(uri, format!("data:image/png;base64,{PNG_B64}"));
    }

    #[test]
    fn test_rejects_non_image_mime() {
        let err = decode_image("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert!(matches!(err, PipelineError::Validation { field: "image", .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_image("data:image/png;base64,@@@").is_err());
        assert!(decode_image("").is_err());
        // Valid base64 but not an image
        assert!(decode_image("aGVsbG8gd29ybGQ=").is_err());
    }
}
