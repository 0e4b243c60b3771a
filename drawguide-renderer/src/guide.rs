//! Reference ("guide") images shown faintly under the drawing.
//!
//! Guides come in as encoded bytes or `data:` URIs and are kept as a
//! premultiplied [`Pixmap`] so they can be composited directly.

use base64::Engine;
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// A decoded guide image.
#[derive(Debug, Clone)]
pub struct GuideImage {
    pixmap: Pixmap,
}

impl GuideImage {
    /// Decode a guide from encoded image bytes (PNG, JPEG, GIF, ...).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the bytes are not a decodable
    /// image or the image is empty.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| RenderError::Resource(format!("Empty image ({width}x{height})")))?;
        let premultiplied = premultiply(rgba.into_raw());
        let pixmap = Pixmap::from_vec(premultiplied, size)
            .ok_or_else(|| RenderError::Resource("Invalid image buffer".to_string()))?;

        tracing::debug!("Decoded guide image {width}x{height}");
        Ok(Self { pixmap })
    }

    /// Decode a guide from a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if the URI is malformed or the
    /// payload is not an image.
    pub fn from_data_uri(uri: &str) -> RenderResult<Self> {
        Self::from_bytes(&decode_data_uri(uri)?)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn premultiply(mut rgba: Vec<u8>) -> Vec<u8> {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            // (c * a + 127) / 255 stays within u8
            #[allow(clippy::cast_possible_truncation)]
            let v = ((u16::from(*c) * a + 127) / 255) as u8;
            *c = v;
        }
    }
    rgba
}

/// Extract the payload of a `data:` URI.
///
/// Supports base64 payloads (`data:image/png;base64,...`) and
/// percent-encoded ones.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red pixel
    const RED_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_png_data_uri() {
        let guide =
            GuideImage::from_data_uri(&format!("data:image/png;base64,{RED_PNG}")).expect("guide");
        assert_eq!(guide.width(), 1);
        assert_eq!(guide.height(), 1);
        let px = guide.pixmap().pixel(0, 0).expect("pixel");
        assert_eq!(px.alpha(), 255);
        assert!(px.red() > 200);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(GuideImage::from_bytes(b"not an image").is_err());
        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        assert_eq!(
            decode_data_uri("data:text/plain,a%20b").expect("decode"),
            b"a b".to_vec()
        );
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(premultiply(vec![255, 128, 0, 128]), vec![128, 64, 0, 128]);
        assert_eq!(premultiply(vec![10, 20, 30, 255]), vec![10, 20, 30, 255]);
        assert_eq!(premultiply(vec![200, 200, 200, 0]), vec![0, 0, 0, 0]);
    }
}
