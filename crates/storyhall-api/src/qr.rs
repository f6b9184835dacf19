//! QR encoding of join links.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;
use storyhall_core::error::DomainError;

/// Renders a join URL as an image data URL.
pub trait QrRenderer: std::fmt::Debug + Send + Sync {
    /// Encodes `url` and returns a `data:` URL for the image.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the URL cannot be encoded.
    fn render(&self, url: &str) -> Result<String, DomainError>;
}

/// SVG renderer backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy)]
pub struct SvgQrRenderer {
    min_size: u32,
}

impl SvgQrRenderer {
    /// Renderer producing images at least `min_size` pixels square.
    #[must_use]
    pub fn new(min_size: u32) -> Self {
        Self { min_size }
    }
}

impl Default for SvgQrRenderer {
    fn default() -> Self {
        Self::new(200)
    }
}

impl QrRenderer for SvgQrRenderer {
    fn render(&self, url: &str) -> Result<String, DomainError> {
        let code = QrCode::new(url.as_bytes())
            .map_err(|e| DomainError::Infrastructure(format!("QR encoding failed: {e}")))?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();
        Ok(format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(image.as_bytes())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_svg_data_url() {
        let url = SvgQrRenderer::default()
            .render("http://localhost:3000/join/abc")
            .unwrap();

        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let svg = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        assert!(svg.contains("<svg"));
    }
}
