//! QR output for the terminal

use anyhow::{Context, Result};
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use zeroize::Zeroizing;

/// Render `data` as a QR code of unicode half-blocks
///
/// Colours are inverted for dark terminals. The result may encode a
/// private key, so it is zeroized on drop.
pub fn qr_unicode(data: &str) -> Result<Zeroizing<String>> {
    let code = QrCode::new(data.as_bytes()).context("Failed to encode QR code")?;
    let image = code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build();
    Ok(Zeroizing::new(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_square_block() {
        let wif = "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d";
        let rendered = qr_unicode(wif).unwrap();

        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.len() > 10);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
        // two module rows per text line
        assert!(width > lines.len());
        assert!(!rendered.contains(wif));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(*qr_unicode("abc").unwrap(), *qr_unicode("abc").unwrap());
        assert_ne!(*qr_unicode("abc").unwrap(), *qr_unicode("abd").unwrap());
    }
}
