//! Color parsing for CLI and config values

use image::Rgb;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color '{0}': expected #rrggbb or r,g,b")]
    Format(String),

    #[error("invalid color component '{0}': expected 0-255")]
    Component(String),
}

/// Parse `#rrggbb` or `r,g,b`
pub fn parse_color(value: &str) -> Result<Rgb<u8>, ColorError> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorError::Format(value.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorError::Format(value.to_string()))
        };
        return Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]));
    }

    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ColorError::Format(value.to_string()));
    }

    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u8>()
            .map_err(|_| ColorError::Component(part.to_string()))?;
    }
    Ok(Rgb(rgb))
}
