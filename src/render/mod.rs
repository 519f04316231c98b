//! List-to-image rendering
//!
//! Writes each item of a list as one centered line of text on a
//! fixed-size canvas and saves it; the output extension picks the format.

pub mod color;
pub mod font;
pub mod layout;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

use crate::config::RenderConfig;
use color::parse_color;
use font::{resolve_face, Face};
use layout::Layout;

/// Rendering parameters
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub output_path: PathBuf,
    pub font_size: u32,
    pub background: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub width: u32,
    pub height: u32,
    /// Font candidates, tried in order before the built-in face
    pub fonts: Vec<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let config = RenderConfig::default();
        Self {
            output_path: config.output_path,
            font_size: config.font_size,
            background: Rgb([255, 255, 255]),
            text_color: Rgb([0, 0, 0]),
            width: config.width,
            height: config.height,
            fonts: config.fonts,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        Ok(Self {
            output_path: config.output_path.clone(),
            font_size: config.font_size,
            background: parse_color(&config.background).context("Invalid background color")?,
            text_color: parse_color(&config.text_color).context("Invalid text color")?,
            width: config.width,
            height: config.height,
            fonts: config.fonts.clone(),
        })
    }
}

/// What [`render`] produced
#[derive(Debug)]
pub struct RenderedImage {
    pub path: PathBuf,
    /// Name of the face that was used
    pub face: String,
    pub layout: Layout,
}

/// Draw the items on a fresh canvas without saving it
pub fn draw_items<T: Display>(
    items: &[T],
    face: &dyn Face,
    options: &RenderOptions,
) -> (RgbImage, Layout) {
    let mut canvas = RgbImage::from_pixel(options.width, options.height, options.background);
    let placed = layout::layout(items, face, options.font_size, options.width, options.height);

    for line in &placed.lines {
        face.draw(
            &mut canvas,
            clamp_coord(line.x),
            clamp_coord(line.y),
            options.text_color,
            &line.text,
        );
    }

    (canvas, placed)
}

/// Resolve a font, draw the items, save the image, and print a confirmation
pub fn render<T: Display>(
    items: &[T],
    options: &RenderOptions,
    out: &mut dyn Write,
) -> Result<RenderedImage> {
    let face = resolve_face(&options.fonts, options.font_size);
    let (canvas, placed) = draw_items(items, face.as_ref(), options);

    canvas
        .save(&options.output_path)
        .with_context(|| format!("Failed to save image to {}", options.output_path.display()))?;
    writeln!(
        out,
        "Image generated and saved to: {}",
        options.output_path.display()
    )?;

    Ok(RenderedImage {
        path: options.output_path.clone(),
        face: face.name().to_string(),
        layout: placed,
    })
}

/// Keep far-off-canvas origins inside a range glyph offsets cannot overflow
fn clamp_coord(value: i64) -> i32 {
    const LIMIT: i64 = 1 << 24;
    value.clamp(-LIMIT, LIMIT) as i32
}
