//! Font faces and the fallback chain
//!
//! Candidates are tried in order; the first one that loads as a
//! TrueType/OpenType face wins. When none loads, the built-in 8x8 bitmap
//! face is used. It covers Basic Latin and Latin-1 only: other scripts
//! advance by one cell and draw nothing.

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use directories::BaseDirs;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fs;
use std::path::{Path, PathBuf};

/// Something that can measure and draw a single line of text
pub trait Face {
    /// Human-readable face identifier
    fn name(&self) -> &str;

    /// Rendered width of `text` in pixels
    fn text_width(&self, text: &str) -> u32;

    /// Draw `text` with its top-left corner at `(x, y)`; pixels outside the
    /// canvas are clipped.
    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str);
}

/// A scalable TrueType/OpenType face
pub struct TrueTypeFace {
    name: String,
    font: FontVec,
    scale: PxScale,
}

impl TrueTypeFace {
    /// Load the first face of a font file (`.ttf`, `.otf` or `.ttc`)
    pub fn load(path: &Path, font_size: u32) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .with_context(|| format!("Invalid font file {}", path.display()))?;

        Ok(Self {
            name: path.display().to_string(),
            font,
            scale: PxScale::from(font_size as f32),
        })
    }
}

impl Face for TrueTypeFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn text_width(&self, text: &str) -> u32 {
        text_size(self.scale, &self.font, text).0
    }

    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        draw_text_mut(canvas, color, x, y, self.scale, &self.font, text);
    }
}

/// Glyph cell edge of the built-in face, before scaling
const CELL: u32 = 8;

/// Built-in 8x8 bitmap face, scaled by an integer factor
pub struct BitmapFace {
    scale: u32,
}

impl BitmapFace {
    pub fn new(font_size: u32) -> Self {
        Self {
            scale: (font_size / CELL).max(1),
        }
    }

    fn glyph(ch: char) -> Option<[u8; 8]> {
        BASIC_FONTS.get(ch).or_else(|| LATIN_FONTS.get(ch))
    }
}

impl Face for BitmapFace {
    fn name(&self) -> &str {
        "builtin"
    }

    fn text_width(&self, text: &str) -> u32 {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        chars.saturating_mul(CELL * self.scale)
    }

    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        let (width, height) = canvas.dimensions();
        let (width, height) = (i64::from(width), i64::from(height));
        let cell = i64::from(CELL * self.scale);
        let scale = i64::from(self.scale);

        for (index, ch) in text.chars().enumerate() {
            let origin_x = i64::from(x) + index as i64 * cell;
            if origin_x >= width {
                break;
            }
            if origin_x + cell <= 0 {
                continue;
            }
            let Some(rows) = Self::glyph(ch) else {
                continue;
            };

            for (row, bits) in rows.iter().enumerate() {
                let top = i64::from(y) + row as i64 * scale;
                let ys = top.max(0)..(top + scale).min(height);
                if ys.is_empty() {
                    continue;
                }
                for col in 0..CELL as i64 {
                    if ((*bits >> col) & 1) == 0 {
                        continue;
                    }
                    let left = origin_x + col * scale;
                    let xs = left.max(0)..(left + scale).min(width);
                    for py in ys.clone() {
                        for px in xs.clone() {
                            canvas.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

/// Pick the first loadable candidate, or the built-in face
pub fn resolve_face(candidates: &[PathBuf], font_size: u32) -> Box<dyn Face> {
    for candidate in candidates {
        let Some(path) = locate(candidate) else {
            tracing::debug!(font = %candidate.display(), "font not found");
            continue;
        };
        match TrueTypeFace::load(&path, font_size) {
            Ok(face) => {
                tracing::debug!(font = %path.display(), "using font");
                return Box::new(face);
            }
            Err(err) => tracing::debug!(font = %path.display(), error = %err, "font rejected"),
        }
    }

    tracing::debug!("no font candidate loaded, using built-in face");
    Box::new(BitmapFace::new(font_size))
}

/// Resolve a candidate as given, then by file name in the system font directories
fn locate(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if candidate.components().count() != 1 {
        return None;
    }

    font_dirs()
        .into_iter()
        .map(|dir| dir.join(candidate))
        .find(|path| path.is_file())
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    if let Some(base) = BaseDirs::new() {
        dirs.push(base.home_dir().join(".fonts"));
        dirs.push(base.data_local_dir().join("fonts"));
    }
    dirs.extend(
        [
            "/usr/share/fonts",
            "/usr/share/fonts/truetype",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
        ]
        .map(PathBuf::from),
    );

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_candidates_fall_back_to_builtin() {
        let face = resolve_face(
            &[
                PathBuf::from("definitely-not-a-font-1b7c.ttc"),
                PathBuf::from("/nonexistent/dir/simhei.ttf"),
            ],
            20,
        );
        assert_eq!(face.name(), "builtin");
    }

    #[test]
    fn invalid_font_file_is_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not a font").unwrap();

        let face = resolve_face(&[file.path().to_path_buf()], 20);
        assert_eq!(face.name(), "builtin");
    }

    #[test]
    fn bitmap_width_counts_every_character() {
        let face = BitmapFace::new(20);
        assert_eq!(face.text_width(""), 0);
        assert_eq!(face.text_width("abc"), 3 * 16);
        // Non-Latin text is not drawable but still advances
        assert_eq!(face.text_width("苹1果"), 3 * 16);
    }

    #[test]
    fn bitmap_scale_is_at_least_one() {
        assert_eq!(BitmapFace::new(0).text_width("ab"), 16);
        assert_eq!(BitmapFace::new(7).text_width("ab"), 16);
        assert_eq!(BitmapFace::new(24).text_width("ab"), 48);
    }

    #[test]
    fn bitmap_draw_clips_to_canvas() {
        let background = Rgb([255, 255, 255]);
        let ink = Rgb([0, 0, 0]);
        let mut canvas = RgbImage::from_pixel(20, 10, background);

        let face = BitmapFace::new(8);
        face.draw(&mut canvas, -4, -4, ink, "HH");
        face.draw(&mut canvas, 15, 6, ink, "H");

        assert!(canvas.pixels().any(|p| *p == ink));
    }

    #[test]
    fn huge_bitmap_scale_only_touches_visible_pixels() {
        let background = Rgb([255, 255, 255]);
        let ink = Rgb([0, 0, 0]);
        let mut canvas = RgbImage::from_pixel(20, 10, background);

        // Scale 12500: each glyph cell covers far more than the canvas
        let face = BitmapFace::new(100_000);
        face.draw(&mut canvas, 0, 0, ink, "HHHH");
        face.draw(&mut canvas, -5_000_000, -5_000_000, ink, "H");
        assert_eq!(*canvas.get_pixel(0, 0), ink);
    }

    #[test]
    fn bitmap_skips_unsupported_glyphs() {
        let background = Rgb([255, 255, 255]);
        let mut canvas = RgbImage::from_pixel(40, 16, background);

        BitmapFace::new(8).draw(&mut canvas, 0, 0, Rgb([0, 0, 0]), "西瓜");
        assert!(canvas.pixels().all(|p| *p == background));
    }
}
