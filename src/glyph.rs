//! Single-character rasterization and rotation.

mod pixel_font;

pub use pixel_font::PixelFont;

use crate::canvas::PixelCanvas;
use crate::color::Color;
use crate::error::CaptchaError;
use crate::math::{normalize_degrees, rotated_extent};

/// Coverage mask for one glyph, positioned relative to the pen origin on the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub width: usize,
    pub height: usize,
    /// Horizontal offset of the leftmost column from the pen origin.
    pub xmin: i32,
    /// Offset of the bottom row above the baseline (negative for descenders).
    pub ymin: i32,
    /// Row-major alpha, `width * height` bytes.
    pub alpha: Vec<u8>,
}

/// Anything that can turn a character into a coverage mask at a given pixel size.
pub trait GlyphSource: Send + Sync {
    /// Returns `None` if the face has no glyph for `ch`.
    fn coverage(&self, ch: char, px: f32) -> Option<Coverage>;

    /// Distance from the top of the layout box to the baseline at `px`.
    fn ascent(&self, px: f32) -> f32;
}

impl GlyphSource for fontdue::Font {
    fn coverage(&self, ch: char, px: f32) -> Option<Coverage> {
        if ch != ' ' && self.lookup_glyph_index(ch) == 0 {
            return None;
        }
        let (metrics, alpha) = self.rasterize(ch, px);
        Some(Coverage {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            alpha,
        })
    }

    fn ascent(&self, px: f32) -> f32 {
        self.horizontal_line_metrics(px)
            .map_or(px * 0.8, |m| m.ascent)
    }
}

/// Parses TrueType/OpenType bytes.
pub fn parse_font(bytes: &[u8]) -> Result<fontdue::Font, CaptchaError> {
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
        .map_err(|e| CaptchaError::FontParse(e.to_string()))
}

/// Renders `ch` into a fresh transparent `side` x `side` canvas. The glyph's layout box has its
/// top-left corner at `(offset_x, offset_y)`; parts falling outside the canvas are clipped.
pub fn rasterize_char(
    font: &dyn GlyphSource,
    color: Color,
    ch: char,
    point_size: f32,
    offset_x: i32,
    offset_y: i32,
    side: i32,
) -> Result<PixelCanvas, CaptchaError> {
    let cov = font
        .coverage(ch, point_size)
        .ok_or(CaptchaError::GlyphNotFound(ch))?;
    let mut canvas = PixelCanvas::new(side, side)?;
    let baseline = offset_y + font.ascent(point_size).round() as i32;
    let left = offset_x + cov.xmin;
    let top = baseline - (cov.ymin + cov.height as i32);
    for row in 0..cov.height {
        for col in 0..cov.width {
            let a = cov.alpha[row * cov.width + col];
            if a == 0 {
                continue;
            }
            let alpha = (u32::from(a) * u32::from(color.a) + 127) / 255;
            let px = Color { a: alpha as u8, ..color };
            canvas.set_pixel(left + col as i32, top + row as i32, px);
        }
    }
    Ok(canvas)
}

/// Returns a copy of `src` rotated by `degrees` about its center, on a canvas grown just enough
/// to hold the result. Destination pixels that map outside the source are transparent.
pub fn rotate(src: &PixelCanvas, degrees: f64) -> PixelCanvas {
    let theta = normalize_degrees(degrees).to_radians();
    let (w, h) = src.size();
    let (new_w, new_h) = rotated_extent(w, h, theta);
    let (sin, cos) = theta.sin_cos();

    let src_cx = f64::from(w - 1) / 2.0;
    let src_cy = f64::from(h - 1) / 2.0;
    let dst_cx = f64::from(new_w - 1) / 2.0;
    let dst_cy = f64::from(new_h - 1) / 2.0;

    let mut dst = PixelCanvas::new(new_w, new_h).expect("rotated_extent is never below 1x1");
    for y in 0..new_h {
        for x in 0..new_w {
            let dx = f64::from(x) - dst_cx;
            let dy = f64::from(y) - dst_cy;
            let sx = cos * dx + sin * dy + src_cx;
            let sy = cos * dy - sin * dx + src_cy;
            let px = src.sample(sx, sy);
            if px != 0 {
                dst.set_raw_pixel(x, y, px);
            }
        }
    }
    dst
}
