//! Owned pixel buffers and the drawing primitives the composer needs.
//!
//! Pixels are stored premultiplied as `0xAARRGGBB`, the layout of a raqote [`DrawTarget`], so
//! vector shapes go through raqote while per-pixel work (noise fill, compositing, resampling)
//! operates on the raw slice. Every operation clips to the canvas; nothing here fails once a
//! canvas exists.

use std::io::Cursor;
use std::path::Path;

use image::{ImageOutputFormat, RgbaImage};
use raqote::{
    AntialiasMode, DrawOptions, DrawTarget, PathBuilder, SolidSource, Source, StrokeStyle,
};

use crate::color::{Color, ColorSet};
use crate::error::CaptchaError;
use crate::math::pi;
use crate::rand::Rng;

pub struct PixelCanvas {
    dt: DrawTarget,
}

impl PixelCanvas {
    /// Creates a fully transparent canvas.
    pub fn new(width: i32, height: i32) -> Result<Self, CaptchaError> {
        if width <= 0 || height <= 0 {
            return Err(CaptchaError::InvalidDimension { width, height });
        }
        Ok(PixelCanvas {
            dt: DrawTarget::new(width, height),
        })
    }

    pub fn width(&self) -> i32 {
        self.dt.width()
    }

    pub fn height(&self) -> i32 {
        self.dt.height()
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width(), self.height())
    }

    /// Raw premultiplied pixels in row-major order.
    pub fn data(&self) -> &[u32] {
        self.dt.get_data()
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return None;
        }
        Some((y * self.width() + x) as usize)
    }

    /// Premultiplied pixel at `(x, y)`, or transparent outside the canvas.
    pub fn raw_pixel(&self, x: i32, y: i32) -> u32 {
        self.offset(x, y).map_or(0, |i| self.data()[i])
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.offset(x, y)
            .map(|i| Color::from_premultiplied(self.data()[i]))
    }

    pub fn set_raw_pixel(&mut self, x: i32, y: i32, px: u32) {
        if let Some(i) = self.offset(x, y) {
            self.dt.get_data_mut()[i] = px;
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.set_raw_pixel(x, y, color.to_premultiplied());
    }

    /// Composites a premultiplied pixel over whatever is at `(x, y)`.
    pub fn blend_raw_pixel(&mut self, x: i32, y: i32, px: u32) {
        if let Some(i) = self.offset(x, y) {
            let data = self.dt.get_data_mut();
            data[i] = over(px, data[i]);
        }
    }

    pub fn fill(&mut self, color: Color) {
        let px = color.to_premultiplied();
        self.dt.get_data_mut().fill(px);
    }

    /// Paints every pixel with a color drawn independently from `colors`.
    pub fn fill_noise(&mut self, colors: &ColorSet, rng: &mut Rng) {
        for px in self.dt.get_data_mut() {
            *px = colors.pick(rng).to_premultiplied();
        }
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, filled: bool, color: Color) {
        let radius = radius.max(1) as f32;
        let mut pb = PathBuilder::new();
        pb.arc(cx as f32 + 0.5, cy as f32 + 0.5, radius, 0.0, pi(2.0) as f32);
        pb.close();
        let path = pb.finish();
        let src = solid(color);
        if filled {
            self.dt.fill(&path, &src, &crisp());
        } else {
            self.dt.stroke(&path, &src, &hairline(), &crisp());
        }
    }

    /// A zero-length line plots its single pixel.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        if (x0, y0) == (x1, y1) {
            self.blend_raw_pixel(x0, y0, color.to_premultiplied());
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(x0 as f32 + 0.5, y0 as f32 + 0.5);
        pb.line_to(x1 as f32 + 0.5, y1 as f32 + 0.5);
        let path = pb.finish();
        self.dt.stroke(&path, &solid(color), &hairline(), &crisp());
    }

    /// Draws `src` with its top-left corner at `(left, top)`. Transparent source pixels leave the
    /// destination untouched, opaque ones replace it, and partial coverage blends source-over.
    pub fn blit(&mut self, left: i32, top: i32, src: &PixelCanvas) {
        let (w, h) = self.size();
        let x_start = left.max(0);
        let y_start = top.max(0);
        let x_end = (left + src.width()).min(w);
        let y_end = (top + src.height()).min(h);
        for y in y_start..y_end {
            for x in x_start..x_end {
                let px = src.data()[((y - top) * src.width() + (x - left)) as usize];
                if px >> 24 == 0 {
                    continue;
                }
                let i = (y * w + x) as usize;
                let data = self.dt.get_data_mut();
                data[i] = over(px, data[i]);
            }
        }
    }

    /// Bilinear sample at a continuous position where pixel centers sit on integer coordinates.
    /// Neighbours outside the canvas count as transparent.
    pub fn sample(&self, x: f64, y: f64) -> u32 {
        if !x.is_finite() || !y.is_finite() {
            return 0;
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);
        if fx == 0.0 && fy == 0.0 {
            return self.raw_pixel(x0, y0);
        }
        let weights = [
            ((1.0 - fx) * (1.0 - fy), self.raw_pixel(x0, y0)),
            (fx * (1.0 - fy), self.raw_pixel(x0 + 1, y0)),
            ((1.0 - fx) * fy, self.raw_pixel(x0, y0 + 1)),
            (fx * fy, self.raw_pixel(x0 + 1, y0 + 1)),
        ];
        let channel = |shift: u32| {
            let v: f64 = weights
                .iter()
                .map(|&(w, px)| w * f64::from((px >> shift) & 0xff))
                .sum();
            (v.round() as u32).min(255)
        };
        let a = channel(24);
        // Keep the premultiplied invariant c <= a after rounding.
        let c = |shift: u32| channel(shift).min(a);
        (a << 24) | (c(16) << 16) | (c(8) << 8) | c(0)
    }

    /// Un-premultiplied copy for encoding or inspection.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let (w, h) = self.size();
        RgbaImage::from_fn(w as u32, h as u32, |x, y| {
            let c = Color::from_premultiplied(self.raw_pixel(x as i32, y as i32));
            image::Rgba([c.r, c.g, c.b, c.a])
        })
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, CaptchaError> {
        let mut buf = Cursor::new(Vec::new());
        self.to_rgba_image()
            .write_to(&mut buf, ImageOutputFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// Writes the same bytes as [`PixelCanvas::encode_png`] to `path`.
    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<(), CaptchaError> {
        let path = path.as_ref();
        std::fs::write(path, self.encode_png()?).map_err(|source| CaptchaError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl std::fmt::Debug for PixelCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelCanvas({}x{})", self.width(), self.height())
    }
}

/// Premultiplied source-over.
fn over(src: u32, dst: u32) -> u32 {
    let sa = src >> 24;
    if sa == 0xff {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let inv = 255 - sa;
    let channel = |shift: u32| {
        let s = (src >> shift) & 0xff;
        let d = (dst >> shift) & 0xff;
        (s + (d * inv + 127) / 255).min(255)
    };
    (channel(24) << 24) | (channel(16) << 16) | (channel(8) << 8) | channel(0)
}

fn solid(color: Color) -> Source<'static> {
    Source::Solid(SolidSource::from_unpremultiplied_argb(
        color.a, color.r, color.g, color.b,
    ))
}

fn crisp() -> DrawOptions {
    DrawOptions {
        antialias: AntialiasMode::None,
        ..DrawOptions::new()
    }
}

fn hairline() -> StrokeStyle {
    StrokeStyle {
        width: 1.0,
        ..StrokeStyle::default()
    }
}
