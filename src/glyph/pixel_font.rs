use super::{Coverage, GlyphSource};

const COLS: usize = 5;
const ROWS: usize = 7;

/// Built-in 5x7 bitmap face covering `0-9` and `A-Z`; lowercase folds to uppercase. Scaled by
/// nearest neighbour so that its cap height is 70% of the requested size.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelFont;

impl PixelFont {
    fn rows(ch: char) -> Option<&'static [u8; ROWS]> {
        let ch = ch.to_ascii_uppercase();
        let index = match ch {
            '0'..='9' => ch as usize - '0' as usize,
            'A'..='Z' => 10 + ch as usize - 'A' as usize,
            _ => return None,
        };
        GLYPHS.get(index)
    }
}

impl GlyphSource for PixelFont {
    fn coverage(&self, ch: char, px: f32) -> Option<Coverage> {
        let height = ((px * 0.7).round() as usize).max(ROWS);
        let width = ((height * COLS) as f32 / ROWS as f32).round() as usize;
        if ch == ' ' {
            return Some(Coverage {
                width,
                height,
                xmin: 0,
                ymin: 0,
                alpha: vec![0; width * height],
            });
        }
        let rows = Self::rows(ch)?;
        let mut alpha = vec![0; width * height];
        for y in 0..height {
            let bits = rows[y * ROWS / height];
            for x in 0..width {
                let col = x * COLS / width;
                if bits & (0x10 >> col) != 0 {
                    alpha[y * width + x] = 0xff;
                }
            }
        }
        Some(Coverage {
            width,
            height,
            xmin: 0,
            ymin: 0,
            alpha,
        })
    }

    fn ascent(&self, px: f32) -> f32 {
        px * 0.8
    }
}

#[rustfmt::skip]
const GLYPHS: [[u8; ROWS]; 36] = [
    [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e], // 0
    [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e], // 1
    [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f], // 2
    [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e], // 3
    [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02], // 4
    [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e], // 5
    [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e], // 6
    [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e], // 8
    [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c], // 9
    [0x0e, 0x11, 0x11, 0x11, 0x1f, 0x11, 0x11], // A
    [0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e], // B
    [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e], // C
    [0x1c, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1c], // D
    [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f], // E
    [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10], // F
    [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0f], // G
    [0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11], // H
    [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0c], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f], // L
    [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e], // O
    [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10], // P
    [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d], // Q
    [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11], // R
    [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e], // S
    [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a], // W
    [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0a, 0x04, 0x04, 0x04], // Y
    [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f], // Z
];
