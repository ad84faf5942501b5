//! Sinusoidal displacement warp applied to the fully composed scene.

use crate::canvas::PixelCanvas;
use crate::math::pi;
use crate::rand::Rng;

/// Parameters of the displacement field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Wave {
    /// Peak displacement in pixels.
    pub amplitude: f64,
    /// Wavelength in pixels. Larger values give broader, gentler ripples.
    pub period: f64,
}

impl Wave {
    pub const AMPLITUDE_RANGE: (f64, f64) = (3.0, 6.0);
    pub const PERIOD_RANGE: (f64, f64) = (70.0, 140.0);

    pub fn random(rng: &mut Rng) -> Self {
        let (a0, a1) = Self::AMPLITUDE_RANGE;
        let (p0, p1) = Self::PERIOD_RANGE;
        let amplitude = rng.uniform(a0, a1);
        let period = rng.uniform(p0, p1);
        Wave { amplitude, period }
    }

    /// Displacement along one axis as a function of the position `t` on the other.
    pub fn offset(&self, t: f64) -> f64 {
        if !(self.period.is_finite() && self.period > 0.0) {
            return 0.0;
        }
        self.amplitude * (pi(2.0) * t / self.period).sin()
    }
}

/// Warps `source` into `destination`. Each destination pixel `(x, y)` samples the source at
/// `(x + offset(y), y + offset(x))` and composites the sample over what the destination already
/// holds, so samples that fall outside the source (or on transparent source pixels) leave the
/// destination's background visible.
pub fn distort(source: &PixelCanvas, destination: &mut PixelCanvas, wave: Wave) {
    let (w, h) = destination.size();
    let dx: Vec<f64> = (0..h).map(|y| wave.offset(f64::from(y))).collect();
    let dy: Vec<f64> = (0..w).map(|x| wave.offset(f64::from(x))).collect();
    for y in 0..h {
        for x in 0..w {
            let sx = f64::from(x) + dx[y as usize];
            let sy = f64::from(y) + dy[x as usize];
            let px = source.sample(sx, sy);
            if px != 0 {
                destination.blend_raw_pixel(x, y, px);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Color;

    fn stripes(w: i32, h: i32) -> PixelCanvas {
        let mut canvas = PixelCanvas::new(w, h).unwrap();
        for x in (0..w).step_by(4) {
            for y in 0..h {
                canvas.set_pixel(x, y, Color::BLACK);
            }
        }
        canvas
    }

    fn white(w: i32, h: i32) -> PixelCanvas {
        let mut canvas = PixelCanvas::new(w, h).unwrap();
        canvas.fill(Color::WHITE);
        canvas
    }

    #[test]
    fn test_offset_is_periodic() {
        let wave = Wave {
            amplitude: 4.0,
            period: 80.0,
        };
        assert_eq!(wave.offset(0.0), 0.0);
        assert!((wave.offset(20.0) - 4.0).abs() < 1e-9);
        assert!((wave.offset(60.0) + 4.0).abs() < 1e-9);
        assert!((wave.offset(13.0) - wave.offset(93.0)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_period() {
        for period in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let wave = Wave {
                amplitude: 5.0,
                period,
            };
            assert_eq!(wave.offset(17.0), 0.0);
        }
    }

    #[test]
    fn test_random_ranges() {
        let mut rng = Rng::from_seed(b"wave");
        for _ in 0..200 {
            let wave = Wave::random(&mut rng);
            assert!((3.0..6.0).contains(&wave.amplitude));
            assert!((70.0..140.0).contains(&wave.period));
        }
    }

    #[test]
    fn test_distort_is_deterministic() {
        let src = stripes(82, 32);
        let wave = Wave {
            amplitude: 4.5,
            period: 100.0,
        };
        let mut a = white(82, 32);
        let mut b = white(82, 32);
        distort(&src, &mut a, wave);
        distort(&src, &mut b, wave);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_zero_amplitude_copies_over_background() {
        let src = stripes(20, 10);
        let mut dst = white(20, 10);
        distort(
            &src,
            &mut dst,
            Wave {
                amplitude: 0.0,
                period: 100.0,
            },
        );
        for y in 0..10 {
            for x in 0..20 {
                let want = if x % 4 == 0 { Color::BLACK } else { Color::WHITE };
                assert_eq!(dst.pixel(x, y), Some(want));
            }
        }
    }

    #[test]
    fn test_straight_edges_become_wavy() {
        let src = stripes(82, 32);
        let mut plain = white(82, 32);
        plain.blit(0, 0, &src);
        let mut warped = white(82, 32);
        distort(
            &src,
            &mut warped,
            Wave {
                amplitude: 5.0,
                period: 70.0,
            },
        );
        assert_ne!(plain.data(), warped.data());
    }

    #[test]
    fn test_empty_source_leaves_background() {
        let src = PixelCanvas::new(30, 30).unwrap();
        let mut dst = white(30, 30);
        distort(
            &src,
            &mut dst,
            Wave {
                amplitude: 6.0,
                period: 70.0,
            },
        );
        let bg = Color::WHITE.to_premultiplied();
        assert!(dst.data().iter().all(|&p| p == bg));
    }
}
