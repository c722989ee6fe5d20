use rand::{ Rng, SeedableRng };
use rand::rngs::StdRng;

use crate::color::Color;
use crate::consts::PIXEL_SAMPLE_SEED;

/// How many primary rays are traced per pixel, and where.
///
/// Sample positions are given in continuous pixel coordinates: pixel
/// `(col, row)` covers `[col - 0.5, col + 0.5] × [row - 0.5, row + 0.5]`,
/// with its center at `(col, row)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sampling {
    /// One ray through the pixel center.
    Single,

    /// An `nx × ny` grid of sub-cells, one ray through each cell center,
    /// jittered inside its cell.
    Jittered { nx: usize, ny: usize },

    /// Corners and center of the pixel, subdividing quadrants whose corner
    /// disagrees with the center, at most `depth` levels deep.
    Adaptive { depth: usize },
}

impl Default for Sampling {
    fn default() -> Sampling {
        Sampling::Single
    }
}

impl Sampling {
    /// Whether every count is at least one.
    pub fn is_valid(&self) -> bool {
        match *self {
            Sampling::Single => true,
            Sampling::Jittered { nx, ny } => nx >= 1 && ny >= 1,
            Sampling::Adaptive { depth } => depth >= 1,
        }
    }

    /// Colors the pixel `(col, row)` of an image `width` pixels wide.
    ///
    /// `trace` maps a position in continuous pixel coordinates to the color
    /// seen through it. The jitter of each pixel is drawn from its own seed,
    /// so the result does not depend on the order pixels are rendered in.
    pub fn sample_pixel<F>(&self, col: usize, row: usize, width: usize,
        trace: F) -> Color
        where F: Fn(f64, f64) -> Color {
        let x = col as f64;
        let y = row as f64;

        match *self {
            Sampling::Single | Sampling::Jittered { nx: 1, ny: 1 }
                => trace(x, y),

            Sampling::Jittered { nx, ny } => {
                let index = (row * width + col) as u64;
                let mut rng = StdRng::seed_from_u64(PIXEL_SAMPLE_SEED ^ index);
                jittered(x, y, nx, ny, &mut rng, &trace)
            },

            Sampling::Adaptive { depth } => {
                let corners = [
                    trace(x - 0.5, y - 0.5),
                    trace(x + 0.5, y - 0.5),
                    trace(x - 0.5, y + 0.5),
                    trace(x + 0.5, y + 0.5),
                ];
                adaptive(x, y, 0.5, corners, depth, &trace)
            },
        }
    }
}

/// Averages one jittered sample per cell of an `nx × ny` grid over the pixel
/// centered at `(x, y)`.
fn jittered<F, R>(x: f64, y: f64, nx: usize, ny: usize, rng: &mut R,
    trace: &F) -> Color
    where F: Fn(f64, f64) -> Color, R: Rng {
    let cell_w = 1.0 / nx as f64;
    let cell_h = 1.0 / ny as f64;

    let mut colors = Vec::with_capacity(nx * ny);
    for i in 0..ny {
        for j in 0..nx {
            let cx = x - 0.5 + (j as f64 + 0.5) * cell_w;
            let cy = y - 0.5 + (i as f64 + 0.5) * cell_h;
            let dx = rng.gen_range(-0.5f64..0.5) * cell_w;
            let dy = rng.gen_range(-0.5f64..0.5) * cell_h;

            colors.push(trace(cx + dx, cy + dy));
        }
    }

    Color::mean(&colors)
}

/// Colors the square of half-size `half` centered at `(x, y)`.
///
/// `corners` are the already traced corner colors in the order top-left,
/// top-right, bottom-left, bottom-right. Each quadrant whose corner matches
/// the center is taken as uniform and gets the mean of the two; the others
/// are subdivided while `depth` allows.
fn adaptive<F>(x: f64, y: f64, half: f64, corners: [Color; 4], depth: usize,
    trace: &F) -> Color
    where F: Fn(f64, f64) -> Color {
    let center = trace(x, y);
    let quarter = half / 2.0;

    let signs = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];
    let mut quadrants = [Color::black(); 4];

    for (q, &(sx, sy)) in signs.iter().enumerate() {
        let corner = corners[q];
        if depth <= 1 || corner == center {
            quadrants[q] = Color::average(&corner, &center);
            continue;
        }

        // Corners of the quadrant, in the same order as `corners`. Two of
        // them are known already: the pixel corner and the center.
        let (qx, qy) = (x + sx * quarter, y + sy * quarter);
        let edge_x = trace(x + sx * half, y);
        let edge_y = trace(x, y + sy * half);

        let mut sub = [center; 4];
        for (c, &(cx, cy)) in signs.iter().enumerate() {
            sub[c] = match (cx == sx, cy == sy) {
                (true, true) => corner,
                (false, false) => center,
                (true, false) => edge_x,
                (false, true) => edge_y,
            };
        }

        quadrants[q] = adaptive(qx, qy, quarter, sub, depth - 1, trace);
    }

    Color::mean(&quadrants)
}

#[cfg(test)]
use std::cell::Cell;

#[test]
fn single_sampling_traces_the_center() {
    let calls = Cell::new(0);
    let c = Sampling::Single.sample_pixel(3, 4, 10, |x, y| {
        calls.set(calls.get() + 1);
        Color::rgb(x, y, 0.0)
    });

    assert_eq!(c, Color::rgb(3.0, 4.0, 0.0));
    assert_eq!(calls.get(), 1);
}

#[test]
fn jittered_samples_stay_in_their_cells() {
    let sampling = Sampling::Jittered { nx: 3, ny: 2 };
    let samples = std::cell::RefCell::new(Vec::new());

    sampling.sample_pixel(5, 7, 10, |x, y| {
        samples.borrow_mut().push((x, y));
        Color::black()
    });

    let samples = samples.into_inner();
    assert_eq!(samples.len(), 6);
    for (k, &(x, y)) in samples.iter().enumerate() {
        let (i, j) = (k / 3, k % 3);
        let left = 4.5 + j as f64 / 3.0;
        let top = 6.5 + i as f64 / 2.0;

        assert!(x > left - 1e-9 && x < left + 1.0 / 3.0 + 1e-9);
        assert!(y > top - 1e-9 && y < top + 0.5 + 1e-9);
    }
}

#[test]
fn jittered_sampling_is_reproducible_per_pixel() {
    let sampling = Sampling::Jittered { nx: 4, ny: 4 };
    let trace = |x: f64, y: f64| Color::rgb(x.fract(), y.fract(), 0.0);

    let a = sampling.sample_pixel(2, 3, 8, trace);
    let _ = sampling.sample_pixel(7, 7, 8, trace);
    let b = sampling.sample_pixel(2, 3, 8, trace);
    assert_eq!(a, b);
}

#[test]
fn uniform_pixel_needs_five_adaptive_samples() {
    let calls = Cell::new(0);
    let c = Sampling::Adaptive { depth: 4 }.sample_pixel(0, 0, 1, |_, _| {
        calls.set(calls.get() + 1);
        Color::green()
    });

    assert_eq!(c, Color::green());
    assert_eq!(calls.get(), 5);
}

#[test]
fn adaptive_sampling_refines_edges_only() {
    // A vertical edge at x = 0.1 across the pixel centered at the origin.
    let edge = |x: f64, _: f64| {
        if x < 0.1 { Color::black() } else { Color::white() }
    };

    let shallow_calls = Cell::new(0);
    let shallow = Sampling::Adaptive { depth: 1 }.sample_pixel(0, 0, 1, |x, y| {
        shallow_calls.set(shallow_calls.get() + 1);
        edge(x, y)
    });

    let deep_calls = Cell::new(0);
    let deep = Sampling::Adaptive { depth: 6 }.sample_pixel(0, 0, 1, |x, y| {
        deep_calls.set(deep_calls.get() + 1);
        edge(x, y)
    });

    assert_eq!(shallow_calls.get(), 5);
    assert!(deep_calls.get() > 5);

    // 40% of the pixel is white; refinement gets much closer to that.
    let exact = 0.4;
    assert!((deep.r - exact).abs() < (shallow.r - exact).abs());
    assert!((deep.r - exact).abs() < 0.05);
}

#[test]
fn sampling_counts_must_be_positive() {
    assert!(Sampling::Single.is_valid());
    assert!(Sampling::Jittered { nx: 2, ny: 3 }.is_valid());
    assert!(!Sampling::Jittered { nx: 0, ny: 3 }.is_valid());
    assert!(!Sampling::Adaptive { depth: 0 }.is_valid());
}
