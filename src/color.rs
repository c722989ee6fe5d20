use std::ops::{ Add, Mul };

use crate::feq;
use crate::tuple::Tuple3D;

/// A linear RGB color, or a light intensity.
///
/// Channels are unbounded while shading; intensities routinely exceed 1.0.
/// Only the image sink clamps them to the displayable `[0, 1]` range.
///
/// # Examples
///
/// ```
/// # use phong_tracer::color::Color;
/// let orange = Color::rgb(1.0, 0.5, 0.0);
/// let dimmed = orange * 0.5;
/// assert_eq!(dimmed, Color::from([0.5, 0.25, 0.0]));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Channels are compared with `feq`, so shading noise does not break
/// equality.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) && feq(self.g, other.g) && feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from([r, g, b]: [f64; 3]) -> Color {
        Color { r, g, b }
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// No light at all.
    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    pub fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    pub fn green() -> Color {
        Color::rgb(0.0, 1.0, 0.0)
    }

    pub fn blue() -> Color {
        Color::rgb(0.0, 0.0, 1.0)
    }

    /// The midpoint of two colors.
    ///
    /// ```
    /// # use phong_tracer::color::Color;
    /// let teal = Color::average(&Color::green(), &Color::blue());
    /// assert_eq!(teal, Color::rgb(0.0, 0.5, 0.5));
    /// ```
    pub fn average(c1: &Color, c2: &Color) -> Color {
        (*c1 + *c2).reduce(2.0)
    }

    /// The mean of a set of samples. No samples at all give black.
    ///
    /// ```
    /// # use phong_tracer::color::Color;
    /// let samples = [Color::red(), Color::green(), Color::blue(), Color::black()];
    /// assert_eq!(Color::mean(&samples), Color::rgb(0.25, 0.25, 0.25));
    /// ```
    pub fn mean(colors: &[Color]) -> Color {
        if colors.is_empty() {
            return Color::black();
        }

        colors.iter()
            .fold(Color::black(), |sum, c| sum + *c)
            .reduce(colors.len() as f64)
    }

    /// Divides every channel by `n`.
    pub fn reduce(&self, n: f64) -> Color {
        Color::rgb(self.r / n, self.g / n, self.b / n)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::rgb(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, k: f64) -> Color {
        Color::rgb(self.r * k, self.g * k, self.b * k)
    }
}

/// Attenuates a color by per-channel coefficients: `x` scales red, `y`
/// green and `z` blue.
impl Mul<Tuple3D> for Color {
    type Output = Color;

    fn mul(self, k: Tuple3D) -> Color {
        Color::rgb(self.r * k.x, self.g * k.y, self.b * k.z)
    }
}

#[test]
fn colors_add_channel_by_channel() {
    let sum = Color::rgb(0.9, 0.6, 0.75) + Color::rgb(0.7, 0.1, 0.25);
    assert_eq!(sum, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn scale_color_by_coefficients() {
    let c = Color::rgb(1.0, 0.5, 0.2);
    let k = Tuple3D::new(0.5, 2.0, 0.0);

    assert_eq!(c * k, Color::rgb(0.5, 1.0, 0.0));
    assert_eq!(c * 2.0, Color::rgb(2.0, 1.0, 0.4));
}

#[test]
fn equality_tolerates_rounding() {
    let third = Color::rgb(1.0, 1.0, 1.0).reduce(3.0);
    assert_eq!(third * 3.0, Color::white());
    assert_ne!(Color::rgb(0.0, 0.0, 1e-3), Color::black());
}

#[test]
fn mean_of_no_colors_is_black() {
    assert_eq!(Color::mean(&[]), Color::black());
}
