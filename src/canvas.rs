use std::io;
use std::io::Write;
use std::fs::File;
use std::path::Path;

use crate::color::Color;

/// Where rendered pixels go.
///
/// The renderer only ever writes to a sink; it never reads pixels back.
/// Encoding the finished image is entirely up to the sink. Sinks are moved
/// into the camera and shared by its render workers, so they must be `Send`.
pub trait PixelSink: Send {
    /// Image width, in pixels.
    fn nx(&self) -> usize;

    /// Image height, in pixels.
    fn ny(&self) -> usize;

    /// Stores the color of the pixel in column `col` of row `row`.
    fn write_pixel(&mut self, col: usize, row: usize, color: Color);
}

/// A canvas for drawing pixels.
///
/// The canvas stores the resultant colors for each pixel. Once rendering
/// finishes, the `Canvas` can be used to save the pixels to an image file.
///
/// For now, only PPM images are supported.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Color>,
}

/// Longest line allowed in a PPM file.
const PPM_LINE_WIDTH: usize = 70;

impl Canvas {
    /// Creates a new, black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// Pixels are specified in column-row order. If the specified pixel
    /// location is out-of-bounds, `None` is returned by this function.
    ///
    /// ```
    /// # use phong_tracer::color::Color;
    /// # use phong_tracer::canvas::{ Canvas, PixelSink };
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, purple);
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// assert_eq!(canvas.read_pixel(8, 2), None);
    /// ```
    pub fn read_pixel(&self, col: usize, row: usize) -> Option<Color> {
        if col >= self.width || row >= self.height {
            return None
        }

        Some(self.pixels[(row * self.width) + col])
    }

    /// Encodes the canvas as a plain (P3) PPM image.
    ///
    /// Channels are clamped to `[0, 1]` and scaled to 255. No line is
    /// longer than 70 columns; values wrap onto the next line instead.
    pub fn to_ppm(&self) -> String {
        let mut ppm = format!("P3\n{} {}\n255\n", self.width, self.height);

        for row in self.pixels.chunks(self.width.max(1)) {
            let mut line = String::new();
            for pixel in row.iter() {
                for channel in [pixel.r, pixel.g, pixel.b].iter() {
                    let value = (channel * 255.0).clamp(0.0, 255.0).round();
                    let value = (value as u8).to_string();

                    if !line.is_empty()
                        && line.len() + 1 + value.len() > PPM_LINE_WIDTH {
                        ppm.push_str(&line);
                        ppm.push('\n');
                        line.clear();
                    }

                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&value);
                }
            }

            ppm.push_str(&line);
            ppm.push('\n');
        }

        ppm
    }

    /// Saves a canvas to a PPM file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut out = File::create(path)?;
        out.write_all(self.to_ppm().as_bytes())?;
        out.flush()
    }
}

impl PixelSink for Canvas {
    fn nx(&self) -> usize {
        self.width
    }

    fn ny(&self) -> usize {
        self.height
    }

    /// Out-of-bounds pixels are ignored.
    fn write_pixel(&mut self, col: usize, row: usize, color: Color) {
        if col >= self.width || row >= self.height {
            return;
        }

        self.pixels[(row * self.width) + col] = color;
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.nx(), 10);
    assert_eq!(c.ny(), 20);
    for row in 0..20 {
        for col in 0..10 {
            assert_eq!(c.read_pixel(col, row), Some(Color::black()));
        }
    }
}

#[test]
fn ppm_header_and_clamped_pixels() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, Color::rgb(-0.5, 0.0, 1.0));

    let ppm = c.to_ppm();
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(lines[0], "P3");
    assert_eq!(lines[1], "5 3");
    assert_eq!(lines[2], "255");
    assert_eq!(lines[3], "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
    assert_eq!(lines[4], "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0");
    assert_eq!(lines[5], "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255");
    assert!(ppm.ends_with('\n'));
}

#[test]
fn ppm_lines_wrap_at_seventy_columns() {
    let mut c = Canvas::new(10, 2);
    for row in 0..2 {
        for col in 0..10 {
            c.write_pixel(col, row, Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let ppm = c.to_ppm();
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(lines[3],
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[4],
        "153 255 204 153 255 204 153 255 204 153 255 204 153");
    assert!(lines.iter().all(|l| l.len() <= 70));
}
