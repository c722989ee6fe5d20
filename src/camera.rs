use std::sync::{ Mutex, PoisonError };
use std::time::Instant;

use log::{ debug, info };
use thiserror::Error;

use crate::is_zero;
use crate::color::Color;
use crate::ray::Ray3D;
use crate::canvas::PixelSink;
use crate::sampling::Sampling;
use crate::tracer::RayTracer;
use crate::parallel::{ render_pixels, RenderError };
use crate::tuple::{ Point3D, Vector3D, GeometryError };

/// Errors raised while building a camera.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum CameraError {
    #[error("camera position is not set")]
    MissingPosition,

    #[error("camera forward direction is not set")]
    MissingForward,

    #[error("camera up direction is not set")]
    MissingUp,

    #[error("camera has no pixel sink")]
    MissingSink,

    #[error("camera has no ray tracer")]
    MissingTracer,

    #[error("camera direction: {0}")]
    Direction(#[from] GeometryError),

    #[error("camera forward and up directions are not orthogonal")]
    NotOrthogonal,

    #[error("view plane size must not be negative (got {0} x {1})")]
    NegativeViewPlane(f64, f64),

    #[error("view plane distance must not be negative (got {0})")]
    NegativeDistance(f64),

    #[error("view plane width is zero")]
    ZeroWidth,

    #[error("view plane height is zero")]
    ZeroHeight,

    #[error("view plane distance is zero")]
    ZeroDistance,

    #[error("sampling counts must be at least one ({0:?})")]
    InvalidSampling(Sampling),

    #[error("grid interval must be at least one")]
    ZeroGridInterval,
}

/// Everything needed to build a `Camera`.
///
/// Fill in the fields, then call `build`, which checks them all at once.
/// Nothing is defaulted silently: a missing or zero required field is an
/// error.
#[derive(Debug)]
pub struct CameraBuilder<T, S> {
    pub position: Option<Point3D>,
    pub forward: Option<Vector3D>,
    pub up: Option<Vector3D>,

    /// View plane width and height, in scene units.
    pub width: f64,
    pub height: f64,

    /// Distance from the camera position to the view plane.
    pub distance: f64,

    pub sampling: Sampling,

    /// Number of render workers; 0 renders on the calling thread.
    pub threads: usize,

    pub sink: Option<S>,
    pub tracer: Option<T>,
}

impl<T, S> Default for CameraBuilder<T, S> {
    fn default() -> CameraBuilder<T, S> {
        CameraBuilder {
            position: None,
            forward: None,
            up: None,
            width: 0.0,
            height: 0.0,
            distance: 0.0,
            sampling: Sampling::Single,
            threads: 0,
            sink: None,
            tracer: None,
        }
    }
}

impl<T: RayTracer, S: PixelSink> CameraBuilder<T, S> {
    pub fn new() -> CameraBuilder<T, S> {
        Default::default()
    }

    /// Validates the configuration and produces a camera.
    pub fn build(self) -> Result<Camera<T, S>, CameraError> {
        let position = self.position.ok_or(CameraError::MissingPosition)?;
        let forward = self.forward.ok_or(CameraError::MissingForward)?;
        let up = self.up.ok_or(CameraError::MissingUp)?;

        let forward = forward.normalize()?;
        let up = up.normalize()?;
        if !is_zero(forward.dot(&up)) {
            return Err(CameraError::NotOrthogonal);
        }

        if self.width < 0.0 || self.height < 0.0 {
            return Err(CameraError::NegativeViewPlane(self.width, self.height));
        }
        if self.distance < 0.0 {
            return Err(CameraError::NegativeDistance(self.distance));
        }
        if is_zero(self.width) {
            return Err(CameraError::ZeroWidth);
        }
        if is_zero(self.height) {
            return Err(CameraError::ZeroHeight);
        }
        if is_zero(self.distance) {
            return Err(CameraError::ZeroDistance);
        }
        if !self.sampling.is_valid() {
            return Err(CameraError::InvalidSampling(self.sampling));
        }

        let sink = self.sink.ok_or(CameraError::MissingSink)?;
        let tracer = self.tracer.ok_or(CameraError::MissingTracer)?;

        Ok(Camera {
            position,
            forward,
            up,
            right: forward.cross(&up),
            width: self.width,
            height: self.height,
            distance: self.distance,
            sampling: self.sampling,
            threads: self.threads,
            sink: Mutex::new(sink),
            tracer,
        })
    }
}

/// A pinhole camera looking at a view plane.
///
/// The view plane sits `distance` in front of the camera along `forward`,
/// is `width × height` scene units large and is divided into the pixel grid
/// of the sink. Row 0 is the top of the image.
#[derive(Debug)]
pub struct Camera<T, S> {
    position: Point3D,
    forward: Vector3D,
    up: Vector3D,
    right: Vector3D,

    width: f64,
    height: f64,
    distance: f64,

    sampling: Sampling,
    threads: usize,

    sink: Mutex<S>,
    tracer: T,
}

impl<T: RayTracer, S: PixelSink> Camera<T, S> {
    pub fn position(&self) -> Point3D {
        self.position
    }

    pub fn forward(&self) -> Vector3D {
        self.forward
    }

    pub fn up(&self) -> Vector3D {
        self.up
    }

    /// `forward × up`.
    pub fn right(&self) -> Vector3D {
        self.right
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Builds the ray through the center of pixel `(col, row)` of an
    /// `nx × ny` grid.
    pub fn construct_ray(&self, nx: usize, ny: usize, col: usize, row: usize)
        -> Ray3D {
        self.ray_through(nx, ny, col as f64, row as f64)
    }

    /// Builds the ray through a point given in continuous pixel coordinates,
    /// where pixel `(col, row)` is centered at `(col, row)`.
    pub fn ray_through(&self, nx: usize, ny: usize, x: f64, y: f64) -> Ray3D {
        let pc = self.position + self.forward * self.distance;

        let rx = self.width / nx as f64;
        let ry = self.height / ny as f64;

        let xj = (x - (nx as f64 - 1.0) / 2.0) * rx;
        let yi = -(y - (ny as f64 - 1.0) / 2.0) * ry;

        let pij = pc + self.right * xj + self.up * yi;

        // The view plane is at a positive distance in front of the camera,
        // so this vector is never shorter than `distance`.
        let v = pij - self.position;
        Ray3D::from_unit(self.position, v * (1.0 / v.length()))
    }

    /// Renders every pixel of the sink.
    ///
    /// Each pixel's color comes from the camera's sampling mode. Pixels are
    /// independent, so the image does not depend on the number of threads.
    pub fn render_image(&self) -> Result<(), RenderError> {
        let (nx, ny) = {
            let sink = self.lock_sink();
            (sink.nx(), sink.ny())
        };

        info!("rendering {}x{} pixels, {:?} sampling, {} thread(s)",
            nx, ny, self.sampling, self.threads);
        let start = Instant::now();

        render_pixels(nx, ny, self.threads, |col, row| {
            let color = self.cast_ray(nx, ny, col, row);
            self.lock_sink().write_pixel(col, row, color);
        })?;

        info!("rendered in {:.2?}", start.elapsed());
        Ok(())
    }

    fn cast_ray(&self, nx: usize, ny: usize, col: usize, row: usize) -> Color {
        self.sampling.sample_pixel(col, row, nx, |x, y| {
            self.tracer.trace_ray(&self.ray_through(nx, ny, x, y))
        })
    }

    /// Paints every `interval`-th row and column of the sink in `color`.
    pub fn print_grid(&self, interval: usize, color: Color)
        -> Result<(), CameraError> {
        if interval == 0 {
            return Err(CameraError::ZeroGridInterval);
        }

        let mut sink = self.lock_sink();
        let (nx, ny) = (sink.nx(), sink.ny());
        debug!("printing grid every {} pixels", interval);

        for row in 0..ny {
            for col in 0..nx {
                if row % interval == 0 || col % interval == 0 {
                    sink.write_pixel(col, row, color);
                }
            }
        }

        Ok(())
    }

    /// Consumes the camera and hands back its sink.
    pub fn into_sink(self) -> S {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sink(&self) -> std::sync::MutexGuard<S> {
        // A sink only receives whole pixels; a worker that panicked while
        // holding the lock left no partial write behind.
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/* Tests */

#[cfg(test)]
use crate::canvas::Canvas;

#[cfg(test)]
use crate::tracer::SimpleRayTracer;

/// Colors every ray by its direction, so images can be compared pixel by
/// pixel.
#[cfg(test)]
struct DirectionTracer;

#[cfg(test)]
impl RayTracer for DirectionTracer {
    fn trace_ray(&self, ray: &Ray3D) -> Color {
        let d = ray.direction();
        Color::rgb(d.x, d.y, d.z)
    }
}

#[cfg(test)]
fn builder(nx: usize, ny: usize) -> CameraBuilder<DirectionTracer, Canvas> {
    CameraBuilder {
        position: Some(Point3D::origin()),
        forward: Some(Vector3D::new(0.0, 0.0, -1.0)),
        up: Some(Vector3D::new(0.0, 1.0, 0.0)),
        width: 3.0,
        height: 3.0,
        distance: 1.0,
        sink: Some(Canvas::new(nx, ny)),
        tracer: Some(DirectionTracer),
        ..Default::default()
    }
}

#[test]
fn rays_through_a_three_by_three_view_plane() {
    let camera = builder(3, 3).build().unwrap();

    let center = camera.construct_ray(3, 3, 1, 1);
    assert_eq!(center.origin(), Point3D::origin());
    assert_eq!(center.direction(), Vector3D::new(0.0, 0.0, -1.0));

    // Row 0 is the top; column 0 is the left, along -right.
    let top_left = camera.construct_ray(3, 3, 0, 0);
    assert_eq!(top_left.direction(),
        Vector3D::new(-1.0, 1.0, -1.0).normalize().unwrap());

    let bottom_middle = camera.construct_ray(3, 3, 1, 2);
    assert_eq!(bottom_middle.direction(),
        Vector3D::new(0.0, -1.0, -1.0).normalize().unwrap());
}

#[test]
fn right_is_forward_cross_up() {
    let camera = builder(1, 1).build().unwrap();
    assert_eq!(camera.right(), Vector3D::new(1.0, 0.0, 0.0));
}

#[test]
fn even_grid_has_no_center_pixel() {
    let camera = builder(4, 4).build().unwrap();

    // 3 units over 4 pixels: the pixel centers sit at ±0.375 and ±1.125.
    let r = camera.construct_ray(4, 4, 1, 2);
    assert_eq!(r.direction(),
        Vector3D::new(-0.375, -0.375, -1.0).normalize().unwrap());
}

#[test]
fn build_reports_missing_fields() {
    let mut b = builder(2, 2);
    b.position = None;
    assert_eq!(b.build().err(), Some(CameraError::MissingPosition));

    let mut b = builder(2, 2);
    b.up = None;
    assert_eq!(b.build().err(), Some(CameraError::MissingUp));

    let mut b = builder(2, 2);
    b.sink = None;
    assert_eq!(b.build().err(), Some(CameraError::MissingSink));

    let mut b = builder(2, 2);
    b.tracer = None;
    assert_eq!(b.build().err(), Some(CameraError::MissingTracer));
}

#[test]
fn build_rejects_bad_geometry() {
    let mut b = builder(2, 2);
    b.up = Some(Vector3D::new(0.0, 1.0, -1.0));
    assert_eq!(b.build().err(), Some(CameraError::NotOrthogonal));

    let mut b = builder(2, 2);
    b.forward = Some(Vector3D::default());
    assert_eq!(b.build().err(),
        Some(CameraError::Direction(GeometryError::ZeroVector)));

    let mut b = builder(2, 2);
    b.height = -1.0;
    assert_eq!(b.build().err(), Some(CameraError::NegativeViewPlane(3.0, -1.0)));

    let mut b = builder(2, 2);
    b.width = 0.0;
    assert_eq!(b.build().err(), Some(CameraError::ZeroWidth));

    let mut b = builder(2, 2);
    b.distance = 0.0;
    assert_eq!(b.build().err(), Some(CameraError::ZeroDistance));

    let mut b = builder(2, 2);
    b.sampling = Sampling::Jittered { nx: 0, ny: 4 };
    assert_eq!(b.build().err(),
        Some(CameraError::InvalidSampling(Sampling::Jittered { nx: 0, ny: 4 })));
}

#[test]
fn render_writes_every_pixel() {
    let camera = builder(3, 3).build().unwrap();
    camera.render_image().unwrap();
    let canvas = camera.into_sink();

    assert_eq!(canvas.read_pixel(1, 1), Some(Color::rgb(0.0, 0.0, -1.0)));

    let d = Vector3D::new(-1.0, 1.0, -1.0).normalize().unwrap();
    assert_eq!(canvas.read_pixel(0, 0), Some(Color::rgb(d.x, d.y, d.z)));
}

#[test]
fn threaded_render_matches_sequential_render() {
    use crate::scene::Scene;
    use crate::shape::Shape;
    use crate::tuple::Tuple3D;
    use crate::light::{ Material, PointLight, LightArea };

    let scene = Scene::new(Color::rgb(0.1, 0.1, 0.2))
        .with_geometry(Shape::sphere(Point3D::new(0.0, 0.0, -6.0), 1.5)
            .with_emission(Color::rgb(0.2, 0.0, 0.0))
            .with_material(Material {
                kd: Tuple3D::splat(0.6),
                ks: Tuple3D::splat(0.3),
                kr: Tuple3D::splat(0.3),
                shininess: 40,
                ..Default::default()
            }))
        .with_geometry(Shape::plane(Point3D::new(0.0, -1.5, 0.0),
            Vector3D::new(0.0, 1.0, 0.0)).unwrap()
            .with_material(Material {
                kd: Tuple3D::splat(0.5),
                kr: Tuple3D::splat(0.2),
                ..Default::default()
            }))
        .with_light(PointLight::new(Color::white(), Point3D::new(3.0, 5.0, -2.0))
            .with_area(LightArea::new(1.0, 3).unwrap()));

    let render = |threads: usize, sampling: Sampling| {
        let camera = CameraBuilder {
            position: Some(Point3D::origin()),
            forward: Some(Vector3D::new(0.0, 0.0, -1.0)),
            up: Some(Vector3D::new(0.0, 1.0, 0.0)),
            width: 4.0,
            height: 3.0,
            distance: 2.0,
            sampling,
            threads,
            sink: Some(Canvas::new(16, 12)),
            tracer: Some(SimpleRayTracer::new(&scene)),
        }.build().unwrap();

        camera.render_image().unwrap();
        camera.into_sink()
    };

    for &sampling in [
        Sampling::Single,
        Sampling::Jittered { nx: 3, ny: 3 },
        Sampling::Adaptive { depth: 3 },
    ].iter() {
        let sequential = render(0, sampling);
        assert_eq!(render(1, sampling), sequential);
        assert_eq!(render(4, sampling), sequential);
    }
}

#[test]
fn grid_overlays_every_interval() {
    let camera = builder(5, 5).build().unwrap();
    camera.print_grid(2, Color::red()).unwrap();
    assert_eq!(camera.print_grid(0, Color::red()),
        Err(CameraError::ZeroGridInterval));

    let canvas = camera.into_sink();
    assert_eq!(canvas.read_pixel(0, 3), Some(Color::red()));
    assert_eq!(canvas.read_pixel(3, 2), Some(Color::red()));
    assert_eq!(canvas.read_pixel(4, 4), Some(Color::red()));
    assert_eq!(canvas.read_pixel(1, 1), Some(Color::black()));
    assert_eq!(canvas.read_pixel(3, 3), Some(Color::black()));
}
