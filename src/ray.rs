use crate::consts::DELTA;
use crate::align_zero;
use crate::tuple::{ Point3D, Vector3D, GeometryError };

/// A ray with an origin and a unit-length direction.
///
/// Rays are immutable once built; the fields are only readable through
/// accessors so the direction can never be replaced by a non-unit vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray3D {
    origin: Point3D,
    direction: Vector3D,
}

impl Ray3D {
    /// Creates a ray, normalizing `direction`.
    ///
    /// Fails if `direction` is the zero vector.
    pub fn new(origin: Point3D, direction: Vector3D)
        -> Result<Ray3D, GeometryError> {
        Ok(Ray3D { origin, direction: direction.normalize()? })
    }

    /// Creates a ray from a direction the caller already knows is unit length.
    pub(crate) fn from_unit(origin: Point3D, direction: Vector3D) -> Ray3D {
        debug_assert!(crate::feq(direction.length(), 1.0));
        Ray3D { origin, direction }
    }

    /// Creates a ray leaving a surface at `point`.
    ///
    /// The origin is always moved `DELTA` off the surface, along `normal`
    /// when `direction` points to its side and against it otherwise. A
    /// direction tangent to the surface counts as "otherwise". `direction`
    /// must be unit length.
    pub fn offset(point: Point3D, direction: Vector3D, normal: Vector3D)
        -> Ray3D {
        let nv = align_zero(normal.dot(&direction));
        let delta = if nv > 0.0 { DELTA } else { -DELTA };
        let origin = point + normal * delta;

        Ray3D::from_unit(origin, direction)
    }

    pub fn origin(&self) -> Point3D {
        self.origin
    }

    pub fn direction(&self) -> Vector3D {
        self.direction
    }

    /// Returns the point at distance `t` along the ray.
    ///
    /// `position(0.0)` is exactly the origin.
    pub fn position(&self, t: f64) -> Point3D {
        if t == 0.0 {
            return self.origin;
        }

        self.origin + (self.direction * t)
    }

    /// Returns the point of `points` nearest to the ray origin.
    ///
    /// Ties go to the first such point; an empty slice gives `None`.
    pub fn closest_point(&self, points: &[Point3D]) -> Option<Point3D> {
        let mut closest: Option<(f64, Point3D)> = None;

        for p in points.iter() {
            let d = self.origin.distance_squared(p);
            match closest {
                Some((best, _)) if best <= d => (),
                _ => closest = Some((d, *p)),
            }
        }

        closest.map(|(_, p)| p)
    }
}

#[test]
fn ray_direction_is_normalized() {
    let r = Ray3D::new(
        Point3D::new(1.0, 2.0, 3.0),
        Vector3D::new(0.0, 0.0, 5.0)
    ).unwrap();

    assert_eq!(r.origin(), Point3D::new(1.0, 2.0, 3.0));
    assert_eq!(r.direction(), Vector3D::new(0.0, 0.0, 1.0));
}

#[test]
fn ray_with_zero_direction_fails() {
    let r = Ray3D::new(Point3D::origin(), Vector3D::new(0.0, 0.0, 0.0));
    assert_eq!(r, Err(GeometryError::ZeroVector));
}

#[test]
fn ray_position() {
    let r = Ray3D::new(
        Point3D::new(2.0, 3.0, 4.0),
        Vector3D::new(1.0, 0.0, 0.0)
    ).unwrap();

    assert_eq!(r.position(1.0), Point3D::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Point3D::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Point3D::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_position_at_zero_is_exact_origin() {
    let origin = Point3D::new(0.1 + 0.2, 1e-17, -7.3);
    let r = Ray3D::new(origin, Vector3D::new(0.3, -0.7, 0.11)).unwrap();
    let p = r.position(0.0);

    // Bitwise identical, not merely within tolerance.
    assert_eq!(p.x.to_bits(), origin.x.to_bits());
    assert_eq!(p.y.to_bits(), origin.y.to_bits());
    assert_eq!(p.z.to_bits(), origin.z.to_bits());
}

#[test]
fn offset_ray_moves_towards_direction_side() {
    let n = Vector3D::new(0.0, 1.0, 0.0);

    let up = Ray3D::offset(Point3D::origin(), Vector3D::new(0.0, 1.0, 0.0), n);
    assert_eq!(up.origin(), Point3D::new(0.0, DELTA, 0.0));

    let down = Ray3D::offset(Point3D::origin(),
        Vector3D::new(0.0, -1.0, 0.0), n);
    assert_eq!(down.origin(), Point3D::new(0.0, -DELTA, 0.0));

    // Tangent directions still leave the surface, on the back side.
    let along = Ray3D::offset(Point3D::origin(),
        Vector3D::new(1.0, 0.0, 0.0), n);
    assert_eq!(along.origin(), Point3D::new(0.0, -DELTA, 0.0));
    assert_eq!(along.direction(), Vector3D::new(1.0, 0.0, 0.0));
}

#[test]
fn closest_point_ignores_input_order() {
    let r = Ray3D::new(Point3D::origin(), Vector3D::new(1.0, 0.0, 0.0))
        .unwrap();
    let near = Point3D::new(1.0, 0.0, 0.0);
    let mid = Point3D::new(2.0, 0.0, 0.0);
    let far = Point3D::new(3.0, 0.0, 0.0);

    assert_eq!(r.closest_point(&[near, mid, far]), Some(near));
    assert_eq!(r.closest_point(&[mid, far, near]), Some(near));
    assert_eq!(r.closest_point(&[far, near, mid]), Some(near));
    assert_eq!(r.closest_point(&[]), None);
}
