use std::ops::{ Add, Sub, Neg, Mul };

use thiserror::Error;

use crate::{ feq, is_zero };

/// Errors raised while building geometric values.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cannot normalize a zero-length vector")]
    ZeroVector,

    #[error("surface has no normal at the given point")]
    NoNormal,

    #[error("only groups can hold child surfaces")]
    NotAGroup,
}

/// A three-component coefficient, e.g. a material's diffuse factor or the
/// attenuation accumulated along a recursive ray path.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Tuple3D {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl PartialEq for Tuple3D {
    fn eq(&self, other: &Tuple3D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl Tuple3D {
    pub fn new(x: f64, y: f64, z: f64) -> Tuple3D {
        Tuple3D { x, y, z }
    }

    /// A tuple with the same value in every component.
    pub fn splat(v: f64) -> Tuple3D {
        Tuple3D { x: v, y: v, z: v }
    }

    pub fn zero() -> Tuple3D {
        Tuple3D::splat(0.0)
    }

    pub fn one() -> Tuple3D {
        Tuple3D::splat(1.0)
    }

    /// True if every component is strictly below `threshold`.
    pub fn lower_than(&self, threshold: f64) -> bool {
        self.x < threshold && self.y < threshold && self.z < threshold
    }
}

impl From<[f64; 3]> for Tuple3D {
    fn from(v: [f64; 3]) -> Tuple3D {
        Tuple3D { x: v[0], y: v[1], z: v[2] }
    }
}

impl Add for Tuple3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z
        }
    }
}

/// Component-wise product.
impl Mul for Tuple3D {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z
        }
    }
}

impl Mul<f64> for Tuple3D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other
        }
    }
}

/// A location in space.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl PartialEq for Point3D {
    fn eq(&self, other: &Point3D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Point3D {
        Point3D { x, y, z }
    }

    pub fn origin() -> Point3D {
        Point3D { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance_squared(&self, other: &Point3D) -> f64 {
        (*self - *other).length_squared()
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(v: [f64; 3]) -> Point3D {
        Point3D { x: v[0], y: v[1], z: v[2] }
    }
}

/// A displacement in space.
///
/// Arithmetic on vectors may yield the zero vector; only `normalize` refuses
/// it, so every *direction* in the tracer is guaranteed non-zero.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl PartialEq for Vector3D {
    fn eq(&self, other: &Vector3D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D { x, y, z }
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector pointing the same way as `self`.
    ///
    /// Fails with `GeometryError::ZeroVector` if the length is numerically
    /// zero.
    pub fn normalize(&self) -> Result<Vector3D, GeometryError> {
        let len = self.length();
        if is_zero(len) {
            return Err(GeometryError::ZeroVector);
        }

        Ok(*self * (1.0 / len))
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Vector3D) -> Vector3D {
        *self - (*normal * 2.0 * self.dot(normal))
    }

    pub fn is_zero(&self) -> bool {
        is_zero(self.x) && is_zero(self.y) && is_zero(self.z)
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(v: [f64; 3]) -> Vector3D {
        Vector3D { x: v[0], y: v[1], z: v[2] }
    }
}

impl Sub<Point3D> for Point3D {
    type Output = Vector3D;

    fn sub(self, other: Point3D) -> Vector3D {
        Vector3D {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z
        }
    }
}

impl Add<Vector3D> for Point3D {
    type Output = Point3D;

    fn add(self, other: Vector3D) -> Point3D {
        Point3D {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z
        }
    }
}

impl Sub<Vector3D> for Point3D {
    type Output = Point3D;

    fn sub(self, other: Vector3D) -> Point3D {
        Point3D {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z
        }
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z
        }
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z
        }
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z
        }
    }
}

/// Implements scalar right-multiplication for a vector.
///
/// ```
/// use phong_tracer::tuple::Vector3D;
///
/// let v = Vector3D::new(1.0, 2.0, 3.0);
/// assert_eq!(v * 2.0, Vector3D::new(2.0, 4.0, 6.0));
/// ```
impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other
        }
    }
}

/// Implements scalar left-multiplication for a vector.
///
/// ```
/// use phong_tracer::tuple::Vector3D;
///
/// let v = Vector3D::new(1.0, 2.0, 3.0);
/// assert_eq!(2.0 * v, Vector3D::new(2.0, 4.0, 6.0));
/// ```
impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, other: Vector3D) -> Vector3D {
        Vector3D {
            x: self * other.x,
            y: self * other.y,
            z: self * other.z
        }
    }
}

/* Tests */

#[test]
fn sub_points() {
    let p1 = Point3D::new(3.0, 2.0, 1.0);
    let p2 = Point3D::new(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Vector3D::new(-2.0, -4.0, -6.0));
}

#[test]
fn add_vector_to_point() {
    let p = Point3D::new(3.0, 2.0, 1.0);
    let v = Vector3D::new(-3.0, -2.0, -1.0);

    assert_eq!(p + v, Point3D::origin());
}

#[test]
fn sub_vector_from_point() {
    let p = Point3D::new(3.0, 2.0, 1.0);
    let v = Vector3D::new(5.0, 6.0, 7.0);

    assert_eq!(p - v, Point3D::new(-2.0, -4.0, -6.0));
}

#[test]
fn neg_vector() {
    let a = Vector3D::new(1.0, -2.0, 3.0);

    assert_eq!(-a, Vector3D::new(-1.0, 2.0, -3.0));
}

#[test]
fn length_of_vector() {
    let v = Vector3D::new(-1.0, -2.0, -3.0);

    assert_eq!(v.length(), f64::sqrt(14.0));
    assert_eq!(v.length_squared(), 14.0);
}

#[test]
fn normalize_dirty() {
    let v = Vector3D::new(1.0, 2.0, 3.0);
    let e = Vector3D::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    let n = v.normalize().unwrap();
    assert_eq!(n, e);
    assert!(crate::feq(n.length(), 1.0));
}

#[test]
fn normalize_zero_vector_fails() {
    let v = Vector3D::new(0.0, 0.0, 0.0);
    assert_eq!(v.normalize(), Err(GeometryError::ZeroVector));

    // Opposite vectors cancel out to the zero vector too.
    let a = Vector3D::new(1.0, 2.0, 3.0);
    assert_eq!((a + (-a)).normalize(), Err(GeometryError::ZeroVector));
}

#[test]
fn dot_vectors() {
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = Vector3D::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn cross_vectors() {
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = Vector3D::new(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Vector3D::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vector3D::new(1.0, -2.0, 1.0));

    // The cross product is orthogonal to both operands.
    let c = a.cross(&b);
    assert!(crate::is_zero(c.dot(&a)));
    assert!(crate::is_zero(c.dot(&b)));
}

#[test]
fn cross_parallel_vectors_is_zero() {
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = a * -2.0;

    assert!(a.cross(&b).is_zero());
}

#[test]
fn reflect_45() {
    let v = Vector3D::new(1.0, -1.0, 0.0);
    let n = Vector3D::new(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Vector3D::new(1.0, 1.0, 0.0));
}

#[test]
fn distance_between_points() {
    let p1 = Point3D::new(1.0, 2.0, 3.0);
    let p2 = Point3D::new(4.0, 6.0, 3.0);

    assert_eq!(p1.distance_squared(&p2), 25.0);
    assert_eq!(p1.distance(&p2), 5.0);
}

#[test]
fn tuple_lower_than_checks_every_component() {
    assert!(Tuple3D::new(0.0001, 0.0002, 0.0).lower_than(0.001));
    assert!(!Tuple3D::new(0.0001, 0.5, 0.0).lower_than(0.001));
    assert_eq!(Tuple3D::new(0.5, 1.0, 2.0) * Tuple3D::splat(0.5),
        Tuple3D::new(0.25, 0.5, 1.0));
}
