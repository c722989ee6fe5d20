use crate::ray::Ray3D;
use crate::tuple::{ Point3D, Vector3D, GeometryError };

/// An infinite plane through `point` with unit `normal`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneInfo {
    pub point: Point3D,
    pub normal: Vector3D,
}

impl PlaneInfo {
    pub fn new(point: Point3D, normal: Vector3D)
        -> Result<PlaneInfo, GeometryError> {
        Ok(PlaneInfo { point, normal: normal.normalize()? })
    }

    /// The plane through three points.
    ///
    /// Fails if the points are collinear (or coincide), since they then span
    /// no plane.
    pub fn through(p1: Point3D, p2: Point3D, p3: Point3D)
        -> Result<PlaneInfo, GeometryError> {
        let normal = (p2 - p1).cross(&(p3 - p1)).normalize()?;
        Ok(PlaneInfo { point: p1, normal })
    }
}

/// A triangle's vertices, along with the plane they lie in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: Point3D,
    pub p2: Point3D,
    pub p3: Point3D,

    pub plane: PlaneInfo,
}

impl TriangleInfo {
    pub fn new(p1: Point3D, p2: Point3D, p3: Point3D)
        -> Result<TriangleInfo, GeometryError> {
        Ok(TriangleInfo { p1, p2, p3, plane: PlaneInfo::through(p1, p2, p3)? })
    }

    pub fn vertices(&self) -> [Point3D; 3] {
        [self.p1, self.p2, self.p3]
    }
}

/// A tube of `radius` around the line of `axis`.
///
/// For finite cylinders the axis origin is the center of the bottom cap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TubeInfo {
    pub radius: f64,
    pub axis: Ray3D,
}

impl TubeInfo {
    pub fn new(radius: f64, axis: Ray3D) -> TubeInfo {
        TubeInfo { radius, axis }
    }

    /// Signed distance of `p`'s projection along the axis from its origin.
    pub fn axial_offset(&self, p: Point3D) -> f64 {
        self.axis.direction().dot(&(p - self.axis.origin()))
    }

    /// Removes the component of `v` parallel to the axis.
    pub fn perpendicular(&self, v: Vector3D) -> Vector3D {
        let va = self.axis.direction();
        v - va * va.dot(&v)
    }
}

#[test]
fn plane_through_three_points_is_unit_and_orthogonal() {
    let p1 = Point3D::new(0.0, 0.0, 1.0);
    let p2 = Point3D::new(1.0, 0.0, 0.0);
    let p3 = Point3D::new(0.0, 1.0, 0.0);
    let plane = PlaneInfo::through(p1, p2, p3).unwrap();

    assert!(crate::feq(plane.normal.length(), 1.0));
    assert!(crate::is_zero(plane.normal.dot(&(p2 - p1))));
    assert!(crate::is_zero(plane.normal.dot(&(p3 - p1))));
}

#[test]
fn plane_through_collinear_points_fails() {
    let plane = PlaneInfo::through(
        Point3D::new(0.0, 0.0, 1.0),
        Point3D::new(0.0, 0.0, 2.0),
        Point3D::new(0.0, 0.0, 3.0),
    );

    assert_eq!(plane, Err(GeometryError::ZeroVector));
}

#[test]
fn triangle_with_repeated_vertex_fails() {
    let p = Point3D::new(1.0, 2.0, 3.0);
    let t = TriangleInfo::new(p, p, Point3D::origin());

    assert_eq!(t, Err(GeometryError::ZeroVector));
}

#[test]
fn tube_projection_removes_axial_part() {
    let axis = Ray3D::new(Point3D::new(0.0, 1.0, 0.0),
        Vector3D::new(0.0, 0.0, 1.0)).unwrap();
    let tube = TubeInfo::new(1.0, axis);

    assert_eq!(tube.axial_offset(Point3D::new(3.0, 1.0, 4.0)), 4.0);
    assert_eq!(tube.perpendicular(Vector3D::new(3.0, 2.0, 4.0)),
        Vector3D::new(3.0, 2.0, 0.0));
}
