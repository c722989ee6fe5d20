use crate::{ align_zero, is_zero };
use crate::color::Color;
use crate::ray::Ray3D;
use crate::light::Material;
use crate::tuple::{ Point3D, Vector3D, GeometryError };
use crate::intersect::{ Intersection, Intersections };
use crate::geometry::{ PlaneInfo, TriangleInfo, TubeInfo };

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    /// A sphere around `center`.
    Sphere { center: Point3D, radius: f64 },

    /// An infinite plane. See PlaneInfo.
    Plane(PlaneInfo),

    /// A triangle. See TriangleInfo for further explanation.
    Triangle(TriangleInfo),

    /// An infinitely long tube around an axis ray.
    Tube(TubeInfo),

    /// A tube cut to `height` along its axis and closed with two flat caps.
    Cylinder(TubeInfo, f64),

    /// A group of shapes. Can include other groups of shapes.
    Group(Vec<Shape>),
}

/// A surface in the scene.
///
/// Every surface carries its own emission and material, including groups;
/// a group's own emission and material are never used for shading since
/// only leaf surfaces are ever hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    pub material: Material,
    pub emission: Color,
}

impl Shape {
    fn from_type(ty: ShapeType) -> Shape {
        Shape {
            ty,
            material: Default::default(),
            emission: Color::black(),
        }
    }

    /// Creates a sphere with a black emission and the default material.
    pub fn sphere(center: Point3D, radius: f64) -> Shape {
        Shape::from_type(ShapeType::Sphere { center, radius })
    }

    /// Creates a plane through `point`. Fails if `normal` is zero.
    pub fn plane(point: Point3D, normal: Vector3D)
        -> Result<Shape, GeometryError> {
        Ok(Shape::from_type(ShapeType::Plane(PlaneInfo::new(point, normal)?)))
    }

    /// Creates the plane through three points. Fails if they are collinear.
    pub fn plane_through(p1: Point3D, p2: Point3D, p3: Point3D)
        -> Result<Shape, GeometryError> {
        let info = PlaneInfo::through(p1, p2, p3)?;
        Ok(Shape::from_type(ShapeType::Plane(info)))
    }

    /// Creates a triangle, defined by three points in space.
    pub fn triangle(p1: Point3D, p2: Point3D, p3: Point3D)
        -> Result<Shape, GeometryError> {
        let info = TriangleInfo::new(p1, p2, p3)?;
        Ok(Shape::from_type(ShapeType::Triangle(info)))
    }

    pub fn tube(radius: f64, axis: Ray3D) -> Shape {
        Shape::from_type(ShapeType::Tube(TubeInfo::new(radius, axis)))
    }

    /// Creates a closed cylinder whose bottom cap is centered on the axis
    /// origin.
    pub fn cylinder(radius: f64, axis: Ray3D, height: f64) -> Shape {
        Shape::from_type(
            ShapeType::Cylinder(TubeInfo::new(radius, axis), height)
        )
    }

    /// Creates an empty group.
    pub fn group() -> Shape {
        Shape::from_type(ShapeType::Group(Vec::new()))
    }

    /// Creates a group holding `children`, in order.
    pub fn group_of(children: Vec<Shape>) -> Shape {
        Shape::from_type(ShapeType::Group(children))
    }

    pub fn with_emission(mut self, emission: Color) -> Shape {
        self.emission = emission;
        self
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    /// Appends a child to a group.
    ///
    /// Fails with `GeometryError::NotAGroup` on any other shape.
    pub fn add_child(&mut self, child: Shape) -> Result<(), GeometryError> {
        match self.ty {
            ShapeType::Group(ref mut children) => {
                children.push(child);
                Ok(())
            },
            _ => Err(GeometryError::NotAGroup),
        }
    }

    /// Returns a reference to a list of child `Shape`s if this is a group.
    pub fn children(&self) -> Option<&Vec<Shape>> {
        if let ShapeType::Group(ref children) = self.ty {
            Some(children)
        } else {
            None
        }
    }

    /// Returns a reference to this Shape's material.
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn emission(&self) -> Color {
        self.emission
    }

    /// Intersects a ray with a Shape.
    ///
    /// Only hits in front of the ray origin and no further than
    /// `max_distance` from it are returned, in no particular order. Pass
    /// `f64::INFINITY` for every forward hit.
    pub fn intersect(&self, ray: &Ray3D, max_distance: f64) -> Intersections {
        match self.ty {
            ShapeType::Sphere { .. } => self.intersect_sphere(ray, max_distance),
            ShapeType::Plane(_) => self.intersect_plane(ray, max_distance),
            ShapeType::Triangle(_) => self.intersect_triangle(ray, max_distance),
            ShapeType::Tube(_) => self.intersect_tube(ray, max_distance),
            ShapeType::Cylinder(_, _)
                => self.intersect_cylinder(ray, max_distance),
            ShapeType::Group(_) => self.intersect_group(ray, max_distance),
        }
    }

    /// Obtains the unit normal vector of a Shape at a point on its surface.
    ///
    /// Groups have no normal of their own. Points where a surface has no
    /// defined normal (e.g. a sphere's center) give `GeometryError::NoNormal`.
    pub fn normal_at(&self, p: Point3D) -> Result<Vector3D, GeometryError> {
        match self.ty {
            ShapeType::Sphere { .. } => self.normal_at_sphere(p),
            ShapeType::Plane(ref plane) => Ok(plane.normal),
            ShapeType::Triangle(ref triangle) => Ok(triangle.plane.normal),
            ShapeType::Tube(ref tube) => Shape::normal_at_tube(tube, p),
            ShapeType::Cylinder(_, _) => self.normal_at_cylinder(p),
            ShapeType::Group(_) => Err(GeometryError::NoNormal),
        }
    }

    /// Checks whether a ray intersects a Sphere.
    ///
    /// Solves along the ray using the projection of the center onto it:
    /// `tm` is where the ray passes closest to the center and `th` the half
    /// chord. A ray tangent to the sphere does not hit it.
    fn intersect_sphere(&self, ray: &Ray3D, max_distance: f64)
        -> Intersections {
        let (center, radius) = match self.ty {
            ShapeType::Sphere { center, radius } => (center, radius),
            _ => unreachable!(),
        };

        let origin = ray.origin();
        let direction = ray.direction();

        // From the center every direction leaves through the surface.
        if origin == center {
            if align_zero(radius - max_distance) > 0.0 {
                return Intersections::new();
            }

            return Intersections {
                intersections: vec![
                    Intersection::new(self, ray.position(radius))
                ]
            };
        }

        let u = center - origin;
        let tm = direction.dot(&u);
        let th2 = align_zero(radius * radius - (u.length_squared() - tm * tm));
        if th2 <= 0.0 {
            return Intersections::new();
        }

        let th = th2.sqrt();
        let mut is = Intersections::new();
        for &t in [tm - th, tm + th].iter() {
            let t = align_zero(t);
            if t > 0.0 && align_zero(t - max_distance) <= 0.0 {
                is.intersections.push(Intersection::new(self, ray.position(t)));
            }
        }

        is
    }

    fn normal_at_sphere(&self, p: Point3D) -> Result<Vector3D, GeometryError> {
        let center = match self.ty {
            ShapeType::Sphere { center, .. } => center,
            _ => unreachable!(),
        };

        (p - center).normalize().map_err(|_| GeometryError::NoNormal)
    }

    /// Finds the distance along `ray` to a plane, if it is hit.
    ///
    /// Parallel rays and rays starting at the plane's reference point never
    /// hit it.
    fn plane_distance(plane: &PlaneInfo, ray: &Ray3D, max_distance: f64)
        -> Option<f64> {
        let origin = ray.origin();
        if origin == plane.point {
            return None;
        }

        let nv = plane.normal.dot(&ray.direction());
        if is_zero(nv) {
            return None;
        }

        let t = align_zero(plane.normal.dot(&(plane.point - origin)) / nv);
        if t <= 0.0 || align_zero(t - max_distance) > 0.0 {
            return None;
        }

        Some(t)
    }

    /// Intersects a ray with a plane.
    fn intersect_plane(&self, ray: &Ray3D, max_distance: f64)
        -> Intersections {
        let plane = match self.ty {
            ShapeType::Plane(ref plane) => plane,
            _ => unreachable!(),
        };

        match Shape::plane_distance(plane, ray, max_distance) {
            Some(t) => Intersections {
                intersections: vec![Intersection::new(self, ray.position(t))]
            },
            None => Intersections::new(),
        }
    }

    /// Intersects a ray with a triangle.
    ///
    /// The ray must hit the triangle's plane, then pass strictly inside all
    /// three edges: the direction has to lie on the same side of each plane
    /// spanned by the ray origin and an edge. Touching an edge or a vertex is
    /// a miss.
    fn intersect_triangle(&self, ray: &Ray3D, max_distance: f64)
        -> Intersections {
        let triangle = match self.ty {
            ShapeType::Triangle(ref triangle) => triangle,
            _ => unreachable!(),
        };

        let t = match Shape::plane_distance(&triangle.plane, ray, max_distance) {
            Some(t) => t,
            None => return Intersections::new(),
        };

        let origin = ray.origin();
        let direction = ray.direction();
        let [p1, p2, p3] = triangle.vertices();
        let (v1, v2, v3) = (p1 - origin, p2 - origin, p3 - origin);

        let mut sign = 0.0;
        for (a, b) in [(v1, v2), (v2, v3), (v3, v1)].iter() {
            let n = match a.cross(b).normalize() {
                Ok(n) => n,
                Err(_) => return Intersections::new(),
            };

            let s = align_zero(direction.dot(&n));
            if s == 0.0 || s * sign < 0.0 {
                return Intersections::new();
            }
            sign = s;
        }

        Intersections {
            intersections: vec![Intersection::new(self, ray.position(t))]
        }
    }

    /// Finds where a ray meets the side of an infinite tube.
    ///
    /// Works on the components of the ray perpendicular to the axis, which
    /// reduces the problem to a circle in the plane across the tube. Rays
    /// parallel to the axis and tangent rays give nothing.
    fn tube_distances(tube: &TubeInfo, ray: &Ray3D, max_distance: f64)
        -> Vec<f64> {
        let d = tube.perpendicular(ray.direction());
        let a = d.length_squared();
        if is_zero(a) {
            return Vec::new();
        }

        let dp = tube.perpendicular(ray.origin() - tube.axis.origin());
        let b = 2.0 * d.dot(&dp);
        let c = dp.length_squared() - tube.radius * tube.radius;

        let disc = align_zero(b * b - 4.0 * a * c);
        if disc <= 0.0 {
            return Vec::new();
        }

        let root = disc.sqrt();
        [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)].iter()
            .map(|&t| align_zero(t))
            .filter(|&t| t > 0.0 && align_zero(t - max_distance) <= 0.0)
            .collect()
    }

    fn intersect_tube(&self, ray: &Ray3D, max_distance: f64) -> Intersections {
        let tube = match self.ty {
            ShapeType::Tube(ref tube) => tube,
            _ => unreachable!(),
        };

        Intersections {
            intersections: Shape::tube_distances(tube, ray, max_distance)
                .into_iter()
                .map(|t| Intersection::new(self, ray.position(t)))
                .collect()
        }
    }

    /// Normal on a tube: the offset from the axis, perpendicular to it.
    ///
    /// When that projection vanishes (the point lies on the axis line) the
    /// raw offset from the axis origin is used instead.
    fn normal_at_tube(tube: &TubeInfo, p: Point3D)
        -> Result<Vector3D, GeometryError> {
        let offset = p - tube.axis.origin();

        tube.perpendicular(offset).normalize()
            .or_else(|_| offset.normalize())
            .map_err(|_| GeometryError::NoNormal)
    }

    fn intersect_cylinder(&self, ray: &Ray3D, max_distance: f64)
        -> Intersections {
        let (tube, height) = match self.ty {
            ShapeType::Cylinder(ref tube, height) => (tube, height),
            _ => unreachable!(),
        };

        let mut is = Intersections::new();

        // Side hits, clipped to the cylinder's length.
        for t in Shape::tube_distances(tube, ray, max_distance) {
            let p = ray.position(t);
            let h = tube.axial_offset(p);
            if align_zero(h) > 0.0 && align_zero(h - height) < 0.0 {
                is.intersections.push(Intersection::new(self, p));
            }
        }

        // Cap hits, strictly inside the rim.
        let axis = tube.axis.direction();
        let bottom = tube.axis.origin();
        let top = bottom + axis * height;
        let nv = axis.dot(&ray.direction());
        if !is_zero(nv) {
            for &center in [bottom, top].iter() {
                let t = align_zero(axis.dot(&(center - ray.origin())) / nv);
                if t <= 0.0 || align_zero(t - max_distance) > 0.0 {
                    continue;
                }

                let p = ray.position(t);
                let r2 = p.distance_squared(&center);
                if align_zero(r2 - tube.radius * tube.radius) < 0.0 {
                    is.intersections.push(Intersection::new(self, p));
                }
            }
        }

        is
    }

    /// Normal on a cylinder: the axis direction on the caps, outwards from
    /// the axis on the side.
    fn normal_at_cylinder(&self, p: Point3D)
        -> Result<Vector3D, GeometryError> {
        let (tube, height) = match self.ty {
            ShapeType::Cylinder(ref tube, height) => (tube, height),
            _ => unreachable!(),
        };

        let h = tube.axial_offset(p);
        let axis = tube.axis.direction();
        if align_zero(h) == 0.0 {
            Ok(-axis)
        } else if align_zero(h - height) == 0.0 {
            Ok(axis)
        } else {
            Shape::normal_at_tube(tube, p)
        }
    }

    /// Scans every child in order and collects all of their hits.
    fn intersect_group(&self, ray: &Ray3D, max_distance: f64)
        -> Intersections {
        let children = match self.ty {
            ShapeType::Group(ref children) => children,
            _ => unreachable!(),
        };

        Intersections::aggregate(
            children.iter()
                .map(|child| child.intersect(ray, max_distance))
                .filter(|is| !is.is_empty())
                .collect()
        )
    }
}

/* Tests */

#[cfg(test)]
fn ray(origin: [f64; 3], direction: [f64; 3]) -> Ray3D {
    Ray3D::new(origin.into(), direction.into()).unwrap()
}

#[cfg(test)]
fn sorted_points(is: &Intersections, from: Point3D) -> Vec<Point3D> {
    let mut points = is.points();
    points.sort_by(|a, b| {
        from.distance(a).partial_cmp(&from.distance(b)).unwrap()
    });
    points
}

#[test]
fn sphere_normal_is_unit_and_undefined_at_center() {
    let s = Shape::sphere(Point3D::origin(), 3.0);

    assert_eq!(s.normal_at(Point3D::new(3.0, 0.0, 0.0)),
        Ok(Vector3D::new(1.0, 0.0, 0.0)));
    assert_eq!(s.normal_at(Point3D::origin()), Err(GeometryError::NoNormal));
}

#[test]
fn ray_crossing_sphere() {
    let s = Shape::sphere(Point3D::new(1.0, 0.0, 0.0), 1.0);
    let gp1 = Point3D::new(0.0651530771650466, 0.355051025721682, 0.0);
    let gp2 = Point3D::new(1.53484692283495, 0.844948974278318, 0.0);
    let from = Point3D::new(-1.0, 0.0, 0.0);

    // Ray's line misses the sphere.
    let is = s.intersect(&ray([-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert!(is.is_empty());

    // Starts before and crosses it.
    let is = s.intersect(&ray([-1.0, 0.0, 0.0], [3.0, 1.0, 0.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from), vec![gp1, gp2]);

    // Starts inside.
    let is = s.intersect(
        &ray([0.8151530771650466, 0.605051025721682, 0.0], [3.0, 1.0, 0.0]),
        f64::INFINITY
    );
    assert_eq!(is.points(), vec![gp2]);

    // Starts after it.
    let is = s.intersect(
        &ray([1.83484692283495, 0.944948974278318, 0.0], [3.0, 1.0, 0.0]),
        f64::INFINITY
    );
    assert!(is.is_empty());
}

#[test]
fn ray_starting_on_sphere() {
    let s = Shape::sphere(Point3D::new(1.0, 0.0, 0.0), 1.0);

    // Going inside hits the far side only.
    let is = s.intersect(&ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert_eq!(is.points(), vec![Point3D::new(2.0, 0.0, 0.0)]);

    // Going outside misses.
    let is = s.intersect(&ray([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert!(is.is_empty());
}

#[test]
fn ray_through_sphere_center() {
    let s = Shape::sphere(Point3D::new(1.0, 0.0, 0.0), 1.0);
    let from = Point3D::new(-1.0, 0.0, 0.0);

    let is = s.intersect(&ray([-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from),
        vec![Point3D::origin(), Point3D::new(2.0, 0.0, 0.0)]);

    // Starting at the center gives one point a radius away.
    let is = s.intersect(&ray([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        f64::INFINITY);
    assert_eq!(is.points(), vec![Point3D::new(1.0, 0.0, 1.0)]);
}

#[test]
fn tangent_ray_misses_sphere() {
    let s = Shape::sphere(Point3D::origin(), 1.0);

    let is = s.intersect(&ray([-2.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert!(is.is_empty());
}

#[test]
fn sphere_hits_are_bounded_by_max_distance() {
    let s = Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0);
    let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);

    assert_eq!(s.intersect(&r, 5.0).points(), vec![Point3D::new(0.0, 0.0, 4.0)]);
    assert_eq!(s.intersect(&r, 6.0).len(), 2);
    assert!(s.intersect(&r, 3.0).is_empty());
}

#[test]
fn ray_against_plane() {
    let p = Shape::plane(Point3D::new(0.0, 0.0, 1.0),
        Vector3D::new(0.0, 0.0, 2.0)).unwrap();

    assert_eq!(p.normal_at(Point3D::new(5.0, 5.0, 1.0)),
        Ok(Vector3D::new(0.0, 0.0, 1.0)));

    // Crossing the plane.
    let is = p.intersect(&ray([1.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        f64::INFINITY);
    assert_eq!(is.points(), vec![Point3D::new(1.0, 1.0, 1.0)]);

    // Moving away from it.
    let is = p.intersect(&ray([1.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
        f64::INFINITY);
    assert!(is.is_empty());

    // Parallel to it, both off and in the plane.
    assert!(p.intersect(&ray([1.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY).is_empty());
    assert!(p.intersect(&ray([1.0, 1.0, 1.0], [1.0, 0.0, 0.0]),
        f64::INFINITY).is_empty());

    // Starting on the plane, or at its reference point.
    assert!(p.intersect(&ray([1.0, 1.0, 1.0], [0.0, 0.0, 1.0]),
        f64::INFINITY).is_empty());
    assert!(p.intersect(&ray([0.0, 0.0, 1.0], [1.0, 1.0, 1.0]),
        f64::INFINITY).is_empty());

    // Hit beyond the maximum distance.
    assert!(p.intersect(&ray([1.0, 1.0, 0.0], [0.0, 0.0, 1.0]), 0.5)
        .is_empty());
}

#[test]
fn plane_from_degenerate_input_fails() {
    assert!(Shape::plane(Point3D::origin(), Vector3D::default()).is_err());
    assert!(Shape::plane_through(
        Point3D::origin(),
        Point3D::new(1.0, 1.0, 1.0),
        Point3D::new(2.0, 2.0, 2.0),
    ).is_err());
}

#[test]
fn triangle_normal_is_orthogonal_to_edges() {
    let points = [
        Point3D::new(0.0, 0.0, 1.0),
        Point3D::new(1.0, 0.0, 0.0),
        Point3D::new(0.0, 1.0, 0.0),
    ];
    let t = Shape::triangle(points[0], points[1], points[2]).unwrap();
    let n = t.normal_at(points[0]).unwrap();

    assert!(crate::feq(n.length(), 1.0));
    for i in 0..3 {
        let edge = points[i] - points[(i + 2) % 3];
        assert!(is_zero(n.dot(&edge)));
    }
}

#[test]
fn ray_against_triangle() {
    let t = Shape::triangle(
        Point3D::new(-1.0, 0.0, 0.0),
        Point3D::new(2.0, 0.0, 0.0),
        Point3D::new(0.0, 3.0, 0.0),
    ).unwrap();

    // Inside the triangle.
    let is = t.intersect(&ray([0.0, 1.0, -1.0], [0.0, 1.0, 1.0]),
        f64::INFINITY);
    assert_eq!(is.points(), vec![Point3D::new(0.0, 2.0, 0.0)]);

    // Outside, against an edge.
    assert!(t.intersect(&ray([-0.5, 1.0, 1.0], [-1.0, 0.0, 1.0]),
        f64::INFINITY).is_empty());

    // Outside, against a vertex.
    assert!(t.intersect(&ray([-1.0, 0.5, -1.0], [-0.2, -0.6, 1.0]),
        f64::INFINITY).is_empty());

    // On an edge.
    assert!(t.intersect(&ray([-1.0, -1.5, -1.0], [0.5, 1.5, 1.0]),
        f64::INFINITY).is_empty());

    // On a vertex.
    assert!(t.intersect(&ray([-1.0, -1.0, -1.0], [3.0, 1.0, 1.0]),
        f64::INFINITY).is_empty());

    // On an edge's continuation.
    assert!(t.intersect(&ray([-2.0, -2.0, -0.5], [5.0, 2.0, 0.5]),
        f64::INFINITY).is_empty());

    // Parallel to the triangle's plane.
    assert!(t.intersect(&ray([0.0, 1.0, -1.0], [0.0, 1.0, 0.0]),
        f64::INFINITY).is_empty());
}

#[test]
fn tube_normal_is_perpendicular_to_axis() {
    let t = Shape::tube(3.0, ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));

    let n = t.normal_at(Point3D::new(1.0, 1.0, 0.0)).unwrap();
    assert_eq!(n, Vector3D::new(0.0, 1.0, 0.0));
    assert!(is_zero(n.dot(&Vector3D::new(1.0, 0.0, 0.0))));

    // Offset already orthogonal to the axis.
    assert_eq!(t.normal_at(Point3D::new(0.0, 1.0, 0.0)),
        Ok(Vector3D::new(0.0, 1.0, 0.0)));

    // On the axis line, the raw offset is used.
    assert_eq!(t.normal_at(Point3D::new(2.0, 0.0, 0.0)),
        Ok(Vector3D::new(1.0, 0.0, 0.0)));
    assert_eq!(t.normal_at(Point3D::origin()), Err(GeometryError::NoNormal));
}

#[test]
fn ray_against_tube() {
    let t = Shape::tube(1.0, ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]));
    let from = Point3D::new(-3.0, 0.0, 5.0);

    // Across the tube.
    let is = t.intersect(&ray([-3.0, 0.0, 5.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from),
        vec![Point3D::new(-1.0, 0.0, 5.0), Point3D::new(1.0, 0.0, 5.0)]);

    // Slanted, from inside.
    let is = t.intersect(&ray([0.0, 0.0, 0.0], [0.0, 1.0, 1.0]),
        f64::INFINITY);
    assert_eq!(is.points(), vec![Point3D::new(0.0, 1.0, 1.0)]);

    // Parallel to the axis and tangent.
    assert!(t.intersect(&ray([0.5, 0.0, 0.0], [0.0, 0.0, 1.0]),
        f64::INFINITY).is_empty());
    assert!(t.intersect(&ray([-3.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        f64::INFINITY).is_empty());
}

#[test]
fn ray_against_cylinder() {
    let c = Shape::cylinder(1.0, ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]), 2.0);

    // Side hits inside the height.
    let from = Point3D::new(-3.0, 0.0, 1.0);
    let is = c.intersect(&ray([-3.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from),
        vec![Point3D::new(-1.0, 0.0, 1.0), Point3D::new(1.0, 0.0, 1.0)]);

    // Side line beyond the top misses.
    assert!(c.intersect(&ray([-3.0, 0.0, 3.0], [1.0, 0.0, 0.0]),
        f64::INFINITY).is_empty());

    // Along the axis, through both caps.
    let from = Point3D::new(0.5, 0.0, -1.0);
    let is = c.intersect(&ray([0.5, 0.0, -1.0], [0.0, 0.0, 1.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from),
        vec![Point3D::new(0.5, 0.0, 0.0), Point3D::new(0.5, 0.0, 2.0)]);

    // Through the bottom cap and out of the side.
    let from = Point3D::new(0.0, 0.0, -1.0);
    let is = c.intersect(&ray([0.0, 0.0, -1.0], [1.0, 0.0, 2.0]),
        f64::INFINITY);
    assert_eq!(sorted_points(&is, from),
        vec![Point3D::new(0.5, 0.0, 0.0), Point3D::new(1.0, 0.0, 1.0)]);
}

#[test]
fn cylinder_normals() {
    let c = Shape::cylinder(1.0, ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]), 2.0);

    assert_eq!(c.normal_at(Point3D::new(0.5, 0.0, 0.0)),
        Ok(Vector3D::new(0.0, 0.0, -1.0)));
    assert_eq!(c.normal_at(Point3D::new(0.0, 0.5, 2.0)),
        Ok(Vector3D::new(0.0, 0.0, 1.0)));
    assert_eq!(c.normal_at(Point3D::new(0.0, -1.0, 1.0)),
        Ok(Vector3D::new(0.0, -1.0, 0.0)));
}

#[test]
fn group_collects_hits_from_every_child() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0)).unwrap();
    g.add_child(Shape::plane(Point3D::new(0.0, 0.0, 10.0),
        Vector3D::new(0.0, 0.0, 1.0)).unwrap()).unwrap();
    g.add_child(Shape::sphere(Point3D::new(5.0, 5.0, 5.0), 1.0)).unwrap();

    let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    assert_eq!(g.intersect(&r, f64::INFINITY).len(), 3);
    assert_eq!(g.intersect(&r, 5.0).len(), 1);

    let closest = g.intersect(&r, f64::INFINITY).closest(&r).unwrap();
    assert_eq!(closest.point, Point3D::new(0.0, 0.0, 4.0));

    let children = g.children().unwrap();
    assert!(std::ptr::eq(closest.shape, &children[0]));
}

#[test]
fn empty_group_has_no_hits_and_no_normal() {
    let g = Shape::group();
    let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);

    assert!(g.intersect(&r, f64::INFINITY).is_empty());
    assert_eq!(g.normal_at(Point3D::origin()), Err(GeometryError::NoNormal));
}

#[test]
fn only_groups_take_children() {
    let mut s = Shape::sphere(Point3D::origin(), 1.0);
    assert_eq!(s.add_child(Shape::group()), Err(GeometryError::NotAGroup));
    assert!(s.children().is_none());
}

#[test]
fn nested_groups_report_the_innermost_shape() {
    let inner = Shape::group_of(vec![
        Shape::sphere(Point3D::new(0.0, 0.0, 3.0), 1.0),
        Shape::sphere(Point3D::new(0.0, 0.0, 8.0), 1.0),
    ]);
    let outer = Shape::group_of(vec![
        Shape::sphere(Point3D::new(0.0, 0.0, 12.0), 1.0),
        inner,
    ]);

    let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    let is = outer.intersect(&r, f64::INFINITY);
    assert_eq!(is.len(), 6);
    assert_eq!(outer.intersect(&r, 6.5).len(), 2);

    let closest = is.closest(&r).unwrap();
    assert_eq!(closest.point, Point3D::new(0.0, 0.0, 2.0));

    let inner = &outer.children().unwrap()[1];
    let grandchild = &inner.children().unwrap()[0];
    assert!(std::ptr::eq(closest.shape, grandchild));
    assert!(!std::ptr::eq(closest.shape, inner));
}
