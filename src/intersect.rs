use crate::ray::Ray3D;
use crate::shape::Shape;
use crate::tuple::Point3D;

/// An intersection.
///
/// This structure assumes that some ray met a surface. `point` is where the
/// ray met it, and `shape` is the leaf surface that was hit (never a group).
///
/// Intersections are produced per query and borrow the shape they hit; they
/// are never stored on the shapes themselves.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub shape: &'a Shape,
    pub point: Point3D,
}

/// Implements partial equality on an Intersection.
///
/// Two Intersection structures are equal if their points coincide and if the
/// underlying *pointers* of the shapes are equivalent. Two identical spheres
/// at the same position are still different surfaces.
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        std::ptr::eq(self.shape, other.shape) && self.point == other.point
    }
}

impl<'a> Intersection<'a> {
    pub fn new(shape: &'a Shape, point: Point3D) -> Intersection<'a> {
        Intersection { shape, point }
    }
}

/// A collection of intersections, in no particular order.
///
/// Mostly a wrapper for a vector of `Intersection` objects. An empty
/// collection means "no hit"; there is no separate null state.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> Intersections<'a> {
    /// Creates a new list of intersections.
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    /// Merges several lists of intersections into one.
    pub fn aggregate(all: Vec<Intersections<'a>>) -> Intersections<'a> {
        let mut intersections = Vec::new();
        for mut is in all.into_iter() {
            intersections.append(&mut is.intersections);
        }

        Intersections { intersections }
    }

    /// The points of every intersection, in collection order.
    pub fn points(&self) -> Vec<Point3D> {
        self.intersections.iter().map(|i| i.point).collect()
    }

    /// Finds the intersection closest to the origin of `ray`.
    ///
    /// Ties keep the first intersection found. Returns `None` when there
    /// are no intersections.
    pub fn closest(&self, ray: &Ray3D) -> Option<Intersection<'a>> {
        let origin = ray.origin();
        let mut closest: Option<(f64, Intersection<'a>)> = None;

        for i in self.intersections.iter() {
            let d = origin.distance_squared(&i.point);
            match closest {
                Some((best, _)) if best <= d => (),
                _ => closest = Some((d, *i)),
            }
        }

        closest.map(|(_, i)| i)
    }
}

#[test]
fn closest_picks_nearest_regardless_of_order() {
    use crate::tuple::Vector3D;

    let s1 = Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0);
    let s2 = Shape::sphere(Point3D::new(0.0, 0.0, 10.0), 1.0);
    let ray = Ray3D::new(Point3D::origin(), Vector3D::new(0.0, 0.0, 1.0))
        .unwrap();

    let near = Intersection::new(&s1, Point3D::new(0.0, 0.0, 4.0));
    let mid = Intersection::new(&s1, Point3D::new(0.0, 0.0, 6.0));
    let far = Intersection::new(&s2, Point3D::new(0.0, 0.0, 9.0));

    for order in [[mid, far, near], [near, mid, far], [far, near, mid]].iter() {
        let is = Intersections { intersections: order.to_vec() };
        assert_eq!(is.closest(&ray), Some(near));
    }

    assert_eq!(Intersections::new().closest(&ray), None);
}

#[test]
fn closest_keeps_first_of_equal_distances() {
    use crate::tuple::Vector3D;

    let s1 = Shape::sphere(Point3D::origin(), 1.0);
    let s2 = Shape::sphere(Point3D::origin(), 1.0);
    let ray = Ray3D::new(Point3D::new(0.0, 0.0, -5.0),
        Vector3D::new(0.0, 0.0, 1.0)).unwrap();

    let p = Point3D::new(0.0, 0.0, -1.0);
    let is = Intersections {
        intersections: vec![Intersection::new(&s2, p), Intersection::new(&s1, p)]
    };

    let hit = is.closest(&ray).unwrap();
    assert!(std::ptr::eq(hit.shape, &s2));
}

#[test]
fn intersections_compare_by_identity_and_point() {
    let s1 = Shape::sphere(Point3D::origin(), 1.0);
    let s2 = Shape::sphere(Point3D::origin(), 1.0);
    let p = Point3D::new(1.0, 0.0, 0.0);

    assert_eq!(Intersection::new(&s1, p), Intersection::new(&s1, p));
    assert_ne!(Intersection::new(&s1, p), Intersection::new(&s2, p));
    assert_ne!(Intersection::new(&s1, p),
        Intersection::new(&s1, Point3D::new(-1.0, 0.0, 0.0)));
}
