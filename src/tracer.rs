use crate::color::Color;
use crate::ray::Ray3D;
use crate::scene::Scene;
use crate::light::LightSource;
use crate::align_zero;
use crate::intersect::Intersection;
use crate::tuple::{ Point3D, Tuple3D, Vector3D };
use crate::consts::{ MAX_CALC_COLOR_LEVEL, MIN_CALC_COLOR_K };

/// Anything that can turn a primary ray into a color.
///
/// Tracers are shared between render workers, so they must be `Sync`.
pub trait RayTracer: Sync {
    fn trace_ray(&self, ray: &Ray3D) -> Color;
}

/// Counters gathered while tracing one primary ray.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TraceStats {
    /// Number of `calc_color` evaluations, primary hit included.
    pub calls: usize,

    /// Deepest recursion level reached; the primary hit is level 1.
    pub deepest_level: usize,
}

/// A Whitted-style tracer with Phong local lighting.
///
/// Local effects are the emission of the hit surface plus diffuse and
/// specular light from every light source that reaches it. Global effects
/// recurse along the reflected and refracted rays, each weighted by the
/// material's `kr` and `kt`. Recursion ends after `MAX_CALC_COLOR_LEVEL`
/// levels, or earlier once the accumulated weight `k` of a branch drops
/// below `MIN_CALC_COLOR_K` in every channel.
pub struct SimpleRayTracer<'a> {
    scene: &'a Scene,
}

impl<'a> RayTracer for SimpleRayTracer<'a> {
    fn trace_ray(&self, ray: &Ray3D) -> Color {
        self.trace_ray_with_stats(ray).0
    }
}

impl<'a> SimpleRayTracer<'a> {
    pub fn new(scene: &'a Scene) -> SimpleRayTracer<'a> {
        SimpleRayTracer { scene }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Traces a ray, also reporting how much recursion it caused.
    ///
    /// Ambient light is added once to the color of the primary hit; it is
    /// never attenuated by recursion. A ray that hits nothing shows the
    /// background.
    pub fn trace_ray_with_stats(&self, ray: &Ray3D) -> (Color, TraceStats) {
        let mut stats = TraceStats::default();

        let color = match self.find_closest_intersection(ray) {
            Some(hit) => {
                self.calc_color(&hit, ray, MAX_CALC_COLOR_LEVEL,
                    Tuple3D::one(), &mut stats)
                    + self.scene.ambient.intensity
            },
            None => self.scene.background,
        };

        (color, stats)
    }

    fn find_closest_intersection(&self, ray: &Ray3D)
        -> Option<Intersection<'a>> {
        self.scene.geometries().intersect(ray, f64::INFINITY).closest(ray)
    }

    fn calc_color(&self, hit: &Intersection, ray: &Ray3D, level: usize,
        k: Tuple3D, stats: &mut TraceStats) -> Color {
        stats.calls += 1;
        stats.deepest_level = stats.deepest_level
            .max(MAX_CALC_COLOR_LEVEL + 1 - level);

        let color = self.calc_local_effects(hit, ray, k);
        if level <= 1 {
            return color;
        }

        color + self.calc_global_effects(hit, ray, level, k, stats)
    }

    /// Emission plus direct light.
    ///
    /// A light only counts if it sits on the same side of the surface as
    /// the viewer. When the view ray grazes the surface there is no lighting
    /// term at all, only emission.
    fn calc_local_effects(&self, hit: &Intersection, ray: &Ray3D, k: Tuple3D)
        -> Color {
        let emission = hit.shape.emission();
        let n = match hit.shape.normal_at(hit.point) {
            Ok(n) => n,
            Err(_) => return emission,
        };

        let v = ray.direction();
        let nv = align_zero(n.dot(&v));
        if nv == 0.0 {
            return emission;
        }

        let material = hit.shape.material();
        let mut color = emission;
        for light in self.scene.lights.iter() {
            let l = match light.l_at(hit.point) {
                Ok(l) => l,
                Err(_) => continue,
            };

            let nl = align_zero(n.dot(&l));
            if nl * nv <= 0.0 {
                continue;
            }

            let ktr = self.transparency(hit, light, &l, &n);
            if (ktr * k).lower_than(MIN_CALC_COLOR_K) {
                continue;
            }

            let intensity = light.intensity_at(hit.point) * ktr;
            color = color + intensity
                * (material.diffuse(nl) + material.specular(&n, &l, nl, &v));
        }

        color
    }

    fn calc_global_effects(&self, hit: &Intersection, ray: &Ray3D,
        level: usize, k: Tuple3D, stats: &mut TraceStats) -> Color {
        let n = match hit.shape.normal_at(hit.point) {
            Ok(n) => n,
            Err(_) => return Color::black(),
        };

        let v = ray.direction();
        let nv = align_zero(n.dot(&v));
        if nv == 0.0 {
            return Color::black();
        }

        let material = hit.shape.material();
        let refracted = Ray3D::offset(hit.point, v, n);
        let reflected = Ray3D::offset(hit.point, v.reflect(&n), n);

        self.calc_global_effect(&refracted, level, k, material.kt, stats)
            + self.calc_global_effect(&reflected, level, k, material.kr, stats)
    }

    fn calc_global_effect(&self, ray: &Ray3D, level: usize, k: Tuple3D,
        kx: Tuple3D, stats: &mut TraceStats) -> Color {
        let kkx = k * kx;
        if kkx.lower_than(MIN_CALC_COLOR_K) {
            return Color::black();
        }

        let color = match self.find_closest_intersection(ray) {
            Some(hit) => self.calc_color(&hit, ray, level - 1, kkx, stats),
            None => self.scene.background,
        };

        color * kx
    }

    /// How much of `light` reaches the hit point, per channel.
    ///
    /// Every surface between the point and the light lets through its `kt`
    /// share; the products are multiplied together. Soft lights repeat this
    /// for each sample on their area and average the results.
    pub fn transparency(&self, hit: &Intersection, light: &LightSource,
        l: &Vector3D, n: &Vector3D) -> Tuple3D {
        if !light.is_soft() {
            let ray = Ray3D::offset(hit.point, -*l, *n);
            return self.transmission(&ray, light.distance(ray.origin()));
        }

        let targets = light.sample_targets(hit.point);
        if targets.is_empty() {
            return Tuple3D::one();
        }

        let sum = targets.iter()
            .map(|target| self.transmission_towards(hit.point, *target, n))
            .fold(Tuple3D::zero(), |acc, ktr| acc + ktr);

        sum * (1.0 / targets.len() as f64)
    }

    fn transmission_towards(&self, p: Point3D, target: Point3D, n: &Vector3D)
        -> Tuple3D {
        match (target - p).normalize() {
            Ok(direction) => {
                let ray = Ray3D::offset(p, direction, *n);
                self.transmission(&ray, ray.origin().distance(&target))
            },
            Err(_) => Tuple3D::one(),
        }
    }

    /// Product of the `kt` of every surface within `max_distance` of the
    /// ray origin. Shadow rays are bounded from their own, offset origin so
    /// nothing past the light is counted.
    fn transmission(&self, ray: &Ray3D, max_distance: f64) -> Tuple3D {
        let blockers = self.scene.geometries().intersect(ray, max_distance);

        blockers.intersections.iter()
            .fold(Tuple3D::one(), |ktr, i| ktr * i.shape.material().kt)
    }
}

/* Tests */

#[cfg(test)]
use crate::shape::Shape;

#[cfg(test)]
use crate::light::{ Material, PointLight, DirectionalLight, LightArea,
    AmbientLight };

#[cfg(test)]
fn down_ray(x: f64, y: f64) -> Ray3D {
    Ray3D::new(Point3D::new(x, y, 5.0), Vector3D::new(0.0, 0.0, -1.0))
        .unwrap()
}

#[cfg(test)]
fn floor(material: Material) -> Shape {
    Shape::plane(Point3D::origin(), Vector3D::new(0.0, 0.0, 1.0))
        .unwrap()
        .with_material(material)
}

#[test]
fn unlit_scene_shows_background_and_emission_only() {
    let emission = Color::rgb(0.3, 0.6, 0.9);
    let scene = Scene::new(Color::rgb(0.0, 0.0, 0.2))
        .with_geometry(Shape::sphere(Point3D::origin(), 1.0)
            .with_emission(emission)
            .with_material(Material {
                kd: Tuple3D::splat(0.5),
                ks: Tuple3D::splat(0.5),
                shininess: 20,
                ..Default::default()
            }));
    let tracer = SimpleRayTracer::new(&scene);

    assert_eq!(tracer.trace_ray(&down_ray(0.0, 0.0)), emission);
    assert_eq!(tracer.trace_ray(&down_ray(3.0, 3.0)), Color::rgb(0.0, 0.0, 0.2));
}

#[test]
fn ambient_light_is_added_once() {
    let scene = Scene::new(Color::black())
        .with_ambient(AmbientLight::new(Color::white(), Tuple3D::splat(0.1)))
        .with_geometry(floor(Material {
            kr: Tuple3D::splat(0.5),
            ..Default::default()
        }));
    let tracer = SimpleRayTracer::new(&scene);

    // The reflected ray escapes to a black background, so only the primary
    // hit's ambient term remains.
    assert_eq!(tracer.trace_ray(&down_ray(0.0, 0.0)), Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn diffuse_light_from_the_viewer_side() {
    let lit = Scene::new(Color::black())
        .with_geometry(floor(Material {
            kd: Tuple3D::splat(0.5),
            ..Default::default()
        }))
        .with_light(DirectionalLight::new(Color::white(),
            Vector3D::new(0.0, 0.0, -1.0)).unwrap());
    let tracer = SimpleRayTracer::new(&lit);
    assert_eq!(tracer.trace_ray(&down_ray(1.0, 1.0)), Color::rgb(0.5, 0.5, 0.5));

    // Light coming from underneath the floor does nothing.
    let unlit = Scene::new(Color::black())
        .with_geometry(floor(Material {
            kd: Tuple3D::splat(0.5),
            ..Default::default()
        }))
        .with_light(DirectionalLight::new(Color::white(),
            Vector3D::new(0.0, 0.0, 1.0)).unwrap());
    let tracer = SimpleRayTracer::new(&unlit);
    assert_eq!(tracer.trace_ray(&down_ray(1.0, 1.0)), Color::black());
}

#[test]
fn shadow_multiplies_blocker_transmission() {
    let blocker = Shape::sphere(Point3D::new(0.0, 0.0, 5.0), 1.0)
        .with_material(Material {
            kt: Tuple3D::new(0.5, 0.25, 1.0),
            ..Default::default()
        });
    let scene = Scene::new(Color::black())
        .with_geometry(floor(Default::default()))
        .with_geometry(blocker)
        .with_light(PointLight::new(Color::white(), Point3D::new(0.0, 0.0, 10.0)));
    let tracer = SimpleRayTracer::new(&scene);

    let floor_shape = &scene.geometries().children().unwrap()[0];
    let hit = Intersection::new(floor_shape, Point3D::origin());
    let light = &scene.lights[0];
    let l = light.l_at(hit.point).unwrap();
    let n = Vector3D::new(0.0, 0.0, 1.0);

    // The ray enters and leaves the sphere, so its kt counts twice.
    assert_eq!(tracer.transparency(&hit, light, &l, &n),
        Tuple3D::new(0.25, 0.0625, 1.0));

    // Off to the side nothing is in the way.
    let open = Intersection::new(floor_shape, Point3D::new(4.0, 0.0, 0.0));
    let l = light.l_at(open.point).unwrap();
    assert_eq!(tracer.transparency(&open, light, &l, &n), Tuple3D::one());
}

#[test]
fn blockers_behind_the_light_cast_no_shadow() {
    let scene = Scene::new(Color::black())
        .with_geometry(floor(Default::default()))
        .with_geometry(Shape::sphere(Point3D::new(0.0, 0.0, 20.0), 1.0))
        .with_light(PointLight::new(Color::white(), Point3D::new(0.0, 0.0, 10.0)));
    let tracer = SimpleRayTracer::new(&scene);

    let hit = Intersection::new(&scene.geometries().children().unwrap()[0],
        Point3D::origin());
    let light = &scene.lights[0];
    let l = light.l_at(hit.point).unwrap();

    assert_eq!(tracer.transparency(&hit, light, &l,
        &Vector3D::new(0.0, 0.0, 1.0)), Tuple3D::one());
}

#[test]
fn surfaces_just_past_the_light_cast_no_shadow() {
    let ceiling = Shape::plane(Point3D::new(0.0, 0.0, 10.0),
        Vector3D::new(0.0, 0.0, -1.0)).unwrap();
    let n = Vector3D::new(0.0, 0.0, 1.0);

    // The light hangs 0.05 under the ceiling, closer than the ray offset.
    for light in [
        PointLight::new(Color::white(), Point3D::new(0.0, 0.0, 9.95)),
        PointLight::new(Color::white(), Point3D::new(0.0, 0.0, 9.95))
            .with_area(LightArea::new(0.02, 3).unwrap()),
    ].iter() {
        let scene = Scene::new(Color::black())
            .with_geometry(floor(Default::default()))
            .with_geometry(ceiling.clone())
            .with_light(light.clone());
        let tracer = SimpleRayTracer::new(&scene);

        let hit = Intersection::new(&scene.geometries().children().unwrap()[0],
            Point3D::origin());
        let light = &scene.lights[0];
        let l = light.l_at(hit.point).unwrap();

        assert_eq!(tracer.transparency(&hit, light, &l, &n), Tuple3D::one());
    }
}

#[test]
fn single_sample_soft_shadow_matches_hard_shadow() {
    let material = Material {
        kd: Tuple3D::splat(0.8),
        ks: Tuple3D::splat(0.2),
        shininess: 30,
        ..Default::default()
    };
    let blocker = Shape::sphere(Point3D::new(0.5, 0.0, 4.0), 1.0)
        .with_material(Material {
            kt: Tuple3D::splat(0.6),
            ..Default::default()
        });
    let light = PointLight::new(Color::white(), Point3D::new(1.0, 0.0, 10.0));

    let hard = Scene::new(Color::black())
        .with_geometry(floor(material))
        .with_geometry(blocker.clone())
        .with_light(light.clone());
    let soft = Scene::new(Color::black())
        .with_geometry(floor(material))
        .with_geometry(blocker)
        .with_light(light.with_area(LightArea::new(2.0, 1).unwrap()));
    assert!(soft.lights[0].is_soft());

    let hard_tracer = SimpleRayTracer::new(&hard);
    let soft_tracer = SimpleRayTracer::new(&soft);
    for &(x, y) in [(0.0, 0.0), (0.5, 0.2), (3.0, -1.0)].iter() {
        let ray = down_ray(x, y);
        assert_eq!(hard_tracer.trace_ray(&ray), soft_tracer.trace_ray(&ray));
    }
}

#[test]
fn many_sample_soft_shadow_is_partial_at_the_penumbra() {
    // Covers everything with x < 0 at height 5.
    let half_blocker = Shape::triangle(
        Point3D::new(0.0, -100.0, 5.0),
        Point3D::new(0.0, 100.0, 5.0),
        Point3D::new(-100.0, 0.0, 5.0),
    ).unwrap();

    let scene = Scene::new(Color::black())
        .with_geometry(floor(Default::default()))
        .with_geometry(half_blocker)
        .with_light(PointLight::new(Color::white(), Point3D::new(0.0, 0.0, 10.0))
            .with_area(LightArea::new(2.0, 4).unwrap()));
    let tracer = SimpleRayTracer::new(&scene);

    let hit = Intersection::new(&scene.geometries().children().unwrap()[0],
        Point3D::origin());
    let light = &scene.lights[0];
    let l = light.l_at(hit.point).unwrap();
    let ktr = tracer.transparency(&hit, light, &l, &Vector3D::new(0.0, 0.0, 1.0));

    assert!(ktr.x > 0.0 && ktr.x < 1.0);
    assert_eq!(ktr.x, ktr.y);
    assert_eq!(ktr.y, ktr.z);
}

#[test]
fn facing_mirrors_stop_at_the_level_limit() {
    let mirror = Material { kr: Tuple3D::one(), ..Default::default() };
    let scene = Scene::new(Color::black())
        .with_geometry(floor(mirror))
        .with_geometry(Shape::plane(Point3D::new(0.0, 0.0, 10.0),
            Vector3D::new(0.0, 0.0, -1.0)).unwrap().with_material(mirror));
    let tracer = SimpleRayTracer::new(&scene);

    let (color, stats) = tracer.trace_ray_with_stats(&down_ray(0.0, 0.0));
    assert_eq!(color, Color::black());
    assert_eq!(stats.deepest_level, MAX_CALC_COLOR_LEVEL);
    assert_eq!(stats.calls, MAX_CALC_COLOR_LEVEL);
}

#[test]
fn branching_recursion_stays_bounded() {
    // Full reflection and full transmission never fall below the
    // threshold, so only the level limit stops the call tree.
    let glass = Material {
        kr: Tuple3D::one(),
        kt: Tuple3D::one(),
        ..Default::default()
    };
    let scene = Scene::new(Color::black())
        .with_geometry(Shape::sphere(Point3D::origin(), 1.0).with_material(glass))
        .with_geometry(floor(glass).with_emission(Color::rgb(0.1, 0.0, 0.0)))
        .with_geometry(Shape::plane(Point3D::new(0.0, 0.0, 10.0),
            Vector3D::new(0.0, 0.0, -1.0)).unwrap().with_material(glass));
    let tracer = SimpleRayTracer::new(&scene);

    let (_, stats) = tracer.trace_ray_with_stats(&down_ray(0.3, 0.1));
    assert!(stats.deepest_level <= MAX_CALC_COLOR_LEVEL);
    assert!(stats.calls < (1 << MAX_CALC_COLOR_LEVEL));
}

#[test]
fn weak_reflections_are_pruned() {
    let dull = Material { kr: Tuple3D::splat(0.0005), ..Default::default() };
    let scene = Scene::new(Color::black())
        .with_geometry(floor(dull))
        .with_geometry(Shape::plane(Point3D::new(0.0, 0.0, 10.0),
            Vector3D::new(0.0, 0.0, -1.0)).unwrap().with_material(dull));
    let tracer = SimpleRayTracer::new(&scene);

    let (_, stats) = tracer.trace_ray_with_stats(&down_ray(0.0, 0.0));
    assert_eq!(stats.calls, 1);
    assert_eq!(stats.deepest_level, 1);
}
