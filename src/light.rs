use rand::{ Rng, SeedableRng };
use rand::rngs::StdRng;
use thiserror::Error;

use crate::color::Color;
use crate::consts::AREA_SAMPLE_SEED;
use crate::tuple::{ Point3D, Vector3D, Tuple3D, GeometryError };

/// Errors raised while building lights.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum LightError {
    #[error("light direction: {0}")]
    Direction(#[from] GeometryError),

    #[error("light area radius must not be negative (got {0})")]
    NegativeRadius(f64),

    #[error("light area needs at least one sample per side")]
    NoSamples,

    #[error("spot light beam exponent must not be negative (got {0})")]
    NegativeBeam(f64),
}

/// A material record.
///
/// Materials use the coefficients of the Phong reflection model (diffuse,
/// specular and shininess) plus the transmission and reflection factors that
/// drive refracted and reflected secondary rays. The default material absorbs
/// everything.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub kd: Tuple3D,
    pub ks: Tuple3D,
    pub kt: Tuple3D,
    pub kr: Tuple3D,
    pub shininess: i32,
}

impl Material {
    /// Diffuse factor for a light arriving with `nl = n · l`.
    pub fn diffuse(&self, nl: f64) -> Tuple3D {
        self.kd * nl.abs()
    }

    /// Specular factor for light direction `l` seen along view direction `v`.
    pub fn specular(&self, n: &Vector3D, l: &Vector3D, nl: f64, v: &Vector3D)
        -> Tuple3D {
        let r = *l - (*n * (2.0 * nl));
        let factor = f64::max(0.0, -v.dot(&r)).powi(self.shininess);

        self.ks * factor
    }
}

/// Ambient light, already scaled by its coefficient.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AmbientLight {
    pub intensity: Color,
}

impl AmbientLight {
    pub fn new(intensity: Color, ka: Tuple3D) -> AmbientLight {
        AmbientLight { intensity: intensity * ka }
    }

    /// No ambient light at all.
    pub fn none() -> AmbientLight {
        AmbientLight { intensity: Color::black() }
    }
}

/// A square area around a point light, sampled for soft shadows.
///
/// The sample layout is a `grid × grid` lattice over `[-1, 1]²`, each
/// sample jittered inside its own cell. It is generated once, from a fixed
/// seed, so renders are reproducible and thread-independent. A 1×1 grid is
/// the cell center, which makes the area behave exactly like the bare point
/// light.
#[derive(Clone, Debug, PartialEq)]
pub struct LightArea {
    radius: f64,
    grid: usize,
    offsets: Vec<(f64, f64)>,
}

impl LightArea {
    pub fn new(radius: f64, grid: usize) -> Result<LightArea, LightError> {
        if radius < 0.0 {
            return Err(LightError::NegativeRadius(radius));
        }
        if grid == 0 {
            return Err(LightError::NoSamples);
        }

        let mut offsets = Vec::with_capacity(grid * grid);
        if grid == 1 {
            offsets.push((0.0, 0.0));
        } else {
            let mut rng = StdRng::seed_from_u64(AREA_SAMPLE_SEED);
            let cell = 2.0 / grid as f64;
            let half = cell / 2.0;

            for i in 0..grid {
                for j in 0..grid {
                    let cx = -1.0 + (i as f64 + 0.5) * cell;
                    let cy = -1.0 + (j as f64 + 0.5) * cell;
                    offsets.push((
                        cx + rng.gen_range(-half..half),
                        cy + rng.gen_range(-half..half),
                    ));
                }
            }
        }

        Ok(LightArea { radius, grid, offsets })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of samples along each side of the grid.
    pub fn grid(&self) -> usize {
        self.grid
    }

    pub fn sample_count(&self) -> usize {
        self.offsets.len()
    }

    /// Spreads the samples over the area centered on `center`, facing `l`.
    ///
    /// The two spanning vectors are perpendicular to `l`. The reference axis
    /// used to build them is chosen so it is never parallel to `l`.
    pub fn targets(&self, center: Point3D, l: &Vector3D) -> Vec<Point3D> {
        let reference = if l.x.abs() < 0.9 {
            Vector3D::new(1.0, 0.0, 0.0)
        } else {
            Vector3D::new(0.0, 1.0, 0.0)
        };

        let u = match l.cross(&reference).normalize() {
            Ok(u) => u,
            Err(_) => return vec![center],
        };
        let w = l.cross(&u);

        self.offsets.iter()
            .map(|&(a, b)| center + u * (a * self.radius) + w * (b * self.radius))
            .collect()
    }
}

/// A light shining along one direction from infinitely far away.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub intensity: Color,
    direction: Vector3D,
}

impl DirectionalLight {
    pub fn new(intensity: Color, direction: Vector3D)
        -> Result<DirectionalLight, LightError> {
        Ok(DirectionalLight { intensity, direction: direction.normalize()? })
    }

    pub fn direction(&self) -> Vector3D {
        self.direction
    }
}

/// A point light.
///
/// Emits from a position in space; intensity falls off with distance `d` as
/// `1 / (kc + kl·d + kq·d²)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Point3D,

    pub kc: f64,
    pub kl: f64,
    pub kq: f64,

    pub area: Option<LightArea>,
}

impl PointLight {
    /// Creates a point light with no attenuation and no area.
    pub fn new(intensity: Color, position: Point3D) -> PointLight {
        PointLight {
            intensity,
            position,
            kc: 1.0,
            kl: 0.0,
            kq: 0.0,
            area: None,
        }
    }

    pub fn with_attenuation(mut self, kc: f64, kl: f64, kq: f64) -> PointLight {
        self.kc = kc;
        self.kl = kl;
        self.kq = kq;
        self
    }

    pub fn with_area(mut self, area: LightArea) -> PointLight {
        self.area = Some(area);
        self
    }

    pub fn intensity_at(&self, p: Point3D) -> Color {
        let d = self.position.distance(&p);
        self.intensity.reduce(self.kc + self.kl * d + self.kq * d * d)
    }

    pub fn l_at(&self, p: Point3D) -> Result<Vector3D, GeometryError> {
        (p - self.position).normalize()
    }
}

/// A point light restricted to a beam.
///
/// Intensity is the point-light intensity scaled by
/// `max(0, direction · l) ^ narrow_beam`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub light: PointLight,
    direction: Vector3D,
    narrow_beam: f64,
}

impl SpotLight {
    pub fn new(light: PointLight, direction: Vector3D)
        -> Result<SpotLight, LightError> {
        Ok(SpotLight {
            light,
            direction: direction.normalize()?,
            narrow_beam: 1.0,
        })
    }

    /// Sharpens the beam: intensity falls off as `cos ^ narrow_beam`.
    ///
    /// The exponent must not be negative.
    pub fn with_narrow_beam(mut self, narrow_beam: f64)
        -> Result<SpotLight, LightError> {
        if narrow_beam < 0.0 || narrow_beam.is_nan() {
            return Err(LightError::NegativeBeam(narrow_beam));
        }

        self.narrow_beam = narrow_beam;
        Ok(self)
    }

    pub fn direction(&self) -> Vector3D {
        self.direction
    }

    pub fn narrow_beam(&self) -> f64 {
        self.narrow_beam
    }

    pub fn intensity_at(&self, p: Point3D) -> Color {
        let base = self.light.intensity_at(p);
        match self.light.l_at(p) {
            Ok(l) => {
                let cos = f64::max(0.0, self.direction.dot(&l));
                base * cos.powf(self.narrow_beam)
            },
            Err(_) => Color::black(),
        }
    }
}

/// Any light that illuminates a point directly.
#[derive(Clone, Debug, PartialEq)]
pub enum LightSource {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl LightSource {
    /// The direction light travels to reach `p` (from the light towards `p`).
    pub fn l_at(&self, p: Point3D) -> Result<Vector3D, GeometryError> {
        match self {
            LightSource::Directional(d) => Ok(d.direction),
            LightSource::Point(pl) => pl.l_at(p),
            LightSource::Spot(s) => s.light.l_at(p),
        }
    }

    /// The light's intensity on arrival at `p`.
    pub fn intensity_at(&self, p: Point3D) -> Color {
        match self {
            LightSource::Directional(d) => d.intensity,
            LightSource::Point(pl) => pl.intensity_at(p),
            LightSource::Spot(s) => s.intensity_at(p),
        }
    }

    /// Distance from `p` to the light. Directional lights are infinitely far.
    pub fn distance(&self, p: Point3D) -> f64 {
        match self.position() {
            Some(position) => position.distance(&p),
            None => f64::INFINITY,
        }
    }

    pub fn position(&self) -> Option<Point3D> {
        match self {
            LightSource::Directional(_) => None,
            LightSource::Point(pl) => Some(pl.position),
            LightSource::Spot(s) => Some(s.light.position),
        }
    }

    pub fn area(&self) -> Option<&LightArea> {
        match self {
            LightSource::Directional(_) => None,
            LightSource::Point(pl) => pl.area.as_ref(),
            LightSource::Spot(s) => s.light.area.as_ref(),
        }
    }

    /// Whether this light casts soft shadows.
    pub fn is_soft(&self) -> bool {
        self.area().map_or(false, |a| a.radius() > 0.0)
    }

    /// The points on the light's area that shadow rays from `p` aim at.
    ///
    /// Empty for lights that are not soft.
    pub fn sample_targets(&self, p: Point3D) -> Vec<Point3D> {
        let (area, position) = match (self.area(), self.position()) {
            (Some(area), Some(position)) if area.radius() > 0.0
                => (area, position),
            _ => return Vec::new(),
        };

        match self.l_at(p) {
            Ok(l) => area.targets(position, &l),
            Err(_) => vec![position],
        }
    }
}

impl From<DirectionalLight> for LightSource {
    fn from(light: DirectionalLight) -> LightSource {
        LightSource::Directional(light)
    }
}

impl From<PointLight> for LightSource {
    fn from(light: PointLight) -> LightSource {
        LightSource::Point(light)
    }
}

impl From<SpotLight> for LightSource {
    fn from(light: SpotLight) -> LightSource {
        LightSource::Spot(light)
    }
}

#[test]
fn ambient_light_is_prescaled() {
    let a = AmbientLight::new(Color::rgb(1.0, 0.5, 0.2), Tuple3D::splat(0.1));
    assert_eq!(a.intensity, Color::rgb(0.1, 0.05, 0.02));
    assert_eq!(AmbientLight::none().intensity, Color::black());
}

#[test]
fn default_material_absorbs_everything() {
    let m: Material = Default::default();

    assert_eq!(m.kd, Tuple3D::zero());
    assert_eq!(m.ks, Tuple3D::zero());
    assert_eq!(m.kt, Tuple3D::zero());
    assert_eq!(m.kr, Tuple3D::zero());
    assert_eq!(m.shininess, 0);
}

#[test]
fn eye_opposite_reflection_gives_full_specular() {
    let m = Material {
        ks: Tuple3D::splat(0.5),
        shininess: 10,
        ..Default::default()
    };

    // Light comes in at 45 degrees, eye sits exactly on the mirrored ray.
    let n = Vector3D::new(0.0, 1.0, 0.0);
    let l = Vector3D::new(1.0, -1.0, 0.0).normalize().unwrap();
    let v = Vector3D::new(-1.0, -1.0, 0.0).normalize().unwrap();
    let nl = n.dot(&l);

    assert_eq!(m.specular(&n, &l, nl, &v), Tuple3D::splat(0.5));
    assert_eq!(m.diffuse(nl), Tuple3D::zero());
}

#[test]
fn point_light_attenuates_with_distance() {
    let light = PointLight::new(Color::white(), Point3D::origin())
        .with_attenuation(1.0, 1.0, 1.0);

    // d = 2 -> 1 / (1 + 2 + 4)
    let i = light.intensity_at(Point3D::new(0.0, 2.0, 0.0));
    assert_eq!(i, Color::white().reduce(7.0));
}

#[test]
fn point_light_direction_points_away_from_light() {
    let light: LightSource =
        PointLight::new(Color::white(), Point3D::new(0.0, 10.0, 0.0)).into();
    let p = Point3D::origin();

    assert_eq!(light.l_at(p).unwrap(), Vector3D::new(0.0, -1.0, 0.0));
    assert_eq!(light.distance(p), 10.0);
}

#[test]
fn directional_light_is_infinitely_far() {
    let light: LightSource = DirectionalLight::new(
        Color::white(), Vector3D::new(0.0, -2.0, 0.0)
    ).unwrap().into();

    assert!(light.distance(Point3D::origin()).is_infinite());
    assert_eq!(light.l_at(Point3D::new(5.0, 5.0, 5.0)).unwrap(),
        Vector3D::new(0.0, -1.0, 0.0));
    assert!(!light.is_soft());
}

#[test]
fn directional_light_rejects_zero_direction() {
    let light = DirectionalLight::new(Color::white(), Vector3D::default());
    assert_eq!(light, Err(LightError::Direction(GeometryError::ZeroVector)));
}

#[test]
fn spot_light_is_restricted_to_its_beam() {
    let spot = SpotLight::new(
        PointLight::new(Color::white(), Point3D::new(0.0, 10.0, 0.0)),
        Vector3D::new(0.0, -1.0, 0.0),
    ).unwrap();

    // Straight down the beam.
    assert_eq!(spot.intensity_at(Point3D::origin()), Color::white());

    // Behind the light.
    assert_eq!(spot.intensity_at(Point3D::new(0.0, 20.0, 0.0)),
        Color::black());

    // 60 degrees off axis, sharpened by the beam exponent.
    let p = Point3D::new(10.0 * 3.0f64.sqrt(), 0.0, 0.0);
    let narrow = spot.clone().with_narrow_beam(2.0).unwrap();
    assert_eq!(spot.intensity_at(p), Color::white() * 0.5);
    assert_eq!(narrow.intensity_at(p), Color::white() * 0.25);
}

#[test]
fn light_area_rejects_bad_parameters() {
    assert_eq!(LightArea::new(-1.0, 3), Err(LightError::NegativeRadius(-1.0)));
    assert_eq!(LightArea::new(1.0, 0), Err(LightError::NoSamples));
}

#[test]
fn light_area_samples_stay_inside_and_perpendicular() {
    let area = LightArea::new(2.0, 4).unwrap();
    assert_eq!(area.sample_count(), 16);

    let center = Point3D::new(0.0, 10.0, 0.0);
    let l = Vector3D::new(0.0, -1.0, 0.0);
    let targets = area.targets(center, &l);

    assert_eq!(targets.len(), 16);
    for t in targets.iter() {
        let offset = *t - center;
        assert!(crate::is_zero(offset.dot(&l)));
        assert!(offset.x.abs() <= 2.0 && offset.z.abs() <= 2.0);
    }
}

#[test]
fn light_area_layout_is_reproducible() {
    let a = LightArea::new(1.0, 5).unwrap();
    let b = LightArea::new(1.0, 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn single_sample_area_targets_the_light_position() {
    let light: LightSource =
        PointLight::new(Color::white(), Point3D::new(1.0, 5.0, 0.0))
            .with_area(LightArea::new(3.0, 1).unwrap())
            .into();

    assert!(light.is_soft());
    assert_eq!(light.sample_targets(Point3D::origin()),
        vec![Point3D::new(1.0, 5.0, 0.0)]);
}

#[test]
fn spot_light_rejects_negative_beam() {
    let spot = SpotLight::new(
        PointLight::new(Color::white(), Point3D::new(0.0, 10.0, 0.0)),
        Vector3D::new(0.0, -1.0, 0.0),
    ).unwrap();

    assert_eq!(spot.clone().with_narrow_beam(-2.0),
        Err(LightError::NegativeBeam(-2.0)));

    // Zero is allowed: a beam with no falloff inside its half-space.
    let flat = spot.with_narrow_beam(0.0).unwrap();
    assert_eq!(flat.intensity_at(Point3D::new(0.0, 0.0, 0.0)), Color::white());
}
