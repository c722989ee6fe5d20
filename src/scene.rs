use std::fs;
use std::convert::TryFrom;
use std::io;
use std::path::Path;

use log::info;
use serde::{ Serialize, Deserialize };
use thiserror::Error;

use crate::color::Color;
use crate::ray::Ray3D;
use crate::sampling::Sampling;
use crate::camera::CameraBuilder;
use crate::consts::DEFAULT_NUM_THREADS;
use crate::shape::{ Shape, ShapeType };
use crate::tuple::{ Point3D, Vector3D, Tuple3D, GeometryError };
use crate::light::{
    AmbientLight,
    DirectionalLight,
    LightArea,
    LightError,
    LightSource,
    Material,
    PointLight,
    SpotLight,
};

/// Errors raised while loading a scene description.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("could not read scene file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid surface: {0}")]
    Geometry(#[from] GeometryError),

    #[error("invalid light: {0}")]
    Light(#[from] LightError),

    #[error("image must be at least 1x1 pixels (got {0}x{1})")]
    EmptyImage(usize, usize),
}

/// Everything the tracer looks at.
///
/// All surfaces live in one top-level group. A scene is built up front and
/// never changes while it is being rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub background: Color,
    pub ambient: AmbientLight,
    pub lights: Vec<LightSource>,
    geometries: Shape,
}

impl Scene {
    /// An empty scene: no surfaces, no lights, no ambient light.
    pub fn new(background: Color) -> Scene {
        Scene {
            background,
            ambient: AmbientLight::none(),
            lights: Vec::new(),
            geometries: Shape::group(),
        }
    }

    pub fn with_ambient(mut self, ambient: AmbientLight) -> Scene {
        self.ambient = ambient;
        self
    }

    /// Adds a surface to the top-level group.
    pub fn with_geometry(mut self, shape: Shape) -> Scene {
        if let ShapeType::Group(ref mut children) = self.geometries.ty {
            children.push(shape);
        }
        self
    }

    pub fn with_light<L: Into<LightSource>>(mut self, light: L) -> Scene {
        self.lights.push(light.into());
        self
    }

    /// The top-level group holding every surface.
    pub fn geometries(&self) -> &Shape {
        &self.geometries
    }
}

/// A scene description file: the scene itself plus how to look at it.
#[derive(Debug)]
pub struct SceneFile {
    pub scene: Scene,
    pub view: View,
}

impl SceneFile {
    /// Reads and parses a JSON scene description.
    pub fn load(path: &Path) -> Result<SceneFile, SceneError> {
        let json = fs::read_to_string(path)?;
        SceneFile::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<SceneFile, SceneError> {
        let scene_json: SceneJson = serde_json::from_str(json)?;

        let view = View::from(scene_json.view);
        if view.nx == 0 || view.ny == 0 {
            return Err(SceneError::EmptyImage(view.nx, view.ny));
        }

        let mut scene = Scene::new(scene_json.background.into())
            .with_ambient(scene_json.ambient.into());

        for shape_json in scene_json.geometries {
            scene = scene.with_geometry(Shape::try_from(shape_json)?);
        }
        for light_json in scene_json.lights {
            scene = scene.with_light(LightSource::try_from(light_json)?);
        }

        info!("loaded scene: {} surface(s), {} light(s), {}x{} image",
            scene.geometries().children().map_or(0, |c| c.len()),
            scene.lights.len(), view.nx, view.ny);

        Ok(SceneFile { scene, view })
    }
}

/// Camera placement and image settings read from a scene file.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    pub position: Point3D,
    pub forward: Vector3D,
    pub up: Vector3D,

    pub width: f64,
    pub height: f64,
    pub distance: f64,

    /// Image resolution, in pixels.
    pub nx: usize,
    pub ny: usize,

    pub sampling: Sampling,
    pub threads: usize,
}

impl View {
    /// A camera builder filled in from this view; the caller supplies the
    /// sink and the tracer.
    pub fn builder<T, S>(&self) -> CameraBuilder<T, S> {
        CameraBuilder {
            position: Some(self.position),
            forward: Some(self.forward),
            up: Some(self.up),
            width: self.width,
            height: self.height,
            distance: self.distance,
            sampling: self.sampling,
            threads: self.threads,
            sink: None,
            tracer: None,
        }
    }
}

/* JSON mirror types */

#[derive(Serialize, Deserialize)]
struct SceneJson {
    #[serde(default)]
    background: [f64; 3],

    #[serde(default)]
    ambient: Option<AmbientJson>,

    #[serde(default)]
    geometries: Vec<ShapeJson>,

    #[serde(default)]
    lights: Vec<LightJson>,

    view: ViewJson,
}

#[derive(Serialize, Deserialize)]
struct AmbientJson {
    intensity: [f64; 3],
    ka: Coefficient,
}

impl From<Option<AmbientJson>> for AmbientLight {
    fn from(ambient_json: Option<AmbientJson>) -> AmbientLight {
        match ambient_json {
            Some(a) => AmbientLight::new(a.intensity.into(), a.ka.into()),
            None => AmbientLight::none(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ViewJson {
    position: [f64; 3],
    forward: [f64; 3],
    up: [f64; 3],

    width: f64,
    height: f64,
    distance: f64,

    /// `[nx, ny]`
    image: [usize; 2],

    #[serde(default)]
    sampling: SamplingJson,

    #[serde(default)]
    threads: Option<usize>,
}

impl From<ViewJson> for View {
    fn from(view_json: ViewJson) -> View {
        View {
            position: view_json.position.into(),
            forward: view_json.forward.into(),
            up: view_json.up.into(),
            width: view_json.width,
            height: view_json.height,
            distance: view_json.distance,
            nx: view_json.image[0],
            ny: view_json.image[1],
            sampling: view_json.sampling.into(),
            threads: view_json.threads.unwrap_or(DEFAULT_NUM_THREADS),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SamplingJson {
    Single,
    Jittered { nx: usize, ny: usize },
    Adaptive { depth: usize },
}

impl Default for SamplingJson {
    fn default() -> SamplingJson {
        SamplingJson::Single
    }
}

impl From<SamplingJson> for Sampling {
    fn from(sampling_json: SamplingJson) -> Sampling {
        match sampling_json {
            SamplingJson::Single => Sampling::Single,
            SamplingJson::Jittered { nx, ny } => Sampling::Jittered { nx, ny },
            SamplingJson::Adaptive { depth } => Sampling::Adaptive { depth },
        }
    }
}

/// A material coefficient, either one value for all channels or one each.
#[derive(Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Coefficient {
    Uniform(f64),
    Rgb([f64; 3]),
}

impl Default for Coefficient {
    fn default() -> Coefficient {
        Coefficient::Uniform(0.0)
    }
}

impl From<Coefficient> for Tuple3D {
    fn from(coefficient: Coefficient) -> Tuple3D {
        match coefficient {
            Coefficient::Uniform(v) => Tuple3D::splat(v),
            Coefficient::Rgb(rgb) => rgb.into(),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct MaterialJson {
    kd: Coefficient,
    ks: Coefficient,
    kt: Coefficient,
    kr: Coefficient,
    shininess: i32,
}

impl From<MaterialJson> for Material {
    fn from(material_json: MaterialJson) -> Material {
        Material {
            kd: material_json.kd.into(),
            ks: material_json.ks.into(),
            kt: material_json.kt.into(),
            kr: material_json.kr.into(),
            shininess: material_json.shininess,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct AxisJson {
    origin: [f64; 3],
    direction: [f64; 3],
}

impl TryFrom<AxisJson> for Ray3D {
    type Error = GeometryError;

    fn try_from(axis_json: AxisJson) -> Result<Ray3D, GeometryError> {
        Ray3D::new(axis_json.origin.into(), axis_json.direction.into())
    }
}

#[derive(Serialize, Deserialize)]
struct ShapeJson {
    #[serde(flatten)]
    kind: ShapeKindJson,

    #[serde(default)]
    material: MaterialJson,

    #[serde(default)]
    emission: [f64; 3],
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ShapeKindJson {
    Sphere { center: [f64; 3], radius: f64 },
    Plane { point: [f64; 3], normal: [f64; 3] },
    PlaneThrough { points: [[f64; 3]; 3] },
    Triangle { points: [[f64; 3]; 3] },
    Tube { radius: f64, axis: AxisJson },
    Cylinder { radius: f64, axis: AxisJson, height: f64 },
    Group { children: Vec<ShapeJson> },
}

impl TryFrom<ShapeJson> for Shape {
    type Error = SceneError;

    fn try_from(shape_json: ShapeJson) -> Result<Shape, SceneError> {
        let shape = match shape_json.kind {
            ShapeKindJson::Sphere { center, radius }
                => Shape::sphere(center.into(), radius),

            ShapeKindJson::Plane { point, normal }
                => Shape::plane(point.into(), normal.into())?,

            ShapeKindJson::PlaneThrough { points: [p1, p2, p3] }
                => Shape::plane_through(p1.into(), p2.into(), p3.into())?,

            ShapeKindJson::Triangle { points: [p1, p2, p3] }
                => Shape::triangle(p1.into(), p2.into(), p3.into())?,

            ShapeKindJson::Tube { radius, axis }
                => Shape::tube(radius, Ray3D::try_from(axis)?),

            ShapeKindJson::Cylinder { radius, axis, height }
                => Shape::cylinder(radius, Ray3D::try_from(axis)?, height),

            ShapeKindJson::Group { children } => {
                let children = children.into_iter()
                    .map(Shape::try_from)
                    .collect::<Result<Vec<_>, _>>()?;

                Shape::group_of(children)
            },
        };

        Ok(shape
            .with_material(shape_json.material.into())
            .with_emission(shape_json.emission.into()))
    }
}

#[derive(Serialize, Deserialize)]
struct AreaJson {
    radius: f64,
    grid: usize,
}

#[derive(Serialize, Deserialize)]
struct PointJson {
    intensity: [f64; 3],
    position: [f64; 3],

    /// `[kc, kl, kq]`
    #[serde(default = "no_attenuation")]
    attenuation: [f64; 3],

    #[serde(default)]
    area: Option<AreaJson>,
}

fn no_attenuation() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn plain_beam() -> f64 {
    1.0
}

impl TryFrom<PointJson> for PointLight {
    type Error = LightError;

    fn try_from(point_json: PointJson) -> Result<PointLight, LightError> {
        let [kc, kl, kq] = point_json.attenuation;
        let light = PointLight::new(
            point_json.intensity.into(),
            point_json.position.into(),
        ).with_attenuation(kc, kl, kq);

        match point_json.area {
            Some(area) => Ok(light.with_area(LightArea::new(area.radius, area.grid)?)),
            None => Ok(light),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LightJson {
    Directional {
        intensity: [f64; 3],
        direction: [f64; 3],
    },
    Point(PointJson),
    Spot {
        #[serde(flatten)]
        light: PointJson,

        direction: [f64; 3],

        #[serde(default = "plain_beam")]
        narrow_beam: f64,
    },
}

impl TryFrom<LightJson> for LightSource {
    type Error = LightError;

    fn try_from(light_json: LightJson) -> Result<LightSource, LightError> {
        let light: LightSource = match light_json {
            LightJson::Directional { intensity, direction }
                => DirectionalLight::new(intensity.into(), direction.into())?.into(),

            LightJson::Point(point) => PointLight::try_from(point)?.into(),

            LightJson::Spot { light, direction, narrow_beam } => {
                SpotLight::new(PointLight::try_from(light)?, direction.into())?
                    .with_narrow_beam(narrow_beam)?
                    .into()
            },
        };

        Ok(light)
    }
}

/* Tests */

#[cfg(test)]
const DEMO_SCENE: &str = r#"{
    "background": [0.1, 0.1, 0.2],
    "ambient": { "intensity": [1, 1, 1], "ka": 0.15 },
    "geometries": [
        {
            "kind": "sphere", "center": [0, 0, -50], "radius": 20,
            "emission": [0.2, 0.1, 0.0],
            "material": { "kd": 0.5, "ks": [0.5, 0.4, 0.3], "shininess": 100 }
        },
        {
            "kind": "group",
            "children": [
                { "kind": "plane", "point": [0, -20, 0], "normal": [0, 1, 0],
                  "material": { "kr": 0.3 } },
                { "kind": "triangle", "points": [[-10, 0, -60], [10, 0, -60], [0, 15, -60]] },
                { "kind": "cylinder", "radius": 2, "height": 8,
                  "axis": { "origin": [30, -20, -40], "direction": [0, 2, 0] } }
            ]
        }
    ],
    "lights": [
        { "kind": "directional", "intensity": [0.3, 0.3, 0.3], "direction": [1, -1, -1] },
        { "kind": "point", "intensity": [1, 1, 1], "position": [40, 40, 0],
          "attenuation": [1, 0.0005, 0.0005], "area": { "radius": 5, "grid": 4 } },
        { "kind": "spot", "intensity": [1, 0.5, 0.5], "position": [-40, 40, 0],
          "direction": [1, -1, -2], "narrow_beam": 8 }
    ],
    "view": {
        "position": [0, 0, 100], "forward": [0, 0, -1], "up": [0, 1, 0],
        "width": 150, "height": 100, "distance": 200,
        "image": [300, 200],
        "sampling": { "kind": "jittered", "nx": 3, "ny": 3 },
        "threads": 4
    }
}"#;

#[test]
fn scene_builder_collects_surfaces_and_lights() {
    let scene = Scene::new(Color::blue())
        .with_geometry(Shape::sphere(Point3D::origin(), 1.0))
        .with_geometry(Shape::sphere(Point3D::new(3.0, 0.0, 0.0), 1.0))
        .with_light(PointLight::new(Color::white(), Point3D::new(0.0, 5.0, 0.0)));

    assert_eq!(scene.background, Color::blue());
    assert_eq!(scene.ambient, AmbientLight::none());
    assert_eq!(scene.geometries().children().map(|c| c.len()), Some(2));
    assert_eq!(scene.lights.len(), 1);
}

#[test]
fn demo_scene_parses() {
    let file = SceneFile::from_json(DEMO_SCENE).unwrap();
    let scene = &file.scene;

    assert_eq!(scene.background, Color::rgb(0.1, 0.1, 0.2));
    assert_eq!(scene.ambient.intensity, Color::rgb(0.15, 0.15, 0.15));

    let surfaces = scene.geometries().children().unwrap();
    assert_eq!(surfaces.len(), 2);
    assert_eq!(surfaces[0].emission(), Color::rgb(0.2, 0.1, 0.0));
    assert_eq!(surfaces[0].material().ks, Tuple3D::new(0.5, 0.4, 0.3));
    assert_eq!(surfaces[0].material().kd, Tuple3D::splat(0.5));
    assert_eq!(surfaces[0].material().shininess, 100);
    assert_eq!(surfaces[1].children().map(|c| c.len()), Some(3));
    assert_eq!(surfaces[1].children().unwrap()[0].material().kr,
        Tuple3D::splat(0.3));

    assert_eq!(scene.lights.len(), 3);
    assert!(scene.lights[1].is_soft());
    match &scene.lights[2] {
        LightSource::Spot(spot) => {
            assert_eq!(spot.narrow_beam(), 8.0);
            assert_eq!(spot.light.kc, 1.0);
        },
        other => panic!("expected a spot light, got {:?}", other),
    }

    assert_eq!(file.view.nx, 300);
    assert_eq!(file.view.ny, 200);
    assert_eq!(file.view.threads, 4);
    assert_eq!(file.view.sampling, Sampling::Jittered { nx: 3, ny: 3 });
}

#[test]
fn view_defaults_and_builder() {
    let json = r#"{
        "view": {
            "position": [0, 0, 0], "forward": [0, 0, -1], "up": [0, 1, 0],
            "width": 2, "height": 2, "distance": 1, "image": [4, 4]
        }
    }"#;

    let file = SceneFile::from_json(json).unwrap();
    assert_eq!(file.scene.background, Color::black());
    assert!(file.scene.lights.is_empty());
    assert_eq!(file.view.sampling, Sampling::Single);
    assert_eq!(file.view.threads, DEFAULT_NUM_THREADS);

    let builder: CameraBuilder<(), ()> = file.view.builder();
    assert_eq!(builder.position, Some(Point3D::origin()));
    assert_eq!(builder.distance, 1.0);
    assert!(builder.sink.is_none());
}

#[test]
fn invalid_descriptions_are_rejected() {
    let zero_normal = r#"{
        "geometries": [ { "kind": "plane", "point": [0, 0, 0], "normal": [0, 0, 0] } ],
        "view": {
            "position": [0, 0, 0], "forward": [0, 0, -1], "up": [0, 1, 0],
            "width": 2, "height": 2, "distance": 1, "image": [4, 4]
        }
    }"#;
    assert!(matches!(SceneFile::from_json(zero_normal),
        Err(SceneError::Geometry(GeometryError::ZeroVector))));

    let no_samples = r#"{
        "lights": [ { "kind": "point", "intensity": [1, 1, 1], "position": [0, 1, 0],
                      "area": { "radius": 1, "grid": 0 } } ],
        "view": {
            "position": [0, 0, 0], "forward": [0, 0, -1], "up": [0, 1, 0],
            "width": 2, "height": 2, "distance": 1, "image": [4, 4]
        }
    }"#;
    assert!(matches!(SceneFile::from_json(no_samples),
        Err(SceneError::Light(LightError::NoSamples))));

    let negative_beam = r#"{
        "lights": [ { "kind": "spot", "intensity": [1, 1, 1], "position": [0, 1, 0],
                      "direction": [0, -1, 0], "narrow_beam": -3 } ],
        "view": {
            "position": [0, 0, 0], "forward": [0, 0, -1], "up": [0, 1, 0],
            "width": 2, "height": 2, "distance": 1, "image": [4, 4]
        }
    }"#;
    assert!(matches!(SceneFile::from_json(negative_beam),
        Err(SceneError::Light(LightError::NegativeBeam(_)))));

    let empty_image = r#"{
        "view": {
            "position": [0, 0, 0], "forward": [0, 0, -1], "up": [0, 1, 0],
            "width": 2, "height": 2, "distance": 1, "image": [0, 4]
        }
    }"#;
    assert!(matches!(SceneFile::from_json(empty_image),
        Err(SceneError::EmptyImage(0, 4))));

    assert!(matches!(SceneFile::from_json("{ \"view\": 3 }"),
        Err(SceneError::Json(_))));
}
