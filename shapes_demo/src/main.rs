//! Shapes demo
//!
//! Drops every kind of collision shape onto a static floor, with a ghost
//! trigger volume that kicks overlapping bodies upward. Headless: the scene
//! graph is a plain node table and progress is reported through the log.
//!
//! Usage: `shapes_demo [frames] [config.toml|config.ron]`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use scene_physics::config::ConfigError;
use scene_physics::foundation::logging;
use scene_physics::foundation::math::Mat4;
use scene_physics::prelude::*;

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 600;
const BODIES_PER_KIND: usize = 50;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid frame count '{0}'")]
    FrameCount(String),
}

/// Random spawn point inside a 40x40x40 volume above the floor
fn spawn_point(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        20.0 - rng.gen::<f32>() * 40.0,
        rng.gen::<f32>() * 40.0 + 1.0,
        20.0 - rng.gen::<f32>() * 40.0,
    )
}

struct ShapeScene {
    engine: Engine,
    nodes: NodeTable,
    kicks: Arc<AtomicUsize>,
    tracked: Vec<(ColliderHandle, NodeId)>,
}

impl ShapeScene {
    fn new(config: PhysicsConfig) -> Result<Self, DemoError> {
        let mut engine = Engine::new(config);
        engine.init()?;
        Ok(Self {
            engine,
            nodes: NodeTable::new(),
            kicks: Arc::new(AtomicUsize::new(0)),
            tracked: Vec::new(),
        })
    }

    fn add(&mut self, name: &str, object: CollisionObject, material: Material, transform: Transform) -> Result<ColliderHandle, DemoError> {
        let node = self.nodes.insert(name, transform);
        let handle = self.engine.add_collider(Collider::new(object, material, node), &self.nodes)?;
        Ok(handle)
    }

    fn scatter(&mut self, name: &str, shape: Shape, material: Material, rng: &mut impl Rng) -> Result<(), DemoError> {
        let shape = Arc::new(shape);
        for i in 0..BODIES_PER_KIND {
            let object = CollisionObject::rigid_body(shape.clone(), 1.0)?.with_angular_damping(0.4)?;
            let handle = self.add(name, object, material, Transform::from_position(spawn_point(rng)))?;
            if i == 0 {
                let node = self.engine.collider(handle).map(Collider::node);
                self.tracked.extend(node.map(|node| (handle, node)));
            }
        }
        log::info!("Spawned {BODIES_PER_KIND} {name}s");
        Ok(())
    }

    fn build(&mut self) -> Result<(), DemoError> {
        let mut rng = rand::thread_rng();
        let grippy = Material::new(0.9, 0.0)?;

        let floor = CollisionObject::rigid_body(Shape::static_plane(Vec3::y(), 0.0)?, 0.0)?;
        self.add("floor", floor, Material::default(), Transform::identity())?;

        self.scatter("cube", Shape::cuboid(Vec3::new(1.0, 1.0, 1.0))?, Material::default(), &mut rng)?;
        self.scatter("sphere", Shape::sphere(1.0)?, grippy, &mut rng)?;
        self.scatter("cylinder", Shape::cylinder(1.0, 2.0, 40)?, grippy, &mut rng)?;
        self.scatter("cone", Shape::cone(1.0, 2.0)?, grippy, &mut rng)?;
        self.scatter("capsule", Shape::capsule(0.5, 1.0)?, grippy, &mut rng)?;

        let gem = MeshGeometry::uv_sphere(1.0, 4, 4);
        self.scatter("gem", Shape::convex_triangle_mesh(&gem)?, grippy, &mut rng)?;

        let table = Shape::compound(vec![
            CompoundChild::new(Shape::cuboid(Vec3::new(2.0, 0.2, 1.0))?, Transform::identity()),
            CompoundChild::new(
                Shape::cylinder(0.2, 2.0, 12)?,
                Transform::from_position(Vec3::new(-1.6, -1.0, 0.0)),
            ),
            CompoundChild::new(
                Shape::cylinder(0.2, 2.0, 12)?,
                Transform::from_position(Vec3::new(1.6, -1.0, 0.0)),
            ),
        ])?;
        self.scatter("table", table, grippy, &mut rng)?;

        let mut boulder = MeshGeometry::uv_sphere(1.0, 7, 5);
        boulder.apply_transform(&Mat4::new_scaling(3.0));
        let boulder = CollisionObject::rigid_body(Shape::convex_hull_from(&boulder)?, 1.0)?;
        self.add("boulder", boulder, grippy, Transform::from_position(Vec3::new(0.0, 20.0, 0.0)))?;

        let mut terrain = MeshGeometry::cube(Vec3::new(10.0, 1.0, 10.0));
        terrain.apply_transform(&Mat4::new_scaling(3.0));
        // static-only shape; the positive mass is ignored
        let terrain = CollisionObject::rigid_body(Shape::bvh_triangle_mesh(&terrain)?, 1.0)?;
        self.add("terrain", terrain, grippy, Transform::from_position(Vec3::new(-40.0, 0.0, -30.0)))?;

        self.add_trigger()
    }

    fn add_trigger(&mut self) -> Result<(), DemoError> {
        let kicks = self.kicks.clone();
        let node = self.nodes.insert("trigger", Transform::from_position(Vec3::new(10.0, 0.0, 10.0)));
        let trigger = Collider::new(
            CollisionObject::ghost(Shape::cuboid(Vec3::new(10.0, 10.0, 10.0))?),
            Material::default(),
            node,
        )
        .with_layers(CollisionLayers::TRIGGER, CollisionLayers::all_layers())
        .with_handler(move |event: &CollisionEvent, commands: &mut DeferredCommands| {
            for contact in event.contacts.iter().filter(|c| c.other_kind == BodyKind::Dynamic) {
                commands.apply_impulse(contact.other, Vec3::y(), contact.point);
                kicks.fetch_add(1, Ordering::Relaxed);
            }
        });
        self.engine.add_collider(trigger, &self.nodes)?;
        Ok(())
    }

    fn run(&mut self, frames: u32) -> Result<(), DemoError> {
        let mut contacts = 0;
        for frame in 1..=frames {
            let stats = self.engine.step(FRAME_TIME, &mut self.nodes)?;
            contacts += stats.contact_count;
            for err in &stats.command_errors {
                log::debug!("Trigger command failed: {err}");
            }

            if frame % 60 == 0 {
                log::info!(
                    "t={:.1}s contacts/s={} trigger kicks={}",
                    frame as f32 * FRAME_TIME,
                    contacts,
                    self.kicks.load(Ordering::Relaxed)
                );
                contacts = 0;
                for (handle, node) in &self.tracked {
                    if let Some(transform) = self.nodes.world_transform(*node) {
                        let speed = self.engine.linear_velocity(*handle)?.magnitude();
                        log::debug!("  {:?}: y={:.2} speed={speed:.2}", node, transform.position.y);
                    }
                }
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), DemoError> {
    logging::init_with_level("info");

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(arg) => arg.parse::<u32>().map_err(|_| DemoError::FrameCount(arg))?,
        None => DEFAULT_FRAMES,
    };
    let config = match args.next() {
        Some(path) => PhysicsConfig::load_from_file(&path)?,
        None => PhysicsConfig::default(),
    };

    let mut scene = ShapeScene::new(config)?;
    scene.build()?;
    log::info!("Scene ready: {} colliders, running {frames} frames", scene.engine.len());
    scene.run(frames)?;
    scene.engine.destroy()?;
    Ok(())
}
