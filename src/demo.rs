//! The arena the binary shows: two ships circling with their red lights, a few projectiles,
//! the floor, eight yellow lights around the rim and a gradient sky.

use std::f32::consts::{PI, TAU};
use std::path::Path;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};

use crate::renderer::context::GpuContext;
use crate::renderer::error::RenderError;
use crate::renderer::gpu::{CpuTexture, CpuTextureCube, GpuTexture};
use crate::renderer::lights::{DirectionalLight, PointLight};
use crate::renderer::material::SurfaceMaterial;
use crate::renderer::primitives;
use crate::scene::{RenderObject, Renderable, Scene, Transform};
use crate::settings::RenderSettings;

pub const ARENA_RADIUS: f32 = 60.0;
const AMBIENT: f32 = 0.1;
const ARENA_LIGHT_COUNT: usize = 8;
const PROJECTILES_PER_SHIP: usize = 3;
const PROJECTILE_RANGE: f32 = 30.0;
const PROJECTILE_SPEED: f32 = 40.0;

const SHIP_MESH: &str = "ShipMesh";
const PROJECTILE_MESH: &str = "ProjectileMesh";
const FLOOR_MESH: &str = "FloorMesh";
const SHIP_TEXTURE: &str = "ShipTexture";
const FLOOR_TEXTURE: &str = "FloorTexture";
const SKY_CUBE: &str = "SkyCube";

struct Ship {
    orbit_radius: f32,
    angular_speed: f32,
    phase: f32,
    height: f32,
}

impl Ship {
    fn position(&self, time: f32) -> Vec3 {
        let angle = self.phase + self.angular_speed * time;
        Vec3::new(
            angle.cos() * self.orbit_radius,
            angle.sin() * self.orbit_radius,
            self.height,
        )
    }

    /// Unit tangent of the orbit, the way the ship is facing.
    fn heading(&self, time: f32) -> Vec3 {
        let angle = self.phase + self.angular_speed * time;
        Vec3::new(-angle.sin(), angle.cos(), 0.0) * self.angular_speed.signum()
    }
}

pub struct Arena {
    time: f32,
    ships: [Ship; 2],
    ship_objects: [RenderObject; 2],
    projectiles: Vec<RenderObject>,
    floor: RenderObject,
}

impl Arena {
    /// Uploads the arena's meshes and textures into the scene's libraries and sets up the
    /// camera, lights and sky.
    pub fn new(gpu: &GpuContext, scene: &mut Scene, settings: &RenderSettings) -> Result<Self, RenderError> {
        let assets = &mut scene.assets;
        let ship_mesh = assets.meshes.get_or_add(gpu, SHIP_MESH, primitives::cube);
        let projectile_mesh = assets
            .meshes
            .get_or_add(gpu, PROJECTILE_MESH, || primitives::sphere(1.0, 12, 8));
        let floor_mesh = assets.meshes.get_or_add(gpu, FLOOR_MESH, primitives::plane);

        let ship_texture = load_texture(gpu, scene, SHIP_TEXTURE, settings.textures.ship.as_deref(), || {
            CpuTexture::checkerboard(64, 8, [200, 200, 210, 255], [90, 90, 110, 255])
        });
        let floor_texture = load_texture(gpu, scene, FLOOR_TEXTURE, settings.textures.floor.as_deref(), || {
            CpuTexture::checkerboard(256, 32, [120, 120, 120, 255], [60, 60, 70, 255])
        });

        let ships = [
            Ship {
                orbit_radius: 25.0,
                angular_speed: 0.6,
                phase: 0.0,
                height: 6.0,
            },
            Ship {
                orbit_radius: 15.0,
                angular_speed: -0.9,
                phase: PI,
                height: 4.0,
            },
        ];
        let ship_objects = [80.0, 40.0].map(|exponent| {
            let material = SurfaceMaterial::new(Vec3::splat(0.8), exponent)
                .with_diffuse_map(ship_texture.clone());
            RenderObject::new(ship_mesh.clone(), Rc::new(material)).with_local_radius(0.87)
        });

        let projectile_material = Rc::new(SurfaceMaterial::new(Vec3::ONE, 64.0));
        let projectiles = (0..ships.len() * PROJECTILES_PER_SHIP)
            .map(|_| {
                RenderObject::new(projectile_mesh.clone(), projectile_material.clone())
                    .with_local_radius(1.0)
            })
            .collect();

        let floor_material = SurfaceMaterial::new(Vec3::splat(0.3), 28.0)
            .with_diffuse_map(floor_texture)
            .with_tex_transform(Vec2::splat(4.0), Vec2::ZERO);
        let floor = RenderObject::new(floor_mesh, Rc::new(floor_material)).with_transform(
            Transform::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::new(2.0 * ARENA_RADIUS, 2.0 * ARENA_RADIUS, 1.0)),
        );

        scene.set_arena_radius(ARENA_RADIUS);
        scene.set_ambient(Vec3::splat(AMBIENT));
        {
            let lighting = scene.lighting_mut();
            lighting.directional[0] = DirectionalLight {
                color: Vec3::splat(0.5),
                direction: Vec3::new(-0.5, 0.0, -1.0).normalize(),
            };
            for (i, light) in lighting.point.iter_mut().skip(2).take(ARENA_LIGHT_COUNT).enumerate() {
                let angle = TAU * i as f32 / ARENA_LIGHT_COUNT as f32;
                *light = PointLight {
                    position: Vec3::new(angle.cos(), angle.sin(), 0.0) * (0.8 * ARENA_RADIUS) + Vec3::Z * 4.0,
                    radius: 20.0,
                    color: Vec3::new(1.0, 0.85, 0.2),
                    attenuation: Vec3::new(0.0, 0.1, 0.0),
                };
            }
        }

        let camera = scene.camera_mut();
        camera.set_projection_params(0.45 * PI, 1.0, 150.0);
        camera.set_transform(Transform::look_at(
            Vec3::new(0.0, -45.0, 30.0),
            Vec3::ZERO,
            Vec3::Z,
        ));

        if settings.skybox {
            let cube = scene.assets.cubes.get_or_add(gpu, SKY_CUBE, || {
                CpuTextureCube::gradient(64, [40, 70, 160], [170, 190, 220], [20, 20, 30])
            });
            scene.set_sky_box(gpu, cube)?;
        }

        let mut arena = Self {
            time: 0.0,
            ships,
            ship_objects,
            projectiles,
            floor,
        };
        arena.update(scene, 0.0);
        Ok(arena)
    }

    /// Moves ships and projectiles forward by `dt` seconds and writes the ship lights.
    pub fn update(&mut self, scene: &mut Scene, dt: f32) {
        self.time += dt;
        let time = self.time;
        let lighting = scene.lighting_mut();

        for (i, (ship, object)) in self.ships.iter().zip(&mut self.ship_objects).enumerate() {
            let position = ship.position(time);
            let heading = ship.heading(time);
            object.transform = Transform::from_trs(
                position,
                Quat::from_rotation_arc(Vec3::X, heading),
                Vec3::new(3.0, 1.5, 1.0),
            );
            lighting.point[i] = PointLight {
                position: position + Vec3::Z * 2.0,
                radius: 8.0,
                color: Vec3::X,
                attenuation: Vec3::new(0.0, 1.0, 0.0),
            };

            let shots = &mut self.projectiles[i * PROJECTILES_PER_SHIP..(i + 1) * PROJECTILES_PER_SHIP];
            for (n, shot) in shots.iter_mut().enumerate() {
                let travelled = projectile_distance(time, n);
                shot.transform = Transform::from_trs(
                    position + heading * (2.0 + travelled),
                    Quat::IDENTITY,
                    Vec3::splat(0.3),
                );
            }
        }
    }

    pub fn renderables(&self) -> Vec<&dyn Renderable> {
        let mut objects: Vec<&dyn Renderable> = Vec::with_capacity(3 + self.projectiles.len());
        objects.push(&self.floor);
        objects.extend(self.ship_objects.iter().map(|o| o as &dyn Renderable));
        objects.extend(self.projectiles.iter().map(|o| o as &dyn Renderable));
        objects
    }
}

/// How far projectile `n` of a ship has flown; shots are staggered and restart at the ship.
fn projectile_distance(time: f32, n: usize) -> f32 {
    let period = PROJECTILE_RANGE / PROJECTILE_SPEED;
    let offset = period * n as f32 / PROJECTILES_PER_SHIP as f32;
    ((time + offset) % period) * PROJECTILE_SPEED
}

fn load_texture(
    gpu: &GpuContext,
    scene: &mut Scene,
    id: &str,
    path: Option<&Path>,
    fallback: impl FnOnce() -> CpuTexture,
) -> GpuTexture {
    let cpu = match path.map(|path| CpuTexture::from_path(path, false)) {
        Some(Ok(texture)) => texture,
        Some(Err(err)) => {
            log::warn!("{err}. Using the generated texture instead.");
            fallback()
        }
        None => fallback(),
    };
    scene.assets.textures.add(gpu, id, &cpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projectiles_stay_within_range() {
        for step in 0..200 {
            let t = step as f32 * 0.037;
            for n in 0..PROJECTILES_PER_SHIP {
                let d = projectile_distance(t, n);
                assert!((0.0..PROJECTILE_RANGE).contains(&d), "distance {d} at t={t}");
            }
        }
    }

    #[test]
    fn ships_stay_on_their_orbit() {
        let ship = Ship {
            orbit_radius: 25.0,
            angular_speed: 0.6,
            phase: 0.0,
            height: 6.0,
        };
        for step in 0..20 {
            let t = step as f32 * 0.5;
            let p = ship.position(t);
            assert!((p.truncate().length() - 25.0).abs() < 1e-3);
            assert!(ship.heading(t).dot(p.truncate().extend(0.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn every_point_light_is_assigned() {
        assert_eq!(2 + ARENA_LIGHT_COUNT, crate::renderer::constants::POINT_LIGHT_COUNT);
    }
}
