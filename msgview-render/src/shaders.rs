//! Built-in shaders for the ray-casting renderers

use crate::material::Material;
use crate::model::{Hit, Model};
use crate::ray::Ray;
use crate::renderer::{Shader, ShadingContext};
use msgview_core::Vector3f;
use nalgebra::{Vector3, Vector4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Layers of transparent surfaces the `obj` shader looks through
const MAX_TRANSPARENT_DEPTH: usize = 8;

fn opaque(color: Vector3<f32>) -> Vector4<f32> {
    Vector4::new(color.x, color.y, color.z, 1.0)
}

/// Cosine between the unit surface normal and the ray direction, in [0, 1]
fn eyelight(hit: &Hit, ray: &Ray) -> f32 {
    hit.ng
        .try_normalize(0.0)
        .map_or(0.0, |n| n.dot(&ray.direction.normalize()).abs())
}

/// Deterministic pseudo-random color for an id
pub fn random_color(id: u32) -> Vector3<f32> {
    const MX: u32 = 13 * 17 * 43;
    const MY: u32 = 11 * 29;
    const MZ: u32 = 7 * 23 * 63;
    let g = id.wrapping_mul(3 * 5 * 127).wrapping_add(12312314);
    Vector3::new(
        (g % MX) as f32 / (MX - 1) as f32,
        (g % MY) as f32 / (MY - 1) as f32,
        (g % MZ) as f32 / (MZ - 1) as f32,
    )
}

pub struct EyeLight;

impl Shader for EyeLight {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        match ctx.model.intersect(ray) {
            Some(hit) => {
                let c = 0.2 + 0.8 * eyelight(&hit, ray);
                Vector4::new(c, c, c, 1.0)
            }
            None => ctx.background,
        }
    }
}

/// Absolute value of the geometric normal as a color
pub struct GeometricNormal;

impl Shader for GeometricNormal {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        match ctx.model.intersect(ray) {
            Some(hit) => opaque(hit.ng.try_normalize(0.0).unwrap_or_else(Vector3f::zeros).abs()),
            None => ctx.background,
        }
    }
}

pub struct PrimId;

impl Shader for PrimId {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        match ctx.model.intersect(ray) {
            Some(hit) => opaque(random_color(hit.prim_id)),
            None => ctx.background,
        }
    }
}

pub struct GeomId;

impl Shader for GeomId {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        match ctx.model.intersect(ray) {
            Some(hit) => opaque(random_color(hit.geom_id)),
            None => ctx.background,
        }
    }
}

pub struct EyeLightGeomId;

impl Shader for EyeLightGeomId {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        match ctx.model.intersect(ray) {
            Some(hit) => {
                let light = 0.3 + 0.7 * eyelight(&hit, ray);
                opaque(random_color(hit.geom_id) * light)
            }
            None => ctx.background,
        }
    }
}

fn hit_material<'m>(model: &'m Model, hit: &Hit, fallback: &'m Material) -> &'m Material {
    model
        .geometry(hit.geom_id)
        .and_then(|g| g.material())
        .map_or(fallback, |m| m.as_ref())
}

/// Headlight shading with Wavefront materials. Partially transparent
/// surfaces (`d < 1`) blend with whatever lies behind them.
pub struct ObjShader;

impl Shader for ObjShader {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        let fallback = Material::default();
        let mut ray = *ray;
        let mut color = Vector3::zeros();
        let mut transmission = 1.0f32;

        for _ in 0..MAX_TRANSPARENT_DEPTH {
            let Some(hit) = ctx.model.intersect(&ray) else {
                color += transmission * ctx.background.xyz();
                return opaque(color);
            };

            let material = hit_material(ctx.model, &hit, &fallback);
            let cos = eyelight(&hit, &ray);
            let surface = material.kd * (0.15 + 0.85 * cos) + material.ks * cos.powf(material.ns.max(0.0));

            color += transmission * material.d * surface;
            transmission *= 1.0 - material.d;
            if transmission < 0.01 {
                break;
            }
            ray = Ray::spawn(ray.at(hit.t), ray.direction, ctx.epsilon);
        }

        opaque(color)
    }
}

/// Ambient occlusion with a fixed number of cosine-distributed samples per
/// primary hit
pub struct AmbientOcclusion {
    pub samples: u32,
}

impl AmbientOcclusion {
    pub fn new(samples: u32) -> Self {
        Self { samples }
    }
}

fn pixel_seed(pixel: (u32, u32), frame_id: u64) -> u64 {
    let p = ((pixel.1 as u64) << 32) | pixel.0 as u64;
    p.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ frame_id.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// Direction around `normal` drawn with density proportional to the cosine
fn cosine_sample_hemisphere<R: Rng>(normal: &Vector3f, rng: &mut R) -> Vector3f {
    let tangent = if normal.x.abs() > 0.9 { Vector3f::y() } else { Vector3f::x() };
    let u = normal.cross(&tangent).normalize();
    let v = normal.cross(&u);

    let r1: f32 = rng.gen();
    let r2: f32 = rng.gen();
    let phi = 2.0 * PI * r1;
    let r = r2.sqrt();

    u * (r * phi.cos()) + v * (r * phi.sin()) + normal * (1.0 - r2).max(0.0).sqrt()
}

impl Shader for AmbientOcclusion {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32> {
        let Some(hit) = ctx.model.intersect(ray) else {
            return ctx.background;
        };
        let Some(mut normal) = hit.ng.try_normalize(0.0) else {
            return ctx.background;
        };
        if normal.dot(&ray.direction) > 0.0 {
            normal = -normal;
        }

        let fallback = Material::default();
        let kd = hit_material(ctx.model, &hit, &fallback).kd;

        let origin = ray.at(hit.t);
        let mut rng = StdRng::seed_from_u64(pixel_seed(ctx.pixel, ctx.frame_id));
        let unoccluded = (0..self.samples)
            .filter(|_| {
                let dir = cosine_sample_hemisphere(&normal, &mut rng);
                !ctx.model.occluded(&Ray::spawn(origin, dir, ctx.epsilon))
            })
            .count();

        let visibility = if self.samples == 0 {
            1.0
        } else {
            unoccluded as f32 / self.samples as f32
        };
        opaque(kd * visibility)
    }
}
