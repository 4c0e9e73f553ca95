//! Per-texel evaluation of the bake programs.
//!
//! Each function mirrors the fragment stage of the WGSL program with the
//! same name, so the CPU backend and the GPU agree to within filtering
//! differences.

use std::f32::consts::PI;

use prism_core::math::Vec3;
use prism_core::texture::direction_to_equirect_uv;

use super::image::{CpuImage, Texel};
use crate::backend::BakeUniforms;

pub(super) fn equirect_to_cube(source: &CpuImage, dir: &Vec3) -> Texel {
    let color = source.sample_2d(0, 0, direction_to_equirect_uv(dir), true);
    [color[0], color[1], color[2], 1.0]
}

/// Cosine-weighted hemisphere integral around `normal`.
pub(super) fn irradiance(source: &CpuImage, normal: &Vec3, uniforms: &BakeUniforms) -> Texel {
    let normal = normal.normalize();
    let reference_up = if normal.y.abs() < 0.999 {
        Vec3::y()
    } else {
        Vec3::x()
    };
    let right = normal.cross(&reference_up).normalize();
    let up = normal.cross(&right);

    let delta = uniforms.sample_delta;
    let mut irradiance = Vec3::zeros();
    let mut sample_total = 0.0f32;
    if delta > 0.0 {
        let mut phi = 0.0f32;
        while phi < 2.0 * PI {
            let mut theta = 0.0f32;
            while theta < 0.5 * PI {
                let tangent_sample = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let sample_dir =
                    tangent_sample.x * right + tangent_sample.y * up + tangent_sample.z * normal;
                let radiance = rgb(source.sample_cube_level(&sample_dir, 0));
                irradiance += radiance * theta.cos() * theta.sin();
                sample_total += 1.0;
                theta += delta;
            }
            phi += delta;
        }
    }

    let result = PI * irradiance / sample_total.max(1.0);
    [result.x, result.y, result.z, 1.0]
}

/// GGX prefilter of `source` around `normal` for `uniforms.roughness`.
pub(super) fn prefilter(source: &CpuImage, normal: &Vec3, uniforms: &BakeUniforms) -> Texel {
    let n = normal.normalize();
    let v = n;
    let roughness = uniforms.roughness;
    let count = uniforms.sample_count;
    let resolution = uniforms.source_resolution.max(1.0);
    let texel_solid_angle = 4.0 * PI / (6.0 * resolution * resolution);

    let mut color = Vec3::zeros();
    let mut total_weight = 0.0f32;
    for i in 0..count {
        let h = importance_sample_ggx(hammersley(i, count), &n, roughness);
        let l = (2.0 * v.dot(&h) * h - v).normalize();
        let n_dot_l = n.dot(&l).max(0.0);
        if n_dot_l > 0.0 {
            let n_dot_h = n.dot(&h).max(0.0);
            let h_dot_v = h.dot(&v).max(0.0);
            let pdf = distribution_ggx(n_dot_h, roughness) * n_dot_h / (4.0 * h_dot_v) + 0.0001;
            let sample_solid_angle = 1.0 / (count as f32 * pdf + 0.0001);
            let lod = if roughness == 0.0 {
                0.0
            } else {
                (0.5 * (sample_solid_angle / texel_solid_angle).log2()).max(0.0)
            };
            color += rgb(source.sample_cube(&l, lod)) * n_dot_l;
            total_weight += n_dot_l;
        }
    }

    let result = color / total_weight.max(0.001);
    [result.x, result.y, result.z, 1.0]
}

/// Split-sum scale and bias for `n_dot_v` and `roughness`.
pub(super) fn integrate_brdf(n_dot_v: f32, roughness: f32, sample_count: u32) -> Texel {
    let n_dot_v = n_dot_v.clamp(0.0, 1.0);
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);
    let n = Vec3::z();

    let mut scale = 0.0f32;
    let mut bias = 0.0f32;
    for i in 0..sample_count {
        let h = importance_sample_ggx(hammersley(i, sample_count), &n, roughness);
        let l = (2.0 * v.dot(&h) * h - v).normalize();

        let n_dot_l = l.z.max(0.0);
        let n_dot_h = h.z.max(0.0);
        let v_dot_h = v.dot(&h).max(0.0);
        if n_dot_l > 0.0 {
            let g = geometry_smith(n_dot_v, n_dot_l, roughness);
            let g_vis = (g * v_dot_h) / (n_dot_h * n_dot_v).max(0.0001);
            let fc = (1.0 - v_dot_h).powi(5);
            scale += (1.0 - fc) * g_vis;
            bias += fc * g_vis;
        }
    }
    let count = sample_count.max(1) as f32;
    [scale / count, bias / count, 0.0, 1.0]
}

fn rgb(texel: Texel) -> Vec3 {
    Vec3::new(texel[0], texel[1], texel[2])
}

/// Hammersley point `i` of `n`.
pub(super) fn hammersley(i: u32, n: u32) -> [f32; 2] {
    [
        i as f32 / n as f32,
        i.reverse_bits() as f32 * 2.328_306_4e-10,
    ]
}

fn importance_sample_ggx(xi: [f32; 2], n: &Vec3, roughness: f32) -> Vec3 {
    let a = roughness * roughness;
    let phi = 2.0 * PI * xi[0];
    let cos_theta = ((1.0 - xi[1]) / (1.0 + (a * a - 1.0) * xi[1])).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let h = Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);

    let up = if n.z.abs() < 0.999 { Vec3::z() } else { Vec3::x() };
    let tangent = n.cross(&up).normalize();
    let bitangent = n.cross(&tangent);
    (tangent * h.x + bitangent * h.y + n * h.z).normalize()
}

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

// k = a^2 / 2 for image based lighting
fn geometry_schlick_ggx(n_dot_v: f32, roughness: f32) -> f32 {
    let k = (roughness * roughness) / 2.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness)
}
