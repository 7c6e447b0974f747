use log::{debug, warn};

use super::bridge::{BridgeError, RendererBridge, Uniform, UniformValue};
use crate::world::Scene;

fn vec3s<'a>(v: impl Iterator<Item = &'a nalgebra::Vector3<f32>>) -> UniformValue {
    UniformValue::Vec3Array(v.map(|v| [v.x, v.y, v.z]).collect())
}

/// Writes the static scene uniforms and binds material textures.
///
/// Material arrays go up at full table capacity; sphere and quad arrays only
/// up to their populated counts.
pub fn upload_scene(scene: &Scene, bridge: &mut dyn RendererBridge) -> Result<(), BridgeError> {
    let materials = scene.materials.slots();
    bridge.set_uniform(
        Uniform::MaterialType,
        UniformValue::IntArray(materials.iter().map(|m| m.kind).collect()),
    );
    bridge.set_uniform(
        Uniform::MaterialAlbedo,
        vec3s(materials.iter().map(|m| &m.albedo)),
    );
    bridge.set_uniform(
        Uniform::MaterialFuzz,
        UniformValue::FloatArray(materials.iter().map(|m| m.fuzz).collect()),
    );
    bridge.set_uniform(
        Uniform::MaterialRefractionIndex,
        UniformValue::FloatArray(materials.iter().map(|m| m.refraction_index).collect()),
    );

    let spheres = scene.spheres.populated();
    bridge.set_uniform(Uniform::SpheresAmount, UniformValue::Int(spheres.len() as i32));
    bridge.set_uniform(
        Uniform::Spheres,
        UniformValue::Vec4Array(spheres.iter().map(|s| s.packed()).collect()),
    );
    bridge.set_uniform(
        Uniform::SphereMaterialIndices,
        UniformValue::IntArray(spheres.iter().map(|s| s.material_idx).collect()),
    );

    let quads = scene.quads.populated();
    bridge.set_uniform(Uniform::QuadsAmount, UniformValue::Int(quads.len() as i32));
    bridge.set_uniform(
        Uniform::QuadOrigins,
        vec3s(quads.iter().map(|q| &q.origin.coords)),
    );
    bridge.set_uniform(Uniform::QuadEdgesU, vec3s(quads.iter().map(|q| &q.edge_u)));
    bridge.set_uniform(Uniform::QuadEdgesV, vec3s(quads.iter().map(|q| &q.edge_v)));
    bridge.set_uniform(
        Uniform::QuadMaterialIndices,
        UniformValue::IntArray(quads.iter().map(|q| q.material_idx).collect()),
    );

    for (idx, material) in materials.iter().enumerate() {
        let Some(path) = material.texture() else {
            continue;
        };
        match image::open(path) {
            Ok(texture) => {
                debug!("binding texture {} to material {}", path.display(), idx);
                bridge.bind_material_texture(idx, texture.to_rgba8())?;
            }
            Err(e) => warn!("failed to load texture {}: {}", path.display(), e),
        }
    }

    Ok(())
}
