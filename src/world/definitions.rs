use std::path::Path;

use log::warn;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, de::DeserializeOwned};

pub const MAX_MATERIALS: usize = 32;
pub const MAX_SPHERES: usize = 32;
pub const MAX_QUADS: usize = 32;

// what a record needs to know about where it was loaded from
pub struct RecordContext<'a> {
    pub asset_root: &'a str,
    pub idx: usize,
}

/// A row type of one of the scene tables, filled from a flat json object.
pub trait Definition {
    type Json: DeserializeOwned;
    // used in log lines
    const KIND: &'static str;

    /// Writes the fields present in `json` onto `slot`, leaving the rest at
    /// whatever `slot` already held. Returns false if a field the shader
    /// relies on was missing.
    fn apply(json: Self::Json, slot: &mut Self, ctx: &RecordContext) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    // selects the shading model in the shader
    pub kind: i32,
    pub albedo: Vector3<f32>,
    pub fuzz: f32,
    pub refraction_index: f32,
    // empty if the material is untextured
    pub texture_path: String,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            kind: 0,
            albedo: Vector3::zeros(),
            fuzz: 0.0,
            refraction_index: 0.0,
            texture_path: String::new(),
        }
    }
}

impl Material {
    pub fn texture(&self) -> Option<&Path> {
        if self.texture_path.is_empty() {
            None
        } else {
            Some(Path::new(&self.texture_path))
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MaterialJson {
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    pub albedo: Option<[f32; 3]>,
    pub fuzz: Option<f32>,
    pub refraction_index: Option<f32>,
    pub texture: Option<String>,
}

impl Definition for Material {
    type Json = MaterialJson;
    const KIND: &'static str = "material";

    fn apply(json: MaterialJson, slot: &mut Material, ctx: &RecordContext) -> bool {
        if let Some(kind) = json.kind {
            slot.kind = kind;
        }
        if let Some(albedo) = json.albedo {
            slot.albedo = albedo.into();
        }
        if let Some(fuzz) = json.fuzz {
            slot.fuzz = fuzz;
        }
        if let Some(refraction_index) = json.refraction_index {
            slot.refraction_index = refraction_index;
        }
        if let Some(texture) = json.texture {
            slot.texture_path = if texture.is_empty() {
                String::new()
            } else {
                format!("{}/{}", ctx.asset_root, texture)
            };
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
    // not validated against the material table
    pub material_idx: i32,
}

impl Default for Sphere {
    fn default() -> Sphere {
        Sphere {
            center: Point3::origin(),
            radius: 0.0,
            material_idx: 0,
        }
    }
}

impl Sphere {
    // center and radius packed the way the shader reads them
    pub fn packed(&self) -> [f32; 4] {
        [self.center.x, self.center.y, self.center.z, self.radius]
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SphereJson {
    pub position: Option<[f32; 3]>,
    pub radius: Option<f32>,
    pub material_index: Option<i32>,
}

impl Definition for Sphere {
    type Json = SphereJson;
    const KIND: &'static str = "sphere";

    fn apply(json: SphereJson, slot: &mut Sphere, ctx: &RecordContext) -> bool {
        if let Some(position) = json.position {
            slot.center = position.into();
        }
        if let Some(radius) = json.radius {
            slot.radius = radius;
        }
        match json.material_index {
            Some(material_idx) => {
                slot.material_idx = material_idx;
                true
            }
            None => {
                warn!("sphere {} does not have a materialIndex field", ctx.idx);
                false
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    pub origin: Point3<f32>,
    pub edge_u: Vector3<f32>,
    pub edge_v: Vector3<f32>,
    pub material_idx: i32,
}

impl Default for Quad {
    fn default() -> Quad {
        Quad {
            origin: Point3::origin(),
            edge_u: Vector3::zeros(),
            edge_v: Vector3::zeros(),
            material_idx: 0,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuadJson {
    pub origin: Option<[f32; 3]>,
    pub edge_u: Option<[f32; 3]>,
    pub edge_v: Option<[f32; 3]>,
    pub material_index: Option<i32>,
}

impl Definition for Quad {
    type Json = QuadJson;
    const KIND: &'static str = "quad";

    fn apply(json: QuadJson, slot: &mut Quad, _ctx: &RecordContext) -> bool {
        if let Some(origin) = json.origin {
            slot.origin = origin.into();
        }
        if let Some(edge_u) = json.edge_u {
            slot.edge_u = edge_u.into();
        }
        if let Some(edge_v) = json.edge_v {
            slot.edge_v = edge_v.into();
        }
        if let Some(material_idx) = json.material_index {
            slot.material_idx = material_idx;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RecordContext<'static> {
        RecordContext {
            asset_root: "world",
            idx: 0,
        }
    }

    #[test]
    fn material_texture_is_prefixed_with_asset_root() {
        let json: MaterialJson =
            serde_json::from_str(r#"{"type": 2, "texture": "earth.png"}"#).unwrap();
        let mut material = Material::default();
        assert!(Material::apply(json, &mut material, &ctx()));
        assert_eq!(material.kind, 2);
        assert_eq!(material.texture_path, "world/earth.png");
        assert_eq!(material.texture(), Some(Path::new("world/earth.png")));
    }

    #[test]
    fn empty_texture_means_untextured() {
        let json: MaterialJson = serde_json::from_str(r#"{"texture": ""}"#).unwrap();
        let mut material = Material::default();
        Material::apply(json, &mut material, &ctx());
        assert_eq!(material.texture(), None);
    }

    #[test]
    fn sphere_without_material_index_is_incomplete() {
        let json: SphereJson = serde_json::from_str(r#"{"radius": 2}"#).unwrap();
        let mut sphere = Sphere::default();
        assert!(!Sphere::apply(json, &mut sphere, &ctx()));
        assert_eq!(sphere.radius, 2.0);
        assert_eq!(sphere.material_idx, 0);

        let json: SphereJson = serde_json::from_str(r#"{"materialIndex": 3}"#).unwrap();
        assert!(Sphere::apply(json, &mut sphere, &ctx()));
        assert_eq!(sphere.material_idx, 3);
    }

    #[test]
    fn missing_fields_keep_slot_values() {
        let json: QuadJson = serde_json::from_str(r#"{"edgeV": [0, 0, 2]}"#).unwrap();
        let mut quad = Quad {
            material_idx: 7,
            ..Default::default()
        };
        assert!(Quad::apply(json, &mut quad, &ctx()));
        assert_eq!(quad.edge_v, Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(quad.material_idx, 7);
        assert_eq!(quad.origin, Point3::origin());
    }

    #[test]
    fn sphere_packs_center_and_radius() {
        let sphere = Sphere {
            center: Point3::new(1.0, 2.0, 3.0),
            radius: 0.5,
            material_idx: 1,
        };
        assert_eq!(sphere.packed(), [1.0, 2.0, 3.0, 0.5]);
    }
}
