use log::info;

use crate::config::Config;

pub mod definitions;
pub mod loader;
pub mod table;

use definitions::{MAX_MATERIALS, MAX_QUADS, MAX_SPHERES, Material, Quad, Sphere};
use loader::{LoadReport, SceneError};
use table::BoundedTable;

/// The three scene tables, as handed to the renderer once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub materials: BoundedTable<Material>,
    pub spheres: BoundedTable<Sphere>,
    pub quads: BoundedTable<Quad>,
}

impl Default for Scene {
    fn default() -> Scene {
        Scene {
            materials: BoundedTable::new(MAX_MATERIALS),
            spheres: BoundedTable::new(MAX_SPHERES),
            quads: BoundedTable::new(MAX_QUADS),
        }
    }
}

impl Scene {
    pub fn load(config: &Config) -> Result<Scene, SceneError> {
        let mut scene = Scene::default();
        let root = config.asset_root.as_str();

        let materials = loader::load_table(&config.materials_path(), root, &mut scene.materials)?;
        let spheres = loader::load_table(&config.spheres_path(), root, &mut scene.spheres)?;
        let quads = loader::load_table(&config.quads_path(), root, &mut scene.quads)?;

        let dropped = |r: &LoadReport| {
            if r.dropped > 0 {
                format!(" ({} dropped)", r.dropped)
            } else {
                String::new()
            }
        };
        info!(
            "scene loaded: {} materials{}, {} spheres{}, {} quads{}",
            materials.loaded,
            dropped(&materials),
            spheres.loaded,
            dropped(&spheres),
            quads.loaded,
            dropped(&quads),
        );

        Ok(scene)
    }
}
