use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use nalgebra::{Point3, Vector3};

use shader_pathtracer::config::Config;
use shader_pathtracer::render_system::bridge::{RecordingBridge, Uniform, UniformValue};
use shader_pathtracer::render_system::scene::upload_scene;
use shader_pathtracer::world::Scene;
use shader_pathtracer::world::definitions::{MAX_MATERIALS, Material};
use shader_pathtracer::world::loader::SceneError;

fn config_for(root: &Path) -> Config {
    Config {
        asset_root: root.to_string_lossy().into_owned(),
        ..Default::default()
    }
}

const MATERIALS: &str = r#"[
    {"type": 0, "albedo": [0.8, 0.8, 0.0], "fuzz": 0.0, "refractionIndex": 1.0},
    {"type": 1, "albedo": [0.8, 0.6, 0.2], "fuzz": 0.3, "refractionIndex": 1.0},
    {"type": 2, "albedo": [1.0, 1.0, 1.0], "fuzz": 0.0, "refractionIndex": 1.5},
    {"type": 0, "albedo": [1.0, 1.0, 1.0], "texture": "checker.png"}
]"#;

const SPHERES: &str = r#"[
    {"position": [0.0, -100.5, -1.0], "radius": 100.0, "materialIndex": 0},
    {"position": [0.0, 0.0, -1.2], "radius": 0.5, "materialIndex": 1},
    {"position": [-1.0, 0.0, -1.0], "radius": 0.5}
]"#;

const QUADS: &str = r#"[
    {"origin": [-2, -2, 5], "edgeU": [4, 0, 0], "edgeV": [0, 4, 0], "materialIndex": 3}
]"#;

#[test]
fn loads_all_three_tables_and_binds_textures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("materials.json"), MATERIALS).unwrap();
    fs::write(dir.path().join("spheres.json"), SPHERES).unwrap();
    fs::write(dir.path().join("quads.json"), QUADS).unwrap();
    RgbaImage::from_pixel(4, 2, Rgba([255, 255, 255, 255]))
        .save(dir.path().join("checker.png"))
        .unwrap();

    let config = config_for(dir.path());
    let scene = Scene::load(&config).unwrap();

    assert_eq!(scene.materials.len(), 4);
    assert_eq!(scene.materials.capacity(), MAX_MATERIALS);
    assert_eq!(scene.materials.slots()[2].refraction_index, 1.5);
    assert_eq!(
        scene.materials.slots()[3].texture_path,
        format!("{}/checker.png", config.asset_root)
    );
    assert!(scene.materials.slots()[4..].iter().all(|m| *m == Material::default()));

    assert_eq!(scene.spheres.len(), 3);
    assert_eq!(scene.spheres.slots()[1].center, Point3::new(0.0, 0.0, -1.2));
    // no materialIndex in the file
    assert_eq!(scene.spheres.slots()[2].material_idx, 0);

    assert_eq!(scene.quads.len(), 1);
    assert_eq!(scene.quads.slots()[0].edge_u, Vector3::new(4.0, 0.0, 0.0));
    assert_eq!(scene.quads.slots()[0].material_idx, 3);

    let mut bridge = RecordingBridge::new();
    upload_scene(&scene, &mut bridge).unwrap();
    assert_eq!(bridge.textures.get(&3), Some(&[4, 2]));
    assert_eq!(bridge.uniform(Uniform::SpheresAmount), Some(&UniformValue::Int(3)));
    assert_eq!(
        bridge.uniform(Uniform::QuadMaterialIndices),
        Some(&UniformValue::IntArray(vec![3]))
    );
}

#[test]
fn missing_files_give_an_empty_scene() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::load(&config_for(dir.path())).unwrap();
    assert_eq!(scene, Scene::default());
}

#[test]
fn malformed_number_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("materials.json"), MATERIALS).unwrap();
    fs::write(
        dir.path().join("spheres.json"),
        r#"[{"position": [0, 0, -1], "radius": "half", "materialIndex": 0}]"#,
    )
    .unwrap();

    let err = Scene::load(&config_for(dir.path())).unwrap_err();
    assert!(matches!(err, SceneError::Record { kind: "sphere", idx: 0, .. }));
}

#[test]
fn oversized_file_is_truncated_to_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let records: Vec<String> = (0..50)
        .map(|i| format!(r#"{{"position": [{i}, 0, 0], "radius": 1, "materialIndex": 0}}"#))
        .collect();
    fs::write(
        dir.path().join("spheres.json"),
        format!("[{}]", records.join(",")),
    )
    .unwrap();

    let scene = Scene::load(&config_for(dir.path())).unwrap();
    assert_eq!(scene.spheres.len(), 32);
    assert_eq!(scene.spheres.slots()[31].center.x, 31.0);
}
