use std::collections::BTreeMap;
use std::fmt::Display;

use image::{Rgba, RgbaImage};
use serde::Serialize;
use thiserror::Error;

/// Uniform slots of the tracing shader.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Uniform {
    // camera
    Pixel00,
    PixelU,
    PixelV,
    CameraCenter,
    DefocusAngle,
    // settings
    Samples,
    MaxBounces,
    Gamma,
    BackgroundOpacity,
    SeedOffset,
    // materials
    MaterialType,
    MaterialAlbedo,
    MaterialFuzz,
    MaterialRefractionIndex,
    // spheres
    SpheresAmount,
    Spheres,
    SphereMaterialIndices,
    // quads
    QuadsAmount,
    QuadOrigins,
    QuadEdgesU,
    QuadEdgesV,
    QuadMaterialIndices,
}

impl Uniform {
    // the name the shader declares the uniform under
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Pixel00 => "pixel00",
            Uniform::PixelU => "pixelU",
            Uniform::PixelV => "pixelV",
            Uniform::CameraCenter => "cameraCenter",
            Uniform::DefocusAngle => "defocusAngle",
            Uniform::Samples => "samples",
            Uniform::MaxBounces => "maxBounces",
            Uniform::Gamma => "gamma",
            Uniform::BackgroundOpacity => "backgroundOpacity",
            Uniform::SeedOffset => "seedOffset",
            Uniform::MaterialType => "materialType",
            Uniform::MaterialAlbedo => "materialAlbedo",
            Uniform::MaterialFuzz => "materialFuzz",
            Uniform::MaterialRefractionIndex => "materialRefractionIndex",
            Uniform::SpheresAmount => "spheresAmount",
            Uniform::Spheres => "spheres",
            Uniform::SphereMaterialIndices => "sphereMaterialIndicies",
            Uniform::QuadsAmount => "quadsAmount",
            Uniform::QuadOrigins => "quadOrigins",
            Uniform::QuadEdgesU => "quadEdgesU",
            Uniform::QuadEdgesV => "quadEdgesV",
            Uniform::QuadMaterialIndices => "quadMaterialIndicies",
        }
    }
}

impl Display for Uniform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    Vec3Array(Vec<[f32; 3]>),
    Vec4Array(Vec<[f32; 4]>),
}

impl UniformValue {
    // shader ints are signed; counts past i32::MAX saturate
    pub fn count(n: u32) -> UniformValue {
        UniformValue::Int(i32::try_from(n).unwrap_or(i32::MAX))
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("renderer failed: {0}")]
    Backend(String),

    #[error("texture for material {material_idx} rejected: {reason}")]
    TextureRejected { material_idx: usize, reason: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    // passes finished so far, including the one just composited
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// The external GPU renderer. Everything the control plane knows about it
/// goes through this trait.
pub trait RendererBridge {
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue);

    fn bind_material_texture(
        &mut self,
        material_idx: usize,
        texture: RgbaImage,
    ) -> Result<(), BridgeError>;

    /// Renders one full-screen pass into an offscreen target and reads it
    /// back. Rows come back in the GPU's bottom-up order.
    fn render_offscreen(&mut self, extent: [u32; 2]) -> Result<RgbaImage, BridgeError>;

    /// Shows the accumulated image of an in-progress still render.
    fn present_progress(
        &mut self,
        _accumulated: &RgbaImage,
        _progress: Progress,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Draws one interactive frame to the screen.
    fn draw_frame(&mut self, extent: [u32; 2]) -> Result<(), BridgeError>;
}

pub type PixelShader = Box<dyn Fn(&BTreeMap<Uniform, UniformValue>, u32, u32) -> Rgba<u8>>;

/// Keeps the last value written to every uniform and shades offscreen
/// passes on the cpu with a caller-supplied function of (uniforms, x, y).
pub struct RecordingBridge {
    uniforms: BTreeMap<Uniform, UniformValue>,
    pub textures: BTreeMap<usize, [u32; 2]>,
    shader: PixelShader,
    // every value `samples` was set to, in order
    pub samples_history: Vec<i32>,
    pub offscreen_renders: u32,
    pub frames_drawn: u32,
    pub progress: Vec<Progress>,
}

impl RecordingBridge {
    pub fn new() -> RecordingBridge {
        Self::with_shader(|_, _, _| Rgba([0, 0, 0, 255]))
    }

    pub fn with_shader(
        shader: impl Fn(&BTreeMap<Uniform, UniformValue>, u32, u32) -> Rgba<u8> + 'static,
    ) -> RecordingBridge {
        RecordingBridge {
            uniforms: BTreeMap::new(),
            textures: BTreeMap::new(),
            shader: Box::new(shader),
            samples_history: vec![],
            offscreen_renders: 0,
            frames_drawn: 0,
            progress: vec![],
        }
    }

    pub fn uniform(&self, uniform: Uniform) -> Option<&UniformValue> {
        self.uniforms.get(&uniform)
    }

    pub fn uniforms(&self) -> &BTreeMap<Uniform, UniformValue> {
        &self.uniforms
    }

    // uniforms keyed by shader name
    pub fn to_json(&self) -> serde_json::Value {
        let table: serde_json::Map<String, serde_json::Value> = self
            .uniforms
            .iter()
            .map(|(uniform, value)| {
                (
                    uniform.name().to_string(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::Value::Object(table)
    }
}

impl Default for RecordingBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererBridge for RecordingBridge {
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) {
        if let (Uniform::Samples, UniformValue::Int(samples)) = (uniform, &value) {
            self.samples_history.push(*samples);
        }
        self.uniforms.insert(uniform, value);
    }

    fn bind_material_texture(
        &mut self,
        material_idx: usize,
        texture: RgbaImage,
    ) -> Result<(), BridgeError> {
        self.textures
            .insert(material_idx, [texture.width(), texture.height()]);
        Ok(())
    }

    fn render_offscreen(&mut self, extent: [u32; 2]) -> Result<RgbaImage, BridgeError> {
        self.offscreen_renders += 1;
        let uniforms = &self.uniforms;
        let shader = &self.shader;
        Ok(RgbaImage::from_fn(extent[0], extent[1], |x, y| {
            shader(uniforms, x, y)
        }))
    }

    fn present_progress(
        &mut self,
        _accumulated: &RgbaImage,
        progress: Progress,
    ) -> Result<(), BridgeError> {
        self.progress.push(progress);
        Ok(())
    }

    fn draw_frame(&mut self, _extent: [u32; 2]) -> Result<(), BridgeError> {
        self.frames_drawn += 1;
        Ok(())
    }
}
