use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use image::{DynamicImage, Rgba, Rgba32FImage, RgbaImage, imageops};
use log::{debug, error, info, warn};
use rand::Rng;
use rand::rngs::ThreadRng;
use serde::Deserialize;
use thiserror::Error;

use super::bridge::{BridgeError, Progress, RendererBridge, Uniform, UniformValue};
use crate::parameters::RenderParameters;

/// How each pass is merged into the accumulated image.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompositeMode {
    // the pass is drawn over the accumulated image, blended by its alpha
    #[default]
    #[serde(rename = "overwrite")]
    Overwrite,
    // every pass contributes 1 / passes
    #[serde(rename = "mean")]
    RunningMean,
}

#[derive(Error, Debug)]
pub enum AccumulateError {
    #[error("samples per pass must be at least 1")]
    ZeroPassSize,

    #[error("pass image is {actual:?}, expected {expected:?}")]
    PassSize { expected: [u32; 2], actual: [u32; 2] },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed { passes: u32 },
    Cancelled { completed: u32, total: u32 },
}

/// Number of passes for a sample budget. Rounds to nearest, never below one:
/// a budget smaller than half a pass still renders a single pass instead of
/// exporting the untouched black buffer.
pub fn pass_count(total_samples: u32, samples_per_pass: u32) -> u32 {
    let passes = (total_samples as f64 / samples_per_pass as f64).round() as u32;
    passes.max(1)
}

/// Shared flag a caller flips to stop an in-progress still render after the
/// current pass.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        Default::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Image-sized float color buffer that passes are composited into.
pub struct AccumulationBuffer {
    mode: CompositeMode,
    image: Rgba32FImage,
    passes: u32,
}

impl AccumulationBuffer {
    // starts opaque black
    pub fn new(extent: [u32; 2], mode: CompositeMode) -> AccumulationBuffer {
        AccumulationBuffer {
            mode,
            image: Rgba32FImage::from_pixel(extent[0], extent[1], Rgba([0.0, 0.0, 0.0, 1.0])),
            passes: 0,
        }
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn composite(&mut self, pass: &RgbaImage) {
        // weight of the incoming pass for the running mean
        let weight = 1.0 / (self.passes + 1) as f32;
        for (dst, src) in self.image.pixels_mut().zip(pass.pixels()) {
            let src = src.0.map(|c| c as f32 / 255.0);
            match self.mode {
                CompositeMode::Overwrite => {
                    let alpha = src[3];
                    for c in 0..3 {
                        dst.0[c] = src[c] * alpha + dst.0[c] * (1.0 - alpha);
                    }
                    dst.0[3] = alpha + dst.0[3] * (1.0 - alpha);
                }
                CompositeMode::RunningMean => {
                    for c in 0..4 {
                        dst.0[c] += (src[c] - dst.0[c]) * weight;
                    }
                }
            }
        }
        self.passes += 1;
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        DynamicImage::ImageRgba32F(self.image.clone()).to_rgba8()
    }
}

/// Renders a still image as a sequence of low-sample passes through the
/// renderer bridge, then writes it to disk.
pub struct ProgressiveAccumulator<R: Rng = ThreadRng> {
    extent: [u32; 2],
    composite: CompositeMode,
    rng: R,
    cancel: Option<CancelToken>,
    progress: Option<Sender<Progress>>,
}

impl ProgressiveAccumulator<ThreadRng> {
    pub fn new(extent: [u32; 2], composite: CompositeMode) -> ProgressiveAccumulator<ThreadRng> {
        Self::with_rng(extent, composite, rand::rng())
    }
}

impl<R: Rng> ProgressiveAccumulator<R> {
    pub fn with_rng(extent: [u32; 2], composite: CompositeMode, rng: R) -> ProgressiveAccumulator<R> {
        ProgressiveAccumulator {
            extent,
            composite,
            rng,
            cancel: None,
            progress: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    // one event per composited pass
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn seed_offset(&mut self) -> [f32; 2] {
        [
            self.rng.random_range(1..=1000i32) as f32,
            self.rng.random_range(-1000..=0i32) as f32,
        ]
    }

    /// Runs `pass_count(total_samples, samples_per_pass)` passes, saves the
    /// result to `output` and then puts the `samples` and `seedOffset`
    /// uniforms back to their interactive values, whatever the outcome.
    /// A failed save is logged, not returned.
    pub fn render_high_quality(
        &mut self,
        bridge: &mut dyn RendererBridge,
        interactive: &RenderParameters,
        total_samples: u32,
        samples_per_pass: u32,
        output: &Path,
    ) -> Result<RenderOutcome, AccumulateError> {
        if samples_per_pass == 0 {
            return Err(AccumulateError::ZeroPassSize);
        }

        let result = self.run_passes(bridge, total_samples, samples_per_pass, output);

        bridge.set_uniform(Uniform::Samples, UniformValue::count(interactive.samples));
        bridge.set_uniform(Uniform::SeedOffset, UniformValue::Vec2([0.0, 0.0]));

        result
    }

    fn run_passes(
        &mut self,
        bridge: &mut dyn RendererBridge,
        total_samples: u32,
        samples_per_pass: u32,
        output: &Path,
    ) -> Result<RenderOutcome, AccumulateError> {
        let total = pass_count(total_samples, samples_per_pass);
        let mut accumulated = AccumulationBuffer::new(self.extent, self.composite);

        info!(
            "rendering high-quality image: {} pass(es) of {} samples",
            total, samples_per_pass
        );
        bridge.set_uniform(Uniform::Samples, UniformValue::count(samples_per_pass));

        for pass in 0..total {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                warn!("high-quality render cancelled after {}/{} passes", pass, total);
                return Ok(RenderOutcome::Cancelled {
                    completed: pass,
                    total,
                });
            }

            let seed_offset = self.seed_offset();
            bridge.set_uniform(Uniform::SeedOffset, UniformValue::Vec2(seed_offset));

            let mut pass_image = bridge.render_offscreen(self.extent)?;
            let actual = [pass_image.width(), pass_image.height()];
            if actual != self.extent {
                return Err(AccumulateError::PassSize {
                    expected: self.extent,
                    actual,
                });
            }
            // read back bottom-up
            imageops::flip_vertical_in_place(&mut pass_image);
            accumulated.composite(&pass_image);

            let progress = Progress {
                completed: pass + 1,
                total,
            };
            debug!("pass {}/{} seed {:?}", progress.completed, total, seed_offset);
            bridge.present_progress(&accumulated.to_rgba8(), progress)?;
            if let Some(sender) = &self.progress {
                // a dropped receiver just means nobody is watching
                let _ = sender.send(progress);
            }
        }

        match accumulated.to_rgba8().save(output) {
            Ok(()) => info!("high-quality image saved to {}", output.display()),
            Err(e) => error!("failed to save high-quality image to {}: {}", output.display(), e),
        }

        Ok(RenderOutcome::Completed { passes: total })
    }
}
