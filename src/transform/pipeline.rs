use std::{fs::File, io::BufReader, path::Path};

use image::RgbImage;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{CocoAugError, CocoAugResult},
    transform::ops::Op,
    transform::vignette::{DEFAULT_VIGNETTE_SIGMA, apply_vignette},
};

/// Anything that turns one image into another, drawing randomness from the caller.
pub trait ImageTransform {
    /// Produce the transformed image.
    fn apply(&self, image: RgbImage, rng: &mut dyn RngCore) -> CocoAugResult<RgbImage>;
}

/// One pipeline entry: an op and the probability it runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The operation.
    #[serde(flatten)]
    pub op: Op,
    /// Probability in `0..=1`.
    #[serde(default = "always")]
    pub p: f64,
}

fn always() -> f64 {
    1.0
}

impl Step {
    /// Wrap `op` with probability `p`.
    pub fn new(op: Op, p: f64) -> Self {
        Self { op, p }
    }
}

/// Extra stages enabled by nighttime mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightConfig {
    /// Sigma of the unconditional vignette applied before any step.
    pub vignette_sigma: f64,
    /// Steps appended after the regular ones.
    pub steps: Vec<Step>,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            vignette_sigma: DEFAULT_VIGNETTE_SIGMA,
            steps: vec![Step::new(Op::ToGray, 1.0), Step::new(Op::iso_noise(), 1.0)],
        }
    }
}

/// Serializable description of a [`TransformPipeline`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Regular steps, run in order.
    pub steps: Vec<Step>,
    /// Enable the nighttime stages.
    pub nighttime: bool,
    /// Nighttime stage settings.
    pub night: NightConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            steps: vec![
                Step::new(Op::brightness_contrast(), 1.0),
                Step::new(Op::hue_saturation_value(), 1.0),
                Step::new(Op::clahe(), 0.5),
                Step::new(Op::ChannelShuffle, 0.5),
                Step::new(Op::HorizontalFlip, 0.5),
                Step::new(Op::VerticalFlip, 0.5),
            ],
            nighttime: false,
            night: NightConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> CocoAugResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CocoAugError::configuration(format!("open pipeline JSON '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            CocoAugError::configuration(format!("parse pipeline JSON '{}': {e}", path.display()))
        })
    }

    /// Same config with nighttime mode switched to `on`.
    pub fn with_nighttime(mut self, on: bool) -> Self {
        self.nighttime = on;
        self
    }

    /// Check every probability and op parameter.
    pub fn validate(&self) -> CocoAugResult<()> {
        for step in self.steps.iter().chain(&self.night.steps) {
            if !(0.0..=1.0).contains(&step.p) {
                return Err(CocoAugError::configuration(format!(
                    "{}: probability {} is outside 0..=1",
                    step.op.name(),
                    step.p
                )));
            }
            step.op.validate()?;
        }
        if self.nighttime
            && !(self.night.vignette_sigma.is_finite() && self.night.vignette_sigma > 0.0)
        {
            return Err(CocoAugError::configuration("vignette sigma must be > 0"));
        }
        Ok(())
    }
}

/// Ordered probabilistic image pipeline.
///
/// Each step draws one uniform number and runs when it falls below the step's probability.
/// Randomness is consumed in step order only, so a fixed seed and input reproduce the output.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformPipeline {
    steps: Vec<Step>,
    vignette_sigma: Option<f64>,
}

impl TransformPipeline {
    /// Build a pipeline from a validated config.
    pub fn new(config: &PipelineConfig) -> CocoAugResult<Self> {
        config.validate()?;
        let mut steps = config.steps.clone();
        let mut vignette_sigma = None;
        if config.nighttime {
            steps.extend(config.night.steps.iter().cloned());
            vignette_sigma = Some(config.night.vignette_sigma);
        }
        Ok(Self {
            steps,
            vignette_sigma,
        })
    }

    /// The effective steps, nighttime stages included.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the vignette runs before the steps.
    pub fn is_nighttime(&self) -> bool {
        self.vignette_sigma.is_some()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            steps: config.steps,
            vignette_sigma: None,
        }
    }
}

impl ImageTransform for TransformPipeline {
    fn apply(&self, image: RgbImage, rng: &mut dyn RngCore) -> CocoAugResult<RgbImage> {
        let mut image = match self.vignette_sigma {
            Some(sigma) => apply_vignette(image, sigma)?,
            None => image,
        };
        for step in &self.steps {
            if rng.random::<f64>() < step.p {
                tracing::trace!(op = step.op.name(), "apply step");
                image = step.op.apply(image, rng)?;
            }
        }
        Ok(image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/pipeline.rs"]
mod tests;
