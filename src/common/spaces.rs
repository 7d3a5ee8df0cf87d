use burn::tensor::{backend::Backend, Tensor};

use super::error::PolicyError;

/// An n-dimensional box `[low, high]` of `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    /// The lower bound on the space
    low: Vec<f32>,

    /// The upper bound on the space
    high: Vec<f32>,
}

impl From<(Vec<f32>, Vec<f32>)> for BoxSpace {
    fn from(value: (Vec<f32>, Vec<f32>)) -> Self {
        Self {
            low: value.0,
            high: value.1,
        }
    }
}

impl BoxSpace {
    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn high(&self) -> &[f32] {
        &self.high
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn contains(&self, sample: &[f32]) -> bool {
        if sample.len() != self.low.len() {
            return false;
        }

        sample
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&s, &l), &h)| l <= s && s <= h)
    }
}

/// Maps squashed policy actions in (-1, 1) onto a bounded action box and
/// back, so the policy can stay on the unit range whatever the environment
/// declares.
#[derive(Debug, Clone)]
pub struct ActionRescaler {
    scale: Vec<f32>,
    offset: Vec<f32>,
}

impl ActionRescaler {
    pub fn new(space: &BoxSpace) -> Result<Self, PolicyError> {
        if space.low.len() != space.high.len() {
            return Err(PolicyError::ShapeMismatch {
                what: "action box bounds".to_string(),
                expected: space.low.len(),
                got: space.high.len(),
            });
        }

        for (l, h) in space.low.iter().zip(space.high.iter()) {
            if !l.is_finite() || !h.is_finite() {
                return Err(PolicyError::InvalidConfig(
                    "action bounds must be finite to rescale".to_string(),
                ));
            }
            if l >= h {
                return Err(PolicyError::InvalidConfig(format!(
                    "action low {l} must be below high {h}"
                )));
            }
        }

        let (scale, offset) = space
            .low
            .iter()
            .zip(space.high.iter())
            .map(|(l, h)| ((h - l) / 2.0, (h + l) / 2.0))
            .unzip();

        Ok(Self { scale, offset })
    }

    pub fn action_dim(&self) -> usize {
        self.scale.len()
    }

    fn row<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(values, device).unsqueeze_dim(0)
    }

    /// (-1, 1) -> [low, high]
    pub fn scale<B: Backend>(&self, actions: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = actions.device();

        actions * Self::row::<B>(&self.scale, &device) + Self::row::<B>(&self.offset, &device)
    }

    /// [low, high] -> (-1, 1)
    pub fn unscale<B: Backend>(&self, actions: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = actions.device();

        (actions - Self::row::<B>(&self.offset, &device)) / Self::row::<B>(&self.scale, &device)
    }
}
