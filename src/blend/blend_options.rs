use crate::{distance::DEFAULT_MAX_SAMPLES_PER_PART, misc::FloatingPoint};

/// Options for blending two shape graphs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendOptions<T> {
    /// Sampling spacing of the distance field used to reconnect parts
    distance_step: T,
    /// Upper bound of distance field samples on a single part
    max_samples_per_part: usize,
}

impl<T: FloatingPoint> Default for BlendOptions<T> {
    fn default() -> Self {
        Self {
            distance_step: T::lit(0.25),
            max_samples_per_part: DEFAULT_MAX_SAMPLES_PER_PART,
        }
    }
}

impl<T: FloatingPoint> BlendOptions<T> {
    pub fn distance_step(&self) -> T {
        self.distance_step
    }

    pub fn max_samples_per_part(&self) -> usize {
        self.max_samples_per_part
    }

    pub fn with_distance_step(mut self, step: T) -> Self {
        self.distance_step = step;
        self
    }

    pub fn with_max_samples_per_part(mut self, samples: usize) -> Self {
        self.max_samples_per_part = samples;
        self
    }
}
