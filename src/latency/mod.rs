//! Latency simulation module
//!
//! Models request timing with Gaussian samplers for Time-To-First-Token
//! (TTFT) and total generation time, both shaped by the number of requests
//! currently in flight. Higher concurrency raises the sampled means the way
//! a busy inference server queues work; it never blocks anything itself.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{MockError, MockResult};

/// Minimum duration any sampler returns
const LATENCY_FLOOR: Duration = Duration::from_millis(1);

/// Variance of the base TTFT, as a fraction of its mean
const TTFT_STD_RATIO: f64 = 0.30;

/// TTFT overhead added per reference-sized block of extra prompt tokens
const TTFT_SIZE_STEP: f64 = 0.10;

/// Cap on the prompt-size scale-up factor
const TTFT_SIZE_CAP: f64 = 2.0;

/// Queue delay per additional in-flight request, as a fraction of base TTFT
const TTFT_QUEUE_RATIO: f64 = 0.20;

/// Variance of per-token generation time, as a fraction of its mean
const ITL_STD_RATIO: f64 = 0.10;

/// Queue delay per additional in-flight request, as a fraction of the
/// reference processing time for the whole completion
const ITL_QUEUE_RATIO: f64 = 0.25;

/// Variance of the generation queue delay
const ITL_QUEUE_STD_RATIO: f64 = 0.10;

/// Timing model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Enable latency simulation. When off, the sequencer skips every sleep
    /// but still counts tokens and synthesizes content.
    pub enabled: bool,
    /// Mean TTFT in seconds for a reference-sized prompt at concurrency 1
    pub reference_ttft: f64,
    /// Prompt size the reference TTFT is calibrated for
    pub reference_prompt_tokens: usize,
    /// Reference generation throughput in tokens per second
    pub reference_tokens_per_second: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reference_ttft: 0.6,
            reference_prompt_tokens: 500,
            reference_tokens_per_second: 35.0,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> MockResult<()> {
        if self.reference_ttft <= 0.0 {
            return Err(MockError::Validation {
                message: "reference_ttft must be positive".to_string(),
                param: Some("timing.reference_ttft".to_string()),
            });
        }
        if self.reference_prompt_tokens == 0 {
            return Err(MockError::Validation {
                message: "reference_prompt_tokens must be greater than 0".to_string(),
                param: Some("timing.reference_prompt_tokens".to_string()),
            });
        }
        if self.reference_tokens_per_second <= 0.0 {
            return Err(MockError::Validation {
                message: "reference_tokens_per_second must be positive".to_string(),
                param: Some("timing.reference_tokens_per_second".to_string()),
            });
        }
        Ok(())
    }
}

/// A pair of sampled delays for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    /// Delay before the first token appears
    pub ttft: Duration,
    /// Total time to generate the whole completion
    pub generation: Duration,
}

impl TimingSample {
    /// Combined delay for a unary response
    pub fn total(&self) -> Duration {
        self.ttft + self.generation
    }
}

/// Latency model with per-request Gaussian sampling
pub struct TimingModel {
    config: TimingConfig,
    rng: Mutex<StdRng>,
}

impl TimingModel {
    /// Create a model seeded from entropy
    pub fn new(config: TimingConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a model with a fixed seed for deterministic behavior
    pub fn with_seed(config: TimingConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Check if latency simulation is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Sample a Time-To-First-Token delay.
    ///
    /// The base mean is `reference_ttft` for a `reference_prompt_tokens`
    /// prompt at concurrency 1. Larger prompts scale the mean up
    /// sub-linearly, capped at 2x. Each additional in-flight request adds a
    /// queue delay of 20% of the base mean; the queue term contributes
    /// nothing at `inflight <= 1`.
    pub fn ttft(&self, input_tokens: usize, inflight: usize) -> Duration {
        let base_mean = self.config.reference_ttft;
        let base_std = base_mean * TTFT_STD_RATIO;

        let reference = self.config.reference_prompt_tokens as f64;
        let excess = (input_tokens as f64 - reference).max(0.0) / reference;
        let size_factor = (1.0 + TTFT_SIZE_STEP * excess).min(TTFT_SIZE_CAP);

        let size_adjusted_mean = base_mean * size_factor;
        let size_adjusted_std = base_std * size_factor;

        let (queue_mean, queue_std) = if inflight <= 1 {
            (0.0, 0.0)
        } else {
            let mean = (inflight - 1) as f64 * base_mean * TTFT_QUEUE_RATIO;
            (mean, mean * TTFT_STD_RATIO)
        };

        let total_mean = size_adjusted_mean + queue_mean;
        let total_std = (size_adjusted_std.powi(2) + queue_std.powi(2)).sqrt();

        self.sample_gaussian(total_mean, total_std)
    }

    /// Sample the total generation time for a completion.
    ///
    /// The per-token mean derives from the reference throughput; the std is
    /// 10% of the generation mean. Queueing adds 25% of the reference
    /// processing time per additional in-flight request, with 10% of that as
    /// extra variance. The queue term is gated at `inflight <= 1`, matching
    /// the TTFT sampler.
    pub fn generation(&self, output_tokens: usize, inflight: usize) -> Duration {
        let time_per_token = 1.0 / self.config.reference_tokens_per_second;

        let generation_mean = output_tokens as f64 * time_per_token;
        let generation_std = generation_mean * ITL_STD_RATIO;

        let (queue_mean, queue_std) = if inflight <= 1 {
            (0.0, 0.0)
        } else {
            let reference_processing = output_tokens as f64 * time_per_token;
            let extra = (inflight - 1) as f64;
            (
                extra * reference_processing * ITL_QUEUE_RATIO,
                extra * reference_processing * ITL_QUEUE_STD_RATIO,
            )
        };

        let total_mean = generation_mean + queue_mean;
        let total_std = (generation_std.powi(2) + queue_std.powi(2)).sqrt();

        self.sample_gaussian(total_mean, total_std)
    }

    /// Sample both delays for one request
    pub fn sample(&self, input_tokens: usize, output_tokens: usize, inflight: usize) -> TimingSample {
        TimingSample {
            ttft: self.ttft(input_tokens, inflight),
            generation: self.generation(output_tokens, inflight),
        }
    }

    fn sample_gaussian(&self, mean: f64, std: f64) -> Duration {
        let drawn = if std > 0.0 {
            let normal = Normal::new(mean, std)
                .unwrap_or_else(|_| Normal::new(mean.max(0.0), 1e-9).unwrap());
            normal.sample(&mut *self.rng.lock())
        } else {
            mean
        };

        Duration::from_secs_f64(drawn.max(0.0)).max(LATENCY_FLOOR)
    }
}

impl Default for TimingModel {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}
