//! Core simulation engine
//!
//! The MockEngine is the heart of the server: it estimates prompt tokens,
//! synthesizes a response against the requested budget, samples realistic
//! delays shaped by the in-flight request count, and sequences the result as
//! either one materialized completion or a paced stream of chunks. Personas
//! only translate their wire schemas onto these two operations.

mod generator;
mod inflight;

pub use generator::*;
pub use inflight::*;

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MockConfig;
use crate::error::{MockError, MockResult};
use crate::latency::TimingModel;
use crate::tokens::TokenEstimator;

/// Input contract of the engine. Personas build one per incoming call.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Prompt text (multi-message conversations arrive pre-concatenated)
    pub prompt: String,
    /// Output budget; None means the engine picks one
    pub max_output_tokens: Option<u32>,
    /// Verbosity knob in [0, 1], temperature-equivalent
    pub verbosity: f32,
    /// Reject prompts whose estimated tokens exceed this
    pub max_context_tokens: Option<usize>,
}

impl CompletionParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: None,
            verbosity: 0.7,
            max_context_tokens: None,
        }
    }

    pub fn with_max_output_tokens(mut self, max: Option<u32>) -> Self {
        self.max_output_tokens = max;
        self
    }

    pub fn with_verbosity(mut self, verbosity: f32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_max_context_tokens(mut self, max: Option<usize>) -> Self {
        self.max_context_tokens = max;
        self
    }
}

/// A fully materialized completion with token accounting
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl Completion {
    pub fn total_tokens(&self) -> usize {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Why a completion stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
        }
    }
}

/// One unit of a streamed response, in emission order: exactly one `Role`,
/// zero or more `Content` fragments, exactly one `Finish`, then the `Done`
/// sentinel. Nothing follows `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Marks the start of the assistant turn; carries no content
    Role,
    /// One content fragment
    Content { text: String },
    /// Marks the end of generation
    Finish { reason: FinishReason },
    /// Out-of-band end-of-stream sentinel
    Done,
}

/// How streamed content is fragmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StreamGranularity {
    /// Whitespace-attached words
    #[default]
    Word,
    /// Tokenizer-sized fragments
    Token,
}

impl FromStr for StreamGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "word" => Ok(Self::Word),
            "token" => Ok(Self::Token),
            _ => Err(format!("Unknown stream granularity: {}", s)),
        }
    }
}

/// Running totals, exposed through `/admin/stats`
#[derive(Debug, Default)]
struct EngineTotals {
    requests: AtomicU64,
    errors: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl EngineTotals {
    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_tokens(&self, prompt: usize, completion: usize) {
        self.prompt_tokens.fetch_add(prompt as u64, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(completion as u64, Ordering::Relaxed);
    }
}

/// Snapshot of engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_requests: u64,
    pub total_errors: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub inflight_requests: usize,
}

/// The response sequencer
pub struct MockEngine {
    estimator: TokenEstimator,
    synthesizer: ProseSynthesizer,
    timing: TimingModel,
    inflight: Arc<InflightGauge>,
    granularity: StreamGranularity,
    totals: EngineTotals,
}

impl MockEngine {
    /// Build an engine from configuration
    pub fn new(config: &MockConfig) -> MockResult<Self> {
        let estimator = TokenEstimator::new(config.tokenizer)?;

        let mut synthesis = config.synthesis.clone();
        synthesis.seed = synthesis.seed.or(config.seed);
        let synthesizer = ProseSynthesizer::new(synthesis);

        let timing = match config.seed {
            Some(seed) => TimingModel::with_seed(config.timing.clone(), seed),
            None => TimingModel::new(config.timing.clone()),
        };

        Ok(Self {
            estimator,
            synthesizer,
            timing,
            inflight: Arc::new(InflightGauge::new()),
            granularity: config.model.stream_granularity,
            totals: EngineTotals::default(),
        })
    }

    /// The in-flight gauge, shared with graceful shutdown
    pub fn gauge(&self) -> Arc<InflightGauge> {
        Arc::clone(&self.inflight)
    }

    /// Current number of requests inside the engine
    pub fn inflight(&self) -> usize {
        self.inflight.current()
    }

    /// The engine's token estimator
    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Snapshot of running totals
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_requests: self.totals.requests.load(Ordering::Relaxed),
            total_errors: self.totals.errors.load(Ordering::Relaxed),
            total_prompt_tokens: self.totals.prompt_tokens.load(Ordering::Relaxed),
            total_completion_tokens: self.totals.completion_tokens.load(Ordering::Relaxed),
            inflight_requests: self.inflight.current(),
        }
    }

    /// Produce one materialized completion.
    ///
    /// Holds an in-flight slot for the whole call; when latency simulation
    /// is on, sleeps once for TTFT plus the sampled generation time.
    pub async fn complete(&self, params: &CompletionParams) -> MockResult<Completion> {
        let _guard = InflightGuard::acquire(&self.inflight);
        self.totals.record_request();

        let result = self.complete_inner(params).await;
        if result.is_err() {
            self.totals.record_error();
        }
        result
    }

    async fn complete_inner(&self, params: &CompletionParams) -> MockResult<Completion> {
        let prompt_tokens = self.estimator.estimate(&params.prompt);
        self.check_context(prompt_tokens, params.max_context_tokens)?;

        let content =
            self.synthesizer
                .synthesize(prompt_tokens, params.max_output_tokens, params.verbosity);
        let text = content.text();
        let completion_tokens = self.estimator.estimate(&text);
        self.totals.record_tokens(prompt_tokens, completion_tokens);

        if self.timing.is_enabled() {
            let sample = self
                .timing
                .sample(prompt_tokens, completion_tokens, self.inflight.current());
            debug!(
                prompt_tokens,
                completion_tokens,
                inflight = self.inflight.current(),
                delay_ms = sample.total().as_millis() as u64,
                "simulated unary delay"
            );
            tokio::time::sleep(sample.total()).await;
        }

        Ok(Completion {
            text,
            prompt_tokens,
            completion_tokens,
        })
    }

    /// Produce a paced, cancellable stream of chunks.
    ///
    /// Content is decided up front; the fragment sequence never reorders.
    /// The in-flight slot moves into the stream, so dropping the stream
    /// before the sentinel still releases it. Context-length violations are
    /// reported before any chunk is produced.
    pub fn complete_stream(
        &self,
        params: &CompletionParams,
    ) -> MockResult<impl Stream<Item = StreamChunk> + Send + 'static> {
        let guard = InflightGuard::acquire(&self.inflight);
        self.totals.record_request();

        let prompt_tokens = self.estimator.estimate(&params.prompt);
        if let Err(err) = self.check_context(prompt_tokens, params.max_context_tokens) {
            self.totals.record_error();
            return Err(err);
        }

        let content =
            self.synthesizer
                .synthesize(prompt_tokens, params.max_output_tokens, params.verbosity);
        let text = content.text();
        let completion_tokens = self.estimator.estimate(&text);
        self.totals.record_tokens(prompt_tokens, completion_tokens);

        let fragments = self.fragment(&text);

        let enabled = self.timing.is_enabled();
        let (ttft, per_fragment) = if enabled {
            let sample = self
                .timing
                .sample(prompt_tokens, completion_tokens, self.inflight.current());
            let per_fragment = sample.generation / fragments.len().max(1) as u32;
            (sample.ttft, per_fragment)
        } else {
            (Duration::ZERO, Duration::ZERO)
        };

        Ok(stream! {
            // The slot is released when this generator drops, whether the
            // consumer reads to the sentinel or disconnects mid-stream.
            let _guard = guard;

            yield StreamChunk::Role;

            if enabled {
                tokio::time::sleep(ttft).await;
            }

            for fragment in fragments {
                if enabled {
                    tokio::time::sleep(per_fragment).await;
                }
                yield StreamChunk::Content { text: fragment };
            }

            yield StreamChunk::Finish {
                reason: FinishReason::Stop,
            };
            yield StreamChunk::Done;
        })
    }

    fn check_context(&self, prompt_tokens: usize, max_context: Option<usize>) -> MockResult<()> {
        if let Some(max) = max_context {
            if prompt_tokens > max {
                return Err(MockError::ContextTooLong {
                    tokens: prompt_tokens,
                    max_context: max,
                });
            }
        }
        Ok(())
    }

    fn fragment(&self, text: &str) -> Vec<String> {
        match self.granularity {
            StreamGranularity::Word => text.split_inclusive(' ').map(String::from).collect(),
            StreamGranularity::Token => self.estimator.split_tokens(text),
        }
    }
}
