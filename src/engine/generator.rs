//! Synthetic response generation
//!
//! Produces lorem-style prose whose volume scales with the requested output
//! budget, the verbosity knob, and (modestly) the prompt length. Content is
//! built once per request and is immutable afterwards.

use std::str::FromStr;

use fake::faker::lorem::raw::Paragraph;
use fake::locales::{EN, FR_FR};
use fake::Fake;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{MockError, MockResult};

/// Characters per token-equivalent when sizing the output
const CHARS_PER_TOKEN: usize = 4;

/// Extra paragraphs granted per unit of verbosity
const VERBOSITY_PARAGRAPH_SPAN: f64 = 5.0;

/// Cap on the prompt-length boost applied to the paragraph count
const PARAGRAPH_BOOST_CAP: f64 = 2.0;

/// Cap on the prompt-length boost applied to the character target
const LENGTH_BOOST_CAP: f64 = 1.5;

/// Default budget range when the caller does not pick one
const DEFAULT_BUDGET_TOKENS: std::ops::RangeInclusive<u32> = 100..=1000;

/// Sentences per synthesized paragraph
const SENTENCES_PER_PARAGRAPH: std::ops::Range<usize> = 2..7;

/// Locale used for the synthesized prose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProseLocale {
    En,
    #[default]
    Fr,
}

impl std::fmt::Display for ProseLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Fr => write!(f, "fr"),
        }
    }
}

impl FromStr for ProseLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "en_us" => Ok(Self::En),
            "fr" | "fr_fr" => Ok(Self::Fr),
            _ => Err(format!("Unknown prose locale: {}", s)),
        }
    }
}

/// Content synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Locale for the generated prose
    pub locale: ProseLocale,
    /// Fixed seed for reproducible output (None = entropy)
    pub seed: Option<u64>,
    /// Absolute ceiling on synthesized characters per response
    pub max_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            locale: ProseLocale::default(),
            seed: None,
            max_chars: 8000,
        }
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> MockResult<()> {
        if self.max_chars < 100 {
            return Err(MockError::Validation {
                message: "max_chars must be at least 100".to_string(),
                param: Some("synthesis.max_chars".to_string()),
            });
        }
        Ok(())
    }
}

/// Paragraphs of synthesized prose; the response body is their
/// blank-line-separated concatenation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedContent {
    paragraphs: Vec<String>,
}

impl SynthesizedContent {
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// The full response body
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// Length in characters of the full response body
    pub fn char_len(&self) -> usize {
        let separators = 2 * self.paragraphs.len().saturating_sub(1);
        self.paragraphs.iter().map(String::len).sum::<usize>() + separators
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(String::is_empty)
    }
}

/// Generates simulated completion text
pub struct ProseSynthesizer {
    config: SynthesisConfig,
    rng: Mutex<StdRng>,
}

impl ProseSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Synthesize a response against a token budget.
    ///
    /// A missing budget means "the model decided how much to say" and is
    /// drawn uniformly from a fixed range. A zero budget is clamped to the
    /// smallest response rather than rejected. The paragraph count grows
    /// with verbosity and gets a capped boost from prompt length; the
    /// character target is proportional to the budget with its own capped
    /// boost, and the absolute ceiling always wins.
    pub fn synthesize(
        &self,
        prompt_tokens: usize,
        max_output_tokens: Option<u32>,
        verbosity: f32,
    ) -> SynthesizedContent {
        let mut rng = self.rng.lock();

        let budget = match max_output_tokens {
            Some(tokens) => tokens.max(1) as usize,
            None => rng.gen_range(DEFAULT_BUDGET_TOKENS) as usize,
        };

        let verbosity = f64::from(verbosity.clamp(0.0, 1.0));
        let prompt_factor = 1.0 + (prompt_tokens as f64 / 100.0) * 0.5;

        let base_paragraphs = 1.0 + verbosity * VERBOSITY_PARAGRAPH_SPAN;
        let num_paragraphs =
            ((base_paragraphs * prompt_factor.min(PARAGRAPH_BOOST_CAP)) as usize).max(1);

        let target_chars = ((budget * CHARS_PER_TOKEN) as f64 * prompt_factor.min(LENGTH_BOOST_CAP))
            as usize;
        let target_chars = target_chars.min(self.config.max_chars);

        let mut paragraphs: Vec<String> = Vec::new();
        let mut total = 0usize;

        while total < target_chars && paragraphs.len() < num_paragraphs {
            let mut paragraph = self.paragraph(&mut rng);
            let separator = if paragraphs.is_empty() { 0 } else { 2 };

            let remaining = self.config.max_chars.saturating_sub(total + separator);
            if remaining == 0 {
                break;
            }

            if paragraph.len() > remaining {
                truncate_at_word(&mut paragraph, remaining);
                if !paragraph.is_empty() {
                    total += separator + paragraph.len();
                    paragraphs.push(paragraph);
                }
                break;
            }

            total += separator + paragraph.len();
            paragraphs.push(paragraph);
        }

        SynthesizedContent { paragraphs }
    }

    fn paragraph(&self, rng: &mut StdRng) -> String {
        match self.config.locale {
            ProseLocale::En => Paragraph(EN, SENTENCES_PER_PARAGRAPH).fake_with_rng(rng),
            ProseLocale::Fr => Paragraph(FR_FR, SENTENCES_PER_PARAGRAPH).fake_with_rng(rng),
        }
    }
}

impl Default for ProseSynthesizer {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

/// Shorten `text` to at most `limit` bytes, preferring a word boundary
fn truncate_at_word(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }

    let mut cut = limit;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);

    if let Some(last_space) = text.rfind(' ') {
        if last_space > 0 {
            text.truncate(last_space);
        }
    }
}
