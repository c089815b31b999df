//! Lexicon backend (Model C)
//!
//! Local rule-based scorer, always available:
//! 1. Split into sentences on `.`, `!`, `?` and line breaks
//! 2. Tokenize each sentence into lowercase words
//! 3. Sum word valences from a built-in lexicon; a negator in the three
//!    preceding words flips and damps the valence, an intensifier directly
//!    before scales it
//! 4. Squash the sum into (-1, 1) and bucket it into a 0-4 class
//!
//! The rounded mean of the sentence classes selects the fine label.

use super::{require_text, SentimentBackend};
use crate::error::BackendError;
use crate::types::{FineLabel, SentimentLabel};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::LazyLock;

const BACKEND_NAME: &str = "lexicon";

/// Words between a negator and the word it still applies to
const NEGATION_WINDOW: usize = 3;
const NEGATION_SCALAR: f64 = -0.74;
const INTENSIFIER_BOOST: f64 = 0.293;
/// Squash constant: sum / sqrt(sum^2 + ALPHA)
const ALPHA: f64 = 15.0;

static VALENCE: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    HashMap::from([
        // positive
        ("good", 1.9),
        ("great", 3.1),
        ("excellent", 3.2),
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("fantastic", 2.6),
        ("wonderful", 2.7),
        ("love", 3.2),
        ("loved", 2.9),
        ("loves", 2.7),
        ("like", 1.5),
        ("liked", 1.8),
        ("nice", 1.8),
        ("happy", 2.7),
        ("glad", 2.0),
        ("best", 3.2),
        ("better", 1.9),
        ("fun", 2.3),
        ("cool", 1.3),
        ("helpful", 1.8),
        ("useful", 1.9),
        ("beautiful", 2.9),
        ("perfect", 2.7),
        ("enjoy", 2.2),
        ("enjoyed", 2.3),
        ("thanks", 1.9),
        ("thank", 1.5),
        ("win", 2.8),
        ("recommend", 1.5),
        ("impressive", 2.3),
        ("brilliant", 2.8),
        ("fine", 0.8),
        ("ok", 0.9),
        ("okay", 0.9),
        ("interesting", 1.7),
        ("solid", 1.4),
        ("fast", 1.0),
        // negative
        ("bad", -2.5),
        ("terrible", -2.1),
        ("awful", -2.0),
        ("horrible", -2.5),
        ("worst", -3.1),
        ("worse", -2.1),
        ("hate", -2.7),
        ("hated", -3.2),
        ("hates", -1.9),
        ("dislike", -1.6),
        ("sad", -2.1),
        ("angry", -2.3),
        ("annoying", -1.7),
        ("boring", -1.3),
        ("broken", -1.6),
        ("bug", -1.1),
        ("buggy", -1.6),
        ("crash", -1.7),
        ("fail", -2.5),
        ("failed", -2.3),
        ("poor", -2.1),
        ("useless", -1.8),
        ("stupid", -2.4),
        ("ugly", -2.3),
        ("wrong", -2.1),
        ("problem", -1.7),
        ("slow", -1.0),
        ("disappointing", -2.2),
        ("disappointed", -1.9),
        ("waste", -1.8),
        ("pain", -2.3),
        ("sucks", -1.5),
        ("lose", -1.3),
        ("scam", -2.6),
    ])
});

static NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "nobody", "none", "neither", "nor", "cannot",
    "without", "hardly",
];

static INTENSIFIERS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    HashMap::from([
        ("very", INTENSIFIER_BOOST),
        ("really", INTENSIFIER_BOOST),
        ("extremely", INTENSIFIER_BOOST),
        ("so", INTENSIFIER_BOOST),
        ("too", INTENSIFIER_BOOST),
        ("absolutely", INTENSIFIER_BOOST),
        ("incredibly", INTENSIFIER_BOOST),
        ("totally", INTENSIFIER_BOOST),
        ("super", INTENSIFIER_BOOST),
        ("slightly", -INTENSIFIER_BOOST),
        ("somewhat", -INTENSIFIER_BOOST),
        ("barely", -INTENSIFIER_BOOST),
        ("kinda", -INTENSIFIER_BOOST),
    ])
});

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn tokenize(sentence: &str) -> Vec<String> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Valence sum of one tokenized sentence
fn sentence_valence(tokens: &[String]) -> f64 {
    let mut total = 0.0;
    for (i, token) in tokens.iter().enumerate() {
        let Some(&base) = VALENCE.get(token.as_str()) else {
            continue;
        };

        let mut valence = base;
        if let Some(boost) = i
            .checked_sub(1)
            .and_then(|prev| INTENSIFIERS.get(tokens[prev].as_str()))
        {
            valence += boost * valence.signum();
        }

        let window = i.saturating_sub(NEGATION_WINDOW)..i;
        if tokens[window].iter().any(|t| is_negator(t)) {
            valence *= NEGATION_SCALAR;
        }

        total += valence;
    }
    total
}

/// Bucket a valence sum into a 0-4 class
fn valence_class(sum: f64) -> u8 {
    let compound = sum / (sum * sum + ALPHA).sqrt();
    match compound {
        c if c <= -0.6 => 0,
        c if c <= -0.2 => 1,
        c if c < 0.2 => 2,
        c if c < 0.6 => 3,
        _ => 4,
    }
}

/// Per-sentence classes; sentences without any word are not scorable
pub fn sentence_classes(text: &str) -> Vec<u8> {
    split_sentences(text)
        .map(tokenize)
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| valence_class(sentence_valence(&tokens)))
        .collect()
}

/// Rule-based fine-grained backend
#[derive(Debug, Clone, Default)]
pub struct LexiconBackend;

impl LexiconBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SentimentBackend for LexiconBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn is_detailed(&self) -> bool {
        true
    }

    async fn classify(&self, text: &str) -> Result<SentimentLabel, BackendError> {
        let text = require_text(BACKEND_NAME, text)?;

        let classes = sentence_classes(text);
        if classes.is_empty() {
            return Err(BackendError::permanent(
                BACKEND_NAME,
                "text has no scorable sentence",
            ));
        }

        let mean = classes.iter().map(|&c| f64::from(c)).sum::<f64>() / classes.len() as f64;
        let class = mean.round().clamp(0.0, 4.0) as u8;

        FineLabel::from_class(class)
            .map(SentimentLabel::Fine)
            .ok_or_else(|| {
                BackendError::permanent(BACKEND_NAME, format!("class {} out of range", class))
            })
    }
}
