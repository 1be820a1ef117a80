use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Per-source classification counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }

    /// `((pos - neg) / total + 1) * 50`, one decimal. `None` when nothing was classified.
    pub fn score(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let raw = (self.positive as f64 - self.negative as f64) / total as f64;
        let s = ((raw + 1.0) * 50.0).clamp(0.0, 100.0);
        Some((s * 10.0).round() / 10.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Lexicon score for a single token (0 when unknown).
    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (score, token count).
    /// Negation: a negator within the previous 1..=3 tokens flips the sign
    /// of the word's lexicon score.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let w = tokens[i].as_str();
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

            let base = self.word_score(w);
            if base != 0 {
                score += if negated { -base } else { base };
            }
        }

        (score, tokens.len())
    }

    pub fn classify(&self, text: &str) -> Polarity {
        match self.score_text(text).0 {
            s if s > 0 => Polarity::Positive,
            s if s < 0 => Polarity::Negative,
            _ => Polarity::Neutral,
        }
    }

    /// Classify every non-empty text and count polarities.
    pub fn tally<'a, I>(&self, texts: I) -> Tally
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut t = Tally::default();
        for text in texts.into_iter().filter(|t| !t.trim().is_empty()) {
            match self.classify(text) {
                Polarity::Positive => t.positive += 1,
                Polarity::Negative => t.negative += 1,
                Polarity::Neutral => t.neutral += 1,
            }
        }
        t
    }
}

/// Lower-cased tokens split on whitespace and punctuation. Apostrophes stay
/// inside words ("isn't") and Devanagari vowel signs stay attached.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| {
        c.is_whitespace()
            || matches!(c, '\u{0964}' | '\u{0965}' | '"' | '\u{201C}' | '\u{201D}')
            || (c.is_ascii_punctuation() && c != '\'')
    })
    .map(|t| t.trim_matches('\''))
    .filter(|t| !t.is_empty())
    .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "नहीं"
    )
}
