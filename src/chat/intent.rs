// src/chat/intent.rs
//! Rule-based intent classification for chat messages.
//!
//! No model call: help keywords, comparison patterns, single-subject patterns
//! and bare names. Known figures are resolved through an alias table, exactly
//! or by Jaro-Winkler similarity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a fuzzy alias hit.
pub const FUZZY_THRESHOLD: f64 = 0.92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Analyze,
    Compare,
    Help,
    Chat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Analyze => "analyze",
            Action::Compare => "compare",
            Action::Help => "help",
            Action::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: Action,
    /// Resolved display names in the order they were mentioned.
    pub subjects: Vec<String>,
    /// Acknowledgement shown to the user.
    pub response: String,
}

const CANONICAL: &[&str] = &[
    "Narendra Modi",
    "Rahul Gandhi",
    "Amit Shah",
    "Arvind Kejriwal",
    "Yogi Adityanath",
    "Mamata Banerjee",
    "M.K. Stalin",
    "Uddhav Thackeray",
    "Nitish Kumar",
    "K.T. Rama Rao",
    "Harish Rao",
    "Revanth Reddy",
    "Chandrababu Naidu",
    "Jagan Mohan Reddy",
    "Akhilesh Yadav",
];

const ALIASES: &[(&str, &str)] = &[
    ("modi", "Narendra Modi"),
    ("namo", "Narendra Modi"),
    ("pm modi", "Narendra Modi"),
    ("rahul", "Rahul Gandhi"),
    ("shah", "Amit Shah"),
    ("kejriwal", "Arvind Kejriwal"),
    ("yogi", "Yogi Adityanath"),
    ("mamata", "Mamata Banerjee"),
    ("didi", "Mamata Banerjee"),
    ("stalin", "M.K. Stalin"),
    ("mk stalin", "M.K. Stalin"),
    ("uddhav", "Uddhav Thackeray"),
    ("nitish", "Nitish Kumar"),
    ("ktr", "K.T. Rama Rao"),
    ("kt rama rao", "K.T. Rama Rao"),
    ("harish", "Harish Rao"),
    ("revanth", "Revanth Reddy"),
    ("naidu", "Chandrababu Naidu"),
    ("cbn", "Chandrababu Naidu"),
    ("jagan", "Jagan Mohan Reddy"),
    ("akhilesh", "Akhilesh Yadav"),
];

/// Words that never start a bare-name message.
const NOT_NAMES: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank", "ok", "okay", "yes", "no", "bye", "good", "cool",
    "who", "what", "why", "when", "where", "how", "which", "can", "do", "does", "is", "are",
    "tell", "i", "you", "please",
];

static RE_HELP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:help|\?|commands|usage|what can you do|how does this work|how do i use this)\b")
        .expect("static regex")
});
static RE_COMPARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:compare|comparison (?:of|between)|rank)\s+(?:between\s+)?(.+)$")
        .expect("static regex")
});
static RE_WHO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:who(?:'s| is)\s+(?:better|more popular|more liked|ahead|leading|winning)|which is better|who wins)\s*[-:,]?\s*(?:between\s+)?(.+)$",
    )
    .expect("static regex")
});
static RE_SINGLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:how is|how's|how are|what about|tell me about|analy[sz]e|score (?:for|of)|likability of|what do people think (?:of|about)|how popular is|check)\s+(.+?)(?:\s+(?:doing|performing|perceived|popular|liked|these days|now))*$",
    )
    .expect("static regex")
});
static RE_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:,|&|\bvs\.?(?:\s|$)|\bversus\b|\band\b|\bor\b|\bwith\b)\s*").expect("static regex")
});
static RE_VS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:vs\.?|versus)(?:\s|$)").expect("static regex"));

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, message: &str) -> Intent {
        let msg = message.trim();
        let msg = msg.trim_end_matches(['?', '!', '.']).trim();

        if msg.is_empty() || RE_HELP.is_match(msg) {
            return help_intent();
        }

        let captured = RE_COMPARE
            .captures(msg)
            .or_else(|| RE_WHO.captures(msg))
            .or_else(|| RE_SINGLE.captures(msg))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        let names = match captured {
            Some(list) => self.split_names(&list),
            None if RE_VS.is_match(msg) => self.split_names(msg),
            None => self.bare_name(msg).into_iter().collect(),
        };
        intent_for(names)
    }

    /// Canonical display name for a mention: alias table first (exact, then
    /// fuzzy), otherwise the mention itself with whitespace collapsed.
    pub fn resolve(&self, mention: &str) -> String {
        let cleaned = mention
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '-' || c == ':')
            .trim();
        let cleaned = cleaned
            .strip_suffix("'s")
            .or_else(|| cleaned.strip_suffix("\u{2019}s"))
            .unwrap_or(cleaned);
        let display = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        let key = display.to_lowercase().replace('.', " ");
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");

        if let Some((_, canon)) = ALIASES.iter().find(|(a, _)| *a == key) {
            return canon.to_string();
        }
        if let Some(canon) = CANONICAL.iter().find(|c| canonical_key(c) == key) {
            return canon.to_string();
        }

        let best = ALIASES
            .iter()
            .map(|(a, c)| (jaro_winkler(a, &key), *c))
            .chain(CANONICAL.iter().map(|c| (jaro_winkler(&canonical_key(c), &key), *c)))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        match best {
            Some((sim, canon)) if sim >= FUZZY_THRESHOLD => canon.to_string(),
            _ => display,
        }
    }

    fn split_names(&self, list: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for part in RE_SPLIT.split(list) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let name = self.resolve(part);
            if !name.is_empty() && !out.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                out.push(name);
            }
        }
        out
    }

    /// A message that is only a name: a known alias, or 1-4 capitalized words.
    fn bare_name(&self, msg: &str) -> Option<String> {
        let resolved = self.resolve(msg);
        if CANONICAL.contains(&resolved.as_str()) {
            return Some(resolved);
        }
        let words: Vec<&str> = msg.split_whitespace().collect();
        if words.is_empty() || words.len() > 4 {
            return None;
        }
        let first = words[0].to_lowercase();
        if NOT_NAMES.contains(&first.as_str()) {
            return None;
        }
        let capitalized = words.iter().all(|w| {
            w.chars()
                .next()
                .map(|c| c.is_uppercase() || !c.is_alphabetic())
                .unwrap_or(false)
        });
        capitalized.then_some(resolved)
    }
}

fn canonical_key(name: &str) -> String {
    name.to_lowercase()
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn help_intent() -> Intent {
    Intent {
        action: Action::Help,
        subjects: vec![],
        response: "Here is what I can do.".to_string(),
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

fn intent_for(names: Vec<String>) -> Intent {
    match names.len() {
        0 => Intent {
            action: Action::Chat,
            subjects: vec![],
            response: "I'm a likability analysis assistant. Ask me about a public figure, \
                       for example \"How is Modi doing?\" or \"Compare Yogi and Akhilesh\"."
                .to_string(),
        },
        1 => Intent {
            action: Action::Analyze,
            response: format!("Let me analyze {}'s public perception for you!", names[0]),
            subjects: names,
        },
        _ => Intent {
            action: Action::Compare,
            response: format!("I'll compare {} for you!", join_names(&names)),
            subjects: names,
        },
    }
}
