// src/subject.rs
//! Normalized subject identifiers.
//!
//! The key (trimmed, whitespace-collapsed, lower-cased) is what the cache and
//! the score history are keyed by; the display form keeps the caller's casing
//! and is what fetchers query with.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::LikabilityError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    key: String,
    display: String,
}

impl Subject {
    /// Normalize a raw name. Blank input is rejected.
    pub fn parse(raw: &str) -> Result<Self, LikabilityError> {
        let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if display.is_empty() {
            return Err(LikabilityError::InvalidSubject);
        }
        let key = display.to_lowercase();
        Ok(Self { key, display })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Short anonymized id for logs. Never log the raw name.
    pub fn anon_id(&self) -> String {
        let digest = Sha256::digest(self.key.as_bytes());
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
