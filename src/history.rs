//! history.rs: in-memory log of trend-free base scores per subject, used for
//! the trend delta. Subjects idle past a retention window are pruned.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::subject::Subject;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub ts_unix: i64,
    pub score: f64,
}

#[derive(Debug)]
pub struct ScoreHistory {
    inner: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
    cap: usize,
}

impl Default for ScoreHistory {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl ScoreHistory {
    /// `cap` bounds the entries kept per subject (1..=1000).
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            cap: cap.clamp(1, 1000),
        }
    }

    pub fn push(&self, subject: &Subject, score: f64, at: DateTime<Utc>) {
        let mut map = self.inner.lock().expect("history mutex poisoned");
        let q = map.entry(subject.key().to_string()).or_default();
        q.push_back(HistoryEntry {
            ts_unix: at.timestamp(),
            score,
        });
        while q.len() > self.cap {
            q.pop_front();
        }
    }

    /// Most recent recorded score, if any.
    pub fn last_score(&self, subject: &Subject) -> Option<f64> {
        let map = self.inner.lock().expect("history mutex poisoned");
        map.get(subject.key())
            .and_then(|q| q.back())
            .map(|e| e.score)
    }

    /// Drop every subject whose newest entry is older than `cutoff`.
    /// Returns how many subjects were removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let cutoff = cutoff.timestamp();
        let mut map = self.inner.lock().expect("history mutex poisoned");
        let before = map.len();
        map.retain(|_, q| q.back().is_some_and(|e| e.ts_unix >= cutoff));
        before - map.len()
    }

    pub fn subject_count(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").len()
    }

    pub fn snapshot_last_n(&self, subject: &Subject, n: usize) -> Vec<HistoryEntry> {
        let map = self.inner.lock().expect("history mutex poisoned");
        match map.get(subject.key()) {
            Some(q) => {
                let start = q.len().saturating_sub(n);
                q.iter().skip(start).cloned().collect()
            }
            None => Vec::new(),
        }
    }
}
