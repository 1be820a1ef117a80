// tests/cache_ttl.rs
//
// TTL boundaries, stats, invalidation and concurrent use of the score cache,
// driven by a manual clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use likability_analyzer::cache::{ManualClock, ScoreCache};
use likability_analyzer::model::{Breakdown, CompositeResult, SourceCounts};
use likability_analyzer::subject::Subject;

use common::{t0, DAY};

fn result(name: &str, score: f64) -> CompositeResult {
    CompositeResult {
        subject: name.to_lowercase(),
        name: name.to_string(),
        score,
        breakdown: Breakdown::default(),
        trend_delta: None,
        sources: SourceCounts::default(),
        insights: vec![],
        weaknesses: vec![],
        summary: format!("{name} summary"),
        cached: false,
        computed_at: t0(),
    }
}

fn cache_on_clock() -> (ScoreCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    (ScoreCache::with_clock(DAY, clock.clone()), clock)
}

#[test]
fn hit_just_before_expiry_and_miss_just_after() {
    let (cache, clock) = cache_on_clock();
    let s = Subject::parse("Narendra Modi").unwrap();
    cache.set(&s, result("Narendra Modi", 68.5));

    clock.advance(Duration::from_secs(86_399));
    assert!(cache.get(&s).is_some(), "entry must be live at t0+86399");

    clock.advance(Duration::from_secs(2));
    assert!(cache.get(&s).is_none(), "entry must be expired at t0+86401");
    // lazily evicted on that read
    assert_eq!(cache.stats().expired_entries, 0);
}

#[test]
fn keys_are_normalized() {
    let (cache, _clock) = cache_on_clock();
    cache.set(&Subject::parse("  Amit   Shah ").unwrap(), result("Amit Shah", 60.0));
    let hit = cache.get(&Subject::parse("amit shah").unwrap());
    assert_eq!(hit.map(|r| r.score), Some(60.0));
}

#[test]
fn clear_then_stats_reports_zero() {
    let (cache, clock) = cache_on_clock();
    for name in ["A", "B", "C"] {
        cache.set(&Subject::parse(name).unwrap(), result(name, 50.0));
    }
    clock.advance(Duration::from_secs(120));
    let st = cache.stats();
    assert_eq!(st.entry_count, 3);
    assert_eq!(st.oldest_entry_age_secs, Some(120));
    assert_eq!(st.configured_ttl_secs, 86_400);

    assert_eq!(cache.clear(), 3);
    let st = cache.stats();
    assert_eq!(st.entry_count, 0);
    assert_eq!(st.expired_entries, 0);
    assert_eq!(st.oldest_entry_age_secs, None);
}

#[test]
fn stats_count_expired_until_cleanup() {
    let (cache, clock) = cache_on_clock();
    let a = Subject::parse("A").unwrap();
    cache.set_with_ttl(&a, result("A", 50.0), Duration::from_secs(10));
    cache.set(&Subject::parse("B").unwrap(), result("B", 50.0));

    clock.advance(Duration::from_secs(11));
    let st = cache.stats();
    assert_eq!((st.entry_count, st.expired_entries), (1, 1));

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.stats().expired_entries, 0);
    assert!(!cache.delete(&a));
    assert!(cache.delete(&Subject::parse("b").unwrap()));
}

#[test]
fn overwrite_resets_expiry() {
    let (cache, clock) = cache_on_clock();
    let s = Subject::parse("Yogi Adityanath").unwrap();
    cache.set(&s, result("Yogi Adityanath", 40.0));
    clock.advance(Duration::from_secs(80_000));
    cache.set(&s, result("Yogi Adityanath", 45.0));
    clock.advance(Duration::from_secs(80_000));
    assert_eq!(cache.get(&s).map(|r| r.score), Some(45.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_keys() {
    let (cache, _clock) = cache_on_clock();
    let cache = Arc::new(cache);

    let mut handles = Vec::new();
    for i in 0..32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("Subject {i}");
            let s = Subject::parse(&name).unwrap();
            cache.set(&s, result(&name, i as f64));
            cache.get(&s).map(|r| r.score)
        }));
    }
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.await.unwrap(), Some(i as f64));
    }
    assert_eq!(cache.stats().entry_count, 32);
}
