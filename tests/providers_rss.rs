// tests/providers_rss.rs
//
// Google News RSS provider in fixture mode: parsing, publisher suffixes,
// cross-edition dedup and lexicon scoring. No network.

use likability_analyzer::fetch::rss::{parse_feed, GoogleNewsRss};
use likability_analyzer::fetch::{LexiconFetcher, SignalFetcher, TextProvider};
use likability_analyzer::model::SignalSource;
use likability_analyzer::subject::Subject;

const EN: &str = include_str!("fixtures/google_news_en.xml");
const HI: &str = include_str!("fixtures/google_news_hi.xml");
const NOT_RSS: &str = "<html><body>502 Bad Gateway</body></html>";

fn modi() -> Subject {
    Subject::parse("Narendra Modi").unwrap()
}

#[test]
fn parses_items_and_strips_publisher() {
    let items = parse_feed(EN).expect("parse en fixture");
    // the empty-title item has no text and is skipped
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].title, "Modi inaugurates landmark bridge in Mumbai");
    assert_eq!(items[1].title, "Opposition slams government over scam");
    assert_eq!(
        items[0].link.as_deref(),
        Some("https://news.google.com/rss/articles/abc001")
    );
    assert!(!items[0].text.contains('<'), "markup must be stripped: {}", items[0].text);
    assert!(items[0].text.starts_with("Modi inaugurates landmark bridge in Mumbai. "));
}

#[test]
fn pub_dates_parse_or_fall_back_to_zero() {
    let items = parse_feed(EN).expect("parse en fixture");
    // Wed, 01 Jan 2025 10:00:00 +0000
    assert_eq!(items[0].published_at, 1_735_725_600);
    assert_eq!(items[2].published_at, 0);
}

#[tokio::test]
async fn editions_are_merged_and_deduplicated_by_link() {
    let rss = GoogleNewsRss::from_fixtures([EN, HI]);
    let items = rss.fetch_items(&modi()).await.expect("fixtures");
    let links: Vec<&str> = items.iter().filter_map(|i| i.link.as_deref()).collect();
    assert_eq!(
        links,
        vec![
            "https://news.google.com/rss/articles/abc001",
            "https://news.google.com/rss/articles/abc002",
            "https://news.google.com/rss/articles/abc003",
            "https://news.google.com/rss/articles/hi0001",
        ]
    );
    assert_eq!(items[3].title, "मोदी की शानदार जीत");
}

#[tokio::test]
async fn one_failed_edition_is_tolerated() {
    let rss = GoogleNewsRss::from_fixtures([NOT_RSS, HI]);
    let texts = rss.collect(&modi()).await.expect("one edition still parses");
    assert_eq!(texts.len(), 2);
}

#[tokio::test]
async fn all_editions_failing_is_an_error() {
    let rss = GoogleNewsRss::from_fixtures([NOT_RSS, NOT_RSS]);
    assert!(rss.collect(&modi()).await.is_err());
}

#[tokio::test]
async fn lexicon_fetcher_scores_fixture_headlines() {
    let fetcher = LexiconFetcher::new(GoogleNewsRss::from_fixtures([EN, HI]));
    let r = fetcher.fetch(&modi()).await;
    assert_eq!(r.source, SignalSource::Rss);
    // 2 positive, 1 negative, 1 neutral
    assert_eq!(r.score, Some(62.5));
    assert_eq!(r.raw_count, 4);
}

#[tokio::test]
async fn unreachable_feed_yields_absent_signal() {
    let fetcher = LexiconFetcher::new(GoogleNewsRss::from_fixtures([NOT_RSS]));
    let r = fetcher.fetch(&modi()).await;
    assert_eq!(r.source, SignalSource::Rss);
    assert!(!r.is_present());
    assert_eq!(r.score, None);
}
