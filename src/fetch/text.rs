// src/fetch/text.rs
use once_cell::sync::Lazy;
use regex::Regex;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Max characters kept per collected text.
pub const MAX_TEXT_CHARS: usize = 500;

/// Clean one headline/post for scoring: decode entities, strip tags, unify
/// quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    out = RE_TAGS.replace_all(&out, " ").to_string();

    // “ ” « » → ", ‘ ’ → '
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    out = RE_WS.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Join a title and an optional body into one scoring text.
pub fn join_title_body(title: &str, body: Option<&str>) -> String {
    let title = normalize_text(title);
    let body = body.map(normalize_text).unwrap_or_default();
    match (title.is_empty(), body.is_empty()) {
        (true, true) => String::new(),
        (false, true) => title,
        (true, false) => body,
        (false, false) => normalize_text(&format!("{title}. {body}")),
    }
}

/// Google News titles end in " - Publisher"; drop the suffix.
pub fn strip_publisher_suffix(title: &str) -> &str {
    match title.rsplit_once(" - ") {
        Some((head, _)) if !head.trim().is_empty() => head,
        _ => title,
    }
}
