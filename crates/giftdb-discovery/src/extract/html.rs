//! Small regex-based HTML helpers shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;

static TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta regex"));

/// Strip tags, decode the common entities, and collapse whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let no_tags = TAGS_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Content of the first `<meta>` whose `key_attr` equals `key_value`.
pub(crate) fn find_meta_content(html: &str, key_attr: &str, key_value: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let key = extract_attr(tag, key_attr)?;
        if key.eq_ignore_ascii_case(key_value) {
            extract_attr(tag, "content").filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(r#"(?is)\b{}\s*=\s*["']([^"']*)["']"#, regex::escape(attr));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag)
        .and_then(|c| c.get(1).map(|m| decode_entities(m.as_str().trim())))
}

/// Resolve `candidate` against `base_url`.
pub(crate) fn absolutize_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.replace("&amp;", "&");
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(&candidate).ok().map(|u| u.to_string())
}
