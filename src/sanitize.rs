use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::{Builder, UrlRelative};
use html_escape::decode_html_entities;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Elements whose content is dropped along with the element, whatever the
/// policy says.
const ALWAYS_STRIPPED: [&str; 2] = ["script", "style"];

/// Attributes holding a URL that must pass the scheme check.
const URL_ATTRIBUTES: [&str; 2] = ["href", "src"];

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z][a-z0-9+.\-]*):").expect("url scheme pattern"));

static SCHEME_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z][a-z0-9+.\-]*):").expect("scheme candidate pattern"));

static MEDIA_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:img|hr|br|input|table)\b").expect("media pattern"));

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Allow-lists applied by [`sanitize`].
///
/// Elements not in `tags` are removed but keep their text, except those in
/// `strip_content_tags` (and always `script`/`style`), which disappear with
/// their content. `href`/`src` values whose scheme is not in `url_schemes`
/// are replaced by `neutral_url` so the element stays but goes nowhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SanitizePolicy {
    pub tags: Vec<String>,
    pub attributes: Vec<String>,
    pub url_schemes: Vec<String>,
    pub forbidden_attributes: Vec<String>,
    pub strip_content_tags: Vec<String>,
    pub neutral_url: String,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            tags: strings(&[
                "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "strong", "em", "del", "ins", "ul",
                "ol", "li", "a", "img", "blockquote", "hr", "table", "thead", "tbody", "tr", "th",
                "td", "pre", "code", "div", "span", "input",
            ]),
            attributes: strings(&[
                "href", "src", "alt", "title", "class", "disabled", "checked", "type",
            ]),
            url_schemes: strings(&["http", "https", "ftp", "mailto", "tel", "callto", "sms"]),
            forbidden_attributes: strings(&[
                "onclick",
                "onload",
                "onerror",
                "onmouseover",
                "onfocus",
                "onblur",
            ]),
            strip_content_tags: strings(&["script", "style"]),
            neutral_url: "#".to_string(),
        }
    }
}

impl SanitizePolicy {
    /// Build the ammonia cleaner for this policy.
    pub fn builder(&self) -> Builder<'_> {
        let stripped: HashSet<&str> = ALWAYS_STRIPPED
            .into_iter()
            .chain(self.strip_content_tags.iter().map(String::as_str))
            .collect();
        let tags: HashSet<&str> = self
            .tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !stripped.contains(tag))
            .collect();
        let attributes: HashSet<&str> = self
            .attributes
            .iter()
            .map(String::as_str)
            .filter(|attr| !self.is_forbidden_attribute(attr))
            .collect();
        let schemes: HashSet<&str> = self.url_schemes.iter().map(String::as_str).collect();

        let url_schemes: Vec<String> = self
            .url_schemes
            .iter()
            .map(|scheme| scheme.to_ascii_lowercase())
            .collect();
        let neutral_url = self.neutral_url.clone();

        let mut builder = Builder::default();
        builder
            .tags(tags)
            .clean_content_tags(stripped)
            .tag_attributes(HashMap::new())
            .generic_attributes(attributes)
            .url_schemes(schemes)
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true)
            .attribute_filter(move |element, attribute, value| {
                if is_event_handler(attribute) {
                    return None;
                }
                if URL_ATTRIBUTES.contains(&attribute) && !url_allowed(value, &url_schemes) {
                    debug!(element, attribute, "neutralized disallowed url");
                    return Some(Cow::Owned(neutral_url.clone()));
                }
                Some(Cow::Borrowed(value))
            });
        builder
    }

    fn is_forbidden_attribute(&self, attribute: &str) -> bool {
        is_event_handler(attribute)
            || self
                .forbidden_attributes
                .iter()
                .any(|forbidden| forbidden.eq_ignore_ascii_case(attribute))
    }
}

/// Filter an HTML fragment through `policy`.
///
/// This is the trust boundary between rendered Markdown, which passes raw
/// HTML through, and the page that displays it.
///
/// Never fails: anything not allowed is dropped or neutralized. Returns an
/// empty string when nothing survives.
pub fn sanitize(html: &str, policy: &SanitizePolicy) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    // ammonia drops URL attributes with unknown schemes before the attribute
    // filter sees them. Registering every scheme the input could spell out,
    // including behind character references or embedded whitespace, lets the
    // filter rewrite those values to the neutral URL instead.
    let decoded: String = decode_html_entities(html)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let candidates: HashSet<String> = [html, decoded.as_str()]
        .into_iter()
        .flat_map(|text| SCHEME_CANDIDATE.captures_iter(text))
        .map(|caps| caps[1].to_ascii_lowercase())
        .collect();

    let mut builder = policy.builder();
    builder.add_url_schemes(candidates.iter().map(String::as_str));
    builder.clean(html).to_string()
}

/// Whether a fragment shows anything: a media element or visible text.
pub fn has_meaningful_content(html: &str) -> bool {
    MEDIA_ELEMENT.is_match(html) || !ANY_TAG.replace_all(html, "").trim().is_empty()
}

fn is_event_handler(attribute: &str) -> bool {
    attribute.len() > 2
        && attribute
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
}

/// Relative references have no scheme and are always allowed. Whitespace and
/// control characters are ignored so `java\tscript:` is still caught.
fn url_allowed(value: &str, schemes: &[String]) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    match URL_SCHEME.captures(&compact) {
        Some(caps) => schemes.iter().any(|scheme| *scheme == caps[1]),
        None => true,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
