//! Query parameter merging and URL generation.
use std::fmt;

use url::{form_urlencoded, Url};

use crate::domain::TokenError;

/// Name of the query parameter carrying a token hash.
pub const TOKEN_PARAMETER: &str = "payum_token";

/// Ordered query parameters.
///
/// A `None` value marks the parameter for removal when merged into a URL.
/// Repeated names are kept as multi-value parameters. Parameters parsed from
/// an existing query keep their original text and are written back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    name: String,
    value: Option<String>,
    raw: Option<String>,
}

impl Param {
    fn encoded(&self) -> Option<String> {
        match (&self.raw, &self.value) {
            (Some(raw), _) => Some(raw.clone()),
            (None, Some(value)) => Some(
                form_urlencoded::Serializer::new(String::new())
                    .append_pair(&self.name, value)
                    .finish(),
            ),
            (None, None) => None,
        }
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a form-encoded query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let params = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| {
                form_urlencoded::parse(segment.as_bytes())
                    .next()
                    .map(|(name, value)| Param {
                        name: name.into_owned(),
                        value: Some(value.into_owned()),
                        raw: Some(segment.to_string()),
                    })
            })
            .collect();
        QueryParams { params }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, Some(value.into()));
        self
    }

    /// Explicitly unsets `name`: once merged, the parameter is absent from the URL.
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.push(name, None);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.params.push(Param {
            name: name.into(),
            value,
            raw: None,
        });
    }

    /// Drops every entry named `name`, set or unset.
    pub fn remove(&mut self, name: &str) {
        self.params.retain(|p| p.name != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    /// First value set for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name && p.value.is_some())
            .and_then(|p| p.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Merges `overrides` on top of these parameters.
    ///
    /// A name already present here has all its entries replaced by the
    /// overriding ones, at the position of its first entry. Every other
    /// overriding entry is appended in its own order, repeats included.
    /// Unset entries are dropped from the result.
    pub fn merge(mut self, overrides: &QueryParams) -> QueryParams {
        let mut replaced: Vec<&str> = Vec::new();
        let mut appended: Vec<Param> = Vec::new();
        for param in &overrides.params {
            if replaced.contains(&param.name.as_str()) {
                continue;
            }
            match self.params.iter().position(|p| p.name == param.name) {
                Some(position) => {
                    replaced.push(&param.name);
                    let replacement = overrides
                        .params
                        .iter()
                        .filter(|p| p.name == param.name)
                        .cloned();
                    self.remove(&param.name);
                    let tail = self.params.split_off(position);
                    self.params.extend(replacement);
                    self.params.extend(tail);
                }
                None => appended.push(param.clone()),
            }
        }
        self.params.extend(appended);
        self.params.retain(|p| p.value.is_some());
        self
    }

    /// Encodes the set parameters; unset ones are skipped. Parsed parameters
    /// are written as they were read.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .filter(|p| p.value.is_some())
            .filter_map(Param::encoded)
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (name, value) in iter {
            params.push(name, Some(value.into()));
        }
        params
    }
}

/// Turns an application path and its query parameters into a URL.
#[cfg_attr(test, mockall::automock)]
pub trait UrlGenerator {
    fn generate_url(&self, path: &str, parameters: &QueryParams) -> String;
}

/// Generates `base/path?query`, or `path?query` without a base URL.
#[derive(Debug, Clone, Default)]
pub struct PlainUrlGenerator {
    base_url: Option<String>,
}

impl PlainUrlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        PlainUrlGenerator {
            base_url: Some(base_url.into()),
        }
    }
}

impl UrlGenerator for PlainUrlGenerator {
    fn generate_url(&self, path: &str, parameters: &QueryParams) -> String {
        let mut url = match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        };
        let query = parameters.to_query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

fn is_absolute(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Splits a relative reference into path, query and fragment.
fn split_reference(reference: &str) -> (&str, &str, Option<&str>) {
    let (rest, fragment) = match reference.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (reference, None),
    };
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    (path, query, fragment)
}

/// Rebuilds `path` with its query replaced by `merge(existing query)`.
///
/// Absolute http(s) URLs are rewritten in place; anything else goes through
/// `generator`. Fragments survive untouched and an empty query leaves no `?`.
pub(crate) fn rewrite_query<G, F>(
    generator: &G,
    path: &str,
    merge: F,
) -> Result<String, TokenError>
where
    G: UrlGenerator + ?Sized,
    F: FnOnce(QueryParams) -> QueryParams,
{
    if is_absolute(path) {
        let mut url = Url::parse(path)?;
        let query = merge(QueryParams::parse(url.query().unwrap_or(""))).to_query_string();
        url.set_query(if query.is_empty() { None } else { Some(query.as_str()) });
        return Ok(url.into());
    }

    let (bare, query, fragment) = split_reference(path);
    let mut url = generator.generate_url(bare, &merge(QueryParams::parse(query)));
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    Ok(url)
}

/// Path component of an absolute URL or of a relative reference, rooted at
/// `/` so `capture` and `/capture` compare equal.
pub(crate) fn path_of(reference: &str) -> String {
    match Url::parse(reference) {
        Ok(url) => url.path().to_string(),
        Err(_) => format!("/{}", split_reference(reference).0.trim_start_matches('/')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_order_and_repeats() {
        let params = QueryParams::parse("b=2&a=1&b=3");

        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("b", Some("2")), ("a", Some("1")), ("b", Some("3"))]
        );
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn test_merge_appends_new_names_in_order() {
        let merged = QueryParams::parse("foo=fooVal")
            .merge(&QueryParams::new().with("target", "val").with("other", "x"));

        assert_eq!(merged.to_query_string(), "foo=fooVal&target=val&other=x");
    }

    #[test]
    fn test_merge_replaces_in_place() {
        let merged =
            QueryParams::parse("a=1&b=2&a=3&c=4").merge(&QueryParams::new().with("a", "9"));

        assert_eq!(merged.to_query_string(), "a=9&b=2&c=4");
    }

    #[test]
    fn test_merge_keeps_untouched_multi_values() {
        let merged =
            QueryParams::parse("tag=x&tag=y").merge(&QueryParams::new().with("page", "2"));

        assert_eq!(merged.to_query_string(), "tag=x&tag=y&page=2");
    }

    #[test]
    fn test_merge_multi_value_override() {
        let overrides = QueryParams::new().with("tag", "a").with("tag", "b");

        let merged = QueryParams::parse("first=1&tag=x&last=2").merge(&overrides);

        assert_eq!(merged.to_query_string(), "first=1&tag=a&tag=b&last=2");
    }

    #[test]
    fn test_merge_unset_removes() {
        let merged = QueryParams::parse("payum_token=foo&keep=1")
            .merge(&QueryParams::new().unset(TOKEN_PARAMETER));

        assert_eq!(merged.to_query_string(), "keep=1");
        assert!(!merged.contains(TOKEN_PARAMETER));
    }

    #[test]
    fn test_query_string_is_form_encoded() {
        let params = QueryParams::new().with("q", "a b&c").unset("gone");

        assert_eq!(params.to_query_string(), "q=a+b%26c");
        assert_eq!(params.to_string(), "q=a+b%26c");
    }

    #[test]
    fn test_from_iterator() {
        let params: QueryParams = vec![("a", "1"), ("b", "2")].into_iter().collect();

        assert_eq!(params.to_query_string(), "a=1&b=2");
    }

    #[test]
    fn test_plain_generator_without_base() {
        let generator = PlainUrlGenerator::new();

        assert_eq!(
            generator.generate_url("capture", &QueryParams::new().with("a", "1")),
            "capture?a=1"
        );
        assert_eq!(generator.generate_url("capture", &QueryParams::new()), "capture");
    }

    #[test]
    fn test_plain_generator_joins_base() {
        let generator = PlainUrlGenerator::with_base_url("http://shop.example/");

        assert_eq!(
            generator.generate_url("/payment/capture", &QueryParams::new().with("a", "1")),
            "http://shop.example/payment/capture?a=1"
        );
    }

    #[test]
    fn test_rewrite_absolute_url_normalizes_bare_host() {
        let generator = MockUrlGenerator::new();

        let url = rewrite_query(&generator, "http://google.com?foo=fooVal", |existing| {
            existing.merge(&QueryParams::new().with("target", "val"))
        })
        .unwrap();

        assert_eq!(url, "http://google.com/?foo=fooVal&target=val");
    }

    #[test]
    fn test_rewrite_absolute_url_drops_empty_query() {
        let generator = MockUrlGenerator::new();

        let url = rewrite_query(&generator, "http://google.com/?payum_token=foo", |existing| {
            existing.merge(&QueryParams::new().unset(TOKEN_PARAMETER))
        })
        .unwrap();

        assert_eq!(url, "http://google.com/");
    }

    #[test]
    fn test_rewrite_relative_path_keeps_fragment() {
        let mut generator = MockUrlGenerator::new();
        generator
            .expect_generate_url()
            .times(1)
            .withf(|path, params| path == "done" && params.get("foo") == Some("fooVal"))
            .returning(|path, params| format!("{}?{}", path, params));

        let url = rewrite_query(&generator, "done?foo=fooVal#top", |existing| existing).unwrap();

        assert_eq!(url, "done?foo=fooVal#top");
    }

    #[test]
    fn test_rewrite_invalid_absolute_url() {
        let generator = MockUrlGenerator::new();

        let result = rewrite_query(&generator, "http://[broken", |existing| existing);

        assert!(matches!(result, Err(TokenError::InvalidUrl(_))));
    }

    #[test]
    fn test_path_of() {
        assert_eq!(path_of("http://example.com/capture?payum_token=x"), "/capture");
        assert_eq!(path_of("capture?payum_token=x#frag"), "/capture");
        assert_eq!(path_of("/capture"), "/capture");
    }

    #[test]
    fn test_merge_keeps_interleaved_names_in_order() {
        let merged = QueryParams::new()
            .with(TOKEN_PARAMETER, "hash")
            .merge(&QueryParams::parse("a=1&b=2&a=3"))
            .merge(&QueryParams::new().with("x", "1").with("y", "2").with("x", "3"));

        assert_eq!(
            merged.to_query_string(),
            "payum_token=hash&a=1&b=2&a=3&x=1&y=2&x=3"
        );
    }

    #[test]
    fn test_untouched_parameters_keep_original_text() {
        let params = QueryParams::parse("q=a%20b&flag&s=x;y");

        assert_eq!(params.get("q"), Some("a b"));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(
            params.merge(&QueryParams::new().with("n", "a b")).to_query_string(),
            "q=a%20b&flag&s=x;y&n=a+b"
        );
    }

    #[test]
    fn test_rewrite_absolute_url_without_overrides_is_verbatim() {
        let generator = MockUrlGenerator::new();
        let after = "http://e.com/done?q=a%20b&flag&s=x;y#frag";

        let url = rewrite_query(&generator, after, |existing| {
            existing.merge(&QueryParams::new())
        })
        .unwrap();

        assert_eq!(url, after);
    }

    #[test]
    fn test_rewrite_detects_scheme_case_insensitively() {
        let mut generator = MockUrlGenerator::new();
        generator.expect_generate_url().never();

        let url = rewrite_query(&generator, "HTTPS://Shop.Example/pay", |existing| {
            existing.merge(&QueryParams::new().with("a", "1"))
        })
        .unwrap();

        assert_eq!(url, "https://shop.example/pay?a=1");
    }
}
