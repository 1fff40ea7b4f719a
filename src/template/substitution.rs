//! Placeholder substitution engine.
//!
//! Text is scanned once for `{{name}}` and `{{url:name}}` tags and every tag
//! with a value is replaced. Values are copied into the output verbatim and
//! are never scanned again, so `$1`, backslashes or even `{{other}}` inside a
//! value come out exactly as given.

use std::collections::BTreeSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use super::placeholders::Placeholders;
use crate::error::{EngineError, Result};

/// Marker for tags whose value is percent-encoded
pub const URL_TAG_PREFIX: &str = "url:";

/// Everything except the RFC 3986 unreserved characters
const URL_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"\{\{(url:)?([^{}]+)\}\}").unwrap();
}

/// Charset used to percent-encode `{{url:...}}` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlCharset {
    Utf8,
    Latin1,
}

impl FromStr for UrlCharset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(UrlCharset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" => Ok(UrlCharset::Latin1),
            other => Err(EngineError::Encoding(format!(
                "Unsupported URL encoding charset: {}",
                other
            ))),
        }
    }
}

impl UrlCharset {
    /// Percent-encode `value` in this charset
    pub fn encode(self, value: &str) -> Result<String> {
        match self {
            UrlCharset::Utf8 => Ok(percent_encode(value.as_bytes(), URL_VALUE).to_string()),
            UrlCharset::Latin1 => {
                let bytes = value
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)))
                    .collect::<std::result::Result<Vec<u8>, _>>()
                    .map_err(|_| {
                        EngineError::Encoding(format!(
                            "Value is not representable in ISO-8859-1: {:?}",
                            value
                        ))
                    })?;
                Ok(percent_encode(&bytes, URL_VALUE).to_string())
            }
        }
    }
}

/// Collect the names of all tags in `text`, with the `url:` marker stripped
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    TAG_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

/// Renders template text against placeholder values
#[derive(Debug, Clone)]
pub struct PlaceholderEngine {
    charset_name: String,
    charset: Option<UrlCharset>,
}

impl Default for PlaceholderEngine {
    fn default() -> Self {
        Self {
            charset_name: "UTF-8".to_string(),
            charset: Some(UrlCharset::Utf8),
        }
    }
}

impl PlaceholderEngine {
    /// Create an engine encoding URL values in `charset`.
    ///
    /// An unsupported charset is reported by the first render that needs to
    /// encode a value, not here.
    pub fn new(charset: &str) -> Self {
        let parsed = charset.parse().ok();
        if parsed.is_none() {
            tracing::warn!(charset = %charset, "Unsupported URL encoding charset configured");
        }
        Self {
            charset_name: charset.to_string(),
            charset: parsed,
        }
    }

    /// Substitute every tag that has a value; tags without one stay as-is
    pub fn render(&self, text: &str, values: &Placeholders) -> Result<String> {
        let mut rendered = String::with_capacity(text.len());
        let mut last_end = 0;

        for caps in TAG_PATTERN.captures_iter(text) {
            let (Some(tag), Some(name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };

            rendered.push_str(&text[last_end..tag.start()]);
            match values.get(name.as_str()) {
                Some(value) if caps.get(1).is_some() => {
                    rendered.push_str(&self.url_encode(name.as_str(), value)?);
                }
                Some(value) => rendered.push_str(value),
                None => rendered.push_str(tag.as_str()),
            }
            last_end = tag.end();
        }

        rendered.push_str(&text[last_end..]);
        Ok(rendered)
    }

    /// Render optional text, skipping it entirely when absent
    pub fn render_optional(
        &self,
        text: Option<&str>,
        values: &Placeholders,
    ) -> Result<Option<String>> {
        text.map(|t| self.render(t, values)).transpose()
    }

    fn url_encode(&self, name: &str, value: &str) -> Result<String> {
        let charset = self.charset.ok_or_else(|| {
            EngineError::Encoding(format!(
                "Cannot encode placeholder '{}': unsupported charset {}",
                name, self.charset_name
            ))
        })?;
        charset.encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> Placeholders {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_substitute_simple() {
        let engine = PlaceholderEngine::default();
        assert_eq!(engine.render("{{a}}", &values(&[("a", "x")])).unwrap(), "x");
        assert_eq!(
            engine
                .render("Hello, {{name}}!", &values(&[("name", "World")]))
                .unwrap(),
            "Hello, World!"
        );
    }

    #[test]
    fn test_substitute_multiple() {
        let engine = PlaceholderEngine::default();
        let rendered = engine
            .render(
                "Your order {{order_id}} is being delivered by {{carrier}} ({{order_id}})",
                &values(&[("order_id", "ORD-123"), ("carrier", "FedEx")]),
            )
            .unwrap();
        assert_eq!(
            rendered,
            "Your order ORD-123 is being delivered by FedEx (ORD-123)"
        );
    }

    #[test]
    fn test_url_tag_is_percent_encoded() {
        let engine = PlaceholderEngine::default();
        assert_eq!(
            engine.render("{{url:a}}", &values(&[("a", "a b")])).unwrap(),
            "a%20b"
        );
        assert_eq!(
            engine
                .render("{{url:link}}", &values(&[("link", "http://a?b=c")]))
                .unwrap(),
            "http%3A%2F%2Fa%3Fb%3Dc"
        );
        assert_eq!(
            engine.render("{{url:a}}", &values(&[("a", "é-_.~")])).unwrap(),
            "%C3%A9-_.~"
        );
    }

    #[test]
    fn test_url_and_plain_tags_share_a_value() {
        let engine = PlaceholderEngine::default();
        let rendered = engine
            .render("{{code}} / {{url:code}}", &values(&[("code", "a&b")]))
            .unwrap();
        assert_eq!(rendered, "a&b / a%26b");
    }

    #[test]
    fn test_missing_tag_left_untouched() {
        let engine = PlaceholderEngine::default();
        assert_eq!(
            engine.render("{{missing}}", &Placeholders::new()).unwrap(),
            "{{missing}}"
        );
        assert_eq!(
            engine
                .render("{{url:missing}} {{a}}", &values(&[("a", "x")]))
                .unwrap(),
            "{{url:missing}} x"
        );
    }

    #[test]
    fn test_replacement_metacharacters_are_literal() {
        let engine = PlaceholderEngine::default();
        assert_eq!(
            engine.render("{{a}}", &values(&[("a", "$1\\x")])).unwrap(),
            "$1\\x"
        );
        assert_eq!(
            engine.render("{{a}}", &values(&[("a", "${b}$$")])).unwrap(),
            "${b}$$"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let engine = PlaceholderEngine::default();
        let rendered = engine
            .render("{{a}}-{{b}}", &values(&[("a", "{{b}}"), ("b", "B")]))
            .unwrap();
        assert_eq!(rendered, "{{b}}-B");
    }

    #[test]
    fn test_text_without_tags_is_unchanged() {
        let engine = PlaceholderEngine::default();
        let text = "No tags here, just { braces } and }} stray {{";
        assert_eq!(engine.render(text, &values(&[("a", "x")])).unwrap(), text);
    }

    #[test]
    fn test_render_optional_skips_absent_text() {
        let engine = PlaceholderEngine::default();
        assert_eq!(
            engine.render_optional(None, &values(&[("a", "x")])).unwrap(),
            None
        );
        assert_eq!(
            engine
                .render_optional(Some("{{a}}"), &values(&[("a", "x")]))
                .unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_unsupported_charset_fails_render() {
        let engine = PlaceholderEngine::new("EBCDIC");
        assert!(matches!(
            engine.render("{{url:a}}", &values(&[("a", "x")])),
            Err(EngineError::Encoding(_))
        ));
        // Plain tags never need the charset
        assert_eq!(engine.render("{{a}}", &values(&[("a", "x")])).unwrap(), "x");
    }

    #[test]
    fn test_latin1_encoding() {
        let engine = PlaceholderEngine::new("ISO-8859-1");
        assert_eq!(
            engine.render("{{url:a}}", &values(&[("a", "é")])).unwrap(),
            "%E9"
        );
        assert!(matches!(
            engine.render("{{url:a}}", &values(&[("a", "日本")])),
            Err(EngineError::Encoding(_))
        ));
    }

    #[test]
    fn test_extract_tags() {
        let tags = extract_tags("Hi {{name}}, click {{url:link}} or {{link}}. {{name}}");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["link".to_string(), "name".to_string()]
        );
        assert!(extract_tags("plain text").is_empty());
    }
}
