//! Locale canonicalization.
//!
//! Template rows are keyed by locales in `language_COUNTRY` form. Requests
//! arrive with whatever the user claim or event carried (`en-us`, `FR`,
//! `pt_br`), so every locale is normalized before it becomes part of a cache
//! key or store path. Anything that cannot be parsed collapses to the
//! configured default locale.

use lazy_static::lazy_static;
use regex::Regex;

/// Locale used when the configured default is itself invalid
pub const FALLBACK_LOCALE: &str = "en_US";

lazy_static! {
    static ref LOCALE_PATTERN: Regex =
        Regex::new(r"^([a-zA-Z]{2,3})(?:[_-]([a-zA-Z]{2,4}))?$").unwrap();
}

/// Normalize a raw locale string without a fallback.
///
/// Returns `None` when the input does not look like a locale.
pub fn canonicalize(raw: &str) -> Option<String> {
    let captures = LOCALE_PATTERN.captures(raw.trim())?;
    let language = captures.get(1)?.as_str().to_ascii_lowercase();
    let region = captures
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or(&language)
        .to_ascii_uppercase();
    Some(format!("{}_{}", language, region))
}

/// Locale normalizer bound to a default locale
#[derive(Debug, Clone)]
pub struct LocaleNormalizer {
    default_locale: String,
}

impl LocaleNormalizer {
    /// Create a normalizer; an unparseable default becomes [`FALLBACK_LOCALE`]
    pub fn new(default_locale: &str) -> Self {
        let default_locale = match canonicalize(default_locale) {
            Some(locale) => locale,
            None => {
                tracing::warn!(
                    configured = %default_locale,
                    fallback = FALLBACK_LOCALE,
                    "Configured default locale is invalid, using fallback"
                );
                FALLBACK_LOCALE.to_string()
            }
        };
        Self { default_locale }
    }

    /// The canonical default locale
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Canonicalize `raw`, falling back to the default locale on any parse failure
    pub fn normalize(&self, raw: &str) -> String {
        canonicalize(raw).unwrap_or_else(|| {
            if !raw.is_empty() {
                tracing::warn!(
                    raw = %raw,
                    default = %self.default_locale,
                    "Unparseable locale, using default"
                );
            }
            self.default_locale.clone()
        })
    }

    /// Whether `locale` is the default locale once normalized
    pub fn is_default(&self, locale: &str) -> bool {
        self.normalize(locale) == self.default_locale
    }
}

impl Default for LocaleNormalizer {
    fn default() -> Self {
        Self::new(FALLBACK_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_input_unchanged() {
        let normalizer = LocaleNormalizer::default();
        assert_eq!(normalizer.normalize("en_US"), "en_US");
        assert_eq!(normalizer.normalize("fr_FR"), "fr_FR");
    }

    #[test]
    fn test_case_and_separator_normalized() {
        let normalizer = LocaleNormalizer::default();
        assert_eq!(normalizer.normalize("EN-us"), "en_US");
        assert_eq!(normalizer.normalize("pt_br"), "pt_BR");
        assert_eq!(normalizer.normalize("  de-DE "), "de_DE");
        assert_eq!(normalizer.normalize("zh-hant"), "zh_HANT");
    }

    #[test]
    fn test_language_only_uses_language_as_region() {
        let normalizer = LocaleNormalizer::default();
        assert_eq!(normalizer.normalize("en"), "en_EN");
        assert_eq!(normalizer.normalize("FIL"), "fil_FIL");
    }

    #[test]
    fn test_malformed_falls_back_to_default() {
        let normalizer = LocaleNormalizer::new("fr_FR");
        assert_eq!(normalizer.normalize("en*US"), "fr_FR");
        assert_eq!(normalizer.normalize(""), "fr_FR");
        assert_eq!(normalizer.normalize("en_US.UTF-8"), "fr_FR");
        assert_eq!(normalizer.normalize("e"), "fr_FR");
        assert_eq!(normalizer.normalize("en_USAAA"), "fr_FR");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = LocaleNormalizer::default();
        for raw in ["en", "en-us", "PT_br", "zh-Hant", "xx*yy", "", "eng-GBR"] {
            let once = normalizer.normalize(raw);
            assert_eq!(normalizer.normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_invalid_default_uses_fallback() {
        let normalizer = LocaleNormalizer::new("not a locale");
        assert_eq!(normalizer.default_locale(), FALLBACK_LOCALE);
    }

    #[test]
    fn test_default_is_normalized() {
        let normalizer = LocaleNormalizer::new("en-gb");
        assert_eq!(normalizer.default_locale(), "en_GB");
        assert!(normalizer.is_default("EN_gb"));
        assert!(!normalizer.is_default("en_US"));
    }
}
