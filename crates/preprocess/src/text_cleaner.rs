//! Text cleaning and normalization for informal Indonesian review text
//!
//! The pipeline is `clean_text` → `normalize_text`, composed by
//! [`preprocess_review`]. Every function here is pure and never fails: input
//! that is missing or empty comes back as an empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `$-_` is a range, not three literals. It spans ASCII digits, upper-case
/// letters and most punctuation, so trailing `).,?` right after a URL are
/// swallowed with it.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .expect("URL pattern is valid")
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+").expect("email pattern is valid"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Letters, numbers (`²`, `½` included) and `_` survive; combining marks do not.
static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_\s]").expect("punctuation pattern is valid"));

/// Flags for [`preprocess_review`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    /// Run [`clean_text`]
    pub clean: bool,

    /// Run [`normalize_text`]
    pub normalize: bool,

    /// Case-fold during normalization
    pub lowercase: bool,

    /// Drop everything that is not a word character or whitespace
    pub remove_punctuation: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            clean: true,
            normalize: true,
            lowercase: true,
            remove_punctuation: false,
        }
    }
}

/// Clean raw review text
///
/// Decodes HTML entities the way HTML5 does (legacy forms such as `&amp`
/// without the `;` included), then removes URLs and email addresses, then
/// collapses whitespace runs (newlines and tabs included) to one space and
/// trims. Decoding runs first so entity-encoded URLs are still caught.
///
/// ```
/// use ulasan_preprocess::clean_text;
///
/// assert_eq!(
///     clean_text("Barang bagus bgt!!!! 😊 http://example.com"),
///     "Barang bagus bgt!!!! 😊"
/// );
/// assert_eq!(clean_text(None), "");
/// ```
pub fn clean_text<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text: Option<&str> = text.into();
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return String::new();
    };

    let decoded = htmlize::unescape(text);
    let without_urls = URL_RE.replace_all(&decoded, "");
    let without_emails = EMAIL_RE.replace_all(&without_urls, "");
    let collapsed = WHITESPACE_RE.replace_all(&without_emails, " ");

    collapsed.trim().to_string()
}

/// Normalize text casing and, optionally, punctuation
///
/// Punctuation removal keeps only letters, numbers, `_` and whitespace, which
/// also strips emoji, decorative symbols and combining accents.
pub fn normalize_text<'a>(
    text: impl Into<Option<&'a str>>,
    lowercase: bool,
    remove_punctuation: bool,
) -> String {
    let text: Option<&str> = text.into();
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return String::new();
    };

    let mut result = if lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    if remove_punctuation {
        let stripped = NON_WORD_RE.replace_all(&result, "");
        result = WHITESPACE_RE.replace_all(&stripped, " ").into_owned();
    }

    result.trim().to_string()
}

/// Full preprocessing pipeline for a single review
///
/// With both stages disabled the input is returned untouched (not trimmed).
pub fn preprocess_review(text: &str, options: &PreprocessOptions) -> String {
    let mut result = text.to_string();

    if options.clean {
        result = clean_text(result.as_str());
    }

    if options.normalize {
        result = normalize_text(result.as_str(), options.lowercase, options.remove_punctuation);
    }

    result
}
