//! Shape checks for user-supplied model references.
//!
//! These are string-shape checks only; nothing is fetched.

use regex::Regex;
use std::sync::LazyLock;

static HUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://huggingface\.co/([^/]+/[^/?\s#]+)").expect("hub url regex must compile")
});

static REPO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+$").expect("repo id regex must compile")
});

/// What a user-supplied string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReference {
    /// An http(s) URL pointing straight at an artifact file.
    DirectUrl(String),
    /// A path to an artifact on the local filesystem.
    LocalPath(String),
    /// A registry entry id, `owner/name`.
    Repository(String),
    /// None of the above.
    Invalid,
}

/// Part after `http://` or `https://`, if `input` is a URL.
fn url_rest(input: &str) -> Option<&str> {
    ["http://", "https://"].iter().find_map(|scheme| {
        input
            .get(..scheme.len())
            .filter(|head| head.eq_ignore_ascii_case(scheme))
            .map(|_| &input[scheme.len()..])
    })
}

/// Classify `input` as a direct artifact URL, a local artifact path, a
/// registry entry, or nothing recognisable.
///
/// All whitespace is removed first. `extension` is the artifact suffix,
/// e.g. `.gguf`; URLs match it case-insensitively.
pub fn classify_input(input: &str, extension: &str) -> ModelReference {
    let trimmed: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.is_empty() {
        return ModelReference::Invalid;
    }

    if let Some(rest) = url_rest(&trimmed) {
        if rest.len() > extension.len()
            && rest
                .to_ascii_lowercase()
                .ends_with(&extension.to_ascii_lowercase())
        {
            return ModelReference::DirectUrl(trimmed);
        }
    } else if trimmed.contains(extension) {
        return ModelReference::LocalPath(trimmed);
    }

    if let Some(caps) = HUB_URL.captures(&trimmed) {
        return ModelReference::Repository(caps[1].to_string());
    }

    if REPO_ID.is_match(&trimmed) {
        return ModelReference::Repository(trimmed);
    }

    ModelReference::Invalid
}
