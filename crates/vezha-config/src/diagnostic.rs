// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error diagnostics.
//!
//! Bridges figment's deserialization errors into miette reports: source
//! spans pointing at the offending TOML line, the valid keys for the
//! section, and a "did you mean?" correction when a typo is close enough
//! to a real key.

#![allow(unused_assignments)] // the Diagnostic derive expands into code that trips this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a typo correction. 0.75 catches
/// `bot_tokne` -> `bot_token` and `capasity` -> `capacity` without
/// suggesting unrelated keys.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One configuration problem, rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no config section defines.
    #[error("unrecognized configuration key `{key}`")]
    #[diagnostic(
        code(vezha::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), known_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest accepted key, if any is similar enough.
        suggestion: Option<String>,
        /// Comma-joined keys the section accepts.
        known_keys: String,
        #[label("no such key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value whose TOML type does not match the field.
    #[error("wrong value type for `{key}`: {detail}")]
    #[diagnostic(code(vezha::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A key the model requires but no layer provided.
    #[error("required key `{key}` is not set")]
    #[diagnostic(
        code(vezha::config::missing_key),
        help("add `{key} = <value>` to your vezha.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed fine but fails a semantic check.
    #[error("invalid value: {message}")]
    #[diagnostic(code(vezha::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration problem: {0}")]
    #[diagnostic(code(vezha::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, known_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("closest accepted key is `{s}`; this section takes: {known_keys}"),
        None => format!("this section takes: {known_keys}"),
    }
}

/// Split a `figment::Error` into one `ConfigError` per underlying problem.
///
/// A figment error may aggregate several independent problems; each is
/// converted to the matching `ConfigError` variant, with fuzzy suggestions
/// and source spans attached to unknown-field errors.
pub fn errors_from_figment(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let accepted: Vec<&str> = expected.to_vec();
                let suggestion = closest_key(field, &accepted);
                let (span, src) = locate_key(&error, field, toml_sources);

                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    known_keys: accepted.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: dotted_path(&error),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(format!("{error}")),
        })
        .collect()
}

/// The error's key path in `section.key` form.
fn dotted_path(error: &figment::error::Error) -> String {
    error
        .path
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve the span of an offending key in whichever TOML source defined it.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let located = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        })
        .and_then(|path| {
            toml_sources
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(p, content)| (p.clone(), content.clone()))
        })
        .and_then(|(path, content)| {
            // For "telegram.bot_tokne" the section path is ["telegram"].
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            key_offset(&content, &section, field).map(|offset| {
                (
                    SourceSpan::new(offset.into(), field.len()),
                    NamedSource::new(path, content),
                )
            })
        });

    match located {
        Some((span, src)) => (Some(span), Some(src)),
        None => (None, None),
    }
}

/// Byte offset of a key within TOML text, scoped to a section path.
///
/// For `path = ["telegram"]` and `field = "bot_tokne"`, finds the
/// `[telegram]` header and then searches for `bot_tokne` after it. Top-level
/// fields are searched from the start of the document.
pub fn key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    // Look for the field name at the start of a line (possibly indented).
    let mut cursor = search_start;
    for line in content[search_start..].lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.starts_with([' ', '=', '\t'])
        {
            let indent = line.len() - trimmed.len();
            return Some(cursor + indent);
        }
        cursor += line.len() + 1; // +1 for newline
    }

    None
}

/// Pick the accepted key most similar to an unknown one, by Jaro-Winkler
/// distance. `None` when nothing clears the similarity threshold.
pub fn closest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(key, _)| key.to_string())
}

/// Print every `ConfigError` to stderr through miette's graphical handler.
pub fn report_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_tokne_resolves_to_bot_token() {
        let accepted = &["bot_token"];
        assert_eq!(closest_key("bot_tokne", accepted), Some("bot_token".to_string()));
    }

    #[test]
    fn capasity_resolves_to_capacity() {
        let accepted = &["capacity", "ttl_secs", "saturation_threshold"];
        assert_eq!(closest_key("capasity", accepted), Some("capacity".to_string()));
    }

    #[test]
    fn distant_typo_yields_no_suggestion() {
        let accepted = &["capacity", "ttl_secs", "saturation_threshold"];
        assert_eq!(closest_key("zzzzzz", accepted), None);
    }

    #[test]
    fn key_offset_found_within_section() {
        let content = "[telegram]\nbot_tokne = \"123\"\n";
        let path = vec!["telegram".to_string()];
        let offset = key_offset(content, &path, "bot_tokne").unwrap();
        assert_eq!(&content[offset..offset + 9], "bot_tokne");
    }

    #[test]
    fn key_offset_at_document_start() {
        let content = "stray = 1\n[agent]\nname = \"vezha\"\n";
        let offset = key_offset(content, &[], "stray").unwrap();
        assert_eq!(offset, 0);
    }

    #[test]
    fn unknown_field_error_gets_suggestion() {
        let err = crate::loader::load_config_from_str(
            r#"
[history]
capasity = 5
"#,
        )
        .unwrap_err();
        let errors = errors_from_figment(err, &[]);
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key == "capasity" && suggestion.as_deref() == Some("capacity")
        )));
    }
}
