//! `{{variable}}` template processing
//!
//! Templates are plain strings with `{{identifier}}` placeholders. The legacy
//! single-brace form `{identifier}` is still recognised so that it can be
//! reported and migrated, but it is never substituted.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches a brace-delimited identifier with any number of braces on either
/// side, plus an optional leading `$`. The brace counts and the `$` decide
/// whether the match is a placeholder.
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"(\$?)(\{+)([A-Za-z_][A-Za-z0-9_-]*)(\}+)")
            .expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Current,
    Legacy,
    Neither,
}

fn classify(caps: &Captures<'_>) -> Syntax {
    let dollar = !caps[1].is_empty();
    match (caps[2].len(), caps[4].len()) {
        (2, 2) => Syntax::Current,
        // `${NAME}` is shell parameter expansion
        (1, 1) if !dollar => Syntax::Legacy,
        _ => Syntax::Neither,
    }
}

/// Result of checking a template for legacy syntax
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Replace every `{{name}}` with `variables[name]`.
///
/// Placeholders without a value are left untouched, so the output can be
/// processed again later with more variables.
pub fn process_template(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            if classify(caps) == Syntax::Current {
                if let Some(value) = variables.get(&caps[3]) {
                    return format!("{}{}", &caps[1], value);
                }
            }
            caps[0].to_string()
        })
        .into_owned()
}

/// Report every legacy `{name}` placeholder in `template`
pub fn validate_template(template: &str) -> TemplateValidation {
    let errors: Vec<String> = placeholder_regex()
        .captures_iter(template)
        .filter(|caps| classify(caps) == Syntax::Legacy)
        .map(|caps| {
            format!(
                "Legacy template syntax '{{{name}}}' is no longer supported, use '{{{{{name}}}}}'",
                name = &caps[3]
            )
        })
        .collect();

    TemplateValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Rewrite legacy `{name}` placeholders as `{{name}}`
pub fn convert_to_new_syntax(template: &str) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| match classify(caps) {
            Syntax::Legacy => format!("{{{{{}}}}}", &caps[3]),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Names referenced by `{{name}}` placeholders, in first-seen order
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        if classify(&caps) == Syntax::Current && !names.iter().any(|n| n == &caps[3]) {
            names.push(caps[3].to_string());
        }
    }
    names
}
