//! Rendering is out of scope (`spec.md` §1): this module defines only the
//! seam the rest of the crate renders through. A real front end supplies
//! its own [`TemplateRenderer`]; [`PlaceholderRenderer`] here is a minimal
//! `{{Field}}`-substitution implementation, good enough to drive the
//! requirement-vector analysis in [`crate::notetypes`] and the crate's own
//! tests.

use regex::Regex;
use std::sync::OnceLock;

/// Renders a template's question/answer sides given a note's ordered field
/// values. Implementations are expected to be pure functions of their
/// inputs (`spec.md` §1).
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, fields: &[String], question_format: &str, answer_format: &str) -> (String, String);

    /// Whether a rendered side contains any field-derived content, used by
    /// the requirement-vector probe in `notetypes.rs` to tell "the
    /// template rendered something" from "the template is inherently
    /// empty". The default considers a side with no visible characters
    /// after whitespace trimming to be empty.
    fn contains_field_content(&self, rendered: &str) -> bool {
        !rendered.trim().is_empty()
    }
}

/// Field names are bound to the note type's field list by position; the
/// note itself only stores a flat, separator-joined value list
/// (`spec.md` §3 `Note`), so the caller (the requirement-vector probe in
/// `notetypes.rs`) is responsible for pairing `fields[i]` with the
/// template placeholder named by the note type's `i`-th field.
pub struct PlaceholderRenderer {
    field_names: Vec<String>,
}

impl PlaceholderRenderer {
    pub fn new(field_names: Vec<String>) -> Self {
        Self { field_names }
    }

    fn substitute(&self, fields: &[String], format: &str) -> String {
        let mut out = format.to_string();
        for (name, value) in self.field_names.iter().zip(fields.iter()) {
            out = out.replace(&format!("{{{{{name}}}}}"), value);
        }
        out
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, fields: &[String], question_format: &str, answer_format: &str) -> (String, String) {
        (self.substitute(fields, question_format), self.substitute(fields, answer_format))
    }
}

fn cloze_deletion_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{c(\d+)::(.*?)(?:::.*?)?\}\}").unwrap())
}

/// Renders a cloze template's question side for a specific ordinal: the
/// target deletion is replaced by `[...]`, every other deletion is
/// revealed (`spec.md` GLOSSARY "cloze").
pub fn render_cloze_question(text: &str, target_ordinal: u32) -> String {
    cloze_deletion_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            let n: u32 = caps[1].parse().unwrap_or(1) - 1;
            if n == target_ordinal {
                "[...]".to_string()
            } else {
                caps[2].to_string()
            }
        })
        .into_owned()
}

/// Renders a cloze template's answer side: every deletion is revealed.
pub fn render_cloze_answer(text: &str) -> String {
    cloze_deletion_pattern()
        .replace_all(text, |caps: &regex::Captures| caps[2].to_string())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_substitution() {
        let renderer = PlaceholderRenderer::new(vec!["Front".to_string(), "Back".to_string()]);
        let (q, a) = renderer.render(
            &["capital of France".to_string(), "Paris".to_string()],
            "{{Front}}",
            "{{Back}}",
        );
        assert_eq!(q, "capital of France");
        assert_eq!(a, "Paris");
    }

    #[test]
    fn test_cloze_rendering() {
        let text = "{{c1::Paris}} is the capital of {{c2::France}}";
        assert_eq!(render_cloze_question(text, 0), "[...] is the capital of France");
        assert_eq!(render_cloze_answer(text), "Paris is the capital of France");
    }
}
