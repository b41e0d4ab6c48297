//! The model registry (`spec.md` §4.3): note types, their templates, and
//! the template↔field requirement analysis, kept as a cached, computed
//! field on [`NoteType`] (recovered from `models.py`'s `_reqForTemplate`,
//! see `SPEC_FULL.md` §12).

use crate::model::{CardTemplate, NoteType, NoteTypeId, NoteTypeKind, TemplateRequirementKind};
use crate::render::TemplateRenderer;
use crate::{Error, LibraryError, NoteTypeErrorKind};
use sqlx::SqlitePool;
use sqlx::types::Json;
use std::collections::HashMap;

pub struct NoteTypeRegistry {
    note_types: HashMap<NoteTypeId, NoteType>,
}

impl NoteTypeRegistry {
    pub async fn load(db: &SqlitePool) -> Result<Self, Error> {
        let note_types: Vec<NoteType> = sqlx::query_as("SELECT * FROM note_type")
            .fetch_all(db)
            .await
            .map_err(|e| Error::Sqlx { source: e })?;
        Ok(Self {
            note_types: note_types.into_iter().map(|n| (n.id, n)).collect(),
        })
    }

    pub fn get(&self, id: NoteTypeId) -> Option<&NoteType> {
        self.note_types.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&NoteType> {
        self.note_types.values().find(|n| n.name == name)
    }

    /// Computes (and caches) the requirement vector for a Standard note
    /// type. Recomputed whenever templates or fields change, or when not
    /// yet cached (`spec.md` §4.3).
    pub fn requirements(
        &mut self,
        id: NoteTypeId,
        renderer: &dyn TemplateRenderer,
    ) -> Result<Vec<TemplateRequirementKind>, Error> {
        let note_type = self
            .note_types
            .get(&id)
            .ok_or_else(|| Error::Library(LibraryError::NoteType(NoteTypeErrorKind::NotFound(id.to_string()))))?;
        if let Some(cached) = &note_type.requirements {
            return Ok(cached.0.clone());
        }
        let computed = compute_requirements(&note_type.fields.0, &note_type.templates.0, renderer);
        if let Some(note_type) = self.note_types.get_mut(&id) {
            note_type.requirements = Some(Json(computed.clone()));
        }
        Ok(computed)
    }

    /// Invalidates the cached requirement vector; called whenever a
    /// template or field is edited.
    pub fn invalidate_requirements(&mut self, id: NoteTypeId) {
        if let Some(note_type) = self.note_types.get_mut(&id) {
            note_type.requirements = None;
        }
    }
}

const SENTINEL: &str = "sentinel";

/// Derivation algorithm per `spec.md` §4.3: render with every field at the
/// sentinel and again with every field empty; if identical, the template
/// produces no card (`None`). Otherwise probe each field individually to
/// classify it as required (`All`) or merely sufficient (`Any`).
pub fn compute_requirements(
    fields: &[String],
    templates: &[CardTemplate],
    renderer: &dyn TemplateRenderer,
) -> Vec<TemplateRequirementKind> {
    templates
        .iter()
        .map(|template| requirement_for_template(fields, template, renderer))
        .collect()
}

fn requirement_for_template(
    fields: &[String],
    template: &CardTemplate,
    renderer: &dyn TemplateRenderer,
) -> TemplateRequirementKind {
    let all_sentinel: Vec<String> = fields.iter().map(|_| SENTINEL.to_string()).collect();
    let all_empty: Vec<String> = fields.iter().map(|_| String::new()).collect();

    let (full_q, _) = renderer.render(&all_sentinel, &template.question_format, &template.answer_format);
    let (empty_q, _) = renderer.render(&all_empty, &template.question_format, &template.answer_format);
    if full_q == empty_q {
        return TemplateRequirementKind::None;
    }

    let mut required_all = Vec::new();
    for (idx, _) in fields.iter().enumerate() {
        let mut probe = all_sentinel.clone();
        probe[idx] = String::new();
        let (q, _) = renderer.render(&probe, &template.question_format, &template.answer_format);
        if !renderer.contains_field_content(&q) {
            required_all.push(idx);
        }
    }
    if !required_all.is_empty() {
        return TemplateRequirementKind::All(required_all);
    }

    let mut sufficient_any = Vec::new();
    for (idx, _) in fields.iter().enumerate() {
        let mut probe = all_empty.clone();
        probe[idx] = SENTINEL.to_string();
        let (q, _) = renderer.render(&probe, &template.question_format, &template.answer_format);
        if renderer.contains_field_content(&q) {
            sufficient_any.push(idx);
        }
    }
    TemplateRequirementKind::Any(sufficient_any)
}

/// Valid cloze ordinals for a given set of field values (`spec.md` §4.3):
/// `{n-1 : c{n} appears inside {{cX::…}}}`, falling back to `[0]` as the
/// empty-cloze placeholder.
pub fn cloze_ordinals(fields: &[String], cloze_field_indices: &[usize]) -> Vec<u32> {
    use std::collections::BTreeSet;
    let re = regex::Regex::new(r"\{\{c(\d+)::").unwrap();
    let mut ordinals = BTreeSet::new();
    for &idx in cloze_field_indices {
        let Some(field) = fields.get(idx) else { continue };
        for capture in re.captures_iter(field) {
            if let Ok(n) = capture[1].parse::<u32>() {
                if n >= 1 {
                    ordinals.insert(n - 1);
                }
            }
        }
    }
    if ordinals.is_empty() {
        vec![0]
    } else {
        ordinals.into_iter().collect()
    }
}

pub fn is_cloze(note_type: &NoteType) -> bool {
    note_type.kind == NoteTypeKind::Cloze
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloze_ordinals_empty_placeholder() {
        let fields = vec!["no clozes here".to_string()];
        assert_eq!(cloze_ordinals(&fields, &[0]), vec![0]);
    }

    #[test]
    fn test_cloze_ordinals_multiple() {
        let fields = vec!["{{c1::a}} and {{c3::b}}".to_string()];
        assert_eq!(cloze_ordinals(&fields, &[0]), vec![0, 2]);
    }
}
