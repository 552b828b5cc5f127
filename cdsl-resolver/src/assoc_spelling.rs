//! Spec §9 open question: "the source simultaneously checks `type ===
//! 'cds.Association'` and `type === 'Association'` in one helper; unclear
//! whether the short form is legacy or still generated. Preserve both
//! spellings in the reference resolver; emit an info when the short form is
//! seen." This module is that one helper.

use cdsl_diagnostics::{MessageCode, PathSegment, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocSpelling {
    /// `cds.Association` / `cds.Composition` — the fully qualified form.
    Qualified,
    /// Bare `Association` / `Composition` — preserved, but flagged.
    Short,
}

/// Recognizes both spellings of the association/composition type tag and
/// reports which one was used. Returns `None` if neither spelling matches.
pub fn normalize_assoc_type_spelling(raw: &str, path: Vec<PathSegment>, sink: &mut Sink) -> Option<(AssocSpelling, bool)> {
    let (spelling, is_composition) = match raw {
        "cds.Association" => (AssocSpelling::Qualified, false),
        "cds.Composition" => (AssocSpelling::Qualified, true),
        "Association" => (AssocSpelling::Short, false),
        "Composition" => (AssocSpelling::Short, true),
        _ => return None,
    };

    if spelling == AssocSpelling::Short {
        sink.info(
            MessageCode::Structural,
            path,
            format!("short-form association type `{raw}` seen; `cds.{raw}` is the canonical spelling"),
        );
    }

    Some((spelling, is_composition))
}
