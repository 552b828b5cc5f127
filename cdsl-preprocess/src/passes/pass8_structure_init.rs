//! Pass 8 — structure initialization.
//!
//! `_parent` and `name` are already implicit in this store (an
//! [`cdsl_model::ElementId`] carries its owning definition, and the element's
//! name is the `IndexMap` key it is stored under), so nothing needs
//! installing for those. What this pass actually does:
//!
//! - Collects every key-marked element into `$keys`, folding in any element
//!   carrying `@cds.valid.key` as an alternate key (or, in legacy mode, as
//!   the replacement primary key).
//! - Runs the identifier check on every definition and element name,
//!   reporting violations as dialect errors.
//!
//! Annotation propagation onto generated foreign-key fields (flat format
//! only) has no home in this model: [`cdsl_model::ForeignKey`] carries no
//! annotation map, so there is nothing to propagate onto.

use crate::options::Options;
use cdsl_diagnostics::{CoreError, MessageCode, PathSegment, Sink};
use cdsl_model::{AnnotationValue, DefinitionId, ElementId, Model};
use cdsl_naming::check_identifier;

pub fn run(model: &mut Model, options: &Options, sink: &mut Sink) -> Result<(), CoreError> {
    let ids: Vec<DefinitionId> = model.ids().collect();

    for id in &ids {
        let name = model.get(*id).name.clone();
        for segment in name.split('.') {
            if let Err(e) = check_identifier(segment) {
                sink.error(
                    MessageCode::DialectViolation,
                    vec![PathSegment::Name(name.clone())],
                    format!("`{segment}` is not a valid identifier: {e}"),
                );
            }
        }

        let element_ids: Vec<ElementId> = model.elements_of(*id).into_iter().map(|(eid, _)| eid).collect();
        let mut keys = Vec::new();
        for eid in &element_ids {
            let ename = model.element_name(*eid).to_string();
            if let Err(e) = check_identifier(&ename) {
                sink.error(
                    MessageCode::DialectViolation,
                    vec![PathSegment::Name(name.clone()), PathSegment::Element(ename.clone())],
                    format!("`{ename}` is not a valid identifier: {e}"),
                );
            }

            let el = model.element(*eid);
            let is_valid_key = el.annotations.get("cds.valid.key").and_then(|v| v.as_bool()).unwrap_or(false);
            if el.key {
                keys.push(*eid);
            } else if is_valid_key && !options.legacy_valid_key {
                keys.push(*eid);
            }
        }

        if options.legacy_valid_key {
            if let Some(replacement) = element_ids.iter().find(|eid| {
                model.element(**eid).annotations.get("cds.valid.key").and_then(AnnotationValue::as_bool).unwrap_or(false)
            }) {
                keys = vec![*replacement];
            }
        }

        if !keys.is_empty() {
            model.derived.keys.insert(*id, keys);
        }
    }

    Ok(())
}
