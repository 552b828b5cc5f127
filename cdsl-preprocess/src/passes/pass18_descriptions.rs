//! Pass 18 — descriptions and collections.
//!
//! The last pass: copies a definition's or element's `doc` comment onto
//! `@Core.Description` wherever the author hasn't already annotated one
//! explicitly, marks `items:` array-of elements as collections, and caches
//! the Edm primitive type name for any element (or array-of item) whose
//! base is a builtin scalar, so the protocol renderer never re-derives it.

use crate::edm_types::edm_type_name;
use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{AnnotationValue, DefinitionId, ElementId, ElementType, Model, ScalarBase};

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let ids: Vec<DefinitionId> = model.ids().collect();

    for id in &ids {
        let doc = model.get(*id).doc.clone();
        if let Some(doc) = doc {
            let def = model.get_mut(*id);
            if !def.annotations.contains_key("Core.Description") {
                def.annotations.insert("Core.Description".to_string(), AnnotationValue::Str(doc));
            }
        }

        let element_info: Vec<(ElementId, Option<String>, bool, Option<ScalarBase>, bool)> = model
            .elements_of(*id)
            .into_iter()
            .map(|(eid, el)| {
                let is_collection = el.ty.is_array_of();
                let scalar_base = scalar_base_of(&el.ty);
                let has_description = el.annotations.contains_key("Core.Description");
                (eid, el.doc.clone(), is_collection, scalar_base, has_description)
            })
            .collect();

        for (eid, doc, is_collection, scalar_base, has_description) in element_info {
            if is_collection {
                model.derived.is_collection.insert(eid);
            }
            if let Some(base) = scalar_base {
                model.derived.edm_type.insert(eid, edm_type_name(base).to_string());
            }
            if !has_description {
                if let Some(doc) = doc {
                    model.element_mut(eid).annotations.insert("Core.Description".to_string(), AnnotationValue::Str(doc));
                }
            }
        }
    }

    Ok(())
}

fn scalar_base_of(ty: &ElementType) -> Option<ScalarBase> {
    match ty {
        ElementType::Scalar { base, .. } => Some(*base),
        ElementType::ArrayOf(inner) => scalar_base_of(inner),
        _ => None,
    }
}
