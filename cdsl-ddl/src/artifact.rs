//! Groups definitions by top-level artifact and drives the per-definition
//! renderers (spec §4.4 point 4): every entity/type/view is emitted into
//! its owning artifact's buffer, cross-artifact association targets get a
//! `using` alias line, and persistence-name collisions under the chosen
//! naming mode are reported rather than silently overwriting each other
//! (spec §4.4 point 5).

use cdsl_diagnostics::{MessageCode, PathSegment, Sink};
use cdsl_model::{DefinitionId, DefinitionKind, ElementType, Model};
use cdsl_preprocess::Options;
use cdsl_render_core::Dialect;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

use crate::dialect::HdbcdsDialect;
use crate::entity::{render_entity, render_type_def};
use crate::naming::artifact_of;
use crate::view::render_view;

/// Renders the whole model as native object DDL: one output entry per
/// top-level artifact (spec §4.4 point 4).
pub fn render(model: &Model, options: &Options, sink: &mut Sink) -> IndexMap<String, String> {
    let dialect = HdbcdsDialect::new(options.default_string_length);
    let mut files: IndexMap<String, String> = IndexMap::new();
    let mut usings: IndexMap<String, IndexSet<String>> = IndexMap::new();

    for id in model.sorted_ids() {
        let def = model.get(id);
        if def.kind.is_never_persisted() {
            continue;
        }

        let artifact = artifact_of(model, &model.derived, id);

        let rendered = match &def.kind {
            DefinitionKind::Entity(entity) if entity.query.is_some() => render_view(model, &dialect, id),
            DefinitionKind::Entity(_) => Some(render_entity(model, &model.derived, &dialect, options, id)),
            DefinitionKind::Type(_) => render_type_def(model, &model.derived, &dialect, options, id),
            _ => None,
        };

        let Some(rendered) = rendered else { continue };

        collect_usings(model, &model.derived, id, &artifact, usings.entry(artifact.clone()).or_default());

        files.entry(artifact).or_default().push_str(&rendered);
    }

    for (artifact, refs) in usings {
        if refs.is_empty() {
            continue;
        }
        let mut header = String::new();
        for r in &refs {
            header.push_str(&format!("using {r};\n"));
        }
        if let Some(body) = files.get_mut(&artifact) {
            *body = format!("{header}\n{body}");
        }
    }

    report_duplicate_names(model, &dialect, sink);

    files
}

/// Walks an entity's association elements; for every target that lives in
/// a different artifact, records a `using <artifact>.<Name>;` dependency.
fn collect_usings(model: &Model, derived: &cdsl_model::Derived, id: DefinitionId, own_artifact: &str, out: &mut IndexSet<String>) {
    let Some(elements) = model.get(id).kind.elements() else { return };
    for element in elements.values() {
        if let ElementType::Assoc(assoc) = &element.ty {
            let Some(target) = assoc.target else { continue };
            let target_artifact = artifact_of(model, derived, target);
            if target_artifact != own_artifact {
                let target_name = crate::naming::local_name(&model.get(target).name);
                out.insert(format!("{target_artifact}.{target_name}"));
            }
        }
    }
}

/// Detects two definitions whose rendered names collide under the chosen
/// naming mode (spec §4.4 point 5).
fn report_duplicate_names(model: &Model, dialect: &HdbcdsDialect, sink: &mut Sink) {
    let mut seen: HashMap<String, String> = HashMap::new();
    for id in model.sorted_ids() {
        let def = model.get(id);
        if def.kind.is_never_persisted() {
            continue;
        }
        let quoted = dialect.quote(&crate::naming::local_name(&def.name));
        if let Some(previous) = seen.insert(quoted.clone(), def.name.clone()) {
            sink.error(
                MessageCode::Duplicate,
                vec![PathSegment::Name(def.name.clone())],
                format!("`{}` and `{}` both render to `{quoted}` under the chosen naming mode", previous, def.name),
            );
        }
    }
}
