//! Pass 15 — navigation target paths (v4).
//!
//! Depth-first walk from every entity that has its own entity set. Crossing
//! an association whose target has *no* entity set of its own (and isn't
//! the back-pointer out of a containment tree) means that target is only
//! reachable through this path, so the path-so-far is recorded on it
//! (`$edmTgtPaths`) for pass 16 to bind a navigation property against.
//! `touched` guards against cycles within one root's walk.

use std::collections::HashSet;

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionId, ElementId, Model};

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    if !matches!(options.version, ProtocolVersion::V4) {
        return Ok(());
    }

    let roots: Vec<DefinitionId> = model.sorted_ids().into_iter().filter(|id| model.derived.has_entity_set.contains(id)).collect();
    for root in roots {
        let mut touched = HashSet::new();
        let mut prefix = Vec::new();
        walk(model, root, &mut prefix, &mut touched);
    }

    Ok(())
}

fn walk(model: &mut Model, current: DefinitionId, prefix: &mut Vec<String>, touched: &mut HashSet<DefinitionId>) {
    if !touched.insert(current) {
        return;
    }

    let assocs: Vec<(ElementId, DefinitionId)> =
        model.elements_of(current).into_iter().filter_map(|(eid, el)| el.ty.as_assoc().and_then(|s| s.target).map(|t| (eid, t))).collect();

    for (eid, target) in assocs {
        if model.derived.has_entity_set.contains(&target) {
            continue;
        }
        if model.derived.is_to_container.contains(&eid) {
            continue;
        }
        let name = model.element_name(eid).to_string();
        prefix.push(name);
        model.derived.edm_tgt_paths.entry(target).or_default().push(prefix.clone());
        walk(model, target, prefix, touched);
        prefix.pop();
    }
}
