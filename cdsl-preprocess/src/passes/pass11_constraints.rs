//! Pass 11 — constraint finalization (the referential-constraint engine).
//!
//! Turns pass 9's raw `(dependent, principal)` candidates, plus any
//! association declared with a managed `keys: [{ref, as}]` list, into the
//! final [`cdsl_model::RefConstraint`] set a renderer can emit directly:
//! each pair is checked against the target's actual elements, compositions
//! have their dependent/principal roles swapped (the target row is the one
//! whose row depends on the container), and every surviving pair gets a
//! stable identifier so two compiles of the same model produce the same
//! constraint names.

use sha2::{Digest, Sha256};

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, MessageCode, PathSegment, Sink};
use cdsl_model::{AssocKind, ConstraintSet, DefinitionId, ElementId, Model, RefAction, RefConstraint};

pub fn run(model: &mut Model, options: &Options, sink: &mut Sink) -> Result<(), CoreError> {
    let associations: Vec<(DefinitionId, ElementId, AssocKind, Option<DefinitionId>)> = model
        .ids()
        .flat_map(|owner| {
            model
                .elements_of(owner)
                .into_iter()
                .filter_map(move |(eid, el)| el.ty.as_assoc().map(|spec| (owner, eid, spec.kind.clone(), spec.target)))
                .collect::<Vec<_>>()
        })
        .collect();

    for (owner, eid, kind, target) in associations {
        let Some(target_id) = target else { continue };
        let redirected = model.derived.original_target.contains_key(&eid);

        let seeded = model.derived.constraints.get(&eid).map(|s| s.constraints.clone()).unwrap_or_default();
        let managed = managed_constraints(model, eid, target_id);

        let mut raw: Vec<(Vec<String>, Vec<String>)> = Vec::new();
        if !redirected {
            for c in &seeded {
                raw.push((c.dependent_path.clone(), c.principal_path.clone()));
            }
        }
        raw.extend(managed);

        let renderable: Vec<(Vec<String>, Vec<String>)> =
            raw.into_iter().filter(|(_, principal)| is_renderable(model, target_id, principal)).collect();

        let (dep_first, principal_first): (Vec<(Vec<String>, Vec<String>)>, bool) = if kind == AssocKind::Composition {
            (renderable.iter().map(|(d, p)| (p.clone(), d.clone())).collect(), true)
        } else {
            (renderable, false)
        };
        let _ = principal_first;

        let mut finalized: Vec<RefConstraint> = dep_first
            .into_iter()
            .map(|(dependent_path, principal_path)| {
                let identifier = constraint_identifier(&dependent_path, &principal_path);
                RefConstraint {
                    dependent_path,
                    principal_path,
                    on_update: RefAction::NoAction,
                    on_delete: RefAction::NoAction,
                    enforced: true,
                    validated: false,
                    identifier,
                }
            })
            .collect();

        if matches!(options.version, ProtocolVersion::V2) && !finalized.is_empty() {
            let target_keys: Vec<String> =
                model.derived.keys.get(&target_id).map(|ks| ks.iter().map(|k| model.element_name(*k).to_string()).collect()).unwrap_or_default();
            let covered: std::collections::HashSet<&str> =
                finalized.iter().filter_map(|c| c.principal_path.first()).map(String::as_str).collect();
            let fully_covered = target_keys.iter().all(|k| covered.contains(k.as_str()));
            if !fully_covered {
                if options.odata_v2_partial_constr {
                    sink.info(
                        MessageCode::SpecViolation,
                        vec![PathSegment::Name(model.get(owner).name.clone()), PathSegment::Element(model.element_name(eid).to_string())],
                        "referential constraint does not cover the full primary key; emitting a partial constraint",
                    );
                } else {
                    finalized.clear();
                }
            }
        }

        let partner = model.derived.partner.get(&eid).copied();
        model.derived.constraints.insert(eid, ConstraintSet { partner, constraints: finalized });
    }

    Ok(())
}

fn managed_constraints(model: &Model, eid: ElementId, target_id: DefinitionId) -> Vec<(Vec<String>, Vec<String>)> {
    let Some(spec) = model.element(eid).ty.as_assoc() else { return Vec::new() };
    let Some(fks) = &spec.keys else { return Vec::new() };

    let target_key_names: std::collections::HashSet<String> =
        model.derived.keys.get(&target_id).map(|ks| ks.iter().map(|k| model.element_name(*k).to_string()).collect()).unwrap_or_default();

    fks.iter()
        .filter(|fk| fk.target_key_path.first().map(|k| target_key_names.contains(k)).unwrap_or(false))
        .map(|fk| {
            let dependent = vec![fk.generated_field_name.clone().unwrap_or_else(|| fk.target_key_path.join("_"))];
            (dependent, fk.target_key_path.clone())
        })
        .collect()
}

fn is_renderable(model: &Model, target_id: DefinitionId, principal_path: &[String]) -> bool {
    let Some(head) = principal_path.first() else { return false };
    model.elements_of(target_id).into_iter().any(|(eid, _)| model.element_name(eid) == head)
}

fn constraint_identifier(dependent: &[String], principal: &[String]) -> String {
    let mut sorted_pairs = vec![(dependent.join("."), principal.join("."))];
    sorted_pairs.sort();
    let mut hasher = Sha256::new();
    for (d, p) in &sorted_pairs {
        hasher.update(d.as_bytes());
        hasher.update(b"\0");
        hasher.update(p.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::{Element, ElementType, ForeignKey, ScalarBase};

    #[test]
    fn finalizes_managed_association_into_constraint_per_key() {
        let mut model = Model::new();
        let target = EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut model);
        let assoc = Element::new(ElementType::Assoc(cdsl_model::AssocSpec {
            kind: AssocKind::Association,
            target_name: "S.Author".into(),
            target: Some(target),
            on: None,
            keys: Some(vec![ForeignKey { target_key_path: vec!["ID".into()], alias: None, generated_field_name: Some("author_ID".into()) }]),
            cardinality: cdsl_model::Cardinality::to_one_default(),
        }));
        let book = EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).element("author", assoc).build(&mut model);
        let eid = model.elements_of(book)[1].0;

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let set = model.derived.constraints.get(&eid).unwrap();
        assert_eq!(set.constraints.len(), 1);
        assert_eq!(set.constraints[0].dependent_path, vec!["author_ID".to_string()]);
        assert_eq!(set.constraints[0].principal_path, vec!["ID".to_string()]);
        assert!(!set.constraints[0].identifier.is_empty());
    }
}
