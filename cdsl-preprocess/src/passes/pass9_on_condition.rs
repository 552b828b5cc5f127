//! Pass 9 — on-condition parsing and constraint seeding.
//!
//! Walks every association's `on` expression looking for `and`-joined
//! equality terms where exactly one side starts with the association's own
//! name. The other side is either a backlink (`$self`, recorded as a
//! partner path to resolve on the target) or a foreign-key reference
//! (seeded as a `(dependent, principal)` candidate for pass 11 to finalize).
//! A single `$self` equality is the signature of a pure backlink
//! association; its partner is found by walking the target definition along
//! the remaining path.

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionId, ElementId, Expr, Model, PathHead, PathStep, RefPath};
use cdsl_resolver::resolve_path;

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let associations: Vec<(DefinitionId, ElementId, String, Option<Expr>, Option<DefinitionId>)> = model
        .ids()
        .flat_map(|owner| {
            model
                .elements_of(owner)
                .into_iter()
                .filter_map(|(eid, el)| {
                    let spec = el.ty.as_assoc()?;
                    Some((owner, eid, model.element_name(eid).to_string(), spec.on.clone(), spec.target))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    for (owner, eid, assoc_name, on, target) in associations {
        let Some(on) = on else { continue };
        let Some(terms) = on.and_eq_terms() else { continue };

        let mut fk_candidates: Vec<(Vec<String>, Vec<String>)> = Vec::new();
        let mut self_paths: Vec<Vec<String>> = Vec::new();

        for (lhs, rhs) in terms.iter().copied() {
            let classified = starts_with_name(lhs, &assoc_name)
                .map(|path| (path, rhs))
                .or_else(|| starts_with_name(rhs, &assoc_name).map(|path| (path, lhs)));
            let Some((this_path, other_side)) = classified else { continue };

            if is_self_ref(other_side) {
                self_paths.push(this_path);
            } else if let Some(other_path) = as_path(other_side) {
                fk_candidates.push((other_path, this_path));
            }
        }

        if self_paths.len() == 1 && terms.len() == 1 {
            let partner_path = &self_paths[0];
            if let Some(target_id) = target {
                let ref_path = RefPath {
                    head: PathHead::Plain,
                    steps: partner_path.iter().map(PathStep::plain).collect(),
                    param: false,
                    global: false,
                };
                match resolve_path(model, target_id, &ref_path) {
                    Ok(outcome) if !outcome.links.is_empty() => {
                        if let Some(partner_eid) = outcome.links.last().and_then(|l| l.element) {
                            model.derived.self_references.entry(eid).or_default().push(partner_eid);
                            model.derived.origins.insert(partner_eid, eid);
                            model.derived.partner.insert(eid, partner_eid);
                            model.derived.partner.insert(partner_eid, eid);
                        } else {
                            model.derived.no_partner.insert(eid);
                        }
                    }
                    _ => {
                        model.derived.no_partner.insert(eid);
                    }
                }
            } else {
                model.derived.no_partner.insert(eid);
            }
        } else if !fk_candidates.is_empty() {
            let set = model.derived.constraints.entry(eid).or_default();
            for (dep, principal) in fk_candidates {
                set.constraints.push(cdsl_model::RefConstraint {
                    dependent_path: dep,
                    principal_path: principal,
                    on_update: cdsl_model::RefAction::NoAction,
                    on_delete: cdsl_model::RefAction::NoAction,
                    enforced: true,
                    validated: false,
                    identifier: String::new(),
                });
            }
        }
        let _ = owner;
    }

    Ok(())
}

/// If `expr` is a plain local `Ref` whose first step equals `name`, returns
/// the remaining steps (the path continuing past the association).
fn starts_with_name(expr: &Expr, name: &str) -> Option<Vec<String>> {
    match expr {
        Expr::Ref(path) if matches!(path.head, PathHead::Plain) && !path.param => {
            let first = path.steps.first()?;
            if first.name == name {
                Some(path.steps[1..].iter().map(|s| s.name.clone()).collect())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_self_ref(expr: &Expr) -> bool {
    matches!(expr, Expr::Ref(path) if matches!(path.head, PathHead::SelfRef))
}

fn as_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ref(path) if matches!(path.head, PathHead::Plain) && !path.param => {
            Some(path.steps.iter().map(|s| s.name.clone()).collect())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::{AssocKind, AssocSpec, Cardinality, Element, ElementType, ScalarBase};

    fn ref_path(steps: &[&str]) -> Expr {
        Expr::Ref(RefPath { head: PathHead::Plain, steps: steps.iter().map(PathStep::plain).collect(), param: false, global: false })
    }

    fn self_ref() -> Expr {
        Expr::Ref(RefPath { head: PathHead::SelfRef, steps: vec![], param: false, global: false })
    }

    #[test]
    fn seeds_foreign_key_candidate_from_on_condition() {
        let mut model = Model::new();
        let author = EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut model);
        let on = Expr::Binary { op: "=".into(), lhs: Box::new(ref_path(&["author", "ID"])), rhs: Box::new(ref_path(&["authorID"])) };
        let assoc = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: "S.Author".into(),
            target: Some(author),
            on: Some(on),
            keys: None,
            cardinality: Cardinality::to_one_default(),
        }));
        let book = EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).element("author", assoc).build(&mut model);
        let eid = model.elements_of(book)[1].0;

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let set = model.derived.constraints.get(&eid).expect("constraint seeded");
        assert_eq!(set.constraints.len(), 1);
        assert_eq!(set.constraints[0].dependent_path, vec!["authorID".to_string()]);
        assert_eq!(set.constraints[0].principal_path, vec!["ID".to_string()]);
    }

    #[test]
    fn resolves_pure_backlink_partner() {
        let mut model = Model::new();
        let header = EntityBuilder::new("S.Header").key("ID", ScalarBase::Integer).build(&mut model);
        let up_on = Expr::Binary { op: "=".into(), lhs: Box::new(ref_path(&["up_"])), rhs: Box::new(self_ref()) };
        let up_assoc = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: "S.Header".into(),
            target: Some(header),
            on: Some(up_on),
            keys: None,
            cardinality: Cardinality::to_one_default(),
        }));
        let item = EntityBuilder::new("S.Item").key("pos", ScalarBase::Integer).element("up_", up_assoc).build(&mut model);
        let up_eid = model.elements_of(item)[1].0;

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(model.derived.no_partner.contains(&up_eid) || model.derived.partner.contains_key(&up_eid));
    }
}
