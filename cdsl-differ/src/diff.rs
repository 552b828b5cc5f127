//! Component **Δ**: compares two fully-preprocessed model snapshots and
//! emits the add/drop/modify plan a SQL renderer turns into `ALTER TABLE`
//! statements (spec §4.6).

use std::collections::{BTreeMap, HashSet};

use cdsl_model::{DefinitionId, Element, ElementType, Model};

use crate::plan::{DiffPlan, ElementChange, EntityDiff};

/// `compare(before, after)` (spec §4.6): every persisted definition is
/// classified as an addition, a deletion, or (if present in both) walked
/// element-by-element.
pub fn compare(before: &Model, after: &Model) -> DiffPlan {
    let before_names: HashSet<&str> = persisted_names(before);
    let after_names: HashSet<&str> = persisted_names(after);

    let mut entities: BTreeMap<String, EntityDiff> = BTreeMap::new();

    for name in after_names.difference(&before_names) {
        entities.insert(name.to_string(), EntityDiff::Added);
    }
    for name in before_names.difference(&after_names) {
        entities.insert(name.to_string(), EntityDiff::Removed);
    }
    for name in before_names.intersection(&after_names) {
        let before_id = before.by_name(name).expect("name came from before's persisted set");
        let after_id = after.by_name(name).expect("name came from after's persisted set");
        let changes = diff_elements(before, before_id, after, after_id);
        if !changes.is_empty() {
            entities.insert(name.to_string(), EntityDiff::Modified(changes));
        }
    }

    DiffPlan { entities: entities.into_iter().collect() }
}

fn persisted_names(model: &Model) -> HashSet<&str> {
    model.iter().filter(|d| !d.kind.is_never_persisted()).map(|d| d.name.as_str()).collect()
}

fn diff_elements(before: &Model, before_id: DefinitionId, after: &Model, after_id: DefinitionId) -> Vec<ElementChange> {
    let before_elements: BTreeMap<&str, &Element> = before.elements_of(before_id).into_iter().map(|(eid, el)| (before.element_name(eid), el)).collect();
    let after_elements: BTreeMap<&str, &Element> = after.elements_of(after_id).into_iter().map(|(eid, el)| (after.element_name(eid), el)).collect();

    let mut out = Vec::new();
    for name in after_elements.keys() {
        if !before_elements.contains_key(name) {
            out.push(ElementChange::Added { name: name.to_string() });
        }
    }
    for name in before_elements.keys() {
        if !after_elements.contains_key(name) {
            out.push(ElementChange::Removed { name: name.to_string() });
        }
    }
    for (name, before_el) in &before_elements {
        if let Some(after_el) = after_elements.get(name) {
            if let Some((lossy, detail)) = classify(before_el, after_el) {
                out.push(ElementChange::Modified { name: name.to_string(), lossy, detail });
            }
        }
    }

    out.sort_by(|a, b| change_name(a).cmp(change_name(b)));
    out
}

fn change_name(c: &ElementChange) -> &str {
    match c {
        ElementChange::Added { name } | ElementChange::Removed { name } | ElementChange::Modified { name, .. } => name,
    }
}

/// Classifies one surviving element into safe/lossy-modified, or `None` if
/// nothing the differ tracks actually changed (spec §4.6: "An element is
/// *changed* if its type differs in a non-association-neutral way, or any
/// of `length/precision/scale/target/on/keys` changed, or its `doc`
/// changed. A type shrink... or any change crossing a managed-association
/// boundary is classified as *lossy*; anything else as *safe*.").
fn classify(before: &Element, after: &Element) -> Option<(bool, String)> {
    let mut lossy = false;
    let mut detail: Vec<String> = Vec::new();

    match (&before.ty, &after.ty) {
        (ElementType::Scalar { base: b0, facets: f0 }, ElementType::Scalar { base: b1, facets: f1 }) => {
            if b0 != b1 {
                detail.push("base type changed".to_string());
            }
            if f0.length != f1.length || f0.precision != f1.precision || f0.scale != f1.scale {
                if shrank(f0.length, f1.length) || shrank(f0.precision, f1.precision) || shrank(f0.scale, f1.scale) {
                    lossy = true;
                }
                detail.push("facets changed".to_string());
            }
        }
        (ElementType::Named(n0), ElementType::Named(n1)) => {
            if n0 != n1 {
                detail.push("referenced type changed".to_string());
            }
        }
        (ElementType::Assoc(a0), ElementType::Assoc(a1)) => {
            if a0.target_name != a1.target_name {
                lossy = true;
                detail.push("association target changed".to_string());
            }
            if a0.keys.is_some() != a1.keys.is_some() {
                lossy = true;
                detail.push("crossed the managed/unmanaged association boundary".to_string());
            }
            if a0.on != a1.on {
                detail.push("on-condition changed".to_string());
            }
            if a0.keys != a1.keys {
                detail.push("foreign keys changed".to_string());
            }
        }
        (a, b) => {
            if std::mem::discriminant(a) != std::mem::discriminant(b) {
                lossy = true;
                detail.push("element kind changed".to_string());
            }
        }
    }

    if before.doc != after.doc {
        detail.push("doc changed".to_string());
    }

    if detail.is_empty() {
        None
    } else {
        Some((lossy, detail.join("; ")))
    }
}

fn shrank(before: Option<u32>, after: Option<u32>) -> bool {
    matches!((before, after), (Some(b), Some(a)) if a < b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;

    fn sample() -> Model {
        let mut model = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 111).build(&mut model);
        model
    }

    #[test]
    fn idempotent_on_identical_snapshots() {
        let before = sample();
        let after = sample();
        let plan = compare(&before, &after);
        assert!(plan.is_empty(), "Δ(M, M) must be empty, got {plan:?}");
    }

    #[test]
    fn detects_addition_and_removal() {
        let mut before = Model::new();
        EntityBuilder::new("S.Old").key("ID", ScalarBase::Integer).build(&mut before);

        let mut after = Model::new();
        EntityBuilder::new("S.New").key("ID", ScalarBase::Integer).build(&mut after);

        let plan = compare(&before, &after);
        assert_eq!(plan.entities, vec![("S.New".to_string(), EntityDiff::Added), ("S.Old".to_string(), EntityDiff::Removed)]);
    }

    #[test]
    fn string_shrink_is_lossy() {
        let mut before = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 200).build(&mut before);
        let mut after = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 50).build(&mut after);

        let plan = compare(&before, &after);
        let EntityDiff::Modified(changes) = &plan.entities[0].1 else { panic!("expected modified") };
        let title_change = changes.iter().find(|c| matches!(c, ElementChange::Modified { name, .. } if name == "title")).unwrap();
        assert!(matches!(title_change, ElementChange::Modified { lossy: true, .. }));
    }

    #[test]
    fn string_growth_is_safe() {
        let mut before = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 50).build(&mut before);
        let mut after = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 200).build(&mut after);

        let plan = compare(&before, &after);
        let EntityDiff::Modified(changes) = &plan.entities[0].1 else { panic!("expected modified") };
        assert!(matches!(changes[0], ElementChange::Modified { lossy: false, .. }));
    }

    #[test]
    fn managed_to_unmanaged_boundary_crossing_is_lossy() {
        let mut before = Model::new();
        EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut before);
        let managed = cdsl_model::Element::new(ElementType::Assoc(cdsl_model::AssocSpec {
            kind: cdsl_model::AssocKind::Association,
            target_name: "S.Author".into(),
            target: None,
            on: None,
            keys: Some(vec![cdsl_model::ForeignKey { target_key_path: vec!["ID".into()], alias: None, generated_field_name: Some("author_ID".into()) }]),
            cardinality: cdsl_model::Cardinality::to_one_default(),
        }));
        EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).element("author", managed).build(&mut before);

        let mut after = Model::new();
        EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut after);
        let assoc = cdsl_model::Element::new(ElementType::Assoc(cdsl_model::AssocSpec {
            kind: cdsl_model::AssocKind::Association,
            target_name: "S.Author".into(),
            target: None,
            on: Some(cdsl_model::Expr::Literal(cdsl_model::Literal { kind: cdsl_model::LiteralKind::Bool, val: "true".into() })),
            keys: None,
            cardinality: cdsl_model::Cardinality::to_one_default(),
        }));
        EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).element("author", assoc).build(&mut after);

        let plan = compare(&before, &after);
        let EntityDiff::Modified(changes) = &plan.entities[0].1 else { panic!("expected modified") };
        assert!(matches!(changes[0], ElementChange::Modified { lossy: true, .. }));
    }
}
