//! Pass 16 — navigation-property bindings (v4).
//!
//! For every association out of an entity that has its own entity set:
//! nothing is emitted for a to-many association into a singleton (a
//! singleton has no collection to bind against); otherwise if the target
//! was given navigation-target paths in pass 15, the binding path is
//! whichever of those starts with this entity's own unqualified name
//! (falling back to the first one recorded); otherwise, if the target has
//! its own entity set, the binding goes straight to that entity set's name,
//! qualified with its schema when it lives in a different one.

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionId, ElementId, Model, NavPropBinding};

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    if !matches!(options.version, ProtocolVersion::V4) {
        return Ok(());
    }

    let owners: Vec<DefinitionId> = model.sorted_ids().into_iter().filter(|id| model.derived.has_entity_set.contains(id)).collect();

    for owner in owners {
        let assocs: Vec<(ElementId, DefinitionId, bool)> = model
            .elements_of(owner)
            .into_iter()
            .filter_map(|(eid, el)| el.ty.as_assoc().and_then(|s| s.target.map(|t| (eid, t, s.cardinality.is_to_many()))))
            .collect();

        for (eid, target, is_to_many) in assocs {
            let target_is_singleton =
                model.get(target).annotations.get("odata.singleton").and_then(cdsl_model::AnnotationValue::as_bool).unwrap_or(false);
            if is_to_many && target_is_singleton {
                continue;
            }

            let owner_base = base_name(&model.get(owner).name);
            let binding_target = if let Some(paths) = model.derived.edm_tgt_paths.get(&target) {
                paths
                    .iter()
                    .find(|p| p.first().map(|h| h == &owner_base).unwrap_or(false))
                    .or_else(|| paths.first())
                    .map(|p| p.join("/"))
            } else if model.derived.has_entity_set.contains(&target) {
                let target_name = model.get(target).name.clone();
                let same_schema = model.derived.my_schema_name.get(&owner) == model.derived.my_schema_name.get(&target);
                Some(if same_schema { base_name(&target_name) } else { target_name })
            } else {
                None
            };

            if let Some(binding_target) = binding_target {
                let path = model.element_name(eid).to_string();
                model.derived.edm_npbs.entry(owner).or_default().push(NavPropBinding { path, target: binding_target });
            }
        }
    }

    Ok(())
}

fn base_name(fqn: &str) -> String {
    fqn.rsplit('.').next().unwrap_or(fqn).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;

    #[test]
    fn binds_directly_to_targets_own_entity_set() {
        let mut model = Model::new();
        let target = EntityBuilder::new("S.Author").key("ID", ScalarBase::Integer).build(&mut model);
        let src = EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).to_one("author", "S.Author").build(&mut model);
        let eid = model.elements_of(src)[1].0;
        model.element_mut(eid).ty.as_assoc_mut().unwrap().target = Some(target);
        model.derived.has_entity_set.insert(src);
        model.derived.has_entity_set.insert(target);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let bindings = model.derived.edm_npbs.get(&src).unwrap();
        assert_eq!(bindings[0].path, "author");
        assert_eq!(bindings[0].target, "Author");
    }

    #[test]
    fn binds_via_recorded_nav_target_path_when_target_has_no_entity_set() {
        let mut model = Model::new();
        let item = EntityBuilder::new("S.Item").key("pos", ScalarBase::Integer).build(&mut model);
        let header = EntityBuilder::new("S.Header").key("id", ScalarBase::Integer).compose_many("items", "S.Item").build(&mut model);
        let eid = model.elements_of(header)[1].0;
        model.element_mut(eid).ty.as_assoc_mut().unwrap().target = Some(item);
        model.derived.has_entity_set.insert(header);
        model.derived.edm_tgt_paths.insert(item, vec![vec!["items".to_string()]]);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let bindings = model.derived.edm_npbs.get(&header).unwrap();
        assert_eq!(bindings[0].target, "items");
    }
}
