//! Pass 7 — parameterized-entity split.
//!
//! An entity declared with view parameters is split into two: `<E>Type`
//! (the original entity, renamed, holding the actual rows) and
//! `<E>Parameters` (a new companion entity addressable with the parameter
//! values, containing `<E>Type` through a contained composition named
//! `Set`). `<E>Type` gets a backlink association `Parameters` back to the
//! companion with on-condition `Parameters.Set = $self`. Every inbound
//! association recorded in `$sources` during pass 5 is redirected to the
//! companion, while the pre-redirection target is preserved in
//! `_originalTarget` so on-condition resolution downstream still has
//! something to walk.

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::builder::EntityBuilder;
use cdsl_model::{
    AssocKind, AssocSpec, Cardinality, DefinitionId, DefinitionKind, Element, ElementId, ElementType, Expr, Model,
    Param, PathHead, PathStep, RefPath,
};
use indexmap::IndexMap;

pub fn run(model: &mut Model, _options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let parameterized: Vec<(DefinitionId, String, IndexMap<String, Param>)> = model
        .ids()
        .filter_map(|id| {
            let def = model.get(id);
            match &def.kind {
                DefinitionKind::Entity(e) => e.params.clone().map(|params| (id, def.name.clone(), params)),
                _ => None,
            }
        })
        .collect();

    for (e_id, name, params) in parameterized {
        let type_name = format!("{name}Type");
        let companion_name = format!("{name}Parameters");

        let inherited_chain = model.derived.container_entity.get(&e_id).cloned();

        model.rename(e_id, type_name.clone());

        let mut companion_builder = EntityBuilder::new(companion_name);
        for (pname, param) in &params {
            let mut key_el = Element::new(ElementType::Scalar { base: param.ty, facets: param.facets });
            key_el.key = true;
            key_el.not_null = true;
            key_el.annotations = param.annotations.clone();
            companion_builder = companion_builder.element(pname.clone(), key_el);
        }
        let set_el = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Composition,
            target_name: type_name.clone(),
            target: Some(e_id),
            on: None,
            keys: None,
            cardinality: Cardinality::to_many_default(),
        }));
        companion_builder = companion_builder.element("Set", set_el);
        let companion_id = companion_builder.build(model);

        if let Some(set_eid) = find_element_id(model, companion_id, "Set") {
            model
                .element_mut(set_eid)
                .annotations
                .insert("odata.contained".to_string(), cdsl_model::AnnotationValue::Bool(true));
        }

        model.derived.parameters_companion.insert(e_id, companion_id);
        model.derived.is_containee.insert(e_id);
        model.derived.container_entity.entry(e_id).or_default().push(companion_id);

        let backlink_on = Expr::Binary {
            op: "=".to_string(),
            lhs: Box::new(Expr::Ref(RefPath {
                head: PathHead::Plain,
                steps: vec![PathStep::plain("Parameters"), PathStep::plain("Set")],
                param: false,
                global: false,
            })),
            rhs: Box::new(Expr::Ref(RefPath { head: PathHead::SelfRef, steps: vec![], param: false, global: false })),
        };
        let backlink_el = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: model.get(companion_id).name.clone(),
            target: Some(companion_id),
            on: Some(backlink_on),
            keys: None,
            cardinality: Cardinality::to_one_default(),
        }));
        if let DefinitionKind::Entity(e) = &mut model.get_mut(e_id).kind {
            e.elements.insert("Parameters".to_string(), backlink_el);
        }
        if let Some(backlink_eid) = find_element_id(model, e_id, "Parameters") {
            model.derived.is_to_container.insert(backlink_eid);
        }

        if let Some(chain) = inherited_chain {
            if !chain.is_empty() {
                model.derived.is_containee.insert(companion_id);
                model.derived.container_entity.entry(companion_id).or_default().extend(chain);
            }
        }

        let companion_display_name = model.get(companion_id).name.clone();
        let source_eids = model.derived.sources.remove(&e_id).unwrap_or_default();
        for source_eid in &source_eids {
            model.derived.original_target.insert(*source_eid, e_id);
            if let Some(spec) = model.element_mut(*source_eid).ty.as_assoc_mut() {
                spec.target = Some(companion_id);
                spec.target_name = companion_display_name.clone();
            }
        }
        if !source_eids.is_empty() {
            model.derived.sources.insert(companion_id, source_eids);
        }
    }

    Ok(())
}

fn find_element_id(model: &Model, owner: DefinitionId, name: &str) -> Option<ElementId> {
    model.elements_of(owner).into_iter().find(|(eid, _)| model.element_name(*eid) == name).map(|(eid, _)| eid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use cdsl_model::builder::EntityBuilder as EB;
    use cdsl_model::{ScalarBase, TypeFacets};

    #[test]
    fn splits_parameterized_entity_into_type_and_parameters_companion() {
        let mut model = Model::new();
        let source = EB::new("S.Consumer").to_one("view", "S.Report").build(&mut model);
        let e = EB::new("S.Report").key("id", ScalarBase::Integer).build(&mut model);
        if let DefinitionKind::Entity(ent) = &mut model.get_mut(e).kind {
            let mut params = IndexMap::new();
            params.insert(
                "from".to_string(),
                Param { ty: ScalarBase::Date, facets: TypeFacets::default(), annotations: Default::default() },
            );
            ent.params = Some(params);
        }
        model.derived.sources.entry(e).or_default().push(model.elements_of(source)[0].0);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.get(e).name, "S.ReportType");
        let companion = model.by_name("S.ReportParameters").expect("companion created");
        assert_eq!(model.derived.parameters_companion.get(&e), Some(&companion));

        let consumer_el = &model.elements_of(source)[0].1;
        assert_eq!(consumer_el.ty.as_assoc().unwrap().target, Some(companion));
        assert_eq!(model.derived.original_target.get(&model.elements_of(source)[0].0), Some(&e));
    }
}
