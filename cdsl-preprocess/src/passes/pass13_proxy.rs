//! Pass 13 — proxy exposure.
//!
//! An association crossing into another service's schema can't be rendered
//! as-is: the target isn't part of the surrounding service's entity
//! container. When cross-service references and proxies are both enabled,
//! the schema-level reference pass 12 installs already covers this and
//! nothing further is needed here. Otherwise, if proxies are enabled, a
//! synthetic keys-only entity is generated (its elements the target's
//! primary key, flattened through any managed-association key), cached per
//! `(target, surrounding service)` so two associations into the same
//! foreign entity share one proxy. If neither mode applies, the association
//! is simply marked non-navigable.
//!
//! Flattening only follows scalar and managed-association keys; a
//! non-scalar (structured) key element has no companion-type synthesis here
//! and is dropped from the proxy's key list.

use std::collections::HashSet;

use crate::options::Options;
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::builder::EntityBuilder;
use cdsl_model::{AnnotationValue, DefinitionId, Element, ElementId, ElementType, Model, ScalarBase, TypeFacets};

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let associations: Vec<(DefinitionId, ElementId, DefinitionId)> = model
        .ids()
        .flat_map(|owner| {
            model
                .elements_of(owner)
                .into_iter()
                .filter_map(move |(eid, el)| el.ty.as_assoc().and_then(|s| s.target).map(|t| (owner, eid, t)))
                .collect::<Vec<_>>()
        })
        .collect();

    for (owner, eid, target) in associations {
        let owner_schema = model.derived.my_schema_name.get(&owner).cloned();
        let target_schema = model.derived.my_schema_name.get(&target).cloned();
        let Some(owner_schema) = owner_schema else { continue };
        if owner_schema == target_schema.unwrap_or_default() {
            continue;
        }

        if options.odata_x_service_refs && options.odata_proxies {
            continue;
        }

        if options.odata_proxies {
            let Some(service_id) = model.by_name(&owner_schema) else { continue };
            let cache_key = (target, service_id);
            let proxy_id = match model.derived.cached_proxy.get(&cache_key) {
                Some(existing) => *existing,
                None => {
                    let proxy_id = build_proxy(model, target);
                    model.derived.cached_proxy.insert(cache_key, proxy_id);
                    model.derived.is_proxy.insert(proxy_id);
                    proxy_id
                }
            };
            if let Some(spec) = model.element_mut(eid).ty.as_assoc_mut() {
                spec.target = Some(proxy_id);
            }
        } else {
            model.element_mut(eid).annotations.insert("odata.navigable".to_string(), AnnotationValue::Bool(false));
        }
    }

    Ok(())
}

fn build_proxy(model: &mut Model, target: DefinitionId) -> DefinitionId {
    let target_name = model.get(target).name.clone();
    let mut visited = HashSet::new();
    let keys = flattened_keys(model, target, &mut visited);

    let mut builder = EntityBuilder::new(format!("{target_name}.Proxy"));
    for (name, base, facets) in keys {
        let mut el = Element::new(ElementType::Scalar { base, facets });
        el.key = true;
        el.not_null = true;
        builder = builder.element(name, el);
    }
    builder.build(model)
}

fn flattened_keys(model: &Model, def: DefinitionId, visited: &mut HashSet<DefinitionId>) -> Vec<(String, ScalarBase, TypeFacets)> {
    if !visited.insert(def) {
        return Vec::new();
    }

    let mut out = Vec::new();
    let Some(key_ids) = model.derived.keys.get(&def) else { return out };
    for eid in key_ids {
        let el = model.element(*eid);
        let name = model.element_name(*eid).to_string();
        match &el.ty {
            ElementType::Scalar { base, facets } => out.push((name, *base, *facets)),
            ElementType::Assoc(spec) => {
                if let Some(t) = spec.target {
                    for (sub_name, base, facets) in flattened_keys(model, t, visited) {
                        out.push((format!("{name}_{sub_name}"), base, facets));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use cdsl_model::builder::service;
    use cdsl_model::ScalarBase;

    #[test]
    fn creates_cached_proxy_for_cross_service_association() {
        let mut model = Model::new();
        service(&mut model, "Other");
        let target = EntityBuilder::new("Other.Partner").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.my_schema_name.insert(target, "Other".to_string());

        service(&mut model, "Main");
        let src1 = EntityBuilder::new("Main.Order").to_one("partner", "Other.Partner").build(&mut model);
        let src2 = EntityBuilder::new("Main.Quote").to_one("partner", "Other.Partner").build(&mut model);
        model.derived.my_schema_name.insert(src1, "Main".to_string());
        model.derived.my_schema_name.insert(src2, "Main".to_string());
        model.derived.keys.insert(target, vec![model.elements_of(target)[0].0]);

        let eid1 = model.elements_of(src1)[0].0;
        model.element_mut(eid1).ty.as_assoc_mut().unwrap().target = Some(target);
        let eid2 = model.elements_of(src2)[0].0;
        model.element_mut(eid2).ty.as_assoc_mut().unwrap().target = Some(target);

        let mut options = Options::new(ProtocolVersion::V4);
        options.odata_proxies = true;
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let proxy1 = model.elements_of(src1)[0].1.ty.as_assoc().unwrap().target.unwrap();
        let proxy2 = model.elements_of(src2)[0].1.ty.as_assoc().unwrap().target.unwrap();
        assert_eq!(proxy1, proxy2);
        assert!(model.derived.is_proxy.contains(&proxy1));
        assert_eq!(model.elements_of(proxy1).len(), 1);
    }

    #[test]
    fn disables_navigation_when_no_proxy_mode_enabled() {
        let mut model = Model::new();
        service(&mut model, "Other");
        let target = EntityBuilder::new("Other.Partner").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.my_schema_name.insert(target, "Other".to_string());
        service(&mut model, "Main");
        let src = EntityBuilder::new("Main.Order").to_one("partner", "Other.Partner").build(&mut model);
        model.derived.my_schema_name.insert(src, "Main".to_string());
        let eid = model.elements_of(src)[0].0;
        model.element_mut(eid).ty.as_assoc_mut().unwrap().target = Some(target);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.elements_of(src)[0].1.annotations.get("odata.navigable"), Some(&AnnotationValue::Bool(false)));
    }
}
