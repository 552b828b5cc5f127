//! Pass 2 — dotted-name normalization.
//!
//! An entity/type/action/function whose fully-qualified name still has dots
//! in the portion *inside* its enclosing service or context (e.g.
//! `my.Service.Nested.Entity`, service `my.Service`, inner `Nested.Entity`)
//! needs those dots resolved one way or another before any renderer can turn
//! the name into a single flat identifier. Two strategies, selected by
//! [`Options::beta_dotted_name_services`]:
//!
//! - default: collapse every dot in the inner portion to `_`, and rewrite
//!   every `type`/`target`/`includes`/`returns` reference that pointed at
//!   the old name.
//! - beta: register a synthetic service for each dotted prefix so the
//!   longest-prefix lookup in [`crate::services::service_for`] treats the
//!   dotted segment as a sub-service boundary instead. The leaf name keeps
//!   its dots; nothing needs rewriting.
//!
//! A rename that would collide with an existing (or another renamed)
//! definition is fatal: the two can no longer be told apart by name.

use std::collections::{HashMap, HashSet};

use crate::options::Options;
use crate::services::{discover_services, service_for};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionId, DefinitionKind, Element, ElementType, Model, TypeBody};
use indexmap::IndexMap;

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    let services = model.derived.service_order.clone();
    if services.is_empty() {
        return Ok(());
    }

    if options.beta_dotted_name_services {
        install_synthetic_services(model, &services);
        return Ok(());
    }

    let mut candidates: Vec<(DefinitionId, String, String)> = Vec::new();
    for id in model.ids() {
        let def = model.get(id);
        if def.kind.is_scope() {
            continue;
        }
        let name = def.name.clone();
        let Some(svc) = service_for(model, &services, &name) else {
            continue;
        };
        let svc_name = model.get(svc).name.clone();
        if name.len() <= svc_name.len() + 1 {
            continue;
        }
        let inner = &name[svc_name.len() + 1..];
        if !inner.contains('.') {
            continue;
        }
        let new_name = format!("{svc_name}.{}", inner.replace('.', "_"));
        candidates.push((id, name, new_name));
    }

    if candidates.is_empty() {
        return Ok(());
    }

    let mut final_names: HashSet<String> = model.ids().map(|id| model.get(id).name.clone()).collect();
    for (_, old, _) in &candidates {
        final_names.remove(old);
    }

    let mut renames: HashMap<String, String> = HashMap::new();
    for (_, old, new_name) in &candidates {
        if final_names.contains(new_name) || renames.values().any(|v| v == new_name) {
            return Err(CoreError::Invariant(format!(
                "dotted-name normalization collision: `{old}` would become `{new_name}`, which already exists"
            )));
        }
        renames.insert(old.clone(), new_name.clone());
    }

    for (id, _, new_name) in candidates {
        model.rename(id, new_name);
    }
    rewrite_references(model, &renames);

    Ok(())
}

/// Ensures a `Service` definition exists for every dotted prefix between a
/// definition's owning service and its own leaf segment, then refreshes
/// `$serviceOrder` so later passes see the new boundaries.
fn install_synthetic_services(model: &mut Model, services: &[DefinitionId]) {
    let mut to_insert: Vec<String> = Vec::new();
    for id in model.ids() {
        let def = model.get(id);
        if def.kind.is_scope() {
            continue;
        }
        let name = def.name.clone();
        let Some(svc) = service_for(model, services, &name) else {
            continue;
        };
        let svc_name = model.get(svc).name.clone();
        if name.len() <= svc_name.len() + 1 {
            continue;
        }
        let inner = &name[svc_name.len() + 1..];
        let segments: Vec<&str> = inner.split('.').collect();
        for depth in 1..segments.len() {
            let prefix = format!("{svc_name}.{}", segments[..depth].join("."));
            if !model.contains_name(&prefix) && !to_insert.contains(&prefix) {
                to_insert.push(prefix);
            }
        }
    }

    for svc_name in to_insert {
        cdsl_model::builder::service(model, svc_name);
    }
    model.derived.service_order = discover_services(model);
}

fn rewrite_references(model: &mut Model, renames: &HashMap<String, String>) {
    for id in model.ids() {
        let def = model.get_mut(id);
        match &mut def.kind {
            DefinitionKind::Entity(e) => {
                for inc in &mut e.includes {
                    if let Some(new_name) = renames.get(inc) {
                        *inc = new_name.clone();
                    }
                }
                rewrite_elements(&mut e.elements, renames);
                for op in e.actions.values_mut() {
                    rewrite_returns(&mut op.returns, renames);
                }
            }
            DefinitionKind::Type(t) => {
                if let TypeBody::Structured(els) = &mut t.body {
                    rewrite_elements(els, renames);
                }
            }
            DefinitionKind::Aspect(a) => rewrite_elements(&mut a.elements, renames),
            DefinitionKind::Event(e) => rewrite_elements(&mut e.elements, renames),
            DefinitionKind::Action(op) | DefinitionKind::Function(op) => {
                rewrite_returns(&mut op.returns, renames);
            }
            _ => {}
        }
    }
}

fn rewrite_returns(returns: &mut Option<String>, renames: &HashMap<String, String>) {
    if let Some(r) = returns {
        if let Some(new_name) = renames.get(r) {
            *r = new_name.clone();
        }
    }
}

fn rewrite_elements(elements: &mut IndexMap<String, Element>, renames: &HashMap<String, String>) {
    for el in elements.values_mut() {
        rewrite_element_type(&mut el.ty, renames);
    }
}

fn rewrite_element_type(ty: &mut ElementType, renames: &HashMap<String, String>) {
    match ty {
        ElementType::Named(name) => {
            if let Some(new_name) = renames.get(name) {
                *name = new_name.clone();
            }
        }
        ElementType::ArrayOf(inner) => rewrite_element_type(inner, renames),
        ElementType::Struct(fields) => rewrite_elements(fields, renames),
        ElementType::Assoc(spec) => {
            if let Some(new_name) = renames.get(&spec.target_name) {
                spec.target_name = new_name.clone();
            }
        }
        ElementType::Scalar { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use crate::services::discover_services;
    use cdsl_model::builder::{service, EntityBuilder, TypeBuilder};
    use cdsl_model::ScalarBase;
    use cdsl_diagnostics::Sink;

    #[test]
    fn collapses_inner_dots_to_underscores_by_default() {
        let mut model = Model::new();
        service(&mut model, "my.Service");
        let e = EntityBuilder::new("my.Service.Nested.Entity").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.service_order = discover_services(&model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.get(e).name, "my.Service.Nested_Entity");
    }

    #[test]
    fn rewrites_named_type_references_after_rename() {
        let mut model = Model::new();
        service(&mut model, "my.Service");
        TypeBuilder::new("my.Service.Nested.Color").scalar("code", ScalarBase::String).build(&mut model);
        let e = EntityBuilder::new("my.Service.Entity")
            .element("shade", Element::new(ElementType::Named("my.Service.Nested.Color".into())))
            .build(&mut model);
        model.derived.service_order = discover_services(&model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let renamed = model.elements_of(e)[0].1;
        assert_eq!(renamed.ty, ElementType::Named("my.Service.Nested_Color".into()));
    }

    #[test]
    fn rename_collision_is_fatal() {
        let mut model = Model::new();
        service(&mut model, "my.Service");
        EntityBuilder::new("my.Service.Nested.Entity").key("ID", ScalarBase::Integer).build(&mut model);
        EntityBuilder::new("my.Service.Nested_Entity").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.service_order = discover_services(&model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        assert!(run(&mut model, &options, &mut sink).is_err());
    }

    #[test]
    fn beta_mode_registers_synthetic_sub_service_instead_of_renaming() {
        let mut model = Model::new();
        service(&mut model, "my.Service");
        let e = EntityBuilder::new("my.Service.Nested.Entity").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.service_order = discover_services(&model);

        let mut options = Options::new(ProtocolVersion::V4);
        options.beta_dotted_name_services = true;
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.get(e).name, "my.Service.Nested.Entity");
        assert!(model.contains_name("my.Service.Nested"));
        assert!(matches!(model.get_mut(model.by_name("my.Service.Nested").unwrap()).kind, DefinitionKind::Service(_)));
    }
}
