//! Pass 5 — association linking.
//!
//! Resolves every association/composition element's `target_name` to a
//! concrete [`DefinitionId`], registers the element against the target's
//! `$sources` table when the target is parameterized (pass 7 needs this to
//! redirect inbound associations), and auto-flags untagged compositions as
//! contained in v4 when the containment option is on.

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, MessageCode, PathSegment, Sink};
use cdsl_model::{AnnotationValue, AssocKind, DefinitionId, DefinitionKind, ElementId, Model};

pub fn run(model: &mut Model, options: &Options, sink: &mut Sink) -> Result<(), CoreError> {
    let mut resolved: Vec<(ElementId, Option<DefinitionId>, AssocKind)> = Vec::new();

    for id in model.ids() {
        for (eid, el) in model.elements_of(id) {
            if let Some(spec) = el.ty.as_assoc() {
                let target = model.by_name(&spec.target_name);
                if target.is_none() {
                    sink.error(
                        MessageCode::Reference,
                        vec![PathSegment::Name(model.get(id).name.clone()), PathSegment::Element(model.element_name(eid).to_string())],
                        format!("association target `{}` not found", spec.target_name),
                    );
                }
                resolved.push((eid, target, spec.kind.clone()));
            }
        }
    }

    for (eid, target, _) in &resolved {
        if let Some(t) = target {
            if let Some(spec) = model.element_mut(*eid).ty.as_assoc_mut() {
                spec.target = Some(*t);
            }
        }
    }

    for (eid, target, _) in &resolved {
        if let Some(t) = target {
            let target_has_params = matches!(&model.get(*t).kind, DefinitionKind::Entity(e) if e.params.is_some());
            if target_has_params {
                model.derived.sources.entry(*t).or_default().push(*eid);
            }
        }
    }

    let auto_contain = matches!(options.version, ProtocolVersion::V4) && options.odata_containment;
    if auto_contain {
        for (eid, _, kind) in &resolved {
            if *kind == AssocKind::Composition {
                let el = model.element_mut(*eid);
                if !el.annotations.contains_key("odata.contained") {
                    el.annotations.insert("odata.contained".to_string(), AnnotationValue::Bool(true));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProtocolVersion;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;

    #[test]
    fn resolves_target_and_registers_as_source_when_target_is_parameterized() {
        let mut model = Model::new();
        let target = EntityBuilder::new("S.Target").key("ID", ScalarBase::Integer).build(&mut model);
        if let DefinitionKind::Entity(e) = &mut model.get_mut(target).kind {
            e.params = Some(indexmap::IndexMap::new());
        }
        let src = EntityBuilder::new("S.Source").to_one("tgt", "S.Target").build(&mut model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let el = &model.elements_of(src)[0].1;
        assert_eq!(el.ty.as_assoc().unwrap().target, Some(target));
        assert_eq!(model.derived.sources.get(&target).map(|v| v.len()), Some(1));
    }

    #[test]
    fn auto_contains_untagged_composition_in_v4_with_containment_option() {
        let mut model = Model::new();
        EntityBuilder::new("S.Child").key("ID", ScalarBase::Integer).build(&mut model);
        let parent = EntityBuilder::new("S.Parent").compose_many("children", "S.Child").build(&mut model);

        let mut options = Options::new(ProtocolVersion::V4);
        options.odata_containment = true;
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let el = &model.elements_of(parent)[0].1;
        assert_eq!(el.annotations.get("odata.contained"), Some(&AnnotationValue::Bool(true)));
    }

    #[test]
    fn missing_target_reports_a_reference_error() {
        let mut model = Model::new();
        EntityBuilder::new("S.Source").to_one("tgt", "S.Missing").build(&mut model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();
        assert!(sink.has_errors());
    }
}
