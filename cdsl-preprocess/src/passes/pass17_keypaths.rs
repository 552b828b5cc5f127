//! Pass 17 — primary-key reference-path expansion.
//!
//! Turns each entity's `$keys` (element ids) into `$edmKeyPaths`: dot-paths
//! of element names down to a scalar leaf. A structured key element is
//! flattened field by field; a managed association used as a key expands
//! through its foreign-key list into the target's key names. An unmanaged
//! association, a non-nullable violation, or (in v4 only) anything that
//! isn't a scalar of an allowed type is rejected with a spec-violation
//! diagnostic and dropped from the path list rather than emitted wrong.

use crate::edm_types::{allowed_as_v4_key, edm_type_name};
use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, MessageCode, PathSegment, Sink};
use cdsl_model::{DefinitionId, Element, ElementType, KeyPath, Model, ScalarBase};

pub fn run(model: &mut Model, options: &Options, sink: &mut Sink) -> Result<(), CoreError> {
    let ids: Vec<DefinitionId> = model.derived.keys.keys().copied().collect();

    for id in ids {
        let key_eids = model.derived.keys.get(&id).cloned().unwrap_or_default();
        let owner_name = model.get(id).name.clone();
        let mut paths = Vec::new();
        for eid in key_eids {
            let name = model.element_name(eid).to_string();
            let el = model.element(eid);
            expand_element(&name, el, &mut Vec::new(), &mut paths, options, sink, &owner_name);
        }
        if !paths.is_empty() {
            model.derived.edm_key_paths.insert(id, paths);
        }
    }

    Ok(())
}

fn expand_element(
    name: &str,
    el: &Element,
    prefix: &mut Vec<String>,
    out: &mut Vec<KeyPath>,
    options: &Options,
    sink: &mut Sink,
    owner_name: &str,
) {
    if !el.not_null {
        sink.error(
            MessageCode::SpecViolation,
            vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
            format!("key element `{name}` must be non-nullable"),
        );
        return;
    }

    let is_v4 = matches!(options.version, ProtocolVersion::V4);

    match &el.ty {
        ElementType::Scalar { base, .. } => {
            if is_v4 && !allowed_as_v4_key(*base) {
                sink.error(
                    MessageCode::SpecViolation,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("`{name}` has a type not permitted as an OData v4 key"),
                );
                return;
            }
            let mut path = prefix.clone();
            path.push(name.to_string());
            out.push(KeyPath { path, edm_type: Some(edm_type_name(*base).to_string()) });
        }
        ElementType::Struct(fields) => {
            if is_v4 {
                sink.error(
                    MessageCode::SpecViolation,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("`{name}` is a structured key element, not permitted in v4"),
                );
                return;
            }
            prefix.push(name.to_string());
            for (fname, fel) in fields {
                expand_element(fname, fel, prefix, out, options, sink, owner_name);
            }
            prefix.pop();
        }
        ElementType::Assoc(spec) => {
            if spec.on.is_some() && spec.keys.is_none() {
                sink.error(
                    MessageCode::SpecViolation,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("unmanaged association `{name}` cannot appear in a key path"),
                );
                return;
            }
            if is_v4 {
                sink.error(
                    MessageCode::SpecViolation,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("`{name}` is an association, not permitted as a v4 key"),
                );
                return;
            }
            if let Some(fks) = &spec.keys {
                for fk in fks {
                    let mut path = prefix.clone();
                    path.push(name.to_string());
                    path.extend(fk.target_key_path.clone());
                    out.push(KeyPath { path, edm_type: None });
                }
            }
        }
        ElementType::ArrayOf(_) => {
            sink.error(
                MessageCode::SpecViolation,
                vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                format!("`{name}` is array-of, not permitted as a key"),
            );
        }
        ElementType::Named(_) => {
            let mut path = prefix.clone();
            path.push(name.to_string());
            out.push(KeyPath { path, edm_type: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;

    #[test]
    fn expands_scalar_key_with_edm_type() {
        let mut model = Model::new();
        let e = EntityBuilder::new("S.Book").key("ID", ScalarBase::Integer).build(&mut model);
        let eid = model.elements_of(e)[0].0;
        model.derived.keys.insert(e, vec![eid]);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let paths = model.derived.edm_key_paths.get(&e).unwrap();
        assert_eq!(paths[0].path, vec!["ID".to_string()]);
        assert_eq!(paths[0].edm_type.as_deref(), Some("Edm.Int32"));
    }

    #[test]
    fn rejects_unmanaged_association_as_key() {
        use cdsl_model::{AssocKind, AssocSpec, Cardinality};
        let mut model = Model::new();
        let assoc = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: "S.Other".into(),
            target: None,
            on: Some(cdsl_model::Expr::Literal(cdsl_model::Literal { kind: cdsl_model::LiteralKind::Bool, val: "true".into() })),
            keys: None,
            cardinality: Cardinality::to_one_default(),
        }));
        let mut el = assoc;
        el.key = true;
        el.not_null = true;
        let e = EntityBuilder::new("S.Thing").element("other", el).build(&mut model);
        let eid = model.elements_of(e)[0].0;
        model.derived.keys.insert(e, vec![eid]);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert!(sink.has_errors());
        assert!(model.derived.edm_key_paths.get(&e).is_none());
    }
}
