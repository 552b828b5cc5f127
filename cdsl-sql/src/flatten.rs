//! Flattens structured elements and managed-association foreign keys into
//! the single-column shape the SQL renderer emits (spec §4.1 pass 8, §8
//! scenario 6: "In flat naming mode, the entity gets columns `x_a INTEGER`
//! and `x_b_b1 NVARCHAR(42)`; key/notNull from the containing element are
//! propagated; annotations of `x` merge into both flattened columns without
//! overwriting per-leaf annotations"). SQL has no structured-column notion
//! of its own, so every backend flattens regardless of the `odataFormat`
//! option — that option only governs the protocol renderer.

use cdsl_diagnostics::{MessageCode, PathSegment, Sink};
use cdsl_model::{DefinitionId, Element, ElementType, Expr, Model, ScalarBase, TypeBody, TypeFacets};
use cdsl_preprocess::Options;

#[derive(Debug, Clone)]
pub struct FlatColumn {
    pub name: String,
    pub base: ScalarBase,
    pub facets: TypeFacets,
    pub key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub virtual_: bool,
    pub default: Option<Expr>,
}

/// Flattens every persisted element of `id` into a leaf-column list, in
/// declaration order (spec §5 determinism).
pub fn flatten_entity(model: &Model, options: &Options, id: DefinitionId, sink: &mut Sink) -> Vec<FlatColumn> {
    let mut out = Vec::new();
    let owner_name = model.get(id).name.clone();
    for (eid, element) in model.elements_of(id) {
        let name = model.element_name(eid).to_string();
        flatten_element(model, options, &name, element, &mut out, sink, &owner_name);
    }
    out
}

fn flatten_element(model: &Model, options: &Options, name: &str, element: &Element, out: &mut Vec<FlatColumn>, sink: &mut Sink, owner_name: &str) {
    match &element.ty {
        ElementType::Scalar { base, facets } => out.push(FlatColumn {
            name: name.to_string(),
            base: *base,
            facets: *facets,
            key: element.key,
            not_null: element.not_null || element.key,
            unique: element.unique,
            virtual_: element.virtual_,
            default: element.default.clone(),
        }),
        ElementType::Named(type_name) => {
            let Some(tid) = model.by_name(type_name) else {
                sink.error(
                    MessageCode::Reference,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("type `{type_name}` referenced by `{name}` was not found"),
                );
                return;
            };
            match &model.get(tid).kind {
                cdsl_model::DefinitionKind::Type(t) => match &t.body {
                    TypeBody::Scalar { base, facets } => out.push(FlatColumn {
                        name: name.to_string(),
                        base: *base,
                        facets: *facets,
                        key: element.key,
                        not_null: element.not_null || element.key,
                        unique: element.unique,
                        virtual_: element.virtual_,
                        default: element.default.clone(),
                    }),
                    TypeBody::Structured(fields) => {
                        for (fname, fel) in fields {
                            flatten_nested(model, options, name, fname, element, fel, out, sink, owner_name);
                        }
                    }
                },
                _ => sink.error(
                    MessageCode::Reference,
                    vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                    format!("`{type_name}` is not a scalar or structured type definition"),
                ),
            }
        }
        ElementType::Struct(fields) => {
            for (fname, fel) in fields {
                flatten_nested(model, options, name, fname, element, fel, out, sink, owner_name);
            }
        }
        ElementType::ArrayOf(_) => {
            sink.info(
                MessageCode::SpecViolation,
                vec![PathSegment::Name(owner_name.to_string()), PathSegment::Element(name.to_string())],
                format!("`{name}` is an array-of element; SQL has no flat column representation for it and it is omitted"),
            );
        }
        ElementType::Assoc(spec) => {
            if !options.render_foreign_keys() {
                return;
            }
            let Some(fks) = &spec.keys else { return };
            for fk in fks {
                let col_name = fk.generated_field_name.clone().unwrap_or_else(|| format!("{name}_{}", fk.target_key_path.join("_")));
                let (base, facets) = spec
                    .target
                    .and_then(|t| resolve_target_key_type(model, t, &fk.target_key_path))
                    .unwrap_or((ScalarBase::String, TypeFacets { length: Some(options.default_string_length), ..Default::default() }));
                out.push(FlatColumn {
                    name: col_name,
                    base,
                    facets,
                    key: element.key,
                    not_null: element.not_null || element.key,
                    unique: false,
                    virtual_: false,
                    default: None,
                });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn flatten_nested(
    model: &Model,
    options: &Options,
    outer_name: &str,
    inner_name: &str,
    outer: &Element,
    inner: &Element,
    out: &mut Vec<FlatColumn>,
    sink: &mut Sink,
    owner_name: &str,
) {
    let flat_name = format!("{outer_name}_{inner_name}");
    let mut merged = inner.clone();
    merged.key = merged.key || outer.key;
    merged.not_null = merged.not_null || outer.not_null || merged.key;
    flatten_element(model, options, &flat_name, &merged, out, sink, owner_name);
}

/// Resolves the scalar type of `target`'s key path (usually a single-step
/// path like `["ID"]`), recursing through nested structured keys.
fn resolve_target_key_type(model: &Model, target: DefinitionId, path: &[String]) -> Option<(ScalarBase, TypeFacets)> {
    let Some((head, rest)) = path.split_first() else { return None };
    let el = model.elements_of(target).into_iter().find(|(eid, _)| model.element_name(*eid) == head)?.1;
    match &el.ty {
        ElementType::Scalar { base, facets } => Some((*base, *facets)),
        ElementType::Named(type_name) => {
            let tid = model.by_name(type_name)?;
            match &model.get(tid).kind {
                cdsl_model::DefinitionKind::Type(t) => match &t.body {
                    TypeBody::Scalar { base, facets } => Some((*base, *facets)),
                    TypeBody::Structured(fields) => {
                        let (fname, frest) = rest.split_first()?;
                        let fel = fields.get(fname)?;
                        scalar_of(fel, frest)
                    }
                },
                _ => None,
            }
        }
        ElementType::Struct(fields) => {
            let (fname, frest) = rest.split_first()?;
            let fel = fields.get(fname)?;
            scalar_of(fel, frest)
        }
        _ => None,
    }
}

fn scalar_of(el: &Element, rest: &[String]) -> Option<(ScalarBase, TypeFacets)> {
    match &el.ty {
        ElementType::Scalar { base, facets } => Some((*base, *facets)),
        ElementType::Struct(fields) => {
            let (fname, frest) = rest.split_first()?;
            scalar_of(fields.get(fname)?, frest)
        }
        _ => None,
    }
}
