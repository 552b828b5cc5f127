//! Flattens a persisted entity's *data* elements (never its associations)
//! into leaf [`crate::tree::Property`] nodes for the `odataFormat: flat`
//! case (spec §4.1 pass 8 / §8 scenario 6), grounded on
//! `cdsl_sql::flatten`'s equivalent walk but additionally merging each
//! leaf's annotation map the way scenario 6 requires ("annotations of `x`
//! merge into both flattened columns without overwriting per-leaf
//! annotations") rather than dropping them, since this tree's `Property`
//! node (unlike `cdsl_sql::FlatColumn`) carries an annotation list on to
//! the protocol output.

use cdsl_model::{AnnotationMap, Element, ElementType, Model, ScalarBase};
use cdsl_preprocess::{edm_type_name, Options};

use crate::tree::Property;

pub fn flatten_properties(model: &Model, options: &Options, elements: &[(String, &Element)]) -> Vec<Property> {
    let mut out = Vec::new();
    for (name, element) in elements {
        if crate::build::is_hidden(element) {
            continue;
        }
        flatten_element(model, options, name, element, &mut out);
    }
    out
}

fn flatten_element(model: &Model, options: &Options, name: &str, element: &Element, out: &mut Vec<Property>) {
    match &element.ty {
        ElementType::Scalar { base, facets } => {
            let mut prop = scalar_property(name, *base, *facets, element);
            merge_annotations(&mut prop, &element.annotations);
            out.push(prop);
        }
        ElementType::Named(type_name) => {
            let Some(tid) = model.by_name(type_name) else { return };
            match &model.get(tid).kind {
                cdsl_model::DefinitionKind::Type(t) => match &t.body {
                    cdsl_model::TypeBody::Scalar { base, facets } => {
                        let mut prop = scalar_property(name, *base, *facets, element);
                        merge_annotations(&mut prop, &element.annotations);
                        out.push(prop);
                    }
                    cdsl_model::TypeBody::Structured(fields) => {
                        for (fname, fel) in fields {
                            flatten_nested(model, options, name, element, fname, fel, out);
                        }
                    }
                },
                _ => {}
            }
        }
        ElementType::Struct(fields) => {
            for (fname, fel) in fields {
                flatten_nested(model, options, name, element, fname, fel, out);
            }
        }
        ElementType::ArrayOf(_) => {
            // Array-of has no flat column representation; same omission
            // `cdsl_sql::flatten` reports as an info (spec §4.1 pass 8).
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
                    .unwrap_or((ScalarBase::String, cdsl_model::TypeFacets { length: Some(options.default_string_length), ..Default::default() }));
                let mut prop = Property::new(col_name, edm_type_name(base));
                prop.nullable = !(element.not_null || element.key);
                apply_facets(&mut prop, base, facets);
                out.push(prop);
            }
        }
    }
}

fn flatten_nested(model: &Model, options: &Options, outer_name: &str, outer: &Element, inner_name: &str, inner: &Element, out: &mut Vec<Property>) {
    let flat_name = format!("{outer_name}_{inner_name}");
    let mut merged = inner.clone();
    merged.key = merged.key || outer.key;
    merged.not_null = merged.not_null || outer.not_null || merged.key;
    let before = out.len();
    flatten_element(model, options, &flat_name, &merged, out);
    for prop in &mut out[before..] {
        for (k, v) in &outer.annotations {
            if !prop.annotations.iter().any(|(existing, _)| existing == k) {
                prop.annotations.push((k.clone(), v.clone()));
            }
        }
    }
}

fn scalar_property(name: &str, base: ScalarBase, facets: cdsl_model::TypeFacets, element: &Element) -> Property {
    let mut prop = Property::new(name, edm_type_name(base));
    prop.nullable = !(element.not_null || element.key);
    apply_facets(&mut prop, base, facets);
    prop
}

fn apply_facets(prop: &mut Property, base: ScalarBase, facets: cdsl_model::TypeFacets) {
    match base {
        ScalarBase::String | ScalarBase::Binary => prop.max_length = facets.length,
        ScalarBase::Decimal => {
            prop.precision = facets.precision;
            prop.scale = facets.scale;
        }
        ScalarBase::GeometryPoint | ScalarBase::GeometryLineString | ScalarBase::GeometryPolygon => prop.srid = facets.srid,
        _ => {}
    }
}

fn merge_annotations(prop: &mut Property, extra: &AnnotationMap) {
    for (k, v) in extra {
        prop.annotations.push((k.clone(), v.clone()));
    }
}

fn resolve_target_key_type(model: &Model, target: cdsl_model::DefinitionId, path: &[String]) -> Option<(ScalarBase, cdsl_model::TypeFacets)> {
    let (head, rest) = path.split_first()?;
    let el = model.elements_of(target).into_iter().find(|(eid, _)| model.element_name(*eid) == head)?.1;
    scalar_of(model, el, rest)
}

fn scalar_of(model: &Model, el: &Element, rest: &[String]) -> Option<(ScalarBase, cdsl_model::TypeFacets)> {
    match &el.ty {
        ElementType::Scalar { base, facets } => Some((*base, *facets)),
        ElementType::Named(type_name) => {
            let tid = model.by_name(type_name)?;
            match &model.get(tid).kind {
                cdsl_model::DefinitionKind::Type(t) => match &t.body {
                    cdsl_model::TypeBody::Scalar { base, facets } => Some((*base, *facets)),
                    cdsl_model::TypeBody::Structured(fields) => {
                        let (fname, frest) = rest.split_first()?;
                        scalar_of(model, fields.get(fname)?, frest)
                    }
                },
                _ => None,
            }
        }
        ElementType::Struct(fields) => {
            let (fname, frest) = rest.split_first()?;
            scalar_of(model, fields.get(fname)?, frest)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::{Element as E, ElementType as ET};
    use cdsl_preprocess::ProtocolVersion;

    fn opts() -> Options {
        Options::new(ProtocolVersion::V4)
    }

    #[test]
    fn flattens_nested_struct_and_merges_outer_annotations() {
        let mut model = Model::new();
        let mut inner = indexmap::IndexMap::new();
        let mut b1 = E::new(ET::Scalar { base: ScalarBase::String, facets: Default::default() });
        b1.annotations.insert("Core.Description".into(), cdsl_model::AnnotationValue::Str("leaf".into()));
        inner.insert("b1".to_string(), b1);
        let mut x = E::new(ET::Struct(inner));
        x.annotations.insert("UI.Hidden".into(), cdsl_model::AnnotationValue::Bool(true));
        let id = EntityBuilder::new("S.E").element("x", x).build(&mut model);

        let elements: Vec<(String, &E)> = model.elements_of(id).into_iter().map(|(eid, el)| (model.element_name(eid).to_string(), el)).collect();
        let props = flatten_properties(&model, &opts(), &elements);
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name, "x_b1");
        assert!(props[0].annotations.iter().any(|(k, _)| k == "Core.Description"));
        assert!(props[0].annotations.iter().any(|(k, _)| k == "UI.Hidden"));
    }
}
