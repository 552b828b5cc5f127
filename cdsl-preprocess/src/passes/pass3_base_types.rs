//! Pass 3 — base-type expansion (conditional).
//!
//! Only runs when the compile target is v2: every `Named` reference to a
//! user-defined scalar `type` is replaced by that type's final
//! `base`/`facets` pair, so a v2 renderer never has to chase a type alias.
//! References to structured types (themselves carrying nested elements) are
//! left alone; flattening those is a renderer concern, decided later.

use std::collections::HashMap;

use crate::options::{Options, ProtocolVersion};
use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::{DefinitionKind, Element, ElementType, Model, ScalarBase, TypeBody, TypeFacets};
use indexmap::IndexMap;

pub fn run(model: &mut Model, options: &Options, _sink: &mut Sink) -> Result<(), CoreError> {
    if !matches!(options.version, ProtocolVersion::V2) {
        return Ok(());
    }

    let table = collect_scalar_types(model);
    if table.is_empty() {
        return Ok(());
    }

    for id in model.ids() {
        let def = model.get_mut(id);
        match &mut def.kind {
            DefinitionKind::Entity(e) => expand_elements(&mut e.elements, &table),
            DefinitionKind::Type(t) => {
                if let TypeBody::Structured(els) = &mut t.body {
                    expand_elements(els, &table);
                }
            }
            DefinitionKind::Aspect(a) => expand_elements(&mut a.elements, &table),
            DefinitionKind::Event(e) => expand_elements(&mut e.elements, &table),
            _ => {}
        }
    }

    Ok(())
}

fn collect_scalar_types(model: &Model) -> HashMap<String, (ScalarBase, TypeFacets)> {
    let mut out = HashMap::new();
    for id in model.ids() {
        let def = model.get(id);
        if let DefinitionKind::Type(t) = &def.kind {
            if let TypeBody::Scalar { base, facets } = &t.body {
                out.insert(def.name.clone(), (*base, *facets));
            }
        }
    }
    out
}

fn expand_elements(elements: &mut IndexMap<String, Element>, table: &HashMap<String, (ScalarBase, TypeFacets)>) {
    for el in elements.values_mut() {
        expand_type(&mut el.ty, table);
    }
}

fn expand_type(ty: &mut ElementType, table: &HashMap<String, (ScalarBase, TypeFacets)>) {
    match ty {
        ElementType::Named(name) => {
            if let Some((base, facets)) = table.get(name) {
                *ty = ElementType::Scalar { base: *base, facets: *facets };
            }
        }
        ElementType::ArrayOf(inner) => expand_type(inner, table),
        ElementType::Struct(fields) => expand_elements(fields, table),
        ElementType::Assoc(_) | ElementType::Scalar { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_diagnostics::Sink;
    use cdsl_model::builder::{scalar_type, EntityBuilder, TypeBuilder};

    #[test]
    fn resolves_named_scalar_type_when_target_is_v2() {
        let mut model = Model::new();
        scalar_type(&mut model, "my.Currency", ScalarBase::String, TypeFacets { length: Some(3), ..Default::default() });
        let e = EntityBuilder::new("my.Order")
            .element("currency", Element::new(ElementType::Named("my.Currency".into())))
            .build(&mut model);

        let options = Options::new(ProtocolVersion::V2);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        let el = &model.elements_of(e)[0].1;
        assert_eq!(
            el.ty,
            ElementType::Scalar { base: ScalarBase::String, facets: TypeFacets { length: Some(3), ..Default::default() } }
        );
    }

    #[test]
    fn leaves_named_types_untouched_for_v4() {
        let mut model = Model::new();
        TypeBuilder::new("my.Currency").scalar("code", ScalarBase::String).build(&mut model);
        let e = EntityBuilder::new("my.Order")
            .element("currency", Element::new(ElementType::Named("my.Currency".into())))
            .build(&mut model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        run(&mut model, &options, &mut sink).unwrap();

        assert_eq!(model.elements_of(e)[0].1.ty, ElementType::Named("my.Currency".into()));
    }
}
