//! A small fluent builder for constructing [`Model`]s in tests without a
//! parser. The corpus's own test suites build fixtures as literal source
//! text (`indoc! { ... }` fed to a parser); since parsing DDL text is out of
//! scope here (spec §1 Non-goals), the equivalent fixture-building surface
//! is this builder instead.

use crate::definition::{Definition, DefinitionKind, EntityDef, TypeBody, TypeDef};
use crate::element::{AssocKind, AssocSpec, Cardinality, Element, ElementType, ScalarBase, TypeFacets};
use crate::ids::DefinitionId;
use crate::store::Model;
use indexmap::IndexMap;

pub struct EntityBuilder {
    name: String,
    elements: IndexMap<String, Element>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: IndexMap::new(),
        }
    }

    pub fn key(mut self, name: impl Into<String>, base: ScalarBase) -> Self {
        let mut el = Element::new(ElementType::Scalar {
            base,
            facets: TypeFacets::default(),
        });
        el.key = true;
        el.not_null = true;
        self.elements.insert(name.into(), el);
        self
    }

    pub fn scalar(mut self, name: impl Into<String>, base: ScalarBase) -> Self {
        self.elements
            .insert(name.into(), Element::new(ElementType::Scalar { base, facets: TypeFacets::default() }));
        self
    }

    pub fn string(mut self, name: impl Into<String>, length: u32) -> Self {
        let el = Element::new(ElementType::Scalar {
            base: ScalarBase::String,
            facets: TypeFacets { length: Some(length), ..Default::default() },
        });
        self.elements.insert(name.into(), el);
        self
    }

    pub fn to_one(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        let el = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: target.into(),
            target: None,
            on: None,
            keys: None,
            cardinality: Cardinality::to_one_default(),
        }));
        self.elements.insert(name.into(), el);
        self
    }

    pub fn to_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        let el = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Association,
            target_name: target.into(),
            target: None,
            on: None,
            keys: None,
            cardinality: Cardinality::to_many_default(),
        }));
        self.elements.insert(name.into(), el);
        self
    }

    pub fn compose_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        let el = Element::new(ElementType::Assoc(AssocSpec {
            kind: AssocKind::Composition,
            target_name: target.into(),
            target: None,
            on: None,
            keys: None,
            cardinality: Cardinality::to_many_default(),
        }));
        self.elements.insert(name.into(), el);
        self
    }

    pub fn element(mut self, name: impl Into<String>, element: Element) -> Self {
        self.elements.insert(name.into(), element);
        self
    }

    pub fn build(self, model: &mut Model) -> DefinitionId {
        let def = Definition::new(
            DefinitionId(0),
            self.name,
            DefinitionKind::Entity(EntityDef {
                elements: self.elements,
                ..EntityDef::new()
            }),
        );
        model.insert(def)
    }
}

pub struct TypeBuilder {
    name: String,
    elements: IndexMap<String, Element>,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), elements: IndexMap::new() }
    }

    pub fn element(mut self, name: impl Into<String>, element: Element) -> Self {
        self.elements.insert(name.into(), element);
        self
    }

    pub fn scalar(mut self, name: impl Into<String>, base: ScalarBase) -> Self {
        self.elements
            .insert(name.into(), Element::new(ElementType::Scalar { base, facets: TypeFacets::default() }));
        self
    }

    pub fn build(self, model: &mut Model) -> DefinitionId {
        let def = Definition::new(
            DefinitionId(0),
            self.name,
            DefinitionKind::Type(TypeDef { body: TypeBody::Structured(self.elements) }),
        );
        model.insert(def)
    }
}

pub fn service(model: &mut Model, name: impl Into<String>) -> DefinitionId {
    let def = Definition::new(DefinitionId(0), name, DefinitionKind::Service(crate::definition::ScopeDef));
    model.insert(def)
}

/// A `type X : <scalar>` alias definition, as opposed to [`TypeBuilder`]'s
/// structured `type X { ... }`.
pub fn scalar_type(model: &mut Model, name: impl Into<String>, base: ScalarBase, facets: TypeFacets) -> DefinitionId {
    let def = Definition::new(DefinitionId(0), name, DefinitionKind::Type(TypeDef { body: TypeBody::Scalar { base, facets } }));
    model.insert(def)
}
