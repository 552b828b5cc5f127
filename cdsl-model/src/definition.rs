use crate::annotation::AnnotationMap;
use crate::element::{Element, ScalarBase, TypeFacets};
use crate::ids::DefinitionId;
use cdsl_diagnostics::Span;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: ScalarBase,
    pub facets: TypeFacets,
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundOperation {
    pub params: IndexMap<String, Param>,
    pub returns: Option<String>,
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicalConfig {
    /// `@cds.persistence.journal`-style flags land here verbatim; the DDL/SQL
    /// renderers interpret `row_store` / `indices` / `fuzzy_indices`, the
    /// rest pass through as opaque annotations.
    pub row_store: Option<bool>,
    pub indices: Vec<String>,
    pub fuzzy_indices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    pub elements: IndexMap<String, Element>,
    pub query: Option<crate::query::Query>,
    pub params: Option<IndexMap<String, Param>>,
    pub includes: Vec<String>,
    pub technical_config: Option<TechnicalConfig>,
    pub actions: IndexMap<String, BoundOperation>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self {
            elements: IndexMap::new(),
            query: None,
            params: None,
            includes: Vec::new(),
            technical_config: None,
            actions: IndexMap::new(),
        }
    }
}

impl Default for EntityDef {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Structured(IndexMap<String, Element>),
    Scalar { base: ScalarBase, facets: TypeFacets },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub body: TypeBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AspectDef {
    pub elements: IndexMap<String, Element>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeDef;

#[derive(Debug, Clone, PartialEq)]
pub struct OperationDef {
    pub params: IndexMap<String, Param>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDef {
    pub elements: IndexMap<String, Element>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationDef {
    pub params: IndexMap<String, Param>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionKind {
    Entity(EntityDef),
    Type(TypeDef),
    Aspect(AspectDef),
    Service(ScopeDef),
    Context(ScopeDef),
    Namespace(ScopeDef),
    Action(OperationDef),
    Function(OperationDef),
    Event(EventDef),
    Annotation(AnnotationDef),
}

impl DefinitionKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DefinitionKind::Entity(_) => "entity",
            DefinitionKind::Type(_) => "type",
            DefinitionKind::Aspect(_) => "aspect",
            DefinitionKind::Service(_) => "service",
            DefinitionKind::Context(_) => "context",
            DefinitionKind::Namespace(_) => "namespace",
            DefinitionKind::Action(_) => "action",
            DefinitionKind::Function(_) => "function",
            DefinitionKind::Event(_) => "event",
            DefinitionKind::Annotation(_) => "annotation",
        }
    }

    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Service(_) | DefinitionKind::Context(_) | DefinitionKind::Namespace(_)
        )
    }

    /// Never persisted: aspects, scopes, actions/functions, events, and
    /// annotation definitions (spec §3 table).
    pub fn is_never_persisted(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Aspect(_)
                | DefinitionKind::Service(_)
                | DefinitionKind::Context(_)
                | DefinitionKind::Namespace(_)
                | DefinitionKind::Action(_)
                | DefinitionKind::Function(_)
                | DefinitionKind::Event(_)
                | DefinitionKind::Annotation(_)
        )
    }

    pub fn elements(&self) -> Option<&IndexMap<String, Element>> {
        match self {
            DefinitionKind::Entity(e) => Some(&e.elements),
            DefinitionKind::Type(t) => match &t.body {
                TypeBody::Structured(els) => Some(els),
                TypeBody::Scalar { .. } => None,
            },
            DefinitionKind::Aspect(a) => Some(&a.elements),
            DefinitionKind::Event(e) => Some(&e.elements),
            _ => None,
        }
    }

    pub fn elements_mut(&mut self) -> Option<&mut IndexMap<String, Element>> {
        match self {
            DefinitionKind::Entity(e) => Some(&mut e.elements),
            DefinitionKind::Type(t) => match &mut t.body {
                TypeBody::Structured(els) => Some(els),
                TypeBody::Scalar { .. } => None,
            },
            DefinitionKind::Aspect(a) => Some(&mut a.elements),
            DefinitionKind::Event(e) => Some(&mut e.elements),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub id: DefinitionId,
    pub name: String,
    pub location: Option<Span>,
    pub annotations: AnnotationMap,
    pub doc: Option<String>,
    pub kind: DefinitionKind,
}

impl Definition {
    pub fn new(id: DefinitionId, name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            id,
            name: name.into(),
            location: None,
            annotations: AnnotationMap::new(),
            doc: None,
            kind,
        }
    }
}
