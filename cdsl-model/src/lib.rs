//! The in-memory model store (component **M** of the lowering engine):
//! definitions, elements, queries, expressions, references, annotations.
//! All mutation — by the external parser that populates it, and later by
//! [`cdsl_preprocess`] — goes through this crate's types.

pub mod annotation;
pub mod builder;
pub mod definition;
pub mod derived;
pub mod element;
pub mod expr;
pub mod ids;
pub mod query;
pub mod store;

pub use annotation::{AnnotationMap, AnnotationValue};
pub use definition::{
    AnnotationDef, AspectDef, BoundOperation, Definition, DefinitionKind, EntityDef, EventDef, OperationDef, Param,
    ScopeDef, TechnicalConfig, TypeBody, TypeDef,
};
pub use derived::{ConstraintSet, Derived, KeyPath, NavPropBinding, RefAction, RefConstraint};
pub use element::{AssocKind, AssocSpec, Bound, Cardinality, Element, ElementType, ForeignKey, ScalarBase, TypeFacets};
pub use expr::{Expr, Literal, LiteralKind, PathHead, PathStep, RefPath};
pub use ids::{DefinitionId, ElementId};
pub use query::{From, JoinKind, Query, Select, SelectColumn, SetOp, SetQuery};
pub use store::{Model, ModelMeta};
