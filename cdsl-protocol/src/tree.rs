//! The object tree component **O** builds from the enriched model before
//! emitting it (spec §4.5): `Edm -> Schema -> (EntityType | ComplexType |
//! EntityContainer -> EntitySet/Singleton -> NavigationPropertyBinding |
//! Action | Function | Annotations)`. Every node here is format-neutral;
//! [`crate::xml`] and [`crate::json`] each walk the same tree and decide
//! for themselves which attributes apply to their format (spec: "Attributes
//! split into XML-only and JSON-only dictionaries so a single node can
//! render differently per format" — modeled here as each renderer simply
//! ignoring the fields it has no use for, rather than literally splitting
//! attribute dictionaries, since Rust's field access already gives each
//! renderer that choice without duplicating storage).

use cdsl_model::AnnotationValue;

/// One `@key: value` pair carried through to emission unchanged. Order
/// matters (author's annotation order is preserved, spec `AnnotationMap`).
pub type Annotations = Vec<(String, AnnotationValue)>;

#[derive(Debug, Clone)]
pub struct EdmDocument {
    /// One [`Schema`] per service/namespace the preprocessor attached a
    /// `$mySchemaName` to, plus any schema synthesized by pass 13's proxy
    /// companion types or pass 2's beta dotted-name sub-services.
    pub schemas: Vec<Schema>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub namespace: String,
    pub entity_types: Vec<EntityType>,
    pub complex_types: Vec<ComplexType>,
    pub container: Option<EntityContainer>,
    pub actions: Vec<Operation>,
    pub functions: Vec<Operation>,
    /// A schema folded into a cross-service reference (pass 12): rendered
    /// as a `<edmx:Reference Uri="..">` / `{"$Reference": {...}}` stub
    /// instead of its own `<Schema>` body.
    pub reference: Option<SchemaReference>,
    /// Annotation targets grouped under this schema that aren't attached
    /// directly to an `EntityType`/`Property` node (spec §6 "a separate
    /// file per annotation target group").
    pub annotation_groups: Vec<AnnotationGroup>,
}

impl Schema {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            container: None,
            actions: Vec::new(),
            functions: Vec::new(),
            reference: None,
            annotation_groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaReference {
    pub uri: String,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct AnnotationGroup {
    pub target: String,
    pub annotations: Annotations,
}

#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,
    /// `$edmKeyPaths`, dot-joined (pass 17). Empty for a structural type
    /// that never got a key (aspects never reach this tree; every
    /// `EntityType` node is keyed, including proxies, per spec §8 "proxy
    /// ... carries the transitive primary-key closure").
    pub key: Vec<String>,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
    pub annotations: Annotations,
    pub has_stream: bool,
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub name: String,
    pub properties: Vec<Property>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    /// Either a builtin `Edm.*` name (pass 18's cache) or another schema
    /// type's qualified name (structured element, flat format off).
    pub edm_type: String,
    pub collection: bool,
    pub nullable: bool,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub srid: Option<u32>,
    pub annotations: Annotations,
}

impl Property {
    pub fn new(name: impl Into<String>, edm_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edm_type: edm_type.into(),
            collection: false,
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            srid: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationProperty {
    pub name: String,
    pub target_type: String,
    pub collection: bool,
    pub nullable: bool,
    /// The partner navigation property's name on the target type, when
    /// pass 9 resolved a backlink (`_partnerCsn`).
    pub partner: Option<String>,
    /// `(dependent, principal)` property-name pairs from pass 11's final
    /// constraint set.
    pub referential_constraints: Vec<(String, String)>,
    /// `@odata.contained` (pass 6): emitted as `ContainsTarget="true"`.
    pub contains_target: bool,
    pub annotations: Annotations,
}

#[derive(Debug, Clone)]
pub struct EntityContainer {
    pub name: String,
    pub entity_sets: Vec<EntitySet>,
    pub singletons: Vec<Singleton>,
    pub action_imports: Vec<OperationImport>,
    pub function_imports: Vec<OperationImport>,
}

#[derive(Debug, Clone)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: String,
    pub navigation_bindings: Vec<NavigationPropertyBinding>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone)]
pub struct Singleton {
    pub name: String,
    pub entity_type: String,
    pub navigation_bindings: Vec<NavigationPropertyBinding>,
}

/// Pass 16's `{Path, Target}` binding, carried verbatim into the tree.
#[derive(Debug, Clone)]
pub struct NavigationPropertyBinding {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub bound: bool,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OperationImport {
    pub name: String,
    pub operation: String,
}
