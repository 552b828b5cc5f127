use crate::annotation::AnnotationMap;
use crate::expr::Expr;
use crate::ids::DefinitionId;
use indexmap::IndexMap;

/// A cardinality bound: a fixed non-negative count, or unbounded ("many").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Fixed(u32),
    Many,
}

/// `{srcMin, srcMax, min, max}` from spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub src_min: Bound,
    pub src_max: Bound,
    pub min: Bound,
    pub max: Bound,
}

impl Cardinality {
    /// `[1, 1, 0, many]`: the default for a to-many composition/association.
    pub fn to_many_default() -> Self {
        Self {
            src_min: Bound::Fixed(1),
            src_max: Bound::Fixed(1),
            min: Bound::Fixed(0),
            max: Bound::Many,
        }
    }

    pub fn to_one_default() -> Self {
        Self {
            src_min: Bound::Fixed(1),
            src_max: Bound::Fixed(1),
            min: Bound::Fixed(0),
            max: Bound::Fixed(1),
        }
    }

    pub fn is_to_many(&self) -> bool {
        self.max == Bound::Many
    }
}

/// A managed foreign-key mapping entry: `keys: [{ref: [...], as: name}]`.
/// After preprocessing every entry additionally carries the flattened
/// generated field name (spec §3 invariant on `$generatedFieldName`).
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub target_key_path: Vec<String>,
    pub alias: Option<String>,
    pub generated_field_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarBase {
    String,
    Boolean,
    Integer,
    Integer64,
    Decimal,
    Double,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    LargeString,
    LargeBinary,
    Uuid,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TypeFacets {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub srid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssocKind {
    Association,
    Composition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssocSpec {
    pub kind: AssocKind,
    pub target_name: String,
    /// Resolved in pass 5 ("Association linking").
    pub target: Option<DefinitionId>,
    pub on: Option<Expr>,
    pub keys: Option<Vec<ForeignKey>>,
    pub cardinality: Cardinality,
}

/// The element's "shape": scalar, array-of, reference to a named type, an
/// anonymous nested struct, or an association/composition. A sum type per
/// the design note, rather than a bag of optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Scalar { base: ScalarBase, facets: TypeFacets },
    /// Reference to another named `type`/`aspect` definition.
    Named(String),
    /// `items: <inner>` array-of wrapper.
    ArrayOf(Box<ElementType>),
    /// Anonymous nested struct (inline `{ ... }` elements).
    Struct(IndexMap<String, Element>),
    Assoc(AssocSpec),
}

impl ElementType {
    pub fn is_array_of(&self) -> bool {
        matches!(self, ElementType::ArrayOf(_))
    }

    pub fn as_assoc(&self) -> Option<&AssocSpec> {
        match self {
            ElementType::Assoc(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_assoc_mut(&mut self) -> Option<&mut AssocSpec> {
        match self {
            ElementType::Assoc(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub ty: ElementType,
    pub key: bool,
    pub not_null: bool,
    pub virtual_: bool,
    pub masked: bool,
    pub unique: bool,
    pub default: Option<Expr>,
    pub annotations: AnnotationMap,
    pub doc: Option<String>,
}

impl Element {
    pub fn new(ty: ElementType) -> Self {
        Self {
            ty,
            key: false,
            not_null: false,
            virtual_: false,
            masked: false,
            unique: false,
            default: None,
            annotations: AnnotationMap::new(),
            doc: None,
        }
    }

    pub fn is_association(&self) -> bool {
        matches!(self.ty, ElementType::Assoc(_))
    }

    pub fn is_composition(&self) -> bool {
        matches!(&self.ty, ElementType::Assoc(a) if a.kind == AssocKind::Composition)
    }
}
