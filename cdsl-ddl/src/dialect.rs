use cdsl_model::{Cardinality, Literal, LiteralKind, ScalarBase, TypeFacets};
use cdsl_naming::{HdbcdsPolicy, NamingPolicy};
use cdsl_render_core::Dialect;

/// The native object-DDL backend's [`Dialect`] (spec §4.4 point 4): quoted
/// identifiers, `::`-separated namespace segments, the database's own
/// scalar type names rather than a wire-protocol vocabulary.
pub struct HdbcdsDialect {
    policy: HdbcdsPolicy,
    default_string_length: u32,
}

impl HdbcdsDialect {
    pub fn new(default_string_length: u32) -> Self {
        Self { policy: HdbcdsPolicy, default_string_length }
    }
}

impl Dialect for HdbcdsDialect {
    fn naming(&self) -> &dyn NamingPolicy {
        &self.policy
    }

    fn map_type(&self, base: ScalarBase, facets: TypeFacets) -> String {
        match base {
            ScalarBase::String => format!("String({})", facets.length.unwrap_or(self.default_string_length)),
            ScalarBase::LargeString => "LargeString".to_string(),
            ScalarBase::Boolean => "Boolean".to_string(),
            ScalarBase::Integer => "Integer".to_string(),
            ScalarBase::Integer64 => "Integer64".to_string(),
            ScalarBase::Decimal => match (facets.precision, facets.scale) {
                (Some(p), Some(s)) => format!("Decimal({p}, {s})"),
                _ => "Decimal".to_string(),
            },
            ScalarBase::Double => "Double".to_string(),
            ScalarBase::Date => "Date".to_string(),
            ScalarBase::Time => "Time".to_string(),
            ScalarBase::DateTime => "DateTime".to_string(),
            ScalarBase::Timestamp => "Timestamp".to_string(),
            ScalarBase::Binary => match facets.length {
                Some(l) => format!("Binary({l})"),
                None => "Binary".to_string(),
            },
            ScalarBase::LargeBinary => "LargeBinary".to_string(),
            ScalarBase::Uuid => "UUID".to_string(),
            ScalarBase::GeometryPoint => format!("hana.ST_POINT({})", facets.srid.unwrap_or(0)),
            ScalarBase::GeometryLineString => format!("hana.ST_GEOMETRY({})", facets.srid.unwrap_or(0)),
            ScalarBase::GeometryPolygon => format!("hana.ST_GEOMETRY({})", facets.srid.unwrap_or(0)),
        }
    }

    fn map_cast_target(&self, named_type: &str) -> String {
        named_type.to_string()
    }

    fn map_func(&self, _name: &str) -> Option<&str> {
        None
    }

    fn render_literal(&self, literal: &Literal) -> String {
        match literal.kind {
            LiteralKind::String => format!("'{}'", literal.val.replace('\'', "''")),
            LiteralKind::Number | LiteralKind::Bool => literal.val.clone(),
            LiteralKind::Date => format!("date'{}'", literal.val),
            LiteralKind::Time => format!("time'{}'", literal.val),
            LiteralKind::Timestamp => format!("timestamp'{}'", literal.val),
            LiteralKind::Binary => format!("x'{}'", literal.val),
            LiteralKind::Null => "null".to_string(),
        }
    }

    fn magic_variable(&self, name: &str) -> Option<String> {
        match name {
            "user.id" => Some("session_context('APPLICATIONUSER')".to_string()),
            "user.locale" => Some("session_context('LOCALE')".to_string()),
            "now" => Some("current_utctimestamp".to_string()),
            _ => None,
        }
    }

    fn render_join_cardinality(&self, cardinality: Option<Cardinality>) -> Option<String> {
        cardinality.map(|c| format!("[{},{}]", bound_token(c.src_max), bound_token(c.max)))
    }
}

fn bound_token(bound: cdsl_model::Bound) -> String {
    match bound {
        cdsl_model::Bound::Fixed(n) => n.to_string(),
        cdsl_model::Bound::Many => "*".to_string(),
    }
}
