use cdsl_model::{Cardinality, Literal, LiteralKind, ScalarBase, TypeFacets};
use cdsl_naming::{policy_for, NamingMode, NamingPolicy};
use cdsl_preprocess::SqlDialect;
use cdsl_render_core::Dialect;

/// HANA SQL: its own scalar vocabulary (`NVARCHAR`, `SECONDDATE`, the
/// `hana.ST_POINT` spatial family). Identifier quoting/case is driven by
/// the `sqlMapping` option (spec §6), not hardcoded to the dialect.
pub struct HanaDialect {
    naming: Box<dyn NamingPolicy>,
    default_string_length: u32,
}

impl HanaDialect {
    pub fn new(naming: Box<dyn NamingPolicy>, default_string_length: u32) -> Self {
        Self { naming, default_string_length }
    }
}

impl Dialect for HanaDialect {
    fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    fn map_type(&self, base: ScalarBase, facets: TypeFacets) -> String {
        match base {
            ScalarBase::String => format!("NVARCHAR({})", facets.length.unwrap_or(self.default_string_length)),
            ScalarBase::LargeString => "NCLOB".to_string(),
            ScalarBase::Boolean => "BOOLEAN".to_string(),
            ScalarBase::Integer => "INTEGER".to_string(),
            ScalarBase::Integer64 => "BIGINT".to_string(),
            ScalarBase::Decimal => match (facets.precision, facets.scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                _ => "DECIMAL".to_string(),
            },
            ScalarBase::Double => "DOUBLE".to_string(),
            ScalarBase::Date => "DATE".to_string(),
            ScalarBase::Time => "TIME".to_string(),
            ScalarBase::DateTime => "SECONDDATE".to_string(),
            ScalarBase::Timestamp => "TIMESTAMP".to_string(),
            ScalarBase::Binary => match facets.length {
                Some(l) => format!("VARBINARY({l})"),
                None => "VARBINARY".to_string(),
            },
            ScalarBase::LargeBinary => "BLOB".to_string(),
            ScalarBase::Uuid => "NVARCHAR(36)".to_string(),
            ScalarBase::GeometryPoint => format!("ST_POINT({})", facets.srid.unwrap_or(0)),
            ScalarBase::GeometryLineString | ScalarBase::GeometryPolygon => format!("ST_GEOMETRY({})", facets.srid.unwrap_or(0)),
        }
    }

    fn map_cast_target(&self, named_type: &str) -> String {
        named_type.to_uppercase()
    }

    fn map_func(&self, name: &str) -> Option<&str> {
        match name {
            "length" => Some("LENGTH"),
            "substring" => Some("SUBSTRING"),
            "concat" => Some("CONCAT"),
            _ => None,
        }
    }

    fn render_literal(&self, literal: &Literal) -> String {
        render_ansi_literal(literal)
    }

    fn magic_variable(&self, name: &str) -> Option<String> {
        match name {
            "user.id" => Some("SESSION_CONTEXT('APPLICATIONUSER')".to_string()),
            "now" => Some("CURRENT_UTCTIMESTAMP".to_string()),
            _ => None,
        }
    }

    fn render_join_cardinality(&self, cardinality: Option<Cardinality>) -> Option<String> {
        cardinality.map(|c| format!("[{},{}]", bound_token(c.src_max), bound_token(c.max)))
    }
}

/// SQLite: dynamically typed, so every scalar maps onto one of the five
/// storage classes rather than a rich vocabulary; no spatial/UUID types.
/// Identifier quoting/case is driven by the `sqlMapping` option (spec §6),
/// not hardcoded to the dialect.
pub struct SqliteDialect {
    naming: Box<dyn NamingPolicy>,
}

impl SqliteDialect {
    pub fn new(naming: Box<dyn NamingPolicy>) -> Self {
        Self { naming }
    }
}

impl Dialect for SqliteDialect {
    fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    fn map_type(&self, base: ScalarBase, _facets: TypeFacets) -> String {
        match base {
            ScalarBase::Integer | ScalarBase::Integer64 | ScalarBase::Boolean => "INTEGER".to_string(),
            ScalarBase::Double | ScalarBase::Decimal => "REAL".to_string(),
            ScalarBase::Binary | ScalarBase::LargeBinary => "BLOB".to_string(),
            ScalarBase::GeometryPoint | ScalarBase::GeometryLineString | ScalarBase::GeometryPolygon => "BLOB".to_string(),
            _ => "TEXT".to_string(),
        }
    }

    fn map_cast_target(&self, named_type: &str) -> String {
        named_type.to_uppercase()
    }

    fn map_func(&self, name: &str) -> Option<&str> {
        match name {
            "length" => Some("length"),
            "substring" => Some("substr"),
            "concat" => None,
            _ => None,
        }
    }

    fn render_literal(&self, literal: &Literal) -> String {
        render_ansi_literal(literal)
    }

    fn magic_variable(&self, name: &str) -> Option<String> {
        match name {
            "now" => Some("CURRENT_TIMESTAMP".to_string()),
            _ => None,
        }
    }

    /// SQLite's query planner has no join-cardinality annotation syntax.
    fn render_join_cardinality(&self, _cardinality: Option<Cardinality>) -> Option<String> {
        None
    }
}

fn render_ansi_literal(literal: &Literal) -> String {
    match literal.kind {
        LiteralKind::String => format!("'{}'", literal.val.replace('\'', "''")),
        LiteralKind::Number | LiteralKind::Bool => literal.val.clone(),
        LiteralKind::Date => format!("DATE '{}'", literal.val),
        LiteralKind::Time => format!("TIME '{}'", literal.val),
        LiteralKind::Timestamp => format!("TIMESTAMP '{}'", literal.val),
        LiteralKind::Binary => format!("X'{}'", literal.val),
        LiteralKind::Null => "NULL".to_string(),
    }
}

fn bound_token(bound: cdsl_model::Bound) -> String {
    match bound {
        cdsl_model::Bound::Fixed(n) => n.to_string(),
        cdsl_model::Bound::Many => "*".to_string(),
    }
}

/// Picks the dialect implementation for the `dialect` option (spec §4.4:
/// "two SQL dialects"), with identifier quoting/case taken from the
/// `sqlMapping` option (spec §6: "All quoting is driven by a `(mode,
/// dialect)` pair") rather than fixed per dialect. `SqlDialect::Plain` falls
/// back to the HANA dialect's ANSI-leaning type vocabulary, for targets that
/// want generic SQL without a specific engine's quirks.
pub fn dialect_for(kind: SqlDialect, mode: NamingMode, default_string_length: u32) -> Box<dyn Dialect> {
    match kind {
        SqlDialect::Hana => Box::new(HanaDialect::new(policy_for(mode), default_string_length)),
        SqlDialect::Sqlite => Box::new(SqliteDialect::new(policy_for(mode))),
        SqlDialect::Plain => Box::new(PlainAnsiDialect::new(policy_for(mode), default_string_length)),
    }
}

/// Generic ANSI SQL; shares HANA's type vocabulary since both are
/// statically typed SQL engines. Identifier quoting/case is driven by the
/// `sqlMapping` option, like every other dialect.
pub struct PlainAnsiDialect {
    naming: Box<dyn NamingPolicy>,
    inner: HanaDialect,
}

impl PlainAnsiDialect {
    pub fn new(naming: Box<dyn NamingPolicy>, default_string_length: u32) -> Self {
        // `inner` only supplies HANA's type/function vocabulary here; its own
        // naming policy is never read through `PlainAnsiDialect::naming()`.
        Self { naming, inner: HanaDialect::new(policy_for(NamingMode::Plain), default_string_length) }
    }
}

impl Dialect for PlainAnsiDialect {
    fn naming(&self) -> &dyn NamingPolicy {
        self.naming.as_ref()
    }

    fn map_type(&self, base: ScalarBase, facets: TypeFacets) -> String {
        self.inner.map_type(base, facets)
    }

    fn map_cast_target(&self, named_type: &str) -> String {
        named_type.to_uppercase()
    }

    fn map_func(&self, name: &str) -> Option<&str> {
        self.inner.map_func(name)
    }

    fn render_literal(&self, literal: &Literal) -> String {
        render_ansi_literal(literal)
    }

    fn magic_variable(&self, name: &str) -> Option<String> {
        self.inner.magic_variable(name)
    }

    fn render_join_cardinality(&self, cardinality: Option<Cardinality>) -> Option<String> {
        cardinality.map(|c| format!("[{},{}]", bound_token(c.src_max), bound_token(c.max)))
    }
}
