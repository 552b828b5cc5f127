//! Schema-local name helpers shared by [`crate::build`], mirroring
//! `cdsl_ddl::naming`/`cdsl_sql::naming`'s split between a definition's full
//! store name and the short identifier a single schema artifact uses for
//! it.

use cdsl_model::{DefinitionId, Model};

/// Strips a `$mySchemaName` prefix (and the separating dot) off a fully
/// qualified definition name, the way the DDL/SQL backends strip their
/// artifact prefix before emitting a local identifier.
pub fn local_name<'a>(schema: &str, fqn: &'a str) -> &'a str {
    fqn.strip_prefix(schema).and_then(|rest| rest.strip_prefix('.')).unwrap_or(fqn)
}

/// The EDM-qualified type name a `Property`/`NavigationProperty` uses to
/// reference `target`: bare local name when `target` lives in `from_schema`,
/// `Namespace.Type` otherwise (EDM has no relative cross-schema references).
pub fn qualified_ref(model: &Model, from_schema: &str, target: DefinitionId) -> String {
    let name = model.get(target).name.clone();
    match model.derived.schema_of(target) {
        Some(schema) if schema == from_schema => local_name(schema, &name).to_string(),
        Some(schema) => format!("{schema}.{}", local_name(schema, &name)),
        None => name,
    }
}
