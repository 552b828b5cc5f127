//! Helpers shared by [`crate::entity`], [`crate::view`] and
//! [`crate::artifact`] for turning a fully-qualified definition name into
//! the name a single native-object-DDL artifact file uses for it (spec
//! §4.4 point 4: "group definitions by top-level artifact").

use cdsl_model::{Derived, Model};

/// The grouping key for a definition: its installed `$mySchemaName` (pass
/// 4), or its own fully-qualified name when it was never attached to a
/// schema (top-level types/entities with no surrounding service).
pub fn artifact_of(model: &Model, derived: &Derived, id: cdsl_model::DefinitionId) -> String {
    derived.schema_of(id).map(str::to_string).unwrap_or_else(|| model.get(id).name.clone())
}

/// Strips the artifact prefix off a definition's name so the same-artifact
/// rendering can use a short local identifier.
pub fn local_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, last)) => last.to_string(),
        None => name.to_string(),
    }
}
