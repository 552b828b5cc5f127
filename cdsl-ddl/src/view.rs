//! Emits a `view ... as select from ...` block for every query-bearing
//! entity (spec §4.4 point 3): the body is the same query tree the SQL
//! renderer walks, via the shared [`cdsl_render_core`] expression/query
//! renderer.

use cdsl_model::Model;
use cdsl_render_core::render_query;

use crate::dialect::HdbcdsDialect;
use crate::naming::local_name;

pub fn render_view(model: &Model, dialect: &HdbcdsDialect, id: cdsl_model::DefinitionId) -> Option<String> {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else {
        return None;
    };
    let query = entity.query.as_ref()?;

    Some(format!(
        "view {} as {};\n",
        local_name(&def.name),
        render_query(dialect, query, query.is_leading())
    ))
}
