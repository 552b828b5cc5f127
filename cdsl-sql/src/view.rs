//! Emits `CREATE VIEW` for every query-bearing entity (spec §4.4 point 3),
//! via the shared expression/query renderer.

use cdsl_model::{DefinitionId, Model};
use cdsl_render_core::{render_query, Dialect};

use crate::naming::local_name;

pub fn render_view(model: &Model, dialect: &dyn Dialect, id: DefinitionId) -> Option<String> {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else { return None };
    let query = entity.query.as_ref()?;

    Some(format!(
        "CREATE VIEW {} AS {};\n",
        dialect.quote(&local_name(&def.name)),
        render_query(dialect, query, query.is_leading())
    ))
}
