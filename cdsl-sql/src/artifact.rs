//! Assembles the per-target output dictionary from the table/view/index/
//! constraint fragments (spec §6 "Outputs": "either a single `sql`
//! dictionary or one file per kind (`hdbtable`, `hdbview`, `hdbindex`,
//! `hdbconstraint`, `deletions`, `migrations`)"), and detects duplicate
//! persistence names under the chosen naming mode (spec §4.4 point 5).
//!
//! Referential constraints are emitted as standalone `ALTER TABLE ... ADD
//! CONSTRAINT` statements rather than inline in `CREATE TABLE`, which is
//! also what sidesteps the "topologically order artifacts" requirement of
//! spec §2 for tables: a constraint added after every table exists is valid
//! regardless of table-creation order. Views are ordered by declaration
//! order (their `sorted_ids()` walk), which is sufficient since CDS doesn't
//! allow forward references from a view to a not-yet-declared view.

use cdsl_diagnostics::{MessageCode, PathSegment, Sink};
use cdsl_model::Model;
use cdsl_preprocess::{Options, SqlSrc};
use cdsl_render_core::Dialect;
use indexmap::IndexMap;
use std::collections::HashMap;

use crate::dialect::dialect_for;
use crate::naming::local_name;
use crate::table::{render_constraints, render_create_table, render_indices};
use crate::view::render_view;

/// Renders the whole model as SQL (spec §4.4 D/S skeleton, applied to the
/// SQL backend): walks persisted entities for tables, query-bearing
/// entities for views, then constraints and indices, and assembles the
/// result per the `src` option.
pub fn render(model: &Model, options: &Options, sink: &mut Sink) -> IndexMap<String, String> {
    let dialect = dialect_for(options.dialect, options.sql_mapping.into(), options.default_string_length);

    let mut tables = String::new();
    let mut views = String::new();
    let mut indices = String::new();
    let mut constraints = String::new();

    for id in model.sorted_ids() {
        let def = model.get(id);
        if def.kind.is_never_persisted() || model.derived.superseded.contains(&id) {
            continue;
        }

        match &def.kind {
            cdsl_model::DefinitionKind::Entity(entity) if entity.query.is_some() => {
                if let Some(stmt) = render_view(model, dialect.as_ref(), id) {
                    views.push_str(&stmt);
                }
            }
            cdsl_model::DefinitionKind::Entity(_) => {
                if let Some(stmt) = render_create_table(model, dialect.as_ref(), options, id, sink) {
                    tables.push_str(&stmt);
                }
                for idx in render_indices(model, dialect.as_ref(), id) {
                    indices.push_str(&idx);
                }
                for c in render_constraints(model, &model.derived, dialect.as_ref(), id) {
                    constraints.push_str(&c);
                }
            }
            _ => {}
        }
    }

    report_duplicate_names(model, dialect.as_ref(), sink);

    assemble(options.src, tables, views, indices, constraints, String::new(), String::new())
}

/// Combines the rendered fragments per the `src` option: a single `sql`
/// dictionary entry (spec §6), or one entry per kind for HDI output. Also
/// used by `migration.rs` to assemble the deletions/migrations dictionary.
pub(crate) fn assemble(
    src: SqlSrc,
    tables: String,
    views: String,
    indices: String,
    constraints: String,
    deletions: String,
    migrations: String,
) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    match src {
        SqlSrc::Sql => {
            let mut all = String::new();
            all.push_str(&tables);
            all.push_str(&views);
            all.push_str(&indices);
            all.push_str(&constraints);
            all.push_str(&deletions);
            all.push_str(&migrations);
            if !all.is_empty() {
                out.insert("sql".to_string(), all);
            }
        }
        SqlSrc::Hdi => {
            for (key, text) in [
                ("hdbtable", tables),
                ("hdbview", views),
                ("hdbindex", indices),
                ("hdbconstraint", constraints),
                ("deletions", deletions),
                ("migrations", migrations),
            ] {
                if !text.is_empty() {
                    out.insert(key.to_string(), text);
                }
            }
        }
    }
    out
}

fn report_duplicate_names(model: &Model, dialect: &dyn Dialect, sink: &mut Sink) {
    let mut seen: HashMap<String, String> = HashMap::new();
    for id in model.sorted_ids() {
        let def = model.get(id);
        if def.kind.is_never_persisted() || model.derived.superseded.contains(&id) {
            continue;
        }
        let quoted = dialect.quote(&local_name(&def.name));
        if let Some(previous) = seen.insert(quoted.clone(), def.name.clone()) {
            sink.error(
                MessageCode::Duplicate,
                vec![PathSegment::Name(def.name.clone())],
                format!("`{}` and `{}` both render to `{quoted}` under the chosen naming mode", previous, def.name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;
    use cdsl_preprocess::ProtocolVersion;

    #[test]
    fn sql_src_mode_bundles_into_one_file() {
        let mut model = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).build(&mut model);

        let mut options = Options::new(ProtocolVersion::V4);
        options.src = cdsl_preprocess::SqlSrc::Sql;
        let mut sink = Sink::new();
        let files = render(&model, &options, &mut sink);
        assert!(files.contains_key("sql"));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn hdi_src_mode_splits_by_kind() {
        let mut model = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).build(&mut model);

        let mut options = Options::new(ProtocolVersion::V4);
        options.src = cdsl_preprocess::SqlSrc::Hdi;
        let mut sink = Sink::new();
        let files = render(&model, &options, &mut sink);
        assert!(files.contains_key("hdbtable"));
        assert!(!files.contains_key("hdbview"));
    }

    #[test]
    fn duplicate_local_names_reported() {
        let mut model = Model::new();
        EntityBuilder::new("A.Books").key("ID", ScalarBase::Integer).build(&mut model);
        EntityBuilder::new("B.Books").key("ID", ScalarBase::Integer).build(&mut model);

        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        render(&model, &options, &mut sink);
        assert!(sink.has_errors());
    }
}
