//! Turns a [`cdsl_differ::DiffPlan`] into dialect-specific `ALTER TABLE`
//! statements (spec §4.6: "the SQL renderer turns the plan into
//! dialect-specific `ALTER TABLE` statements (or drop+add pairs when lossy,
//! depending on the configured change mode)").

use cdsl_differ::{DiffPlan, ElementChange, EntityDiff};
use cdsl_diagnostics::Sink;
use cdsl_model::Model;
use cdsl_preprocess::{Options, SqlChangeMode};
use cdsl_render_core::Dialect;
use indexmap::IndexMap;

use crate::artifact::assemble;
use crate::dialect::dialect_for;
use crate::flatten::flatten_entity;
use crate::naming::local_name;
use crate::table::render_create_table;

/// Renders `plan` (computed between `before` and `after`) into the
/// migration/deletion output dictionary. `before` supplies the definitions
/// needed to emit `DROP TABLE` for removed entities; `after` supplies the
/// definitions needed to emit `CREATE TABLE`/`ADD COLUMN` for additions.
pub fn render_migration(plan: &DiffPlan, before: &Model, after: &Model, options: &Options, sink: &mut Sink) -> IndexMap<String, String> {
    let dialect = dialect_for(options.dialect, options.sql_mapping.into(), options.default_string_length);

    let mut migrations = String::new();
    let mut deletions = String::new();

    for (entity_name, change) in &plan.entities {
        match change {
            EntityDiff::Added => {
                if let Some(id) = after.by_name(entity_name) {
                    if let Some(stmt) = render_create_table(after, dialect.as_ref(), options, id, sink) {
                        migrations.push_str(&stmt);
                    }
                }
            }
            EntityDiff::Removed => {
                deletions.push_str(&format!("DROP TABLE {};\n", dialect.quote(&local_name(entity_name))));
            }
            EntityDiff::Modified(changes) => {
                let table_name = dialect.quote(&local_name(entity_name));
                let Some(after_id) = after.by_name(entity_name) else { continue };
                let after_columns = flatten_entity(after, options, after_id, sink);

                for change in changes {
                    match change {
                        ElementChange::Added { name } => {
                            if let Some(col) = after_columns.iter().find(|c| &c.name == name) {
                                migrations.push_str(&format!(
                                    "ALTER TABLE {table_name} ADD COLUMN {} {};\n",
                                    dialect.quote(&col.name),
                                    dialect.map_type(col.base, col.facets)
                                ));
                            }
                        }
                        ElementChange::Removed { name } => {
                            migrations.push_str(&format!("ALTER TABLE {table_name} DROP COLUMN {};\n", dialect.quote(name)));
                        }
                        ElementChange::Modified { name, lossy, .. } => {
                            let Some(col) = after_columns.iter().find(|c| &c.name == name) else { continue };
                            let quoted = dialect.quote(&col.name);
                            let type_token = dialect.map_type(col.base, col.facets);
                            if *lossy && matches!(options.sql_change_mode, SqlChangeMode::Drop) {
                                migrations.push_str(&format!("ALTER TABLE {table_name} DROP COLUMN {quoted};\n"));
                                migrations.push_str(&format!("ALTER TABLE {table_name} ADD COLUMN {quoted} {type_token};\n"));
                            } else {
                                migrations.push_str(&format!("ALTER TABLE {table_name} ALTER COLUMN {quoted} {type_token};\n"));
                            }
                        }
                    }
                }
            }
        }
    }

    assemble(options.src, String::new(), String::new(), String::new(), String::new(), deletions, migrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;
    use cdsl_preprocess::ProtocolVersion;

    #[test]
    fn added_entity_emits_create_table_in_migrations() {
        let before = Model::new();
        let mut after = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).build(&mut after);

        let plan = cdsl_differ::compare(&before, &after);
        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        let files = render_migration(&plan, &before, &after, &options, &mut sink);
        assert!(files["migrations"].contains("CREATE TABLE"));
    }

    #[test]
    fn removed_entity_emits_drop_table_in_deletions() {
        let mut before = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).build(&mut before);
        let after = Model::new();

        let plan = cdsl_differ::compare(&before, &after);
        let options = Options::new(ProtocolVersion::V4);
        let mut sink = Sink::new();
        let files = render_migration(&plan, &before, &after, &options, &mut sink);
        assert!(files["deletions"].contains("DROP TABLE"));
    }

    #[test]
    fn lossy_modification_in_drop_mode_emits_drop_add_pair() {
        let mut before = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 200).build(&mut before);
        let mut after = Model::new();
        EntityBuilder::new("S.Books").key("ID", ScalarBase::Integer).string("title", 50).build(&mut after);

        let plan = cdsl_differ::compare(&before, &after);
        let mut options = Options::new(ProtocolVersion::V4);
        options.sql_change_mode = SqlChangeMode::Drop;
        let mut sink = Sink::new();
        let files = render_migration(&plan, &before, &after, &options, &mut sink);
        let migrations = &files["migrations"];
        assert!(migrations.contains("DROP COLUMN"));
        assert!(migrations.contains("ADD COLUMN"));
    }
}
