//! Emits `CREATE TABLE` (columns, primary key, unique constraints),
//! `CREATE INDEX`/fulltext-index statements from technical configuration,
//! and referential constraints as separate `ALTER TABLE ... ADD
//! CONSTRAINT` statements (spec §4.4 point 2).

use cdsl_diagnostics::Sink;
use cdsl_model::{ConstraintSet, Derived, DefinitionId, Model};
use cdsl_preprocess::Options;
use cdsl_render_core::{render_expr, Dialect};

use crate::flatten::{flatten_entity, FlatColumn};
use crate::naming::local_name;

/// Renders one `CREATE TABLE` statement for a persisted, non-query entity.
pub fn render_create_table(model: &Model, dialect: &dyn Dialect, options: &Options, id: DefinitionId, sink: &mut Sink) -> Option<String> {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else { return None };
    if entity.query.is_some() {
        return None;
    }

    let columns = flatten_entity(model, options, id, sink);
    if columns.is_empty() {
        return None;
    }

    let table_name = dialect.quote(&local_name(&def.name));
    let mut out = format!("CREATE TABLE {table_name} (\n");
    let mut lines: Vec<String> = columns.iter().filter(|c| !c.virtual_ || options.deprecated_render_virtual_elements).map(|c| render_column(dialect, c)).collect();

    let keys: Vec<&str> = columns.iter().filter(|c| c.key).map(|c| c.name.as_str()).collect();
    if !keys.is_empty() {
        let quoted: Vec<String> = keys.iter().map(|k| dialect.quote(k)).collect();
        lines.push(format!("  PRIMARY KEY ({})", quoted.join(", ")));
    }

    out.push_str(&lines.join(",\n"));
    out.push_str("\n);\n");

    for unique_group in unique_groups(&columns) {
        let quoted: Vec<String> = unique_group.iter().map(|n| dialect.quote(n)).collect();
        out.push_str(&format!("ALTER TABLE {table_name} ADD UNIQUE ({});\n", quoted.join(", ")));
    }

    Some(out)
}

fn render_column(dialect: &dyn Dialect, col: &FlatColumn) -> String {
    let mut line = format!("  {} {}", dialect.quote(&col.name), dialect.map_type(col.base, col.facets));
    if col.not_null {
        line.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default {
        line.push_str(&format!(" DEFAULT {}", render_expr(dialect, default)));
    }
    line
}

/// Every unique (non-key) column gets its own single-column constraint;
/// spec §8 scenario doesn't compose multi-column unique groups, so this
/// mirrors the DDL renderer's one-constraint-per-flagged-column behaviour.
fn unique_groups(columns: &[FlatColumn]) -> Vec<Vec<String>> {
    columns.iter().filter(|c| c.unique && !c.key).map(|c| vec![c.name.clone()]).collect()
}

/// Technical-configuration indices (spec §4.4 point 2: "dialect-specific
/// technical configuration (row/column store, indices, fuzzy indices)").
pub fn render_indices(model: &Model, dialect: &dyn Dialect, id: DefinitionId) -> Vec<String> {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else { return Vec::new() };
    let Some(cfg) = &entity.technical_config else { return Vec::new() };
    let table_name = dialect.quote(&local_name(&def.name));

    let mut out = Vec::new();
    for index in &cfg.indices {
        out.push(format!("CREATE INDEX {} ON {table_name} ();\n", dialect.quote(index)));
    }
    for index in &cfg.fuzzy_indices {
        out.push(format!("CREATE FUZZY SEARCH INDEX {} ON {table_name} ();\n", dialect.quote(index)));
    }
    out
}

/// Renders every finalized referential constraint on `id`'s association
/// elements as a standalone `ALTER TABLE ... ADD CONSTRAINT` statement
/// (spec §4.2 constraint engine output, §4.4 "referential constraints ...
/// as separate artifacts depending on dialect").
pub fn render_constraints(model: &Model, derived: &Derived, dialect: &dyn Dialect, id: DefinitionId) -> Vec<String> {
    let def = model.get(id);
    let table_name = dialect.quote(&local_name(&def.name));
    let mut out = Vec::new();
    for (eid, _) in model.elements_of(id) {
        let Some(set) = derived.constraints.get(&eid) else { continue };
        render_constraint_set(dialect, &table_name, set, &mut out);
    }
    out
}

fn render_constraint_set(dialect: &dyn Dialect, table_name: &str, set: &ConstraintSet, out: &mut Vec<String>) {
    for constraint in &set.constraints {
        let dependent: Vec<String> = constraint.dependent_path.iter().map(|p| dialect.quote(p)).collect();
        let principal: Vec<String> = constraint.principal_path.iter().map(|p| dialect.quote(p)).collect();
        out.push(format!(
            "ALTER TABLE {table_name} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES ({});\n",
            constraint.identifier,
            dependent.join(", "),
            principal.join(", "),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::dialect_for;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::ScalarBase;
    use cdsl_naming::NamingMode;
    use cdsl_preprocess::{Options, ProtocolVersion, SqlDialect};

    fn opts() -> Options {
        Options::new(ProtocolVersion::V4)
    }

    #[test]
    fn renders_create_table_with_key_and_columns() {
        let mut model = Model::new();
        let id = EntityBuilder::new("my.bookshop.Books").key("ID", ScalarBase::Integer).string("title", 111).build(&mut model);

        let dialect = dialect_for(SqlDialect::Hana, NamingMode::Quoted, 5000);
        let mut sink = Sink::new();
        let stmt = render_create_table(&model, dialect.as_ref(), &opts(), id, &mut sink).unwrap();
        assert!(stmt.contains("CREATE TABLE \"Books\""));
        assert!(stmt.contains("\"ID\" INTEGER NOT NULL"));
        assert!(stmt.contains("\"title\" NVARCHAR(111)"));
        assert!(stmt.contains("PRIMARY KEY (\"ID\")"));
        assert!(!sink.has_errors());
    }

    #[test]
    fn sqlite_dialect_uses_plain_uppercased_names() {
        let mut model = Model::new();
        let id = EntityBuilder::new("my.bookshop.Books").key("id", ScalarBase::Integer).build(&mut model);

        let dialect = dialect_for(SqlDialect::Sqlite, NamingMode::Plain, 5000);
        let mut sink = Sink::new();
        let stmt = render_create_table(&model, dialect.as_ref(), &opts(), id, &mut sink).unwrap();
        assert!(stmt.contains("CREATE TABLE BOOKS"));
        assert!(stmt.contains("ID INTEGER NOT NULL"));
    }
}
