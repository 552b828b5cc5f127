//! Emits one `entity`/`type` block per persisted structural definition
//! (spec §4.4 point 2): columns, primary key, unique constraints,
//! referential constraints, and technical configuration.

use cdsl_model::{AssocKind, ConstraintSet, Derived, Element, ElementId, ElementType, Model};
use cdsl_preprocess::Options;
use cdsl_render_core::render_expr;

use crate::dialect::HdbcdsDialect;
use crate::naming::local_name;

pub fn render_entity(
    model: &Model,
    derived: &Derived,
    dialect: &HdbcdsDialect,
    options: &Options,
    id: cdsl_model::DefinitionId,
) -> String {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else {
        unreachable!("render_entity called on a non-entity definition");
    };

    let mut out = format!("entity {} {{\n", local_name(&def.name));

    for (eid, element) in model.elements_of(id) {
        let name = model.element_name(eid).to_string();
        if let Some(line) = render_element(model, derived, dialect, options, &name, Some(eid), element) {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    }

    out.push_str("};\n");

    if let Some(cfg) = &entity.technical_config {
        out.push_str(&render_technical_config(&def.name, cfg));
    }

    render_unique_constraints(model, id, &mut out);
    render_referential_constraints(model, derived, id, &mut out);

    out
}

/// Emits a standalone `type <Name> { ... };` block for a structured type
/// definition an entity's `Named(...)` element refers to.
pub fn render_type_def(model: &Model, derived: &Derived, dialect: &HdbcdsDialect, options: &Options, id: cdsl_model::DefinitionId) -> Option<String> {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Type(type_def) = &def.kind else {
        return None;
    };
    let cdsl_model::TypeBody::Structured(_) = &type_def.body else {
        return None;
    };

    let mut out = format!("type {} {{\n", local_name(&def.name));
    for (eid, element) in model.elements_of(id) {
        let name = model.element_name(eid).to_string();
        if let Some(line) = render_element(model, derived, dialect, options, &name, Some(eid), element) {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str("};\n");
    Some(out)
}

fn render_element(
    model: &Model,
    derived: &Derived,
    dialect: &HdbcdsDialect,
    options: &Options,
    name: &str,
    eid: Option<ElementId>,
    element: &Element,
) -> Option<String> {
    if element.virtual_ && !options.deprecated_render_virtual_elements {
        return None;
    }

    let mut prefix = String::new();
    if element.key {
        prefix.push_str("key ");
    }

    let type_token = render_type(model, derived, dialect, options, &element.ty, eid);
    let mut line = format!("{prefix}{name} : {type_token}");

    if element.not_null {
        line.push_str(" not null");
    }
    if element.unique && !element.key {
        line.push_str(" unique");
    }
    if let Some(default) = &element.default {
        line.push_str(&format!(" default {}", render_expr(dialect, default)));
    }
    line.push(';');
    Some(line)
}

fn render_type(
    model: &Model,
    derived: &Derived,
    dialect: &HdbcdsDialect,
    options: &Options,
    ty: &ElementType,
    eid: Option<ElementId>,
) -> String {
    use cdsl_render_core::Dialect;
    match ty {
        ElementType::Scalar { base, facets } => dialect.map_type(*base, *facets),
        ElementType::Named(name) => local_name(name),
        ElementType::ArrayOf(inner) => format!("many {}", render_type(model, derived, dialect, options, inner, None)),
        ElementType::Struct(fields) => {
            let mut out = String::from("{ ");
            for (i, (name, el)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                if let Some(rendered) = render_element(model, derived, dialect, options, name, None, el) {
                    out.push_str(rendered.trim_end_matches(';'));
                }
            }
            out.push_str(" }");
            out
        }
        ElementType::Assoc(assoc) => render_assoc(model, dialect, assoc),
    }
}

fn render_assoc(model: &Model, dialect: &HdbcdsDialect, assoc: &cdsl_model::AssocSpec) -> String {
    use cdsl_render_core::Dialect;
    let keyword = match assoc.kind {
        AssocKind::Association => "Association",
        AssocKind::Composition => "Composition",
    };
    let card = dialect.render_join_cardinality(Some(assoc.cardinality)).unwrap_or_default();
    let target_name = assoc.target.map(|t| local_name(&model.get(t).name)).unwrap_or_else(|| assoc.target_name.clone());

    let mut out = format!("{keyword} {card} to {target_name}");

    if let Some(on) = &assoc.on {
        out.push_str(&format!(" on {}", render_expr(dialect, on)));
    } else if let Some(keys) = &assoc.keys {
        let rendered_keys = keys
            .iter()
            .map(|fk| {
                let path = fk.target_key_path.join(".");
                match &fk.alias {
                    Some(alias) => format!("{path} as {alias}"),
                    None => path,
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(" {{ {rendered_keys} }}"));
    }

    out
}

fn render_technical_config(entity_name: &str, cfg: &cdsl_model::TechnicalConfig) -> String {
    let mut out = String::new();
    if let Some(row_store) = cfg.row_store {
        let store = if row_store { "ROW" } else { "COLUMN" };
        out.push_str(&format!("-- {entity_name}: {store} store\n"));
    }
    for index in &cfg.indices {
        out.push_str(&format!("create index {index} on {} ();\n", local_name(entity_name)));
    }
    for index in &cfg.fuzzy_indices {
        out.push_str(&format!("create fuzzy search index {index} on {} ();\n", local_name(entity_name)));
    }
    out
}

fn render_unique_constraints(model: &Model, id: cdsl_model::DefinitionId, out: &mut String) {
    let def = model.get(id);
    let cdsl_model::DefinitionKind::Entity(entity) = &def.kind else { return };
    let uniques: Vec<&str> = entity
        .elements
        .iter()
        .filter(|(_, el)| el.unique && !el.key)
        .map(|(name, _)| name.as_str())
        .collect();
    if !uniques.is_empty() {
        out.push_str(&format!(
            "alter entity {} add unique constraint ({});\n",
            local_name(&def.name),
            uniques.join(", ")
        ));
    }
}

/// Emits the finalized referential constraints the constraint engine
/// installed in pass 11, one `alter entity ... add constraint` line per
/// association element that carries a non-empty [`ConstraintSet`] (spec
/// §4.2, §4.4 point 2 "referential constraints ... as separate artifacts").
fn render_referential_constraints(model: &Model, derived: &Derived, id: cdsl_model::DefinitionId, out: &mut String) {
    for (eid, _) in model.elements_of(id) {
        let Some(set) = derived.constraints.get(&eid) else { continue };
        render_constraint_set(model, id, set, out);
    }
}

fn render_constraint_set(model: &Model, id: cdsl_model::DefinitionId, set: &ConstraintSet, out: &mut String) {
    for constraint in &set.constraints {
        out.push_str(&format!(
            "alter entity {} add constraint {} foreign key ({}) references ({}) on update {} on delete {};\n",
            local_name(&model.get(id).name),
            constraint.identifier,
            constraint.dependent_path.join("."),
            constraint.principal_path.join("."),
            ref_action_token(constraint.on_update),
            ref_action_token(constraint.on_delete),
        ));
    }
}

fn ref_action_token(action: cdsl_model::RefAction) -> &'static str {
    match action {
        cdsl_model::RefAction::Cascade => "cascade",
        cdsl_model::RefAction::Restrict => "restrict",
        cdsl_model::RefAction::SetNull => "set null",
        cdsl_model::RefAction::SetDefault => "set default",
        cdsl_model::RefAction::NoAction => "no action",
    }
}
