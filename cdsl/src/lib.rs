//! Public entry point for the model-lowering engine (spec §1, §2).
//!
//! This crate owns no lowering logic of its own — it is the thin seam
//! described in spec §2's "Control flow": preprocess a [`cdsl_model::Model`]
//! once for a chosen [`Target`], then hand the enriched store to whichever
//! renderer(s) the caller asked for, and collect the accumulated
//! [`cdsl_diagnostics::Sink`] alongside the output. Parsing DDL source text
//! into the model and the upstream name-resolution/semantic checker that
//! produces it are out of scope (spec §1) and are the embedder's job; this
//! crate's input is always an already-built [`cdsl_model::Model`].

use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;
use cdsl_preprocess::{preprocess, Options};
use indexmap::IndexMap;

pub use cdsl_diagnostics::{MessageCode, Severity};
pub use cdsl_model::Model as CdslModel;
pub use cdsl_preprocess::{ODataFormat, ProtocolVersion, SqlChangeMode, SqlDialect, SqlSrc};
pub use cdsl_protocol::ProtocolFormat;

/// Which target artifact a compile should emit (spec §1: "one of several
/// target artifacts"). [`Options`] carries the preprocessing knobs that
/// apply regardless of target (naming mode, string-length default, ...);
/// `Target` only selects which renderer(s) consume the result, since e.g.
/// protocol XML and JSON for the same version share one preprocessing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Protocol(ProtocolFormat),
    Ddl,
    Sql,
}

/// Result of a single compile (spec §7: "The public entry returns the
/// accumulated message list alongside the (possibly partial) output").
#[derive(Debug)]
pub struct CompileResult {
    /// `{filename → text}` per spec §6 "Outputs"; empty if any error was
    /// recorded (spec §7: "Renderers refuse to emit if any error is
    /// present").
    pub files: IndexMap<String, String>,
    pub sink: Sink,
}

/// Preprocesses `model` in place for `options` (component **P**, spec
/// §4.1), then renders `target` from the enriched model.
///
/// Per spec §5 ("the preprocessor mutates its input in place and is not
/// reentrant over the same store"), `model` must not have already been
/// preprocessed for a different target; doing so silently produces
/// nonsensical output rather than an error, since the pipeline has no way
/// to detect a second run.
pub fn compile(model: &mut Model, options: &Options, target: Target) -> Result<CompileResult, CoreError> {
    let mut sink = preprocess(model, options)?;

    let rendered = match target {
        Target::Protocol(format) => cdsl_protocol::render(model, options, format, &mut sink)?,
        Target::Ddl => cdsl_ddl::render(model, options, &mut sink),
        Target::Sql => cdsl_sql::render(model, options, &mut sink),
    };

    // Spec §7: "Renderers refuse to emit if any error is present" — a
    // renderer may itself add errors while rendering (duplicate
    // persistence names under the chosen naming mode), so the check has
    // to happen after the render call, not before it.
    let files = if sink.has_errors() { IndexMap::new() } else { rendered };

    Ok(CompileResult { files, sink })
}

/// Compares two independently preprocessed snapshots of the same model
/// (component **Δ**, spec §4.6) and renders the result as dialect-specific
/// migration SQL (spec §6 "Outputs": `migrations`/`deletions` files).
///
/// Both `before` and `after` must already have been preprocessed for the
/// same target (normally [`Target::Sql`]'s options, since the differ's
/// output only makes sense fed into the SQL renderer); this function does
/// not call [`compile`] on either side itself, so that callers can diff two
/// snapshots compiled at different times without recompiling both.
pub fn diff(before: &Model, after: &Model, options: &Options) -> CompileResult {
    let plan = cdsl_differ::compare(before, after);
    let mut sink = Sink::new();
    let files = cdsl_sql::render_migration(&plan, before, after, options, &mut sink);
    CompileResult { files, sink }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::{service, EntityBuilder};
    use cdsl_preprocess::ProtocolVersion;
    use cdsl_model::ScalarBase;

    fn model_with_one_entity() -> Model {
        let mut model = Model::new();
        let id = EntityBuilder::new("my.bookshop.Books").key("ID", ScalarBase::Integer).string("title", 111).build(&mut model);
        model.derived.my_schema_name.insert(id, "my.bookshop".to_string());
        model
    }

    fn model_with_service() -> Model {
        let mut model = Model::new();
        service(&mut model, "my.bookshop");
        EntityBuilder::new("my.bookshop.Books").key("ID", ScalarBase::Integer).string("title", 111).build(&mut model);
        model
    }

    #[test]
    fn compiles_sql_target_end_to_end() {
        let mut model = model_with_one_entity();
        let options = Options::new(ProtocolVersion::V4);
        let result = compile(&mut model, &options, Target::Sql).expect("compile must not abort");
        assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());
        let sql = result.files.get("sql").expect("sql artifact present");
        assert!(sql.contains("CREATE TABLE"));
    }

    #[test]
    fn compiles_ddl_target_end_to_end() {
        let mut model = model_with_one_entity();
        let options = Options::new(ProtocolVersion::V4);
        let result = compile(&mut model, &options, Target::Ddl).expect("compile must not abort");
        assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());
        let body = result.files.get("my.bookshop").expect("artifact present");
        assert!(body.contains("entity Books"));
    }

    #[test]
    fn compiles_protocol_v4_xml_target_end_to_end() {
        let mut model = model_with_service();
        let options = Options::new(ProtocolVersion::V4);
        let result = compile(&mut model, &options, Target::Protocol(ProtocolFormat::Xml)).expect("compile must not abort");
        assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());
        let xml = result.files.get("my.bookshop.xml").expect("schema document present");
        assert!(xml.contains("EntityType"));
    }

    #[test]
    fn errors_suppress_output() {
        let mut model = Model::new();
        // Two entities resolving to the same local name under `plain`
        // naming collide; the SQL renderer records an error and the
        // compile's output dictionary comes back empty (spec §7).
        let a = EntityBuilder::new("my.svcA.Books").key("ID", ScalarBase::Integer).build(&mut model);
        let b = EntityBuilder::new("my.svcB.Books").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.my_schema_name.insert(a, "my.svcA".to_string());
        model.derived.my_schema_name.insert(b, "my.svcB".to_string());

        let options = Options::new(ProtocolVersion::V4);
        let result = compile(&mut model, &options, Target::Sql).expect("compile must not abort");
        assert!(result.sink.has_errors());
        assert!(result.files.is_empty());
    }

    #[test]
    fn diff_of_model_against_itself_is_empty() {
        let model = model_with_one_entity();
        let options = Options::new(ProtocolVersion::V4);
        let result = diff(&model, &model, &options);
        assert!(result.files.get("migrations").map(String::is_empty).unwrap_or(true));
        assert!(result.files.get("deletions").map(String::is_empty).unwrap_or(true));
    }
}
