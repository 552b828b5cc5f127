//! End-to-end scenario tests (spec §8), driven through the public
//! [`cdsl::compile`] entry point rather than through individual pass
//! internals — the detailed per-pass assertions for these same scenarios
//! live in `cdsl_preprocess`'s own integration tests; this file checks that
//! the facade wires preprocessing and rendering together correctly.

use cdsl::{ProtocolFormat, Target};
use cdsl_model::builder::{service, EntityBuilder};
use cdsl_model::{
    AnnotationValue, AssocKind, AssocSpec, Cardinality, DefinitionKind, Element, ElementType, Expr, Model, Param, PathHead, PathStep, RefPath,
    ScalarBase, TypeFacets,
};
use cdsl_preprocess::{Options, ProtocolVersion};

fn ref_path(steps: &[&str]) -> Expr {
    Expr::Ref(RefPath { head: PathHead::Plain, steps: steps.iter().map(PathStep::plain).collect(), param: false, global: false })
}

fn self_ref() -> Expr {
    Expr::Ref(RefPath { head: PathHead::SelfRef, steps: vec![], param: false, global: false })
}

/// Scenario 1 (containment): a composition tagged `@odata.contained` is
/// rendered as a navigation property on the container's entity set, and the
/// contained entity itself is never given its own entity set.
#[test]
fn containment_renders_single_navigation_binding() {
    let mut model = Model::new();
    service(&mut model, "S");

    let up_on = Expr::Binary { op: "=".into(), lhs: Box::new(ref_path(&["up_"])), rhs: Box::new(self_ref()) };
    let up_assoc = Element::new(ElementType::Assoc(AssocSpec {
        kind: AssocKind::Association,
        target_name: "S.Header".into(),
        target: None,
        on: Some(up_on),
        keys: None,
        cardinality: Cardinality::to_one_default(),
    }));
    EntityBuilder::new("S.Item").key("pos", ScalarBase::Integer).element("up_", up_assoc).build(&mut model);
    let header = EntityBuilder::new("S.Header").key("id", ScalarBase::Integer).compose_many("items", "S.Item").build(&mut model);

    let items_eid = model.elements_of(header)[1].0;
    model.element_mut(items_eid).annotations.insert("odata.contained".to_string(), AnnotationValue::Bool(true));

    let mut options = Options::new(ProtocolVersion::V4);
    options.odata_containment = true;

    let result = cdsl::compile(&mut model, &options, Target::Protocol(ProtocolFormat::Xml)).expect("compile must not abort");
    assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());

    let doc = result.files.get("S.xml").expect("schema document for S");
    assert!(doc.contains("EntityType Name=\"Header\""));
    assert!(!doc.contains("EntitySet Name=\"Item\""));
}

/// Scenario 2 (parameterized-entity split): `entity E(p: Integer) { key id;
/// }` is split into `EType`/`EParameters` before rendering, so the DDL
/// output names both and not the original `E`.
#[test]
fn parameterized_entity_split_renders_companion_and_type() {
    let mut model = Model::new();
    let e = EntityBuilder::new("my.bookshop.E").key("id", ScalarBase::Integer).build(&mut model);
    model.derived.my_schema_name.insert(e, "my.bookshop".to_string());
    if let DefinitionKind::Entity(entity) = &mut model.get_mut(e).kind {
        let mut params = indexmap::IndexMap::new();
        params.insert("p".to_string(), Param { ty: ScalarBase::Integer, facets: TypeFacets::default(), annotations: Default::default() });
        entity.params = Some(params);
    }

    let options = Options::new(ProtocolVersion::V4);
    let result = cdsl::compile(&mut model, &options, Target::Ddl).expect("compile must not abort");
    assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());

    let body = result.files.get("my.bookshop").expect("artifact present");
    assert!(body.contains("entity EType"));
    assert!(body.contains("entity EParameters"));
    assert!(!body.contains("entity E {"));
}

/// Scenario 5 (dotted-name collapse): `service S { entity A.B.C { key id }
/// }` renders as `S.A_B_C`.
#[test]
fn dotted_name_collapses_to_underscores() {
    let mut model = Model::new();
    service(&mut model, "S");
    let e = EntityBuilder::new("S.A.B.C").key("id", ScalarBase::Integer).build(&mut model);
    model.derived.my_schema_name.insert(e, "S".to_string());

    let options = Options::new(ProtocolVersion::V4);
    let result = cdsl::compile(&mut model, &options, Target::Ddl).expect("compile must not abort");
    assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());

    let body = result.files.get("S").expect("artifact present");
    assert!(body.contains("entity A_B_C"));
    assert!(model.by_name("S.A_B_C").is_some());
}

/// Scenario 6 (structured-type SQL flattening): `type T { a: Integer; b: {
/// b1: String(42) } }` used as element `x: T` flattens, end to end through
/// [`cdsl::compile`], to columns `x_a`/`x_b_b1` in the emitted `CREATE
/// TABLE` (the detailed per-leaf annotation/key-propagation assertions for
/// this same scenario live in `cdsl_sql::flatten`'s own unit tests).
#[test]
fn structured_type_flattens_to_joined_columns_in_sql() {
    let mut model = Model::new();
    let mut inner = indexmap::IndexMap::new();
    inner.insert("b1".to_string(), Element::new(ElementType::Scalar { base: ScalarBase::String, facets: TypeFacets { length: Some(42), ..Default::default() } }));
    cdsl_model::builder::TypeBuilder::new("my.bookshop.T")
        .scalar("a", ScalarBase::Integer)
        .element("b", Element::new(ElementType::Struct(inner)))
        .build(&mut model);

    let x_el = Element::new(ElementType::Named("my.bookshop.T".into()));
    let e = EntityBuilder::new("my.bookshop.Books").key("ID", ScalarBase::Integer).element("x", x_el).build(&mut model);
    model.derived.my_schema_name.insert(e, "my.bookshop".to_string());

    let options = Options::new(ProtocolVersion::V4);
    let result = cdsl::compile(&mut model, &options, Target::Sql).expect("compile must not abort");
    assert!(!result.sink.has_errors(), "{:?}", result.sink.messages());

    let sql = result.files.get("sql").expect("sql artifact present");
    assert!(sql.contains("x_a"));
    assert!(sql.contains("x_b_b1"));
}
