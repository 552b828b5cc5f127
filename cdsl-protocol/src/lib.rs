//! Component **O** of the lowering engine (spec §4.5): the protocol-schema
//! renderer. Builds a format-neutral EDM object tree ([`tree`]) from an
//! already preprocessed [`cdsl_model::Model`] ([`build`]) and walks it twice
//! more to emit the wire formats ([`xml`] for OData v2/v4 XML CSDL, [`json`]
//! for v4 CSDL-JSON) — mirroring the D/S split `cdsl_ddl`/`cdsl_sql` draw
//! between "build a typed intermediate form" and "print it".

mod annotations;
pub mod build;
pub mod flatten;
pub mod json;
pub mod naming;
pub mod tree;
pub mod xml;

use cdsl_diagnostics::{CoreError, Sink};
use cdsl_model::Model;
use cdsl_preprocess::{Options, ProtocolVersion};
use indexmap::IndexMap;

/// Which wire encoding to emit for the protocol surface (spec §4.5's "v2/v4
/// XML + v4 JSON"; the version/format split lives in `cdsl::Target`, not in
/// [`Options`], since `Options` only carries preprocessing knobs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFormat {
    Xml,
    Json,
}

/// Builds the EDM tree for `model`/`options` and renders it in `format`.
/// `Json` only exists for v4 (there is no OData v2 JSON CSDL); requesting it
/// under `options.version == V2` falls back to XML and records an info.
pub fn render(model: &Model, options: &Options, format: ProtocolFormat, sink: &mut Sink) -> Result<IndexMap<String, String>, CoreError> {
    let document = build::build(model, options);

    match (options.version, format) {
        (ProtocolVersion::V2, _) => xml::render_v2(&document),
        (ProtocolVersion::V4, ProtocolFormat::Xml) => xml::render_v4(&document),
        (ProtocolVersion::V4, ProtocolFormat::Json) => Ok(json::render_v4_json(&document)),
    }
    .map(|outputs| {
        if options.version == ProtocolVersion::V2 && format == ProtocolFormat::Json {
            sink.info(
                cdsl_diagnostics::MessageCode::Structural,
                vec![],
                "odata v2 has no JSON CSDL; falling back to XML",
            );
        }
        outputs
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::builder::{service, EntityBuilder};
    use cdsl_model::ScalarBase;
    use cdsl_preprocess::preprocess;

    fn bookshop_model() -> Model {
        let mut model = Model::new();
        service(&mut model, "my.bookshop");
        EntityBuilder::new("my.bookshop.Authors")
            .key("ID", ScalarBase::Integer)
            .string("name", 111)
            .build(&mut model);
        EntityBuilder::new("my.bookshop.Books")
            .key("ID", ScalarBase::Integer)
            .string("title", 111)
            .to_one("author", "my.bookshop.Authors")
            .build(&mut model);
        model
    }

    #[test]
    fn v4_xml_round_trip_exposes_entity_set_and_navigation() {
        let mut model = bookshop_model();
        let options = Options::new(ProtocolVersion::V4);
        preprocess(&mut model, &options).expect("preprocess succeeds");

        let mut sink = Sink::new();
        let outputs = render(&model, &options, ProtocolFormat::Xml, &mut sink).expect("render succeeds");
        let xml = &outputs["my.bookshop.xml"];

        assert!(xml.contains("EntityType Name=\"Books\""));
        assert!(xml.contains("EntitySet Name=\"Books\""));
        assert!(xml.contains("NavigationProperty Name=\"author\""));
        assert!(!sink.has_errors());
    }

    #[test]
    fn v2_xml_emits_association_instead_of_inline_navigation() {
        let mut model = bookshop_model();
        let mut options = Options::new(ProtocolVersion::V2);
        options.odata_format = cdsl_preprocess::ODataFormat::Flat;
        preprocess(&mut model, &options).expect("preprocess succeeds");

        let mut sink = Sink::new();
        let outputs = render(&model, &options, ProtocolFormat::Xml, &mut sink).expect("render succeeds");
        let xml = &outputs["my.bookshop.xml"];

        assert!(xml.contains("<Association Name=\"Books_author\""));
        assert!(xml.contains("<AssociationSet"));
    }

    #[test]
    fn v4_json_round_trip_marks_entity_container() {
        let mut model = bookshop_model();
        let options = Options::new(ProtocolVersion::V4);
        preprocess(&mut model, &options).expect("preprocess succeeds");

        let mut sink = Sink::new();
        let outputs = render(&model, &options, ProtocolFormat::Json, &mut sink).expect("render succeeds");
        let json = &outputs["my.bookshop.json"];
        assert!(json.contains("\"$Kind\": \"EntityType\""));
        assert!(json.contains("\"$Kind\": \"NavigationProperty\""));
    }

    #[test]
    fn flat_format_collapses_foreign_key_into_a_scalar_property() {
        let mut model = bookshop_model();
        let mut options = Options::new(ProtocolVersion::V4);
        options.odata_format = cdsl_preprocess::ODataFormat::Flat;
        options.odata_foreign_keys = true;
        preprocess(&mut model, &options).expect("preprocess succeeds");

        let mut sink = Sink::new();
        let outputs = render(&model, &options, ProtocolFormat::Xml, &mut sink).expect("render succeeds");
        let xml = &outputs["my.bookshop.xml"];
        assert!(xml.contains("author_ID"));
    }
}
