//! Component **D**: the native object-DDL renderer (spec §4.4). Consumes
//! an already-preprocessed [`cdsl_model::Model`] (P), the naming policy it
//! installs through [`cdsl_render_core::Dialect`] (N), and the shared
//! expression/query walker (E); emits one text artifact per top-level
//! service/context, `using` aliases for cross-artifact references, and
//! reports persistence-name collisions.

mod artifact;
mod dialect;
mod entity;
mod naming;
mod view;

pub use artifact::render;
pub use dialect::HdbcdsDialect;

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_diagnostics::Sink;
    use cdsl_model::builder::EntityBuilder;
    use cdsl_model::{Model, ScalarBase};
    use cdsl_preprocess::{Options, ProtocolVersion};

    fn opts() -> Options {
        Options::new(ProtocolVersion::V4)
    }

    #[test]
    fn renders_entity_with_key_and_scalar_columns() {
        let mut model = Model::new();
        let id = EntityBuilder::new("my.bookshop.Books")
            .key("ID", ScalarBase::Integer)
            .string("title", 111)
            .build(&mut model);
        model.derived.my_schema_name.insert(id, "my.bookshop".to_string());

        let mut sink = Sink::new();
        let files = render(&model, &opts(), &mut sink);

        let body = files.get("my.bookshop").expect("artifact present");
        assert!(body.contains("entity Books {"));
        assert!(body.contains("key ID : Integer;"));
        assert!(body.contains("title : String(111);"));
        assert!(!sink.has_errors());
    }

    #[test]
    fn cross_artifact_association_emits_using_alias() {
        let mut model = Model::new();
        let author = EntityBuilder::new("my.people.Authors").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.my_schema_name.insert(author, "my.people".to_string());

        let book = EntityBuilder::new("my.bookshop.Books")
            .key("ID", ScalarBase::Integer)
            .to_one("author", "my.people.Authors")
            .build(&mut model);
        model.derived.my_schema_name.insert(book, "my.bookshop".to_string());
        if let cdsl_model::DefinitionKind::Entity(e) = &mut model.get_mut(book).kind {
            e.elements.get_mut("author").unwrap().ty.as_assoc_mut().unwrap().target = Some(author);
        }

        let mut sink = Sink::new();
        let files = render(&model, &opts(), &mut sink);

        let body = files.get("my.bookshop").expect("artifact present");
        assert!(body.contains("using my.people.Authors;"));
        assert!(body.contains("Association"));
    }

    #[test]
    fn duplicate_local_names_under_naming_mode_are_reported() {
        let mut model = Model::new();
        let a = EntityBuilder::new("my.svcA.Books").key("ID", ScalarBase::Integer).build(&mut model);
        let b = EntityBuilder::new("my.svcB.Books").key("ID", ScalarBase::Integer).build(&mut model);
        model.derived.my_schema_name.insert(a, "my.svcA".to_string());
        model.derived.my_schema_name.insert(b, "my.svcB".to_string());

        let mut sink = Sink::new();
        render(&model, &opts(), &mut sink);

        assert!(sink.has_errors());
    }
}
