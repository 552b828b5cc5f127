//! Walks the format-neutral [`crate::tree::EdmDocument`] and emits OData v2
//! and v4 XML CSDL, grounded on `examples/jade-codes-syster-base`'s
//! `quick_xml::Writer`/`BytesStart`/`BytesEnd`/`Event` idiom (the pack's only
//! genuine XML-writer usage). v2 and v4 disagree on how an association is
//! expressed (v4: a `NavigationProperty` naming its target type directly and
//! an inline `ReferentialConstraint`; v2: a `NavigationProperty` pointing at
//! a separate top-level `Association`/`AssociationSet` pair) so each gets
//! its own entity-type/container walk rather than sharing one. Every
//! `quick_xml` write is infallible in practice (the sink is an in-memory
//! buffer) but still propagated as [`CoreError::Invariant`] rather than
//! unwrapped, the way the teacher's writer does for its XML output.

use std::io::Cursor;

use cdsl_diagnostics::CoreError;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::annotations::write_xml_annotations;
use crate::tree::{ComplexType, EdmDocument, EntityType, NavigationProperty, Operation, Property, Schema};

const EDMX_V4_NS: &str = "http://docs.oasis-open.org/odata/ns/edmx";
const EDM_V4_NS: &str = "http://docs.oasis-open.org/odata/ns/edm";
const EDMX_V2_NS: &str = "http://schemas.microsoft.com/ado/2007/06/edmx";
const EDM_V2_NS: &str = "http://schemas.microsoft.com/ado/2008/09/edm";
const M_V2_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

fn xml_err(e: quick_xml::Error) -> CoreError {
    CoreError::Invariant(format!("protocol XML writer failed: {e}"))
}

pub fn render_v4(document: &EdmDocument) -> Result<IndexMap<String, String>, CoreError> {
    let mut out = IndexMap::new();
    for schema in &document.schemas {
        out.insert(format!("{}.xml", schema.namespace), render_v4_schema(schema)?);
    }
    Ok(out)
}

pub fn render_v2(document: &EdmDocument) -> Result<IndexMap<String, String>, CoreError> {
    let mut out = IndexMap::new();
    for schema in &document.schemas {
        out.insert(format!("{}.xml", schema.namespace), render_v2_schema(schema)?);
    }
    Ok(out)
}

fn new_writer() -> Writer<Cursor<Vec<u8>>> {
    Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
}

fn finish(writer: Writer<Cursor<Vec<u8>>>) -> String {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).expect("XML writer only emits valid UTF-8")
}

fn render_v4_schema(schema: &Schema) -> Result<String, CoreError> {
    let mut w = new_writer();
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))).map_err(xml_err)?;

    let mut edmx = BytesStart::new("edmx:Edmx");
    edmx.push_attribute(("Version", "4.0"));
    edmx.push_attribute(("xmlns:edmx", EDMX_V4_NS));
    w.write_event(Event::Start(edmx)).map_err(xml_err)?;
    w.write_event(Event::Start(BytesStart::new("edmx:DataServices"))).map_err(xml_err)?;

    if let Some(reference) = &schema.reference {
        let mut edmx_ref = BytesStart::new("edmx:Reference");
        edmx_ref.push_attribute(("Uri", reference.uri.as_str()));
        w.write_event(Event::Start(edmx_ref)).map_err(xml_err)?;
        let mut include = BytesStart::new("edmx:Include");
        include.push_attribute(("Namespace", reference.namespace.as_str()));
        w.write_event(Event::Empty(include)).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("edmx:Reference"))).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("edmx:DataServices"))).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("edmx:Edmx"))).map_err(xml_err)?;
        return Ok(finish(w));
    }

    let mut schema_start = BytesStart::new("Schema");
    schema_start.push_attribute(("Namespace", schema.namespace.as_str()));
    schema_start.push_attribute(("xmlns", EDM_V4_NS));
    w.write_event(Event::Start(schema_start)).map_err(xml_err)?;

    for entity in &schema.entity_types {
        write_v4_entity_type(&mut w, entity)?;
    }
    for complex in &schema.complex_types {
        write_v4_complex_type(&mut w, complex)?;
    }
    for action in &schema.actions {
        write_v4_operation(&mut w, "Action", action)?;
    }
    for function in &schema.functions {
        write_v4_operation(&mut w, "Function", function)?;
    }
    if let Some(container) = &schema.container {
        let mut c = BytesStart::new("EntityContainer");
        c.push_attribute(("Name", container.name.as_str()));
        w.write_event(Event::Start(c)).map_err(xml_err)?;
        for set in &container.entity_sets {
            let mut es = BytesStart::new("EntitySet");
            es.push_attribute(("Name", set.name.as_str()));
            es.push_attribute(("EntityType", format!("{}.{}", schema.namespace, set.entity_type).as_str()));
            if set.navigation_bindings.is_empty() {
                w.write_event(Event::Empty(es)).map_err(xml_err)?;
            } else {
                w.write_event(Event::Start(es)).map_err(xml_err)?;
                for binding in &set.navigation_bindings {
                    let mut npb = BytesStart::new("NavigationPropertyBinding");
                    npb.push_attribute(("Path", binding.path.as_str()));
                    npb.push_attribute(("Target", binding.target.as_str()));
                    w.write_event(Event::Empty(npb)).map_err(xml_err)?;
                }
                w.write_event(Event::End(BytesEnd::new("EntitySet"))).map_err(xml_err)?;
            }
        }
        for singleton in &container.singletons {
            let mut s = BytesStart::new("Singleton");
            s.push_attribute(("Name", singleton.name.as_str()));
            s.push_attribute(("Type", format!("{}.{}", schema.namespace, singleton.entity_type).as_str()));
            if singleton.navigation_bindings.is_empty() {
                w.write_event(Event::Empty(s)).map_err(xml_err)?;
            } else {
                w.write_event(Event::Start(s)).map_err(xml_err)?;
                for binding in &singleton.navigation_bindings {
                    let mut npb = BytesStart::new("NavigationPropertyBinding");
                    npb.push_attribute(("Path", binding.path.as_str()));
                    npb.push_attribute(("Target", binding.target.as_str()));
                    w.write_event(Event::Empty(npb)).map_err(xml_err)?;
                }
                w.write_event(Event::End(BytesEnd::new("Singleton"))).map_err(xml_err)?;
            }
        }
        w.write_event(Event::End(BytesEnd::new("EntityContainer"))).map_err(xml_err)?;
    }

    for group in &schema.annotation_groups {
        let mut annotations_el = BytesStart::new("Annotations");
        annotations_el.push_attribute(("Target", group.target.as_str()));
        w.write_event(Event::Start(annotations_el)).map_err(xml_err)?;
        write_xml_annotations(&mut w, &group.annotations).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("Annotations"))).map_err(xml_err)?;
    }

    w.write_event(Event::End(BytesEnd::new("Schema"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("edmx:DataServices"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("edmx:Edmx"))).map_err(xml_err)?;
    Ok(finish(w))
}

fn write_v4_entity_type(w: &mut Writer<Cursor<Vec<u8>>>, entity: &EntityType) -> Result<(), CoreError> {
    let mut start = BytesStart::new("EntityType");
    start.push_attribute(("Name", entity.name.as_str()));
    if entity.has_stream {
        start.push_attribute(("HasStream", "true"));
    }
    w.write_event(Event::Start(start)).map_err(xml_err)?;

    if !entity.key.is_empty() {
        w.write_event(Event::Start(BytesStart::new("Key"))).map_err(xml_err)?;
        for k in &entity.key {
            let mut pref = BytesStart::new("PropertyRef");
            pref.push_attribute(("Name", k.as_str()));
            w.write_event(Event::Empty(pref)).map_err(xml_err)?;
        }
        w.write_event(Event::End(BytesEnd::new("Key"))).map_err(xml_err)?;
    }

    for prop in &entity.properties {
        write_v4_property(w, prop)?;
    }
    for nav in &entity.navigation_properties {
        write_v4_nav_property(w, nav)?;
    }
    write_xml_annotations(w, &entity.annotations).map_err(xml_err)?;

    w.write_event(Event::End(BytesEnd::new("EntityType"))).map_err(xml_err)
}

fn write_v4_complex_type(w: &mut Writer<Cursor<Vec<u8>>>, complex: &ComplexType) -> Result<(), CoreError> {
    let mut start = BytesStart::new("ComplexType");
    start.push_attribute(("Name", complex.name.as_str()));
    w.write_event(Event::Start(start)).map_err(xml_err)?;
    for prop in &complex.properties {
        write_v4_property(w, prop)?;
    }
    write_xml_annotations(w, &complex.annotations).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("ComplexType"))).map_err(xml_err)
}

fn write_v4_property(w: &mut Writer<Cursor<Vec<u8>>>, prop: &Property) -> Result<(), CoreError> {
    let mut start = BytesStart::new("Property");
    start.push_attribute(("Name", prop.name.as_str()));
    let ty = if prop.collection { format!("Collection({})", prop.edm_type) } else { prop.edm_type.clone() };
    start.push_attribute(("Type", ty.as_str()));
    start.push_attribute(("Nullable", if prop.nullable { "true" } else { "false" }));
    if let Some(len) = prop.max_length {
        start.push_attribute(("MaxLength", len.to_string().as_str()));
    }
    if let Some(p) = prop.precision {
        start.push_attribute(("Precision", p.to_string().as_str()));
    }
    if let Some(s) = prop.scale {
        start.push_attribute(("Scale", s.to_string().as_str()));
    }
    if let Some(srid) = prop.srid {
        start.push_attribute(("SRID", srid.to_string().as_str()));
    }
    if prop.annotations.is_empty() {
        w.write_event(Event::Empty(start)).map_err(xml_err)
    } else {
        w.write_event(Event::Start(start)).map_err(xml_err)?;
        write_xml_annotations(w, &prop.annotations).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("Property"))).map_err(xml_err)
    }
}

fn write_v4_nav_property(w: &mut Writer<Cursor<Vec<u8>>>, nav: &NavigationProperty) -> Result<(), CoreError> {
    let mut start = BytesStart::new("NavigationProperty");
    start.push_attribute(("Name", nav.name.as_str()));
    let ty = if nav.collection { format!("Collection({})", nav.target_type) } else { nav.target_type.clone() };
    start.push_attribute(("Type", ty.as_str()));
    if !nav.collection {
        start.push_attribute(("Nullable", if nav.nullable { "true" } else { "false" }));
    }
    if let Some(partner) = &nav.partner {
        start.push_attribute(("Partner", partner.as_str()));
    }
    if nav.contains_target {
        start.push_attribute(("ContainsTarget", "true"));
    }
    let has_body = !nav.referential_constraints.is_empty() || !nav.annotations.is_empty();
    if !has_body {
        return w.write_event(Event::Empty(start)).map_err(xml_err);
    }
    w.write_event(Event::Start(start)).map_err(xml_err)?;
    for (dependent, principal) in &nav.referential_constraints {
        let mut rc = BytesStart::new("ReferentialConstraint");
        rc.push_attribute(("Property", dependent.as_str()));
        rc.push_attribute(("ReferencedProperty", principal.as_str()));
        w.write_event(Event::Empty(rc)).map_err(xml_err)?;
    }
    write_xml_annotations(w, &nav.annotations).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("NavigationProperty"))).map_err(xml_err)
}

fn write_v4_operation(w: &mut Writer<Cursor<Vec<u8>>>, tag: &str, op: &Operation) -> Result<(), CoreError> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("Name", op.name.as_str()));
    if op.bound {
        start.push_attribute(("IsBound", "true"));
    }
    w.write_event(Event::Start(start)).map_err(xml_err)?;
    for (name, ty) in &op.params {
        let mut param = BytesStart::new("Parameter");
        param.push_attribute(("Name", name.as_str()));
        param.push_attribute(("Type", ty.as_str()));
        w.write_event(Event::Empty(param)).map_err(xml_err)?;
    }
    if let Some(returns) = &op.returns {
        let mut ret = BytesStart::new("ReturnType");
        ret.push_attribute(("Type", returns.as_str()));
        w.write_event(Event::Empty(ret)).map_err(xml_err)?;
    }
    w.write_event(Event::End(BytesEnd::new(tag))).map_err(xml_err)
}

/// v2 has no inline navigation: every association is its own `Association`
/// element, referenced by `NavigationProperty`'s `Relationship`/`FromRole`/
/// `ToRole` triple and mirrored by an `AssociationSet` in the container.
struct V2Association {
    name: String,
    from_role: String,
    to_role: String,
    from_type: String,
    to_type: String,
    from_multiplicity: &'static str,
    to_multiplicity: &'static str,
    referential_constraints: Vec<(String, String)>,
}

fn v2_associations(schema: &Schema) -> Vec<V2Association> {
    let mut out = Vec::new();
    for entity in &schema.entity_types {
        for nav in &entity.navigation_properties {
            let assoc_name = format!("{}_{}", entity.name, nav.name);
            out.push(V2Association {
                name: assoc_name,
                from_role: format!("{}_From", entity.name),
                to_role: format!("{}_To", nav.name),
                from_type: format!("{}.{}", schema.namespace, entity.name),
                to_type: nav.target_type.clone(),
                from_multiplicity: "1",
                to_multiplicity: if nav.collection { "*" } else if nav.nullable { "0..1" } else { "1" },
                referential_constraints: nav.referential_constraints.clone(),
            });
        }
    }
    out
}

fn render_v2_schema(schema: &Schema) -> Result<String, CoreError> {
    let mut w = new_writer();
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))).map_err(xml_err)?;

    let mut edmx = BytesStart::new("edmx:Edmx");
    edmx.push_attribute(("Version", "1.0"));
    edmx.push_attribute(("xmlns:edmx", EDMX_V2_NS));
    w.write_event(Event::Start(edmx)).map_err(xml_err)?;

    let mut data_services = BytesStart::new("edmx:DataServices");
    data_services.push_attribute(("m:DataServiceVersion", "2.0"));
    data_services.push_attribute(("xmlns:m", M_V2_NS));
    w.write_event(Event::Start(data_services)).map_err(xml_err)?;

    let mut schema_start = BytesStart::new("Schema");
    schema_start.push_attribute(("Namespace", schema.namespace.as_str()));
    schema_start.push_attribute(("xmlns", EDM_V2_NS));
    w.write_event(Event::Start(schema_start)).map_err(xml_err)?;

    let associations = v2_associations(schema);

    for entity in &schema.entity_types {
        write_v2_entity_type(&mut w, schema, entity)?;
    }
    for complex in &schema.complex_types {
        write_v4_complex_type(&mut w, complex)?;
    }
    for assoc in &associations {
        write_v2_association(&mut w, assoc)?;
    }

    let mut container = BytesStart::new("EntityContainer");
    container.push_attribute(("Name", "EntityContainer"));
    container.push_attribute(("m:IsDefaultEntityContainer", "true"));
    w.write_event(Event::Start(container)).map_err(xml_err)?;

    if let Some(c) = &schema.container {
        for set in &c.entity_sets {
            let mut es = BytesStart::new("EntitySet");
            es.push_attribute(("Name", set.name.as_str()));
            es.push_attribute(("EntityType", format!("{}.{}", schema.namespace, set.entity_type).as_str()));
            w.write_event(Event::Empty(es)).map_err(xml_err)?;
        }
    }
    for assoc in &associations {
        let mut set = BytesStart::new("AssociationSet");
        set.push_attribute(("Name", format!("{}Set", assoc.name).as_str()));
        set.push_attribute(("Association", format!("{}.{}", schema.namespace, assoc.name).as_str()));
        w.write_event(Event::Start(set)).map_err(xml_err)?;
        let mut from_end = BytesStart::new("End");
        from_end.push_attribute(("Role", assoc.from_role.as_str()));
        from_end.push_attribute(("EntitySet", entity_set_for_type(schema, &assoc.from_type).as_str()));
        w.write_event(Event::Empty(from_end)).map_err(xml_err)?;
        let mut to_end = BytesStart::new("End");
        to_end.push_attribute(("Role", assoc.to_role.as_str()));
        to_end.push_attribute(("EntitySet", entity_set_for_type(schema, &assoc.to_type).as_str()));
        w.write_event(Event::Empty(to_end)).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("AssociationSet"))).map_err(xml_err)?;
    }

    w.write_event(Event::End(BytesEnd::new("EntityContainer"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("Schema"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("edmx:DataServices"))).map_err(xml_err)?;
    w.write_event(Event::End(BytesEnd::new("edmx:Edmx"))).map_err(xml_err)?;
    Ok(finish(w))
}

fn entity_set_for_type<'a>(schema: &'a Schema, qualified_type: &str) -> String {
    let local = qualified_type.strip_prefix(&format!("{}.", schema.namespace)).unwrap_or(qualified_type);
    schema
        .container
        .as_ref()
        .and_then(|c| c.entity_sets.iter().find(|s| s.entity_type == local))
        .map(|s| s.name.clone())
        .unwrap_or_else(|| local.to_string())
}

fn write_v2_entity_type(w: &mut Writer<Cursor<Vec<u8>>>, schema: &Schema, entity: &EntityType) -> Result<(), CoreError> {
    let mut start = BytesStart::new("EntityType");
    start.push_attribute(("Name", entity.name.as_str()));
    w.write_event(Event::Start(start)).map_err(xml_err)?;

    if !entity.key.is_empty() {
        w.write_event(Event::Start(BytesStart::new("Key"))).map_err(xml_err)?;
        for k in &entity.key {
            let mut pref = BytesStart::new("PropertyRef");
            pref.push_attribute(("Name", k.as_str()));
            w.write_event(Event::Empty(pref)).map_err(xml_err)?;
        }
        w.write_event(Event::End(BytesEnd::new("Key"))).map_err(xml_err)?;
    }
    for prop in &entity.properties {
        write_v4_property(w, prop)?;
    }
    for nav in &entity.navigation_properties {
        let assoc_name = format!("{}_{}", entity.name, nav.name);
        let mut np = BytesStart::new("NavigationProperty");
        np.push_attribute(("Name", nav.name.as_str()));
        np.push_attribute(("Relationship", format!("{}.{}", schema.namespace, assoc_name).as_str()));
        np.push_attribute(("FromRole", format!("{}_From", entity.name).as_str()));
        np.push_attribute(("ToRole", format!("{}_To", nav.name).as_str()));
        w.write_event(Event::Empty(np)).map_err(xml_err)?;
    }
    w.write_event(Event::End(BytesEnd::new("EntityType"))).map_err(xml_err)
}

fn write_v2_association(w: &mut Writer<Cursor<Vec<u8>>>, assoc: &V2Association) -> Result<(), CoreError> {
    let mut start = BytesStart::new("Association");
    start.push_attribute(("Name", assoc.name.as_str()));
    w.write_event(Event::Start(start)).map_err(xml_err)?;

    let mut from_end = BytesStart::new("End");
    from_end.push_attribute(("Role", assoc.from_role.as_str()));
    from_end.push_attribute(("Type", assoc.from_type.as_str()));
    from_end.push_attribute(("Multiplicity", assoc.from_multiplicity));
    w.write_event(Event::Empty(from_end)).map_err(xml_err)?;

    let mut to_end = BytesStart::new("End");
    to_end.push_attribute(("Role", assoc.to_role.as_str()));
    to_end.push_attribute(("Type", assoc.to_type.as_str()));
    to_end.push_attribute(("Multiplicity", assoc.to_multiplicity));
    w.write_event(Event::Empty(to_end)).map_err(xml_err)?;

    if !assoc.referential_constraints.is_empty() {
        w.write_event(Event::Start(BytesStart::new("ReferentialConstraint"))).map_err(xml_err)?;
        let mut principal = BytesStart::new("Principal");
        principal.push_attribute(("Role", assoc.to_role.as_str()));
        w.write_event(Event::Start(principal)).map_err(xml_err)?;
        for (_, referenced) in &assoc.referential_constraints {
            let mut pref = BytesStart::new("PropertyRef");
            pref.push_attribute(("Name", referenced.as_str()));
            w.write_event(Event::Empty(pref)).map_err(xml_err)?;
        }
        w.write_event(Event::End(BytesEnd::new("Principal"))).map_err(xml_err)?;

        let mut dependent = BytesStart::new("Dependent");
        dependent.push_attribute(("Role", assoc.from_role.as_str()));
        w.write_event(Event::Start(dependent)).map_err(xml_err)?;
        for (dep, _) in &assoc.referential_constraints {
            let mut pref = BytesStart::new("PropertyRef");
            pref.push_attribute(("Name", dep.as_str()));
            w.write_event(Event::Empty(pref)).map_err(xml_err)?;
        }
        w.write_event(Event::End(BytesEnd::new("Dependent"))).map_err(xml_err)?;
        w.write_event(Event::End(BytesEnd::new("ReferentialConstraint"))).map_err(xml_err)?;
    }

    w.write_event(Event::End(BytesEnd::new("Association"))).map_err(xml_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EntityContainer, EntitySet, Property};

    fn sample_schema() -> Schema {
        let mut schema = Schema::new("my.bookshop");
        let mut books = EntityType {
            name: "Books".to_string(),
            key: vec!["ID".to_string()],
            properties: vec![Property::new("ID", "Edm.Int32"), Property::new("title", "Edm.String")],
            navigation_properties: Vec::new(),
            annotations: Vec::new(),
            has_stream: false,
        };
        books.properties[0].nullable = false;
        schema.entity_types.push(books);
        schema.container = Some(EntityContainer {
            name: "EntityContainer".to_string(),
            entity_sets: vec![EntitySet { name: "Books".to_string(), entity_type: "Books".to_string(), navigation_bindings: Vec::new(), annotations: Vec::new() }],
            singletons: Vec::new(),
            action_imports: Vec::new(),
            function_imports: Vec::new(),
        });
        schema
    }

    #[test]
    fn v4_schema_contains_entity_type_and_set() {
        let document = EdmDocument { schemas: vec![sample_schema()] };
        let files = render_v4(&document).expect("render succeeds");
        let xml = &files["my.bookshop.xml"];
        assert!(xml.contains("<EntityType Name=\"Books\">"));
        assert!(xml.contains("<EntitySet Name=\"Books\""));
        assert!(xml.contains("Namespace=\"my.bookshop\""));
    }

    #[test]
    fn v2_schema_uses_default_container_marker() {
        let document = EdmDocument { schemas: vec![sample_schema()] };
        let files = render_v2(&document).expect("render succeeds");
        let xml = &files["my.bookshop.xml"];
        assert!(xml.contains("m:IsDefaultEntityContainer=\"true\""));
    }
}
