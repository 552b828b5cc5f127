//! Walks the same [`crate::tree::EdmDocument`] [`crate::xml`] renders and
//! emits CSDL-JSON instead (spec §4.5's "v4 JSON" format), one document per
//! service. The tree is genuinely format-neutral: this module never touches
//! `quick_xml` and the XML module never touches `serde_json`.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::annotations::json_annotations;
use crate::tree::{ComplexType, EdmDocument, EntityContainer, EntityType, NavigationProperty, Operation, Property, Schema};

pub fn render_v4_json(document: &EdmDocument) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for schema in &document.schemas {
        let doc = render_schema_document(schema);
        out.insert(format!("{}.json", schema.namespace), serde_json::to_string_pretty(&doc).expect("CSDL-JSON value always serializes"));
    }
    out
}

fn render_schema_document(schema: &Schema) -> Value {
    let mut root = Map::new();
    root.insert("$Version".to_string(), Value::String("4.0".to_string()));

    if let Some(reference) = &schema.reference {
        let mut refs = Map::new();
        let mut entry = Map::new();
        entry.insert("$Include".to_string(), Value::Array(vec![{
            let mut include = Map::new();
            include.insert("$Namespace".to_string(), Value::String(reference.namespace.clone()));
            Value::Object(include)
        }]));
        refs.insert(reference.uri.clone(), Value::Object(entry));
        root.insert("$Reference".to_string(), Value::Object(refs));
        return Value::Object(root);
    }

    if let Some(container) = &schema.container {
        root.insert("$EntityContainer".to_string(), Value::String(format!("{}.{}", schema.namespace, container.name)));
    }

    let mut namespace_body = Map::new();
    for entity in &schema.entity_types {
        namespace_body.insert(entity.name.clone(), entity_type_json(entity));
    }
    for complex in &schema.complex_types {
        namespace_body.insert(complex.name.clone(), complex_type_json(complex));
    }
    for action in &schema.actions {
        namespace_body.insert(action.name.clone(), Value::Array(vec![operation_json("Action", action)]));
    }
    for function in &schema.functions {
        namespace_body.insert(function.name.clone(), Value::Array(vec![operation_json("Function", function)]));
    }
    if let Some(container) = &schema.container {
        namespace_body.insert(container.name.clone(), container_json(container));
    }
    for group in &schema.annotation_groups {
        for (key, value) in json_annotations(&group.annotations) {
            namespace_body.insert(format!("{}/{key}", group.target), value);
        }
    }

    root.insert(schema.namespace.clone(), Value::Object(namespace_body));
    Value::Object(root)
}

fn entity_type_json(entity: &EntityType) -> Value {
    let mut obj = Map::new();
    obj.insert("$Kind".to_string(), Value::String("EntityType".to_string()));
    if !entity.key.is_empty() {
        obj.insert("$Key".to_string(), Value::Array(entity.key.iter().cloned().map(Value::String).collect()));
    }
    if entity.has_stream {
        obj.insert("$HasStream".to_string(), Value::Bool(true));
    }
    for prop in &entity.properties {
        obj.insert(prop.name.clone(), property_json(prop));
    }
    for nav in &entity.navigation_properties {
        obj.insert(nav.name.clone(), nav_property_json(nav));
    }
    for (key, value) in json_annotations(&entity.annotations) {
        obj.insert(key, value);
    }
    Value::Object(obj)
}

fn complex_type_json(complex: &ComplexType) -> Value {
    let mut obj = Map::new();
    obj.insert("$Kind".to_string(), Value::String("ComplexType".to_string()));
    for prop in &complex.properties {
        obj.insert(prop.name.clone(), property_json(prop));
    }
    for (key, value) in json_annotations(&complex.annotations) {
        obj.insert(key, value);
    }
    Value::Object(obj)
}

fn property_json(prop: &Property) -> Value {
    let mut obj = Map::new();
    let ty = if prop.collection { format!("Collection({})", prop.edm_type) } else { prop.edm_type.clone() };
    obj.insert("$Type".to_string(), Value::String(ty));
    if !prop.nullable {
        obj.insert("$Nullable".to_string(), Value::Bool(false));
    }
    if let Some(len) = prop.max_length {
        obj.insert("$MaxLength".to_string(), Value::Number(len.into()));
    }
    if let Some(p) = prop.precision {
        obj.insert("$Precision".to_string(), Value::Number(p.into()));
    }
    if let Some(s) = prop.scale {
        obj.insert("$Scale".to_string(), Value::Number(s.into()));
    }
    if let Some(srid) = prop.srid {
        obj.insert("$SRID".to_string(), Value::Number(srid.into()));
    }
    for (key, value) in json_annotations(&prop.annotations) {
        obj.insert(key, value);
    }
    Value::Object(obj)
}

fn nav_property_json(nav: &NavigationProperty) -> Value {
    let mut obj = Map::new();
    obj.insert("$Kind".to_string(), Value::String("NavigationProperty".to_string()));
    let ty = if nav.collection { format!("Collection({})", nav.target_type) } else { nav.target_type.clone() };
    obj.insert("$Type".to_string(), Value::String(ty));
    if !nav.collection && !nav.nullable {
        obj.insert("$Nullable".to_string(), Value::Bool(false));
    }
    if let Some(partner) = &nav.partner {
        obj.insert("$Partner".to_string(), Value::String(partner.clone()));
    }
    if nav.contains_target {
        obj.insert("$ContainsTarget".to_string(), Value::Bool(true));
    }
    if !nav.referential_constraints.is_empty() {
        let mut rc = Map::new();
        for (dependent, principal) in &nav.referential_constraints {
            rc.insert(dependent.clone(), Value::String(principal.clone()));
        }
        obj.insert("$ReferentialConstraint".to_string(), Value::Object(rc));
    }
    for (key, value) in json_annotations(&nav.annotations) {
        obj.insert(key, value);
    }
    Value::Object(obj)
}

fn operation_json(kind: &str, op: &Operation) -> Value {
    let mut obj = Map::new();
    obj.insert("$Kind".to_string(), Value::String(kind.to_string()));
    if op.bound {
        obj.insert("$IsBound".to_string(), Value::Bool(true));
    }
    if !op.params.is_empty() {
        let params: Vec<Value> = op
            .params
            .iter()
            .map(|(name, ty)| {
                let mut p = Map::new();
                p.insert("$Name".to_string(), Value::String(name.clone()));
                p.insert("$Type".to_string(), Value::String(ty.clone()));
                Value::Object(p)
            })
            .collect();
        obj.insert("$Parameter".to_string(), Value::Array(params));
    }
    if let Some(returns) = &op.returns {
        let mut ret = Map::new();
        ret.insert("$Type".to_string(), Value::String(returns.clone()));
        obj.insert("$ReturnType".to_string(), Value::Object(ret));
    }
    Value::Object(obj)
}

fn container_json(container: &EntityContainer) -> Value {
    let mut obj = Map::new();
    obj.insert("$Kind".to_string(), Value::String("EntityContainer".to_string()));
    for set in &container.entity_sets {
        let mut s = Map::new();
        s.insert("$Collection".to_string(), Value::Bool(true));
        s.insert("$Type".to_string(), Value::String(set.entity_type.clone()));
        if !set.navigation_bindings.is_empty() {
            let bindings: Vec<Value> = set
                .navigation_bindings
                .iter()
                .map(|b| {
                    let mut bind = Map::new();
                    bind.insert("$Path".to_string(), Value::String(b.path.clone()));
                    bind.insert("$Target".to_string(), Value::String(b.target.clone()));
                    Value::Object(bind)
                })
                .collect();
            s.insert("$NavigationPropertyBinding".to_string(), Value::Array(bindings));
        }
        obj.insert(set.name.clone(), Value::Object(s));
    }
    for singleton in &container.singletons {
        let mut s = Map::new();
        s.insert("$Type".to_string(), Value::String(singleton.entity_type.clone()));
        obj.insert(singleton.name.clone(), Value::Object(s));
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EntityContainer, EntitySet};

    #[test]
    fn entity_container_json_marks_sets_as_collections() {
        let mut schema = Schema::new("my.bookshop");
        schema.entity_types.push(EntityType {
            name: "Books".to_string(),
            key: vec!["ID".to_string()],
            properties: vec![Property::new("ID", "Edm.Int32")],
            navigation_properties: Vec::new(),
            annotations: Vec::new(),
            has_stream: false,
        });
        schema.container = Some(EntityContainer {
            name: "EntityContainer".to_string(),
            entity_sets: vec![EntitySet { name: "Books".to_string(), entity_type: "Books".to_string(), navigation_bindings: Vec::new(), annotations: Vec::new() }],
            singletons: Vec::new(),
            action_imports: Vec::new(),
            function_imports: Vec::new(),
        });

        let document = EdmDocument { schemas: vec![schema] };
        let files = render_v4_json(&document);
        let json = &files["my.bookshop.json"];
        assert!(json.contains("\"$EntityContainer\": \"my.bookshop.EntityContainer\""));
        assert!(json.contains("\"$Collection\": true"));
    }
}
