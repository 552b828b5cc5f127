//! Shared conversion of the model's generic [`AnnotationValue`] into the two
//! wire shapes the renderers need: `<Annotation Term="..">` XML child
//! elements and `"@Term": value` CSDL-JSON pairs. A small set of keys are
//! *control* keys the preprocessor already consumed into a dedicated tree
//! field (`contains_target`, `partner`, container membership) and must not
//! also be re-emitted as a generic vocabulary annotation.

use std::io::Write;

use cdsl_model::AnnotationValue;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::tree::Annotations;

const CONTROL_KEYS: &[&str] = &[
    "odata.contained",
    "odata.navigable",
    "odata.singleton",
    "cds.api.ignore",
    "cds.valid.key",
    "cds.valid.from",
    "cds.valid.to",
];

pub(crate) fn is_control_key(key: &str) -> bool {
    CONTROL_KEYS.contains(&key)
}

/// Writes every non-control annotation as an `<Annotation Term="..">` child
/// element of whatever element `writer` is currently inside.
pub(crate) fn write_xml_annotations<W: Write>(writer: &mut Writer<W>, annotations: &Annotations) -> quick_xml::Result<()> {
    for (term, value) in annotations {
        if is_control_key(term) {
            continue;
        }
        write_one_annotation(writer, term, value)?;
    }
    Ok(())
}

fn write_one_annotation<W: Write>(writer: &mut Writer<W>, term: &str, value: &AnnotationValue) -> quick_xml::Result<()> {
    match value {
        AnnotationValue::Null => {
            let mut start = BytesStart::new("Annotation");
            start.push_attribute(("Term", term));
            writer.write_event(Event::Empty(start))
        }
        AnnotationValue::Bool(b) => write_scalar_annotation(writer, term, "Bool", &b.to_string()),
        AnnotationValue::Number(n) => {
            let kind = if n.fract() == 0.0 { "Int" } else { "Decimal" };
            write_scalar_annotation(writer, term, kind, &n.to_string())
        }
        AnnotationValue::Str(s) => write_scalar_annotation(writer, term, "String", s),
        AnnotationValue::Symbol(s) => write_scalar_annotation(writer, term, "EnumMember", s),
        AnnotationValue::Array(items) => {
            let mut start = BytesStart::new("Annotation");
            start.push_attribute(("Term", term));
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new("Collection")))?;
            for item in items {
                write_collection_item(writer, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new("Collection")))?;
            writer.write_event(Event::End(BytesEnd::new("Annotation")))
        }
        AnnotationValue::Record(fields) => {
            let mut start = BytesStart::new("Annotation");
            start.push_attribute(("Term", term));
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new("Record")))?;
            for (name, v) in fields {
                write_property_value(writer, name, v)?;
            }
            writer.write_event(Event::End(BytesEnd::new("Record")))?;
            writer.write_event(Event::End(BytesEnd::new("Annotation")))
        }
        // An unresolved CDS expression has no static EDM constant-expression
        // form; omitted rather than guessed at.
        AnnotationValue::Expr(_) => Ok(()),
    }
}

fn write_scalar_annotation<W: Write>(writer: &mut Writer<W>, term: &str, kind: &str, text: &str) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("Annotation");
    start.push_attribute(("Term", term));
    start.push_attribute((kind, text));
    writer.write_event(Event::Empty(start))
}

fn write_collection_item<W: Write>(writer: &mut Writer<W>, value: &AnnotationValue) -> quick_xml::Result<()> {
    match value {
        AnnotationValue::Str(s) => {
            writer.write_event(Event::Start(BytesStart::new("String")))?;
            writer.write_event(Event::Text(BytesText::new(s)))?;
            writer.write_event(Event::End(BytesEnd::new("String")))
        }
        AnnotationValue::Record(fields) => {
            writer.write_event(Event::Start(BytesStart::new("Record")))?;
            for (name, v) in fields {
                write_property_value(writer, name, v)?;
            }
            writer.write_event(Event::End(BytesEnd::new("Record")))
        }
        other => {
            let text = scalar_text(other);
            writer.write_event(Event::Start(BytesStart::new("String")))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("String")))
        }
    }
}

fn write_property_value<W: Write>(writer: &mut Writer<W>, name: &str, value: &AnnotationValue) -> quick_xml::Result<()> {
    let mut start = BytesStart::new("PropertyValue");
    start.push_attribute(("Property", name));
    match value {
        AnnotationValue::Bool(b) => start.push_attribute(("Bool", b.to_string().as_str())),
        AnnotationValue::Number(n) => start.push_attribute(("Int", n.to_string().as_str())),
        AnnotationValue::Str(s) => start.push_attribute(("String", s.as_str())),
        AnnotationValue::Symbol(s) => start.push_attribute(("EnumMember", s.as_str())),
        _ => start.push_attribute(("String", scalar_text(value).as_str())),
    }
    writer.write_event(Event::Empty(start))
}

fn scalar_text(value: &AnnotationValue) -> String {
    match value {
        AnnotationValue::Null => String::new(),
        AnnotationValue::Bool(b) => b.to_string(),
        AnnotationValue::Number(n) => n.to_string(),
        AnnotationValue::Str(s) | AnnotationValue::Symbol(s) => s.clone(),
        AnnotationValue::Array(_) | AnnotationValue::Record(_) | AnnotationValue::Expr(_) => String::new(),
    }
}

/// `"@Term": value` pairs for the CSDL-JSON renderer.
pub(crate) fn json_annotations(annotations: &Annotations) -> Vec<(String, serde_json::Value)> {
    annotations
        .iter()
        .filter(|(term, _)| !is_control_key(term))
        .map(|(term, value)| (format!("@{term}"), json_value(value)))
        .collect()
}

fn json_value(value: &AnnotationValue) -> serde_json::Value {
    match value {
        AnnotationValue::Null => serde_json::Value::Null,
        AnnotationValue::Bool(b) => serde_json::Value::Bool(*b),
        AnnotationValue::Number(n) => serde_json::json!(n),
        AnnotationValue::Str(s) | AnnotationValue::Symbol(s) => serde_json::Value::String(s.clone()),
        AnnotationValue::Array(items) => serde_json::Value::Array(items.iter().map(json_value).collect()),
        AnnotationValue::Record(fields) => {
            serde_json::Value::Object(fields.iter().map(|(k, v)| (k.clone(), json_value(v))).collect())
        }
        AnnotationValue::Expr(_) => serde_json::Value::Null,
    }
}
