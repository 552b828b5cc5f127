use crate::expr::Expr;
use indexmap::IndexMap;

/// `@key: value` map. Ordered so that renderers which re-emit annotations
/// verbatim (the protocol-schema renderer's `Annotations` nodes) preserve
/// the author's order.
pub type AnnotationMap = IndexMap<String, AnnotationValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// `#foo` enum-symbol shorthand.
    Symbol(String),
    Array(Vec<AnnotationValue>),
    Record(IndexMap<String, AnnotationValue>),
    Expr(Box<Expr>),
}

impl AnnotationValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Str(s) => Some(s),
            _ => None,
        }
    }
}
