//! Path segments used to tag a [`crate::Message`] with where in the model
//! it originated, so the sink can deduplicate and renderers can report
//! "definition X, element Y" style locations without re-walking the model.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Name(String),
    Element(String),
    Param(String),
    Annotation(String),
    Index(usize),
}

pub(crate) fn join(path: &[PathSegment]) -> String {
    path.iter()
        .map(|seg| match seg {
            PathSegment::Name(n) => n.clone(),
            PathSegment::Element(n) => format!(".{n}"),
            PathSegment::Param(n) => format!("({n})"),
            PathSegment::Annotation(n) => format!("@{n}"),
            PathSegment::Index(i) => format!("[{i}]"),
        })
        .collect()
}
