use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersect,
    Except,
}

/// A query's `FROM` is itself recursive: a named artifact (with optional
/// alias and view-parameter args), a sub-query, or a join node (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    Artifact {
        name: String,
        alias: Option<String>,
        args: Vec<(String, Expr)>,
    },
    SubQuery(Box<Query>),
    Join {
        join: JoinKind,
        args: Vec<From>,
        on: Option<Expr>,
        cardinality: Option<crate::element::Cardinality>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub alias: Option<String>,
    /// Whether this column is a `key` column, meaningful only when the
    /// owning query is the leading query of a `UNION`-like `SET` (spec §4.3:
    /// "leading-query flag gates whether key markers on columns are
    /// emitted").
    pub key: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub from: Option<From>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<(Expr, bool)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub columns: Vec<SelectColumn>,
    pub mixin: Vec<SelectColumn>,
    pub distinct: bool,
    pub excluding: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetQuery {
    pub op: SetOp,
    pub all: bool,
    pub args: Vec<Query>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    Set(SetQuery),
}

impl Query {
    /// Whether this is the "leading" query for purposes of `key` markers:
    /// the first arm of a `SET`, recursively, or a bare `SELECT`.
    pub fn is_leading(&self) -> bool {
        match self {
            Query::Select(_) => true,
            Query::Set(s) => s.args.first().map(Query::is_leading).unwrap_or(true),
        }
    }
}
