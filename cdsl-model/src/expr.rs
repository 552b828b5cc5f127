//! Expression and path trees (spec §3 "Expression"). One sum type per node
//! kind rather than a single `enum Expr` field-soup, per the design note on
//! tagged variants.

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    String,
    Number,
    Bool,
    Date,
    Time,
    Timestamp,
    Binary,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub val: String,
}

/// One step of a `ref: [...]` path. Steps may carry view-parameter
/// arguments, a filter, and a cardinality on that filter (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub name: String,
    pub args: Vec<(String, Expr)>,
    pub filter: Option<Box<Expr>>,
    pub filter_cardinality: Option<crate::element::Cardinality>,
}

impl PathStep {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            filter: None,
            filter_cardinality: None,
        }
    }
}

/// A magic variable: `$self`, `$user.id`, `$user.locale`, `$now`, `$at.from`,
/// `$at.to`, or a plain path head.
#[derive(Debug, Clone, PartialEq)]
pub enum PathHead {
    SelfRef,
    Magic(String),
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefPath {
    pub head: PathHead,
    pub steps: Vec<PathStep>,
    /// True when this ref is a parameter reference (`:p`) rather than a
    /// model path.
    pub param: bool,
    /// True when prefixed with `$`-style global/magic marker already
    /// consumed into `head`, kept for round-tripping diagnostics.
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ref(RefPath),
    Func { name: String, args: Vec<Expr> },
    /// `{#: symbol}` enum symbol.
    EnumSymbol(String),
    /// Mixed token sequence, e.g. interpolated string pieces.
    Xpr(Vec<Expr>),
    List(Vec<Expr>),
    Cast { expr: Box<Expr>, target_type: String },
    /// Binary/infix combination: `lhs <tok> rhs`, e.g. `a = b`, `a and b`.
    Binary { op: String, lhs: Box<Expr>, rhs: Box<Expr> },
    /// Unary prefix, e.g. `not x`.
    Unary { op: String, expr: Box<Expr> },
    /// Parenthesized sub-expression, preserved explicitly so the renderer
    /// does not need to re-derive precedence from scratch for an author who
    /// already parenthesized.
    Paren(Box<Expr>),
}

impl Expr {
    pub fn is_binary(&self) -> bool {
        matches!(self, Expr::Binary { .. })
    }

    /// Walks `and`-joined equality terms, per pass 9's "only terms joined by
    /// `and` and parenthesized equality comparisons are constraint-eligible"
    /// rule. Returns the flattened list of `(lhs, rhs)` pairs for each `=`
    /// found under a chain of `and`s, or `None` if a non-`and`/non-`=` node
    /// is encountered at top level.
    pub fn and_eq_terms(&self) -> Option<Vec<(&Expr, &Expr)>> {
        match self {
            Expr::Binary { op, lhs, rhs } if op == "=" => Some(vec![(lhs.as_ref(), rhs.as_ref())]),
            Expr::Binary { op, lhs, rhs } if op == "and" => {
                let mut left = lhs.and_eq_terms()?;
                let right = rhs.and_eq_terms()?;
                left.extend(right);
                Some(left)
            }
            Expr::Paren(inner) => inner.and_eq_terms(),
            _ => None,
        }
    }
}
