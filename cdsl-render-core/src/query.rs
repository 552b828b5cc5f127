//! Query rendering (spec §4.3): `FROM` via a recursive source walker with
//! join cardinality annotated per dialect, `SELECT` list with optional
//! aliases, the trailing clauses, and `SET` queries bringing their own
//! parentheses while a bare `SELECT` leaves parenthesization to its caller.

use itertools::Itertools;

use cdsl_model::{From, JoinKind, Query, Select, SetOp, SetQuery};

use crate::dialect::Dialect;
use crate::expr::render_expr;

/// Renders a query. `leading` gates whether `key` markers on columns are
/// emitted (spec §4.3): only the leading query of a `SET` chain (or a bare
/// `SELECT`) carries them.
pub fn render_query(dialect: &dyn Dialect, query: &Query, leading: bool) -> String {
    match query {
        Query::Select(select) => render_select(dialect, select, leading),
        Query::Set(set) => render_set(dialect, set, leading),
    }
}

fn render_set(dialect: &dyn Dialect, set: &SetQuery, leading: bool) -> String {
    let op = match set.op {
        SetOp::Union => "UNION",
        SetOp::Intersect => "INTERSECT",
        SetOp::Except => "EXCEPT",
    };
    let op = if set.all { format!("{op} ALL") } else { op.to_string() };

    set.args
        .iter()
        .enumerate()
        .map(|(i, arg)| format!("({})", render_query(dialect, arg, leading && i == 0)))
        .join(&format!(" {op} "))
}

/// Renders a single `SELECT`; `SET` brings its own parens, a bare `SELECT`
/// does not (the caller parenthesizes a sub-query as needed).
pub fn render_select(dialect: &dyn Dialect, select: &Select, leading: bool) -> String {
    let mut out = String::from("SELECT");
    if select.distinct {
        out.push_str(" DISTINCT");
    }

    let mut columns: Vec<String> = select
        .columns
        .iter()
        .map(|c| {
            let rendered = render_expr(dialect, &c.expr);
            let key_marker = if leading && c.key { "key " } else { "" };
            match &c.alias {
                Some(alias) => format!("{key_marker}{rendered} as {}", dialect.quote(alias)),
                None => format!("{key_marker}{rendered}"),
            }
        })
        .collect();
    columns.extend(select.mixin.iter().map(|c| {
        let rendered = render_expr(dialect, &c.expr);
        match &c.alias {
            Some(alias) => format!("{rendered} as {}", dialect.quote(alias)),
            None => rendered,
        }
    }));
    if columns.is_empty() {
        out.push_str(" *");
    } else {
        out.push(' ');
        out.push_str(&columns.join(", "));
    }

    if !select.excluding.is_empty() {
        out.push_str(&format!(" /* excluding: {} */", select.excluding.join(", ")));
    }

    if let Some(from) = &select.from {
        out.push_str(" FROM ");
        out.push_str(&render_from(dialect, from));
    }

    if let Some(where_) = &select.where_ {
        out.push_str(" WHERE ");
        out.push_str(&render_expr(dialect, where_));
    }

    if !select.group_by.is_empty() {
        out.push_str(" GROUP BY ");
        out.push_str(&select.group_by.iter().map(|e| render_expr(dialect, e)).join(", "));
    }

    if let Some(having) = &select.having {
        out.push_str(" HAVING ");
        out.push_str(&render_expr(dialect, having));
    }

    if !select.order_by.is_empty() {
        out.push_str(" ORDER BY ");
        out.push_str(
            &select
                .order_by
                .iter()
                .map(|(e, asc)| format!("{}{}", render_expr(dialect, e), if *asc { "" } else { " DESC" }))
                .join(", "),
        );
    }

    if let Some(limit) = select.limit {
        out.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = select.offset {
        out.push_str(&format!(" OFFSET {offset}"));
    }

    out
}

/// Recursively renders a `FROM` source: a plain artifact reference, a
/// parenthesized sub-query, or a join tree with dialect-specific cardinality
/// annotation.
pub fn render_from(dialect: &dyn Dialect, from: &From) -> String {
    match from {
        From::Artifact { name, alias, args } => {
            let quoted = name.split('.').map(|seg| dialect.quote(seg)).join(".");
            let with_args = if args.is_empty() {
                quoted
            } else {
                let rendered_args = args.iter().map(|(k, v)| format!("{k}:{}", render_expr(dialect, v))).join(", ");
                format!("{quoted}({rendered_args})")
            };
            match alias {
                Some(a) => format!("{with_args} as {}", dialect.quote(a)),
                None => with_args,
            }
        }
        From::SubQuery(q) => format!("({})", render_query(dialect, q, true)),
        From::Join { join, args, on, cardinality } => {
            let keyword = join_keyword(*join);
            let mut parts = args.iter().map(|a| render_from(dialect, a));
            let mut out = parts.next().unwrap_or_default();
            for part in parts {
                out = format!("{out} {keyword} {part}");
            }
            if let Some(card_token) = dialect.render_join_cardinality(*cardinality) {
                out.push_str(&format!(" {card_token}"));
            }
            if let Some(on) = on {
                out.push_str(&format!(" ON {}", render_expr(dialect, on)));
            }
            out
        }
    }
}

fn join_keyword(join: JoinKind) -> &'static str {
    match join {
        JoinKind::Inner => "JOIN",
        JoinKind::Left => "LEFT JOIN",
        JoinKind::Right => "RIGHT JOIN",
        JoinKind::Full => "FULL JOIN",
        JoinKind::Cross => "CROSS JOIN",
    }
}
