//! Mutual recursion over the expression variant (spec §4.3), parameterized
//! by a [`Dialect`]. The same walker also backs read-only mining of
//! on-conditions in `cdsl-preprocess` (spec §9 "Expression walker"), though
//! there it calls into `cdsl-resolver` directly rather than through here —
//! this module is the emit side only.

use cdsl_model::{Expr, PathHead, PathStep};

use crate::dialect::Dialect;

/// Renders one expression node. Any nested expression that is itself a
/// binary combination is wrapped in parentheses (spec §4.3 precedence
/// rule); an author's own explicit `Paren` is preserved as-is rather than
/// re-derived.
pub fn render_expr(dialect: &dyn Dialect, expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => dialect.render_literal(lit),
        Expr::Ref(path) => render_ref(dialect, path),
        Expr::Func { name, args } => render_func(dialect, name, args),
        Expr::EnumSymbol(sym) => format!("#{sym}"),
        Expr::Xpr(parts) => parts.iter().map(|p| render_operand(dialect, p)).collect::<Vec<_>>().join(" "),
        Expr::List(items) => format!("[{}]", items.iter().map(|i| render_expr(dialect, i)).collect::<Vec<_>>().join(", ")),
        Expr::Cast { expr, target_type } => {
            format!("cast({} as {})", render_expr(dialect, expr), dialect.map_cast_target(target_type))
        }
        Expr::Binary { op, lhs, rhs } => {
            format!("{} {op} {}", render_operand(dialect, lhs), render_operand(dialect, rhs))
        }
        Expr::Unary { op, expr } => format!("{op} {}", render_operand(dialect, expr)),
        Expr::Paren(inner) => format!("({})", render_expr(dialect, inner)),
    }
}

/// Renders `expr` as an operand of a containing node, wrapping it in
/// parentheses if it is itself a binary combination.
fn render_operand(dialect: &dyn Dialect, expr: &Expr) -> String {
    let rendered = render_expr(dialect, expr);
    if expr.is_binary() {
        format!("({rendered})")
    } else {
        rendered
    }
}

fn render_ref(dialect: &dyn Dialect, path: &cdsl_model::RefPath) -> String {
    let head = match &path.head {
        PathHead::SelfRef => Some("$self".to_string()),
        PathHead::Magic(name) => Some(dialect.magic_variable(name).unwrap_or_else(|| format!("${name}"))),
        PathHead::Plain => None,
    };

    let steps: Vec<String> = path.steps.iter().map(|s| render_step(dialect, s)).collect();
    let body = steps.join(".");

    let joined = match head {
        Some(h) if body.is_empty() => h,
        Some(h) => format!("{h}.{body}"),
        None => body,
    };

    if path.param {
        format!(":{joined}")
    } else {
        joined
    }
}

fn render_step(dialect: &dyn Dialect, step: &PathStep) -> String {
    let mut out = step.name.clone();
    if !step.args.is_empty() {
        let args = step.args.iter().map(|(k, v)| format!("{k}:{}", render_expr(dialect, v))).collect::<Vec<_>>().join(", ");
        out.push_str(&format!("({args})"));
    }
    if let Some(filter) = &step.filter {
        let rendered_filter = render_expr(dialect, filter);
        match step.filter_cardinality {
            Some(card) if card.max != cdsl_model::Bound::Fixed(1) => out.push_str(&format!("[*?{rendered_filter}]")),
            _ => out.push_str(&format!("[{rendered_filter}]")),
        }
    }
    out
}

fn render_func(dialect: &dyn Dialect, name: &str, args: &[Expr]) -> String {
    let rendered_args: Vec<String> = args.iter().map(|a| render_expr(dialect, a)).collect();
    match dialect.map_func(name) {
        Some(mapped) => dialect.render_call(mapped, &rendered_args),
        None => dialect.render_call(name, &rendered_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdsl_model::{Literal, LiteralKind, RefPath, TypeFacets};
    use cdsl_naming::{NamingPolicy, PlainPolicy};

    struct TestDialect;

    impl Dialect for TestDialect {
        fn naming(&self) -> &dyn NamingPolicy {
            &PlainPolicy
        }

        fn map_type(&self, _base: cdsl_model::ScalarBase, _facets: TypeFacets) -> String {
            "TEST".to_string()
        }

        fn map_cast_target(&self, named_type: &str) -> String {
            named_type.to_uppercase()
        }

        fn map_func(&self, name: &str) -> Option<&str> {
            match name {
                "concat" => Some("CONCAT"),
                _ => None,
            }
        }

        fn render_literal(&self, literal: &Literal) -> String {
            match literal.kind {
                LiteralKind::String => format!("'{}'", literal.val),
                _ => literal.val.clone(),
            }
        }

        fn magic_variable(&self, name: &str) -> Option<String> {
            match name {
                "user.id" => Some("SESSION_CONTEXT('APPLICATIONUSER')".to_string()),
                _ => None,
            }
        }
    }

    fn ref_path(steps: &[&str]) -> Expr {
        Expr::Ref(RefPath { head: PathHead::Plain, steps: steps.iter().map(PathStep::plain).collect(), param: false, global: false })
    }

    #[test]
    fn wraps_nested_binary_operand_in_parens() {
        let expr = Expr::Binary {
            op: "and".into(),
            lhs: Box::new(Expr::Binary { op: "=".into(), lhs: Box::new(ref_path(&["a"])), rhs: Box::new(ref_path(&["b"])) }),
            rhs: Box::new(ref_path(&["c"])),
        };
        assert_eq!(render_expr(&TestDialect, &expr), "(a = b) and c");
    }

    #[test]
    fn preserves_explicit_parens_without_doubling() {
        let expr = Expr::Paren(Box::new(Expr::Binary { op: "=".into(), lhs: Box::new(ref_path(&["a"])), rhs: Box::new(ref_path(&["b"])) }));
        assert_eq!(render_expr(&TestDialect, &expr), "(a = b)");
    }

    #[test]
    fn renders_self_ref_and_dotted_path() {
        let expr = Expr::Ref(RefPath { head: PathHead::SelfRef, steps: vec![], param: false, global: false });
        assert_eq!(render_expr(&TestDialect, &expr), "$self");

        let expr = ref_path(&["author", "ID"]);
        assert_eq!(render_expr(&TestDialect, &expr), "author.ID");
    }

    #[test]
    fn expands_known_magic_variable_and_falls_back_for_unknown() {
        let expr = Expr::Ref(RefPath { head: PathHead::Magic("user.id".into()), steps: vec![], param: false, global: false });
        assert_eq!(render_expr(&TestDialect, &expr), "SESSION_CONTEXT('APPLICATIONUSER')");

        let expr = Expr::Ref(RefPath { head: PathHead::Magic("now".into()), steps: vec![], param: false, global: false });
        assert_eq!(render_expr(&TestDialect, &expr), "$now");
    }

    #[test]
    fn renders_mapped_function_call() {
        let expr = Expr::Func { name: "concat".into(), args: vec![ref_path(&["a"]), ref_path(&["b"])] };
        assert_eq!(render_expr(&TestDialect, &expr), "CONCAT(a, b)");
    }

    #[test]
    fn renders_literal_via_dialect() {
        let expr = Expr::Literal(Literal { kind: LiteralKind::String, val: "hi".into() });
        assert_eq!(render_expr(&TestDialect, &expr), "'hi'");
    }
}
