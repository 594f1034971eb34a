//! Tree substitution.
//!
//! Every combinator in this crate re-points parameter references by replacing
//! subtrees. Matching is by structural equality, and a replacement is spliced
//! in as-is: the walk never descends into it, so a replacement that itself
//! contains a target does not loop.

use crate::expression::{Binding, Expression};

/// Ordered set of `target -> replacement` pairs with unique targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    entries: Vec<(Expression, Expression)>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// A substitution with a single pair
    pub fn single(target: Expression, replacement: Expression) -> Self {
        Self {
            entries: vec![(target, replacement)],
        }
    }

    /// Add a pair, returning the previous replacement if `target` was present
    pub fn insert(&mut self, target: Expression, replacement: Expression) -> Option<Expression> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == target) {
            Some((_, slot)) => Some(std::mem::replace(slot, replacement)),
            None => {
                self.entries.push((target, replacement));
                None
            }
        }
    }

    /// Replacement for `node`, if it matches a target
    pub fn lookup(&self, node: &Expression) -> Option<&Expression> {
        self.entries
            .iter()
            .find(|(target, _)| target == node)
            .map(|(_, replacement)| replacement)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Expression, Expression)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Expression, Expression)>>(iter: I) -> Self {
        let mut substitution = Substitution::new();
        for (target, replacement) in iter {
            substitution.insert(target, replacement);
        }
        substitution
    }
}

impl Expression {
    /// Rebuild this tree top-down.
    ///
    /// `rewrite` sees each node before its children. When it returns a
    /// replacement the node's subtree is swapped for it and not visited
    /// further; otherwise the node is rebuilt from its rewritten children.
    pub fn transform_down<F>(&self, rewrite: &mut F) -> Expression
    where
        F: FnMut(&Expression) -> Option<Expression>,
    {
        if let Some(replacement) = rewrite(self) {
            return replacement;
        }

        let mut recurse = |child: &Expression| Box::new(child.transform_down(rewrite));

        match self {
            Expression::Literal(_) | Expression::Parameter(_) | Expression::New(_) => self.clone(),
            Expression::BinaryOp { op, left, right } => Expression::BinaryOp {
                op: *op,
                left: recurse(left),
                right: recurse(right),
            },
            Expression::UnaryOp { op, operand } => Expression::UnaryOp {
                op: *op,
                operand: recurse(operand),
            },
            Expression::Call { function, args } => Expression::Call {
                function: *function,
                args: args.iter().map(|arg| *recurse(arg)).collect(),
            },
            Expression::Member { target, field } => Expression::Member {
                target: recurse(target),
                field: field.clone(),
            },
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => Expression::Conditional {
                condition: recurse(condition),
                then: recurse(then),
                otherwise: recurse(otherwise),
            },
            Expression::Coalesce { value, fallback } => Expression::Coalesce {
                value: recurse(value),
                fallback: recurse(fallback),
            },
            Expression::MemberInit {
                object_type,
                bindings,
            } => Expression::MemberInit {
                object_type: object_type.clone(),
                bindings: bindings
                    .iter()
                    .map(|binding| Binding::new(binding.field.clone(), *recurse(&binding.value)))
                    .collect(),
            },
        }
    }

    /// Replace every occurrence of `target` with `replacement`
    pub fn replace(&self, target: &Expression, replacement: &Expression) -> Expression {
        log::trace!("replacing {} with {} in {}", target, replacement, self);
        self.transform_down(&mut |node| (node == target).then(|| replacement.clone()))
    }

    /// Apply every pair of `substitution` in a single pass.
    ///
    /// A node matching several targets takes the first pair in insertion order.
    pub fn replace_all(&self, substitution: &Substitution) -> Expression {
        if substitution.is_empty() {
            return self.clone();
        }
        log::trace!("applying {} substitutions to {}", substitution.len(), self);
        self.transform_down(&mut |node| substitution.lookup(node).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Parameter;
    use crate::schema::ObjectType;
    use crate::value::DataType;
    use std::sync::Arc;

    fn param(name: &str) -> Expression {
        Expression::parameter(name, DataType::Int32)
    }

    #[test]
    fn test_replace_every_occurrence() {
        let expr = Expression::add_expr(
            Expression::mul_expr(param("x"), param("x")),
            Expression::negate(param("x")),
        );
        let result = expr.replace(&param("x"), &param("y"));

        let expected = Expression::add_expr(
            Expression::mul_expr(param("y"), param("y")),
            Expression::negate(param("y")),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn test_replace_matches_structure() {
        // (x + 1) * (x + 1): both structurally equal subtrees are replaced
        let sum = Expression::add_expr(param("x"), Expression::int32(1));
        let expr = Expression::mul_expr(sum.clone(), sum.clone());

        let result = expr.replace(&sum, &param("s"));
        assert_eq!(result, Expression::mul_expr(param("s"), param("s")));
    }

    #[test]
    fn test_replace_without_match_is_unchanged() {
        let expr = Expression::gt(param("x"), Expression::int32(0));
        assert_eq!(expr.replace(&param("z"), &param("y")), expr);
        assert_eq!(expr.replace_all(&Substitution::new()), expr);
    }

    #[test]
    fn test_replacement_interior_is_not_revisited() {
        // x -> x + 1 must terminate and apply exactly once per occurrence
        let expr = Expression::mul_expr(param("x"), Expression::int32(2));
        let replacement = Expression::add_expr(param("x"), Expression::int32(1));

        let result = expr.replace(&param("x"), &replacement);
        assert_eq!(
            result,
            Expression::mul_expr(replacement.clone(), Expression::int32(2))
        );
    }

    #[test]
    fn test_replace_all_is_single_pass() {
        // Swapping a and b must not chain a -> b -> a
        let expr = Expression::sub_expr(param("a"), param("b"));
        let substitution: Substitution = vec![(param("a"), param("b")), (param("b"), param("a"))]
            .into_iter()
            .collect();

        assert_eq!(
            expr.replace_all(&substitution),
            Expression::sub_expr(param("b"), param("a"))
        );
    }

    #[test]
    fn test_first_match_wins() {
        let sum = Expression::add_expr(param("x"), param("y"));
        let expr = Expression::negate(sum.clone());

        let mut substitution = Substitution::new();
        substitution.insert(sum.clone(), Expression::int32(1));
        substitution.insert(param("x"), Expression::int32(2));

        // The outer match replaces the whole subtree; x inside it is never seen
        assert_eq!(
            expr.replace_all(&substitution),
            Expression::negate(Expression::int32(1))
        );
    }

    #[test]
    fn test_insert_overwrites_target() {
        let mut substitution = Substitution::single(param("x"), Expression::int32(1));
        assert_eq!(
            substitution.insert(param("x"), Expression::int32(2)),
            Some(Expression::int32(1))
        );
        assert_eq!(substitution.len(), 1);
        assert_eq!(
            substitution.lookup(&param("x")),
            Some(&Expression::int32(2))
        );
    }

    #[test]
    fn test_replace_inside_bindings() {
        let ty = Arc::new(ObjectType::new("Foo").with_field("Id", DataType::Int32));
        let i = Parameter::new("i", DataType::Int32);
        let j = Parameter::new("j", DataType::Int32);
        let init = Expression::member_init(
            ty.clone(),
            vec![Binding::new(ty.field_ref("Id").unwrap(), i.to_expr())],
        )
        .unwrap();

        let result = init.replace(&i.to_expr(), &j.to_expr());
        assert_eq!(result.parameters(), vec![&j]);
    }

    #[test]
    fn test_input_tree_is_untouched() {
        let expr = Expression::and(
            Expression::gt(param("x"), Expression::int32(0)),
            Expression::lt(param("x"), Expression::int32(10)),
        );
        let before = expr.clone();
        let _ = expr.replace(&param("x"), &param("y"));
        assert_eq!(expr, before);
    }
}
