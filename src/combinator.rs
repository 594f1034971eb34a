//! Function combinators: combine, compose and coalesce.
//!
//! Each combinator splices the bodies of its inputs into a new tree and
//! re-points parameter references so the result has a single parameter, the
//! first input's. Inputs are never modified.

use crate::expression::{Expression, ExpressionError, ExpressionResult, Lambda, Substitution};
use crate::value::{DataType, Value};

/// Join two unary functions over the same input with a binary combiner.
///
/// The result is `x => combiner(first(x), second(x))`, with `x` the first
/// function's parameter.
pub fn combine(first: &Lambda, second: &Lambda, combiner: &Lambda) -> ExpressionResult<Lambda> {
    let parameter = first.single_parameter()?;
    let other = second.single_parameter()?;
    if parameter.data_type != other.data_type {
        return Err(ExpressionError::TypeMismatch {
            expected: parameter.data_type.clone(),
            actual: other.data_type.clone(),
            context: "combine input".to_string(),
        });
    }

    let (left, right) = match combiner.parameters() {
        [left, right] => (left, right),
        params => {
            return Err(ExpressionError::ArgumentCount {
                expected: 2,
                actual: params.len(),
            })
        }
    };
    expect_type(&left.data_type, first.return_type(), "combiner first argument")?;
    expect_type(&right.data_type, second.return_type(), "combiner second argument")?;

    let second_body = if other == parameter {
        second.body().clone()
    } else {
        second.body().replace(&other.to_expr(), &parameter.to_expr())
    };

    // One pass, so a spliced body mentioning a combiner parameter's name
    // is not substituted again
    let mut substitution = Substitution::new();
    substitution.insert(left.to_expr(), first.body().clone());
    substitution.insert(right.to_expr(), second_body);
    let body = combiner.body().replace_all(&substitution);

    let result = Lambda::returning(
        vec![parameter.clone()],
        body,
        combiner.return_type().clone(),
    )?;
    log::debug!("combine: {}", result);
    Ok(result)
}

/// Feed the output of `first` into `second`: `x => second(first(x))`
pub fn compose(first: &Lambda, second: &Lambda) -> ExpressionResult<Lambda> {
    let parameter = first.single_parameter()?;
    let inner = second.single_parameter()?;
    expect_type(&inner.data_type, first.return_type(), "compose")?;

    let body = second.body().replace(&inner.to_expr(), first.body());
    let result = Lambda::returning(
        vec![parameter.clone()],
        body,
        second.return_type().clone(),
    )?;
    log::debug!("compose: {}", result);
    Ok(result)
}

/// Replace a NULL result of `function` with `default`.
///
/// Without a default, the zero value of the function's return type is used.
pub fn coalesce(function: &Lambda, default: Option<Value>) -> ExpressionResult<Lambda> {
    let parameter = function.single_parameter()?;
    let return_type = function.return_type();

    let default = default.unwrap_or_else(|| return_type.zero_value());
    if !default.is_compatible_with(return_type) {
        return Err(ExpressionError::TypeMismatch {
            expected: return_type.clone(),
            actual: default.data_type().unwrap_or_else(|| return_type.clone()),
            context: "coalesce default".to_string(),
        });
    }

    let body = Expression::coalesce(function.body().clone(), Expression::literal(default));
    let result = Lambda::returning(vec![parameter.clone()], body, return_type.clone())?;
    log::debug!("coalesce: {}", result);
    Ok(result)
}

fn expect_type(expected: &DataType, actual: &DataType, context: &str) -> ExpressionResult<()> {
    if expected != actual {
        return Err(ExpressionError::TypeMismatch {
            expected: expected.clone(),
            actual: actual.clone(),
            context: context.to_string(),
        });
    }
    Ok(())
}
