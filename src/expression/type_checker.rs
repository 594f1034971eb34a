//! Type checking for expressions.

use crate::expression::{Binding, Expression, ExpressionError, ExpressionResult, Parameter};
use crate::expression::operator::UnaryOperator;
use crate::schema::ObjectType;
use crate::value::DataType;

/// Type checker for expressions.
///
/// Parameter references carry their own type, so a tree can be checked without
/// a scope. With a scope, every referenced parameter must also be declared in
/// it.
pub struct TypeChecker<'a> {
    scope: Option<&'a [Parameter]>,
}

impl<'a> TypeChecker<'a> {
    /// Create a type checker that resolves parameters against `parameters`
    pub fn new(parameters: &'a [Parameter]) -> Self {
        Self {
            scope: Some(parameters),
        }
    }

    /// Create a type checker that trusts every parameter reference
    pub fn unscoped() -> Self {
        Self { scope: None }
    }

    /// Type check an expression and return its output type.
    ///
    /// `None` means the expression is statically NULL.
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<DataType>> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.data_type()),

            Expression::Parameter(param) => {
                if let Some(scope) = self.scope {
                    if !scope.contains(param) {
                        return Err(ExpressionError::UnboundParameter {
                            name: param.name.clone(),
                        });
                    }
                }
                Ok(Some(param.data_type.clone()))
            }

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(&lt, &rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }),
                    },
                    // NULL operands are handled at runtime
                    (known, None) | (None, known) => Ok(op.null_output_type(known.as_ref())),
                }
            }

            Expression::UnaryOp { op, operand } => match self.check(operand)? {
                Some(ot) => match op.output_type(&ot) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: Some(ot),
                        right_type: None,
                    }),
                },
                None => Ok(Some(match op {
                    UnaryOperator::Minus => DataType::Int32,
                    _ => DataType::Boolean,
                })),
            },

            Expression::Call { function, args } => {
                if args.len() != function.arity() {
                    return Err(ExpressionError::FunctionArgumentCount {
                        function: function.as_str().to_string(),
                        expected: function.arity(),
                        actual: args.len(),
                    });
                }

                let arg_types = args
                    .iter()
                    .map(|arg| self.check(arg))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                let Some(known) = arg_types.iter().cloned().collect::<Option<Vec<_>>>() else {
                    return Ok(Some(function.null_output_type()));
                };

                match function.output_type(&known) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: function.as_str().to_string(),
                        left_type: known.first().cloned(),
                        right_type: known.get(1).cloned(),
                    }),
                }
            }

            Expression::Member { target, field } => match self.check(target)? {
                Some(DataType::Object(name)) if name == field.owner => {
                    Ok(Some(field.data_type.clone()))
                }
                None => Ok(Some(field.data_type.clone())),
                other => Err(ExpressionError::InvalidMemberAccess {
                    field: field.name.clone(),
                    target_type: other,
                }),
            },

            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                match self.check(condition)? {
                    Some(DataType::Boolean) | None => {}
                    Some(other) => {
                        return Err(ExpressionError::TypeMismatch {
                            expected: DataType::Boolean,
                            actual: other,
                            context: "conditional test".to_string(),
                        })
                    }
                }
                let then_type = self.check(then)?;
                let otherwise_type = self.check(otherwise)?;
                unify(then_type, otherwise_type, "conditional branches")
            }

            Expression::Coalesce { value, fallback } => {
                let value_type = self.check(value)?;
                let fallback_type = self.check(fallback)?;
                unify(value_type, fallback_type, "coalesce fallback")
            }

            Expression::New(object_type) => Ok(Some(object_type.data_type())),

            Expression::MemberInit {
                object_type,
                bindings,
            } => {
                self.check_bindings(object_type, bindings)?;
                Ok(Some(object_type.data_type()))
            }
        }
    }

    /// Check the field initializers of a construction of `object_type`
    pub fn check_bindings(
        &self,
        object_type: &ObjectType,
        bindings: &[Binding],
    ) -> ExpressionResult<()> {
        let mut seen: Vec<&str> = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let field = &binding.field;
            let declared = object_type
                .field(&field.name)
                .filter(|_| field.owner == object_type.name)
                .ok_or_else(|| ExpressionError::UnknownField {
                    type_name: object_type.name.clone(),
                    field: field.name.clone(),
                })?;

            if seen.contains(&field.name.as_str()) {
                return Err(ExpressionError::DuplicateFieldInitializer {
                    type_name: object_type.name.clone(),
                    field: field.name.clone(),
                });
            }
            seen.push(&field.name);

            if let Some(actual) = self.check(&binding.value)? {
                if actual != declared.data_type {
                    return Err(ExpressionError::TypeMismatch {
                        expected: declared.data_type.clone(),
                        actual,
                        context: format!("initializer of {}.{}", object_type.name, field.name),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Result type of two expressions that must agree, where NULL fits anything
fn unify(
    first: Option<DataType>,
    second: Option<DataType>,
    context: &str,
) -> ExpressionResult<Option<DataType>> {
    match (first, second) {
        (Some(t1), Some(t2)) if t1 == t2 => Ok(Some(t1)),
        (Some(t1), Some(t2)) => Err(ExpressionError::TypeMismatch {
            expected: t1,
            actual: t2,
            context: context.to_string(),
        }),
        (known, None) | (None, known) => Ok(known),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{BinaryOperator, Function};
    use std::sync::Arc;

    fn foo() -> Arc<ObjectType> {
        Arc::new(
            ObjectType::new("Foo")
                .with_field("Id", DataType::Int32)
                .with_field("Name", DataType::Varchar),
        )
    }

    #[test]
    fn test_literal_type_checking() {
        let checker = TypeChecker::unscoped();

        assert_eq!(
            checker.check(&Expression::int32(42)).unwrap(),
            Some(DataType::Int32)
        );
        assert_eq!(
            checker.check(&Expression::string("test")).unwrap(),
            Some(DataType::Varchar)
        );
        assert_eq!(
            checker.check(&Expression::bool(true)).unwrap(),
            Some(DataType::Boolean)
        );
        assert_eq!(checker.check(&Expression::null()).unwrap(), None);
    }

    #[test]
    fn test_parameter_scope() {
        let x = Parameter::new("x", DataType::Int32);
        let y = Parameter::new("y", DataType::Int32);
        let scope = vec![x.clone()];
        let checker = TypeChecker::new(&scope);

        assert_eq!(checker.check(&x.to_expr()).unwrap(), Some(DataType::Int32));
        assert_eq!(
            checker.check(&y.to_expr()),
            Err(ExpressionError::UnboundParameter {
                name: "y".to_string()
            })
        );

        // Same name with a different type is a different parameter
        let x_str = Parameter::new("x", DataType::Varchar);
        assert!(checker.check(&x_str.to_expr()).is_err());

        assert_eq!(
            TypeChecker::unscoped().check(&y.to_expr()).unwrap(),
            Some(DataType::Int32)
        );
    }

    #[test]
    fn test_binary_op_type_checking() {
        let x = Parameter::new("x", DataType::Int32);
        let scope = vec![x.clone()];
        let checker = TypeChecker::new(&scope);

        let expr = Expression::add_expr(x.to_expr(), Expression::int32(5));
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Int32));

        let expr = Expression::eq(
            Expression::rem_expr(x.to_expr(), Expression::int32(2)),
            Expression::int32(0),
        );
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Boolean));

        let expr = Expression::add_expr(x.to_expr(), Expression::string("a"));
        assert!(matches!(
            checker.check(&expr),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));

        // NULL operands
        let expr = Expression::eq(x.to_expr(), Expression::null());
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Boolean));
        let expr = Expression::binary_op(BinaryOperator::Mul, Expression::null(), x.to_expr());
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Int32));
    }

    #[test]
    fn test_unary_and_call_type_checking() {
        let checker = TypeChecker::unscoped();

        assert_eq!(
            checker
                .check(&Expression::not_expr(Expression::bool(true)))
                .unwrap(),
            Some(DataType::Boolean)
        );
        assert!(checker
            .check(&Expression::not_expr(Expression::int32(1)))
            .is_err());
        assert_eq!(
            checker.check(&Expression::negate(Expression::null())).unwrap(),
            Some(DataType::Int32)
        );

        let call = Expression::call(Function::Length, vec![Expression::string("abc")]);
        assert_eq!(checker.check(&call).unwrap(), Some(DataType::Int32));

        let call = Expression::call(Function::Abs, vec![]);
        assert!(matches!(
            checker.check(&call),
            Err(ExpressionError::FunctionArgumentCount { .. })
        ));

        let call = Expression::call(Function::Upper, vec![Expression::int32(1)]);
        assert!(matches!(
            checker.check(&call),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));
    }

    #[test]
    fn test_member_type_checking() {
        let ty = foo();
        let f = Parameter::new("f", ty.data_type());
        let scope = vec![f.clone()];
        let checker = TypeChecker::new(&scope);

        let member = ty.member(f.to_expr(), "Name").unwrap();
        assert_eq!(checker.check(&member).unwrap(), Some(DataType::Varchar));

        let bad = Expression::Member {
            target: Box::new(Expression::int32(1)),
            field: ty.field_ref("Id").unwrap(),
        };
        assert_eq!(
            checker.check(&bad),
            Err(ExpressionError::InvalidMemberAccess {
                field: "Id".to_string(),
                target_type: Some(DataType::Int32),
            })
        );
    }

    #[test]
    fn test_conditional_and_coalesce_type_checking() {
        let checker = TypeChecker::unscoped();

        let expr = Expression::conditional(
            Expression::bool(true),
            Expression::int32(1),
            Expression::null(),
        );
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Int32));

        let expr = Expression::conditional(
            Expression::int32(1),
            Expression::int32(1),
            Expression::int32(2),
        );
        assert!(matches!(
            checker.check(&expr),
            Err(ExpressionError::TypeMismatch { .. })
        ));

        let expr = Expression::coalesce(Expression::null(), Expression::string("x"));
        assert_eq!(checker.check(&expr).unwrap(), Some(DataType::Varchar));

        let expr = Expression::coalesce(Expression::int32(1), Expression::string("x"));
        assert!(checker.check(&expr).is_err());
    }

    #[test]
    fn test_construction_type_checking() {
        let ty = foo();
        let checker = TypeChecker::unscoped();

        assert_eq!(
            checker.check(&Expression::New(ty.clone())).unwrap(),
            Some(ty.data_type())
        );

        let init = Expression::MemberInit {
            object_type: ty.clone(),
            bindings: vec![
                Binding::new(ty.field_ref("Id").unwrap(), Expression::int32(1)),
                Binding::new(ty.field_ref("Id").unwrap(), Expression::int32(2)),
            ],
        };
        assert!(matches!(
            checker.check(&init),
            Err(ExpressionError::DuplicateFieldInitializer { .. })
        ));
    }
}
