//! Projection builder.
//!
//! A projection is a unary quoted function from a source type to an object
//! type whose body constructs the object, either bare (`new T()`) or with
//! field initializers (`new T { A = ..., B = ... }`). [`ProjectionBuilder`]
//! adds one initializer at a time and never modifies the builder it is
//! called on.

use crate::expression::{Binding, Expression, ExpressionError, ExpressionResult, Lambda, Parameter};
use crate::schema::ObjectType;
use crate::value::DataType;
use std::fmt;
use std::sync::Arc;

/// Entry points for building projections
pub struct Projection;

impl Projection {
    /// Start from an existing construction function
    pub fn create(lambda: Lambda) -> ExpressionResult<ProjectionBuilder> {
        ProjectionBuilder::new(lambda)
    }

    /// Start from `_ => new T()`
    pub fn create_default(
        source_type: DataType,
        object_type: &Arc<ObjectType>,
    ) -> ExpressionResult<ProjectionBuilder> {
        ProjectionBuilder::with_default_constructor(source_type, object_type)
    }

    /// Fix the source type first and take the destination from the function
    /// given to [`IntermediateProjectionBuilder::to`]
    pub fn from(source_type: DataType) -> IntermediateProjectionBuilder {
        IntermediateProjectionBuilder { source_type }
    }
}

/// A projection with a known source type and no body yet
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateProjectionBuilder {
    source_type: DataType,
}

impl IntermediateProjectionBuilder {
    pub fn source_type(&self) -> &DataType {
        &self.source_type
    }

    pub fn to(&self, lambda: Lambda) -> ExpressionResult<ProjectionBuilder> {
        let parameter = lambda.single_parameter()?;
        if parameter.data_type != self.source_type {
            return Err(ExpressionError::TypeMismatch {
                expected: self.source_type.clone(),
                actual: parameter.data_type.clone(),
                context: "projection source".to_string(),
            });
        }
        ProjectionBuilder::new(lambda)
    }
}

/// Immutable builder of a projection function
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionBuilder {
    lambda: Lambda,
    object_type: Arc<ObjectType>,
}

impl ProjectionBuilder {
    /// Wrap a unary function whose body is `new T()` or `new T { ... }`
    pub fn new(lambda: Lambda) -> ExpressionResult<Self> {
        lambda.single_parameter()?;
        let object_type = match lambda.body() {
            Expression::New(object_type) => Arc::clone(object_type),
            Expression::MemberInit { object_type, .. } => Arc::clone(object_type),
            other => {
                return Err(ExpressionError::InvalidExpressionShape {
                    expected: "object construction".to_string(),
                    actual: other.kind().to_string(),
                })
            }
        };
        Ok(Self {
            lambda,
            object_type,
        })
    }

    /// Builder over `_ => new T()`
    pub fn with_default_constructor(
        source_type: DataType,
        object_type: &Arc<ObjectType>,
    ) -> ExpressionResult<Self> {
        let body = Expression::new_instance(object_type)?;
        let lambda = Lambda::returning(
            vec![Parameter::new("_", source_type)],
            body,
            object_type.data_type(),
        )?;
        Self::new(lambda)
    }

    pub fn parameter(&self) -> &Parameter {
        &self.lambda.parameters()[0]
    }

    pub fn source_type(&self) -> &DataType {
        &self.parameter().data_type
    }

    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.object_type
    }

    /// The projection built so far
    pub fn expression(&self) -> &Lambda {
        &self.lambda
    }

    /// Initialize the field named by `getter` with `value`.
    ///
    /// `getter` must be `d => d.Field` over the destination type, and `value`
    /// a function of the source type yielding the field's type.
    pub fn with(&self, getter: &Lambda, value: &Lambda) -> ExpressionResult<Self> {
        let field = self.resolve_getter(getter)?;

        let value_parameter = value.single_parameter()?;
        if value_parameter.data_type != *self.source_type() {
            return Err(ExpressionError::TypeMismatch {
                expected: self.source_type().clone(),
                actual: value_parameter.data_type.clone(),
                context: format!("value of {}.{}", self.object_type.name, field),
            });
        }

        let parameter = self.parameter();
        let value_body = if value_parameter == parameter {
            value.body().clone()
        } else {
            value
                .body()
                .replace(&value_parameter.to_expr(), &parameter.to_expr())
        };
        let binding = Binding::new(self.object_type.field_ref(&field)?, value_body);

        let bindings = match self.lambda.body() {
            Expression::MemberInit { bindings, .. } => {
                let mut bindings = bindings.clone();
                bindings.push(binding);
                bindings
            }
            _ => vec![binding],
        };
        let body = Expression::member_init(Arc::clone(&self.object_type), bindings)?;

        log::debug!("projection binds {}.{}", self.object_type.name, field);
        let lambda = Lambda::returning(
            vec![parameter.clone()],
            body,
            self.object_type.data_type(),
        )?;
        Self::new(lambda)
    }

    /// Name of the destination field accessed by `getter`
    fn resolve_getter(&self, getter: &Lambda) -> ExpressionResult<String> {
        let invalid = |reason: String| ExpressionError::InvalidArgument {
            argument: "getter".to_string(),
            reason,
        };

        let parameter = getter.single_parameter().map_err(|e| invalid(e.to_string()))?;
        if parameter.data_type != self.object_type.data_type() {
            return Err(invalid(format!(
                "expected a function of {}, got one of {}",
                self.object_type.name, parameter.data_type
            )));
        }

        match getter.body() {
            Expression::Member { target, field }
                if **target == parameter.to_expr()
                    && field.owner == self.object_type.name
                    && self.object_type.field(&field.name).is_some() =>
            {
                Ok(field.name.clone())
            }
            other => Err(invalid(format!(
                "expected a field access on {}, got {}",
                parameter.name, other
            ))),
        }
    }
}

impl From<ProjectionBuilder> for Lambda {
    fn from(builder: ProjectionBuilder) -> Self {
        builder.lambda
    }
}

impl fmt::Display for ProjectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lambda)
    }
}
