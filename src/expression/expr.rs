//! Expression AST definitions.

use crate::expression::operator::{BinaryOperator, Function, UnaryOperator};
use crate::expression::{ExpressionError, ExpressionResult, TypeChecker};
use crate::schema::ObjectType;
use crate::value::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Formal parameter of a quoted function, referenced by name from its body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Reference to this parameter, for use in a function body
    pub fn to_expr(&self) -> Expression {
        Expression::Parameter(self.clone())
    }
}

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }

    pub fn bool(val: bool) -> Self {
        Self {
            value: Value::Boolean(val),
        }
    }

    pub fn int32(val: i32) -> Self {
        Self {
            value: Value::Int32(val),
        }
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self {
            value: Value::String(val.into()),
        }
    }
}

/// Field of an object type, as named by a member access or a binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Name of the object type declaring the field
    pub owner: String,
    pub name: String,
    pub data_type: DataType,
}

/// Field initializer of an object construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub field: FieldRef,
    pub value: Expression,
}

impl Binding {
    pub fn new(field: FieldRef, value: Expression) -> Self {
        Self { field, value }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal constant value
    Literal(Literal),

    /// Reference to a formal parameter
    Parameter(Parameter),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Built-in function call
    Call {
        function: Function,
        args: Vec<Expression>,
    },

    /// Field access on an object-valued expression
    Member {
        target: Box<Expression>,
        field: FieldRef,
    },

    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },

    /// `value ?? fallback`
    Coalesce {
        value: Box<Expression>,
        fallback: Box<Expression>,
    },

    /// Zero-argument construction of an object
    New(Arc<ObjectType>),

    /// Construction followed by field initializers
    MemberInit {
        object_type: Arc<ObjectType>,
        bindings: Vec<Binding>,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value.into()))
    }

    pub fn null() -> Self {
        Expression::Literal(Literal::null())
    }

    pub fn bool(val: bool) -> Self {
        Expression::Literal(Literal::bool(val))
    }

    pub fn int32(val: i32) -> Self {
        Expression::Literal(Literal::int32(val))
    }

    pub fn string(val: impl Into<String>) -> Self {
        Expression::Literal(Literal::string(val))
    }

    /// Create a parameter reference expression
    pub fn parameter(name: impl Into<String>, data_type: DataType) -> Self {
        Expression::Parameter(Parameter::new(name, data_type))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    pub fn rem_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Rem, left, right)
    }

    pub fn concat(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Concat, left, right)
    }

    pub fn negate(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Minus, operand)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    pub fn call(function: Function, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    pub fn conditional(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn coalesce(value: Expression, fallback: Expression) -> Self {
        Expression::Coalesce {
            value: Box::new(value),
            fallback: Box::new(fallback),
        }
    }

    /// Create a zero-argument construction of `object_type`
    pub fn new_instance(object_type: &Arc<ObjectType>) -> ExpressionResult<Self> {
        if !object_type.has_default_constructor() {
            return Err(ExpressionError::MissingConstructor {
                type_name: object_type.name.clone(),
            });
        }
        Ok(Expression::New(Arc::clone(object_type)))
    }

    /// Create a construction of `object_type` with field initializers.
    ///
    /// Every binding must name a field of the type, at most once, with a value
    /// whose type fits the field.
    pub fn member_init(
        object_type: Arc<ObjectType>,
        bindings: Vec<Binding>,
    ) -> ExpressionResult<Self> {
        if !object_type.has_default_constructor() {
            return Err(ExpressionError::MissingConstructor {
                type_name: object_type.name.clone(),
            });
        }
        TypeChecker::unscoped().check_bindings(&object_type, &bindings)?;
        Ok(Expression::MemberInit {
            object_type,
            bindings,
        })
    }

    /// The literal value of this node, if it is a literal
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expression::Literal(lit) => Some(&lit.value),
            _ => None,
        }
    }

    /// Check if this node is exactly the boolean literal `value`
    pub fn is_bool_literal(&self, value: bool) -> bool {
        self.as_literal() == Some(&Value::Boolean(value))
    }

    /// Name of the node kind
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "literal",
            Expression::Parameter(_) => "parameter",
            Expression::BinaryOp { .. } => "binary operation",
            Expression::UnaryOp { .. } => "unary operation",
            Expression::Call { .. } => "call",
            Expression::Member { .. } => "member access",
            Expression::Conditional { .. } => "conditional",
            Expression::Coalesce { .. } => "coalesce",
            Expression::New(_) => "new instance",
            Expression::MemberInit { .. } => "new instance with initializers",
        }
    }

    /// Direct children of this node, in evaluation order
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Parameter(_) | Expression::New(_) => Vec::new(),
            Expression::BinaryOp { left, right, .. } => vec![left, right],
            Expression::UnaryOp { operand, .. } => vec![operand],
            Expression::Call { args, .. } => args.iter().collect(),
            Expression::Member { target, .. } => vec![target],
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => vec![condition, then, otherwise],
            Expression::Coalesce { value, fallback } => vec![value, fallback],
            Expression::MemberInit { bindings, .. } => {
                bindings.iter().map(|binding| &binding.value).collect()
            }
        }
    }

    /// Distinct parameters referenced anywhere in this tree, in first-seen order
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut found = Vec::new();
        self.collect_parameters(&mut found);
        found
    }

    fn collect_parameters<'a>(&'a self, found: &mut Vec<&'a Parameter>) {
        if let Expression::Parameter(param) = self {
            if !found.contains(&param) {
                found.push(param);
            }
            return;
        }
        for child in self.children() {
            child.collect_parameters(found);
        }
    }

    /// Check if this expression references no parameters
    pub fn is_closed(&self) -> bool {
        self.parameters().is_empty()
    }

    /// Number of nodes on the longest path from this node to a leaf
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expression::depth)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::Parameter(param) => write!(f, "{}", param.name),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::Not | UnaryOperator::Minus => write!(f, "{}{}", op.as_str(), operand),
                UnaryOperator::IsNull | UnaryOperator::IsNotNull => {
                    write!(f, "({} {})", operand, op.as_str())
                }
            },
            Expression::Call { function, args } => {
                write!(f, "{}(", function.as_str())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Member { target, field } => write!(f, "{}.{}", target, field.name),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", condition, then, otherwise),
            Expression::Coalesce { value, fallback } => write!(f, "({} ?? {})", value, fallback),
            Expression::New(object_type) => write!(f, "new {}()", object_type.name),
            Expression::MemberInit {
                object_type,
                bindings,
            } => {
                write!(f, "new {} {{", object_type.name)?;
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {} = {}", binding.field.name, binding.value)?;
                }
                write!(f, " }}")
            }
        }
    }
}
