pub mod codec;
pub mod combinator;
pub mod expression;
pub mod predicate;
pub mod projection;
pub mod schema;
pub mod value;

pub use combinator::{coalesce, combine, compose};
pub use expression::{Expression, ExpressionError, ExpressionResult, Lambda, Parameter};
pub use predicate::{Predicate, PredicateBuilder};
pub use projection::{Projection, ProjectionBuilder};
pub use schema::ObjectType;
pub use value::{DataType, Value};
