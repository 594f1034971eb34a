//! Object type metadata.
//!
//! An [`ObjectType`] describes a destination type for object construction:
//! its name, its fields in declaration order and whether it can be built
//! without constructor arguments.

use crate::expression::{Expression, ExpressionError, ExpressionResult, FieldRef};
use crate::value::{DataType, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    /// Whether the type has a zero-argument constructor
    pub default_constructor: bool,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            default_constructor: true,
        }
    }

    /// Add a field to the type
    pub fn with_field(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Reference to a field of this type, for use in member access and bindings
    pub fn field_ref(&self, name: &str) -> ExpressionResult<FieldRef> {
        let field = self.field(name).ok_or_else(|| ExpressionError::UnknownField {
            type_name: self.name.clone(),
            field: name.to_string(),
        })?;
        Ok(FieldRef {
            owner: self.name.clone(),
            name: field.name.clone(),
            data_type: field.data_type.clone(),
        })
    }

    pub fn data_type(&self) -> DataType {
        DataType::Object(self.name.clone())
    }

    /// Build a member access `target.field`
    pub fn member(&self, target: Expression, field: &str) -> ExpressionResult<Expression> {
        Ok(Expression::Member {
            target: Box::new(target),
            field: self.field_ref(field)?,
        })
    }

    /// A fresh record with every field set to its zero value
    pub fn instantiate(&self) -> Record {
        let mut record = Record::new(self.name.clone());
        for field in &self.fields {
            record.set(&field.name, field.data_type.zero_value());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn foo() -> ObjectType {
        ObjectType::new("Foo")
            .with_field("Id", DataType::Int32)
            .with_field("Name", DataType::Varchar)
    }

    #[test]
    fn test_field_lookup() {
        let ty = foo();
        assert_eq!(ty.field("Id").map(|f| &f.data_type), Some(&DataType::Int32));
        assert!(ty.field("Missing").is_none());
        assert_eq!(ty.data_type(), DataType::Object("Foo".to_string()));
        assert!(ty.has_default_constructor());
        assert!(!ty.without_default_constructor().has_default_constructor());
    }

    #[test]
    fn test_field_ref() {
        let field = foo().field_ref("Name").unwrap();
        assert_eq!(field.owner, "Foo");
        assert_eq!(field.data_type, DataType::Varchar);

        assert_eq!(
            foo().field_ref("Age"),
            Err(ExpressionError::UnknownField {
                type_name: "Foo".to_string(),
                field: "Age".to_string(),
            })
        );
    }

    #[test]
    fn test_instantiate() {
        let record = foo().instantiate();
        assert_eq!(record.type_name, "Foo");
        assert_eq!(record.get("Id"), Some(&Value::Int32(0)));
        assert_eq!(record.get("Name"), Some(&Value::String(String::new())));
    }
}
