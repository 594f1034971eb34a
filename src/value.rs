//! Runtime values and data types for quoted functions.

use crate::expression::{ExpressionError, ExpressionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types an expression can produce
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Varchar,
    /// An object type, identified by name
    Object(String),
}

impl DataType {
    /// The value a field of this type holds before anything is assigned to it
    pub fn zero_value(&self) -> Value {
        match self {
            DataType::Boolean => Value::Boolean(false),
            DataType::Int32 => Value::Int32(0),
            DataType::Varchar => Value::String(String::new()),
            DataType::Object(_) => Value::Null,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, DataType::Object(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "bool"),
            DataType::Int32 => write!(f, "int"),
            DataType::Varchar => write!(f, "string"),
            DataType::Object(name) => write!(f, "{}", name),
        }
    }
}

/// An instance of an object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Get the value of a field, if the record has it
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Assign a field, appending it when the record does not have it yet
    pub fn set(&mut self, field: &str, value: Value) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {} = {}", name, value)?;
        }
        write!(f, " }}")
    }
}

/// Values produced by evaluating expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    String(String),
    Object(Record),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::String(_) => Some(DataType::Varchar),
            Value::Object(record) => Some(DataType::Object(record.type_name.clone())),
        }
    }

    /// Check if this value is compatible with the given data type
    pub fn is_compatible_with(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true, // NULL is compatible with any type
            (Value::Boolean(_), DataType::Boolean) => true,
            (Value::Int32(_), DataType::Int32) => true,
            (Value::String(_), DataType::Varchar) => true,
            (Value::Object(record), DataType::Object(name)) => record.type_name == *name,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse a textual argument as a value of the given type.
    ///
    /// The literal `null` is accepted for every type. Object values cannot be
    /// written as text.
    pub fn parse_as(data_type: &DataType, text: &str) -> ExpressionResult<Value> {
        if text == "null" {
            return Ok(Value::Null);
        }

        let invalid = || ExpressionError::InvalidArgument {
            argument: text.to_string(),
            reason: format!("not a valid {} value", data_type),
        };

        match data_type {
            DataType::Boolean => text.parse().map(Value::Boolean).map_err(|_| invalid()),
            DataType::Int32 => text.parse().map(Value::Int32).map_err(|_| invalid()),
            DataType::Varchar => Ok(Value::String(text.to_string())),
            DataType::Object(_) => Err(invalid()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(record) => write!(f, "{}", record),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}
