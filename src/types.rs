use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// The declared type of a value: one of the built-in kinds, or a structured
/// type identified by its registered name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Type {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Struct(String),
}

impl Type {
    pub fn name(&self) -> &str {
        use Type::*;
        match self {
            Bool => "Bool",
            Int => "Int",
            Float => "Float",
            Text => "Text",
            Bytes => "Bytes",
            Struct(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Type::Struct(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Struct(name) => write!(f, "Struct({name})"),
            other => f.write_str(other.name()),
        }
    }
}

/// A single RPC argument. The variant is the tag; no runtime type inspection
/// is needed to encode it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Struct(StructValue),
}

impl Value {
    pub fn rpc_type(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Text(_) => Type::Text,
            Value::Bytes(_) => Type::Bytes,
            Value::Struct(s) => Type::Struct(s.type_name.clone()),
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so NaN payloads and signed zeros survive a
// round trip observably.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Text(a), Text(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Struct(a), Struct(b)) => a == b,
            _ => false,
        }
    }
}

/// A value of a registered structured type. Fields are positional, in the
/// order given by the type's descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StructValue {
    pub type_name: String,
    pub fields: Vec<Value>,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>, fields: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn is<T: crate::Structured>(&self) -> bool {
        self.type_name == T::TYPE_NAME
    }

    /// Converts back into the concrete Rust type, if this value is one and
    /// carries exactly the fields the type declares.
    pub fn downcast<T: crate::Structured>(self) -> Result<T, TypeMismatch> {
        if !self.is::<T>() || self.fields.len() != T::descriptor().fields.len() {
            let expected = Type::Struct(T::TYPE_NAME.to_owned());
            return Err(TypeMismatch::new(Value::Struct(self), expected));
        }
        T::from_fields(self.fields)
    }
}

pub trait Typed {
    fn rpc_type() -> Type;
}

/// Conversion from a Rust value into a [`Value`].
pub trait Encode {
    fn encode(val: Self) -> Value;
}

/// Conversion from a [`Value`] back into a Rust value.
pub trait Decode: Sized {
    fn decode(val: Value) -> Result<Self, TypeMismatch>;
}

macro_rules! impl_encode_decode {
    ($rust_type:ty, $rpc_type:expr, $encode_name:pat => $encode_expr:expr, $($from_rpc_arm:tt)*) => {
        impl Typed for $rust_type {
            fn rpc_type() -> Type {
                $rpc_type
            }
        }

        impl Encode for $rust_type {
            fn encode($encode_name: $rust_type) -> Value {
                $encode_expr
            }
        }

        impl Decode for $rust_type {
            fn decode(val: Value) -> Result<Self, TypeMismatch> {
                Ok(match val {
                    $($from_rpc_arm)*,
                    _ => return Err(TypeMismatch::new(val, <Self as Typed>::rpc_type()))
                })
            }
        }
    };
}

impl_encode_decode!(bool, Type::Bool, b => Value::Bool(b), Value::Bool(b) => b);
impl_encode_decode!(i64, Type::Int, n => Value::Int(n), Value::Int(n) => n);
impl_encode_decode!(f64, Type::Float, x => Value::Float(x), Value::Float(x) => x);
impl_encode_decode!(String, Type::Text, s => Value::Text(s), Value::Text(s) => s);
impl_encode_decode!(Vec<u8>, Type::Bytes, b => Value::Bytes(b), Value::Bytes(b) => b);

macro_rules! impl_narrow_int {
    ($($rust_type:ty),*) => {$(
        impl Typed for $rust_type {
            fn rpc_type() -> Type {
                Type::Int
            }
        }

        impl Encode for $rust_type {
            fn encode(n: $rust_type) -> Value {
                Value::Int(n.into())
            }
        }

        impl Decode for $rust_type {
            fn decode(val: Value) -> Result<Self, TypeMismatch> {
                match val {
                    Value::Int(n) => <$rust_type>::try_from(n)
                        .map_err(|_| TypeMismatch::new(Value::Int(n), Type::Int)),
                    _ => Err(TypeMismatch::new(val, Type::Int)),
                }
            }
        }
    )*};
}

impl_narrow_int!(i8, i16, i32, u8, u16, u32);

impl Encode for &str {
    fn encode(s: Self) -> Value {
        Value::Text(s.to_owned())
    }
}

impl Encode for &[u8] {
    fn encode(b: Self) -> Value {
        Value::Bytes(b.to_vec())
    }
}

impl Encode for Value {
    fn encode(val: Value) -> Value {
        val
    }
}

impl Decode for Value {
    fn decode(val: Value) -> Result<Self, TypeMismatch> {
        Ok(val)
    }
}

impl Encode for StructValue {
    fn encode(val: StructValue) -> Value {
        Value::Struct(val)
    }
}

macro_rules! impl_from {
    ($($rust_type:ty),*) => {$(
        impl From<$rust_type> for Value {
            fn from(val: $rust_type) -> Self {
                <$rust_type as Encode>::encode(val)
            }
        }
    )*};
}

impl_from!(bool, i8, i16, i32, i64, u8, u16, u32, f64, String, Vec<u8>, StructValue);
impl_from!(&str, &[u8]);

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatch {
    value: Option<Value>,
    expected_type: Type,
}

impl TypeMismatch {
    pub fn new(value: Value, expected_type: Type) -> Self {
        Self {
            value: Some(value),
            expected_type,
        }
    }

    /// A value of `expected_type` was required but none was present.
    pub fn missing(expected_type: Type) -> Self {
        Self {
            value: None,
            expected_type,
        }
    }

    pub fn expected(&self) -> &Type {
        &self.expected_type
    }

    pub fn found(&self) -> Option<Type> {
        self.value.as_ref().map(Value::rpc_type)
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "Type error: {:?} :/: {}", value, self.expected_type),
            None => write!(f, "Type error: missing :/: {}", self.expected_type),
        }
    }
}

impl Error for TypeMismatch {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(2.5), Value::from(2.5));
    }

    #[test]
    fn narrow_ints_check_range() {
        assert_eq!(i32::decode(Value::Int(7)).unwrap(), 7);
        let err = u8::decode(Value::Int(300)).unwrap_err();
        assert_eq!(err.expected(), &Type::Int);
        assert!(u32::decode(Value::Int(-1)).is_err());
    }

    #[test]
    fn mismatch_reports_both_types() {
        let err = String::decode(Value::Int(1)).unwrap_err();
        assert_eq!(err.expected(), &Type::Text);
        assert_eq!(err.found(), Some(Type::Int));
        assert!(err.to_string().contains("Text"));
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from("hi"), Value::Text("hi".into()));
        assert_eq!(Value::from(&[1u8, 2][..]), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::from(true).rpc_type(), Type::Bool);
        assert!(Type::Int.is_builtin());
        assert!(!Type::Struct("Point".into()).is_builtin());
    }
}
