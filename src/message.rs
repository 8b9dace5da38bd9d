use crate::types::{Decode, Encode, TypeMismatch, Value};
use serde::{Deserialize, Serialize};

/// A method invocation: the remote method's name and its ordered arguments.
///
/// The empty value (no name, no arguments) is valid and round-trips.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RpcData {
    pub name: String,
    pub args: Vec<Value>,
}

impl RpcData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg<T: Encode>(mut self, arg: T) -> Self {
        self.push(arg);
        self
    }

    pub fn push<T: Encode>(&mut self, arg: T) {
        self.args.push(T::encode(arg));
    }

    /// Returns `None` when there is no argument at `index`.
    pub fn arg<T: Decode>(&self, index: usize) -> Option<Result<T, TypeMismatch>> {
        self.args.get(index).cloned().map(T::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_order() {
        let data = RpcData::new("ProcessData")
            .with_arg("test")
            .with_arg(2.5)
            .with_arg(vec![1u8, 2]);
        assert_eq!(data.args.len(), 3);
        assert_eq!(data.arg::<String>(0).unwrap().unwrap(), "test");
        assert_eq!(data.arg::<f64>(1).unwrap().unwrap(), 2.5);
        assert!(data.arg::<i64>(2).unwrap().is_err());
        assert!(data.arg::<i64>(3).is_none());
    }
}
