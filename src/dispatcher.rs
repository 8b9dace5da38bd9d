use crate::{
    codec::Codec,
    error::{DecodeError, EncodeError},
    message::RpcData,
    types::{Decode, Encode, TypeMismatch, Value},
    RpcFunction,
};
use futures::future::BoxFuture;
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Maps [`RpcFunction`] names to callable functions.
///
/// Functions are registered with [`add`](Self::add) and called with a decoded
/// [`RpcData`] via [`call`](Self::call), or straight from request bytes via
/// [`handle`](Self::handle).
#[derive(Default)]
pub struct Dispatcher {
    rpc_functions: BTreeMap<String, Arc<dyn DynamicRpcFunction + Send + Sync + 'static>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<RFn>(&mut self, rpc_function: RFn)
    where
        RFn: RpcFunction + Send + Sync + 'static,
        RFn::Domain: Send,
    {
        let name = rpc_function.name().to_owned();
        debug!(%name, "adding rpc function");
        self.rpc_functions
            .insert(name, Arc::new(TypedRpcFunction { rpc_function }));
    }

    pub fn names(&self) -> Vec<&str> {
        self.rpc_functions.keys().map(String::as_str).collect()
    }

    pub async fn call(&self, data: RpcData) -> Result<Value, DispatchError> {
        let RpcData { name, args } = data;
        let rfn = self
            .rpc_functions
            .get(&name)
            .ok_or_else(|| DispatchError::NoSuchFunction(name.clone()))?;
        debug!(%name, argc = args.len(), "dispatching");
        Ok(rfn.call(args).await?)
    }

    /// Decodes a request, calls the named function and encodes the reply as
    /// an [`RpcData`] with the same name and the return value as its only
    /// argument.
    pub async fn handle(&self, codec: &Codec, request: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let request = codec.decode(request)?;
        let name = request.name.clone();
        let retval = self.call(request).await?;
        let reply = RpcData {
            name,
            args: vec![retval],
        };
        Ok(codec.encode(&reply)?)
    }
}

struct TypedRpcFunction<RFn> {
    rpc_function: RFn,
}

impl<RFn> TypedRpcFunction<RFn>
where
    RFn: RpcFunction + Send + Sync,
    RFn::Domain: Send,
{
    async fn call(&self, args: Vec<Value>) -> Result<Value, ArgsError> {
        let decoded_args = RFn::Domain::from_args(args)?;
        let retval = self.rpc_function.call(decoded_args).await;
        Ok(<RFn::Range as Encode>::encode(retval))
    }
}

/// A type-erased version of the main trait, RpcFunction
trait DynamicRpcFunction {
    fn call(&self, args: Vec<Value>) -> BoxFuture<'_, Result<Value, ArgsError>>;
}

impl<RFn> DynamicRpcFunction for TypedRpcFunction<RFn>
where
    RFn: RpcFunction + Send + Sync,
    RFn::Domain: Send,
{
    fn call(&self, args: Vec<Value>) -> BoxFuture<'_, Result<Value, ArgsError>> {
        Box::pin(self.call(args))
    }
}

/// Conversion from a call's argument list into a function's domain type.
pub trait FromArgs: Sized {
    fn from_args(args: Vec<Value>) -> Result<Self, ArgsError>;
}

impl FromArgs for Vec<Value> {
    fn from_args(args: Vec<Value>) -> Result<Self, ArgsError> {
        Ok(args)
    }
}

impl FromArgs for () {
    fn from_args(args: Vec<Value>) -> Result<Self, ArgsError> {
        match args.len() {
            0 => Ok(()),
            found => Err(ArgsError::Arity { expected: 0, found }),
        }
    }
}

macro_rules! impl_from_args {
    ($($len:literal => ($($ty:ident),+)),* $(,)?) => {$(
        impl<$($ty: Decode),+> FromArgs for ($($ty,)+) {
            fn from_args(args: Vec<Value>) -> Result<Self, ArgsError> {
                let found = args.len();
                if found != $len {
                    return Err(ArgsError::Arity { expected: $len, found });
                }
                let mut args = args.into_iter().enumerate();
                Ok(($({
                    let (index, val) = args
                        .next()
                        .ok_or(ArgsError::Arity { expected: $len, found })?;
                    $ty::decode(val).map_err(|mismatch| ArgsError::Type { index, mismatch })?
                },)+))
            }
        }
    )*};
}

impl_from_args! {
    1 => (A),
    2 => (A, B),
    3 => (A, B, C),
    4 => (A, B, C, D),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("expected {expected} arguments, got {found}")]
    Arity { expected: usize, found: usize },

    #[error("argument {index}: {mismatch}")]
    Type {
        index: usize,
        #[source]
        mismatch: TypeMismatch,
    },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no function named {0:?}")]
    NoSuchFunction(String),

    #[error("calling function: {0}")]
    Args(#[from] ArgsError),

    #[error("decoding request: {0}")]
    Decode(#[from] DecodeError),

    #[error("encoding reply: {0}")]
    Encode(#[from] EncodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_args() {
        let args = vec![Value::Int(1), Value::from("two")];
        let (a, b) = <(i64, String)>::from_args(args).unwrap();
        assert_eq!((a, b.as_str()), (1, "two"));
    }

    #[test]
    fn arity_mismatch() {
        let err = <(i64, i64)>::from_args(vec![Value::Int(1)]).unwrap_err();
        assert_eq!(err, ArgsError::Arity { expected: 2, found: 1 });
        assert!(<()>::from_args(vec![Value::Bool(true)]).is_err());
    }

    #[test]
    fn type_mismatch_names_the_argument() {
        let err = <(i64, i64)>::from_args(vec![Value::Int(1), Value::Float(2.0)]).unwrap_err();
        match err {
            ArgsError::Type { index, mismatch } => {
                assert_eq!(index, 1);
                assert_eq!(mismatch.found(), Some(crate::Type::Float));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
