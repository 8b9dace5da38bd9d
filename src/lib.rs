//! Self-describing encoding for RPC invocations.
//!
//! An [`RpcData`] carries a method name and an ordered list of tagged
//! [`Value`]s. [`codec::encode`] turns it into bytes and [`codec::decode`]
//! reconstructs it on the other side; structured argument types must be
//! known to the [`Registry`] on both ends. A [`Dispatcher`] routes decoded
//! calls to [`RpcFunction`]s by name.

pub mod codec;
mod config;
mod dispatcher;
mod error;
mod macros;
mod message;
pub mod registry;
pub mod types;

pub use codec::{decode, encode, Codec};
pub use config::CodecConfig;
pub use dispatcher::{ArgsError, DispatchError, Dispatcher, FromArgs};
pub use error::{DecodeError, EncodeError, RegistryError};
pub use futures::future::BoxFuture;
pub use message::RpcData;
pub use registry::{FieldDescriptor, Registry, Structured, TypeDescriptor};
pub use types::{Decode, Encode, StructValue, Type, TypeMismatch, Typed, Value};

/// A named function that can be called remotely.
///
/// The [`name!`] and [`call!`] macros fill in the boilerplate:
///
/// ```
/// use rpcdata::{call, name, RpcFunction};
///
/// struct Add;
///
/// impl RpcFunction for Add {
///     name!("Add");
///     call! {
///         async fn call(&self, (a, b): (i64, i64)) -> i64 {
///             a + b
///         }
///     }
/// }
/// ```
pub trait RpcFunction {
    type Domain: FromArgs;
    type Range: Encode;

    fn name(&self) -> &str;
    fn call(&self, args: Self::Domain) -> BoxFuture<'_, Self::Range>;
}
