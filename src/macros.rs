/// Declares a struct together with the impls that let it travel as a
/// structured RPC argument. Register it with
/// [`Registry::register_type`](crate::Registry::register_type) before use.
///
/// ```
/// rpcdata::structured! {
///     #[derive(Debug, PartialEq)]
///     pub struct Point {
///         pub x: i64,
///         pub y: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! structured {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident : $field_ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $field_ty),*
        }

        impl $crate::Structured for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::new(
                    <Self as $crate::Structured>::TYPE_NAME,
                    vec![$($crate::FieldDescriptor::new(
                        stringify!($field),
                        <$field_ty as $crate::Typed>::rpc_type(),
                    )),*],
                )
            }

            fn into_fields(self) -> Vec<$crate::Value> {
                vec![$(<$field_ty as $crate::Encode>::encode(self.$field)),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_fields(fields: Vec<$crate::Value>) -> Result<Self, $crate::TypeMismatch> {
                let mut fields = fields.into_iter();
                Ok(Self {
                    $($field: $crate::registry::next_field::<$field_ty, _>(&mut fields)?),*
                })
            }
        }

        impl $crate::Typed for $name {
            fn rpc_type() -> $crate::Type {
                $crate::Type::Struct(<Self as $crate::Structured>::TYPE_NAME.to_owned())
            }
        }

        impl $crate::Encode for $name {
            fn encode(val: Self) -> $crate::Value {
                $crate::Value::Struct($crate::StructValue::new(
                    <Self as $crate::Structured>::TYPE_NAME,
                    <Self as $crate::Structured>::into_fields(val),
                ))
            }
        }

        impl $crate::Decode for $name {
            fn decode(val: $crate::Value) -> Result<Self, $crate::TypeMismatch> {
                match val {
                    $crate::Value::Struct(s) => s.downcast::<Self>(),
                    other => Err($crate::TypeMismatch::new(
                        other,
                        <Self as $crate::Typed>::rpc_type(),
                    )),
                }
            }
        }
    };
}

#[macro_export]
macro_rules! call {
    (async fn call(& $self:ident, ($($arg:ident),* $(,)?) : $domain_ty:ty) -> $range_ty:ty { $($body:tt)* }) => {
        type Domain = $domain_ty;
        type Range = $range_ty;

        fn call(& $self, ($($arg,)*): $domain_ty) -> $crate::BoxFuture<'_, Self::Range> {
            let body = async move {
                $($body)*
            };
            Box::pin(body)
        }
    };
    (async fn call(& $self:ident, $domain_ident:ident : $domain_ty:ty) -> $range_ty:ty { $($body:tt)* }) => {
        type Domain = $domain_ty;
        type Range = $range_ty;

        fn call(& $self, $domain_ident: $domain_ty) -> $crate::BoxFuture<'_, Self::Range> {
            let body = async move {
                $($body)*
            };
            Box::pin(body)
        }
    };
}

#[macro_export]
macro_rules! name {
    ($name:expr) => {
        fn name(&self) -> &str {
            $name
        }
    };
}
