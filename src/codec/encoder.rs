use super::Tag;
use crate::{
    config::CodecConfig,
    error::EncodeError,
    message::RpcData,
    registry::Snapshot,
    types::{StructValue, Value},
};
use tracing::trace;

pub(crate) struct Encoder<'a> {
    types: &'a Snapshot,
    config: &'a CodecConfig,
    buf: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(types: &'a Snapshot, config: &'a CodecConfig) -> Self {
        Self {
            types,
            config,
            buf: Vec::new(),
        }
    }

    /// Consumes the encoder; on error the partial buffer is dropped with it.
    pub(crate) fn message(mut self, data: &RpcData) -> Result<Vec<u8>, EncodeError> {
        self.blob(Tag::Text, "name", data.name.as_bytes())?;

        let argc = data.args.len();
        if argc > self.config.max_args {
            return Err(EncodeError::TooLarge {
                what: "argument count",
                len: argc,
                limit: self.config.max_args,
            });
        }
        self.int(argc as i64);

        for arg in &data.args {
            self.value(arg, 0)?;
        }

        trace!(method = %data.name, argc, len = self.buf.len(), "encoded message");
        Ok(self.buf)
    }

    fn value(&mut self, value: &Value, depth: usize) -> Result<(), EncodeError> {
        match value {
            Value::Bool(b) => {
                self.tag(Tag::Bool);
                self.buf.push(*b as u8);
            }
            Value::Int(n) => self.int(*n),
            Value::Float(x) => {
                self.tag(Tag::Float);
                self.buf.extend_from_slice(&x.to_bits().to_le_bytes());
            }
            Value::Text(s) => self.blob(Tag::Text, "text", s.as_bytes())?,
            Value::Bytes(b) => self.blob(Tag::Bytes, "byte sequence", b)?,
            Value::Struct(s) => self.structured(s, depth)?,
        }
        Ok(())
    }

    fn structured(&mut self, value: &StructValue, depth: usize) -> Result<(), EncodeError> {
        if depth >= self.config.max_depth {
            return Err(EncodeError::TooDeep(self.config.max_depth));
        }

        let types = self.types;
        let descriptor = types
            .get(&value.type_name)
            .ok_or_else(|| EncodeError::UnregisteredType(value.type_name.clone()))?;

        if value.fields.len() != descriptor.fields.len() {
            return Err(EncodeError::FieldMismatch {
                type_name: value.type_name.clone(),
                reason: format!(
                    "expected {} fields, found {}",
                    descriptor.fields.len(),
                    value.fields.len()
                ),
            });
        }
        for (field, val) in descriptor.fields.iter().zip(&value.fields) {
            let found = val.rpc_type();
            if found != field.ty {
                return Err(EncodeError::FieldMismatch {
                    type_name: value.type_name.clone(),
                    reason: format!("field {} expected {}, found {}", field.name, field.ty, found),
                });
            }
        }

        self.tag(Tag::Struct);
        self.len("type name", value.type_name.len())?;
        self.buf.extend_from_slice(value.type_name.as_bytes());
        self.count("field count", value.fields.len())?;
        for val in &value.fields {
            self.value(val, depth + 1)?;
        }
        Ok(())
    }

    fn tag(&mut self, tag: Tag) {
        self.buf.push(tag as u8);
    }

    fn int(&mut self, n: i64) {
        self.tag(Tag::Int);
        self.buf.extend_from_slice(&n.to_le_bytes());
    }

    fn blob(&mut self, tag: Tag, what: &'static str, data: &[u8]) -> Result<(), EncodeError> {
        self.tag(tag);
        self.len(what, data.len())?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn len(&mut self, what: &'static str, len: usize) -> Result<(), EncodeError> {
        let limit = self.config.max_len.min(u32::MAX as usize);
        if len > limit {
            return Err(EncodeError::TooLarge { what, len, limit });
        }
        self.count(what, len)
    }

    fn count(&mut self, what: &'static str, n: usize) -> Result<(), EncodeError> {
        let n = u32::try_from(n).map_err(|_| EncodeError::TooLarge {
            what,
            len: n,
            limit: u32::MAX as usize,
        })?;
        self.buf.extend_from_slice(&n.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::{FieldDescriptor, Registry, TypeDescriptor},
        types::Type,
    };

    fn encode_with(data: &RpcData, registry: &Registry, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
        Encoder::new(&registry.snapshot(), config).message(data)
    }

    #[test]
    fn empty_message_layout() {
        let bytes = encode_with(&RpcData::default(), &Registry::new(), &CodecConfig::default()).unwrap();
        assert_eq!(bytes, [0x04, 0, 0, 0, 0, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn scalar_layout() {
        let data = RpcData::new("f").with_arg(true).with_arg(-1i64);
        let bytes = encode_with(&data, &Registry::new(), &CodecConfig::default()).unwrap();
        assert_eq!(
            bytes,
            [
                0x04, 1, 0, 0, 0, b'f', // name
                0x02, 2, 0, 0, 0, 0, 0, 0, 0, // argc
                0x01, 1, // true
                0x02, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // -1
            ]
        );
    }

    #[test]
    fn unregistered_struct_fails() {
        let data = RpcData::new("f").with_arg(StructValue::new("Ghost", vec![]));
        let err = encode_with(&data, &Registry::new(), &CodecConfig::default()).unwrap_err();
        assert_eq!(err, EncodeError::UnregisteredType("Ghost".into()));
    }

    #[test]
    fn field_type_is_checked() {
        let registry = Registry::new();
        registry
            .register(TypeDescriptor::new("Id", vec![FieldDescriptor::new("n", Type::Int)]))
            .unwrap();

        let data = RpcData::new("f").with_arg(StructValue::new("Id", vec![Value::from("x")]));
        let err = encode_with(&data, &registry, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, EncodeError::FieldMismatch { .. }), "{err}");

        let data = RpcData::new("f").with_arg(StructValue::new("Id", vec![]));
        let err = encode_with(&data, &registry, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, EncodeError::FieldMismatch { .. }), "{err}");
    }

    #[test]
    fn limits_are_enforced() {
        let config = CodecConfig::default().max_args(1).max_len(4);
        let registry = Registry::new();

        let data = RpcData::new("f").with_arg(1i64).with_arg(2i64);
        assert!(matches!(
            encode_with(&data, &registry, &config),
            Err(EncodeError::TooLarge { what: "argument count", .. })
        ));

        let data = RpcData::new("f").with_arg("too long");
        assert!(matches!(
            encode_with(&data, &registry, &config),
            Err(EncodeError::TooLarge { what: "text", len: 8, limit: 4 })
        ));
    }

    #[test]
    fn field_count_is_not_a_byte_length() {
        let registry = Registry::new();
        registry
            .register(TypeDescriptor::new(
                "P",
                vec![
                    FieldDescriptor::new("a", Type::Int),
                    FieldDescriptor::new("b", Type::Int),
                    FieldDescriptor::new("c", Type::Int),
                ],
            ))
            .unwrap();

        let value = StructValue::new("P", vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let data = RpcData::new("f").with_arg(value);
        let bytes = encode_with(&data, &registry, &CodecConfig::default().max_len(1)).unwrap();
        // Struct record starts after the name (6 bytes) and argc (9 bytes).
        assert_eq!(bytes[15..25], [0x10, 1, 0, 0, 0, b'P', 3, 0, 0, 0]);
    }

    #[test]
    fn default_limits_cover_the_wire_format() {
        let config = CodecConfig::default();
        assert_eq!(config.max_len, u32::MAX as usize);
        assert!(config.max_args >= u32::MAX as usize);
        assert!(CodecConfig::untrusted().max_len < config.max_len);
    }

    #[test]
    fn nesting_depth_is_enforced() {
        let registry = Registry::new();
        registry.register(TypeDescriptor::new("Leaf", vec![])).unwrap();
        registry
            .register(TypeDescriptor::new(
                "Node",
                vec![FieldDescriptor::new("child", Type::Struct("Leaf".into()))],
            ))
            .unwrap();

        let node = StructValue::new("Node", vec![StructValue::new("Leaf", vec![]).into()]);
        let data = RpcData::new("f").with_arg(node);

        let config = CodecConfig::default().max_depth(1);
        assert_eq!(encode_with(&data, &registry, &config), Err(EncodeError::TooDeep(1)));
        assert!(encode_with(&data, &registry, &CodecConfig::default().max_depth(2)).is_ok());
    }
}
