//! AMQP 0-9-1 types as used by RabbitMQ
//! https://github.com/rabbitmq/rabbitmq-codegen/blob/main/amqp-rabbitmq-0.9.1.json
use std::{
    borrow::Borrow,
    collections::{hash_map, HashMap},
    fmt,
    ops::Deref,
};

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::{self, SerializeTuple},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::Error;

pub type Bit = u8; // no Rust type for a single bit, consecutive bits are packed into octets
pub type Octect = u8;
pub type Boolean = bool; // 0 = FALSE, else TRUE
pub type ShortShortUint = u8;
pub type ShortShortInt = i8;
pub type ShortUint = u16;
pub type ShortInt = i16;
pub type LongUint = u32;
pub type LongInt = i32;
pub type LongLongUint = u64;
pub type LongLongInt = i64;
pub type TimeStamp = u64;
pub type Float = f32;
pub type Double = f64;

/////////////////////////////////////////////////////////////////////////////
macro_rules! impl_length_prefixed_str {
    ($(#[$doc:meta])* $name:ident, $len:ty, $expecting:literal) => {
        $(#[$doc])*
        #[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Default)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(s: $name) -> Self {
                s.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                <$len>::try_from(s.len()).map_err(|_| Error::Overflow)?;
                Ok(Self(s))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                s.to_owned().try_into()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                // length fits, checked on construction
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&(self.0.len() as $len))?;
                tuple.serialize_element(self.0.as_str())?;
                tuple.end()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct StrVisitor;

                impl<'de> Visitor<'de> for StrVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<$name, A::Error> {
                        let _: $len = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                        let value: String = seq
                            .next_element()?
                            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                        Ok($name(value))
                    }
                }

                deserializer.deserialize_tuple(2, StrVisitor)
            }
        }
    };
}

impl_length_prefixed_str!(
    /// String of at most 255 bytes, prefixed by its length as `u8`.
    ShortStr,
    u8,
    "short string"
);
impl_length_prefixed_str!(
    /// String prefixed by its length as `u32`.
    LongStr,
    u32,
    "long string"
);

/////////////////////////////////////////////////////////////////////////////
/// According to https://www.rabbitmq.com/amqp-0-9-1-errata.html
/// decimals are "an octet representing the number of places followed by a long signed integer".
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct DecimalValue(Octect, LongInt);

impl DecimalValue {
    pub fn new(scale: Octect, value: LongInt) -> Self {
        Self(scale, value)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({}, {})", self.0, self.1)
    }
}

/////////////////////////////////////////////////////////////////////////////
/// Opaque bytes prefixed by their length as `u32`, same wire form as [`LongStr`]
/// without the UTF-8 requirement.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ByteArray(Vec<u8>);

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<ByteArray> for Vec<u8> {
    fn from(arr: ByteArray) -> Self {
        arr.0
    }
}

impl AsRef<[u8]> for ByteArray {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X?}", self.0)
    }
}

impl Serialize for ByteArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = LongUint::try_from(self.0.len())
            .map_err(|_| ser::Error::custom("byte array exceeds u32::MAX bytes"))?;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&len)?;
        tuple.serialize_element(serde_bytes::Bytes::new(&self.0))?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for ByteArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteArrayVisitor;

        impl<'de> Visitor<'de> for ByteArrayVisitor {
            type Value = ByteArray;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("byte array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ByteArray, A::Error> {
                let _: LongUint = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let bytes: serde_bytes::ByteBuf = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(ByteArray(bytes.into_vec()))
            }
        }

        deserializer.deserialize_tuple(2, ByteArrayVisitor)
    }
}

/////////////////////////////////////////////////////////////////////////////
/// Prefixed by its size in bytes as `u32`, as RabbitMQ does.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct FieldArray(Vec<FieldValue>);

impl From<Vec<FieldValue>> for FieldArray {
    fn from(values: Vec<FieldValue>) -> Self {
        Self(values)
    }
}

impl From<FieldArray> for Vec<FieldValue> {
    fn from(arr: FieldArray) -> Self {
        arr.0
    }
}

impl Deref for FieldArray {
    type Target = [FieldValue];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}", v)?;
        }
        write!(f, " ]")
    }
}

/////////////////////////////////////////////////////////////////////////////
// Field value types as implemented by RabbitMQ
// Ref: https://www.rabbitmq.com/amqp-0-9-1-errata.html#section_3
//----------------------------------------------------------------------------
// 0-9-1   Qpid/Rabbit  Type               Remarks
// ---------------------------------------------------------------------------
//   t       t            Boolean
//   b       b            Signed 8-bit
//   B       B            Unsigned 8-bit
//   U       s            Signed 16-bit      (A1)
//   u       u            Unsigned 16-bit
//   I       I            Signed 32-bit
//   i       i            Unsigned 32-bit
//   L       l            Signed 64-bit      (B)
//   f       f            32-bit float
//   d       d            64-bit float
//   D       D            Decimal
//   S       S            Long string
//   A       A            Array              (C)
//   T       T            Timestamp (u64)
//   F       F            Nested Table
//   V       V            Void
//           x            Byte array         (D)
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[allow(non_camel_case_types)]
pub enum FieldValue {
    t(Boolean),
    b(ShortShortInt),
    B(ShortShortUint),
    s(ShortInt),
    u(ShortUint),
    I(LongInt),
    i(LongUint),
    l(LongLongInt),
    f(Float),
    d(Double),
    D(DecimalValue),
    S(LongStr),
    A(FieldArray),
    T(TimeStamp),
    F(FieldTable),
    V,
    x(ByteArray),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::t(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::S(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&FieldTable> {
        match self {
            FieldValue::F(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::t(v)
    }
}

impl From<LongStr> for FieldValue {
    fn from(v: LongStr) -> Self {
        FieldValue::S(v)
    }
}

impl From<FieldTable> for FieldValue {
    fn from(v: FieldTable) -> Self {
        FieldValue::F(v)
    }
}

impl From<FieldArray> for FieldValue {
    fn from(v: FieldArray) -> Self {
        FieldValue::A(v)
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = Error;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        value
            .as_bool()
            .ok_or_else(|| Error::Message(format!("not a bool: {}", value)))
    }
}

impl TryFrom<FieldValue> for LongStr {
    type Error = Error;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::S(v) => Ok(v),
            other => Err(Error::Message(format!("not a long string: {}", other))),
        }
    }
}

impl TryFrom<FieldValue> for FieldTable {
    type Error = Error;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::F(v) => Ok(v),
            other => Err(Error::Message(format!("not a field table: {}", other))),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::t(v) => write!(f, "{}", v),
            FieldValue::b(v) => write!(f, "{}", v),
            FieldValue::B(v) => write!(f, "{}", v),
            FieldValue::s(v) => write!(f, "{}", v),
            FieldValue::u(v) => write!(f, "{}", v),
            FieldValue::I(v) => write!(f, "{}", v),
            FieldValue::i(v) => write!(f, "{}", v),
            FieldValue::l(v) => write!(f, "{}", v),
            FieldValue::f(v) => write!(f, "{}", v),
            FieldValue::d(v) => write!(f, "{}", v),
            FieldValue::D(v) => write!(f, "{}", v),
            FieldValue::S(v) => write!(f, "{}", v),
            FieldValue::A(v) => write!(f, "{}", v),
            FieldValue::T(v) => write!(f, "{}", v),
            FieldValue::F(v) => write!(f, "{}", v),
            FieldValue::V => write!(f, "()"),
            FieldValue::x(v) => write!(f, "{}", v),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////
pub type FieldName = ShortStr;

/// Prefixed by its size in bytes as `u32`.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct FieldTable(HashMap<FieldName, FieldValue>);

impl FieldTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, k: FieldName, v: FieldValue) -> Option<FieldValue> {
        self.0.insert(k, v)
    }

    pub fn remove(&mut self, k: &str) -> Option<FieldValue> {
        self.0.remove(k)
    }

    pub fn get(&self, k: &str) -> Option<&FieldValue> {
        self.0.get(k)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, FieldName, FieldValue> {
        self.0.iter()
    }
}

impl fmt::Display for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", k, v)?;
        }
        write!(f, " }}")
    }
}

/////////////////////////////////////////////////////////////////////////////
// AMQP domains
pub type AmqpChannelId = ShortUint;
pub type AmqpClassId = ShortUint;
pub type AmqpMethodId = ShortUint;

pub type AmqpConsumerTag = ShortStr;
pub type AmqpDeliveryTag = LongLongUint;
pub type AmqpExchangeName = ShortStr;
pub type AmqpMessageCount = LongUint;
pub type AmqpPath = ShortStr;
pub type AmqpPeerProperties = FieldTable;
pub type AmqpQueueName = ShortStr;
pub type AmqpReplyCode = ShortUint;
pub type AmqpReplyText = ShortStr;
pub type AmqpTable = FieldTable;
pub type AmqpTimeStamp = TimeStamp;

/////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::{DecimalValue, FieldArray, FieldTable, FieldValue, ShortStr};
    use crate::Error;

    #[test]
    fn test_table_display() {
        let mut table = FieldTable::new();
        table.insert(
            "Cash".try_into().unwrap(),
            FieldValue::D(DecimalValue::new(3, 123456)),
        );
        assert_eq!("{ Cash: Decimal(3, 123456) }", format!("{}", table));
        assert_eq!("{ }", format!("{}", FieldTable::new()));
    }

    #[test]
    fn test_field_array_display() {
        let field_arr = FieldArray::from(vec![
            FieldValue::t(true),
            FieldValue::D(DecimalValue::new(3, 123456)),
        ]);
        assert_eq!("[ true, Decimal(3, 123456) ]", format!("{}", field_arr));
    }

    #[test]
    fn test_short_str_limit() {
        let max = "x".repeat(255);
        assert!(ShortStr::try_from(max.as_str()).is_ok());
        let too_long = "x".repeat(256);
        assert_eq!(Err(Error::Overflow), ShortStr::try_from(too_long));
    }

    #[test]
    fn test_lookup_by_str() {
        let mut table = FieldTable::new();
        table.insert("product".try_into().unwrap(), FieldValue::from(true));
        assert_eq!(Some(true), table.get("product").and_then(FieldValue::as_bool));
        assert!(table.remove("product").is_some());
        assert!(table.is_empty());
    }
}
