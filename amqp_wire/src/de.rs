use crate::error::{Error, Result};

use serde::de::{
    self, Deserialize, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};

pub struct Deserializer<'de> {
    input: &'de [u8],
    /// Value of the `u8` or `u32` decoded last, consumed by the next string or
    /// byte array as its length.
    pending_len: Option<usize>,
}

impl<'de> Deserializer<'de> {
    pub fn from_bytes(input: &'de [u8]) -> Self {
        Deserializer {
            input,
            pending_len: None,
        }
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

/// Decode a value which must span the whole of `input`.
pub fn from_bytes<'a, T>(input: &'a [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    let mut deserializer = Deserializer::from_bytes(input);
    let t = T::deserialize(&mut deserializer)?;
    if deserializer.input.is_empty() {
        Ok(t)
    } else {
        Err(Error::Incomplete)
    }
}

/////////////////////////////////////////////////////////////////////////////
macro_rules! impl_parse_num {
    ($func:ident, $typ:ty) => {
        fn $func(&mut self) -> Result<$typ> {
            self.pending_len = None;
            Ok(<$typ>::from_be_bytes(self.take_array()?))
        }
    };
}

impl<'de> Deserializer<'de> {
    fn take(&mut self, len: usize) -> Result<&'de [u8]> {
        if self.input.len() < len {
            return Err(Error::Eof);
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.take(N)?);
        Ok(bytes)
    }

    /// Take the bytes of a string or byte array whose length was decoded just before.
    fn take_pending(&mut self) -> Result<&'de [u8]> {
        let len = self.pending_len.take().ok_or(Error::ExpectedLength)?;
        if self.input.len() < len {
            return Err(Error::Syntax);
        }
        self.take(len)
    }

    /// Split off a region prefixed by its size in bytes, used by field arrays and tables.
    fn take_sized(&mut self) -> Result<Deserializer<'de>> {
        let size = self.parse_u32()? as usize;
        self.pending_len = None;
        if self.input.len() < size {
            return Err(Error::Syntax);
        }
        Ok(Deserializer::from_bytes(self.take(size)?))
    }

    fn parse_bool(&mut self) -> Result<bool> {
        Ok(self.parse_u8()? != 0)
    }

    impl_parse_num!(parse_i8, i8);
    impl_parse_num!(parse_i16, i16);
    impl_parse_num!(parse_i32, i32);
    impl_parse_num!(parse_i64, i64);
    impl_parse_num!(parse_u16, u16);
    impl_parse_num!(parse_u64, u64);
    impl_parse_num!(parse_f32, f32);
    impl_parse_num!(parse_f64, f64);

    // length of ShortStr
    fn parse_u8(&mut self) -> Result<u8> {
        let [v] = self.take_array::<1>()?;
        self.pending_len = Some(v as usize);
        Ok(v)
    }

    // length of LongStr and ByteArray
    fn parse_u32(&mut self) -> Result<u32> {
        let v = u32::from_be_bytes(self.take_array()?);
        self.pending_len = Some(v as usize);
        Ok(v)
    }

    fn parse_str(&mut self) -> Result<&'de str> {
        let bytes = self.take_pending()?;
        std::str::from_utf8(bytes)
            .map_err(|err| Error::Message(format!("invalid utf-8 string: {}", err)))
    }
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::Message(
            "AMQP wire format is not self-describing".to_string(),
        ))
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.parse_bool()?)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.parse_i8()?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(self.parse_i16()?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(self.parse_i32()?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.parse_i64()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.parse_u8()?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(self.parse_u16()?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(self.parse_u32()?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(self.parse_u64()?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.parse_f32()?)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.parse_f64()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.parse_str()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.take_pending()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_byte_buf(self.take_pending()?.to_vec())
    }

    // presence is decided by the caller, e.g. from content header property flags
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let region = self.take_sized()?;
        visitor.visit_seq(Region { de: region })
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(Counted {
            de: self,
            remaining: len,
        })
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let region = self.take_sized()?;
        visitor.visit_map(Region { de: region })
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(Enum { de: self })
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }
}

/// Fixed number of elements, e.g. struct fields.
struct Counted<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'de, 'a> SeqAccess<'de> for Counted<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Elements filling a region of known size in bytes, e.g. field table entries.
struct Region<'de> {
    de: Deserializer<'de>,
}

impl<'de> SeqAccess<'de> for Region<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.de.input.is_empty() {
            return Ok(None);
        }
        seed.deserialize(&mut self.de).map(Some)
    }
}

impl<'de> MapAccess<'de> for Region<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.de.input.is_empty() {
            return Ok(None);
        }
        seed.deserialize(&mut self.de).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut self.de)
    }
}

/// Field values are tagged by a single ASCII letter.
struct Enum<'a, 'de: 'a> {
    de: &'a mut Deserializer<'de>,
}

impl<'de, 'a> EnumAccess<'de> for Enum<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let [tag] = self.de.take_array::<1>()?;
        self.de.pending_len = None;
        if !tag.is_ascii_alphabetic() {
            return Err(Error::UnknownFieldType(tag));
        }
        let tag = [tag];
        let name = std::str::from_utf8(&tag).map_err(|_| Error::UnknownFieldType(tag[0]))?;
        let value = seed
            .deserialize(name.into_deserializer())
            .map_err(|_: Error| Error::UnknownFieldType(tag[0]))?;
        Ok((value, self))
    }
}

impl<'de, 'a> VariantAccess<'de> for Enum<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.de, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.de, fields.len(), visitor)
    }
}

/////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use crate::de::from_bytes;
    use crate::error::Error;
    use crate::types::*;
    use crate::to_bytes;
    use serde::Deserialize;

    #[test]
    fn test_struct() {
        #[derive(Deserialize, PartialEq, Debug)]
        struct Frame {
            type_id: Octect,
            channel_id: ShortUint,
            size: LongUint,
            payload: LongStr,
            end: Octect,
        }
        let input = vec![
            0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x04, b'A', b'B', b'C',
            b'D', 0xCE,
        ];
        let expected = Frame {
            type_id: 1,
            channel_id: 2,
            size: 8,
            payload: "ABCD".try_into().unwrap(),
            end: 0xCE,
        };
        assert_eq!(expected, from_bytes(&input).unwrap());
    }

    #[test]
    fn test_enum() {
        #[derive(Deserialize, PartialEq, Debug)]
        struct Test(FieldValue, FieldValue, FieldValue, FieldValue);

        let input = vec![b't', 0x01, b'u', 0x00, 0x09, b'f', 0x3F, 0xC0, 0, 0, b'V'];
        let expected = Test(
            FieldValue::t(true),
            FieldValue::u(9),
            FieldValue::f(1.5),
            FieldValue::V,
        );
        assert_eq!(expected, from_bytes(&input).unwrap());
    }

    #[test]
    fn test_map() {
        let input = vec![
            0x00, 0x00, 0x00, 16, 0x01, b'A', b't', 0x01, 0x01, b'B', b'u', 0x00, 0x09, 0x01, b'C',
            b'f', 0x3F, 0xC0, 0, 0,
        ];
        let table: FieldTable = from_bytes(&input).unwrap();

        assert_eq!(3, table.len());
        assert_eq!(Some(&FieldValue::t(true)), table.get("A"));
        assert_eq!(Some(&FieldValue::u(9)), table.get("B"));
        assert_eq!(Some(&FieldValue::f(1.5)), table.get("C"));
    }

    #[test]
    fn test_nested_table_and_array() {
        let mut capabilities = FieldTable::new();
        capabilities.insert("basic.nack".try_into().unwrap(), FieldValue::t(true));
        let mut table = FieldTable::new();
        table.insert("capabilities".try_into().unwrap(), FieldValue::F(capabilities));
        table.insert(
            "cluster".try_into().unwrap(),
            FieldValue::A(FieldArray::from(vec![
                FieldValue::S("rabbit@a".try_into().unwrap()),
                FieldValue::I(-7),
            ])),
        );
        table.insert(
            "raw".try_into().unwrap(),
            FieldValue::x(ByteArray::from(vec![0xFF, 0x00])),
        );

        let bytes = to_bytes(&table).unwrap();
        let decoded: FieldTable = from_bytes(&bytes).unwrap();
        assert_eq!(table, decoded);
    }

    #[test]
    fn test_incomplete_error() {
        #[derive(Deserialize, Debug)]
        struct Frame;
        let input = b"deadbeaf";
        assert_eq!(Error::Incomplete, from_bytes::<Frame>(&input[..]).unwrap_err());
    }

    #[test]
    fn test_eof() {
        #[derive(Deserialize, Debug)]
        struct Frame(u32);
        assert_eq!(Error::Eof, from_bytes::<Frame>(&[0x00]).unwrap_err());
    }

    #[test]
    fn test_missing_length() {
        #[derive(Deserialize, Debug)]
        struct Frame(u16, String);
        assert_eq!(
            Error::ExpectedLength,
            from_bytes::<Frame>(&[0, 1, b'a']).unwrap_err()
        );
    }

    #[test]
    fn test_length_beyond_input() {
        assert_eq!(
            Error::Syntax,
            from_bytes::<ShortStr>(&[9, b'a', b'b']).unwrap_err()
        );
    }

    #[test]
    fn test_unknown_field_type() {
        assert_eq!(
            Error::UnknownFieldType(b'Z'),
            from_bytes::<FieldValue>(&[b'Z', 0]).unwrap_err()
        );
        assert_eq!(
            Error::UnknownFieldType(0x01),
            from_bytes::<FieldValue>(&[0x01]).unwrap_err()
        );
    }

    #[test]
    fn test_byte_array_is_not_utf8_checked() {
        let input = vec![0, 0, 0, 3, 0xFF, 0xFE, 0x00];
        let bytes: ByteArray = from_bytes(&input).unwrap();
        assert_eq!(&[0xFF, 0xFE, 0x00][..], bytes.as_ref());
    }
}
