use crate::error::{Error, Result};
use bytes::BufMut;
use serde::{ser, Serialize};
use std::ops::DerefMut;

pub struct Serializer<'a, W: BufMut> {
    output: &'a mut W,
}

impl<'a, W: BufMut> Serializer<'a, W> {
    pub fn new(output: &'a mut W) -> Self {
        Self { output }
    }
}

pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    to_buffer(value, &mut buf)?;
    Ok(buf)
}

/// Append the encoding of `value` to `buf`, returning the number of bytes written.
pub fn to_buffer<T, W>(value: &T, buf: &mut W) -> Result<usize>
where
    T: Serialize + ?Sized,
    W: BufMut + DerefMut<Target = [u8]>,
{
    let initial_size = buf.len();
    let mut serializer = Serializer { output: buf };
    value.serialize(&mut serializer)?;
    Ok(buf.len() - initial_size)
}

macro_rules! impl_serialize_num {
    ($($func:ident: $typ:ty),+) => {
        $(
            fn $func(self, v: $typ) -> Result<Self::Ok> {
                self.output.put_slice(&v.to_be_bytes());
                Ok(())
            }
        )+
    };
}

impl<'a, 'b: 'a, W> ser::Serializer for &'a mut Serializer<'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, 'b, W>;
    type SerializeTuple = Compound<'a, 'b, W>;
    type SerializeTupleStruct = Compound<'a, 'b, W>;
    type SerializeTupleVariant = Compound<'a, 'b, W>;
    type SerializeMap = Compound<'a, 'b, W>;
    type SerializeStruct = Compound<'a, 'b, W>;
    type SerializeStructVariant = Compound<'a, 'b, W>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        self.output.put_u8(v as u8);
        Ok(())
    }

    impl_serialize_num!(
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64
    );

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        let mut tmp = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut tmp))
    }

    // raw content, the length prefix is written by the owning type
    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        self.output.put_slice(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok> {
        self.output.put_slice(v);
        Ok(())
    }

    // absent optional values occupy no bytes, presence is tracked out of band
    // (e.g. content header property flags)
    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(())
    }

    // field value tags are single letter variant names
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_str(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Compound::prefixed(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(Compound::plain(self))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(Compound::plain(self))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.serialize_str(variant)?;
        Ok(Compound::plain(self))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Compound::prefixed(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(Compound::plain(self))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.serialize_str(variant)?;
        Ok(Compound::plain(self))
    }
}

/// Serializer state of compound values.
///
/// Sequences and maps reserve a `u32` for their size in bytes, which is
/// patched once all elements are written.
pub struct Compound<'a, 'b: 'a, W: BufMut> {
    ser: &'a mut Serializer<'b, W>,
    size_offset: Option<usize>,
}

impl<'a, 'b: 'a, W> Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    fn plain(ser: &'a mut Serializer<'b, W>) -> Self {
        Self {
            ser,
            size_offset: None,
        }
    }

    fn prefixed(ser: &'a mut Serializer<'b, W>) -> Result<Self> {
        let offset = ser.output.len();
        ser.output.put_u32(0);
        Ok(Self {
            ser,
            size_offset: Some(offset),
        })
    }

    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn finish(self) -> Result<()> {
        if let Some(offset) = self.size_offset {
            let size = self.ser.output.len() - offset - 4;
            let size = u32::try_from(size).map_err(|_| Error::Overflow)?;
            let written: &mut [u8] = &mut **self.ser.output;
            written[offset..offset + 4].copy_from_slice(&size.to_be_bytes());
        }
        Ok(())
    }
}

impl<'a, 'b: 'a, W> ser::SerializeSeq for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeTuple for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeTupleStruct for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeTupleVariant for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeMap for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeStruct for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, 'b: 'a, W> ser::SerializeStructVariant for Compound<'a, 'b, W>
where
    W: BufMut + DerefMut<Target = [u8]>,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

/////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::to_bytes;
    use crate::types::*;
    use serde::Serialize;

    #[test]
    fn test_struct() {
        #[derive(Serialize)]
        struct Frame {
            type_id: Octect,
            channel_id: ShortUint,
            size: LongUint,
            payload: LongStr,
        }

        let test = Frame {
            type_id: 1,
            channel_id: 2,
            size: 3,
            payload: "ABCD".try_into().unwrap(),
        };
        let expected = vec![
            0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, b'A', b'B', b'C',
            b'D',
        ];
        assert_eq!(expected, to_bytes(&test).unwrap());
    }

    #[test]
    fn test_short_str() {
        let s: ShortStr = "amq.topic".try_into().unwrap();
        let mut expected = vec![9u8];
        expected.extend_from_slice(b"amq.topic");
        assert_eq!(expected, to_bytes(&s).unwrap());
    }

    #[test]
    fn test_field_table() {
        let mut table = FieldTable::new();
        table.insert("A".try_into().unwrap(), FieldValue::t(true));
        table.insert("B".try_into().unwrap(), FieldValue::u(9));
        table.insert("C".try_into().unwrap(), FieldValue::f(1.5));
        table.insert("D".try_into().unwrap(), FieldValue::V);

        let result = to_bytes(&table).unwrap();

        // table size excludes the size prefix itself
        assert_eq!(vec![0x00, 0x00, 0x00, 19], result[..4]);
        assert_eq!(23, result.len());

        // entries are unordered, locate each by its name
        let find = |name: u8, len: usize| {
            let at = result.iter().position(|v| *v == name).unwrap();
            result[at - 1..at - 1 + len].to_vec()
        };
        assert_eq!(vec![0x01, b'A', b't', 0x01], find(b'A', 4));
        assert_eq!(vec![0x01, b'B', b'u', 0x00, 0x09], find(b'B', 5));
        assert_eq!(vec![0x01, b'C', b'f', 0x3F, 0xC0, 0, 0], find(b'C', 7));
        assert_eq!(vec![0x01, b'D', b'V'], find(b'D', 3));
    }

    #[test]
    fn test_field_array_size_in_bytes() {
        let array = FieldArray::from(vec![FieldValue::u(1), FieldValue::S("ab".try_into().unwrap())]);
        let result = to_bytes(&array).unwrap();
        // 'u' + u16 = 3 bytes, 'S' + u32 + "ab" = 7 bytes
        assert_eq!(
            vec![0, 0, 0, 10, b'u', 0, 1, b'S', 0, 0, 0, 2, b'a', b'b'],
            result
        );
    }

    #[test]
    fn test_byte_array() {
        let bytes = ByteArray::from(vec![0u8, 0xFF]);
        assert_eq!(vec![0, 0, 0, 2, 0, 0xFF], to_bytes(&bytes).unwrap());
    }
}
