//! Serialize data into the bytecode protocol.
//!
//! Every wire type implements [`ToByte`], which both writes the value and
//! reports how many bytes it will occupy. A compound value's `encoded_len` is
//! always the sum of its components; there is no padding.
use bytes::{BufMut, Bytes};

use crate::constants::{NULL_LENGTH, NULL_STRING_LENGTH};
use crate::error::{Error, Result};

pub trait ToByte {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()>;

    /// Number of bytes `encode` writes for this value.
    fn encoded_len(&self) -> usize;
}

impl<'a, T: ToByte + 'a + ?Sized> ToByte for &'a T {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        (*self).encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        (*self).encoded_len()
    }
}

impl ToByte for i8 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i8(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl ToByte for i16 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

impl ToByte for i32 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i32(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl ToByte for u16 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_u16(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

impl ToByte for u32 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_u32(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl ToByte for i64 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i64(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

impl ToByte for u64 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_u64(*self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

// No impl for u8: `[u8]` is a length-prefixed blob, and a per-element u8
// impl would collide with it through `[V]`. Write single bytes as i8.

impl ToByte for str {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(string_length(self)?);
        buffer.put(self.as_bytes());
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2 + self.len()
    }
}

impl ToByte for String {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.as_str().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.as_str().encoded_len()
    }
}

impl<V: ToByte> ToByte for [V] {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        encode_as_array(buffer, self, |buffer, x| x.encode(buffer))
    }

    fn encoded_len(&self) -> usize {
        4 + self.iter().map(ToByte::encoded_len).sum::<usize>()
    }
}

impl<V: ToByte> ToByte for Vec<V> {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.as_slice().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.as_slice().encoded_len()
    }
}

impl ToByte for [u8] {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i32(length_prefix(self.len())?);
        buffer.put(self);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        4 + self.len()
    }
}

impl ToByte for Bytes {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.as_ref().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4 + self.len()
    }
}

impl ToByte for Option<&[u8]> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match *self {
            Some(xs) => xs.encode(buffer),
            None => NULL_LENGTH.encode(buffer),
        }
    }

    fn encoded_len(&self) -> usize {
        self.map_or(4, |xs| xs.encoded_len())
    }
}

impl ToByte for Option<Bytes> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match self {
            Some(xs) => xs.encode(buffer),
            None => NULL_LENGTH.encode(buffer),
        }
    }

    fn encoded_len(&self) -> usize {
        self.as_ref().map_or(4, ToByte::encoded_len)
    }
}

impl ToByte for Option<&str> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match *self {
            Some(xs) => xs.encode(buffer),
            None => NULL_STRING_LENGTH.encode(buffer), // NULLABLE_STRING uses i16 length prefix
        }
    }

    fn encoded_len(&self) -> usize {
        self.map_or(2, |xs| xs.encoded_len())
    }
}

impl ToByte for Option<String> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.as_deref().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.as_deref().encoded_len()
    }
}

/// Renders the length of `xs` to `buffer` as the start of a
/// protocol array and then for each element of `xs` invokes `f`
/// assuming that function will render the element to the buffer.
pub fn encode_as_array<T, F, W>(buffer: &mut W, xs: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    buffer.put_i32(length_prefix(xs.len())?);
    for x in xs {
        f(buffer, x)?;
    }
    Ok(())
}

/// Like [`encode_as_array`] for an iterator whose length is known up front,
/// such as the values of a map.
pub fn encode_iter_as_array<I, F, W>(buffer: &mut W, xs: I, mut f: F) -> Result<()>
where
    I: ExactSizeIterator,
    F: FnMut(&mut W, I::Item) -> Result<()>,
    W: BufMut,
{
    buffer.put_i32(length_prefix(xs.len())?);
    for x in xs {
        f(buffer, x)?;
    }
    Ok(())
}

/// Encode a value into a fresh buffer sized from its `encoded_len`.
pub fn to_bytes<T: ToByte + ?Sized>(value: &T) -> Result<Bytes> {
    let mut buffer = Vec::with_capacity(value.encoded_len());
    value.encode(&mut buffer)?;
    Ok(Bytes::from(buffer))
}

fn string_length(s: &str) -> Result<i16> {
    i16::try_from(s.len()).map_err(|_| Error::MalformedLength(s.len() as i64))
}

fn length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::MalformedLength(len as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_i8() {
        let mut buf = Vec::new();
        (-42i8).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xD6]); // -42 in two's complement
    }

    #[test]
    fn test_encode_i16() {
        let mut buf = Vec::new();
        (0x1234i16).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x12, 0x34]); // big-endian
    }

    #[test]
    fn test_encode_i32() {
        let mut buf = Vec::new();
        (0x12345678i32).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_encode_u32() {
        let mut buf = Vec::new();
        (0xDEADBEEFu32).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_encode_u16() {
        let mut buf = Vec::new();
        (0xBEEFu16).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xBE, 0xEF]);
        assert_eq!(0u16.encoded_len(), 2);
    }

    #[test]
    fn test_encode_u64() {
        let mut buf = Vec::new();
        u64::MAX.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xFF; 8]);
        assert_eq!(0u64.encoded_len(), 8);
    }

    #[test]
    fn test_encode_i64() {
        let mut buf = Vec::new();
        (0x123456789ABCDEF0i64).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0]);
    }

    #[test]
    fn test_fixed_width_lengths() {
        assert_eq!(0i8.encoded_len(), 1);
        assert_eq!(0i16.encoded_len(), 2);
        assert_eq!(0i32.encoded_len(), 4);
        assert_eq!(0u32.encoded_len(), 4);
        assert_eq!(0i64.encoded_len(), 8);
    }

    #[test]
    fn test_encode_string() {
        let mut buf = Vec::new();
        "hello".to_string().encode(&mut buf).unwrap();
        // i16 length prefix (5) + bytes
        assert_eq!(buf, vec![0x00, 0x05, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!("hello".encoded_len(), buf.len());
    }

    #[test]
    fn test_encode_string_too_long() {
        let long = "x".repeat(i16::MAX as usize + 1);
        let mut buf = Vec::new();
        let err = long.encode(&mut buf).unwrap_err();
        assert_eq!(err, Error::MalformedLength(i16::MAX as i64 + 1));
    }

    #[test]
    fn test_encode_bytes() {
        let mut buf = Vec::new();
        Bytes::from(vec![1, 2, 3]).encode(&mut buf).unwrap();
        // i32 length prefix (3) + bytes
        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x03, 1, 2, 3]);
    }

    #[test]
    fn test_encode_array_i32() {
        let mut buf = Vec::new();
        let arr: &[i32] = &[1, 2];
        arr.encode(&mut buf).unwrap();
        let expected = vec![
            0x00, 0x00, 0x00, 0x02, // length = 2
            0x00, 0x00, 0x00, 0x01, // 1
            0x00, 0x00, 0x00, 0x02, // 2
        ];
        assert_eq!(buf, expected);
        assert_eq!(arr.encoded_len(), 12);
    }

    #[test]
    fn test_encode_empty_array() {
        let mut buf = Vec::new();
        let arr: Vec<String> = vec![];
        arr.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
        assert_eq!(arr.encoded_len(), 4);
    }

    #[test]
    fn test_encode_iter_as_array() {
        let mut buf = Vec::new();
        let items = [10i16, 20i16];
        encode_iter_as_array(&mut buf, items.iter(), |b, x| x.encode(b)).unwrap();
        let expected = vec![
            0x00, 0x00, 0x00, 0x02, // length = 2
            0x00, 0x0A, // 10
            0x00, 0x14, // 20
        ];
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_encode_option_bytes_none() {
        let mut buf = Vec::new();
        let opt: Option<&[u8]> = None;
        opt.encode(&mut buf).unwrap();
        // -1 as i32
        assert_eq!(buf, vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(opt.encoded_len(), 4);
    }

    #[test]
    fn test_encode_option_str_none() {
        let mut buf = Vec::new();
        let opt: Option<&str> = None;
        opt.encode(&mut buf).unwrap();
        // -1 as i16 (nullable string)
        assert_eq!(buf, vec![0xFF, 0xFF]);
        assert_eq!(opt.encoded_len(), 2);
    }

    #[test]
    fn test_encode_option_string_some() {
        let mut buf = Vec::new();
        let opt: Option<String> = Some("yo".to_string());
        opt.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x02, b'y', b'o']);
    }

    #[test]
    fn test_to_bytes_matches_encoded_len() {
        let value = vec!["a".to_string(), "bcd".to_string()];
        let bytes = to_bytes(&value).unwrap();
        assert_eq!(bytes.len(), value.encoded_len());
    }
}
