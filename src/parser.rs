//! Deserialize data from the bytecode protocol.
//!
//! Parsers follow the nom convention: each takes the unread input and returns
//! `(remaining, value)`. Nothing is shared between calls, so decoders compose
//! and can be tested in isolation.
use bytes::Bytes;
use nom::{
    IResult, InputLength,
    bytes::complete::take,
    error::{ErrorKind, ParseError},
    number::complete::{be_i16, be_i32},
};
use nombytes::NomBytes;

use crate::constants::MAX_PROTOCOL_ARRAY_SIZE;
use crate::error::{Error, Result};

/// Result type of every parser in this crate.
pub type PResult<T> = IResult<NomBytes, T, DecodeError>;

/// Why a parser stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Fewer bytes remained than a fixed-width or declared-length field needs.
    Underflow,
    /// A length or count that is neither the null sentinel nor plausible.
    MalformedLength(i64),
    /// String bytes that are not UTF-8.
    InvalidUtf8,
    /// A message whose stored CRC32 does not match its contents.
    ChecksumMismatch { stored: u32, computed: u32 },
    /// Any other nom failure.
    Nom(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self { kind }
    }

    /// Hard failure for an invalid length or count field.
    pub fn malformed_length(length: impl Into<i64>) -> nom::Err<Self> {
        nom::Err::Failure(Self::new(DecodeErrorKind::MalformedLength(length.into())))
    }
}

impl ParseError<NomBytes> for DecodeError {
    fn from_error_kind(_input: NomBytes, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof | ErrorKind::Complete => Self::new(DecodeErrorKind::Underflow),
            other => Self::new(DecodeErrorKind::Nom(other)),
        }
    }

    fn append(_input: NomBytes, _kind: ErrorKind, other: Self) -> Self {
        // Keep the innermost cause; it is the one the caller can act on.
        other
    }
}

impl From<nom::Err<DecodeError>> for Error {
    fn from(e: nom::Err<DecodeError>) -> Self {
        match e {
            nom::Err::Incomplete(_) => Error::BufferUnderflow,
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.kind {
                DecodeErrorKind::Underflow => Error::BufferUnderflow,
                DecodeErrorKind::MalformedLength(length) => Error::MalformedLength(length),
                DecodeErrorKind::InvalidUtf8 => Error::InvalidUtf8,
                DecodeErrorKind::ChecksumMismatch { stored, computed } => {
                    Error::ChecksumMismatch { stored, computed }
                }
                DecodeErrorKind::Nom(kind) => {
                    Error::MissingData(format!("unexpected parse failure: {kind:?}"))
                }
            },
        }
    }
}

/// Run `parser` over the whole of `bytes`.
///
/// The span is expected to hold exactly one value: leftover bytes mean the
/// caller and the peer disagree on version or framing and are reported as
/// [`Error::TrailingBytes`].
pub fn decode_exact<T, F>(bytes: Bytes, mut parser: F) -> Result<T>
where
    F: FnMut(NomBytes) -> PResult<T>,
{
    let (rest, value) = parser(NomBytes::new(bytes))?;
    match rest.input_len() {
        0 => Ok(value),
        n => Err(Error::TrailingBytes(n)),
    }
}

/// Convert bytes to a validated UTF-8 string.
pub fn bytes_to_string(bytes: &Bytes) -> std::result::Result<String, nom::Err<DecodeError>> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| nom::Err::Failure(DecodeError::new(DecodeErrorKind::InvalidUtf8)))
}

/// `STRING`/`NULLABLE_STRING`: i16 length, -1 for null, then UTF-8 bytes.
pub fn parse_nullable_string(s: NomBytes) -> PResult<Option<String>> {
    let (s, length) = be_i16(s)?;

    // Null string
    if length == -1 {
        return Ok((s, None));
    }
    if length < 0 {
        return Err(DecodeError::malformed_length(length));
    }

    let (s, string) = take(length as u16)(s)?;
    Ok((s, Some(bytes_to_string(&string.into_bytes())?)))
}

/// A string field the protocol never leaves null. A null on the wire decodes
/// to the empty string rather than failing.
pub fn parse_string(s: NomBytes) -> PResult<String> {
    let (s, string) = parse_nullable_string(s)?;
    Ok((s, string.unwrap_or_default()))
}

/// `BYTES`/`NULLABLE_BYTES`: i32 length, -1 for null, then raw bytes.
pub fn parse_nullable_bytes(s: NomBytes) -> PResult<Option<Bytes>> {
    let (s, length) = be_i32(s)?;

    // Null bytes
    if length == -1 {
        return Ok((s, None));
    }
    if length < 0 {
        return Err(DecodeError::malformed_length(length));
    }
    if (length as usize) > s.input_len() {
        return Err(nom::Err::Failure(DecodeError::new(
            DecodeErrorKind::Underflow,
        )));
    }

    let (s, bytes) = take(length as usize)(s)?;
    Ok((s, Some(bytes.into_bytes())))
}

/// A byte-blob field the protocol never leaves null; null decodes as empty.
pub fn parse_bytes(s: NomBytes) -> PResult<Bytes> {
    let (s, bytes) = parse_nullable_bytes(s)?;
    Ok((s, bytes.unwrap_or_default()))
}

/// `ARRAY`: i32 count then `count` elements parsed by `f`.
///
/// A count of zero or below yields an empty sequence without touching further
/// input. Elements are read exactly `count` times; the parser never scans to
/// the end of the buffer.
pub fn parse_array<O, F>(mut f: F) -> impl FnMut(NomBytes) -> PResult<Vec<O>>
where
    F: FnMut(NomBytes) -> PResult<O>,
{
    move |input: NomBytes| {
        let (mut s, count) = be_i32(input)?;

        if count <= 0 {
            return Ok((s, vec![]));
        }
        // Validate array size bounds
        if count > MAX_PROTOCOL_ARRAY_SIZE {
            return Err(DecodeError::malformed_length(count));
        }

        let mut items = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let (rest, item) = f(s)?;
            items.push(item);
            s = rest;
        }
        Ok((s, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::number::complete::be_i32;

    fn input(data: Vec<u8>) -> NomBytes {
        NomBytes::new(Bytes::from(data))
    }

    #[test]
    fn test_bytes_to_string_valid_utf8() {
        let bytes = Bytes::from("hello");
        let result = bytes_to_string(&bytes);
        assert_eq!(result.unwrap(), "hello");
    }

    #[test]
    fn test_bytes_to_string_invalid_utf8() {
        let bytes = Bytes::from(vec![0xff, 0xfe]);
        let result = bytes_to_string(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_string() {
        let mut data = Vec::new();
        data.extend_from_slice(&5i16.to_be_bytes()); // length = 5
        data.extend_from_slice(b"hello");
        data.extend_from_slice(b"extra"); // extra bytes after

        let (remaining, parsed) = parse_string(input(data)).unwrap();

        assert_eq!(parsed, "hello");
        assert_eq!(remaining.into_bytes(), Bytes::from("extra"));
    }

    #[test]
    fn test_parse_nullable_string_null() {
        let data = (-1i16).to_be_bytes();
        let (remaining, parsed) = parse_nullable_string(input(data.to_vec())).unwrap();

        assert_eq!(parsed, None);
        assert_eq!(remaining.input_len(), 0);
    }

    #[test]
    fn test_parse_string_null_is_empty() {
        let data = (-1i16).to_be_bytes();
        let (_, parsed) = parse_string(input(data.to_vec())).unwrap();
        assert_eq!(parsed, "");
    }

    #[test]
    fn test_parse_nullable_string_invalid_length() {
        // Invalid negative length (not -1)
        let data = (-2i16).to_be_bytes();
        let err = parse_nullable_string(input(data.to_vec())).unwrap_err();
        assert_eq!(Error::from(err), Error::MalformedLength(-2));
    }

    #[test]
    fn test_parse_nullable_string_underflow() {
        let mut data = Vec::new();
        data.extend_from_slice(&10i16.to_be_bytes());
        data.extend_from_slice(b"short");
        let err = parse_nullable_string(input(data)).unwrap_err();
        assert_eq!(Error::from(err), Error::BufferUnderflow);
    }

    #[test]
    fn test_parse_nullable_bytes_null() {
        let data = (-1i32).to_be_bytes();
        let (remaining, parsed) = parse_nullable_bytes(input(data.to_vec())).unwrap();
        assert_eq!(parsed, None);
        assert_eq!(remaining.input_len(), 0);
    }

    #[test]
    fn test_parse_nullable_bytes_some() {
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_be_bytes());
        data.extend_from_slice(&[7, 8, 9]);
        let (_, parsed) = parse_nullable_bytes(input(data)).unwrap();
        assert_eq!(parsed, Some(Bytes::from_static(&[7, 8, 9])));
    }

    #[test]
    fn test_parse_nullable_bytes_negative_length() {
        let data = (-5i32).to_be_bytes();
        let err = parse_nullable_bytes(input(data.to_vec())).unwrap_err();
        assert_eq!(Error::from(err), Error::MalformedLength(-5));
    }

    #[test]
    fn test_parse_nullable_bytes_declared_past_end() {
        let mut data = Vec::new();
        data.extend_from_slice(&100i32.to_be_bytes());
        data.extend_from_slice(&[1, 2]);
        let err = parse_nullable_bytes(input(data)).unwrap_err();
        assert_eq!(Error::from(err), Error::BufferUnderflow);
    }

    #[test]
    fn test_parse_array_empty() {
        // Trailing bytes must be left untouched
        let mut data = 0i32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0xAA, 0xBB]);

        let mut parser = parse_array(be_i32::<_, DecodeError>);
        let (remaining, parsed): (_, Vec<i32>) = parser(input(data)).unwrap();

        assert!(parsed.is_empty());
        assert_eq!(remaining.input_len(), 2);
    }

    #[test]
    fn test_parse_array_negative_count() {
        let data = (-1i32).to_be_bytes();
        let mut parser = parse_array(be_i32::<_, DecodeError>);
        let (_, parsed): (_, Vec<i32>) = parser(input(data.to_vec())).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_array_with_elements() {
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_be_bytes()); // length = 3
        data.extend_from_slice(&10i32.to_be_bytes());
        data.extend_from_slice(&20i32.to_be_bytes());
        data.extend_from_slice(&30i32.to_be_bytes());
        data.extend_from_slice(&40i32.to_be_bytes()); // not part of the array

        let mut parser = parse_array(be_i32::<_, DecodeError>);
        let (remaining, parsed): (_, Vec<i32>) = parser(input(data)).unwrap();

        assert_eq!(parsed, vec![10, 20, 30]);
        assert_eq!(remaining.input_len(), 4);
    }

    #[test]
    fn test_parse_array_short_of_elements() {
        let mut data = Vec::new();
        data.extend_from_slice(&2i32.to_be_bytes());
        data.extend_from_slice(&10i32.to_be_bytes());

        let mut parser = parse_array(be_i32::<_, DecodeError>);
        let err = parser(input(data)).unwrap_err();
        assert_eq!(Error::from(err), Error::BufferUnderflow);
    }

    #[test]
    fn test_parse_array_too_large() {
        let data = (MAX_PROTOCOL_ARRAY_SIZE + 1).to_be_bytes();
        let mut parser = parse_array(be_i32::<_, DecodeError>);
        let err = parser(input(data.to_vec())).unwrap_err();
        assert_eq!(
            Error::from(err),
            Error::MalformedLength(MAX_PROTOCOL_ARRAY_SIZE as i64 + 1)
        );
    }

    #[test]
    fn test_decode_exact_rejects_trailing_bytes() {
        let data = Bytes::from(vec![0, 0, 0, 1, 0xFF]);
        let err = decode_exact(data, be_i32::<_, DecodeError>).unwrap_err();
        assert_eq!(err, Error::TrailingBytes(1));
    }

    #[test]
    fn test_decode_exact_underflow() {
        let data = Bytes::from(vec![0, 0]);
        let err = decode_exact(data, be_i32::<_, DecodeError>).unwrap_err();
        assert_eq!(err, Error::BufferUnderflow);
    }
}
