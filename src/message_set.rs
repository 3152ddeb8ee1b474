//! Message sets: batches of offset-tagged, CRC32-checksummed log records.
//!
//! # Layout
//!
//! ```text
//! MessageSet     => size:int32 [MessageSetItem]      (no item count)
//! MessageSetItem => offset:int64 message_size:int32 Message
//! Message        => crc:uint32 magic:int8 attributes:int8 key:bytes value:bytes
//! ```
//!
//! The CRC32 (IEEE) covers the serialized magic, attributes, key and value,
//! and is recomputed on every encode. Decoding verifies it.
//!
//! A message set carries no item count, so the item parser must be handed
//! an exactly delimited span: it reads items until that span is exhausted.

use bytes::{BufMut, Bytes};
use nom::{
    InputLength,
    bytes::complete::take,
    number::complete::{be_i8, be_i32, be_i64, be_u32},
};
use nombytes::NomBytes;
use tracing::{trace, warn};

use crate::constants::{
    MESSAGE_CRC_LEN, MESSAGE_MAGIC_V0, MESSAGE_SET_ITEM_OVERHEAD, SIZE_PREFIX_LEN,
};
use crate::encode::ToByte;
use crate::error::{Error, Result};
use crate::parser::{DecodeError, DecodeErrorKind, PResult, decode_exact, parse_nullable_bytes};
use crate::types::{CompressionCodec, Offset};

/// A single log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    magic: i8,
    attributes: i8,
    key: Option<Bytes>,
    value: Option<Bytes>,
}

impl Message {
    /// An uncompressed message in the original format.
    pub fn new(key: Option<Bytes>, value: impl Into<Bytes>) -> Self {
        Self::with_codec(key, Some(value.into()), CompressionCodec::None)
    }

    /// A message whose attributes carry `codec`. The value is taken as
    /// already compressed.
    pub fn with_codec(key: Option<Bytes>, value: Option<Bytes>, codec: CompressionCodec) -> Self {
        Self {
            magic: MESSAGE_MAGIC_V0,
            attributes: codec.value(),
            key,
            value,
        }
    }

    pub fn magic(&self) -> i8 {
        self.magic
    }

    pub fn attributes(&self) -> i8 {
        self.attributes
    }

    /// `None` if the attributes carry a codec tag this crate does not know.
    pub fn compression(&self) -> Option<CompressionCodec> {
        CompressionCodec::from_attributes(self.attributes)
    }

    pub fn key(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// CRC32 over the serialized magic, attributes, key and value.
    pub fn checksum(&self) -> Result<u32> {
        let mut body = Vec::with_capacity(self.body_len());
        self.encode_body(&mut body)?;
        Ok(crc32fast::hash(&body))
    }

    fn body_len(&self) -> usize {
        1 + 1 + self.key.encoded_len() + self.value.encoded_len()
    }

    fn encode_body<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.magic.encode(buffer)?;
        self.attributes.encode(buffer)?;
        self.key.encode(buffer)?;
        self.value.encode(buffer)
    }
}

impl ToByte for Message {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        let mut body = Vec::with_capacity(self.body_len());
        self.encode_body(&mut body)?;
        crc32fast::hash(&body).encode(buffer)?;
        buffer.put_slice(&body);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        MESSAGE_CRC_LEN + self.body_len()
    }
}

/// A message together with its offset in the partition log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSetItem {
    pub offset: Offset,
    pub message: Message,
}

impl MessageSetItem {
    pub fn new(offset: i64, message: Message) -> Self {
        Self {
            offset: Offset(offset),
            message,
        }
    }
}

impl ToByte for MessageSetItem {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.offset.encode(buffer)?;
        message_size(&self.message)?.encode(buffer)?;
        self.message.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        MESSAGE_SET_ITEM_OVERHEAD + self.message.encoded_len()
    }
}

/// An ordered batch of messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageSet {
    items: Vec<MessageSetItem>,
}

impl MessageSet {
    pub fn new(items: Vec<MessageSetItem>) -> Self {
        Self { items }
    }

    /// Build a set from bare messages, numbering offsets from zero as a
    /// producer does.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let items = messages
            .into_iter()
            .enumerate()
            .map(|(i, message)| MessageSetItem::new(i as i64, message))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[MessageSetItem] {
        &self.items
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.items.iter().map(|item| &item.message)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Byte length of the items, excluding the int32 size prefix.
    pub fn items_len(&self) -> usize {
        self.items.iter().map(ToByte::encoded_len).sum()
    }

    /// Decode the items of a set from a span that holds nothing else.
    pub fn decode_items(bytes: Bytes) -> Result<Self> {
        decode_exact(bytes, parse_message_set_items)
    }
}

impl ToByte for MessageSet {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        let size = self.items_len();
        i32::try_from(size)
            .map_err(|_| Error::MalformedLength(size as i64))?
            .encode(buffer)?;
        for item in &self.items {
            item.encode(buffer)?;
        }
        trace!(items = self.items.len(), size, "Encoded message set");
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        SIZE_PREFIX_LEN + self.items_len()
    }
}

impl FromIterator<MessageSetItem> for MessageSet {
    fn from_iter<I: IntoIterator<Item = MessageSetItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn message_size(message: &Message) -> Result<i32> {
    let len = message.encoded_len();
    i32::try_from(len).map_err(|_| Error::MalformedLength(len as i64))
}

/// Parse one message and verify its checksum.
pub fn parse_message(s: NomBytes) -> PResult<Message> {
    let (s, stored) = be_u32(s)?;
    let covered = s.clone();

    let (s, magic) = be_i8(s)?;
    let (s, attributes) = be_i8(s)?;
    let (s, key) = parse_nullable_bytes(s)?;
    let (s, value) = parse_nullable_bytes(s)?;

    let consumed = covered.input_len() - s.input_len();
    let computed = crc32fast::hash(&covered.into_bytes()[..consumed]);
    if stored != computed {
        warn!(stored, computed, "Message checksum mismatch");
        return Err(nom::Err::Failure(DecodeError::new(
            DecodeErrorKind::ChecksumMismatch { stored, computed },
        )));
    }

    Ok((
        s,
        Message {
            magic,
            attributes,
            key,
            value,
        },
    ))
}

/// Parse one item. The message must fill exactly its declared size.
pub fn parse_message_set_item(s: NomBytes) -> PResult<MessageSetItem> {
    let (s, offset) = be_i64(s)?;
    let (s, size) = be_i32(s)?;
    if size < 0 {
        return Err(DecodeError::malformed_length(size));
    }

    let (s, span) = take(size as usize)(s)?;
    let (rest, message) = parse_message(span)?;
    if rest.input_len() != 0 {
        return Err(DecodeError::malformed_length(size));
    }

    Ok((
        s,
        MessageSetItem {
            offset: Offset(offset),
            message,
        },
    ))
}

/// Parse items until the input is exhausted.
pub fn parse_message_set_items(mut s: NomBytes) -> PResult<MessageSet> {
    let mut items = Vec::new();
    while s.input_len() > 0 {
        let (rest, item) = parse_message_set_item(s)?;
        items.push(item);
        s = rest;
    }
    Ok((s, MessageSet { items }))
}

/// Parse an int32 size followed by exactly that many bytes of items.
pub fn parse_message_set(s: NomBytes) -> PResult<MessageSet> {
    let (s, size) = be_i32(s)?;
    if size < 0 {
        return Err(DecodeError::malformed_length(size));
    }
    let (s, span) = take(size as usize)(s)?;
    let (_, set) = parse_message_set_items(span)?;
    Ok((s, set))
}
