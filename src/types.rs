//! Type-safe wrappers for Kafka protocol primitives.
//!
//! The newtypes keep integers with the same representation but different
//! meanings apart. The enumerations model fields whose wire value is either
//! a well-known sentinel or a caller-supplied number or name; each converts
//! explicitly with `value()` / `from_value()` (or `name()` / `from_name()`),
//! never by implicit coercion.

use bytes::BufMut;
use std::fmt;

use crate::constants::{COMPRESSION_CODEC_MASK, CONSUMER_PROTOCOL_TYPE};
use crate::encode::ToByte;
use crate::error::Result;

/// A Kafka message offset within a partition.
///
/// Offsets are 64-bit signed integers that represent the position
/// of a message within a partition's log. `-1` marks an unset offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(pub i64);

impl Offset {
    /// Invalid offset, typically used to indicate an error or unset value.
    pub const INVALID: Self = Offset(-1);

    /// Create a new offset from a raw value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Offset(value)
    }

    /// Get the raw i64 value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Check if this is a valid (non-negative) offset.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl From<i64> for Offset {
    fn from(value: i64) -> Self {
        Offset(value)
    }
}

impl From<Offset> for i64 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToByte for Offset {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.0.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

/// A Kafka request correlation ID.
///
/// Correlation IDs are 32-bit signed integers that clients use to
/// match responses to their corresponding requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CorrelationId(pub i32);

impl CorrelationId {
    /// Create a new correlation ID from a raw value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        CorrelationId(value)
    }

    /// Get the raw i32 value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// The id that follows this one, wrapping at `i32::MAX` back to zero.
    #[inline]
    pub const fn next(self) -> Self {
        if self.0 == i32::MAX {
            CorrelationId(0)
        } else {
            CorrelationId(self.0 + 1)
        }
    }
}

impl From<i32> for CorrelationId {
    fn from(value: i32) -> Self {
        CorrelationId(value)
    }
}

impl From<CorrelationId> for i32 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToByte for CorrelationId {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.0.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

/// A Kafka partition id within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PartitionId(pub i32);

impl PartitionId {
    /// Create a new partition id from a raw value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        PartitionId(value)
    }

    /// Get the raw i32 value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Check if this is a valid (non-negative) partition id.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl From<i32> for PartitionId {
    fn from(value: i32) -> Self {
        PartitionId(value)
    }
}

impl From<PartitionId> for i32 {
    fn from(id: PartitionId) -> Self {
        id.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToByte for PartitionId {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.0.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

/// A consumer group generation ID.
///
/// Generation IDs are incremented each time a consumer group rebalances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GenerationId(pub i32);

impl GenerationId {
    /// Commits outside of group management use generation -1.
    pub const INVALID: Self = GenerationId(-1);

    /// Create a new generation ID from a raw value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        GenerationId(value)
    }

    /// Get the raw i32 value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for GenerationId {
    fn from(value: i32) -> Self {
        GenerationId(value)
    }
}

impl From<GenerationId> for i32 {
    fn from(id: GenerationId) -> Self {
        id.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToByte for GenerationId {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.0.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

// ============================================================================
// Associated-value enumerations
// ============================================================================

/// Which offsets to ask for, relative to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOffset {
    /// The offset of the next message to be written.
    Latest,
    /// The earliest available offset.
    Earliest,
    /// Messages written before this timestamp (ms).
    Preceding(i64),
}

impl TimeOffset {
    pub const fn value(self) -> i64 {
        match self {
            TimeOffset::Latest => -1,
            TimeOffset::Earliest => -2,
            TimeOffset::Preceding(ms) => ms,
        }
    }

    pub const fn from_value(value: i64) -> Self {
        match value {
            -1 => TimeOffset::Latest,
            -2 => TimeOffset::Earliest,
            ms => TimeOffset::Preceding(ms),
        }
    }
}

impl ToByte for TimeOffset {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.value().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

/// Minimum bytes a fetch must accumulate before the broker answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinBytes {
    None,
    One,
    Many(i32),
}

impl MinBytes {
    pub const fn value(self) -> i32 {
        match self {
            MinBytes::None => 0,
            MinBytes::One => 1,
            MinBytes::Many(bytes) => bytes,
        }
    }

    pub const fn from_value(value: i32) -> Self {
        match value {
            0 => MinBytes::None,
            1 => MinBytes::One,
            bytes => MinBytes::Many(bytes),
        }
    }
}

impl ToByte for MinBytes {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.value().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

/// Replica id field of fetch and offset requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplicaId {
    /// An ordinary consumer.
    None,
    /// A debugging consumer allowed to read past the high watermark.
    Debug,
    /// A follower broker.
    Node(i32),
}

impl ReplicaId {
    pub const fn value(self) -> i32 {
        match self {
            ReplicaId::None => -1,
            ReplicaId::Debug => -2,
            ReplicaId::Node(id) => id,
        }
    }

    pub const fn from_value(value: i32) -> Self {
        match value {
            -1 => ReplicaId::None,
            -2 => ReplicaId::Debug,
            id => ReplicaId::Node(id),
        }
    }
}

impl ToByte for ReplicaId {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.value().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

/// How many acknowledgements a produce request waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredAcks {
    /// The broker sends no response.
    NoResponse,
    /// Wait for the leader's local write.
    Wait,
    /// Wait for all in-sync replicas.
    Block,
    /// Wait for this many replicas.
    BlockUntil(i16),
}

impl RequiredAcks {
    pub const fn value(self) -> i16 {
        match self {
            RequiredAcks::NoResponse => 0,
            RequiredAcks::Wait => 1,
            RequiredAcks::Block => -1,
            RequiredAcks::BlockUntil(n) => n,
        }
    }

    pub const fn from_value(value: i16) -> Self {
        match value {
            0 => RequiredAcks::NoResponse,
            1 => RequiredAcks::Wait,
            -1 => RequiredAcks::Block,
            n => RequiredAcks::BlockUntil(n),
        }
    }
}

impl ToByte for RequiredAcks {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.value().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

/// Compression codec tag in the low bits of a message's attributes.
///
/// Only the tag is modeled; payloads are carried as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionCodec {
    #[default]
    None,
    Gzip,
    Snappy,
}

impl CompressionCodec {
    pub const fn value(self) -> i8 {
        match self {
            CompressionCodec::None => 0,
            CompressionCodec::Gzip => 1,
            CompressionCodec::Snappy => 2,
        }
    }

    /// Reads the codec from a full attributes byte. Unknown tags yield `None`.
    pub const fn from_attributes(attributes: i8) -> Option<Self> {
        match attributes & COMPRESSION_CODEC_MASK {
            0 => Some(CompressionCodec::None),
            1 => Some(CompressionCodec::Gzip),
            2 => Some(CompressionCodec::Snappy),
            _ => None,
        }
    }
}

/// Partition assignment strategy advertised by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentStrategy {
    Range,
    RoundRobin,
}

impl AssignmentStrategy {
    pub const fn name(self) -> &'static str {
        match self {
            AssignmentStrategy::Range => "range",
            AssignmentStrategy::RoundRobin => "roundrobin",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "range" => Some(AssignmentStrategy::Range),
            "roundrobin" => Some(AssignmentStrategy::RoundRobin),
            _ => None,
        }
    }
}

impl fmt::Display for AssignmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Group entities
// ============================================================================

/// Protocol type of a consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GroupProtocol {
    /// The standard consumer protocol, `"consumer"`.
    #[default]
    Consumer,
    /// Any other protocol type, by name.
    Custom(String),
}

impl GroupProtocol {
    pub fn name(&self) -> &str {
        match self {
            GroupProtocol::Consumer => CONSUMER_PROTOCOL_TYPE,
            GroupProtocol::Custom(name) => name,
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == CONSUMER_PROTOCOL_TYPE {
            GroupProtocol::Consumer
        } else {
            GroupProtocol::Custom(name)
        }
    }
}

impl fmt::Display for GroupProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ToByte for GroupProtocol {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.name().encoded_len()
    }
}

/// Coordinator-side state of a consumer group.
///
/// `Unknown` keeps whatever string the broker sent. It is inconclusive:
/// a group in `Unknown` must not be treated as [`GroupState::Stable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupState {
    /// Joins are complete and the coordinator awaits the leader's assignment.
    AwaitingSync,
    /// The coordinator is loading group data.
    Initialize,
    /// Members are (re)joining.
    Joining,
    /// Active generation, or empty and awaiting the first join.
    Stable,
    /// No active members; state has been cleaned up.
    Down,
    Unknown(String),
}

impl GroupState {
    pub fn name(&self) -> &str {
        match self {
            GroupState::AwaitingSync => "AwaitingSync",
            GroupState::Initialize => "Initialize",
            GroupState::Joining => "Joining",
            GroupState::Stable => "Stable",
            GroupState::Down => "Down",
            GroupState::Unknown(raw) => raw,
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "AwaitingSync" => GroupState::AwaitingSync,
            "Initialize" => GroupState::Initialize,
            "Joining" => GroupState::Joining,
            "Stable" => GroupState::Stable,
            "Down" => GroupState::Down,
            _ => GroupState::Unknown(name),
        }
    }

    #[inline]
    pub fn is_stable(&self) -> bool {
        matches!(self, GroupState::Stable)
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, GroupState::Unknown(_))
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ToByte for GroupState {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.name().encoded_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Offset tests
    #[test]
    fn test_offset_new_and_value() {
        let offset = Offset::new(42);
        assert_eq!(offset.value(), 42);
        assert!(offset.is_valid());
        assert!(!Offset::INVALID.is_valid());
    }

    #[test]
    fn test_offset_encode() {
        let mut buf = Vec::new();
        Offset::new(0x0102030405060708).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn test_offset_conversions() {
        let offset: Offset = 123i64.into();
        let raw: i64 = offset.into();
        assert_eq!(raw, 123);
        assert_eq!(format!("{}", offset), "123");
    }

    // CorrelationId tests
    #[test]
    fn test_correlation_id_next() {
        assert_eq!(CorrelationId::new(1).next(), CorrelationId::new(2));
        assert_eq!(CorrelationId::new(i32::MAX).next(), CorrelationId::new(0));
    }

    #[test]
    fn test_correlation_id_encode() {
        let mut buf = Vec::new();
        CorrelationId::new(0x01020304).encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);
    }

    // PartitionId tests
    #[test]
    fn test_partition_id_ordering() {
        assert!(PartitionId::new(0) < PartitionId::new(1));
        assert!(!PartitionId::new(-1).is_valid());
    }

    // GenerationId tests
    #[test]
    fn test_generation_id_invalid() {
        assert_eq!(GenerationId::INVALID.value(), -1);
        let id: GenerationId = 7.into();
        assert_eq!(i32::from(id), 7);
    }

    // Enumeration tests
    #[test]
    fn test_time_offset_values() {
        assert_eq!(TimeOffset::Latest.value(), -1);
        assert_eq!(TimeOffset::Earliest.value(), -2);
        assert_eq!(TimeOffset::Preceding(1_000).value(), 1_000);
        assert_eq!(TimeOffset::from_value(-2), TimeOffset::Earliest);
        assert_eq!(TimeOffset::from_value(5), TimeOffset::Preceding(5));
    }

    #[test]
    fn test_min_bytes_values() {
        assert_eq!(MinBytes::None.value(), 0);
        assert_eq!(MinBytes::One.value(), 1);
        assert_eq!(MinBytes::from_value(4096), MinBytes::Many(4096));
    }

    #[test]
    fn test_replica_id_values() {
        assert_eq!(ReplicaId::None.value(), -1);
        assert_eq!(ReplicaId::Debug.value(), -2);
        assert_eq!(ReplicaId::from_value(3), ReplicaId::Node(3));
    }

    #[test]
    fn test_required_acks_values() {
        assert_eq!(RequiredAcks::NoResponse.value(), 0);
        assert_eq!(RequiredAcks::Wait.value(), 1);
        assert_eq!(RequiredAcks::Block.value(), -1);
        assert_eq!(RequiredAcks::from_value(2), RequiredAcks::BlockUntil(2));

        let mut buf = Vec::new();
        RequiredAcks::Block.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_compression_codec_from_attributes() {
        assert_eq!(
            CompressionCodec::from_attributes(0),
            Some(CompressionCodec::None)
        );
        assert_eq!(
            CompressionCodec::from_attributes(0x09),
            Some(CompressionCodec::Gzip)
        );
        assert_eq!(
            CompressionCodec::from_attributes(2),
            Some(CompressionCodec::Snappy)
        );
        assert_eq!(CompressionCodec::from_attributes(5), None);
    }

    #[test]
    fn test_assignment_strategy_names() {
        assert_eq!(AssignmentStrategy::RoundRobin.name(), "roundrobin");
        assert_eq!(
            AssignmentStrategy::from_name("range"),
            Some(AssignmentStrategy::Range)
        );
        assert_eq!(AssignmentStrategy::from_name("sticky"), None);
    }

    #[test]
    fn test_group_protocol_from_name() {
        assert_eq!(GroupProtocol::from_name("consumer"), GroupProtocol::Consumer);
        assert_eq!(
            GroupProtocol::from_name("connect"),
            GroupProtocol::Custom("connect".to_string())
        );
        assert_eq!(GroupProtocol::Custom("x".into()).name(), "x");
    }

    #[test]
    fn test_group_protocol_default_is_consumer() {
        assert_eq!(GroupProtocol::default(), GroupProtocol::Consumer);
    }

    #[test]
    fn test_group_state_unknown_is_not_stable() {
        let state = GroupState::from_name("PreparingRebalance");
        assert_eq!(state, GroupState::Unknown("PreparingRebalance".to_string()));
        assert!(!state.is_stable());
        assert!(!state.is_known());
        assert_eq!(state.name(), "PreparingRebalance");
        assert!(GroupState::from_name("Stable").is_stable());
    }

    #[test]
    fn test_group_state_encode() {
        let mut buf = Vec::new();
        GroupState::Down.encode(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x04, b'D', b'o', b'w', b'n']);
        assert_eq!(GroupState::Down.encoded_len(), 6);
    }
}
