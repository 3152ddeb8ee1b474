//! Crate & protocol level errors.
//!
//! # Error Hierarchy
//!
//! - [`Error`]: failures of this crate: short or malformed input, checksum
//!   mismatches, framing disagreements, transport I/O, configuration.
//! - [`KafkaCode`]: the closed catalog of error codes a broker reports inside
//!   a successfully decoded response, each with a description and a
//!   retriable flag.
//! - [`ErrorCode`]: the value actually decoded from the wire. Codes outside
//!   the catalog are preserved as [`ErrorCode::Unrecognized`] so newer brokers
//!   never break decoding.
//!
//! The crate never retries. [`ErrorCode::is_retriable`] exists so callers can
//! decide.

use bytes::BufMut;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::borrow::Cow;
use std::{fmt, io, result};
use thiserror::Error as ThisError;

use crate::client::ApiKey;
use crate::encode::ToByte;

pub type Result<T> = result::Result<T, Error>;

/// Codec, framing and transport errors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Fewer bytes remained than a fixed-width or declared-length field needs.
    #[error("Buffer underflow: input ended before the value was complete")]
    BufferUnderflow,

    /// A length or count that is neither the -1 null sentinel nor representable.
    #[error("Malformed length: {0}")]
    MalformedLength(i64),

    /// A string field held bytes that are not UTF-8.
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A message's stored CRC32 does not match its contents.
    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// A payload decoder finished before the end of its designated span.
    #[error("Trailing bytes: {0} bytes left after decoding")]
    TrailingBytes(usize),

    /// No codec exists for this API in the catalog.
    #[error("Unsupported API: {0:?}")]
    UnsupportedApi(ApiKey),

    /// The codec exists but does not speak this version.
    #[error("Unsupported version {version} for {api_key:?}")]
    UnsupportedVersion { api_key: ApiKey, version: i16 },

    /// A response answered a different request than the one outstanding.
    #[error("Correlation id mismatch: expected {expected}, received {actual}")]
    CorrelationMismatch { expected: i32, actual: i32 },

    /// A nonzero error code reported by the broker.
    #[error("Broker error: {0}")]
    Broker(ErrorCode),

    /// An error in the network.
    #[error("IO error: {0:?}")]
    IoError(io::ErrorKind),

    /// Missing data or connection closed.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e.kind())
    }
}

/// Various errors reported by a remote Kafka server.
/// See also [Kafka Errors](http://kafka.apache.org/protocol.html)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, Default)]
pub enum KafkaCode {
    /// An unexpected server error
    UnknownServerError = -1,
    #[default]
    None = 0,
    /// The requested offset is outside the range of offsets
    /// maintained by the server for the given topic/partition
    OffsetOutOfRange = 1,
    /// This indicates that a message contents does not match its CRC
    CorruptMessage = 2,
    /// This request is for a topic or partition that does not exist
    /// on this broker.
    UnknownTopicOrPartition = 3,
    /// The message has a negative size
    InvalidMessageSize = 4,
    /// There is currently no leader for this partition and hence it is
    /// unavailable for writes.
    LeaderNotAvailable = 5,
    /// The client's metadata is out of date.
    NotLeaderForPartition = 6,
    /// The request exceeded the user-specified time limit.
    RequestTimedOut = 7,
    /// Used mostly by tools when a broker is not alive.
    BrokerNotAvailable = 8,
    /// A replica is expected on a broker but is not there.
    ReplicaNotAvailable = 9,
    /// The client attempted to produce a message larger than the maximum.
    MessageSizeTooLarge = 10,
    /// Internal error code for broker-to-broker communication.
    StaleControllerEpoch = 11,
    /// Offset metadata string larger than the configured maximum.
    OffsetMetadataTooLarge = 12,
    /// The server disconnected before a response was received.
    NetworkException = 13,
    /// Offsets or group metadata are still being loaded.
    GroupLoadInProgress = 14,
    /// The offsets topic does not exist yet or the coordinator is not active.
    GroupCoordinatorNotAvailable = 15,
    /// This broker is not the coordinator for the group.
    NotCoordinatorForGroup = 16,
    /// Invalid or internal topic.
    InvalidTopic = 17,
    /// A message batch exceeds the maximum configured segment size.
    RecordListTooLarge = 18,
    /// In-sync replicas are below the configured minimum.
    NotEnoughReplicas = 19,
    /// Written, but with fewer in-sync replicas than required.
    NotEnoughReplicasAfterAppend = 20,
    /// requiredAcks is not -1, 0 or 1.
    InvalidRequiredAcks = 21,
    /// The generation id is not the current generation.
    IllegalGeneration = 22,
    /// Protocol type or protocols incompatible with the group.
    InconsistentGroupProtocol = 23,
    /// The group id is empty or null.
    InvalidGroupId = 24,
    /// The member id is not in the current generation.
    UnknownMemberId = 25,
    /// The session timeout is outside the broker's allowed range.
    InvalidSessionTimeout = 26,
    /// The coordinator has begun rebalancing the group.
    RebalanceInProgress = 27,
    /// Offset commit rejected because of oversize metadata.
    InvalidCommitOffsetSize = 28,
    /// Not authorized to access the requested topic.
    TopicAuthorizationFailed = 29,
    /// Not authorized to access the group.
    GroupAuthorizationFailed = 30,
    /// Not authorized to use an inter-broker or administrative API.
    ClusterAuthorizationFailed = 31,
    /// The timestamp of the message is out of acceptable range.
    InvalidTimestamp = 32,
    /// The broker does not support the requested SASL mechanism.
    UnsupportedSaslMechanism = 33,
    /// Request is not valid given the current SASL state.
    IllegalSaslState = 34,
    /// The version of API is not supported.
    UnsupportedVersion = 35,
    /// Topic with this name already exists.
    TopicAlreadyExists = 36,
    /// This is not the correct controller for this cluster.
    NotController = 41,
    /// The message format version on the broker does not support the request.
    UnsupportedForMessageFormat = 43,
    /// The producer attempted to use a sequence number outside the valid range.
    OutOfOrderSequenceNumber = 45,
    /// The producer attempted to assign a sequence number that was already used.
    DuplicateSequenceNumber = 46,
    /// SASL Authentication failed.
    SaslAuthenticationFailed = 58,
}

impl KafkaCode {
    /// The int16 carried on the wire.
    #[inline]
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Human-readable meaning of the code.
    pub const fn description(self) -> &'static str {
        match self {
            KafkaCode::UnknownServerError => "unknown server error: an unexpected server error",
            KafkaCode::None => "no error",
            KafkaCode::OffsetOutOfRange => {
                "offset out of range: the requested offset is outside the range maintained by the server for the topic/partition"
            }
            KafkaCode::CorruptMessage => "corrupt message: message contents do not match its CRC",
            KafkaCode::UnknownTopicOrPartition => {
                "unknown topic or partition: it does not exist on this broker"
            }
            KafkaCode::InvalidMessageSize => "invalid message size: the message has a negative size",
            KafkaCode::LeaderNotAvailable => {
                "leader not available: a leadership election is in progress and the partition is unavailable for writes"
            }
            KafkaCode::NotLeaderForPartition => {
                "not leader for partition: the client's metadata is out of date"
            }
            KafkaCode::RequestTimedOut => {
                "request timed out: the request exceeded the user-specified time limit"
            }
            KafkaCode::BrokerNotAvailable => "broker not available: the broker is not alive",
            KafkaCode::ReplicaNotAvailable => {
                "replica not available: a replica is expected on a broker but is not there"
            }
            KafkaCode::MessageSizeTooLarge => {
                "message size too large: the message exceeds the server's configured maximum"
            }
            KafkaCode::StaleControllerEpoch => "stale controller epoch: internal error",
            KafkaCode::OffsetMetadataTooLarge => {
                "offset metadata too large: the metadata string exceeds the configured maximum"
            }
            KafkaCode::NetworkException => {
                "network exception: the server disconnected before a response was received"
            }
            KafkaCode::GroupLoadInProgress => {
                "group load in progress: the coordinator is still loading offsets or group metadata"
            }
            KafkaCode::GroupCoordinatorNotAvailable => {
                "group coordinator not available: the offsets topic does not exist or the coordinator is not active"
            }
            KafkaCode::NotCoordinatorForGroup => {
                "not coordinator for group: this broker is not the group's coordinator"
            }
            KafkaCode::InvalidTopic => {
                "invalid topic: the topic name is illegal or the topic is internal"
            }
            KafkaCode::RecordListTooLarge => {
                "record list too large: the batch exceeds the maximum configured segment size"
            }
            KafkaCode::NotEnoughReplicas => {
                "not enough replicas: in-sync replicas are below the configured minimum"
            }
            KafkaCode::NotEnoughReplicasAfterAppend => {
                "not enough replicas after append: written with fewer in-sync replicas than required"
            }
            KafkaCode::InvalidRequiredAcks => {
                "invalid required acks: must be -1, 0 or 1"
            }
            KafkaCode::IllegalGeneration => {
                "illegal generation: the generation id is not the current generation"
            }
            KafkaCode::InconsistentGroupProtocol => {
                "inconsistent group protocol: protocol type or protocols are incompatible with the group"
            }
            KafkaCode::InvalidGroupId => "invalid group id: the group id is empty or null",
            KafkaCode::UnknownMemberId => {
                "unknown member id: the member is not in the current generation"
            }
            KafkaCode::InvalidSessionTimeout => {
                "invalid session timeout: outside the range allowed by the broker"
            }
            KafkaCode::RebalanceInProgress => {
                "rebalance in progress: the client should rejoin the group"
            }
            KafkaCode::InvalidCommitOffsetSize => {
                "invalid commit offset size: commit rejected because of oversize metadata"
            }
            KafkaCode::TopicAuthorizationFailed => {
                "topic authorization failed: not authorized to access the topic"
            }
            KafkaCode::GroupAuthorizationFailed => {
                "group authorization failed: not authorized to access the group"
            }
            KafkaCode::ClusterAuthorizationFailed => {
                "cluster authorization failed: not authorized to use an inter-broker or administrative API"
            }
            KafkaCode::InvalidTimestamp => {
                "invalid timestamp: the message timestamp is out of acceptable range"
            }
            KafkaCode::UnsupportedSaslMechanism => {
                "unsupported SASL mechanism: the broker does not support it"
            }
            KafkaCode::IllegalSaslState => {
                "illegal SASL state: the request is not valid in the current SASL state"
            }
            KafkaCode::UnsupportedVersion => "unsupported version: the API version is not supported",
            KafkaCode::TopicAlreadyExists => "topic already exists",
            KafkaCode::NotController => {
                "not controller: this is not the correct controller for the cluster"
            }
            KafkaCode::UnsupportedForMessageFormat => {
                "unsupported for message format: the broker's message format does not support the request"
            }
            KafkaCode::OutOfOrderSequenceNumber => {
                "out of order sequence number: the sequence number is outside the valid range"
            }
            KafkaCode::DuplicateSequenceNumber => {
                "duplicate sequence number: the sequence number was already used"
            }
            KafkaCode::SaslAuthenticationFailed => "SASL authentication failed",
        }
    }

    /// Whether the same request may succeed if sent again.
    pub const fn is_retriable(self) -> bool {
        matches!(
            self,
            KafkaCode::CorruptMessage
                | KafkaCode::UnknownTopicOrPartition
                | KafkaCode::LeaderNotAvailable
                | KafkaCode::NotLeaderForPartition
                | KafkaCode::RequestTimedOut
                | KafkaCode::NetworkException
                | KafkaCode::GroupLoadInProgress
                | KafkaCode::GroupCoordinatorNotAvailable
                | KafkaCode::NotCoordinatorForGroup
                | KafkaCode::NotEnoughReplicas
                | KafkaCode::NotEnoughReplicasAfterAppend
                | KafkaCode::NotController
        )
    }
}

/// An error code as decoded from a response.
///
/// Decoding never fails on the code itself: anything outside [`KafkaCode`]
/// becomes `Unrecognized` and keeps its raw value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Known(KafkaCode),
    Unrecognized(i16),
}

impl ErrorCode {
    pub const NONE: Self = ErrorCode::Known(KafkaCode::None);

    pub fn from_i16(code: i16) -> Self {
        KafkaCode::from_i16(code).map_or(ErrorCode::Unrecognized(code), ErrorCode::Known)
    }

    /// The int16 carried on the wire.
    pub const fn code(self) -> i16 {
        match self {
            ErrorCode::Known(code) => code.code(),
            ErrorCode::Unrecognized(code) => code,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, ErrorCode::Known(KafkaCode::None))
    }

    /// Unrecognized codes are never retriable: nothing is known about them.
    pub const fn is_retriable(self) -> bool {
        match self {
            ErrorCode::Known(code) => code.is_retriable(),
            ErrorCode::Unrecognized(_) => false,
        }
    }

    pub fn description(self) -> Cow<'static, str> {
        match self {
            ErrorCode::Known(code) => Cow::Borrowed(code.description()),
            ErrorCode::Unrecognized(code) => Cow::Owned(format!("unknown({code})")),
        }
    }

    /// `Ok(())` for success, otherwise [`Error::Broker`].
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::Broker(self))
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::NONE
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        ErrorCode::from_i16(code)
    }
}

impl From<KafkaCode> for ErrorCode {
    fn from(code: KafkaCode) -> Self {
        ErrorCode::Known(code)
    }
}

impl From<ErrorCode> for i16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Known(code) => write!(f, "{} ({})", code.description(), code.code()),
            ErrorCode::Unrecognized(code) => write!(f, "unknown({code})"),
        }
    }
}

impl ToByte for ErrorCode {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.code().encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        2
    }
}
