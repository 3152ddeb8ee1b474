//! # Kafkaesque Client
//! Client-side codec for the Kafka wire protocol.
//!
//! This crate turns typed Kafka requests into size-prefixed frames and
//! broker responses back into typed values. It covers the pre-0.11 message
//! format (v0 messages and message sets) and the consumer group
//! administration APIs: ListGroups, DescribeGroups and OffsetCommit.
//!
//! The crate does no I/O of its own. Bring a [`Transport`](client::Transport)
//! that moves whole frames and drive it with a [`Session`](client::Session).
//!
//! # Goals
//! - Easy to understand code
//! - Leverage best in class libraries such as [Nom](https://docs.rs/nom/latest/nom/) and [Bytes](https://docs.rs/bytes/latest/bytes/)
//! - Never panic on untrusted input; every malformed frame is an [`Error`](error::Error)
//! - Deterministic encoding, so identical values always produce identical bytes
//!
//! ## Getting started
//! Include the following snippet in your `Cargo.toml` dependencies:
//! ```toml
//! kafkaesque-client = "0.1"
//! ```
//!
//! ### Encoding a request frame
//! ```rust
//! use kafkaesque_client::prelude::*;
//!
//! let commit = OffsetCommitRequest::new("my-group", 3, "member-1").commit("events", 0, 42, None);
//! let envelope = RequestEnvelope::new(1, Some("my-app".to_string()), commit);
//! let frame = encode_frame(&envelope).unwrap();
//!
//! // int32 size prefix, then api key 8 (OffsetCommit) at version 2.
//! assert_eq!(&frame[4..8], &[0, 8, 0, 2]);
//! ```
//!
//! ### Building a message set
//! ```rust
//! use kafkaesque_client::prelude::*;
//!
//! let set = MessageSet::from_messages([
//!     Message::new(None, "hello"),
//!     Message::new(Some("key".into()), "world"),
//! ]);
//! let bytes = to_bytes(&set).unwrap();
//! assert_eq!(bytes.len(), set.encoded_len());
//! ```
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [Confluence Docs](https://cwiki.apache.org/confluence/display/KAFKA/A+Guide+To+The+Kafka+Protocol)

#![forbid(unsafe_code)]

pub mod encode;
pub mod error;
pub mod parser;
pub mod types;

pub mod client;
pub mod config;
pub mod constants;
pub mod message_set;
pub mod telemetry;

pub mod prelude {
    //! Main export of client structures
    //!
    //! ```rust
    //! use kafkaesque_client::prelude::*;
    //!
    //! let request = DescribeGroupsRequest::single("my-group");
    //! let envelope = RequestEnvelope::new(CorrelationId(7), None, request);
    //! assert_eq!(envelope.api_key(), ApiKey::DescribeGroups);
    //! ```
    pub use crate::client::{
        ApiKey, DescribeGroupsRequest, DescribeGroupsResponse, DescribedGroup, GroupMember,
        ListGroupsRequest, ListGroupsResponse, OffsetCommitRequest, OffsetCommitResponse,
        PartitionOffset, Request, RequestEnvelope, Response, ResponseEnvelope, Session, Transport,
        decode_response, encode_frame, parse_frame,
    };
    pub use crate::config::ClientConfig;
    pub use crate::encode::{ToByte, to_bytes};
    pub use crate::error::{Error, ErrorCode, KafkaCode, Result};
    pub use crate::message_set::{Message, MessageSet, MessageSetItem};
    pub use crate::types::{
        AssignmentStrategy, CompressionCodec, CorrelationId, GenerationId, GroupProtocol,
        GroupState, Offset, PartitionId,
    };

    pub use bytes;

    pub mod codec {
        //! Per-API codecs. See [`KafkaCodec`].
        pub use crate::client::codec::*;
    }
}
