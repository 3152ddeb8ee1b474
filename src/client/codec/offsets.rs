//! Offset management codecs:
//! - OffsetCommit (API key 8)

use bytes::BufMut;
use nombytes::NomBytes;

use super::KafkaCodec;
use crate::client::ApiKey;
use crate::client::request::{OffsetCommitRequest, parse_offset_commit_request};
use crate::client::response::{OffsetCommitResponse, parse_offset_commit_response};
use crate::encode::ToByte;
use crate::error::Result;
use crate::parser::PResult;

/// Codec for Kafka OffsetCommit API.
///
/// # Supported Versions
///
/// - Version 0: offsets stored in ZooKeeper, group id only
/// - Version 1: adds generation id, member id and per-partition timestamp
/// - Version 2: replaces the timestamp with a request-level retention time
pub struct OffsetCommitCodec;

impl KafkaCodec for OffsetCommitCodec {
    type Request = OffsetCommitRequest;
    type Response = OffsetCommitResponse;

    /// Kafka API key for OffsetCommit is 8.
    fn api_key() -> ApiKey {
        ApiKey::OffsetCommit
    }

    fn max_version() -> i16 {
        2
    }

    fn write_request<W: BufMut>(
        request: &Self::Request,
        version: i16,
        buffer: &mut W,
    ) -> Result<()> {
        request.encode_versioned(buffer, version)
    }

    fn request_len(request: &Self::Request, version: i16) -> usize {
        request.encoded_len_versioned(version)
    }

    fn parse_request(s: NomBytes, version: i16) -> PResult<Self::Request> {
        parse_offset_commit_request(s, version)
    }

    fn write_response<W: BufMut>(
        response: &Self::Response,
        _version: i16,
        buffer: &mut W,
    ) -> Result<()> {
        response.encode(buffer)
    }

    fn response_len(response: &Self::Response, _version: i16) -> usize {
        response.encoded_len()
    }

    fn parse_response(s: NomBytes, version: i16) -> PResult<Self::Response> {
        parse_offset_commit_response(s, version)
    }
}
