//! Kafka protocol codec layer.
//!
//! Each supported API implements [`KafkaCodec`], which pairs a request type
//! with its response type and knows how to move both to and from the wire
//! for every version it supports.
//!
//! # Supported APIs
//!
//! | API | Key | Versions | Codec |
//! |-----|-----|----------|-------|
//! | OffsetCommit | 8 | 0-2 | `OffsetCommitCodec` |
//! | DescribeGroups | 15 | 0 | `DescribeGroupsCodec` |
//! | ListGroups | 16 | 0 | `ListGroupsCodec` |
//!
//! # Example
//!
//! ```rust
//! use kafkaesque_client::client::codec::{KafkaCodec, ListGroupsCodec};
//! use kafkaesque_client::client::ListGroupsRequest;
//!
//! let bytes = ListGroupsCodec::encode_request(&ListGroupsRequest, 0).unwrap();
//! assert!(bytes.is_empty());
//! ```

mod groups;
mod offsets;

pub use groups::{DescribeGroupsCodec, ListGroupsCodec};
pub use offsets::OffsetCommitCodec;

use bytes::{BufMut, Bytes, BytesMut};
use nombytes::NomBytes;
use tracing::trace;

use crate::client::ApiKey;
use crate::error::{Error, Result};
use crate::parser::{PResult, decode_exact};

/// Trait for Kafka protocol codecs.
///
/// Implementors supply the version-aware `write_*` / `parse_*` primitives;
/// the provided methods add version checks, sizing and full-span decoding.
pub trait KafkaCodec {
    /// The request type for this API.
    type Request;

    /// The response type for this API.
    type Response;

    /// The Kafka API key for this operation.
    fn api_key() -> ApiKey;

    /// The minimum supported version.
    fn min_version() -> i16 {
        0
    }

    /// The maximum supported version.
    fn max_version() -> i16 {
        0
    }

    /// The version used when the caller does not pick one.
    fn default_version() -> i16 {
        Self::max_version()
    }

    /// Check if a version is supported.
    fn is_version_supported(version: i16) -> bool {
        version >= Self::min_version() && version <= Self::max_version()
    }

    fn check_version(version: i16) -> Result<()> {
        if Self::is_version_supported(version) {
            Ok(())
        } else {
            Err(Error::UnsupportedVersion {
                api_key: Self::api_key(),
                version,
            })
        }
    }

    fn write_request<W: BufMut>(request: &Self::Request, version: i16, buffer: &mut W)
    -> Result<()>;

    /// Number of bytes `write_request` produces.
    fn request_len(request: &Self::Request, version: i16) -> usize;

    fn parse_request(s: NomBytes, version: i16) -> PResult<Self::Request>;

    fn write_response<W: BufMut>(
        response: &Self::Response,
        version: i16,
        buffer: &mut W,
    ) -> Result<()>;

    /// Number of bytes `write_response` produces.
    fn response_len(response: &Self::Response, version: i16) -> usize;

    fn parse_response(s: NomBytes, version: i16) -> PResult<Self::Response>;

    /// Encode a request payload (no header) into fresh bytes.
    fn encode_request(request: &Self::Request, version: i16) -> Result<Bytes> {
        Self::check_version(version)?;
        let mut buffer = BytesMut::with_capacity(Self::request_len(request, version));
        Self::write_request(request, version, &mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Decode a request payload; the payload must fill `bytes` exactly.
    fn decode_request(bytes: Bytes, version: i16) -> Result<Self::Request> {
        Self::check_version(version)?;
        trace!(api_key = ?Self::api_key(), version, len = bytes.len(), "Decoding request");
        decode_exact(bytes, |s| Self::parse_request(s, version))
    }

    /// Encode a response payload (no correlation id) into fresh bytes.
    fn encode_response(response: &Self::Response, version: i16) -> Result<Bytes> {
        Self::check_version(version)?;
        let mut buffer = BytesMut::with_capacity(Self::response_len(response, version));
        Self::write_response(response, version, &mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Decode a response payload; the payload must fill `bytes` exactly.
    fn decode_response(bytes: Bytes, version: i16) -> Result<Self::Response> {
        Self::check_version(version)?;
        trace!(api_key = ?Self::api_key(), version, len = bytes.len(), "Decoding response");
        decode_exact(bytes, |s| Self::parse_response(s, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DescribeGroupsRequest, ListGroupsResponse, OffsetCommitRequest};
    use crate::error::ErrorCode;

    #[test]
    fn test_api_keys() {
        assert_eq!(ListGroupsCodec::api_key(), ApiKey::ListGroups);
        assert_eq!(DescribeGroupsCodec::api_key(), ApiKey::DescribeGroups);
        assert_eq!(OffsetCommitCodec::api_key(), ApiKey::OffsetCommit);
    }

    #[test]
    fn test_version_ranges() {
        assert!(ListGroupsCodec::is_version_supported(0));
        assert!(!ListGroupsCodec::is_version_supported(1));
        assert_eq!(OffsetCommitCodec::default_version(), 2);
        assert!(OffsetCommitCodec::is_version_supported(1));
        assert!(!OffsetCommitCodec::is_version_supported(3));
        assert!(!OffsetCommitCodec::is_version_supported(-1));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let err = DescribeGroupsCodec::encode_request(&DescribeGroupsRequest::single("g"), 3)
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedVersion {
                api_key: ApiKey::DescribeGroups,
                version: 3
            }
        );

        let err = OffsetCommitCodec::decode_request(Bytes::new(), 7).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 7, .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let response = ListGroupsResponse::new(ErrorCode::NONE).with_group("g", "consumer");
        let mut bytes = ListGroupsCodec::encode_response(&response, 0)
            .unwrap()
            .to_vec();
        bytes.extend_from_slice(&[0, 0]);

        let err = ListGroupsCodec::decode_response(Bytes::from(bytes), 0).unwrap_err();
        assert_eq!(err, Error::TrailingBytes(2));
    }

    #[test]
    fn test_request_len_matches_encoding() {
        let request = OffsetCommitRequest::new("g", 1, "m").commit("t", 0, 9, Some("meta".into()));
        for version in 0..=2 {
            let bytes = OffsetCommitCodec::encode_request(&request, version).unwrap();
            assert_eq!(bytes.len(), OffsetCommitCodec::request_len(&request, version));
        }
    }
}
