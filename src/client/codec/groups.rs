//! Consumer group inspection codecs:
//! - DescribeGroups (API key 15)
//! - ListGroups (API key 16)

use bytes::BufMut;
use nombytes::NomBytes;

use super::KafkaCodec;
use crate::client::ApiKey;
use crate::client::request::{
    DescribeGroupsRequest, ListGroupsRequest, parse_describe_groups_request,
    parse_list_groups_request,
};
use crate::client::response::{
    DescribeGroupsResponse, ListGroupsResponse, parse_describe_groups_response,
    parse_list_groups_response,
};
use crate::encode::ToByte;
use crate::error::Result;
use crate::parser::PResult;

// ============================================================================
// ListGroups Codec
// ============================================================================

/// Codec for Kafka ListGroups API.
///
/// Lists the groups managed by the broker it is sent to. Version 0 only.
pub struct ListGroupsCodec;

impl KafkaCodec for ListGroupsCodec {
    type Request = ListGroupsRequest;
    type Response = ListGroupsResponse;

    /// Kafka API key for ListGroups is 16.
    fn api_key() -> ApiKey {
        ApiKey::ListGroups
    }

    fn write_request<W: BufMut>(
        request: &Self::Request,
        _version: i16,
        buffer: &mut W,
    ) -> Result<()> {
        request.encode(buffer)
    }

    fn request_len(request: &Self::Request, _version: i16) -> usize {
        request.encoded_len()
    }

    fn parse_request(s: NomBytes, version: i16) -> PResult<Self::Request> {
        parse_list_groups_request(s, version)
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
        parse_list_groups_response(s, version)
    }
}

// ============================================================================
// DescribeGroups Codec
// ============================================================================

/// Codec for Kafka DescribeGroups API.
///
/// Describes state and membership of the given groups. Version 0 only.
pub struct DescribeGroupsCodec;

impl KafkaCodec for DescribeGroupsCodec {
    type Request = DescribeGroupsRequest;
    type Response = DescribeGroupsResponse;

    /// Kafka API key for DescribeGroups is 15.
    fn api_key() -> ApiKey {
        ApiKey::DescribeGroups
    }

    fn write_request<W: BufMut>(
        request: &Self::Request,
        _version: i16,
        buffer: &mut W,
    ) -> Result<()> {
        request.encode(buffer)
    }

    fn request_len(request: &Self::Request, _version: i16) -> usize {
        request.encoded_len()
    }

    fn parse_request(s: NomBytes, version: i16) -> PResult<Self::Request> {
        parse_describe_groups_request(s, version)
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
        parse_describe_groups_response(s, version)
    }
}
