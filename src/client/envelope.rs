//! Request and response envelopes.
//!
//! ```text
//! Request frame  => size:int32 api_key:int16 api_version:int16 correlation_id:int32 client_id:string payload
//! Response frame => size:int32 correlation_id:int32 payload
//! ```
//!
//! A response does not say which API it answers. The caller remembers the
//! api key and version of the request it sent and hands them to
//! [`decode_response`], which picks the payload decoder from them.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use nom::{
    InputLength,
    number::complete::{be_i16, be_i32},
};
use nombytes::NomBytes;
use tracing::trace;

use super::codec::{DescribeGroupsCodec, KafkaCodec, ListGroupsCodec, OffsetCommitCodec};
use super::request::{DescribeGroupsRequest, ListGroupsRequest, OffsetCommitRequest};
use super::response::{DescribeGroupsResponse, ListGroupsResponse, OffsetCommitResponse};
use crate::constants::{REQUEST_HEADER_FIXED_LEN, RESPONSE_HEADER_LEN, SIZE_PREFIX_LEN};
use crate::encode::ToByte;
use crate::error::{Error, Result};
use crate::parser::{DecodeError, PResult, parse_nullable_string};
use crate::types::CorrelationId;

/// API keys for Kafka protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKey {
    Produce,
    Fetch,
    Offset,
    Metadata,
    OffsetCommit,
    OffsetFetch,
    GroupCoordinator,
    JoinGroup,
    Heartbeat,
    LeaveGroup,
    SyncGroup,
    DescribeGroups,
    ListGroups,
    Unknown(i16),
}

impl From<i16> for ApiKey {
    fn from(value: i16) -> Self {
        match value {
            0 => ApiKey::Produce,
            1 => ApiKey::Fetch,
            2 => ApiKey::Offset,
            3 => ApiKey::Metadata,
            8 => ApiKey::OffsetCommit,
            9 => ApiKey::OffsetFetch,
            10 => ApiKey::GroupCoordinator,
            11 => ApiKey::JoinGroup,
            12 => ApiKey::Heartbeat,
            13 => ApiKey::LeaveGroup,
            14 => ApiKey::SyncGroup,
            15 => ApiKey::DescribeGroups,
            16 => ApiKey::ListGroups,
            n => ApiKey::Unknown(n),
        }
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> Self {
        match key {
            ApiKey::Produce => 0,
            ApiKey::Fetch => 1,
            ApiKey::Offset => 2,
            ApiKey::Metadata => 3,
            ApiKey::OffsetCommit => 8,
            ApiKey::OffsetFetch => 9,
            ApiKey::GroupCoordinator => 10,
            ApiKey::JoinGroup => 11,
            ApiKey::Heartbeat => 12,
            ApiKey::LeaveGroup => 13,
            ApiKey::SyncGroup => 14,
            ApiKey::DescribeGroups => 15,
            ApiKey::ListGroups => 16,
            ApiKey::Unknown(n) => n,
        }
    }
}

impl ApiKey {
    /// Returns a static string name for this API key.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKey::Produce => "Produce",
            ApiKey::Fetch => "Fetch",
            ApiKey::Offset => "Offset",
            ApiKey::Metadata => "Metadata",
            ApiKey::OffsetCommit => "OffsetCommit",
            ApiKey::OffsetFetch => "OffsetFetch",
            ApiKey::GroupCoordinator => "GroupCoordinator",
            ApiKey::JoinGroup => "JoinGroup",
            ApiKey::Heartbeat => "Heartbeat",
            ApiKey::LeaveGroup => "LeaveGroup",
            ApiKey::SyncGroup => "SyncGroup",
            ApiKey::DescribeGroups => "DescribeGroups",
            ApiKey::ListGroups => "ListGroups",
            ApiKey::Unknown(_) => "Unknown",
        }
    }
}

impl ToByte for ApiKey {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        i16::from(*self).encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        2
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Any request payload this crate can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListGroups(ListGroupsRequest),
    DescribeGroups(DescribeGroupsRequest),
    OffsetCommit(OffsetCommitRequest),
}

impl Request {
    pub fn api_key(&self) -> ApiKey {
        match self {
            Request::ListGroups(_) => ListGroupsCodec::api_key(),
            Request::DescribeGroups(_) => DescribeGroupsCodec::api_key(),
            Request::OffsetCommit(_) => OffsetCommitCodec::api_key(),
        }
    }

    pub fn default_version(&self) -> i16 {
        match self {
            Request::ListGroups(_) => ListGroupsCodec::default_version(),
            Request::DescribeGroups(_) => DescribeGroupsCodec::default_version(),
            Request::OffsetCommit(_) => OffsetCommitCodec::default_version(),
        }
    }

    pub fn check_version(&self, version: i16) -> Result<()> {
        match self {
            Request::ListGroups(_) => ListGroupsCodec::check_version(version),
            Request::DescribeGroups(_) => DescribeGroupsCodec::check_version(version),
            Request::OffsetCommit(_) => OffsetCommitCodec::check_version(version),
        }
    }

    /// Encode the payload alone, without the header.
    pub fn write_payload<W: BufMut>(&self, version: i16, buffer: &mut W) -> Result<()> {
        self.check_version(version)?;
        match self {
            Request::ListGroups(r) => ListGroupsCodec::write_request(r, version, buffer),
            Request::DescribeGroups(r) => DescribeGroupsCodec::write_request(r, version, buffer),
            Request::OffsetCommit(r) => OffsetCommitCodec::write_request(r, version, buffer),
        }
    }

    pub fn payload_len(&self, version: i16) -> usize {
        match self {
            Request::ListGroups(r) => ListGroupsCodec::request_len(r, version),
            Request::DescribeGroups(r) => DescribeGroupsCodec::request_len(r, version),
            Request::OffsetCommit(r) => OffsetCommitCodec::request_len(r, version),
        }
    }

    /// Decode a payload that fills `bytes` exactly.
    pub fn decode(api_key: ApiKey, version: i16, bytes: Bytes) -> Result<Self> {
        match api_key {
            ApiKey::ListGroups => {
                ListGroupsCodec::decode_request(bytes, version).map(Request::ListGroups)
            }
            ApiKey::DescribeGroups => {
                DescribeGroupsCodec::decode_request(bytes, version).map(Request::DescribeGroups)
            }
            ApiKey::OffsetCommit => {
                OffsetCommitCodec::decode_request(bytes, version).map(Request::OffsetCommit)
            }
            other => Err(Error::UnsupportedApi(other)),
        }
    }
}

impl From<ListGroupsRequest> for Request {
    fn from(request: ListGroupsRequest) -> Self {
        Request::ListGroups(request)
    }
}

impl From<DescribeGroupsRequest> for Request {
    fn from(request: DescribeGroupsRequest) -> Self {
        Request::DescribeGroups(request)
    }
}

impl From<OffsetCommitRequest> for Request {
    fn from(request: OffsetCommitRequest) -> Self {
        Request::OffsetCommit(request)
    }
}

/// Parsed request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: ApiKey,
    pub api_version: i16,
    pub correlation_id: CorrelationId,
    pub client_id: Option<String>,
}

impl ToByte for RequestHeader {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.api_key.encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        self.client_id.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        REQUEST_HEADER_FIXED_LEN + self.client_id.encoded_len()
    }
}

pub fn parse_request_header(s: NomBytes) -> PResult<RequestHeader> {
    let (s, api_key) = be_i16(s)?;
    let (s, api_version) = be_i16(s)?;
    let (s, correlation_id) = be_i32(s)?;
    let (s, client_id) = parse_nullable_string(s)?;

    Ok((
        s,
        RequestHeader {
            api_key: ApiKey::from(api_key),
            api_version,
            correlation_id: CorrelationId(correlation_id),
            client_id,
        },
    ))
}

/// A request together with its header fields.
///
/// The api key is always the payload's own, so header and payload cannot
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub api_version: i16,
    pub correlation_id: CorrelationId,
    pub client_id: Option<String>,
    pub request: Request,
}

impl RequestEnvelope {
    /// Wrap `request` at its default version.
    pub fn new(
        correlation_id: impl Into<CorrelationId>,
        client_id: Option<String>,
        request: impl Into<Request>,
    ) -> Self {
        let request = request.into();
        Self {
            api_version: request.default_version(),
            correlation_id: correlation_id.into(),
            client_id,
            request,
        }
    }

    pub fn with_version(mut self, api_version: i16) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn api_key(&self) -> ApiKey {
        self.request.api_key()
    }

    pub fn header(&self) -> RequestHeader {
        RequestHeader {
            api_key: self.api_key(),
            api_version: self.api_version,
            correlation_id: self.correlation_id,
            client_id: self.client_id.clone(),
        }
    }

    /// Decode header and payload from one frame body (size prefix removed).
    pub fn decode(bytes: Bytes) -> Result<Self> {
        let (rest, header) = parse_request_header(NomBytes::new(bytes))?;
        trace!(
            api_key = header.api_key.as_str(),
            version = header.api_version,
            correlation_id = %header.correlation_id,
            "Decoding request envelope"
        );
        let request = Request::decode(header.api_key, header.api_version, rest.into_bytes())?;

        Ok(Self {
            api_version: header.api_version,
            correlation_id: header.correlation_id,
            client_id: header.client_id,
            request,
        })
    }
}

impl ToByte for RequestEnvelope {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.request.check_version(self.api_version)?;
        self.api_key().encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        self.client_id.encode(buffer)?;
        self.request.write_payload(self.api_version, buffer)
    }

    fn encoded_len(&self) -> usize {
        REQUEST_HEADER_FIXED_LEN
            + self.client_id.encoded_len()
            + self.request.payload_len(self.api_version)
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Any response payload this crate can decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ListGroups(ListGroupsResponse),
    DescribeGroups(DescribeGroupsResponse),
    OffsetCommit(OffsetCommitResponse),
}

impl Response {
    pub fn api_key(&self) -> ApiKey {
        match self {
            Response::ListGroups(_) => ListGroupsCodec::api_key(),
            Response::DescribeGroups(_) => DescribeGroupsCodec::api_key(),
            Response::OffsetCommit(_) => OffsetCommitCodec::api_key(),
        }
    }

    pub fn write_payload<W: BufMut>(&self, version: i16, buffer: &mut W) -> Result<()> {
        match self {
            Response::ListGroups(r) => {
                ListGroupsCodec::check_version(version)?;
                ListGroupsCodec::write_response(r, version, buffer)
            }
            Response::DescribeGroups(r) => {
                DescribeGroupsCodec::check_version(version)?;
                DescribeGroupsCodec::write_response(r, version, buffer)
            }
            Response::OffsetCommit(r) => {
                OffsetCommitCodec::check_version(version)?;
                OffsetCommitCodec::write_response(r, version, buffer)
            }
        }
    }

    pub fn payload_len(&self, version: i16) -> usize {
        match self {
            Response::ListGroups(r) => ListGroupsCodec::response_len(r, version),
            Response::DescribeGroups(r) => DescribeGroupsCodec::response_len(r, version),
            Response::OffsetCommit(r) => OffsetCommitCodec::response_len(r, version),
        }
    }

    /// Decode a payload that fills `bytes` exactly, using the decoder of
    /// the request's api key.
    pub fn decode(api_key: ApiKey, version: i16, bytes: Bytes) -> Result<Self> {
        match api_key {
            ApiKey::ListGroups => {
                ListGroupsCodec::decode_response(bytes, version).map(Response::ListGroups)
            }
            ApiKey::DescribeGroups => {
                DescribeGroupsCodec::decode_response(bytes, version).map(Response::DescribeGroups)
            }
            ApiKey::OffsetCommit => {
                OffsetCommitCodec::decode_response(bytes, version).map(Response::OffsetCommit)
            }
            other => Err(Error::UnsupportedApi(other)),
        }
    }
}

fn unexpected_response(expected: ApiKey, response: &Response) -> Error {
    Error::MissingData(format!(
        "expected {} response, got {}",
        expected.as_str(),
        response.api_key().as_str()
    ))
}

impl TryFrom<Response> for ListGroupsResponse {
    type Error = Error;

    fn try_from(response: Response) -> Result<Self> {
        match response {
            Response::ListGroups(r) => Ok(r),
            other => Err(unexpected_response(ApiKey::ListGroups, &other)),
        }
    }
}

impl TryFrom<Response> for DescribeGroupsResponse {
    type Error = Error;

    fn try_from(response: Response) -> Result<Self> {
        match response {
            Response::DescribeGroups(r) => Ok(r),
            other => Err(unexpected_response(ApiKey::DescribeGroups, &other)),
        }
    }
}

impl TryFrom<Response> for OffsetCommitResponse {
    type Error = Error;

    fn try_from(response: Response) -> Result<Self> {
        match response {
            Response::OffsetCommit(r) => Ok(r),
            other => Err(unexpected_response(ApiKey::OffsetCommit, &other)),
        }
    }
}

/// A decoded response with the correlation id it carried.
///
/// `api_version` is not on the wire; it is the version of the request this
/// response answers and selects the payload layout when re-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub correlation_id: CorrelationId,
    pub api_version: i16,
    pub response: Response,
}

impl ResponseEnvelope {
    pub fn new(
        correlation_id: impl Into<CorrelationId>,
        api_version: i16,
        response: impl Into<Response>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            api_version,
            response: response.into(),
        }
    }
}

impl From<ListGroupsResponse> for Response {
    fn from(response: ListGroupsResponse) -> Self {
        Response::ListGroups(response)
    }
}

impl From<DescribeGroupsResponse> for Response {
    fn from(response: DescribeGroupsResponse) -> Self {
        Response::DescribeGroups(response)
    }
}

impl From<OffsetCommitResponse> for Response {
    fn from(response: OffsetCommitResponse) -> Self {
        Response::OffsetCommit(response)
    }
}

impl ToByte for ResponseEnvelope {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.correlation_id.encode(buffer)?;
        self.response.write_payload(self.api_version, buffer)
    }

    fn encoded_len(&self) -> usize {
        RESPONSE_HEADER_LEN + self.response.payload_len(self.api_version)
    }
}

/// Decode one response frame body (size prefix removed).
///
/// The correlation id is read first; the rest of the span goes to the
/// payload decoder for `api_key`/`version` and must be consumed entirely.
pub fn decode_response(api_key: ApiKey, version: i16, bytes: Bytes) -> Result<ResponseEnvelope> {
    let (rest, correlation_id) = be_i32::<_, DecodeError>(NomBytes::new(bytes))?;
    trace!(
        api_key = api_key.as_str(),
        version,
        correlation_id,
        payload_len = rest.input_len(),
        "Decoding response envelope"
    );
    let response = Response::decode(api_key, version, rest.into_bytes())?;

    Ok(ResponseEnvelope {
        correlation_id: CorrelationId(correlation_id),
        api_version: version,
        response,
    })
}

// ============================================================================
// Framing
// ============================================================================

/// Prefix the encoding of `body` with its int32 size.
pub fn encode_frame<T: ToByte + ?Sized>(body: &T) -> Result<Bytes> {
    let len = body.encoded_len();
    let size = i32::try_from(len).map_err(|_| Error::MalformedLength(len as i64))?;

    let mut buffer = BytesMut::with_capacity(SIZE_PREFIX_LEN + len);
    size.encode(&mut buffer)?;
    body.encode(&mut buffer)?;
    Ok(buffer.freeze())
}

/// Split one complete frame off the front of `buffer`.
///
/// Returns `Ok(None)` until the whole frame has arrived; bytes of later
/// frames stay in `buffer`. Negative sizes and sizes above `max_size` are
/// rejected as [`Error::MalformedLength`] without waiting for the body.
pub fn parse_frame(buffer: &mut BytesMut, max_size: usize) -> Result<Option<Bytes>> {
    if buffer.len() < SIZE_PREFIX_LEN {
        return Ok(None);
    }

    let size = (&buffer[..SIZE_PREFIX_LEN]).get_i32();
    if size < 0 || size as usize > max_size {
        return Err(Error::MalformedLength(size as i64));
    }

    let size = size as usize;
    if buffer.len() < SIZE_PREFIX_LEN + size {
        return Ok(None);
    }

    buffer.advance(SIZE_PREFIX_LEN);
    Ok(Some(buffer.split_to(size).freeze()))
}
