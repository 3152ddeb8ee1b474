//! Client side of the protocol: payloads, codecs, envelopes and a session
//! that pairs requests with responses.
//!
//! The crate never owns a socket. A [`Transport`] moves whole frames; the
//! [`Session`] stamps headers, assigns correlation ids and decodes replies.
//!
//! ```rust
//! use bytes::Bytes;
//! use kafkaesque_client::client::{ListGroupsResponse, ResponseEnvelope, Session, Transport};
//! use kafkaesque_client::config::ClientConfig;
//! use kafkaesque_client::error::ErrorCode;
//! use kafkaesque_client::encode::to_bytes;
//! use std::io;
//!
//! /// Answers every request with one canned ListGroups response.
//! struct Canned(Option<Bytes>);
//!
//! impl Transport for Canned {
//!     fn send(&mut self, _frame: Bytes) -> io::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn receive(&mut self) -> io::Result<Bytes> {
//!         self.0.take().ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
//!     }
//! }
//!
//! let reply = ListGroupsResponse::new(ErrorCode::NONE).with_group("g1", "consumer");
//! let body = to_bytes(&ResponseEnvelope::new(0, 0, reply)).unwrap();
//!
//! let mut session = Session::new(Canned(Some(body)), ClientConfig::default()).unwrap();
//! let groups = session.list_groups().unwrap();
//! assert_eq!(groups.protocol_type("g1"), Some("consumer"));
//! ```

pub mod codec;
mod envelope;
mod request;
mod response;

pub use envelope::{
    ApiKey, Request, RequestEnvelope, RequestHeader, Response, ResponseEnvelope, decode_response,
    encode_frame, parse_frame, parse_request_header,
};
pub use request::*;
pub use response::*;

use bytes::Bytes;
use std::io;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::CorrelationId;

/// Moves whole frames to and from a broker.
///
/// `send` receives a complete size-prefixed request frame. `receive` must
/// return exactly one response frame body, with the int32 size prefix
/// already removed.
pub trait Transport {
    fn send(&mut self, frame: Bytes) -> io::Result<()>;

    fn receive(&mut self) -> io::Result<Bytes>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: Bytes) -> io::Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> io::Result<Bytes> {
        (**self).receive()
    }
}

/// One request in flight at a time over a [`Transport`].
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    config: ClientConfig,
    next_correlation_id: CorrelationId,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| Error::Config(errors.join("; ")))?;

        Ok(Self {
            transport,
            config,
            next_correlation_id: CorrelationId::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The id the next request will carry.
    pub fn next_correlation_id(&self) -> CorrelationId {
        self.next_correlation_id
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send `request` at its default version and wait for the answer.
    pub fn send(&mut self, request: impl Into<Request>) -> Result<Response> {
        let request = request.into();
        let version = request.default_version();
        self.send_versioned(request, version)
    }

    /// Send `request` at `version` and wait for the answer.
    ///
    /// Fails with [`Error::CorrelationMismatch`] if the reply carries a
    /// different correlation id. Broker error codes inside the reply are
    /// returned as data, not as errors.
    pub fn send_versioned(&mut self, request: impl Into<Request>, version: i16) -> Result<Response> {
        let correlation_id = self.next_correlation_id;
        let envelope = RequestEnvelope::new(correlation_id, self.config.client_id.clone(), request)
            .with_version(version);
        let api_key = envelope.api_key();
        let frame = encode_frame(&envelope)?;
        // Only requests that reach the transport consume an id.
        self.next_correlation_id = correlation_id.next();

        debug!(
            api_key = api_key.as_str(),
            version,
            correlation_id = %correlation_id,
            len = frame.len(),
            "Sending request"
        );
        self.transport.send(frame)?;

        let body = self.transport.receive()?;
        if body.len() > self.config.max_message_size {
            return Err(Error::MalformedLength(body.len() as i64));
        }
        debug!(
            api_key = api_key.as_str(),
            correlation_id = %correlation_id,
            len = body.len(),
            "Received response"
        );

        let reply = decode_response(api_key, version, body)?;
        if reply.correlation_id != correlation_id {
            warn!(
                expected = %correlation_id,
                actual = %reply.correlation_id,
                "Response correlation id mismatch"
            );
            return Err(Error::CorrelationMismatch {
                expected: correlation_id.value(),
                actual: reply.correlation_id.value(),
            });
        }

        Ok(reply.response)
    }

    pub fn list_groups(&mut self) -> Result<ListGroupsResponse> {
        self.send(ListGroupsRequest)?.try_into()
    }

    pub fn describe_groups<I, S>(&mut self, group_ids: I) -> Result<DescribeGroupsResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(DescribeGroupsRequest::new(group_ids))?.try_into()
    }

    pub fn commit_offsets(&mut self, request: OffsetCommitRequest) -> Result<OffsetCommitResponse> {
        self.send(request)?.try_into()
    }
}
