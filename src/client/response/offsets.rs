//! OffsetCommit response. Versions 0 to 2 share one layout:
//! `[topic [partition error_code]]`.

use bytes::BufMut;
use nom::number::complete::{be_i16, be_i32};
use nombytes::NomBytes;

use crate::encode::ToByte;
use crate::error::{ErrorCode, Result};
use crate::parser::{PResult, parse_array, parse_string};
use crate::types::PartitionId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetCommitResponse {
    pub topics: Vec<OffsetCommitTopicResult>,
}

impl OffsetCommitResponse {
    /// Results for `topic`, in the order the broker sent them.
    pub fn partitions(&self, topic: &str) -> Option<&[OffsetCommitPartitionResult]> {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map(|t| t.partitions.as_slice())
    }

    /// Every partition whose commit failed, as `(topic, partition, code)`.
    pub fn errors(&self) -> impl Iterator<Item = (&str, PartitionId, ErrorCode)> {
        self.topics.iter().flat_map(|topic| {
            topic
                .partitions
                .iter()
                .filter(|p| !p.error_code.is_success())
                .map(move |p| (topic.name.as_str(), p.partition, p.error_code))
        })
    }

    /// `Ok(())` if every partition committed, otherwise the first failure.
    pub fn into_result(self) -> Result<()> {
        match self.errors().next() {
            Some((_, _, code)) => code.into_result(),
            None => Ok(()),
        }
    }
}

impl ToByte for OffsetCommitResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.topics.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.topics.encoded_len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitTopicResult {
    pub name: String,
    pub partitions: Vec<OffsetCommitPartitionResult>,
}

impl ToByte for OffsetCommitTopicResult {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        self.partitions.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.name.encoded_len() + self.partitions.encoded_len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCommitPartitionResult {
    pub partition: PartitionId,
    pub error_code: ErrorCode,
}

impl ToByte for OffsetCommitPartitionResult {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.partition.encode(buffer)?;
        self.error_code.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        4 + 2
    }
}

pub fn parse_offset_commit_response(s: NomBytes, _version: i16) -> PResult<OffsetCommitResponse> {
    let (s, topics) = parse_array(|s| {
        let (s, name) = parse_string(s)?;
        let (s, partitions) = parse_array(|s| {
            let (s, partition) = be_i32(s)?;
            let (s, error_code) = be_i16(s)?;
            Ok((
                s,
                OffsetCommitPartitionResult {
                    partition: PartitionId(partition),
                    error_code: ErrorCode::from_i16(error_code),
                },
            ))
        })(s)?;
        Ok((s, OffsetCommitTopicResult { name, partitions }))
    })(s)?;

    Ok((s, OffsetCommitResponse { topics }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, KafkaCode};
    use crate::parser::decode_exact;
    use bytes::Bytes;

    fn response() -> OffsetCommitResponse {
        OffsetCommitResponse {
            topics: vec![OffsetCommitTopicResult {
                name: "t".to_string(),
                partitions: vec![
                    OffsetCommitPartitionResult {
                        partition: PartitionId(0),
                        error_code: ErrorCode::NONE,
                    },
                    OffsetCommitPartitionResult {
                        partition: PartitionId(1),
                        error_code: ErrorCode::from_i16(22),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_parse_offset_commit_response() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&[0, 1, b't']);
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&4i32.to_be_bytes());
        data.extend_from_slice(&0i16.to_be_bytes());

        let parsed =
            decode_exact(Bytes::from(data), |s| parse_offset_commit_response(s, 2)).unwrap();
        let partitions = parsed.partitions("t").unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].partition, PartitionId(4));
        assert!(partitions[0].error_code.is_success());
        assert!(parsed.partitions("missing").is_none());
    }

    #[test]
    fn test_errors_lists_failed_partitions() {
        let response = response();
        let errors: Vec<_> = response.errors().collect();
        assert_eq!(
            errors,
            vec![(
                "t",
                PartitionId(1),
                ErrorCode::Known(KafkaCode::IllegalGeneration)
            )]
        );
    }

    #[test]
    fn test_into_result_reports_first_failure() {
        let err = response().into_result().unwrap_err();
        assert_eq!(
            err,
            Error::Broker(ErrorCode::Known(KafkaCode::IllegalGeneration))
        );
        assert!(OffsetCommitResponse::default().into_result().is_ok());
    }

    #[test]
    fn test_encoded_len_matches_bytes() {
        let response = response();
        let mut buf = Vec::new();
        response.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), response.encoded_len());
    }
}
