//! OffsetCommit request.
//!
//! # Layout by version
//!
//! ```text
//! v0: group_id [topic [partition offset metadata]]
//! v1: group_id generation_id member_id [topic [partition offset timestamp metadata]]
//! v2: group_id generation_id member_id retention_time [topic [partition offset metadata]]
//! ```
//!
//! Topics and partitions are kept in ordered maps, so the encoded bytes are
//! sorted by topic name and then partition id and are identical across runs.

use bytes::BufMut;
use nom::number::complete::{be_i32, be_i64};
use nombytes::NomBytes;
use std::collections::BTreeMap;

use crate::constants::{DEFAULT_COMMIT_TIMESTAMP, DEFAULT_RETENTION_TIME_MS};
use crate::encode::{ToByte, encode_iter_as_array};
use crate::error::Result;
use crate::parser::{PResult, parse_array, parse_nullable_string, parse_string};
use crate::types::{GenerationId, Offset, PartitionId};

/// What to commit for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOffset {
    pub offset: Offset,
    /// Commit timestamp, only sent by version 1.
    pub timestamp: i64,
    pub metadata: Option<String>,
}

impl PartitionOffset {
    pub fn new(offset: i64, metadata: Option<String>) -> Self {
        Self {
            offset: Offset(offset),
            timestamp: DEFAULT_COMMIT_TIMESTAMP,
            metadata,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn encoded_len_versioned(&self, version: i16) -> usize {
        let timestamp = if version == 1 { 8 } else { 0 };
        4 + 8 + timestamp + self.metadata.encoded_len()
    }
}

/// Offsets to commit, by topic then partition.
pub type TopicOffsets = BTreeMap<String, BTreeMap<PartitionId, PartitionOffset>>;

/// OffsetCommit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitRequest {
    pub group_id: String,
    pub generation_id: GenerationId,
    pub member_id: String,
    /// Milliseconds the broker keeps the commit; -1 for the broker default.
    pub retention_time_ms: i64,
    pub topics: TopicOffsets,
}

impl OffsetCommitRequest {
    pub fn new(
        group_id: impl Into<String>,
        generation_id: impl Into<GenerationId>,
        member_id: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            generation_id: generation_id.into(),
            member_id: member_id.into(),
            retention_time_ms: DEFAULT_RETENTION_TIME_MS,
            topics: BTreeMap::new(),
        }
    }

    /// A commit made outside group management (generation -1, no member id).
    pub fn standalone(group_id: impl Into<String>) -> Self {
        Self::new(group_id, GenerationId::INVALID, "")
    }

    pub fn with_retention_time(mut self, retention_time_ms: i64) -> Self {
        self.retention_time_ms = retention_time_ms;
        self
    }

    /// Add one partition's offset. A later call for the same partition
    /// replaces the earlier one.
    pub fn commit(
        mut self,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        metadata: Option<String>,
    ) -> Self {
        self.insert(topic, partition, PartitionOffset::new(offset, metadata));
        self
    }

    pub fn insert(&mut self, topic: impl Into<String>, partition: i32, offset: PartitionOffset) {
        self.topics
            .entry(topic.into())
            .or_default()
            .insert(PartitionId(partition), offset);
    }

    pub fn partition(&self, topic: &str, partition: i32) -> Option<&PartitionOffset> {
        self.topics.get(topic)?.get(&PartitionId(partition))
    }

    pub fn encode_versioned<W: BufMut>(&self, buffer: &mut W, version: i16) -> Result<()> {
        self.group_id.encode(buffer)?;
        if version >= 1 {
            self.generation_id.encode(buffer)?;
            self.member_id.encode(buffer)?;
        }
        if version >= 2 {
            self.retention_time_ms.encode(buffer)?;
        }

        encode_iter_as_array(buffer, self.topics.iter(), |buffer, (topic, partitions)| {
            topic.encode(buffer)?;
            encode_iter_as_array(buffer, partitions.iter(), |buffer, (partition, commit)| {
                partition.encode(buffer)?;
                commit.offset.encode(buffer)?;
                if version == 1 {
                    commit.timestamp.encode(buffer)?;
                }
                commit.metadata.encode(buffer)
            })
        })
    }

    pub fn encoded_len_versioned(&self, version: i16) -> usize {
        let header = match version {
            0 => 0,
            1 => 4 + self.member_id.encoded_len(),
            _ => 4 + self.member_id.encoded_len() + 8,
        };
        let topics: usize = self
            .topics
            .iter()
            .map(|(topic, partitions)| {
                topic.encoded_len()
                    + 4
                    + partitions
                        .values()
                        .map(|p| p.encoded_len_versioned(version))
                        .sum::<usize>()
            })
            .sum();
        self.group_id.encoded_len() + header + 4 + topics
    }
}

pub fn parse_offset_commit_request(s: NomBytes, version: i16) -> PResult<OffsetCommitRequest> {
    let (s, group_id) = parse_string(s)?;

    let (s, generation_id, member_id) = if version >= 1 {
        let (s, generation_id) = be_i32(s)?;
        let (s, member_id) = parse_string(s)?;
        (s, GenerationId(generation_id), member_id)
    } else {
        (s, GenerationId::INVALID, String::new())
    };

    let (s, retention_time_ms) = if version >= 2 {
        be_i64(s)?
    } else {
        (s, DEFAULT_RETENTION_TIME_MS)
    };

    let (s, topics) = parse_array(|s| {
        let (s, topic) = parse_string(s)?;
        let (s, partitions) = parse_array(|s| parse_partition_offset(s, version))(s)?;
        Ok((s, (topic, partitions)))
    })(s)?;

    let mut request = OffsetCommitRequest {
        group_id,
        generation_id,
        member_id,
        retention_time_ms,
        topics: BTreeMap::new(),
    };
    // Repeated topics or partitions on the wire: the last one wins.
    for (topic, partitions) in topics {
        // A topic with no partitions is still a topic.
        request.topics.entry(topic.clone()).or_default();
        for (partition, offset) in partitions {
            request.insert(topic.clone(), partition.value(), offset);
        }
    }

    Ok((s, request))
}

fn parse_partition_offset(s: NomBytes, version: i16) -> PResult<(PartitionId, PartitionOffset)> {
    let (s, partition) = be_i32(s)?;
    let (s, offset) = be_i64(s)?;
    let (s, timestamp) = if version == 1 {
        be_i64(s)?
    } else {
        (s, DEFAULT_COMMIT_TIMESTAMP)
    };
    let (s, metadata) = parse_nullable_string(s)?;

    Ok((
        s,
        (
            PartitionId(partition),
            PartitionOffset {
                offset: Offset(offset),
                timestamp,
                metadata,
            },
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode_exact;
    use bytes::Bytes;

    fn encode(request: &OffsetCommitRequest, version: i16) -> Bytes {
        let mut buf = Vec::new();
        request.encode_versioned(&mut buf, version).unwrap();
        assert_eq!(buf.len(), request.encoded_len_versioned(version));
        Bytes::from(buf)
    }

    #[test]
    fn test_v2_layout() {
        let request = OffsetCommitRequest::new("g", 3, "m")
            .with_retention_time(1000)
            .commit("t", 0, 42, None);
        let bytes = encode(&request, 2);

        let expected: Vec<u8> = [
            &[0, 1, b'g'][..],              // group_id
            &[0, 0, 0, 3],                  // generation_id
            &[0, 1, b'm'],                  // member_id
            &1000i64.to_be_bytes(),         // retention_time
            &[0, 0, 0, 1],                  // 1 topic
            &[0, 1, b't'],                  // topic name
            &[0, 0, 0, 1],                  // 1 partition
            &[0, 0, 0, 0],                  // partition 0
            &42i64.to_be_bytes(),           // offset
            &[0xFF, 0xFF],                  // null metadata
        ]
        .concat();
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_v0_omits_group_fields() {
        let request = OffsetCommitRequest::new("g", 3, "m").commit("t", 1, 7, Some("x".into()));
        let bytes = encode(&request, 0);
        // group(3) + count(4) + topic(3) + count(4) + partition(4) + offset(8) + metadata(3)
        assert_eq!(bytes.len(), 29);

        let parsed = decode_exact(bytes, |s| parse_offset_commit_request(s, 0)).unwrap();
        assert_eq!(parsed.generation_id, GenerationId::INVALID);
        assert_eq!(parsed.member_id, "");
        assert_eq!(
            parsed.partition("t", 1),
            Some(&PartitionOffset::new(7, Some("x".to_string())))
        );
    }

    #[test]
    fn test_v1_carries_timestamp() {
        let mut request = OffsetCommitRequest::new("g", 1, "m");
        request.insert("t", 0, PartitionOffset::new(5, None).with_timestamp(1_700_000_000_000));
        let bytes = encode(&request, 1);

        let parsed = decode_exact(bytes, |s| parse_offset_commit_request(s, 1)).unwrap();
        assert_eq!(parsed.partition("t", 0).unwrap().timestamp, 1_700_000_000_000);
        assert_eq!(parsed.retention_time_ms, DEFAULT_RETENTION_TIME_MS);
    }

    #[test]
    fn test_encoding_is_sorted() {
        let request = OffsetCommitRequest::standalone("g")
            .commit("b", 9, 1, None)
            .commit("a", 9, 1, None)
            .commit("a", 2, 1, None);
        let bytes = encode(&request, 2);

        // group(3) + generation(4) + member(2) + retention(8) + topic count(4)
        let topics = &bytes[21..];
        assert_eq!(&topics[..3], &[0, 1, b'a']);
        assert_eq!(&topics[3..7], &[0, 0, 0, 2]);
        // partition, offset(8), null metadata(2)
        assert_eq!(&topics[7..11], &[0, 0, 0, 2]);
        assert_eq!(&topics[21..25], &[0, 0, 0, 9]);
        assert_eq!(&topics[35..38], &[0, 1, b'b']);
    }

    #[test]
    fn test_topic_without_partitions_survives() {
        let mut request = OffsetCommitRequest::standalone("g").commit("a", 0, 1, None);
        request.topics.insert("empty".to_string(), BTreeMap::new());

        let parsed = decode_exact(encode(&request, 2), |s| parse_offset_commit_request(s, 2)).unwrap();
        assert_eq!(parsed, request);
        assert!(parsed.topics["empty"].is_empty());
    }

    #[test]
    fn test_commit_replaces_same_partition() {
        let request = OffsetCommitRequest::standalone("g")
            .commit("t", 0, 1, None)
            .commit("t", 0, 2, None);
        assert_eq!(request.topics["t"].len(), 1);
        assert_eq!(request.partition("t", 0).unwrap().offset, Offset(2));
    }
}
