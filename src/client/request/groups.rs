//! Consumer group inspection requests: ListGroups and DescribeGroups.

use bytes::BufMut;
use nombytes::NomBytes;

use crate::encode::ToByte;
use crate::error::Result;
use crate::parser::{PResult, parse_array, parse_string};

// ============================================================================
// ListGroups
// ============================================================================

/// ListGroups request. Version 0 has no body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListGroupsRequest;

impl ToByte for ListGroupsRequest {
    fn encode<W: BufMut>(&self, _buffer: &mut W) -> Result<()> {
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        0
    }
}

pub fn parse_list_groups_request(s: NomBytes, _version: i16) -> PResult<ListGroupsRequest> {
    Ok((s, ListGroupsRequest))
}

// ============================================================================
// DescribeGroups
// ============================================================================

/// DescribeGroups request for one or more groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeGroupsRequest {
    pub group_ids: Vec<String>,
}

impl DescribeGroupsRequest {
    pub fn new<I, S>(group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_ids: group_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(group_id: impl Into<String>) -> Self {
        Self {
            group_ids: vec![group_id.into()],
        }
    }
}

impl ToByte for DescribeGroupsRequest {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.group_ids.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.group_ids.encoded_len()
    }
}

pub fn parse_describe_groups_request(
    s: NomBytes,
    _version: i16,
) -> PResult<DescribeGroupsRequest> {
    let (s, group_ids) = parse_array(parse_string)(s)?;
    Ok((s, DescribeGroupsRequest { group_ids }))
}
