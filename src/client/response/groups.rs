//! Consumer group inspection responses: ListGroups and DescribeGroups.

use bytes::{BufMut, Bytes};
use nom::number::complete::be_i16;
use nombytes::NomBytes;
use std::collections::BTreeMap;

use crate::encode::{ToByte, encode_iter_as_array};
use crate::error::{ErrorCode, Result};
use crate::parser::{PResult, parse_array, parse_bytes, parse_string};
use crate::types::{GroupProtocol, GroupState};

// ============================================================================
// ListGroups
// ============================================================================

/// ListGroups response.
///
/// Groups are exposed as a map from group id to protocol type. When the
/// broker lists the same id twice, the later entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListGroupsResponse {
    pub error_code: ErrorCode,
    groups: BTreeMap<String, String>,
}

impl ListGroupsResponse {
    pub fn new(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            groups: BTreeMap::new(),
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>, protocol_type: impl Into<String>) -> Self {
        self.groups.insert(group_id.into(), protocol_type.into());
        self
    }

    /// Group id to protocol type.
    pub fn groups(&self) -> &BTreeMap<String, String> {
        &self.groups
    }

    pub fn protocol_type(&self, group_id: &str) -> Option<&str> {
        self.groups.get(group_id).map(String::as_str)
    }
}

impl ToByte for ListGroupsResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.error_code.encode(buffer)?;
        encode_iter_as_array(buffer, self.groups.iter(), |buffer, (group_id, protocol_type)| {
            group_id.encode(buffer)?;
            protocol_type.encode(buffer)
        })
    }

    fn encoded_len(&self) -> usize {
        2 + 4
            + self
                .groups
                .iter()
                .map(|(id, protocol)| id.encoded_len() + protocol.encoded_len())
                .sum::<usize>()
    }
}

pub fn parse_list_groups_response(s: NomBytes, _version: i16) -> PResult<ListGroupsResponse> {
    let (s, error_code) = be_i16(s)?;
    let (s, listed) = parse_array(|s| {
        let (s, group_id) = parse_string(s)?;
        let (s, protocol_type) = parse_string(s)?;
        Ok((s, (group_id, protocol_type)))
    })(s)?;

    Ok((
        s,
        ListGroupsResponse {
            error_code: ErrorCode::from_i16(error_code),
            groups: listed.into_iter().collect(),
        },
    ))
}

// ============================================================================
// DescribeGroups
// ============================================================================

/// DescribeGroups response: one entry per requested group, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeGroupsResponse {
    pub groups: Vec<DescribedGroup>,
}

impl DescribeGroupsResponse {
    pub fn group(&self, group_id: &str) -> Option<&DescribedGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }
}

impl ToByte for DescribeGroupsResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.groups.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.groups.encoded_len()
    }
}

/// One group's description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedGroup {
    pub error_code: ErrorCode,
    pub group_id: String,
    pub state: GroupState,
    pub protocol_type: GroupProtocol,
    /// Name of the agreed protocol, e.g. the assignment strategy for consumers.
    pub protocol: String,
    pub members: Vec<GroupMember>,
}

impl DescribedGroup {
    /// An error entry for a group the coordinator could not describe.
    pub fn error(group_id: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            error_code,
            group_id: group_id.into(),
            state: GroupState::Unknown(String::new()),
            protocol_type: GroupProtocol::Custom(String::new()),
            protocol: String::new(),
            members: vec![],
        }
    }

    pub fn member(&self, member_id: &str) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.member_id == member_id)
    }
}

impl ToByte for DescribedGroup {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.error_code.encode(buffer)?;
        self.group_id.encode(buffer)?;
        self.state.encode(buffer)?;
        self.protocol_type.encode(buffer)?;
        self.protocol.encode(buffer)?;
        self.members.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.error_code.encoded_len()
            + self.group_id.encoded_len()
            + self.state.encoded_len()
            + self.protocol_type.encoded_len()
            + self.protocol.encoded_len()
            + self.members.encoded_len()
    }
}

/// A member of a described group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMember {
    pub member_id: String,
    pub client_id: String,
    pub client_host: String,
    /// Opaque protocol metadata supplied when the member joined.
    pub metadata: Bytes,
    /// Opaque assignment handed out by the group leader.
    pub assignment: Bytes,
}

impl ToByte for GroupMember {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.member_id.encode(buffer)?;
        self.client_id.encode(buffer)?;
        self.client_host.encode(buffer)?;
        self.metadata.encode(buffer)?;
        self.assignment.encode(buffer)
    }

    fn encoded_len(&self) -> usize {
        self.member_id.encoded_len()
            + self.client_id.encoded_len()
            + self.client_host.encoded_len()
            + self.metadata.encoded_len()
            + self.assignment.encoded_len()
    }
}

pub fn parse_describe_groups_response(
    s: NomBytes,
    _version: i16,
) -> PResult<DescribeGroupsResponse> {
    let (s, groups) = parse_array(parse_described_group)(s)?;
    Ok((s, DescribeGroupsResponse { groups }))
}

fn parse_described_group(s: NomBytes) -> PResult<DescribedGroup> {
    let (s, error_code) = be_i16(s)?;
    let (s, group_id) = parse_string(s)?;
    let (s, state) = parse_string(s)?;
    let (s, protocol_type) = parse_string(s)?;
    let (s, protocol) = parse_string(s)?;
    let (s, members) = parse_array(parse_group_member)(s)?;

    Ok((
        s,
        DescribedGroup {
            error_code: ErrorCode::from_i16(error_code),
            group_id,
            state: GroupState::from_name(state),
            protocol_type: GroupProtocol::from_name(protocol_type),
            protocol,
            members,
        },
    ))
}

fn parse_group_member(s: NomBytes) -> PResult<GroupMember> {
    let (s, member_id) = parse_string(s)?;
    let (s, client_id) = parse_string(s)?;
    let (s, client_host) = parse_string(s)?;
    let (s, metadata) = parse_bytes(s)?;
    let (s, assignment) = parse_bytes(s)?;

    Ok((
        s,
        GroupMember {
            member_id,
            client_id,
            client_host,
            metadata,
            assignment,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KafkaCode;
    use crate::parser::decode_exact;

    fn build_string(s: &str, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(s.len() as i16).to_be_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    #[test]
    fn test_parse_list_groups_last_wins() {
        let mut data = Vec::new();
        data.extend_from_slice(&0i16.to_be_bytes());
        data.extend_from_slice(&3i32.to_be_bytes());
        build_string("g1", &mut data);
        build_string("consumer", &mut data);
        build_string("g2", &mut data);
        build_string("connect", &mut data);
        build_string("g1", &mut data);
        build_string("other", &mut data);

        let response =
            decode_exact(Bytes::from(data), |s| parse_list_groups_response(s, 0)).unwrap();
        assert!(response.error_code.is_success());
        assert_eq!(response.groups().len(), 2);
        assert_eq!(response.protocol_type("g1"), Some("other"));
        assert_eq!(response.protocol_type("g2"), Some("connect"));
    }

    #[test]
    fn test_list_groups_error_code_preserved() {
        let mut data = Vec::new();
        data.extend_from_slice(&15i16.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());

        let response =
            decode_exact(Bytes::from(data), |s| parse_list_groups_response(s, 0)).unwrap();
        assert_eq!(
            response.error_code,
            ErrorCode::Known(KafkaCode::GroupCoordinatorNotAvailable)
        );
        assert!(response.groups().is_empty());
    }

    #[test]
    fn test_parse_described_group() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_be_bytes());
        data.extend_from_slice(&0i16.to_be_bytes());
        build_string("orders", &mut data);
        build_string("Stable", &mut data);
        build_string("consumer", &mut data);
        build_string("roundrobin", &mut data);
        data.extend_from_slice(&1i32.to_be_bytes());
        build_string("m-1", &mut data);
        build_string("svc", &mut data);
        build_string("/10.0.0.1", &mut data);
        data.extend_from_slice(&2i32.to_be_bytes());
        data.extend_from_slice(&[0xAA, 0xBB]);
        data.extend_from_slice(&(-1i32).to_be_bytes());

        let response =
            decode_exact(Bytes::from(data), |s| parse_describe_groups_response(s, 0)).unwrap();
        let group = response.group("orders").unwrap();
        assert!(group.state.is_stable());
        assert_eq!(group.protocol_type, GroupProtocol::Consumer);
        assert_eq!(group.protocol, "roundrobin");

        let member = group.member("m-1").unwrap();
        assert_eq!(member.client_host, "/10.0.0.1");
        assert_eq!(member.metadata.as_ref(), &[0xAA, 0xBB]);
        // A null assignment is read as empty.
        assert!(member.assignment.is_empty());
    }

    #[test]
    fn test_error_group_has_no_members() {
        let group = DescribedGroup::error("g", ErrorCode::from_i16(16));
        assert!(group.members.is_empty());
        assert!(!group.state.is_stable());
        assert!(group.error_code.is_retriable());
    }
}
