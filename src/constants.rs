//! Centralized protocol and configuration constants.
//!
//! # Categories
//!
//! - **Protocol Constants**: null sentinels, array limits, message layout
//! - **Client Constants**: defaults used by [`crate::config::ClientConfig`]

// =============================================================================
// Protocol Constants (Kafka Wire Protocol)
// =============================================================================

/// Length prefix of a null BYTES field (int32).
pub const NULL_LENGTH: i32 = -1;

/// Length prefix of a null STRING field (int16).
pub const NULL_STRING_LENGTH: i16 = -1;

/// Maximum number of elements accepted in a protocol array.
///
/// A count above this is treated as a corrupt length rather than an
/// allocation request.
pub const MAX_PROTOCOL_ARRAY_SIZE: i32 = 100_000;

/// Size of the int32 length prefix in front of every frame and message set.
pub const SIZE_PREFIX_LEN: usize = 4;

// -----------------------------------------------------------------------------
// Message (v0) layout
// -----------------------------------------------------------------------------
// crc (4) | magic (1) | attributes (1) | key (4 + n) | value (4 + n)

/// Magic byte of the original message format.
pub const MESSAGE_MAGIC_V0: i8 = 0;

/// Bytes in front of the CRC-covered region: the crc itself.
pub const MESSAGE_CRC_LEN: usize = 4;

/// Smallest possible message: crc, magic, attributes and two null blobs.
pub const MIN_MESSAGE_SIZE: usize = MESSAGE_CRC_LEN + 1 + 1 + 4 + 4;

/// Low bits of the attributes byte that carry the compression codec.
pub const COMPRESSION_CODEC_MASK: i8 = 0x07;

/// Per-item overhead inside a message set: offset (8) + message size (4).
pub const MESSAGE_SET_ITEM_OVERHEAD: usize = 8 + 4;

// -----------------------------------------------------------------------------
// Request/response header layout
// -----------------------------------------------------------------------------

/// apiKey (2) + apiVersion (2) + correlationId (4), before the client id.
pub const REQUEST_HEADER_FIXED_LEN: usize = 2 + 2 + 4;

/// correlationId (4) in front of every response payload.
pub const RESPONSE_HEADER_LEN: usize = 4;

// -----------------------------------------------------------------------------
// Consumer group conventions
// -----------------------------------------------------------------------------

/// Protocol type string used by the standard consumer.
pub const CONSUMER_PROTOCOL_TYPE: &str = "consumer";

/// OffsetCommit v2 retention time that defers to the broker default.
pub const DEFAULT_RETENTION_TIME_MS: i64 = -1;

/// OffsetCommit v1 per-partition timestamp that lets the broker assign one.
pub const DEFAULT_COMMIT_TIMESTAMP: i64 = -1;

// =============================================================================
// Client Constants
// =============================================================================

/// Default maximum size of a single response frame (100 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Client id sent when none is configured.
pub const DEFAULT_CLIENT_ID: &str = "kafkaesque-client";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinels_are_minus_one() {
        assert_eq!(NULL_LENGTH, -1);
        assert_eq!(NULL_STRING_LENGTH, -1);
    }

    #[test]
    fn test_message_layout_sizes() {
        assert_eq!(MIN_MESSAGE_SIZE, 14);
        assert_eq!(MESSAGE_SET_ITEM_OVERHEAD, 12);
        assert_eq!(REQUEST_HEADER_FIXED_LEN, 8);
    }
}
