//! Frame codec for stream transports.
//!
//! Frame format: `[length:4][checksum:4][payload:N]`
//!
//! - **length**: Total frame size including header (little-endian u32)
//! - **checksum**: CRC32C of the payload for integrity verification
//! - **payload**: Opaque application data

use thiserror::Error;

/// Header size: 4 (length) + 4 (checksum) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Maximum payload size (1MB).
///
/// Frames larger than this are rejected to prevent memory exhaustion.
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Frame codec error types.
#[derive(Debug, Clone, Error)]
pub enum WireError {
    /// Checksum verification failed - data was corrupted.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Expected checksum from the header.
        expected: u32,
        /// Computed checksum from the payload.
        actual: u32,
    },

    /// Payload exceeds the maximum allowed size.
    #[error("frame too large: {size} bytes (max {MAX_PAYLOAD_SIZE})")]
    FrameTooLarge {
        /// Actual payload size in bytes.
        size: usize,
    },

    /// Length field has an invalid value.
    #[error("invalid frame length: {length}")]
    InvalidLength {
        /// The invalid length value from the header.
        length: u32,
    },
}

/// Serialize a payload into a complete frame.
///
/// # Errors
///
/// Returns `FrameTooLarge` if the payload exceeds [`MAX_PAYLOAD_SIZE`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, WireError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(WireError::FrameTooLarge {
            size: payload.len(),
        });
    }

    let length = (HEADER_SIZE + payload.len()) as u32;
    let checksum = crc32c::crc32c(payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Try to parse one frame from the front of `buf`.
///
/// Returns `Ok(Some((payload, consumed)))` when a complete frame is
/// available, `Ok(None)` when more data is needed.
///
/// # Errors
///
/// Returns `InvalidLength`, `FrameTooLarge`, or `ChecksumMismatch` on a
/// malformed frame; the stream should be torn down, since resynchronizing
/// within corrupted framing is not possible.
pub fn try_decode_frame(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, WireError> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let length = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if length < HEADER_SIZE {
        return Err(WireError::InvalidLength {
            length: length as u32,
        });
    }
    let payload_len = length - HEADER_SIZE;
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(WireError::FrameTooLarge { size: payload_len });
    }
    if buf.len() < length {
        return Ok(None);
    }

    let expected = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let payload = &buf[HEADER_SIZE..length];
    let actual = crc32c::crc32c(payload);
    if expected != actual {
        return Err(WireError::ChecksumMismatch { expected, actual });
    }

    Ok(Some((payload.to_vec(), length)))
}
