//! VISCA command encoding and reply decoding.
//!
//! Everything here is pure: no sockets, no sleeps.

use super::error::DecodeError;
use super::types::{
    CATEGORY_COMMAND, CATEGORY_INQUIRY, COMMAND_HEADER, GROUP_CAMERA, GROUP_PAN_TILTER, MEMORY_RECALL, MEMORY_SET,
    OP_FOCUS_DIRECT, OP_HOME, OP_MEMORY, OP_PAN_TILT_ABSOLUTE, OP_PAN_TILT_DRIVE, OP_PAN_TILT_POSITION,
    OP_ZOOM_DIRECT, PAN_TILT_REPLY_LEN, REPLY_ACK, REPLY_COMPLETION, REPLY_ERROR, REPLY_HEADER, TERMINATOR,
    ZOOM_REPLY_LEN, error_message,
};

/// Split a 16-bit value into four nibbles, most significant first.
pub fn encode_nibbles(value: u16) -> [u8; 4] {
    [
        ((value >> 12) & 0x0F) as u8,
        ((value >> 8) & 0x0F) as u8,
        ((value >> 4) & 0x0F) as u8,
        (value & 0x0F) as u8,
    ]
}

/// Rebuild a 16-bit value from four nibble bytes.
///
/// Every byte must be in `0x0..=0xF`; anything larger means the reply was
/// misframed and is rejected rather than masked.
pub fn decode_nibbles(bytes: [u8; 4]) -> Result<u16, DecodeError> {
    let mut value: u16 = 0;
    for (offset, byte) in bytes.into_iter().enumerate() {
        if byte > 0x0F {
            return Err(DecodeError::InvalidNibble { offset, value: byte });
        }
        value = (value << 4) | byte as u16;
    }
    Ok(value)
}

/// Inquiry targets supported by the position service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inquiry {
    PanTilt,
    Zoom,
    Focus,
}

/// Continuous pan/tilt drive direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Stop,
}

impl DriveDirection {
    /// Pan and tilt direction bytes.
    fn bytes(self) -> (u8, u8) {
        match self {
            Self::Up => (0x03, 0x01),
            Self::Down => (0x03, 0x02),
            Self::Left => (0x01, 0x03),
            Self::Right => (0x02, 0x03),
            Self::UpLeft => (0x01, 0x01),
            Self::UpRight => (0x02, 0x01),
            Self::DownLeft => (0x01, 0x02),
            Self::DownRight => (0x02, 0x02),
            Self::Stop => (0x03, 0x03),
        }
    }
}

/// A VISCA command addressed to camera 1.
///
/// Speeds and preset numbers are passed through untouched; range checks are
/// the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PanTiltAbsolute {
        pan: u16,
        tilt: u16,
        pan_speed: u8,
        tilt_speed: u8,
    },
    PanTiltDrive {
        pan_speed: u8,
        tilt_speed: u8,
        direction: DriveDirection,
    },
    ZoomAbsolute(u16),
    PresetSave(u8),
    PresetRecall(u8),
    Home,
    MaxPresetSpeed(u8),
    Inquiry(Inquiry),
}

impl Command {
    /// Encode to wire bytes: `81 <category> ... FF`.
    pub fn encode(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(15);
        packet.push(COMMAND_HEADER);

        match *self {
            Self::PanTiltAbsolute {
                pan,
                tilt,
                pan_speed,
                tilt_speed,
            } => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_PAN_TILTER, OP_PAN_TILT_ABSOLUTE]);
                packet.extend_from_slice(&[pan_speed, tilt_speed]);
                packet.extend_from_slice(&encode_nibbles(pan));
                packet.extend_from_slice(&encode_nibbles(tilt));
            }
            Self::PanTiltDrive {
                pan_speed,
                tilt_speed,
                direction,
            } => {
                let (pan_dir, tilt_dir) = direction.bytes();
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_PAN_TILTER, OP_PAN_TILT_DRIVE]);
                packet.extend_from_slice(&[pan_speed, tilt_speed, pan_dir, tilt_dir]);
            }
            Self::ZoomAbsolute(zoom) => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_CAMERA, OP_ZOOM_DIRECT]);
                packet.extend_from_slice(&encode_nibbles(zoom));
            }
            Self::PresetSave(preset) => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_CAMERA, OP_MEMORY, MEMORY_SET, preset]);
            }
            Self::PresetRecall(preset) => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_CAMERA, OP_MEMORY, MEMORY_RECALL, preset]);
            }
            Self::Home => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_PAN_TILTER, OP_HOME]);
            }
            Self::MaxPresetSpeed(speed) => {
                packet.extend_from_slice(&[CATEGORY_COMMAND, GROUP_PAN_TILTER, OP_PAN_TILT_DRIVE, speed]);
            }
            Self::Inquiry(Inquiry::PanTilt) => {
                packet.extend_from_slice(&[CATEGORY_INQUIRY, GROUP_PAN_TILTER, OP_PAN_TILT_POSITION]);
            }
            Self::Inquiry(Inquiry::Zoom) => {
                packet.extend_from_slice(&[CATEGORY_INQUIRY, GROUP_CAMERA, OP_ZOOM_DIRECT]);
            }
            Self::Inquiry(Inquiry::Focus) => {
                packet.extend_from_slice(&[CATEGORY_INQUIRY, GROUP_CAMERA, OP_FOCUS_DIRECT]);
            }
        }

        packet.push(TERMINATOR);
        packet
    }
}

/// Reply class, decided from the first two or three bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Ack { socket: u8 },
    Completion { socket: u8 },
    InquiryReply,
    Error { socket: u8, code: u8 },
    Malformed,
}

impl ReplyKind {
    /// Device error text, for `Error` replies only.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Error { code, .. } => Some(error_message(*code)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ack { socket } => write!(f, "ACK (socket {socket})"),
            Self::Completion { socket } => write!(f, "Completion (socket {socket})"),
            Self::InquiryReply => write!(f, "Inquiry reply"),
            Self::Error { code, .. } => write!(f, "Error: {}", error_message(*code)),
            Self::Malformed => write!(f, "Malformed reply"),
        }
    }
}

/// Classify a reply.
///
/// `90 50` is both "completion on socket 0" and the inquiry-reply header;
/// it counts as an inquiry reply only when payload bytes follow.
pub fn classify(reply: &[u8]) -> ReplyKind {
    if reply.len() < 2 || reply[0] != REPLY_HEADER {
        return ReplyKind::Malformed;
    }

    let kind = reply[1] & 0xF0;
    let socket = reply[1] & 0x0F;
    match kind {
        REPLY_ACK => ReplyKind::Ack { socket },
        REPLY_COMPLETION if socket == 0 && reply.len() > 3 => ReplyKind::InquiryReply,
        REPLY_COMPLETION => ReplyKind::Completion { socket },
        REPLY_ERROR if reply.len() >= 3 => ReplyKind::Error { socket, code: reply[2] },
        _ => ReplyKind::Malformed,
    }
}

/// Check that `reply` is an inquiry reply of at least `min_len` bytes.
fn expect_inquiry_reply(reply: &[u8], min_len: usize) -> Result<(), DecodeError> {
    if reply.len() < min_len {
        return Err(DecodeError::TooShort {
            expected: min_len,
            actual: reply.len(),
        });
    }
    if classify(reply) != ReplyKind::InquiryReply {
        return Err(DecodeError::UnexpectedReply(reply.to_vec()));
    }
    Ok(())
}

/// Decode the packed 16-bit field starting at `offset`.
fn field_at(reply: &[u8], offset: usize) -> Result<u16, DecodeError> {
    decode_nibbles([reply[offset], reply[offset + 1], reply[offset + 2], reply[offset + 3]]).map_err(|e| match e {
        DecodeError::InvalidNibble { offset: inner, value } => DecodeError::InvalidNibble {
            offset: offset + inner,
            value,
        },
        other => other,
    })
}

/// Decode a pan/tilt inquiry reply: `90 50 p p p p t t t t FF`.
pub fn decode_pan_tilt(reply: &[u8]) -> Result<(u16, u16), DecodeError> {
    expect_inquiry_reply(reply, PAN_TILT_REPLY_LEN)?;
    Ok((field_at(reply, 2)?, field_at(reply, 6)?))
}

/// Decode a single-field inquiry reply (zoom, focus): `90 50 v v v v FF`.
///
/// `min_len` below the 7 bytes such a reply needs is raised to 7.
pub fn decode_single(reply: &[u8], min_len: usize) -> Result<u16, DecodeError> {
    expect_inquiry_reply(reply, min_len.max(ZOOM_REPLY_LEN))?;
    field_at(reply, 2)
}

/// Format bytes as space separated hex, e.g. `81 01 06 04 FF`.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" ")
}
