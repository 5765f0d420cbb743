//! VISCA protocol constants.

// Framing
pub const COMMAND_HEADER: u8 = 0x81; // camera address 1
pub const REPLY_HEADER: u8 = 0x90;
pub const TERMINATOR: u8 = 0xFF;

// Message categories (second command byte)
pub(crate) const CATEGORY_COMMAND: u8 = 0x01;
pub(crate) const CATEGORY_INQUIRY: u8 = 0x09;

// Command groups
pub(crate) const GROUP_CAMERA: u8 = 0x04;
pub(crate) const GROUP_PAN_TILTER: u8 = 0x06;

// Opcodes
pub(crate) const OP_PAN_TILT_DRIVE: u8 = 0x01;
pub(crate) const OP_PAN_TILT_ABSOLUTE: u8 = 0x02;
pub(crate) const OP_HOME: u8 = 0x04;
pub(crate) const OP_PAN_TILT_POSITION: u8 = 0x12;
pub(crate) const OP_MEMORY: u8 = 0x3F;
pub(crate) const OP_ZOOM_DIRECT: u8 = 0x47;
pub(crate) const OP_FOCUS_DIRECT: u8 = 0x48;

// Memory (preset) sub-operations
pub(crate) const MEMORY_SET: u8 = 0x01;
pub(crate) const MEMORY_RECALL: u8 = 0x02;

/// Highest preset number the device accepts.
pub const PRESET_MAX: u8 = 254;

/// Preset speed applied before a capture (0x18, the device maximum).
pub const MAX_PRESET_SPEED: u8 = 0x18;

/// Fastest pan speed accepted by the device.
pub const PAN_SPEED_MAX: u8 = 0x18;
/// Fastest tilt speed accepted by the device.
pub const TILT_SPEED_MAX: u8 = 0x14;

// Reply type nibbles (high nibble of the second reply byte)
pub(crate) const REPLY_ACK: u8 = 0x40;
pub(crate) const REPLY_COMPLETION: u8 = 0x50;
pub(crate) const REPLY_ERROR: u8 = 0x60;

// Minimum reply lengths for inquiries
pub const PAN_TILT_REPLY_LEN: usize = 11;
pub const ZOOM_REPLY_LEN: usize = 7;
pub const FOCUS_REPLY_LEN: usize = 7;

/// Reply buffer size used for a single read.
pub(crate) const RECV_BUFFER_SIZE: usize = 16;

/// Default VISCA over IP TCP port.
pub const DEFAULT_PORT: u16 = 5678;

/// Human readable message for a device error code.
pub fn error_message(code: u8) -> String {
    match code {
        0x02 => "Syntax error".to_string(),
        0x03 => "Command buffer full".to_string(),
        0x04 => "Command cancelled".to_string(),
        0x05 => "No socket".to_string(),
        0x41 => "Command not executable".to_string(),
        other => format!("Unknown error: {other:02X}"),
    }
}
