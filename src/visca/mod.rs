//! VISCA over IP camera client.
//!
//! Drives a PTZ camera over a raw TCP byte stream (default port 5678):
//! absolute pan/tilt/zoom moves, preset save/recall, and position inquiries.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use visca_presets::visca::{TcpLink, ViscaCamera};
//!
//! let link = TcpLink::open("192.168.1.100", 5678, Duration::from_secs(10))?;
//! let mut camera = ViscaCamera::new(link);
//! let position = camera.query_position(false);
//! ```

mod client;
mod error;
mod link;
mod motion;
mod position;
pub mod protocol;
pub mod types;


pub use client::{Timing, ViscaCamera};
pub use error::{ConnectError, DecodeError, LinkError, LinkResult};
pub use link::{LinkState, TcpLink, Transport};
pub use position::PAN_TILT_ATTEMPTS;
pub use protocol::{Command, DriveDirection, Inquiry, ReplyKind, classify};
