//! In-memory camera used by unit tests.

use std::collections::HashMap;

use crate::models::Position;
use crate::visca::protocol::{Command, Inquiry, encode_nibbles};
use crate::visca::{LinkError, LinkResult, Transport};

const ACK_AND_COMPLETION: [u8; 6] = [0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF];
const NOT_EXECUTABLE: [u8; 4] = [0x90, 0x60, 0x41, 0xFF];

/// Something that happened on the simulated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Drain,
    Send(Vec<u8>),
}

/// Simulated camera answering VISCA commands from its own state.
pub(crate) struct ScriptedCamera {
    pub home: Position,
    pub position: Position,
    /// Stored presets.
    pub presets: HashMap<u8, Position>,
    /// Where the camera reports itself during the first pan/tilt inquiry after recalling a preset.
    pub transit: HashMap<u8, Position>,
    /// Upcoming pan/tilt inquiries that time out.
    pub fail_pan_tilt: usize,
    /// Upcoming pan/tilt inquiries answered with misframed bytes.
    pub garble_pan_tilt: usize,
    /// Answer preset saves with "Command not executable".
    pub reject_saves: bool,
    pub events: Vec<Event>,
    arrival: Option<Position>,
}

impl ScriptedCamera {
    pub fn new(home: Position) -> Self {
        Self {
            home,
            position: home,
            presets: HashMap::new(),
            transit: HashMap::new(),
            fail_pan_tilt: 0,
            garble_pan_tilt: 0,
            reject_saves: false,
            events: Vec::new(),
            arrival: None,
        }
    }

    pub fn with_preset(mut self, preset: u8, position: Position) -> Self {
        self.presets.insert(preset, position);
        self
    }

    /// Commands sent so far, as wire bytes.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Send(bytes) => Some(bytes.clone()),
                Event::Drain => None,
            })
            .collect()
    }

    pub fn sent_count(&self, command: &Command) -> usize {
        let wire = command.encode();
        self.sent().iter().filter(|bytes| **bytes == wire).count()
    }

    fn inquiry_reply(value: Option<u16>) -> LinkResult<Vec<u8>> {
        let value = value.ok_or(LinkError::Timeout)?;
        let mut reply = vec![0x90, 0x50];
        reply.extend_from_slice(&encode_nibbles(value));
        reply.push(0xFF);
        Ok(reply)
    }

    fn pan_tilt_reply(&mut self) -> LinkResult<Vec<u8>> {
        if self.fail_pan_tilt > 0 {
            self.fail_pan_tilt -= 1;
            return Err(LinkError::Timeout);
        }
        if self.garble_pan_tilt > 0 {
            self.garble_pan_tilt -= 1;
            return Ok(vec![0x90, 0x50, 0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF, 0x00, 0x00, 0xFF]);
        }

        let (pan, tilt) = match (self.position.pan, self.position.tilt) {
            (Some(pan), Some(tilt)) => (pan, tilt),
            _ => return Err(LinkError::Timeout),
        };
        let mut reply = vec![0x90, 0x50];
        reply.extend_from_slice(&encode_nibbles(pan));
        reply.extend_from_slice(&encode_nibbles(tilt));
        reply.push(0xFF);

        if let Some(target) = self.arrival.take() {
            self.position = target;
        }
        Ok(reply)
    }
}

impl Transport for ScriptedCamera {
    fn drain(&mut self) -> LinkResult<usize> {
        self.events.push(Event::Drain);
        Ok(0)
    }

    fn exchange(&mut self, command: &Command, _expected_len: usize) -> LinkResult<Vec<u8>> {
        self.events.push(Event::Send(command.encode()));

        match *command {
            Command::Home => {
                self.arrival = None;
                self.position = self.home;
            }
            Command::PresetRecall(n) => {
                self.arrival = None;
                if let Some(target) = self.presets.get(&n).copied() {
                    match self.transit.get(&n).copied() {
                        Some(moving) => {
                            self.position = moving;
                            self.arrival = Some(target);
                        }
                        None => self.position = target,
                    }
                }
            }
            Command::PresetSave(n) => {
                if self.reject_saves {
                    return Ok(NOT_EXECUTABLE.to_vec());
                }
                self.presets.insert(n, self.position);
            }
            Command::ZoomAbsolute(zoom) => self.position.zoom = Some(zoom),
            Command::PanTiltAbsolute { pan, tilt, .. } => {
                self.position.pan = Some(pan);
                self.position.tilt = Some(tilt);
            }
            Command::MaxPresetSpeed(_) | Command::PanTiltDrive { .. } => {}
            Command::Inquiry(Inquiry::PanTilt) => return self.pan_tilt_reply(),
            Command::Inquiry(Inquiry::Zoom) => return Self::inquiry_reply(self.position.zoom),
            Command::Inquiry(Inquiry::Focus) => return Self::inquiry_reply(self.position.focus),
        }

        Ok(ACK_AND_COMPLETION.to_vec())
    }
}
