//! Camera position model.

use serde::{Deserialize, Serialize};

/// Raw encoder position of a camera.
///
/// Every field is optional: inquiries can fail individually and a partial
/// position is still a valid result. Stored as 4-digit uppercase hex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex16")]
    pub pan: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex16")]
    pub tilt: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex16")]
    pub zoom: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex16")]
    pub focus: Option<u16>,
}

impl Position {
    /// Position with pan, tilt and zoom set.
    pub fn new(pan: u16, tilt: u16, zoom: u16) -> Self {
        Self {
            pan: Some(pan),
            tilt: Some(tilt),
            zoom: Some(zoom),
            focus: None,
        }
    }

    pub fn with_focus(mut self, focus: u16) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Whether both pan and tilt were captured.
    pub fn has_pan_tilt(&self) -> bool {
        self.pan.is_some() && self.tilt.is_some()
    }

    /// Pan, tilt and zoom, if all three are present.
    pub fn restorable(&self) -> Option<(u16, u16, u16)> {
        Some((self.pan?, self.tilt?, self.zoom?))
    }

    /// Names of the fields restore needs but this position lacks.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pan.is_none() {
            missing.push("pan");
        }
        if self.tilt.is_none() {
            missing.push("tilt");
        }
        if self.zoom.is_none() {
            missing.push("zoom");
        }
        missing
    }
}

fn fmt_field(value: Option<u16>) -> String {
    value.map(|v| format!("{v:04X}")).unwrap_or_else(|| "----".to_string())
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pan={} tilt={} zoom={}",
            fmt_field(self.pan),
            fmt_field(self.tilt),
            fmt_field(self.zoom)
        )?;
        if let Some(focus) = self.focus {
            write!(f, " focus={focus:04X}")?;
        }
        Ok(())
    }
}

/// Serde adapter for `Option<u16>` as a hex string.
mod hex16 {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Option<u16>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format!("{v:04X}")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            let s = s.trim();
            if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(de::Error::custom(format!("expected 1-4 hex digits, got {s:?}")));
            }
            u16::from_str_radix(s, 16).map_err(|e| de::Error::custom(format!("invalid hex {s:?}: {e}")))
        })
        .transpose()
    }
}
