//! Preset numbering rules and the saved-position table.

use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::position::Position;
use crate::error::{AppError, Result};
use crate::visca::types::PRESET_MAX;

const KEY_PREFIX: &str = "preset_";

/// Presets 90-99 trigger camera functions (home, OSD) rather than positions.
pub fn is_reserved(preset: i32) -> bool {
    (90..=99).contains(&preset)
}

/// Presets a user may store positions in: 1-89, 100-149, 152-254.
pub fn is_assignable(preset: i32) -> bool {
    (1..=89).contains(&preset) || (100..=149).contains(&preset) || (152..=254).contains(&preset)
}

/// Check that `preset` fits the wire byte (0-254).
pub fn validate_preset(preset: i32) -> Result<u8> {
    match u8::try_from(preset) {
        Ok(n) if n <= PRESET_MAX => Ok(n),
        _ => Err(AppError::validation(format!(
            "Invalid preset number: {preset} (must be 0-{PRESET_MAX})"
        ))),
    }
}

/// Table key for a preset, e.g. `preset_12`.
pub fn preset_key(preset: i32) -> String {
    format!("{KEY_PREFIX}{preset}")
}

/// Parse a `preset_<n>` key.
pub fn parse_preset_key(key: &str) -> Result<i32> {
    key.strip_prefix(KEY_PREFIX)
        .and_then(|n| n.parse::<i32>().ok())
        .ok_or_else(|| AppError::parse(format!("Invalid preset key: {key:?}")))
}

/// Captured positions keyed by preset number, in insertion order.
///
/// Serialized as a JSON object keyed `preset_<n>`. Preset numbers are not
/// range-checked on load; restore rejects bad ones before touching the camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetTable {
    entries: Vec<(i32, Position)>,
}

impl PresetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original place.
    pub fn insert(&mut self, preset: i32, position: Position) {
        match self.entries.iter_mut().find(|(n, _)| *n == preset) {
            Some(entry) => entry.1 = position,
            None => self.entries.push((preset, position)),
        }
    }

    pub fn get(&self, preset: i32) -> Option<&Position> {
        self.entries.iter().find(|(n, _)| *n == preset).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Position)> {
        self.entries.iter().map(|(n, p)| (*n, p))
    }

    pub fn presets(&self) -> Vec<i32> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a table written by [`PresetTable::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Serialize for PresetTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (preset, position) in &self.entries {
            map.serialize_entry(&preset_key(*preset), position)?;
        }
        map.end()
    }
}

struct PresetTableVisitor;

impl<'de> Visitor<'de> for PresetTableVisitor {
    type Value = PresetTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of preset_<n> to position")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> std::result::Result<PresetTable, M::Error> {
        let mut table = PresetTable::new();
        while let Some((key, position)) = access.next_entry::<String, Position>()? {
            let preset = parse_preset_key(&key).map_err(de::Error::custom)?;
            table.insert(preset, position);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for PresetTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(PresetTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_and_assignable() {
        assert!(is_reserved(90));
        assert!(is_reserved(99));
        assert!(!is_reserved(89));
        assert!(is_assignable(1));
        assert!(is_assignable(149));
        assert!(!is_assignable(0));
        assert!(!is_assignable(95));
        assert!(!is_assignable(150));
        assert!(!is_assignable(151));
        assert!(is_assignable(254));
        assert!(!is_assignable(255));
    }

    #[test]
    fn test_validate_preset_bounds() {
        assert_eq!(validate_preset(0).unwrap(), 0);
        assert_eq!(validate_preset(254).unwrap(), 254);
        assert!(validate_preset(255).is_err());
        assert!(validate_preset(-1).is_err());
    }

    #[test]
    fn test_parse_preset_key() {
        assert_eq!(parse_preset_key("preset_42").unwrap(), 42);
        assert_eq!(parse_preset_key("preset_-1").unwrap(), -1);
        assert!(parse_preset_key("42").is_err());
        assert!(parse_preset_key("preset_x").is_err());
    }

    #[test]
    fn test_json_keeps_file_order() {
        let json = r#"{
            "preset_12": {"pan": "0010", "tilt": "0020", "zoom": "0000"},
            "preset_3": {"pan": "0001", "tilt": "0002", "zoom": "4000", "focus": "1000"},
            "preset_7": {"pan": "0003"}
        }"#;
        let table = PresetTable::from_json(json).unwrap();
        assert_eq!(table.presets(), vec![12, 3, 7]);
        assert_eq!(table.get(3).unwrap().focus, Some(0x1000));
        assert_eq!(table.get(7).unwrap().tilt, None);
    }

    #[test]
    fn test_json_output_shape() {
        let mut table = PresetTable::new();
        table.insert(5, Position::new(0x8A3C, 0x05F4, 0x4000));
        let value: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(value["preset_5"]["pan"], "8A3C");
        assert_eq!(value["preset_5"]["tilt"], "05F4");
        assert_eq!(value["preset_5"]["zoom"], "4000");
        assert!(value["preset_5"].get("focus").is_none());
    }

    #[test]
    fn test_bad_key_is_load_error() {
        assert!(PresetTable::from_json(r#"{"home": {"pan": "0000"}}"#).is_err());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = PresetTable::new();
        table.insert(1, Position::new(1, 1, 1));
        table.insert(2, Position::new(2, 2, 2));
        table.insert(1, Position::new(9, 9, 9));
        assert_eq!(table.presets(), vec![1, 2]);
        assert_eq!(table.get(1), Some(&Position::new(9, 9, 9)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset_positions.json");

        let mut table = PresetTable::new();
        table.insert(100, Position::new(0xF000, 0x0123, 0x0000).with_focus(0x0ABC));
        table.insert(4, Position::new(0x0001, 0x0002, 0x0003));
        table.save(&path).unwrap();

        assert_eq!(PresetTable::load(&path).unwrap(), table);
    }
}
