// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Game records, as yielded one at a time by an [`Extractor`](crate::Extractor).

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One emulated machine.
///
/// Immutable once produced by the extractor, except for the adjustments made
/// by [`LayoutConfig::prepare`](crate::LayoutConfig::prepare) before
/// compilation starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct GameRecord {
    /// MAME setname
    pub name: String,

    /// Parent setname, empty if this is a parent
    pub clone_of: String,

    pub description: String,
    pub year: String,
    pub manufacturer: String,

    /// Display rotation in degrees: 0, 90 or 270
    pub display_rotation: u16,

    pub player_count: u32,

    /// Joystick description, e.g. "8"
    pub control_ways: String,

    pub devices: Vec<DeviceRef>,
    pub dip_switches: Vec<DipSwitch>,
    pub rom_parts: Vec<RomPart>,
}

impl GameRecord {
    /// Parse a single record from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidGame {
            error: e.to_string(),
        })
    }

    /// True if this machine is the given setname or a clone of it.  An empty
    /// name never matches.
    pub fn is_family(&self, name: &str) -> bool {
        !name.is_empty() && (name == self.name || name == self.clone_of)
    }

    /// True if the machine uses a device with this exact name
    pub fn has_device(&self, name: &str) -> bool {
        self.devices.iter().any(|dev| dev.name == name)
    }
}

/// Reference to a device used by a machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct DeviceRef {
    pub name: String,
}

/// Dump status of a ROM part
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RomStatus {
    #[default]
    Good,
    BadDump,
    NoDump,
}

/// One ROM file belonging to a region of a machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RomPart {
    pub name: String,

    pub region: String,

    /// CRC32 of the file.  `None` means no dump is known.
    #[serde(rename = "crc", with = "crc_hex")]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub checksum32: Option<u32>,

    pub size: usize,

    /// Position hint from the source metadata.  This is not the position in
    /// the output image.
    #[serde(rename = "offset")]
    pub declared_offset: usize,

    pub status: RomStatus,
}

impl RomPart {
    /// Checksum formatted the way the descriptor stores it
    pub fn crc_str(&self) -> Option<String> {
        self.checksum32.map(|crc| format!("{crc:08x}"))
    }

    pub fn is_nodump(&self) -> bool {
        self.status == RomStatus::NoDump
    }
}

/// A DIP switch definition, as found in the game metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DipSwitch {
    pub name: String,

    /// Hardware tag.  Each tag maps to one 8-bit default byte.
    pub tag: String,

    pub mask: u32,

    /// Set when the switch is only active depending on another switch
    pub condition: Option<DipCondition>,

    #[serde(alias = "dipvalue")]
    pub values: Vec<DipValue>,
}

/// Condition attached to a DIP switch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DipCondition {
    pub tag: String,
    pub mask: u32,
    pub value: u32,
}

/// One option of a DIP switch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DipValue {
    pub name: String,
    pub value: u32,
    pub default: bool,
}

// CRCs are written as 8 hex digit strings in the metadata database, but a
// plain integer is accepted too.
mod crc_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Crc {
        Text(String),
        Number(u32),
    }

    pub fn serialize<S: Serializer>(crc: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match crc {
            Some(crc) => s.serialize_str(&format!("{crc:08x}")),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match Option::<Crc>::deserialize(d)? {
            None => Ok(None),
            Some(Crc::Number(crc)) => Ok(Some(crc)),
            Some(Crc::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(Crc::Text(text)) => u32::from_str_radix(text.trim(), 16)
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid crc `{text}`"))),
        }
    }
}
