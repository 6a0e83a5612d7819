// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Sources of [`GameRecord`]s and the configuration used to filter them.

use std::collections::{BTreeMap, VecDeque};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{Error, GameRecord, Result};

/// Yields game records one at a time
pub trait Extractor {
    fn next_game(&mut self) -> Option<GameRecord>;
}

/// Extractor reading a JSON array of game records
#[derive(Debug, Default)]
pub struct JsonExtractor {
    games: VecDeque<GameRecord>,
}

impl JsonExtractor {
    pub fn from_json(json: &str) -> Result<Self> {
        let games: Vec<GameRecord> = serde_json::from_str(json).map_err(|e| Error::InvalidGame {
            error: e.to_string(),
        })?;
        debug!("Loaded {} game records", games.len());
        Ok(Self {
            games: games.into(),
        })
    }

    pub fn from_games(games: Vec<GameRecord>) -> Self {
        Self {
            games: games.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.games.len()
    }
}

impl Extractor for JsonExtractor {
    fn next_game(&mut self) -> Option<GameRecord> {
        self.games.pop_front()
    }
}

/// Which machines to process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ParseConfig {
    pub skip: SkipConfig,
    pub mustbe: MustBeConfig,

    /// Parents that are not part of the machine list, but whose clones
    /// should still be processed
    pub parents: Vec<ParentEntry>,

    /// Setname of the core's main descriptor.  When empty every parent is
    /// a main one.
    pub main: String,

    /// Descriptor names replacing the game description
    pub rename: Vec<SetnameRename>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SetnameRename {
    pub setname: String,
    pub name: String,
}

impl ParseConfig {
    /// Display name of a machine
    pub fn display_name<'a>(&'a self, game: &'a GameRecord) -> &'a str {
        self.rename
            .iter()
            .find(|r| r.setname == game.name)
            .map(|r| r.name.as_str())
            .unwrap_or(game.description.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SkipConfig {
    pub bootlegs: bool,
    /// Skipped if the description contains any of these
    pub descriptions: Vec<String>,
    pub setnames: Vec<String>,
    /// Skipped if a member of any of these families
    pub machines: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct MustBeConfig {
    /// At least one of these devices must be used
    pub devices: Vec<String>,
    /// The machine must belong to one of these families
    pub machines: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ParentEntry {
    pub name: String,
    pub description: String,
}

/// Applies a [`ParseConfig`] to the stream of game records, and keeps track
/// of the parents seen so clones of unknown parents can be dropped
#[derive(Debug)]
pub struct GameFilter<'a> {
    config: &'a ParseConfig,
    parents: BTreeMap<String, String>,
}

impl<'a> GameFilter<'a> {
    pub fn new(config: &'a ParseConfig) -> Self {
        let parents = config
            .parents
            .iter()
            .map(|p| (p.name.clone(), p.description.clone()))
            .collect();
        Self { config, parents }
    }

    /// Records the game if it is a parent.  Must be called for every record,
    /// including skipped ones, so their clones can be resolved.
    pub fn observe(&mut self, game: &GameRecord) {
        if game.clone_of.is_empty() {
            self.parents
                .insert(game.name.clone(), game.description.clone());
        }
    }

    /// True if the game should not be processed
    pub fn skip_game(&self, game: &GameRecord) -> bool {
        let skip = &self.config.skip;

        if skip.bootlegs && game.description.to_lowercase().contains("bootleg") {
            debug!("Skipping {} as it is a bootleg", game.description);
            return true;
        }

        if skip
            .descriptions
            .iter()
            .any(|d| game.description.contains(d.as_str()))
        {
            debug!("Skipping {} for its description", game.description);
            return true;
        }

        if skip.setnames.iter().any(|s| *s == game.name) {
            debug!("Skipping {} for its setname", game.name);
            return true;
        }

        if skip.machines.iter().any(|m| game.is_family(m)) {
            debug!("Skipping {} for its machine name", game.name);
            return true;
        }

        let mustbe = &self.config.mustbe;
        let device_ok =
            mustbe.devices.is_empty() || mustbe.devices.iter().any(|d| game.has_device(d));
        let machine_ok =
            mustbe.machines.is_empty() || mustbe.machines.iter().any(|m| game.is_family(m));

        !(device_ok && machine_ok)
    }

    /// True for parents, and for clones whose parent has been observed
    pub fn has_parent(&self, game: &GameRecord) -> bool {
        game.clone_of.is_empty() || self.parents.contains_key(&game.clone_of)
    }

    /// Description of a known parent
    pub fn parent_description(&self, name: &str) -> Option<&str> {
        self.parents.get(name).map(String::as_str)
    }

    /// True if the game's descriptor is the core's main one
    pub fn is_main(&self, game: &GameRecord) -> bool {
        if self.config.main.is_empty() {
            game.clone_of.is_empty()
        } else {
            self.config.main == game.name
        }
    }
}
