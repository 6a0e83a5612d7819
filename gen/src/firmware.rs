// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Custom firmware for regions with no known dump.
//!
//! Some MCU programs have never been dumped.  A replacement can be written
//! in assembly and placed in the core's firmware directory as
//! `<setname>.s`, or `<parent>.s` for a whole family.

use std::path::{Path, PathBuf};
use std::process::Command;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::GameRecord;

/// Produces a firmware binary for a machine
pub trait FirmwareAssembler {
    /// Returns `None` if no firmware can be produced.  Failures are logged.
    fn assemble(&self, game: &GameRecord) -> Option<Vec<u8>>;
}

/// Assembler used when custom firmware is not available
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFirmware;

impl FirmwareAssembler for NoFirmware {
    fn assemble(&self, game: &GameRecord) -> Option<Vec<u8>> {
        debug!("No firmware assembler configured for {}", game.name);
        None
    }
}

/// Runs the `as31` 8051 assembler on the machine's source file
#[derive(Debug, Clone)]
pub struct As31 {
    firmware_dir: PathBuf,
    program: String,
}

impl As31 {
    pub fn new(firmware_dir: impl Into<PathBuf>) -> Self {
        Self {
            firmware_dir: firmware_dir.into(),
            program: "as31".to_string(),
        }
    }

    /// Use a different assembler executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Source file for a machine, falling back to its parent's
    pub fn source_for(&self, game: &GameRecord) -> Option<PathBuf> {
        [game.name.as_str(), game.clone_of.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| self.firmware_dir.join(format!("{name}.s")))
            .find(|path| path.is_file())
    }

    fn run(&self, source: &Path) -> std::io::Result<Vec<u8>> {
        let out = tempfile::Builder::new()
            .prefix("mra")
            .suffix(".bin")
            .tempfile()?;

        let status = Command::new(&self.program)
            .arg("-Fbin")
            .arg(format!("-O{}", out.path().display()))
            .arg(source)
            .status()?;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "{} returned {status}",
                self.program
            )));
        }
        std::fs::read(out.path())
    }
}

impl FirmwareAssembler for As31 {
    fn assemble(&self, game: &GameRecord) -> Option<Vec<u8>> {
        let Some(source) = self.source_for(game) else {
            warn!("Cannot find custom firmware for {}", game.name);
            return None;
        };

        match self.run(&source) {
            Ok(bin) => {
                debug!("Assembled {} bytes from {}", bin.len(), source.display());
                Some(bin)
            }
            Err(e) => {
                warn!("Failed to assemble {}: {e}", source.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kchamp.s"), "nop\n").unwrap();
        let as31 = As31::new(dir.path());

        let clone = GameRecord {
            name: "karatedo".to_string(),
            clone_of: "kchamp".to_string(),
            ..Default::default()
        };
        assert_eq!(as31.source_for(&clone), Some(dir.path().join("kchamp.s")));

        let other = GameRecord {
            name: "1942".to_string(),
            ..Default::default()
        };
        assert_eq!(as31.source_for(&other), None);
        assert_eq!(as31.assemble(&other), None);
    }

    #[test]
    fn test_missing_assembler() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kchamp.s"), "nop\n").unwrap();
        let as31 = As31::new(dir.path()).with_program("mra-no-such-assembler");
        let game = GameRecord {
            name: "kchamp".to_string(),
            ..Default::default()
        };
        assert_eq!(as31.assemble(&game), None);
    }
}
