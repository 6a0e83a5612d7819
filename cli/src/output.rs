// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Output file naming and writing.

use anyhow::{Context, Result};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_gen::Descriptor;
use std::fs;
use std::path::{Path, PathBuf};

/// Descriptor file name for a game name.  Characters the frontend cannot
/// handle are removed or replaced.
pub fn fix_filename(name: &str) -> String {
    let name = name.replace(':', "").replace('/', "-").replace("World?", "World");
    collapse_spaces(&name).replace('?', "x")
}

/// ROM file names are limited to 8 characters: the first 5 and last 3 of
/// longer setnames are kept
pub fn shorten_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= 8 {
        return name.to_string();
    }
    chars[..5].iter().chain(chars[chars.len() - 3..].iter()).collect()
}

/// Folder name for the alternatives of a parent, from its description:
/// anything from the first `(` or ` - ` is dropped
pub fn family_folder(description: &str) -> String {
    let mut name = description.replace(':', "");
    if let Some(k) = name.find('(') {
        name.truncate(k);
    }
    if let Some(k) = name.find(" - ") {
        name.truncate(k);
    }
    format!("_{}", collapse_spaces(name.replace('/', "").trim()))
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c != ' ' || !out.ends_with(' ') {
            out.push(c);
        }
    }
    out
}

/// Where generated files go
#[derive(Debug, Clone)]
pub struct Output {
    pub mra_dir: PathBuf,
    pub alt_dir: PathBuf,
    pub rom_dir: PathBuf,
}

impl Output {
    /// Path of a descriptor.  Alternatives are grouped in a folder named
    /// after their parent's description.
    pub fn mra_path(&self, name: &str, parent: Option<&str>) -> PathBuf {
        let dir = match parent {
            Some(parent) => self.alt_dir.join(family_folder(parent)),
            None => self.mra_dir.clone(),
        };
        dir.join(format!("{}.mra", fix_filename(name)))
    }

    pub fn write_mra(
        &self,
        name: &str,
        parent: Option<&str>,
        descriptor: &Descriptor,
    ) -> Result<PathBuf> {
        let path = self.mra_path(name, parent);
        write_file(&path, format!("{}\n", descriptor.root).as_bytes())?;
        Ok(path)
    }

    /// Writes `<short setname>.<ext>` to the ROM directory
    pub fn write_rom(&self, setname: &str, ext: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.rom_dir.join(format!("{}.{ext}", shorten_name(setname)));
        write_file(&path, data)?;
        Ok(path)
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create folder {}", dir.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Cannot write {}", path.display()))?;
    debug!("Wrote {} ({} bytes)", path.display(), data.len());
    Ok(())
}
