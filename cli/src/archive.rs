// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Zip archives found in a list of search directories.

use anyhow::{Context, Result};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_gen::{Archive, ArchiveSource};
use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Opens zip files from the first search directory holding them
#[derive(Debug, Clone, Default)]
pub struct ZipDirectories {
    dirs: Vec<PathBuf>,
}

impl ZipDirectories {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl ArchiveSource for ZipDirectories {
    fn open(&self, name: &str) -> Option<Box<dyn Archive + '_>> {
        let path = self.dirs.iter().map(|d| d.join(name)).find(|p| p.is_file())?;
        match ZipFile::open(&path) {
            Ok(zip) => Some(Box::new(zip) as Box<dyn Archive + '_>),
            Err(e) => {
                warn!("{e:#}");
                None
            }
        }
    }
}

/// A zip file.  Entries are only decompressed when looked up.
pub struct ZipFile {
    name: String,
    zip: RefCell<ZipArchive<File>>,
    crcs: Vec<u32>,
}

impl ZipFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("{} is not a valid zip file", path.display()))?;
        let crcs = (0..zip.len())
            .map(|ii| zip.by_index_raw(ii).map(|f| f.crc32()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Cannot read the entries of {}", path.display()))?;
        debug!("Opened {} with {} files", path.display(), crcs.len());

        Ok(Self {
            name: path.display().to_string(),
            zip: RefCell::new(zip),
            crcs,
        })
    }
}

impl Archive for ZipFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_by_crc32(&self, crc: u32) -> Option<Vec<u8>> {
        let index = self.crcs.iter().position(|c| *c == crc)?;
        let mut zip = self.zip.borrow_mut();
        let mut file = match zip.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot extract {crc:08x} from {}: {e}", self.name);
                return None;
            }
        };
        let mut data = Vec::new();
        if let Err(e) = std::io::copy(&mut file, &mut data) {
            warn!("Cannot read {} from {}: {e}", file.name(), self.name);
            return None;
        }
        Some(data)
    }
}
