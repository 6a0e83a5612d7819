// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Archives of ROM files, looked up by checksum.
//!
//! The materializer only needs to find the contents of a file from its
//! CRC32.  Opening archives by name is left to an [`ArchiveSource`], so
//! callers can back it with zip files, directories or memory.

use std::collections::BTreeMap;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// An open archive
pub trait Archive {
    fn name(&self) -> &str;

    /// Contents of the first file with this CRC32
    fn find_by_crc32(&self, crc: u32) -> Option<Vec<u8>>;
}

impl<T: Archive + ?Sized> Archive for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn find_by_crc32(&self, crc: u32) -> Option<Vec<u8>> {
        (**self).find_by_crc32(crc)
    }
}

/// Opens archives by file name
pub trait ArchiveSource {
    /// Returns `None` if the archive does not exist or cannot be read
    fn open(&self, name: &str) -> Option<Box<dyn Archive + '_>>;
}

/// The archives listed in a descriptor's `zip` attribute, searched in order
pub struct ArchiveSet<'a> {
    archives: Vec<Box<dyn Archive + 'a>>,
}

impl<'a> ArchiveSet<'a> {
    /// Opens every archive of a `|` separated list.  Archives that cannot
    /// be opened are skipped.
    pub fn open(source: &'a dyn ArchiveSource, zips: &str) -> Self {
        let archives = zips
            .split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                let archive = source.open(name);
                if archive.is_none() {
                    debug!("Archive {name} not found");
                }
                archive
            })
            .collect();
        Self { archives }
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn find_by_crc32(&self, crc: u32) -> Option<Vec<u8>> {
        self.archives.iter().find_map(|a| {
            let data = a.find_by_crc32(crc)?;
            trace!("Found {crc:08x} in {}", a.name());
            Some(data)
        })
    }
}

/// An archive held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    files: Vec<MemoryFile>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    name: String,
    crc: u32,
    data: Vec<u8>,
}

impl MemoryArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// Adds a file, returning its CRC32
    pub fn add(&mut self, name: impl Into<String>, data: Vec<u8>) -> u32 {
        let crc = crc32fast::hash(&data);
        self.files.push(MemoryFile {
            name: name.into(),
            crc,
            data,
        });
        crc
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

impl Archive for MemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_by_crc32(&self, crc: u32) -> Option<Vec<u8>> {
        self.files
            .iter()
            .find(|f| f.crc == crc)
            .map(|f| f.data.clone())
    }
}

/// A set of in-memory archives, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryArchives {
    archives: BTreeMap<String, MemoryArchive>,
}

impl MemoryArchives {
    pub fn new() -> Self {
        Self::default()
    }

    /// The archive with this name, created if needed
    pub fn archive(&mut self, name: &str) -> &mut MemoryArchive {
        self.archives
            .entry(name.to_string())
            .or_insert_with(|| MemoryArchive::new(name))
    }

    pub fn insert(&mut self, archive: MemoryArchive) {
        self.archives.insert(archive.name.clone(), archive);
    }
}

impl ArchiveSource for MemoryArchives {
    fn open(&self, name: &str) -> Option<Box<dyn Archive + '_>> {
        self.archives
            .get(name)
            .map(|a| Box::new(a) as Box<dyn Archive + '_>)
    }
}
