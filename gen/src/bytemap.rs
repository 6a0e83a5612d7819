// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Byte maps describe which byte lanes of an interleaved output word a
//! source file provides.
//!
//! The textual form has one character per output lane.  `0` means the
//! source contributes nothing at that lane, digit `d` means byte `d - 1` of
//! the source's current word goes there.  The same map is used to describe
//! an interleave in a descriptor and to execute it when materializing.

use core::fmt;
use core::str::FromStr;

use crate::{Error, Result};

/// Order of the digits across the active lanes, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// "12": the first source byte goes to the lowest lane
    Ascending,
    /// "21": the first source byte goes to the highest lane
    Descending,
}

/// A byte map: `width` contiguous active lanes starting at `start`, out of
/// `lanes` in total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteMap {
    lanes: usize,
    start: usize,
    width: usize,
    direction: Direction,
}

impl ByteMap {
    /// Map for source `step` of an interleave made of `word_width` byte
    /// words, into `output_bytes` byte output words.
    ///
    /// Forward maps place the first source at the highest lanes, with
    /// descending digits.  Reverse maps place it at the lowest lanes, with
    /// ascending digits.  Returns `None` if the word does not fit.
    pub fn build(word_width: usize, output_bytes: usize, step: usize, reverse: bool) -> Option<Self> {
        if word_width == 0 || output_bytes > 9 {
            return None;
        }
        let end = (step + 1).checked_mul(word_width)?;
        if end > output_bytes {
            return None;
        }
        let (start, direction) = if reverse {
            (step * word_width, Direction::Ascending)
        } else {
            (output_bytes - end, Direction::Descending)
        };
        // A single lane reads the same either way
        let direction = if word_width == 1 {
            Direction::Descending
        } else {
            direction
        };
        Some(Self {
            lanes: output_bytes,
            start,
            width: word_width,
            direction,
        })
    }

    /// A map where the source covers every lane
    pub fn full(lanes: usize, direction: Direction) -> Self {
        Self {
            lanes,
            start: 0,
            width: lanes,
            direction,
        }
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Number of source bytes consumed per output word
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Digit at a lane, 0 if the lane is inactive
    pub fn digit_at(&self, lane: usize) -> usize {
        if lane < self.start || lane >= self.start + self.width {
            return 0;
        }
        match self.direction {
            Direction::Ascending => lane - self.start + 1,
            Direction::Descending => self.start + self.width - lane,
        }
    }

    /// The map of the next source in a group: the active window moves down
    /// by its own width, wrapping around
    pub fn rotated(&self) -> Self {
        Self {
            start: (self.start + self.lanes - self.width) % self.lanes,
            ..*self
        }
    }
}

impl fmt::Display for ByteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lane in 0..self.lanes {
            write!(f, "{}", self.digit_at(lane))?;
        }
        Ok(())
    }
}

impl FromStr for ByteMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidByteMap { map: s.to_string() };

        let digits = s
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as usize))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;

        let start = digits.iter().position(|d| *d != 0).ok_or_else(invalid)?;
        let width = digits[start..].iter().take_while(|d| **d != 0).count();
        if digits[start + width..].iter().any(|d| *d != 0) {
            return Err(invalid());
        }

        let direction = if digits[start] == 1 && width > 1 {
            Direction::Ascending
        } else {
            Direction::Descending
        };
        let map = Self {
            lanes: digits.len(),
            start,
            width,
            direction,
        };

        if (0..map.lanes).any(|lane| map.digit_at(lane) != digits[lane]) {
            return Err(invalid());
        }
        Ok(map)
    }
}

/// Executes an interleave.
///
/// For every output word, lanes are produced from the last to the first, each
/// taken from the source whose map covers it.  After every word each source
/// advances by its own width.  Output stops as soon as any source is
/// exhausted.
pub fn interleave(lanes: usize, sources: &[(&[u8], ByteMap)]) -> Result<Vec<u8>> {
    let mut select = Vec::with_capacity(lanes);
    for lane in 0..lanes {
        let source = sources
            .iter()
            .position(|(_, map)| map.digit_at(lane) != 0)
            .ok_or_else(|| Error::InvalidByteMap {
                map: format!("no source for lane {lane}"),
            })?;
        select.push(source);
    }

    let mut out = Vec::with_capacity(sources.first().map(|(d, _)| d.len() * sources.len()).unwrap_or(0));
    let mut pos = vec![0usize; sources.len()];
    if sources.iter().any(|(data, _)| data.is_empty()) {
        return Ok(out);
    }

    'words: loop {
        for lane in (0..lanes).rev() {
            let source = select[lane];
            let (data, map) = &sources[source];
            let Some(byte) = data.get(pos[source] + map.digit_at(lane) - 1) else {
                break 'words;
            };
            out.push(*byte);
        }
        for (ii, (data, map)) in sources.iter().enumerate() {
            pos[ii] += map.width();
            if pos[ii] >= data.len() {
                break 'words;
            }
        }
    }

    Ok(out)
}
