// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keys and their relative major/minor.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::note::Note;

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Major,
    Minor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

/// A musical key with root and mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    root: Note,
    mode: Mode,
}

impl Key {
    /// Create a new key
    pub fn new(root: Note, mode: Mode) -> Self {
        Self { root, mode }
    }

    /// Get the root note
    pub fn root(&self) -> Note {
        self.root
    }

    /// Get the mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get the relative key (e.g., C major -> A minor)
    pub fn relative(&self) -> Key {
        match self.mode {
            Mode::Major => Key::new(self.root.transpose(-3), Mode::Minor), // Down a minor 3rd
            Mode::Minor => Key::new(self.root.transpose(3), Mode::Major),  // Up a minor 3rd
        }
    }

    /// Express this key in `mode`, moving to the relative key if needed
    pub fn in_mode(&self, mode: Mode) -> Key {
        if self.mode == mode {
            *self
        } else {
            self.relative()
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.mode)
    }
}
