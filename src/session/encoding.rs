//! Desktop encoding catalog

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;

/// Frame encoding requested from the desktop engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Encoding {
    /// 8 bits per pixel run-length encoding
    #[default]
    Rle8,
    /// 16 bits per pixel run-length encoding
    Rle16,
}

impl Encoding {
    /// Every selectable encoding
    pub const ALL: [Encoding; 2] = [Encoding::Rle8, Encoding::Rle16];

    /// Looks up an encoding by host id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.id() == id)
    }

    /// Host-facing id
    pub const fn id(&self) -> u8 {
        match self {
            Encoding::Rle8 => 1,
            Encoding::Rle16 => 2,
        }
    }

    /// Display label
    pub const fn label(&self) -> &'static str {
        match self {
            Encoding::Rle8 => "RLE 8",
            Encoding::Rle16 => "RLE 16",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for Encoding {
    type Error = SessionError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Encoding::from_id(id).ok_or(SessionError::UnknownEncoding(id))
    }
}

impl From<Encoding> for u8 {
    fn from(encoding: Encoding) -> Self {
        encoding.id()
    }
}
