//! Permission bitmasks.
//!
//! A role's grant at a node is a [`PermissionMask`]; each action of a
//! resource type owns one [`MaskBit`] of it. Only the low 31 bits are usable.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of usable bits in a mask.
pub const USABLE_BITS: u32 = 31;

/// Integer bitmask of granted actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMask(u32);

impl PermissionMask {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `bit` is set in this mask.
    pub const fn grants(self, bit: MaskBit) -> bool {
        self.0 & bit.0 != 0
    }

    #[must_use]
    pub const fn with(self, bit: MaskBit) -> Self {
        Self(self.0 | bit.0)
    }
}

impl BitOr for PermissionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PermissionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PermissionMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<MaskBit> for PermissionMask {
    fn from(bit: MaskBit) -> Self {
        Self(bit.0)
    }
}

impl fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single permission bit (a power of two below `1 << 31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaskBit(u32);

impl MaskBit {
    pub const OPEN: Self = Self(1);
    pub const COPY: Self = Self(1 << 1);
    pub const EXPORT: Self = Self(1 << 2);
    pub const DELETE: Self = Self(1 << 3);
    pub const EDIT: Self = Self(1 << 4);
    pub const ADMINISTRATE: Self = Self(1 << 5);

    /// Bit at position `index` (0-based).
    pub fn at(index: u32) -> Result<Self> {
        if index >= USABLE_BITS {
            return Err(Error::Decoder(format!(
                "bit position {index} exceeds the {USABLE_BITS} usable bits"
            )));
        }
        Ok(Self(1 << index))
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Position of the bit (0-based).
    pub const fn index(self) -> u32 {
        self.0.trailing_zeros()
    }
}

impl TryFrom<u32> for MaskBit {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        if value.is_power_of_two() && value.trailing_zeros() < USABLE_BITS {
            Ok(Self(value))
        } else {
            Err(Error::Decoder(format!(
                "{value} is not a single usable permission bit"
            )))
        }
    }
}

impl From<MaskBit> for u32 {
    fn from(bit: MaskBit) -> Self {
        bit.0
    }
}

impl fmt::Display for MaskBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actions every resource type gets on registration, with their bits.
pub const DEFAULT_ACTIONS: [(&str, MaskBit); 6] = [
    ("open", MaskBit::OPEN),
    ("copy", MaskBit::COPY),
    ("export", MaskBit::EXPORT),
    ("delete", MaskBit::DELETE),
    ("edit", MaskBit::EDIT),
    ("administrate", MaskBit::ADMINISTRATE),
];

/// Binds one action of one resource type to its bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskDecoder {
    /// Resource type name.
    pub resource_type: String,
    /// Lower-case action name.
    pub action: String,
    pub bit: MaskBit,
    /// Icon shown when the action is granted.
    #[serde(default)]
    pub granted_icon_class: Option<String>,
    /// Icon shown when the action is denied.
    #[serde(default)]
    pub denied_icon_class: Option<String>,
}

impl MaskDecoder {
    pub fn new(resource_type: impl Into<String>, action: &str, bit: MaskBit) -> Self {
        Self {
            resource_type: resource_type.into(),
            action: action.to_lowercase(),
            bit,
            granted_icon_class: None,
            denied_icon_class: None,
        }
    }

    #[must_use]
    pub fn with_icons(mut self, granted: impl Into<String>, denied: impl Into<String>) -> Self {
        self.granted_icon_class = Some(granted.into());
        self.denied_icon_class = Some(denied.into());
        self
    }
}
