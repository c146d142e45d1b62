//! Strategy identifiers and construction.

use std::fmt;
use std::str::FromStr;

use crate::error::PackingError;
use crate::non_overlapping::NonOverlappingPacking;
use crate::overflow::OverflowPacking;
use crate::overlapping::OverlappingPacking;
use crate::packer::BitPacker;
use crate::traits::PackingStrategy;

/// Packing strategy selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackingKind {
    /// Continuous bit stream, values may span two words (densest).
    #[default]
    Overlapping,
    /// Values confined to one word slot each (fastest access).
    NonOverlapping,
    /// Narrow main fields plus a side table for outliers (skewed data).
    Overflow,
}

impl PackingKind {
    /// Every strategy, in declaration order.
    pub const ALL: [PackingKind; 3] = [
        PackingKind::Overlapping,
        PackingKind::NonOverlapping,
        PackingKind::Overflow,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            PackingKind::Overlapping => "overlapping",
            PackingKind::NonOverlapping => "non_overlapping",
            PackingKind::Overflow => "overflow",
        }
    }
}

impl fmt::Display for PackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackingKind {
    type Err = PackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "overlapping" => Ok(PackingKind::Overlapping),
            "non_overlapping" | "nonoverlapping" => Ok(PackingKind::NonOverlapping),
            "overflow" => Ok(PackingKind::Overflow),
            _ => Err(PackingError::InvalidArgument(format!(
                "unsupported packing strategy: {:?}",
                s
            ))),
        }
    }
}

/// Fresh stateless strategy for `kind`.
pub fn create_strategy(kind: PackingKind) -> Box<dyn PackingStrategy> {
    match kind {
        PackingKind::Overlapping => Box::new(OverlappingPacking::new()),
        PackingKind::NonOverlapping => Box::new(NonOverlappingPacking::new()),
        PackingKind::Overflow => Box::new(OverflowPacking::new()),
    }
}

/// Fresh packer for `kind`, holding no data yet.
pub fn create(kind: PackingKind) -> BitPacker {
    BitPacker::new(create_strategy(kind))
}

/// Fresh packer for a strategy name such as `"overflow"`.
///
/// # Errors
///
/// [`PackingError::InvalidArgument`] for an unrecognized name.
pub fn create_by_name(name: &str) -> Result<BitPacker, PackingError> {
    Ok(create(name.parse()?))
}
