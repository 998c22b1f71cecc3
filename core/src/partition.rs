// Partition windows for FATX media
//
// A FATX disk is carved into fixed-offset regions rather than described by a
// partition table on the disk itself. The driver only ever sees one window;
// the well-known retail layout below is convenience data for callers.

use serde::{Deserialize, Serialize};

/// Byte range of one FATX partition within the backing store.
///
/// All on-disk offsets used by the driver are relative to `base_offset`; no
/// read may land outside `[base_offset, base_offset + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionWindow {
    pub base_offset: u64,
    pub length: u64,
}

/// Drive letters of the standard retail Xbox disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveLetter {
    /// Cache partition 1
    X,
    /// Cache partition 2
    Y,
    /// Cache partition 3
    Z,
    /// System partition
    C,
    /// Data partition
    E,
}

impl DriveLetter {
    /// Partition window of this drive on a standard retail disk.
    pub fn window(self) -> PartitionWindow {
        let (base_offset, length) = match self {
            DriveLetter::X => (0x0008_0000, 0x0_2ee0_0000),
            DriveLetter::Y => (0x2ee8_0000, 0x0_2ee0_0000),
            DriveLetter::Z => (0x5dc8_0000, 0x0_2ee0_0000),
            DriveLetter::C => (0x8ca8_0000, 0x0_1f40_0000),
            DriveLetter::E => (0xabe8_0000, 0x1_31f0_0000),
        };
        PartitionWindow {
            base_offset,
            length,
        }
    }

    /// All drives of the retail layout, in on-disk order.
    pub fn all() -> [DriveLetter; 5] {
        [
            DriveLetter::X,
            DriveLetter::Y,
            DriveLetter::Z,
            DriveLetter::C,
            DriveLetter::E,
        ]
    }
}
