//! Selection pass color encoding.
//!
//! Every pickable structure is drawn in a flat color encoding a 24-bit
//! index. Reading the pixel under the cursor and decoding the color gives
//! back the structure. Index 0 is the background.

use umbra_core::StructureId;

/// Decodes a pick color back to an index.
///
/// The color is encoded as RGB where:
/// - R contains bits 16-23
/// - G contains bits 8-15
/// - B contains bits 0-7
#[must_use]
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Encodes an index as a pick color.
#[must_use]
pub fn index_to_color(index: u32) -> [u8; 3] {
    [
        ((index >> 16) & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        (index & 0xFF) as u8,
    ]
}

/// Largest index a pick color can hold.
pub const MAX_PICK_INDEX: u32 = 0x00FF_FFFF;

/// Mapping from pick colors to the structures drawn with them in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickTable {
    entries: Vec<StructureId>,
}

impl PickTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next pick color to `id`.
    ///
    /// Returns `None` once every 24-bit color is in use.
    pub fn assign(&mut self, id: StructureId) -> Option<[u8; 3]> {
        let index = u32::try_from(self.entries.len() + 1).ok()?;
        if index > MAX_PICK_INDEX {
            return None;
        }
        self.entries.push(id);
        Some(index_to_color(index))
    }

    /// Looks up the structure drawn with `color`. Background and unknown
    /// colors give `None`.
    #[must_use]
    pub fn resolve(&self, color: [u8; 3]) -> Option<StructureId> {
        let index = color_to_index(color[0], color[1], color[2]);
        let slot = usize::try_from(index.checked_sub(1)?).ok()?;
        self.entries.get(slot).copied()
    }

    /// Number of assigned colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no color has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
