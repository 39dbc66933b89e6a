// SPDX-License-Identifier: Apache-2.0
//! Grid placement validation for the static report.
//!
//! A [`GridLayout`] owns the declared grid dimensions, the slot count and the
//! list of accepted [`Region`]s. Validation is eager: a placement that does
//! not fit fails at the call that requested it and leaves the region list
//! untouched.
//!
//! Overlapping placements are accepted. Regions are emitted in registration
//! order and slots in index order, so a later placement paints over an
//! earlier one ("last write wins"); there is no z-index model.

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};

/// A request to put content into `slot`, spanning `height` rows and `width`
/// columns from the 1-based `(row, col)` origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub slot: String,
    pub row: u32,
    pub col: u32,
    #[serde(default = "one")]
    pub height: u32,
    #[serde(default = "one")]
    pub width: u32,
}

fn one() -> u32 {
    1
}

impl Placement {
    #[must_use]
    pub fn new(slot: impl Into<String>, row: u32, col: u32, height: u32, width: u32) -> Self {
        Self {
            slot: slot.into(),
            row,
            col,
            height,
            width,
        }
    }

    /// A single cell.
    #[must_use]
    pub fn cell(slot: impl Into<String>, row: u32, col: u32) -> Self {
        Self::new(slot, row, col, 1, 1)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::cell(slot_name(1), 1, 1)
    }
}

/// Resolved span of an accepted placement. Ends are exclusive, matching CSS
/// `grid-area` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub slot: String,
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl Region {
    #[must_use]
    pub fn css_rule(&self) -> String {
        format!(
            ".{} {{ grid-area: {} / {} / {} / {}; }}",
            self.slot, self.row_start, self.col_start, self.row_end, self.col_end
        )
    }
}

/// Name of the slot at 1-based `index`.
#[must_use]
pub fn slot_name(index: usize) -> String {
    format!("div{index}")
}

/// Check `placement` against a `rows` x `cols` grid without touching any
/// state.
pub fn validate_placement(
    placement: &Placement,
    rows: u32,
    cols: u32,
) -> std::result::Result<Region, PlacementError> {
    let Placement {
        row,
        col,
        height,
        width,
        ..
    } = *placement;

    if row < 1 || col < 1 {
        return Err(PlacementError::OriginOutOfRange { row, col });
    }
    if height < 1 || width < 1 {
        return Err(PlacementError::EmptySpan { height, width });
    }
    // Widen before adding so huge spans cannot wrap around.
    if u64::from(row) + u64::from(height) - 1 > u64::from(rows) {
        return Err(PlacementError::RowOverflow { row, height, rows });
    }
    if u64::from(col) + u64::from(width) - 1 > u64::from(cols) {
        return Err(PlacementError::ColumnOverflow { col, width, cols });
    }

    Ok(Region {
        slot: placement.slot.clone(),
        row_start: row,
        row_end: row + height,
        col_start: col,
        col_end: col + width,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    rows: u32,
    cols: u32,
    slots: usize,
    regions: Vec<Region>,
}

impl GridLayout {
    #[must_use]
    pub fn new(rows: u32, cols: u32, slots: usize) -> Self {
        Self {
            rows,
            cols,
            slots,
            regions: Vec::new(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Accepted regions in registration order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// 1-based index of `slot`, if it names one of this grid's slots.
    #[must_use]
    pub fn slot_index(&self, slot: &str) -> Option<usize> {
        let index = slot.strip_prefix("div")?.parse::<usize>().ok()?;
        (1..=self.slots).contains(&index).then_some(index)
    }

    /// Validate and append one region rule.
    pub fn register(&mut self, placement: &Placement) -> Result<&Region> {
        if self.slot_index(&placement.slot).is_none() {
            return Err(PlacementError::UnknownSlot {
                slot: placement.slot.clone(),
            }
            .into());
        }
        let region = validate_placement(placement, self.rows, self.cols)?;
        tracing::debug!(
            slot = %region.slot,
            row_start = region.row_start,
            row_end = region.row_end,
            col_start = region.col_start,
            col_end = region.col_end,
            "grid region registered"
        );
        let index = self.regions.len();
        self.regions.push(region);
        Ok(&self.regions[index])
    }

    /// CSS rules for every accepted region, one per line.
    #[must_use]
    pub fn css(&self) -> String {
        self.regions
            .iter()
            .map(Region::css_rule)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
