//! Property tests for grid placement.
//!
//! 1. A placement inside the grid appends exactly one region rule whose
//!    `grid-area` ends are exclusive.
//! 2. A placement outside the grid fails and leaves the rule list unchanged.
//! 3. Rows whose width and child counts differ are always rejected.

use proptest::prelude::*;
use viewx::error::{ConstructionError, ViewxError};
use viewx::{Component, GridLayout, GridReport, Placement, validate_placement};

// ── Strategies ────────────────────────────────────────────────────────────

fn grid_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..8, 1u32..8)
}

fn request() -> impl Strategy<Value = (u32, u32, u32, u32)> {
    (0u32..10, 0u32..10, 0u32..10, 0u32..10)
}

fn fits(rows: u32, cols: u32, (row, col, height, width): (u32, u32, u32, u32)) -> bool {
    row >= 1
        && col >= 1
        && height >= 1
        && width >= 1
        && row + height - 1 <= rows
        && col + width - 1 <= cols
}

// ═══════════════════════════════════════════════════════════════════════════
// 1-2. Accepted placements append one rule, rejected ones append nothing
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn register_appends_exactly_when_placement_fits(
        (rows, cols) in grid_dims(),
        (row, col, height, width) in request(),
    ) {
        let mut grid = GridLayout::new(rows, cols, 1);
        grid.register(&Placement::cell("div1", 1, 1)).expect("origin always fits");
        let before = grid.regions().to_vec();

        let placement = Placement::new("div1", row, col, height, width);
        let expected = fits(rows, cols, (row, col, height, width));
        let result = grid.register(&placement).cloned();

        if expected {
            let region = result.expect("fitting placement accepted");
            prop_assert_eq!(grid.regions().len(), before.len() + 1);
            prop_assert_eq!(region.row_end, row + height);
            prop_assert_eq!(region.col_end, col + width);
            prop_assert_eq!(
                region.css_rule(),
                format!(".div1 {{ grid-area: {row} / {col} / {} / {}; }}", row + height, col + width)
            );
        } else {
            prop_assert!(matches!(result, Err(ViewxError::Placement(_))));
            prop_assert_eq!(grid.regions(), before.as_slice());
        }
    }

    #[test]
    fn validate_agrees_with_register(
        (rows, cols) in grid_dims(),
        (row, col, height, width) in request(),
    ) {
        let placement = Placement::new("div1", row, col, height, width);
        let checked = validate_placement(&placement, rows, cols).is_ok();
        let mut grid = GridLayout::new(rows, cols, 1);
        prop_assert_eq!(checked, grid.register(&placement).is_ok());
    }

    #[test]
    fn unknown_slot_never_registers(
        slots in 1usize..6,
        extra in 1usize..4,
    ) {
        let mut grid = GridLayout::new(4, 4, slots);
        let slot = format!("div{}", slots + extra);
        prop_assert!(grid.register(&Placement::cell(slot, 1, 1)).is_err());
        prop_assert!(grid.regions().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 3. Row arity
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mismatched_row_arity_is_rejected(
        widths in prop::collection::vec(1u32..5, 0..6),
        children in 0usize..6,
    ) {
        prop_assume!(widths.len() != children);
        let children = (0..children).map(|i| Component::text(format!("c{i}"))).collect();
        let result = Component::row(widths, children);
        let is_arity_error = matches!(
            result,
            Err(ViewxError::Construction(ConstructionError::RowArity { .. }))
        );
        prop_assert!(is_arity_error);
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────

#[test]
fn two_by_two_grid_scenario() {
    let mut report = GridReport::new(2, 2, 2);
    report
        .add_text("a", &Placement::new("div1", 1, 1, 1, 1))
        .expect("div1 fits");
    assert_eq!(
        report.layout().css(),
        ".div1 { grid-area: 1 / 1 / 2 / 2; }"
    );

    let err = report
        .add_text("b", &Placement::new("div2", 2, 2, 2, 1))
        .err()
        .expect("2 + 2 - 1 > 2");
    assert!(err.to_string().contains("exceeds grid rows"));
    assert_eq!(report.layout().regions().len(), 1);
}

#[test]
fn overlapping_placements_stack_in_registration_order() {
    let mut report = GridReport::new(2, 2, 2);
    report
        .add_text("under", &Placement::new("div1", 1, 1, 2, 2))
        .expect("full grid")
        .add_text("over", &Placement::new("div2", 1, 1, 1, 1))
        .expect("overlap accepted");
    let css = report.layout().css();
    let first = css.find(".div1").expect("div1 rule");
    let second = css.find(".div2").expect("div2 rule");
    assert!(first < second);
}
