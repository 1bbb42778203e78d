//! Table row layout.
//!
//! A row is split across the available width in one pass: cells with an
//! explicit width keep it, percentage cells take their fraction of the
//! available width, and the remainder is shared equally by the auto cells.

use log::{debug, trace, warn};

use crate::engine::RenderContext;
use crate::model::{Cell, PageGeometry, Spacing};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthKind {
    Explicit,
    Percent,
    Auto,
}

impl WidthKind {
    pub fn of(cell: &Cell) -> Self {
        if cell.width > 0.0 {
            WidthKind::Explicit
        } else if cell.width_percent > 0.0 {
            WidthKind::Percent
        } else {
            WidthKind::Auto
        }
    }
}

/// Widths for one row, in cell order. Input cells are left untouched, so a
/// row rendered again after the body width changes is laid out afresh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedRow {
    pub available_width: f32,
    /// Sum of explicit and resolved percentage widths.
    pub used_width: f32,
    pub auto_count: usize,
    /// Share given to each auto cell; `None` when the row has no auto cells.
    pub auto_width: Option<f32>,
    pub widths: Vec<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedRow {
    pub layout: ResolvedRow,
    /// Height of the tallest cell; every cell box in the row is this tall.
    pub height: f32,
}

/// Body width minus the positive horizontal spacing.
pub fn available_width(body_width: f32, spacing: Option<&Spacing>) -> f32 {
    let mut width = body_width;
    if let Some(spacing) = spacing {
        if spacing.left > 0.0 {
            width -= spacing.left;
        }
        if spacing.right > 0.0 {
            width -= spacing.right;
        }
    }
    width
}

pub fn partition_widths(cells: &[Cell], body_width: f32, spacing: Option<&Spacing>) -> ResolvedRow {
    let available = available_width(body_width, spacing);

    let mut widths: Vec<Option<f32>> = Vec::with_capacity(cells.len());
    let mut used_width = 0.0;
    let mut auto_count = 0usize;
    for cell in cells {
        let width = match WidthKind::of(cell) {
            WidthKind::Explicit => Some(cell.width),
            WidthKind::Percent => Some(available * cell.width_percent),
            WidthKind::Auto => {
                auto_count += 1;
                None
            }
        };
        if let Some(w) = width {
            used_width += w;
        }
        widths.push(width);
    }

    let auto_width = if auto_count == 0 {
        None
    } else {
        let share = (available - used_width) / auto_count as f32;
        if share < 0.0 {
            warn!(
                "Row over-allocated: {used_width:.2}pt used of {available:.2}pt, \
                 {auto_count} auto cell(s) get zero width"
            );
            Some(0.0)
        } else {
            Some(share)
        }
    };

    let widths: Vec<f32> = widths
        .into_iter()
        .map(|w| w.or(auto_width).unwrap_or(0.0))
        .collect();

    debug!(
        "Row widths {widths:?} (available {available:.2}, used {used_width:.2}, auto {auto_count})"
    );

    ResolvedRow {
        available_width: available,
        used_width,
        auto_count,
        auto_width,
        widths,
    }
}

/// Lays out and draws one row at the engine's cursor.
///
/// Top spacing breaks the line before the row, left spacing offsets the first
/// cell from the left margin, and bottom spacing breaks the line after it.
/// Every cell box is drawn at the height of the tallest cell so borders and
/// fills line up. Each cell's style is applied to the engine immediately
/// before its draw.
pub fn render_row<R: RenderContext>(
    engine: &mut R,
    geometry: &PageGeometry,
    cells: &[Cell],
    spacing: Option<&Spacing>,
) -> RenderedRow {
    if let Some(spacing) = spacing {
        if spacing.top > 0.0 {
            engine.advance_line(spacing.top);
        }
        if spacing.left > 0.0 {
            engine.set_x(geometry.margin_left + spacing.left);
        }
    }

    let layout = partition_widths(cells, geometry.body_width, spacing);

    let height = cells
        .iter()
        .zip(&layout.widths)
        .map(|(cell, &width)| engine.measure_cell(&cell.style.font, width, &cell.text))
        .fold(0.0_f32, f32::max);

    for (cell, &width) in cells.iter().zip(&layout.widths) {
        let style = &cell.style;
        style.apply(engine);
        let border = style.border.code();
        let align = style.align_code();
        trace!(
            "Cell {:?} width={width:.2} height={height:.2} border={border:?} align={align}",
            cell.text
        );
        engine.draw_cell(
            width,
            height,
            style.font.line_height,
            &cell.text,
            &border,
            &align,
            style.fill.is_some(),
        );
    }
    if height > 0.0 {
        engine.advance_line(height);
    }

    if let Some(spacing) = spacing
        && spacing.bottom > 0.0
    {
        engine.advance_line(spacing.bottom);
    }

    RenderedRow { layout, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto() -> Cell {
        Cell::new("", None)
    }

    #[test]
    fn classification_prefers_explicit_width() {
        let both = auto().with_width(40.0).with_width_percent(0.5);
        assert_eq!(WidthKind::of(&both), WidthKind::Explicit);
        assert_eq!(WidthKind::of(&auto().with_width_percent(0.1)), WidthKind::Percent);
        assert_eq!(WidthKind::of(&auto().with_width(-3.0)), WidthKind::Auto);
        assert_eq!(WidthKind::of(&auto().with_width(f32::NAN)), WidthKind::Auto);
    }

    #[test]
    fn non_positive_spacing_is_ignored() {
        let spacing = Spacing::new(0.0, -5.0, 0.0, 0.0);
        assert_eq!(available_width(500.0, Some(&spacing)), 500.0);
        assert_eq!(available_width(500.0, None), 500.0);
    }

    #[test]
    fn empty_row_resolves_to_nothing() {
        let row = partition_widths(&[], 600.0, None);
        assert!(row.widths.is_empty());
        assert_eq!(row.auto_width, None);
        assert_eq!(row.used_width, 0.0);
    }
}
