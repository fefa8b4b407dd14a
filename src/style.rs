use umya_spreadsheet::Style;
use umya_spreadsheet::structs::PatternValues;

use crate::status::TestStatus;

/// Fill and font colors for a status, as lowercase ARGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fill: &'static str,
    pub font: &'static str,
}

pub fn palette(status: TestStatus) -> Palette {
    // umya-spreadsheet's Color::set_argb() rewrites values matching its
    // INDEXED_COLORS table into indexed="n"; lowercase keeps rgb="..." intact.
    match status {
        TestStatus::Pass => Palette {
            fill: "ff90ee90",
            font: "ff006400",
        },
        TestStatus::Fail => Palette {
            fill: "ffffb6c6",
            font: "ff8b0000",
        },
        TestStatus::Planned => Palette {
            fill: "ffffeb99",
            font: "ffff6600",
        },
    }
}

/// Solid fill plus bold colored font. Borders, alignment and number format
/// already on the cell are kept.
pub fn apply_status_style(style: &mut Style, status: TestStatus) {
    let colors = palette(status);

    let pattern = style.get_fill_mut().get_pattern_fill_mut();
    pattern.set_pattern_type(PatternValues::Solid);
    pattern.get_foreground_color_mut().set_argb(colors.fill);
    pattern.get_background_color_mut().set_argb(colors.fill);

    let font = style.get_font_mut();
    font.set_bold(true);
    font.get_color_mut().set_argb(colors.font);
}
