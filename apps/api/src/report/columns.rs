// Column geometry for the single-row table blocks the compiler emits.
// Widths are expressed as \dimexpr so LaTeX resolves them against the live \linewidth.

use serde::{Deserialize, Serialize};

/// Page-level knobs for report rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    /// Fraction of `\linewidth` every table spans.
    pub table_width_fraction: f64,
    /// Width ratio of the merged cell against the row-number column.
    pub merged_row_number_ratio: f64,
    /// Vertical space after each group, in points.
    pub group_spacing_pt: u32,
    pub declaration_text: String,
}

/// Returns the default report layout.
///
/// Tables span 95% of the line width so the outer rules never touch the margin.
pub fn default_report_layout() -> ReportLayout {
    ReportLayout {
        table_width_fraction: 0.95,
        merged_row_number_ratio: 19.0,
        group_spacing_pt: 12,
        declaration_text: "I hereby declare that the information contained in this report \
                           is accurate and complete to the best of my knowledge."
            .to_string(),
    }
}

/// Each column's share of `\linewidth`. The shares sum to `table_fraction`.
/// Non-positive totals fall back to equal columns.
pub fn column_fractions(ratios: &[f64], table_fraction: f64) -> Vec<f64> {
    if ratios.is_empty() {
        return Vec::new();
    }
    let total: f64 = ratios.iter().sum();
    if total <= 0.0 {
        let each = table_fraction / ratios.len() as f64;
        return vec![each; ratios.len()];
    }
    ratios
        .iter()
        .map(|r| table_fraction * (r / total))
        .collect()
}

/// `\dimexpr` width of each column after subtracting cell padding and an even
/// share of the n+1 vertical rules.
pub fn column_widths(ratios: &[f64], table_fraction: f64) -> Vec<String> {
    let n = ratios.len();
    column_fractions(ratios, table_fraction)
        .into_iter()
        .map(|fraction| {
            format!(
                "\\dimexpr {fraction:.5}\\linewidth-2\\tabcolsep-{}\\arrayrulewidth/{n}\\relax",
                n + 1
            )
        })
        .collect()
}

/// Full `tabular` column specification, e.g. `|p{...}|p{...}|`.
pub fn column_spec(ratios: &[f64], table_fraction: f64) -> String {
    let mut spec = String::from("|");
    for width in column_widths(ratios, table_fraction) {
        spec.push_str(&format!("p{{{width}}}|"));
    }
    spec
}
