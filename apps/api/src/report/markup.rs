use crate::report::columns::column_spec;

pub const PREAMBLE: &str = r"\documentclass[10pt]{article}
\usepackage[T1]{fontenc}
\usepackage[margin=0.75in]{geometry}
\usepackage[table]{xcolor}
\usepackage{array}
\definecolor{groupband}{HTML}{1F3A5F}
\definecolor{sectionband}{HTML}{D9E2EC}
\definecolor{headerrow}{HTML}{F2F4F7}
\setlength{\parindent}{0pt}
\setlength{\parskip}{0pt}
\begin{document}
";

pub const TERMINATOR: &str = "\\end{document}\n";

/// One `tabular` block. `rows` are complete rows without their trailing `\\`.
/// Every block closes with a rule; `top_rule` opens one too.
pub fn table_block(ratios: &[f64], table_fraction: f64, rows: &[String], top_rule: bool) -> String {
    let mut out = format!(
        "\\noindent\\begin{{tabular}}{{{}}}\n",
        column_spec(ratios, table_fraction)
    );
    if top_rule {
        out.push_str("\\hline\n");
    }
    for row in rows {
        out.push_str(row);
        out.push_str(" \\\\\n\\hline\n");
    }
    out.push_str("\\end{tabular}\\par\n");
    out
}

/// Full-width band holding an already-escaped title.
pub fn band(title: &str, color: &str, white_text: bool, table_fraction: f64, top_rule: bool) -> String {
    let text = if white_text {
        format!("\\textcolor{{white}}{{\\textbf{{{title}}}}}")
    } else {
        format!("\\textbf{{{title}}}")
    };
    table_block(
        &[1.0],
        table_fraction,
        &[format!("\\rowcolor{{{color}}}{text}")],
        top_rule,
    )
}

/// `\multicolumn` cell spanning `span` columns. The leftmost span carries the
/// outer rule.
pub fn multicolumn(span: usize, first: bool, content: &str) -> String {
    let align = if first { "|c|" } else { "c|" };
    format!("\\multicolumn{{{span}}}{{{align}}}{{{content}}}")
}
