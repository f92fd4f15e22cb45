/// Zero-width break opportunity. Lets LaTeX wrap long unbroken tokens
/// (URLs, DOIs, grant numbers) inside fixed-width `p{}` columns.
pub const SOFT_BREAK: &str = "\\hspace{0pt}";

/// Escapes characters that are significant to LaTeX.
pub fn latex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Escapes `input` and inserts a soft break after every digit, punctuation mark and
/// separator. Line breaks in the source become `\newline`.
pub fn latex_escape_with_breaks(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        if c == '\n' {
            out.push_str("\\newline ");
            continue;
        }
        if c == '\r' {
            continue;
        }
        push_escaped(&mut out, c);
        if breaks_after(c) {
            out.push_str(SOFT_BREAK);
        }
    }
    out
}

fn breaks_after(c: char) -> bool {
    c.is_ascii_digit()
        || matches!(
            c,
            ',' | '.' | ';' | ':' | '/' | '\\' | '-' | '_' | ')' | ']' | '}' | '!' | '?' | '|'
                | '@' | '&' | '+' | '=' | '%' | '#'
        )
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\textbackslash{}"),
        '{' => out.push_str("\\{"),
        '}' => out.push_str("\\}"),
        '$' => out.push_str("\\$"),
        '&' => out.push_str("\\&"),
        '#' => out.push_str("\\#"),
        '^' => out.push_str("\\^{}"),
        '_' => out.push_str("\\_"),
        '%' => out.push_str("\\%"),
        '~' => out.push_str("\\~{}"),
        '<' => out.push_str("\\textless{}"),
        '>' => out.push_str("\\textgreater{}"),
        '\u{2014}' => out.push_str("---"),
        '\u{2013}' => out.push_str("--"),
        '\u{201C}' => out.push_str("``"),
        '\u{201D}' => out.push_str("''"),
        '\u{2018}' => out.push('`'),
        '\u{2019}' => out.push('\''),
        _ => out.push(c),
    }
}
