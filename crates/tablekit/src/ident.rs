//! Identifier sanitation and SQL literal rendering.

/// Literal value for `IN (...)` list rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Sanitize a proposed table name.
///
/// Applies, in order: whitespace trim, diacritic stripping, lowercasing
/// with removal of everything outside `[a-z0-9_-]`, hyphen-to-underscore
/// conversion, collapse of underscore runs, and trim of leading/trailing
/// underscores. Returns `None` when the result is empty at any stage.
///
/// Every table name must pass through here before being handed to the
/// worker or interpolated into SQL text.
pub fn sanitize_table_name(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let mut folded = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        fold_char(ch, &mut folded);
    }

    // Lowercase, keep [a-z0-9_-] only.
    let mut key = String::with_capacity(folded.len());
    for ch in folded.chars() {
        for lower in ch.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' || lower == '-'
            {
                key.push(lower);
            }
        }
    }

    // Hyphens become underscores, runs of underscores collapse to one.
    let mut collapsed = String::with_capacity(key.len());
    for ch in key.chars() {
        let ch = if ch == '-' { '_' } else { ch };
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }

    if collapsed.is_empty() {
        return None;
    }

    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Quote an identifier for direct inclusion in SQL text.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Render one value as a SQL literal: numbers bare, text single-quoted
/// with embedded quotes doubled.
pub fn quote_value(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// Comma-separated literal list, ready for an `IN (...)` clause.
pub fn prepare_values_list(values: &[Value]) -> String {
    values
        .iter()
        .map(quote_value)
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the expression inside `COUNT(...)`.
///
/// Recognizes a case-insensitive `DISTINCT <ident>` form; a bare `*` is
/// passed through unquoted, anything else is stripped of backticks/quotes
/// and re-quoted.
pub(crate) fn count_expression(raw: &str) -> String {
    let mut column = raw.trim();
    let mut prefix = "";

    if let Some((head, rest)) = column.split_once(char::is_whitespace) {
        let rest = rest.trim();
        if head.eq_ignore_ascii_case("distinct")
            && !rest.is_empty()
            && !rest.contains(char::is_whitespace)
        {
            prefix = "DISTINCT ";
            column = rest;
        }
    }

    if column == "*" {
        return format!("{prefix}*");
    }

    let bare = column.trim_matches(|c| c == '`' || c == '\'' || c == '"');
    format!("{prefix}{}", quote_ident(bare))
}

/// Fold common Latin accented characters to their ASCII base.
fn fold_char(ch: char, out: &mut String) {
    let replacement: &str = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Đ' => "D",
        'ď' | 'đ' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ő' => "o",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' => "S",
        'ś' | 'š' => "s",
        'ß' => "ss",
        'Ť' => "T",
        'ť' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        _ => {
            out.push(ch);
            return;
        }
    };
    out.push_str(replacement);
}
