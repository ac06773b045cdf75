//! Minimal type inference for key values that arrive untyped.
//!
//! A value whose string form consists only of ASCII digits is coded as a
//! numeral; everything else is coded as text. This mirrors what the relational
//! engine needs when values come from an HTTP body as strings.
//!
//! Known limitation: text columns holding purely numeric strings (e.g. a
//! username `"0042"`) are coded as numbers, and negative or fractional numbers
//! are coded as text. Comparisons still work on engines that coerce operands
//! to the column's type, which is why the rule is kept as is.

use crate::db::{FieldMap, Scalar};

/// Code `(column, raw)` into a single-entry field map `{column: coded}`.
pub fn encode(column: &str, raw: &Scalar) -> FieldMap {
    FieldMap::from([(column.to_string(), code_value(raw))])
}

/// Code a single value by its string form.
pub fn code_value(raw: &Scalar) -> Scalar {
    let text = raw.to_string();
    if is_numeral(&text)
        && let Ok(n) = text.parse::<i64>()
    {
        return Scalar::Integer(n);
    }
    Scalar::Text(text)
}

// Digits only. The empty string is left as text since it names no number.
fn is_numeral(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
