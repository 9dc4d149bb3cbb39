/// Numeric conversion helpers.
///
/// Implements the C-library conversion behavior the language relies on:
/// longest-prefix string-to-number parsing and truncating float-to-integer
/// conversion.
pub mod num;
