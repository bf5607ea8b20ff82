//! Input masks.
//!
//! Masks are patterns where `0` stands for one digit and every other
//! character is a literal, e.g. `000.000.000-00` for a CPF.

/// Strip everything that is not an ASCII digit.
///
/// ```
/// use vitrine_core::digits_only;
///
/// assert_eq!(digits_only("529.982.247-25"), "52998224725");
/// assert_eq!(digits_only("(27) 9 1234-5678"), "27912345678");
/// ```
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Apply a mask pattern to a string of digits.
///
/// Literals are only emitted while digits remain, so a partial input yields a
/// partial mask (`"2910"` with `00000-000` gives `"2910"`, not `"2910-"`).
/// Non-digit input characters are ignored; surplus digits are dropped.
///
/// ```
/// use vitrine_core::apply_mask;
///
/// assert_eq!(apply_mask("29100000", "00000-000"), "29100-000");
/// assert_eq!(apply_mask("291000", "00000-000"), "29100-0");
/// ```
#[must_use]
pub fn apply_mask(input: &str, pattern: &str) -> String {
    let mut digits = input.chars().filter(char::is_ascii_digit).peekable();
    let mut out = String::with_capacity(pattern.len());

    for slot in pattern.chars() {
        if digits.peek().is_none() {
            break;
        }
        if slot == '0' {
            if let Some(d) = digits.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }

    out
}
