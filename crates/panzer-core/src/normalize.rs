//! Scalar normalization: number range projection and string escaping.
//!
//! Every number is stored twice in the runtime layout: as a signed 64-bit
//! integer projection and as a double approximation. The projection follows a
//! fixed range policy:
//!
//! - magnitudes saturate at `2^64 - 1`
//! - positive magnitudes above `i64::MAX` are reinterpreted by subtracting
//!   `2^64`, so the runtime's unsigned accessor recovers them
//! - negative magnitudes beyond `2^63` clamp to `i64::MIN`
//! - fractional parts are truncated toward zero
//!
//! A literal whose double overflows (`1e400`) keeps its saturated integer
//! projection and stores `±f64::MAX` as the double.
//!
//! Range adjustments are not errors. They are reported as [`RangeAdjustment`]
//! values so callers can audit them.

use std::fmt;
use std::str::Utf8Error;

use serde::Serialize;

const SIGNED_MIN_MAGNITUDE: u64 = 1 << 63;
/// `2^64` as a double; every double at or above this saturates.
const UNSIGNED_CEILING: f64 = 18_446_744_073_709_551_616.0;

/// How the integer projection of a number departed from its literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeAdjustment {
    /// Magnitude in `(i64::MAX, u64::MAX]`, stored as its two's-complement
    /// reinterpretation. Reversible through an unsigned read.
    Wrapped,
    /// Magnitude above `u64::MAX`, clamped to `u64::MAX` and then wrapped.
    ClampedToUnsignedMax,
    /// Negative magnitude above `2^63`, clamped to `i64::MIN`.
    ClampedToSignedMin,
    /// Fractional part dropped from the integer projection.
    Truncated,
    /// Double approximation overflowed and was clamped to `±f64::MAX`.
    DoubleOverflow,
}

impl RangeAdjustment {
    /// Whether the literal value can no longer be read back exactly.
    pub fn is_lossy(self) -> bool {
        !matches!(self, RangeAdjustment::Wrapped)
    }

    /// Whether the value left the representable range, as opposed to the
    /// expected effects of projecting onto a 64-bit integer.
    pub fn is_out_of_range(self) -> bool {
        matches!(
            self,
            RangeAdjustment::ClampedToUnsignedMax
                | RangeAdjustment::ClampedToSignedMin
                | RangeAdjustment::DoubleOverflow
        )
    }
}

impl fmt::Display for RangeAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeAdjustment::Wrapped => f.write_str("wrapped into unsigned 64-bit band"),
            RangeAdjustment::ClampedToUnsignedMax => f.write_str("clamped to u64::MAX"),
            RangeAdjustment::ClampedToSignedMin => f.write_str("clamped to i64::MIN"),
            RangeAdjustment::Truncated => f.write_str("fraction truncated"),
            RangeAdjustment::DoubleOverflow => f.write_str("double clamped to f64::MAX"),
        }
    }
}

/// Canonical, range-safe representation of a number literal.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRepr {
    /// Signed 64-bit projection (see module docs for the range policy).
    pub int_value: i64,
    /// Closest finite double to the literal. Precision beyond 53 bits is lost.
    pub double_value: f64,
    /// `true` when `int_value` (read unsigned if wrapped) equals the literal.
    pub exact: bool,
    /// Integer range adjustment first, then truncation, then double overflow.
    pub adjustments: Vec<RangeAdjustment>,
    /// Original literal text, kept only when configured.
    pub source_text: Option<String>,
}

impl NumberRepr {
    /// The projection read as unsigned, as the runtime's `AsUint64` does.
    pub fn as_unsigned(&self) -> u64 {
        self.int_value as u64
    }

    /// Whether the projection lives in the unsigned band above `i64::MAX`.
    pub fn is_unsigned_band(&self) -> bool {
        self.adjustments.iter().any(|a| {
            matches!(
                a,
                RangeAdjustment::Wrapped | RangeAdjustment::ClampedToUnsignedMax
            )
        })
    }

    /// C++ expression for the integer field.
    ///
    /// `i64::MIN` cannot be written as a negated literal without overflow,
    /// so it gets a fixed encoding.
    pub fn int_literal(&self) -> String {
        if self.is_unsigned_band() {
            format!("int64_t( {}ull )", self.as_unsigned())
        } else if self.int_value == i64::MIN {
            "(-9223372036854775807ll - 1)".to_string()
        } else {
            self.int_value.to_string()
        }
    }

    /// C++ literal for the double field, in shortest round-trip form.
    pub fn double_literal(&self) -> String {
        format!("{:?}", self.double_value)
    }

    /// Pool key: the double and integer projections together.
    pub(crate) fn intern_key(&self) -> String {
        format!("{}|{}", self.double_literal(), self.int_value)
    }
}

/// Lexical shape of a JSON number literal.
struct Literal<'a> {
    negative: bool,
    integer_digits: &'a str,
    has_fraction_or_exponent: bool,
}

/// Scan `raw` against the JSON number grammar: `-? int frac? exp?`.
fn scan_literal(raw: &str) -> Option<Literal<'_>> {
    let bytes = raw.as_bytes();
    let mut pos = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos += 1;
    }

    let int_start = pos;
    match bytes.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => {
            while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
        }
        _ => return None,
    }
    let integer_digits = &raw[int_start..pos];

    let mut has_fraction_or_exponent = false;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let frac_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos == frac_start {
            return None;
        }
        has_fraction_or_exponent = true;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos == exp_start {
            return None;
        }
        has_fraction_or_exponent = true;
    }

    (pos == bytes.len()).then_some(Literal {
        negative,
        integer_digits,
        has_fraction_or_exponent,
    })
}

/// Parse decimal digits into a magnitude, saturating at `u64::MAX`.
/// Returns the magnitude and whether saturation happened.
fn saturating_magnitude(digits: &str) -> (u64, bool) {
    let mut acc: u64 = 0;
    for b in digits.bytes() {
        match acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
        {
            Some(v) => acc = v,
            None => return (u64::MAX, true),
        }
    }
    (acc, false)
}

/// Apply the signed range policy to a sign and magnitude.
fn project(negative: bool, magnitude: u64, saturated: bool) -> (i64, Option<RangeAdjustment>) {
    if negative {
        match magnitude.cmp(&SIGNED_MIN_MAGNITUDE) {
            std::cmp::Ordering::Greater => (i64::MIN, Some(RangeAdjustment::ClampedToSignedMin)),
            std::cmp::Ordering::Equal => (i64::MIN, None),
            std::cmp::Ordering::Less => (-(magnitude as i64), None),
        }
    } else if magnitude <= i64::MAX as u64 {
        (magnitude as i64, None)
    } else {
        // Two's-complement reinterpretation: magnitude - 2^64.
        let adjustment = if saturated {
            RangeAdjustment::ClampedToUnsignedMax
        } else {
            RangeAdjustment::Wrapped
        };
        (magnitude as i64, Some(adjustment))
    }
}

/// Normalize a number literal into its canonical representation.
///
/// Returns `None` when `raw` is not a JSON number literal.
pub(crate) fn normalize_number(raw: &str, keep_source_text: bool) -> Option<NumberRepr> {
    let literal = scan_literal(raw)?;
    // Grammar already checked; only overflow to infinity remains.
    let parsed: f64 = raw.parse().ok()?;

    let (magnitude, saturated, truncated) = if literal.has_fraction_or_exponent {
        let whole = parsed.trunc().abs();
        let saturated = whole >= UNSIGNED_CEILING;
        let magnitude = if saturated { u64::MAX } else { whole as u64 };
        (magnitude, saturated, parsed.is_finite() && parsed.fract() != 0.0)
    } else {
        let (magnitude, saturated) = saturating_magnitude(literal.integer_digits);
        (magnitude, saturated, false)
    };

    let (int_value, range) = project(literal.negative, magnitude, saturated);
    let mut adjustments: Vec<RangeAdjustment> = range.into_iter().collect();
    if truncated {
        adjustments.push(RangeAdjustment::Truncated);
    }
    let double_value = if parsed.is_finite() {
        parsed
    } else {
        adjustments.push(RangeAdjustment::DoubleOverflow);
        f64::MAX.copysign(parsed)
    };
    let exact = adjustments.iter().all(|a| !a.is_lossy());

    Some(NumberRepr {
        int_value,
        double_value,
        exact,
        adjustments,
        source_text: keep_source_text.then(|| raw.to_string()),
    })
}

/// Canonical form of a string leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRepr {
    pub text: String,
    /// Body of the C++ string literal, without surrounding quotes.
    pub escaped: String,
}

impl StringRepr {
    /// Storage size of the null-terminated runtime buffer.
    pub fn byte_len(&self) -> usize {
        self.text.len() + 1
    }
}

/// Validate UTF-8 and produce the escaped literal body.
pub(crate) fn normalize_string(raw: &[u8]) -> Result<StringRepr, Utf8Error> {
    let text = std::str::from_utf8(raw)?;
    Ok(StringRepr {
        text: text.to_string(),
        escaped: escape_string(text),
    })
}

/// Escape quote, backslash and the five C control escapes. All other bytes,
/// including NUL and non-ASCII UTF-8, pass through unchanged.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> NumberRepr {
        normalize_number(raw, false).unwrap()
    }

    fn adjustments(raw: &str) -> Vec<RangeAdjustment> {
        norm(raw).adjustments
    }

    #[test]
    fn small_integers_are_exact() {
        let n = norm("42");
        assert_eq!(n.int_value, 42);
        assert_eq!(n.double_value, 42.0);
        assert!(n.exact);
        assert!(n.adjustments.is_empty());
        assert_eq!(n.int_literal(), "42");
        assert_eq!(n.double_literal(), "42.0");
    }

    #[test]
    fn fraction_truncates_toward_zero() {
        assert_eq!(norm("3.7").int_value, 3);
        assert_eq!(norm("-2.5").int_value, -2);
        assert!(!norm("3.7").exact);
        assert!(norm("1.0").exact);
        assert!(norm("12e3").exact);
        assert_eq!(norm("12e3").int_value, 12_000);
    }

    #[test]
    fn truncation_is_recorded() {
        assert_eq!(adjustments("3.7"), vec![RangeAdjustment::Truncated]);
        assert_eq!(adjustments("-0.5"), vec![RangeAdjustment::Truncated]);
        assert!(adjustments("2.0").is_empty());
        assert!(adjustments("25e-1").contains(&RangeAdjustment::Truncated));
    }

    #[test]
    fn two_to_the_64_clamps_to_unsigned_max() {
        let n = norm("18446744073709551616");
        assert_eq!(n.as_unsigned(), u64::MAX);
        assert_eq!(n.int_value, -1);
        assert_eq!(n.adjustments, vec![RangeAdjustment::ClampedToUnsignedMax]);
        assert!(!n.exact);
        assert_eq!(n.int_literal(), "int64_t( 18446744073709551615ull )");
    }

    #[test]
    fn unsigned_band_wraps_reversibly() {
        let n = norm("9223372036854775808");
        assert_eq!(n.int_value, i64::MIN);
        assert_eq!(n.as_unsigned(), 1 << 63);
        assert_eq!(n.adjustments, vec![RangeAdjustment::Wrapped]);
        assert!(n.exact);
        assert_eq!(n.int_literal(), "int64_t( 9223372036854775808ull )");
    }

    #[test]
    fn signed_min_uses_fixed_encoding() {
        let n = norm("-9223372036854775808");
        assert_eq!(n.int_value, i64::MIN);
        assert!(n.adjustments.is_empty());
        assert_eq!(n.int_literal(), "(-9223372036854775807ll - 1)");
    }

    #[test]
    fn below_signed_min_clamps() {
        let n = norm("-9223372036854775809");
        assert_eq!(n.int_value, i64::MIN);
        assert_eq!(n.adjustments, vec![RangeAdjustment::ClampedToSignedMin]);
        let n = norm("-1e30");
        assert_eq!(n.int_value, i64::MIN);
        assert_eq!(n.adjustments, vec![RangeAdjustment::ClampedToSignedMin]);
    }

    #[test]
    fn large_exponent_saturates() {
        let n = norm("1e30");
        assert_eq!(n.as_unsigned(), u64::MAX);
        assert_eq!(n.adjustments, vec![RangeAdjustment::ClampedToUnsignedMax]);
    }

    #[test]
    fn intern_key_combines_projections() {
        assert_eq!(norm("1").intern_key(), norm("1.0").intern_key());
        assert_ne!(norm("1").intern_key(), norm("1.5").intern_key());
        assert_ne!(norm("0").intern_key(), norm("-0").intern_key());
    }

    #[test]
    fn source_text_only_when_requested() {
        assert_eq!(normalize_number("1.50", true).unwrap().source_text.as_deref(), Some("1.50"));
        assert_eq!(normalize_number("1.50", false).unwrap().source_text, None);
    }

    #[test]
    fn rejects_non_json_literals() {
        for raw in ["", "-", "01", "1.", ".5", "1e", "+1", "NaN", "inf", "0x10", "1 "] {
            assert_eq!(normalize_number(raw, false), None, "{raw:?}");
        }
    }

    #[test]
    fn overflowing_double_clamps_to_max() {
        let n = norm("1e400");
        assert_eq!(n.double_value, f64::MAX);
        assert_eq!(n.as_unsigned(), u64::MAX);
        assert_eq!(
            n.adjustments,
            vec![RangeAdjustment::ClampedToUnsignedMax, RangeAdjustment::DoubleOverflow]
        );
        assert_eq!(n.double_literal(), "1.7976931348623157e308");

        let n = norm("-1e400");
        assert_eq!(n.double_value, f64::MIN);
        assert_eq!(n.int_value, i64::MIN);
        assert_eq!(
            n.adjustments,
            vec![RangeAdjustment::ClampedToSignedMin, RangeAdjustment::DoubleOverflow]
        );
    }

    #[test]
    fn fractional_overflow_is_not_truncation() {
        assert!(!adjustments("1.5e400").contains(&RangeAdjustment::Truncated));
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(
            escape_string("a\"b\\c\n\r\t\x08\x0C"),
            "a\\\"b\\\\c\\n\\r\\t\\b\\f"
        );
        assert_eq!(escape_string("caf\u{e9}\0"), "caf\u{e9}\0");
    }

    #[test]
    fn string_byte_len_counts_terminator() {
        let s = normalize_string("caf\u{e9}".as_bytes()).unwrap();
        assert_eq!(s.byte_len(), 6);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(normalize_string(&[0x66, 0xff]).is_err());
    }
}
