//! EMU/inch conversion.
//!
//! OOXML transforms measure position and extent in English Metric Units
//! (914400 per inch). Values crossing the edit boundary are inches; values
//! written into slide XML must be integer EMUs. A fractional or non-numeric
//! EMU attribute can make the package unopenable, so every conversion here
//! rounds or coerces to a safe integer.

pub const EMU_PER_INCH: i64 = 914_400;

/// Convert inches to integer EMUs, rounding to nearest.
///
/// Non-finite input (NaN, infinity) coerces to 0 rather than poisoning the
/// serialized output.
pub fn to_emu(inches: f64) -> i64 {
    if !inches.is_finite() {
        return 0;
    }
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// Convert integer EMUs to inches.
pub fn to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Tolerantly parse an EMU attribute value.
///
/// Accepts plain integers, falls back to float-parse-and-round for values
/// contaminated by earlier floating-point math, and coerces anything else
/// to 0.
pub fn parse_emu(text: &str) -> i64 {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.round() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_inch_is_914400_emu() {
        assert_eq!(to_emu(1.0), 914_400);
        assert_eq!(to_inches(914_400), 1.0);
    }

    #[test]
    fn to_emu_rounds_to_nearest() {
        // 0.5in + half an EMU must not truncate down
        let just_over = (457_200.6) / EMU_PER_INCH as f64;
        assert_eq!(to_emu(just_over), 457_201);
    }

    #[test]
    fn non_finite_input_coerces_to_zero() {
        assert_eq!(to_emu(f64::NAN), 0);
        assert_eq!(to_emu(f64::INFINITY), 0);
        assert_eq!(to_emu(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn parse_emu_accepts_integers_floats_and_garbage() {
        assert_eq!(parse_emu("914400"), 914_400);
        assert_eq!(parse_emu(" 914400 "), 914_400);
        assert_eq!(parse_emu("914400.4"), 914_400);
        assert_eq!(parse_emu("914400.6"), 914_401);
        assert_eq!(parse_emu("-457200"), -457_200);
        assert_eq!(parse_emu("NaN"), 0);
        assert_eq!(parse_emu("abc"), 0);
        assert_eq!(parse_emu(""), 0);
    }

    proptest! {
        // A 10in x 7.5in canvas tops out below 10_000_000 EMU; leave headroom
        // well past that so oversized decks round-trip too.
        #[test]
        fn emu_round_trip_is_exact(emu in -50_000_000i64..50_000_000i64) {
            prop_assert_eq!(to_emu(to_inches(emu)), emu);
        }

        #[test]
        fn parse_emu_round_trips_integer_strings(emu in -50_000_000i64..50_000_000i64) {
            prop_assert_eq!(parse_emu(&emu.to_string()), emu);
        }
    }
}
