const UNIT: f64 = 1000.0;
const SCALED: [&str; 4] = ["k", "M", "G", "T"];
const TOP: &str = "P";

/// Renders a byte rate with decimal (1000-based) prefixes.
///
/// Sub-1000 values have no decimal place, scaled values have one. A value
/// that would round to 1000 of one unit is shown in the next unit. Anything
/// beyond peta stays expressed in `P`.
pub fn format_bandwidth(bytes_per_sec: f64) -> String {
    if bytes_per_sec.round() < UNIT {
        return format!("{bytes_per_sec:.0}");
    }

    let mut div = UNIT;
    for suffix in SCALED {
        let scaled = bytes_per_sec / div;
        if (scaled * 10.0).round() / 10.0 < UNIT {
            return format!("{scaled:.1}{suffix}");
        }
        div *= UNIT;
    }
    format!("{:.1}{TOP}", bytes_per_sec / div)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bandwidth() {
        let cases = [
            (0.0, "0"),
            (500.0, "500"),
            (999.0, "999"),
            (1000.0, "1.0k"),
            (1500.0, "1.5k"),
            (1_000_000.0, "1.0M"),
            (2_500_000.0, "2.5M"),
            (1_500_000_000.0, "1.5G"),
            (3_000_000_000_000.0, "3.0T"),
            (2_000_000_000_000_000.0, "2.0P"),
        ];
        for (input, want) in cases {
            assert_eq!(format_bandwidth(input), want, "input {input}");
        }
    }

    #[test]
    fn test_rounding_up_moves_to_next_unit() {
        assert_eq!(format_bandwidth(999.4), "999");
        assert_eq!(format_bandwidth(999.6), "1.0k");
        assert_eq!(format_bandwidth(999_960.0), "1.0M");
        assert_eq!(format_bandwidth(999_900.0), "999.9k");
    }

    #[test]
    fn test_beyond_peta_stays_in_peta() {
        assert_eq!(format_bandwidth(5e18), "5000.0P");
    }
}
