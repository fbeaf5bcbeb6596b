use gerber_core::Gerber;

/// D-codes below 10 are reserved for the fixed G/D function codes and are
/// never valid aperture selects.
const BELOW_RANGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
D9*
X00000000Y00000000D03*
M02*
";

#[test]
fn dcode_below_ten_warns_and_still_selects() {
    let gerber = Gerber::parse_str(BELOW_RANGE).unwrap();
    let interpreter = gerber.interpret();

    assert!(interpreter
        .diagnostics
        .iter()
        .any(|d| d.message.contains("outside the valid aperture range")));
    // The flash is still attempted against the out-of-range selection, and
    // warns again for lacking a defined aperture rather than panicking.
    assert!(interpreter.diagnostics.iter().any(|d| d.message.contains("undefined aperture")));
}

/// D-codes above 999 are likewise out of range.
const ABOVE_RANGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
D1000*
X00000000Y00000000D03*
M02*
";

#[test]
fn dcode_above_999_warns() {
    let gerber = Gerber::parse_str(ABOVE_RANGE).unwrap();
    let interpreter = gerber.interpret();

    assert!(interpreter
        .diagnostics
        .iter()
        .any(|d| d.message.contains("outside the valid aperture range")));
}

/// Selecting an in-range D-code that was never defined by an AD command is
/// a warning, not a fatal error, and flashing against it still records the
/// flash (matching permissive real-world Gerber readers).
const SELECTED_BUT_UNDEFINED: &str = "\
%MOMM*%
%FSLAX26Y26*%
D15*
X00000000Y00000000D03*
M02*
";

#[test]
fn in_range_but_undefined_dcode_warns_without_failing_the_parse() {
    let gerber = Gerber::parse_str(SELECTED_BUT_UNDEFINED).unwrap();
    let interpreter = gerber.interpret();

    assert_eq!(interpreter.items.len(), 1);
    assert!(interpreter
        .diagnostics
        .iter()
        .any(|d| d.message.contains("selected before being defined")));
    assert!(interpreter.diagnostics.iter().any(|d| d.message.contains("undefined aperture")));
}
