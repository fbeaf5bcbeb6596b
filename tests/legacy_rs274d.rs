use gerber_core::command::Unit;
use gerber_core::draw_item::DrawItem;
use gerber_core::Gerber;

/// `G54Dnn` is the RS-274D spelling of a bare aperture select; `G55` is the
/// recognized-but-inert photo-mode toggle.
const LEGACY_TOOL_SELECT: &str = "\
%MOMM*%
%FSLAX26Y26*%
%ADD10C,0.1*%
G54D10*
G55*
X00000000Y00000000D03*
M02*
";

#[test]
fn g54_selects_an_aperture_like_a_bare_dcode() {
    let gerber = Gerber::parse_str(LEGACY_TOOL_SELECT).unwrap();
    let interpreter = gerber.interpret();

    assert_eq!(interpreter.context.current_aperture, Some(10));
    assert_eq!(interpreter.items.len(), 1);
    assert!(matches!(interpreter.items[0], DrawItem::Flash(..)));
    assert!(interpreter.diagnostics.is_empty(), "a defined, in-range aperture should not warn: {:?}", interpreter.diagnostics);
}

/// `G70`/`G71` are the legacy unit-selection codes, predating `%MO%`.
const LEGACY_UNITS: &str = "\
%FSLAX26Y26*%
G70*
%ADD10C,0.1*%
D10*
X01000000Y00000000D02*
G71*
X00000000Y00000000D02*
M02*
";

#[test]
fn g70_and_g71_switch_the_active_unit_system() {
    let gerber = Gerber::parse_str(LEGACY_UNITS).unwrap();
    let interpreter = gerber.interpret();
    // The stream ends under G71 (millimeters); G70 (inches) was only in
    // effect for the first move.
    assert_eq!(interpreter.context.units, Unit::Millimeters);
}

/// `G90`/`G91` are the legacy absolute/incremental coordinate mode codes.
const LEGACY_COORD_MODE: &str = "\
%MOMM*%
%FSLAX26Y26*%
G91*
%ADD10C,0.1*%
D10*
X01000000Y00000000D02*
G90*
X00000000Y00000000D02*
M02*
";

#[test]
fn g90_and_g91_toggle_absolute_vs_incremental_mode() {
    let gerber = Gerber::parse_str(LEGACY_COORD_MODE).unwrap();
    let interpreter = gerber.interpret();
    // The stream ends under G90 (absolute).
    assert!(interpreter.context.format.absolute);
}
