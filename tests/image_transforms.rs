use gerber_core::coordinate::UNIT_SCALE_MM;
use gerber_core::draw_item::{DrawItem, Polarity};
use gerber_core::Gerber;

fn mm(value: f64) -> i64 {
    (value * UNIT_SCALE_MM).round() as i64
}

/// Coordinates are rounded to internal units at decode time and again after
/// the image transform is applied, so a value derived from two chained
/// roundings can land within a unit of the single-rounding expectation.
fn assert_near(actual: i64, expected: i64) {
    assert!((actual - expected).abs() <= 1, "expected {} to be within 1 of {}", actual, expected);
}

/// `%OF%` translates every image coordinate by a fixed offset in the active
/// unit system, applied after any scale/mirror/rotation.
const OFFSET_IMAGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
%OFA0.5B0.25*%
%ADD10C,0.1*%
D10*
X01000000Y02000000D03*
M02*
";

#[test]
fn of_translates_the_flashed_position() {
    let gerber = Gerber::parse_str(OFFSET_IMAGE).unwrap();
    let interpreter = gerber.interpret();

    match &interpreter.items[0] {
        DrawItem::Flash(flash, ..) => {
            assert_near(flash.position.x, mm(1.5));
            assert_near(flash.position.y, mm(2.25));
        }
        other => panic!("expected a flash, got {:?}", other),
    }
}

/// `%MI%` mirrors an axis before the offset is applied.
const MIRRORED_IMAGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
%MIA1B0*%
%ADD10C,0.1*%
D10*
X01000000Y02000000D03*
M02*
";

#[test]
fn mi_mirrors_the_a_axis_before_offset() {
    let gerber = Gerber::parse_str(MIRRORED_IMAGE).unwrap();
    let interpreter = gerber.interpret();

    match &interpreter.items[0] {
        DrawItem::Flash(flash, ..) => {
            assert_near(flash.position.x, mm(-1.0));
            assert_near(flash.position.y, mm(2.0));
        }
        other => panic!("expected a flash, got {:?}", other),
    }
}

/// `%SF%` scales both axes uniformly before mirroring/rotation/offset.
const SCALED_IMAGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
%SFA2.0B2.0*%
%ADD10C,0.1*%
D10*
X01000000Y02000000D03*
M02*
";

#[test]
fn sf_scales_the_flashed_position() {
    let gerber = Gerber::parse_str(SCALED_IMAGE).unwrap();
    let interpreter = gerber.interpret();

    match &interpreter.items[0] {
        DrawItem::Flash(flash, ..) => {
            assert_near(flash.position.x, mm(2.0));
            assert_near(flash.position.y, mm(4.0));
        }
        other => panic!("expected a flash, got {:?}", other),
    }
}

/// `%IP%NEG*%` inverts the effective polarity of every object in the image.
const NEGATIVE_IMAGE: &str = "\
%MOMM*%
%FSLAX26Y26*%
%IPNEG*%
%ADD10C,0.1*%
D10*
X00000000Y00000000D03*
M02*
";

#[test]
fn ip_neg_inverts_effective_polarity() {
    let gerber = Gerber::parse_str(NEGATIVE_IMAGE).unwrap();
    let interpreter = gerber.interpret();

    match &interpreter.items[0] {
        DrawItem::Flash(_, polarity, _) => assert_eq!(*polarity, Polarity::Clear),
        other => panic!("expected a flash, got {:?}", other),
    }
}
