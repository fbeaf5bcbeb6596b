use gerber_core::context::Point;
use gerber_core::coordinate::UNIT_SCALE_MM;
use gerber_core::draw_item::DrawItem;
use gerber_core::Gerber;

fn mm(value: f64) -> i64 {
    (value * UNIT_SCALE_MM).round() as i64
}

/// A full circle of 1mm radius traced as two clockwise semicircular arcs in
/// multi-quadrant mode: I/J are direct signed offsets from each arc's own
/// start point.
const MULTI_QUADRANT_ARC: &str = "\
%MOMM*%
%FSLAX26Y26*%
%ADD10C,0.1*%
D10*
G75*
X00000000Y00000000D02*
G02*
X02000000Y00000000I01000000J00000000D01*
X00000000Y00000000I-01000000J00000000D01*
M02*
";

#[test]
fn multi_quadrant_arc_center_is_direct_offset() {
    let gerber = Gerber::parse_str(MULTI_QUADRANT_ARC).unwrap();
    let interpreter = gerber.interpret();

    let arcs: Vec<_> = interpreter
        .items
        .iter()
        .filter_map(|item| match item {
            DrawItem::Arc(arc, ..) => Some(arc),
            _ => None,
        })
        .collect();
    assert_eq!(arcs.len(), 2);
    assert_eq!(arcs[0].center, Point { x: mm(1.0), y: mm(0.0) });
    // Each arc's center is independently rounded from its own start point and
    // I/J offset, so the second arc's center can land within a unit of the
    // first's rather than matching it exactly.
    assert!((arcs[1].center.x - arcs[0].center.x).abs() <= 1);
    assert!((arcs[1].center.y - arcs[0].center.y).abs() <= 1);
    assert!(arcs[0].clockwise);
    assert!(arcs[0].multi_quadrant, "G75 should mark arcs as multi-quadrant");
}

/// The same semicircle in single-quadrant mode: I/J carry only magnitude,
/// and the sign must be recovered from which quadrant the end point falls
/// in relative to the start point (covered exhaustively for all four signs
/// in `interpreter`'s own unit tests; this just confirms the full pipeline
/// wires G02 without G75 through to the same arc_center logic).
const SINGLE_QUADRANT_ARC: &str = "\
%MOMM*%
%FSLAX26Y26*%
%ADD10C,0.1*%
D10*
X00000000Y00000000D02*
G02*
X02000000Y00000000I01000000J00000000D01*
M02*
";

#[test]
fn single_quadrant_arc_recovers_center_from_end_point_quadrant() {
    let gerber = Gerber::parse_str(SINGLE_QUADRANT_ARC).unwrap();
    let interpreter = gerber.interpret();

    let arc = interpreter
        .items
        .iter()
        .find_map(|item| match item {
            DrawItem::Arc(arc, ..) => Some(arc),
            _ => None,
        })
        .expect("should have emitted one arc");

    assert_eq!(arc.center, Point { x: mm(1.0), y: mm(0.0) });
    assert!(!arc.multi_quadrant, "no G75 was issued, so the arc should be single-quadrant");
}

/// G74 switches back to single-quadrant mode and resets interpolation to
/// linear, just as the initial (pre-G75) state is.
const G75_THEN_G74: &str = "\
%MOMM*%
%FSLAX26Y26*%
%ADD10C,0.1*%
D10*
G75*
X00000000Y00000000D02*
G02*
X02000000Y00000000I01000000J00000000D01*
G74*
X00000000Y00000000I01000000J00000000D01*
M02*
";

#[test]
fn g74_restores_single_quadrant_mode_after_g75() {
    let gerber = Gerber::parse_str(G75_THEN_G74).unwrap();
    let interpreter = gerber.interpret();

    let arcs: Vec<_> = interpreter
        .items
        .iter()
        .filter_map(|item| match item {
            DrawItem::Arc(arc, ..) => Some(arc),
            _ => None,
        })
        .collect();
    assert_eq!(arcs.len(), 1, "G74 resets interpolation to linear, so the second move is a segment");

    let segments: Vec<_> = interpreter
        .items
        .iter()
        .filter(|item| matches!(item, DrawItem::Segment(..)))
        .collect();
    assert_eq!(segments.len(), 1);
    assert!(arcs[0].multi_quadrant);
}

/// A closed triangular region: G36/G37 must accumulate the D02 start point
/// plus every D01 move into a single outline, not three separate segments.
const REGION: &str = "\
%MOMM*%
%FSLAX26Y26*%
G36*
X00000000Y00000000D02*
G01*
X01000000Y00000000D01*
X01000000Y01000000D01*
X00000000Y00000000D01*
G37*
M02*
";

#[test]
fn region_statement_produces_one_outline_not_three_segments() {
    let gerber = Gerber::parse_str(REGION).unwrap();
    let interpreter = gerber.interpret();

    assert_eq!(interpreter.items.len(), 1);
    match &interpreter.items[0] {
        DrawItem::Region(region, ..) => assert_eq!(region.outline.len(), 4),
        other => panic!("expected a region, got {:?}", other),
    }
}

/// An unclosed region (fewer than 3 vertices accumulated before G37) should
/// warn rather than silently emit a degenerate polygon.
const DEGENERATE_REGION: &str = "\
%MOMM*%
%FSLAX26Y26*%
G36*
X00000000Y00000000D02*
G37*
M02*
";

#[test]
fn degenerate_region_is_dropped_with_a_diagnostic() {
    let gerber = Gerber::parse_str(DEGENERATE_REGION).unwrap();
    let interpreter = gerber.interpret();

    assert!(interpreter.items.is_empty());
    assert!(interpreter.diagnostics.iter().any(|d| d.message.contains("fewer than 3 vertices")));
}
