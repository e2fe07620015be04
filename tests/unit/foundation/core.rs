use super::*;

#[test]
fn approx_eq_tolerates_sub_epsilon_noise() {
    assert!(approx_eq(1.0, 1.0));
    assert!(approx_eq(1.0, 1.0 + EQUIV_EPSILON / 2.0));
    assert!(!approx_eq(1.0, 1.0 + EQUIV_EPSILON * 2.0));
    assert!(!approx_eq(0.0, -0.01));
}

#[test]
fn frame_index_orders_by_position() {
    assert!(FrameIndex(3) < FrameIndex(7));
    assert_eq!(FrameIndex::default(), FrameIndex(0));
}
