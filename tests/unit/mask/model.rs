use super::*;

#[test]
fn point_equivalence_uses_epsilon() {
    let a = ControlPoint::new(10.0, 20.0).with_handles((1.0, 0.0), (-1.0, 0.0));
    let mut b = a;
    b.x += 0.0001;
    assert!(a.equivalent(&b));
    assert_ne!(a, b);
    b.control_out_y = 0.5;
    assert!(!a.equivalent(&b));
}

#[test]
fn handles_are_relative_offsets() {
    let p = ControlPoint::new(4.0, 5.0).with_handles((-2.0, 0.0), (0.0, 3.0));
    assert_eq!(p.in_handle(), Point::new(2.0, 5.0));
    assert_eq!(p.out_handle(), Point::new(4.0, 8.0));
}

#[test]
fn submask_equivalence_requires_same_length() {
    let a = Submask::new(vec![ControlPoint::new(0.0, 0.0), ControlPoint::new(1.0, 1.0)]);
    let b = Submask::new(vec![ControlPoint::new(0.0, 0.0)]);
    assert!(!a.equivalent(&b));
    assert!(a.equivalent(&a.clone()));
}

#[test]
fn mode_classification() {
    assert!(MaskMode::FillPathSubtract.is_path());
    assert!(MaskMode::FillPathSubtract.is_subtract());
    assert!(MaskMode::FillAlphaMultiply.is_alpha());
    assert!(!MaskMode::FillAlphaMultiply.is_subtract());
    assert!(!MaskMode::None.is_path() && !MaskMode::None.is_alpha());
}

#[test]
fn params_validate_clamps_opacity_and_rejects_negative_feather() {
    let p = MaskParams {
        mode: MaskMode::FillAlphaMultiply,
        opacity: 140.0,
        feather: 0.0,
        path_radius: 1.0,
    };
    assert_eq!(p.validate().unwrap().opacity, 100.0);
    assert!(
        MaskParams {
            feather: -1.0,
            ..p
        }
        .validate()
        .is_err()
    );
    assert!(
        MaskParams {
            path_radius: f64::NAN,
            ..p
        }
        .validate()
        .is_err()
    );
}

#[test]
fn resolve_rejects_too_many_submasks() {
    let kf = MaskKeyframe::new(vec![Submask::default(); MAX_SUBMASKS + 1]);
    let err = resolve(&kf, FrameIndex(0), MaskMode::FillAlphaMultiply).unwrap_err();
    assert!(err.to_string().contains("exceed"));

    let kf = MaskKeyframe::new(vec![Submask::default(); MAX_SUBMASKS]);
    let (_, submasks) = resolve(&kf, FrameIndex(0), MaskMode::FillAlphaMultiply).unwrap();
    assert_eq!(submasks.len(), MAX_SUBMASKS);
}

#[test]
fn keyframe_defaults_match_a_fresh_mask() {
    let kf = MaskKeyframe::default();
    assert_eq!(kf.opacity(FrameIndex(9)), 100.0);
    assert_eq!(kf.feather(FrameIndex(9)), 0.0);
    assert_eq!(kf.path_radius(FrameIndex(9)), 1.0);
    assert!(kf.points(3, FrameIndex(0)).is_empty());
}
