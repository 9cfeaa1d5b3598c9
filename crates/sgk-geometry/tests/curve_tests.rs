use approx::assert_relative_eq;
use sgk_geometry::curve::operations::connect_from_curve_to_point_c2;
use sgk_geometry::tessellate::sample_by_arc_length;
use sgk_geometry::{
    BezierCurve, ClampedBSpline, ControlHandle, CubicBezier, ParamCurve, Spline, SplineCurve,
    SplineEnd, SplineType,
};
use sgk_math::{dvec2, dvec3, DVec3};

fn helix_points() -> Vec<DVec3> {
    (0..6)
        .map(|i| {
            let a = i as f64 * 0.9;
            dvec3(a.cos() * 2.0, a.sin() * 2.0, i as f64 * 0.5)
        })
        .collect()
}

fn assert_close(a: DVec3, b: DVec3, eps: f64) {
    assert!((a - b).length() < eps, "{:?} != {:?}", a, b);
}

#[test]
fn test_de_casteljau_matches_bernstein_in_3d() {
    let quartic = BezierCurve::<DVec3, 5>::new([
        dvec3(0.0, 0.0, 0.0),
        dvec3(1.0, 2.0, -1.0),
        dvec3(2.0, -1.0, 3.0),
        dvec3(4.0, 1.0, 0.5),
        dvec3(5.0, 0.0, 0.0),
    ]);
    for i in 0..=20 {
        let t = i as f64 / 20.0;
        assert_close(quartic.position_iteratively(t), quartic.position_directly(t), 1e-12);
    }
}

#[test]
fn test_cubic_split_round_trip() {
    let curve = CubicBezier::new([
        dvec3(0.0, 0.0, 0.0),
        dvec3(1.0, 1.0, 1.0),
        dvec3(2.0, 1.0, -1.0),
        dvec3(3.0, 0.0, 0.0),
    ]);
    let (left, right) = curve.split(0.3);
    for i in 0..=10 {
        let u = i as f64 / 10.0;
        assert_close(left.position(u), curve.position(0.3 * u), 1e-12);
        assert_close(right.position(u), curve.position(0.3 + 0.7 * u), 1e-12);
    }
}

#[test]
fn test_knot_insertion_keeps_bezier_decomposition() {
    let mut spline = ClampedBSpline::from_points(3, &helix_points());
    let before = spline.clone();
    spline.add_point_with_param_without_changing_shape(1.25).unwrap();
    spline.add_point_with_param_without_changing_shape(2.5).unwrap();
    assert_eq!(spline.num_points(), 8);

    let segments = spline.to_bezier_curves::<4>().unwrap();
    let breaks: Vec<f64> = spline.knots().to_vec();
    assert_eq!(segments.len(), breaks.len() - 1);
    for (seg, w) in segments.iter().zip(breaks.windows(2)) {
        for i in 0..=4 {
            let u = i as f64 / 4.0;
            let t = w[0] + (w[1] - w[0]) * u;
            assert_close(seg.position(u), before.position(t), 1e-9);
        }
    }

    assert!(spline.remove_knot(2.5, 1e-9));
    assert!(spline.remove_knot(1.25, 1e-9));
    assert_eq!(spline.knots(), before.knots());
}

#[test]
fn test_handle_edit_keeps_edited_joint_c2() {
    let mut spline = Spline::from_points(SplineType::BezierString, &helix_points());
    let handle = spline.as_bezier_string().unwrap().ctrl_points_next()[2];
    spline
        .adjust_ctrl_point_pos(
            handle,
            handle + dvec3(0.4, -0.2, 0.3),
            ControlHandle::Next,
            0,
            1e-12,
        )
        .unwrap();

    let string = spline.as_bezier_string().unwrap();
    let segments = string.to_bezier_curves();
    for pair in segments.windows(2) {
        assert_close(pair[0].position(1.0), pair[1].position(0.0), 1e-12);
        assert_close(pair[0].tangent(1.0), pair[1].tangent(0.0), 1e-9);
    }
    // Segments 1 and 2 meet at the edited node.
    assert_close(segments[1].second_derivative(1.0), segments[2].second_derivative(0.0), 1e-9);
    // Joints away from the edit keep the fitted curvature.
    for pair in segments[3..].windows(2) {
        assert_close(pair[0].second_derivative(1.0), pair[1].second_derivative(0.0), 1e-9);
    }
}

#[test]
fn test_appended_string_is_c2_everywhere() {
    let spline = Spline::from_points(SplineType::BezierString, &helix_points());
    let segments = spline.as_bezier_string().unwrap().to_bezier_curves();
    for pair in segments.windows(2) {
        assert_close(pair[0].tangent(1.0), pair[1].tangent(0.0), 1e-9);
        assert_close(pair[0].second_derivative(1.0), pair[1].second_derivative(0.0), 1e-9);
    }
    for (i, p) in helix_points().iter().enumerate() {
        assert_close(spline.position(i as f64), *p, 1e-12);
    }
}

#[test]
fn test_split_is_continuous_for_both_types() {
    for ty in [SplineType::ClampedBSpline, SplineType::BezierString] {
        let spline = Spline::from_points(ty, &helix_points());
        let (first, second) = spline.split(2.4).unwrap();
        let at = spline.position(2.4);
        assert_close(first.endpoint(SplineEnd::End).unwrap(), at, 1e-9);
        assert_close(second.endpoint(SplineEnd::Start).unwrap(), at, 1e-9);
        assert_close(first.position(1.0), spline.position(1.0), 1e-9);
        assert_close(second.position(2.8), spline.position(2.8), 1e-9);
    }
}

#[test]
fn test_reverse_twice_is_identity_for_both_types() {
    for ty in [SplineType::ClampedBSpline, SplineType::BezierString] {
        let original = Spline::from_points(ty, &helix_points());
        let mut spline = original.clone();
        spline.reverse();
        let (t0, t1) = spline.param_range();
        assert_close(spline.position(t0), original.position(t1), 1e-12);
        spline.reverse();
        assert_eq!(spline.ctrl_points(), original.ctrl_points());
        assert_eq!(spline.param_range(), original.param_range());
        assert_close(spline.position(1.7), original.position(1.7), 1e-9);
    }
}

#[test]
fn test_arc_length_samples_invert() {
    let spline = Spline::from_points(SplineType::BezierString, &helix_points());
    let total = spline.total_length();
    let samples = sample_by_arc_length(&spline, 9);
    assert_eq!(samples.len(), 9);
    for (i, (t, p)) in samples.iter().enumerate() {
        assert_relative_eq!(spline.length(*t), total * i as f64 / 8.0, epsilon = 1e-6);
        assert_close(*p, spline.position(*t), 1e-12);
    }
}

#[test]
fn test_connector_to_point() {
    let curve = CubicBezier::new([
        dvec2(0.0, 0.0),
        dvec2(1.0, 1.0),
        dvec2(2.0, 1.0),
        dvec2(3.0, 0.0),
    ]);
    let next = connect_from_curve_to_point_c2(&curve, dvec2(5.0, 0.0)).unwrap();
    assert!(next.ctrl_point(3).distance_squared(dvec2(5.0, 0.0)) < 1e-18);
    assert!((next.tangent(0.0) - curve.tangent(1.0)).length() < 1e-9);
    assert!((next.second_derivative(0.0) - curve.second_derivative(1.0)).length() < 1e-9);
}
