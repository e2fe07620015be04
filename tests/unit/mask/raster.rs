use super::*;

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Submask {
    Submask::new(vec![
        ControlPoint::new(x0, y0),
        ControlPoint::new(x1, y0),
        ControlPoint::new(x1, y1),
        ControlPoint::new(x0, y1),
    ])
}

fn params(mode: MaskMode, width: usize) -> RasterParams {
    RasterParams {
        mode,
        opacity: 100.0,
        path_radius: 1.0,
        width,
    }
}

fn rasterize_rows(
    submasks: &[Submask],
    p: &RasterParams,
    height: usize,
    packages: &[Range<usize>],
) -> Vec<u8> {
    let outlines = tessellate(submasks, p.mode).unwrap();
    let mut out = vec![0u8; p.width * height];
    let mut scratch = ScratchBuffer::new();
    for rows in packages {
        let block = &mut out[rows.start * p.width..rows.end * p.width];
        rasterize_package(&mut scratch, rows.clone(), block, &outlines, p).unwrap();
    }
    out
}

#[test]
fn closed_modes_connect_back_to_first_point() {
    let outlines = tessellate(&[square(0.0, 0.0, 4.0, 4.0)], MaskMode::FillAlphaMultiply).unwrap();
    assert_eq!(outlines.len(), 1);
    assert_eq!(outlines[0].pixel_value, 1);
    assert_eq!(outlines[0].lines.len(), 4);
    assert_eq!(outlines[0].lines[3].1, OsPoint { x: 0, y: 0 });

    let outlines = tessellate(&[square(0.0, 0.0, 4.0, 4.0)], MaskMode::FillPathMultiply).unwrap();
    assert_eq!(outlines[0].lines.len(), 3);
}

#[test]
fn degenerate_submasks_are_skipped_but_keep_their_tag() {
    let lonely = Submask::new(vec![ControlPoint::new(1.0, 1.0)]);
    let outlines = tessellate(
        &[lonely, square(0.0, 0.0, 2.0, 2.0)],
        MaskMode::FillAlphaSubtract,
    )
    .unwrap();
    assert_eq!(outlines.len(), 1);
    assert_eq!(outlines[0].pixel_value, 2);
}

#[test]
fn curved_segments_subdivide_by_rounded_length() {
    let from = ControlPoint::new(0.0, 0.0).with_handles((0.0, 0.0), (2.0, 3.0));
    let to = ControlPoint::new(10.4, 0.0);
    let outlines = tessellate(
        &[Submask::new(vec![from, to])],
        MaskMode::FillPathMultiply,
    )
    .unwrap();
    assert_eq!(outlines[0].lines.len(), 10);
    assert_eq!(outlines[0].lines[9].1, OsPoint { x: 83, y: 0 });
}

#[test]
fn toggle_line_is_half_open_and_self_cancelling() {
    let mut crossings = vec![Vec::new(); 8];
    let a = OsPoint { x: 2, y: 1 };
    let b = OsPoint { x: 2, y: 5 };
    draw_toggle_line(&mut crossings, 0, 8, a, b);
    let hit = (0..8).filter(|&y| crossings[y] == [2]).collect::<Vec<_>>();
    assert_eq!(hit, vec![1, 2, 3, 4]);

    draw_toggle_line(&mut crossings, 0, 8, b, a);
    let mut row = [0u8; 8];
    for y in 0..8 {
        parity_fill_row(&mut row, &mut crossings[y], 3);
    }
    assert_eq!(row, [0; 8]);
}

#[test]
fn toggle_line_respects_plane_origin() {
    let mut crossings = vec![Vec::new(); 2];
    draw_toggle_line(&mut crossings, 8, 4, OsPoint { x: 1, y: 0 }, OsPoint { x: 1, y: 20 });
    assert_eq!(crossings, vec![vec![1], vec![1]]);
}

#[test]
fn toggle_line_clamps_to_plane_edges() {
    let mut crossings = vec![Vec::new(); 1];
    draw_toggle_line(&mut crossings, 0, 4, OsPoint { x: 9, y: 0 }, OsPoint { x: 9, y: 1 });
    draw_toggle_line(&mut crossings, 0, 4, OsPoint { x: -3, y: 0 }, OsPoint { x: -3, y: 1 });
    assert_eq!(crossings[0], vec![4, 0]);
}

#[test]
fn toggle_line_survives_extreme_coordinates() {
    let mut crossings = vec![Vec::new(); 4];
    let a = OsPoint { x: i64::MIN, y: i64::MIN };
    let b = OsPoint { x: i64::MAX, y: i64::MAX };
    draw_toggle_line(&mut crossings, 0, 16, a, b);
    assert!(crossings.iter().all(|row| row.len() == 1 && row[0] <= 16));
}

#[test]
fn thick_line_paints_radius_rectangle() {
    let mut plane = Plane::<u8>::try_new(16, 16, 1).unwrap();
    draw_thick_line(&mut plane, 0, OsPoint { x: 4, y: 8 }, OsPoint { x: 10, y: 8 }, 2, 5);
    let lit = plane.as_slice().iter().filter(|&&v| v == 5).count();
    assert_eq!(lit, 4 * 10);
    assert_eq!(plane.get(2, 6), 5);
    assert_eq!(plane.get(11, 9), 5);
    assert_eq!(plane.get(12, 9), 0);
}

#[test]
fn thick_line_with_zero_radius_draws_nothing() {
    let mut plane = Plane::<u8>::try_new(8, 8, 1).unwrap();
    draw_thick_line(&mut plane, 0, OsPoint { x: 0, y: 0 }, OsPoint { x: 7, y: 7 }, 0, 1);
    assert!(plane.as_slice().iter().all(|&v| v == 0));
}

#[test]
fn parity_fill_is_half_open() {
    let mut row = [0u8; 6];
    parity_fill_row(&mut row, &mut vec![4, 1], 1);
    assert_eq!(row, [0, 1, 1, 1, 0, 0]);
}

#[test]
fn parity_fill_ignores_last_unmatched_crossing() {
    let mut row = [0u8; 6];
    parity_fill_row(&mut row, &mut vec![0, 2, 4], 1);
    assert_eq!(row, [1, 1, 0, 0, 0, 0]);
}

#[test]
fn parity_fill_leaves_single_crossing_alone() {
    let mut row = [0u8; 4];
    let mut crossings = vec![2];
    parity_fill_row(&mut row, &mut crossings, 2);
    assert_eq!(row, [0; 4]);
    assert!(crossings.is_empty());
}

#[test]
fn coincident_crossings_cancel() {
    let mut row = [0u8; 6];
    parity_fill_row(&mut row, &mut vec![3, 1, 3, 4], 1);
    assert_eq!(row, [0, 1, 1, 1, 0, 0]);
}

#[test]
fn parity_fill_keeps_earlier_coverage() {
    let mut row = [5u8; 6];
    parity_fill_row(&mut row, &mut vec![1, 4], 1);
    assert_eq!(row, [5, 1, 1, 1, 5, 5]);
}

#[test]
fn span_closed_at_the_border_reaches_the_last_column() {
    let mut row = [0u8; 6];
    parity_fill_row(&mut row, &mut vec![2, 6], 1);
    assert_eq!(row, [0, 0, 1, 1, 1, 1]);
}

#[test]
fn downsample_averages_blocks() {
    let mut plane = Plane::<u8>::try_new(OVERSAMPLE * 2, OVERSAMPLE, 1).unwrap();
    for y in 0..OVERSAMPLE {
        plane.row_mut(y)[..OVERSAMPLE + OVERSAMPLE / 2].fill(1);
    }
    let mut out = [0u8; 2];
    downsample(&plane, &mut out, 2, 255u8, false);
    assert_eq!(out, [255, 127]);
    downsample(&plane, &mut out, 2, 255u8, true);
    assert_eq!(out, [0, 128]);
}

#[test]
fn square_fills_exact_pixel_bounds() {
    let p = params(MaskMode::FillAlphaMultiply, 8);
    let out = rasterize_rows(&[square(2.0, 2.0, 6.0, 6.0)], &p, 8, &[0..8]);
    for y in 0..8 {
        for x in 0..8 {
            let inside = (2..6).contains(&x) && (2..6).contains(&y);
            assert_eq!(out[y * 8 + x], if inside { 255 } else { 0 }, "({x},{y})");
        }
    }
}

#[test]
fn output_is_independent_of_row_partition() {
    let tri = Submask::new(vec![
        ControlPoint::new(1.3, 0.7),
        ControlPoint::new(10.9, 3.2).with_handles((-1.0, -2.0), (1.0, 2.0)),
        ControlPoint::new(4.1, 10.6),
    ]);
    for mode in [MaskMode::FillAlphaMultiply, MaskMode::FillPathSubtract] {
        let p = params(mode, 12);
        let whole = rasterize_rows(std::slice::from_ref(&tri), &p, 11, &[0..11]);
        let split = rasterize_rows(std::slice::from_ref(&tri), &p, 11, &[0..3, 3..4, 4..11]);
        assert_eq!(whole, split, "{mode:?}");
    }
}

#[test]
fn path_mode_strokes_open_outline() {
    let line = Submask::new(vec![ControlPoint::new(1.0, 4.0), ControlPoint::new(7.0, 4.0)]);
    let p = params(MaskMode::FillPathMultiply, 8);
    let out = rasterize_rows(&[line], &p, 8, &[0..8]);
    assert_eq!(out[3 * 8 + 4], 255);
    assert_eq!(out[4 * 8 + 4], 255);
    assert_eq!(out[2 * 8 + 4], 0);
    assert_eq!(out[5 * 8 + 4], 0);
}

#[test]
fn nested_submasks_fill_their_union() {
    let p = params(MaskMode::FillAlphaMultiply, 8);
    let out = rasterize_rows(
        &[square(1.0, 1.0, 7.0, 7.0), square(2.0, 2.0, 6.0, 6.0)],
        &p,
        8,
        &[0..8],
    );
    for y in 0..8 {
        for x in 0..8 {
            let inside = (1..7).contains(&x) && (1..7).contains(&y);
            assert_eq!(out[y * 8 + x], if inside { 255 } else { 0 }, "({x},{y})");
        }
    }
}

#[test]
fn shape_covering_the_plane_fills_every_pixel() {
    let p = params(MaskMode::FillAlphaMultiply, 4);
    let out = rasterize_rows(&[square(0.0, 0.0, 4.0, 4.0)], &p, 4, &[0..4]);
    assert_eq!(out, vec![255; 16]);
}

#[test]
fn non_finite_submasks_are_skipped() {
    let broken = Submask::new(vec![
        ControlPoint::new(1.0, 1.0).with_handles((0.0, 0.0), (1.0, 0.0)),
        ControlPoint::new(f64::INFINITY, 8.0),
        ControlPoint::new(1.0, 12.0),
    ]);
    let outlines = tessellate(
        &[broken, square(0.0, 0.0, 2.0, 2.0)],
        MaskMode::FillAlphaMultiply,
    )
    .unwrap();
    assert_eq!(outlines.len(), 1);
    assert_eq!(outlines[0].pixel_value, 2);
}

#[test]
fn oversized_segments_fail_to_allocate() {
    let huge = Submask::new(vec![
        ControlPoint::new(1.0, 1.0).with_handles((0.0, 0.0), (1.0, 0.0)),
        ControlPoint::new(1e300, 8.0),
    ]);
    let err = tessellate(&[huge], MaskMode::FillPathMultiply).unwrap_err();
    assert!(matches!(err, MaskError::Allocation(_)), "{err}");
}

#[test]
fn package_rejects_mismatched_block() {
    let p = params(MaskMode::FillAlphaMultiply, 4);
    let mut scratch = ScratchBuffer::new();
    let mut out = vec![0u8; 3];
    assert!(rasterize_package(&mut scratch, 0..1, &mut out, &[], &p).is_err());
}
