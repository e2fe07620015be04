use std::path::PathBuf;

use wavyte_mask::{
    ColorModel, ControlPoint, Frame, FrameIndex, MaskCompositor, MaskCompositorOpts,
    MaskKeyframe, MaskMode, Submask,
};

fn parse_mode() -> anyhow::Result<MaskMode> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("alpha") | None => Ok(MaskMode::FillAlphaMultiply),
        Some("alpha-sub") => Ok(MaskMode::FillAlphaSubtract),
        Some("path") => Ok(MaskMode::FillPathMultiply),
        Some("path-sub") => Ok(MaskMode::FillPathSubtract),
        Some(other) => anyhow::bail!("unknown mode '{other}'"),
    }
}

fn build_keyframe() -> MaskKeyframe {
    let blob = Submask::new(vec![
        ControlPoint::new(96.0, 64.0).with_handles((-60.0, 0.0), (60.0, 0.0)),
        ControlPoint::new(224.0, 160.0).with_handles((0.0, -50.0), (0.0, 50.0)),
        ControlPoint::new(128.0, 240.0).with_handles((60.0, 0.0), (-60.0, 0.0)),
        ControlPoint::new(40.0, 150.0).with_handles((0.0, 40.0), (0.0, -40.0)),
    ]);
    MaskKeyframe::new(vec![blob])
        .with_feather(12.0)
        .with_path_radius(3.0)
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = try_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let mode = parse_mode()?;
    let kf = build_keyframe();

    let (width, height) = (256u32, 256u32);
    let mut frame = Frame::new(width as usize, height as usize, ColorModel::Rgba8888)?;
    frame.fill_u8(&[230, 120, 40, 255])?;

    let mut compositor = MaskCompositor::new(MaskCompositorOpts::default())?;
    let outcome = compositor.apply(&mut frame, FrameIndex(0), &kf, mode)?;
    eprintln!("mask {outcome:?} with {} packages", compositor.packages());

    let mask = compositor
        .mask()
        .and_then(|m| m.as_u8())
        .ok_or_else(|| anyhow::anyhow!("no 8-bit mask was produced"))?;

    let out_dir = PathBuf::from("assets");
    std::fs::create_dir_all(&out_dir)?;
    let mask_path = out_dir.join("out_mask.png");
    let gray = image::GrayImage::from_raw(width, height, mask.as_slice().to_vec())
        .ok_or_else(|| anyhow::anyhow!("mask plane does not match {width}x{height}"))?;
    gray.save(&mask_path)?;

    let frame_path = out_dir.join("out_masked.png");
    let wavyte_mask::FrameData::U8(px) = frame.data() else {
        anyhow::bail!("expected an 8-bit frame");
    };
    image::save_buffer_with_format(
        &frame_path,
        px.as_slice(),
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;

    eprintln!("wrote {} and {}", mask_path.display(), frame_path.display());
    Ok(())
}
