use argh::FromArgs;
use std::path::PathBuf;

use fisheye_stereo::{
    config::{CalibrationConfig, ExecutionConfig},
    pipeline::{CameraSide, DenseStereo},
};

#[derive(FromArgs)]
/// Build the rectification maps of a calibrated fisheye rig
struct Args {
    /// path to the calibration file (.json)
    #[argh(option, short = 'c')]
    config: PathBuf,

    /// override the vertical field of view of the rectified views in degrees
    #[argh(option)]
    vfov: Option<f64>,

    /// build the maps on a local pool with this many threads
    #[argh(option, short = 't')]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = CalibrationConfig::from_file(&args.config)?;
    if let Some(vfov) = args.vfov {
        config.vfov_deg = vfov;
    }
    if let Some(threads) = args.threads {
        config.execution = ExecutionConfig::Fixed(threads);
    }

    let start = std::time::Instant::now();
    let stereo = DenseStereo::new(config)?;
    log::debug!("Maps built in {:?}", start.elapsed());

    let geometry = stereo.geometry();
    println!(
        "Rectified views: {} vfov {} deg",
        geometry.size(),
        geometry.vfov_deg()
    );
    println!("Knew: {}", geometry.intrinsic());
    if let Some(baseline) = geometry.baseline() {
        println!("Baseline: {}", baseline);
    }

    for (name, side) in [("left", CameraSide::Left), ("right", CameraSide::Right)] {
        if side == CameraSide::Right && !stereo.is_stereo() {
            continue;
        }
        let map = stereo.map(side)?;
        let total = map.size().area();
        let valid = map.num_valid();
        println!(
            "{name} camera: {valid} / {total} rectified pixels have a source ({:.1}%)",
            100.0 * valid as f64 / total as f64
        );
    }

    Ok(())
}
