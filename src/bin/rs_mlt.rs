// std
use std::path::PathBuf;
use std::sync::Arc;
// others
use clap::{Parser, ValueEnum};
use log::{error, info};
// pbrt
use rs_mlt::core::geometry::{Point2f, Vector2i};
use rs_mlt::core::integrator::Integrator;
use rs_mlt::core::paramset::ParamSet;
use rs_mlt::core::scene::Scene;
use rs_mlt::integrators::directlighting::DirectLightingIntegrator;
use rs_mlt::integrators::mlt::MLTIntegrator;
use rs_mlt::scenes::analytic::{AnalyticScene, Spot};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum IntegratorName {
    Mlt,
    Direct,
}

/// Render the analytic test scene with Metropolis Light Transport.
#[derive(Parser)]
#[command(version = VERSION)]
struct Cli {
    /// use specified number of threads for rendering
    #[arg(short = 't', long = "nthreads", default_value_t = 0)]
    nthreads: u8,
    /// image width in pixels
    #[arg(long, default_value_t = 256)]
    width: i32,
    /// image height in pixels
    #[arg(long, default_value_t = 256)]
    height: i32,
    /// samples (mutations) per pixel
    #[arg(short = 's', long = "spp", default_value_t = 64)]
    spp: u32,
    /// add a bright spot to the sensor pattern
    #[arg(long)]
    spot: bool,
    #[arg(short = 'i', long, value_enum, default_value_t = IntegratorName::Mlt)]
    integrator: IntegratorName,
    /// integrator parameter as name=value (repeatable)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
    /// output image
    #[arg(short = 'o', long, default_value = "mlt.png")]
    output: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let num_threads: usize = args.nthreads as usize;
    info!(
        "rs_mlt version {} [Detected {} cores]",
        VERSION,
        num_cpus::get()
    );
    let mut params = ParamSet::new("Integrator", "mlt");
    for assignment in args.params.iter() {
        if let Err(e) = params.add_assignment(assignment) {
            error!("{}", e);
            std::process::exit(2);
        }
    }
    let mut scene = AnalyticScene::new(Vector2i::new(args.width, args.height), args.spp);
    if args.spot {
        scene = scene.with_spot(Spot {
            center: Point2f { x: 0.7, y: 0.3 },
            radius: 0.1,
            gain: 4.0,
        });
    }
    let scene: Arc<dyn Scene> = Arc::new(scene);
    let integrator: Box<dyn Integrator> = match args.integrator {
        IntegratorName::Mlt => match MLTIntegrator::create(&params, num_threads) {
            Ok(integrator) => Box::new(integrator.with_progress(true)),
            Err(e) => {
                error!("{}", e);
                std::process::exit(2);
            }
        },
        IntegratorName::Direct => {
            let max_depth: i32 = params.find_one_int("maxDepth", -1);
            let samples: i32 = params.find_one_int("directSamples", 16);
            Box::new(DirectLightingIntegrator::new(
                max_depth,
                samples.max(0) as u32,
                num_threads,
            ))
        }
    };
    params.report_unused();
    if let Err(e) = integrator.preprocess(scene.as_ref()) {
        error!("{}", e);
        std::process::exit(1);
    }
    if !integrator.render(&scene) {
        error!("Rendering did not finish");
        std::process::exit(1);
    }
    if let Some(image) = integrator.take_image() {
        info!("Average luminance {:.5}", image.average_luminance());
        if let Err(e) = image.write_png(&args.output) {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
