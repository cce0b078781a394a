// ----------------------------------- CLI -----------------------------------
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "evaluate", about = "Simulate a noisy CT scan of the validation phantom, reconstruct and score it")]
pub struct Cli {

    /// Evaluation config file
    #[clap(default_value = "evaluate-config.toml")]
    pub config: PathBuf,

    /// Override the noise seed given in the config file
    #[clap(long)]
    pub seed: Option<u64>,

    /// Override the output directory given in the config file
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Override the FBP filter given in the config file
    #[clap(short, long)]
    pub filter: Option<FilterKind>,

    /// Display window of the written images
    #[clap(short, long, value_parser = parse_pair::<f32>, default_value = "0.8,1.2")]
    pub window: (f32, f32),

    /// Also score this many samples drawn from the training phantoms
    #[clap(short = 'n', long, default_value = "0")]
    pub samples: usize,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub num_threads: usize,

}

// --------------------------------------------------------------------------------

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng};

use ctsim::config::evaluate::{read_config_file, Config};
use ctsim::correction::{correct, locate_checkpoint, ZeroResidual};
use ctsim::fom::{dynamic_range, psnr, ssim, windowed, Roi};
use ctsim::image::Image;
use ctsim::io::write_array;
use ctsim::loader::FileLoader;
use ctsim::pipeline::Pipeline;
use ctsim::projector::FilterKind;
use ctsim::utils::{group_digits, parse_pair, timing::Progress};

/// Similarity scores are computed as if images spanned [-1, 1]
const SSIM_DATA_RANGE: f64 = 2.0;

// Soft tissue around the centre of the validation slice, in mm
const MIDDLE_X: (f32, f32) = (-40.0, 25.0);
const MIDDLE_Y: (f32, f32) = (-25.0, 25.0);

fn main() -> Result<(), Box<dyn Error>> {

    let args = Cli::parse();
    let mut progress = Progress::new();

    progress.start(&format!("Reading {}", args.config.display()));
    let config = with_overrides(read_config_file(&args.config)?, &args);
    progress.done();

    rayon::ThreadPoolBuilder::new().num_threads(args.num_threads).build_global()?;

    if let Some(dir) = &config.model.checkpoint_dir {
        let checkpoint = locate_checkpoint(dir, &config.model.name)?;
        println!("Using checkpoint {}", checkpoint.display());
    }

    progress.start(&format!(
        "Building {}x{} pixel operators for {} angles and {} detector bins",
        config.size, config.size, group_digits(config.geometry.angles), group_digits(config.geometry.detector.bins)));
    let pipeline = Pipeline::from_config(&config)?;
    progress.done();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let validation = config.data.validation_path();
    progress.start(&format!("Simulating and reconstructing {}", validation.display()));
    let pair = pipeline.validation_sample(&validation, &mut rng)?;
    progress.done();

    let model = ZeroResidual;
    let x = correct(&model, &pair.x_0)?;
    report_scores("validation", &x, &pair.x_true)?;

    let middle = Roi::Rectangle(MIDDLE_X, MIDDLE_Y);
    if let Some(stats) = x.roi_stats(middle) {
        println!("middle: {} pixels, mean {:.4}, std {:.4}", stats.n, stats.mean, stats.std);
    }

    let out = config.output_directory();
    let (lo, hi) = args.window;
    let middle_crop = x.crop(MIDDLE_X, MIDDLE_Y);
    write_array(&x.data                       , &out, "x"         )?;
    write_array(&windowed(&x.data, lo, hi)    , &out, "x_windowed")?;
    write_array(&windowed(&middle_crop, lo, hi), &out, "x_middle"  )?;
    write_array(&pair.x_0.data                , &out, "x_0"       )?;
    write_array(&pair.x_true.data             , &out, "x_true"    )?;
    progress.done_with_message(&format!("Wrote images to {}", out.display()));

    if args.samples > 0 {
        let mut loader = FileLoader::new(&config.data.folder, config.data.exclude.as_deref())?;
        let bar = ProgressBar::new(args.samples as u64);
        bar.set_style(ProgressStyle::default_bar()
                      .template("Scoring training samples\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")?
        );
        let (mut total_ssim, mut total_psnr) = (0.0, 0.0);
        for _ in 0..args.samples {
            let pair = pipeline.generate_sample(&mut loader, &mut rng)?;
            let x = correct(&model, &pair.x_0)?;
            total_ssim += ssim(&x, &pair.x_true, SSIM_DATA_RANGE)?;
            total_psnr += psnr(&x, &pair.x_true, dynamic_range(&pair.x_true))?;
            bar.inc(1);
        }
        bar.finish();
        let n = args.samples as f64;
        println!("training samples: mean ssim {:.4}, mean psnr {:.2} dB", total_ssim / n, total_psnr / n);
    }
    Ok(())
}

fn with_overrides(mut config: Config, args: &Cli) -> Config {
    if let Some(seed)   = args.seed         { config.seed = seed }
    if let Some(filter) = args.filter       { config.fbp.filter = filter }
    if let Some(out)    = args.out.clone()  { config.output.directory = Some(out) }
    config
}

fn report_scores(label: &str, x: &Image, truth: &Image) -> Result<(), Box<dyn Error>> {
    println!("{label}: ssim = {:.4}", ssim(x, truth, SSIM_DATA_RANGE)?);
    println!("{label}: psnr = {:.2} dB", psnr(x, truth, dynamic_range(truth))?);
    Ok(())
}
