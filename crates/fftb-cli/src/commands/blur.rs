//! Blur command
//!
//! Loads an image, blurs it `ITERATIONS` times on the transform engine,
//! prints the performance summary and appends it to the results log.

use crate::BlurArgs;
use anyhow::{Context, Result, bail};
use fftb_ops::blur::{BlurConfig, run_blur};
use fftb_ops::kernel::KernelPlacement;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Rejects argument combinations before anything is read or written.
pub fn validate(args: &BlurArgs) -> Result<()> {
    super::validate_common(args.threads, args.iterations, args.time_limit)?;
    if args.kernel_size == 0 {
        bail!("--kernel-size must be at least 1 (got 0)");
    }
    if !args.sigma.is_finite() || args.sigma <= 0.0 {
        bail!("--sigma must be a positive number of pixels (got {})", args.sigma);
    }
    Ok(())
}

pub fn run(args: BlurArgs, verbose: u8) -> Result<()> {
    trace!(image = %args.image.display(), threads = args.threads, iterations = args.iterations, "blur::run");
    validate(&args)?;

    let image = fftb_io::load_rgb(&args.image)
        .with_context(|| format!("Failed to load: {}", args.image.display()))?;
    if verbose > 0 {
        println!(
            "Blurring {} ({}x{}) {} times on {} threads",
            args.image.display(),
            image.width,
            image.height,
            args.iterations,
            args.threads
        );
    }

    let ctx = super::acquire_engine(args.threads, args.time_limit, args.reuse_plans)?;
    let config = BlurConfig {
        kernel_size: args.kernel_size,
        sigma: args.sigma,
        placement: if args.centered_kernel {
            KernelPlacement::Centered
        } else {
            KernelPlacement::TopLeft
        },
        iterations: args.iterations,
        ..BlurConfig::default()
    };
    let outcome = run_blur(&ctx, &image, &config).context("Blur run failed")?;
    ctx.release();

    println!("\n{}", outcome.report);
    super::append_record(&args.output, &outcome.report.to_record())?;

    if let Some(path) = &args.save {
        fftb_io::save_rgb(path, &outcome.output)
            .with_context(|| format!("Failed to save: {}", path.display()))?;
        info!(path = %path.display(), "blurred image saved");
        if verbose > 0 {
            println!("Saved blurred image to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(dir: &std::path::Path) -> BlurArgs {
        BlurArgs {
            threads: 1,
            iterations: 1,
            output: dir.join("results.json"),
            image: dir.join("missing.png"),
            kernel_size: 16,
            sigma: 3.0,
            time_limit: 2.0,
            reuse_plans: false,
            centered_kernel: false,
            save: Some(dir.join("blurred.png")),
        }
    }

    #[test]
    fn invalid_arguments_touch_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cases: [fn(&mut BlurArgs); 5] = [
            |a| a.threads = 0,
            |a| a.iterations = 0,
            |a| a.kernel_size = 0,
            |a| a.sigma = -1.0,
            |a| a.time_limit = f64::NAN,
        ];
        for mutate in cases {
            let mut a = args(dir.path());
            mutate(&mut a);
            let output: PathBuf = a.output.clone();
            assert!(validate(&a).is_err());
            assert!(run(a, 0).is_err());
            assert!(!output.exists());
        }
        assert!(!dir.path().join("blurred.png").exists());
    }

    #[test]
    fn missing_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path());
        let output = a.output.clone();
        let err = run(a, 0).unwrap_err();
        assert!(format!("{err:#}").contains("missing.png"));
        assert!(!output.exists());
    }

    #[test]
    fn blurs_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path());
        a.image = dir.path().join("input.png");
        a.iterations = 2;
        let src = fftb_core::RgbChannels::uniform(8, 6, [0.5, 0.25, 1.0]);
        fftb_io::save_rgb(&a.image, &src).unwrap();
        let output = a.output.clone();

        run(a, 1).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("\"num_images\": 2"));
        let saved = fftb_io::load_rgb(dir.path().join("blurred.png")).unwrap();
        assert_eq!((saved.width, saved.height), (8, 6));
    }

    #[test]
    fn failed_save_keeps_logged_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path());
        a.image = dir.path().join("input.png");
        a.save = Some(dir.path().join("no_such_dir").join("blurred.png"));
        fftb_io::save_rgb(&a.image, &fftb_core::RgbChannels::uniform(4, 4, [0.5; 3])).unwrap();
        let output = a.output.clone();

        assert!(run(a, 0).is_err());
        assert!(std::fs::read_to_string(&output).unwrap().contains("\"num_images\": 1"));
    }
}
