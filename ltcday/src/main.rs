mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;
use ltcday_core::{
    plan_segments, BatchConfig, BatchRun, CommandEncoder, LtcEncoder, LtcWavEncoder,
    ProgressEvent, VerifyingEncoder,
};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let frame_rate = *matches.get_one::<f64>("fps").expect("defaulted argument");
    let start = matches
        .get_one::<String>("start")
        .expect("defaulted argument");
    let segment_minutes = *matches.get_one::<u32>("length").expect("defaulted argument");
    let sample_rate = *matches.get_one::<u32>("rate").expect("defaulted argument");
    let bit_depth = *matches.get_one::<u16>("bits").expect("defaulted argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted argument");
    let volume = *matches.get_one::<f64>("volume").expect("defaulted argument");
    let overwrite = matches.get_flag("overwrite");
    let verify = matches.get_flag("verify");
    let dry_run = matches.get_flag("dry-run");

    let config = BatchConfig::builder(output_dir)
        .frame_rate(frame_rate)
        .start(start.as_str())
        .segment_minutes(segment_minutes)
        .sample_rate(sample_rate)
        .bit_depth(bit_depth)
        .overwrite(overwrite)
        .build()
        .context("invalid batch configuration")?;

    if dry_run {
        let plan = plan_segments(&config).context("failed to plan segments")?;

        if plan.is_empty() {
            println!("Dry run: no segments would be generated.");
        } else {
            println!("Dry run: would generate {} segment(s):", plan.len());
            for (segment, path) in plan {
                println!(
                    "  {} (start {}, {} s)",
                    path.display(),
                    segment.label(),
                    segment.duration_secs
                );
            }
        }

        return Ok(());
    }

    let mut encoder: Box<dyn LtcEncoder> = match matches.get_one::<PathBuf>("encoder-command") {
        Some(program) => {
            let args = matches
                .get_many::<String>("encoder-arg")
                .into_iter()
                .flatten()
                .cloned();
            debug!("using external encoder {}", program.display());
            Box::new(CommandEncoder::new(program).leading_args(args))
        }
        None => Box::new(
            LtcWavEncoder::new()
                .with_volume(volume)
                .context("invalid encoder volume")?,
        ),
    };
    if verify {
        encoder = Box::new(VerifyingEncoder::new(encoder));
    }

    let mut run = BatchRun::start(config)
        .with_context(|| format!("cannot start batch in '{}'", output_dir.display()))?;

    let progress = ProgressBar::new(run.total() as u64);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let progress_handle = progress.clone();
    let mut reporter = move |event: &ProgressEvent<'_>| match event {
        ProgressEvent::Start { total } => {
            progress_handle.set_length(*total as u64);
            progress_handle.enable_steady_tick(Duration::from_millis(100));
            progress_handle.set_message("starting");
        }
        ProgressEvent::Segment {
            completed, label, ..
        } => {
            progress_handle.set_position(*completed as u64);
            progress_handle.set_message(format!("last written {label}"));
        }
        ProgressEvent::Finish => {
            progress_handle.set_message("Completed");
        }
    };

    let result = run
        .execute(&mut encoder, &mut reporter)
        .with_context(|| format!("failed to generate LTC into '{}'", output_dir.display()));

    progress.finish_and_clear();

    let summary = result?;
    println!(
        "Wrote {} segment(s) to {}",
        summary.segments_written,
        run.config().output_dir().display()
    );

    Ok(())
}
