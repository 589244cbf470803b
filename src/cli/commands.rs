use crate::cli::args::{Cli, Commands};
use crate::config::{PipelineConfig, SourceKind};
use crate::error::Result;
use crate::processors::Pipeline;
use crate::readers::ProfileReader;
use crate::utils::{init_logging, parse_date};
use crate::writers::DatasetWriter;
use chrono::Local;
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Generate {
            config,
            source,
            profiles,
            output_dir,
            as_of,
            workers,
            base_temperature,
            quiet,
        } => {
            let mut settings = PipelineConfig::load(config.as_deref())?;

            if let Some(path) = source {
                settings.source.kind = SourceKind::from_path(&path);
                settings.source.path = path;
            }
            if let Some(path) = profiles {
                settings.profiles.path = path;
            }
            if let Some(dir) = output_dir {
                settings.output.dir = dir;
            }
            if let Some(date) = as_of {
                settings.periods.as_of = Some(parse_date(&date)?);
            }
            if let Some(workers) = workers {
                settings.render.render_workers = workers.max(1);
            }
            if let Some(base) = base_temperature {
                settings.source.base_temperature = base;
            }

            println!("Generating growing-degree-day time-lapse...");
            println!("Source: {}", settings.source.path.display());
            println!("Profiles: {}", settings.profiles.path.display());
            println!("Output directory: {}", settings.output.dir.display());

            let profiles = ProfileReader::new().read(&settings.profiles.path)?;
            let source = settings.source.open();

            let today = Local::now().date_naive();
            let pipeline = Pipeline::from_config(&settings, today)?.with_progress(!quiet);
            let periods = pipeline.periods();
            info!(
                prior = %format!("{}..{}", periods.prior.start, periods.prior.end),
                current = %periods
                    .current
                    .as_ref()
                    .map(|w| format!("{}..{}", w.start, w.end))
                    .unwrap_or_else(|| "none".to_string()),
                "Resolved periods"
            );

            let summary = pipeline.run(source.as_ref(), &profiles)?;
            println!("\n{}", summary.summary());
            println!("Generation complete!");
        }

        Commands::Inspect { file, sample } => {
            println!("Inspecting dataset: {}", file.display());

            let dataset = DatasetWriter::new().read(&file)?;
            println!("\n{}", dataset.summary());

            if sample > 0 {
                println!("\nSample points (showing up to {}):", sample);
                for (i, point) in dataset.points.iter().take(sample).enumerate() {
                    let last = point
                        .values
                        .iter()
                        .rev()
                        .find_map(|v| *v)
                        .map(|v| format!("{:.1}", v))
                        .unwrap_or_else(|| "no data".to_string());
                    println!(
                        "{}. ({:.4}, {:.4}): latest {}",
                        i + 1,
                        point.latitude,
                        point.longitude,
                        last
                    );
                }
            }
        }
    }

    Ok(())
}
