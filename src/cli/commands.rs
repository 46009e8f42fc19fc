use crate::analyzers::TableReporter;
use crate::archive::ArchiveExtractor;
use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::{Consolidator, Pipeline, Transformer};
use crate::readers::FieldExtractor;
use crate::utils::init_logging;
use crate::writers::SqliteLoader;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Unpack {
            archive,
            destination,
        } => {
            let archive = archive.unwrap_or_else(|| config.archive_path());
            let destination = destination.unwrap_or_else(|| config.data_dir.clone());

            let files = ArchiveExtractor::new().unpack(&archive, &destination)?;
            println!(
                "Unpacked {} files into {}",
                files.len(),
                destination.display()
            );
        }

        Commands::Extract {
            format,
            input,
            output,
        } => {
            let input = input.unwrap_or_else(|| config.source_path(format));
            let output = output.unwrap_or_else(|| config.extracted_path(format));

            let stats = FieldExtractor::for_format(format).extract_file(&input, &output)?;
            println!("Extracted {} data: {}", format, stats.summary());
        }

        Commands::Consolidate { inputs, output } => {
            let inputs = if inputs.is_empty() {
                config.extracted_paths()
            } else {
                inputs
            };
            let output = output.unwrap_or_else(|| config.consolidated_path());

            let stats = Consolidator::new().consolidate(&inputs, &output)?;
            println!("Consolidated {}: {}", output.display(), stats.summary());
        }

        Commands::Transform { input, output } => {
            let input = input.unwrap_or_else(|| config.consolidated_path());
            let output = output.unwrap_or_else(|| config.transformed_path());

            let rows = Transformer::new().transform_file(&input, &output)?;
            println!("Transformed {} rows into {}", rows, output.display());
        }

        Commands::Load {
            input,
            database,
            table,
        } => {
            let input = input.unwrap_or_else(|| config.transformed_path());
            let database = database.unwrap_or_else(|| config.database.clone());
            let table = table.unwrap_or_else(|| config.table_name.clone());

            let rows = SqliteLoader::new(&table)?.load_file(&input, &database)?;
            println!("Loaded {} rows into {}", rows, table);
        }

        Commands::Query {
            database,
            table,
            limit,
            format,
        } => {
            let database = database.unwrap_or_else(|| config.database.clone());
            let table = table.unwrap_or_else(|| config.table_name.clone());
            let limit = limit.unwrap_or(config.sample_size);

            TableReporter::new(&table)?
                .with_limit(limit)
                .report(&database, format, std::io::stdout().lock())?;
        }

        Commands::Run {
            format,
            no_progress,
        } => {
            let pipeline = Pipeline::new(config).with_progress(!no_progress);
            let summary = pipeline.run(format, std::io::stdout()).await?;
            println!("\n{}", summary.summary());
        }
    }

    Ok(())
}
