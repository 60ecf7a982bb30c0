//! ordistat - PCoA ordination and association testing CLI
//!
//! Command-line interface for aligning a dissimilarity matrix with sample
//! metadata, running PCoA, and permutation-testing one metadata variable.

use clap::{Parser, Subcommand, ValueEnum};
use ordistat::classify::ClassifyMode;
use ordistat::data::{DissimilarityMatrix, Metadata};
use ordistat::error::Result;
use ordistat::pipeline::{run_analysis, AnalysisConfig};
use std::path::PathBuf;

/// CLI-friendly classification mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// Cardinality heuristic decides categorical vs continuous
    Auto,
    /// Force discrete string-labeled groups (ANOSIM)
    Categorical,
    /// Force ordered numeric values (Mantel)
    Continuous,
}

impl From<CliMode> for ClassifyMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Auto => ClassifyMode::Auto,
            CliMode::Categorical => ClassifyMode::Categorical,
            CliMode::Continuous => ClassifyMode::Continuous,
        }
    }
}

/// Ordination and association statistics for dissimilarity matrices
#[derive(Parser)]
#[command(name = "ordistat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an analysis with explicit options
    Analyze {
        /// Path to the dissimilarity matrix (.tsv / .csv)
        #[arg(short, long)]
        distance: PathBuf,

        /// Path to the metadata table (.xlsx / .csv / .tsv)
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column to test
        #[arg(short, long)]
        variable: String,

        /// How to decide the variable's type
        #[arg(long, value_enum, default_value = "auto")]
        mode: CliMode,

        /// Axis for the x dimension of the tested 2-D structure
        #[arg(long, default_value = "PC1")]
        x_axis: String,

        /// Axis for the y dimension of the tested 2-D structure
        #[arg(long, default_value = "PC2")]
        y_axis: String,

        /// Negate the x axis in the output table (orientation only)
        #[arg(long)]
        flip_x: bool,

        /// Negate the y axis in the output table (orientation only)
        #[arg(long)]
        flip_y: bool,

        /// Number of permutations (minimum 10)
        #[arg(short, long, default_value = "999")]
        permutations: usize,

        /// Random seed; only the Mantel (continuous) path uses it
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output path for the merged coordinates + metadata TSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for a JSON summary of the full result
        #[arg(short, long)]
        json: Option<PathBuf>,
    },

    /// Run an analysis from a YAML configuration file
    Run {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the dissimilarity matrix (.tsv / .csv)
        #[arg(short, long)]
        distance: PathBuf,

        /// Path to the metadata table (.xlsx / .csv / .tsv)
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output path for the merged coordinates + metadata TSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for a JSON summary of the full result
        #[arg(short, long)]
        json: Option<PathBuf>,
    },

    /// List the variables available in a metadata file
    Columns {
        /// Path to the metadata table (.xlsx / .csv / .tsv)
        #[arg(short, long)]
        metadata: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            distance,
            metadata,
            variable,
            mode,
            x_axis,
            y_axis,
            flip_x,
            flip_y,
            permutations,
            seed,
            output,
            json,
        } => {
            let config = AnalysisConfig {
                variable,
                mode: mode.into(),
                x_axis,
                y_axis,
                flip_x,
                flip_y,
                permutations,
                seed,
            };
            cmd_analyze(&distance, &metadata, &config, output.as_ref(), json.as_ref())
        }

        Commands::Run {
            config,
            distance,
            metadata,
            output,
            json,
        } => cmd_run(&config, &distance, &metadata, output.as_ref(), json.as_ref()),

        Commands::Columns { metadata } => cmd_columns(&metadata),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run from a YAML configuration
fn cmd_run(
    config_path: &PathBuf,
    distance_path: &PathBuf,
    metadata_path: &PathBuf,
    output_path: Option<&PathBuf>,
    json_path: Option<&PathBuf>,
) -> Result<()> {
    eprintln!("Loading analysis configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = AnalysisConfig::from_yaml(&config_str)?;
    cmd_analyze(distance_path, metadata_path, &config, output_path, json_path)
}

/// Run the pipeline and report the results
fn cmd_analyze(
    distance_path: &PathBuf,
    metadata_path: &PathBuf,
    config: &AnalysisConfig,
    output_path: Option<&PathBuf>,
    json_path: Option<&PathBuf>,
) -> Result<()> {
    eprintln!("Loading data...");
    let distances = DissimilarityMatrix::from_path(distance_path)?;
    let metadata = Metadata::from_path(metadata_path)?;
    eprintln!(
        "Loaded {} dissimilarity samples, {} metadata samples",
        distances.n_samples(),
        metadata.n_samples()
    );

    let output = run_analysis(&distances, &metadata, config)?;

    println!(
        "Samples analyzed: {} ({} ordination axes)",
        output.table.n_samples(),
        output.axes.len()
    );
    for axis in [&config.x_axis, &config.y_axis] {
        if let Some(p) = output.proportion_for(axis) {
            println!("  {}: {:.1}% of variance", axis, p * 100.0);
        }
    }
    println!(
        "Variable '{}' classified as {}",
        output.classification.name,
        output.classification.tag()
    );

    match (&output.test, &output.test_warning) {
        (Some(test), _) => println!(
            "{}: statistic = {:.4}, p = {:.4} ({} permutations)",
            test.method.name(),
            test.statistic,
            test.p_value,
            test.permutations
        ),
        (None, Some(warning)) => eprintln!("Warning: association test failed: {}", warning),
        (None, None) => {}
    }

    if let Some(path) = output_path {
        eprintln!("Writing merged table to {:?}...", path);
        output.table.to_tsv(path)?;
    }
    if let Some(path) = json_path {
        eprintln!("Writing JSON summary to {:?}...", path);
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &output)?;
    }

    Ok(())
}

/// List metadata variables
fn cmd_columns(metadata_path: &PathBuf) -> Result<()> {
    let metadata = Metadata::from_path(metadata_path)?;
    println!("{} samples, {} variables:", metadata.n_samples(), metadata.column_names().len());
    for name in metadata.column_names() {
        println!("  {}", name);
    }
    Ok(())
}
