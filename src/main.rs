use anyhow::{anyhow, bail};
use bess_thermal::core::battery::external_process::ExternalProcessSimulator;
use bess_thermal::core::battery::recorded::RecordedHeatGeneration;
use bess_thermal::core::battery::simulator::ElectrochemicalSimulator;
use bess_thermal::output::FileOutput;
use bess_thermal::run_project;
use clap::{Args, Parser};
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct BessThermalArgs {
    input_file: String,
    #[arg(
        long,
        short = 'c',
        help = "Path to monthly climate normals file in .csv format"
    )]
    climate_file: String,
    #[arg(
        long,
        short = 'k',
        help = "Path to battery system components file in .csv format"
    )]
    components_file: String,
    #[command(flatten)]
    heat_generation: HeatGenerationSource,
    #[clap(long, short, default_value_t = false, help = "Log debug information")]
    verbose: bool,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

#[derive(Args, Clone, Default, Debug)]
#[group(required = true, multiple = false)]
struct HeatGenerationSource {
    #[arg(
        long,
        short = 's',
        help = "Program that solves the battery cell simulation, reading the request as JSON on stdin"
    )]
    simulator_command: Option<String>,
    #[arg(
        long,
        help = "Path to recorded battery heat generation in .csv format (rows are spatial points, columns are time steps)"
    )]
    heat_generation_file: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = BessThermalArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let max_level = if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(max_level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .expect("setting tracing subscriber failed");

    let input_file = args.input_file.as_str();
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let input_file_stem = PathBuf::from(input_file_stem);

    let output_path = PathBuf::from(format!("{}__results", input_file_stem.display()));
    fs::create_dir_all(&output_path)?;
    let input_file_name = input_file_stem
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| anyhow!("Input file {input_file} has no usable file name"))?;
    let file_output = FileOutput::new(output_path, format!("{input_file_name}__{{}}.{{}}"));

    let simulator: Box<dyn ElectrochemicalSimulator> = match args.heat_generation {
        HeatGenerationSource {
            simulator_command: Some(command),
            heat_generation_file: None,
        } => {
            let mut words = command.split_whitespace().map(str::to_string);
            let program = words
                .next()
                .ok_or_else(|| anyhow!("Simulator command is empty"))?;
            Box::new(ExternalProcessSimulator::new(program, words.collect()))
        }
        HeatGenerationSource {
            simulator_command: None,
            heat_generation_file: Some(file),
        } => Box::new(RecordedHeatGeneration::from_csv(BufReader::new(
            File::open(file)?,
        ))?),
        _ => bail!("Exactly one of --simulator-command or --heat-generation-file is required"),
    };

    let outcome = run_project(
        BufReader::new(File::open(Path::new(input_file))?),
        BufReader::new(File::open(&args.climate_file)?),
        BufReader::new(File::open(&args.components_file)?),
        simulator,
        &file_output,
    )?;

    info!("{} HVAC unit(s) required", outcome.unit_count);
    debug!(
        "JSON response: {}",
        serde_json::to_string_pretty(&outcome)?
    );

    Ok(())
}
