use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use chembl_bioactivity_report::app::{
    App, CompoundReport, ProgressEvent, ProgressSink, QueryOptions,
};
use chembl_bioactivity_report::chembl::ChemblHttpClient;
use chembl_bioactivity_report::config::{ConfigLoader, ResolvedConfig};
use chembl_bioactivity_report::domain::{CompoundQuery, Delimiter, ExportFormat, SortDirection};
use chembl_bioactivity_report::error::ReportError;
use chembl_bioactivity_report::export::export_table;
use chembl_bioactivity_report::http::HttpFetcher;
use chembl_bioactivity_report::output::{JsonOutput, OutputMode};
use chembl_bioactivity_report::pubchem::PubchemHttpClient;

#[derive(Parser)]
#[command(name = "chembl-report")]
#[command(about = "Bioactivity and property report for a named compound (ChEMBL + PubChem)")]
#[command(version, author)]
struct Cli {
    /// Compound name; when omitted, compounds come from chembl-report.json.
    compound: Option<String>,

    /// Path to a batch config file.
    #[arg(long)]
    config: Option<String>,

    /// Keep only these activity types (repeatable); default keeps all.
    #[arg(long = "activity")]
    activity: Vec<String>,

    /// Bioactivity sort column.
    #[arg(long, default_value = "Target")]
    sort_by: String,

    #[arg(long, value_enum, default_value_t = SortDirection::Asc)]
    order: SortDirection,

    /// Field separator for delimited exports.
    #[arg(long, value_enum, default_value_t = Delimiter::Comma)]
    delimiter: Delimiter,

    /// Export formats (repeatable): csv, xlsx.
    #[arg(long = "format", default_value = "csv")]
    formats: Vec<String>,

    /// Directory receiving export artifacts.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// 2D image edge length in pixels.
    #[arg(long, default_value_t = 320)]
    image_size: u32,

    /// Skip 2D/3D structure downloads.
    #[arg(long)]
    no_structures: bool,

    /// Print each report as JSON instead of status text.
    #[arg(long)]
    json: bool,
}

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn event(&self, event: ProgressEvent) {
        eprintln!("{}", event.message);
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<ReportError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ReportError) -> u8 {
    match error {
        ReportError::NotFound(_) | ReportError::MissingConfig => 2,
        ReportError::Http(_) | ReportError::ChemblHttp(_) | ReportError::ChemblStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Interactive
    };

    // Unknown format names fail hard before any network call.
    let formats = cli
        .formats
        .iter()
        .map(|name| ExportFormat::from_str(name))
        .collect::<Result<Vec<_>, _>>()
        .into_diagnostic()?;

    let (queries, options, delimiter) = gather_requests(&cli)?;

    let http = HttpFetcher::new().into_diagnostic()?;
    let chembl = ChemblHttpClient::new(http.clone());
    let pubchem = PubchemHttpClient::new(http);
    let app = App::new(chembl, pubchem);

    fs::create_dir_all(&cli.out)
        .map_err(|err| ReportError::Filesystem(err.to_string()))
        .into_diagnostic()?;

    let batch = queries.len() > 1;
    for query in &queries {
        let sink: &dyn ProgressSink = match output_mode {
            OutputMode::Json => &JsonOutput,
            OutputMode::Interactive => &ConsoleSink,
        };
        let report = app.run(query, &options, sink).into_diagnostic()?;

        match output_mode {
            OutputMode::Json => JsonOutput::print_report(&report)
                .map_err(|err| ReportError::Filesystem(err.to_string()))
                .into_diagnostic()?,
            OutputMode::Interactive => print_report(&report),
        }

        let target = if batch {
            cli.out.join(artifact_slug(query.as_str()))
        } else {
            cli.out.clone()
        };
        write_artifacts(&report, &target, &formats, delimiter).into_diagnostic()?;
    }

    Ok(())
}

fn gather_requests(cli: &Cli) -> miette::Result<(Vec<CompoundQuery>, QueryOptions, Delimiter)> {
    if let Some(name) = &cli.compound {
        let query = name.parse::<CompoundQuery>().into_diagnostic()?;
        Ok((vec![query], query_options(cli, None), cli.delimiter))
    } else {
        let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
        let delimiter = if cli.delimiter == Delimiter::Comma {
            config.delimiter
        } else {
            cli.delimiter
        };
        let options = query_options(cli, Some(&config));
        Ok((config.compounds, options, delimiter))
    }
}

fn query_options(cli: &Cli, config: Option<&ResolvedConfig>) -> QueryOptions {
    let mut options = QueryOptions {
        activity_types: cli.activity.clone(),
        sort_column: cli.sort_by.clone(),
        sort_direction: cli.order,
        fetch_structures: !cli.no_structures,
        image_pixels: cli.image_size,
    };
    if let Some(config) = config {
        if options.activity_types.is_empty() {
            options.activity_types = config.activity_filter.clone();
        }
        if options.sort_column == "Target" {
            options.sort_column = config.sort_by.clone();
        }
        if options.sort_direction == SortDirection::Asc {
            options.sort_direction = config.order;
        }
    }
    options
}

fn print_report(report: &CompoundReport) {
    println!("## Results for {}", report.compound);
    println!("Data sources: ChEMBL (bioactivity), PubChem (structure & properties).");
    if let Some(id) = &report.chembl_id {
        println!("ChEMBL id: {id}");
    }
    if let Some(table) = &report.bioactivity {
        if !table.is_empty() {
            println!(
                "Pharmacodynamic bioactivities (Homo sapiens): {} rows",
                table.len()
            );
        }
    }
    if let Some(cid) = report.cid {
        println!("PubChem CID: {cid}");
    }
    if let Some(table) = &report.basic_properties {
        println!("PubChem basic properties: {} rows", table.len());
    }
    if let Some(table) = &report.experimental_properties {
        println!("Experimental/computed properties: {} rows", table.len());
    }
    for message in &report.messages {
        println!("> {message}");
    }
}

fn write_artifacts(
    report: &CompoundReport,
    dir: &Path,
    formats: &[ExportFormat],
    delimiter: Delimiter,
) -> Result<(), ReportError> {
    fs::create_dir_all(dir).map_err(|err| ReportError::Filesystem(err.to_string()))?;

    if let Some(table) = &report.bioactivity {
        for format in formats {
            let payload = export_table(table, *format, delimiter)?;
            write_file(&dir.join(format!("bioactivity.{}", format.extension())), &payload)?;
        }
    }
    if let Some(table) = &report.basic_properties {
        let payload = export_table(table, ExportFormat::Csv, delimiter)?;
        write_file(&dir.join("pubchem_basic.csv"), &payload)?;
    }
    if let Some(table) = &report.experimental_properties {
        for format in formats {
            let payload = export_table(table, *format, delimiter)?;
            write_file(
                &dir.join(format!("pubchem_properties.{}", format.extension())),
                &payload,
            )?;
        }
    }
    if let Some(png) = &report.image_2d {
        write_file(&dir.join("structure_2d.png"), png)?;
    }
    if let Some(sdf) = &report.structure_3d {
        write_file(&dir.join("structure_3d.sdf"), sdf.as_bytes())?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    fs::write(path, bytes).map_err(|err| ReportError::Filesystem(err.to_string()))
}

fn artifact_slug(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
