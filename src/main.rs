use anyhow::{Context, Result, bail};
use api_dist::classfile::ClassFile;
use api_dist::cli::{Cli, Commands, GenerateArgs, ReportFormat};
use api_dist::config::resolve_generate_config;
use api_dist::driver::generate;
use api_dist::logging::init_tracing;
use api_dist::package::package_jar;
use api_dist::report::BatchReport;
use api_dist::shape::ClassShape;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Inspect { class_file } => inspect(&class_file),
    }
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    jar: Option<String>,
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = resolve_generate_config(args)?;
    let report = generate(&config.request)?;

    let jar = match &config.jar {
        Some(jar_path) => {
            let entries = package_jar(&config.request.output_root, jar_path)?;
            info!("Packaged {entries} api classes into {}", jar_path.display());
            Some(jar_path.to_string_lossy().to_string())
        }
        None => None,
    };

    let content = match args.format {
        ReportFormat::Json => serde_json::to_string_pretty(&GenerateOutput {
            report: &report,
            jar: jar.clone(),
        })?,
        ReportFormat::Text => {
            let mut out = report.render_text();
            if let Some(jar) = &jar {
                out.push_str(&format!("jar: {jar}\n"));
            }
            out
        }
    };
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }

    if args.strict && report.has_failures() {
        bail!(
            "{} of {} classes could not be generated",
            report.failed_count(),
            report.outcomes.len()
        );
    }
    Ok(())
}

fn inspect(class_file: &Path) -> Result<()> {
    let bytes = std::fs::read(class_file)
        .with_context(|| format!("Failed to read {}", class_file.display()))?;
    let parsed = ClassFile::parse(&bytes)
        .with_context(|| format!("Failed to parse {}", class_file.display()))?;
    let shape = ClassShape::of(&parsed)?;
    println!("{}", serde_json::to_string_pretty(&shape)?);
    Ok(())
}
