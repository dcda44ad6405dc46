use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::package::DEFAULT_CLASSIFIER;

#[derive(Debug, Clone, Parser)]
#[command(name = "api-dist")]
#[command(about = "Generate API-only class files whose method bodies always throw")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log classpath additions, skipped classes and other debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Rewrite a compiled class tree into an API distribution.
    Generate(GenerateArgs),
    /// Print the declared shape of a single class file as JSON.
    Inspect {
        #[arg(value_name = "CLASS_FILE")]
        class_file: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Compiled classes of the library (e.g. target/classes).
    #[arg(long, value_name = "DIR")]
    pub classes: PathBuf,

    /// Classpath entries; each value may join several paths with the
    /// platform path separator.
    #[arg(long = "classpath", visible_alias = "cp", value_name = "PATHS")]
    pub classpath: Vec<String>,

    /// Compiled test classes, added to the classpath when present.
    #[arg(long, value_name = "DIR")]
    pub test_classes: Option<PathBuf>,

    /// Output directory [default: <classes>/../generated-api-classes].
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Package the output into this jar.
    #[arg(long, value_name = "FILE", conflicts_with = "final_name")]
    pub jar: Option<PathBuf>,

    /// Package the output into <classes>/../<NAME>-<classifier>.jar.
    #[arg(long, value_name = "NAME")]
    pub final_name: Option<String>,

    #[arg(long, value_name = "CLASSIFIER", default_value = DEFAULT_CLASSIFIER)]
    pub classifier: String,

    #[arg(short = 'f', long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Exit with an error when any class could not be generated.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Text,
}
