use clap::{Parser, Subcommand};
use pbipgen::{compile_project, CompileOptions};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "pbipgen")]
#[command(about = "Compile YAML data-model specifications into Power BI Projects")]
#[command(version)]
struct Args {
    /// Log debug detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a model and its sources into a .pbip project
    Compile {
        /// Model specification (YAML)
        model: PathBuf,

        /// Sources specification (YAML)
        sources: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Extra transform snippet directory (repeatable, later wins)
        #[arg(long = "transforms-dir")]
        transforms_dir: Vec<PathBuf>,

        /// Extra DAX template directory (repeatable, later wins)
        #[arg(long = "dax-dir")]
        dax_dir: Vec<PathBuf>,

        /// Do not write the stub report
        #[arg(long)]
        no_stub_report: bool,
    },
    /// Print the version
    Version,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("pbipgen={}", level))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args.command) {
        debug!(error = ?err, "Command failed");
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Compile { model, sources, out, transforms_dir, dax_dir, no_stub_report } => {
            handle_compile(model, sources, out, transforms_dir, dax_dir, no_stub_report)
        }
        Commands::Version => {
            println!("pbipgen {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Handle the 'compile' subcommand
fn handle_compile(
    model: PathBuf,
    sources: PathBuf,
    out: PathBuf,
    transforms_dir: Vec<PathBuf>,
    dax_dir: Vec<PathBuf>,
    no_stub_report: bool,
) -> anyhow::Result<()> {
    let mut options = CompileOptions::new(model, sources, out);
    options.transform_dirs = transforms_dir;
    options.dax_dirs = dax_dir;
    options.stub_report = !no_stub_report;
    debug!(?options, "Compile options");

    let summary = compile_project(&options)?;
    info!(project = %summary.pbip_path.display(), "Project ready");

    println!("Compiled model '{}'", summary.model_name);
    println!("  tables:        {}", summary.tables);
    println!("  relationships: {}", summary.relationships);
    println!("  transforms:    {}", summary.transforms_loaded);
    println!("  dax templates: {}", summary.dax_templates_loaded);
    println!("  files written: {}", summary.files_written.len());
    println!("  project:       {}", summary.pbip_path.display());
    if let Some(report) = &summary.report_path {
        println!("  report:        {}", report.display());
    }
    Ok(())
}
