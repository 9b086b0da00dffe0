//! `panzer-gen` — compile JSON documents into PanzerJson C++ declarations.
//!
//! ## Usage
//!
//! ```sh
//! # Compile a file into a header/source pair
//! panzer-gen compile -i config.json --header config.hpp --source config.cpp
//!
//! # Name the root reference and wrap it in a namespace
//! panzer-gen compile -i config.json --source config.cpp --root settings --namespace App
//!
//! # Pack all strings into one aggregate and keep number literals
//! panzer-gen compile -i config.json --source config.cpp --pack-strings --number-text
//!
//! # Read options from a JSON file (flags override it)
//! panzer-gen compile -i config.json --config panzer.json --source config.cpp
//!
//! # Show deduplication statistics, optionally for packed output
//! panzer-gen stats -i config.json --pack-strings
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use panzer_core::{CompileOptions, CompiledDocument};
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "panzer-gen",
    version,
    about = "Compile JSON into zero-parse PanzerJson C++ declarations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile JSON into declarations (header) and definitions (source)
    Compile {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Header artifact path (skipped if omitted)
        #[arg(long)]
        header: Option<PathBuf>,
        /// Source artifact path (writes to stdout if omitted)
        #[arg(long)]
        source: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Show deduplication statistics without writing artifacts
    Stats {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Compile options shared by `compile` and `stats`.
#[derive(Args)]
struct OptionArgs {
    /// JSON file with compile options; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    /// Name of the root reference
    #[arg(long)]
    root: Option<String>,
    /// Namespace wrapping the root reference
    #[arg(long)]
    namespace: Option<String>,
    /// Include path written into the source artifact (defaults to the header's file name)
    #[arg(long)]
    header_name: Option<String>,
    /// Emit all strings as one aggregate constant
    #[arg(long)]
    pack_strings: bool,
    /// Keep original number literal text
    #[arg(long)]
    number_text: bool,
}

impl OptionArgs {
    /// Layer defaults, then the config file, then flags. `header` supplies
    /// the include name when `--header-name` is not given.
    fn resolve(self, header: Option<&Path>) -> Result<CompileOptions> {
        let mut options = load_options(self.config.as_deref())?;
        if let Some(root) = self.root {
            options.root_name = root;
        }
        if self.namespace.is_some() {
            options.namespace = self.namespace;
        }
        if let Some(name) = self.header_name.or_else(|| header.and_then(file_name)) {
            options.header_name = name;
        }
        options.pack_strings |= self.pack_strings;
        options.include_number_source_text |= self.number_text;
        Ok(options)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            header,
            source,
            options,
        } => {
            let options = options.resolve(header.as_deref())?;
            let compiled = compile_input(input.as_deref(), &options)?;
            write_artifacts(header.as_deref(), source.as_deref(), &compiled)?;
        }
        Commands::Stats {
            input,
            json,
            options,
        } => {
            let options = options.resolve(None)?;
            let compiled = compile_input(input.as_deref(), &options)?;
            let report = &compiled.report;
            if json {
                println!("{}", serde_json::to_string_pretty(report)?);
                return Ok(());
            }
            println!("Nodes:         {}", report.nodes_visited);
            println!("Distinct:      {}", report.distinct.total());
            println!("Declarations:  {}", report.emitted_declarations);
            println!("Dedup hits:    {}", report.dedup_hits);
            println!("Dedup ratio:   {:.1}%", report.dedup_ratio() * 100.0);
            println!("Adjusted:      {}", report.adjustments.len());
            for adjusted in &report.adjustments {
                println!(
                    "  {}: {} ({})",
                    display_pointer(&adjusted.path),
                    adjusted.literal,
                    adjusted.adjustment
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_options(path: Option<&Path>) -> Result<CompileOptions> {
    let Some(path) = path else {
        return Ok(CompileOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

fn compile_input(path: Option<&Path>, options: &CompileOptions) -> Result<CompiledDocument> {
    let json = read_input(path)?;
    let compiled = panzer_core::compile_str(&json, options).context("Failed to compile JSON")?;
    tracing::info!(
        nodes = compiled.report.nodes_visited,
        declarations = compiled.report.emitted_declarations,
        "compiled document"
    );
    Ok(compiled)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Write both artifacts to temporary files first, then rename them into
/// place, so a failure never leaves a half-written pair behind.
fn write_artifacts(
    header: Option<&Path>,
    source: Option<&Path>,
    compiled: &CompiledDocument,
) -> Result<()> {
    let mut staged = Vec::new();
    if let Some(path) = header {
        staged.push((stage(path, &compiled.declarations)?, path));
    }
    match source {
        Some(path) => staged.push((stage(path, &compiled.definitions)?, path)),
        None => print!("{}", compiled.definitions),
    }
    for (file, path) in staged {
        file.persist(path)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}

fn stage(path: &Path, content: &str) -> Result<tempfile::NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to stage {}", path.display()))?;
    Ok(file)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "(root)"
    } else {
        pointer
    }
}
