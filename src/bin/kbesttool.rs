use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use chart_kbest::kbest::{extract_with, ExtractOptions};
use chart_kbest::nbest::{format_text, report, NBestWriter};
use chart_kbest::settings::{init_custom, settings};
use chart_kbest::trace_init::init_tracing;
use chart_kbest::Forest;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "kbesttool", about = "k-best extraction from decoder forests")]
struct Cli {
    /// Custom settings TOML (overrides the embedded defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for JSON trace logs (requires the `trace` feature)
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the k best derivations of a forest
    Extract {
        /// Forest file (JSON or binary)
        forest: PathBuf,
        /// Number of derivations (default from settings)
        #[arg(short)]
        k: Option<usize>,
        /// Collapse derivations with identical output
        #[arg(long)]
        distinct: bool,
        /// Include the derivation tree of each entry
        #[arg(long)]
        tree: bool,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write the k-best list in `id ||| output ||| features ||| total` format
    Nbest {
        /// Forest file (JSON or binary)
        forest: PathBuf,
        /// Number of derivations (default from settings)
        #[arg(short)]
        k: Option<usize>,
        /// Sentence id written in the first column
        #[arg(long, default_value = "0")]
        id: usize,
        /// Collapse derivations with identical output
        #[arg(long)]
        distinct: bool,
        /// Omit the feature breakdown column
        #[arg(long)]
        no_breakdown: bool,
    },

    /// Check that a forest is a well-formed DAG
    Validate {
        /// Forest file (JSON or binary)
        forest: PathBuf,
    },

    /// Convert a forest between JSON and binary (by output extension)
    Convert {
        input: PathBuf,
        /// Output path; `.json` writes JSON, anything else binary
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(dir) = &cli.trace_dir {
        init_tracing(dir);
    }
    if let Some(path) = &cli.config {
        let text = die!(fs::read_to_string(path), "Error reading config: {}");
        die!(init_custom(text), "Error in config: {}");
    }

    match cli.command {
        Command::Extract {
            forest,
            k,
            distinct,
            tree,
            json,
        } => extract_cmd(&forest, options(k, distinct), tree, json),
        Command::Nbest {
            forest,
            k,
            id,
            distinct,
            no_breakdown,
        } => nbest_cmd(&forest, options(k, distinct), id, no_breakdown),
        Command::Validate { forest } => validate_cmd(&forest),
        Command::Convert { input, output } => convert_cmd(&input, &output),
    }
}

fn options(k: Option<usize>, distinct: bool) -> ExtractOptions {
    let mut options = ExtractOptions::default();
    if let Some(k) = k {
        options.k = k;
    }
    options.distinct |= distinct;
    options
}

fn load(path: &Path) -> Forest {
    let forest = die!(Forest::open(path), "Error opening forest: {}");
    die!(forest.validate(), "Malformed forest: {}");
    forest
}

fn extract_cmd(path: &Path, options: ExtractOptions, tree: bool, json: bool) {
    let forest = load(path);
    let list = extract_with(&forest, &options);
    let report = report(&list, tree || settings().output.include_tree);
    if json {
        let text = die!(
            serde_json::to_string_pretty(&report),
            "Error serializing report: {}"
        );
        println!("{text}");
    } else {
        print!("{}", format_text(&report));
    }
}

fn nbest_cmd(path: &Path, options: ExtractOptions, id: usize, no_breakdown: bool) {
    let forest = load(path);
    let list = extract_with(&forest, &options);
    let stdout = io::stdout();
    let mut writer = NBestWriter::new(BufWriter::new(stdout.lock()));
    if no_breakdown {
        writer = writer.include_breakdown(false);
    }
    die!(writer.write_list(id, &list), "Error writing n-best list: {}");
    die!(writer.into_inner().flush(), "Error writing n-best list: {}");
}

fn validate_cmd(path: &Path) {
    let forest = load(path);
    println!(
        "ok: {} nodes, {} alternatives, {} tops",
        forest.len(),
        forest.alternative_count(),
        forest.tops.len()
    );
}

fn convert_cmd(input: &Path, output: &Path) {
    let forest = load(input);
    die!(forest.save(output), "Error writing forest: {}");
    eprintln!("wrote {}", output.display());
}
