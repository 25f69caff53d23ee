//! Pagecraft CLI: paginate a JSON file of measured boxes
//! The main interface is through the library and WASM bindings.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::Env;

use pagecraft::{paginate_observed, BoxTree, PaginationEvent, PaginationOptions, PaginationResult, SplitRange};

#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(version)]
#[command(about = "Decide page breaks for a document of measured boxes", long_about = None)]
struct Cli {
    /// Measured boxes as JSON
    #[arg(value_name = "BOXES")]
    boxes: PathBuf,

    /// Pagination options as JSON (camelCase fields)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Content height per page, overriding the options file
    #[arg(long, value_name = "H")]
    content_height: Option<f32>,

    /// Print the result as pretty JSON
    #[arg(long)]
    json: bool,

    /// Print recorded pagination events after the summary
    #[arg(long)]
    events: bool,
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Route engine logs to stderr; oversize warnings show unless `RUST_LOG`
/// says otherwise
fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(cli.options.as_deref(), cli.content_height)?;
    let tree = BoxTree::from_path(&cli.boxes).map_err(|e| format!("{}: {}", cli.boxes.display(), e))?;

    let mut events: Vec<PaginationEvent> = Vec::new();
    let result = paginate_observed(&tree, &options, &mut events)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_summary(&tree, &result, &options);
    if cli.events {
        for event in &events {
            println!("event: {:?}", event);
        }
    }
    Ok(())
}

fn load_options(
    path: Option<&Path>,
    content_height: Option<f32>,
) -> Result<PaginationOptions, Box<dyn std::error::Error>> {
    let mut options = match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            PaginationOptions::from_json(&json)?
        }
        None => PaginationOptions::default(),
    };
    if let Some(height) = content_height {
        options = options.with_content_height(height);
    }
    Ok(options)
}

fn print_summary(tree: &BoxTree, result: &PaginationResult, options: &PaginationOptions) {
    println!(
        "{} boxes, {} pages, content height {:.1}",
        tree.root_count(),
        result.page_count(),
        options.content_height
    );
    for page in &result.pages {
        println!(
            "page {:>3}  {:>7.1} / {:.1}",
            page.index + 1,
            page.consumed_height,
            options.content_height
        );
        for fragment in &page.fragments {
            let part = match &fragment.split_range {
                Some(SplitRange::Lines(r)) => format!(" lines {}..{}", r.start, r.end),
                Some(SplitRange::Children(r)) => format!(" items {}..{}", r.start, r.end),
                None => String::new(),
            };
            println!(
                "    #{:<4} {:<16} {:>7.1}{}",
                fragment.box_id.0,
                fragment.kind.name(),
                fragment.height,
                part
            );
        }
    }
    for warning in &result.warnings {
        println!(
            "warning: box #{} overflows page {} by {:.1}",
            warning.box_id.0,
            warning.page_index + 1,
            warning.excess_height
        );
    }
    if !result.skipped.is_empty() {
        println!("skipped {} empty boxes", result.skipped.len());
    }
}
