//! bookprobe - analyze one picture-book folder

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookprobe::{AnalysisReport, AnalyzerOptions, BookAnalyzer, compute_image_hash};

#[derive(Parser)]
#[command(name = "bookprobe")]
#[command(version, about = "Picture-book metadata and suitability analyzer", long_about = None)]
#[command(after_help = "EXAMPLES:
    bookprobe books/MyBook                     Show a summary
    bookprobe books/MyBook --json              Print the full report as JSON
    bookprobe books/MyBook --write-collection  Write temp.bloomCollection beside the book")]
struct Cli {
    /// Unpacked book folder (book .htm file plus meta.json)
    #[arg(value_name = "FOLDER")]
    folder: PathBuf,

    /// Write the collection descriptor into the folder's parent
    #[arg(long)]
    write_collection: bool,

    /// Fingerprint the representative image
    #[arg(long)]
    hash_image: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Branding used when the book names none
    #[arg(long, env = "BOOKPROBE_BRANDING", default_value = "Default")]
    branding: String,

    /// Front/back-matter pack used when the folder names none
    #[arg(long, env = "BOOKPROBE_XMATTER", default_value = "Device")]
    xmatter: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let options = AnalyzerOptions::default()
        .with_default_branding(&cli.branding)
        .with_default_xmatter(&cli.xmatter);
    let analyzer = BookAnalyzer::from_folder(&cli.folder, options).map_err(|e| e.to_string())?;
    let mut report = analyzer.analyze();

    if cli.hash_image {
        match analyzer.representative_image_path() {
            Some(path) => {
                let bytes = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))?;
                let hash = compute_image_hash(&bytes).map_err(|e| format!("{}: {e}", path.display()))?;
                report.set_image_hash(hash);
            }
            None => eprintln!("warning: no representative image to hash"),
        }
    }

    let collection = if cli.write_collection {
        Some(analyzer.write_collection(&cli.folder).map_err(|e| e.to_string())?)
    } else {
        None
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&cli.folder, &report, collection.as_deref());
    }
    Ok(())
}

fn print_summary(folder: &Path, report: &AnalysisReport, collection: Option<&Path>) {
    let langs = &report.languages;
    println!("Book: {}", folder.display());
    println!("Languages: L1={} L2={} L3={} sign={}", langs.l1, langs.l2, langs.l3, langs.sign);
    if !report.location.is_empty() {
        println!(
            "Location: {}",
            [&report.location.district, &report.location.province, &report.location.country]
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!("Branding: {}", report.branding);
    if !report.bookshelf.is_empty() {
        println!("Bookshelf: {}", report.bookshelf);
    }
    println!("Generator: {}", report.generator);
    println!("Level: {}", report.level);
    println!("Reader suitable: {}", report.reader_suitable);
    println!("ePub suitable: {}", report.epub.is_suitable());
    if report.custom_license {
        println!("License: custom");
    }
    if let Some(src) = &report.representative_image {
        println!("Image: {src}");
    }
    if let Some(hash) = &report.image_hash {
        println!("Image hash: {hash}");
    }
    if report.settings_changed {
        println!("Publish settings: updated");
    }
    if let Some(path) = collection {
        println!("Collection: {}", path.display());
    }
    for diagnostic in &report.diagnostics {
        println!("  {diagnostic}");
    }
}
