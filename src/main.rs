use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tablestyle-pdf", about = "Render an XML sheet description to PDF")]
struct Args {
    /// Input sheet (XML)
    input: PathBuf,
    /// Output PDF file (defaults to input with .pdf extension)
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("pdf"));
    log::info!(
        "Rendering {} -> {}",
        args.input.display(),
        output.display()
    );

    if let Err(e) = tablestyle_pdf::convert_markup_to_pdf(&args.input, &output) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
