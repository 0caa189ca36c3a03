use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use reportify::{demo, HeadingRow, Orientation, Report};

/// Builds PDF reports from the command line.
///
/// Fonts are looked up under `assets/fonts`, the directory named by `REPORTIFY_FONTS_DIR` and the
/// usual system font directories. Set `RUST_LOG=debug` to see layout decisions.
#[derive(Parser)]
#[command(author, version, about = "Build paginated PDF reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the sample report.
    Sample {
        /// Destination PDF file.
        #[arg(short, long, default_value = "report.pdf")]
        output: PathBuf,
    },

    /// Render a plain-text outline.
    ///
    /// Lines starting with `# `, `## ` or `### ` are headings, blank lines separate paragraphs.
    /// A trailing `{L}`, `{C}` or `{R}` sets a block's alignment.
    Render {
        /// Outline file to read.
        outline: PathBuf,

        /// Destination PDF file.
        #[arg(short, long)]
        output: PathBuf,

        /// Text repeated at the top of every page.
        #[arg(long)]
        header: Option<String>,

        /// Heading table row; may be repeated.
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<HeadingRow>,

        /// Page orientation, `P` or `L`.
        #[arg(long, default_value = "P")]
        orientation: String,

        /// Print an end-of-report marker after the last block.
        #[arg(long)]
        end_marker: bool,
    },
}

fn parse_meta(value: &str) -> Result<HeadingRow, String> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", value))?;
    Ok(HeadingRow::new(key.trim(), value.trim()))
}

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("RUST_LOG", "warn,reportify=info"))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sample { output } => sample(output),
        Commands::Render {
            outline,
            output,
            header,
            meta,
            orientation,
            end_marker,
        } => render(outline, output, header, meta, &orientation, end_marker),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn sample(output: PathBuf) -> Result<(), Box<dyn Error>> {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let rendered = demo::sample_report(output, generated).generate()?;
    println!("Generated sample report ({} pages)", rendered.page_count);
    Ok(())
}

fn render(
    outline: PathBuf,
    output: PathBuf,
    header: Option<String>,
    meta: Vec<HeadingRow>,
    orientation: &str,
    end_marker: bool,
) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&outline)
        .map_err(|err| format!("failed to read {}: {}", outline.display(), err))?;

    let mut builder = Report::builder()
        .with_output_file(output)
        .with_heading_table(meta)
        .with_end_marker(end_marker)
        .with_page_orientation(Orientation::parse(orientation));
    if let Some(header) = header {
        builder = builder.with_header(header);
    }

    let mut report = builder.build();
    let blocks = report.add_outline(&text)?;
    info!("Parsed {} block(s) from {}", blocks, outline.display());

    let rendered = report.generate()?;
    println!("Generated report ({} pages)", rendered.page_count);
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn meta_rows_split_on_first_equals() {
        assert_eq!(
            parse_meta("Subject = a=b").unwrap(),
            HeadingRow::new("Subject", "a=b")
        );
        assert!(parse_meta("no separator").is_err());
    }
}
