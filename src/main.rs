use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use reportflow::{Config, Document, ExportFormat, Exporter, MeasurerKind};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Docx,
    Pdf,
    Html,
    All,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MeasureArg {
    Metrics,
    Heuristic,
}

/// Paginate a report, abstract or resume snapshot and export it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON document snapshot (`"kind": "report" | "abstract" | "resume"`)
    input: PathBuf,

    #[arg(short, long, value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Output file, or directory when exporting all formats
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Height oracle used for pagination [env: REPORTFLOW_MEASURER]
    #[arg(long, value_enum)]
    measure: Option<MeasureArg>,

    /// Extra font directory, searched before the system ones (repeatable)
    #[arg(long = "fonts", value_name = "DIR")]
    fonts: Vec<PathBuf>,
}

fn run(cli: Cli) -> reportflow::Result<()> {
    let mut config = Config::from_env();
    if let Some(m) = cli.measure {
        config.measurer = match m {
            MeasureArg::Metrics => MeasurerKind::Metrics,
            MeasureArg::Heuristic => MeasurerKind::Heuristic,
        };
    }
    if !cli.fonts.is_empty() {
        let mut dirs = cli.fonts;
        dirs.extend(config.font_dirs);
        config.font_dirs = dirs;
    }

    let document = Document::open(&cli.input)?;
    let fonts = reportflow::load_fonts(&document, &config);
    let exporter = Exporter::new(fonts, config.measurer);

    let single = match cli.format {
        FormatArg::Docx => Some(ExportFormat::Docx),
        FormatArg::Pdf => Some(ExportFormat::Pdf),
        FormatArg::Html => Some(ExportFormat::Html),
        FormatArg::All => None,
    };

    let reports = match single {
        Some(format) => {
            let dest = cli.output.unwrap_or_else(|| {
                cli.input
                    .with_file_name(format!("{}.{}", document.file_stem(), format.extension()))
            });
            vec![exporter.export(&document, format, &dest)?]
        }
        None => {
            let dir = cli.output.unwrap_or_else(|| {
                cli.input
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            std::fs::create_dir_all(&dir)?;
            exporter.export_all(&document, &dir)?
        }
    };

    for r in reports {
        println!("{} ({} pages, {} bytes)", r.path.display(), r.pages, r.bytes);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
