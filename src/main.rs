use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use vulntrack_report::{FontConfig, ReportDownload};

#[derive(Parser)]
#[command(name = "vulntrack-report")]
#[command(version)]
#[command(about = "Render a VulnTrack vulnerability report payload (JSON) as a PDF")]
struct Cli {
    /// Report payload JSON file, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF path
    #[arg(short, long, default_value = ReportDownload::FILENAME)]
    output: PathBuf,

    /// TrueType/OpenType file for body text (overrides VULNTRACK_FONT_REGULAR)
    #[arg(long, value_name = "PATH")]
    font_regular: Option<PathBuf>,

    /// TrueType/OpenType file for bold text (overrides VULNTRACK_FONT_BOLD)
    #[arg(long, value_name = "PATH")]
    font_bold: Option<PathBuf>,

    /// Log phase timings
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let env_fonts = FontConfig::from_env();
    let fonts = FontConfig {
        regular: cli.font_regular.or(env_fonts.regular),
        bold: cli.font_bold.or(env_fonts.bold),
    };

    let result = if cli.input.as_os_str() == "-" {
        let mut body = Vec::new();
        std::io::stdin()
            .read_to_end(&mut body)
            .map_err(vulntrack_report::Error::Io)
            .and_then(|_| vulntrack_report::convert_json_bytes_to_pdf(&body, &cli.output, &fonts))
    } else {
        vulntrack_report::convert_json_to_pdf(&cli.input, &cli.output, &fonts)
    };

    match result {
        Ok(()) => {
            log::info!("Wrote {}", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
