use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::process::ExitCode;
use wardrive_map::config::{Config, ConfigOverrides};
use wardrive_map::logging::{self, LogLevel, Stage};
use wardrive_map::pipeline::generate_map;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render a wardriving survey as an interactive encryption map",
    long_about = None
)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Survey CSV to read [default: wifi_data.csv]
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// HTML page to write, replacing any existing file [default: map.html]
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Also write a JSON run summary here
    #[arg(long, value_hint = ValueHint::FilePath)]
    summary: Option<PathBuf>,

    /// Map provider API key (prefer the WARDRIVE_MAP_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Initial zoom level
    #[arg(long)]
    zoom: Option<u8>,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// Field delimiter: a single character, or `tab`
    #[arg(long)]
    delimiter: Option<String>,

    /// Lines to skip before the header row
    #[arg(long)]
    skip_lines: Option<usize>,

    /// Minimum log level: debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Append log entries to this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    log_file: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input: self.input.clone(),
            output: self.output.clone(),
            summary: self.summary.clone(),
            api_key: self.api_key.clone(),
            zoom: self.zoom,
            title: self.title.clone(),
            delimiter: self.delimiter.clone(),
            skip_lines: self.skip_lines,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logger(LogLevel::Info, cli.log_file.as_deref());
            logging::error(Stage::Config, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(config.log_level, config.log_file.as_deref());

    match generate_map(&config) {
        Ok(summary) => {
            println!(
                "Interactive map with 'ALL' menu has been successfully generated and saved to {}",
                summary.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}
