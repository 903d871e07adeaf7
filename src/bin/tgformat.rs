use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tgformat::config::Config;
use tgformat::export::ExportFormat;
use tgformat::session::{ClipboardPayload, FormatterSession};

#[derive(Parser, Debug)]
#[command(name = "tgformat")]
#[command(about = "Convert rich text into Telegram-ready HTML or MarkdownV2", long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sanitize input and print it in an export format
    Export {
        /// Output format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Treat the input as plain text instead of HTML
        #[arg(long)]
        plain: bool,

        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the sanitized HTML dialect of the input
    Sanitize {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path).context("Failed to load config"),
        None => Ok(Config::load()),
    }
}

fn session_from(config: &Config, input: &str, plain: bool) -> FormatterSession {
    let mut session = FormatterSession::with_sanitizer(config.build_sanitizer());
    let payload = if plain {
        ClipboardPayload::text(input)
    } else {
        ClipboardPayload::html(input)
    };
    session.paste(&payload);
    session
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Export {
            format,
            plain,
            file,
        } => {
            let input = read_input(file.as_deref())?;
            let format = format.unwrap_or(config.export.default_format);
            let session = session_from(&config, &input, plain);
            let export = session.export(format);
            tracing::debug!(action = export.action_name(), "export finished");
            println!("{}", export.text);
        }
        Commands::Sanitize { file } => {
            let input = read_input(file.as_deref())?;
            let session = session_from(&config, &input, false);
            println!("{}", session.export(ExportFormat::Html).text);
        }
    }

    Ok(())
}
