use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use blogmark::{Config, Highlighter, SyntectHighlighter};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "blogmark")]
#[command(about = "Render blog Markdown to sanitized HTML")]
struct Cli {
    /// Input Markdown file
    #[arg(required_unless_present = "css")]
    input: Option<PathBuf>,

    /// Output HTML file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip sanitization and emit the renderer's HTML as-is
    #[arg(long)]
    raw: bool,

    /// Highlight fenced code blocks
    #[arg(long)]
    highlight: bool,

    /// Print the highlight theme stylesheet and exit
    #[arg(long)]
    css: bool,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::compiled_default(),
    };
    let highlighter = SyntectHighlighter::from_config(&config.highlight);

    if cli.css {
        match highlighter.stylesheet() {
            Ok(css) => print!("{}", css),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let Some(input) = cli.input else {
        eprintln!("Error: no input file");
        std::process::exit(1);
    };

    // Read input file
    let markdown = match fs::read(&input) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            std::process::exit(1);
        }
    };

    let highlighter: Option<&dyn Highlighter> = if cli.highlight || config.highlight.enabled {
        Some(&highlighter)
    } else {
        None
    };

    let html = if cli.raw {
        blogmark::markdown_to_html_with(&markdown, highlighter)
    } else {
        blogmark::markdown_to_safe_html(&markdown, &config, highlighter)
    };

    match cli.output {
        Some(output) => {
            if let Err(e) = fs::write(&output, html) {
                eprintln!("Error writing {}: {}", output.display(), e);
                std::process::exit(1);
            }
            eprintln!("Created {}", output.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", html) {
                eprintln!("Error writing output: {}", e);
                std::process::exit(1);
            }
        }
    }
}
