use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use markin_parse::{Document, ParseMode, ParseTrace};
use std::path::{Path, PathBuf};

mod build;
mod check;
mod config;

#[derive(Parser)]
#[command(name = "markin", version, about = "Parse, check and render Markin documents")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a markin.json config (default: ./markin.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderFormat {
    Terminal,
    Html,
    Page,
    Markin,
    Debug,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Strict,
    Markdown,
}

impl From<ModeArg> for ParseMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => ParseMode::Strict,
            ModeArg::Markdown => ParseMode::Markdown,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SourceFormat {
    Markin,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Markin file
    Render {
        /// Path to the .markin file (or JSON wire form with --from json)
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "terminal")]
        format: RenderFormat,

        /// Emphasis dialect (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Input format
        #[arg(long, value_enum, default_value = "markin")]
        from: SourceFormat,

        /// Print every parser production attempt to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Check Markin file(s) or directories for parse errors
    Check {
        /// Files or directories (walked recursively)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Emphasis dialect (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Build a standalone HTML page from a Markin file
    Build {
        /// Path to the .markin file
        file: String,

        /// Output directory
        #[arg(long, default_value = "dist")]
        out: String,

        /// Page title (overrides the config and the first header)
        #[arg(long)]
        title: Option<String>,

        /// Emphasis dialect (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Rebuild whenever the file changes
        #[arg(long)]
        watch: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            file,
            format,
            mode,
            from,
            trace,
        } => {
            let options = config.parse_options(mode.map(ParseMode::from));
            handle_render(&file, format, options, from, trace, &config.html)?;
        }
        Commands::Check { paths, mode } => {
            let options = config.parse_options(mode.map(ParseMode::from));
            let files = check::collect_files(&paths, &config)?;
            let report = check::check_files(&files, options, cli.quiet)?;
            if !cli.quiet {
                println!(
                    "{} {} file(s), {} failed",
                    "Checked".bold(),
                    report.checked,
                    report.failed
                );
            }
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Build {
            file,
            out,
            title,
            mode,
            watch,
        } => {
            let opts = build::BuildOpts {
                out_dir: Path::new(&out),
                title: title.as_deref(),
                html: &config.html,
                options: config.parse_options(mode.map(ParseMode::from)),
                quiet: cli.quiet,
            };
            if watch {
                // A broken first build should not stop the watcher
                if let Err(e) = build::handle_build(&file, &opts) {
                    eprintln!("{} {}", "Build error:".red().bold(), e);
                }
                build::watch_and_rebuild(&file, &opts)?;
            } else {
                build::handle_build(&file, &opts)?;
            }
        }
    }

    Ok(())
}

/// Trace sink that prints each production attempt to stderr.
struct StderrTrace;

impl ParseTrace for StderrTrace {
    fn enter(&mut self, production: &'static str, offset: usize, lookahead: &str) {
        eprintln!(
            "{} {:>6} {:<18} {}",
            "trace".dimmed(),
            offset,
            production.cyan(),
            format!("{lookahead:?}").dimmed()
        );
    }
}

fn handle_render(
    file: &str,
    format: RenderFormat,
    options: markin_parse::ParseOptions,
    from: SourceFormat,
    trace: bool,
    html: &config::HtmlConfig,
) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read '{file}'"))?;

    let doc = match from {
        SourceFormat::Markin => {
            let parser = markin_parse::Parser::new(options);
            let result = if trace {
                parser.parse_traced(&content, &mut StderrTrace)
            } else {
                parser.parse(&content)
            };
            result.map_err(|e| {
                let location = e.location();
                anyhow::anyhow!("{}:{}:{}: {}", file, location.line, location.column, e)
            })?
        }
        SourceFormat::Json => {
            if trace {
                eprintln!("{} --trace has no effect with --from json", "warning:".yellow().bold());
            }
            Document::from_json(&content).with_context(|| format!("Failed to decode '{file}'"))?
        }
    };

    let output = match format {
        RenderFormat::Terminal => doc.to_terminal(),
        RenderFormat::Html => doc.to_html(),
        RenderFormat::Page => doc.to_html_page(&markin_parse::PageConfig {
            title: html.title.clone(),
            lang: html.lang.clone(),
            stylesheet: html.stylesheet.clone(),
            source_path: None,
        }),
        RenderFormat::Markin => doc.to_markin_with(options.mode),
        RenderFormat::Debug => doc.to_debug_string(),
        RenderFormat::Json => doc.to_json_pretty()?,
    };

    // Renderers that already end in a newline are printed as-is
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}
