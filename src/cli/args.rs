use std::fmt::Write;
use std::path::PathBuf;

use clap::{
    ArgAction, ColorChoice, Parser, Subcommand, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use texpreview::app_dirs;

/// Produce the full version banner including config and cache directories.
fn long_version() -> &'static str {
    let config_dir = match app_dirs::get_config_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };
    let cache_dir = match app_dirs::get_cache_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };

    let mut details = format!("texpreview {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(details);
    let _ = writeln!(details, "config directory: {config_dir}");
    let _ = writeln!(details, "cache directory: {cache_dir}");

    Box::leak(details.into_boxed_str())
}

/// Create the clap styles used for custom colour output.
fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into [`CliArgs`].
pub(crate) fn parse_cli() -> CliArgs {
    CliArgs::parse()
}

#[derive(Parser, Debug)]
#[command(
    name = "texpreview",
    version,
    long_version = long_version(),
    about = "Render LaTeX formulas into placeable document images",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
/// Command-line arguments accepted by the `texpreview` binary.
pub(crate) struct CliArgs {
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "TEXPREVIEW_CONFIG",
        action = ArgAction::Append,
        global = true,
        help = "Additional configuration file to merge (default: none)"
    )]
    pub(crate) config: Vec<PathBuf>,
    #[arg(
        short = 'n',
        long = "no-config",
        global = true,
        help = "Skip loading default configuration files (default: disabled)"
    )]
    pub(crate) no_config: bool,
    #[arg(
        short = 'e',
        long,
        value_name = "PROGRAM",
        global = true,
        help = "LaTeX compiler to run, by name or path (default: pdflatex)"
    )]
    pub(crate) executable: Option<String>,
    #[arg(
        short = 'w',
        long = "work-dir",
        value_name = "DIR",
        global = true,
        help = "Directory for the generated source and PDF (default: cache directory)"
    )]
    pub(crate) work_dir: Option<PathBuf>,
    #[arg(
        long = "min-width",
        value_name = "UNITS",
        global = true,
        help = "Width used when a rendering has no usable aspect ratio (default: 10)"
    )]
    pub(crate) min_width: Option<f64>,
    #[arg(
        long = "print-config",
        global = true,
        help = "Print the effective configuration before running (default: disabled)"
    )]
    pub(crate) print_config: bool,
    #[arg(
        short = 'o',
        long,
        value_enum,
        default_value_t = OutputFormat::Plain,
        global = true,
        help = "Output format for the inserted element"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (repeatable)"
    )]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Render one formula and insert it into a scratch document.
    Render {
        /// Formula text, without surrounding math delimiters.
        formula: String,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Treat each stdin line as the new formula text; insert the last one on EOF.
    Watch {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

/// Geometry of a previously inserted formula the new one replaces.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct SelectionArgs {
    #[arg(long, value_name = "TEXT", help = "Text of the formula being replaced")]
    pub(crate) replace: Option<String>,
    #[arg(long, default_value_t = 0.0, help = "X position of the replaced element")]
    pub(crate) x: f64,
    #[arg(long, default_value_t = 0.0, help = "Y position of the replaced element")]
    pub(crate) y: f64,
    #[arg(long, default_value_t = 0.0, help = "Width of the replaced element")]
    pub(crate) width: f64,
    #[arg(long, default_value_t = 0.0, help = "Height of the replaced element")]
    pub(crate) height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn render_accepts_replacement_geometry() {
        let args = CliArgs::try_parse_from([
            "texpreview",
            "-o",
            "json",
            "render",
            "x^3",
            "--replace",
            "x^2",
            "--height",
            "12",
        ])
        .expect("parse");
        assert_eq!(args.output, OutputFormat::Json);
        match args.command {
            Command::Render { formula, selection } => {
                assert_eq!(formula, "x^3");
                assert_eq!(selection.replace.as_deref(), Some("x^2"));
                assert_eq!(selection.height, 12.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
