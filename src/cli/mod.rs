mod args;
mod console;
mod output;

pub(crate) use args::{CliArgs, Command, OutputFormat, SelectionArgs, parse_cli};
pub(crate) use console::ConsoleSink;
pub(crate) use output::{print_json, print_plain, shown_by_sink};
