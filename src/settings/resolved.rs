use texpreview::SessionOptions;

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub session: SessionOptions,
}

impl ResolvedConfig {
    /// Print a human readable summary of the effective configuration.
    pub fn print_summary(&self) {
        let session = &self.session;
        println!("Effective configuration:");
        println!("  Executable: {}", session.executable);
        if session.flags.is_empty() {
            println!("  Flags: (none)");
        } else {
            println!("  Flags: {}", session.flags.join(" "));
        }
        println!("  Working directory: {}", session.work_dir.display());
        println!("  Initial formula: {}", session.initial_formula);
        println!("  Minimum width: {}", session.min_width);
    }
}
