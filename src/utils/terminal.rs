//! Terminal output utilities

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Print a stage banner, e.g. `==== building dataview-web-public-2024.06.01 ====`
pub fn print_highlight(message: &str) {
    println!("{}", style(format!("==== {} ====", message)).yellow().bold());
}

/// Echo a command line before it runs
pub fn print_command(command_line: &str) {
    println!("{} {}", style("$").green().bold(), style(command_line).bold());
}

/// Create a spinner on stderr
///
/// Hidden when stderr is not a terminal so piped logs stay clean.
pub fn create_spinner(message: &str) -> ProgressBar {
    if !get_term().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Get the terminal for interactive output
pub fn get_term() -> Term {
    Term::stderr()
}
