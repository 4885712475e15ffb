//! Terminal output for the docent CLI.
//!
//! Every line goes through [`Output`] so `--no-color` switches the whole
//! program to plain tagged text.

use owo_colors::OwoColorize;

/// Kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Info,
    Warning,
    Error,
}

impl Status {
    fn plain_tag(self) -> &'static str {
        match self {
            Status::Success => "[OK]",
            Status::Info => "[INFO]",
            Status::Warning => "[WARN]",
            Status::Error => "[ERROR]",
        }
    }

    fn render(self, message: &str) -> String {
        match self {
            Status::Success => format!("{} {}", "✓".green().bold(), message.green()),
            Status::Info => format!("{} {}", "•".blue(), message),
            Status::Warning => format!("{} {}", "⚠".yellow().bold(), message.yellow()),
            Status::Error => format!("{} {}", "✗".red().bold(), message.red()),
        }
    }
}

pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn format_status(&self, status: Status, message: &str) -> String {
        if self.colored {
            format!("  {}", status.render(message))
        } else {
            format!("  {} {}", status.plain_tag(), message)
        }
    }

    /// Name and version, printed before store statistics
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!("\n  {} {}", "docent".bright_cyan().bold(), version.dimmed());
        } else {
            println!("\n  docent {}", version);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.format_status(Status::Success, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.format_status(Status::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.format_status(Status::Warning, message));
    }

    /// Goes to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.format_status(Status::Error, message));
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Titled bullet list; prints nothing when `items` is empty.
    pub fn list(&self, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
        for item in items {
            if self.colored {
                println!("    {} {}", "•".blue(), item);
            } else {
                println!("    - {}", item);
            }
        }
    }

    /// Model output, indented line by line.
    pub fn answer(&self, text: &str) {
        println!();
        for line in text.lines() {
            if self.colored {
                println!("  {}", line.bright_white());
            } else {
                println!("  {}", line);
            }
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}
