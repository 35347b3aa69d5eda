use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A short user-facing message: a title plus one line of detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Prints notices to the terminal. Info goes to stdout, errors to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => println!("{} {}", notice.title.bold(), notice.description),
            Severity::Error => eprintln!("{} {}", notice.title.bold().red(), notice.description),
        }
    }
}
