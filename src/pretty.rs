//! Pretty printing for configuration errors.
//!
//! Errors are grouped by the layer that produced them, sensitive values are
//! redacted, and a short list of hints follows.
//!
//! ```text
//! Configuration errors (3):
//!
//!   config.yml:
//!     • 'db.port' = 70000: must be at most 65325
//!
//!   env:XNTHA_BASIC_LISTEN_PORT:
//!     • 'basic.listenPort': expected integer, received string
//!
//!   (general):
//!     • missing required field 'security.jwt.secret' (XNTHA_SECURITY_JWT_SECRET)
//!
//! Hints:
//!   • Set XNTHA_SECURITY_JWT_SECRET or add 'security.jwt.secret' to your configuration
//! ```

use std::io::{IsTerminal, Write};

use crate::error::{group_by_source, ConfigError, ConfigErrors};

/// Options for pretty printing errors.
#[derive(Debug, Clone)]
pub struct PrettyPrintOptions {
    pub color: ColorOption,
    pub group_by_source: bool,
    pub show_suggestions: bool,
    /// Maximum errors to display (None for all).
    pub max_errors: Option<usize>,
    pub redact_sensitive: bool,
}

impl Default for PrettyPrintOptions {
    fn default() -> Self {
        Self {
            color: ColorOption::Auto,
            group_by_source: true,
            show_suggestions: true,
            max_errors: Some(20),
            redact_sensitive: true,
        }
    }
}

impl PrettyPrintOptions {
    pub fn no_color() -> Self {
        Self {
            color: ColorOption::Never,
            ..Default::default()
        }
    }

    pub fn with_grouping(mut self, group: bool) -> Self {
        self.group_by_source = group;
        self
    }

    pub fn with_max_errors(mut self, max: Option<usize>) -> Self {
        self.max_errors = max;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_sensitive = redact;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOption {
    /// Color when stderr is a terminal
    Auto,
    Always,
    Never,
}

struct Palette {
    error: &'static str,
    source: &'static str,
    path: &'static str,
    value: &'static str,
    hint: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                error: "\x1b[1;31m",
                source: "\x1b[1;36m",
                path: "\x1b[1;37m",
                value: "\x1b[33m",
                hint: "\x1b[32m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                error: "",
                source: "",
                path: "",
                value: "",
                hint: "",
                reset: "",
            }
        }
    }
}

struct ErrorPrinter<'a> {
    options: &'a PrettyPrintOptions,
    palette: Palette,
}

impl<'a> ErrorPrinter<'a> {
    fn new(options: &'a PrettyPrintOptions, use_color: bool) -> Self {
        Self {
            options,
            palette: Palette::new(use_color),
        }
    }

    fn print(&self, errors: &ConfigErrors, out: &mut dyn Write) -> std::io::Result<()> {
        let p = &self.palette;
        writeln!(out, "\n{}Configuration errors ({}):{}\n", p.error, errors.len(), p.reset)?;

        let mut shown = 0;
        if self.options.group_by_source {
            for (source, group) in group_by_source(errors) {
                if self.limit_reached(shown) {
                    break;
                }
                writeln!(out, "  {}{}:{}", p.source, source, p.reset)?;
                for error in group {
                    if self.limit_reached(shown) {
                        break;
                    }
                    self.print_error(error, out)?;
                    shown += 1;
                }
                writeln!(out)?;
            }
        } else {
            for error in errors.iter() {
                if self.limit_reached(shown) {
                    break;
                }
                self.print_error(error, out)?;
                shown += 1;
            }
            writeln!(out)?;
        }

        if shown < errors.len() {
            writeln!(out, "  ...and {} more errors\n", errors.len() - shown)?;
        }

        if self.options.show_suggestions {
            self.print_suggestions(errors, out)?;
        }
        Ok(())
    }

    fn limit_reached(&self, shown: usize) -> bool {
        self.options.max_errors.is_some_and(|max| shown >= max)
    }

    fn print_error(&self, error: &ConfigError, out: &mut dyn Write) -> std::io::Result<()> {
        let p = &self.palette;
        let bullet = format!("    {}•{}", p.error, p.reset);

        match error {
            ConfigError::MissingField { path, env_var } => {
                write!(out, "{} missing required field '{}{}{}'", bullet, p.path, path, p.reset)?;
                match env_var {
                    Some(var) => writeln!(out, " ({})", var),
                    None => writeln!(out),
                }
            }
            ConfigError::TypeMismatch {
                path,
                expected,
                actual,
                ..
            } => writeln!(
                out,
                "{} '{}{}{}': expected {}, received {}",
                bullet, p.path, path, p.reset, expected, actual
            ),
            ConfigError::ValidationError {
                path,
                value,
                message,
                ..
            } => match value {
                Some(value) => writeln!(
                    out,
                    "{} '{}{}{}' = {}{}{}: {}",
                    bullet,
                    p.path,
                    path,
                    p.reset,
                    p.value,
                    self.redact(value, path),
                    p.reset,
                    message
                ),
                None => writeln!(out, "{} '{}{}{}': {}", bullet, p.path, path, p.reset, message),
            },
            ConfigError::SourceError { source_name, kind } => {
                writeln!(out, "{} {}: {}", bullet, source_name, kind)
            }
            ConfigError::DeserializeError { type_name, message } => {
                writeln!(out, "{} cannot build {}: {}", bullet, type_name, message)
            }
        }
    }

    fn print_suggestions(&self, errors: &ConfigErrors, out: &mut dyn Write) -> std::io::Result<()> {
        let suggestions: Vec<String> = errors.iter().filter_map(ConfigError::suggestion).take(3).collect();
        if suggestions.is_empty() {
            return Ok(());
        }

        let p = &self.palette;
        writeln!(out, "{}Hints:{}", p.hint, p.reset)?;
        for suggestion in suggestions {
            writeln!(out, "  • {}", suggestion)?;
        }
        writeln!(out)
    }

    fn redact<'v>(&self, value: &'v str, path: &str) -> &'v str {
        if self.options.redact_sensitive && is_sensitive_path(path) {
            "[REDACTED]"
        } else {
            value
        }
    }
}

/// Whether a config path looks like it holds a secret.
pub fn is_sensitive_path(path: &str) -> bool {
    const SENSITIVE: [&str; 5] = ["password", "secret", "token", "key", "credential"];
    let lower = path.to_lowercase();
    SENSITIVE.iter().any(|p| lower.contains(p))
}

fn should_use_color(color: ColorOption) -> bool {
    match color {
        ColorOption::Always => true,
        ColorOption::Never => false,
        ColorOption::Auto => std::io::stderr().is_terminal(),
    }
}

impl ConfigErrors {
    /// Print to stderr.
    pub fn pretty_print(&self, options: &PrettyPrintOptions) {
        let printer = ErrorPrinter::new(options, should_use_color(options.color));
        let _ = printer.print(self, &mut std::io::stderr());
    }

    /// Render to a string. `Auto` color renders without escapes.
    pub fn format(&self, options: &PrettyPrintOptions) -> String {
        let printer = ErrorPrinter::new(options, options.color == ColorOption::Always);
        let mut buf = Vec::new();
        let _ = printer.print(self, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Startup helpers for `Result<T, ConfigErrors>`.
pub trait ResolveExt<T> {
    /// Unwrap or pretty print errors and exit with code 1.
    ///
    /// ```no_run
    /// use strata::prelude::*;
    /// use strata::schema::{object, string};
    ///
    /// let config = Resolver::new(object([("name", string())]))
    ///     .resolve(None)
    ///     .unwrap_or_exit();
    /// ```
    fn unwrap_or_exit(self) -> T;

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T;

    /// Pretty print on error, then hand the errors back.
    fn or_print(self) -> Result<T, ConfigErrors>;
}

impl<T> ResolveExt<T> for Result<T, ConfigErrors> {
    fn unwrap_or_exit(self) -> T {
        self.unwrap_or_exit_with(&PrettyPrintOptions::default())
    }

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T {
        match self {
            Ok(value) => value,
            Err(errors) => {
                errors.pretty_print(options);
                std::process::exit(1);
            }
        }
    }

    fn or_print(self) -> Result<T, ConfigErrors> {
        self.inspect_err(|errors| errors.pretty_print(&PrettyPrintOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SourceErrorKind, SourceLocation};

    fn errors() -> ConfigErrors {
        ConfigErrors::from_vec(vec![
            ConfigError::MissingField {
                path: "security.jwt.secret".to_string(),
                env_var: Some("XNTHA_SECURITY_JWT_SECRET".to_string()),
            },
            ConfigError::TypeMismatch {
                path: "basic.listenPort".to_string(),
                source_location: Some(SourceLocation::env("XNTHA_BASIC_LISTEN_PORT")),
                expected: "integer".to_string(),
                actual: "string".to_string(),
            },
            ConfigError::ValidationError {
                path: "db.port".to_string(),
                source_location: Some(SourceLocation::new("config.yml").with_line(4)),
                value: Some("70000".to_string()),
                message: "must be at most 65325".to_string(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_format_groups_by_source() {
        let output = errors().format(&PrettyPrintOptions::no_color());

        assert!(output.contains("Configuration errors (3):"));
        assert!(output.contains("  config.yml:\n    • 'db.port' = 70000: must be at most 65325"));
        assert!(output.contains("  env:XNTHA_BASIC_LISTEN_PORT:"));
        assert!(output.contains("'basic.listenPort': expected integer, received string"));
        assert!(output.contains(
            "  (general):\n    • missing required field 'security.jwt.secret' (XNTHA_SECURITY_JWT_SECRET)"
        ));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_hints() {
        let output = errors().format(&PrettyPrintOptions::no_color());
        assert!(output.contains("Hints:"));
        assert!(output.contains("Set XNTHA_SECURITY_JWT_SECRET or add 'security.jwt.secret'"));

        let quiet = PrettyPrintOptions {
            show_suggestions: false,
            ..PrettyPrintOptions::no_color()
        };
        assert!(!errors().format(&quiet).contains("Hints:"));
    }

    #[test]
    fn test_redaction() {
        let errors = ConfigErrors::single(ConfigError::ValidationError {
            path: "db.password".to_string(),
            source_location: None,
            value: Some("hunter2".to_string()),
            message: "too short".to_string(),
        });

        let output = errors.format(&PrettyPrintOptions::no_color());
        assert!(output.contains("'db.password' = [REDACTED]: too short"));
        assert!(!output.contains("hunter2"));

        let output = errors.format(&PrettyPrintOptions::no_color().with_redaction(false));
        assert!(output.contains("hunter2"));
    }

    #[test]
    fn test_truncation() {
        let output = errors().format(&PrettyPrintOptions::no_color().with_grouping(false).with_max_errors(Some(1)));
        assert!(output.contains("...and 2 more errors"));

        let output = errors().format(&PrettyPrintOptions::no_color().with_max_errors(None));
        assert!(!output.contains("more errors"));
    }

    #[test]
    fn test_source_error() {
        let errors = ConfigErrors::single(ConfigError::SourceError {
            source_name: "config.yml".to_string(),
            kind: SourceErrorKind::ParseError {
                message: "did not find expected key".to_string(),
                line: Some(3),
                column: Some(1),
            },
        });
        let output = errors.format(&PrettyPrintOptions::no_color());
        assert!(output.contains("config.yml: parse error: did not find expected key at line 3, column 1"));
    }

    #[test]
    fn test_color_always() {
        let options = PrettyPrintOptions {
            color: ColorOption::Always,
            ..Default::default()
        };
        assert!(errors().format(&options).contains("\x1b[1;31m"));
    }

    #[test]
    fn test_is_sensitive_path() {
        assert!(is_sensitive_path("security.jwt.secret"));
        assert!(is_sensitive_path("db.password"));
        assert!(is_sensitive_path("security.jwt.refreshToken.expiresIn"));
        assert!(!is_sensitive_path("db.host"));
    }

    #[test]
    fn test_or_print_passes_through() {
        let ok: Result<u8, ConfigErrors> = Ok(1);
        assert_eq!(ok.or_print().unwrap(), 1);
        assert_eq!(Err::<u8, _>(errors()).or_print().unwrap_err().len(), 3);
    }
}
