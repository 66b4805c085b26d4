use colored::{Color, Colorize};
use lnxmirror_core::{
    domain::{Operation, OperationKind},
    ports::operation_sink::IOperationSink,
};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("{} {}", "\u{2713}".green(), message);
    }
    fn error(&self, message: &str) {
        eprintln!("{} {}", "\u{2717} Error:".red().bold(), message);
    }
    fn warn(&self, message: &str) {
        eprintln!("{} {}", "\u{26a0} Warning:".yellow(), message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

// ============================================================================
// Console operation sink
// ============================================================================

/// Console color of each operation tag
pub fn tag_color(kind: OperationKind) -> Color {
    match kind {
        OperationKind::Copy => Color::Green,
        OperationKind::Delete => Color::TrueColor {
            r: 255,
            g: 165,
            b: 0,
        },
        OperationKind::Update => Color::Yellow,
        OperationKind::Create => Color::Blue,
        OperationKind::Warning | OperationKind::Error => Color::Red,
    }
}

/// Banner printed at the start of every scheduled tick
pub const TICK_BANNER: &str = "[ SYNCHR ]";

/// Prints every operation to stdout as it happens
///
/// Human output colors the tag; JSON output emits one object per line.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    format: OutputFormat,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders the line printed for `operation`
    pub fn render(&self, operation: &Operation) -> String {
        match self.format {
            OutputFormat::Human => {
                let kind = operation.kind();
                format!(
                    "{}  {}",
                    kind.tag().color(tag_color(kind)),
                    operation.body()
                )
            }
            OutputFormat::Json => serde_json::to_string(operation).unwrap_or_default(),
        }
    }
}

impl IOperationSink for ConsoleSink {
    fn notify(&self, operation: &Operation) {
        println!("{}", self.render(operation));
    }
}
