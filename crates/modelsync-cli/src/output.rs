//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use modelsync_core::{Model, ModelKind, RouteEvent};
use serde_json::Value;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a model's state and attributes
    pub fn print_model<K: ModelKind + 'static>(&self, model: &Model<K>) {
        match self.format {
            OutputFormat::Human => {
                println!("Kind:     {}", model.kind().name());
                println!("Location: {}", model.url());
                println!("Status:   {}", model.status());
                if let Some(at) = model.last_synced_at() {
                    println!("Synced:   {}", at.format("%Y-%m-%d %H:%M:%S"));
                }
                if let Some(reason) = model.validation_error() {
                    println!("Invalid:  {}", reason);
                }
                println!();

                if model.attributes().is_empty() {
                    println!("No attributes.");
                    return;
                }
                let width = model.attributes().keys().map(|k| k.len()).max().unwrap_or(0);
                for (key, value) in model.attributes().iter() {
                    let label = format!("{}:", key);
                    println!("  {:width$} {}", label, display_value(value), width = width + 1);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "cid": model.cid().to_string(),
                        "kind": model.kind().name(),
                        "location": model.url(),
                        "status": model.status().to_string(),
                        "last_synced_at": model.last_synced_at(),
                        "changed": model.changed(),
                        "attributes": model.to_json(),
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", model.to_json());
            }
        }
    }

    /// Print the result of a route dispatch
    pub fn print_route(&self, event: &RouteEvent) {
        match self.format {
            OutputFormat::Human => {}
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "route": event.name,
                        "fragment": event.fragment,
                        "args": event.args,
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", event.name);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a line in human mode only
    pub fn notice(&self, msg: &str) {
        if self.format == OutputFormat::Human {
            println!("{}", msg);
        }
    }
}

/// Strings print bare, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
