//! Report rendering, console formatting and persistence

mod colored;
mod formatter;
mod persist;
pub mod report;

pub use self::colored::{colorize_report, ColorScheme, LineTone};
pub use formatter::{ColoredFormatter, JsonFormatter, OutputFormatter, PlainFormatter};
pub use persist::FileReportSink;
pub use report::{render_report, ReportContext, SECTIONS};

use crate::models::Config;

/// Picks the formatter matching the output switches
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    pub fn create_formatter(config: &Config) -> Box<dyn OutputFormatter> {
        if config.json_output {
            Box::new(JsonFormatter)
        } else if config.enable_color {
            Box::new(ColoredFormatter::new(ColorScheme::default()))
        } else {
            Box::new(PlainFormatter)
        }
    }
}
