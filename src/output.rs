use std::io::{self, Write};

use serde::Serialize;

use crate::app::RunReport;
use crate::manifest::MISSING_PREVIEW_LEN;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub written: usize,
    pub output: String,
    pub dry_run: bool,
    pub missing_count: usize,
    pub missing_preview: Vec<String>,
}

impl Summary {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            written: report.manifest.count(),
            output: report.output.to_string(),
            dry_run: !report.written,
            missing_count: report.missing.len(),
            missing_preview: report.missing.preview(MISSING_PREVIEW_LEN),
        }
    }

    pub fn render_human(&self) -> String {
        let mut text = if self.dry_run {
            format!(
                "Resolved {} entries (dry run, {} not written)\n",
                self.written, self.output
            )
        } else {
            format!("Wrote {} entries -> {}\n", self.written, self.output)
        };
        if self.missing_count > 0 {
            text.push_str(&format!(
                "{} IDs missing files (first {MISSING_PREVIEW_LEN}): {:?}\n",
                self.missing_count, self.missing_preview
            ));
        }
        text
    }
}

pub fn print_summary(summary: &Summary, mode: OutputMode) -> io::Result<()> {
    let mut stdout = io::stdout();
    match mode {
        OutputMode::Human => stdout.write_all(summary.render_human().as_bytes()),
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")
        }
    }
}
