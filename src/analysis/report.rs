use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use super::record::Analysis;

/// Outcome of one sample in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum EntryStatus {
    /// Analysis produced bands
    Ok(String),
    /// Analysis succeeded but is incomplete
    Warning(String),
    /// Analysis failed
    Failed(String),
}

impl EntryStatus {
    fn is_ok(&self) -> bool {
        matches!(self, EntryStatus::Ok(_))
    }

    fn is_warning(&self) -> bool {
        matches!(self, EntryStatus::Warning(_))
    }

    fn is_failed(&self) -> bool {
        matches!(self, EntryStatus::Failed(_))
    }

    fn message(&self) -> &str {
        match self {
            EntryStatus::Ok(msg) | EntryStatus::Warning(msg) | EntryStatus::Failed(msg) => msg,
        }
    }
}

/// Report line for one sample measurement
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub name: String,
    pub status: EntryStatus,
}

impl BatchEntry {
    /// Summarise a finished analysis. No bands, or assigned bands without
    /// any result, are reported as warnings.
    pub fn from_analysis(name: impl Into<String>, analysis: &Analysis) -> Self {
        let bands = analysis.bands();
        let assigned = bands.iter().filter(|b| b.is_assigned()).count();
        let results = analysis.measurement_results();
        let summary = format!("{} bands ({} assigned), {} results", bands.len(), assigned, results.len());

        let status = if bands.is_empty() {
            EntryStatus::Warning("no bands detected".to_string())
        } else if results.is_empty() && bands.iter().any(|b| b.extinction_coefficient().is_some()) {
            EntryStatus::Warning(format!("{}; quantification skipped", summary))
        } else {
            let details: Vec<String> = results.iter().map(|r| format!("{} = {}", r.name, r.value)).collect();
            if details.is_empty() {
                EntryStatus::Ok(summary)
            } else {
                EntryStatus::Ok(format!("{}: {}", summary, details.join(", ")))
            }
        };
        Self {
            name: name.into(),
            status,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: EntryStatus::Failed(message.into()),
        }
    }
}

/// Summary of a batch run over one experiment
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub experiment: String,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn new(experiment: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: BatchEntry) {
        self.entries.push(entry);
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.status.is_failed())
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|e| e.status.is_warning())
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_ok()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_warning()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_failed()).count()
    }

    /// Format the report with colors (requires the `colorized_output` feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();
            output.push_str(&format!("{}\n", style("Batch Analysis Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("=====================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("Experiment").bold(), self.experiment));

            for entry in &self.entries {
                let line = match &entry.status {
                    EntryStatus::Ok(msg) => format!("[{}] {} - {}", OK, style(&entry.name).green(), msg),
                    EntryStatus::Warning(msg) => format!(
                        "[{}] {} - {}: {}",
                        WARN,
                        style(&entry.name).yellow(),
                        style("WARNING").yellow().bold(),
                        msg
                    ),
                    EntryStatus::Failed(msg) => format!(
                        "[{}] {} - {}: {}",
                        FAIL,
                        style(&entry.name).red(),
                        style("FAILED").red().bold(),
                        msg
                    ),
                };
                output.push_str(&line);
                output.push('\n');
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} analyzed, {} warnings, {} failed\n",
                style("Summary").bold(),
                style(self.success_count()).green(),
                style(self.warning_count()).yellow(),
                style(self.failure_count()).red()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Analysis Report")?;
        writeln!(f, "=====================")?;
        writeln!(f, "Experiment: {}", self.experiment)?;
        writeln!(f)?;

        for entry in &self.entries {
            match &entry.status {
                EntryStatus::Ok(_) => writeln!(f, "[✓] {} - {}", entry.name, entry.status.message())?,
                EntryStatus::Warning(msg) => writeln!(f, "[⚠] {} - WARNING: {}", entry.name, msg)?,
                EntryStatus::Failed(msg) => writeln!(f, "[✗] {} - FAILED: {}", entry.name, msg)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} analyzed, {} warnings, {} failed",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )
    }
}
