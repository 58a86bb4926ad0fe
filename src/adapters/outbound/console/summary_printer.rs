use crate::application::read_models::AnalysisReport;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Renders the end-of-run summary for a terminal.
pub struct SummaryPrinter {
    colored: bool,
}

impl SummaryPrinter {
    /// Colors are enabled only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            colored: std::io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn print(&self, report: &AnalysisReport) {
        eprintln!("{}", self.render(report));
    }

    pub fn render(&self, report: &AnalysisReport) -> String {
        let summary = &report.summary;
        let mut lines = vec![
            String::new(),
            format!("📊 Compatibility summary for '{}'", report.metadata.sbom_name),
            format!("   Total components:           {}", summary.total_components),
            self.line("Compatible", summary.compatible, Tone::Good),
            self.line("Incompatible", summary.incompatible, Tone::Bad),
            self.line("Needs upgrade", summary.needs_upgrade, Tone::Bad),
            self.line("Needs verification", summary.needs_verification, Tone::Warn),
            self.line(
                "Needs version verification",
                summary.needs_version_verification,
                Tone::Warn,
            ),
            self.line("Unknown", summary.unknown, Tone::Neutral),
            format!("   Compatibility rate:         {:.1}%", summary.compatibility_rate),
        ];
        if let Some(os) = &report.metadata.detected_os {
            lines.push(format!("   Detected OS:                {}", os));
        }
        if !report.errors.is_empty() {
            let warning = format!("⚠️  {} non-fatal error(s) recorded", report.errors.len());
            lines.push(self.paint(&warning, Tone::Warn));
        }
        lines.join("\n")
    }

    fn line(&self, label: &str, count: usize, tone: Tone) -> String {
        let value = count.to_string();
        let value = if count == 0 {
            value
        } else {
            self.paint(&value, tone)
        };
        format!("   {:<28}{}", format!("{}:", label), value)
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.colored {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Bad => text.red().bold().to_string(),
            Tone::Warn => text.yellow().to_string(),
            Tone::Neutral => text.dimmed().to_string(),
        }
    }
}

impl Default for SummaryPrinter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Warn,
    Neutral,
}
