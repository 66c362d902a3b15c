use std::fmt::Write;

use gust_summary_model::{GroupSummary, MetricKind, MetricSummary, SummaryData};
use itertools::Itertools;

use crate::format::{duration_ms, metric_fields};
use crate::operations_table::operations_table;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const FAINT: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone)]
pub struct TextSummaryOptions {
    /// Prefix for every line
    pub indent: String,
    /// Wrap marks and values in ANSI colour codes
    pub enable_colors: bool,
}

impl Default for TextSummaryOptions {
    fn default() -> Self {
        Self {
            indent: " ".to_string(),
            enable_colors: true,
        }
    }
}

struct Painter {
    enabled: bool,
}

impl Painter {
    fn paint(&self, colour: &str, text: &str) -> String {
        if self.enabled {
            format!("{colour}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn mark(&self, ok: bool) -> String {
        if ok {
            self.paint(GREEN, "✓")
        } else {
            self.paint(RED, "✗")
        }
    }
}

/// Render the summary as an indented, human readable block of text.
pub fn text_summary(data: &SummaryData, options: &TextSummaryOptions) -> String {
    let painter = Painter {
        enabled: options.enable_colors,
    };
    let indent = options.indent.as_str();
    let mut out = String::new();

    write_header(&mut out, data, indent);
    write_group(&mut out, &data.root_group, indent, &painter);
    out.push('\n');
    write_metrics(&mut out, data, indent, &painter);

    if !data.operations.is_empty() {
        let _ = writeln!(out, "\n{indent}Summary of operations");
        for line in operations_table(&data.operations).lines() {
            let _ = writeln!(out, "{indent}{line}");
        }
    }

    out
}

fn write_header(out: &mut String, data: &SummaryData, indent: &str) {
    let total_vus: usize = data.scenarios.values().map(|s| s.vus).sum();
    let _ = writeln!(
        out,
        "{indent}test: {} (run {})",
        data.test_name, data.run_id
    );
    let _ = writeln!(
        out,
        "{indent}scenarios: {} scenario{}, {} max VUs",
        data.scenarios.len(),
        if data.scenarios.len() == 1 { "" } else { "s" },
        total_vus
    );
    for (name, scenario) in &data.scenarios {
        let _ = writeln!(out, "{indent}  * {name}: {}", scenario.executor);
    }

    let (complete, interrupted) = data
        .scenarios
        .values()
        .fold((0, 0), |(c, i), s| {
            (c + s.iterations_completed, i + s.iterations_interrupted)
        });
    let _ = writeln!(
        out,
        "{indent}running ({}), {complete} complete and {interrupted} interrupted iterations\n",
        duration_ms(data.duration_ms as f64)
    );
}

fn write_group(out: &mut String, group: &GroupSummary, indent: &str, painter: &Painter) {
    let depth = group.path.matches("::").count();
    let pad = format!("{indent}{}", "  ".repeat(depth));

    if !group.name.is_empty() {
        let _ = writeln!(out, "{pad}█ {}\n", group.name);
    }

    for check in &group.checks {
        let total = check.passes + check.fails;
        let _ = writeln!(
            out,
            "{pad}  {} {}",
            painter.mark(check.fails == 0),
            check.name
        );
        if check.fails > 0 {
            let rate = if total == 0 {
                0.0
            } else {
                check.passes as f64 / total as f64
            };
            let _ = writeln!(
                out,
                "{pad}   {}",
                painter.paint(
                    RED,
                    &format!(
                        "↳  {}% — ✓ {} / ✗ {}",
                        (rate * 100.0).floor(),
                        check.passes,
                        check.fails
                    )
                )
            );
        }
    }

    for sub_group in &group.groups {
        if !group.checks.is_empty() || !group.name.is_empty() {
            out.push('\n');
        }
        write_group(out, sub_group, indent, painter);
    }
}

fn write_metrics(out: &mut String, data: &SummaryData, indent: &str, painter: &Painter) {
    let width = data.metrics.keys().map(|k| k.len()).max().unwrap_or(0) + 3;

    for (name, metric) in data.metrics.iter().sorted_by_key(|(name, _)| name.as_str()) {
        let mark = if metric.thresholds.is_empty() {
            " ".to_string()
        } else {
            painter.mark(metric.thresholds.values().all(|t| t.ok))
        };
        let dots = ".".repeat(width - name.len());
        let _ = writeln!(
            out,
            "{indent}{mark} {name}{}: {}",
            painter.paint(FAINT, &dots),
            metric_line(metric, painter)
        );

        for (expr, outcome) in &metric.thresholds {
            let _ = writeln!(
                out,
                "{indent}    {} {expr}",
                painter.mark(outcome.ok)
            );
        }
    }
}

fn metric_line(metric: &MetricSummary, painter: &Painter) -> String {
    let fields = metric_fields(metric);
    match metric.kind() {
        MetricKind::Trend => fields
            .iter()
            .map(|(label, value)| format!("{label}={}", painter.paint(CYAN, value)))
            .join(" "),
        MetricKind::Rate => {
            // rate, passes, fails
            format!(
                "{} {} {} {} {}",
                painter.paint(CYAN, &fields[0].1),
                painter.mark(true),
                fields[1].1,
                painter.mark(false),
                fields[2].1
            )
        }
        MetricKind::Counter => format!(
            "{} {}",
            painter.paint(CYAN, &fields[0].1),
            painter.paint(CYAN, &fields[1].1)
        ),
        MetricKind::Gauge => format!(
            "{} min={} max={}",
            painter.paint(CYAN, &fields[0].1),
            fields[1].1,
            fields[2].1
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::sample_summary;

    #[test]
    fn plain_text_has_no_escape_codes() {
        let text = text_summary(
            &sample_summary(),
            &TextSummaryOptions {
                indent: " ".to_string(),
                enable_colors: false,
            },
        );

        assert!(!text.contains('\x1b'));
        assert!(text.contains("█ postScenario"));
        assert!(text.contains("✓ Correct Status code is 201"));
        assert!(text.contains("✗ Response body field 'job' same with 'leader'"));
        assert!(text.contains("↳  50% — ✓ 1 / ✗ 1"));
        assert!(text.contains("http_req_duration"));
        assert!(text.contains("avg=150.00ms"));
        assert!(text.contains("POST /api/users"));
        assert!(text.lines().all(|line| line.is_empty() || line.starts_with(' ')));
    }

    #[test]
    fn coloured_text_marks_breached_thresholds() {
        let text = text_summary(&sample_summary(), &TextSummaryOptions::default());

        assert!(text.contains(GREEN));
        assert!(text.contains(&format!("{RED}✗{RESET} rate < 0.01")));
    }
}
