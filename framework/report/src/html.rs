use std::fmt::Write;

use gust_summary_model::{GroupSummary, MetricKind, MetricValues, SummaryData};
use itertools::Itertools;

use crate::format::{duration_ms, metric_fields, percent};

#[derive(Debug, Clone, Default)]
pub struct HtmlReportOptions {
    /// Page title, defaults to the test name
    pub title: Option<String>,
}

/// Render the summary as a single HTML document with inline styles and no external resources,
/// so that it can be archived or opened straight from disk.
pub fn html_report(data: &SummaryData, options: &HtmlReportOptions) -> String {
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("Gust report: {}", data.test_name));
    let started = chrono::DateTime::from_timestamp(data.started_at, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| data.started_at.to_string());

    let total_requests = counter_value(data, "http_reqs");
    let failed_requests = rate_passes(data, "http_req_failed");
    let breached = data.breached_thresholds().len();
    let (_, failed_checks) = data.check_totals();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ font-family: system-ui, sans-serif; margin: 2rem; color: #222; background: #fafafa; }}
  h1 {{ font-size: 1.6rem; margin-bottom: 0.2rem; }}
  .meta {{ color: #666; margin-bottom: 1.5rem; }}
  .cards {{ display: flex; gap: 1rem; margin-bottom: 2rem; }}
  .card {{ flex: 1; padding: 1rem; border-radius: 6px; background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,0.15); }}
  .card .value {{ font-size: 1.8rem; font-weight: bold; }}
  .card.bad {{ border-top: 4px solid #c0392b; }}
  .card.good {{ border-top: 4px solid #27ae60; }}
  table {{ border-collapse: collapse; width: 100%; margin-bottom: 2rem; background: #fff; }}
  th, td {{ padding: 0.4rem 0.8rem; border-bottom: 1px solid #ddd; text-align: left; }}
  th {{ background: #34495e; color: #fff; }}
  .pass {{ color: #27ae60; font-weight: bold; }}
  .fail {{ color: #c0392b; font-weight: bold; }}
  .group {{ background: #ecf0f1; font-weight: bold; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="meta">Run {run_id} started {started}, ran for {duration}</div>
<div class="cards">
  <div class="card">
    <div>Total requests</div><div class="value">{total_requests}</div>
  </div>
  <div class="card {failed_requests_class}">
    <div>Failed requests</div><div class="value">{failed_requests}</div>
  </div>
  <div class="card {breached_class}">
    <div>Breached thresholds</div><div class="value">{breached}</div>
  </div>
  <div class="card {failed_checks_class}">
    <div>Failed checks</div><div class="value">{failed_checks}</div>
  </div>
</div>
<h2>Scenarios</h2>
<table>
<tr><th>Scenario</th><th>Executor</th><th>VUs</th><th>Complete iterations</th><th>Interrupted iterations</th></tr>
{scenario_rows}</table>
<h2>Trend metrics</h2>
<table>
<tr><th>Metric</th><th>avg</th><th>min</th><th>med</th><th>max</th><th>p(90)</th><th>p(95)</th></tr>
{trend_rows}</table>
<h2>Other metrics</h2>
<table>
<tr><th>Metric</th><th>Type</th><th>Values</th></tr>
{other_rows}</table>
<h2>Thresholds</h2>
<table>
<tr><th>Metric</th><th>Threshold</th><th>Result</th></tr>
{threshold_rows}</table>
<h2>Checks</h2>
<table>
<tr><th>Check</th><th>Passes</th><th>Failures</th><th>Success rate</th></tr>
{check_rows}</table>
<h2>Operations</h2>
<table>
<tr><th>Operation</th><th>Total</th><th>Failed</th><th>avg (ms)</th><th>min (ms)</th><th>max (ms)</th></tr>
{operation_rows}</table>
</body>
</html>
"#,
        title = html_escape(&title),
        run_id = html_escape(&data.run_id),
        started = html_escape(&started),
        duration = duration_ms(data.duration_ms as f64),
        failed_requests_class = good_or_bad(failed_requests == 0),
        breached_class = good_or_bad(breached == 0),
        failed_checks_class = good_or_bad(failed_checks == 0),
        scenario_rows = scenario_rows(data),
        trend_rows = trend_rows(data),
        other_rows = other_rows(data),
        threshold_rows = threshold_rows(data),
        check_rows = {
            let mut rows = String::new();
            check_rows(&mut rows, &data.root_group);
            rows
        },
        operation_rows = operation_rows(data),
    )
}

fn good_or_bad(good: bool) -> &'static str {
    if good {
        "good"
    } else {
        "bad"
    }
}

fn pass_fail(ok: bool) -> &'static str {
    if ok {
        r#"<span class="pass">PASS</span>"#
    } else {
        r#"<span class="fail">FAIL</span>"#
    }
}

fn counter_value(data: &SummaryData, name: &str) -> u64 {
    match data.metric(name).map(|m| &m.values) {
        Some(MetricValues::Counter(c)) => c.count as u64,
        _ => 0,
    }
}

fn rate_passes(data: &SummaryData, name: &str) -> u64 {
    match data.metric(name).map(|m| &m.values) {
        Some(MetricValues::Rate(r)) => r.passes,
        _ => 0,
    }
}

fn scenario_rows(data: &SummaryData) -> String {
    data.scenarios
        .iter()
        .map(|(name, s)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(name),
                html_escape(&s.executor),
                s.vus,
                s.iterations_completed,
                s.iterations_interrupted
            )
        })
        .collect()
}

fn trend_rows(data: &SummaryData) -> String {
    data.metrics
        .iter()
        .filter(|(_, m)| m.kind() == MetricKind::Trend)
        .map(|(name, m)| {
            let cells = metric_fields(m)
                .into_iter()
                .map(|(_, value)| format!("<td>{}</td>", html_escape(&value)))
                .join("");
            format!("<tr><td>{}</td>{cells}</tr>\n", html_escape(name))
        })
        .collect()
}

fn other_rows(data: &SummaryData) -> String {
    data.metrics
        .iter()
        .filter(|(_, m)| m.kind() != MetricKind::Trend)
        .map(|(name, m)| {
            let values = metric_fields(m)
                .into_iter()
                .map(|(label, value)| format!("{label}={value}"))
                .join(" ");
            format!(
                "<tr><td>{}</td><td>{:?}</td><td>{}</td></tr>\n",
                html_escape(name),
                m.kind(),
                html_escape(&values)
            )
        })
        .collect()
}

fn threshold_rows(data: &SummaryData) -> String {
    data.metrics
        .iter()
        .flat_map(|(name, m)| {
            m.thresholds.iter().map(move |(expr, outcome)| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    html_escape(name),
                    html_escape(expr),
                    pass_fail(outcome.ok)
                )
            })
        })
        .collect()
}

fn check_rows(out: &mut String, group: &GroupSummary) {
    if !group.name.is_empty() {
        let _ = writeln!(
            out,
            r#"<tr class="group"><td colspan="4">{}</td></tr>"#,
            html_escape(&group.path)
        );
    }

    for check in &group.checks {
        let total = check.passes + check.fails;
        let rate = if total == 0 {
            0.0
        } else {
            check.passes as f64 / total as f64
        };
        let _ = writeln!(
            out,
            r#"<tr><td class="{}">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            if check.fails == 0 { "pass" } else { "fail" },
            html_escape(&check.name),
            check.passes,
            check.fails,
            percent(rate)
        );
    }

    for sub_group in &group.groups {
        check_rows(out, sub_group);
    }
}

fn operation_rows(data: &SummaryData) -> String {
    data.operations
        .iter()
        .map(|op| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                html_escape(&op.operation_id),
                op.total_operations,
                op.failed_operations,
                op.avg_time_ms,
                op.min_time_ms,
                op.max_time_ms
            )
        })
        .collect()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::sample_summary;

    #[test]
    fn escapes_special_characters() {
        assert_eq!("a &amp; b", html_escape("a & b"));
        assert_eq!("&lt;b&gt;", html_escape("<b>"));
        assert_eq!("&#39;job&#39;", html_escape("'job'"));
    }

    #[test]
    fn report_is_self_contained() {
        let html = html_report(&sample_summary(), &HtmlReportOptions::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Gust report: users_performance</title>"));
        assert!(!html.contains("<script src"));
        assert!(!html.contains("<link "));
    }

    #[test]
    fn report_lists_checks_and_thresholds() {
        let html = html_report(&sample_summary(), &HtmlReportOptions::default());

        assert!(html.contains("Response body field &#39;job&#39; same with &#39;leader&#39;"));
        assert!(html.contains("::postScenario"));
        assert!(html.contains("rate &lt; 0.01"));
        assert!(html.contains(r#"<span class="fail">FAIL</span>"#));
        assert!(html.contains("POST /api/users"));
    }
}
