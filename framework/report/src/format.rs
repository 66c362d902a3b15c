use gust_summary_model::{MetricSummary, MetricValues, ValueUnit};

/// Format a duration given in milliseconds with a unit that keeps it short.
pub(crate) fn duration_ms(ms: f64) -> String {
    if ms >= 60_000.0 {
        let minutes = (ms / 60_000.0).floor();
        format!("{}m{:.1}s", minutes, (ms - minutes * 60_000.0) / 1000.0)
    } else if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{ms:.2}ms")
    } else {
        format!("{:.2}µs", ms * 1000.0)
    }
}

pub(crate) fn bytes(count: f64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

    let mut value = count;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub(crate) fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.6}")
    }
}

fn scaled(value: f64, contains: ValueUnit) -> String {
    match contains {
        ValueUnit::Time => duration_ms(value),
        ValueUnit::Data => bytes(value),
        ValueUnit::Default => number(value),
    }
}

/// Ordered `(label, formatted value)` pairs describing a metric.
pub(crate) fn metric_fields(metric: &MetricSummary) -> Vec<(&'static str, String)> {
    let contains = metric.contains;
    match &metric.values {
        MetricValues::Trend(t) => vec![
            ("avg", scaled(t.avg, contains)),
            ("min", scaled(t.min, contains)),
            ("med", scaled(t.med, contains)),
            ("max", scaled(t.max, contains)),
            ("p(90)", scaled(t.p90, contains)),
            ("p(95)", scaled(t.p95, contains)),
        ],
        MetricValues::Rate(r) => vec![
            ("rate", percent(r.rate)),
            ("✓", r.passes.to_string()),
            ("✗", r.fails.to_string()),
        ],
        MetricValues::Counter(c) => vec![
            ("count", scaled(c.count, contains)),
            ("rate", format!("{}/s", scaled(c.rate, contains))),
        ],
        MetricValues::Gauge(g) => vec![
            ("value", number(g.value)),
            ("min", number(g.min)),
            ("max", number(g.max)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_a_unit() {
        assert_eq!("500.00µs", duration_ms(0.5));
        assert_eq!("123.46ms", duration_ms(123.456));
        assert_eq!("2.50s", duration_ms(2500.0));
        assert_eq!("1m30.0s", duration_ms(90_000.0));
    }

    #[test]
    fn bytes_pick_a_unit() {
        assert_eq!("999 B", bytes(999.0));
        assert_eq!("1.5 kB", bytes(1500.0));
        assert_eq!("2.0 MB", bytes(2_000_000.0));
    }
}
