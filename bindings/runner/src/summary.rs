use gust_report::{html_report, text_summary, HtmlReportOptions, TextSummaryOptions};
use gust_runner::prelude::{SummaryData, SummaryOutputs};

/// Summary hook for the users API tests. Produces `result.html`, written to the summary
/// directory, and a coloured text summary on stdout.
pub fn handle_summary(data: &SummaryData) -> anyhow::Result<SummaryOutputs> {
    let mut outputs = SummaryOutputs::new();
    outputs.insert(
        "result.html".to_string(),
        html_report(data, &HtmlReportOptions::default()),
    );
    outputs.insert(
        "stdout".to_string(),
        text_summary(
            data,
            &TextSummaryOptions {
                indent: " ".to_string(),
                enable_colors: true,
            },
        ),
    );
    Ok(outputs)
}
