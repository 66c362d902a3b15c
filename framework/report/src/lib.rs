//! Renderers that turn a run's [SummaryData](gust_summary_model::SummaryData) into something a
//! person can read: an indented text block for the terminal and a self-contained HTML page.

mod format;
mod html;
mod operations_table;
mod text;

#[cfg(test)]
mod test_data;

pub use html::{html_report, HtmlReportOptions};
pub use text::{text_summary, TextSummaryOptions};
