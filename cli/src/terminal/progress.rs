use colored::*;
use indicatif::ProgressStyle;
use sweepr_core::scanner::ScanProgress;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
];

/// A span that renders as a progress bar over `total` probes while it is alive.
pub fn scan_span(total: usize) -> Span {
    let span = info_span!("scan", indicatif.pb_show = true);
    span.pb_set_style(&bar_style());
    span.pb_set_length(total as u64);
    span.pb_set_message("probing hosts");
    span
}

/// Progress callback that moves the bar of `span`.
pub fn reporter(span: &Span) -> impl Fn(ScanProgress) + Send + Sync + 'static {
    let span = span.clone();
    move |progress: ScanProgress| {
        span.pb_set_position(progress.completed as u64);
        span.pb_set_message(&format!(
            "{} active so far",
            progress.discovered.to_string().green().bold()
        ));
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} [{bar:30.green/white}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
        .tick_strings(TICKS)
}
