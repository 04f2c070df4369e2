use crate::cards::{CardUiState, SubView};
use crate::detail_cache::DetailEntry;
use crate::highlight::{dashboard_link, share_link};
use crate::state::DashboardState;
use api_structs::time_conversion::printable_date;
use api_structs::{ErrorDetail, ErrorGroup, Log, Span, StatsSnapshot, Trace};
use serde_json::Value;
use std::ops::Range;
use url::Url;

const NOT_AVAILABLE: &str = "N/A";
const UNSET_ENV: &str = "UNSET";
const HISTOGRAM_WIDTH: u64 = 20;
const CARD_INDENT: &str = "  ";
const SUB_VIEW_INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Cards shown at once, 0 shows all of them.
    pub max_cards: usize,
    pub dashboard_url: Url,
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn window(group: &ErrorGroup) -> String {
    format!(
        "{} - {}",
        printable_date(group.window_start),
        printable_date(group.window_end)
    )
}

/// Cards to show out of `total`, keeping `focus` roughly in the middle.
pub fn visible_window(total: usize, focus: Option<usize>, capacity: usize) -> Range<usize> {
    if capacity == 0 || total <= capacity {
        return 0..total;
    }
    let start = match focus {
        Some(focus) => focus
            .min(total - 1)
            .saturating_sub(capacity / 2)
            .min(total - capacity),
        None => 0,
    };
    start..start + capacity
}

pub fn render_dashboard(state: &DashboardState, options: &RenderOptions) -> String {
    let mut lines = vec!["RCA Platform Dashboard".to_string()];
    let Some(stats) = state.stats().filter(|_| state.has_loaded()) else {
        lines.push("Loading dashboard...".to_string());
        return lines.join("\n");
    };
    lines.push("Real-time error monitoring and root cause analysis".to_string());
    lines.push(String::new());
    lines.extend(render_stats(stats));
    lines.push(String::new());

    let errors = state.errors();
    lines.push(format!("Error Cards ({})", errors.len()));
    if errors.is_empty() {
        lines.push("No errors found".to_string());
        lines.push("No error cards have been detected in the last 24 hours.".to_string());
        return lines.join("\n");
    }
    let focus = state
        .cards
        .highlighted_id()
        .and_then(|id| errors.iter().position(|e| &e.id == id));
    let shown = visible_window(errors.len(), focus, options.max_cards);
    if shown.start > 0 {
        lines.push(format!("... {} more above", shown.start));
    }
    for group in &errors[shown.clone()] {
        lines.push(String::new());
        lines.extend(render_card(
            group,
            &state.cards.get(&group.id),
            state.details.get(&group.id),
            &options.dashboard_url,
        ));
    }
    if shown.end < errors.len() {
        lines.push(String::new());
        lines.push(format!("... {} more below", errors.len() - shown.end));
    }
    lines.join("\n")
}

pub fn render_stats(stats: &StatsSnapshot) -> Vec<String> {
    let last_24_hours = &stats.last_24_hours;
    let mut lines = vec![format!(
        "Total Errors: {} | Services: {} | Traces: {} | Logs: {} | RCA Reports: {}",
        last_24_hours.total_errors,
        last_24_hours.top_services.len(),
        stats.total_data.traces,
        stats.total_data.logs,
        stats.total_data.rca_reports
    )];
    lines.push(String::new());
    lines.push("Errors by Environment".to_string());
    lines.extend(histogram(last_24_hours.environments.iter().map(|e| {
        (e.env.clone().unwrap_or_else(|| UNSET_ENV.to_string()), e.count)
    })));
    lines.push("Errors by Service".to_string());
    lines.extend(histogram(last_24_hours.top_services.iter().map(|s| {
        (
            s.service.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            s.count,
        )
    })));
    lines
}

fn histogram(rows: impl Iterator<Item = (String, u64)>) -> Vec<String> {
    let rows: Vec<(String, u64)> = rows.collect();
    if rows.is_empty() {
        return vec![format!("{CARD_INDENT}(none)")];
    }
    let label_width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);
    rows.iter()
        .map(|(label, count)| {
            let bar_len = if max == 0 {
                0
            } else {
                let scaled = u128::from(*count) * u128::from(HISTOGRAM_WIDTH) / u128::from(max);
                (scaled as u64).max(u64::from(*count > 0))
            };
            let bar = "#".repeat(bar_len as usize);
            format!("{CARD_INDENT}{label:<label_width$} {bar} {count}")
        })
        .collect()
}

/// One error card. The highlighted card is marked with `>`.
pub fn render_card(
    group: &ErrorGroup,
    card: &CardUiState,
    entry: Option<&DetailEntry>,
    dashboard_url: &Url,
) -> Vec<String> {
    let marker = if card.highlighted { "> " } else { CARD_INDENT };
    let mut lines = vec![
        format!("{marker}{} [{}]", or_na(&group.service), group.id),
        format!("{CARD_INDENT}Exception: {}", or_na(&group.exception)),
        format!("{CARD_INDENT}Root Name: {}", or_na(&group.root_name)),
        format!(
            "{CARD_INDENT}{} | {} | {} | {} occurrences",
            group.env.as_deref().unwrap_or(UNSET_ENV),
            or_na(&group.http_code),
            or_na(&group.span_kind),
            group.count
        ),
        format!("{CARD_INDENT}Time Window: {}", window(group)),
        format!("{CARD_INDENT}Share: {}", share_link(dashboard_url, &group.id)),
    ];
    if !card.expanded {
        lines.push(format!("{CARD_INDENT}[View Details]"));
        return lines;
    }
    lines.push(format!("{CARD_INDENT}[Hide Details]"));
    lines.push(format!("{CARD_INDENT}{}", tab_bar(card.active_sub_view)));
    let detail = match entry {
        Some(DetailEntry::Loaded(detail)) => Some(detail),
        Some(DetailEntry::Loading { .. }) => {
            lines.push(format!("{CARD_INDENT}Loading details..."));
            None
        }
        Some(DetailEntry::Failed { reason }) => {
            lines.push(format!("{CARD_INDENT}No data: {reason}"));
            None
        }
        None => None,
    };
    lines.extend(
        render_sub_view(card.active_sub_view, group, detail)
            .into_iter()
            .map(|line| format!("{SUB_VIEW_INDENT}{line}")),
    );
    lines
}

fn tab_bar(active: SubView) -> String {
    SubView::ALL
        .iter()
        .map(|view| {
            if *view == active {
                format!("[{}]", view.label())
            } else {
                view.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Renders one tab. Missing detail data renders as empty sequences.
pub fn render_sub_view(view: SubView, group: &ErrorGroup, detail: Option<&ErrorDetail>) -> Vec<String> {
    let traces = detail.map(|d| d.traces.as_slice()).unwrap_or_default();
    let spans = detail.map(|d| d.spans.as_slice()).unwrap_or_default();
    let logs = detail.map(|d| d.logs.as_slice()).unwrap_or_default();
    match view {
        SubView::Overview => render_overview(group),
        SubView::Traces => render_traces(traces),
        SubView::Spans => render_spans(spans),
        SubView::Logs => render_logs(logs),
        SubView::Correlation => render_correlation(group, traces.len(), spans.len(), logs.len()),
        SubView::Rca => render_rca(detail),
    }
}

fn render_overview(group: &ErrorGroup) -> Vec<String> {
    vec![
        "Error Overview".to_string(),
        format!("Environment: {}", or_na(&group.env)),
        format!("Service: {}", or_na(&group.service)),
        format!("Exception: {}", or_na(&group.exception)),
        format!("Count: {}", group.count),
        format!("Start: {}", printable_date(group.window_start)),
        format!("End: {}", printable_date(group.window_end)),
    ]
}

fn render_traces(traces: &[Trace]) -> Vec<String> {
    let mut lines = vec!["Traces".to_string()];
    if traces.is_empty() {
        lines.push("No traces found".to_string());
        return lines;
    }
    lines.push("Trace ID (Hex) | Trace ID (Base64)".to_string());
    lines.extend(traces.iter().map(|trace| {
        format!("{} | {}", or_na(&trace.trace_id_hex), or_na(&trace.trace_id_b64))
    }));
    lines
}

fn tag_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_spans(spans: &[Span]) -> Vec<String> {
    let mut lines = vec!["Spans".to_string()];
    if spans.is_empty() {
        lines.push("No spans found".to_string());
        return lines;
    }
    lines.push("Trace ID | Span ID | Operation | Duration (ms) | Start Time | Tags".to_string());
    lines.extend(spans.iter().map(|span| {
        let duration = span
            .duration_ms()
            .map(|ms| format!("{ms:.2}"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let start = span
            .start_time
            .map(printable_date)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let tags = match &span.tags {
            Some(tags) if !tags.is_empty() => tags
                .iter()
                .map(|(key, value)| format!("{key}={}", tag_value(value)))
                .collect::<Vec<_>>()
                .join(", "),
            _ => NOT_AVAILABLE.to_string(),
        };
        format!(
            "{} | {} | {} | {duration} | {start} | {tags}",
            or_na(&span.trace_id_hex),
            or_na(&span.span_id),
            or_na(&span.operation_name)
        )
    }));
    lines
}

fn render_logs(logs: &[Log]) -> Vec<String> {
    let mut lines = vec!["Logs".to_string()];
    if logs.is_empty() {
        lines.push("No logs found".to_string());
        return lines;
    }
    lines.push("Trace ID | Level | Message | Timestamp".to_string());
    lines.extend(logs.iter().map(|log| {
        format!(
            "{} | {} | {} | {}",
            or_na(&log.trace_id_hex),
            or_na(&log.level()),
            or_na(&log.message()),
            or_na(&log.timestamp())
        )
    }));
    lines
}

fn render_correlation(group: &ErrorGroup, traces: usize, spans: usize, logs: usize) -> Vec<String> {
    vec![
        "Correlation Data".to_string(),
        "Error Metrics".to_string(),
        format!("Environment: {}", or_na(&group.env)),
        format!("Service: {}", or_na(&group.service)),
        format!("Span Kind: {}", or_na(&group.span_kind)),
        format!("HTTP Code: {}", or_na(&group.http_code)),
        format!("Exception: {}", or_na(&group.exception)),
        format!("Root Name: {}", or_na(&group.root_name)),
        format!("Count: {}", group.count),
        format!("Window: {}", window(group)),
        "Trace & Log Summary".to_string(),
        format!("Traces Found: {traces}"),
        format!("Spans Found: {spans}"),
        format!("Logs Found: {logs}"),
    ]
}

fn render_rca(detail: Option<&ErrorDetail>) -> Vec<String> {
    let mut lines = vec![SubView::Rca.label().to_string()];
    match detail
        .and_then(|d| d.rca_report.as_ref())
        .and_then(|report| report.analysis_summary.as_deref())
    {
        Some(summary) => lines.extend(summary.lines().map(str::to_string)),
        None => lines.push("No RCA analysis available".to_string()),
    }
    lines
}

/// Standalone page of a single error with every tab expanded.
pub fn render_error_detail_page(detail: &ErrorDetail, dashboard_url: &Url) -> String {
    let group = &detail.error;
    let mut lines = vec![
        "Error Details".to_string(),
        format!("ID: {}", group.id),
        format!("Back to Dashboard: {}", dashboard_link(dashboard_url)),
        String::new(),
        "Error Summary".to_string(),
        format!("Environment: {}", group.env.as_deref().unwrap_or(UNSET_ENV)),
        format!("Service: {}", or_na(&group.service)),
        format!("Span Kind: {}", or_na(&group.span_kind)),
        format!("HTTP Code: {}", or_na(&group.http_code)),
        format!("Exception: {}", or_na(&group.exception)),
        format!("Count: {}", group.count),
        format!("Time Window: {}", window(group)),
        String::new(),
        format!(
            "Traces: {} | Spans: {} | Logs: {}",
            detail.traces.len(),
            detail.spans.len(),
            detail.logs.len()
        ),
    ];
    for view in [SubView::Traces, SubView::Spans, SubView::Logs, SubView::Rca] {
        lines.push(String::new());
        lines.extend(render_sub_view(view, group, Some(detail)));
    }
    lines.join("\n")
}

pub fn render_not_found(id: &str, dashboard_url: &Url) -> String {
    [
        "Error Not Found".to_string(),
        format!("The requested error {id} could not be found."),
        format!("Back to Dashboard: {}", dashboard_link(dashboard_url)),
    ]
    .join("\n")
}
