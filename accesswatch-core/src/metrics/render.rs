use crate::metrics::alert::{AlertEvent, AlertKind};
use crate::metrics::snapshot::StatsSnapshot;
use crate::metrics::topk::TopKEntry;
use owo_colors::OwoColorize;
use std::fmt::Write;

const RULE: &str = "------------------------------------------";

pub fn render_stats(snapshot: &StatsSnapshot) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');

    let _ = writeln!(
        out,
        "{:.2} req/s over last {:?}",
        snapshot.req_per_sec, snapshot.window
    );
    let _ = writeln!(
        out,
        "{:.2} err/s over last {:?}",
        snapshot.err_per_sec, snapshot.window
    );

    render_top_k(&mut out, "TopK sections:", &snapshot.top_sections);
    render_top_k(&mut out, "TopK status codes:", &snapshot.top_status_codes);
    render_top_k(&mut out, "TopK users:", &snapshot.top_users);

    if snapshot.dropped > 0 {
        let _ = writeln!(
            out,
            "{} observations dropped (input queue full)",
            snapshot.dropped
        );
    }

    out
}

fn render_top_k(out: &mut String, title: &str, entries: &[TopKEntry]) {
    out.push_str(title);
    out.push('\n');
    for entry in entries {
        let _ = writeln!(out, "{entry}");
    }
}

pub fn render_alert(event: &AlertEvent, colored: bool) -> String {
    let tag = format!("[{}]", event.kind.tag());

    if !colored {
        return format!("{tag} {event}");
    }

    match event.kind {
        AlertKind::HighTraffic => format!("{} {event}", tag.red().bold()),
        AlertKind::Resolved => format!("{} {event}", tag.green().bold()),
    }
}
