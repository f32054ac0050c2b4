//! Self-contained HTML report page, rendered from `templates/report.html`.

use askama::Template;

use super::charts::{cumulative_svg, histogram_svg, speaker_color, talk_time_svg, timeline_svg};
use crate::audio::Speaker;
use crate::error::AnalysisError;
use crate::pipeline::Analysis;
use crate::stats::{Distribution, SpeakerStats, Statistics};
use crate::timeline::{Timeline, TurnRelation};

/// One row of the per-speaker summary table.
struct MetricRow {
    metric: String,
    a: String,
    b: String,
}

/// One row of the conversation table.
struct ConversationRow {
    metric: &'static str,
    value: String,
}

/// One row of the collapsible turn table.
struct TurnRow<'a> {
    number: usize,
    color: &'static str,
    label: &'a str,
    start: String,
    end: String,
    duration: String,
    relation: String,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    duration: String,
    sample_rate: u32,
    threshold: String,
    generated_at: &'a str,
    label_a: &'a str,
    label_b: &'a str,
    color_a: &'static str,
    color_b: &'static str,
    speaker_rows: Vec<MetricRow>,
    conversation_rows: Vec<ConversationRow>,
    /// Inline SVG, inserted unescaped.
    charts: Vec<String>,
    turns: Vec<TurnRow<'a>>,
}

/// Render the complete report. `generated_at` is shown in the subtitle so
/// callers control the clock.
pub fn render_html(analysis: &Analysis, generated_at: &str) -> Result<String, AnalysisError> {
    let stats = &analysis.statistics;
    let timeline = &analysis.timeline;
    let a = &stats.speaker_a;
    let b = &stats.speaker_b;

    let charts = vec![
        timeline_svg(timeline, stats),
        talk_time_svg(stats),
        cumulative_svg(timeline, stats),
        histogram_svg(
            "Turn durations",
            &[
                (Speaker::Left, a.label.as_str(), a.turn_durations.samples.as_slice()),
                (Speaker::Right, b.label.as_str(), b.turn_durations.samples.as_slice()),
            ],
        ),
        histogram_svg(
            "Response times (turn-taking latency)",
            &[
                (Speaker::Left, a.label.as_str(), a.response_times.samples.as_slice()),
                (Speaker::Right, b.label.as_str(), b.response_times.samples.as_slice()),
            ],
        ),
        histogram_svg(
            "Yielding latency after being interrupted",
            &[
                (Speaker::Left, a.label.as_str(), a.yielding_latencies.samples.as_slice()),
                (Speaker::Right, b.label.as_str(), b.yielding_latencies.samples.as_slice()),
            ],
        ),
    ];

    let threshold = match analysis.threshold.calibration {
        Some(cal) if cal.degenerate => format!(
            "{:.5} (auto, fallback: no clear silence floor)",
            analysis.threshold.value
        ),
        Some(_) => format!("{:.5} (auto)", analysis.threshold.value),
        None => format!("{:.5}", analysis.threshold.value),
    };

    let page = ReportTemplate {
        duration: format!("{:.1}", stats.duration),
        sample_rate: analysis.sample_rate,
        threshold,
        generated_at,
        label_a: &a.label,
        label_b: &b.label,
        color_a: speaker_color(Speaker::Left),
        color_b: speaker_color(Speaker::Right),
        speaker_rows: speaker_rows(a, b),
        conversation_rows: conversation_rows(stats),
        charts,
        turns: turn_rows(timeline, stats),
    };
    page.render()
        .map_err(|e| AnalysisError::Io(std::io::Error::other(e)))
}

fn secs(v: f64) -> String {
    format!("{:.2}s", v)
}

fn dist_cells(d: &Distribution) -> [String; 4] {
    let s = d.summary();
    if s.count == 0 {
        return ["—".into(), "—".into(), "—".into(), "—".into()];
    }
    [
        secs(s.mean),
        secs(s.median),
        secs(s.std),
        format!("{} – {}", secs(s.min), secs(s.max)),
    ]
}

fn speaker_rows(a: &SpeakerStats, b: &SpeakerStats) -> Vec<MetricRow> {
    let row = |metric: &str, va: String, vb: String| MetricRow {
        metric: metric.to_string(),
        a: va,
        b: vb,
    };
    let mut rows = vec![
        row(
            "Total talk time",
            format!("{} ({:.1}%)", secs(a.talk_time), a.talk_time_pct),
            format!("{} ({:.1}%)", secs(b.talk_time), b.talk_time_pct),
        ),
        row(
            "Silence (own channel)",
            secs(a.silence_time),
            secs(b.silence_time),
        ),
        row("Turns", a.turn_count.to_string(), b.turn_count.to_string()),
        row(
            "Interruptions made",
            a.interruptions_made.to_string(),
            b.interruptions_made.to_string(),
        ),
        row(
            "Times interrupted",
            a.times_interrupted.to_string(),
            b.times_interrupted.to_string(),
        ),
    ];

    let names = ["mean", "median", "std", "range"];
    for (title, da, db) in [
        ("Turn duration", &a.turn_durations, &b.turn_durations),
        ("Response time", &a.response_times, &b.response_times),
        ("Yielding latency", &a.yielding_latencies, &b.yielding_latencies),
    ] {
        let (ca, cb) = (dist_cells(da), dist_cells(db));
        for (i, name) in names.iter().enumerate() {
            rows.push(MetricRow {
                metric: format!("{} ({})", title, name),
                a: ca[i].clone(),
                b: cb[i].clone(),
            });
        }
    }
    rows
}

fn median_or_dash(d: &Distribution) -> String {
    if d.is_empty() {
        "—".into()
    } else {
        secs(d.median())
    }
}

fn conversation_rows(stats: &Statistics) -> Vec<ConversationRow> {
    let silence = &stats.mutual_silence;
    let pause = silence.pauses.summary();
    let row = |metric, value| ConversationRow { metric, value };
    vec![
        row("Interruptions", stats.interruption_count.to_string()),
        row(
            "Overlap (both speaking)",
            format!("{} ({:.1}%)", secs(stats.total_overlap), stats.overlap_pct),
        ),
        row(
            "Mutual silence",
            format!("{} ({:.1}%)", secs(silence.total), silence.pct),
        ),
        row("Pauses", pause.count.to_string()),
        row("Mean pause", secs(pause.mean)),
        row("Longest pause", secs(pause.max)),
        row(
            "Turn-taking latency (median)",
            median_or_dash(&stats.response_latencies),
        ),
        row(
            "Yielding latency (median)",
            median_or_dash(&stats.yielding_latencies),
        ),
    ]
}

fn turn_rows<'a>(timeline: &Timeline, stats: &'a Statistics) -> Vec<TurnRow<'a>> {
    timeline
        .turns
        .iter()
        .map(|turn| TurnRow {
            number: turn.index + 1,
            color: speaker_color(turn.speaker),
            label: &stats.speaker(turn.speaker).label,
            start: secs(turn.start),
            end: secs(turn.end),
            duration: secs(turn.duration()),
            relation: match turn.relation {
                TurnRelation::Opening => "opening".to_string(),
                TurnRelation::Continuation => "continuation".to_string(),
                TurnRelation::Sequential { gap } => format!("responds after {}", secs(gap)),
                TurnRelation::Interrupting { yield_point } => format!(
                    "interrupts (other yields after {})",
                    secs(yield_point - turn.start)
                ),
            },
        })
        .collect()
}
