//! Inline SVG charts for the HTML report.

use std::fmt::Write;

use askama::Template;

use crate::audio::Speaker;
use crate::stats::Statistics;
use crate::timeline::Timeline;

const WIDTH: f64 = 960.0;
const MARGIN: f64 = 48.0;
const COLOR_A: &str = "#3b82f6";
const COLOR_B: &str = "#f97316";
const COLOR_INTERRUPT: &str = "#dc2626";
const MAX_BINS: usize = 20;

/// A text node or attribute value, escaped by askama's HTML escaper.
#[derive(Template)]
#[template(source = "{{ text }}", ext = "html")]
struct SvgText<'a> {
    text: &'a str,
}

fn escape(text: &str) -> String {
    SvgText { text }.render().unwrap_or_default()
}

pub(super) fn speaker_color(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Left => COLOR_A,
        Speaker::Right => COLOR_B,
    }
}

fn open_svg(out: &mut String, height: f64, title: &str) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="100%" role="img"><title>{t}</title>"#,
        w = WIDTH,
        h = height,
        t = escape(title)
    );
    let _ = write!(
        out,
        r##"<text x="{x}" y="18" font-size="14" font-weight="600" fill="#334155">{t}</text>"##,
        x = MARGIN,
        t = escape(title)
    );
}

/// Time axis ticks along `y`, spanning `[0, duration]`.
fn time_axis(out: &mut String, y: f64, duration: f64) {
    let plot = WIDTH - 2.0 * MARGIN;
    let _ = write!(
        out,
        r##"<line x1="{x0}" y1="{y}" x2="{x1}" y2="{y}" stroke="#94a3b8"/>"##,
        x0 = MARGIN,
        x1 = MARGIN + plot,
        y = y
    );
    let step = nice_step(duration / 10.0);
    if step <= 0.0 {
        return;
    }
    let mut t = 0.0;
    while t <= duration + 1e-9 {
        let x = MARGIN + t / duration * plot;
        let _ = write!(
            out,
            r##"<line x1="{x:.1}" y1="{y}" x2="{x:.1}" y2="{y2}" stroke="#94a3b8"/><text x="{x:.1}" y="{ty}" font-size="10" text-anchor="middle" fill="#64748b">{t:.0}s</text>"##,
            x = x,
            y = y,
            y2 = y + 4.0,
            ty = y + 16.0,
            t = t
        );
        t += step;
    }
}

/// Round a raw step up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

/// One lane per speaker with a bar per turn; interruptions are marked
/// with a red tick at their start.
pub(super) fn timeline_svg(timeline: &Timeline, stats: &Statistics) -> String {
    let height = 150.0;
    let plot = WIDTH - 2.0 * MARGIN;
    let duration = stats.duration.max(f64::EPSILON);
    let lane_y = |s: Speaker| match s {
        Speaker::Left => 36.0,
        Speaker::Right => 76.0,
    };

    let mut out = String::new();
    open_svg(&mut out, height, "Conversation timeline");
    for speaker in [Speaker::Left, Speaker::Right] {
        let _ = write!(
            out,
            r#"<text x="{x}" y="{y}" font-size="11" text-anchor="end" fill="{c}">{l}</text>"#,
            x = MARGIN - 6.0,
            y = lane_y(speaker) + 18.0,
            c = speaker_color(speaker),
            l = escape(&stats.speaker(speaker).label)
        );
    }
    for turn in &timeline.turns {
        let x = MARGIN + turn.start / duration * plot;
        let w = (turn.duration() / duration * plot).max(0.5);
        let _ = write!(
            out,
            r#"<rect x="{x:.2}" y="{y}" width="{w:.2}" height="28" fill="{c}" opacity="0.85"><title>{s:.2}s – {e:.2}s</title></rect>"#,
            x = x,
            y = lane_y(turn.speaker),
            w = w,
            c = speaker_color(turn.speaker),
            s = turn.start,
            e = turn.end
        );
    }
    for ev in &timeline.interruptions {
        let x = MARGIN + ev.start / duration * plot;
        let _ = write!(
            out,
            r#"<line x1="{x:.2}" y1="30" x2="{x:.2}" y2="110" stroke="{c}" stroke-width="1.5" stroke-dasharray="3 2"/>"#,
            x = x,
            c = COLOR_INTERRUPT
        );
    }
    time_axis(&mut out, 118.0, duration);
    out.push_str("</svg>");
    out
}

/// Stacked percentage bar: each speaker's talk time, overlap, and mutual
/// silence.
pub(super) fn talk_time_svg(stats: &Statistics) -> String {
    let plot = WIDTH - 2.0 * MARGIN;
    let rows = [
        (stats.speaker_a.label.as_str(), stats.speaker_a.talk_time_pct, COLOR_A),
        (stats.speaker_b.label.as_str(), stats.speaker_b.talk_time_pct, COLOR_B),
        ("Overlap", stats.overlap_pct, COLOR_INTERRUPT),
        ("Mutual silence", stats.mutual_silence.pct, "#94a3b8"),
    ];
    let height = 36.0 + rows.len() as f64 * 26.0;

    let mut out = String::new();
    open_svg(&mut out, height, "Share of recording");
    for (i, (label, pct, color)) in rows.iter().enumerate() {
        let y = 30.0 + i as f64 * 26.0;
        let w = (pct / 100.0 * (plot - 120.0)).max(0.0);
        let _ = write!(
            out,
            r##"<text x="{lx}" y="{ty:.1}" font-size="11" fill="#334155">{l}</text><rect x="{x}" y="{y:.1}" width="{w:.2}" height="18" fill="{c}"/><text x="{vx:.2}" y="{ty:.1}" font-size="11" fill="#334155">{p:.1}%</text>"##,
            lx = MARGIN,
            ty = y + 13.0,
            l = escape(label),
            x = MARGIN + 120.0,
            y = y,
            w = w,
            c = color,
            vx = MARGIN + 126.0 + w,
            p = pct
        );
    }
    out.push_str("</svg>");
    out
}

/// Running total of talk time per speaker over the recording.
pub(super) fn cumulative_svg(timeline: &Timeline, stats: &Statistics) -> String {
    let height = 220.0;
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = 150.0;
    let top = 30.0;
    let duration = stats.duration.max(f64::EPSILON);
    let max_talk = stats
        .speaker_a
        .talk_time
        .max(stats.speaker_b.talk_time)
        .max(f64::EPSILON);

    let mut out = String::new();
    open_svg(&mut out, height, "Cumulative talk time");
    for speaker in [Speaker::Left, Speaker::Right] {
        let mut points = vec![(0.0, 0.0)];
        let mut total = 0.0;
        for turn in timeline.turns.iter().filter(|t| t.speaker == speaker) {
            points.push((turn.start, total));
            total += turn.duration();
            points.push((turn.end, total));
        }
        points.push((duration, total));

        let path: Vec<String> = points
            .iter()
            .map(|&(t, v)| {
                format!(
                    "{:.2},{:.2}",
                    MARGIN + t / duration * plot_w,
                    top + plot_h - v / max_talk * plot_h
                )
            })
            .collect();
        let _ = write!(
            out,
            r#"<polyline points="{p}" fill="none" stroke="{c}" stroke-width="2"/>"#,
            p = path.join(" "),
            c = speaker_color(speaker)
        );
    }
    time_axis(&mut out, top + plot_h + 4.0, duration);
    out.push_str("</svg>");
    out
}

/// Equal-width bins over `[0, max]`, at most [`MAX_BINS`].
fn bin_counts(samples: &[f64]) -> (f64, Vec<usize>) {
    let max = samples.iter().copied().fold(0.0_f64, f64::max);
    if samples.is_empty() || max <= 0.0 {
        return (0.0, vec![samples.len()]);
    }
    let bins = ((samples.len() as f64).sqrt().ceil() as usize).clamp(1, MAX_BINS);
    let width = max / bins as f64;
    let mut counts = vec![0; bins];
    for &s in samples {
        let i = ((s / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    (width, counts)
}

/// Overlaid histograms for the two speakers' samples of one quantity.
pub(super) fn histogram_svg(title: &str, series: &[(Speaker, &str, &[f64])]) -> String {
    let height = 220.0;
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = 150.0;
    let top = 30.0;

    let mut out = String::new();
    open_svg(&mut out, height, title);

    let all: Vec<f64> = series.iter().flat_map(|(_, _, s)| s.iter().copied()).collect();
    if all.is_empty() {
        let _ = write!(
            out,
            r##"<text x="{x}" y="{y}" font-size="12" fill="#64748b">No samples</text></svg>"##,
            x = MARGIN,
            y = top + 20.0
        );
        return out;
    }

    let (width, pooled) = bin_counts(&all);
    let bins = pooled.len();
    let bin_px = plot_w / bins as f64;
    let per_series: Vec<Vec<usize>> = series
        .iter()
        .map(|(_, _, samples)| {
            let mut counts = vec![0; bins];
            for &s in samples.iter() {
                let i = if width > 0.0 {
                    ((s / width) as usize).min(bins - 1)
                } else {
                    0
                };
                counts[i] += 1;
            }
            counts
        })
        .collect();
    let max_count = per_series
        .iter()
        .flat_map(|c| c.iter().copied())
        .max()
        .unwrap_or(1)
        .max(1);

    let bar_w = bin_px / series.len().max(1) as f64;
    for (k, ((speaker, label, _), counts)) in series.iter().zip(&per_series).enumerate() {
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let h = count as f64 / max_count as f64 * plot_h;
            let _ = write!(
                out,
                r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{c}" opacity="0.85"><title>{l}: {n} in {lo:.2}–{hi:.2}s</title></rect>"#,
                x = MARGIN + i as f64 * bin_px + k as f64 * bar_w,
                y = top + plot_h - h,
                w = (bar_w - 1.0).max(0.5),
                h = h,
                c = speaker_color(*speaker),
                l = escape(label),
                n = count,
                lo = i as f64 * width,
                hi = (i + 1) as f64 * width
            );
        }
    }
    let _ = write!(
        out,
        r##"<line x1="{x0}" y1="{y}" x2="{x1}" y2="{y}" stroke="#94a3b8"/><text x="{x0}" y="{ty}" font-size="10" fill="#64748b">0s</text><text x="{x1}" y="{ty}" font-size="10" text-anchor="end" fill="#64748b">{max:.2}s</text>"##,
        x0 = MARGIN,
        x1 = MARGIN + plot_w,
        y = top + plot_h,
        ty = top + plot_h + 16.0,
        max = width * bins as f64
    );
    out.push_str("</svg>");
    out
}
