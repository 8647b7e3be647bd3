//! SVG charts: execution time and speedup against problem size.
//!
//! One file per variant family, two stacked panels. Sizes are plotted on a
//! log axis. Missing points are left out and the line is broken there.

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::results::ResultTable;
use crate::variant::VariantFamily;

const SVG_W: f64 = 960.0;
const TITLE_H: f64 = 44.0;
const PANEL_H: f64 = 380.0;
const CHART_LEFT: f64 = 90.0;
const CHART_RIGHT: f64 = 210.0;
const CHART_TOP: f64 = 36.0;
const CHART_BOTTOM: f64 = 56.0;

const COLOURS: [&str; 8] = [
    "222222", "4C78A8", "54A24B", "E45756", "B279A2", "F58518", "72B7B2", "9D755D",
];

/// File the chart for `family` is written to.
pub fn chart_file_name(family: &VariantFamily) -> String {
    let name: String = family
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_benchmark_results.svg", name)
}

/// Renders the chart and writes it into `out_dir`.
pub fn write_family_chart(table: &ResultTable, family: &VariantFamily, out_dir: &Path) -> Result<PathBuf> {
    let svg = render_family_chart(table, family)?;
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(chart_file_name(family));
    fs::write(&path, svg)?;
    Ok(path)
}

/// A plotted line: legend label plus one optional y value per axis value.
struct Line<'a> {
    label: &'a str,
    colour: String,
    points: Vec<Option<f64>>,
}

struct Panel<'a> {
    title: String,
    y_label: &'a str,
    lines: Vec<Line<'a>>,
    log_y: bool,
    reference: Option<f64>,
}

pub fn render_family_chart(table: &ResultTable, family: &VariantFamily) -> Result<String> {
    let axis = table.axis();
    let colour = |i: usize| format!("#{}", COLOURS[i % COLOURS.len()]);

    let times = Panel {
        title: format!("{}: execution time", family.name),
        y_label: "Execution Time (ns)",
        lines: family
            .variants
            .iter()
            .enumerate()
            .map(|(i, variant)| Line {
                label: variant.display_name(),
                colour: colour(i),
                points: table.series(&variant.id),
            })
            .collect(),
        log_y: true,
        reference: None,
    };

    let baseline_name = family.baseline().map_or(family.baseline.as_str(), |b| b.display_name());
    let speedups = Panel {
        title: format!("{}: speedup relative to {}", family.name, baseline_name),
        y_label: "Speedup (x)",
        lines: family
            .variants
            .iter()
            .enumerate()
            .filter(|(_, variant)| variant.id != family.baseline)
            .map(|(i, variant)| Line {
                label: variant.display_name(),
                colour: colour(i),
                points: table.speedup_series(&family.baseline, &variant.id).ratios,
            })
            .collect(),
        log_y: false,
        reference: Some(1.0),
    };

    let svg_h = TITLE_H + 2.0 * PANEL_H + 10.0;
    let mut w = String::new();
    writeln!(w, "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SVG_W}\" height=\"{svg_h}\" font-family=\"Arial,sans-serif\">")?;
    writeln!(w, "<rect width=\"{SVG_W}\" height=\"{svg_h}\" fill=\"white\"/>")?;
    writeln!(
        w,
        "<text x=\"{:.1}\" y=\"28\" text-anchor=\"middle\" font-size=\"16\" font-weight=\"bold\" fill=\"#222\">{}</text>",
        SVG_W / 2.0,
        escape(&format!("Benchmark sweep over {} ({})", axis.name, family.name))
    )?;

    draw_panel(&mut w, &times, &axis.name, &axis.values, TITLE_H)?;
    draw_panel(&mut w, &speedups, &axis.name, &axis.values, TITLE_H + PANEL_H)?;

    writeln!(w, "</svg>")?;
    Ok(w)
}

fn draw_panel(w: &mut String, panel: &Panel<'_>, x_label: &str, xs: &[u64], top: f64) -> std::fmt::Result {
    let cx = CHART_LEFT;
    let cy = top + CHART_TOP;
    let plot_w = SVG_W - CHART_LEFT - CHART_RIGHT;
    let plot_h = PANEL_H - CHART_TOP - CHART_BOTTOM;

    writeln!(
        w,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\" fill=\"#333\">{}</text>",
        cx + plot_w / 2.0,
        top + 22.0,
        escape(&panel.title)
    )?;
    writeln!(
        w,
        "<rect x=\"{cx:.1}\" y=\"{cy:.1}\" width=\"{plot_w:.1}\" height=\"{plot_h:.1}\" fill=\"none\" stroke=\"#BBB\"/>"
    )?;

    // On a log axis only positive values can be placed.
    let plottable = |v: f64| v.is_finite() && (!panel.log_y || v > 0.0);
    let ys: Vec<f64> = panel
        .lines
        .iter()
        .flat_map(|line| line.points.iter().flatten().copied())
        .filter(|&v| plottable(v))
        .collect();

    let x_lo = xs.iter().copied().min().unwrap_or(1).max(1) as f64;
    let x_hi = xs.iter().copied().max().unwrap_or(1).max(1) as f64;
    let (x_lo, x_hi) = if x_lo == x_hi { (x_lo / 2.0, x_hi * 2.0) } else { (x_lo, x_hi) };
    let x_of = |v: f64| cx + (v.log10() - x_lo.log10()) / (x_hi.log10() - x_lo.log10()) * plot_w;

    for tick in log_ticks(x_lo, x_hi) {
        let tx = x_of(tick);
        writeln!(w, "<line x1=\"{tx:.1}\" y1=\"{cy:.1}\" x2=\"{tx:.1}\" y2=\"{:.1}\" stroke=\"#EEE\" stroke-dasharray=\"4 3\"/>", cy + plot_h)?;
        writeln!(
            w,
            "<text x=\"{tx:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>",
            cy + plot_h + 14.0,
            format_size(tick)
        )?;
    }
    writeln!(
        w,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#333\">Problem Size ({})</text>",
        cx + plot_w / 2.0,
        cy + plot_h + 36.0,
        escape(x_label)
    )?;
    writeln!(
        w,
        "<text transform=\"translate({:.1},{:.1}) rotate(-90)\" text-anchor=\"middle\" font-size=\"12\" fill=\"#333\">{}</text>",
        cx - 62.0,
        cy + plot_h / 2.0,
        escape(panel.y_label)
    )?;

    if ys.is_empty() {
        writeln!(
            w,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#999\">no data</text>",
            cx + plot_w / 2.0,
            cy + plot_h / 2.0
        )?;
        return draw_legend(w, panel, cy);
    }

    let y_lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let y_hi = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi, ticks) = if panel.log_y {
        let lo = 10f64.powf(y_lo.log10().floor());
        let hi = 10f64.powf(y_hi.log10().ceil()).max(lo * 10.0);
        (lo, hi, log_ticks(lo, hi))
    } else {
        let hi = y_hi.max(panel.reference.unwrap_or(0.0)) * 1.1;
        let hi = if hi > 0.0 { hi } else { 1.0 };
        let step = nice_step(hi);
        let ticks = (0..).map(|i| i as f64 * step).take_while(|&t| t <= hi).collect();
        (0.0, hi, ticks)
    };
    let y_of = |v: f64| {
        let frac = if panel.log_y {
            (v.log10() - y_lo.log10()) / (y_hi.log10() - y_lo.log10())
        } else {
            (v - y_lo) / (y_hi - y_lo)
        };
        cy + plot_h - frac * plot_h
    };

    for tick in ticks {
        let ty = y_of(tick);
        writeln!(w, "<line x1=\"{cx:.1}\" y1=\"{ty:.1}\" x2=\"{:.1}\" y2=\"{ty:.1}\" stroke=\"#EEE\" stroke-dasharray=\"4 3\"/>", cx + plot_w)?;
        let label = if panel.log_y { format_time(tick) } else { format!("{:.2}", tick) };
        writeln!(
            w,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>",
            cx - 6.0,
            ty + 3.5,
            escape(&label)
        )?;
    }

    if let Some(reference) = panel.reference {
        let ry = y_of(reference);
        writeln!(
            w,
            "<line x1=\"{cx:.1}\" y1=\"{ry:.1}\" x2=\"{:.1}\" y2=\"{ry:.1}\" stroke=\"#888\" stroke-width=\"1.2\" stroke-dasharray=\"6 4\"/>",
            cx + plot_w
        )?;
    }

    for line in &panel.lines {
        for segment in segments(xs, &line.points, plottable) {
            if segment.len() > 1 {
                let coords: Vec<String> = segment
                    .iter()
                    .map(|&(x, y)| format!("{:.1},{:.1}", x_of(x), y_of(y)))
                    .collect();
                writeln!(
                    w,
                    "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.8\"/>",
                    coords.join(" "),
                    line.colour
                )?;
            }
            for &(x, y) in &segment {
                writeln!(
                    w,
                    "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>",
                    x_of(x),
                    y_of(y),
                    line.colour
                )?;
            }
        }
    }

    draw_legend(w, panel, cy)
}

fn draw_legend(w: &mut String, panel: &Panel<'_>, cy: f64) -> std::fmt::Result {
    let lx = SVG_W - CHART_RIGHT + 16.0;
    for (i, line) in panel.lines.iter().enumerate() {
        let ly = cy + 10.0 + i as f64 * 18.0;
        writeln!(
            w,
            "<line x1=\"{lx:.1}\" y1=\"{ly:.1}\" x2=\"{:.1}\" y2=\"{ly:.1}\" stroke=\"{}\" stroke-width=\"2\"/>",
            lx + 20.0,
            line.colour
        )?;
        writeln!(
            w,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#333\">{}</text>",
            lx + 26.0,
            ly + 4.0,
            escape(line.label)
        )?;
    }
    Ok(())
}

/// Splits a series into runs of consecutive plottable points.
fn segments(xs: &[u64], ys: &[Option<f64>], plottable: impl Fn(f64) -> bool) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (&x, y) in xs.iter().zip(ys) {
        match y {
            Some(y) if plottable(*y) => current.push((x as f64, *y)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// 1, 2 and 5 times powers of ten within `[lo, hi]`.
fn log_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let mut ticks = Vec::new();
    let mut p = lo.log10().floor() as i32;
    while 10f64.powi(p) <= hi {
        for m in [1.0, 2.0, 5.0] {
            let v = m * 10f64.powi(p);
            if v >= lo * 0.999 && v <= hi * 1.001 {
                ticks.push(v);
            }
        }
        p += 1;
    }
    ticks
}

fn nice_step(span: f64) -> f64 {
    let raw = span / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_size(v: f64) -> String {
    if v >= 1_000_000.0 {
        format!("{}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{}k", v / 1_000.0)
    } else {
        format!("{}", v)
    }
}

fn format_time(ns: f64) -> String {
    if ns >= 1_000_000_000.0 {
        format!("{}s", ns / 1_000_000_000.0)
    } else if ns >= 1_000_000.0 {
        format!("{}ms", ns / 1_000_000.0)
    } else if ns >= 1_000.0 {
        format!("{}µs", ns / 1_000.0)
    } else {
        format!("{}ns", ns)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
