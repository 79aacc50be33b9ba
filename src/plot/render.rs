//! Chart drawing with plotters' SVG backend.
//!
//! Panels sit side by side and share the vertical time axis, which runs
//! top to bottom. Only the leftmost panel carries time labels.

use std::fmt::Display;
use std::ops::Range;

use plotters::coord::Shift;
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use super::axis::{TimeAxis, ValueAxis};
use super::series::{finite_points, memory_str, CpuTopology, DiskThroughput};
use super::stat::Stat;
use super::table::SampleTable;
use crate::error::{Error, Result};
use crate::model::{Markers, CPU_PCT};

const PANEL_WIDTH: u32 = 500;
const TIME_LABEL_AREA: u32 = 130;
const VALUE_LABEL_AREA: u32 = 60;
const PX_PER_HOUR: f64 = 100.0;
const MIN_HEIGHT_HOURS: f64 = 10.0;
/// Dash length as a fraction of the panel's value range.
const DASH_FRACTION: f64 = 1.0 / 80.0;

// Dark2 qualitative palette.
const PALETTE: [RGBColor; 4] = [
    RGBColor(27, 158, 119),
    RGBColor(217, 95, 2),
    RGBColor(117, 112, 179),
    RGBColor(231, 41, 138),
];
const BOUNDARY_COLOR: RGBColor = RGBColor(31, 119, 180);

struct Line {
    name: &'static str,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

/// Everything one panel needs, computed before any drawing starts.
struct Panel {
    title: &'static str,
    subtitle: Option<String>,
    x: ValueAxis,
    lines: Vec<Line>,
    boundary: Option<f64>,
    legend: bool,
}

impl Panel {
    fn build(stat: Stat, table: &SampleTable) -> Result<Self> {
        let times = table.times()?;
        let panel = match stat {
            Stat::Cpu => {
                let topology = CpuTopology::from_table(table)?;
                let boundary = topology.available_boundary();
                Panel {
                    title: "CPU Usage %",
                    subtitle: Some(topology.counts_label()),
                    x: ValueAxis::percent(),
                    lines: vec![Line {
                        name: "CPU Usage %",
                        color: PALETTE[0],
                        points: finite_points(table.column(CPU_PCT)?, times),
                    }],
                    boundary,
                    legend: boundary.is_some(),
                }
            }
            Stat::Mem => {
                let total = table.first("total")?;
                let total = if total.is_finite() { total as i64 } else { 0 };
                Panel {
                    title: "Memory Usage %",
                    subtitle: Some(format!("({} Total RAM)", memory_str(total)?)),
                    x: ValueAxis::percent(),
                    lines: vec![Line {
                        name: "Memory Usage %",
                        color: PALETTE[1],
                        points: finite_points(table.column("percent")?, times),
                    }],
                    boundary: None,
                    legend: false,
                }
            }
            Stat::Disk => {
                let disk = DiskThroughput::from_table(table)?;
                Panel {
                    title: "Disk Usage (MB/s)",
                    subtitle: None,
                    x: ValueAxis::auto(-1.0, disk.max().unwrap_or(0.0) + 1.0),
                    lines: vec![
                        Line {
                            name: "Disk Read (MB/s)",
                            color: PALETTE[2],
                            points: finite_points(&disk.read, &disk.times),
                        },
                        Line {
                            name: "Disk Write (MB/s)",
                            color: PALETTE[3],
                            points: finite_points(&disk.write, &disk.times),
                        },
                    ],
                    boundary: None,
                    legend: true,
                }
            }
        };
        Ok(panel)
    }
}

/// Image size in pixels: a fixed width per panel, and a height that grows
/// with the run length beyond a minimum.
pub fn chart_size(panels: usize, axis: &TimeAxis) -> (u32, u32) {
    let width = PANEL_WIDTH * panels as u32 + TIME_LABEL_AREA;
    let height = (axis.hours().max(MIN_HEIGHT_HOURS) * PX_PER_HOUR).round() as u32;
    (width, height)
}

/// Render the requested panels to an SVG document.
pub fn render_svg(
    table: &SampleTable,
    markers: Option<&Markers>,
    stats: &[Stat],
    axis: &TimeAxis,
) -> Result<String> {
    if stats.is_empty() {
        return Err(Error::NoStats);
    }
    let panels = stats
        .iter()
        .map(|stat| Panel::build(*stat, table))
        .collect::<Result<Vec<_>>>()?;

    let size = chart_size(panels.len(), axis);
    debug!(width = size.0, height = size.1, panels = panels.len(), "rendering chart");

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (first, mut rest) = root.split_horizontally(PANEL_WIDTH + TIME_LABEL_AREA);
        let mut areas = vec![first];
        for _ in 1..panels.len() {
            let (area, remainder) = rest.split_horizontally(PANEL_WIDTH);
            areas.push(area);
            rest = remainder;
        }

        for (i, (panel, area)) in panels.iter().zip(&areas).enumerate() {
            draw_panel(area, panel, axis, markers, i == 0)?;
        }
        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    axis: &TimeAxis,
    markers: Option<&Markers>,
    time_labels: bool,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .caption(panel.title, ("sans-serif", 14))
        .set_label_area_size(LabelAreaPosition::Top, VALUE_LABEL_AREA);
    if time_labels {
        builder.set_label_area_size(LabelAreaPosition::Left, TIME_LABEL_AREA - 10);
    }

    let x_spec = TickedRange::new(panel.x.lo, panel.x.hi, &panel.x.major, &panel.x.minor);
    // Reversed range: the earliest sample maps to the top edge.
    let y_spec = TickedRange::new(axis.end, axis.start, &axis.major, &axis.minor);
    let mut chart = builder
        .build_cartesian_2d(x_spec, y_spec)
        .map_err(render_err)?;

    let x_fmt = |v: &f64| format!("{}", v);
    let y_fmt = |t: &f64| axis.label(*t);
    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(BLACK.mix(0.05));
    if let Some(subtitle) = &panel.subtitle {
        mesh.x_desc(subtitle.as_str());
    }
    mesh.draw().map_err(render_err)?;

    for line in &panel.lines {
        let style = line.color.stroke_width(2);
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), style))
            .map_err(render_err)?
            .label(line.name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    if let Some(x) = panel.boundary {
        let style = BOUNDARY_COLOR.stroke_width(1);
        chart
            .draw_series(LineSeries::new(vec![(x, axis.start), (x, axis.end)], style))
            .map_err(render_err)?
            .label("Avail. CPU Usage Boundary")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    if let Some(markers) = markers {
        let dash = (panel.x.hi - panel.x.lo) * DASH_FRACTION;
        for (i, marker) in markers.iter().enumerate() {
            let t = marker.epoch_secs();
            if !axis.contains(t) {
                debug!(label = %marker.label, "marker outside the sampled range");
                continue;
            }
            chart
                .draw_series(
                    dashes(panel.x.lo, panel.x.hi, dash)
                        .into_iter()
                        .map(|(a, b)| PathElement::new(vec![(a, t), (b, t)], BLACK.stroke_width(1))),
                )
                .map_err(render_err)?;

            // Alternate above/below the line so neighbouring labels overlap less.
            let v_pos = if i % 2 == 1 { VPos::Bottom } else { VPos::Top };
            let style = TextStyle::from(("sans-serif", 12).into_font())
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, v_pos));
            chart
                .draw_series(std::iter::once(Text::new(
                    marker.label.clone(),
                    (panel.x.hi, t),
                    style,
                )))
                .map_err(render_err)?;
        }
    }

    if panel.legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;
    }
    Ok(())
}

/// Linear axis whose major and minor tick positions are fixed up front.
struct TickedRange {
    inner: RangedCoordf64,
    major: Vec<f64>,
    minor: Vec<f64>,
}

impl TickedRange {
    fn new(from: f64, to: f64, major: &[f64], minor: &[f64]) -> Self {
        Self {
            inner: RangedCoordf64::from(from..to),
            major: major.to_vec(),
            minor: minor.to_vec(),
        }
    }
}

impl Ranged for TickedRange {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    // Bold requests get the majors, light requests the minors.
    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            self.minor.clone()
        } else {
            self.major.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// Dash segments covering `lo..hi`, separated by gaps of the same length.
fn dashes(lo: f64, hi: f64, dash: f64) -> Vec<(f64, f64)> {
    if dash.is_nan() || dash <= 0.0 {
        return vec![(lo, hi)];
    }
    let mut segments = Vec::new();
    let mut a = lo;
    while a < hi {
        segments.push((a, (a + dash).min(hi)));
        a += 2.0 * dash;
    }
    segments
}

fn render_err<E: Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn table() -> SampleTable {
        let input = "\
time\tcpu_pct\ttotal\tpercent\tread_bytes\twrite_bytes\tn_phys_cpu\tn_log_cpu\tn_avail_cpu
0\t10\t8000000000\t40\t0\t0\t4\t8\t6
60\t55\t8000000000\t42\t30000000\t6000000\t4\t8\t6
120\t80\t8000000000\t44\t30000000\t66000000\t4\t8\t6
";
        SampleTable::from_reader(input.as_bytes()).unwrap()
    }

    #[test]
    fn size_scales_with_panels_and_duration() {
        let short = TimeAxis::new(0.0, 120.0, Tz::UTC).unwrap();
        assert_eq!(chart_size(3, &short), (1630, 1000));
        let long = TimeAxis::new(0.0, 24.0 * 3600.0, Tz::UTC).unwrap();
        assert_eq!(chart_size(1, &long), (630, 2400));
    }

    #[test]
    fn disk_panel_axis_covers_peak_rate() {
        let panel = Panel::build(Stat::Disk, &table()).unwrap();
        assert_eq!(panel.x.lo, -1.0);
        assert_eq!(panel.x.hi, 2.0);
        assert_eq!(panel.lines[0].points, vec![(0.5, 30.0), (0.0, 90.0)]);
        assert!(panel.legend);
    }

    #[test]
    fn cpu_panel_shows_boundary_for_restricted_affinity() {
        let panel = Panel::build(Stat::Cpu, &table()).unwrap();
        assert_eq!(panel.boundary, Some(75.0));
        assert!(panel.legend);
        assert_eq!(panel.title, "CPU Usage %");
        assert!(panel.subtitle.unwrap().contains("6 Available CPUs"));
    }

    #[test]
    fn mem_panel_labels_total_ram() {
        let panel = Panel::build(Stat::Mem, &table()).unwrap();
        assert_eq!(panel.title, "Memory Usage %");
        assert_eq!(panel.subtitle.as_deref(), Some("(8.0GB Total RAM)"));
    }

    #[test]
    fn svg_contains_labels_and_markers() {
        let tz = Tz::UTC;
        let mut markers = Markers::default();
        markers.insert("job start".into(), crate::model::to_datetime(30.0, &tz).unwrap());
        let axis = TimeAxis::new(0.0, 120.0, tz).unwrap();
        let svg = render_svg(&table(), Some(&markers), &Stat::ALL, &axis).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("job start"));
        assert!(svg.contains("Disk Usage (MB/s)"));
        assert!(svg.contains("01/01 00:01:00"));
    }

    #[test]
    fn percent_and_minute_ticks_are_labelled() {
        let axis = TimeAxis::new(0.0, 120.0, Tz::UTC).unwrap();
        let svg = render_svg(&table(), None, &[Stat::Cpu], &axis).unwrap();
        for label in ["0", "25", "50", "75", "100"] {
            assert!(svg.contains(&format!(">{}<", label)), "missing tick label {}", label);
        }
        for label in ["01/01 00:00:00", "01/01 00:01:00", "01/01 00:02:00"] {
            assert!(svg.contains(label), "missing time label {}", label);
        }
        // Minor ticks get grid lines only.
        assert!(!svg.contains(">5<"));
        assert!(!svg.contains("00:00:15"));
        assert!(svg.contains("(4 Physical CPUs, 8 Logical CPUs, 6 Available CPUs)"));
    }

    #[test]
    fn ticked_range_splits_bold_and_light_points() {
        use plotters::coord::ranged1d::{BoldPoints, LightPoints};

        let range = TickedRange::new(0.0, 100.0, &[0.0, 50.0, 100.0], &[25.0, 75.0]);
        assert_eq!(range.key_points(BoldPoints(10)), vec![0.0, 50.0, 100.0]);
        assert_eq!(range.key_points(LightPoints::new(3, 30)), vec![25.0, 75.0]);
        assert_eq!(range.map(&50.0, (0, 100)), 50);

        let reversed = TickedRange::new(100.0, 0.0, &[], &[]);
        assert_eq!(reversed.map(&100.0, (0, 100)), 0);
    }

    #[test]
    fn no_stats_is_an_error() {
        let axis = TimeAxis::new(0.0, 120.0, Tz::UTC).unwrap();
        assert!(matches!(render_svg(&table(), None, &[], &axis), Err(Error::NoStats)));
    }

    #[test]
    fn dashes_cover_the_range() {
        assert_eq!(dashes(0.0, 10.0, 2.0), vec![(0.0, 2.0), (4.0, 6.0), (8.0, 10.0)]);
        assert_eq!(dashes(0.0, 1.0, 0.0), vec![(0.0, 1.0)]);
    }
}
