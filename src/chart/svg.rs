// Static SVG rendering of a chart with plotters.
use super::{BarTrace, Chart, ChartWriter, HeatmapTrace, Layout, MarkerColor, ScatterTrace, Series, Trace, ViolinTrace};
use crate::analyzer::stats;
use crate::model::ChartError;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const DEFAULT_SIZE: (u32, u32) = (960, 540);
const KDE_POINTS: usize = 100;

/// Writes a static SVG image per chart.
pub struct SvgWriter;

impl ChartWriter for SvgWriter {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn write(&self, chart: &Chart, path: &Path) -> Result<(), ChartError> {
        let size = (
            chart.layout.width.unwrap_or(DEFAULT_SIZE.0),
            chart.layout.height.unwrap_or(DEFAULT_SIZE.1),
        );
        let root = SVGBackend::new(path, size).into_drawing_area();
        let palette = Palette::from_layout(&chart.layout);
        root.fill(&palette.background).map_err(draw_err)?;

        match chart.data.first() {
            Some(Trace::Heatmap(heatmap)) if !heatmap.z.is_empty() => {
                draw_heatmap(&root, chart, heatmap, &palette)?
            }
            Some(Trace::Violin(violin)) if !violin.y.is_empty() => {
                draw_violin(&root, chart, violin, &palette)?
            }
            Some(Trace::Scatter(scatter)) if matches!(scatter.x, Series::Numbers(_)) && !scatter.x.is_empty() => {
                draw_scatter(&root, chart, scatter, &palette)?
            }
            Some(Trace::Bar(bar)) if !bar.x.is_empty() => draw_bars(&root, chart, bar, &palette)?,
            _ => draw_placeholder(&root, chart, &palette)?,
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

/// Colours resolved from the layout, falling back to a light scheme for unthemed charts.
struct Palette {
    background: RGBColor,
    text: RGBColor,
    title: RGBColor,
    grid: RGBColor,
    accent: RGBColor,
}

impl Palette {
    fn from_layout(layout: &Layout) -> Self {
        let background = layout.paper_bgcolor.as_deref().and_then(parse_hex).unwrap_or(WHITE);
        let text = layout
            .font
            .as_ref()
            .and_then(|f| f.color.as_deref())
            .and_then(parse_hex)
            .unwrap_or(BLACK);
        let title = layout
            .title
            .font
            .as_ref()
            .and_then(|f| f.color.as_deref())
            .and_then(parse_hex)
            .unwrap_or(text);
        let grid = layout
            .xaxis
            .as_ref()
            .and_then(|a| a.gridcolor.as_deref())
            .and_then(parse_hex)
            .unwrap_or(RGBColor(200, 200, 200));
        Palette {
            background,
            text,
            title,
            grid,
            accent: parse_hex(super::ACCENT).unwrap_or(GREEN),
        }
    }

    fn caption(&self) -> TextStyle<'static> {
        ("sans-serif", 22).into_font().color(&self.title)
    }

    fn label(&self) -> TextStyle<'static> {
        ("sans-serif", 13).into_font().color(&self.text)
    }
}

fn parse_hex(color: &str) -> Option<RGBColor> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Linear interpolation over a Plotly-style colour scale.
fn scale_color(scale: &[(f64, String)], t: f64) -> RGBColor {
    let stops: Vec<(f64, RGBColor)> = scale
        .iter()
        .filter_map(|(at, color)| parse_hex(color).map(|c| (*at, c)))
        .collect();
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    for pair in stops.windows(2) {
        let ((a, ca), (b, cb)) = (pair[0], pair[1]);
        if t <= b {
            let w = if b > a { (t - a) / (b - a) } else { 0.0 };
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * w).round() as u8;
            return RGBColor(mix(ca.0, cb.0), mix(ca.1, cb.1), mix(ca.2, cb.2));
        }
    }
    stops.last().map(|(_, c)| *c).unwrap_or(BLACK)
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max > min { (value - min) / (max - min) } else { 1.0 }
}

/// Pads a data range so points never sit on the frame.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.08 } else { 1.0 };
    (if include_zero && lo == 0.0 { 0.0 } else { lo - pad }, hi + pad)
}

fn labels_of(series: &Series) -> Vec<String> {
    match series {
        Series::Labels(labels) => labels.clone(),
        Series::Numbers(values) => values.iter().map(|v| format!("{}", v)).collect(),
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels.get(*i).cloned().unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

fn draw_placeholder(root: &DrawingArea<SVGBackend<'_>, Shift>, chart: &Chart, palette: &Palette) -> Result<(), ChartError> {
    let area = root.titled(chart.title(), palette.caption()).map_err(draw_err)?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        "no data",
        (w as i32 / 2, h as i32 / 2),
        palette.label().pos(Pos::new(HPos::Center, VPos::Center)),
    ))
    .map_err(draw_err)?;
    Ok(())
}

/// Categorical bars, optional error bars, optional line on a secondary axis.
fn draw_bars(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    chart: &Chart,
    bar: &BarTrace,
    palette: &Palette,
) -> Result<(), ChartError> {
    let labels = labels_of(&bar.x);
    let n = labels.len();
    let errors: Vec<f64> = bar.error_y.as_ref().map(|e| e.array.clone()).unwrap_or_default();
    let secondary = chart.data.iter().find_map(|t| match t {
        Trace::Scatter(s) if s.yaxis.as_deref() == Some("y2") => Some(s),
        _ => None,
    });

    let (_, y_top) = padded_range(
        bar.y.iter().enumerate().map(|(i, v)| v + errors.get(i).copied().filter(|e| e.is_finite()).unwrap_or(0.0)),
        true,
    );
    let (_, y2_top) = padded_range(
        secondary.into_iter().flat_map(|s| s.y.iter().flatten().copied()),
        true,
    );

    let mut builder = ChartBuilder::on(root);
    builder
        .caption(chart.title(), palette.caption())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60);
    if secondary.is_some() {
        builder.right_y_label_area_size(60);
    }
    let mut ctx = builder
        .build_cartesian_2d((0..n).into_segmented(), 0f64..y_top)
        .map_err(draw_err)?
        .set_secondary_coord((0..n).into_segmented(), 0f64..y2_top);

    let x_formatter = |v: &SegmentValue<usize>| segment_label(&labels, v);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_formatter)
        .x_desc(chart.layout.xaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .y_desc(chart.layout.yaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .bold_line_style(palette.grid)
        .light_line_style(palette.grid.mix(0.2))
        .axis_style(palette.grid)
        .label_style(palette.label())
        .axis_desc_style(palette.label())
        .draw()
        .map_err(draw_err)?;

    let fill = bar
        .marker
        .as_ref()
        .and_then(|m| match &m.color {
            Some(MarkerColor::Solid(c)) => parse_hex(c),
            _ => None,
        })
        .unwrap_or(palette.accent);
    ctx.draw_series(bar.y.iter().enumerate().map(|(i, &v)| {
        let mut rect = Rectangle::new([(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)], fill.filled());
        rect.set_margin(0, 0, 4, 4);
        rect
    }))
    .map_err(draw_err)?;

    if !errors.is_empty() {
        ctx.draw_series(bar.y.iter().zip(errors.iter()).enumerate().filter(|(_, (_, e))| e.is_finite()).map(
            |(i, (&v, &e))| {
                ErrorBar::new_vertical(SegmentValue::CenterOf(i), v - e, v, v + e, palette.text.stroke_width(1), 8)
            },
        ))
        .map_err(draw_err)?;
    }

    if let Some(line) = secondary {
        let color = line
            .line
            .as_ref()
            .and_then(|l| l.color.as_deref())
            .and_then(parse_hex)
            .filter(|c| *c != palette.background)
            .unwrap_or(palette.text);
        let points: Vec<(SegmentValue<usize>, f64)> = line
            .y
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (SegmentValue::CenterOf(i), v)))
            .collect();

        ctx.configure_secondary_axes()
            .y_desc(chart.layout.yaxis2.as_ref().map(|a| a.title_text()).unwrap_or(""))
            .label_style(palette.label())
            .axis_desc_style(palette.label())
            .draw()
            .map_err(draw_err)?;
        ctx.draw_secondary_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(draw_err)?;
        ctx.draw_secondary_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Bubble scatter over two numeric axes; marker size and colour come from the trace.
fn draw_scatter(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    chart: &Chart,
    scatter: &ScatterTrace,
    palette: &Palette,
) -> Result<(), ChartError> {
    let xs = match &scatter.x {
        Series::Numbers(values) => values.clone(),
        Series::Labels(_) => Vec::new(),
    };
    let points: Vec<(usize, f64, f64)> = xs
        .iter()
        .zip(scatter.y.iter())
        .enumerate()
        .filter_map(|(i, (&x, y))| y.map(|y| (i, x, y)))
        .collect();

    let (x_lo, x_hi) = padded_range(points.iter().map(|p| p.1), false);
    let (y_lo, y_hi) = padded_range(points.iter().map(|p| p.2), false);
    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), palette.caption())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(draw_err)?;
    ctx.configure_mesh()
        .x_desc(chart.layout.xaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .y_desc(chart.layout.yaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .bold_line_style(palette.grid)
        .light_line_style(palette.grid.mix(0.2))
        .axis_style(palette.grid)
        .label_style(palette.label())
        .axis_desc_style(palette.label())
        .draw()
        .map_err(draw_err)?;

    let marker = scatter.marker.clone().unwrap_or_default();
    let sizes = marker.size.unwrap_or_default();
    let scale = marker.colorscale.unwrap_or_else(super::accent_scale);
    let colors: Vec<RGBColor> = match marker.color {
        Some(MarkerColor::Values(values)) => {
            let (min, max) = values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
            values.iter().map(|v| scale_color(&scale, normalize(*v, min, max))).collect()
        }
        Some(MarkerColor::Solid(c)) => vec![parse_hex(&c).unwrap_or(palette.accent); xs.len()],
        None => vec![palette.accent; xs.len()],
    };
    let outline = marker
        .line
        .and_then(|l| l.color)
        .and_then(|c| parse_hex(&c))
        .unwrap_or(palette.accent);

    ctx.draw_series(points.iter().map(|&(i, x, y)| {
        let radius = sizes.get(i).map(|s| (s / 2.0).max(2.0)).unwrap_or(5.0) as i32;
        let color = colors.get(i).copied().unwrap_or(palette.accent);
        Circle::new((x, y), radius, color.mix(0.85).filled())
    }))
    .map_err(draw_err)?;
    ctx.draw_series(points.iter().map(|&(i, x, y)| {
        let radius = sizes.get(i).map(|s| (s / 2.0).max(2.0)).unwrap_or(5.0) as i32;
        Circle::new((x, y), radius, outline.stroke_width(1))
    }))
    .map_err(draw_err)?;
    Ok(())
}

/// Mirrored kernel density outline with a box-plot summary in the middle.
fn draw_violin(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    chart: &Chart,
    violin: &ViolinTrace,
    palette: &Palette,
) -> Result<(), ChartError> {
    let Some(summary) = stats::describe(&violin.y) else {
        return draw_placeholder(root, chart, palette);
    };
    let (y_lo, y_hi) = padded_range([summary.min, summary.max].into_iter(), false);

    let step = (summary.max - summary.min) / (KDE_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..KDE_POINTS).map(|i| summary.min + step * i as f64).collect();
    let density = stats::gaussian_kde(&violin.y, &grid);
    let peak = density.iter().copied().fold(0.0, f64::max);
    let half_widths: Vec<f64> = density.iter().map(|d| if peak > 0.0 { d / peak * 0.4 } else { 0.0 }).collect();

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), palette.caption())
        .margin(20)
        .x_label_area_size(20)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..0.5f64, y_lo..y_hi)
        .map_err(draw_err)?;
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc(chart.layout.yaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .bold_line_style(palette.grid)
        .light_line_style(palette.grid.mix(0.2))
        .axis_style(palette.grid)
        .label_style(palette.label())
        .axis_desc_style(palette.label())
        .draw()
        .map_err(draw_err)?;

    let stroke = violin
        .line
        .as_ref()
        .and_then(|l| l.color.as_deref())
        .and_then(parse_hex)
        .unwrap_or(palette.accent);
    let mut outline: Vec<(f64, f64)> = grid.iter().zip(half_widths.iter()).map(|(&y, &w)| (w, y)).collect();
    outline.extend(grid.iter().zip(half_widths.iter()).rev().map(|(&y, &w)| (-w, y)));

    ctx.draw_series(std::iter::once(Polygon::new(outline.clone(), stroke.mix(0.3).filled())))
        .map_err(draw_err)?;
    if let Some(first) = outline.first().copied() {
        outline.push(first);
    }
    ctx.draw_series(std::iter::once(PathElement::new(outline, stroke.stroke_width(2))))
        .map_err(draw_err)?;

    let iqr = summary.q3 - summary.q1;
    let lower_fence = summary.q1 - 1.5 * iqr;
    let upper_fence = summary.q3 + 1.5 * iqr;
    let low_whisker = violin.y.iter().copied().filter(|v| *v >= lower_fence).fold(summary.q1, f64::min);
    let high_whisker = violin.y.iter().copied().filter(|v| *v <= upper_fence).fold(summary.q3, f64::max);

    ctx.draw_series(vec![
        PathElement::new(vec![(0.0, low_whisker), (0.0, summary.q1)], palette.text.stroke_width(1)),
        PathElement::new(vec![(0.0, summary.q3), (0.0, high_whisker)], palette.text.stroke_width(1)),
    ])
    .map_err(draw_err)?;
    ctx.draw_series(std::iter::once(Rectangle::new(
        [(-0.04, summary.q1), (0.04, summary.q3)],
        stroke.mix(0.8).filled(),
    )))
    .map_err(draw_err)?;
    ctx.draw_series(std::iter::once(PathElement::new(
        vec![(-0.04, summary.median), (0.04, summary.median)],
        palette.text.stroke_width(2),
    )))
    .map_err(draw_err)?;
    Ok(())
}

/// Annotated grid of values, colour mapped over the data range.
fn draw_heatmap(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    chart: &Chart,
    heatmap: &HeatmapTrace,
    palette: &Palette,
) -> Result<(), ChartError> {
    let rows = heatmap.z.len();
    let cols = heatmap.z.iter().map(|r| r.len()).max().unwrap_or(0);
    let (min, max) = heatmap
        .z
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title(), palette.caption())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(110)
        .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())
        .map_err(draw_err)?;

    let x_formatter = |v: &SegmentValue<usize>| segment_label(&heatmap.x, v);
    let y_formatter = |v: &SegmentValue<usize>| segment_label(&heatmap.y, v);
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .x_desc(chart.layout.xaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .y_desc(chart.layout.yaxis.as_ref().map(|a| a.title_text()).unwrap_or(""))
        .axis_style(palette.grid)
        .label_style(palette.label())
        .axis_desc_style(palette.label())
        .draw()
        .map_err(draw_err)?;

    let cells: Vec<(usize, usize, f64)> = heatmap
        .z
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, &v)| (r, c, v)))
        .collect();
    ctx.draw_series(cells.iter().map(|&(r, c, v)| {
        Rectangle::new(
            [(SegmentValue::Exact(c), SegmentValue::Exact(r)), (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1))],
            scale_color(&heatmap.colorscale, normalize(v, min, max)).filled(),
        )
    }))
    .map_err(draw_err)?;

    let annotation = ("sans-serif", 18)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));
    ctx.draw_series(cells.iter().map(|&(r, c, v)| {
        Text::new(
            format!("{:.2}", v),
            (SegmentValue::CenterOf(c), SegmentValue::CenterOf(r)),
            annotation.clone(),
        )
    }))
    .map_err(draw_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Axis, BarTrace, BoxVisibility, ErrorBars, Marker, theme::apply_dark_theme};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#1DB954"), Some(RGBColor(0x1D, 0xB9, 0x54)));
        assert_eq!(parse_hex("rgba(0,0,0,0)"), None);
        assert_eq!(parse_hex("#12"), None);
    }

    #[test]
    fn scale_interpolates_between_stops() {
        let scale = vec![(0.0, "#000000".to_string()), (1.0, "#FFFFFF".to_string())];
        assert_eq!(scale_color(&scale, 0.0), RGBColor(0, 0, 0));
        assert_eq!(scale_color(&scale, 1.0), RGBColor(255, 255, 255));
        assert_eq!(scale_color(&scale, 0.5), RGBColor(128, 128, 128));
    }

    #[test]
    fn renders_bar_chart_with_secondary_axis() {
        let dir = tempdir().unwrap();
        let mut chart = Chart::new("Bars")
            .with_trace(Trace::Bar(BarTrace {
                name: "mean".to_string(),
                x: Series::Labels(vec!["pop".to_string(), "rock".to_string()]),
                y: vec![60.0, 40.0],
                marker: Some(Marker::default()),
                error_y: Some(ErrorBars {
                    kind: "data".to_string(),
                    array: vec![2.0, f64::NAN],
                    visible: true,
                    color: None,
                }),
                yaxis: None,
            }))
            .with_trace(Trace::Scatter(ScatterTrace {
                name: "duration".to_string(),
                x: Series::Labels(vec!["pop".to_string(), "rock".to_string()]),
                y: vec![Some(3.1), None],
                mode: "lines+markers".to_string(),
                marker: None,
                line: None,
                customdata: None,
                hovertemplate: None,
                yaxis: Some("y2".to_string()),
            }));
        chart.layout.yaxis2 = Some(Axis::secondary("minutes"));
        apply_dark_theme(&mut chart);

        let path = SvgWriter.write_named(&chart, dir.path(), "bars").unwrap();
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Bars"));
    }

    #[test]
    fn renders_violin_and_placeholder() {
        let dir = tempdir().unwrap();
        let violin = Chart::new("Durations").with_trace(Trace::Violin(ViolinTrace {
            name: "dist".to_string(),
            y: vec![2.5, 3.0, 3.2, 3.4, 4.0, 7.5],
            box_plot: BoxVisibility { visible: true },
            line: None,
            fillcolor: None,
        }));
        SvgWriter.write_named(&violin, dir.path(), "violin").unwrap();

        let empty = Chart::new("Nothing");
        let path = SvgWriter.write_named(&empty, dir.path(), "empty").unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("no data"));
    }
}
