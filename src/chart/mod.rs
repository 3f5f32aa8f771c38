// Chart module: a typed figure that serializes to Plotly's JSON schema,
// plus the writers that turn it into interactive and static artifacts.

pub mod html;
pub mod svg;
pub mod theme;

use crate::model::ChartError;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const ACCENT: &str = "#1DB954";
pub const SURFACE: &str = "#282828";
pub const SURFACE_LIGHT: &str = "#404040";
pub const FOREGROUND: &str = "#FFFFFF";

/// Colour scale shared by the scatter and heatmap views.
pub fn accent_scale() -> Vec<(f64, String)> {
    vec![
        (0.0, SURFACE.to_string()),
        (0.5, SURFACE_LIGHT.to_string()),
        (1.0, ACCENT.to_string()),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Chart {
    pub fn new(title: &str) -> Self {
        Chart {
            data: Vec::new(),
            layout: Layout {
                title: Title {
                    text: title.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }

    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Bar(BarTrace),
    Violin(ViolinTrace),
    Heatmap(HeatmapTrace),
}

/// Axis values: numbers for continuous axes, labels for categorical ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    Numbers(Vec<f64>),
    Labels(Vec<String>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Numbers(values) => values.len(),
            Series::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Solid(String),
    Values(Vec<f64>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Vec<(f64, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub x: Series,
    /// Gaps serialize as `null`, which Plotly renders as a break in the line.
    pub y: Vec<Option<f64>>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBars {
    #[serde(rename = "type")]
    pub kind: String,
    pub array: Vec<f64>,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Series,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_y: Option<ErrorBars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxVisibility {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolinTrace {
    pub name: String,
    pub y: Vec<f64>,
    #[serde(rename = "box")]
    pub box_plot: BoxVisibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapTrace {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub z: Vec<Vec<f64>>,
    pub colorscale: Vec<(f64, String)>,
    pub showscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texttemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Font {
    pub fn colored(color: &str) -> Self {
        Font {
            color: Some(color.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickfont: Option<Font>,
}

impl Axis {
    pub fn titled(text: &str) -> Self {
        Axis {
            title: Some(Title {
                text: text.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A right-hand axis drawn over the primary y axis.
    pub fn secondary(text: &str) -> Self {
        Axis {
            overlaying: Some("y".to_string()),
            side: Some("right".to_string()),
            tickfont: Some(Font::colored(FOREGROUND)),
            ..Axis::titled(text)
        }
    }

    pub fn title_text(&self) -> &str {
        self.title.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub r: u32,
    pub b: u32,
    pub l: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Persists a chart as one artifact format.
pub trait ChartWriter {
    fn extension(&self) -> &'static str;
    fn write(&self, chart: &Chart, path: &Path) -> Result<(), ChartError>;

    /// Writes `<dir>/<name>.<extension>` and returns the path.
    fn write_named(&self, chart: &Chart, dir: &Path, name: &str) -> Result<PathBuf, ChartError> {
        let path = dir.join(format!("{}.{}", name, self.extension()));
        self.write(chart, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn serializes_to_plotly_figure_shape() {
        let chart = Chart::new("Shares").with_trace(Trace::Bar(BarTrace {
            name: "share".to_string(),
            x: Series::Labels(vec!["a".to_string(), "b".to_string()]),
            y: vec![1.0, 2.0],
            marker: Some(Marker {
                color: Some(MarkerColor::Solid(ACCENT.to_string())),
                ..Default::default()
            }),
            error_y: None,
            yaxis: None,
        }));

        let value: Value = serde_json::from_str(&chart.to_json().unwrap()).unwrap();
        assert_eq!(value["data"][0]["type"], "bar");
        assert_eq!(value["data"][0]["x"][1], "b");
        assert_eq!(value["data"][0]["marker"]["color"], ACCENT);
        assert_eq!(value["layout"]["title"]["text"], "Shares");
        assert!(value["data"][0].get("error_y").is_none());
        assert!(value["layout"].get("yaxis2").is_none());
    }

    #[test]
    fn violin_box_flag_uses_plotly_key() {
        let chart = Chart::new("d").with_trace(Trace::Violin(ViolinTrace {
            name: "dist".to_string(),
            y: vec![1.0],
            box_plot: BoxVisibility { visible: true },
            line: None,
            fillcolor: None,
        }));
        let value: Value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["data"][0]["type"], "violin");
        assert_eq!(value["data"][0]["box"]["visible"], true);
    }

    #[test]
    fn secondary_axis_overlays_primary() {
        let axis = Axis::secondary("Mean duration (min)");
        assert_eq!(axis.overlaying.as_deref(), Some("y"));
        assert_eq!(axis.side.as_deref(), Some("right"));
        assert_eq!(axis.title_text(), "Mean duration (min)");
    }
}
