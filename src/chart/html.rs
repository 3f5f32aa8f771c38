use super::{Chart, ChartWriter};
use crate::model::ChartError;
use crate::utils::escape_html;
use std::fs;
use std::path::Path;

pub const PLOTLY_JS_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Writes a standalone interactive HTML document per chart.
pub struct HtmlWriter;

impl HtmlWriter {
    pub fn render(chart: &Chart) -> Result<String, ChartError> {
        let figure = chart.to_json()?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <script src="{}"></script>
</head>
<body>
    <div id="chart" style="width:100%;height:100vh;"></div>
    <script>
        const figure = {};
        Plotly.newPlot('chart', figure.data, figure.layout, {{responsive: true}});
    </script>
</body>
</html>
"#,
            escape_html(chart.title()),
            PLOTLY_JS_CDN,
            script_safe(&figure)
        ))
    }
}

impl ChartWriter for HtmlWriter {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn write(&self, chart: &Chart, path: &Path) -> Result<(), ChartError> {
        fs::write(path, Self::render(chart)?)?;
        Ok(())
    }
}

/// Keeps JSON embedded in a <script> block from closing it early.
pub fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
