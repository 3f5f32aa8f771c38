use super::{ACCENT, Axis, Chart, FOREGROUND, Font, Legend, Margin, SURFACE, SURFACE_LIGHT};

const BACKGROUND: &str = "#121212";

/// Dark presentation theme applied by the page renderer before a chart is embedded.
pub fn apply_dark_theme(chart: &mut Chart) {
    let layout = &mut chart.layout;
    layout.paper_bgcolor = Some(BACKGROUND.to_string());
    layout.plot_bgcolor = Some(SURFACE.to_string());
    layout.font = Some(Font::colored(FOREGROUND));
    layout.title.font = Some(Font::colored(ACCENT));
    layout.title.x = Some(0.5);
    layout.margin = Some(Margin { t: 50, r: 50, b: 50, l: 50 });
    layout.showlegend = Some(true);
    layout.legend = Some(Legend {
        font: Some(Font::colored(FOREGROUND)),
        bgcolor: Some("rgba(0,0,0,0)".to_string()),
        bordercolor: Some(SURFACE_LIGHT.to_string()),
    });

    style_axis(layout.xaxis.get_or_insert_with(Axis::default));
    style_axis(layout.yaxis.get_or_insert_with(Axis::default));
    if let Some(secondary) = layout.yaxis2.as_mut() {
        style_axis(secondary);
    }
}

fn style_axis(axis: &mut Axis) {
    axis.gridcolor = Some(SURFACE_LIGHT.to_string());
    axis.linecolor = Some(SURFACE_LIGHT.to_string());
    axis.tickfont = Some(Font::colored(FOREGROUND));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_styles_every_axis() {
        let mut chart = Chart::new("t");
        chart.layout.yaxis2 = Some(Axis::secondary("right"));
        apply_dark_theme(&mut chart);

        assert_eq!(chart.layout.paper_bgcolor.as_deref(), Some("#121212"));
        assert_eq!(chart.layout.title.font, Some(Font::colored(ACCENT)));
        for axis in [&chart.layout.xaxis, &chart.layout.yaxis, &chart.layout.yaxis2] {
            let axis = axis.as_ref().unwrap();
            assert_eq!(axis.gridcolor.as_deref(), Some(SURFACE_LIGHT));
        }
        // the secondary axis keeps its placement
        assert_eq!(chart.layout.yaxis2.as_ref().unwrap().side.as_deref(), Some("right"));
    }

    #[test]
    fn theme_is_idempotent() {
        let mut once = Chart::new("t");
        apply_dark_theme(&mut once);
        let mut twice = once.clone();
        apply_dark_theme(&mut twice);
        assert_eq!(once, twice);
    }
}
