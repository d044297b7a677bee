use std::collections::BTreeMap;

use plotters::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistogramError {
    #[error("failed to render histogram: {0}")]
    Render(String),
}

/// Writes a PNG histogram of simulated completion days.
pub fn write_histogram_png(output_path: &str, samples: &[f64]) -> Result<(), HistogramError> {
    if samples.is_empty() {
        return Ok(());
    }

    let (counts, bin_width) = bucket_samples(samples);
    let max_count = counts.values().copied().max().unwrap_or(1);
    let min_bucket = counts.keys().next().copied().unwrap_or(0) - 1;
    let max_bucket = counts.keys().next_back().copied().unwrap_or(0) + 1;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Simulated Completion", ("sans-serif", 30))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(min_bucket..max_bucket, 0..(max_count + 1))
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Days until completion")
        .y_desc("Frequency")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_label_formatter(&|value| format!("{:.1}", *value as f64 * bin_width))
        .draw()
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    let bar_color = RGBColor(30, 122, 204);
    let bar_style = ShapeStyle::from(&bar_color).filled();
    chart
        .draw_series(counts.iter().map(|(bucket, count)| {
            Rectangle::new([(*bucket, 0), (*bucket + 1, *count)], bar_style)
        }))
        .map_err(|e| HistogramError::Render(e.to_string()))?;

    root.present()
        .map_err(|e| HistogramError::Render(e.to_string()))?;
    Ok(())
}

/// Groups samples into sqrt(n) equal-width buckets keyed by bucket index.
/// A sample with no spread lands in a single bucket of width 1.
fn bucket_samples(samples: &[f64]) -> (BTreeMap<i64, usize>, f64) {
    let min_value = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max_value = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max_value - min_value;
    let bin_width = if range < f64::EPSILON {
        1.0
    } else {
        range / (samples.len() as f64).sqrt()
    };

    let mut counts = BTreeMap::new();
    for value in samples {
        let bucket = (*value / bin_width).floor() as i64;
        *counts.entry(bucket).or_insert(0usize) += 1;
    }
    (counts, bin_width)
}
