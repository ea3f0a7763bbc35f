// src/visualisation.rs

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::diagnostics::FieldLoopSeries;
use crate::scalar_field::PlaneSlice;

/// Colours cycled through when one chart carries several series
/// (resolutions, timers, ...).
const SERIES_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

fn series_color(index: usize) -> RGBColor {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Min/max over the finite entries, widened by a 10% margin so curves do
/// not sit on the frame. Falls back to [-1, 1] when everything is NaN.
fn padded_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            if v < y_min {
                y_min = v;
            }
            if v > y_max {
                y_max = v;
            }
        }
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        return (-1.0, 1.0);
    }
    if (y_max - y_min).abs() < 1e-30 {
        let delta = if y_max.abs() < 1e-30 {
            1.0
        } else {
            0.1 * y_max.abs()
        };
        return (y_min - delta, y_max + delta);
    }
    let margin = 0.1 * (y_max - y_min);
    (y_min - margin, y_max + margin)
}

/// Positive range for log-scaled axes. Non-positive and non-finite entries
/// are ignored; an all-zero series still gets a drawable window.
fn log_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() && v > 0.0 {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (1e-16, 1.0);
    }
    (lo / 2.0, hi * 2.0)
}

/// White-to-blue colour map for slice heatmaps; `t` in [0, 1].
fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    RGBColor(
        (247.0 - 239.0 * t) as u8,
        (251.0 - 203.0 * t) as u8,
        (255.0 - 148.0 * t) as u8,
    )
}

/// Two-panel advecting-field-loop figure: normalized mean square of the
/// centered magnetic field against time, and max |div B| against time on a
/// log axis, one curve per resolution.
pub fn save_field_loop_plot(
    series: &[FieldLoopSeries],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if series.is_empty() {
        return Ok(()); // nothing to plot
    }

    let root = BitMapBackend::new(path, (1400, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));

    let (t_min, t_max) = padded_range(series.iter().flat_map(|s| s.times.iter()));

    // Left panel: B² decay, linear axes
    {
        let (y_min, y_max) = padded_range(series.iter().flat_map(|s| s.b_squared_avg.iter()));
        let mut chart = ChartBuilder::on(&panels[0])
            .margin(20)
            .set_left_and_bottom_label_area_size(60)
            .build_cartesian_2d(t_min..t_max, y_min..y_max.min(1.05))?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Normalized mean square magnetic field")
            .label_style(("sans-serif", 16))
            .draw()?;

        for (idx, s) in series.iter().enumerate() {
            let color = series_color(idx);
            chart
                .draw_series(LineSeries::new(
                    s.times.iter().zip(s.b_squared_avg.iter()).map(|(&t, &v)| (t, v)),
                    color.stroke_width(1),
                ))?
                .label(format!("N={}", s.resolution))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
                });
            chart.draw_series(
                s.times
                    .iter()
                    .zip(s.b_squared_avg.iter())
                    .map(|(&t, &v)| Circle::new((t, v), 3, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .border_style(BLACK.stroke_width(1))
            .background_style(WHITE.mix(0.8))
            .draw()?;
    }

    // Right panel: divergence, log y
    {
        let (y_min, y_max) = log_range(series.iter().flat_map(|s| s.divergence.iter()));
        let mut chart = ChartBuilder::on(&panels[1])
            .margin(20)
            .set_left_and_bottom_label_area_size(60)
            .build_cartesian_2d(t_min..t_max, (y_min..y_max).log_scale())?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Max |∇·B|")
            .label_style(("sans-serif", 16))
            .draw()?;

        for (idx, s) in series.iter().enumerate() {
            let color = series_color(idx);
            chart
                .draw_series(LineSeries::new(
                    s.times
                        .iter()
                        .zip(s.divergence.iter())
                        .filter(|(_, &v)| v.is_finite() && v > 0.0)
                        .map(|(&t, &v)| (t, v)),
                    color.stroke_width(1),
                ))?
                .label(format!("N={}", s.resolution))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK.stroke_width(1))
            .background_style(WHITE.mix(0.8))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// A row-major grid of 2D slice heatmaps, `cols` panels per row. With
/// `shared_max` the panels share one colour scale (for before/after
/// comparisons); otherwise each panel auto-scales.
pub fn save_slice_grid(
    panels: &[(String, PlaneSlice)],
    cols: usize,
    shared_max: Option<f64>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if panels.is_empty() {
        return Ok(());
    }
    let rows = panels.len().div_ceil(cols);

    let root = BitMapBackend::new(path, (500 * cols as u32, 500 * rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((rows, cols));

    for ((label, slice), area) in panels.iter().zip(areas.iter()) {
        let nx = slice.nx as i32;
        let ny = slice.ny as i32;

        let (lo, hi) = match shared_max {
            Some(max) => (0.0, max),
            None => (slice.min(), slice.max()),
        };
        let span = if (hi - lo).abs() < 1e-300 { 1.0 } else { hi - lo };

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .build_cartesian_2d(0..nx, 0..ny)?;

        chart.draw_series((0..nx).flat_map(|i| {
            (0..ny).map(move |j| (i, j))
        }).map(|(i, j)| {
            let v = slice.get(i as usize, j as usize);
            let color = heat_color((v - lo) / span);
            Rectangle::new([(i, j), (i + 1, j + 1)], color.filled())
        }))?;

        // Panel label in the top-left corner
        chart.draw_series(std::iter::once(Text::new(
            label.clone(),
            (1, ny - 2),
            ("sans-serif", 24),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Log-log convergence figure for one wave: L2 error against resolution for
/// both reconstructors, with a second-order reference line anchored on the
/// second PLMC point.
pub fn save_convergence_plot(
    title: &str,
    resolutions: &[usize],
    plmc: &[f64],
    ppmc: &[f64],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if resolutions.is_empty() {
        return Ok(());
    }
    let res: Vec<f64> = resolutions.iter().map(|&r| r as f64).collect();

    let x_min = res.first().copied().unwrap_or(10.0) * 0.8;
    let x_max = res.last().copied().unwrap_or(1000.0) * 1.25;
    let (y_min, y_max) = log_range(plmc.iter().chain(ppmc.iter()));

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())?;

    chart
        .configure_mesh()
        .x_desc("Resolution")
        .y_desc("L2 Error")
        .label_style(("sans-serif", 16))
        .draw()?;

    for (label, data, color) in [("PLMC", plmc, RED), ("PPMC", ppmc, BLUE)] {
        chart
            .draw_series(LineSeries::new(
                res.iter().zip(data.iter()).map(|(&r, &e)| (r, e)),
                color.stroke_width(1),
            ))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
            });
        chart.draw_series(
            res.iter()
                .zip(data.iter())
                .map(|(&r, &e)| Circle::new((r, e), 4, color.filled())),
        )?;
    }

    // Second-order reference through the second PLMC point:
    // err(r) = err(r1) * (r1 / r)^2
    if res.len() >= 2 && plmc.len() >= 2 {
        let r1 = res[1];
        let anchor = plmc[1];
        let reference: Vec<(f64, f64)> = [res[0], r1, res[res.len() - 1]]
            .iter()
            .map(|&r| (r, anchor * (r1 / r).powi(2)))
            .collect();
        let gray = RGBColor(90, 90, 90);
        chart.draw_series(LineSeries::new(
            reference.iter().copied(),
            gray.stroke_width(1),
        ))?;
        let (rx, ry) = reference[reference.len() - 1];
        chart.draw_series(std::iter::once(Text::new(
            "O(Δx²)".to_string(),
            (rx, ry),
            ("sans-serif", 18),
        )))?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK.stroke_width(1))
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Grid of 1D profiles through the tube midline, three panels per row.
pub fn save_profile_grid(
    title: &str,
    x: &[f64],
    panels: &[(String, Vec<f64>)],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if x.is_empty() || panels.is_empty() {
        return Ok(());
    }
    let cols = 3usize;
    let rows = panels.len().div_ceil(cols);

    let root = BitMapBackend::new(path, (480 * cols as u32, 400 * rows as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 26))?;
    let areas = root.split_evenly((rows, cols));

    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    for ((label, values), area) in panels.iter().zip(areas.iter()) {
        let (y_min, y_max) = padded_range(values.iter());
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .caption(label, ("sans-serif", 18))
            .set_left_and_bottom_label_area_size(45)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_labels(5)
            .y_labels(5)
            .label_style(("sans-serif", 12))
            .draw()?;

        chart.draw_series(LineSeries::new(
            x.iter().zip(values.iter()).map(|(&xi, &v)| (xi, v)),
            BLUE.stroke_width(1),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Cell updates per second per GPU against rank count, log-log.
pub fn save_cells_per_second_plot(
    series: &[(String, Vec<(f64, f64)>)],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if series.is_empty() {
        return Ok(());
    }
    let (y_min, y_max) = log_range(series.iter().flat_map(|(_, s)| s.iter().map(|(_, y)| y)));
    let (x_min, x_max) = log_range(series.iter().flat_map(|(_, s)| s.iter().map(|(x, _)| x)));

    let root = BitMapBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("MHD Weak Scaling", ("sans-serif", 26))
        .set_left_and_bottom_label_area_size(70)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())?;

    chart
        .configure_mesh()
        .x_desc("Number of GPUs")
        .y_desc("Cell Updates / Second / GPU")
        .label_style(("sans-serif", 16))
        .draw()?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let color = series_color(idx);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(1)))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
            });
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK.stroke_width(1))
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Weak-scaling efficiency in percent against rank count, log x.
pub fn save_efficiency_plot(
    ranks: &[f64],
    efficiency: &[f64],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if ranks.is_empty() {
        return Ok(());
    }
    let (x_min, x_max) = log_range(ranks.iter());

    let root = BitMapBackend::new(path, (700, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d((x_min..x_max).log_scale(), 0.0..102.0)?;

    chart
        .configure_mesh()
        .x_desc("Number of GPUs")
        .y_desc("Weak Scaling Efficiency (%)")
        .label_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(LineSeries::new(
        ranks.iter().zip(efficiency.iter()).map(|(&x, &y)| (x, y)),
        BLACK.stroke_width(1),
    ))?;
    chart.draw_series(
        ranks
            .iter()
            .zip(efficiency.iter())
            .map(|(&x, &y)| TriangleMarker::new((x, y), 5, BLACK.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Per-timestep milliseconds (scaled to a fixed cell count per GPU)
/// against rank count, one curve per timer, log x.
pub fn save_ms_per_timestep_plot(
    series: &[(String, Vec<(f64, f64)>)],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if series.is_empty() {
        return Ok(());
    }
    let (x_min, x_max) = log_range(series.iter().flat_map(|(_, s)| s.iter().map(|(x, _)| x)));
    let (_, y_max) = padded_range(series.iter().flat_map(|(_, s)| s.iter().map(|(_, y)| y)));

    let root = BitMapBackend::new(path, (700, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d((x_min..x_max).log_scale(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Number of GPUs")
        .y_desc("Milliseconds / 256³ Cells / GPU")
        .label_style(("sans-serif", 16))
        .draw()?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let color = series_color(idx);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(1)))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
            });
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .border_style(BLACK.stroke_width(1))
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Strong-scaling speedup against rank count with the ideal-scaling line,
/// log-log.
pub fn save_strong_scaling_plot(
    ranks: &[f64],
    speedup: &[f64],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if ranks.is_empty() {
        return Ok(());
    }
    let (x_min, x_max) = log_range(ranks.iter());
    let (y_min, y_max) = log_range(speedup.iter().chain(ranks.iter()));

    let root = BitMapBackend::new(path, (700, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())?;

    chart
        .configure_mesh()
        .x_desc("Number of GPUs")
        .y_desc("Speedup (vs. single GPU)")
        .label_style(("sans-serif", 16))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            ranks.iter().zip(speedup.iter()).map(|(&x, &y)| (x, y)),
            BLACK.stroke_width(1),
        ))?
        .label("Total runtime (excluding initialization)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1)));
    chart.draw_series(
        ranks
            .iter()
            .zip(speedup.iter())
            .map(|(&x, &y)| TriangleMarker::new((x, y), 5, BLACK.filled())),
    )?;

    let gray = RGBColor(120, 120, 120);
    chart
        .draw_series(LineSeries::new(
            ranks.iter().map(|&r| (r, r)),
            gray.stroke_width(1),
        ))?
        .label("Ideal scaling")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], gray.stroke_width(1)));

    chart
        .configure_series_labels()
        .border_style(BLACK.stroke_width(1))
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}
