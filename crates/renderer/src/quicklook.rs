//! Daily time-height quicklook of a persisted VAD profile.
//!
//! The image spans the UTC calendar day of the first scan on the x axis and
//! 0-10 km on the y axis. A subsample of the profile is drawn as wind barbs
//! in knots, colored by speed bin, next to a colorbar of the site's scale.

use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::barbs::{barb_primitives, BarbPrimitive};
use crate::png;
use vad_common::time::{day_window, output_filename, seconds_between};
use vad_common::wind::ms_to_knots;
use vad_common::{ColorScale, SiteRegistry, TimeHeightField, VadError, VadResult};
use vad_profile::{read_profile, PersistedProfile};

const TITLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendering options for a quicklook.
#[derive(Debug, Clone)]
pub struct QuicklookOptions {
    /// Image width, pixels
    pub width: u32,
    /// Image height, pixels
    pub height: u32,
    /// Plot every n-th time
    pub time_stride: usize,
    /// Plot every n-th height level
    pub height_stride: usize,
    /// Barb shaft length, pixels
    pub barb_length: f64,
    /// Top of the height axis, km
    pub max_height_km: f64,
    /// Width reserved for the colorbar, pixels
    pub colorbar_width: u32,
}

impl Default for QuicklookOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            time_stride: 6,
            height_stride: 5,
            barb_length: 18.0,
            max_height_km: 10.0,
            colorbar_width: 110,
        }
    }
}

/// One barb to draw, in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarbSample {
    /// Hours since the start of the day window
    pub hour: f64,
    pub height_km: f64,
    pub u_kt: f64,
    pub v_kt: f64,
    pub speed_kt: f64,
}

/// Pick the barbs to draw: every `time_stride`-th time and every
/// `height_stride`-th level, starting from the first of each.
///
/// Samples with a missing component, outside the day window or above
/// `max_height_km` are dropped.
pub fn subsample(
    profile: &PersistedProfile,
    window_start: &DateTime<Utc>,
    options: &QuicklookOptions,
) -> Vec<BarbSample> {
    let time_stride = options.time_stride.max(1);
    let height_stride = options.height_stride.max(1);
    let mut samples = Vec::new();

    for (t, time) in profile.times.iter().enumerate().step_by(time_stride) {
        let hour = seconds_between(window_start, time) / 3600.0;
        if !(0.0..=24.0).contains(&hour) {
            continue;
        }

        for (h, &height_m) in profile.heights.iter().enumerate().step_by(height_stride) {
            let height_km = height_m / 1000.0;
            if !(0.0..=options.max_height_km).contains(&height_km) {
                continue;
            }

            let value = |field: &TimeHeightField| field.get(t, h).unwrap_or(f64::NAN);
            let (u, v, speed) = (value(&profile.u_wind), value(&profile.v_wind), value(&profile.speed));
            if !(u.is_finite() && v.is_finite() && speed.is_finite()) {
                continue;
            }

            samples.push(BarbSample {
                hour,
                height_km,
                u_kt: ms_to_knots(u),
                v_kt: ms_to_knots(v),
                speed_kt: ms_to_knots(speed),
            });
        }
    }

    samples
}

/// Quicklook title: the site's prefix followed by the day window.
pub fn quicklook_title(prefix: &str, start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    format!(
        "{}{} - {}",
        prefix,
        start.format(TITLE_TIME_FORMAT),
        end.format(TITLE_TIME_FORMAT)
    )
}

/// Render the quicklook of the profile at `profile_path` for `site` into
/// `out_dir`. Returns the written path.
///
/// The site and the profile's variables are validated before anything is
/// written.
pub fn render_quicklook(
    profile_path: &Path,
    site: &str,
    registry: &SiteRegistry,
    out_dir: &Path,
    options: &QuicklookOptions,
) -> VadResult<PathBuf> {
    let plot = registry.get_plot_values(site)?;
    let profile = read_profile(profile_path)?;

    let first = profile.first_time().ok_or_else(|| {
        VadError::InvalidData(format!("{}: profile has no times", profile_path.display()))
    })?;
    let (start, end) = day_window(&first);

    let samples = subsample(&profile, &start, options);
    debug!(
        path = %profile_path.display(),
        barbs = samples.len(),
        "Subsampled profile"
    );

    let title = quicklook_title(&plot.title, &start, &end);
    let pixels = draw_quicklook(&title, &samples, &plot.color_scale, options).map_err(VadError::Render)?;
    let encoded = png::encode_rgb_auto(&pixels, options.width as usize, options.height as usize)
        .map_err(VadError::Render)?;

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(output_filename(&plot.save_name, &first, "png"));
    std::fs::write(&path, &encoded)?;

    info!(
        path = %path.display(),
        site,
        barbs = samples.len(),
        bytes = encoded.len(),
        "Wrote quicklook"
    );
    Ok(path)
}

/// Draw the chart into an RGB buffer.
fn draw_quicklook(
    title: &str,
    samples: &[BarbSample],
    scale: &ColorScale,
    options: &QuicklookOptions,
) -> Result<Vec<u8>, String> {
    let (width, height) = (options.width, options.height);
    if width <= options.colorbar_width || height == 0 {
        return Err(format!("image {}x{} too small", width, height));
    }

    let mut buffer = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let (plot_area, bar_area) = root.split_horizontally(width - options.colorbar_width);

        let mut chart = ChartBuilder::on(&plot_area)
            .caption(title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..24f64, 0f64..options.max_height_km)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_desc("Time (UTC)")
            .y_desc("Height (km)")
            .x_labels(9)
            .x_label_formatter(&|x| format!("{:02}:00", x.round() as u32))
            .draw()
            .map_err(|e| e.to_string())?;

        for sample in samples {
            let Some((r, g, b)) = scale.color_for(sample.speed_kt) else {
                continue;
            };
            let color = RGBColor(r, g, b);
            let origin = chart.backend_coord(&(sample.hour, sample.height_km));
            let at = |(dx, dy): (f64, f64)| -> (i32, i32) {
                (origin.0 + dx.round() as i32, origin.1 + dy.round() as i32)
            };

            for primitive in barb_primitives(sample.u_kt, sample.v_kt, options.barb_length) {
                match primitive {
                    BarbPrimitive::Line([a, b]) => root
                        .draw(&PathElement::new(vec![at(a), at(b)], color.stroke_width(1)))
                        .map_err(|e| e.to_string())?,
                    BarbPrimitive::Flag(points) => root
                        .draw(&Polygon::new(points.iter().map(|&p| at(p)).collect::<Vec<_>>(), color.filled()))
                        .map_err(|e| e.to_string())?,
                    BarbPrimitive::Circle { center, radius } => root
                        .draw(&Circle::new(at(center), radius.round().max(1.0) as i32, color.stroke_width(1)))
                        .map_err(|e| e.to_string())?,
                }
            }
        }

        draw_colorbar(&root, &bar_area, scale)?;
        root.present().map_err(|e| e.to_string())?;
    }

    Ok(buffer)
}

/// Colorbar with one block per bin, ticked at the scale's tick values.
fn draw_colorbar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    area: &DrawingArea<DB, Shift>,
    scale: &ColorScale,
) -> Result<(), String> {
    let bounds = scale.bounds();
    let (low, high) = (bounds[0], bounds[bounds.len() - 1]);

    let mut bar = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(50)
        .margin_left(10)
        .margin_right(70)
        .build_cartesian_2d(0f64..1f64, low..high)
        .map_err(|e| e.to_string())?;

    bar.draw_series(bounds.windows(2).enumerate().map(|(i, w)| {
        let (r, g, b) = scale.bin_color(i);
        Rectangle::new([(0.0, w[0]), (1.0, w[1])], RGBColor(r, g, b).filled())
    }))
    .map_err(|e| e.to_string())?;

    let label_font = ("sans-serif", 12).into_font();
    for &tick in scale.ticks().iter().filter(|t| (low..=high).contains(*t)) {
        let (x, y) = bar.backend_coord(&(1.0, tick));
        root.draw(&PathElement::new(vec![(x, y), (x + 4, y)], BLACK.stroke_width(1)))
            .map_err(|e| e.to_string())?;
        root.draw(&Text::new(format_tick(tick), (x + 6, y - 6), label_font.clone()))
            .map_err(|e| e.to_string())?;
    }

    let (x_top, y_top) = bar.backend_coord(&(1.0, high));
    let (_, y_bottom) = bar.backend_coord(&(1.0, low));
    root.draw(&Text::new(
        "Speed (kts)",
        (x_top + 40, (y_top + y_bottom) / 2 + 35),
        ("sans-serif", 14).into_font().transform(FontTransform::Rotate270),
    ))
    .map_err(|e| e.to_string())?;

    Ok(())
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_spans_day() {
        let start = Utc.with_ymd_and_hms(2017, 10, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2017, 10, 6, 0, 0, 0).unwrap();
        assert_eq!(
            quicklook_title("SGP X-SAPR I5 VAD ", &start, &end),
            "SGP X-SAPR I5 VAD 2017-10-05 00:00:00 - 2017-10-06 00:00:00"
        );
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(5.0), "5");
        assert_eq!(format_tick(2.5), "2.5");
    }
}
