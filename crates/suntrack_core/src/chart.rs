//! Chart series and rendering sinks.
//!
//! # Responsibility
//! - Convert a [`SunSummary`] into sunrise, sunset and daylight series in
//!   fractional hours against a synthetic, evenly spaced date axis.
//! - Hand the series to a [`ChartSink`]; the PNG sink needs feature `chart`.
//!
//! # Invariants
//! - The axis has one point per record; the first point is `range.start`
//!   and, with two or more records, the last is `range.end`.
//! - Axis values do not depend on the records' real dates.

use crate::config::ChartRange;
use crate::service::stats_service::SunSummary;
use chrono::{NaiveDateTime, NaiveTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ChartError {
    /// Nothing to plot.
    EmptySeries,
    Render(String),
}

impl Display for ChartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySeries => write!(f, "chart series is empty"),
            Self::Render(message) => write!(f, "chart rendering failed: {message}"),
        }
    }
}

impl Error for ChartError {}

/// Three parallel series sharing one synthetic x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub range: ChartRange,
    pub axis: Vec<NaiveDateTime>,
    pub sunrise_hours: Vec<f64>,
    pub sunset_hours: Vec<f64>,
    pub daylight_hours: Vec<f64>,
}

impl ChartSeries {
    pub fn from_summary(summary: &SunSummary, range: ChartRange) -> Self {
        let sunrise_hours: Vec<f64> = summary
            .sunrises
            .iter()
            .map(|time| time.fractional_hours())
            .collect();
        let sunset_hours: Vec<f64> = summary
            .sunsets
            .iter()
            .map(|time| time.fractional_hours())
            .collect();
        let daylight_hours = sunrise_hours
            .iter()
            .zip(&sunset_hours)
            .map(|(sunrise, sunset)| sunset - sunrise)
            .collect();

        Self {
            range,
            axis: synthetic_axis(range, sunrise_hours.len()),
            sunrise_hours,
            sunset_hours,
            daylight_hours,
        }
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }
}

/// `points` evenly spaced instants from `range.start` to `range.end`
/// inclusive, at midnight.
pub fn synthetic_axis(range: ChartRange, points: usize) -> Vec<NaiveDateTime> {
    let start = range.start.and_time(NaiveTime::MIN);
    let end = range.end.and_time(NaiveTime::MIN);
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span_ms = (end - start).num_milliseconds() as f64;
            let step_ms = span_ms / (points - 1) as f64;
            (0..points)
                .map(|index| {
                    if index == points - 1 {
                        end
                    } else {
                        let offset = (step_ms * index as f64).round() as i64;
                        start + chrono::Duration::milliseconds(offset)
                    }
                })
                .collect()
        }
    }
}

/// Consumer of computed chart series.
pub trait ChartSink {
    fn render(&self, series: &ChartSeries) -> Result<(), ChartError>;
}

#[cfg(feature = "chart")]
pub use png::PngChartSink;

#[cfg(feature = "chart")]
mod png {
    use super::{ChartError, ChartSeries, ChartSink};
    use log::{error, info};
    use plotters::coord::types::RangedDateTime;
    use plotters::prelude::*;
    use std::path::PathBuf;

    const SUNRISE_COLOR: RGBColor = RGBColor(255, 165, 0);
    const SUNSET_COLOR: RGBColor = RGBColor(220, 20, 60);
    const DAYLIGHT_COLOR: RGBColor = RGBColor(34, 139, 34);
    const CHART_SIZE: (u32, u32) = (1000, 600);

    /// Renders the three series as a line chart into a PNG file.
    pub struct PngChartSink {
        path: PathBuf,
    }

    impl PngChartSink {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        fn draw(&self, series: &ChartSeries) -> Result<(), Box<dyn std::error::Error>> {
            let root = BitMapBackend::new(&self.path, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let x_start = series.range.start.and_time(chrono::NaiveTime::MIN);
            let x_end = series.range.end.and_time(chrono::NaiveTime::MIN);

            let mut chart = ChartBuilder::on(&root)
                .caption("Sunrise and Sunset Times Over Time", ("sans-serif", 24))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(RangedDateTime::from(x_start..x_end), 0.0_f64..24.0_f64)?;

            chart
                .configure_mesh()
                .x_desc("Date")
                .y_desc("Time (Hour of the Day)")
                .x_label_formatter(&|dt: &chrono::NaiveDateTime| dt.format("%Y-%m-%d").to_string())
                .light_line_style(BLACK.mix(0.1))
                .draw()?;

            let lines = [
                ("Sunrise Times", &series.sunrise_hours, SUNRISE_COLOR),
                ("Sunset Times", &series.sunset_hours, SUNSET_COLOR),
                ("Hours of Daylight", &series.daylight_hours, DAYLIGHT_COLOR),
            ];
            for (label, values, color) in lines {
                chart
                    .draw_series(LineSeries::new(
                        series.axis.iter().copied().zip(values.iter().copied()),
                        color,
                    ))?
                    .label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
            Ok(())
        }
    }

    impl ChartSink for PngChartSink {
        fn render(&self, series: &ChartSeries) -> Result<(), ChartError> {
            if series.is_empty() {
                return Err(ChartError::EmptySeries);
            }
            match self.draw(series) {
                Ok(()) => {
                    info!(
                        "event=chart_render module=chart status=ok path={} points={}",
                        self.path.display(),
                        series.len()
                    );
                    Ok(())
                }
                Err(err) => {
                    error!(
                        "event=chart_render module=chart status=error path={} error={}",
                        self.path.display(),
                        err
                    );
                    Err(ChartError::Render(err.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{synthetic_axis, ChartSeries};
    use crate::config::ChartRange;
    use crate::model::sun_times::{ClockTime, DayRecord, SunTimes};
    use crate::service::stats_service::summarize;
    use chrono::NaiveDate;

    fn range() -> ChartRange {
        ChartRange {
            start: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
        }
    }

    #[test]
    fn axis_spans_range_evenly() {
        let axis = synthetic_axis(range(), 3);
        assert_eq!(axis.len(), 3);
        assert_eq!(axis[0].date(), NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(axis[1].date(), NaiveDate::from_ymd_opt(2024, 8, 6).unwrap());
        assert_eq!(axis[2].date(), NaiveDate::from_ymd_opt(2024, 8, 11).unwrap());
    }

    #[test]
    fn axis_with_single_point_sits_at_start() {
        let axis = synthetic_axis(range(), 1);
        assert_eq!(axis.len(), 1);
        assert_eq!(axis[0].date(), range().start);
        assert!(synthetic_axis(range(), 0).is_empty());
    }

    #[test]
    fn series_convert_to_fractional_hours() {
        let record = DayRecord::new(
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            SunTimes::new(
                ClockTime::parse_12h("06:00:00 AM").unwrap(),
                ClockTime::parse_12h("08:00:00 PM").unwrap(),
            ),
        );
        let summary = summarize(&[record]).unwrap();

        let series = ChartSeries::from_summary(&summary, range());
        assert_eq!(series.sunrise_hours, vec![6.0]);
        assert_eq!(series.sunset_hours, vec![20.0]);
        assert_eq!(series.daylight_hours, vec![14.0]);
        assert_eq!(series.axis[0].date(), range().start);
    }
}
