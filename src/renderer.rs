//! # BAC Chart Rendering
//!
//! Renders a [`BacTimeline`] as an ASCII chart for the terminal.
//!
//! ## Layout
//! - **Y axis**: g/L, from 0 up to the peak (never less than 0.6 so the legal
//!   limit line is always on screen)
//! - **Limit line**: dashed row at 0.5 g/L
//! - **Curve**: one column per sample; samples at zero are left blank, so the
//!   chart only shows the period with alcohol in the blood
//! - **Now marker**: `X` on the sample at or just before the current time

use crate::{estimator::DANGER_THRESHOLD, BacTimeline};
use chrono::{Duration, TimeZone};
use std::fmt::Display;

const ROWS: usize = 16;
const Y_AXIS_WIDTH: usize = 6; // Space for Y-axis labels

/// Lowest top of the Y axis in g/L
const MIN_CHART_TOP: f64 = 0.6;

fn row_for(bac: f64, top: f64) -> usize {
    let normalized = (bac / top).clamp(0.0, 1.0);
    ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
}

/// Render `timeline` with time labels in `tz`.
pub fn render_ascii<Tz>(timeline: &BacTimeline, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let samples = &timeline.samples;
    if timeline.nonzero().next().is_none() {
        return "No alcohol in the selected window.\n".to_string();
    }

    let sample_count = samples.len();
    let peak = timeline.peak().map_or(0.0, |sample| sample.bac);
    let top = peak.max(MIN_CHART_TOP);
    let label_step = if top > 1.5 { 0.5 } else { 0.25 };

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels
    let mut level = 0.0;
    while level <= top + f64::EPSILON {
        let row = row_for(level, top);
        let label = format!("{:<width$.2}", level, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
        level += label_step;
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    // Legal limit reference line
    let limit_row = row_for(DANGER_THRESHOLD, top);
    for cell in grid[limit_row].iter_mut().skip(Y_AXIS_WIDTH) {
        *cell = '-';
    }

    let now_index = timeline
        .current()
        .and_then(|current| samples.iter().position(|s| s.time == current.time));

    for (column, sample) in samples.iter().enumerate() {
        let grid_column = column + Y_AXIS_WIDTH;
        if Some(column) == now_index {
            grid[row_for(sample.bac, top)][grid_column] = 'X';
        } else if sample.bac > 0.0 {
            grid[row_for(sample.bac, top)][grid_column] = '•';
        }
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    // Hour ticks below the chart
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let start = samples[0].time;
    let ticks: String = samples
        .iter()
        .map(|sample| {
            let offset = sample.time - start;
            if offset.num_seconds() % Duration::hours(1).num_seconds() == 0 {
                '|'
            } else {
                ' '
            }
        })
        .collect();
    out.push_str(&padding);
    out.push_str(ticks.trim_end());
    out.push('\n');

    // Start, now and end labels
    let fmt = |i: usize| samples[i].time.with_timezone(tz).format("%H:%M").to_string();
    let mut labels = vec![' '; sample_count + 5];
    let mut place = |at: usize, text: &str| {
        for (i, ch) in text.chars().enumerate() {
            if let Some(cell) = labels.get_mut(at + i) {
                *cell = ch;
            }
        }
    };
    place(0, &fmt(0));
    if let Some(index) = now_index {
        place(index.saturating_sub(1), "Now");
    }
    place(sample_count.saturating_sub(5), &fmt(sample_count - 1));
    out.push_str(&padding);
    out.push_str(labels.into_iter().collect::<String>().trim_end());
    out.push('\n');

    out
}

/// Print the chart to stdout.
pub fn draw_ascii<Tz>(timeline: &BacTimeline, tz: &Tz)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    print!("{}", render_ascii(timeline, tz));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_timeline, DrinkEvent, Sex, TimelineWindow, UserProfile};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 23, 0, 0).unwrap()
    }

    fn timeline_with(drinks: &[DrinkEvent]) -> BacTimeline {
        let profile = UserProfile::new(70.0, Sex::Male).unwrap();
        generate_timeline(drinks, &profile, now(), &TimelineWindow::rolling())
    }

    #[test]
    fn test_empty_timeline_message() {
        let chart = render_ascii(&timeline_with(&[]), &Utc);
        assert_eq!(chart, "No alcohol in the selected window.\n");
    }

    #[test]
    fn test_chart_has_curve_now_marker_and_limit() {
        let drinks = vec![
            DrinkEvent::new("Wine", 250.0, 12.0, now() - Duration::hours(1)).unwrap(),
            DrinkEvent::new("Shot", 50.0, 40.0, now() - Duration::minutes(20)).unwrap(),
        ];
        let chart = render_ascii(&timeline_with(&drinks), &Utc);

        assert!(chart.contains('X'), "chart should mark now:\n{chart}");
        assert!(chart.contains('•'));
        assert!(chart.contains("----"));
        assert!(chart.contains("0.50"));
        assert!(chart.contains("Now"));
        assert!(chart.contains("15:00"), "start label missing:\n{chart}");
        assert!(chart.contains("03:00"), "end label missing:\n{chart}");
        // ROWS chart lines + ticks + labels
        assert_eq!(chart.lines().count(), ROWS + 2);
    }

    #[test]
    fn test_row_mapping() {
        assert_eq!(row_for(0.0, 1.0), ROWS - 1);
        assert_eq!(row_for(1.0, 1.0), 0);
        assert_eq!(row_for(5.0, 1.0), 0);
    }
}
