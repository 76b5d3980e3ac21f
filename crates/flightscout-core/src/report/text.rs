use super::{CalendarMonth, RenderOptions, cell_value, legend, weekday_order};
use crate::aggregate::DateIndex;
use crate::fares::{RawResult, ResultStatus};
use chrono::Datelike;
use std::fmt::{self, Write};

const CELL_WIDTH: usize = 7;

/// Render the plaintext summary: one calendar per month, two rows per week
/// (values, then day numbers), followed by every result's fares.
pub(super) fn render(
    out: &mut impl Write,
    index: &DateIndex,
    results: &[RawResult],
    months: &[CalendarMonth],
    options: &RenderOptions,
) -> fmt::Result {
    writeln!(out, "{}", options.title)?;
    writeln!(out)?;

    for month in months {
        render_month(out, index, *month, options)?;
        writeln!(out)?;
    }

    if !index.is_empty() {
        writeln!(out, "{}", legend(index))?;
        writeln!(out)?;
    }

    for result in results {
        render_result(out, result)?;
    }

    Ok(())
}

fn render_month(
    out: &mut impl Write,
    index: &DateIndex,
    month: CalendarMonth,
    options: &RenderOptions,
) -> fmt::Result {
    writeln!(out, "{}", month)?;

    let header: String = weekday_order(options.week_start)
        .iter()
        .map(|day| format!("{:>width$}", day.to_string(), width = CELL_WIDTH))
        .collect();
    push_line(out, &header)?;

    for week in month.weeks(options.week_start) {
        let values: String = week
            .iter()
            .map(|cell| {
                let value = cell
                    .map(|date| cell_value(index.completeness(date)))
                    .unwrap_or_default();
                format!("{:>width$}", value, width = CELL_WIDTH)
            })
            .collect();
        let days: String = week
            .iter()
            .map(|cell| {
                let day = cell.map(|date| date.day().to_string()).unwrap_or_default();
                format!("{:>width$}", day, width = CELL_WIDTH)
            })
            .collect();

        push_line(out, &values)?;
        push_line(out, &days)?;
    }

    Ok(())
}

fn render_result(out: &mut impl Write, result: &RawResult) -> fmt::Result {
    match result.status() {
        ResultStatus::Fares => {
            writeln!(out, "{}:", result.label)?;
            for fare in &result.observations {
                writeln!(out, "  {} ${}", fare.date, fare.price)?;
            }
        }
        ResultStatus::Empty => writeln!(out, "{}: no fares found", result.label)?,
        ResultStatus::Failed => {
            if let Some(failure) = &result.failure {
                writeln!(
                    out,
                    "{}: FAILED after {} attempt(s): {}",
                    result.label, failure.attempts, failure.error
                )?;
            }
        }
    }
    Ok(())
}

/// Blank cells at the end of a week leave no trailing spaces
fn push_line(out: &mut impl Write, line: &str) -> fmt::Result {
    writeln!(out, "{}", line.trim_end())
}
