use super::{CalendarMonth, RenderOptions, cell_value, legend, weekday_order};
use crate::Result;
use crate::aggregate::{Completeness, DateIndex};
use crate::fares::RawResult;
use askama::Template;
use chrono::Datelike;
use std::path::Path;

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    title: String,
    legend: String,
    weekdays: Vec<String>,
    months: Vec<MonthView>,
    rows: Vec<DetailRow>,
    results: Vec<ResultRow>,
}

struct MonthView {
    title: String,
    weeks: Vec<Vec<CellView>>,
}

struct CellView {
    day: String,
    value: String,
    class: &'static str,
    title: String,
}

struct DetailRow {
    date: String,
    price: u32,
    label: String,
    group: String,
}

struct ResultRow {
    label: String,
    group: String,
    status: &'static str,
    detail: String,
    artifacts: Vec<ArtifactLink>,
}

struct ArtifactLink {
    name: String,
    href: String,
}

pub(super) fn render(
    index: &DateIndex,
    results: &[RawResult],
    months: &[CalendarMonth],
    options: &RenderOptions,
) -> Result<String> {
    let template = ReportTemplate {
        title: options.title.clone(),
        legend: legend(index),
        weekdays: weekday_order(options.week_start)
            .iter()
            .map(|d| d.to_string())
            .collect(),
        months: months
            .iter()
            .map(|m| month_view(index, *m, options))
            .collect(),
        rows: index
            .observations()
            .map(|o| DetailRow {
                date: o.date.to_string(),
                price: o.price,
                label: o.source_label.clone(),
                group: o.source_group.clone(),
            })
            .collect(),
        results: results
            .iter()
            .map(|r| result_row(r, options.artifact_root.as_deref()))
            .collect(),
    };

    Ok(template.render()?)
}

fn month_view(index: &DateIndex, month: CalendarMonth, options: &RenderOptions) -> MonthView {
    let weeks = month
        .weeks(options.week_start)
        .iter()
        .map(|week| {
            week.iter()
                .map(|cell| match cell {
                    None => CellView {
                        day: String::new(),
                        value: String::new(),
                        class: "outside",
                        title: String::new(),
                    },
                    Some(date) => {
                        let completeness = index.completeness(*date);
                        let (class, title) = match completeness {
                            Completeness::NoData => ("empty", String::new()),
                            Completeness::Complete { .. } => ("complete", "all searches reported".to_string()),
                            Completeness::Partial {
                                present, expected, ..
                            } => (
                                "partial",
                                format!(
                                    "{} of {} searches reported; missing: {}",
                                    present,
                                    expected,
                                    index.missing_groups_on(*date).join(", ")
                                ),
                            ),
                        };
                        CellView {
                            day: date.day().to_string(),
                            value: cell_value(completeness),
                            class,
                            title,
                        }
                    }
                })
                .collect()
        })
        .collect();

    MonthView {
        title: month.to_string(),
        weeks,
    }
}

fn result_row(result: &RawResult, artifact_root: Option<&Path>) -> ResultRow {
    let detail = match &result.failure {
        Some(failure) => format!("after {} attempt(s): {}", failure.attempts, failure.error),
        None => match result.best_price() {
            Some(best) => format!("{} fares, lowest ${}", result.observations.len(), best),
            None => "no fares found".to_string(),
        },
    };

    ResultRow {
        label: result.label.clone(),
        group: result.group.clone(),
        status: result.status().as_str(),
        detail,
        artifacts: result
            .artifacts
            .iter()
            .map(|a| {
                let path = artifact_root
                    .and_then(|root| a.path.strip_prefix(root).ok())
                    .unwrap_or(&a.path);
                ArtifactLink {
                    name: a.name.clone(),
                    href: path.display().to_string(),
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::fares::{Artifact, FailureRecord, Fare};
    use crate::report::ReportRenderer;
    use chrono::NaiveDate;

    fn dec(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 12, d).unwrap()
    }

    fn render_html(results: &[RawResult]) -> String {
        let renderer = ReportRenderer::new(RenderOptions {
            title: "SFO to PHL".to_string(),
            artifact_root: Some("/out".into()),
            ..RenderOptions::default()
        });
        renderer.render(&aggregate(results), results).unwrap().html
    }

    #[test]
    fn test_html_contains_grid_and_detail_rows() {
        let results = vec![
            RawResult::success("aa SFO-PHL", "aa SFO-PHL 2026-12-21", "aa", vec![Fare::new(250, dec(21))]),
            RawResult::success("bing SFO-PHL", "bing SFO-PHL 2026-12-21", "bing", vec![Fare::new(275, dec(21))]),
        ];

        let html = render_html(&results);
        assert!(html.contains("<title>SFO to PHL</title>"));
        assert!(html.contains("December 2026"));
        assert!(html.contains("class=\"complete\""));
        assert!(html.contains("$250"));
        assert!(html.contains("<td data-key=\"275\">$275</td>"));
    }

    #[test]
    fn test_html_lists_failures_and_screenshots() {
        let results = vec![
            RawResult::success("aa SFO-PHL", "aa SFO-PHL 2026-12-21", "aa", vec![Fare::new(250, dec(21))])
                .with_artifacts(vec![Artifact {
                    name: "postsubmit".to_string(),
                    path: "/out/shots/aa.png".into(),
                }]),
            RawResult::failed(
                "delta SFO-PHL",
                "delta SFO-PHL 2026-12-21",
                "delta",
                FailureRecord {
                    attempts: 2,
                    error: "no <span> price".to_string(),
                    history: vec![],
                },
            ),
        ];

        let html = render_html(&results);
        assert!(html.contains("class=\"partial\""));
        assert!(html.contains("missing: delta SFO-PHL"));
        assert!(html.contains("failed"));
        assert!(html.contains("no &lt;span&gt; price"), "error text is escaped");
        assert!(html.contains("shots"));
        assert!(!html.contains("/out/shots"), "links are relative to the output directory");
    }
}
