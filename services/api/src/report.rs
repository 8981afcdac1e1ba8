use crate::cli::DataArgs;
use crate::infra::{event_label, load_config, load_dataset};
use clap::Args;
use political_risk::error::AppError;
use political_risk::framework::assessment::AssessmentView;
use political_risk::framework::evaluation::{AnthropicEvaluator, EventEvaluator, ImpactEvaluation};
use political_risk::framework::history::{HistoryImporter, HistoryTimeline};
use political_risk::framework::{
    project, ChangeDirection, DatasetError, DomainId, ImpactEvent, ProjectionResult,
    ScenarioLibrary,
};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ProjectArgs {
    /// Scenario event id to apply; repeat to combine events
    #[arg(long = "event")]
    pub(crate) events: Vec<String>,
    /// List the available scenario events instead of projecting
    #[arg(long)]
    pub(crate) list: bool,
    /// Only list events belonging to this domain
    #[arg(long, value_parser = crate::infra::parse_domain)]
    pub(crate) domain: Option<DomainId>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Free-text description of the event to evaluate
    pub(crate) description: String,
    /// Project the evaluated impacts against the current assessment
    #[arg(long)]
    pub(crate) apply: bool,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct HistoryArgs {
    /// Read snapshots from this CSV instead of the dataset's history.csv
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

pub(crate) fn run_assessment(args: DataArgs) -> Result<(), AppError> {
    let config = load_config(args.data_dir)?;
    let dataset = load_dataset(&config)?;
    let view = dataset.assessment.view()?;
    print!("{}", render_assessment(&view));
    Ok(())
}

pub(crate) fn run_project(args: ProjectArgs) -> Result<(), AppError> {
    let config = load_config(args.data.data_dir)?;
    let dataset = load_dataset(&config)?;

    if args.list || args.events.is_empty() {
        print!("{}", render_event_list(&dataset.scenarios, args.domain));
        return Ok(());
    }

    let events = dataset
        .resolve_events(&args.events)
        .map_err(|id| AppError::BadRequest(format!("unknown scenario event '{id}'")))?;
    let result = project(&dataset.baseline, &events)?;
    print!("{}", render_projection(&events, &result)?);
    Ok(())
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = load_config(args.data.data_dir)?;
    let evaluator = AnthropicEvaluator::new(config.evaluator.clone())?;
    let evaluation = evaluator.evaluate(&args.description).await?;
    print!("{}", render_evaluation(&evaluation));

    if args.apply {
        let dataset = load_dataset(&config)?;
        let event = ImpactEvent::custom(event_label(&args.description), evaluation.impacts);
        let events = [event];
        let result = project(&dataset.baseline, &events)?;
        print!("\n{}", render_projection(&events, &result)?);
    }
    Ok(())
}

pub(crate) fn run_history(args: HistoryArgs) -> Result<(), AppError> {
    let timeline = match args.csv {
        Some(path) => HistoryImporter::from_path(path).map_err(DatasetError::from)?,
        None => {
            let config = load_config(args.data.data_dir)?;
            load_dataset(&config)?.history
        }
    };
    print!("{}", render_history(&timeline));
    Ok(())
}

fn change_symbol(direction: ChangeDirection) -> &'static str {
    match direction {
        ChangeDirection::Up => "▲",
        ChangeDirection::Down => "▼",
        ChangeDirection::Same => "=",
    }
}

pub(crate) fn render_assessment(view: &AssessmentView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "US Political Risk Assessment ({}, as of {})",
        view.assessment_period, view.assessment_date
    );
    let _ = writeln!(
        out,
        "Overall risk: {} ({})",
        view.overall_score,
        view.risk_level.label()
    );

    for domain in &view.domains {
        let _ = writeln!(
            out,
            "\n{}: {:.2} ({})",
            domain.label,
            domain.score.value(),
            domain.risk_level.label()
        );
        for category in &domain.categories {
            let _ = writeln!(
                out,
                "- {:<28} {:>4} {} {:<9} tier {}",
                category.label,
                category.score.to_string(),
                category.trend.symbol(),
                category.risk_level.label(),
                category.rubric_tier.label()
            );
        }
    }

    let ranked = view.ranked_categories();
    if let Some(top) = ranked.first() {
        let _ = writeln!(out, "\nHighest risk: {} ({})", top.label, top.score);
        for finding in &top.key_findings {
            let _ = writeln!(out, "  * {finding}");
        }
    }
    out
}

pub(crate) fn render_event_list(library: &ScenarioLibrary, domain: Option<DomainId>) -> String {
    let mut out = String::new();
    let events: Vec<&ImpactEvent> = match domain {
        Some(domain) => library.by_domain(domain).collect(),
        None => library.events.iter().collect(),
    };
    if events.is_empty() {
        let _ = writeln!(out, "No scenario events available");
        return out;
    }

    let _ = writeln!(out, "Available scenario events");
    for event in events {
        let likelihood = event
            .likelihood
            .and_then(|likelihood| library.likelihood_descriptions.get(&likelihood))
            .map(|text| format!(" [{text}]"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- {} | {} | net {:+.1}{}",
            event.id,
            event.label,
            event.net_delta(),
            likelihood
        );
    }
    out
}

pub(crate) fn render_projection(
    events: &[ImpactEvent],
    result: &ProjectionResult,
) -> Result<String, AppError> {
    let mut out = String::new();
    let _ = writeln!(out, "Scenario projection");
    for event in events {
        let _ = writeln!(out, "- {}", event.label);
        for impact in &event.impacts {
            let _ = writeln!(
                out,
                "    {} {:+.1}: {}",
                impact.category.label(),
                impact.delta,
                impact.reason
            );
        }
    }

    let _ = writeln!(
        out,
        "\n{:<18} {:>8} {:>10} {:>8}  level",
        "", "current", "projected", "change"
    );
    for row in result.comparison()? {
        let _ = writeln!(
            out,
            "{:<18} {:>8.2} {:>10.2} {:>+8.2}  {}",
            row.label,
            row.current,
            row.projected,
            row.change,
            row.projected_level.label()
        );
    }
    Ok(out)
}

pub(crate) fn render_evaluation(evaluation: &ImpactEvaluation) -> String {
    let mut out = String::new();
    if !evaluation.summary.is_empty() {
        let _ = writeln!(out, "{}", evaluation.summary);
    }
    let _ = writeln!(out, "Estimated impacts");
    for impact in &evaluation.impacts {
        let _ = writeln!(
            out,
            "- {} {:+.1}: {}",
            impact.category.label(),
            impact.delta,
            impact.reason
        );
    }
    if evaluation.dropped > 0 {
        let _ = writeln!(out, "({} unusable entries ignored)", evaluation.dropped);
    }
    out
}

pub(crate) fn render_history(timeline: &HistoryTimeline) -> String {
    let mut out = String::new();
    if timeline.is_empty() {
        let _ = writeln!(out, "No historical snapshots available");
        return out;
    }

    let _ = writeln!(out, "Assessment history");
    for (snapshot, period) in timeline.snapshots().iter().zip(timeline.period_changes()) {
        let change = period
            .overall_change
            .map(|change| format!(" {} {:.2}", change_symbol(change.direction), change.change))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- {} overall {} ({}){}",
            snapshot.date,
            snapshot.overall_score,
            snapshot.risk_level.label(),
            change
        );
        for movement in &period.category_changes {
            let _ = writeln!(
                out,
                "    {}: {:.1} -> {:.1}",
                movement.category.label(),
                movement.from,
                movement.to
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use political_risk::framework::evaluation::parse_impact_response;
    use political_risk::framework::FrameworkDataset;

    fn dataset() -> FrameworkDataset {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data");
        FrameworkDataset::from_dir(dir).expect("bundled dataset loads")
    }

    #[test]
    fn assessment_report_lists_every_domain() {
        let view = dataset().assessment.view().expect("view builds");
        let report = render_assessment(&view);
        assert!(report.contains("Overall risk: 7.1 (High)"));
        assert!(report.contains("Rule of Law"));
        assert!(report.contains("Highest risk:"));
    }

    #[test]
    fn projection_report_shows_comparison_rows() {
        let dataset = dataset();
        let events = dataset
            .resolve_events(&["press-shield-law".to_string()])
            .expect("known event");
        let result = project(&dataset.baseline, &events).expect("projection");
        let report = render_projection(&events, &result).expect("renders");

        assert!(report.contains("Federal press shield law enacted"));
        assert!(report.contains("Overall"));
        assert!(report.contains("-0.50"));
    }

    #[test]
    fn event_list_can_be_narrowed_to_a_domain() {
        let dataset = dataset();
        let all = render_event_list(&dataset.scenarios, None);
        assert!(all.contains("court-defiance"));

        let economic =
            render_event_list(&dataset.scenarios, Some(DomainId::OperatingEconomic));
        assert!(economic.contains("tariff-escalation"));
        assert!(!economic.contains("court-defiance"));
        assert!(economic.contains("[Expected within the next 12 months]"));
    }

    #[test]
    fn evaluation_report_mentions_dropped_entries() {
        let evaluation = parse_impact_response(
            r#"{"impacts":[{"category":"elections","delta":2,"reason":"x"},{"category":"nope","delta":1,"reason":"y"}],"summary":"s"}"#,
        )
        .expect("parses");
        let report = render_evaluation(&evaluation);
        assert!(report.contains("+2.0"));
        assert!(report.contains("1 unusable entries ignored"));
    }

    #[test]
    fn history_report_marks_first_snapshot_without_change() {
        let report = render_history(&dataset().history);
        assert!(report.contains("2024-12-31 overall 5.3 (Elevated)\n"));
        assert!(report.contains("▲ 1.00"));
    }
}
