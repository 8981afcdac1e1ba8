use metrics_exporter_prometheus::PrometheusHandle;
use political_risk::config::AppConfig;
use political_risk::error::AppError;
use political_risk::framework::{DomainId, FrameworkDataset};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) dataset: Arc<FrameworkDataset>,
}

/// Load configuration, letting an explicit `--data-dir` win over `APP_DATA_DIR`.
pub(crate) fn load_config(data_dir: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.data.dir = dir;
    }
    Ok(config)
}

pub(crate) fn load_dataset(config: &AppConfig) -> Result<FrameworkDataset, AppError> {
    Ok(FrameworkDataset::from_dir(&config.data.dir)?)
}

pub(crate) fn parse_domain(raw: &str) -> Result<DomainId, String> {
    raw.trim().parse().map_err(|err| format!("{err}"))
}

/// Shorten free text to a single-line event label.
pub(crate) fn event_label(description: &str) -> String {
    const MAX_CHARS: usize = 60;
    let line = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= MAX_CHARS {
        return line;
    }
    let truncated: String = line.chars().take(MAX_CHARS - 3).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_labels_are_single_line_and_bounded() {
        assert_eq!(event_label("  Court\n blocks  order "), "Court blocks order");

        let long = "word ".repeat(40);
        let label = event_label(&long);
        assert!(label.ends_with("..."));
        assert!(label.chars().count() <= 60);
    }

    #[test]
    fn domain_flags_use_kebab_case_ids() {
        assert_eq!(parse_domain("operating-economic"), Ok(DomainId::OperatingEconomic));
        assert!(parse_domain("economy").is_err());
    }
}
