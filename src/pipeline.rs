use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::adapter;
use crate::config::AppConfig;
use crate::diff;
use crate::filter;
use crate::hapi;
use crate::model::wobject::Wobject;
use crate::remote::RemoteService;
use crate::submit;

const PRE_REPORT_FILE: &str = "pre_report.json";
const BASE_FILE: &str = "base.hapi";
const INPUT_FILE: &str = "input.hapi";
const POST_REPORT_FILE: &str = "post_report.json";

/// The four files whose presence drives the daily state machine.
pub struct ReportPaths {
    pub dir: PathBuf,
    pub pre_report: PathBuf,
    pub base: PathBuf,
    pub input: PathBuf,
    pub post_report: PathBuf,
}

impl ReportPaths {
    pub fn new(dir: &Path) -> ReportPaths {
        ReportPaths {
            dir: dir.to_path_buf(),
            pre_report: dir.join(PRE_REPORT_FILE),
            base: dir.join(BASE_FILE),
            input: dir.join(INPUT_FILE),
            post_report: dir.join(POST_REPORT_FILE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing on disk yet: fetch the snapshot, then extract the report.
    FetchAndExtract,
    /// Snapshot present: generate base + input for editing.
    Extract,
    /// Everything but the post report present: diff and push.
    Submit,
}

/// Map file presence to a pipeline phase. Any combination outside the state
/// table is an error, never a guess.
pub fn detect_phase(paths: &ReportPaths) -> Result<Phase> {
    let pre = paths.pre_report.exists();
    let base = paths.base.exists();
    let input = paths.input.exists();

    if paths.post_report.exists() {
        bail!(
            "post report file exists, the routine already finished: {}",
            paths.dir.display()
        );
    }

    if !input {
        if !pre {
            if base {
                bail!(
                    "undefined pipeline state: base exists without a pre report in {}",
                    paths.dir.display()
                );
            }
            return Ok(Phase::FetchAndExtract);
        }
        if base {
            bail!(
                "undefined pipeline state: base exists without an input file in {}",
                paths.dir.display()
            );
        }
        return Ok(Phase::Extract);
    }

    if pre && base {
        Ok(Phase::Submit)
    } else {
        bail!(
            "undefined pipeline state: input exists but the snapshot files are incomplete in {}",
            paths.dir.display()
        );
    }
}

#[derive(Serialize)]
struct PostReport {
    submitted: Vec<String>,
    submitted_at: String,
}

pub struct DailyPipeline<'a> {
    config: &'a AppConfig,
    service: &'a dyn RemoteService,
}

impl<'a> DailyPipeline<'a> {
    pub fn new(config: &'a AppConfig, service: &'a dyn RemoteService) -> DailyPipeline<'a> {
        DailyPipeline { config, service }
    }

    /// One state-machine step: fetch+extract, extract, or submit, depending
    /// on which report files exist for today.
    pub async fn run(&self) -> Result<()> {
        let dir = self.date_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
        let paths = ReportPaths::new(&dir);

        match detect_phase(&paths)? {
            Phase::FetchAndExtract => {
                info!("starting daily routine: fetch + extract into {}", dir.display());
                self.fetch_pre_report(&paths).await?;
                self.extract(&paths)
            }
            Phase::Extract => {
                info!("starting daily routine: extract into {}", dir.display());
                self.extract(&paths)
            }
            Phase::Submit => {
                info!("starting daily routine: submit from {}", dir.display());
                self.submit(&paths).await
            }
        }
    }

    fn date_dir(&self) -> PathBuf {
        Path::new(&self.config.reports_dir)
            .join(&self.config.sprint)
            .join(Local::now().format("%Y_%m_%d").to_string())
    }

    async fn fetch_pre_report(&self, paths: &ReportPaths) -> Result<()> {
        let wits = self.service.fetch_all().await?;
        let wobjects = adapter::normalize_all(&wits)?;
        write_wobjects(&paths.pre_report, &wobjects)
    }

    fn extract(&self, paths: &ReportPaths) -> Result<()> {
        let wobjects = read_wobjects(&paths.pre_report)?;
        let relevant = filter::filter_relevant(&wobjects, &self.config.worker_id, &self.config.sprint);
        let report = filter::generate_report(&relevant, &self.config.worker_id)?;

        let text = hapi::write_reports(&[report]);
        std::fs::write(&paths.base, &text)
            .with_context(|| format!("Failed to write {}", paths.base.display()))?;
        std::fs::copy(&paths.base, &paths.input)
            .with_context(|| format!("Failed to copy base to {}", paths.input.display()))?;
        info!("wrote base and input reports, ready for editing");
        Ok(())
    }

    async fn submit(&self, paths: &ReportPaths) -> Result<()> {
        let mut input = self.read_report_wobjects(&paths.input)?;
        let base = self.read_report_wobjects(&paths.base)?;

        diff::clean_input(&mut input);
        diff::validate(&base, &input)?;
        let changed = diff::changed(&base, &input)?;
        info!("{} work objects changed", changed.len());

        let iteration_path = self.service.iteration_path(&self.config.sprint).await?;
        let requests = submit::build_requests(&changed, &self.config.area_path, &iteration_path)?;
        let submitted = submit::submit_requests(self.service, &requests).await?;

        let marker = PostReport {
            submitted,
            submitted_at: Local::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&marker)?;
        std::fs::write(&paths.post_report, json)
            .with_context(|| format!("Failed to write {}", paths.post_report.display()))?;
        Ok(())
    }

    fn read_report_wobjects(&self, path: &Path) -> Result<HashMap<String, Wobject>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let reports =
            hapi::read_reports(&text).with_context(|| format!("in {}", path.display()))?;
        diff::wobjects_from_reports(&reports, &self.config.sprint)
    }
}

/// Fetch every work item in the configured area and write the normalized
/// snapshot to `dst`.
pub async fn download_all(service: &dyn RemoteService, dst: &Path) -> Result<()> {
    let wits = service.fetch_all().await?;
    let wobjects = adapter::normalize_all(&wits)?;
    write_wobjects(dst, &wobjects)
}

fn write_wobjects(path: &Path, wobjects: &HashMap<String, Wobject>) -> Result<()> {
    let mut list: Vec<&Wobject> = wobjects.values().collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));
    let json = serde_json::to_string_pretty(&list)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote {} work objects to {}", list.len(), path.display());
    Ok(())
}

fn read_wobjects(path: &Path) -> Result<HashMap<String, Wobject>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let list: Vec<Wobject> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(list.into_iter().map(|w| (w.id.clone(), w)).collect())
}
