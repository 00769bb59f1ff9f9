//! The interactive run as an explicit stage sequence.

use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{debug, info};

use kleanup_analyze::{
    GroupSummarizer, SelectionCommand, SelectionList, SelectionMode, SelectionResolver,
};
use kleanup_core::{
    parse_start_date, ExclusionMatcher, KleanupError, ScanConfig, TimeWindow, TimestampKind,
};
use kleanup_ops::{
    append_report, format_size, run_archive, ArchiveOptions, ArchivePlan, Archiver, BandScan,
    ManifestGuard, PlanBuilder, SelectedRoot, SpaceProbe,
};
use kleanup_scan::{SkipCounter, TreeAggregator};

use crate::console::Console;
use crate::render::render_list;

/// Which root list a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The priority roots, always scanned.
    Priority,
    /// The additional roots, scanned on request.
    Additional,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Additional => "additional",
        }
    }
}

/// Both time bands of one phase, with their numbered lists.
#[derive(Debug, Clone)]
pub struct PhaseScan {
    /// Which roots were scanned.
    pub phase: Phase,
    /// Files at or after the start date.
    pub since: BandScan,
    /// Files in the band preceding the start date.
    pub prior: BandScan,
    /// Numbered from 1.
    pub since_list: SelectionList,
    /// Numbered on from the end of `since_list`.
    pub prior_list: SelectionList,
}

/// A point in the run, carrying everything the next step needs.
#[derive(Debug)]
pub enum Stage {
    ScanPriority,
    ResolvePriority {
        priority: PhaseScan,
    },
    ScanAdditional {
        priority: PhaseScan,
        chosen: Vec<SelectedRoot>,
    },
    ResolveAdditional {
        priority: PhaseScan,
        additional: PhaseScan,
        chosen: Vec<SelectedRoot>,
    },
    BuildPlan {
        phases: Vec<PhaseScan>,
        chosen: Vec<SelectedRoot>,
    },
    Confirm {
        phases: Vec<PhaseScan>,
        plan: ArchivePlan,
    },
    Archive {
        phases: Vec<PhaseScan>,
        plan: ArchivePlan,
    },
}

/// How a run ended, when it ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The archive was written.
    Archived {
        archive: PathBuf,
        roots: Vec<PathBuf>,
        total_size: u64,
        files: usize,
    },
    /// The operator chose nothing, or the choice held no files.
    NothingSelected,
    /// The operator declined the free-space warning.
    Declined,
}

enum Step {
    Next(Stage),
    Done(SessionOutcome),
}

/// The start date as entered and as parsed.
struct StartDate {
    text: String,
    time: SystemTime,
}

/// One interactive run.
pub struct Session<'a> {
    config: &'a ScanConfig,
    options: &'a ArchiveOptions,
    console: &'a mut dyn Console,
    probe: &'a dyn SpaceProbe,
    archiver: &'a dyn Archiver,
    guard: ManifestGuard,
    report: Option<PathBuf>,
    exclusions: ExclusionMatcher,
    aggregator: TreeAggregator,
    summarizer: GroupSummarizer,
    skipped: SkipCounter,
}

impl<'a> Session<'a> {
    /// Create a session with injected collaborators.
    pub fn new(
        config: &'a ScanConfig,
        options: &'a ArchiveOptions,
        console: &'a mut dyn Console,
        probe: &'a dyn SpaceProbe,
        archiver: &'a dyn Archiver,
    ) -> Self {
        Self {
            config,
            options,
            console,
            probe,
            archiver,
            guard: ManifestGuard::new(),
            report: None,
            exclusions: config.exclusions(),
            aggregator: TreeAggregator::new(config),
            summarizer: GroupSummarizer::new(),
            skipped: SkipCounter::new(),
        }
    }

    /// Append an audit report to `path` after a successful archive.
    pub fn with_report(mut self, path: Option<PathBuf>) -> Self {
        self.report = path;
        self
    }

    /// Share a manifest guard with an interrupt handler.
    pub fn with_guard(mut self, guard: ManifestGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Entries the walks could not read so far.
    pub fn skipped(&self) -> &SkipCounter {
        &self.skipped
    }

    /// Ask for the start date and run every stage to the end.
    pub fn run(&mut self) -> Result<SessionOutcome, KleanupError> {
        let answer = self
            .console
            .ask("Please provide the start date of activity (mm/dd/yy): ")?;
        let start = StartDate {
            time: parse_start_date(&answer)?,
            text: answer.trim().to_string(),
        };

        let mut stage = Stage::ScanPriority;
        let outcome = loop {
            debug!(stage = stage_name(&stage), "entering stage");
            match self.advance(&start, stage)? {
                Step::Next(next) => stage = next,
                Step::Done(outcome) => break outcome,
            }
        };

        if !self.skipped.is_empty() {
            info!(skipped = self.skipped.len(), "entries skipped during the run");
        }
        Ok(outcome)
    }

    fn advance(&mut self, start: &StartDate, stage: Stage) -> Result<Step, KleanupError> {
        match stage {
            Stage::ScanPriority => {
                let priority = self.scan_phase(Phase::Priority, start)?;
                Ok(Step::Next(Stage::ResolvePriority { priority }))
            }
            Stage::ResolvePriority { priority } => {
                let chosen = self.resolve_phase(&priority)?;
                if self.wants_additional()? {
                    Ok(Step::Next(Stage::ScanAdditional { priority, chosen }))
                } else {
                    Ok(Step::Next(Stage::BuildPlan {
                        phases: vec![priority],
                        chosen,
                    }))
                }
            }
            Stage::ScanAdditional { priority, chosen } => {
                let additional = self.scan_phase(Phase::Additional, start)?;
                Ok(Step::Next(Stage::ResolveAdditional {
                    priority,
                    additional,
                    chosen,
                }))
            }
            Stage::ResolveAdditional {
                priority,
                additional,
                mut chosen,
            } => {
                chosen.extend(self.resolve_phase(&additional)?);
                Ok(Step::Next(Stage::BuildPlan {
                    phases: vec![priority, additional],
                    chosen,
                }))
            }
            Stage::BuildPlan { phases, chosen } => self.build_plan(phases, chosen),
            Stage::Confirm { phases, plan } => self.confirm(phases, plan),
            Stage::Archive { phases, plan } => self.archive(phases, plan),
        }
    }

    fn scan_phase(&mut self, phase: Phase, start: &StartDate) -> Result<PhaseScan, KleanupError> {
        let config = self.config;
        let roots = match phase {
            Phase::Priority => &config.priority_roots,
            Phase::Additional => &config.additional_roots,
        };
        let verb = match config.timestamp {
            TimestampKind::Created => "created",
            TimestampKind::Modified => "modified",
        };
        let days = config.prior_window_days;

        self.console.show(&format!(
            "Scanning {} locations for files {verb} since {}...",
            phase.label(),
            start.text
        ))?;

        let since = self.scan_band(
            roots,
            TimeWindow::since(start.time),
            format!("Directories containing files {verb} since {}:", start.text),
        );
        let prior = self.scan_band(
            roots,
            TimeWindow::prior_to(start.time, days),
            format!(
                "Directories containing files {verb} within {days} days prior to {}:",
                start.text
            ),
        );

        let since_list = SelectionList::present(&since.groups, 1);
        let prior_list = SelectionList::present(&prior.groups, since_list.next_index());

        Ok(PhaseScan {
            phase,
            since,
            prior,
            since_list,
            prior_list,
        })
    }

    fn scan_band(&self, roots: &[PathBuf], window: TimeWindow, title: String) -> BandScan {
        let records = self
            .aggregator
            .aggregate_with(roots, &window, Some(&self.skipped));
        let groups = self.summarizer.summarize(&records);
        BandScan {
            title,
            window,
            records,
            groups,
        }
    }

    fn resolve_phase(&mut self, scan: &PhaseScan) -> Result<Vec<SelectedRoot>, KleanupError> {
        for line in render_list(&scan.since.title, &scan.since_list)
            .into_iter()
            .chain(render_list(&scan.prior.title, &scan.prior_list))
        {
            self.console.show(&line)?;
        }

        if scan.since_list.is_empty() && scan.prior_list.is_empty() {
            self.console.show("No matching directories found.")?;
            return Ok(Vec::new());
        }

        let mode = SelectionMode::parse(
            &self
                .console
                .ask("\nDo you want to (S)elect or (I)gnore directories? ")?,
        )?;
        let answer = self.console.ask(&format!(
            "\nPlease enter the numbers of directories to {} (comma or space separated, \
             ALL for the first list, BOTH for both lists, NONE for nothing): ",
            mode.verb()
        ))?;
        let command = SelectionCommand::parse(&answer);

        let resolver = SelectionResolver::new([&scan.since_list, &scan.prior_list]);
        let chosen: Vec<SelectedRoot> = resolver
            .resolve(mode, &command)
            .into_iter()
            .flat_map(|entry| {
                // Each entry is sized by the band whose list showed it.
                let band = if scan.since_list.get(entry.index).is_some() {
                    &scan.since
                } else {
                    &scan.prior
                };
                SelectedRoot::from_entry(entry, band)
            })
            .collect();

        info!(
            phase = scan.phase.label(),
            mode = mode.verb(),
            chosen = chosen.len(),
            "resolved selection"
        );
        Ok(chosen)
    }

    fn wants_additional(&mut self) -> Result<bool, KleanupError> {
        if self.config.additional_roots.is_empty() {
            return Ok(false);
        }
        let roots: Vec<String> = self
            .config
            .additional_roots
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let answer = self.console.ask(&format!(
            "\nAlso scan additional locations ({})? (y/n): ",
            roots.join(", ")
        ))?;
        Ok(is_yes(&answer))
    }

    fn build_plan(
        &mut self,
        phases: Vec<PhaseScan>,
        chosen: Vec<SelectedRoot>,
    ) -> Result<Step, KleanupError> {
        if chosen.is_empty() {
            self.console.show("Nothing selected; no archive created.")?;
            return Ok(Step::Done(SessionOutcome::NothingSelected));
        }

        let plan = PlanBuilder::new(self.options, &self.exclusions, self.probe)
            .build(&chosen, Some(&self.skipped))?;

        self.console.show(&format!(
            "\nSelected {} location(s): {} accounted, {} files to archive, {} free.",
            plan.roots.len(),
            format_size(plan.total_size),
            plan.manifest.len(),
            format_size(plan.available)
        ))?;

        Ok(Step::Next(Stage::Confirm { phases, plan }))
    }

    fn confirm(&mut self, phases: Vec<PhaseScan>, plan: ArchivePlan) -> Result<Step, KleanupError> {
        if plan.needs_confirmation {
            let answer = self.console.ask(&format!(
                "Warning: Archiving will consume more than {:.0}% of free space ({}). Proceed? (y/n): ",
                self.options.warn_ratio * 100.0,
                format_size(plan.total_size)
            ))?;
            if !is_yes(&answer) {
                self.console.show("Archiving cancelled.")?;
                return Ok(Step::Done(SessionOutcome::Declined));
            }
        }
        Ok(Step::Next(Stage::Archive { phases, plan }))
    }

    fn archive(&mut self, phases: Vec<PhaseScan>, plan: ArchivePlan) -> Result<Step, KleanupError> {
        if plan.manifest.is_empty() {
            self.console
                .show("The selected directories hold no files; nothing to archive.")?;
            return Ok(Step::Done(SessionOutcome::NothingSelected));
        }

        let password = self
            .console
            .ask_secret("Please enter a password for the archive: ")?;
        run_archive(self.archiver, &plan, self.options, &password, &self.guard)?;

        if let Some(report) = &self.report {
            append_report(report, &bands_of(&phases), &plan.manifest)?;
            self.console
                .show(&format!("Report written to {}", report.display()))?;
        }

        self.console.show("Archiving completed successfully.")?;
        Ok(Step::Done(SessionOutcome::Archived {
            archive: self.options.archive_name.clone(),
            total_size: plan.total_size,
            files: plan.manifest.len(),
            roots: plan.roots,
        }))
    }
}

/// Bands in report order: each phase's since band, then its prior band.
fn bands_of(phases: &[PhaseScan]) -> Vec<&BandScan> {
    phases.iter().flat_map(|p| [&p.since, &p.prior]).collect()
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

fn stage_name(stage: &Stage) -> &'static str {
    match stage {
        Stage::ScanPriority => "scan-priority",
        Stage::ResolvePriority { .. } => "resolve-priority",
        Stage::ScanAdditional { .. } => "scan-additional",
        Stage::ResolveAdditional { .. } => "resolve-additional",
        Stage::BuildPlan { .. } => "build-plan",
        Stage::Confirm { .. } => "confirm",
        Stage::Archive { .. } => "archive",
    }
}
