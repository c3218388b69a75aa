use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ckan::{CkanClient, Package};
use crate::embargo::apply_embargo;
use crate::error::SubmitError;
use crate::ncbi::{SubmissionPlan, TemplateNames, WrittenFile, plan_submission, write_sra_biosample};
use crate::project::{Project, biosample_rows, sra_rows};
use crate::store::SubmissionStore;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub dry_run: bool,
    pub sra_chunk_size: usize,
    pub search_limit: u32,
    pub embargo_months: u32,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub exporter: String,
    pub dry_run: bool,
    pub packages: Vec<PackageCount>,
    pub biosample_rows: usize,
    pub sra_rows: usize,
    pub chunks: usize,
    pub existing_sample_files: usize,
    pub unmatched_biosamples: Vec<String>,
    pub files: Vec<WrittenFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageCount {
    pub package_type: String,
    pub fetched: usize,
    pub released: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: CkanClient> {
    store: SubmissionStore,
    ckan: C,
}

impl<C: CkanClient> App<C> {
    pub fn new(store: SubmissionStore, ckan: C) -> Self {
        Self { store, ckan }
    }

    pub fn export(
        &self,
        project: &dyn Project,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ExportReport, SubmitError> {
        let started = Instant::now();
        let (packages, counts) = self.fetch_packages(project, options, sink)?;

        sink.event(ProgressEvent {
            message: format!("phase=Transform; {} packages", packages.len()),
            elapsed: Some(started.elapsed()),
        });
        let biosamples = biosample_rows(project, &packages);
        let sra = sra_rows(project, &packages);
        tracing::info!(
            "{}: {} biosample rows, {} SRA rows",
            project.exporter(),
            biosamples.len(),
            sra.len()
        );

        let plan = plan_submission(&biosamples, &sra, options.sra_chunk_size);
        let names = project.template_names();
        let files = if options.dry_run {
            sink.event(ProgressEvent {
                message: "phase=Plan; dry run, nothing written".to_string(),
                elapsed: Some(started.elapsed()),
            });
            self.planned_files(&names, &plan)
        } else {
            sink.event(ProgressEvent {
                message: format!("phase=Write; {}", self.store.root()),
                elapsed: Some(started.elapsed()),
            });
            write_sra_biosample(&self.store, &names, &plan)?
        };

        sink.event(ProgressEvent {
            message: format!("phase=Done; {} files", files.len()),
            elapsed: Some(started.elapsed()),
        });

        Ok(ExportReport {
            exporter: project.exporter().to_string(),
            dry_run: options.dry_run,
            packages: counts,
            biosample_rows: biosamples.len(),
            sra_rows: sra.len(),
            chunks: plan.chunks.len(),
            existing_sample_files: plan.existing_samples.len(),
            unmatched_biosamples: plan
                .unmatched_biosamples
                .iter()
                .map(|row| row.sample_name.clone())
                .collect(),
            files,
        })
    }

    fn fetch_packages(
        &self,
        project: &dyn Project,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(Vec<Package>, Vec<PackageCount>), SubmitError> {
        let mut packages = Vec::new();
        let mut counts = Vec::new();
        for package_type in project.package_types() {
            let started = Instant::now();
            sink.event(ProgressEvent {
                message: format!("phase=Fetch; type:{package_type}"),
                elapsed: None,
            });
            let fetched = self
                .ckan
                .packages_of_type(package_type.as_str(), options.search_limit)?;
            let fetched_count = fetched.len();
            let released = if project.uses_embargo() {
                apply_embargo(fetched, options.embargo_months, options.today)
            } else {
                fetched
            };
            tracing::info!(
                "type:{package_type}: {} packages ({} after embargo)",
                fetched_count,
                released.len()
            );
            sink.event(ProgressEvent {
                message: format!("phase=Fetch; type:{package_type} done"),
                elapsed: Some(started.elapsed()),
            });
            counts.push(PackageCount {
                package_type: package_type.to_string(),
                fetched: fetched_count,
                released: released.len(),
            });
            packages.extend(released);
        }
        Ok((packages, counts))
    }

    fn planned_files(&self, names: &TemplateNames, plan: &SubmissionPlan<'_>) -> Vec<WrittenFile> {
        let mut files = Vec::new();
        for chunk in &plan.chunks {
            files.push(WrittenFile {
                kind: "biosample".to_string(),
                path: self
                    .store
                    .path_for(&names.biosample_file(chunk.number))
                    .to_string(),
                rows: chunk.biosamples.len(),
            });
            files.push(WrittenFile {
                kind: "sra".to_string(),
                path: self
                    .store
                    .path_for(&names.sra_file(chunk.number))
                    .to_string(),
                rows: chunk.sra.len(),
            });
        }
        for (index, rows) in plan.existing_samples.iter().enumerate() {
            files.push(WrittenFile {
                kind: "sra-existing-sample".to_string(),
                path: self
                    .store
                    .path_for(&names.existing_sample_sra_file(index + 1))
                    .to_string(),
                rows: rows.len(),
            });
        }
        files
    }
}
