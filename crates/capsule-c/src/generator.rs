//! Per-module generation pipeline
//!
//! source files -> [`extract`] -> [`CapsuleAssembler`] -> header + export
//! text -> atomic writes. Within a module everything is sequential, since
//! group order depends on file order. Separate modules share nothing and
//! may run in parallel.

use crate::assembler::CapsuleAssembler;
use crate::emit::{ExportEmitter, HeaderEmitter};
use crate::extractor::extract;
use crate::writer::{is_up_to_date, write_atomic};
use capsule_api::{
    CapsuleEmitter, CapsuleError, CapsuleResult, GenerationMetrics, GeneratorConfig,
    ModuleCapsule, ModulePlan,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do with rendered artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Write artifacts to disk
    #[default]
    Write,
    /// Compare with the files on disk and report drift, writing nothing
    Check,
}

/// Both artifacts of one module, fully rendered
#[derive(Debug, Clone)]
pub struct RenderedCapsule {
    pub capsule: ModuleCapsule,
    pub header: String,
    pub export: String,
    /// Number of source files scanned
    pub files_scanned: usize,
}

/// Result of rendering one module
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// At least one function exported
    Rendered(RenderedCapsule),
    /// No markers in any scanned file
    Empty { files_scanned: usize },
}

/// Result of generating one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    /// Artifacts written (or verified in check mode)
    Generated { header: PathBuf, export: PathBuf },
    /// No exported functions; nothing written
    Skipped,
}

/// Per-module summary
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub module: String,
    pub outcome: ModuleOutcome,
    pub files_scanned: usize,
    pub groups: usize,
    pub functions: usize,
}

/// Result of a multi-module run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub metrics: GenerationMetrics,
    pub reports: Vec<ModuleReport>,
    /// Failed modules, by configured path
    pub failures: Vec<(String, CapsuleError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.metrics.is_success()
    }

    fn record(&mut self, module: &str, result: CapsuleResult<ModuleReport>) {
        self.metrics.modules_attempted += 1;
        match result {
            Ok(report) => {
                match report.outcome {
                    ModuleOutcome::Generated { .. } => self.metrics.modules_generated += 1,
                    ModuleOutcome::Skipped => self.metrics.modules_skipped += 1,
                }
                self.metrics.files_scanned += report.files_scanned;
                self.metrics.groups += report.groups;
                self.metrics.functions += report.functions;
                self.reports.push(report);
            }
            Err(e) => {
                self.metrics.modules_failed += 1;
                self.failures.push((module.to_string(), e));
            }
        }
    }
}

/// Generates capsule artifacts for modules
#[derive(Debug, Clone, Default)]
pub struct CapsuleGenerator {
    config: GeneratorConfig,
    mode: WriteMode,
}

impl CapsuleGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            mode: WriteMode::Write,
        }
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Source files for a module, in processing order.
    ///
    /// Without configured sources, every `*.c` file directly inside the
    /// module directory is used, sorted by file name.
    pub fn resolve_sources(&self, plan: &ModulePlan) -> CapsuleResult<Vec<PathBuf>> {
        if !plan.dir.is_dir() {
            return Err(CapsuleError::ModuleNotFound(plan.dir.clone()));
        }

        if let Some(sources) = &plan.sources {
            return Ok(sources.iter().map(|s| plan.dir.join(s)).collect());
        }

        let entries = fs::read_dir(&plan.dir).map_err(|e| CapsuleError::io(&plan.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CapsuleError::io(&plan.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "c") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Render both artifacts in memory without touching the outputs.
    pub fn render(&self, plan: &ModulePlan) -> CapsuleResult<RenderOutcome> {
        let sources = self.resolve_sources(plan)?;

        let mut assembler = CapsuleAssembler::new(plan.name.as_str());
        for path in &sources {
            let source = read(path)?;
            let extraction = extract(&source, path, &self.config)?;
            debug!(
                "{}: {} markers in {}",
                plan.display,
                extraction.marker_count(),
                path.display()
            );
            assembler.add_file(extraction);
        }

        let files_scanned = assembler.file_count();
        let capsule = assembler.finish()?;
        if capsule.is_empty() {
            return Ok(RenderOutcome::Empty { files_scanned });
        }

        let extensions = plan
            .extend
            .iter()
            .map(|p| read(p))
            .collect::<CapsuleResult<Vec<_>>>()?;

        let header = HeaderEmitter::new(self.config.guard_prefix.as_str())
            .with_include(plan.include.clone())
            .with_extensions(extensions);
        let export = ExportEmitter::new();

        Ok(RenderOutcome::Rendered(RenderedCapsule {
            header: emit(&header, &capsule, plan)?,
            export: emit(&export, &capsule, plan)?,
            capsule,
            files_scanned,
        }))
    }

    /// Generate (or check) one module.
    pub fn generate(&self, plan: &ModulePlan) -> CapsuleResult<ModuleReport> {
        info!("Generating capsule for {}", plan.display);

        let rendered = match self.render(plan)? {
            RenderOutcome::Rendered(rendered) => rendered,
            RenderOutcome::Empty { files_scanned } => {
                info!("{}: no exported functions, skipped", plan.display);
                return Ok(ModuleReport {
                    module: plan.display.clone(),
                    outcome: ModuleOutcome::Skipped,
                    files_scanned,
                    groups: 0,
                    functions: 0,
                });
            }
        };

        for group in &rendered.capsule.groups {
            debug!(
                "{}: {} -> {}",
                plan.display,
                group.alias(),
                group.versioned_name()
            );
        }

        for (path, contents) in [
            (&plan.output, &rendered.header),
            (&plan.export, &rendered.export),
        ] {
            match self.mode {
                WriteMode::Write => write_atomic(path, contents)?,
                WriteMode::Check => {
                    if !is_up_to_date(path, contents)? {
                        warn!("{} is out of date", path.display());
                        return Err(CapsuleError::Drift { path: path.clone() });
                    }
                }
            }
        }

        Ok(ModuleReport {
            module: plan.display.clone(),
            outcome: ModuleOutcome::Generated {
                header: plan.output.clone(),
                export: plan.export.clone(),
            },
            files_scanned: rendered.files_scanned,
            groups: rendered.capsule.groups.len(),
            functions: rendered.capsule.function_count(),
        })
    }

    /// Generate many modules.
    ///
    /// Sequential runs stop at the first failure unless `keep_going` is set.
    /// Parallel runs always process every module.
    pub fn generate_all(&self, plans: &[ModulePlan], parallel: bool, keep_going: bool) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        if parallel {
            let results: Vec<_> = plans.par_iter().map(|plan| self.generate(plan)).collect();
            for (plan, result) in plans.iter().zip(results) {
                summary.record(&plan.display, result);
            }
        } else {
            for plan in plans {
                summary.record(&plan.display, self.generate(plan));
                if !keep_going && !summary.is_success() {
                    break;
                }
            }
        }

        summary.metrics.total_time = start.elapsed();
        summary
    }
}

fn emit(
    emitter: &dyn CapsuleEmitter,
    capsule: &ModuleCapsule,
    plan: &ModulePlan,
) -> CapsuleResult<String> {
    let text = emitter.emit(capsule)?;
    debug!(
        "{}: rendered {} ({} bytes)",
        plan.display,
        emitter.artifact(),
        text.len()
    );
    Ok(text)
}

fn read(path: &Path) -> CapsuleResult<String> {
    fs::read_to_string(path).map_err(|e| CapsuleError::io(path, e))
}
