use crate::analyzer::extract::extract_file;
use crate::analyzer::metadata::{relative_key, ComponentReflectionInfo};
use crate::cache::ReflectionCache;
use crate::error::PipelineError;
use crate::generator::{Generator, GeneratorConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything one invocation saw and produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_files: Vec<PathBuf>,
    pub changed_files: Vec<PathBuf>,
    /// Changed files that could not be read, tokenized or parsed.
    pub failed_files: Vec<PathBuf>,
    pub reused_components: usize,
    pub components: Vec<ComponentReflectionInfo>,
    pub artifact: Option<PathBuf>,
    pub cache_written: bool,
}

fn resolve_dir(path: &Path) -> Result<PathBuf, PipelineError> {
    if !path.is_dir() {
        return Err(PipelineError::MissingDirectory(path.to_path_buf()));
    }
    path.canonicalize().map_err(|source| PipelineError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

/// Enumerate, diff against the cache, re-parse changed files and generate.
/// Per-file failures are logged and leave that file out of the output.
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    config: &GeneratorConfig,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    let source_root = resolve_dir(source_dir)?;
    let output_dir = resolve_dir(output_dir)?;

    let cache = ReflectionCache::new(
        output_dir.join(&config.cache_file_name),
        &config.cache_version,
    );
    let scan = cache.load_unchanged(&source_root, &config.extensions);

    let reused_components = scan.reused.len();
    let mut components = scan.reused;
    let mut failed_files = Vec::new();
    for file in &scan.changed {
        info!("Compiling {}", relative_key(file, &source_root));
        match extract_file(file) {
            Ok(found) => components.extend(found),
            Err(err) => {
                error!("{}", err);
                failed_files.push(file.clone());
            }
        }
    }
    info!(
        "{} of {} files changed, {} components reflected",
        scan.changed.len(),
        scan.source_files.len(),
        components.len()
    );

    // stable: declaration order within a file survives
    components.sort_by(|a, b| a.filepath.cmp(&b.filepath));
    for component in &components {
        debug!("{}", component.fullname);
        for variable in &component.variables {
            debug!("\t{} {}", variable.type_name, variable.name);
        }
    }

    // Failed files stay out of the snapshot so the next run retries them.
    let cacheable: Vec<PathBuf> = scan
        .source_files
        .iter()
        .filter(|f| !failed_files.contains(*f))
        .cloned()
        .collect();
    let outcome = Generator::new(config).generate(&components, &cacheable, &source_root, &output_dir);

    info!("Finished in {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(RunSummary {
        source_files: scan.source_files,
        changed_files: scan.changed,
        failed_files,
        reused_components,
        components,
        artifact: outcome.artifact,
        cache_written: outcome.cache_written,
    })
}
