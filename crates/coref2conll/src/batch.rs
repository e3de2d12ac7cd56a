use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, warn};

use crate::pipeline::Converter;

/// Files converted and skipped during a batch run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
}

impl BatchSummary {
    fn add(&mut self, other: BatchSummary) {
        self.converted += other.converted;
        self.skipped += other.skipped;
    }
}

/// Directories under `root` (itself included) that directly contain files
/// ending in `extension`, sorted.
///
/// Directories named in `dirs_to_ignore` are not returned but are still
/// searched.
pub fn find_data_dirs(
    root: &Path,
    extension: &str,
    dirs_to_ignore: &[String],
) -> Result<Vec<PathBuf>> {
    let ignore: HashSet<&str> = dirs_to_ignore.iter().map(String::as_str).collect();
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut has_data = false;
        let entries = fs::read_dir(&dir).with_context(|| format!("list {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", dir.display()))?;
            let path = entry.path();
            // Symlinked directories are not followed.
            let file_type = entry
                .file_type()
                .with_context(|| format!("inspect {}", path.display()))?;
            if file_type.is_dir() {
                stack.push(path);
            } else if has_extension(&path, extension) {
                has_data = true;
            }
        }

        let ignored = dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| ignore.contains(n));
        if has_data && !ignored {
            debug!("data directory: {}", dir.display());
            found.push(dir);
        }
    }
    found.sort();
    Ok(found)
}

/// Convert every data directory below each of `dirs`, mirroring its path
/// relative to that directory under `output_dir`.
pub fn convert_dirs(
    converter: &Converter,
    dirs: &[PathBuf],
    output_dir: &Path,
) -> Result<BatchSummary> {
    let config = converter.config();
    let mut summary = BatchSummary::default();
    for dir in dirs {
        for data_dir in find_data_dirs(dir, &config.input_extension, &config.dirs_to_ignore)? {
            let relative = data_dir.strip_prefix(dir).unwrap_or(&data_dir);
            let out = output_dir.join(relative);
            if !config.allow_overwriting && out.exists() {
                warn!(
                    "merging output converted from {} into {}",
                    data_dir.display(),
                    out.display()
                );
            } else {
                fs::create_dir_all(&out).with_context(|| format!("create {}", out.display()))?;
                info!(
                    "saving data converted from {} in {}",
                    data_dir.display(),
                    out.display()
                );
            }
            summary.add(convert_dir(converter, &data_dir, &out)?);
        }
    }
    Ok(summary)
}

/// Convert the input files directly inside `input_dir` to
/// `<stem><conll_extension>` files in `output_dir`.
pub fn convert_dir(
    converter: &Converter,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<BatchSummary> {
    let config = converter.config();
    let mut names = Vec::new();
    let entries =
        fs::read_dir(input_dir).with_context(|| format!("list {}", input_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, &config.input_extension) {
            names.push(path);
        }
    }
    names.sort();

    let mut summary = BatchSummary::default();
    for input in names {
        let Some(name) = input.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let stem = &name[..name.len() - config.input_extension.len()];
        let output = output_dir.join(format!("{stem}{}", config.conll_extension));

        if output.exists() {
            if config.allow_overwriting {
                warn!("overwriting {}", output.display());
            } else {
                bail!("will not overwrite: {}", output.display());
            }
        }

        match converter.convert_file(&input, &output) {
            Ok(_) => summary.converted += 1,
            Err(err) if config.log_on_error => {
                error!("{name} from {} is skipped: {err:#}", input_dir.display());
                summary.skipped += 1;
            }
            Err(err) => {
                return Err(err.context(format!(
                    "while processing {name} from {}",
                    input_dir.display()
                )));
            }
        }
    }
    Ok(summary)
}

/// Refuse an existing output unless overwriting is allowed, and check that a
/// missing one can be created.
pub fn check_output(output: &Path, allow_overwriting: bool, batch: bool) -> Result<()> {
    let thing = if batch { "folder" } else { "file" };
    if output.exists() {
        if !allow_overwriting {
            bail!(
                "the configuration does not allow overwriting, but the output {thing} already exists: {}",
                output.display()
            );
        }
        return Ok(());
    }

    if batch {
        fs::create_dir_all(output).with_context(|| format!("create {}", output.display()))?;
        fs::remove_dir(output).with_context(|| format!("remove {}", output.display()))?;
    } else {
        fs::File::create(output).with_context(|| format!("create {}", output.display()))?;
        fs::remove_file(output).with_context(|| format!("remove {}", output.display()))?;
    }
    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > extension.len() && n.ends_with(extension))
}
