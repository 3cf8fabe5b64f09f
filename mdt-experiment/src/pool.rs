use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use mdt_core::stimulus::is_supported_image;
use mdt_core::{Category, LoadError, NamingRule, StimulusFile};
use tracing::{debug, info};

/// Directory listing provider.
pub trait Filesystem {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }
}

/// Fixed listings keyed by directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    dirs: BTreeMap<PathBuf, Vec<String>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir<I, S>(mut self, dir: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirs
            .insert(dir.into(), names.into_iter().map(Into::into).collect());
        self
    }
}

impl Filesystem for MemoryFilesystem {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.dirs.get(dir).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", dir.display()))
        })
    }
}

/// Classified stimuli of one directory, sorted by name per category.
#[derive(Debug, Clone, Default)]
pub struct StimulusPool {
    dir: PathBuf,
    files: BTreeMap<Category, Vec<StimulusFile>>,
}

impl StimulusPool {
    /// Lists `dir`, keeps supported images and classifies them with `rule`.
    /// Practice images are dropped unless `include_practice`. Each
    /// `(category, needed)` in `required` must hold at least `needed` files
    /// and never fewer than one.
    pub fn load<F: Filesystem + ?Sized>(
        fs: &F,
        dir: &Path,
        rule: NamingRule,
        include_practice: bool,
        required: &[(Category, usize)],
    ) -> Result<Self, LoadError> {
        let names = fs.list(dir).map_err(|source| LoadError::MissingDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for name in names.into_iter().filter(|n| is_supported_image(n)) {
            let category = rule.classify(&name)?;
            if category == Category::Practice && !include_practice {
                continue;
            }
            files.push(StimulusFile::new(name, category));
        }

        let pool = Self::from_files(dir, files);
        for &(category, needed) in required {
            let needed = needed.max(1);
            let found = pool.count(category);
            if found < needed {
                return Err(LoadError::Insufficient {
                    path: dir.to_path_buf(),
                    category,
                    needed,
                    found,
                });
            }
        }

        info!(
            dir = %dir.display(),
            targets = pool.count(Category::Target),
            lure_high = pool.count(Category::LureHigh),
            lure_low = pool.count(Category::LureLow),
            singles = pool.count(Category::Single),
            practice = pool.count(Category::Practice),
            "stimulus pool loaded"
        );
        Ok(pool)
    }

    pub fn from_files(dir: impl Into<PathBuf>, files: impl IntoIterator<Item = StimulusFile>) -> Self {
        let mut by_category: BTreeMap<Category, Vec<StimulusFile>> = BTreeMap::new();
        for file in files {
            by_category.entry(file.category()).or_default().push(file);
        }
        for list in by_category.values_mut() {
            list.sort();
            list.dedup();
        }
        let dir = dir.into();
        debug!(dir = %dir.display(), categories = by_category.len(), "pool built");
        Self {
            dir,
            files: by_category,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, category: Category) -> &[StimulusFile] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, category: Category) -> usize {
        self.get(category).len()
    }
}
