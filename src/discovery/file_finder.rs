use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A decompiled resource tree: an input root containing a `res/` directory
#[derive(Debug, Clone)]
pub struct ResourceTree {
    root: PathBuf,
    res_dir: PathBuf,
}

impl ResourceTree {
    /// Open the tree rooted at `root`; fails if there is no `res/` directory
    pub fn open(root: &Path) -> Result<Self> {
        let res_dir = root.join("res");
        if !res_dir.is_dir() {
            return Err(miette!(
                "No res/ directory found in {}",
                root.display()
            ));
        }

        Ok(Self {
            root: root.to_path_buf(),
            res_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `.xml` file directly inside a `values*` directory, sorted
    pub fn value_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for dir in subdirectories(&self.res_dir)? {
            if !dir_name(&dir).starts_with("values") {
                continue;
            }
            let entries = fs::read_dir(&dir)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to list {}", dir.display()))?;
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && is_xml(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        debug!("Found {} value files", files.len());
        Ok(files)
    }

    /// Every `.xml` file below `res/` outside the `values*` directories, sorted
    pub fn xml_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.res_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() == 1
                    && e.file_type().is_dir()
                    && e.file_name().to_string_lossy().starts_with("values"))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_xml(e.path()))
            .map(|e| e.into_path())
            .collect();

        files.sort();
        debug!("Found {} complex document candidates", files.len());
        files
    }

    /// Files that may define the document referenced as `@type/name`
    pub fn reference_candidates(&self, resource_type: &str, name: &str) -> Vec<PathBuf> {
        reference_candidates(&self.res_dir, resource_type, name)
    }

    /// Path relative to the tree root with forward slashes (`res/anim/fade.xml`)
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Candidate files for `@type/name` below `res_dir`.
///
/// A directory matches when its name is `type` or starts with `type-`
/// (configuration qualifiers); it contributes the entry named `name.xml` if
/// it has one. Entries are matched by file name, so a name can never reach
/// outside its directory.
pub fn reference_candidates(res_dir: &Path, resource_type: &str, name: &str) -> Vec<PathBuf> {
    let qualified_prefix = format!("{resource_type}-");
    let file_name = format!("{name}.xml");

    let Ok(dirs) = subdirectories(res_dir) else {
        trace!("Cannot list {}", res_dir.display());
        return Vec::new();
    };

    let mut candidates: Vec<PathBuf> = dirs
        .into_iter()
        .filter(|dir| {
            let dir_name = dir_name(dir);
            dir_name == resource_type || dir_name.starts_with(&qualified_prefix)
        })
        .filter_map(|dir| fs::read_dir(dir).ok())
        .flat_map(|entries| entries.flatten())
        .filter(|entry| entry.file_name().to_str() == Some(file_name.as_str()))
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();

    candidates.sort();
    trace!(
        "{} candidates for @{}/{}",
        candidates.len(),
        resource_type,
        name
    );
    candidates
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to list {}", dir.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_xml(path: &Path) -> bool {
    path.extension().map(|e| e == "xml").unwrap_or(false)
}
