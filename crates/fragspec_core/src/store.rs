//! Fragment file discovery, reading and reconciling writes.
//!
//! A fragment tree is a directory where every file matching a glob holds one
//! value, keyed by something derived from the file's path relative to the
//! directory. [`FragmentStore::reconcile`] brings such a directory in line
//! with a desired key set while leaving the file of every surviving key
//! where it is.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{FragError, FragResult};
use crate::serializer::{self, Format};

/// Extension used for newly created fragment files.
pub const FRAGMENT_EXTENSION: &str = "yaml";

// Encoded paths such as `.well-known@jwks` start with a dot, so dot-files are
// fragments like any other.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A directory of fragment files selected by a glob pattern.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    dir: PathBuf,
    pattern: String,
}

/// What [`FragmentStore::reconcile`] will do, computed before touching disk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Keys that already have a file, rewritten in place
    pub overwrite: Vec<(String, PathBuf)>,
    /// Keys without a file, written to their canonical name
    pub create: Vec<(String, PathBuf)>,
    /// Files whose key is no longer wanted
    pub delete: Vec<PathBuf>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.overwrite.is_empty() && self.create.is_empty() && self.delete.is_empty()
    }
}

impl FragmentStore {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Key scheme used by path and definition trees: the file name without
    /// its extension, whatever sub-directory the file sits in.
    pub fn stem_key(relative: &Path) -> FragResult<String> {
        relative
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| FragError::InvalidKey(relative.display().to_string()))
    }

    /// List the files of this store matching `pattern`, keyed by `key_fn`
    /// applied to each file's path relative to the store directory.
    ///
    /// A missing directory is an empty tree. Two files yielding the same key
    /// is a [`FragError::DuplicateKey`].
    pub fn discover_with<K, F>(&self, pattern: &str, key_fn: F) -> FragResult<BTreeMap<K, PathBuf>>
    where
        K: Ord + fmt::Display,
        F: Fn(&Path) -> FragResult<K>,
    {
        let matcher = Pattern::new(pattern).map_err(|e| FragError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut found: BTreeMap<K, PathBuf> = BTreeMap::new();
        if !self.dir.is_dir() {
            return Ok(found);
        }

        for entry in WalkDir::new(&self.dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.dir.clone());
                FragError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.dir).unwrap_or(path);
            if relative.to_str().is_none() {
                warn!("Skipping non UTF-8 file name {:?}", path);
                continue;
            }
            if !matcher.matches_path_with(relative, MATCH_OPTIONS) {
                continue;
            }

            let key = key_fn(relative)?;
            if let Some(first) = found.get(&key) {
                return Err(FragError::DuplicateKey {
                    key: key.to_string(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            found.insert(key, path.to_path_buf());
        }

        debug!("Discovered {} fragments in {:?}", found.len(), self.dir);
        Ok(found)
    }

    /// [`discover_with`](Self::discover_with) using the store's own pattern.
    pub fn discover<K, F>(&self, key_fn: F) -> FragResult<BTreeMap<K, PathBuf>>
    where
        K: Ord + fmt::Display,
        F: Fn(&Path) -> FragResult<K>,
    {
        self.discover_with(&self.pattern, key_fn)
    }

    /// Discover and parse every fragment.
    pub fn read_all<K, F>(&self, key_fn: F) -> FragResult<BTreeMap<K, Value>>
    where
        K: Ord + fmt::Display,
        F: Fn(&Path) -> FragResult<K>,
    {
        self.discover(key_fn)?
            .into_iter()
            .map(|(key, path)| -> FragResult<(K, Value)> {
                Ok((key, read_value(&path)?))
            })
            .collect()
    }

    /// Diff the fragments on disk against `desired` keys.
    pub fn plan<'a, I>(&self, desired: I) -> FragResult<ReconcilePlan>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut existing = self.discover(Self::stem_key)?;
        let mut plan = ReconcilePlan::default();

        for key in desired {
            validate_key(key)?;
            match existing.remove(key) {
                Some(path) => plan.overwrite.push((key.to_string(), path)),
                None => plan.create.push((key.to_string(), self.canonical_path(key))),
            }
        }
        plan.delete = existing.into_values().collect();

        Ok(plan)
    }

    /// Make the directory hold exactly the fragments in `desired`.
    ///
    /// Every write completes before the first deletion, so a failed write
    /// leaves stale files behind rather than losing content.
    pub fn reconcile(&self, desired: &Map<String, Value>) -> FragResult<ReconcilePlan> {
        let plan = self.plan(desired.keys().map(String::as_str))?;

        if !desired.is_empty() {
            fs::create_dir_all(&self.dir).map_err(|e| FragError::io(&self.dir, e))?;
        }

        for (key, path) in plan.overwrite.iter().chain(plan.create.iter()) {
            if let Some(value) = desired.get(key) {
                write_value(path, value, Format::Yaml)?;
            }
        }

        for path in &plan.delete {
            debug!("Removing stale fragment {:?}", path);
            fs::remove_file(path).map_err(|e| FragError::io(path, e))?;
        }

        info!(
            "Reconciled {:?}: {} updated, {} created, {} removed",
            self.dir,
            plan.overwrite.len(),
            plan.create.len(),
            plan.delete.len()
        );
        Ok(plan)
    }

    fn canonical_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, FRAGMENT_EXTENSION))
    }
}

/// Keys become file names, so they must be a single non-empty path component.
fn validate_key(key: &str) -> FragResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(FragError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Read and parse one file.
pub fn read_value(path: &Path) -> FragResult<Value> {
    debug!("Reading {:?}", path);
    let content = fs::read_to_string(path).map_err(|e| FragError::io(path, e))?;
    serializer::parse(&content)
}

/// Render and write one file, creating parent directories as needed.
pub fn write_value(path: &Path, value: &Value, format: Format) -> FragResult<()> {
    debug!("Writing {:?}", path);
    let content = serializer::stringify(value, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FragError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| FragError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn store(dir: &Path) -> FragmentStore {
        FragmentStore::new(dir, "**/*.yaml")
    }

    fn desired(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = WalkDir::new(dir)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(dir).unwrap().display().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_discover_missing_dir() {
        let temp = tempdir().unwrap();
        let found = store(&temp.path().join("nope"))
            .discover(FragmentStore::stem_key)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_nested_and_filtered() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pets")).unwrap();
        fs::write(temp.path().join("Pet.yaml"), "type: object").unwrap();
        fs::write(temp.path().join("pets/Cat.yaml"), "type: object").unwrap();
        fs::write(temp.path().join("README.md"), "# notes").unwrap();

        let found = store(temp.path()).discover(FragmentStore::stem_key).unwrap();
        let keys: Vec<_> = found.keys().cloned().collect();
        assert_eq!(keys, vec!["Cat", "Pet"]);
    }

    #[test]
    fn test_discover_duplicate_key() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("Pet.yaml"), "type: object").unwrap();
        fs::write(temp.path().join("nested/Pet.yaml"), "type: string").unwrap();

        let err = store(temp.path())
            .discover(FragmentStore::stem_key)
            .unwrap_err();
        assert!(matches!(err, FragError::DuplicateKey { ref key, .. } if key == "Pet"));
    }

    #[test]
    fn test_read_all() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Pet.yaml"), "type: object\n").unwrap();

        let values = store(temp.path()).read_all(FragmentStore::stem_key).unwrap();
        assert_eq!(values["Pet"], json!({"type": "object"}));
    }

    #[test]
    fn test_plan_partitions_keys() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Keep.yaml"), "a: 1").unwrap();
        fs::write(temp.path().join("Drop.yaml"), "a: 1").unwrap();

        let plan = store(temp.path()).plan(["Keep", "New"]).unwrap();
        assert_eq!(plan.overwrite, vec![("Keep".to_string(), temp.path().join("Keep.yaml"))]);
        assert_eq!(plan.create, vec![("New".to_string(), temp.path().join("New.yaml"))]);
        assert_eq!(plan.delete, vec![temp.path().join("Drop.yaml")]);
    }

    #[test]
    fn test_reconcile_creates_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("a/b/definitions");

        store(&dir).reconcile(&desired(json!({"Pet": {"type": "object"}}))).unwrap();
        assert_eq!(read_value(&dir.join("Pet.yaml")).unwrap(), json!({"type": "object"}));
    }

    #[test]
    fn test_reconcile_empty_does_not_create_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("definitions");

        let plan = store(&dir).reconcile(&Map::new()).unwrap();
        assert!(plan.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_reconcile_preserves_existing_filename() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("legacy")).unwrap();
        fs::write(temp.path().join("legacy/Pet.yaml"), "type: string").unwrap();

        store(temp.path())
            .reconcile(&desired(json!({"Pet": {"type": "object"}})))
            .unwrap();

        assert_eq!(file_names(temp.path()), vec!["legacy/Pet.yaml"]);
        assert_eq!(
            read_value(&temp.path().join("legacy/Pet.yaml")).unwrap(),
            json!({"type": "object"})
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let temp = tempdir().unwrap();
        let wanted = desired(json!({"A": {"x": 1}, "B": {"y": [1, 2]}}));

        store(temp.path()).reconcile(&wanted).unwrap();
        let first = file_names(temp.path());
        let plan = store(temp.path()).reconcile(&wanted).unwrap();

        assert_eq!(file_names(temp.path()), first);
        assert!(plan.create.is_empty());
        assert!(plan.delete.is_empty());
        assert_eq!(plan.overwrite.len(), 2);
    }

    #[test]
    fn test_reconcile_deletes_only_removed_keys() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("A.yaml"), "x: 1\n").unwrap();
        fs::write(temp.path().join("B.yaml"), "y: 2\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "keep me").unwrap();

        store(temp.path()).reconcile(&desired(json!({"A": {"x": 1}}))).unwrap();

        assert_eq!(file_names(temp.path()), vec!["A.yaml", "notes.txt"]);
    }

    #[test]
    fn test_dot_files_are_fragments() {
        let temp = tempdir().unwrap();
        let wanted = desired(json!({".well-known@jwks": {"get": {}}, "users": {"get": {}}}));

        store(temp.path()).reconcile(&wanted).unwrap();
        let found = store(temp.path()).discover(FragmentStore::stem_key).unwrap();
        let keys: Vec<_> = found.keys().cloned().collect();
        assert_eq!(keys, vec![".well-known@jwks", "users"]);

        let plan = store(temp.path()).reconcile(&desired(json!({"users": {"get": {}}}))).unwrap();
        assert_eq!(plan.delete, vec![temp.path().join(".well-known@jwks.yaml")]);
        assert_eq!(file_names(temp.path()), vec!["users.yaml"]);
    }

    #[test]
    fn test_failed_write_skips_deletions() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Old.yaml"), "a: 1\n").unwrap();
        fs::create_dir_all(temp.path().join("New.yaml")).unwrap();

        let err = store(temp.path())
            .reconcile(&desired(json!({"New": {"type": "object"}})))
            .unwrap_err();

        assert!(matches!(err, FragError::Io { .. }));
        assert!(temp.path().join("Old.yaml").is_file());
    }

    #[test]
    fn test_reconcile_rejects_path_like_keys() {
        let temp = tempdir().unwrap();
        let err = store(temp.path())
            .reconcile(&desired(json!({"../escape": {}})))
            .unwrap_err();
        assert!(matches!(err, FragError::InvalidKey(_)));
        assert!(file_names(temp.path()).is_empty());
    }
}
