//! Assembling a fragment tree into one document.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::codec::PathCodec;
use crate::config::RepoLayout;
use crate::document::{Document, Section};
use crate::error::{FragError, FragResult};
use crate::inliner::ReferenceInliner;
use crate::store::{self, FragmentStore};

/// Glob for `<language>/<encoded-path>/<verb>.<ext>` below the samples dir.
pub const CODE_SAMPLES_PATTERN: &str = "*/*/*";

/// Operation key under which code samples are attached.
pub const CODE_SAMPLES_KEY: &str = "x-code-samples";

/// Identity of one code sample file.
///
/// Ordering groups samples by operation, then by language name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleKey {
    pub path: String,
    pub verb: String,
    pub lang: String,
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.verb, self.path, self.lang)
    }
}

/// Builds a [`Document`] from the root document and fragment trees of a layout.
pub struct Assembler {
    layout: RepoLayout,
    codec: PathCodec,
}

impl Assembler {
    pub fn new(layout: RepoLayout) -> Self {
        let codec = PathCodec::new(layout.separator);
        Self { layout, codec }
    }

    pub fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    /// Read the whole tree. Nothing is written to disk.
    pub fn bundle(&self) -> FragResult<Document> {
        let main_file = self.layout.main_file_path();
        debug!("Loading root document {:?}", main_file);
        let mut doc = Document::from_value(store::read_value(&main_file)?)?;

        info!("Adding paths to spec");
        let paths = self.read_paths()?;
        self.install(&mut doc, Section::Paths, paths, self.layout.paths_dir())?;

        info!("Adding definitions to spec");
        let definitions = self.read_definitions()?;
        self.install(
            &mut doc,
            Section::Definitions,
            definitions,
            self.layout.definitions_dir(),
        )?;

        if doc.headers().is_some() {
            info!("Inlining header references");
        }
        ReferenceInliner::new(Section::Headers).apply(&mut doc)?;

        self.attach_code_samples(&mut doc)?;

        Ok(doc)
    }

    /// Path fragments keyed by decoded API path.
    pub fn read_paths(&self) -> FragResult<BTreeMap<String, Value>> {
        FragmentStore::new(self.layout.paths_dir(), &self.layout.fragment_pattern)
            .read_all(|relative| Ok(self.codec.decode(&FragmentStore::stem_key(relative)?)))
    }

    /// Definition fragments keyed by schema name.
    pub fn read_definitions(&self) -> FragResult<BTreeMap<String, Value>> {
        FragmentStore::new(self.layout.definitions_dir(), &self.layout.fragment_pattern)
            .read_all(FragmentStore::stem_key)
    }

    /// Code sample files keyed by the operation and language they belong to.
    pub fn discover_code_samples(&self) -> FragResult<BTreeMap<SampleKey, PathBuf>> {
        FragmentStore::new(self.layout.code_samples_dir(), CODE_SAMPLES_PATTERN)
            .discover(|relative| self.sample_key(relative))
    }

    fn install(
        &self,
        doc: &mut Document,
        section: Section,
        fragments: BTreeMap<String, Value>,
        dir: PathBuf,
    ) -> FragResult<()> {
        if fragments.is_empty() {
            if doc.get(section.key()).is_none() {
                doc.set_section(section, Map::new());
            }
            return Ok(());
        }

        if doc.has_entries(section) {
            return Err(FragError::InlineCollision {
                section: section.key().to_string(),
                dir,
            });
        }

        debug!("Installing {} {} fragments", fragments.len(), section.key());
        doc.set_section(section, fragments.into_iter().collect());
        Ok(())
    }

    fn attach_code_samples(&self, doc: &mut Document) -> FragResult<()> {
        let samples = self.discover_code_samples()?;
        if samples.is_empty() {
            return Ok(());
        }
        info!("Adding {} code samples to spec", samples.len());

        let mut by_operation: BTreeMap<(String, String), Vec<Value>> = BTreeMap::new();
        for (key, file) in samples {
            if doc.operation_mut(&key.path, &key.verb).is_none() {
                return Err(FragError::MissingOperation {
                    path: key.path,
                    verb: key.verb,
                    file,
                });
            }
            let source = fs::read_to_string(&file).map_err(|e| FragError::io(&file, e))?;
            by_operation
                .entry((key.path, key.verb))
                .or_default()
                .push(json!({"lang": key.lang, "source": source}));
        }

        for ((path, verb), entries) in by_operation {
            if let Some(operation) = doc.operation_mut(&path, &verb) {
                operation.insert(CODE_SAMPLES_KEY.to_string(), Value::Array(entries));
            }
        }
        Ok(())
    }

    fn sample_key(&self, relative: &Path) -> FragResult<SampleKey> {
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        match parts.as_slice() {
            [lang, encoded, _file] => Ok(SampleKey {
                path: self.codec.decode(encoded),
                verb: FragmentStore::stem_key(relative)?,
                lang: lang.to_string(),
            }),
            _ => Err(FragError::InvalidKey(relative.display().to_string())),
        }
    }
}

/// Bundle the tree described by `layout`.
pub fn bundle(layout: &RepoLayout) -> FragResult<Document> {
    Assembler::new(layout.clone()).bundle()
}
