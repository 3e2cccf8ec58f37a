//! Splitting a document back into a fragment tree.

use serde_json::{Map, Value};
use tracing::info;

use crate::codec::PathCodec;
use crate::config::RepoLayout;
use crate::document::{Document, Section};
use crate::error::FragResult;
use crate::serializer::Format;
use crate::store::{self, FragmentStore, ReconcilePlan};

/// What a sync changed on disk.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub paths: ReconcilePlan,
    pub definitions: ReconcilePlan,
}

/// Writes `paths` and `definitions` of a document as fragments and the rest
/// of it as the root document.
///
/// Code samples stay inside the path fragments they belong to and header
/// references are not re-derived.
pub struct Disassembler {
    layout: RepoLayout,
    codec: PathCodec,
}

impl Disassembler {
    pub fn new(layout: RepoLayout) -> Self {
        let codec = PathCodec::new(layout.separator);
        Self { layout, codec }
    }

    /// Parse `text` as JSON or YAML and sync it.
    pub fn sync_text(&self, text: &str) -> FragResult<SyncReport> {
        self.sync(&Document::parse(text)?)
    }

    pub fn sync(&self, doc: &Document) -> FragResult<SyncReport> {
        let mut rest = doc.clone();
        let paths = rest.take_section(Section::Paths)?;
        let definitions = rest.take_section(Section::Definitions)?;

        // Encode every key up front so an unrepresentable path aborts the
        // sync before anything is written.
        let encoded_paths = paths
            .into_iter()
            .map(|(path, item)| -> FragResult<(String, Value)> {
                Ok((self.codec.encode(&path)?, item))
            })
            .collect::<FragResult<Map<String, Value>>>()?;

        info!("Syncing {} paths", encoded_paths.len());
        let paths = FragmentStore::new(self.layout.paths_dir(), &self.layout.fragment_pattern)
            .reconcile(&encoded_paths)?;

        info!("Syncing {} definitions", definitions.len());
        let definitions =
            FragmentStore::new(self.layout.definitions_dir(), &self.layout.fragment_pattern)
                .reconcile(&definitions)?;

        let main_file = self.layout.main_file_path();
        store::write_value(&main_file, &rest.into_value(), Format::for_path(&main_file))?;
        info!("Wrote root document {:?}", main_file);

        Ok(SyncReport { paths, definitions })
    }
}

/// Sync `doc` into the tree described by `layout`.
pub fn sync(layout: &RepoLayout, doc: &Document) -> FragResult<SyncReport> {
    Disassembler::new(layout.clone()).sync(doc)
}
