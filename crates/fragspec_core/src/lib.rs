//! # fragspec_core
//!
//! Bundling and syncing of API specifications kept as fragment trees.
//!
//! A repository keeps one file per API path, one per schema definition and
//! one per code sample next to a root document. This crate assembles such a
//! tree into a single document and splits a single document back into a tree.
//!
//! ## Layout
//!
//! Relative to a base directory (see [`RepoLayout`]):
//! - `swagger.yaml` - root document
//! - `paths/<encoded-path>.yaml` - one path item, `/users/{id}` is `users@{id}`
//! - `definitions/<Name>.yaml` - one schema
//! - `code_samples/<language>/<encoded-path>/<verb>.<ext>` - one sample
//!
//! ## Example
//!
//! ```rust,no_run
//! use fragspec_core::{bundle, sync, Format, RepoLayout};
//!
//! let layout = RepoLayout::load("spec").unwrap();
//!
//! // Assemble the tree into one document
//! let doc = bundle(&layout).unwrap();
//! println!("{}", doc.render(Format::Yaml).unwrap());
//!
//! // Write an edited document back as fragments
//! sync(&layout, &doc).unwrap();
//! ```

pub mod bundle;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod inliner;
pub mod serializer;
pub mod store;
pub mod sync;
pub mod validator;

pub use bundle::{bundle, Assembler, SampleKey, CODE_SAMPLES_KEY};
pub use codec::PathCodec;
pub use config::{RepoLayout, CONFIG_FILE};
pub use document::{Document, Section};
pub use error::{FragError, FragResult};
pub use inliner::ReferenceInliner;
pub use serializer::{parse, stringify, Format};
pub use store::{FragmentStore, ReconcilePlan};
pub use sync::{sync, Disassembler, SyncReport};
pub use validator::{SpecValidator, StructuralValidator, ValidationIssue, ValidationReport};
