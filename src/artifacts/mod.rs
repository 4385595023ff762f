// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-scoped artifacts and the manifest that indexes them.
//!
//! Layout inside a blob store:
//!
//! ```text
//! <pipeline>/<run id>/hml-package.json
//! <pipeline>/<run id>/artifacts/<name>.json
//! <pipeline>/<run id>/artifacts/<name>.<ext>
//! <pipeline>/<run id>/artifacts/<name>.jsonl
//! ```

mod manifest;
mod package;
mod store;

pub use manifest::ArtifactManifest;
pub use package::ArtifactPackage;
pub use store::{BlobStore, LocalBlobStore};
