//! Artifact store: lookup and removal of converted files by task id.
//!
//! Converted files live in the output directory as `<task_id>.<format>`. The
//! store never keeps an index; every lookup lists the directory.

mod store;
mod task_id;

pub use store::ArtifactStore;
pub use task_id::TaskId;
