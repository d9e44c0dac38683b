//! # stratus-service
//!
//! The hierarchy coordinator: for every mutating operation it runs the
//! fixed protocol *sanitize name → resolve parent path → collision check
//! across folders and files → vault mutation → metadata write with the
//! vault-returned path*, all metadata writes inside one transaction scope
//! per operation.
//!
//! Failure semantics: a recoverable vault rejection surfaces as a request
//! error with no metadata mutation; a metadata failure after a successful
//! vault create triggers a compensating removal of the just-created
//! physical path; deletes are two-phase (rows first, subtree removal after
//! commit).

pub mod context;
pub mod file;
pub mod folder;
pub mod search;
pub mod user;

mod support;

pub use context::RequestContext;
pub use file::{FileService, Upload};
pub use folder::{FolderContents, FolderService};
pub use search::{SearchMode, SearchResults, SearchService};
pub use user::{RegisterUser, UserService};
