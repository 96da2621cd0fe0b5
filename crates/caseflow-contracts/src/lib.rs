// Public contracts for the Caseflow API
// This crate defines DTOs, workflow enums, and typed record metadata.
//
// The source data model kept a single polymorphic `case_event` record for
// both tasks and notifications, discriminated by a string tag; here they are
// separate DTOs. The untyped jsonb "other" blobs are promoted to the typed
// metadata structs in `meta`.

pub mod common;
pub mod decision;
pub mod document;
pub mod meta;
pub mod process;
pub mod project;
pub mod requests;
pub mod roles;
pub mod task;

pub use common::*;
pub use decision::*;
pub use document::*;
pub use meta::*;
pub use process::*;
pub use project::*;
pub use requests::*;
pub use roles::*;
pub use task::*;
