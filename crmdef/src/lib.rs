//! crmdef core library.
//!
//! An in-memory registry of CRM object and field definitions with the
//! validation rules that keep it consistent, plus records stored against
//! those definitions, seed data and atomic changesets.
//!
//! ```
//! use crmdef::{FieldInput, FieldKind, MetadataRegistry, ObjectInput};
//!
//! let mut registry = MetadataRegistry::new();
//! registry.create_object(ObjectInput::new("Project__c", "Project").plural_label("Projects"))?;
//! registry.create_field(
//!     "Project__c",
//!     FieldInput::new("Status__c", "Status", FieldKind::picklist(["Open", "Closed"])),
//! )?;
//! assert_eq!(registry.list_fields("Project__c")?.len(), 1);
//! # Ok::<(), crmdef::RegistryError>(())
//! ```

pub mod changeset;
pub mod clock;
pub mod document;
pub mod errors;
pub mod id;
pub mod registry;
pub mod seed;
pub mod types;
pub mod validators;

pub use changeset::{Changeset, ChangesetError, ChangesetReport, Operation, StepOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::*;
pub use registry::{MetadataRegistry, Record, RecordValues, Relationship, RelationshipDirection};
pub use seed::{SeedDocument, SeedError, SeedObject, SeedSummary};
pub use types::{
    Field, FieldInput, FieldKind, FieldPatch, FieldType, MetadataObject, ObjectInput, ObjectPatch,
};
