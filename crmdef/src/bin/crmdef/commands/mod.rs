pub mod apply;
pub mod fields;
pub mod objects;
pub mod records;
pub mod shell;
pub mod validate;

use anyhow::Result;
use clap::Subcommand;
use crmdef::MetadataRegistry;

use crate::output::OutputManager;

use apply::ApplyArgs;
use fields::FieldCommands;
use objects::ObjectCommands;
use records::RecordCommands;
use validate::ValidateCommands;

/// Commands that operate on a session registry. Shared by the command line
/// and the interactive shell.
#[derive(Subcommand)]
pub enum RegistryCommands {
    /// List, inspect and change objects
    #[command(subcommand)]
    Objects(ObjectCommands),

    /// List, inspect and change fields of an object
    #[command(subcommand)]
    Fields(FieldCommands),

    /// Show lookup and master-detail relationships of an object
    Relationships {
        /// Object API name
        object: String,
    },

    /// List and change records stored against an object
    #[command(subcommand)]
    Records(RecordCommands),

    /// Check names and definitions without changing anything
    #[command(subcommand)]
    Validate(ValidateCommands),

    /// Apply a changeset file (JSON or TOML)
    Apply(ApplyArgs),
}

pub fn execute(command: RegistryCommands, registry: &mut MetadataRegistry, output: &OutputManager) -> Result<()> {
    match command {
        RegistryCommands::Objects(cmd) => objects::handle_object_commands(cmd, registry, output),
        RegistryCommands::Fields(cmd) => fields::handle_field_commands(cmd, registry, output),
        RegistryCommands::Relationships { object } => objects::handle_relationships(registry, &object, output),
        RegistryCommands::Records(cmd) => records::handle_record_commands(cmd, registry, output),
        RegistryCommands::Validate(cmd) => validate::handle_validate_commands(cmd, output),
        RegistryCommands::Apply(args) => apply::handle_apply(args, registry, output),
    }
}
