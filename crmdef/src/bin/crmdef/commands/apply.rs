use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use crmdef::{Changeset, ChangesetError, ChangesetReport, MetadataRegistry};

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Changesets",
    commands: &[
        "crmdef apply changes/projects.toml --dry-run   # Report what would change",
        "crmdef apply changes/projects.toml             # All operations or none",
    ],
}];

#[derive(Args)]
pub struct ApplyArgs {
    /// Changeset file (.json or .toml)
    pub file: PathBuf,

    /// Run against a copy and report without keeping the result
    #[arg(long)]
    pub dry_run: bool,
}

pub fn handle_apply(args: ApplyArgs, registry: &mut MetadataRegistry, output: &OutputManager) -> Result<()> {
    let changeset = Changeset::load(&args.file)
        .with_context(|| format!("Failed to read changeset {}", args.file.display()))?;
    if changeset.is_empty() {
        output.warning("Changeset contains no operations");
        return Ok(());
    }
    output.verbose(&format!(
        "{} operation(s) in {}",
        changeset.operations.len(),
        args.file.display()
    ));

    let result = if args.dry_run {
        registry.preview(&changeset)
    } else {
        registry.apply(&changeset)
    };

    match result {
        Ok(report) => {
            output.display(&report)?;
            if report.committed {
                output.success(&format!("Applied {} operation(s)", report.steps.len()));
            } else {
                output.info(&format!("Dry run: {} operation(s) would apply", report.steps.len()));
            }
            Ok(())
        }
        Err(err @ ChangesetError::Step { .. }) => {
            for issue in err.registry_error().map(|e| e.issues()).unwrap_or_default() {
                output.bullet(&format!("{}: {}", issue.field, issue.message));
            }
            output.warning("No operations were applied");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

impl TableDisplay for ChangesetReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Step", "Operation", "Target", "Id"]);
        for step in &self.steps {
            table.add_row(vec![
                Cell::new(step.step),
                Cell::new(step.operation),
                Cell::new(&step.target),
                Cell::new(step.id.as_deref().unwrap_or("")),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let state = if self.committed { "applied" } else { "previewed" };
        format!("{state} {} operation(s)", self.steps.len())
    }
}
