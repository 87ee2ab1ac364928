//! Export and import commands.

use filecab_core::{Format, RecordStore, RestoreReport, Snapshot};
use std::error::Error;
use std::path::Path;

/// Runs the export command.
pub fn export(store: &dyn RecordStore, format: Format, file: &Path) -> Result<(), Box<dyn Error>> {
    let snapshot = store.make_snapshot()?;
    snapshot.export_to_path(file, format)?;
    println!(
        "{} records were exported to {}.",
        snapshot.len(),
        file.display()
    );
    Ok(())
}

/// Runs the import command.
pub fn import(store: &mut dyn RecordStore, format: Format, file: &Path) -> Result<(), Box<dyn Error>> {
    let report = import_file(store, format, file)?;
    println!(
        "{} records were imported from {} ({} replaced, {} skipped).",
        report.restored(),
        file.display(),
        report.replaced,
        report.skipped
    );
    Ok(())
}

/// Loads `file` and restores it into `store`.
///
/// Rows the loader rejects count as skipped alongside records the store
/// rejects on restore.
pub fn import_file(
    store: &mut dyn RecordStore,
    format: Format,
    file: &Path,
) -> Result<RestoreReport, Box<dyn Error>> {
    if !file.exists() {
        return Err(format!("Import file {} not found", file.display()).into());
    }

    let (snapshot, loaded) = Snapshot::import_from_path(file, format, store.validator())?;
    let mut report = store.restore(&snapshot)?;
    report.skipped += loaded.skipped;
    Ok(report)
}
