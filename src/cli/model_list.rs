//! Model listing

use std::io::{self, Write};

use crate::core::catalog::ModelCatalog;

/// Print every catalog entry with its provider, marking `selected`.
pub fn list_models<W: Write>(out: &mut W, catalog: &ModelCatalog, selected: &str) -> io::Result<()> {
    let width = catalog
        .list_ids()
        .iter()
        .map(|id| id.len())
        .max()
        .unwrap_or(0);

    writeln!(out, "Available models:")?;
    for model in catalog.models() {
        let marker = if model.id == selected { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:<width$}  {} ({})",
            model.id,
            model.provider.display_name(),
            model.wire_model_name,
        )?;
    }
    Ok(())
}
