//! Rendering of a [`Bundle`] into the source document.
//!
//! The layout is fixed: a three-line header, one section per accepted file in
//! candidate order, and optionally the skip inventory grouped by category.
//! Rendering is a pure function of the bundle, so two runs over an unchanged
//! tree produce byte-identical documents.

use crate::types::{Bundle, SkipCategory};
use std::io::{self, Write};

fn inventory_title(category: SkipCategory) -> &'static str {
    match category {
        SkipCategory::Policy => "# Excluidos por política (.env, *.log, y extras):",
        SkipCategory::Binary => "# Binarios/medios:",
        SkipCategory::TooLarge => "# Demasiado grandes:",
        SkipCategory::Other => "# Otros omitidos/errores:",
    }
}

/// Streams the document into `out`.
pub fn write_document<W: Write>(
    out: &mut W,
    bundle: &Bundle,
    separator: &str,
    list_skips: bool,
) -> io::Result<()> {
    writeln!(out, "# Repositorio de fuentes")?;
    writeln!(out, "# Raíz: {}", bundle.root.display())?;
    writeln!(out, "# Archivos incluidos: {}", bundle.files.len())?;
    writeln!(out)?;

    for file in &bundle.files {
        writeln!(out, "{}", file.relative_path.display())?;
        writeln!(out, "{}", separator)?;
        out.write_all(file.content.as_bytes())?;
        if !file.content.ends_with('\n') {
            writeln!(out)?;
        }
        writeln!(out)?;
    }

    if list_skips {
        write_inventory(out, bundle)?;
    }
    Ok(())
}

fn write_inventory<W: Write>(out: &mut W, bundle: &Bundle) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "# --- Archivos omitidos (referencia) ---")?;
    for category in SkipCategory::ALL {
        let mut records = bundle.skipped_in(category).peekable();
        if records.peek().is_none() {
            continue;
        }
        writeln!(out, "{}", inventory_title(category))?;
        for record in records {
            writeln!(out, "- {} [{}]", record.path.display(), record.reason)?;
        }
    }
    Ok(())
}

/// Renders the document into a string.
pub fn render_document(bundle: &Bundle, separator: &str, list_skips: bool) -> String {
    let mut buf = Vec::with_capacity(1024);
    // Writing into a Vec cannot fail.
    let _ = write_document(&mut buf, bundle, separator, list_skips);
    String::from_utf8_lossy(&buf).into_owned()
}
