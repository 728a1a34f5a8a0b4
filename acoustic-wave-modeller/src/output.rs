//! Text rendering and file sinks for pressure fields.

use anyhow::{Context, Result};
use ndarray::{ArrayView2, ArrayView3, Axis};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One line per cell, `field[index] = value`, in flat index order.
pub fn format_field(field: ArrayView2<'_, f64>) -> String {
    let mut out = String::new();
    for (idx, value) in field.iter().enumerate() {
        let _ = writeln!(out, "field[{}] = {:10.5}", idx, value);
    }
    out
}

fn write_rows<W: Write>(w: &mut W, field: ArrayView2<'_, f64>) -> std::io::Result<()> {
    for row in field.rows() {
        let line = row
            .iter()
            .map(|v| format!("{:.8e}", v))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write a field as whitespace-separated text, one grid row per line.
pub fn write_field<P: AsRef<Path>>(path: P, field: ArrayView2<'_, f64>) -> Result<()> {
    let path = path.as_ref();
    let mut w = create(path)?;
    let (nz, nx) = field.dim();
    writeln!(w, "# nx = {} nz = {}", nx, nz)?;
    write_rows(&mut w, field)?;
    w.flush()?;
    Ok(())
}

/// Write every frame of a history, each preceded by a `# it = N` header.
pub fn write_history<P: AsRef<Path>>(path: P, frames: ArrayView3<'_, f64>) -> Result<()> {
    let path = path.as_ref();
    let mut w = create(path)?;
    let (nt, nz, nx) = frames.dim();
    writeln!(w, "# nt = {} nx = {} nz = {}", nt, nx, nz)?;
    for (it, frame) in frames.axis_iter(Axis(0)).enumerate() {
        writeln!(w, "# it = {}", it)?;
        write_rows(&mut w, frame)?;
    }
    w.flush()?;
    Ok(())
}
