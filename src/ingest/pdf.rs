use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::Command;

/// Extract text from a PDF with the `pdftotext` system binary (poppler).
/// Page breaks come back as form feeds, which the loader uses to merge
/// pages into one document.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| anyhow!("pdftotext command failed: {} (is poppler installed?)", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("pdftotext failed: {}", stderr.trim()));
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        return Err(anyhow!("pdftotext produced no text output"));
    }

    Ok(text)
}
