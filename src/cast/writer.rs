use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cast::types::Document;

/// Writes documents as JSON Lines to a single output
pub struct DocumentWriter<W: Write> {
    writer: W,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(writer: W) -> Self {
        DocumentWriter { writer }
    }

    pub fn write_document(&mut self, doc: &Document) -> Result<()> {
        let json = serde_json::to_string(doc).context("Failed to serialize document")?;
        writeln!(self.writer, "{}", json).context("Failed to write document")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

/// Writes documents to one `.jsonl` file per record type
pub struct MultiWriter {
    output_dir: PathBuf,
    writers: HashMap<String, File>,
}

impl MultiWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

        Ok(MultiWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            writers: HashMap::new(),
        })
    }

    pub fn write_document(&mut self, record_type: &str, doc: &Document) -> Result<()> {
        if !self.writers.contains_key(record_type) {
            let path = self.output_dir.join(format!("{}.jsonl", record_type));
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .context(format!("Failed to open file: {}", path.display()))?;
            self.writers.insert(record_type.to_string(), file);
        }

        let writer = self.writers.get_mut(record_type).unwrap();
        let json = serde_json::to_string(doc).context("Failed to serialize document")?;
        writeln!(writer, "{}", json).context("Failed to write document")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush().context("Failed to flush writer")?;
        }
        Ok(())
    }
}
