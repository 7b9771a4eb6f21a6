//! Tab-separated trace file with a header row

use crate::error::{Result, ScenarioError};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct TsvTrace {
    path: PathBuf,
    out: BufWriter<File>,
    rows: u64,
}

impl TsvTrace {
    /// Create (truncating) `path` and write the header
    pub fn create(path: impl AsRef<Path>, header: &[&str]) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| ScenarioError::io(&path, e))?;
        let mut trace = Self {
            path,
            out: BufWriter::new(file),
            rows: 0,
        };
        trace.write_line(header)?;
        Ok(trace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far (header excluded)
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write_row(&mut self, fields: &[&dyn Display]) -> Result<()> {
        self.write_line(fields)?;
        self.rows += 1;
        Ok(())
    }

    fn write_line<T: Display + ?Sized>(&mut self, fields: &[&T]) -> Result<()> {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            line.push_str(&field.to_string());
        }
        writeln!(self.out, "{}", line).map_err(|e| ScenarioError::io(&self.path, e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| ScenarioError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        let mut trace = TsvTrace::create(&path, &["Time", "CC", "Packet size"]).unwrap();
        trace.write_row(&[&0.5, &1u8, &107u32]).unwrap();
        trace.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Time\tCC\tPacket size\n0.5\t1\t107\n");
        assert_eq!(trace.rows(), 1);
    }
}
