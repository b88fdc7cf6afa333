//! display::writer
//!
//! A display surface backed by any `io::Write`, used by the CLI to emit
//! scripts on stdout.

use std::io::Write;
use std::sync::Mutex;

use super::traits::{DisplayError, DisplayOutput, DisplaySurface};

/// How outputs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// The script text, followed by a newline.
    #[default]
    Raw,
    /// One Jupyter `display_data` content object per line.
    Mime,
}

/// Display surface writing to `W`.
#[derive(Debug)]
pub struct WriterDisplay<W: Write + Send> {
    writer: Mutex<W>,
    format: OutputFormat,
}

impl<W: Write + Send> WriterDisplay<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl WriterDisplay<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write + Send> DisplaySurface for WriterDisplay<W> {
    fn display(&self, output: DisplayOutput) -> Result<(), DisplayError> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        match self.format {
            OutputFormat::Raw => {
                let content = output.content();
                writer.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    writer.write_all(b"\n")?;
                }
            }
            OutputFormat::Mime => {
                let line = serde_json::to_string(&output.to_mime_bundle())
                    .map_err(|e| DisplayError::Encode(e.to_string()))?;
                writeln!(writer, "{}", line)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}
