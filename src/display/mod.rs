//! Panel output: anything that can take a rendered frame through the
//! init / display / sleep cycle of an e-paper panel.

use crate::error::{Result, StatusError};
use crate::render::Frame;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// A display that follows the e-paper refresh cycle.
pub trait Panel {
    /// Wake the panel and prepare a full refresh.
    fn init(&mut self) -> Result<()>;

    /// Push a frame to the panel.
    fn display(&mut self, frame: &Frame) -> Result<()>;

    /// Put the panel into deep sleep.
    fn sleep(&mut self) -> Result<()>;
}

/// Run one full refresh: init, display, sleep.
pub fn present(panel: &mut dyn Panel, frame: &Frame) -> Result<()> {
    panel.init()?;
    panel.display(frame)?;
    panel.sleep()?;
    Ok(())
}

/// Encode a frame as a binary PBM (P4) image. A set bit is black.
pub fn encode_pbm(frame: &Frame) -> Vec<u8> {
    let mut out = format!("P4\n{} {}\n", frame.width(), frame.height()).into_bytes();
    // Panel packing uses set bits for white; PBM uses them for black.
    out.extend(frame.to_packed_bytes().into_iter().map(|byte| !byte));
    out
}

/// Writes each frame to a PBM file.
#[derive(Debug)]
pub struct PbmPanel {
    path: PathBuf,
    awake: bool,
}

impl PbmPanel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            awake: false,
        }
    }
}

impl Panel for PbmPanel {
    fn init(&mut self) -> Result<()> {
        self.awake = true;
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<()> {
        if !self.awake {
            return Err(StatusError::display_error("display called before init"));
        }
        std::fs::write(&self.path, encode_pbm(frame))?;
        info!("Wrote frame to {}", self.path.display());
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        self.awake = false;
        Ok(())
    }
}

/// Prints each frame to a writer using half-block characters, two pixel
/// rows per text line.
pub struct TerminalPanel<W: Write> {
    out: W,
}

impl TerminalPanel<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render a frame as text, one character per pixel column.
pub fn frame_to_text(frame: &Frame) -> String {
    let mut text = String::with_capacity(((frame.width() + 1) * frame.height().div_ceil(2)) as usize);
    for y in (0..frame.height()).step_by(2) {
        for x in 0..frame.width() {
            let top = frame.is_ink(x, y);
            let bottom = frame.is_ink(x, y + 1);
            text.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        text.push('\n');
    }
    text
}

impl<W: Write> Panel for TerminalPanel<W> {
    fn init(&mut self) -> Result<()> {
        debug!("Terminal panel init");
        Ok(())
    }

    fn display(&mut self, frame: &Frame) -> Result<()> {
        let border = "─".repeat(frame.width() as usize);
        writeln!(self.out, "┌{border}┐")?;
        for line in frame_to_text(frame).lines() {
            writeln!(self.out, "│{line}│")?;
        }
        writeln!(self.out, "└{border}┘")?;
        self.out.flush()?;
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        debug!("Terminal panel sleep");
        Ok(())
    }
}

/// Where rendered frames go, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Half-block preview on stdout
    Terminal,
    /// PBM file at the given path
    Pbm(PathBuf),
}

impl FromStr for OutputTarget {
    type Err = StatusError;

    fn from_str(value: &str) -> Result<Self> {
        match value.split_once(':') {
            None if value == "terminal" => Ok(OutputTarget::Terminal),
            Some(("pbm", path)) if !path.is_empty() => Ok(OutputTarget::Pbm(PathBuf::from(path))),
            _ => Err(StatusError::config_error(format!(
                "unknown output {value:?}; use 'terminal' or 'pbm:<path>'"
            ))),
        }
    }
}

impl OutputTarget {
    /// Open the panel for this target.
    pub fn open(&self) -> Box<dyn Panel> {
        match self {
            OutputTarget::Terminal => Box::new(TerminalPanel::stdout()),
            OutputTarget::Pbm(path) => Box::new(PbmPanel::new(path.clone())),
        }
    }
}
