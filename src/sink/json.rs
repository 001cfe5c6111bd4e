//! Newline-delimited JSON frames.

use crate::render::Frame;
use crate::traits::RenderSink;
use log::warn;
use std::io::Write;

/// Writes every frame as a single line of JSON.
pub struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> RenderSink for JsonLineSink<W> {
    fn render(&mut self, frame: &Frame) {
        if let Err(e) = self.write_frame(frame) {
            warn!("cannot write frame: {e}");
        }
    }
}
