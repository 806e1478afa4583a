//! Indented text accumulation for the emitted VHDL unit.

/// An output buffer with an explicit indentation level (4 spaces per step).
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    buf: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increases the indentation level by one step.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases the indentation level by one step.
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Writes one line at the current indentation level.
    pub fn line(&mut self, s: &str) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Writes an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Appends pre-formatted text verbatim.
    pub fn append(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the accumulated text.
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indented_lines() {
        let mut w = CodeWriter::new();
        w.line("begin");
        w.indent();
        w.line("null;");
        w.dedent();
        w.line("end;");
        assert_eq!(w.finish(), "begin\n    null;\nend;\n");
    }

    #[test]
    fn dedent_saturates() {
        let mut w = CodeWriter::new();
        w.dedent();
        w.line("x");
        assert_eq!(w.finish(), "x\n");
    }

    #[test]
    fn blank_line_has_no_indent() {
        let mut w = CodeWriter::new();
        w.indent();
        w.blank();
        assert_eq!(w.finish(), "\n");
    }
}
