//! Append-only text streams for emitted IR (§9 REDESIGN FLAGS).
//!
//! The teacher's codegen builds output by repeated `String` concatenation.
//! Emitting a module's worth of IR that way means repeated reallocation as
//! the accumulated string grows. Three [`std::fmt::Write`] sinks — one for
//! the prelude (type/global declarations, runtime symbol declarations,
//! derived-method bodies), one for the body (function definitions), and one
//! for the footer (debug metadata, attribute groups) — let every emitter
//! write with `writeln!`/`write!` directly, and the streams are
//! concatenated once at the end of compilation.

use std::fmt::{self, Write as _};

/// One append-only output stream, indented the way the teacher's emitted
/// IR is: four spaces per level, headers and labels at column 0.
#[derive(Debug, Default, Clone)]
pub struct IrBuffer {
    text: String,
}

impl IrBuffer {
    pub fn new() -> Self {
        IrBuffer::default()
    }

    /// Appends a line at column 0 (module-level declarations, labels).
    pub fn line(&mut self, s: impl AsRef<str>) {
        self.text.push_str(s.as_ref());
        self.text.push('\n');
    }

    /// Appends a line indented one level (instructions inside a function).
    pub fn instr(&mut self, s: impl AsRef<str>) {
        self.text.push_str("    ");
        self.text.push_str(s.as_ref());
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Write for IrBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.text.write_str(s)
    }
}

/// The streams a [`crate::codegen::CodegenContext`] writes during
/// emission, concatenated prelude-then-body-then-footer at the end of
/// compilation (§6's output contract: declarations and bodies first,
/// debug metadata and attribute groups trailing).
#[derive(Debug, Default)]
pub struct OutputBuffers {
    pub prelude: IrBuffer,
    pub body: IrBuffer,
    pub footer: IrBuffer,
}

impl OutputBuffers {
    pub fn new() -> Self {
        OutputBuffers::default()
    }

    /// Concatenates `prelude`, `body`, then `footer` into the final module
    /// text, separating non-empty sections with a blank line.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.prelude.as_str().len() + self.body.as_str().len() + self.footer.as_str().len());
        out.push_str(self.prelude.as_str());
        if !self.prelude.is_empty() && !self.body.is_empty() {
            out.push('\n');
        }
        out.push_str(self.body.as_str());
        if !self.footer.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(self.footer.as_str());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_instr_indentation() {
        let mut buf = IrBuffer::new();
        buf.line("define i32 @f() {");
        buf.instr("ret i32 0");
        buf.line("}");
        assert_eq!(buf.as_str(), "define i32 @f() {\n    ret i32 0\n}\n");
    }

    #[test]
    fn test_write_trait_is_usable_with_writeln() {
        let mut buf = IrBuffer::new();
        writeln!(buf, "%{} = add i32 1, 2", "r0").unwrap();
        assert_eq!(buf.as_str(), "%r0 = add i32 1, 2\n");
    }

    #[test]
    fn test_output_buffers_finish_concatenates_with_separator() {
        let mut buffers = OutputBuffers::new();
        buffers.prelude.line("%struct.P = type { i32 }");
        buffers.body.line("define void @main() {\n}");
        let out = buffers.finish();
        assert!(out.starts_with("%struct.P = type { i32 }\n\n"));
        assert!(out.ends_with("define void @main() {\n}\n"));
    }

    #[test]
    fn test_output_buffers_finish_appends_non_empty_footer() {
        let mut buffers = OutputBuffers::new();
        buffers.body.line("define void @main() {\n}");
        buffers.footer.line("attributes #0 = { nounwind mustprogress willreturn }");
        let out = buffers.finish();
        assert!(out.ends_with("define void @main() {\n}\nattributes #0 = { nounwind mustprogress willreturn }\n"), "{out}");
    }

    #[test]
    fn test_output_buffers_finish_empty_prelude_no_extra_blank() {
        let mut buffers = OutputBuffers::new();
        buffers.body.line("define void @main() {}");
        assert_eq!(buffers.finish(), "define void @main() {}\n");
    }
}
