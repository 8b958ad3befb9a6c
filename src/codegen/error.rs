//! Code generation error types.
//!
//! Mirrors §7's error taxonomy: a type-checker invariant failure, an
//! unsupported-but-legal construct, or a linker-relevant warning. The first
//! two are fatal and returned as `Err`; the third is pushed onto a
//! [`crate::diagnostics::DiagnosticBag`] instead (see
//! [`crate::codegen::CodegenContext::compile`]).

use crate::token::Span;

/// Distinguishes the two fatal error kinds from §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodegenErrorKind {
    /// An AST node has a shape the type checker must have rejected (e.g. a
    /// generic call with no type arguments). Always a compiler bug, never
    /// a user error.
    Internal,
    /// A legal AST node whose code path is not implemented.
    Unsupported,
}

/// An error that occurred during code generation.
#[derive(Debug)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl CodegenError {
    pub fn new(kind: CodegenErrorKind, message: impl Into<String>, span: Span) -> Self {
        CodegenError { kind, message: message.into(), span: Some(span) }
    }

    pub fn without_span(kind: CodegenErrorKind, message: impl Into<String>) -> Self {
        CodegenError { kind, message: message.into(), span: None }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        CodegenError::new(CodegenErrorKind::Internal, message, span)
    }

    pub fn internal_no_span(message: impl Into<String>) -> Self {
        CodegenError::without_span(CodegenErrorKind::Internal, message)
    }

    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        CodegenError::new(CodegenErrorKind::Unsupported, message, span)
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "{}:{}: {}", span.line, span.column, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for CodegenError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_without_span_display() {
        let err = CodegenError::internal_no_span("bad shape");
        assert_eq!(err.to_string(), "bad shape");
        assert_eq!(err.kind, CodegenErrorKind::Internal);
    }

    #[test]
    fn test_unsupported_with_span_display() {
        let err = CodegenError::unsupported("not implemented", Span::new(0, 1, 3, 7));
        assert_eq!(err.to_string(), "3:7: not implemented");
        assert_eq!(err.kind, CodegenErrorKind::Unsupported);
    }
}
