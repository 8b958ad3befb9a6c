use tmlc::ast::Module;
use tmlc::codegen::{CodegenContext, Options};

/// Runs the full emission pipeline over a hand-built [`Module`] and returns
/// the textual IR, panicking (with the codegen diagnostic) on failure.
pub fn compile(module: &Module) -> String {
    let mut ctx = CodegenContext::new(Options::default());
    ctx.compile(module, "test.tml").expect("codegen should succeed for a well-typed test fixture")
}
