//! Abstract syntax tree types consumed by the codegen core.
//!
//! These nodes are not produced by a parser in this crate (lexing, parsing,
//! and type checking are external collaborators — see the crate-level
//! docs); they describe the shape of the fully type-checked tree the
//! engine is handed, per §6's input contract. Tests in this crate build
//! [`Module`] values by hand, the same way the upstream checker would.

mod attributes;
mod decl;
mod expr;
mod program;
mod stmt;

#[cfg(test)]
mod tests;

pub use attributes::{Attribute, DeriveKind, Visibility, allocates, derives, extern_abi, is_should_panic, is_test, link_libs};
pub use decl::{BehaviorDecl, Decl, EnumDecl, Field, FunctionDecl, ImplDecl, Param, StructDecl, Variant};
pub use expr::{BinOp, ClosureParam, Expr, ExprKind, InterpolationPart, Pattern, UnOp, WhenArm};
pub use program::Module;
pub use stmt::{Stmt, StmtKind};
