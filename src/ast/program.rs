//! Top-level module structure.

use super::decl::Decl;

/// A single compiled module, the root node the codegen core consumes.
///
/// `path_components` mirrors the teacher's path-derived mangle prefix
/// scheme (normal path components relative to the compilation root, used
/// to build a per-module prefix for intra-module symbol names); the entry
/// module has an empty `path_components`.
#[derive(Debug, Clone)]
pub struct Module {
    pub path_components: Vec<String>,
    pub decls: Vec<Decl>,
}

impl Module {
    pub fn new(path_components: Vec<String>, decls: Vec<Decl>) -> Self {
        Module { path_components, decls }
    }

    pub fn for_testing(decls: Vec<Decl>) -> Self {
        Module::new(Vec::new(), decls)
    }
}
