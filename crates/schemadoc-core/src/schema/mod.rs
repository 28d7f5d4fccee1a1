//! Schema model, builder and assembler.

pub mod assembler;
pub mod builder;
pub mod extension;
pub mod model;
pub mod type_ref;

pub use assembler::{apply_extensions, BuildOptions, SchemaAssembler, SchemaFactory};
pub use builder::{DirectiveTarget, SchemaBuilder};
pub use extension::{DeclarativeExtension, ExtensionSpec, FnExtension, Hook, SchemaExtension};
pub use model::{
    ArgDef, DirectiveArgs, FieldDef, SchemaDocument, SchemaSnapshot, TypeDef, TypeKind,
};
pub use type_ref::TypeRef;
