#![allow(clippy::option_if_let_else)]

//! # Quill Semantic Analysis
//!
//! Resolution core of the quill analyzer: given the syntax trees of a library
//! and everything it imports, it builds the element model (the symbol table),
//! binds every name to the element it denotes and computes a static type, and
//! where flow analysis allows a more precise propagated type, for every
//! expression.
//!
//! ## Architecture
//!
//! Resolution of one library cycle runs in passes:
//! 1. **Elements**: [`ElementBuilder`] creates the elements every unit
//!    declares outside of bodies.
//! 2. **Directives**: the [`LibraryResolver`] binds imports, exports and parts
//!    and builds each library's [`LibraryScope`].
//! 3. **Type names**: [`TypeResolver`] binds every type annotation and wires
//!    class hierarchies.
//! 4. **Elements and types**: one walk over every declaration binds
//!    identifiers, members and labels, creates locals, and types expressions.
//!
//! Results are side tables ([`Resolution`]) keyed by syntax node ids; the tree
//! itself is never mutated. An [`AnalysisSession`] keeps everything needed to
//! re-resolve a single declaration after an edit that keeps its shape.

pub mod context;
pub mod core_library;
pub mod db;
pub mod declaration_matcher;
pub mod element;
pub mod incremental;
pub mod inheritance;
pub mod library_resolver;
pub mod namespace;
pub mod options;
pub mod resolution;
mod resolver;
pub mod scope;
pub mod session;
pub mod subtype;
pub mod type_override;
pub mod type_resolver;
pub mod types;

pub use context::{AnalysisContext, DefaultUriResolver, UriResolver};
pub use core_library::{CoreLibrary, TypeProvider, CORE_LIBRARY_URI};
pub use db::{SemanticDatabaseImpl, SemanticDb};
pub use declaration_matcher::{DeclarationMatcher, Rebinding};
pub use element::{Element, ElementArena, ElementBuilder, ElementFlags, ElementId, ElementKind};
pub use incremental::IncrementalResolver;
pub use inheritance::InheritanceManager;
pub use library_resolver::{LibraryResolver, ResolverError, SourceProvider};
pub use options::AnalysisOptions;
pub use resolution::{DeclarationRef, Resolution, UnitResult};
pub use scope::LibraryScope;
pub use session::{AnalysisSession, AnalyzedUnit};
pub use subtype::SubtypeManager;
pub use type_override::TypeOverrideManager;
pub use type_resolver::TypeResolver;
pub use types::{FunctionType, InterfaceType, Type, TypeSystem};
