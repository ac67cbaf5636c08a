//! # Library resolution
//!
//! Entry point of the analyzer. Starting from a root library the resolver
//! discovers every library reachable through `import` and `export`, groups
//! them into resolution cycles (strongly connected components of the
//! import/export graph) and resolves the cycles leaves first, so that every
//! library a cycle imports is complete before the cycle is resolved.
//!
//! Within a cycle resolution runs in phases over all of its libraries: the
//! elements of every unit are built first, then directives are bound to the
//! library elements they name, then the type-name pass runs over every unit
//! and finally the element and type pass. A directive problem is reported and
//! the directive is dropped; it never stops the rest of the cycle.

use std::collections::VecDeque;
use std::sync::Arc;

use chumsky::span::SimpleSpan;
use indexmap::IndexMap;
use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    Combinator, CompilationUnit, Directive, Expression, ExpressionKind, Identifier,
    InterpolationElement,
};
use quill_analyzer_syntax::NodeId;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::core_library::CORE_LIBRARY_URI;
use crate::element::{
    Element, ElementBuilder, ElementFlags, ElementId, ElementKind, ExportData, ImportData,
    LibraryData, NamespaceCombinator, PrefixData, UnitData,
};
use crate::options::AnalysisOptions;
use crate::resolution::UnitResult;
use crate::resolver::Resolver;
use crate::scope::LibraryScope;
use crate::session::{AnalysisSession, AnalyzedUnit};
use crate::type_resolver::TypeResolver;

/// Failures that prevent resolution from starting at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("no source exists at '{0}'")]
    UnknownSource(String),
    #[error("'{0}' is a part of another library and cannot be resolved on its own")]
    NotALibrary(String),
}

/// Where the library resolver reads sources from
pub trait SourceProvider {
    /// Syntax tree of the source at `uri`
    fn unit(&self, uri: &str) -> Option<Arc<CompilationUnit>>;

    /// Stamp of the current contents of the source at `uri`
    fn modification_stamp(&self, uri: &str) -> u64;

    /// Absolute form of `uri` as written in the source at `base`
    fn resolve_uri(&self, base: &str, uri: &str) -> Option<String>;
}

/// What the URI of an `import`, `export` or `part` directive leads to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Not a constant string, or not a URI the provider understands
    Invalid(Option<String>),
    /// Well-formed, but no source exists there
    Missing(String),
    Core,
    /// A source without a `part of` directive
    Library(String),
    /// A source with a `part of` directive
    Part(String),
}

/// A library found while walking the directive graph.
#[derive(Debug)]
struct LibrarySource {
    unit: Arc<CompilationUnit>,
    targets: FxHashMap<NodeId, Target>,
}

impl LibrarySource {
    fn target(&self, directive: NodeId) -> Option<&Target> {
        self.targets.get(&directive)
    }

    /// URIs of the libraries this one imports or exports
    fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.unit.directives.iter().filter_map(|directive| {
            match (directive, self.target(directive.id())) {
                (Directive::Import(_) | Directive::Export(_), Some(Target::Library(uri))) => {
                    Some(uri.as_str())
                }
                _ => None,
            }
        })
    }
}

/// A unit taking part in the resolution of one cycle
struct CycleUnit {
    uri: String,
    element: ElementId,
    library: ElementId,
    result: UnitResult,
}

pub struct LibraryResolver<'p, P: SourceProvider + ?Sized> {
    provider: &'p P,
    options: AnalysisOptions,
}

impl<'p, P: SourceProvider + ?Sized> LibraryResolver<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves the library at `root` together with everything it imports
    /// or exports, directly or not
    pub fn resolve(&self, root: &str) -> Result<AnalysisSession, ResolverError> {
        let _span = tracing::trace_span!("resolve_library", uri = %root).entered();
        let libraries = self.discover(root)?;
        let mut session = AnalysisSession::new(self.options);
        for cycle in resolution_cycles(&libraries) {
            self.resolve_cycle(&libraries, &cycle, &mut session);
        }
        Ok(session)
    }

    // ===== Discovery =====

    fn discover(&self, root: &str) -> Result<IndexMap<String, LibrarySource>, ResolverError> {
        let unit = self
            .provider
            .unit(root)
            .ok_or_else(|| ResolverError::UnknownSource(root.to_string()))?;
        if unit.part_of().is_some() {
            return Err(ResolverError::NotALibrary(root.to_string()));
        }

        let mut libraries = IndexMap::new();
        let mut pending = VecDeque::from([(root.to_string(), unit)]);
        while let Some((uri, unit)) = pending.pop_front() {
            if libraries.contains_key(&uri) {
                continue;
            }
            let targets: FxHashMap<NodeId, Target> = unit
                .directives
                .iter()
                .filter_map(|directive| {
                    let uri_expression = match directive {
                        Directive::Import(import) => &import.uri,
                        Directive::Export(export) => &export.uri,
                        Directive::Part(part) => &part.uri,
                        Directive::Library(_) | Directive::PartOf(_) => return None,
                    };
                    Some((directive.id(), self.target(&uri, uri_expression)))
                })
                .collect();
            let source = LibrarySource { unit, targets };
            for dependency in source.dependencies() {
                if libraries.contains_key(dependency) {
                    continue;
                }
                if let Some(unit) = self.provider.unit(dependency) {
                    pending.push_back((dependency.to_string(), unit));
                }
            }
            tracing::trace!(uri = %uri, "discovered library");
            libraries.insert(uri, source);
        }
        Ok(libraries)
    }

    fn target(&self, base: &str, uri: &Expression) -> Target {
        let Some(written) = string_value(uri) else {
            return Target::Invalid(None);
        };
        let Some(resolved) = self.provider.resolve_uri(base, &written) else {
            return Target::Invalid(Some(written));
        };
        if resolved == CORE_LIBRARY_URI {
            return Target::Core;
        }
        match self.provider.unit(&resolved) {
            None => Target::Missing(written),
            Some(unit) if unit.part_of().is_some() => Target::Part(resolved),
            Some(_) => Target::Library(resolved),
        }
    }

    // ===== Resolution of one cycle =====

    fn resolve_cycle(
        &self,
        libraries: &IndexMap<String, LibrarySource>,
        cycle: &[&str],
        session: &mut AnalysisSession,
    ) {
        let _span = tracing::trace_span!("resolve_cycle", libraries = cycle.len()).entered();

        let mut units = Vec::new();
        for uri in cycle {
            if let Some(source) = libraries.get(*uri) {
                self.build_library(uri, source, session, &mut units);
            }
        }
        for uri in cycle {
            if let (Some(source), Some(library)) = (libraries.get(*uri), session.library(uri)) {
                self.bind_directives(source, library, session, &mut units);
            }
        }

        let mut scopes: FxHashMap<ElementId, LibraryScope> = FxHashMap::default();
        for unit in &units {
            scopes
                .entry(unit.library)
                .or_insert_with(|| LibraryScope::new(&session.arena, unit.library));
        }
        self.report_duplicates(&scopes, session, &mut units);

        for unit in &mut units {
            let Some(scope) = scopes.get(&unit.library) else {
                continue;
            };
            let ast = Arc::clone(&unit.result.unit);
            TypeResolver::new(&mut session.arena, scope, unit.element, &mut unit.result)
                .resolve_headers(&ast);
        }
        for unit in &mut units {
            let Some(scope) = scopes.get(&unit.library) else {
                continue;
            };
            let ast = Arc::clone(&unit.result.unit);
            TypeResolver::new(&mut session.arena, scope, unit.element, &mut unit.result)
                .with_bodies(self.options.analyze_function_bodies)
                .resolve_members(&ast);
        }
        for unit in &mut units {
            self.report_inconsistencies(session, unit);
        }
        for unit in &mut units {
            let Some(scope) = scopes.get(&unit.library) else {
                continue;
            };
            let ast = Arc::clone(&unit.result.unit);
            Resolver::new(
                &mut session.arena,
                &mut session.inheritance,
                scope,
                unit.element,
                &mut unit.result,
            )
            .with_options(self.options)
            .resolve_unit(&ast);
        }

        for unit in units {
            session.units.insert(
                unit.uri,
                AnalyzedUnit {
                    element: unit.element,
                    library: unit.library,
                    result: unit.result,
                },
            );
        }
    }

    /// Library element, its defining unit and its parts, with the elements
    /// they declare
    fn build_library(
        &self,
        uri: &str,
        source: &LibrarySource,
        session: &mut AnalysisSession,
        units: &mut Vec<CycleUnit>,
    ) {
        let name = source
            .unit
            .library_directive()
            .map(|directive| directive.name.name.clone())
            .unwrap_or_default();
        let library = session.arena.alloc(Element::new(
            name,
            ElementKind::Library(LibraryData {
                uri: uri.to_string(),
                ..Default::default()
            }),
        ));
        session.libraries.insert(uri.to_string(), library);
        let defining_unit = self.build_unit(uri, &source.unit, library, session, units);

        let mut parts = Vec::new();
        for directive in &source.unit.directives {
            let Directive::Part(part) = directive else {
                continue;
            };
            let Some(Target::Part(part_uri)) = source.target(part.id) else {
                continue;
            };
            if session.units.contains_key(part_uri)
                || units.iter().any(|unit| &unit.uri == part_uri)
            {
                tracing::debug!(uri = %part_uri, "part already belongs to a library");
                continue;
            }
            let Some(part_unit) = self.provider.unit(part_uri) else {
                continue;
            };
            let element = self.build_unit(part_uri, &part_unit, library, session, units);
            record_declaration(session, defining_unit, part.id, element);
            parts.push(element);
        }

        if let Some(data) = session.arena[library].as_library_mut() {
            data.defining_unit = Some(defining_unit);
            data.parts = parts;
        }
    }

    fn build_unit(
        &self,
        uri: &str,
        ast: &Arc<CompilationUnit>,
        library: ElementId,
        session: &mut AnalysisSession,
        units: &mut Vec<CycleUnit>,
    ) -> ElementId {
        let element = session.arena.alloc(
            Element::new(
                uri,
                ElementKind::CompilationUnit(UnitData {
                    uri: uri.to_string(),
                    modification_stamp: self.provider.modification_stamp(uri),
                    ..Default::default()
                }),
            )
            .with_enclosing(library),
        );
        let mut result = UnitResult::new(uri, Arc::clone(ast));
        let owner = ast.id;
        for diagnostic in ElementBuilder::new(&mut session.arena, element).build(ast) {
            result.report(owner, diagnostic);
        }
        units.push(CycleUnit {
            uri: uri.to_string(),
            element,
            library,
            result,
        });
        element
    }

    /// Import, export and prefix elements of a library, and the checks on
    /// its `part` and `part of` directives
    fn bind_directives(
        &self,
        source: &LibrarySource,
        library: ElementId,
        session: &mut AnalysisSession,
        units: &mut [CycleUnit],
    ) {
        let Some(defining_unit) = session.arena[library]
            .as_library()
            .and_then(|data| data.defining_unit)
        else {
            return;
        };
        let Some(index) = units.iter().position(|unit| unit.element == defining_unit) else {
            return;
        };
        let library_name = source
            .unit
            .library_directive()
            .map(|directive| directive.name.name.clone());

        let mut imports = Vec::new();
        let mut exports = Vec::new();
        let mut prefixes: IndexMap<SmolStr, ElementId> = IndexMap::new();
        let mut explicitly_imports_core = false;
        let mut reported_missing_library_directive = false;

        for directive in &source.unit.directives {
            let owner = directive.id();
            let Some(target) = source.target(owner) else {
                continue;
            };
            let mut report = |diagnostic: Diagnostic| units[index].result.report(owner, diagnostic);
            match directive {
                Directive::Import(import) => {
                    let Some(imported_library) =
                        self.directive_library(target, &import.uri, session, &mut report, false)
                    else {
                        continue;
                    };
                    explicitly_imports_core |= matches!(target, Target::Core);
                    let element = session.arena.alloc(
                        Element::new(
                            "",
                            ElementKind::Import(ImportData {
                                uri: target_uri(target),
                                imported_library: Some(imported_library),
                                prefix: None,
                                combinators: combinators(&import.combinators),
                            }),
                        )
                        .with_enclosing(library)
                        .with_node(import.id, import.span.start),
                    );
                    if let Some(prefix) = &import.prefix {
                        let prefix_element =
                            *prefixes.entry(prefix.name.clone()).or_insert_with(|| {
                                session.arena.alloc(
                                    Element::new(
                                        prefix.name.clone(),
                                        ElementKind::Prefix(PrefixData::default()),
                                    )
                                    .with_enclosing(library)
                                    .with_node(prefix.id, prefix.span.start),
                                )
                            });
                        if let Some(ElementKind::Prefix(data)) =
                            session.arena.get_mut(prefix_element).map(|e| &mut e.kind)
                        {
                            data.imports.push(element);
                        }
                        if let Some(ElementKind::Import(data)) =
                            session.arena.get_mut(element).map(|e| &mut e.kind)
                        {
                            data.prefix = Some(prefix_element);
                        }
                    }
                    record_declaration(session, defining_unit, import.id, element);
                    imports.push(element);
                }
                Directive::Export(export) => {
                    let Some(exported_library) =
                        self.directive_library(target, &export.uri, session, &mut report, true)
                    else {
                        continue;
                    };
                    let element = session.arena.alloc(
                        Element::new(
                            "",
                            ElementKind::Export(ExportData {
                                uri: target_uri(target),
                                exported_library: Some(exported_library),
                                combinators: combinators(&export.combinators),
                            }),
                        )
                        .with_enclosing(library)
                        .with_node(export.id, export.span.start),
                    );
                    record_declaration(session, defining_unit, export.id, element);
                    exports.push(element);
                }
                Directive::Part(part) => match target {
                    Target::Invalid(written) => {
                        report(Diagnostic::invalid_uri(written.as_deref(), part.uri.span));
                    }
                    Target::Missing(written) => {
                        report(Diagnostic::uri_does_not_exist(written, part.uri.span));
                    }
                    Target::Core | Target::Library(_) => {
                        let written = string_value(&part.uri).unwrap_or_default();
                        report(Diagnostic::missing_part_of_directive(&written, part.uri.span));
                    }
                    Target::Part(part_uri) => {
                        let Some(expected) = &library_name else {
                            if !reported_missing_library_directive {
                                reported_missing_library_directive = true;
                                report(Diagnostic::missing_library_directive_with_part(part.span));
                            }
                            continue;
                        };
                        let found = self
                            .provider
                            .unit(part_uri)
                            .and_then(|unit| unit.part_of().map(|of| of.library_name.name.clone()));
                        if let Some(found) = found.filter(|found| found != expected) {
                            report(Diagnostic::part_of_different_library(
                                expected,
                                &found,
                                part.uri.span,
                            ));
                        }
                    }
                },
                Directive::Library(_) | Directive::PartOf(_) => {}
            }
        }

        if !explicitly_imports_core {
            let core = session.arena.core().library();
            let import = session.arena.alloc(
                Element::new(
                    "",
                    ElementKind::Import(ImportData {
                        uri: Some(CORE_LIBRARY_URI.to_string()),
                        imported_library: Some(core),
                        ..Default::default()
                    }),
                )
                .with_enclosing(library)
                .with_flags(ElementFlags::SYNTHETIC),
            );
            imports.push(import);
        }

        if let Some(data) = session.arena[library].as_library_mut() {
            data.imports = imports;
            data.exports = exports;
            data.prefixes = prefixes.into_values().collect();
            data.explicitly_imports_core = explicitly_imports_core;
        }
    }

    /// Library named by an import or export, reporting why there is none
    fn directive_library(
        &self,
        target: &Target,
        uri: &Expression,
        session: &AnalysisSession,
        report: &mut impl FnMut(Diagnostic),
        is_export: bool,
    ) -> Option<ElementId> {
        match target {
            Target::Invalid(written) => {
                report(Diagnostic::invalid_uri(written.as_deref(), uri.span));
                None
            }
            Target::Missing(written) => {
                report(Diagnostic::uri_does_not_exist(written, uri.span));
                None
            }
            Target::Part(part_uri) => {
                report(if is_export {
                    Diagnostic::export_of_non_library(part_uri, uri.span)
                } else {
                    Diagnostic::import_of_non_library(part_uri, uri.span)
                });
                None
            }
            Target::Core => Some(session.arena.core().library()),
            Target::Library(library_uri) => {
                let library = session.library(library_uri);
                if library.is_none() {
                    tracing::debug!(uri = %library_uri, "library was not resolved");
                }
                library
            }
        }
    }

    fn report_duplicates(
        &self,
        scopes: &FxHashMap<ElementId, LibraryScope>,
        session: &AnalysisSession,
        units: &mut [CycleUnit],
    ) {
        for scope in scopes.values() {
            for duplicate in scope.duplicates() {
                let element = &session.arena[*duplicate];
                let unit = session.arena.unit_of(*duplicate).or_else(|| {
                    session.arena[scope.library()]
                        .as_library()
                        .and_then(|data| data.defining_unit)
                });
                let Some(unit) = units.iter_mut().find(|u| Some(u.element) == unit) else {
                    continue;
                };
                let owner = unit.result.unit.id;
                unit.result.report(
                    owner,
                    Diagnostic::duplicate_definition(&element.name, name_span(element)),
                );
            }
        }
    }

    /// Classes whose interfaces disagree on a member the class chain does not
    /// settle
    fn report_inconsistencies(&self, session: &mut AnalysisSession, unit: &mut CycleUnit) {
        let Some(classes) = session.arena[unit.element]
            .as_unit()
            .map(|data| data.types.clone())
        else {
            return;
        };
        let owner = unit.result.unit.id;
        for class in classes {
            let names = session.inheritance.inconsistencies(&session.arena, class);
            let element = &session.arena[class];
            let span = name_span(element);
            for name in names {
                tracing::debug!(class = %element.name, member = %name, "inconsistent inheritance");
                unit.result.report(
                    owner,
                    Diagnostic::inconsistent_method_inheritance(&element.name, &name, span),
                );
            }
        }
    }
}

fn record_declaration(
    session: &mut AnalysisSession,
    unit: ElementId,
    node: NodeId,
    element: ElementId,
) {
    if let Some(data) = session.arena.get_mut(unit).and_then(|unit| unit.as_unit_mut()) {
        data.declarations.insert(node, element);
    }
}

fn name_span(element: &Element) -> SimpleSpan<usize> {
    SimpleSpan::from(element.offset..element.offset + element.name.len())
}

fn target_uri(target: &Target) -> Option<String> {
    match target {
        Target::Core => Some(CORE_LIBRARY_URI.to_string()),
        Target::Library(uri) | Target::Part(uri) => Some(uri.clone()),
        Target::Invalid(_) | Target::Missing(_) => None,
    }
}

fn combinators(combinators: &[Combinator]) -> Vec<NamespaceCombinator> {
    let names = |names: &[Identifier]| {
        names.iter().map(|name| name.name.clone()).collect()
    };
    combinators
        .iter()
        .map(|combinator| match combinator {
            Combinator::Show(shown) => NamespaceCombinator::Show(names(shown)),
            Combinator::Hide(hidden) => NamespaceCombinator::Hide(names(hidden)),
        })
        .collect()
}

/// Value of a string literal without interpolated expressions
pub(crate) fn string_value(expression: &Expression) -> Option<String> {
    match &expression.kind {
        ExpressionKind::SimpleString(value) => Some(value.clone()),
        ExpressionKind::AdjacentStrings(strings) => strings.iter().map(string_value).collect(),
        ExpressionKind::StringInterpolation(elements) => elements
            .iter()
            .map(|element| match element {
                InterpolationElement::Text(text) => Some(text.as_str()),
                InterpolationElement::Expression(_) => None,
            })
            .collect(),
        _ => None,
    }
}

/// Strongly connected components of the import/export graph, each listed
/// after every component it depends on
fn resolution_cycles(libraries: &IndexMap<String, LibrarySource>) -> Vec<Vec<&str>> {
    struct Tarjan<'g> {
        libraries: &'g IndexMap<String, LibrarySource>,
        index: FxHashMap<&'g str, usize>,
        low_link: FxHashMap<&'g str, usize>,
        stack: Vec<&'g str>,
        on_stack: FxHashMap<&'g str, bool>,
        components: Vec<Vec<&'g str>>,
    }

    impl<'g> Tarjan<'g> {
        fn visit(&mut self, uri: &'g str) {
            let next = self.index.len();
            self.index.insert(uri, next);
            self.low_link.insert(uri, next);
            self.stack.push(uri);
            self.on_stack.insert(uri, true);

            let libraries = self.libraries;
            if let Some(source) = libraries.get(uri) {
                for dependency in source.dependencies() {
                    let Some((dependency, _)) = libraries.get_key_value(dependency) else {
                        continue;
                    };
                    let dependency = dependency.as_str();
                    if !self.index.contains_key(dependency) {
                        self.visit(dependency);
                        let low = self.low_link[uri].min(self.low_link[dependency]);
                        self.low_link.insert(uri, low);
                    } else if self.on_stack.get(dependency).copied().unwrap_or(false) {
                        let low = self.low_link[uri].min(self.index[dependency]);
                        self.low_link.insert(uri, low);
                    }
                }
            }

            if self.low_link[uri] == self.index[uri] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.insert(member, false);
                    component.push(member);
                    if member == uri {
                        break;
                    }
                }
                component.reverse();
                self.components.push(component);
            }
        }
    }

    let mut tarjan = Tarjan {
        libraries,
        index: FxHashMap::default(),
        low_link: FxHashMap::default(),
        stack: Vec::new(),
        on_stack: FxHashMap::default(),
        components: Vec::new(),
    };
    for uri in libraries.keys() {
        if !tarjan.index.contains_key(uri.as_str()) {
            tarjan.visit(uri);
        }
    }
    tarjan.components
}
