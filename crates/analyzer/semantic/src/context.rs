//! # Analysis context
//!
//! Owns the sources the analyzer works on. Each source is a salsa
//! [`SourceFile`] input holding its text and modification stamp, paired with
//! the syntax tree the caller parsed from that text. The context is the
//! [`SourceProvider`] the [`LibraryResolver`] reads from.

use std::sync::Arc;

use indexmap::IndexMap;
use quill_analyzer_diagnostics::build_diagnostic_message;
use quill_analyzer_syntax::ast::CompilationUnit;
use quill_analyzer_syntax::SourceFile;
use salsa::Setter;

use crate::core_library::CORE_LIBRARY_URI;
use crate::db::SemanticDatabaseImpl;
use crate::library_resolver::{LibraryResolver, ResolverError, SourceProvider};
use crate::options::AnalysisOptions;
use crate::session::AnalysisSession;

/// Turns a URI written in a directive into the absolute URI of a source
pub trait UriResolver {
    fn resolve(&self, base: &str, uri: &str) -> Option<String>;
}

/// Handles `quill:` library URIs, absolute URIs and `./`/`../` relative
/// paths
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUriResolver;

impl UriResolver for DefaultUriResolver {
    fn resolve(&self, base: &str, uri: &str) -> Option<String> {
        if uri.is_empty() {
            return None;
        }
        if uri.starts_with("quill:") {
            // Only the core library lives under the quill scheme
            return (uri == CORE_LIBRARY_URI).then(|| uri.to_string());
        }
        let has_scheme = uri
            .find(':')
            .is_some_and(|colon| !uri[..colon].contains('/'));
        if has_scheme || uri.starts_with('/') {
            return Some(uri.to_string());
        }

        let mut segments: Vec<&str> = match base.rfind('/') {
            Some(slash) => base[..slash].split('/').collect(),
            None => Vec::new(),
        };
        for segment in uri.split('/') {
            match segment {
                "." => {}
                ".." => match segments.pop() {
                    Some(popped) if !popped.is_empty() && !popped.ends_with(':') => {}
                    _ => return None,
                },
                segment => segments.push(segment),
            }
        }
        Some(segments.join("/"))
    }
}

pub struct AnalysisContext {
    db: SemanticDatabaseImpl,
    sources: IndexMap<String, (SourceFile, Arc<CompilationUnit>)>,
    uri_resolver: Box<dyn UriResolver>,
    options: AnalysisOptions,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self {
            db: SemanticDatabaseImpl::default(),
            sources: IndexMap::new(),
            uri_resolver: Box::new(DefaultUriResolver),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_uri_resolver(mut self, resolver: impl UriResolver + 'static) -> Self {
        self.uri_resolver = Box::new(resolver);
        self
    }

    pub const fn options(&self) -> AnalysisOptions {
        self.options
    }

    pub const fn db(&self) -> &SemanticDatabaseImpl {
        &self.db
    }

    pub fn source(&self, uri: &str) -> Option<SourceFile> {
        self.sources.get(uri).map(|(file, _)| *file)
    }

    /// Registers a source, replacing any previous one at `uri`
    pub fn add_source(
        &mut self,
        uri: impl Into<String>,
        text: impl Into<String>,
        unit: CompilationUnit,
    ) -> SourceFile {
        let uri = uri.into();
        if self.sources.contains_key(&uri) {
            self.set_contents(&uri, text, unit);
            return self.sources[&uri].0;
        }
        let file = SourceFile::new(&self.db, uri.clone(), text.into(), 0);
        self.sources.insert(uri, (file, Arc::new(unit)));
        file
    }

    /// Replaces the text and tree of the source at `uri` and bumps its
    /// modification stamp. Returns `false` for an unknown source.
    pub fn set_contents(
        &mut self,
        uri: &str,
        text: impl Into<String>,
        unit: CompilationUnit,
    ) -> bool {
        let Some((file, tree)) = self.sources.get_mut(uri) else {
            return false;
        };
        let stamp = file.modification_stamp(&self.db) + 1;
        file.set_text(&mut self.db).to(text.into());
        file.set_modification_stamp(&mut self.db).to(stamp);
        *tree = Arc::new(unit);
        tracing::debug!(uri, stamp, "source contents changed");
        true
    }

    /// Resolves the library at `root` and everything it depends on
    pub fn resolve_library(&self, root: &str) -> Result<AnalysisSession, ResolverError> {
        LibraryResolver::new(self)
            .with_options(self.options)
            .resolve(root)
    }

    /// Diagnostics of the unit at `uri` rendered against its text
    pub fn render_diagnostics(
        &self,
        session: &AnalysisSession,
        uri: &str,
        with_color: bool,
    ) -> Vec<String> {
        let Some((file, _)) = self.sources.get(uri) else {
            return Vec::new();
        };
        let text = file.text(&self.db);
        session
            .diagnostics(uri)
            .iter()
            .map(|diagnostic| build_diagnostic_message(uri, text, diagnostic, with_color))
            .collect()
    }
}

impl SourceProvider for AnalysisContext {
    fn unit(&self, uri: &str) -> Option<Arc<CompilationUnit>> {
        self.sources.get(uri).map(|(_, unit)| Arc::clone(unit))
    }

    fn modification_stamp(&self, uri: &str) -> u64 {
        self.sources
            .get(uri)
            .map_or(0, |(file, _)| file.modification_stamp(&self.db))
    }

    fn resolve_uri(&self, base: &str, uri: &str) -> Option<String> {
        self.uri_resolver.resolve(base, uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_analyzer_syntax::AstFactory;

    #[test]
    fn test_default_uri_resolver() {
        let resolver = DefaultUriResolver;
        assert_eq!(resolver.resolve("/app/main.q", "util.q").as_deref(), Some("/app/util.q"));
        assert_eq!(resolver.resolve("/app/main.q", "./a/b.q").as_deref(), Some("/app/a/b.q"));
        assert_eq!(resolver.resolve("/app/src/main.q", "../lib.q").as_deref(), Some("/app/lib.q"));
        assert_eq!(resolver.resolve("main.q", "lib.q").as_deref(), Some("lib.q"));
        assert_eq!(resolver.resolve("/main.q", "../lib.q"), None);
        assert_eq!(resolver.resolve("/app/main.q", "quill:core").as_deref(), Some("quill:core"));
        assert_eq!(resolver.resolve("/app/main.q", "quill:io"), None);
        assert_eq!(
            resolver.resolve("/app/main.q", "file:///lib/x.q").as_deref(),
            Some("file:///lib/x.q")
        );
        assert_eq!(resolver.resolve("/app/main.q", ""), None);
    }

    #[test]
    fn test_set_contents_bumps_the_stamp() {
        let f = AstFactory::new();
        let mut context = AnalysisContext::new();
        let file = context.add_source("a.q", "", f.compilation_unit(vec![], vec![]));
        assert_eq!(context.modification_stamp("a.q"), 0);

        assert!(context.set_contents("a.q", "int x;", f.compilation_unit(vec![], vec![])));
        assert_eq!(context.modification_stamp("a.q"), 1);
        assert_eq!(file.text(context.db()), "int x;");
        assert!(!context.set_contents("b.q", "", f.compilation_unit(vec![], vec![])));
    }
}
