use quill_analyzer_semantic::{ElementId, SubtypeManager};
use quill_analyzer_syntax::ast::Declaration;
use quill_analyzer_syntax::AstFactory;
use rustc_hash::FxHashSet;

use crate::*;

fn extending(f: &AstFactory, name: &str, superclass: Option<&str>) -> Declaration {
    Declaration::Class(f.class_declaration(
        name,
        vec![],
        superclass.map(|superclass| f.type_name(superclass, vec![])),
        vec![],
        vec![],
        vec![],
    ))
}

#[test]
fn test_subtypes_are_transitive() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            extending(&f, "A", None),
            extending(&f, "B", Some("A")),
            extending(&f, "C", Some("B")),
            extending(&f, "D", None),
        ],
    );
    let session = resolve_unit(unit);
    let [a, b, c, d] = ["A", "B", "C", "D"].map(|name| class_named(&session, "main.q", name));

    let mut manager = SubtypeManager::new();
    assert_eq!(manager.compute_all_subtypes(session.arena(), a), FxHashSet::from_iter([b, c]));
    assert_eq!(manager.compute_all_subtypes(session.arena(), b), FxHashSet::from_iter([c]));
    assert!(manager.compute_all_subtypes(session.arena(), c).is_empty());
    assert!(manager.compute_all_subtypes(session.arena(), d).is_empty());
}

#[test]
fn test_interfaces_are_not_extends_edges() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            extending(&f, "I", None),
            Declaration::Class(f.class_declaration(
                "C",
                vec![],
                None,
                vec![],
                vec![f.type_name("I", vec![])],
                vec![],
            )),
        ],
    );
    let session = resolve_unit(unit);
    let interface = class_named(&session, "main.q", "I");

    let subtypes = SubtypeManager::new().compute_all_subtypes(session.arena(), interface);
    assert!(subtypes.is_empty());
}

#[test]
fn test_classes_on_a_cycle_are_their_own_subtypes() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![extending(&f, "A", Some("B")), extending(&f, "B", Some("A"))],
    );
    let session = resolve_unit(unit);
    let a = class_named(&session, "main.q", "A");
    let b = class_named(&session, "main.q", "B");

    let subtypes: FxHashSet<ElementId> =
        SubtypeManager::new().compute_all_subtypes(session.arena(), a);
    assert_eq!(subtypes, FxHashSet::from_iter([a, b]));
}

#[test]
fn test_subclasses_in_imported_libraries_are_found() {
    let f = AstFactory::new();
    let base = f.compilation_unit(
        vec![f.import_directive("main.q", None, vec![])],
        vec![extending(&f, "Base", None), extending(&f, "Local", Some("Base"))],
    );
    let main = f.compilation_unit(
        vec![f.import_directive("base.q", None, vec![])],
        vec![extending(&f, "Derived", Some("Base"))],
    );
    let session = resolve(vec![("main.q", main), ("base.q", base)]);
    let base_class = class_named(&session, "base.q", "Base");
    let local = class_named(&session, "base.q", "Local");
    let derived = class_named(&session, "main.q", "Derived");

    let subtypes = SubtypeManager::new().compute_all_subtypes(session.arena(), base_class);
    assert_eq!(subtypes, FxHashSet::from_iter([local, derived]));
}
