//! Integration tests for reference resolution and document expansion
//!
//! These tests drive the resolver and the dereferencer through the public
//! library API against small in-memory stores.

use animextract::discovery::ResourceTree;
use animextract::parser::xml::ValuesParser;
use animextract::resources::{
    is_unknown, populate, resolve_initial_references, AttributeStore, ComplexDocument, Dereferencer,
    DocumentFilter, Emitter, InterpolatorIndex, ReferenceResolver, ResourceKind, ResourceType, Scope,
    ValueStore, DEFAULT_MAX_DEPTH,
};
use std::collections::BTreeSet;
use tempfile::TempDir;

/// Stores built from values XML, resolved and ready for dereferencing
struct Resolved {
    values: ValueStore,
    attributes: AttributeStore,
    interpolators: InterpolatorIndex,
    scope: Scope,
}

impl Resolved {
    fn from_values(files: &[&str]) -> Self {
        let scope = Scope::Application { package: None };
        let mut values = ValueStore::new();
        let mut attributes = AttributeStore::new();
        for text in files {
            let definitions = ValuesParser::new().parse(text).expect("valid values XML");
            populate(definitions, &scope, &mut values, &mut attributes);
        }
        values.dedup();
        attributes.dedup();

        let interpolators = InterpolatorIndex::new();
        resolve_initial_references(&mut values, &mut attributes, &interpolators, &scope, DEFAULT_MAX_DEPTH);

        Self {
            values,
            attributes,
            interpolators,
            scope,
        }
    }

    fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(&self.values, &self.attributes, &self.interpolators, &self.scope)
    }
}

fn empty_tree() -> (TempDir, ResourceTree) {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("res")).unwrap();
    let tree = ResourceTree::open(temp.path()).unwrap();
    (temp, tree)
}

// ============================================================================
// Reference resolution
// ============================================================================

#[test]
fn test_absent_names_resolve_to_one_sentinel() {
    let stores = Resolved::from_values(&["<resources/>"]);
    let resolver = stores.resolver();

    for reference in ["@string/a", "@color/b", "@bool/c", "@dimen/d", "@integer/e"] {
        let resolved = resolver.resolve_value(reference, None, 0).unwrap();
        assert_eq!(resolved.len(), 1, "{reference}");
        let sentinel = resolved.into_iter().next().unwrap();
        assert!(is_unknown(&sentinel));
        assert!(sentinel.contains(reference), "sentinel should name {reference}");
    }
}

#[test]
fn test_attribute_chain_terminates_in_literal() {
    let stores = Resolved::from_values(&[r#"<resources>
    <style name="Theme">
        <item name="first">?second</item>
        <item name="second">?attr/third</item>
        <item name="third">@dimen/gap</item>
    </style>
    <dimen name="gap">8dp</dimen>
</resources>"#]);

    let resolved = stores.resolver().resolve_reference("?first", None, 0).unwrap();
    assert_eq!(resolved, BTreeSet::from(["8dp".to_string()]));
}

#[test]
fn test_attribute_cycle_yields_sentinel() {
    let stores = Resolved::from_values(&[r#"<resources>
    <style name="Theme">
        <item name="a">?b</item>
        <item name="b">?a</item>
    </style>
</resources>"#]);

    let resolved = stores.resolver().resolve_reference("?a", None, 0).unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(is_unknown(resolved.iter().next().unwrap()));
}

#[test]
fn test_value_cycles_resolve_to_sentinels() {
    let stores = Resolved::from_values(&[r#"<resources>
    <dimen name="a">@dimen/b0</dimen>
    <dimen name="a">@dimen/b1</dimen>
    <dimen name="a">@dimen/b2</dimen>
    <dimen name="b0">@dimen/a</dimen>
    <dimen name="b1">@dimen/a</dimen>
    <dimen name="b2">@dimen/a</dimen>
    <integer name="self">@integer/self</integer>
</resources>"#]);

    for name in ["a", "b0", "b1", "b2"] {
        let bound = stores.values.get(ResourceType::Dimen, name).unwrap();
        assert!(bound.iter().all(|v| is_unknown(v)), "{name}: {bound:?}");
    }
    assert_eq!(
        stores.values.get(ResourceType::Integer, "self").unwrap(),
        &["!!unknown(@integer/self)".to_string()]
    );
}

#[test]
fn test_undefined_color_primary_becomes_sentinel() {
    let stores = Resolved::from_values(&[r#"<resources>
    <style name="AppTheme">
        <item name="colorAccent">?attr/colorPrimary</item>
    </style>
</resources>"#]);

    let resolved = stores.resolver().resolve_reference("?colorAccent", None, 0).unwrap();
    assert_eq!(resolved, BTreeSet::from(["!!unknown(?attr/colorPrimary)".to_string()]));
}

#[test]
fn test_definitions_across_files_are_alternatives() {
    let stores = Resolved::from_values(&[
        r#"<resources><dimen name="x">10dp</dimen></resources>"#,
        r#"<resources><dimen name="x">12dp</dimen><item type="dimen" name="y">@dimen/x</item></resources>"#,
    ]);

    assert_eq!(stores.values.get(ResourceType::Dimen, "x").unwrap().len(), 2);
    assert_eq!(
        stores.values.get(ResourceType::Dimen, "y").unwrap(),
        &["10dp".to_string(), "12dp".to_string()]
    );
}

// ============================================================================
// Document expansion
// ============================================================================

#[test]
fn test_two_and_three_alternatives_give_six_variants() {
    let stores = Resolved::from_values(&[
        r#"<resources><dimen name="pivot">0%</dimen><integer name="time">100</integer></resources>"#,
        r#"<resources><dimen name="pivot">50%</dimen><integer name="time">200</integer></resources>"#,
        r#"<resources><integer name="time">300</integer></resources>"#,
    ]);
    let (_temp, tree) = empty_tree();
    let emitter = Emitter::new();
    let dereferencer = Dereferencer::new(stores.resolver(), &tree, &emitter);

    let document = ComplexDocument::from_xml(
        "res/anim/grow.xml",
        r#"<scale xmlns:android="http://schemas.android.com/apk/res/android"
    android:pivotX="@dimen/pivot" android:pivotY="@dimen/pivot" android:duration="@integer/time"/>"#,
    )
    .unwrap();
    let entries = dereferencer
        .dereference(ResourceKind::Animation, &document, &DocumentFilter::tween(), 0)
        .unwrap();

    assert_eq!(entries.len(), 6);
    let unique: BTreeSet<_> = entries.iter().map(|e| e.hash.clone()).collect();
    assert_eq!(unique.len(), 6);
    for entry in &entries {
        // one binding per reference: both pivots always agree
        assert_eq!(
            entry.content.contains(r#"android:pivotX="0%""#),
            entry.content.contains(r#"android:pivotY="0%""#)
        );
    }
}

#[test]
fn test_expansion_is_deterministic_and_idempotent() {
    let stores = Resolved::from_values(&[
        r#"<resources><integer name="t">100</integer><integer name="t">250</integer></resources>"#,
    ]);
    let (_temp, tree) = empty_tree();
    let emitter = Emitter::new();
    let dereferencer = Dereferencer::new(stores.resolver(), &tree, &emitter);
    let filter = DocumentFilter::tween();

    let document = ComplexDocument::from_xml("res/anim/a.xml", r#"<alpha duration="@integer/t"/>"#).unwrap();
    let first = dereferencer.dereference(ResourceKind::Animation, &document, &filter, 0).unwrap();
    let second = dereferencer.dereference(ResourceKind::Animation, &document, &filter, 0).unwrap();
    assert_eq!(first, second);

    for entry in &first {
        let reparsed = ComplexDocument::from_xml("res/anim/a.xml", &entry.content).unwrap();
        let again = dereferencer.dereference(ResourceKind::Animation, &reparsed, &filter, 0).unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].content, entry.content);
    }
}

#[test]
fn test_distinct_sources_with_identical_output_collapse() {
    let stores = Resolved::from_values(&[
        r#"<resources><integer name="short">200</integer><integer name="also_short">200</integer></resources>"#,
    ]);
    let temp = TempDir::new().unwrap();
    let anim = temp.path().join("res/anim");
    std::fs::create_dir_all(&anim).unwrap();
    std::fs::write(anim.join("one.xml"), r#"<alpha duration="@integer/short"/>"#).unwrap();
    std::fs::write(anim.join("two.xml"), r#"<alpha duration="@integer/also_short"/>"#).unwrap();
    let tree = ResourceTree::open(temp.path()).unwrap();

    let emitter = Emitter::new();
    let dereferencer = Dereferencer::new(stores.resolver(), &tree, &emitter);
    let filter = DocumentFilter::tween();
    let one = dereferencer
        .process_file(ResourceKind::Animation, &anim.join("one.xml"), &filter, 0)
        .unwrap();
    let two = dereferencer
        .process_file(ResourceKind::Animation, &anim.join("two.xml"), &filter, 0)
        .unwrap();
    assert_eq!(one, two);

    let entries = emitter.into_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "res/anim/one.xml");
}

#[test]
fn test_reference_names_cannot_leave_the_resource_tree() {
    let stores = Resolved::from_values(&["<resources/>"]);
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app");
    std::fs::create_dir_all(app.join("res/interpolator")).unwrap();
    std::fs::create_dir_all(app.join("res/anim")).unwrap();
    std::fs::write(temp.path().join("secret.xml"), "<linearInterpolator secret=\"1\"/>").unwrap();
    let anim = app.join("res/anim/a.xml");
    std::fs::write(&anim, r#"<alpha interpolator="@interpolator/../../../secret"/>"#).unwrap();
    let tree = ResourceTree::open(&app).unwrap();

    let emitter = Emitter::new();
    let dereferencer = Dereferencer::new(stores.resolver(), &tree, &emitter);
    dereferencer
        .process_file(ResourceKind::Animation, &anim, &DocumentFilter::tween(), 0)
        .unwrap();

    let entries = emitter.into_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ResourceKind::Animation);
    assert!(entries[0].approximate);
    assert!(!entries.iter().any(|e| e.content.contains("secret=")));
}

#[test]
fn test_self_referencing_interpolator_terminates() {
    let stores = Resolved::from_values(&["<resources/>"]);
    let temp = TempDir::new().unwrap();
    let res = temp.path().join("res");
    std::fs::create_dir_all(res.join("interpolator")).unwrap();
    std::fs::create_dir_all(res.join("anim")).unwrap();
    std::fs::write(
        res.join("interpolator/loop.xml"),
        r#"<overshootInterpolator tension="@interpolator/loop"/>"#,
    )
    .unwrap();
    std::fs::write(res.join("anim/a.xml"), r#"<alpha interpolator="@interpolator/loop"/>"#).unwrap();
    let tree = ResourceTree::open(temp.path()).unwrap();

    let emitter = Emitter::new();
    let dereferencer = Dereferencer::new(stores.resolver(), &tree, &emitter);
    dereferencer
        .process_file(ResourceKind::Animation, &res.join("anim/a.xml"), &DocumentFilter::tween(), 0)
        .unwrap();

    let entries = emitter.into_entries();
    let looped = entries
        .iter()
        .filter(|e| e.path == "res/interpolator/loop.xml")
        .count();
    assert_eq!(looped, 1);
    assert_eq!(entries.len(), 2);
}
