//! End-to-end tests of framework and application runs
//!
//! Each test builds decompiled resource trees in a temporary directory,
//! resolves the framework into a cache and then extracts an application.

use animextract::resources::ResourceKind;
use animextract::{Config, Extractor, FrameworkCache, ResourceEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ANDROID_NS: &str = r#"xmlns:android="http://schemas.android.com/apk/res/android""#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A workspace with a small framework tree already resolved into the cache
struct Workspace {
    temp: TempDir,
    config: Config,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = Config {
            cache_dir: temp.path().join("cache"),
            package: Some("com.example.app".to_string()),
            ..Config::default()
        };
        Self { temp, config }
    }

    fn framework(&self) -> PathBuf {
        self.temp.path().join("framework")
    }

    fn app(&self) -> PathBuf {
        self.temp.path().join("app")
    }

    fn with_framework(self) -> Self {
        let fw = self.framework();
        write(
            &fw,
            "res/values/integers.xml",
            r#"<resources>
    <integer name="config_shortAnimTime">200</integer>
    <integer name="config_mediumAnimTime">@integer/medium</integer>
    <integer name="medium">400</integer>
</resources>"#,
        );
        write(
            &fw,
            "res/values/themes.xml",
            r#"<resources>
    <style name="Theme">
        <item name="colorBackground">@color/background_dark</item>
    </style>
    <color name="background_dark">#ff000000</color>
</resources>"#,
        );
        write(&fw, "res/interpolator/linear.xml", "<linearInterpolator/>");
        write(
            &fw,
            "res/interpolator/overshoot.xml",
            &format!(r#"<overshootInterpolator {ANDROID_NS} android:tension="2.0"/>"#),
        );
        write(&fw, "res/anim/fade_in.xml", r#"<alpha fromAlpha="0.0" toAlpha="1.0"/>"#);

        Extractor::new(&self.config, &fw)
            .unwrap()
            .run_framework()
            .expect("framework run");
        self
    }

    fn extract_app(&self) -> Vec<ResourceEntry> {
        Extractor::new(&self.config, &self.app())
            .unwrap()
            .run_application()
            .expect("application run")
            .entries
    }
}

fn animations(entries: &[ResourceEntry]) -> Vec<&ResourceEntry> {
    entries.iter().filter(|e| e.kind == ResourceKind::Animation).collect()
}

#[test]
fn test_framework_run_writes_cache() {
    let ws = Workspace::new().with_framework();
    let cache = FrameworkCache::new(&ws.config.cache_dir);
    assert!(cache.exists());

    let snapshot = cache.load().unwrap();
    assert!(snapshot.interpolators.get("android:linear").is_some());
    assert!(snapshot.interpolators.get("android:overshoot").is_some());
    assert!(snapshot.interpolators.get("android:fade_in").is_none());
    assert_eq!(
        snapshot
            .values
            .get(animextract::resources::ResourceType::Integer, "android:config_mediumAnimTime")
            .unwrap(),
        &["400".to_string()]
    );
}

#[test]
fn test_dimension_defined_twice_gives_two_animations() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(&app, "res/values/dimens.xml", r#"<resources><dimen name="x">10dp</dimen></resources>"#);
    write(&app, "res/values-land/dimens.xml", r#"<resources><dimen name="x">12dp</dimen></resources>"#);
    write(
        &app,
        "res/anim/grow.xml",
        &format!(r#"<scale {ANDROID_NS} android:pivotX="@dimen/x" android:fromXScale="0.5"/>"#),
    );

    let entries = ws.extract_app();
    let anims = animations(&entries);
    assert_eq!(anims.len(), 2);
    assert!(anims.iter().all(|e| e.path == "res/anim/grow.xml"));
    assert_eq!(anims[0].index, 0);
    assert_eq!(anims[1].index, 1);
    assert!(anims[0].content.contains(r#"android:pivotX="10dp""#));
    assert!(anims[1].content.contains(r#"android:pivotX="12dp""#));
    assert_eq!(
        anims[0].content.replace("10dp", "12dp"),
        anims[1].content,
        "variants differ only in the pivot"
    );
}

#[test]
fn test_undefined_attribute_does_not_fail_the_run() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(
        &app,
        "res/values/styles.xml",
        r#"<resources>
    <style name="AppTheme">
        <item name="colorAccent">?attr/colorPrimary</item>
    </style>
</resources>"#,
    );
    write(
        &app,
        "res/anim/tinted.xml",
        &format!(r#"<alpha {ANDROID_NS} android:backdropColor="?colorAccent"/>"#),
    );

    let entries = ws.extract_app();
    let anims = animations(&entries);
    assert_eq!(anims.len(), 1);
    assert!(anims[0].approximate);
    assert!(anims[0].content.contains("!!unknown("));
}

#[test]
fn test_application_uses_framework_values_and_interpolators() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(&app, "res/values/empty.xml", "<resources/>");
    write(
        &app,
        "res/anim/slide.xml",
        &format!(
            r#"<translate {ANDROID_NS}
    android:duration="@android:integer/config_mediumAnimTime"
    android:interpolator="@android:interpolator/linear"
    android:backdropColor="?android:attr/colorBackground"
    android:fromXDelta="100%"/>"#
        ),
    );

    let snapshot = FrameworkCache::new(&ws.config.cache_dir).load().unwrap();
    let linear = snapshot.interpolators.get("android:linear").unwrap();
    let linear_hash = linear.iter().next().unwrap();

    let entries = ws.extract_app();
    let anims = animations(&entries);
    assert_eq!(anims.len(), 1);
    let content = &anims[0].content;
    assert!(content.contains(r#"android:duration="400""#));
    assert!(content.contains(&format!(r#"android:interpolator="@@{linear_hash}""#)));
    assert!(content.contains(r##"android:backdropColor="#ff000000""##));
    assert!(!anims[0].approximate);
}

#[test]
fn test_local_interpolators_are_emitted() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(
        &app,
        "res/values/dimens.xml",
        r#"<resources><item type="dimen" name="tension">1.5</item><item type="dimen" name="tension">3.0</item></resources>"#,
    );
    write(
        &app,
        "res/interpolator/springy.xml",
        &format!(r#"<overshootInterpolator {ANDROID_NS} android:tension="@dimen/tension"/>"#),
    );
    write(
        &app,
        "res/anim/bounce.xml",
        &format!(r#"<scale {ANDROID_NS} android:interpolator="@interpolator/springy"/>"#),
    );

    let entries = ws.extract_app();
    let interpolators: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == ResourceKind::Interpolator)
        .collect();
    assert_eq!(interpolators.len(), 2);
    assert_eq!(animations(&entries).len(), 2);

    for anim in animations(&entries) {
        assert!(interpolators
            .iter()
            .any(|i| anim.content.contains(&format!("@@{}", i.hash))));
    }
}

#[test]
fn test_unparsable_files_are_skipped() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(&app, "res/values/broken.xml", "<resources><dimen name=\"x\">1dp</resources>");
    write(&app, "res/values/ok.xml", r#"<resources><dimen name="y">2dp</dimen></resources>"#);
    write(&app, "res/anim/broken.xml", "<alpha>");
    write(&app, "res/anim/ok.xml", r#"<alpha pivotX="@dimen/y"/>"#);

    let extraction = Extractor::new(&ws.config, &app).unwrap().run_application().unwrap();
    assert_eq!(extraction.summary.unreadable_value_files, 1);
    assert_eq!(extraction.summary.unparsable, 1);
    assert_eq!(extraction.entries.len(), 1);
    assert!(extraction.entries[0].content.contains(r#"pivotX="2dp""#));
}

#[test]
fn test_missing_cache_is_fatal() {
    let ws = Workspace::new();
    write(&ws.app(), "res/anim/fade.xml", "<alpha/>");

    let result = Extractor::new(&ws.config, &ws.app()).unwrap().run_application();
    assert!(result.is_err());
}

#[test]
fn test_missing_res_is_fatal() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.app()).unwrap();
    assert!(Extractor::new(&ws.config, &ws.app()).is_err());
}

#[test]
fn test_identical_animations_collapse() {
    let ws = Workspace::new().with_framework();
    let app = ws.app();
    write(&app, "res/values/ints.xml", r#"<resources><integer name="t">150</integer></resources>"#);
    write(&app, "res/anim/a.xml", r#"<alpha duration="@integer/t"/>"#);
    write(&app, "res/anim/b.xml", r#"<alpha duration="150"/>"#);

    let entries = ws.extract_app();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "res/anim/a.xml");
}

#[test]
fn test_pointer_to_approximate_framework_interpolator_is_approximate() {
    let ws = Workspace::new();
    write(
        &ws.framework(),
        "res/interpolator/fuzzy.xml",
        r#"<overshootInterpolator tension="@dimen/undefined_tension"/>"#,
    );
    let ws = ws.with_framework();

    let snapshot = FrameworkCache::new(&ws.config.cache_dir).load().unwrap();
    let fuzzy = snapshot.interpolators.get("android:fuzzy").unwrap();
    assert!(fuzzy.iter().all(|hash| snapshot.interpolators.is_approximate(hash)));

    let app = ws.app();
    write(&app, "res/anim/fuzzy.xml", r#"<alpha interpolator="@android:interpolator/fuzzy"/>"#);
    write(&app, "res/anim/linear.xml", r#"<alpha interpolator="@android:interpolator/linear"/>"#);

    let entries = ws.extract_app();
    let fuzzy = entries.iter().find(|e| e.path == "res/anim/fuzzy.xml").unwrap();
    let linear = entries.iter().find(|e| e.path == "res/anim/linear.xml").unwrap();
    assert!(fuzzy.approximate);
    assert!(!fuzzy.content.contains("!!unknown("));
    assert!(!linear.approximate);
}
