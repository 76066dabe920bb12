//! Integration tests for the compile pipeline and rebuild trigger

use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use stitch_build::{
    FsEvent, JsMinifier, Minifier, MinifyBackend, MinifyOptions, PassthroughStyle, Pipeline,
    RebuildTrigger,
};
use stitch_config::{Config, ConfigLoader};
use tempfile::TempDir;

fn create_projects(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (file_path, content) in files {
        let full_path = dir.path().join("projects").join(file_path);
        fs::create_dir_all(full_path.parent().unwrap()).unwrap();
        fs::write(full_path, content).unwrap();
    }
    dir
}

fn pipeline(dir: &TempDir) -> Pipeline {
    let config = Config::with_root(dir.path());
    Pipeline::with_style_compiler(&config, Box::new(PassthroughStyle)).unwrap()
}

fn artifact(dir: &TempDir, relative: &str) -> PathBuf {
    dir.path().join("projects").join(relative)
}

#[test]
fn test_minifier_preserves_console_output() {
    let minified = Minifier::default().minify("function f(){ console.log(1); }");
    assert!(minified.contains("console.log(1)"));
}

#[test]
fn test_minifier_never_renames() {
    let source = "function add(first, second) {\n  const total = first + second;\n  return total;\n}\n";
    let minified = JsMinifier::new(MinifyOptions::default()).minify(source).unwrap();
    assert_eq!(
        minified,
        "function add(first,second){const total=first+second;return total;}"
    );
}

#[test]
fn test_build_writes_minified_artifact() {
    let dir = create_projects(&[
        ("p1/v1/v1.js", "import h from './v1.html';\n// mount it\ndocument.body.innerHTML = h;\n"),
        ("p1/v1/v1.html", "<div>Hi</div>"),
    ]);

    let built = pipeline(&dir).build_variant("p1", "v1").unwrap();

    assert_eq!(built.artifact, artifact(&dir, "p1/v1/v1.min.js"));
    assert_eq!(
        fs::read_to_string(&built.artifact).unwrap(),
        "const h=`<div>Hi</div>`;document.body.innerHTML=h;"
    );
}

#[test]
fn test_cache_load_returns_stored_artifact() {
    let dir = create_projects(&[("p1/v1/v1.js", "go( );")]);
    let pipeline = pipeline(&dir);

    assert_eq!(pipeline.cache().load("p1", "v1").unwrap(), None);
    pipeline.build_variant("p1", "v1").unwrap();
    assert_eq!(
        pipeline.cache().load("p1", "v1").unwrap().as_deref(),
        Some("go();")
    );
}

#[test]
fn test_unminifiable_script_is_stored_unminified() {
    let broken = "const s = `never closed;\n";
    let dir = create_projects(&[("p1/v1/v1.js", broken)]);

    pipeline(&dir).build_variant("p1", "v1").unwrap();

    assert_eq!(
        fs::read_to_string(artifact(&dir, "p1/v1/v1.min.js")).unwrap(),
        broken
    );
}

#[test]
fn test_artifact_is_not_picked_as_entry() {
    let dir = create_projects(&[("p1/v1/a.js", "a();"), ("p1/v1/v1.min.js", "stale();")]);
    let pipeline = pipeline(&dir);

    let compiled = pipeline.compile("p1", "v1").unwrap();
    assert_eq!(compiled.resolved.entry_filename, "a.js");
    assert_eq!(compiled.output, "a();");
}

#[test]
fn test_build_all_reports_failures_and_successes() {
    let dir = create_projects(&[
        ("p1/v1/v1.js", "one();"),
        ("p1/v2/README.md", "nothing to build"),
        ("p2/main/main.js", "import x from './missing.js';"),
    ]);

    let report = pipeline(&dir).build_all().unwrap();

    assert_eq!(report.stats.total_variants, 3);
    assert_eq!(report.stats.built_variants, 2);
    assert_eq!(report.stats.failed_variants, 1);
    assert_eq!(report.stats.issues, 1);
    assert_eq!(report.failed[0].project, "p1");
    assert_eq!(report.failed[0].variant, "v2");
    assert!(artifact(&dir, "p2/main/main.min.js").exists());
}

#[test]
fn test_shared_fragment_change_rebuilds_all_variants() {
    let dir = create_projects(&[
        ("p1/shared.js", "export default 'blue';"),
        ("p1/v1/v1.js", "import color from '../shared.js';\nconsole.log(color);"),
        ("p1/v2/v2.js", "import color from 'shared.js';\nconsole.info(color);"),
    ]);
    let trigger = RebuildTrigger::new(pipeline(&dir));

    trigger.handle(&FsEvent::change(artifact(&dir, "p1/shared.js")));
    assert_eq!(
        fs::read_to_string(artifact(&dir, "p1/v1/v1.min.js")).unwrap(),
        "const color='blue';console.log(color);"
    );

    fs::write(artifact(&dir, "p1/shared.js"), "export default 'green';").unwrap();
    let report = trigger.handle(&FsEvent::change(artifact(&dir, "p1/shared.js")));

    assert_eq!(report.stats.built_variants, 2);
    assert_eq!(
        fs::read_to_string(artifact(&dir, "p1/v1/v1.min.js")).unwrap(),
        "const color='green';console.log(color);"
    );
    assert_eq!(
        fs::read_to_string(artifact(&dir, "p1/v2/v2.min.js")).unwrap(),
        "const color='green';console.info(color);"
    );
}

#[test]
fn test_utility_change_rebuilds_every_project() {
    let dir = create_projects(&[
        ("utils.js", "export default { v: 1 };"),
        ("p1/v1/v1.js", "import u from 'utils';"),
        ("p2/v1/v1.js", "import u from 'utils';"),
    ]);
    let trigger = RebuildTrigger::new(pipeline(&dir));

    let report = trigger.handle(&FsEvent::change(artifact(&dir, "utils.js")));

    assert_eq!(report.stats.built_variants, 2);
    assert_eq!(
        fs::read_to_string(artifact(&dir, "p2/v1/v1.min.js")).unwrap(),
        "const u={v:1};"
    );
}

#[test]
fn test_config_file_changes_extensions() {
    let dir = create_projects(&[
        ("p1/v1/v1.mjs", "import t from './t.htm';\nshow(t);"),
        ("p1/v1/t.htm", "<t/>"),
    ]);
    fs::write(
        dir.path().join("stitch.toml"),
        "[extensions]\nscript = \"mjs\"\nmarkup = \"htm\"\n\n[minify]\nenabled = false\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .without_env()
        .load_from_directory(dir.path())
        .unwrap();
    let pipeline = Pipeline::with_style_compiler(&config, Box::new(PassthroughStyle)).unwrap();

    let built = pipeline.build_variant("p1", "v1").unwrap();
    assert_eq!(built.artifact, artifact(&dir, "p1/v1/v1.min.mjs"));
    assert_eq!(
        fs::read_to_string(&built.artifact).unwrap(),
        "const t = `<t/>`;\nshow(t);"
    );
}
