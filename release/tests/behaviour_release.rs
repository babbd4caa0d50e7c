//! Behaviour-driven tests for the release pipeline.
//!
//! Scenarios drive `run_release` against a scripted toolchain that writes the
//! files a real PlatformIO build and merge would. Tests use the rstest-bdd
//! v0.5.0 mutable world pattern.

use camino::Utf8PathBuf;
use porkchop_release::builder::{build_args, clean_args};
use porkchop_release::config::ReleaseConfig;
use porkchop_release::error::ReleaseError;
use porkchop_release::manifest::CatalogManifest;
use porkchop_release::naming::MANIFEST_FILENAME;
use porkchop_release::pipeline::{OutputSet, ReleaseContext, run_release};
use porkchop_release::test_utils::{ExpectedCall, StubExecutor, successful_release_calls};
use porkchop_release::version::VersionToken;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct ReleaseWorld {
    _temp_dir: TempDir,
    config: ReleaseConfig,
    version: Option<VersionToken>,
    expected_calls: Vec<ExpectedCall>,
    recorded_calls: Vec<(String, Vec<String>)>,
    result: Option<Result<OutputSet, ReleaseError>>,
}

#[fixture]
fn world() -> ReleaseWorld {
    let temp_dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("temp dir not UTF-8");
    ReleaseWorld {
        _temp_dir: temp_dir,
        config: ReleaseConfig::new(root),
        version: None,
        expected_calls: Vec::new(),
        recorded_calls: Vec::new(),
        result: None,
    }
}

fn version(world: &ReleaseWorld) -> VersionToken {
    world.version.clone().expect("version set")
}

fn outputs(world: &ReleaseWorld) -> &OutputSet {
    match world.result.as_ref().expect("pipeline ran") {
        Ok(outputs) => outputs,
        Err(e) => panic!("release failed: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a project declaring version \"{token}\"")]
fn given_project_with_version(world: &mut ReleaseWorld, token: String) {
    let contents = format!(
        "[platformio]\ndefault_envs = m5cardputer\n\n[env:m5cardputer]\ncustom_version = {token}\n"
    );
    fs::write(world.config.config_path(), contents).expect("write config");
    world.version = Some(token.parse().expect("valid version"));
}

#[given("a project without a version key")]
fn given_project_without_version(world: &mut ReleaseWorld) {
    fs::write(
        world.config.config_path(),
        "[env:m5cardputer]\nplatform = espressif32\n",
    )
    .expect("write config");
}

#[given("a toolchain that builds successfully")]
fn given_working_toolchain(world: &mut ReleaseWorld) {
    world.expected_calls = successful_release_calls(&world.config, &version(world));
}

#[given("a toolchain whose build fails with \"{stderr}\"")]
fn given_failing_build(world: &mut ReleaseWorld, stderr: String) {
    let env = world.config.environment.clone();
    world.expected_calls = vec![
        ExpectedCall::succeeding("pio", clean_args(&env)),
        ExpectedCall::failing("pio", build_args(&env), &stderr),
    ];
}

#[given("a toolchain whose merge step writes no output")]
fn given_silent_merge(world: &mut ReleaseWorld) {
    let mut calls = successful_release_calls(&world.config, &version(world));
    let merge = calls.pop().expect("merge call");
    calls.push(ExpectedCall::succeeding(&merge.program, merge.args));
    world.expected_calls = calls;
}

#[given("an earlier run left \"{name}\" in the output directory")]
fn given_leftover_output(world: &mut ReleaseWorld, name: String) {
    let output_dir = world.config.output_path();
    fs::create_dir_all(&output_dir).expect("mkdir output");
    fs::write(output_dir.join(name), b"earlier release").expect("write leftover");
}

#[when("the release pipeline runs")]
fn when_pipeline_runs(world: &mut ReleaseWorld) {
    let executor = StubExecutor::new(std::mem::take(&mut world.expected_calls));
    let context = ReleaseContext {
        config: &world.config,
        verbosity: 0,
        quiet: true,
    };
    let mut stderr = Vec::new();
    let result = run_release(&context, &executor, &mut stderr);
    world.recorded_calls = executor.calls();
    world.result = Some(result);
}

#[then("the release succeeds")]
fn then_release_succeeds(world: &mut ReleaseWorld) {
    let outputs = outputs(world);
    assert_eq!(outputs.version, version(world));
}

#[then("the release fails mentioning \"{text}\"")]
fn then_release_fails(world: &mut ReleaseWorld, text: String) {
    let result = world.result.as_ref().expect("pipeline ran");
    let err = result.as_ref().expect_err("release should fail");
    assert!(
        err.to_string().contains(&text),
        "expected error mentioning {text:?}, got {err}"
    );
}

#[then("the output directory contains \"{name}\"")]
fn then_output_contains(world: &mut ReleaseWorld, name: String) {
    let path = world.config.output_path().join(&name);
    assert!(path.is_file(), "expected {path} to exist");
}

#[then("the output directory lacks \"{name}\"")]
fn then_output_lacks(world: &mut ReleaseWorld, name: String) {
    let path = world.config.output_path().join(&name);
    assert!(!path.exists(), "expected {path} to be absent");
}

#[then("the output directory is empty")]
fn then_output_empty(world: &mut ReleaseWorld) {
    let entries = fs::read_dir(world.config.output_path())
        .expect("output directory exists")
        .count();
    assert_eq!(entries, 0);
}

#[then("the catalog manifest reports version \"{token}\"")]
fn then_manifest_version(world: &mut ReleaseWorld, token: String) {
    let archive_path = &outputs(world).catalog_archive;
    let file = fs::File::open(archive_path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    let entry = archive.by_name(MANIFEST_FILENAME).expect("manifest entry");
    let manifest: CatalogManifest = serde_json::from_reader(entry).expect("parse manifest");
    assert_eq!(manifest.version, token);
}

#[then("no staging directory remains")]
fn then_no_staging(world: &mut ReleaseWorld) {
    let leftovers: Vec<_> = fs::read_dir(world.config.output_path())
        .expect("output directory exists")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .collect();
    assert!(leftovers.is_empty(), "unexpected directories: {leftovers:?}");
}

#[then("no external command was run")]
fn then_no_commands(world: &mut ReleaseWorld) {
    assert!(world.recorded_calls.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/release.feature",
    name = "A clean build produces all three deliverables"
)]
fn scenario_clean_build(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "Version suffixes are kept verbatim"
)]
fn scenario_version_suffix(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A compile error stops the release"
)]
fn scenario_compile_error(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A project without a version never invokes the toolchain"
)]
fn scenario_missing_version(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "A merge that writes nothing is a failure"
)]
fn scenario_silent_merge(world: ReleaseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/release.feature",
    name = "An image left by an earlier run is not mistaken for new output"
)]
fn scenario_leftover_image(world: ReleaseWorld) {
    let _ = world;
}
