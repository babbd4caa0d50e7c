//! Unit tests for catalog packaging.

use super::*;
use crate::artifacts::ArtifactKind;
use crate::version::VersionToken;
use rstest::{fixture, rstest};
use std::io::Read;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    output_dir: Utf8PathBuf,
    artifacts: BuildArtifactSet,
    names: ReleaseNames,
    product: ProductMetadata,
}

impl Fixture {
    fn packager(&self) -> CatalogPackager<'_> {
        CatalogPackager::new(&self.output_dir, &self.names, &self.product)
    }
}

#[fixture]
fn fixture() -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir not UTF-8");
    let build_dir = root.join(".pio/build/m5cardputer");
    let output_dir = root.join("m5porkchop_builds");
    fs::create_dir_all(&build_dir).expect("mkdir build");
    fs::create_dir_all(&output_dir).expect("mkdir output");
    for kind in ArtifactKind::ALL {
        fs::write(build_dir.join(kind.build_filename()), format!("{kind}")).expect("write");
    }

    let version: VersionToken = "0.1.8b-PSTH".parse().expect("valid version");
    Fixture {
        _dir: dir,
        output_dir,
        artifacts: BuildArtifactSet::locate(&build_dir),
        names: ReleaseNames::new("porkchop", &version),
        product: ProductMetadata::default(),
    }
}

fn read_entry(archive_path: &Utf8Path, name: &str) -> String {
    let file = fs::File::open(archive_path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    let mut contents = String::new();
    archive
        .by_name(name)
        .expect("entry present")
        .read_to_string(&mut contents)
        .expect("read entry");
    contents
}

fn archive_names(archive_path: &Utf8Path) -> Vec<String> {
    let file = fs::File::open(archive_path).expect("open archive");
    let archive = zip::ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    names
}

#[rstest]
fn archive_contains_exactly_the_catalog_layout(fixture: Fixture) {
    let output = fixture.packager().package(&fixture.artifacts).expect("package");

    assert_eq!(
        output.archive_path,
        fixture.output_dir.join("porkchop_v0.1.8b-PSTH_m5burner.zip")
    );
    assert_eq!(
        archive_names(&output.archive_path),
        [
            "firmware/bootloader_0x0.bin",
            "firmware/partitions_0x8000.bin",
            "firmware/porkchop_0x10000.bin",
            "m5burner.json",
        ]
    );
}

#[rstest]
fn archived_images_match_their_sources(fixture: Fixture) {
    let output = fixture.packager().package(&fixture.artifacts).expect("package");

    assert_eq!(
        read_entry(&output.archive_path, "firmware/partitions_0x8000.bin"),
        "partition table"
    );
    assert_eq!(
        read_entry(&output.archive_path, "firmware/porkchop_0x10000.bin"),
        "firmware"
    );
}

#[rstest]
fn manifest_version_round_trips(fixture: Fixture) {
    let output = fixture.packager().package(&fixture.artifacts).expect("package");

    let json = read_entry(&output.archive_path, "m5burner.json");
    let parsed: CatalogManifest = serde_json::from_str(&json).expect("parse manifest");
    assert_eq!(parsed.version, "0.1.8b-PSTH");
    assert_eq!(parsed, output.manifest);
}

#[rstest]
fn staging_tree_is_removed_after_success(fixture: Fixture) {
    let packager = fixture.packager();
    packager.package(&fixture.artifacts).expect("package");

    assert!(!packager.staging_path().exists());
}

#[rstest]
fn stale_staging_tree_does_not_leak_into_archive(fixture: Fixture) {
    let packager = fixture.packager();
    let stale = packager.staging_path();
    fs::create_dir_all(stale.join("firmware")).expect("mkdir stale");
    fs::write(stale.join("firmware/leftover.bin"), b"old").expect("write stale");

    let output = packager.package(&fixture.artifacts).expect("package");

    let names = archive_names(&output.archive_path);
    assert_eq!(names.len(), 4);
    assert!(!names.iter().any(|n| n.contains("leftover")));
    assert!(!stale.exists());
}

#[rstest]
fn archive_failure_still_removes_staging_tree(fixture: Fixture) {
    let packager = fixture.packager();
    let archive = packager.archive_path();
    fs::write(&archive, b"previous release").expect("write stale archive");
    // A directory where the zip is written makes it unwritable.
    fs::create_dir_all(partial_path(&archive)).expect("block archive path");

    let err = packager
        .package(&fixture.artifacts)
        .expect_err("archive cannot be created");

    assert!(matches!(err, ReleaseError::PackagingFailure { .. }));
    assert!(!packager.staging_path().exists());
    assert!(!archive.exists());
}

#[rstest]
fn stale_archive_is_replaced(fixture: Fixture) {
    let packager = fixture.packager();
    let archive = packager.archive_path();
    fs::write(&archive, b"previous release").expect("write stale archive");

    let output = packager.package(&fixture.artifacts).expect("package");

    assert_eq!(archive_names(&output.archive_path).len(), 4);
    assert!(!partial_path(&archive).exists());
}

#[rstest]
fn stale_file_at_staging_path_is_replaced(fixture: Fixture) {
    let packager = fixture.packager();
    fs::write(packager.staging_path(), b"not a directory").expect("write stale file");

    let output = packager.package(&fixture.artifacts).expect("package");

    assert_eq!(archive_names(&output.archive_path).len(), 4);
    assert!(!packager.staging_path().exists());
}

#[rstest]
fn missing_artifact_is_reported_before_staging(fixture: Fixture) {
    fs::remove_file(fixture.artifacts.path(ArtifactKind::PartitionTable)).expect("remove");
    let packager = fixture.packager();

    let err = packager.package(&fixture.artifacts).expect_err("missing image");

    assert!(matches!(
        err,
        ReleaseError::ArtifactMissing {
            kind: ArtifactKind::PartitionTable,
            ..
        }
    ));
    assert!(!packager.staging_path().exists());
}

#[rstest]
fn firmware_entry_follows_product_stem(mut fixture: Fixture) {
    fixture.product.stem = "bacon".to_owned();

    let output = fixture.packager().package(&fixture.artifacts).expect("package");

    assert!(
        output
            .entries
            .contains(&"firmware/bacon_0x10000.bin".to_owned())
    );
}

#[test]
fn staging_tree_is_removed_on_drop() {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(dir.path().join("pkg")).expect("temp dir not UTF-8");

    {
        let tree = StagingTree::create(&root).expect("create");
        fs::write(tree.root().join("scratch"), b"x").expect("write");
        assert!(root.exists());
    }

    assert!(!root.exists());
}
