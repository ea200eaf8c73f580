//! The build pipeline.
//!
//! One run traverses the source tree once, accumulating patch targets
//! per output unit while synthesizing a button package per non-builtin
//! menu folder, then walks the accumulated database to emit one patch
//! archive per unit. Any fatal error aborts the run; files written by
//! earlier iterations stay on disk.

use crate::builtins::is_builtin;
use crate::dbpf::Package;
use crate::menu::{item_order, slugify, MenuId};
use crate::synth::{ButtonSpec, PatchSpec, SynthError, Synthesizer};
use crate::targets::{parse_targets, ParseError, TargetDatabase};
use crate::traverse::{menu_folders, MenuFolder, TraverseError};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Subfolder of the output directory holding button archives.
pub const BUTTONS_DIR: &str = "buttons";
/// Subfolder of the output directory holding patch archives.
pub const PATCHES_DIR: &str = "patches";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root of the menu definition tree.
    pub src: PathBuf,
    /// Distribution folder; recreated at the start of every run.
    pub out: PathBuf,
}

/// What one run produced.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub buttons: usize,
    pub patches: usize,
    /// Non-fatal findings (currently only missing icons).
    pub warnings: Vec<String>,
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Traverse(#[from] TraverseError),

    #[error("{}: {source}", .path.display())]
    Targets {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{} has no parent menu", .dir.display())]
    MissingParent { dir: PathBuf },

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Run the full build: traverse, collect, synthesize, emit.
pub fn build(options: &BuildOptions, synth: &impl Synthesizer) -> Result<BuildSummary, BuildError> {
    let mut summary = BuildSummary::default();
    let mut database = TargetDatabase::new();
    let mut used_slugs: HashMap<String, MenuId> = HashMap::new();

    prepare_out_dir(&options.out)?;

    for folder in menu_folders(&options.src)? {
        collect_folder_targets(&folder, &mut database)?;

        // Builtin menus already have their buttons unless a folder
        // explicitly asks to regenerate one.
        if is_builtin(folder.menu.id) && !folder.menu.override_builtin {
            continue;
        }
        let Some(parent) = &folder.parent else {
            return Err(BuildError::MissingParent {
                dir: folder.dir.clone(),
            });
        };

        if folder.icon.is_none() {
            summary.warnings.push(format!(
                "{} has no icon, substituting the placeholder",
                folder.dir.display()
            ));
        }

        let dirname = folder.dir.file_name().unwrap_or_default().to_string_lossy();
        let package = synth.button(&ButtonSpec {
            name: folder.menu.name.clone(),
            description: folder.menu.description.clone(),
            id: folder.menu.id,
            parent: parent.id,
            order: item_order(&dirname).unwrap_or(0),
            icon: folder.icon.clone(),
        })?;

        let path = button_path(&options.out, &folder.menu.name, folder.menu.id, &mut used_slugs);
        fs::write(path, package.to_bytes())?;
        summary.buttons += 1;
    }

    // Second pass over the accumulated database: one archive per unit,
    // one cohort patch per referencing-menu set.
    for (unit, entries) in database.units() {
        let mut package = Package::new();
        for group in TargetDatabase::partition(entries) {
            let records = synth.patch(&PatchSpec {
                seed: format!("{unit}/{}", group.key()),
                menus: group.menus,
                lots: group.lots,
                flora: group.flora,
            })?;
            for record in records {
                package.push(record);
            }
        }
        if package.is_empty() {
            continue;
        }
        let path = options.out.join(PATCHES_DIR).join(format!("{unit}.dat"));
        fs::write(path, package.to_bytes())?;
        summary.patches += 1;
    }

    Ok(summary)
}

/// Parse every data file of the folder into its output unit.
fn collect_folder_targets(
    folder: &MenuFolder,
    database: &mut TargetDatabase,
) -> Result<(), BuildError> {
    for file in &folder.files {
        let contents = fs::read_to_string(file)?;
        let targets = parse_targets(&contents).map_err(|source| BuildError::Targets {
            path: file.clone(),
            source,
        })?;
        let stem = file
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        database.collect(&slugify(&stem), folder.menu.id, &targets);
    }
    Ok(())
}

/// Recreate the output directory with its two subfolders.
fn prepare_out_dir(out: &Path) -> Result<(), io::Error> {
    match fs::remove_dir_all(out) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(out.join(BUTTONS_DIR))?;
    fs::create_dir_all(out.join(PATCHES_DIR))?;
    Ok(())
}

/// Button archive path from the menu name's slug; a colliding slug gets
/// the menu id appended in hex.
fn button_path(
    out: &Path,
    name: &str,
    id: MenuId,
    used: &mut HashMap<String, MenuId>,
) -> PathBuf {
    let slug = slugify(name);
    let file = match used.get(&slug) {
        None => {
            used.insert(slug.clone(), id);
            format!("{slug}.dat")
        }
        Some(_) => format!("{slug}-{id}.dat"),
    };
    out.join(BUTTONS_DIR).join(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbpf::{Record, Tgi, TYPE_COHORT, TYPE_EXEMPLAR, TYPE_LTEXT};
    use crate::exemplar::{prop, Exemplar};
    use crate::synth::DbpfSynthesizer;
    use crate::targets::TargetId;
    use std::cell::RefCell;

    // The park menu is builtin, so trees in these tests hang under it.
    const PARK: u32 = 0x00000003;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn options(root: &Path) -> BuildOptions {
        BuildOptions {
            src: root.join("src"),
            out: root.join("dist"),
        }
    }

    /// Records every patch invocation; emits nothing.
    #[derive(Default)]
    struct StubSynth {
        patches: RefCell<Vec<PatchSpec>>,
    }

    impl Synthesizer for StubSynth {
        fn button(&self, _spec: &ButtonSpec) -> Result<Package, SynthError> {
            Ok(Package::new())
        }

        fn patch(&self, spec: &PatchSpec) -> Result<Vec<Record>, SynthError> {
            self.patches.borrow_mut().push(spec.clone());
            Ok(vec![Record {
                tgi: Tgi {
                    type_id: TYPE_COHORT,
                    group: 0,
                    instance: self.patches.borrow().len() as u32,
                },
                data: Vec::new(),
            }])
        }
    }

    fn park_tree(root: &Path) {
        write(
            &root.join("src/parks/_menu.yaml"),
            &format!("id: {PARK}\nname: Park"),
        );
        write(
            &root.join("src/parks/1-0x20-child/_menu.yaml"),
            "id: '0x20'\nname: Child\ndescription: d",
        );
        write(
            &root.join("src/parks/1-0x20-child/a.txt"),
            "1, 2\n3, 4 # note\n",
        );
    }

    #[test]
    fn test_end_to_end_build() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());

        let summary = build(&options(tmp.path()), &DbpfSynthesizer).unwrap();
        assert_eq!(summary.buttons, 1);
        assert_eq!(summary.patches, 1);
        // No icon was shipped.
        assert_eq!(summary.warnings.len(), 1);

        let button = tmp.path().join("dist/buttons/child.dat");
        let package = Package::parse(&fs::read(button).unwrap()).unwrap();
        let record = package.records_of_type(TYPE_EXEMPLAR).next().unwrap();
        let exemplar = Exemplar::parse(&record.data).unwrap();
        assert_eq!(exemplar.uint32(prop::ITEM_BUTTON_ID), Some(0x20));
        assert_eq!(exemplar.uint32(prop::ITEM_SUBMENU_PARENT_ID), Some(PARK));
        assert_eq!(exemplar.uint32(prop::ITEM_ORDER), Some(1));
        assert_eq!(package.records_of_type(TYPE_LTEXT).count(), 2);

        let patch = tmp.path().join("dist/patches/a.dat");
        let package = Package::parse(&fs::read(patch).unwrap()).unwrap();
        let record = package.records_of_type(TYPE_COHORT).next().unwrap();
        let cohort = Exemplar::parse(&record.data).unwrap();
        assert_eq!(
            cohort.uint32_list(prop::EXEMPLAR_PATCH_TARGETS),
            Some(vec![1, 2, 3, 4])
        );
        assert_eq!(
            cohort.uint32_list(prop::BUILDING_SUBMENUS),
            Some(vec![0x20])
        );
    }

    #[test]
    fn test_no_button_for_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());

        build(&options(tmp.path()), &DbpfSynthesizer).unwrap();
        // The builtin parks folder itself produced no archive.
        let buttons: Vec<_> = fs::read_dir(tmp.path().join("dist/buttons"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(buttons, vec!["child.dat"]);
    }

    #[test]
    fn test_overridden_builtin_gets_button() {
        let tmp = tempfile::tempdir().unwrap();
        // Landmark is builtin too, so the outer folder produces nothing
        // itself but still acts as the parent menu.
        write(
            &tmp.path().join("src/landmarks/_menu.yaml"),
            "id: '0x09930709'\nname: Landmark",
        );
        write(
            &tmp.path().join("src/landmarks/parks/_menu.yaml"),
            &format!("id: {PARK}\nname: Park\noverride: true"),
        );

        let summary = build(&options(tmp.path()), &StubSynth::default()).unwrap();
        assert_eq!(summary.buttons, 1);
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("src/orphan/_menu.yaml"),
            "id: 0x77\nname: Orphan",
        );

        let err = build(&options(tmp.path()), &StubSynth::default()).unwrap_err();
        assert!(matches!(err, BuildError::MissingParent { .. }));
    }

    #[test]
    fn test_units_merge_across_folders() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());
        write(
            &tmp.path().join("src/parks/2-0x30-other/_menu.yaml"),
            "id: '0x30'\nname: Other",
        );
        // Same unit stem as the first folder's file, same first address.
        write(&tmp.path().join("src/parks/2-0x30-other/a.txt"), "1, 2\n");

        let stub = StubSynth::default();
        build(&options(tmp.path()), &stub).unwrap();

        let patches = stub.patches.borrow();
        // One unit, two groups: {0x20} holds (3,4), {0x20,0x30} holds (1,2).
        assert_eq!(patches.len(), 2);
        let shared = patches
            .iter()
            .find(|p| p.menus == vec![MenuId(0x20), MenuId(0x30)])
            .unwrap();
        assert_eq!(shared.lots, vec![TargetId { group: 1, instance: 2 }]);
    }

    #[test]
    fn test_malformed_target_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());
        write(
            &tmp.path().join("src/parks/1-0x20-child/b.txt"),
            "not a target\n",
        );

        let err = build(&options(tmp.path()), &StubSynth::default()).unwrap_err();
        assert!(matches!(err, BuildError::Targets { .. }));
    }

    #[test]
    fn test_colliding_slugs_get_id_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());
        write(
            &tmp.path().join("src/parks/2-0x30-twin/_menu.yaml"),
            "id: '0x30'\nname: Child",
        );

        build(&options(tmp.path()), &DbpfSynthesizer).unwrap();
        let mut buttons: Vec<_> = fs::read_dir(tmp.path().join("dist/buttons"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        buttons.sort();
        assert_eq!(buttons, vec!["child-0x00000030.dat", "child.dat"]);
    }

    #[test]
    fn test_out_dir_is_recreated() {
        let tmp = tempfile::tempdir().unwrap();
        park_tree(tmp.path());
        write(&tmp.path().join("dist/buttons/stale.dat"), "old");

        build(&options(tmp.path()), &DbpfSynthesizer).unwrap();
        assert!(!tmp.path().join("dist/buttons/stale.dat").exists());
    }
}
