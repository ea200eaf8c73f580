//! Submenu asset synthesis.
//!
//! The pipeline talks to synthesis through the [`Synthesizer`] trait so
//! the orchestration logic stays testable against a stub. The shipped
//! implementation, [`DbpfSynthesizer`], encodes the records in-crate:
//! a submenu button becomes an exemplar plus its LTEXT name/description
//! and optional PNG icon, and a patch group becomes one cohort per
//! target category.

use crate::dbpf::{Package, Record, Tgi, TYPE_COHORT, TYPE_EXEMPLAR, TYPE_LTEXT, TYPE_PNG};
use crate::exemplar::{encode_ltext, prop, Exemplar, Value};
use crate::menu::MenuId;
use crate::targets::TargetId;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Group id of generated menu item exemplars.
pub const GROUP_MENU_ITEMS: u32 = 0x2a3858e4;
/// Group id of generated menu icon PNGs.
pub const GROUP_MENU_ICONS: u32 = 0x6a386d26;
/// Group id of generated LTEXT records.
pub const GROUP_LTEXT: u32 = 0x6a231eaa;
/// Group id exemplar patch cohorts must live under to be applied.
pub const GROUP_SUBMENU_PATCHES: u32 = 0xb03697d1;

/// Icon instance substituted when a menu folder ships no PNG.
pub const PLACEHOLDER_ICON: u32 = 0x0a7c67f4;

/// Exemplar Type value of menu item exemplars.
const EXEMPLAR_TYPE_MENU_ITEM: u32 = 0x28;

/// Inputs for one submenu button.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSpec {
    pub name: String,
    pub description: String,
    pub id: MenuId,
    pub parent: MenuId,
    pub order: u32,
    pub icon: Option<PathBuf>,
}

/// Inputs for one patch group.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSpec {
    /// Sorted menu ids the targets should appear under.
    pub menus: Vec<MenuId>,
    pub lots: Vec<TargetId>,
    pub flora: Vec<TargetId>,
    /// Stable seed the cohort instance ids derive from, so rebuilds
    /// are byte-identical.
    pub seed: String,
}

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("cannot read icon {}: {source}", .path.display())]
    Icon { path: PathBuf, source: io::Error },
}

/// Produces the binary assets the pipeline writes out.
pub trait Synthesizer {
    /// Synthesize the clickable submenu button package for one menu.
    fn button(&self, spec: &ButtonSpec) -> Result<Package, SynthError>;

    /// Synthesize the cohort patch records for one patch group.
    fn patch(&self, spec: &PatchSpec) -> Result<Vec<Record>, SynthError>;
}

/// The in-crate DBPF record encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct DbpfSynthesizer;

impl Synthesizer for DbpfSynthesizer {
    fn button(&self, spec: &ButtonSpec) -> Result<Package, SynthError> {
        let button_id = spec.id.to_raw();
        let name_key = Tgi {
            type_id: TYPE_LTEXT,
            group: GROUP_LTEXT,
            instance: button_id,
        };
        let description_key = Tgi {
            type_id: TYPE_LTEXT,
            group: GROUP_LTEXT,
            instance: fnv1a(format!("{}:description", spec.id).as_bytes()),
        };
        let icon_instance = match spec.icon {
            Some(_) => button_id,
            None => PLACEHOLDER_ICON,
        };

        let mut exemplar = Exemplar::exemplar();
        exemplar
            .push(prop::EXEMPLAR_TYPE, Value::Uint32(EXEMPLAR_TYPE_MENU_ITEM))
            .push(prop::ITEM_ICON, Value::Uint32(icon_instance))
            .push(prop::ITEM_ORDER, Value::Uint32(spec.order))
            .push(prop::ITEM_BUTTON_ID, Value::Uint32(button_id))
            .push(
                prop::ITEM_SUBMENU_PARENT_ID,
                Value::Uint32(spec.parent.to_raw()),
            )
            .push(prop::ITEM_BUTTON_CLASS, Value::Uint32(1))
            .push(
                prop::USER_VISIBLE_NAME_KEY,
                Value::Uint32List(vec![name_key.type_id, name_key.group, name_key.instance]),
            )
            .push(
                prop::ITEM_DESCRIPTION_KEY,
                Value::Uint32List(vec![
                    description_key.type_id,
                    description_key.group,
                    description_key.instance,
                ]),
            );

        let mut package = Package::new();
        package.push(Record {
            tgi: Tgi {
                type_id: TYPE_EXEMPLAR,
                group: GROUP_MENU_ITEMS,
                instance: button_id,
            },
            data: exemplar.to_bytes(),
        });
        package.push(Record {
            tgi: name_key,
            data: encode_ltext(&spec.name),
        });
        package.push(Record {
            tgi: description_key,
            data: encode_ltext(&spec.description),
        });

        if let Some(path) = &spec.icon {
            let data = fs::read(path).map_err(|source| SynthError::Icon {
                path: path.clone(),
                source,
            })?;
            package.push(Record {
                tgi: Tgi {
                    type_id: TYPE_PNG,
                    group: GROUP_MENU_ICONS,
                    instance: button_id,
                },
                data,
            });
        }

        Ok(package)
    }

    fn patch(&self, spec: &PatchSpec) -> Result<Vec<Record>, SynthError> {
        let menus: Vec<u32> = spec.menus.iter().map(|m| m.to_raw()).collect();
        let mut records = Vec::new();
        for (label, targets) in [("lots", &spec.lots), ("flora", &spec.flora)] {
            if targets.is_empty() {
                continue;
            }

            let mut pairs = Vec::with_capacity(targets.len() * 2);
            for target in targets {
                pairs.push(target.group);
                pairs.push(target.instance);
            }

            let mut cohort = Exemplar::cohort();
            cohort
                .push(prop::EXEMPLAR_PATCH_TARGETS, Value::Uint32List(pairs))
                .push(prop::BUILDING_SUBMENUS, Value::Uint32List(menus.clone()));

            records.push(Record {
                tgi: Tgi {
                    type_id: TYPE_COHORT,
                    group: GROUP_SUBMENU_PATCHES,
                    instance: patch_instance(&spec.seed, label),
                },
                data: cohort.to_bytes(),
            });
        }
        Ok(records)
    }
}

/// Stable cohort instance derived from the unit/group seed.
fn patch_instance(seed: &str, label: &str) -> u32 {
    let hash = fnv1a(format!("{seed}:{label}").as_bytes());
    if hash == 0 { 1 } else { hash }
}

/// 32-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
