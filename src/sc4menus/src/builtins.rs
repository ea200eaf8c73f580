//! Builtin menu reference table.
//!
//! The game ships these menus itself, so the build never generates
//! buttons for them unless a folder explicitly sets `override: true`.

use crate::menu::MenuId;

/// A menu built into the game.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinMenu {
    pub id: u32,
    pub name: &'static str,
}

/// All builtin content browser menus.
pub const BUILTIN_MENUS: &[BuiltinMenu] = &[
    BuiltinMenu { id: 0x4a22ea06, name: "Flora" },
    BuiltinMenu { id: 0x29920899, name: "Residential" },
    BuiltinMenu { id: 0xa998af42, name: "Commercial" },
    BuiltinMenu { id: 0xc998af00, name: "Industrial" },
    BuiltinMenu { id: 0x6999bf56, name: "Road" },
    BuiltinMenu { id: 0x00000031, name: "Highway" },
    BuiltinMenu { id: 0x00000029, name: "Rail" },
    BuiltinMenu { id: 0x299237bf, name: "Misc Transit" },
    BuiltinMenu { id: 0xe99234b3, name: "Airport" },
    BuiltinMenu { id: 0xa99234a6, name: "Water Transit" },
    BuiltinMenu { id: 0x00000035, name: "Power" },
    BuiltinMenu { id: 0x00000039, name: "Water" },
    BuiltinMenu { id: 0x00000037, name: "Police" },
    BuiltinMenu { id: 0x00000038, name: "Fire" },
    BuiltinMenu { id: 0x00000042, name: "Education" },
    BuiltinMenu { id: 0x89dd5405, name: "Health" },
    BuiltinMenu { id: 0x09930709, name: "Landmark" },
    BuiltinMenu { id: 0x00000034, name: "Reward" },
    BuiltinMenu { id: 0x00000003, name: "Park" },
];

/// Whether the id belongs to a menu the game ships itself.
pub fn is_builtin(id: MenuId) -> bool {
    BUILTIN_MENUS.iter().any(|m| m.id == id.to_raw())
}

/// Display name of a builtin menu.
pub fn builtin_name(id: MenuId) -> Option<&'static str> {
    BUILTIN_MENUS
        .iter()
        .find(|m| m.id == id.to_raw())
        .map(|m| m.name)
}
