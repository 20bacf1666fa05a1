/* ************************************************************************
*   File: race.rs                                       Part of CircleMUD *
*  Usage: Player races and creature types                                 *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use serde::{Deserialize, Serialize};

use crate::interpreter::is_abbrev;
use crate::spells::DamType;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum RaceId {
    Human,
    Elf,
    Dwarf,
    Halfling,
    HalfElf,
    HalfOrc,
    Gnome,
}

pub const NUM_RACES: usize = 7;

/* creature types, used by favored enemies and NPC prototypes */
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize,
)]
pub enum RaceType {
    #[default]
    Humanoid,
    Animal,
    MonstrousHumanoid,
    Undead,
    Outsider,
    Dragon,
    Construct,
}

impl RaceType {
    pub fn name(self) -> &'static str {
        match self {
            RaceType::Humanoid => "humanoid",
            RaceType::Animal => "animal",
            RaceType::MonstrousHumanoid => "monstrous humanoid",
            RaceType::Undead => "undead",
            RaceType::Outsider => "outsider",
            RaceType::Dragon => "dragon",
            RaceType::Construct => "construct",
        }
    }
}

pub struct RaceInfo {
    pub id: RaceId,
    pub name: &'static str,
    pub abbrev: &'static str,
    /* STR, CON, INT, WIS, DEX, CHA */
    pub ability_mods: [i32; 6],
    pub resistances: &'static [(DamType, i32)],
}

impl RaceId {
    pub const ALL: [RaceId; NUM_RACES] = [
        RaceId::Human,
        RaceId::Elf,
        RaceId::Dwarf,
        RaceId::Halfling,
        RaceId::HalfElf,
        RaceId::HalfOrc,
        RaceId::Gnome,
    ];

    pub fn info(self) -> &'static RaceInfo {
        &RACE_LIST[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}

pub static RACE_LIST: [RaceInfo; NUM_RACES] = [
    RaceInfo {
        id: RaceId::Human,
        name: "Human",
        abbrev: "Hum",
        ability_mods: [0, 0, 0, 0, 0, 0],
        resistances: &[],
    },
    RaceInfo {
        id: RaceId::Elf,
        name: "Elf",
        abbrev: "Elf",
        ability_mods: [0, -2, 0, 0, 2, 0],
        resistances: &[],
    },
    RaceInfo {
        id: RaceId::Dwarf,
        name: "Dwarf",
        abbrev: "Dwf",
        ability_mods: [0, 2, 0, 0, 0, -2],
        resistances: &[(DamType::Poison, 10)],
    },
    RaceInfo {
        id: RaceId::Halfling,
        name: "Halfling",
        abbrev: "Hlf",
        ability_mods: [-2, 0, 0, 0, 2, 0],
        resistances: &[],
    },
    RaceInfo {
        id: RaceId::HalfElf,
        name: "Half-Elf",
        abbrev: "HEl",
        ability_mods: [0, 0, 0, 0, 0, 0],
        resistances: &[],
    },
    RaceInfo {
        id: RaceId::HalfOrc,
        name: "Half-Orc",
        abbrev: "HOr",
        ability_mods: [2, 0, -2, 0, 0, -2],
        resistances: &[],
    },
    RaceInfo {
        id: RaceId::Gnome,
        name: "Gnome",
        abbrev: "Gno",
        ability_mods: [-2, 2, 0, 0, 0, 0],
        resistances: &[(DamType::Illusion, 10)],
    },
];

pub const RACE_MENU: &str = "\r\n\
Select a race:\r\n\
  Human      Elf        Dwarf      Halfling\r\n\
  Half-Elf   Half-Orc   Gnome\r\n";

pub fn parse_race(arg: &str) -> Option<RaceId> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    RACE_LIST
        .iter()
        .find(|r| arg.eq_ignore_ascii_case(r.name) || arg.eq_ignore_ascii_case(r.abbrev))
        .or_else(|| RACE_LIST.iter().find(|r| is_abbrev(arg, r.name)))
        .map(|r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_win_over_prefixes() {
        assert_eq!(parse_race("half-orc"), Some(RaceId::HalfOrc));
        assert_eq!(parse_race("half"), Some(RaceId::Halfling));
        assert_eq!(parse_race("elf"), Some(RaceId::Elf));
        assert_eq!(parse_race("dw"), Some(RaceId::Dwarf));
        assert_eq!(parse_race("orc"), None);
    }
}
