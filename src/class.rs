/* ************************************************************************
*   File: class.rs                                      Part of CircleMUD *
*  Usage: Source file for class-specific code                             *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

/*
 * This file attempts to concentrate most of the code which must be changed
 * in order for new classes to be added.  The class list itself is static
 * data and is never mutated once the game is booted.
 */

use std::cmp::max;

use serde::{Deserialize, Serialize};

use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::FeatId;
use crate::interpreter::is_abbrev;
use crate::race::RaceId;
use crate::structs::{CharAbilityData, CharData, Position, Stat, LVL_CAP, LVL_EPIC};
use crate::util::GameRng;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ClassId {
    Warrior,
    Rogue,
    Monk,
    Cleric,
    Berserker,
    Wizard,
    Sorcerer,
    Paladin,
    Druid,
    Ranger,
    Bard,
    Alchemist,
}

pub const NUM_CLASSES: usize = 12;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BabProgression {
    Full,
    ThreeQuarter,
    Half,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CasterType {
    NonCaster,
    /* casts anything on its class list up to its circle */
    Prepared,
    /* casts only what it has learned */
    Spontaneous,
}

pub struct ClassInfo {
    pub id: ClassId,
    pub name: &'static str,
    pub abbrev: &'static str,
    pub hit_die: i32,
    pub bab: BabProgression,
    pub caster: CasterType,
    /* highest spell circle this class ever reaches */
    pub max_circle: u8,
    pub mana_per_level: i32,
    pub trains_per_level: i32,
}

impl ClassId {
    pub const ALL: [ClassId; NUM_CLASSES] = [
        ClassId::Warrior,
        ClassId::Rogue,
        ClassId::Monk,
        ClassId::Cleric,
        ClassId::Berserker,
        ClassId::Wizard,
        ClassId::Sorcerer,
        ClassId::Paladin,
        ClassId::Druid,
        ClassId::Ranger,
        ClassId::Bard,
        ClassId::Alchemist,
    ];

    pub fn info(self) -> &'static ClassInfo {
        &CLASS_LIST[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn is_caster(self) -> bool {
        self.info().caster != CasterType::NonCaster
    }
}

pub static CLASS_LIST: [ClassInfo; NUM_CLASSES] = [
    ClassInfo {
        id: ClassId::Warrior,
        name: "Warrior",
        abbrev: "War",
        hit_die: 10,
        bab: BabProgression::Full,
        caster: CasterType::NonCaster,
        max_circle: 0,
        mana_per_level: 0,
        trains_per_level: 2,
    },
    ClassInfo {
        id: ClassId::Rogue,
        name: "Rogue",
        abbrev: "Rog",
        hit_die: 6,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::NonCaster,
        max_circle: 0,
        mana_per_level: 0,
        trains_per_level: 8,
    },
    ClassInfo {
        id: ClassId::Monk,
        name: "Monk",
        abbrev: "Mon",
        hit_die: 8,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::NonCaster,
        max_circle: 0,
        mana_per_level: 0,
        trains_per_level: 4,
    },
    ClassInfo {
        id: ClassId::Cleric,
        name: "Cleric",
        abbrev: "Cle",
        hit_die: 8,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::Prepared,
        max_circle: 9,
        mana_per_level: 8,
        trains_per_level: 2,
    },
    ClassInfo {
        id: ClassId::Berserker,
        name: "Berserker",
        abbrev: "Bes",
        hit_die: 12,
        bab: BabProgression::Full,
        caster: CasterType::NonCaster,
        max_circle: 0,
        mana_per_level: 0,
        trains_per_level: 4,
    },
    ClassInfo {
        id: ClassId::Wizard,
        name: "Wizard",
        abbrev: "Wiz",
        hit_die: 4,
        bab: BabProgression::Half,
        caster: CasterType::Prepared,
        max_circle: 9,
        mana_per_level: 10,
        trains_per_level: 2,
    },
    ClassInfo {
        id: ClassId::Sorcerer,
        name: "Sorcerer",
        abbrev: "Sor",
        hit_die: 4,
        bab: BabProgression::Half,
        caster: CasterType::Spontaneous,
        max_circle: 9,
        mana_per_level: 12,
        trains_per_level: 2,
    },
    ClassInfo {
        id: ClassId::Paladin,
        name: "Paladin",
        abbrev: "Pal",
        hit_die: 10,
        bab: BabProgression::Full,
        caster: CasterType::Prepared,
        max_circle: 4,
        mana_per_level: 3,
        trains_per_level: 2,
    },
    ClassInfo {
        id: ClassId::Druid,
        name: "Druid",
        abbrev: "Dru",
        hit_die: 8,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::Prepared,
        max_circle: 9,
        mana_per_level: 8,
        trains_per_level: 4,
    },
    ClassInfo {
        id: ClassId::Ranger,
        name: "Ranger",
        abbrev: "Ran",
        hit_die: 10,
        bab: BabProgression::Full,
        caster: CasterType::Prepared,
        max_circle: 4,
        mana_per_level: 3,
        trains_per_level: 6,
    },
    ClassInfo {
        id: ClassId::Bard,
        name: "Bard",
        abbrev: "Bar",
        hit_die: 6,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::Spontaneous,
        max_circle: 6,
        mana_per_level: 6,
        trains_per_level: 6,
    },
    ClassInfo {
        id: ClassId::Alchemist,
        name: "Alchemist",
        abbrev: "Alc",
        hit_die: 8,
        bab: BabProgression::ThreeQuarter,
        caster: CasterType::Prepared,
        max_circle: 6,
        mana_per_level: 5,
        trains_per_level: 4,
    },
];

/* The menu for choosing a class in interpreter.rs: */
pub const CLASS_MENU: &str = "\r\n\
Select a class:\r\n\
  Warrior    Rogue      Monk       Cleric\r\n\
  Berserker  Wizard     Sorcerer   Paladin\r\n\
  Druid      Ranger     Bard       Alchemist\r\n";

/*
 * The code to interpret a class name -- used in interpreter.rs when a
 * new character is selecting a class and by 'advance' in act_wizard.rs.
 */
pub fn parse_class(arg: &str) -> Option<ClassId> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    CLASS_LIST
        .iter()
        .find(|c| is_abbrev(arg, c.name) || arg.eq_ignore_ascii_case(c.abbrev))
        .map(|c| c.id)
}

pub fn class_bab(class: ClassId, level: u8) -> i32 {
    let level = level as i32;
    match class.info().bab {
        BabProgression::Full => level,
        BabProgression::ThreeQuarter => level * 3 / 4,
        BabProgression::Half => level / 2,
    }
}

/* highest circle of spells a class can cast at a given class level */
pub fn max_circle(class: ClassId, level: u8) -> u8 {
    let info = class.info();
    if level == 0 {
        return 0;
    }
    let circle = match (info.caster, info.max_circle) {
        (CasterType::NonCaster, _) => 0,
        /* full casters gain a circle every other level */
        (CasterType::Prepared, 9) => (level + 1) / 2,
        (CasterType::Spontaneous, 9) => std::cmp::max(1, level / 2),
        /* partial casters: bards, alchemists, paladins and rangers */
        (_, 6) => (level + 2) / 3,
        (_, _) => {
            if level < 4 {
                0
            } else {
                (level - 1) / 3
            }
        }
    };
    std::cmp::min(circle, info.max_circle)
}

/* experience needed to reach a given total level */
pub const EXP_MAX: i64 = 100_000_000;

pub fn level_exp(level: u8) -> i64 {
    if level <= 1 {
        return 0;
    }
    let level = level as i64;
    std::cmp::min(EXP_MAX, 1000 * level * (level - 1))
}

/* attack bonus from every class the character has levels in */
pub fn base_attack_bonus(ch: &CharData) -> i32 {
    match ch.npc() {
        Some(npc) => npc.level as i32,
        None => ch
            .class_levels
            .iter()
            .map(|(class, level)| class_bab(*class, *level))
            .sum(),
    }
}

impl DB {
    /*
     * Adds one level in a class: hit points, mana, moves, and for players
     * the trains, practices, feat points and boosts the new level brings.
     * Returns the new level in that class.
     */
    pub fn advance_level(&mut self, rng: &mut GameRng, chid: DepotId, class: ClassId) -> MudResult<u8> {
        let ch = self.get_character(chid)?;
        let total = ch.total_level();
        if total >= LVL_CAP {
            return Err(MudError::invalid(format!(
                "You can't go beyond level {}.",
                LVL_CAP
            )));
        }
        let info = class.info();
        let con = ch.stat_bonus(Stat::Con);
        let int = ch.stat_bonus(Stat::Int);
        let total = total + 1;

        /* the first level rolls nothing */
        let roll = if total == 1 {
            info.hit_die
        } else {
            rng.rand_number(1, info.hit_die)
        };
        let mut add_hp = max(1, roll + con);
        if ch.feats.has_feat(FeatId::Toughness) {
            add_hp += 1;
        }
        let add_move = rng.rand_number(1, 3);

        let ch = self.get_character_mut(chid)?;
        let level = {
            let level = ch.class_levels.entry(class).or_insert(0);
            *level += 1;
            *level
        };
        ch.base_points.max_hit += add_hp;
        ch.points.hit += add_hp;
        ch.base_points.max_mana += info.mana_per_level;
        ch.points.mana += info.mana_per_level;
        ch.base_points.max_move += add_move;
        ch.points.movem += add_move;

        if let Some(p) = ch.player_mut() {
            p.trains += max(1, info.trains_per_level + int);
            p.practices += 1;
            if total == 1 || total % 3 == 0 {
                if total > LVL_EPIC {
                    p.epic_feat_points += 1;
                } else {
                    p.feat_points += 1;
                }
            }
            /* fighters get a bonus feat every other level */
            if class == ClassId::Warrior && (level == 1 || level % 2 == 0) {
                *p.class_feats.entry(class).or_insert(0) += 1;
            }
            if total % 4 == 0 {
                p.boosts += 1;
            }
        }
        self.affect_total(chid)?;
        Ok(level)
    }
}

/*
 * Roll the 6 stats for a character... each stat is made of the sum of
 * the best 3 out of 4 rolls of a 6-sided die.  The highest rolls go to
 * the stats the class needs most.
 */
pub fn roll_real_abils(rng: &mut GameRng, class: ClassId) -> CharAbilityData {
    let mut rolls: Vec<i32> = (0..6)
        .map(|_| {
            let mut dice: Vec<i32> = (0..4).map(|_| rng.rand_number(1, 6)).collect();
            dice.sort_unstable();
            dice[1..].iter().sum()
        })
        .collect();
    rolls.sort_unstable_by(|a, b| b.cmp(a));

    let order = match class {
        ClassId::Wizard | ClassId::Alchemist => {
            [Stat::Int, Stat::Dex, Stat::Con, Stat::Wis, Stat::Cha, Stat::Str]
        }
        ClassId::Sorcerer | ClassId::Bard => {
            [Stat::Cha, Stat::Dex, Stat::Con, Stat::Int, Stat::Wis, Stat::Str]
        }
        ClassId::Cleric | ClassId::Druid => {
            [Stat::Wis, Stat::Con, Stat::Str, Stat::Cha, Stat::Dex, Stat::Int]
        }
        ClassId::Paladin => [Stat::Str, Stat::Cha, Stat::Con, Stat::Wis, Stat::Dex, Stat::Int],
        ClassId::Rogue | ClassId::Monk | ClassId::Ranger => {
            [Stat::Dex, Stat::Str, Stat::Con, Stat::Wis, Stat::Int, Stat::Cha]
        }
        _ => [Stat::Str, Stat::Con, Stat::Dex, Stat::Wis, Stat::Int, Stat::Cha],
    };
    let mut abils = CharAbilityData::default();
    for (stat, roll) in order.iter().zip(rolls) {
        abils.set(*stat, roll);
    }
    abils
}

impl DB {
    /* Some initializations for characters, including initial skills */
    pub fn do_start(&mut self, rng: &mut GameRng, chid: DepotId, race: RaceId, class: ClassId) -> MudResult<()> {
        let mut abils = roll_real_abils(rng, class);
        let info = race.info();
        for stat in Stat::ALL {
            abils.set(stat, abils.get(stat) + info.ability_mods[stat as usize]);
        }

        let ch = self.get_character_mut(chid)?;
        if !ch.class_levels.is_empty() {
            return Err(MudError::invalid(format!("{} has already started.", ch.name)));
        }
        ch.race = Some(race);
        ch.real_abils = abils;
        ch.resistances = info.resistances.iter().copied().collect();
        ch.base_points.max_move = 82;
        ch.position = Position::Standing;
        ch.points.exp = 1;
        self.affect_total(chid)?;
        self.advance_level(rng, chid, class)?;

        let ch = self.get_character_mut(chid)?;
        ch.points.hit = ch.points.max_hit;
        ch.points.mana = ch.points.max_mana;
        ch.points.movem = ch.points.max_move;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_class_accepts_prefix_and_abbreviation() {
        assert_eq!(parse_class("war"), Some(ClassId::Warrior));
        assert_eq!(parse_class("Sorc"), Some(ClassId::Sorcerer));
        assert_eq!(parse_class("bes"), Some(ClassId::Berserker));
        assert_eq!(parse_class("alc"), Some(ClassId::Alchemist));
        assert_eq!(parse_class("xyz"), None);
        assert_eq!(parse_class(""), None);
    }

    #[test]
    fn class_table_is_indexed_by_class_id() {
        for class in ClassId::ALL {
            assert_eq!(class.info().id, class);
        }
    }

    #[test]
    fn spell_circles_follow_caster_type() {
        assert_eq!(max_circle(ClassId::Warrior, 20), 0);
        assert_eq!(max_circle(ClassId::Wizard, 1), 1);
        assert_eq!(max_circle(ClassId::Wizard, 17), 9);
        assert_eq!(max_circle(ClassId::Sorcerer, 1), 1);
        assert_eq!(max_circle(ClassId::Sorcerer, 4), 2);
        assert_eq!(max_circle(ClassId::Bard, 1), 1);
        assert_eq!(max_circle(ClassId::Bard, 20), 6);
        assert_eq!(max_circle(ClassId::Paladin, 3), 0);
        assert_eq!(max_circle(ClassId::Paladin, 20), 4);
    }

    #[test]
    fn advance_level_stops_at_the_cap() {
        let mut db = DB::test_world();
        let mut rng = GameRng::new(3);
        let chid = db.new_player("Leveller");
        db.chars.get_mut(chid).unwrap().real_abils =
            crate::structs::CharAbilityData::new([14, 14, 10, 10, 10, 10]);
        db.affect_total(chid).unwrap();
        assert_eq!(db.advance_level(&mut rng, chid, ClassId::Warrior).unwrap(), 1);
        {
            let ch = db.chars.get(chid).unwrap();
            /* first level is the full hit die plus the constitution bonus */
            assert_eq!(ch.base_points.max_hit, 12);
            assert_eq!(ch.player().unwrap().feat_points, 1);
        }
        for _ in 1..LVL_CAP {
            db.advance_level(&mut rng, chid, ClassId::Wizard).unwrap();
        }
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.total_level(), LVL_CAP);
        assert!(matches!(
            db.advance_level(&mut rng, chid, ClassId::Rogue),
            Err(MudError::InvalidState(_))
        ));
        assert_eq!(db.chars.get(chid).unwrap().class_level(ClassId::Rogue), 0);
        assert_eq!(base_attack_bonus(db.chars.get(chid).unwrap()), 1 + 29 / 2);
    }

    #[test]
    fn new_characters_start_rested_at_level_one() {
        let mut db = DB::test_world();
        let mut rng = GameRng::new(11);
        let chid = db.new_player("Fresh");
        db.do_start(&mut rng, chid, RaceId::Dwarf, ClassId::Cleric).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.total_level(), 1);
        assert_eq!(ch.points.hit, ch.points.max_hit);
        assert_eq!(ch.points.movem, ch.points.max_move);
        assert!(ch.resistances.contains_key(&crate::spells::DamType::Poison));
        /* best roll goes to wisdom */
        let wis = ch.real_abils.get(Stat::Wis);
        assert!(Stat::ALL.iter().all(|s| ch.real_abils.get(*s) <= wis || *s == Stat::Con));
        assert!(db.do_start(&mut rng, chid, RaceId::Dwarf, ClassId::Cleric).is_err());
    }
}
