/* ************************************************************************
*   File: util.rs                                       Part of CircleMUD *
*  Usage: various internal functions of a utility nature                  *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, TimeZone, Utc};
use log::{error, info};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_core::{OsRng, RngCore};

use crate::class::{ClassId, CasterType};
use crate::db::DB;
use crate::structs::ConState::ConPlaying;
use crate::structs::{
    AffectFlags, CharData, CharKind, MobFlags, NpcSpecials, ObjData, PlayerSpecials, Position,
    Sex, Stat, LVL_CAP, LVL_EPIC, LVL_IMMORT,
};
use crate::Game;

/* defines for mudlog() */
pub const BRF: u8 = 1;
pub const NRM: u8 = 2;
pub const CMP: u8 = 3;

/*
 * All the randomness of the simulation goes through one generator, so a
 * fixed seed and an identical world replay identically.
 */
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> GameRng {
        GameRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_entropy() -> GameRng {
        GameRng::new(OsRng.next_u64())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /* creates a random number in interval [from;to] */
    pub fn rand_number(&mut self, from: i32, to: i32) -> i32 {
        /* error checking in case people call this incorrectly */
        let (from, to) = if from > to {
            error!(
                "SYSERR: rand_number() should be called with lowest, then highest. ({}, {}), not ({}, {}).",
                to, from, from, to
            );
            (to, from)
        } else {
            (from, to)
        };
        self.rng.gen_range(from..=to)
    }

    /* simulates dice roll */
    pub fn dice(&mut self, num: i32, size: i32) -> i32 {
        if size <= 0 || num <= 0 {
            return 0;
        }
        (0..num).map(|_| self.rand_number(1, size)).sum()
    }

    pub fn d20(&mut self) -> i32 {
        self.rand_number(1, 20)
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }
}

pub fn time_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn ctime(t: u64) -> String {
    match Utc.timestamp_opt(t as i64, 0).single() {
        Some(date_time) => date_time.with_timezone(&Local).format("%a %b %e %T %Y").to_string(),
        None => "(unknown time)".to_string(),
    }
}

/* the "touch" command, essentially. */
pub fn touch(path: &Path) -> io::Result<()> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

/*
 * The bonus an ability score gives to rolls: 10 and 11 give nothing, each
 * two points above add one, each two points below take one away.
 */
pub fn stat_bonus(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

impl CharData {
    pub fn is_npc(&self) -> bool {
        matches!(self.kind, CharKind::Npc(_))
    }

    pub fn player(&self) -> Option<&PlayerSpecials> {
        match &self.kind {
            CharKind::Player(p) => Some(p),
            CharKind::Npc(_) => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerSpecials> {
        match &mut self.kind {
            CharKind::Player(p) => Some(p),
            CharKind::Npc(_) => None,
        }
    }

    pub fn npc(&self) -> Option<&NpcSpecials> {
        match &self.kind {
            CharKind::Npc(n) => Some(n),
            CharKind::Player(_) => None,
        }
    }

    pub fn npc_mut(&mut self) -> Option<&mut NpcSpecials> {
        match &mut self.kind {
            CharKind::Npc(n) => Some(n),
            CharKind::Player(_) => None,
        }
    }

    pub fn get_name(&self) -> &str {
        if self.is_npc() {
            &self.short_descr
        } else {
            &self.name
        }
    }

    pub fn get_idnum(&self) -> i64 {
        self.player().map_or(-1, |p| p.idnum)
    }

    pub fn total_level(&self) -> u8 {
        if let Some(npc) = self.npc() {
            return npc.level;
        }
        self.class_levels.values().map(|l| *l as u32).sum::<u32>().min(u8::MAX as u32) as u8
    }

    /* immortals answer with their admin level, everybody else with their class levels */
    pub fn get_level(&self) -> u8 {
        match self.player() {
            Some(p) if p.admin_level > 0 => p.admin_level,
            _ => self.total_level(),
        }
    }

    pub fn is_immortal(&self) -> bool {
        self.get_level() >= LVL_IMMORT
    }

    pub fn class_level(&self, class: ClassId) -> u8 {
        self.class_levels.get(&class).copied().unwrap_or(0)
    }

    /* the class with the most levels, ties going to the first class in the table */
    pub fn main_class(&self) -> Option<ClassId> {
        let mut best: Option<(ClassId, u8)> = None;
        for (class, level) in &self.class_levels {
            if best.map_or(true, |(_, l)| *level > l) {
                best = Some((*class, *level));
            }
        }
        best.map(|(c, _)| c)
    }

    pub fn caster_level(&self) -> u8 {
        if let Some(npc) = self.npc() {
            return npc.level;
        }
        let sum: u32 = self
            .class_levels
            .iter()
            .filter(|(c, _)| c.info().caster != CasterType::NonCaster)
            .map(|(_, l)| *l as u32)
            .sum();
        sum.min(LVL_CAP as u32) as u8
    }

    pub fn is_epic(&self) -> bool {
        self.total_level() >= LVL_EPIC
    }

    pub fn awake(&self) -> bool {
        self.position > Position::Sleeping
    }

    pub fn is_good(&self) -> bool {
        self.alignment >= 350
    }

    pub fn is_evil(&self) -> bool {
        self.alignment <= -350
    }

    pub fn is_neutral(&self) -> bool {
        !self.is_good() && !self.is_evil()
    }

    pub fn aff_flagged(&self, flag: AffectFlags) -> bool {
        self.aff_flags.contains(flag)
    }

    pub fn mob_flagged(&self, flag: MobFlags) -> bool {
        self.npc().map_or(false, |n| n.mob_flags.contains(flag))
    }

    pub fn get_stat(&self, stat: Stat) -> i32 {
        self.aff_abils.get(stat)
    }

    pub fn stat_bonus(&self, stat: Stat) -> i32 {
        stat_bonus(self.get_stat(stat))
    }

    pub fn is_fighting(&self) -> bool {
        self.fighting.is_some()
    }

    pub fn is_casting(&self) -> bool {
        self.casting.is_some()
    }

    pub fn can_carry_n(&self) -> usize {
        (10 + self.get_stat(Stat::Dex) / 2 + self.get_level() as i32 / 2).max(0) as usize
    }

    pub fn is_carrying_n(&self) -> usize {
        self.carrying.len()
    }

    pub fn get_wait_state(&self) -> u32 {
        self.wait
    }
}

pub fn hmhr(ch: &CharData) -> &'static str {
    match ch.sex {
        Sex::Male => "him",
        Sex::Female => "her",
        Sex::Neutral => "it",
    }
}

pub fn hshr(ch: &CharData) -> &'static str {
    match ch.sex {
        Sex::Male => "his",
        Sex::Female => "her",
        Sex::Neutral => "its",
    }
}

pub fn hssh(ch: &CharData) -> &'static str {
    match ch.sex {
        Sex::Male => "he",
        Sex::Female => "she",
        Sex::Neutral => "it",
    }
}

pub fn sana(obj: &ObjData) -> &'static str {
    match obj.name.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => "an",
        _ => "a",
    }
}

pub fn an(word: &str) -> &'static str {
    match word.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => "an",
        _ => "a",
    }
}

/* the string with its first letter uppercased */
pub fn cap(txt: &str) -> String {
    let mut chars = txt.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/* first word of a namelist */
pub fn fname(namelist: &str) -> &str {
    namelist.split_whitespace().next().unwrap_or("")
}

/* Various checks building up to CAN_SEE */
impl DB {
    pub fn light_ok(&self, sub: &CharData) -> bool {
        !sub.aff_flagged(AffectFlags::BLIND) && self.is_light(sub.in_room)
    }

    pub fn can_see(&self, sub: &CharData, obj: &CharData) -> bool {
        if sub.id == obj.id || sub.is_immortal() {
            return true;
        }
        self.light_ok(sub)
            && (!obj.aff_flagged(AffectFlags::INVISIBLE)
                || sub.aff_flagged(AffectFlags::DETECT_INVIS))
    }

    pub fn can_see_obj(&self, sub: &CharData, _obj: &ObjData) -> bool {
        sub.is_immortal() || self.light_ok(sub)
    }

    pub fn pers<'a>(&self, ch: &'a CharData, vict: &CharData) -> &'a str {
        if self.can_see(vict, ch) {
            ch.get_name()
        } else {
            "someone"
        }
    }

    pub fn objs<'a>(&self, obj: &'a ObjData, vict: &CharData) -> &'a str {
        if self.can_see_obj(vict, obj) {
            obj.short_description.as_str()
        } else {
            "something"
        }
    }

    pub fn objn<'a>(&self, obj: &'a ObjData, vict: &CharData) -> &'a str {
        if self.can_see_obj(vict, obj) {
            fname(&obj.name)
        } else {
            "something"
        }
    }
}

/*
 * Names of the set bits, in bit order, for the bitflags types; "NOBITS"
 * when none is set.
 */
pub fn sprintbit(bitvector: u32, names: &[&str]) -> String {
    let mut result = Vec::new();
    for (nr, name) in names.iter().enumerate() {
        if nr < 32 && bitvector & (1 << nr) != 0 {
            result.push(*name);
        }
    }
    if bitvector >> names.len().min(31) != 0 && names.len() < 32 {
        result.push("UNDEFINED");
    }
    if result.is_empty() {
        "NOBITS".to_string()
    } else {
        result.join(" ")
    }
}

/*
 * mudlog -- log mud messages to a file & to online imm's syslogs
 * based on syslog by Fen Jul 3, 1992
 */
impl Game {
    pub fn mudlog(&mut self, db: &DB, _type: u8, level: u8, file: bool, msg: &str) {
        if msg.is_empty() {
            return;
        }
        if file {
            info!("{}", msg);
        }

        let buf = format!("[ {} ]\r\n", msg);

        for d_id in self.descriptors.ids() {
            let chid = match self.descriptors.get(d_id) {
                Some(d) if d.state == ConPlaying => d.character,
                _ => None,
            };
            let ch = match chid.and_then(|c| db.chars.get(c)) {
                Some(ch) => ch,
                None => continue,
            };
            let log_level = match ch.player() {
                Some(p) => p.log_level,
                None => continue,
            };
            if ch.get_level() < level || log_level < _type {
                continue;
            }
            if let Some(d) = self.descriptors.get_mut(d_id) {
                d.write_to_output(&buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::CharAbilityData;

    #[test]
    fn seeded_rng_replays() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        let rolls_a: Vec<i32> = (0..20).map(|_| a.dice(3, 6)).collect();
        let rolls_b: Vec<i32> = (0..20).map(|_| b.dice(3, 6)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|r| (3..=18).contains(r)));
    }

    #[test]
    fn rand_number_accepts_swapped_bounds() {
        let mut rng = GameRng::new(7);
        for _ in 0..50 {
            let n = rng.rand_number(10, 5);
            assert!((5..=10).contains(&n));
        }
        assert_eq!(rng.dice(0, 6), 0);
        assert_eq!(rng.dice(2, 0), 0);
    }

    #[test]
    fn stat_bonus_rounds_down() {
        assert_eq!(stat_bonus(10), 0);
        assert_eq!(stat_bonus(11), 0);
        assert_eq!(stat_bonus(12), 1);
        assert_eq!(stat_bonus(9), -1);
        assert_eq!(stat_bonus(8), -1);
        assert_eq!(stat_bonus(7), -2);
        assert_eq!(stat_bonus(18), 4);
    }

    #[test]
    fn levels_and_alignment_bands() {
        let mut ch = CharData {
            kind: CharKind::Player(Box::default()),
            ..Default::default()
        };
        ch.class_levels.insert(ClassId::Warrior, 12);
        ch.class_levels.insert(ClassId::Wizard, 5);
        ch.class_levels.insert(ClassId::Cleric, 3);
        assert_eq!(ch.total_level(), 20);
        assert_eq!(ch.caster_level(), 8);
        assert!(ch.is_epic());
        assert_eq!(ch.main_class(), Some(ClassId::Warrior));

        ch.alignment = 350;
        assert!(ch.is_good());
        ch.alignment = -349;
        assert!(ch.is_neutral());
        ch.alignment = -350;
        assert!(ch.is_evil());

        ch.aff_abils = CharAbilityData::new([10, 10, 10, 10, 14, 10]);
        assert_eq!(ch.can_carry_n(), 10 + 7 + 10);
    }

    #[test]
    fn sprintbit_names_set_bits() {
        let names = ["DARK", "NO_MOB", "INDOORS"];
        assert_eq!(sprintbit(0, &names), "NOBITS");
        assert_eq!(sprintbit(0b101, &names), "DARK INDOORS");
        assert_eq!(sprintbit(0b1000, &names), "UNDEFINED");
    }
}
