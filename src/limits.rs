/* ************************************************************************
*   File: limits.rs                                     Part of CircleMUD *
*  Usage: limits & gain funcs for HMV, exp, idle time, corpse decay       *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::cmp::{max, min};

use log::error;

use crate::class::level_exp;
use crate::config::{IDLE_MAX_LEVEL, IDLE_RENT_TIME, IDLE_VOID, MAX_EXP_GAIN, MAX_EXP_LOSS};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::MudResult;
use crate::structs::ConState::ConClose;
use crate::structs::{
    AffectFlags, CharData, ObjLocation, ObjType, Position, Stat, LVL_CAP, LVL_GOD, LVL_IMMORT,
    NOWHERE,
};
use crate::util::{BRF, CMP};
use crate::{Game, TO_CHAR, TO_ROOM};

/* resting helps, sleeping helps more */
fn position_bonus(pos: Position, gain: i32, sleep: i32, rest: i32, sit: i32) -> i32 {
    match pos {
        Position::Sleeping => gain + gain / sleep,
        Position::Resting => gain + gain / rest,
        Position::Sitting => gain + gain / sit,
        _ => gain,
    }
}

/* manapoint gain pr. game hour */
pub fn mana_gain(ch: &CharData) -> i32 {
    if ch.is_npc() {
        /* Neat and fast */
        return ch.get_level() as i32;
    }
    let mut gain = 4 + ch.caster_level() as i32 / 2 + max(0, ch.stat_bonus(Stat::Wis));
    gain = match ch.position {
        Position::Sleeping => gain * 2,
        pos => position_bonus(pos, gain, 1, 2, 4),
    };
    if ch.main_class().map_or(false, |c| c.is_caster()) {
        gain *= 2;
    }
    if ch.aff_flagged(AffectFlags::POISON) {
        gain /= 4;
    }
    gain
}

/* Hitpoint gain pr. game hour */
pub fn hit_gain(ch: &CharData) -> i32 {
    if ch.is_npc() {
        return ch.get_level() as i32;
    }
    let mut gain = max(1, 8 + ch.total_level() as i32 / 2 + ch.stat_bonus(Stat::Con));
    gain = position_bonus(ch.position, gain, 2, 4, 8);
    if ch.main_class().map_or(false, |c| c.is_caster()) {
        gain /= 2; /* Ouch. */
    }
    if ch.aff_flagged(AffectFlags::POISON) {
        gain /= 4;
    }
    gain
}

/* move gain pr. game hour */
pub fn move_gain(ch: &CharData) -> i32 {
    if ch.is_npc() {
        return ch.get_level() as i32;
    }
    let mut gain = max(1, 16 + ch.stat_bonus(Stat::Dex));
    gain = position_bonus(ch.position, gain, 2, 4, 8);
    if ch.aff_flagged(AffectFlags::POISON) {
        gain /= 4;
    }
    gain
}

impl Game {
    /*
     * Levels are bought with the gain command, so experience only piles up
     * here.  Players are told once, when they cross the threshold.
     */
    pub fn gain_exp(&mut self, db: &mut DB, chid: DepotId, gain: i64) -> MudResult<()> {
        let ch = db.get_character(chid)?;
        if ch.is_npc() {
            let ch = db.get_character_mut(chid)?;
            ch.points.exp = max(0, ch.points.exp + gain);
            return Ok(());
        }
        if ch.get_level() >= LVL_IMMORT {
            return Ok(());
        }

        let gain = if gain > 0 {
            min(MAX_EXP_GAIN, gain) /* put a cap on the max gain per kill */
        } else {
            max(-MAX_EXP_LOSS, gain) /* Cap max exp lost per death */
        };
        let before = ch.points.exp;
        let level = ch.total_level();
        let needed = level_exp(level + 1);
        let exp = max(0, before + gain);
        db.get_character_mut(chid)?.points.exp = exp;

        if level < LVL_CAP && before < needed && exp >= needed {
            let ch = db.get_character(chid)?;
            self.send_to_char(
                ch,
                "You have earned enough experience to advance!  Type 'gain' to do so.\r\n",
            );
            let msg = format!("{} can now advance to level {}.", ch.get_name(), level + 1);
            self.mudlog(db, BRF, LVL_IMMORT, true, &msg);
        }
        Ok(())
    }

    fn check_idling(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        let (timer, was_in, in_room) = {
            let ch = db.get_character_mut(chid)?;
            ch.timer += 1;
            (ch.timer, ch.was_in_room, ch.in_room)
        };
        if timer <= IDLE_VOID {
            return Ok(());
        }

        if was_in == NOWHERE && in_room != NOWHERE {
            db.get_character_mut(chid)?.was_in_room = in_room;
            db.stop_fighting_against(chid);
            db.stop_fighting(chid);
            let ch = db.get_character(chid)?;
            self.act(db, "$n disappears into the void.", true, Some(ch), None, None, TO_ROOM);
            self.send_to_char(ch, "You have been idle, and are pulled into a void.\r\n");
            self.save_char(db, chid);
            db.char_from_room(chid)?;
            let void = db.void_room;
            db.char_to_room(chid, void)?;
        } else if timer > IDLE_RENT_TIME {
            if let Some(d) = db.get_character_mut(chid)?.desc.take() {
                /* For the 'if (d->character)' test in close_socket(). */
                if let Some(d) = self.descriptors.get_mut(d) {
                    d.character = None;
                    d.state = ConClose;
                }
            }
            let msg = format!(
                "{} force-rented and extracted (idle).",
                db.get_character(chid)?.get_name()
            );
            self.mudlog(db, CMP, LVL_GOD, true, &msg);
            /* the final extraction saves the player file */
            db.extract_char(chid)?;
        }
        Ok(())
    }

    /* Update PCs, NPCs, and objects */
    pub fn point_update(&mut self, db: &mut DB) {
        /* characters */
        for chid in db.chars.ids() {
            let ch = match db.chars.get_mut(chid) {
                Some(ch) if !ch.notdeadyet => ch,
                _ => continue,
            };
            if ch.position > Position::Dead {
                let (hit, mana, movem) = (hit_gain(ch), mana_gain(ch), move_gain(ch));
                ch.points.hit = min(ch.points.hit + hit, ch.points.max_hit);
                ch.points.mana = min(ch.points.mana + mana, ch.points.max_mana);
                ch.points.movem = min(ch.points.movem + movem, ch.points.max_move);
            }
            if !ch.is_npc() && ch.get_level() < IDLE_MAX_LEVEL {
                if let Err(err) = self.check_idling(db, chid) {
                    error!("SYSERR: check_idling on {}: {}", chid, err);
                }
            }
        }

        /* objects */
        for objid in db.objs.ids() {
            let decayed = match db.objs.get_mut(objid) {
                /* If this is a corpse */
                Some(obj) if obj.obj_type == ObjType::Corpse && obj.timer > 0 => {
                    /* timer count down */
                    obj.timer -= 1;
                    obj.timer == 0
                }
                _ => false,
            };
            if decayed {
                if let Err(err) = self.decay_corpse(db, objid) {
                    error!("SYSERR: decaying corpse {}: {}", objid, err);
                }
            }
        }
    }

    /* the corpse goes away, what was inside lands where the corpse was */
    fn decay_corpse(&mut self, db: &mut DB, objid: DepotId) -> MudResult<()> {
        let obj = db.get_object(objid)?;
        let spill = match obj.location {
            ObjLocation::Carried(chid) | ObjLocation::Worn(chid, _) => {
                let ch = db.get_character(chid)?;
                self.act(db, "$p decays in your hands.", false, Some(ch), Some(obj), None, TO_CHAR);
                ObjLocation::InRoom(ch.in_room)
            }
            ObjLocation::InRoom(room) => {
                if let Some(first) = db.get_room(room)?.peoples.first() {
                    let ch = db.get_character(*first)?;
                    let msg = "A quivering horde of maggots consumes $p.";
                    self.act(db, msg, true, Some(ch), Some(obj), None, TO_ROOM);
                    self.act(db, msg, true, Some(ch), Some(obj), None, TO_CHAR);
                }
                ObjLocation::InRoom(room)
            }
            loc => loc,
        };

        for inner in db.get_object(objid)?.contains.clone() {
            db.obj_from_obj(inner)?;
            match spill {
                ObjLocation::InObj(container) => db.obj_to_obj(inner, container)?,
                ObjLocation::InRoom(room) if room != NOWHERE => db.obj_to_room(inner, room)?,
                _ => db.extract_obj(inner)?,
            }
        }
        db.extract_obj(objid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassId;
    use crate::config::Config;

    fn player(db: &mut DB, room: i32) -> DepotId {
        let chid = db.new_player("Idler");
        {
            let ch = db.chars.get_mut(chid).unwrap();
            ch.class_levels.insert(ClassId::Warrior, 2);
            ch.base_points.max_hit = 40;
            ch.base_points.max_move = 80;
            ch.points.hit = 10;
        }
        db.affect_total(chid).unwrap();
        db.char_to_room(chid, room).unwrap();
        chid
    }

    #[test]
    fn sleeping_heals_faster_than_standing() {
        let mut db = DB::test_world();
        let chid = player(&mut db, 3016);
        let ch = db.chars.get_mut(chid).unwrap();
        let standing = hit_gain(ch);
        ch.position = Position::Sleeping;
        assert_eq!(hit_gain(ch), standing + standing / 2);
        ch.aff_flags.insert(AffectFlags::POISON);
        assert_eq!(hit_gain(ch), (standing + standing / 2) / 4);
    }

    #[test]
    fn regeneration_stops_at_the_maximum() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = player(&mut db, 3016);
        let gain = hit_gain(db.chars.get(chid).unwrap());
        game.point_update(&mut db);
        assert_eq!(db.chars.get(chid).unwrap().points.hit, 10 + gain);
        for _ in 0..10 {
            game.point_update(&mut db);
        }
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.points.hit, 40);
        assert_eq!(ch.points.movem, 80);
    }

    #[test]
    fn idle_players_are_voided_then_rented() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = player(&mut db, 3001);
        db.chars.get_mut(chid).unwrap().timer = IDLE_VOID;
        game.point_update(&mut db);
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.in_room, db.void_room);
        assert_eq!(ch.was_in_room, 3001);

        db.chars.get_mut(chid).unwrap().timer = IDLE_RENT_TIME;
        game.point_update(&mut db);
        assert!(db.chars.get(chid).unwrap().notdeadyet);
        game.extract_pending_chars(&mut db);
        assert!(!db.chars.contains(chid));
    }

    #[test]
    fn corpses_rot_and_spill_their_contents() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let corpse = db.read_object(3022).unwrap();
        db.objs.get_mut(corpse).unwrap().obj_type = ObjType::Corpse;
        db.objs.get_mut(corpse).unwrap().timer = 2;
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_room(corpse, 3016).unwrap();
        db.obj_to_obj(dagger, corpse).unwrap();

        game.point_update(&mut db);
        assert!(db.objs.contains(corpse));
        game.point_update(&mut db);
        assert!(!db.objs.contains(corpse));
        assert_eq!(db.objs.get(dagger).unwrap().location, ObjLocation::InRoom(3016));
        assert!(db.world[&3016].contents.contains(&dagger));
    }

    #[test]
    fn experience_is_capped_and_never_negative() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = player(&mut db, 3016);
        game.gain_exp(&mut db, chid, 10 * MAX_EXP_GAIN).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.exp, MAX_EXP_GAIN);
        game.gain_exp(&mut db, chid, -2 * MAX_EXP_GAIN).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.exp, 0);
    }
}
