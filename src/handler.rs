/* ************************************************************************
*   File: handler.rs                                    Part of CircleMUD *
*  Usage: internal funcs: moving and finding chars/objs                   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::cmp::{max, min};
use std::collections::BTreeMap;

use log::error;

use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::spells::SpellId;
use crate::structs::ConState::ConClose;
use crate::structs::{
    AffectFlags, AffectedType, ApplyType, BonusType, CharData, Direction, ExitFlags, ObjData,
    ObjLocation, ObjType, RoomData, RoomFlags, RoomVnum, Stat, WearPos, NOWHERE,
};
use crate::util::fname;
use crate::Game;

/* highest effective ability score */
pub const MAX_ABILITY_SCORE: i32 = 50;

impl DB {
    pub fn get_character(&self, id: DepotId) -> MudResult<&CharData> {
        self.chars
            .get(id)
            .ok_or_else(|| MudError::not_found(format!("No such character {}.", id)))
    }

    pub fn get_character_mut(&mut self, id: DepotId) -> MudResult<&mut CharData> {
        self.chars
            .get_mut(id)
            .ok_or_else(|| MudError::not_found(format!("No such character {}.", id)))
    }

    pub fn get_object(&self, id: DepotId) -> MudResult<&ObjData> {
        self.objs
            .get(id)
            .ok_or_else(|| MudError::not_found(format!("No such object {}.", id)))
    }

    pub fn get_object_mut(&mut self, id: DepotId) -> MudResult<&mut ObjData> {
        self.objs
            .get_mut(id)
            .ok_or_else(|| MudError::not_found(format!("No such object {}.", id)))
    }

    pub fn get_room(&self, vnum: RoomVnum) -> MudResult<&RoomData> {
        self.world
            .get(&vnum)
            .ok_or_else(|| MudError::not_found(format!("Room {} does not exist.", vnum)))
    }

    pub fn get_room_mut(&mut self, vnum: RoomVnum) -> MudResult<&mut RoomData> {
        self.world
            .get_mut(&vnum)
            .ok_or_else(|| MudError::not_found(format!("Room {} does not exist.", vnum)))
    }

    /* a dark room is lit by anyone in it holding a light */
    pub fn is_light(&self, room: RoomVnum) -> bool {
        let room = match self.world.get(&room) {
            Some(room) => room,
            None => return false,
        };
        if !room.room_flags.contains(RoomFlags::DARK) {
            return true;
        }
        room.peoples.iter().filter_map(|c| self.chars.get(*c)).any(|ch| {
            ch.equipment[WearPos::Light.index()]
                .and_then(|o| self.objs.get(o))
                .map_or(false, |o| o.obj_type == ObjType::Light)
        })
    }

    /* move a player out of a room */
    pub fn char_from_room(&mut self, chid: DepotId) -> MudResult<()> {
        let in_room = self.get_character(chid)?.in_room;
        if in_room == NOWHERE {
            error!("SYSERR: NOWHERE in char_from_room ({})", chid);
            return Err(MudError::invalid("You are nowhere."));
        }
        self.stop_fighting(chid);
        if let Some(room) = self.world.get_mut(&in_room) {
            room.peoples.retain(|c| *c != chid);
        }
        self.get_character_mut(chid)?.in_room = NOWHERE;
        Ok(())
    }

    /* place a character in a room */
    pub fn char_to_room(&mut self, chid: DepotId, room: RoomVnum) -> MudResult<()> {
        if !self.world.contains_key(&room) {
            error!("SYSERR: Illegal value(s) passed to char_to_room. (Room: {})", room);
            return Err(MudError::not_found(format!("Room {} does not exist.", room)));
        }
        let ch = self.get_character_mut(chid)?;
        if ch.in_room != NOWHERE {
            return Err(MudError::invalid(format!(
                "{} is already in room {}.",
                ch.get_name(),
                ch.in_room
            )));
        }
        ch.in_room = room;
        self.get_room_mut(room)?.peoples.insert(0, chid);
        Ok(())
    }

    /*
     * Takes a character from wherever it is to `room`.  Nothing changes
     * when the room is unknown or the character is busy casting.
     */
    pub fn move_character(&mut self, chid: DepotId, room: RoomVnum) -> MudResult<()> {
        self.get_room(room)?;
        let ch = self.get_character(chid)?;
        if ch.is_casting() {
            return Err(MudError::invalid("You can't move while casting!"));
        }
        if ch.in_room != NOWHERE {
            self.char_from_room(chid)?;
        }
        self.char_to_room(chid, room)
    }

    /* the room an exit of the character's room leads to, if it can be used */
    pub fn check_exit(&self, chid: DepotId, dir: Direction) -> MudResult<RoomVnum> {
        let ch = self.get_character(chid)?;
        let exit = self
            .world
            .get(&ch.in_room)
            .and_then(|r| r.exit(dir))
            .filter(|e| self.world.contains_key(&e.to_room))
            .ok_or_else(|| MudError::not_found("Alas, you cannot go that way..."))?;
        if exit.exit_info.contains(ExitFlags::CLOSED) {
            let keyword = if exit.keyword.is_empty() {
                "door"
            } else {
                fname(&exit.keyword)
            };
            return Err(MudError::invalid(format!("The {} seems to be closed.", keyword)));
        }
        if ch.is_casting() {
            return Err(MudError::invalid("You can't move while casting!"));
        }
        Ok(exit.to_room)
    }

    /* walks a character through an exit of its room, returning the new room */
    pub fn move_through_exit(&mut self, chid: DepotId, dir: Direction) -> MudResult<RoomVnum> {
        let to_room = self.check_exit(chid, dir)?;
        self.move_character(chid, to_room)?;
        Ok(to_room)
    }
}

impl CharData {
    pub fn affected_by_spell(&self, spell: SpellId) -> bool {
        self.affected.iter().any(|af| af.spell == spell)
    }
}

/*
 * Running totals for one (location, bonus type) pair.  Stacking types use
 * the sum, the others their best bonus plus their worst penalty.
 */
#[derive(Default)]
struct BonusTally {
    sum: i32,
    best: i32,
    worst: i32,
}

impl BonusTally {
    fn add(&mut self, modifier: i32) {
        self.sum += modifier;
        self.best = max(self.best, modifier);
        self.worst = min(self.worst, modifier);
    }
}

fn total_modifiers(mods: &[(ApplyType, BonusType, i32)]) -> BTreeMap<ApplyType, i32> {
    let mut tallies: BTreeMap<(ApplyType, BonusType), BonusTally> = BTreeMap::new();
    for (location, bonus, modifier) in mods {
        tallies.entry((*location, *bonus)).or_default().add(*modifier);
    }
    let mut totals = BTreeMap::new();
    for ((location, bonus), tally) in tallies {
        let value = if bonus.stacks() {
            tally.sum
        } else {
            tally.best + tally.worst
        };
        *totals.entry(location).or_insert(0) += value;
    }
    totals
}

impl DB {
    /* Insert an affect_type in a char_data structure */
    pub fn apply_affect(&mut self, chid: DepotId, af: AffectedType) -> MudResult<()> {
        self.get_character_mut(chid)?.affected.insert(0, af);
        self.affect_total(chid)
    }

    /* Call affect_remove with every spell of spelltype "skill"; returns how many went */
    pub fn remove_affect(&mut self, chid: DepotId, spell: SpellId) -> MudResult<usize> {
        let ch = self.get_character_mut(chid)?;
        let before = ch.affected.len();
        ch.affected.retain(|af| af.spell != spell);
        let removed = before - ch.affected.len();
        self.affect_total(chid)?;
        Ok(removed)
    }

    /*
     * Recomputes every effective value of a character from its base values,
     * its equipment and its affects.  Called after anything that changes one
     * of those, so the effective values are never stale.
     */
    pub fn affect_total(&mut self, chid: DepotId) -> MudResult<()> {
        let ch = self.get_character(chid)?;
        let mut mods = vec![];
        let mut flags = AffectFlags::empty();

        for pos in WearPos::ALL {
            let obj = match ch.equipment[pos.index()].and_then(|o| self.objs.get(o)) {
                Some(obj) => obj,
                None => continue,
            };
            if obj.obj_type == ObjType::Armor {
                /* a suit of armor and a shield; other pieces add up */
                let bonus = match pos {
                    WearPos::Body => BonusType::Armor,
                    WearPos::Shield => BonusType::Shield,
                    _ => BonusType::Untyped,
                };
                mods.push((ApplyType::Ac, bonus, obj.value[0]));
            }
            for af in &obj.affected {
                mods.push((af.location, af.bonus, af.modifier));
            }
        }
        for af in &ch.affected {
            if af.location != ApplyType::None {
                mods.push((af.location, af.bonus, af.modifier));
            }
            flags |= af.bitvector;
        }
        let totals = total_modifiers(&mods);
        let get = |loc: ApplyType| totals.get(&loc).copied().unwrap_or(0);

        let ch = self.get_character_mut(chid)?;
        ch.aff_abils = ch.real_abils;
        for stat in Stat::ALL {
            let score = ch.real_abils.get(stat) + get(ApplyType::stat(stat));
            ch.aff_abils.set(stat, score.clamp(0, MAX_ABILITY_SCORE));
        }
        ch.aff_flags = flags;
        ch.points.max_hit = max(1, ch.base_points.max_hit + get(ApplyType::MaxHit));
        ch.points.max_mana = max(0, ch.base_points.max_mana + get(ApplyType::MaxMana));
        ch.points.max_move = max(0, ch.base_points.max_move + get(ApplyType::MaxMove));
        ch.points.armor = ch.base_points.armor + get(ApplyType::Ac);
        ch.points.hitroll = ch.base_points.hitroll + get(ApplyType::Hitroll);
        ch.points.damroll = ch.base_points.damroll + get(ApplyType::Damroll);
        ch.points.damage_reduction =
            max(0, ch.base_points.damage_reduction + get(ApplyType::DamageReduction));

        ch.points.hit = min(ch.points.hit, ch.points.max_hit);
        ch.points.mana = min(ch.points.mana, ch.points.max_mana);
        ch.points.movem = min(ch.points.movem, ch.points.max_move);
        Ok(())
    }
}

/* object placement; every function expects the object detached (Nowhere) or detaches it */
impl DB {
    fn check_detached(&self, objid: DepotId) -> MudResult<()> {
        let obj = self.get_object(objid)?;
        if obj.location != ObjLocation::Nowhere {
            error!(
                "SYSERR: {} ({}) is already placed at {:?}",
                obj.short_description, objid, obj.location
            );
            return Err(MudError::invalid(format!(
                "{} is somewhere else already.",
                obj.short_description
            )));
        }
        Ok(())
    }

    /* give an object to a char   */
    pub fn obj_to_char(&mut self, objid: DepotId, chid: DepotId) -> MudResult<()> {
        self.check_detached(objid)?;
        self.get_character_mut(chid)?.carrying.insert(0, objid);
        self.get_object_mut(objid)?.location = ObjLocation::Carried(chid);
        Ok(())
    }

    /* take an object from a char */
    pub fn obj_from_char(&mut self, objid: DepotId) -> MudResult<()> {
        let chid = match self.get_object(objid)?.location {
            ObjLocation::Carried(chid) => chid,
            _ => return Err(MudError::invalid("You aren't carrying that.")),
        };
        if let Some(ch) = self.chars.get_mut(chid) {
            ch.carrying.retain(|o| *o != objid);
        }
        self.get_object_mut(objid)?.location = ObjLocation::Nowhere;
        Ok(())
    }

    pub fn equip_char(&mut self, chid: DepotId, objid: DepotId, pos: WearPos) -> MudResult<()> {
        self.check_detached(objid)?;
        let ch = self.get_character_mut(chid)?;
        if ch.equipment[pos.index()].is_some() {
            return Err(MudError::invalid("You are already wearing something there."));
        }
        ch.equipment[pos.index()] = Some(objid);
        self.get_object_mut(objid)?.location = ObjLocation::Worn(chid, pos);
        self.affect_total(chid)
    }

    pub fn unequip_char(&mut self, chid: DepotId, pos: WearPos) -> MudResult<DepotId> {
        let objid = self.get_character_mut(chid)?.equipment[pos.index()]
            .take()
            .ok_or_else(|| MudError::not_found("You aren't wearing anything there."))?;
        if let Some(obj) = self.objs.get_mut(objid) {
            obj.location = ObjLocation::Nowhere;
        }
        self.affect_total(chid)?;
        Ok(objid)
    }

    /* put an object in a room */
    pub fn obj_to_room(&mut self, objid: DepotId, room: RoomVnum) -> MudResult<()> {
        self.check_detached(objid)?;
        self.get_room_mut(room)?.contents.insert(0, objid);
        self.get_object_mut(objid)?.location = ObjLocation::InRoom(room);
        Ok(())
    }

    /* Take an object from a room */
    pub fn obj_from_room(&mut self, objid: DepotId) -> MudResult<()> {
        let room = match self.get_object(objid)?.location {
            ObjLocation::InRoom(room) => room,
            _ => return Err(MudError::invalid("That isn't lying here.")),
        };
        if let Some(room) = self.world.get_mut(&room) {
            room.contents.retain(|o| *o != objid);
        }
        self.get_object_mut(objid)?.location = ObjLocation::Nowhere;
        Ok(())
    }

    /* true when `inner` is `outer` or somewhere inside it */
    pub fn obj_is_within(&self, inner: DepotId, outer: DepotId) -> bool {
        let mut cur = inner;
        loop {
            if cur == outer {
                return true;
            }
            match self.objs.get(cur).map(|o| o.location) {
                Some(ObjLocation::InObj(parent)) => cur = parent,
                _ => return false,
            }
        }
    }

    /* put an object in an object (quaint)  */
    pub fn obj_to_obj(&mut self, objid: DepotId, container: DepotId) -> MudResult<()> {
        self.check_detached(objid)?;
        self.get_object(container)?;
        if self.obj_is_within(container, objid) {
            return Err(MudError::invalid("You can't put something inside itself."));
        }
        self.get_object_mut(container)?.contains.insert(0, objid);
        self.get_object_mut(objid)?.location = ObjLocation::InObj(container);
        Ok(())
    }

    /* remove an object from an object */
    pub fn obj_from_obj(&mut self, objid: DepotId) -> MudResult<()> {
        let container = match self.get_object(objid)?.location {
            ObjLocation::InObj(container) => container,
            _ => return Err(MudError::invalid("That isn't inside anything.")),
        };
        if let Some(c) = self.objs.get_mut(container) {
            c.contains.retain(|o| *o != objid);
        }
        self.get_object_mut(objid)?.location = ObjLocation::Nowhere;
        Ok(())
    }

    /* detach an object from whatever holds it */
    pub fn obj_from_anywhere(&mut self, objid: DepotId) -> MudResult<()> {
        match self.get_object(objid)?.location {
            ObjLocation::Nowhere => Ok(()),
            ObjLocation::Carried(_) => self.obj_from_char(objid),
            ObjLocation::Worn(chid, pos) => self.unequip_char(chid, pos).map(|_| ()),
            ObjLocation::InObj(_) => self.obj_from_obj(objid),
            ObjLocation::InRoom(_) => self.obj_from_room(objid),
        }
    }

    /* Extract an object from the world, with everything inside it */
    pub fn extract_obj(&mut self, objid: DepotId) -> MudResult<()> {
        self.obj_from_anywhere(objid)?;
        let contents = std::mem::take(&mut self.get_object_mut(objid)?.contains);
        for inner in contents {
            if let Some(obj) = self.objs.get_mut(inner) {
                obj.location = ObjLocation::Nowhere;
            }
            self.extract_obj(inner)?;
        }
        self.objs.remove(objid);
        Ok(())
    }

    /*
     * Marks a character for extraction at the end of the pulse.  Code
     * iterating over characters may still see it until then, with
     * notdeadyet set.
     */
    pub fn extract_char(&mut self, chid: DepotId) -> MudResult<()> {
        let ch = self.get_character_mut(chid)?;
        if !ch.notdeadyet {
            ch.notdeadyet = true;
            self.extractions.push(chid);
        }
        Ok(())
    }
}

impl Game {
    /* Extract a ch completely from the world, and leave his stuff behind */
    fn extract_char_final(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        self.events.cancel_for(chid);
        db.stop_fighting(chid);
        db.stop_fighting_against(chid);

        let (is_npc, in_room, desc) = {
            let ch = db.get_character(chid)?;
            (ch.is_npc(), ch.in_room, ch.desc)
        };
        if !is_npc {
            self.save_char(db, chid);
        }

        /* players keep their things in the player file, mobiles drop them */
        let mut things = std::mem::take(&mut db.get_character_mut(chid)?.carrying);
        for objid in &things {
            if let Some(obj) = db.objs.get_mut(*objid) {
                obj.location = ObjLocation::Nowhere;
            }
        }
        for pos in WearPos::ALL {
            if db.get_character(chid)?.equipment[pos.index()].is_some() {
                things.push(db.unequip_char(chid, pos)?);
            }
        }
        for objid in things {
            if is_npc && in_room != NOWHERE {
                db.obj_to_room(objid, in_room)?;
            } else {
                db.extract_obj(objid)?;
            }
        }

        if in_room != NOWHERE {
            db.char_from_room(chid)?;
        }
        if let Some(d) = desc.and_then(|d| self.descriptors.get_mut(d)) {
            d.character = None;
            d.state = ConClose;
        }
        db.chars.remove(chid);
        Ok(())
    }

    pub fn extract_pending_chars(&mut self, db: &mut DB) {
        for chid in std::mem::take(&mut db.extractions) {
            if !db.chars.contains(chid) {
                continue;
            }
            if let Err(err) = self.extract_char_final(db, chid) {
                error!("SYSERR: extracting {}: {}", chid, err);
                db.chars.remove(chid);
            }
        }
    }
}

/* ***********************************************************************
 * Here follows high-level versions of some earlier routines, ie functions
 * which incorporate the actual player-data
 *********************************************************************** */

/* exact word match against a namelist, ignoring case */
pub fn isname(s: &str, namelist: &str) -> bool {
    !s.is_empty()
        && namelist
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .any(|word| word.eq_ignore_ascii_case(s))
}

/* "2.sword" is the second sword; 0 means no match is possible */
pub fn get_number(name: &str) -> (usize, &str) {
    match name.split_once('.') {
        Some((num, rest)) if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => {
            (num.parse().unwrap_or(0), rest)
        }
        _ => (1, name),
    }
}

impl DB {
    pub fn get_char_room_vis(&self, ch: &CharData, name: &str) -> Option<DepotId> {
        if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("me") {
            return Some(ch.id);
        }
        let (mut number, name) = get_number(name);
        if number == 0 {
            return None;
        }
        for vid in &self.world.get(&ch.in_room)?.peoples {
            let vict = match self.chars.get(*vid) {
                Some(vict) => vict,
                None => continue,
            };
            if isname(name, &vict.name) && self.can_see(ch, vict) {
                number -= 1;
                if number == 0 {
                    return Some(*vid);
                }
            }
        }
        None
    }

    /* a player anywhere in the game, by exact name */
    pub fn get_player_vis(&self, ch: &CharData, name: &str) -> Option<DepotId> {
        self.chars
            .iter()
            .find(|vict| {
                !vict.is_npc()
                    && !vict.notdeadyet
                    && vict.in_room != NOWHERE
                    && vict.name.eq_ignore_ascii_case(name)
                    && self.can_see(ch, vict)
            })
            .map(|vict| vict.id)
    }

    /* search a given list for an object, and return a pointer to that object */
    pub fn get_obj_in_list_vis(
        &self,
        ch: &CharData,
        name: &str,
        list: &[DepotId],
    ) -> Option<DepotId> {
        let (mut number, name) = get_number(name);
        if number == 0 {
            return None;
        }
        for oid in list {
            let obj = match self.objs.get(*oid) {
                Some(obj) => obj,
                None => continue,
            };
            if isname(name, &obj.name) && self.can_see_obj(ch, obj) {
                number -= 1;
                if number == 0 {
                    return Some(*oid);
                }
            }
        }
        None
    }

    pub fn get_obj_in_equip_vis(&self, ch: &CharData, name: &str) -> Option<(WearPos, DepotId)> {
        WearPos::ALL.iter().find_map(|pos| {
            let oid = ch.equipment[pos.index()]?;
            let obj = self.objs.get(oid)?;
            (isname(name, &obj.name) && self.can_see_obj(ch, obj)).then_some((*pos, oid))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::CharAbilityData;

    fn affect(spell: SpellId, location: ApplyType, modifier: i32, bonus: BonusType) -> AffectedType {
        AffectedType {
            spell,
            duration: 5,
            modifier,
            location,
            bitvector: AffectFlags::empty(),
            bonus,
        }
    }

    fn player(db: &mut DB) -> DepotId {
        let chid = db.new_player("Tester");
        let ch = db.chars.get_mut(chid).unwrap();
        ch.real_abils = CharAbilityData::new([14, 12, 10, 10, 12, 8]);
        ch.base_points.max_hit = 20;
        ch.points.hit = 20;
        db.affect_total(chid).unwrap();
        chid
    }

    #[test]
    fn removing_an_affect_restores_the_scores() {
        let mut db = DB::test_world();
        let chid = player(&mut db);
        let before = db.chars.get(chid).unwrap().aff_abils;

        db.apply_affect(chid, affect(SpellId::Strength, ApplyType::Str, 4, BonusType::Enhancement))
            .unwrap();
        db.apply_affect(chid, affect(SpellId::MindFog, ApplyType::Wis, -4, BonusType::Untyped))
            .unwrap();
        assert_eq!(db.chars.get(chid).unwrap().get_stat(Stat::Str), 18);
        assert_eq!(db.chars.get(chid).unwrap().get_stat(Stat::Wis), 6);

        db.remove_affect(chid, SpellId::Strength).unwrap();
        db.remove_affect(chid, SpellId::MindFog).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().aff_abils, before);
    }

    #[test]
    fn typed_bonuses_take_the_best_and_worst() {
        let mut db = DB::test_world();
        let chid = player(&mut db);
        for (spell, modifier) in [(SpellId::Strength, 4), (SpellId::Transformation, 2)] {
            db.apply_affect(chid, affect(spell, ApplyType::Str, modifier, BonusType::Enhancement))
                .unwrap();
        }
        db.apply_affect(chid, affect(SpellId::Feeblemind, ApplyType::Str, -1, BonusType::Enhancement))
            .unwrap();
        /* 14 + max(4, 2) - 1 */
        assert_eq!(db.chars.get(chid).unwrap().get_stat(Stat::Str), 17);

        for spell in [SpellId::Bless, SpellId::Heroism] {
            db.apply_affect(chid, affect(spell, ApplyType::Hitroll, 1, BonusType::Untyped))
                .unwrap();
        }
        db.apply_affect(chid, affect(SpellId::Shield, ApplyType::Hitroll, 2, BonusType::Circumstance))
            .unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.hitroll, 4);
    }

    #[test]
    fn lowered_maximum_clamps_current_hit_points() {
        let mut db = DB::test_world();
        let chid = player(&mut db);
        db.apply_affect(chid, affect(SpellId::Nightmare, ApplyType::MaxHit, -5, BonusType::Untyped))
            .unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!((ch.points.hit, ch.points.max_hit), (15, 15));
    }

    #[test]
    fn containers_cannot_hold_themselves() {
        let mut db = DB::test_world();
        let bag = db.read_object(3022).unwrap();
        let inner = db.read_object(3022).unwrap();
        db.obj_to_obj(inner, bag).unwrap();
        assert!(matches!(db.obj_to_obj(bag, bag), Err(MudError::InvalidState(_))));
        assert!(matches!(db.obj_to_obj(bag, inner), Err(MudError::InvalidState(_))));
        assert_eq!(db.objs.get(bag).unwrap().location, ObjLocation::Nowhere);
    }

    #[test]
    fn extracting_a_container_removes_its_contents() {
        let mut db = DB::test_world();
        let bag = db.read_object(3022).unwrap();
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_obj(dagger, bag).unwrap();
        db.obj_to_room(bag, 3001).unwrap();
        db.extract_obj(bag).unwrap();
        assert!(!db.objs.contains(dagger));
        assert!(db.world[&3001].contents.is_empty());
    }

    #[test]
    fn worn_armor_counts_towards_armor_class() {
        let mut db = DB::test_world();
        let chid = player(&mut db);
        let jacket = db.read_object(3040).unwrap();
        db.equip_char(chid, jacket, WearPos::Body).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.armor, 2);
        assert_eq!(db.unequip_char(chid, WearPos::Body).unwrap(), jacket);
        assert_eq!(db.chars.get(chid).unwrap().points.armor, 0);
    }

    #[test]
    fn movement_checks_rooms_doors_and_casting() {
        let mut db = DB::test_world();
        let chid = player(&mut db);
        db.char_to_room(chid, 3016).unwrap();

        assert!(matches!(db.move_character(chid, 99999), Err(MudError::NotFound(_))));
        assert!(matches!(
            db.move_through_exit(chid, Direction::East),
            Err(MudError::InvalidState(_))
        ));
        assert!(matches!(
            db.move_through_exit(chid, Direction::Down),
            Err(MudError::NotFound(_))
        ));
        assert_eq!(db.chars.get(chid).unwrap().in_room, 3016);

        let back = db.move_through_exit(chid, Direction::North).unwrap();
        assert_eq!(back, 3015);
        assert!(db.world[&3015].peoples.contains(&chid));
        assert!(!db.world[&3016].peoples.contains(&chid));
    }

    #[test]
    fn numbered_names_pick_the_nth_match() {
        assert_eq!(get_number("2.sword"), (2, "sword"));
        assert_eq!(get_number("sword"), (1, "sword"));
        assert_eq!(get_number("0.sword"), (0, "sword"));
        assert!(isname("sword", "long sword"));
        assert!(isname("SWORD", "long sword"));
        assert!(!isname("swo", "long sword"));
    }
}
