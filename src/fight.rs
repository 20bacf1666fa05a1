/* ************************************************************************
*   File: fight.rs                                      Part of CircleMUD *
*  Usage: Combat system                                                   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::cmp::{max, min};

use log::error;

use crate::class::base_attack_bonus;
use crate::config::{MAX_EXP_GAIN, MAX_EXP_LOSS, MAX_NPC_CORPSE_TIME, MAX_PC_CORPSE_TIME, PK_ALLOWED};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::{FeatId, WeaponFamily};
use crate::spells::{DamType, SpellId};
use crate::structs::{
    CombatMode, Direction, FightState, MobFlags, ObjData, ObjType, Position, RoomFlags, Stat,
    WearFlags, WearPos, NOWHERE, PULSE_VIOLENCE,
};
use crate::{Game, VictimRef, TO_CHAR, TO_NOTVICT, TO_ROOM, TO_SLEEP, TO_VICT};

pub struct AttackHitType {
    pub singular: &'static str,
    pub plural: &'static str,
}

/* Weapon attack texts */
pub const ATTACK_HIT_TEXT: [AttackHitType; 15] = [
    AttackHitType { singular: "hit", plural: "hits" }, /* 0 */
    AttackHitType { singular: "sting", plural: "stings" },
    AttackHitType { singular: "whip", plural: "whips" },
    AttackHitType { singular: "slash", plural: "slashes" },
    AttackHitType { singular: "bite", plural: "bites" },
    AttackHitType { singular: "bludgeon", plural: "bludgeons" }, /* 5 */
    AttackHitType { singular: "crush", plural: "crushes" },
    AttackHitType { singular: "pound", plural: "pounds" },
    AttackHitType { singular: "claw", plural: "claws" },
    AttackHitType { singular: "maul", plural: "mauls" },
    AttackHitType { singular: "thrash", plural: "thrashes" }, /* 10 */
    AttackHitType { singular: "pierce", plural: "pierces" },
    AttackHitType { singular: "blast", plural: "blasts" },
    AttackHitType { singular: "punch", plural: "punches" },
    AttackHitType { singular: "stab", plural: "stabs" },
];

/* what did the damage, for the messages */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DamageSource {
    /* index into ATTACK_HIT_TEXT */
    Weapon(usize),
    Spell(SpellId),
}

fn attack_dam_type(w_type: usize) -> DamType {
    match w_type {
        1 | 4 | 11 | 14 => DamType::Piercing,
        2 | 3 | 8 => DamType::Slashing,
        _ => DamType::Bludgeoning,
    }
}

/* 10 + DEX bonus + armor applies + combat expertise */
pub fn compute_armor_class(ch: &crate::structs::CharData) -> i32 {
    let expertise = match ch.combat_mode {
        CombatMode::CombatExpertise(n) => n,
        _ => 0,
    };
    10 + ch.stat_bonus(Stat::Dex) + ch.points.armor + expertise
}

/* everything added to the d20 except weapon feats */
pub fn compute_attack_bonus(ch: &crate::structs::CharData) -> i32 {
    let penalty = match ch.combat_mode {
        CombatMode::PowerAttack(n) | CombatMode::CombatExpertise(n) => n,
        CombatMode::None => 0,
    };
    base_attack_bonus(ch) + ch.stat_bonus(Stat::Str) + ch.points.hitroll - penalty
}

/*
 * Damage left after the victim's defences: damage reduction soaks
 * physical damage, then the resistance percentage applies (negative
 * resistances are vulnerabilities).
 */
pub fn mitigate(victim: &crate::structs::CharData, dam: i32, dam_type: DamType) -> i32 {
    let mut dam = dam;
    if dam_type.is_physical() {
        dam -= victim.points.damage_reduction;
    }
    let resist = victim.resistances.get(&dam_type).copied().unwrap_or(0);
    dam = dam * (100 - resist) / 100;
    max(0, dam)
}

/* players can't be attacked by players while pk is off */
pub fn pk_blocked(db: &DB, chid: DepotId, victid: DepotId) -> bool {
    if PK_ALLOWED || chid == victid {
        return false;
    }
    match (db.chars.get(chid), db.chars.get(victid)) {
        (Some(ch), Some(vict)) => !ch.is_npc() && !vict.is_npc(),
        _ => false,
    }
}

pub fn replace_string(str: &str, weapon_singular: &str, weapon_plural: &str) -> String {
    str.replace("#w", weapon_singular).replace("#W", weapon_plural)
}

impl DB {
    /* remove a char from the list of fighting chars */
    pub fn stop_fighting(&mut self, chid: DepotId) {
        self.combat_list.retain(|c| *c != chid);
        if let Some(ch) = self.chars.get_mut(chid) {
            ch.fighting = None;
            ch.fight_state = FightState::Ended;
            if ch.position == Position::Fighting {
                ch.position = Position::Standing;
            }
        }
    }

    /* everyone fighting the given character stops */
    pub fn stop_fighting_against(&mut self, victid: DepotId) {
        let attackers: Vec<DepotId> = self
            .combat_list
            .iter()
            .copied()
            .filter(|c| self.chars.get(*c).map_or(false, |ch| ch.fighting == Some(victid)))
            .collect();
        for chid in attackers {
            self.stop_fighting(chid);
        }
    }

    /* this round's order: initiative, highest first, ties broken by id */
    pub fn combat_order(&self) -> Vec<DepotId> {
        let mut order: Vec<(i32, DepotId)> = self
            .combat_list
            .iter()
            .filter_map(|id| self.chars.get(*id).map(|ch| (ch.initiative, *id)))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, id)| id).collect()
    }
}

impl Game {
    /* start one char fighting another, rolling its initiative */
    pub fn set_fighting(&mut self, db: &mut DB, chid: DepotId, victid: DepotId) -> MudResult<()> {
        if chid == victid {
            return Ok(());
        }
        db.get_character(victid)?;
        let ch = db.get_character(chid)?;
        if ch.fighting.is_some() {
            return Ok(());
        }
        let mut initiative = self.rng.d20() + ch.stat_bonus(Stat::Dex);
        if ch.feats.has_feat(FeatId::ImprovedInitiative) {
            initiative += 4;
        }

        let ch = db.get_character_mut(chid)?;
        ch.fighting = Some(victid);
        ch.fight_state = FightState::Engaged;
        ch.initiative = initiative;
        if ch.position > Position::Fighting {
            ch.position = Position::Fighting;
        }
        if !db.combat_list.contains(&chid) {
            db.combat_list.push(chid);
        }
        Ok(())
    }

    /* message for doing damage with a weapon */
    fn dam_message(&mut self, db: &DB, dam: i32, chid: DepotId, victid: DepotId, w_type: usize) {
        struct DamWeaponType {
            to_room: &'static str,
            to_char: &'static str,
            to_victim: &'static str,
        }
        const DAM_WEAPONS: [DamWeaponType; 9] = [
            /* use #w for singular (i.e. "slash") and #W for plural (i.e. "slashes") */
            DamWeaponType {
                to_room: "$n tries to #w $N, but misses.",
                to_char: "You try to #w $N, but miss.",
                to_victim: "$n tries to #w you, but misses.",
            }, /* 0: 0     */
            DamWeaponType {
                to_room: "$n tickles $N as $e #W $M.",
                to_char: "You tickle $N as you #w $M.",
                to_victim: "$n tickles you as $e #W you.",
            }, /* 1: 1..2  */
            DamWeaponType {
                to_room: "$n barely #W $N.",
                to_char: "You barely #w $N.",
                to_victim: "$n barely #W you.",
            }, /* 2: 3..4  */
            DamWeaponType {
                to_room: "$n #W $N.",
                to_char: "You #w $N.",
                to_victim: "$n #W you.",
            }, /* 3: 5..6  */
            DamWeaponType {
                to_room: "$n #W $N hard.",
                to_char: "You #w $N hard.",
                to_victim: "$n #W you hard.",
            }, /* 4: 7..10  */
            DamWeaponType {
                to_room: "$n #W $N very hard.",
                to_char: "You #w $N very hard.",
                to_victim: "$n #W you very hard.",
            }, /* 5: 11..14  */
            DamWeaponType {
                to_room: "$n #W $N extremely hard.",
                to_char: "You #w $N extremely hard.",
                to_victim: "$n #W you extremely hard.",
            }, /* 6: 15..19  */
            DamWeaponType {
                to_room: "$n massacres $N to small fragments with $s #w.",
                to_char: "You massacre $N to small fragments with your #w.",
                to_victim: "$n massacres you to small fragments with $s #w.",
            }, /* 7: 19..23 */
            DamWeaponType {
                to_room: "$n OBLITERATES $N with $s deadly #w!!",
                to_char: "You OBLITERATE $N with your deadly #w!!",
                to_victim: "$n OBLITERATES you with $s deadly #w!!",
            }, /* 8: > 23   */
        ];

        let msgnum = match dam {
            d if d <= 0 => 0,
            1..=2 => 1,
            3..=4 => 2,
            5..=6 => 3,
            7..=10 => 4,
            11..=14 => 5,
            15..=19 => 6,
            20..=23 => 7,
            _ => 8,
        };
        let text = &ATTACK_HIT_TEXT[min(w_type, ATTACK_HIT_TEXT.len() - 1)];
        let (ch, victim) = match (db.chars.get(chid), db.chars.get(victid)) {
            (Some(ch), Some(victim)) => (ch, victim),
            _ => return,
        };

        /* damage message to onlookers */
        let buf = replace_string(DAM_WEAPONS[msgnum].to_room, text.singular, text.plural);
        self.act(db, &buf, false, Some(ch), None, Some(VictimRef::Char(victim)), TO_NOTVICT);

        /* damage message to damager */
        let buf = replace_string(DAM_WEAPONS[msgnum].to_char, text.singular, text.plural);
        self.act(db, &buf, false, Some(ch), None, Some(VictimRef::Char(victim)), TO_CHAR);

        /* damage message to damagee */
        let buf = replace_string(DAM_WEAPONS[msgnum].to_victim, text.singular, text.plural);
        self.act(
            db,
            &buf,
            false,
            Some(ch),
            None,
            Some(VictimRef::Char(victim)),
            TO_VICT | TO_SLEEP,
        );
    }

    fn spell_dam_message(&mut self, db: &DB, dam: i32, chid: DepotId, victid: DepotId, spell: SpellId) {
        let (ch, victim) = match (db.chars.get(chid), db.chars.get(victid)) {
            (Some(ch), Some(victim)) => (ch, victim),
            _ => return,
        };
        let name = spell.name();
        let (to_char, to_vict, to_room) = if dam > 0 {
            (
                format!("Your {} hits $N.", name),
                format!("$n's {} hits you.", name),
                format!("$n's {} hits $N.", name),
            )
        } else {
            (
                format!("$N shrugs off your {}.", name),
                format!("You shrug off $n's {}.", name),
                format!("$N shrugs off $n's {}.", name),
            )
        };
        if chid == victid {
            self.act(db, &to_char.replace("$N", "yourself"), false, Some(ch), None, None, TO_CHAR);
            return;
        }
        self.act(db, &to_char, false, Some(ch), None, Some(VictimRef::Char(victim)), TO_CHAR);
        self.act(
            db,
            &to_vict,
            false,
            Some(ch),
            None,
            Some(VictimRef::Char(victim)),
            TO_VICT | TO_SLEEP,
        );
        self.act(db, &to_room, false, Some(ch), None, Some(VictimRef::Char(victim)), TO_NOTVICT);
    }

    /*
     * Deals damage after the victim's defences, engages both sides and
     * handles death.  Returns the damage actually dealt.
     */
    pub fn damage(
        &mut self,
        db: &mut DB,
        chid: DepotId,
        victid: DepotId,
        dam: i32,
        dam_type: DamType,
        source: DamageSource,
    ) -> MudResult<i32> {
        let victim = db.get_character(victid)?;
        if victim.position == Position::Dead || victim.notdeadyet {
            return Ok(0);
        }
        db.get_character(chid)?;

        if chid != victid {
            if db.get_character(chid)?.fighting.is_none() {
                self.set_fighting(db, chid, victid)?;
            }
            if db.get_character(victid)?.fighting.is_none() {
                self.set_fighting(db, victid, chid)?;
            }
        }

        let dam = mitigate(db.get_character(victid)?, dam, dam_type);
        let (hit, max_hit) = {
            let victim = db.get_character_mut(victid)?;
            victim.points.hit -= dam;
            (victim.points.hit, victim.points.max_hit)
        };

        match source {
            DamageSource::Weapon(w_type) => self.dam_message(db, dam, chid, victid, w_type),
            DamageSource::Spell(spell) => self.spell_dam_message(db, dam, chid, victid, spell),
        }

        if hit <= 0 {
            self.kill_victim(db, chid, victid)?;
            return Ok(dam);
        }

        let victim = db.get_character(victid)?;
        if dam > 0 && hit < max_hit / 4 {
            if victim.mob_flagged(MobFlags::WIMPY) && victim.fighting.is_some() {
                db.get_character_mut(victid)?.fight_state = FightState::Fleeing;
            } else if !victim.is_npc() {
                self.send_to_char(victim, "You wish that your wounds would stop BLEEDING so much!\r\n");
            }
        }
        Ok(dam)
    }

    fn kill_victim(&mut self, db: &mut DB, chid: DepotId, victid: DepotId) -> MudResult<()> {
        {
            let victim = db.get_character_mut(victid)?;
            victim.position = Position::Dead;
        }
        let victim = db.get_character(victid)?;
        self.act(db, "$n is dead!  R.I.P.", false, Some(victim), None, None, TO_ROOM);
        self.send_to_char(victim, "You are dead!  Sorry...\r\n");

        if chid != victid && !db.get_character(chid)?.is_npc() {
            self.solo_gain(db, chid, victid)?;
            change_alignment(db, chid, victid)?;
        }
        self.die(db, victid)
    }

    fn solo_gain(&mut self, db: &mut DB, chid: DepotId, victid: DepotId) -> MudResult<()> {
        let victim = db.get_character(victid)?;
        let mut exp = min(MAX_EXP_GAIN, victim.points.exp / 3);
        if victim.is_npc() {
            exp = max(1, exp);
        } else {
            /* Calculate level-difference bonus? */
            exp = 0;
        }
        let ch = db.get_character(chid)?;
        if exp > 1 {
            self.send_to_char(ch, &format!("You receive {} experience points.\r\n", exp));
        } else if exp == 1 {
            self.send_to_char(ch, "You receive one lousy experience point.\r\n");
        }
        self.gain_exp(db, chid, exp)
    }

    fn death_cry(&mut self, db: &DB, chid: DepotId) {
        let ch = match db.chars.get(chid) {
            Some(ch) => ch,
            None => return,
        };
        self.act(
            db,
            "Your blood freezes as you hear $n's death cry.",
            false,
            Some(ch),
            None,
            None,
            TO_ROOM,
        );
        let neighbours: Vec<_> = match db.world.get(&ch.in_room) {
            Some(room) => Direction::ALL
                .iter()
                .filter_map(|dir| room.exit(*dir))
                .filter(|exit| !exit.is_closed() && exit.to_room != ch.in_room)
                .map(|exit| exit.to_room)
                .collect(),
            None => vec![],
        };
        for room in neighbours {
            self.send_to_room(db, room, "Your blood freezes as you hear someone's death cry.\r\n");
        }
    }

    /* the corpse takes everything the character had */
    fn make_corpse(&mut self, db: &mut DB, chid: DepotId) -> MudResult<DepotId> {
        let ch = db.get_character(chid)?;
        let in_room = ch.in_room;
        let corpse = ObjData {
            vnum: -1,
            name: format!("corpse {}", ch.name.to_lowercase()),
            short_description: format!("the corpse of {}", ch.get_name()),
            description: format!("The corpse of {} is lying here.", ch.get_name()),
            obj_type: ObjType::Corpse,
            wear_flags: WearFlags::TAKE,
            /* corpse identifier */
            value: [0, 0, 0, 1],
            weight: 100,
            timer: if ch.is_npc() {
                MAX_NPC_CORPSE_TIME
            } else {
                MAX_PC_CORPSE_TIME
            },
            ..Default::default()
        };
        let gold = ch.points.gold;
        let carrying = ch.carrying.clone();
        let worn: Vec<WearPos> = WearPos::ALL
            .iter()
            .copied()
            .filter(|pos| ch.equipment[pos.index()].is_some())
            .collect();
        let corpse_id = db.objs.push(corpse);

        /* transfer character's inventory to the corpse */
        for objid in carrying {
            db.obj_from_char(objid)?;
            db.obj_to_obj(objid, corpse_id)?;
        }
        /* transfer character's equipment to the corpse */
        for pos in worn {
            let objid = db.unequip_char(chid, pos)?;
            db.obj_to_obj(objid, corpse_id)?;
        }
        /* transfer gold */
        if gold > 0 {
            let money = db.objs.push(create_money(gold));
            db.obj_to_obj(money, corpse_id)?;
            db.get_character_mut(chid)?.points.gold = 0;
        }
        if in_room != NOWHERE {
            db.obj_to_room(corpse_id, in_room)?;
        }
        Ok(corpse_id)
    }

    /*
     * Mobiles leave the game; players lose half their experience and wake
     * up in the temple, without their belongings and with 1 hit point.
     */
    pub fn die(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        db.stop_fighting(chid);
        db.stop_fighting_against(chid);
        self.abort_casting(db, chid);

        let (is_npc, exp) = {
            let ch = db.get_character(chid)?;
            (ch.is_npc(), ch.points.exp)
        };
        if !is_npc {
            self.gain_exp(db, chid, -min(MAX_EXP_LOSS, exp / 2))?;
        }
        self.death_cry(db, chid);
        self.make_corpse(db, chid)?;

        if is_npc {
            return db.extract_char(chid);
        }

        let spells: Vec<SpellId> = db.get_character(chid)?.affected.iter().map(|af| af.spell).collect();
        for spell in spells {
            db.remove_affect(chid, spell)?;
        }
        let start = db.mortal_start_room;
        if db.get_character(chid)?.in_room != NOWHERE {
            db.char_from_room(chid)?;
        }
        db.char_to_room(chid, start)?;
        {
            let ch = db.get_character_mut(chid)?;
            ch.points.hit = 1;
            ch.position = Position::Standing;
            ch.combat_mode = CombatMode::None;
        }
        let ch = db.get_character(chid)?;
        self.send_to_char(ch, "\r\nYou awaken in the temple, naked and shivering, but alive.\r\n");
        self.act(db, "$n appears in the middle of the room, looking pale.", true, Some(ch), None, None, TO_ROOM);
        self.look_at_room(db, chid);
        self.save_char(db, chid);
        Ok(())
    }

    /* control the fights going on.  Called every 2 seconds from the heartbeat. */
    pub fn perform_violence(&mut self, db: &mut DB) {
        for chid in db.combat_order() {
            if let Err(err) = self.combat_turn(db, chid) {
                error!("SYSERR: combat round of {}: {}", chid, err);
                db.stop_fighting(chid);
            }
        }
    }

    fn combat_turn(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        let ch = match db.chars.get(chid) {
            Some(ch) if !ch.notdeadyet && ch.position > Position::Dead => ch,
            _ => {
                db.stop_fighting(chid);
                return Ok(());
            }
        };
        let victid = ch.fighting.filter(|v| {
            db.chars
                .get(*v)
                .map_or(false, |vict| !vict.notdeadyet && vict.in_room == ch.in_room)
        });
        let victid = match victid {
            Some(v) => v,
            None => {
                db.stop_fighting(chid);
                return Ok(());
            }
        };

        if ch.is_npc() {
            let ch = db.get_character_mut(chid)?;
            if ch.wait > 0 {
                ch.wait = ch.wait.saturating_sub(PULSE_VIOLENCE as u32);
                return Ok(());
            }
            if ch.position < Position::Fighting {
                ch.position = Position::Fighting;
                let ch = db.get_character(chid)?;
                self.act(db, "$n scrambles to $s feet!", true, Some(ch), None, None, TO_ROOM);
            }
        }

        let ch = db.get_character(chid)?;
        if ch.fight_state == FightState::Fleeing {
            self.flee(db, chid)?;
            return Ok(());
        }
        if ch.position < Position::Fighting {
            self.send_to_char(ch, "You can't fight while sitting!!\r\n");
            return Ok(());
        }
        if ch.is_casting() {
            return Ok(());
        }
        self.hit(db, chid, victid)
    }

    /* one melee attack */
    pub fn hit(&mut self, db: &mut DB, chid: DepotId, victid: DepotId) -> MudResult<()> {
        let ch = db.get_character(chid)?;
        let victim = db.get_character(victid)?;

        /* Do some sanity checking, in case someone flees, etc. */
        if ch.in_room != victim.in_room {
            if ch.fighting == Some(victid) {
                db.stop_fighting(chid);
            }
            return Ok(());
        }

        let wielded = ch.equipment[WearPos::Wield.index()]
            .and_then(|o| db.objs.get(o))
            .filter(|o| o.obj_type == ObjType::Weapon);
        let family = wielded.and_then(|w| WeaponFamily::from_index(w.value[2]));

        /* Find the weapon type (for display purposes only) */
        let w_type = match (wielded, ch.npc()) {
            (Some(w), _) => w.value[3].max(0) as usize,
            (None, Some(npc)) => npc.attack_type,
            (None, None) => 0,
        };
        let dam_type = family.map_or(attack_dam_type(w_type), |f| f.dam_type());

        let mut to_hit = compute_attack_bonus(ch);
        let mut dam_bonus = ch.stat_bonus(Stat::Str) + ch.points.damroll;
        if let CombatMode::PowerAttack(n) = ch.combat_mode {
            dam_bonus += n;
        }
        if let Some(family) = family {
            if ch.feats.has_combat_feat(FeatId::WeaponFocus, family) {
                to_hit += 1;
            }
            if ch.feats.has_combat_feat(FeatId::GreaterWeaponFocus, family) {
                to_hit += 1;
            }
            if ch.feats.has_combat_feat(FeatId::WeaponSpecialization, family) {
                dam_bonus += 2;
            }
            if ch.feats.has_combat_feat(FeatId::GreaterWeaponSpecialization, family) {
                dam_bonus += 2;
            }
        }

        /* roll the die and take your chances... */
        let diceroll = self.rng.d20();
        /*
         *  Victim asleep = hit, otherwise:
         *     1   = Automatic miss.
         *   2..19 = Checked vs. AC.
         *    20   = Automatic hit.
         */
        let hits = if diceroll == 20 || !victim.awake() {
            true
        } else if diceroll == 1 {
            false
        } else {
            diceroll + to_hit >= compute_armor_class(victim)
        };

        if !hits {
            /* the attacker missed the victim */
            self.damage(db, chid, victid, 0, dam_type, DamageSource::Weapon(w_type))?;
            return Ok(());
        }

        /* okay, we know the guy has been hit.  now calculate damage. */
        let mut dam = dam_bonus
            + match (wielded, ch.npc()) {
                (Some(w), _) => self.rng.dice(w.value[0], w.value[1]),
                (None, Some(npc)) => self.rng.dice(npc.damnodice, npc.damsizedice),
                (None, None) => self.rng.dice(1, 3),
            };

        /* sleeping victims take double damage */
        if victim.position <= Position::Sleeping {
            dam *= 2;
        }
        /* at least 1 hp damage min per hit */
        let dam = max(1, dam);
        self.damage(db, chid, victid, dam, dam_type, DamageSource::Weapon(w_type))?;
        Ok(())
    }

    /*
     * Try to run away through a random open exit.  Returns whether the
     * character escaped.
     */
    pub fn flee(&mut self, db: &mut DB, chid: DepotId) -> MudResult<bool> {
        let ch = db.get_character(chid)?;
        if ch.is_casting() {
            return Err(MudError::invalid("You can't move while casting!"));
        }
        let room = db.get_room(ch.in_room)?;
        let is_npc = ch.is_npc();
        let exits: Vec<Direction> = Direction::ALL
            .iter()
            .copied()
            .filter(|dir| match room.exit(*dir) {
                Some(exit) => {
                    !exit.is_closed()
                        && db.world.get(&exit.to_room).map_or(false, |to| {
                            !to.room_flags.contains(RoomFlags::DEATH)
                                && !(is_npc && to.room_flags.contains(RoomFlags::NO_MOB))
                        })
                }
                None => false,
            })
            .collect();

        self.act(db, "$n panics, and attempts to flee!", true, Some(ch), None, None, TO_ROOM);
        /* one chance in three to freeze */
        let escape = match self.rng.choose(&exits) {
            Some(dir) if self.rng.rand_number(1, 3) > 1 => Some(*dir),
            _ => None,
        };
        let dir = match escape {
            Some(dir) => dir,
            None => {
                self.send_to_char(db.get_character(chid)?, "PANIC!  You couldn't escape!\r\n");
                return Ok(false);
            }
        };

        let was_fighting = ch.fighting;
        db.stop_fighting(chid);
        let ch = db.get_character(chid)?;
        self.act(db, "$n has fled!", true, Some(ch), None, None, TO_ROOM);
        db.move_through_exit(chid, dir)?;
        let ch = db.get_character(chid)?;
        self.send_to_char(ch, "You flee head over heels.\r\n");
        self.act(db, "$n has arrived.", true, Some(ch), None, None, TO_ROOM);
        if !ch.is_npc() {
            if let Some(exp) = was_fighting.and_then(|v| db.chars.get(v)).map(|v| v.points.exp) {
                self.gain_exp(db, chid, -min(MAX_EXP_LOSS, exp / 10))?;
            }
            self.look_at_room(db, chid);
        }
        Ok(true)
    }
}

/* When ch kills victim */
pub fn change_alignment(db: &mut DB, chid: DepotId, victid: DepotId) -> MudResult<()> {
    /*
     * new alignment change algorithm: if you kill a monster with alignment A,
     * you move 1/16th of the way to having alignment -A.  Simple and fast.
     */
    let victim_align = db.get_character(victid)?.alignment;
    let ch = db.get_character_mut(chid)?;
    ch.alignment += (-victim_align - ch.alignment) / 16;
    Ok(())
}

pub fn create_money(amount: i64) -> ObjData {
    let (name, short) = if amount == 1 {
        ("coin gold", "a gold coin".to_string())
    } else {
        ("coins gold", format!("{} gold coins", amount))
    };
    ObjData {
        vnum: -1,
        name: name.to_string(),
        short_description: short,
        description: "A pile of gold coins is lying here.".to_string(),
        obj_type: ObjType::Money,
        wear_flags: WearFlags::TAKE,
        value: [min(amount, i32::MAX as i64) as i32, 0, 0, 0],
        weight: 1,
        timer: -1,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::structs::CharAbilityData;

    fn arena(seed: u64) -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(seed),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let hero = db.new_player("Hero");
        {
            let ch = db.chars.get_mut(hero).unwrap();
            ch.real_abils = CharAbilityData::new([16, 14, 10, 10, 12, 10]);
            ch.class_levels.insert(crate::class::ClassId::Warrior, 3);
            ch.base_points.max_hit = 40;
            ch.points.hit = 40;
        }
        db.affect_total(hero).unwrap();
        db.char_to_room(hero, 3016).unwrap();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();
        (game, db, hero, golem)
    }

    #[test]
    fn resistances_and_damage_reduction() {
        let (_, db, _, golem) = arena(1);
        let golem = db.chars.get(golem).unwrap();
        assert_eq!(mitigate(golem, 10, DamType::Slashing), 9);
        assert_eq!(mitigate(golem, 10, DamType::Fire), 15);
        assert_eq!(mitigate(golem, 10, DamType::Cold), 10);
        assert_eq!(mitigate(golem, 1, DamType::Bludgeoning), 0);
    }

    #[test]
    fn combat_order_sorts_by_initiative_then_id() {
        let (mut game, mut db, hero, golem) = arena(2);
        game.set_fighting(&mut db, hero, golem).unwrap();
        game.set_fighting(&mut db, golem, hero).unwrap();
        db.chars.get_mut(hero).unwrap().initiative = 5;
        db.chars.get_mut(golem).unwrap().initiative = 5;
        let expected = if hero < golem { vec![hero, golem] } else { vec![golem, hero] };
        assert_eq!(db.combat_order(), expected);
        db.chars.get_mut(golem).unwrap().initiative = 9;
        assert_eq!(db.combat_order(), vec![golem, hero]);
    }

    #[test]
    fn same_seed_same_fight() {
        let run = |seed| {
            let (mut game, mut db, hero, golem) = arena(seed);
            game.set_fighting(&mut db, hero, golem).unwrap();
            let mut trace = vec![];
            for _ in 0..5 {
                game.perform_violence(&mut db);
                trace.push((
                    db.chars.get(hero).map(|c| c.points.hit),
                    db.chars.get(golem).map(|c| c.points.hit),
                ));
            }
            trace
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn fights_end_when_the_opponent_leaves() {
        let (mut game, mut db, hero, golem) = arena(3);
        game.set_fighting(&mut db, hero, golem).unwrap();
        assert_eq!(db.chars.get(hero).unwrap().position, Position::Fighting);
        db.char_from_room(golem).unwrap();
        db.char_to_room(golem, 3015).unwrap();
        game.perform_violence(&mut db);
        let ch = db.chars.get(hero).unwrap();
        assert_eq!(ch.fighting, None);
        assert_eq!(ch.fight_state, FightState::Ended);
        assert_eq!(ch.position, Position::Standing);
        assert!(!db.combat_list.contains(&hero));
    }

    #[test]
    fn killing_a_mobile_leaves_a_corpse_and_gives_experience() {
        let (mut game, mut db, hero, _) = arena(4);
        let rat = db.read_mobile(3071).unwrap();
        db.char_to_room(rat, 3016).unwrap();
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_char(dagger, rat).unwrap();

        game.damage(&mut db, hero, rat, 100, DamType::Slashing, DamageSource::Weapon(3))
            .unwrap();
        game.extract_pending_chars(&mut db);

        assert!(!db.chars.contains(rat));
        assert!(db.chars.get(hero).unwrap().fighting.is_none());
        assert_eq!(db.chars.get(hero).unwrap().points.exp, 16);
        let corpse = db.world[&3016]
            .contents
            .iter()
            .copied()
            .find(|o| db.objs.get(*o).unwrap().obj_type == ObjType::Corpse)
            .unwrap();
        assert_eq!(db.objs.get(corpse).unwrap().contains, vec![dagger]);
    }

    #[test]
    fn dead_players_wake_up_in_the_temple() {
        let (mut game, mut db, hero, golem) = arena(5);
        let torch = db.read_object(3050).unwrap();
        db.obj_to_char(torch, hero).unwrap();
        game.damage(&mut db, golem, hero, 500, DamType::Bludgeoning, DamageSource::Weapon(7))
            .unwrap();
        let ch = db.chars.get(hero).unwrap();
        assert_eq!(ch.in_room, db.mortal_start_room);
        assert_eq!(ch.points.hit, 1);
        assert_eq!(ch.position, Position::Standing);
        assert!(ch.carrying.is_empty());
        assert!(db.chars.get(golem).unwrap().fighting.is_none());
        assert!(matches!(
            db.objs.get(torch).unwrap().location,
            crate::structs::ObjLocation::InObj(_)
        ));
    }

    #[test]
    fn wimpy_mobiles_try_to_flee() {
        let (mut game, mut db, hero, _) = arena(6);
        let rat = db.read_mobile(3071).unwrap();
        db.char_to_room(rat, 3016).unwrap();
        {
            let rat = db.chars.get_mut(rat).unwrap();
            rat.points.max_hit = 20;
            rat.points.hit = 20;
        }
        game.damage(&mut db, hero, rat, 16, DamType::Slashing, DamageSource::Weapon(3))
            .unwrap();
        assert_eq!(db.chars.get(rat).unwrap().points.hit, 4);
        assert_eq!(db.chars.get(rat).unwrap().fight_state, FightState::Fleeing);
    }
}
