/* ************************************************************************
*   File: magic.rs                                      Part of CircleMUD *
*  Usage: low-level functions for magic; spell template code              *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::cmp::min;

use log::error;

use crate::config::{NOEFFECT, PK_ALLOWED};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::FeatId;
use crate::fight::{pk_blocked, DamageSource};
use crate::spells::{
    spell_enchant_weapon, spell_identify, AffectTemplate, Domain, SpellId, SpellRoutine,
    SpellTarget,
};
use crate::structs::{AffectFlags, AffectedType, CastTarget, LVL_IMMORT};
use crate::{Game, VictimRef, TO_CHAR, TO_ROOM};

impl Game {
    /* affects lose one tick; expired ones wear off with their message */
    pub fn affect_update(&mut self, db: &mut DB) {
        for chid in db.chars.ids() {
            let expired: Vec<SpellId> = match db.chars.get_mut(chid) {
                Some(ch) if !ch.notdeadyet => {
                    let mut expired = vec![];
                    for af in ch.affected.iter_mut() {
                        if af.duration >= 1 {
                            af.duration -= 1;
                        } else if af.duration == -1 {
                            /* No action */
                        } else if !expired.contains(&af.spell) {
                            expired.push(af.spell);
                        }
                    }
                    expired
                }
                _ => continue,
            };
            for spell in expired {
                if let Err(err) = db.remove_affect(chid, spell) {
                    error!("SYSERR: affect_update on {}: {}", chid, err);
                    continue;
                }
                if let (Some(msg), Some(ch)) = (spell.info().wear_off, db.chars.get(chid)) {
                    self.send_to_char(ch, &format!("{}\r\n", msg));
                }
            }
        }
    }

    /*
     * The spell goes off: the routine of the spell table entry runs
     * against the target chosen when the casting began.
     */
    pub fn call_magic(
        &mut self,
        db: &mut DB,
        chid: DepotId,
        spell: SpellId,
        level: u8,
        target: CastTarget,
    ) -> MudResult<()> {
        let info = spell.info();
        match info.routine {
            SpellRoutine::Identify | SpellRoutine::Enchant => {
                let objid = match target {
                    CastTarget::Obj(objid) if db.objs.contains(objid) => objid,
                    _ => return Err(MudError::not_found("The object you were casting on is gone.")),
                };
                self.mag_alter_objs(db, level, chid, objid, spell)
            }
            SpellRoutine::Utility(msg) => {
                let ch = db.get_character(chid)?;
                self.send_to_char(ch, msg);
                self.act(db, "$n completes an elaborate gesture.", true, Some(ch), None, None, TO_ROOM);
                Ok(())
            }
            _ if info.targets == SpellTarget::Area => self.mag_areas(db, level, chid, spell),
            _ => {
                let victid = match target {
                    CastTarget::Char(victid) => victid,
                    CastTarget::None | CastTarget::Obj(_) => chid,
                };
                let ch = db.get_character(chid)?;
                let valid = db
                    .chars
                    .get(victid)
                    .map_or(false, |v| !v.notdeadyet && v.in_room == ch.in_room);
                if !valid {
                    return Err(MudError::not_found("Your target is no longer here."));
                }
                if info.violent() && pk_blocked(db, chid, victid) {
                    return Err(MudError::invalid("You can't attack other players here."));
                }
                self.apply_routine(db, level, chid, victid, spell)
            }
        }
    }

    fn apply_routine(
        &mut self,
        db: &mut DB,
        level: u8,
        chid: DepotId,
        victid: DepotId,
        spell: SpellId,
    ) -> MudResult<()> {
        match spell.info().routine {
            SpellRoutine::Damage { .. } => {
                self.mag_damage(db, level, chid, victid, spell)?;
                Ok(())
            }
            SpellRoutine::Heal { .. } => self.mag_points(db, level, chid, victid, spell),
            SpellRoutine::Affect(templates) => self.mag_affects(db, level, chid, victid, spell, templates),
            SpellRoutine::Cure(bits) => self.mag_unaffects(db, chid, victid, bits),
            SpellRoutine::Identify | SpellRoutine::Enchant | SpellRoutine::Utility(_) => {
                error!("SYSERR: {} has no character routine.", spell.name());
                Ok(())
            }
        }
    }

    pub fn mag_damage(
        &mut self,
        db: &mut DB,
        level: u8,
        chid: DepotId,
        victid: DepotId,
        spell: SpellId,
    ) -> MudResult<i32> {
        let (num, size, per_level, max, dam_type) = match spell.info().routine {
            SpellRoutine::Damage {
                num,
                size,
                per_level,
                max,
                dam_type,
            } => (num, size, per_level, max, dam_type),
            _ => return Ok(0),
        };
        let mut ndice = num;
        if per_level > 0 {
            ndice += level as i32 / per_level;
        }
        let ndice = min(max, ndice).max(1);
        let dam = self.rng.dice(ndice, size);

        /* and finally, inflict the damage */
        self.damage(db, chid, victid, dam, dam_type, DamageSource::Spell(spell))
    }

    /*
     * Every spell that does an affect comes through here.  Casting it
     * again on someone already affected renews the affect.
     */
    pub fn mag_affects(
        &mut self,
        db: &mut DB,
        level: u8,
        chid: DepotId,
        victid: DepotId,
        spell: SpellId,
        templates: &[AffectTemplate],
    ) -> MudResult<()> {
        let victim = db.get_character(victid)?;
        if victim.affected_by_spell(spell) {
            db.remove_affect(victid, spell)?;
        }
        for template in templates {
            db.apply_affect(
                victid,
                AffectedType {
                    spell,
                    duration: template.duration + level as i32 / 2,
                    modifier: template.modifier,
                    location: template.location,
                    bitvector: template.bitvector,
                    bonus: template.bonus,
                },
            )?;
        }

        let (to_vict, to_room) = affect_messages(spell);
        let victim = db.get_character(victid)?;
        let ch = db.get_character(chid)?;
        self.act(db, to_vict, false, Some(victim), None, Some(VictimRef::Char(ch)), TO_CHAR);
        self.act(db, to_room, true, Some(victim), None, Some(VictimRef::Char(ch)), TO_ROOM);
        Ok(())
    }

    pub fn mag_points(
        &mut self,
        db: &mut DB,
        level: u8,
        chid: DepotId,
        victid: DepotId,
        spell: SpellId,
    ) -> MudResult<()> {
        let (num, size, max_bonus) = match spell.info().routine {
            SpellRoutine::Heal { num, size, max_bonus } => (num, size, max_bonus),
            _ => return Ok(()),
        };
        let mut healing = self.rng.dice(num, size) + min(level as i32, max_bonus);
        let ch = db.get_character(chid)?;
        if ch.feats.has_feat(FeatId::HealingDomainEmpower)
            && Domain::Healing.info().spells.contains(&spell)
        {
            healing += healing / 2;
        }

        let victim = db.get_character_mut(victid)?;
        victim.points.hit = min(victim.points.max_hit, victim.points.hit + healing);
        let msg = if healing >= 50 {
            "A warm feeling floods your body.\r\n"
        } else if healing >= 20 {
            "You feel a lot better!\r\n"
        } else {
            "You feel better.\r\n"
        };
        let victim = db.get_character(victid)?;
        self.send_to_char(victim, msg);
        Ok(())
    }

    pub fn mag_unaffects(
        &mut self,
        db: &mut DB,
        chid: DepotId,
        victid: DepotId,
        bits: AffectFlags,
    ) -> MudResult<()> {
        let spells: Vec<SpellId> = db
            .get_character(victid)?
            .affected
            .iter()
            .filter(|af| af.bitvector.intersects(bits))
            .map(|af| af.spell)
            .collect();
        if spells.is_empty() {
            self.send_to_char(db.get_character(chid)?, NOEFFECT);
            return Ok(());
        }
        for spell in spells {
            db.remove_affect(victid, spell)?;
        }
        let victim = db.get_character(victid)?;
        let to_vict = if bits.contains(AffectFlags::CURSE) {
            "You don't feel so unlucky."
        } else {
            "A warm feeling runs through your body!"
        };
        self.act(db, to_vict, false, Some(victim), None, None, TO_CHAR);
        self.act(db, "$n looks better.", true, Some(victim), None, None, TO_ROOM);
        Ok(())
    }

    /*
     * Area spells hit everyone in the room on the other side, or help
     * everyone on the caster's side when they are not violent.
     */
    pub fn mag_areas(&mut self, db: &mut DB, level: u8, chid: DepotId, spell: SpellId) -> MudResult<()> {
        let info = spell.info();
        let violent = info.violent();
        let ch = db.get_character(chid)?;
        let (to_char, to_room) = if violent {
            (
                format!("You unleash {} all around you!", info.name),
                format!("$n unleashes {} all around $m!", info.name),
            )
        } else {
            (
                format!("You call upon {} for everyone nearby.", info.name),
                format!("$n calls upon {} for everyone nearby.", info.name),
            )
        };
        self.act(db, &to_char, false, Some(ch), None, None, TO_CHAR);
        self.act(db, &to_room, false, Some(ch), None, None, TO_ROOM);

        let room = db.get_room(ch.in_room)?;
        let targets: Vec<DepotId> = room
            .peoples
            .iter()
            .copied()
            .filter(|tch_id| {
                let tch = match db.chars.get(*tch_id) {
                    Some(tch) if !tch.notdeadyet => tch,
                    _ => return false,
                };
                if !violent {
                    /* helping everybody who is not out to get the caster */
                    return tch.fighting != Some(chid);
                }
                /*
                 * The skips: 1: the caster
                 *            2: immortals
                 *            3: if no pk on this mud, skips over all players
                 *            4: mobiles don't hurt each other
                 */
                if *tch_id == chid {
                    return false;
                }
                if !tch.is_npc() && tch.get_level() >= LVL_IMMORT {
                    return false;
                }
                if !PK_ALLOWED && !ch.is_npc() && !tch.is_npc() {
                    return false;
                }
                !(ch.is_npc() && tch.is_npc())
            })
            .collect();

        for tch_id in targets {
            /* Doesn't matter if they die here so we don't check. -gg 6/24/98 */
            if db.chars.get(tch_id).map_or(true, |t| t.notdeadyet) {
                continue;
            }
            if db.chars.get(chid).map_or(true, |c| c.notdeadyet) {
                break;
            }
            self.apply_routine(db, level, chid, tch_id, spell)?;
        }
        Ok(())
    }

    pub fn mag_alter_objs(
        &mut self,
        db: &mut DB,
        level: u8,
        chid: DepotId,
        objid: DepotId,
        spell: SpellId,
    ) -> MudResult<()> {
        match spell.info().routine {
            SpellRoutine::Identify => {
                let text = spell_identify(db, objid)?;
                self.send_to_char(db.get_character(chid)?, &text);
            }
            SpellRoutine::Enchant => {
                spell_enchant_weapon(db, level, objid)?;
                let ch = db.get_character(chid)?;
                let obj = db.get_object(objid)?;
                self.act(db, "$p glows blue.", false, Some(ch), Some(obj), None, TO_CHAR);
            }
            _ => {}
        }
        Ok(())
    }
}

/* these use act(), don't put the \r\n */
fn affect_messages(spell: SpellId) -> (&'static str, &'static str) {
    match spell {
        SpellId::MageArmor => ("You feel someone protecting you.", "$n is surrounded by a shimmering field."),
        SpellId::Shield => ("A shield of force springs up around you.", "A shield of force springs up around $n."),
        SpellId::MirrorImage | SpellId::GreaterMirrorImage => {
            ("Several images of yourself appear around you.", "Several images of $n appear around $m.")
        }
        SpellId::Blur | SpellId::Displacement => ("Your outline becomes blurry.", "$n's outline becomes blurry."),
        SpellId::Haste => ("You feel yourself speed up.", "$n begins to move much faster."),
        SpellId::Stoneskin => ("Your skin hardens to stone.", "$n's skin takes on a stony texture."),
        SpellId::Ironskin => ("Your skin turns to iron.", "$n's skin takes on an iron sheen."),
        SpellId::Barkskin => ("Your skin becomes rough as bark.", "$n's skin becomes rough as bark."),
        SpellId::FireShield => ("You are surrounded by a shield of flames.", "$n is surrounded by a shield of flames."),
        SpellId::AcidSheath => ("A sheath of acid covers your body.", "A sheath of acid covers $n's body."),
        SpellId::GreaterInvis => ("You vanish.", "$n slowly fades out of existence."),
        SpellId::DetectInvis => ("Your eyes tingle.", "$n's eyes briefly glow."),
        SpellId::Strength | SpellId::Endurance | SpellId::Transformation => {
            ("You feel stronger!", "$n's muscles bulge.")
        }
        SpellId::Grace => ("You feel more agile.", "$n moves with sudden grace."),
        SpellId::Charisma => ("You feel more charming.", "$n suddenly looks more charming."),
        SpellId::Heroism | SpellId::GreaterHeroism | SpellId::Bless => ("You feel righteous.", "$n looks inspired."),
        SpellId::Feeblemind => ("Your mind goes blank.", "$n looks very confused."),
        SpellId::MindFog => ("A fog settles over your thoughts.", "$n's eyes glaze over."),
        SpellId::RainbowPattern => ("The swirling colours leave you dazed.", "$n looks dazed."),
        SpellId::DivinePower => ("Divine power fills you.", "$n glows with divine power."),
        SpellId::MagicWeapon => ("Your weapon hand tingles with magic.", "$n's weapon gleams."),
        _ => ("You feel a strange magic take hold of you.", "$n is briefly surrounded by a faint glow."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassId;
    use crate::config::Config;
    use crate::structs::CharAbilityData;

    fn caster() -> (Game, DB, DepotId) {
        let game = Game::new(Config {
            seed: Some(21),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Merlin");
        {
            let ch = db.chars.get_mut(chid).unwrap();
            ch.real_abils = CharAbilityData::new([10, 12, 12, 18, 10, 10]);
            ch.class_levels.insert(ClassId::Wizard, 4);
            ch.base_points.max_hit = 20;
            ch.points.hit = 20;
        }
        db.affect_total(chid).unwrap();
        db.char_to_room(chid, 3016).unwrap();
        (game, db, chid)
    }

    #[test]
    fn mage_armor_wears_off() {
        let (mut game, mut db, chid) = caster();
        game.call_magic(&mut db, chid, SpellId::MageArmor, 4, CastTarget::Char(chid))
            .unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.points.armor, 4);
        assert_eq!(ch.affected[0].duration, 26);

        for _ in 0..26 {
            game.affect_update(&mut db);
        }
        assert!(db.chars.get(chid).unwrap().affected_by_spell(SpellId::MageArmor));
        game.affect_update(&mut db);
        let ch = db.chars.get(chid).unwrap();
        assert!(!ch.affected_by_spell(SpellId::MageArmor));
        assert_eq!(ch.points.armor, 0);
    }

    #[test]
    fn recasting_renews_instead_of_stacking() {
        let (mut game, mut db, chid) = caster();
        game.call_magic(&mut db, chid, SpellId::Strength, 4, CastTarget::Char(chid))
            .unwrap();
        game.affect_update(&mut db);
        game.call_magic(&mut db, chid, SpellId::Strength, 4, CastTarget::Char(chid))
            .unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.affected.len(), 1);
        assert_eq!(ch.affected[0].duration, 14);
        assert_eq!(ch.get_stat(crate::structs::Stat::Str), 14);
    }

    #[test]
    fn area_damage_spares_the_caster() {
        let (mut game, mut db, chid) = caster();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();
        let other = db.new_player("Bystander");
        db.chars.get_mut(other).unwrap().points.hit = 10;
        db.char_to_room(other, 3016).unwrap();

        game.call_magic(&mut db, chid, SpellId::BurningHands, 4, CastTarget::None)
            .unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.hit, 20);
        assert_eq!(db.chars.get(other).unwrap().points.hit, 10);
        assert!(db.chars.get(golem).unwrap().points.hit < 30);
        assert_eq!(db.chars.get(golem).unwrap().fighting, Some(chid));
    }

    #[test]
    fn healing_stops_at_the_maximum() {
        let (mut game, mut db, chid) = caster();
        db.chars.get_mut(chid).unwrap().points.hit = 15;
        game.call_magic(&mut db, chid, SpellId::Heal, 10, CastTarget::Char(chid))
            .unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.hit, 20);
    }

    #[test]
    fn spells_need_their_target_present() {
        let (mut game, mut db, chid) = caster();
        let rat = db.read_mobile(3071).unwrap();
        db.char_to_room(rat, 3017).unwrap();
        assert!(matches!(
            game.call_magic(&mut db, chid, SpellId::MagicMissile, 4, CastTarget::Char(rat)),
            Err(MudError::NotFound(_))
        ));
    }
}
