/* ************************************************************************
*   File: act_offensive.rs                              Part of CircleMUD *
*  Usage: player-level commands of an offensive nature                    *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::cmp::min;

use crate::class::base_attack_bonus;
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::FeatId;
use crate::fight::pk_blocked;
use crate::interpreter::{is_number, one_argument, SCMD_EXPERTISE, SCMD_KILL, SCMD_POWERATTACK};
use crate::structs::{CombatMode, FightState, Position, RoomFlags, LVL_IMPL};
use crate::{Game, VictimRef, TO_CHAR, TO_NOTVICT, TO_ROOM};

/* combat expertise never trades more than this */
const MAX_EXPERTISE: i32 = 5;

pub fn do_hit(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    if arg.is_empty() {
        return Err(MudError::invalid(if subcmd == SCMD_KILL { "Kill who?" } else { "Hit who?" }));
    }

    let ch = db.get_character(chid)?;
    let victid = db
        .get_char_room_vis(ch, &arg)
        .ok_or_else(|| MudError::not_found("They don't seem to be here."))?;
    let vict = db.get_character(victid)?;

    if victid == chid {
        game.send_to_char(ch, "You hit yourself...OUCH!.\r\n");
        game.act(db, "$n hits $mself, and says OUCH!", false, Some(ch), None, None, TO_ROOM);
        return Ok(());
    }

    /* implementors slay outright */
    if subcmd == SCMD_KILL && !ch.is_npc() && ch.get_level() >= LVL_IMPL {
        game.act(db, "You chop $M to pieces!  Ah!  The blood!", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_CHAR);
        game.act(db, "$N chops you to pieces!", false, Some(vict), None, Some(VictimRef::Char(ch)), TO_CHAR);
        game.act(db, "$n brutally slays $N!", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_NOTVICT);
        return game.die(db, victid);
    }

    if pk_blocked(db, chid, victid) {
        return Err(MudError::invalid("You can't attack other players here."));
    }
    if db.get_room(ch.in_room)?.room_flags.contains(RoomFlags::PEACEFUL) {
        return Err(MudError::invalid("This room just has such a peaceful, easy feeling..."));
    }
    if ch.position != Position::Standing || ch.fighting == Some(victid) {
        return Err(MudError::invalid("You do the best you can!"));
    }

    game.set_fighting(db, chid, victid)?;
    game.hit(db, chid, victid)
}

pub fn do_flee(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    if ch.position < Position::Fighting {
        return Err(MudError::invalid("You are in pretty bad shape, unable to flee!"));
    }
    if !ch.is_fighting() {
        game.flee(db, chid)?;
        return Ok(());
    }
    if ch.fight_state == FightState::Fleeing {
        return Err(MudError::invalid("You are already looking for a way out!"));
    }

    /* the attempt is made on the next combat round instead of attacking */
    game.send_to_char(ch, "You look for a way out...\r\n");
    db.get_character_mut(chid)?.fight_state = FightState::Fleeing;
    Ok(())
}

/* powerattack <n> and expertise <n>; 0 or no number turns the mode off */
pub fn do_combat_mode(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let (feat, name) = if subcmd == SCMD_POWERATTACK {
        (FeatId::PowerAttack, "power attack")
    } else {
        (FeatId::CombatExpertise, "combat expertise")
    };
    let ch = db.get_character(chid)?;
    if !ch.feats.has_feat(feat) {
        return Err(MudError::invalid(format!("You don't know how to use {}.", name)));
    }

    let mut arg = String::new();
    one_argument(argument, &mut arg);
    let value = if arg.is_empty() {
        0
    } else if is_number(&arg) {
        arg.parse::<i32>().map_err(|_| MudError::invalid("That number is out of range."))?
    } else {
        return Err(MudError::invalid(format!("Usage: {} <number>", if subcmd == SCMD_EXPERTISE { "expertise" } else { "powerattack" })));
    };

    let limit = if subcmd == SCMD_POWERATTACK {
        base_attack_bonus(ch)
    } else {
        min(base_attack_bonus(ch), MAX_EXPERTISE)
    };
    if value > limit {
        return Err(MudError::invalid(format!("You can only use {} up to {}.", name, limit)));
    }

    let (mode, msg) = match value {
        0 => (CombatMode::None, format!("You stop using {}.\r\n", name)),
        n if subcmd == SCMD_POWERATTACK => (CombatMode::PowerAttack(n), format!("You will use {} for {}.\r\n", name, n)),
        n => (CombatMode::CombatExpertise(n), format!("You will use {} for {}.\r\n", name, n)),
    };
    game.send_to_char(ch, &msg);
    db.get_character_mut(chid)?.combat_mode = mode;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassId;
    use crate::config::Config;
    use crate::fight::compute_armor_class;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(3),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Fighter");
        db.chars.get_mut(chid).unwrap().class_levels.insert(ClassId::Warrior, 4);
        db.char_to_room(chid, 3016).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        (game, db, chid, d)
    }

    #[test]
    fn hitting_starts_a_fight_on_both_sides() {
        let (mut game, mut db, chid, _d) = setup();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();
        db.chars.get_mut(golem).unwrap().points.hit = 1000;

        do_hit(&mut game, &mut db, chid, "golem", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().fighting, Some(golem));
        assert_eq!(db.chars.get(golem).unwrap().fighting, Some(chid));
        assert!(db.combat_list.contains(&chid));

        let err = do_hit(&mut game, &mut db, chid, "golem", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You do the best you can!");
        let err = do_hit(&mut game, &mut db, chid, "dragon", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "They don't seem to be here.");
    }

    #[test]
    fn peaceful_rooms_and_players_are_off_limits() {
        let (mut game, mut db, chid, _d) = setup();
        let other = db.new_player("Victim");
        db.char_to_room(other, 3016).unwrap();
        assert_eq!(
            do_hit(&mut game, &mut db, chid, "victim", 0, 0).unwrap_err().to_string(),
            "You can't attack other players here."
        );

        let guard = db.read_mobile(3060).unwrap();
        db.move_character(chid, 3001).unwrap();
        db.char_to_room(guard, 3001).unwrap();
        assert_eq!(
            do_hit(&mut game, &mut db, chid, "guard", 0, 0).unwrap_err().to_string(),
            "This room just has such a peaceful, easy feeling..."
        );
        assert!(db.chars.get(chid).unwrap().fighting.is_none());
    }

    #[test]
    fn fleeing_waits_for_the_combat_round() {
        let (mut game, mut db, chid, d) = setup();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();
        game.set_fighting(&mut db, chid, golem).unwrap();

        do_flee(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().fight_state, FightState::Fleeing);
        assert!(game.take_output(d).contains("You look for a way out"));
        assert!(do_flee(&mut game, &mut db, chid, "", 0, 0).is_err());
    }

    #[test]
    fn combat_modes_need_the_feat_and_respect_the_limit() {
        let (mut game, mut db, chid, _d) = setup();
        let err = do_combat_mode(&mut game, &mut db, chid, "2", 0, SCMD_POWERATTACK).unwrap_err();
        assert_eq!(err.to_string(), "You don't know how to use power attack.");

        db.grant_feat(chid, FeatId::PowerAttack, None).unwrap();
        db.grant_feat(chid, FeatId::CombatExpertise, None).unwrap();
        do_combat_mode(&mut game, &mut db, chid, "3", 0, SCMD_POWERATTACK).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().combat_mode, CombatMode::PowerAttack(3));
        assert!(do_combat_mode(&mut game, &mut db, chid, "9", 0, SCMD_POWERATTACK).is_err());

        let before = compute_armor_class(db.chars.get(chid).unwrap());
        do_combat_mode(&mut game, &mut db, chid, "2", 0, SCMD_EXPERTISE).unwrap();
        assert_eq!(compute_armor_class(db.chars.get(chid).unwrap()), before + 2);

        do_combat_mode(&mut game, &mut db, chid, "", 0, SCMD_EXPERTISE).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().combat_mode, CombatMode::None);
    }
}
