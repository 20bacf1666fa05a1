/* ************************************************************************
*   File: act_wizard.rs                                 Part of CircleMUD *
*  Usage: Player-level god commands and other goodies                     *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use log::info;

use crate::class::{level_exp, parse_class};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::interpreter::{is_abbrev, is_number, one_argument, two_arguments, SCMD_SHUTDOWN};
use crate::structs::{RoomVnum, LVL_CAP, LVL_GOD};
use crate::util::BRF;
use crate::{Game, VictimRef, TO_CHAR, TO_NOTVICT, TO_ROOM, TO_VICT};

const OK: &str = "Okay.\r\n";

pub fn do_goto(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    if arg.is_empty() {
        return Err(MudError::invalid("You must supply a room number or name."));
    }

    let ch = db.get_character(chid)?;
    let location: RoomVnum = if is_number(&arg) {
        arg.parse::<RoomVnum>()
            .ok()
            .filter(|vnum| db.world.contains_key(vnum))
            .ok_or_else(|| MudError::not_found("No room exists with that number."))?
    } else {
        let victid = db
            .get_player_vis(ch, &arg)
            .or_else(|| db.get_char_room_vis(ch, &arg))
            .ok_or_else(|| MudError::not_found("No such creature around, no such room."))?;
        db.get_character(victid)?.in_room
    };
    if location == ch.in_room {
        return Err(MudError::invalid("You are already there."));
    }

    game.act(db, "$n disappears in a puff of smoke.", true, Some(ch), None, None, TO_ROOM);
    db.move_character(chid, location)?;
    let ch = db.get_character(chid)?;
    game.act(db, "$n appears with an ear-splitting bang.", true, Some(ch), None, None, TO_ROOM);
    game.look_at_room(db, chid);
    Ok(())
}

pub fn do_load(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut kind = String::new();
    let mut num = String::new();
    two_arguments(argument, &mut kind, &mut num);

    if kind.is_empty() || num.is_empty() || !num.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(MudError::invalid("Usage: load { obj | mob } <number>"));
    }
    let vnum: i32 = num
        .parse()
        .map_err(|_| MudError::invalid("That is not a number."))?;
    let in_room = db.get_character(chid)?.in_room;

    if is_abbrev(&kind, "mob") {
        let mob = db.read_mobile(vnum)?;
        db.char_to_room(mob, in_room)?;
        let ch = db.get_character(chid)?;
        let mob = db.get_character(mob)?;
        game.act(db, "$n makes a quaint, magical gesture with one hand.", true, Some(ch), None, None, TO_ROOM);
        game.act(db, "$n has created $N!", false, Some(ch), None, Some(VictimRef::Char(mob)), TO_ROOM);
        game.act(db, "You create $N.", false, Some(ch), None, Some(VictimRef::Char(mob)), TO_CHAR);
    } else if is_abbrev(&kind, "obj") {
        let oid = db.read_object(vnum)?;
        db.obj_to_char(oid, chid)?;
        let ch = db.get_character(chid)?;
        let obj = db.get_object(oid)?;
        game.act(db, "$n makes a strange magical gesture.", true, Some(ch), None, None, TO_ROOM);
        game.act(db, "$n has created $p!", false, Some(ch), Some(obj), None, TO_ROOM);
        game.act(db, "You create $p.", false, Some(ch), Some(obj), None, TO_CHAR);
    } else {
        return Err(MudError::invalid("That'll have to be either 'obj' or 'mob'."));
    }
    Ok(())
}

/* everything a mobile carries or wears goes with it */
fn purge_mobile(db: &mut DB, mobid: DepotId) -> MudResult<()> {
    let mob = db.get_character(mobid)?;
    let mut things = mob.carrying.clone();
    things.extend(mob.equipment.iter().flatten());
    for oid in things {
        db.extract_obj(oid)?;
    }
    db.extract_char(mobid)
}

pub fn do_purge(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    let ch = db.get_character(chid)?;
    let in_room = ch.in_room;

    if arg.is_empty() {
        /* no argument: clean out the room */
        game.act(db, "$n gestures... You are surrounded by scorching flames!", false, Some(ch), None, None, TO_ROOM);
        game.send_to_room(db, in_room, "The world seems a little cleaner.\r\n");
        let room = db.get_room(in_room)?;
        let mobs: Vec<DepotId> = room
            .peoples
            .iter()
            .copied()
            .filter(|id| db.chars.get(*id).map_or(false, |c| c.is_npc()))
            .collect();
        let contents = room.contents.clone();
        for mob in mobs {
            purge_mobile(db, mob)?;
        }
        for oid in contents {
            db.extract_obj(oid)?;
        }
        return Ok(());
    }

    if let Some(victid) = db.get_char_room_vis(ch, &arg) {
        let vict = db.get_character(victid)?;
        if !vict.is_npc() && ch.get_level() <= vict.get_level() {
            return Err(MudError::invalid("Fuuuuuuuuu!"));
        }
        game.act(db, "$n disintegrates $N.", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_NOTVICT);
        if vict.is_npc() {
            purge_mobile(db, victid)?;
        } else {
            let msg = format!("(GC) {} has purged {}.", ch.get_name(), vict.get_name());
            game.mudlog(db, BRF, LVL_GOD, true, &msg);
            db.extract_char(victid)?;
        }
    } else {
        let contents = db.get_room(in_room)?.contents.clone();
        let oid = db
            .get_obj_in_list_vis(ch, &arg, &contents)
            .ok_or_else(|| MudError::not_found("Nothing here by that name."))?;
        let obj = db.get_object(oid)?;
        game.act(db, "$n destroys $p.", false, Some(ch), Some(obj), None, TO_ROOM);
        db.extract_obj(oid)?;
    }
    let ch = db.get_character(chid)?;
    game.send_to_char(ch, OK);
    Ok(())
}

/*
 * advance <player> build          re-run the premade build for the level
 *                                 the player is at
 * advance <player> <class> <n>    add n levels in a class
 */
pub fn do_advance(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut name = String::new();
    let mut class_arg = String::new();
    let mut levels_arg = String::new();
    let rest = one_argument(argument, &mut name);
    two_arguments(rest, &mut class_arg, &mut levels_arg);

    if name.is_empty() {
        return Err(MudError::invalid("Advance who?"));
    }
    let ch = db.get_character(chid)?;
    let victid = db
        .get_player_vis(ch, &name)
        .ok_or_else(|| MudError::not_found("That player is not here."))?;
    let vict = db.get_character(victid)?;
    if vict.is_npc() {
        return Err(MudError::invalid("NO!  Not on NPC's."));
    }
    if victid != chid && ch.get_level() <= vict.get_level() {
        return Err(MudError::invalid("Maybe that's not such a great idea."));
    }

    if class_arg.eq_ignore_ascii_case("build") {
        let class = vict
            .player()
            .and_then(|p| p.premade_class)
            .ok_or_else(|| MudError::invalid("They are not following a premade build."))?;
        info!("(GC) {} re-ran the premade {} build of {}.", ch.get_name(), class.name(), vict.get_name());
        game.advance_premade_build(db, victid)?;
        let ch = db.get_character(chid)?;
        game.send_to_char(ch, OK);
        return Ok(());
    }

    let class = parse_class(&class_arg)
        .ok_or_else(|| MudError::invalid("Usage: advance <player> build | <class> <levels>"))?;
    let levels: u8 = levels_arg
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| MudError::invalid("That's not a level!"))?;
    let total = vict.total_level();
    if total as u32 + levels as u32 > LVL_CAP as u32 {
        return Err(MudError::invalid(format!("{} is the highest possible level.", LVL_CAP)));
    }
    let rebuild = vict.player().and_then(|p| p.premade_class) == Some(class);
    let (admin, target) = (ch.get_name().to_string(), vict.get_name().to_string());

    let ch = db.get_character(chid)?;
    let vict = db.get_character(victid)?;
    game.act(
        db,
        "$n makes some strange gestures.\r\nA strange feeling comes upon you,\r\n\
Like a giant hand, light comes down\r\nfrom above, grabbing your body, that\r\n\
begins to pulse with colored lights\r\nfrom inside.\r\n\r\n\
You feel slightly different.",
        false,
        Some(ch),
        None,
        Some(VictimRef::Char(vict)),
        TO_VICT,
    );

    let mut level = 0;
    for _ in 0..levels {
        level = db.advance_level(&mut game.rng, victid, class)?;
        if rebuild {
            game.advance_premade_build(db, victid)?;
        }
    }
    let vict = db.get_character_mut(victid)?;
    let needed = level_exp(vict.total_level());
    if vict.points.exp < needed {
        vict.points.exp = needed;
    }

    info!("(GC) {} has advanced {} to {} level {} (from {})", admin, target, class.name(), level, total);
    let ch = db.get_character(chid)?;
    game.send_to_char(ch, OK);
    game.save_char(db, victid);
    Ok(())
}

pub fn do_shutdown(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    if subcmd != SCMD_SHUTDOWN {
        return Err(MudError::invalid("If you want to shut something down, say so!"));
    }
    let ch = db.get_character(chid)?;
    info!("(GC) Shutdown by {}.", ch.get_name());
    game.send_to_all("Shutting down.\r\n");
    game.circle_shutdown = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassId;
    use crate::config::Config;
    use crate::interpreter::SCMD_SHUTDOW;
    use crate::race::RaceId;
    use crate::structs::LVL_IMPL;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(13),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let imm = db.new_player("Boss");
        db.chars.get_mut(imm).unwrap().player_mut().unwrap().admin_level = LVL_IMPL;
        db.char_to_room(imm, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, imm);
        (game, db, imm, d)
    }

    #[test]
    fn goto_moves_to_a_room_or_a_player() {
        let (mut game, mut db, imm, _d) = setup();
        do_goto(&mut game, &mut db, imm, "3014", 0, 0).unwrap();
        assert_eq!(db.chars.get(imm).unwrap().in_room, 3014);

        let err = do_goto(&mut game, &mut db, imm, "99999", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "No room exists with that number.");

        let mortal = db.new_player("Mortal");
        db.char_to_room(mortal, 3016).unwrap();
        do_goto(&mut game, &mut db, imm, "mortal", 0, 0).unwrap();
        assert_eq!(db.chars.get(imm).unwrap().in_room, 3016);
    }

    #[test]
    fn load_and_purge() {
        let (mut game, mut db, imm, _d) = setup();
        do_load(&mut game, &mut db, imm, "obj 3020", 0, 0).unwrap();
        assert_eq!(db.chars.get(imm).unwrap().carrying.len(), 1);
        do_load(&mut game, &mut db, imm, "mob 3062", 0, 0).unwrap();
        assert_eq!(db.world[&3001].peoples.len(), 2);
        let err = do_load(&mut game, &mut db, imm, "mob 1", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "There is no monster with that number.");

        do_drop_all(&mut db, imm);
        do_purge(&mut game, &mut db, imm, "", 0, 0).unwrap();
        assert!(db.world[&3001].contents.is_empty());
        game.extract_pending_chars(&mut db);
        assert_eq!(db.world[&3001].peoples, vec![imm]);
    }

    fn do_drop_all(db: &mut DB, chid: DepotId) {
        for oid in db.chars.get(chid).unwrap().carrying.clone() {
            db.obj_from_char(oid).unwrap();
            db.obj_to_room(oid, 3001).unwrap();
        }
    }

    #[test]
    fn advance_adds_class_levels() {
        let (mut game, mut db, imm, _d) = setup();
        let mortal = db.new_player("Mortal");
        db.do_start(&mut game.rng, mortal, RaceId::Human, ClassId::Warrior).unwrap();
        db.char_to_room(mortal, 3001).unwrap();

        do_advance(&mut game, &mut db, imm, "mortal warrior 3", 0, 0).unwrap();
        let ch = db.chars.get(mortal).unwrap();
        assert_eq!(ch.class_level(ClassId::Warrior), 4);
        assert!(ch.points.exp >= level_exp(4));

        let err = do_advance(&mut game, &mut db, imm, "mortal build", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "They are not following a premade build.");
        let err = do_advance(&mut game, &mut db, imm, "mortal warrior 40", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "30 is the highest possible level.");
    }

    #[test]
    fn shutdown_must_be_spelled_out() {
        let (mut game, mut db, imm, _d) = setup();
        let err = do_shutdown(&mut game, &mut db, imm, "", 0, SCMD_SHUTDOW).unwrap_err();
        assert_eq!(err.to_string(), "If you want to shut something down, say so!");
        assert!(!game.circle_shutdown);
        do_shutdown(&mut game, &mut db, imm, "", 0, SCMD_SHUTDOWN).unwrap();
        assert!(game.circle_shutdown);
    }
}
