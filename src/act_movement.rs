/* ************************************************************************
*   File: act_movement.rs                               Part of CircleMUD *
*  Usage: movement commands, door handling, & sleep/rest/etc state        *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use crate::config::OK;
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::handler::isname;
use crate::interpreter::{is_abbrev, two_arguments, SCMD_CLOSE, SCMD_OPEN};
use crate::structs::{AffectFlags, Direction, ExitFlags, Position, RoomFlags, LVL_IMMORT};
use crate::util::{an, BRF};
use crate::{Game, VictimRef, TO_CHAR, TO_ROOM, TO_SLEEP, TO_VICT};

/* moving costs one movement point per room */
const MOVEMENT_LOSS: i32 = 1;

/*
 * do_simple_move assumes that there is no master, no followers and that
 * the direction exists.  Leaving and arrival messages, the room look and
 * death traps are handled here; the store only moves the character.
 */
pub fn do_simple_move(game: &mut Game, db: &mut DB, chid: DepotId, dir: Direction) -> MudResult<()> {
    let to_room = db.check_exit(chid, dir)?;
    let ch = db.get_character(chid)?;

    if ch.is_npc() && db.get_room(to_room)?.room_flags.contains(RoomFlags::NO_MOB) {
        return Err(MudError::invalid("Alas, you cannot go that way..."));
    }
    let mortal = !ch.is_npc() && ch.get_level() < LVL_IMMORT;
    if mortal && ch.points.movem < MOVEMENT_LOSS {
        return Err(MudError::invalid("You are too exhausted."));
    }

    let buf2 = format!("$n leaves {}.", dir.name());
    game.act(db, &buf2, true, Some(ch), None, None, TO_ROOM);
    db.move_through_exit(chid, dir)?;
    if mortal {
        db.get_character_mut(chid)?.points.movem -= MOVEMENT_LOSS;
    }

    let ch = db.get_character(chid)?;
    game.act(db, "$n has arrived.", true, Some(ch), None, None, TO_ROOM);
    if ch.desc.is_some() {
        game.look_at_room(db, chid);
    }

    let ch = db.get_character(chid)?;
    if db.get_room(to_room)?.room_flags.contains(RoomFlags::DEATH) && ch.get_level() < LVL_IMMORT {
        let msg = format!(
            "{} hit death trap #{} ({})",
            ch.get_name(),
            to_room,
            db.get_room(to_room)?.name
        );
        game.mudlog(db, BRF, LVL_IMMORT, true, &msg);
        game.die(db, chid)?;
    }
    Ok(())
}

pub fn perform_move(game: &mut Game, db: &mut DB, chid: DepotId, dir: Direction) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    if ch.is_fighting() {
        return Err(MudError::invalid("You are fighting for your life!  Try to flee instead."));
    }
    do_simple_move(game, db, chid, dir)
}

pub fn do_move(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let dir = Direction::ALL
        .get(subcmd as usize)
        .copied()
        .ok_or_else(|| MudError::invalid(format!("bad direction {}", subcmd)))?;
    perform_move(game, db, chid, dir)
}

/* the direction an open/close command is about, from a keyword and/or a direction */
fn find_door(db: &DB, chid: DepotId, type_: &str, dir: &str, cmdname: &str) -> MudResult<Direction> {
    let ch = db.get_character(chid)?;
    let room = db.get_room(ch.in_room)?;

    if !dir.is_empty() {
        /* a direction was specified */
        let door = Direction::ALL
            .iter()
            .copied()
            .find(|d| is_abbrev(dir, d.name()))
            .ok_or_else(|| MudError::invalid("That's not a direction."))?;
        let exit = room.exit(door).ok_or_else(|| {
            MudError::invalid(format!("I really don't see how you can {} anything there.", cmdname))
        })?;
        if !exit.keyword.is_empty() && !isname(type_, &exit.keyword) {
            return Err(MudError::not_found(format!("I see no {} there.", type_)));
        }
        return Ok(door);
    }

    /* try to locate the keyword */
    if type_.is_empty() {
        return Err(MudError::invalid(format!("What is it you want to {}?", cmdname)));
    }
    if let Some(door) = Direction::ALL.iter().copied().find(|d| {
        room.exit(*d)
            .map_or(false, |e| !e.keyword.is_empty() && isname(type_, &e.keyword))
    }) {
        return Ok(door);
    }
    /* a bare direction names the exit that way */
    if let Some(door) = Direction::ALL
        .iter()
        .copied()
        .find(|d| is_abbrev(type_, d.name()) && room.exit(*d).is_some())
    {
        return Ok(door);
    }
    Err(MudError::not_found(format!(
        "There doesn't seem to be {} {} here.",
        an(type_),
        type_
    )))
}

pub fn do_gen_door(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let cmdname = if subcmd == SCMD_OPEN { "open" } else { "close" };
    let mut type_ = String::new();
    let mut dir = String::new();
    two_arguments(argument, &mut type_, &mut dir);
    if type_.is_empty() {
        return Err(MudError::invalid(format!(
            "{}{} what?",
            cmdname[..1].to_uppercase(),
            &cmdname[1..]
        )));
    }

    let door = find_door(db, chid, &type_, &dir, cmdname)?;
    let in_room = db.get_character(chid)?.in_room;
    let exit = db
        .get_room(in_room)?
        .exit(door)
        .cloned()
        .ok_or_else(|| MudError::not_found("Alas, you cannot go that way..."))?;

    if !exit.exit_info.contains(ExitFlags::ISDOOR) {
        return Err(MudError::invalid("That's impossible, I'm afraid."));
    }
    let closed = exit.exit_info.contains(ExitFlags::CLOSED);
    if subcmd == SCMD_OPEN && !closed {
        return Err(MudError::invalid("It's already open!"));
    }
    if subcmd == SCMD_CLOSE && closed {
        return Err(MudError::invalid("It's already closed!"));
    }
    if subcmd == SCMD_OPEN && exit.exit_info.contains(ExitFlags::LOCKED) {
        return Err(MudError::invalid("It seems to be locked."));
    }

    set_door(db, in_room, door, subcmd == SCMD_CLOSE)?;
    /* the other side of the door, if it leads back here */
    let other_room = exit.to_room;
    let back = db
        .world
        .get(&other_room)
        .and_then(|r| r.exit(door.reverse()))
        .map_or(false, |e| e.to_room == in_room);
    if back {
        set_door(db, other_room, door.reverse(), subcmd == SCMD_CLOSE)?;
    }

    let keyword = if exit.keyword.is_empty() {
        "door".to_string()
    } else {
        crate::util::fname(&exit.keyword).to_string()
    };
    let ch = db.get_character(chid)?;
    game.send_to_char(ch, OK);
    let buf = format!("$n {}s the {}.", cmdname, keyword);
    game.act(db, &buf, false, Some(ch), None, None, TO_ROOM);
    if back {
        let msg = format!(
            "The {} is {} from the other side.\r\n",
            keyword,
            if subcmd == SCMD_CLOSE { "closed" } else { "opened" }
        );
        game.send_to_room(db, other_room, &msg);
    }
    Ok(())
}

fn set_door(db: &mut DB, room: crate::structs::RoomVnum, door: Direction, close: bool) -> MudResult<()> {
    let exit = db.get_room_mut(room)?.dir_option[door as usize]
        .as_mut()
        .ok_or_else(|| MudError::not_found(format!("no exit {} in room {}", door.name(), room)))?;
    exit.exit_info.set(ExitFlags::CLOSED, close);
    Ok(())
}

fn set_position(db: &mut DB, chid: DepotId, pos: Position) -> MudResult<()> {
    db.get_character_mut(chid)?.position = pos;
    Ok(())
}

pub fn do_stand(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    match ch.position {
        Position::Standing => Err(MudError::invalid("You are already standing.")),
        Position::Sitting => {
            game.send_to_char(ch, "You stand up.\r\n");
            game.act(db, "$n clambers to $s feet.", true, Some(ch), None, None, TO_ROOM);
            /* Will be sitting after a successful bash and may still be fighting. */
            let pos = if ch.is_fighting() {
                Position::Fighting
            } else {
                Position::Standing
            };
            set_position(db, chid, pos)
        }
        Position::Resting => {
            game.send_to_char(ch, "You stop resting, and stand up.\r\n");
            game.act(db, "$n stops resting, and clambers on $s feet.", true, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Standing)
        }
        Position::Sleeping => Err(MudError::invalid("You have to wake up first!")),
        Position::Fighting => Err(MudError::invalid("Do you not consider fighting as standing?")),
        Position::Dead => Err(MudError::invalid("You can't do much of anything like this!")),
    }
}

pub fn do_sit(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    match ch.position {
        Position::Standing => {
            game.send_to_char(ch, "You sit down.\r\n");
            game.act(db, "$n sits down.", false, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Sitting)
        }
        Position::Sitting => Err(MudError::invalid("You're sitting already.")),
        Position::Resting => {
            game.send_to_char(ch, "You stop resting, and sit up.\r\n");
            game.act(db, "$n stops resting.", true, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Sitting)
        }
        Position::Sleeping => Err(MudError::invalid("You have to wake up first.")),
        Position::Fighting => Err(MudError::invalid("Sit down while fighting? Are you MAD?")),
        Position::Dead => Err(MudError::invalid("You can't do much of anything like this!")),
    }
}

pub fn do_rest(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    match ch.position {
        Position::Standing => {
            game.send_to_char(ch, "You sit down and rest your tired bones.\r\n");
            game.act(db, "$n sits down and rests.", true, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Resting)
        }
        Position::Sitting => {
            game.send_to_char(ch, "You rest your tired bones.\r\n");
            game.act(db, "$n rests.", true, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Resting)
        }
        Position::Resting => Err(MudError::invalid("You are already resting.")),
        Position::Sleeping => Err(MudError::invalid("You have to wake up first.")),
        Position::Fighting => Err(MudError::invalid("Rest while fighting?  Are you MAD?")),
        Position::Dead => Err(MudError::invalid("You can't do much of anything like this!")),
    }
}

pub fn do_sleep(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    match ch.position {
        Position::Standing | Position::Sitting | Position::Resting => {
            if ch.is_casting() {
                return Err(MudError::invalid("You can't sleep while casting!"));
            }
            game.send_to_char(ch, "You go to sleep.\r\n");
            game.act(db, "$n lies down and falls asleep.", true, Some(ch), None, None, TO_ROOM);
            set_position(db, chid, Position::Sleeping)
        }
        Position::Sleeping => Err(MudError::invalid("You are already sound asleep.")),
        Position::Fighting => Err(MudError::invalid("Sleep while fighting?  Are you MAD?")),
        Position::Dead => Err(MudError::invalid("You can't do much of anything like this!")),
    }
}

pub fn do_wake(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    crate::interpreter::one_argument(argument, &mut arg);
    let ch = db.get_character(chid)?;

    if !arg.is_empty() {
        if ch.position == Position::Sleeping {
            return Err(MudError::invalid("Maybe you should wake yourself up first."));
        }
        let victid = db
            .get_char_room_vis(ch, &arg)
            .ok_or_else(|| MudError::not_found("No-one by that name here."))?;
        if victid != chid {
            let vict = db.get_character(victid)?;
            if vict.awake() {
                game.act(db, "$E is already awake.", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_CHAR);
                return Ok(());
            }
            if vict.aff_flagged(AffectFlags::SLEEP) {
                game.act(db, "You can't wake $M up!", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_CHAR);
                return Ok(());
            }
            game.act(db, "You wake $M up.", false, Some(ch), None, Some(VictimRef::Char(vict)), TO_CHAR);
            game.act(
                db,
                "You are awakened by $n.",
                false,
                Some(ch),
                None,
                Some(VictimRef::Char(vict)),
                TO_VICT | TO_SLEEP,
            );
            return set_position(db, victid, Position::Sitting);
        }
    }

    if ch.aff_flagged(AffectFlags::SLEEP) {
        return Err(MudError::invalid("You can't wake up!"));
    }
    if ch.position > Position::Sleeping {
        return Err(MudError::invalid("You are already awake..."));
    }
    game.send_to_char(ch, "You awaken, and sit up.\r\n");
    game.act(db, "$n awakens.", true, Some(ch), None, None, TO_ROOM);
    set_position(db, chid, Position::Sitting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interpreter::command_interpreter;
    use crate::spells::SpellId;
    use crate::structs::{CastTarget, CastingData};
    use crate::class::ClassId;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(1),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Walker");
        db.char_to_room(chid, 3001).unwrap();
        db.chars.get_mut(chid).unwrap().points.movem = 10;
        let d = game.attach_test_desc(&mut db, chid);
        (game, db, chid, d)
    }

    fn first_exit(db: &DB, room: i32) -> Direction {
        Direction::ALL
            .iter()
            .copied()
            .find(|d| db.world[&room].exit(*d).is_some())
            .unwrap()
    }

    #[test]
    fn walking_costs_movement_and_shows_the_room() {
        let (mut game, mut db, chid, d) = setup();
        let dir = first_exit(&db, 3001);
        let to = db.world[&3001].exit(dir).unwrap().to_room;
        do_move(&mut game, &mut db, chid, "", 0, dir as i32).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.in_room, to);
        assert_eq!(ch.points.movem, 9);
        assert!(game.take_output(d).contains(&db.world[&to].name));
    }

    #[test]
    fn casters_stay_put() {
        let (mut game, mut db, chid, d) = setup();
        db.chars.get_mut(chid).unwrap().casting = Some(CastingData {
            spell: SpellId::MagicMissile,
            class: ClassId::Wizard,
            target: CastTarget::None,
            due: 10,
            event: Default::default(),
        });
        let dir = first_exit(&db, 3001);
        command_interpreter(&mut game, &mut db, chid, dir.name());
        assert_eq!(db.chars.get(chid).unwrap().in_room, 3001);
        assert_eq!(game.take_output(d), "You can't move while casting!\r\n");
    }

    #[test]
    fn exhausted_walkers_stay_put() {
        let (mut game, mut db, chid, _d) = setup();
        db.chars.get_mut(chid).unwrap().points.movem = 0;
        let dir = first_exit(&db, 3001);
        let err = do_move(&mut game, &mut db, chid, "", 0, dir as i32).unwrap_err();
        assert_eq!(err.to_string(), "You are too exhausted.");
        assert_eq!(db.chars.get(chid).unwrap().in_room, 3001);
    }

    #[test]
    fn closed_doors_block_and_open_on_both_sides() {
        let (mut game, mut db, chid, _d) = setup();
        let dir = first_exit(&db, 3001);
        let to = db.world[&3001].exit(dir).unwrap().to_room;
        for (room, d) in [(3001, dir), (to, dir.reverse())] {
            if let Some(exit) = db.world.get_mut(&room).unwrap().dir_option[d as usize].as_mut() {
                exit.exit_info = ExitFlags::ISDOOR | ExitFlags::CLOSED;
                exit.keyword = "door".to_string();
            }
        }

        let err = do_move(&mut game, &mut db, chid, "", 0, dir as i32).unwrap_err();
        assert_eq!(err.to_string(), "The door seems to be closed.");

        do_gen_door(&mut game, &mut db, chid, "door", 0, SCMD_OPEN).unwrap();
        assert!(!db.world[&3001].exit(dir).unwrap().is_closed());
        if let Some(back) = db.world[&to].exit(dir.reverse()) {
            if back.to_room == 3001 {
                assert!(!back.is_closed());
            }
        }
        let err = do_gen_door(&mut game, &mut db, chid, "door", 0, SCMD_OPEN).unwrap_err();
        assert_eq!(err.to_string(), "It's already open!");
        do_move(&mut game, &mut db, chid, "", 0, dir as i32).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().in_room, to);
    }

    #[test]
    fn resting_and_waking() {
        let (mut game, mut db, chid, d) = setup();
        do_rest(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().position, Position::Resting);
        do_sleep(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert!(do_sleep(&mut game, &mut db, chid, "", 0, 0).is_err());
        do_wake(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().position, Position::Sitting);
        do_stand(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().position, Position::Standing);
        assert!(game.take_output(d).ends_with("You stand up.\r\n"));
    }
}
