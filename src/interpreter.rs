/* ************************************************************************
*   File: interpreter.rs                                Part of CircleMUD *
*  Usage: parse user commands, search for specials, call ACMD functions   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use hmac::Hmac;
use log::{error, info};
use sha2::Sha256;

use crate::act_comm::do_say;
use crate::act_informative::{
    do_equipment, do_feats, do_inventory, do_look, do_score, do_skills, do_spells, do_who,
};
use crate::act_item::{do_drop, do_get, do_put, do_remove, do_wear};
use crate::act_movement::{do_gen_door, do_move, do_rest, do_sit, do_sleep, do_stand, do_wake};
use crate::act_offensive::{do_combat_mode, do_flee, do_hit};
use crate::act_other::{do_gain, do_premade, do_quit, do_save};
use crate::act_wizard::{do_advance, do_goto, do_load, do_purge, do_shutdown};
use crate::class::{parse_class, CLASS_MENU};
use crate::config::{MAX_BAD_PWS, START_MESSG, WELC_MESSG};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::objsave::{load_player, PlayerFile};
use crate::race::{parse_race, RACE_MENU};
use crate::spell_parser::{do_abort, do_cast};
use crate::structs::ConState::{
    ConClose, ConCnfpasswd, ConDisconnect, ConGetName, ConLoading, ConNameCnfrm, ConNewpasswd,
    ConPassword, ConPlaying, ConQclass, ConQpremade, ConQrace,
};
use crate::structs::{
    Position, LVL_GOD, LVL_GRGOD, LVL_IMMORT, LVL_IMPL, MAX_NAME_LENGTH, MAX_PWD_LENGTH, NOWHERE,
    PULSE_VIOLENCE,
};
use crate::util::{BRF, NRM};
use crate::{DescriptorData, Game, TO_ROOM};

pub type Command = fn(&mut Game, &mut DB, DepotId, &str, usize, i32) -> MudResult<()>;

pub struct CommandInfo {
    pub command: &'static str,
    pub minimum_position: Position,
    pub command_pointer: Command,
    pub minimum_level: u8,
    pub subcmd: i32,
    /* wait-state, in pulses, set after the command succeeds */
    pub wait: u32,
}

/* directions double as the subcommands of do_move */
pub const SCMD_NORTH: i32 = 0;
pub const SCMD_EAST: i32 = 1;
pub const SCMD_SOUTH: i32 = 2;
pub const SCMD_WEST: i32 = 3;
pub const SCMD_UP: i32 = 4;
pub const SCMD_DOWN: i32 = 5;

/* do_gen_door */
pub const SCMD_OPEN: i32 = 0;
pub const SCMD_CLOSE: i32 = 1;

/* do_hit */
pub const SCMD_HIT: i32 = 0;
pub const SCMD_KILL: i32 = 1;

/* do_combat_mode */
pub const SCMD_POWERATTACK: i32 = 0;
pub const SCMD_EXPERTISE: i32 = 1;

/* do_quit, do_shutdown */
pub const SCMD_QUI: i32 = 0;
pub const SCMD_QUIT: i32 = 1;
pub const SCMD_SHUTDOW: i32 = 0;
pub const SCMD_SHUTDOWN: i32 = 1;

/* do_wear */
pub const SCMD_WEAR: i32 = 0;
pub const SCMD_WIELD: i32 = 1;

const COMBAT_WAIT: u32 = PULSE_VIOLENCE as u32;

macro_rules! cmd {
    ($name:expr, $pos:expr, $f:expr, $lvl:expr, $scmd:expr, $wait:expr) => {
        CommandInfo {
            command: $name,
            minimum_position: $pos,
            command_pointer: $f,
            minimum_level: $lvl,
            subcmd: $scmd,
            wait: $wait,
        }
    };
}

/*
 * This is the Master Command List.  Abbreviations match the first command
 * in the list, so the order of the entries matters: "n" is north and
 * "l" is look.
 */
#[rustfmt::skip]
pub const CMD_INFO: [CommandInfo; 47] = [
    cmd!("north", Position::Standing, do_move, 0, SCMD_NORTH, 0),
    cmd!("east", Position::Standing, do_move, 0, SCMD_EAST, 0),
    cmd!("south", Position::Standing, do_move, 0, SCMD_SOUTH, 0),
    cmd!("west", Position::Standing, do_move, 0, SCMD_WEST, 0),
    cmd!("up", Position::Standing, do_move, 0, SCMD_UP, 0),
    cmd!("down", Position::Standing, do_move, 0, SCMD_DOWN, 0),

    cmd!("look", Position::Resting, do_look, 0, 0, 0),
    cmd!("kill", Position::Fighting, do_hit, 0, SCMD_KILL, COMBAT_WAIT),
    cmd!("hit", Position::Fighting, do_hit, 0, SCMD_HIT, COMBAT_WAIT),
    cmd!("cast", Position::Sitting, do_cast, 1, 0, 0),
    cmd!("get", Position::Resting, do_get, 0, 0, 0),
    cmd!("inventory", Position::Dead, do_inventory, 0, 0, 0),
    cmd!("equipment", Position::Sleeping, do_equipment, 0, 0, 0),
    cmd!("say", Position::Resting, do_say, 0, 0, 0),
    cmd!("'", Position::Resting, do_say, 0, 0, 0),
    cmd!("score", Position::Dead, do_score, 0, 0, 0),

    cmd!("abort", Position::Resting, do_abort, 0, 0, 0),
    cmd!("advance", Position::Dead, do_advance, LVL_GRGOD, 0, 0),
    cmd!("close", Position::Sitting, do_gen_door, 0, SCMD_CLOSE, 0),
    cmd!("drop", Position::Resting, do_drop, 0, 0, 0),
    cmd!("expertise", Position::Fighting, do_combat_mode, 0, SCMD_EXPERTISE, 0),
    cmd!("feats", Position::Dead, do_feats, 0, 0, 0),
    cmd!("flee", Position::Fighting, do_flee, 1, 0, COMBAT_WAIT),
    cmd!("gain", Position::Standing, do_gain, 0, 0, 0),
    cmd!("goto", Position::Sleeping, do_goto, LVL_IMMORT, 0, 0),
    cmd!("load", Position::Dead, do_load, LVL_GOD, 0, 0),
    cmd!("open", Position::Sitting, do_gen_door, 0, SCMD_OPEN, 0),
    cmd!("put", Position::Resting, do_put, 0, 0, 0),
    cmd!("powerattack", Position::Fighting, do_combat_mode, 0, SCMD_POWERATTACK, 0),
    cmd!("premade", Position::Dead, do_premade, 0, 0, 0),
    cmd!("purge", Position::Dead, do_purge, LVL_GOD, 0, 0),
    cmd!("qui", Position::Dead, do_quit, 0, SCMD_QUI, 0),
    cmd!("quit", Position::Dead, do_quit, 0, SCMD_QUIT, 0),
    cmd!("remove", Position::Resting, do_remove, 0, 0, 0),
    cmd!("rest", Position::Resting, do_rest, 0, 0, 0),
    cmd!("save", Position::Sleeping, do_save, 0, 0, 0),
    cmd!("shutdow", Position::Dead, do_shutdown, LVL_IMPL, SCMD_SHUTDOW, 0),
    cmd!("shutdown", Position::Dead, do_shutdown, LVL_IMPL, SCMD_SHUTDOWN, 0),
    cmd!("sit", Position::Resting, do_sit, 0, 0, 0),
    cmd!("skills", Position::Dead, do_skills, 0, 0, 0),
    cmd!("sleep", Position::Sleeping, do_sleep, 0, 0, 0),
    cmd!("spells", Position::Dead, do_spells, 0, 0, 0),
    cmd!("stand", Position::Resting, do_stand, 0, 0, 0),
    cmd!("wake", Position::Sleeping, do_wake, 0, 0, 0),
    cmd!("wear", Position::Resting, do_wear, 0, SCMD_WEAR, 0),
    cmd!("who", Position::Dead, do_who, 0, 0, 0),
    cmd!("wield", Position::Resting, do_wear, 0, SCMD_WIELD, 0),
];

const FILL: [&str; 7] = ["in", "from", "with", "the", "on", "at", "to"];

const RESERVED: [&str; 9] = [
    "a", "an", "self", "me", "all", "room", "someone", "something", "new",
];

fn position_message(pos: Position) -> &'static str {
    match pos {
        Position::Dead => "Lie still; you are DEAD!!! :-(\r\n",
        Position::Sleeping => "In your dreams, or what?\r\n",
        Position::Resting => "Nah... You feel too relaxed to do that..\r\n",
        Position::Sitting => "Maybe you should get on your feet first?\r\n",
        Position::Fighting => "No way!  You're fighting for your life!\r\n",
        Position::Standing => "Huh?!?\r\n",
    }
}

/*
 * This is the actual command interpreter called from game_loop() in
 * main.rs.  It makes sure you are the proper level and position to
 * execute the command, then calls the appropriate function.
 */
pub fn command_interpreter(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str) {
    let argument = argument.trim_start();
    if argument.is_empty() {
        return;
    }

    /*
     * special case to handle one-character, non-alphanumeric commands;
     * requested by many people so "'hi" is possible.
     */
    let mut arg = String::new();
    let line = match argument.chars().next() {
        Some(c) if !c.is_alphanumeric() => {
            arg.push(c);
            &argument[c.len_utf8()..]
        }
        _ => any_one_arg(argument, &mut arg),
    };
    let line = line.trim_start();

    let ch = match db.chars.get(chid) {
        Some(ch) => ch,
        None => return,
    };
    let level = ch.get_level();

    /* otherwise, find the command */
    let cmd = CMD_INFO
        .iter()
        .position(|c| level >= c.minimum_level && is_abbrev(&arg, c.command));
    let cmd = match cmd {
        Some(cmd) => cmd,
        None => {
            game.send_to_char(ch, "Huh?!?\r\n");
            return;
        }
    };
    let info = &CMD_INFO[cmd];
    if ch.position < info.minimum_position {
        game.send_to_char(ch, position_message(ch.position));
        return;
    }

    match (info.command_pointer)(game, db, chid, line, cmd, info.subcmd) {
        Ok(()) => {
            if info.wait > 0 {
                if let Some(ch) = db.chars.get_mut(chid) {
                    ch.wait = ch.wait.max(info.wait);
                }
            }
        }
        Err(err) if err.is_user_facing() => {
            if let Some(ch) = db.chars.get(chid) {
                game.send_to_char(ch, &format!("{}\r\n", err));
            }
        }
        Err(err) => {
            error!("SYSERR: '{}' by {}: {}", info.command, chid, err);
            if let Some(ch) = db.chars.get(chid) {
                game.send_to_char(ch, "Something went wrong.  The gods have been told.\r\n");
            }
        }
    }
}

/***************************************************************************
 * Various other parsing utilities                                         *
 **************************************************************************/

/*
 * searches an array of strings for a target string.  "exact" tells
 * whether the match must be exact for it to be returned.
 */
pub fn search_block(arg: &str, list: &[&str], exact: bool) -> Option<usize> {
    /* a leading '!' never matches */
    if arg.starts_with('!') || arg.is_empty() {
        return None;
    }

    let arg = arg.to_lowercase();
    if exact {
        list.iter().position(|s| *s == arg)
    } else {
        list.iter().position(|s| s.starts_with(arg.as_str()))
    }
}

pub fn is_number(txt: &str) -> bool {
    txt.parse::<i32>().is_ok()
}

/*
 * Given a string, change all instances of double dollar signs ($$) to
 * single dollar signs ($).  Input lines have their $'s doubled so they
 * are safe to pass to act(); output that never goes through act() uses
 * this to look right.
 */
pub fn delete_doubledollar(text: &str) -> String {
    text.replace("$$", "$")
}

fn fill_word(argument: &str) -> bool {
    search_block(argument, &FILL, true).is_some()
}

pub fn reserved_word(argument: &str) -> bool {
    search_block(argument, &RESERVED, true).is_some()
}

/*
 * copy the first non-FILL-word, space-delimited argument of 'argument'
 * to 'first_arg'; return the remainder of the string.
 */
pub fn one_argument<'a>(argument: &'a str, first_arg: &mut String) -> &'a str {
    let mut argument = argument;
    loop {
        argument = argument.trim_start();
        first_arg.clear();

        let end = argument.find(char::is_whitespace).unwrap_or(argument.len());
        first_arg.push_str(&argument[..end].to_lowercase());
        argument = &argument[end..];
        if !fill_word(first_arg) {
            break;
        }
    }
    argument
}

/* same as one_argument except that it doesn't ignore FILL words */
pub fn any_one_arg<'a>(argument: &'a str, first_arg: &mut String) -> &'a str {
    let argument = argument.trim_start();
    let end = argument.find(char::is_whitespace).unwrap_or(argument.len());
    first_arg.clear();
    first_arg.push_str(&argument[..end]);
    &argument[end..]
}

/*
 * Same as one_argument except that it takes two args and returns the rest;
 * ignores FILL words
 */
pub fn two_arguments<'a>(argument: &'a str, first_arg: &mut String, second_arg: &mut String) -> &'a str {
    one_argument(one_argument(argument, first_arg), second_arg) /* :-) */
}

/*
 * determine if a given string is an abbreviation of another
 * (it shouldn't be symmetrical.  JE 5/1/95)
 */
pub fn is_abbrev(arg1: &str, arg2: &str) -> bool {
    if arg1.is_empty() {
        return false;
    }
    arg2.to_lowercase().starts_with(arg1.to_lowercase().as_str())
}

/* Return first space-delimited token in arg1; remainder of string in arg2. */
pub fn half_chop(string: &str, arg1: &mut String, arg2: &mut String) {
    let temp = any_one_arg(string, arg1);
    arg2.clear();
    arg2.push_str(temp.trim());
}

/* (Exactly) matches "command" to cmd number */
pub fn find_command(command: &str) -> Option<usize> {
    CMD_INFO.iter().position(|e| e.command == command)
}

/* *************************************************************************
*  Stuff for controlling the non-playing sockets (get name, pwd etc)       *
************************************************************************* */

pub fn hash_password(name: &str, password: &str) -> MudResult<[u8; 16]> {
    let salt = name.to_lowercase();
    let mut hash = [0u8; 16];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt.as_bytes(), 4, &mut hash)
        .map_err(|err| MudError::InvalidState(format!("Error while encrypting password: {}", err)))?;
    Ok(hash)
}

fn parse_name(arg: &str) -> Option<String> {
    let arg = arg.trim();
    if arg.len() < 2 || arg.len() > MAX_NAME_LENGTH || reserved_word(arg) {
        return None;
    }
    if !arg.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut name = arg.to_lowercase();
    name[..1].make_ascii_uppercase();
    Some(name)
}

fn login_desc(game: &mut Game, d_id: DepotId) -> MudResult<&mut DescriptorData> {
    game.descriptors
        .get_mut(d_id)
        .ok_or_else(|| MudError::not_found(format!("descriptor {} is gone", d_id)))
}

/* a player of that name already in the world, linkless or not */
fn find_player_in_world(db: &DB, name: &str) -> Option<DepotId> {
    db.chars
        .iter()
        .find(|ch| !ch.is_npc() && !ch.notdeadyet && ch.name.eq_ignore_ascii_case(name))
        .map(|ch| ch.id)
}

/* deal with newcomers and other non-playing sockets */
pub fn nanny(game: &mut Game, db: &mut DB, d_id: DepotId, arg: &str) {
    let arg = arg.trim();
    let state = match game.descriptors.get(d_id) {
        Some(d) => d.state,
        None => return,
    };
    let result = match state {
        ConGetName => nanny_get_name(game, db, d_id, arg),
        ConLoading => Ok(()),
        ConNameCnfrm => nanny_name_confirm(game, d_id, arg),
        ConPassword => nanny_password(game, db, d_id, arg),
        ConNewpasswd => nanny_new_password(game, d_id, arg),
        ConCnfpasswd => nanny_confirm_password(game, d_id, arg),
        ConQrace => nanny_race(game, d_id, arg),
        ConQclass => nanny_class(game, d_id, arg),
        ConQpremade => nanny_premade(game, db, d_id, arg),
        ConPlaying | ConClose | ConDisconnect => Ok(()),
    };
    if let Err(err) = result {
        error!("SYSERR: login on descriptor {}: {}", d_id, err);
        if let Some(d) = game.descriptors.get_mut(d_id) {
            d.write_to_output("\r\nSomething went wrong, please try again later.\r\n");
            d.state = ConClose;
        }
    }
}

fn nanny_get_name(game: &mut Game, db: &mut DB, d_id: DepotId, arg: &str) -> MudResult<()> {
    if arg.is_empty() {
        login_desc(game, d_id)?.state = ConClose;
        return Ok(());
    }
    let name = match parse_name(arg) {
        Some(name) => name,
        None => {
            login_desc(game, d_id)?.write_to_output("Invalid name, please try another.\r\nName: ");
            return Ok(());
        }
    };

    if let Some(chid) = find_player_in_world(db, &name) {
        /* the password is checked against the body already in the game */
        let d = login_desc(game, d_id)?;
        d.login.name = name;
        d.login.reconnect = Some(chid);
        d.write_to_output("Password: ");
        d.echo_off();
        d.state = ConPassword;
        return Ok(());
    }

    if db.player_index.contains_key(&name.to_lowercase()) {
        login_desc(game, d_id)?.login.name = name.clone();
        if let Some(saver) = &game.saver {
            saver.request_load(d_id, &name);
            login_desc(game, d_id)?.state = ConLoading;
        } else {
            let result = load_player(&game.config.dir, &name);
            game.player_loaded(db, d_id, &name, result);
        }
        return Ok(());
    }

    let circle_restrict = game.config.circle_restrict;
    let d = login_desc(game, d_id)?;
    if circle_restrict {
        d.write_to_output("Sorry, new players can't be created at the moment.\r\n");
        d.state = ConClose;
        info!("Request for new char {} denied from [{}] (restricted)", name, d.host);
        return Ok(());
    }
    d.write_to_output(&format!("Did I get that right, {} (Y/N)? ", name));
    d.login.name = name;
    d.state = ConNameCnfrm;
    Ok(())
}

fn nanny_name_confirm(game: &mut Game, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    match arg.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('Y') => {
            d.write_to_output(&format!("New character.\r\nGive me a password for {}: ", d.login.name));
            d.echo_off();
            d.state = ConNewpasswd;
        }
        Some('N') => {
            d.write_to_output("Okay, what IS it, then? ");
            d.login.name.clear();
            d.state = ConGetName;
        }
        _ => d.write_to_output("Please type Yes or No: "),
    }
    Ok(())
}

impl Game {
    /* the save worker has read (or failed to read) a player file */
    pub fn player_loaded(&mut self, db: &mut DB, d_id: DepotId, name: &str, result: MudResult<PlayerFile>) {
        let d = match self.descriptors.get_mut(d_id) {
            Some(d) if d.login.name.eq_ignore_ascii_case(name) => d,
            _ => return,
        };
        match result {
            Ok(file) => {
                d.login.pending = Some(Box::new(file));
                d.write_to_output("Password: ");
                d.echo_off();
                d.state = ConPassword;
            }
            Err(err) => {
                d.write_to_output("\r\nYour player file could not be read.  Please tell the gods.\r\n");
                d.state = ConClose;
                let msg = format!("SYSERR: loading player {}: {}", name, err);
                self.mudlog(db, BRF, LVL_GOD, true, &msg);
            }
        }
    }
}

fn nanny_password(game: &mut Game, db: &mut DB, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    d.echo_on();
    d.write_to_output("\r\n");
    if arg.is_empty() {
        d.state = ConClose;
        return Ok(());
    }

    let name = d.login.name.clone();
    let stored = match (d.login.reconnect, &d.login.pending) {
        (Some(chid), _) => db
            .get_character(chid)?
            .player()
            .map(|p| p.passwd)
            .ok_or_else(|| MudError::invalid("reconnect target is not a player"))?,
        (None, Some(file)) => file.specials.passwd,
        (None, None) => return Err(MudError::invalid("no player to check the password against")),
    };

    if hash_password(&name, arg)? != stored {
        let d = login_desc(game, d_id)?;
        d.bad_pws += 1;
        let msg = format!("Bad PW: {} [{}]", name, d.host);
        let bad_pws = d.bad_pws;
        if bad_pws >= MAX_BAD_PWS {
            d.write_to_output("Wrong password... disconnecting.\r\n");
            d.state = ConClose;
        } else {
            d.write_to_output("Wrong password.\r\nPassword: ");
            d.echo_off();
        }
        game.mudlog(db, BRF, LVL_GOD, true, &msg);
        return Ok(());
    }

    /* someone may have entered the game with this name while the file loaded */
    let in_world = find_player_in_world(db, &name);
    let d = login_desc(game, d_id)?;
    let pending = d.login.pending.take();
    d.login.reconnect = None;
    match (in_world, pending) {
        (Some(chid), _) => reconnect(game, db, d_id, chid),
        (None, Some(file)) => {
            let chid = db.restore_player(&file)?;
            enter_game(game, db, d_id, chid)?;
            let ch = db.get_character(chid)?;
            let msg = format!("{} [{}] has connected.", ch.name, login_desc(game, d_id)?.host);
            game.mudlog(db, BRF, LVL_IMMORT, true, &msg);
            Ok(())
        }
        /* the linkless body vanished while the password was typed */
        (None, None) => {
            let d = login_desc(game, d_id)?;
            d.write_to_output("Your character is no longer in the game.  Please log in again.\r\n");
            d.state = ConClose;
            Ok(())
        }
    }
}

/* take over a body in the world: linkless, or driven by another connection */
fn reconnect(game: &mut Game, db: &mut DB, d_id: DepotId, chid: DepotId) -> MudResult<()> {
    let host = login_desc(game, d_id)?.host.clone();
    let old_desc = db.get_character(chid)?.desc;
    let usurp = match old_desc.and_then(|o| game.descriptors.get_mut(o)) {
        Some(old) => {
            old.write_to_output("\r\nMultiple login detected -- disconnecting.\r\n");
            old.character = None;
            old.state = ConClose;
            true
        }
        None => false,
    };

    {
        let ch = db.get_character_mut(chid)?;
        ch.desc = Some(d_id);
        ch.timer = 0;
    }
    let d = login_desc(game, d_id)?;
    d.character = Some(chid);
    d.state = ConPlaying;

    let ch = db.get_character(chid)?;
    let name = ch.name.clone();
    if usurp {
        game.send_to_char(ch, "You take over your own body, already in use!\r\n");
        game.act(
            db,
            "$n suddenly keels over in pain, surrounded by a white aura...\r\n\
             $n's body has been taken over by a new spirit!",
            true,
            Some(ch),
            None,
            None,
            TO_ROOM,
        );
        let msg = format!("{} has re-logged in ... disconnecting old socket.", name);
        game.mudlog(db, NRM, LVL_IMMORT, true, &msg);
    } else {
        game.send_to_char(ch, "Reconnecting.\r\n");
        game.act(db, "$n has reconnected.", true, Some(ch), None, None, TO_ROOM);
        let msg = format!("{} [{}] has reconnected.", name, host);
        game.mudlog(db, NRM, LVL_IMMORT, true, &msg);
    }
    Ok(())
}

fn nanny_new_password(game: &mut Game, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    if arg.len() < 3 || arg.len() > MAX_PWD_LENGTH || arg.eq_ignore_ascii_case(&d.login.name) {
        d.write_to_output("\r\nIllegal password.\r\nPassword: ");
        return Ok(());
    }
    d.login.passwd = hash_password(&d.login.name, arg)?;
    d.write_to_output("\r\nPlease retype password: ");
    d.state = ConCnfpasswd;
    Ok(())
}

fn nanny_confirm_password(game: &mut Game, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    if hash_password(&d.login.name, arg)? != d.login.passwd {
        d.write_to_output("\r\nPasswords don't match... start over.\r\nPassword: ");
        d.state = ConNewpasswd;
        return Ok(());
    }
    d.echo_on();
    d.write_to_output(RACE_MENU);
    d.write_to_output("\r\nRace: ");
    d.state = ConQrace;
    Ok(())
}

fn nanny_race(game: &mut Game, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    match parse_race(arg) {
        None => d.write_to_output("\r\nThat's not a race.\r\nRace: "),
        Some(race) => {
            d.login.race = Some(race);
            d.write_to_output(CLASS_MENU);
            d.write_to_output("\r\nClass: ");
            d.state = ConQclass;
        }
    }
    Ok(())
}

fn nanny_class(game: &mut Game, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    match parse_class(arg) {
        None => d.write_to_output("\r\nThat's not a class.\r\nClass: "),
        Some(class) => {
            d.login.class = Some(class);
            d.write_to_output(&format!(
                "\r\nA premade build picks your feats, skills and spells as you level.\r\n\
                 Follow the premade {} build (Y/N)? ",
                class.name()
            ));
            d.state = ConQpremade;
        }
    }
    Ok(())
}

fn nanny_premade(game: &mut Game, db: &mut DB, d_id: DepotId, arg: &str) -> MudResult<()> {
    let d = login_desc(game, d_id)?;
    let premade = match arg.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('Y') => true,
        Some('N') => false,
        _ => {
            d.write_to_output("Please type Yes or No: ");
            return Ok(());
        }
    };
    let name = d.login.name.clone();
    let passwd = d.login.passwd;
    let host = d.host.clone();
    let (race, class) = match (d.login.race, d.login.class) {
        (Some(race), Some(class)) => (race, class),
        _ => return Err(MudError::invalid("race or class missing at the end of creation")),
    };

    /* the name may have been taken while this one was being created */
    if db.player_index.contains_key(&name.to_lowercase()) {
        d.write_to_output("\r\nThat name was just taken, sorry.\r\nName: ");
        d.login = Default::default();
        d.state = ConGetName;
        return Ok(());
    }

    let chid = db.new_player(&name);
    let idnum = db.register_player(&name);
    if let Some(p) = db.get_character_mut(chid)?.player_mut() {
        p.idnum = idnum;
        p.passwd = passwd;
    }
    db.do_start(&mut game.rng, chid, race, class)?;

    enter_game(game, db, d_id, chid)?;
    if let Some(d) = game.descriptors.get_mut(d_id) {
        d.write_to_output(START_MESSG);
    }
    if premade {
        if let Some(p) = db.get_character_mut(chid)?.player_mut() {
            p.premade_class = Some(class);
        }
        game.advance_premade_build(db, chid)?;
    }
    game.save_char(db, chid);

    let msg = format!("{} [{}] new player.", name, host);
    game.mudlog(db, NRM, LVL_IMMORT, true, &msg);
    Ok(())
}

/* put a freshly loaded or created character into the world */
fn enter_game(game: &mut Game, db: &mut DB, d_id: DepotId, chid: DepotId) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let start = if ch.is_immortal() {
        db.immort_start_room
    } else {
        db.mortal_start_room
    };
    let room = ch
        .player()
        .and_then(|p| p.load_room)
        .filter(|r| *r != NOWHERE && db.world.contains_key(r))
        .unwrap_or(start);
    db.char_to_room(chid, room)?;

    db.get_character_mut(chid)?.desc = Some(d_id);
    let d = login_desc(game, d_id)?;
    d.character = Some(chid);
    d.state = ConPlaying;
    d.login = Default::default();
    d.write_to_output(WELC_MESSG);

    let ch = db.get_character(chid)?;
    game.act(db, "$n has entered the game.", true, Some(ch), None, None, TO_ROOM);
    game.look_at_room(db, chid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassId;
    use crate::config::Config;
    use crate::objsave::PlayerFile;
    use crate::race::RaceId;

    fn game() -> Game {
        Game::new(Config {
            seed: Some(5),
            ..Default::default()
        })
    }

    fn login(game: &mut Game, db: &mut DB, d_id: DepotId, lines: &[&str]) {
        for line in lines {
            nanny(game, db, d_id, line);
        }
    }

    #[test]
    fn abbreviations_follow_the_table_order() {
        let first = |arg: &str| {
            CMD_INFO
                .iter()
                .position(|c| is_abbrev(arg, c.command))
                .map(|i| CMD_INFO[i].command)
        };
        assert_eq!(first("n"), Some("north"));
        assert_eq!(first("l"), Some("look"));
        assert_eq!(first("k"), Some("kill"));
        assert_eq!(first("sc"), Some("score"));
        assert_eq!(first("xyzzy"), None);
    }

    #[test]
    fn arguments_skip_fill_words() {
        let mut first = String::new();
        let mut second = String::new();
        let rest = two_arguments("put the dagger in bag now", &mut first, &mut second);
        assert_eq!(first, "put");
        assert_eq!(second, "dagger");
        let rest = one_argument(rest, &mut first);
        assert_eq!(first, "bag");
        assert_eq!(rest.trim(), "now");
        assert!(is_abbrev("nor", "north"));
        assert!(!is_abbrev("north", "nor"));
        assert!(!is_abbrev("", "north"));
    }

    #[test]
    fn unknown_commands_get_huh() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Tester");
        db.char_to_room(chid, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        command_interpreter(&mut game, &mut db, chid, "dance wildly");
        assert_eq!(game.take_output(d), "Huh?!?\r\n");
    }

    #[test]
    fn sleeping_characters_cannot_walk() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Tester");
        db.char_to_room(chid, 3001).unwrap();
        db.chars.get_mut(chid).unwrap().position = Position::Sleeping;
        let d = game.attach_test_desc(&mut db, chid);
        command_interpreter(&mut game, &mut db, chid, "north");
        assert_eq!(game.take_output(d), "In your dreams, or what?\r\n");
        assert_eq!(db.chars.get(chid).unwrap().in_room, 3001);
    }

    #[test]
    fn immortal_commands_are_hidden_from_mortals() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Tester");
        db.char_to_room(chid, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        command_interpreter(&mut game, &mut db, chid, "goto 3014");
        assert_eq!(game.take_output(d), "Huh?!?\r\n");
        assert_eq!(db.chars.get(chid).unwrap().in_room, 3001);
    }

    #[test]
    fn commands_wait_out_the_wait_state() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Tester");
        db.char_to_room(chid, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        db.chars.get_mut(chid).unwrap().wait = 3;
        game.queue_line(d, "score");

        game.run_pulse(&mut db);
        game.run_pulse(&mut db);
        assert_eq!(game.descriptors.get(d).unwrap().input.len(), 1);
        game.run_pulse(&mut db);
        assert!(game.descriptors.get(d).unwrap().input.is_empty());
        assert!(game.take_output(d).contains("Tester"));
    }

    #[test]
    fn busy_commands_are_refused_when_asked_to() {
        let mut game = Game::new(Config {
            wait_policy: crate::config::WaitPolicy::Reject,
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Tester");
        db.char_to_room(chid, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        db.chars.get_mut(chid).unwrap().wait = 3;
        game.queue_line(d, "score");
        game.run_pulse(&mut db);
        assert!(game.descriptors.get(d).unwrap().input.is_empty());
        assert!(game
            .take_output(d)
            .contains("You are busy; that command was not executed."));
    }

    #[test]
    fn logins_never_reach_the_world() {
        let mut game = game();
        let mut db = DB::test_world();
        let d = game.new_descriptor(None, "localhost");
        game.take_output(d);
        game.queue_line(d, "north");
        game.run_pulse(&mut db);
        let desc = game.descriptors.get(d).unwrap();
        assert_eq!(desc.state, ConNameCnfrm);
        assert!(desc.character.is_none());
        assert!(db.chars.is_empty());
    }

    #[test]
    fn new_character_walkthrough() {
        let mut game = game();
        let mut db = DB::test_world();
        let d = game.new_descriptor(None, "localhost");
        login(&mut game, &mut db, d, &["x1", "aragorn", "y", "ab", "secret", "secret"]);
        assert_eq!(game.descriptors.get(d).unwrap().state, ConQrace);
        login(&mut game, &mut db, d, &["martian", "dwarf", "cleric", "n"]);

        let desc = game.descriptors.get(d).unwrap();
        assert_eq!(desc.state, ConPlaying);
        assert!(desc.output.contains("Invalid name, please try another."));
        assert!(desc.output.contains("Illegal password."));
        assert!(desc.output.contains("That's not a race."));
        let chid = desc.character.unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.name, "Aragorn");
        assert_eq!(ch.race, Some(RaceId::Dwarf));
        assert_eq!(ch.class_level(ClassId::Cleric), 1);
        assert_eq!(ch.in_room, db.mortal_start_room);
        assert_eq!(db.player_index.get("aragorn"), Some(&ch.get_idnum()));
        assert_eq!(ch.player().unwrap().passwd, hash_password("Aragorn", "secret").unwrap());
    }

    #[test]
    fn wrong_passwords_disconnect_after_three_tries() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Frodo");
        db.char_to_room(chid, 3001).unwrap();
        db.chars.get_mut(chid).unwrap().player_mut().unwrap().passwd =
            hash_password("Frodo", "ring").unwrap();

        let d = game.new_descriptor(None, "localhost");
        login(&mut game, &mut db, d, &["frodo", "one", "two"]);
        assert_eq!(game.descriptors.get(d).unwrap().state, ConPassword);
        login(&mut game, &mut db, d, &["three"]);
        let desc = game.descriptors.get(d).unwrap();
        assert_eq!(desc.state, ConClose);
        assert!(desc.output.ends_with("Wrong password... disconnecting.\r\n"));
    }

    #[test]
    fn linkless_bodies_are_reclaimed() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Frodo");
        db.char_to_room(chid, 3001).unwrap();
        db.chars.get_mut(chid).unwrap().player_mut().unwrap().passwd =
            hash_password("Frodo", "ring").unwrap();

        let d = game.new_descriptor(None, "localhost");
        login(&mut game, &mut db, d, &["Frodo", "ring"]);
        let desc = game.descriptors.get(d).unwrap();
        assert_eq!(desc.state, ConPlaying);
        assert_eq!(desc.character, Some(chid));
        assert!(desc.output.contains("Reconnecting."));
        assert_eq!(db.chars.get(chid).unwrap().desc, Some(d));
        assert_eq!(db.chars.len(), 1);
    }

    #[test]
    fn a_second_login_usurps_the_first() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Frodo");
        db.char_to_room(chid, 3001).unwrap();
        db.chars.get_mut(chid).unwrap().player_mut().unwrap().passwd =
            hash_password("Frodo", "ring").unwrap();
        let old = game.attach_test_desc(&mut db, chid);

        let d = game.new_descriptor(None, "localhost");
        login(&mut game, &mut db, d, &["frodo", "ring"]);
        assert_eq!(game.descriptors.get(d).unwrap().character, Some(chid));
        let old = game.descriptors.get(old).unwrap();
        assert_eq!(old.state, ConClose);
        assert!(old.character.is_none());
        assert!(old.output.contains("Multiple login detected"));
    }

    #[test]
    fn saved_players_log_back_in() {
        let mut game = game();
        let mut db = DB::test_world();
        let chid = db.new_player("Sam");
        db.do_start(&mut game.rng, chid, RaceId::Halfling, ClassId::Rogue).unwrap();
        db.chars.get_mut(chid).unwrap().player_mut().unwrap().passwd =
            hash_password("Sam", "taters").unwrap();
        db.char_to_room(chid, 3014).unwrap();
        let file: PlayerFile = db.build_player_file(chid).unwrap();
        db.char_from_room(chid).unwrap();
        db.chars.remove(chid);

        let d = game.new_descriptor(None, "localhost");
        let d_ = game.descriptors.get_mut(d).unwrap();
        d_.login.name = "Sam".to_string();
        d_.state = ConLoading;
        game.player_loaded(&mut db, d, "Sam", Ok(file));
        assert_eq!(game.descriptors.get(d).unwrap().state, ConPassword);
        login(&mut game, &mut db, d, &["taters"]);

        let desc = game.descriptors.get(d).unwrap();
        assert_eq!(desc.state, ConPlaying);
        let ch = db.chars.get(desc.character.unwrap()).unwrap();
        assert_eq!(ch.in_room, 3014);
        assert_eq!(ch.class_level(ClassId::Rogue), 1);
    }
}
