/* ************************************************************************
*   File: act_item.rs                                   Part of CircleMUD *
*  Usage: object handling routines -- get/drop and container handling     *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::interpreter::{one_argument, two_arguments, SCMD_WIELD};
use crate::structs::{ObjType, WearFlags, WearPos};
use crate::util::an;
use crate::{Game, VictimRef, TO_CHAR, TO_ROOM};

/* "all", "all.sword" or a single object name */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dots<'a> {
    Alone(&'a str),
    All,
    AllDot(&'a str),
}

fn find_all_dots(arg: &str) -> Dots<'_> {
    if arg.eq_ignore_ascii_case("all") {
        Dots::All
    } else if let Some(name) = arg.strip_prefix("all.") {
        Dots::AllDot(name)
    } else {
        Dots::Alone(arg)
    }
}

/* the visible objects of a list an all/all.x argument selects */
fn select_all(db: &DB, chid: DepotId, list: &[DepotId], dots: Dots) -> MudResult<Vec<DepotId>> {
    let ch = db.get_character(chid)?;
    Ok(list
        .iter()
        .copied()
        .filter(|oid| {
            db.objs.get(*oid).map_or(false, |obj| {
                db.can_see_obj(ch, obj)
                    && match dots {
                        Dots::AllDot(name) => crate::handler::isname(name, &obj.name),
                        _ => true,
                    }
            })
        })
        .collect())
}

/* runs an action on each selected object; a refusal is reported and the rest proceed */
fn for_each_obj<F>(game: &mut Game, db: &mut DB, chid: DepotId, list: Vec<DepotId>, mut action: F) -> MudResult<()>
where
    F: FnMut(&mut Game, &mut DB, DepotId) -> MudResult<()>,
{
    for oid in list {
        if let Err(err) = action(game, db, oid) {
            if !err.is_user_facing() {
                return Err(err);
            }
            let msg = format!("{}\r\n", err);
            game.send_to_char(db.get_character(chid)?, &msg);
        }
    }
    Ok(())
}

fn perform_put(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId, contid: DepotId) -> MudResult<()> {
    let obj = db.get_object(objid)?;
    let cont = db.get_object(contid)?;
    let inside: i32 = cont
        .contains
        .iter()
        .filter_map(|o| db.objs.get(*o))
        .map(|o| o.weight)
        .sum();
    if inside + obj.weight > cont.value[0] {
        let ch = db.get_character(chid)?;
        game.act(db, "$p won't fit in $P.", false, Some(ch), Some(obj), Some(VictimRef::Obj(cont)), TO_CHAR);
        return Ok(());
    }
    if db.obj_is_within(contid, objid) {
        return Err(MudError::invalid("You attempt to fold it into itself, but fail."));
    }

    db.obj_from_char(objid)?;
    db.obj_to_obj(objid, contid)?;

    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    let cont = db.get_object(contid)?;
    game.act(db, "$n puts $p in $P.", true, Some(ch), Some(obj), Some(VictimRef::Obj(cont)), TO_ROOM);
    game.act(db, "You put $p in $P.", false, Some(ch), Some(obj), Some(VictimRef::Obj(cont)), TO_CHAR);
    Ok(())
}

/*
 * put <obj> <container>, put all <container>, put all.<obj> <container>.
 * The container may be carried or in the room.
 */
pub fn do_put(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut theobj = String::new();
    let mut thecont = String::new();
    two_arguments(argument, &mut theobj, &mut thecont);

    if theobj.is_empty() {
        return Err(MudError::invalid("Put what in what?"));
    }
    if find_all_dots(&thecont) != Dots::Alone(&thecont) {
        return Err(MudError::invalid("You can only put things into one container at a time."));
    }
    if thecont.is_empty() {
        let what = if find_all_dots(&theobj) == Dots::Alone(&theobj) { theobj.as_str() } else { "them" };
        return Err(MudError::invalid(format!("What do you want to put {} in?", what)));
    }

    let ch = db.get_character(chid)?;
    let contid = db
        .get_obj_in_list_vis(ch, &thecont, &ch.carrying)
        .or_else(|| {
            let room = db.world.get(&ch.in_room)?;
            db.get_obj_in_list_vis(ch, &thecont, &room.contents)
        })
        .ok_or_else(|| MudError::not_found(format!("You don't see {} {} here.", an(&thecont), thecont)))?;
    let cont = db.get_object(contid)?;
    if cont.obj_type != ObjType::Container {
        game.act(db, "$p is not a container.", false, Some(ch), Some(cont), None, TO_CHAR);
        return Ok(());
    }

    match find_all_dots(&theobj) {
        Dots::Alone(name) => {
            let objid = db
                .get_obj_in_list_vis(ch, name, &ch.carrying)
                .ok_or_else(|| MudError::not_found(format!("You aren't carrying {} {}.", an(name), name)))?;
            if objid == contid {
                return Err(MudError::invalid("You attempt to fold it into itself, but fail."));
            }
            perform_put(game, db, chid, objid, contid)
        }
        dots => {
            let carrying = ch.carrying.clone();
            let list: Vec<DepotId> = select_all(db, chid, &carrying, dots)?
                .into_iter()
                .filter(|o| *o != contid)
                .collect();
            if list.is_empty() {
                return Err(match dots {
                    Dots::AllDot(name) => MudError::not_found(format!("You don't seem to have any {}s.", name)),
                    _ => MudError::not_found("You don't seem to have anything to put in it."),
                });
            }
            for_each_obj(game, db, chid, list, |game, db, oid| perform_put(game, db, chid, oid, contid))
        }
    }
}

fn can_take_obj(db: &DB, chid: DepotId, objid: DepotId) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    if ch.is_carrying_n() >= ch.can_carry_n() {
        return Err(MudError::invalid(format!("{}: you can't carry that many items.", obj.short_description)));
    }
    if !obj.wear_flags.contains(WearFlags::TAKE) {
        return Err(MudError::invalid(format!("{}: you can't take that!", obj.short_description)));
    }
    Ok(())
}

/* picked up coins go straight to the purse */
fn get_check_money(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId) -> MudResult<()> {
    let obj = db.get_object(objid)?;
    if obj.obj_type != ObjType::Money {
        return Ok(());
    }
    let amount = obj.value[0] as i64;
    db.extract_obj(objid)?;
    let ch = db.get_character_mut(chid)?;
    ch.points.gold += amount;
    let msg = if amount == 1 {
        "There was 1 coin.\r\n".to_string()
    } else {
        format!("There were {} coins.\r\n", amount)
    };
    game.send_to_char(db.get_character(chid)?, &msg);
    Ok(())
}

fn perform_get_from_container(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId, contid: DepotId) -> MudResult<()> {
    can_take_obj(db, chid, objid)?;
    db.obj_from_obj(objid)?;
    db.obj_to_char(objid, chid)?;

    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    let cont = db.get_object(contid)?;
    game.act(db, "You get $p from $P.", false, Some(ch), Some(obj), Some(VictimRef::Obj(cont)), TO_CHAR);
    game.act(db, "$n gets $p from $P.", true, Some(ch), Some(obj), Some(VictimRef::Obj(cont)), TO_ROOM);
    get_check_money(game, db, chid, objid)
}

fn get_from_container(game: &mut Game, db: &mut DB, chid: DepotId, contid: DepotId, arg: &str) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let cont = db.get_object(contid)?;
    match find_all_dots(arg) {
        Dots::Alone(name) => {
            let objid = match db.get_obj_in_list_vis(ch, name, &cont.contains) {
                Some(objid) => objid,
                None => {
                    let buf = format!("There doesn't seem to be {} {} in $p.", an(name), name);
                    game.act(db, &buf, false, Some(ch), Some(cont), None, TO_CHAR);
                    return Ok(());
                }
            };
            perform_get_from_container(game, db, chid, objid, contid)
        }
        dots => {
            let contents = cont.contains.clone();
            let list = select_all(db, chid, &contents, dots)?;
            if list.is_empty() {
                let buf = match dots {
                    Dots::AllDot(name) => format!("You can't seem to find any {}s in $p.", name),
                    _ => "$p seems to be empty.".to_string(),
                };
                let ch = db.get_character(chid)?;
                game.act(db, &buf, false, Some(ch), Some(db.get_object(contid)?), None, TO_CHAR);
                return Ok(());
            }
            for_each_obj(game, db, chid, list, |game, db, oid| perform_get_from_container(game, db, chid, oid, contid))
        }
    }
}

fn perform_get_from_room(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId) -> MudResult<()> {
    can_take_obj(db, chid, objid)?;
    db.obj_from_room(objid)?;
    db.obj_to_char(objid, chid)?;

    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    game.act(db, "You get $p.", false, Some(ch), Some(obj), None, TO_CHAR);
    game.act(db, "$n gets $p.", true, Some(ch), Some(obj), None, TO_ROOM);
    get_check_money(game, db, chid, objid)
}

fn get_from_room(game: &mut Game, db: &mut DB, chid: DepotId, arg: &str) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let contents = db.get_room(ch.in_room)?.contents.clone();
    match find_all_dots(arg) {
        Dots::Alone(name) => {
            let objid = db
                .get_obj_in_list_vis(ch, name, &contents)
                .ok_or_else(|| MudError::not_found(format!("You don't see {} {} here.", an(name), name)))?;
            perform_get_from_room(game, db, chid, objid)
        }
        dots => {
            let list = select_all(db, chid, &contents, dots)?;
            if list.is_empty() {
                return Err(match dots {
                    Dots::AllDot(name) => MudError::not_found(format!("You don't see any {}s here.", name)),
                    _ => MudError::not_found("There doesn't seem to be anything here."),
                });
            }
            for_each_obj(game, db, chid, list, |game, db, oid| perform_get_from_room(game, db, chid, oid))
        }
    }
}

pub fn do_get(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg1 = String::new();
    let mut arg2 = String::new();
    two_arguments(argument, &mut arg1, &mut arg2);

    if arg1.is_empty() {
        return Err(MudError::invalid("Get what?"));
    }
    if arg2.is_empty() {
        return get_from_room(game, db, chid, &arg1);
    }
    if find_all_dots(&arg2) != Dots::Alone(&arg2) {
        return Err(MudError::invalid("You can only get things from one container at a time."));
    }

    let ch = db.get_character(chid)?;
    let contid = db
        .get_obj_in_list_vis(ch, &arg2, &ch.carrying)
        .or_else(|| {
            let room = db.world.get(&ch.in_room)?;
            db.get_obj_in_list_vis(ch, &arg2, &room.contents)
        })
        .ok_or_else(|| MudError::not_found(format!("You don't have {} {}.", an(&arg2), arg2)))?;
    let cont = db.get_object(contid)?;
    if !matches!(cont.obj_type, ObjType::Container | ObjType::Corpse) {
        game.act(db, "$p is not a container.", false, Some(ch), Some(cont), None, TO_CHAR);
        return Ok(());
    }
    get_from_container(game, db, chid, contid, &arg1)
}

fn perform_drop(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId) -> MudResult<()> {
    let in_room = db.get_character(chid)?.in_room;
    db.obj_from_char(objid)?;
    db.obj_to_room(objid, in_room)?;

    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    game.act(db, "You drop $p.", false, Some(ch), Some(obj), None, TO_CHAR);
    game.act(db, "$n drops $p.", true, Some(ch), Some(obj), None, TO_ROOM);
    Ok(())
}

pub fn do_drop(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    if arg.is_empty() {
        return Err(MudError::invalid("What do you want to drop?"));
    }

    let ch = db.get_character(chid)?;
    match find_all_dots(&arg) {
        Dots::Alone(name) => {
            let objid = db
                .get_obj_in_list_vis(ch, name, &ch.carrying)
                .ok_or_else(|| MudError::not_found(format!("You don't seem to have {} {}.", an(name), name)))?;
            perform_drop(game, db, chid, objid)
        }
        dots => {
            let carrying = ch.carrying.clone();
            let list = select_all(db, chid, &carrying, dots)?;
            if list.is_empty() {
                return Err(match dots {
                    Dots::AllDot(name) => MudError::not_found(format!("You don't seem to have any {}s.", name)),
                    _ => MudError::not_found("You don't seem to be carrying anything."),
                });
            }
            for_each_obj(game, db, chid, list, |game, db, oid| perform_drop(game, db, chid, oid))
        }
    }
}

fn wear_message(pos: WearPos) -> (&'static str, &'static str) {
    match pos {
        WearPos::Light => ("$n lights $p and holds it.", "You light $p and hold it."),
        WearPos::FingerR => ("$n slides $p on to $s right ring finger.", "You slide $p on to your right ring finger."),
        WearPos::FingerL => ("$n slides $p on to $s left ring finger.", "You slide $p on to your left ring finger."),
        WearPos::Neck1 | WearPos::Neck2 => ("$n wears $p around $s neck.", "You wear $p around your neck."),
        WearPos::Body => ("$n wears $p on $s body.", "You wear $p on your body."),
        WearPos::Head => ("$n wears $p on $s head.", "You wear $p on your head."),
        WearPos::Legs => ("$n puts $p on $s legs.", "You put $p on your legs."),
        WearPos::Feet => ("$n wears $p on $s feet.", "You wear $p on your feet."),
        WearPos::Hands => ("$n puts $p on $s hands.", "You put $p on your hands."),
        WearPos::Arms => ("$n wears $p on $s arms.", "You wear $p on your arms."),
        WearPos::Shield => ("$n straps $p around $s arm as a shield.", "You start to use $p as a shield."),
        WearPos::About => ("$n wears $p about $s body.", "You wear $p around your body."),
        WearPos::Waist => ("$n wears $p around $s waist.", "You wear $p around your waist."),
        WearPos::WristR => ("$n puts $p on around $s right wrist.", "You put $p on around your right wrist."),
        WearPos::WristL => ("$n puts $p on around $s left wrist.", "You put $p on around your left wrist."),
        WearPos::Wield => ("$n wields $p.", "You wield $p."),
    }
}

fn already_wearing(pos: WearPos) -> &'static str {
    match pos {
        WearPos::Light => "You're already using a light.",
        WearPos::FingerR | WearPos::FingerL => "You're already wearing something on both of your ring fingers.",
        WearPos::Neck1 | WearPos::Neck2 => "You can't wear anything else around your neck.",
        WearPos::Body => "You're already wearing something on your body.",
        WearPos::Head => "You're already wearing something on your head.",
        WearPos::Legs => "You're already wearing something on your legs.",
        WearPos::Feet => "You're already wearing something on your feet.",
        WearPos::Hands => "You're already wearing something on your hands.",
        WearPos::Arms => "You're already wearing something on your arms.",
        WearPos::Shield => "You're already using a shield.",
        WearPos::About => "You're already wearing something about your body.",
        WearPos::Waist => "You already have something around your waist.",
        WearPos::WristR | WearPos::WristL => "You're already wearing something around both of your wrists.",
        WearPos::Wield => "You're already wielding a weapon.",
    }
}

/* the second slot of the paired positions */
fn paired_slot(pos: WearPos) -> Option<WearPos> {
    match pos {
        WearPos::FingerR => Some(WearPos::FingerL),
        WearPos::Neck1 => Some(WearPos::Neck2),
        WearPos::WristR => Some(WearPos::WristL),
        _ => None,
    }
}

fn perform_wear(game: &mut Game, db: &mut DB, chid: DepotId, objid: DepotId, pos: WearPos) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    if !obj.wear_flags.contains(pos.wear_flag()) {
        game.act(db, "You can't wear $p there.", false, Some(ch), Some(obj), None, TO_CHAR);
        return Ok(());
    }

    /* for finger, neck and wrist, try the second slot when the first is taken */
    let mut pos = pos;
    if ch.equipment[pos.index()].is_some() {
        if let Some(second) = paired_slot(pos) {
            pos = second;
        }
    }
    if ch.equipment[pos.index()].is_some() {
        return Err(MudError::invalid(already_wearing(pos)));
    }

    let (to_room, to_char) = wear_message(pos);
    game.act(db, to_room, true, Some(ch), Some(obj), None, TO_ROOM);
    game.act(db, to_char, false, Some(ch), Some(obj), None, TO_CHAR);
    db.obj_from_char(objid)?;
    db.equip_char(chid, objid, pos)
}

const KEYWORDS: [(&str, WearPos); 13] = [
    ("finger", WearPos::FingerR),
    ("neck", WearPos::Neck1),
    ("body", WearPos::Body),
    ("head", WearPos::Head),
    ("legs", WearPos::Legs),
    ("feet", WearPos::Feet),
    ("hands", WearPos::Hands),
    ("arms", WearPos::Arms),
    ("shield", WearPos::Shield),
    ("about", WearPos::About),
    ("waist", WearPos::Waist),
    ("wrist", WearPos::WristR),
    ("light", WearPos::Light),
];

/* where an object goes when worn; a body part argument overrides the guess */
fn find_eq_pos(obj_flags: WearFlags, arg: &str) -> MudResult<Option<WearPos>> {
    if !arg.is_empty() {
        return KEYWORDS
            .iter()
            .find(|(word, _)| word.eq_ignore_ascii_case(arg))
            .map(|(_, pos)| Some(*pos))
            .ok_or_else(|| MudError::invalid(format!("'{}'?  What part of your body is THAT?", arg)));
    }
    Ok(WearPos::ALL
        .iter()
        .copied()
        .filter(|pos| *pos != WearPos::Wield && paired_slot_of(*pos).is_none())
        .find(|pos| obj_flags.contains(pos.wear_flag())))
}

/* the left-hand slots are only reached through their right-hand twin */
fn paired_slot_of(pos: WearPos) -> Option<WearPos> {
    match pos {
        WearPos::FingerL => Some(WearPos::FingerR),
        WearPos::Neck2 => Some(WearPos::Neck1),
        WearPos::WristL => Some(WearPos::WristR),
        _ => None,
    }
}

pub fn do_wear(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let mut arg1 = String::new();
    let mut arg2 = String::new();
    two_arguments(argument, &mut arg1, &mut arg2);

    let ch = db.get_character(chid)?;
    if subcmd == SCMD_WIELD {
        if arg1.is_empty() {
            return Err(MudError::invalid("Wield what?"));
        }
        let objid = db
            .get_obj_in_list_vis(ch, &arg1, &ch.carrying)
            .ok_or_else(|| MudError::not_found(format!("You don't seem to have {} {}.", an(&arg1), arg1)))?;
        if !db.get_object(objid)?.wear_flags.contains(WearFlags::WIELD) {
            return Err(MudError::invalid("You can't wield that."));
        }
        return perform_wear(game, db, chid, objid, WearPos::Wield);
    }

    if arg1.is_empty() {
        return Err(MudError::invalid("Wear what?"));
    }
    match find_all_dots(&arg1) {
        Dots::Alone(name) => {
            let objid = db
                .get_obj_in_list_vis(ch, name, &ch.carrying)
                .ok_or_else(|| MudError::not_found(format!("You don't seem to have {} {}.", an(name), name)))?;
            let obj = db.get_object(objid)?;
            match find_eq_pos(obj.wear_flags, &arg2)? {
                Some(pos) => perform_wear(game, db, chid, objid, pos),
                None => {
                    game.act(db, "You can't wear $p.", false, Some(ch), Some(obj), None, TO_CHAR);
                    Ok(())
                }
            }
        }
        dots => {
            if !arg2.is_empty() {
                return Err(MudError::invalid("You can't wear multiple items on the same body part."));
            }
            let carrying = ch.carrying.clone();
            let list: Vec<(DepotId, WearPos)> = select_all(db, chid, &carrying, dots)?
                .into_iter()
                .filter_map(|oid| {
                    let flags = db.objs.get(oid)?.wear_flags;
                    find_eq_pos(flags, "").ok().flatten().map(|pos| (oid, pos))
                })
                .collect();
            if list.is_empty() {
                return Err(match dots {
                    Dots::AllDot(name) => MudError::not_found(format!("You don't seem to have any {}s you can wear.", name)),
                    _ => MudError::not_found("You don't seem to have anything wearable."),
                });
            }
            for (oid, pos) in list {
                if let Err(err) = perform_wear(game, db, chid, oid, pos) {
                    if !err.is_user_facing() {
                        return Err(err);
                    }
                    let msg = format!("{}\r\n", err);
                    game.send_to_char(db.get_character(chid)?, &msg);
                }
            }
            Ok(())
        }
    }
}

fn perform_remove(game: &mut Game, db: &mut DB, chid: DepotId, pos: WearPos) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let objid = ch.equipment[pos.index()]
        .ok_or_else(|| MudError::not_found("You aren't wearing anything there."))?;
    if ch.is_carrying_n() >= ch.can_carry_n() {
        let obj = db.get_object(objid)?;
        game.act(db, "$p: you can't carry that many items!", false, Some(ch), Some(obj), None, TO_CHAR);
        return Ok(());
    }

    db.unequip_char(chid, pos)?;
    db.obj_to_char(objid, chid)?;
    let ch = db.get_character(chid)?;
    let obj = db.get_object(objid)?;
    game.act(db, "You stop using $p.", false, Some(ch), Some(obj), None, TO_CHAR);
    game.act(db, "$n stops using $p.", true, Some(ch), Some(obj), None, TO_ROOM);
    Ok(())
}

pub fn do_remove(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    if arg.is_empty() {
        return Err(MudError::invalid("Remove what?"));
    }

    let ch = db.get_character(chid)?;
    match find_all_dots(&arg) {
        Dots::Alone(name) => {
            let (pos, _) = db
                .get_obj_in_equip_vis(ch, name)
                .ok_or_else(|| MudError::not_found(format!("You don't seem to be using {} {}.", an(name), name)))?;
            perform_remove(game, db, chid, pos)
        }
        dots => {
            let worn: Vec<WearPos> = WearPos::ALL
                .iter()
                .copied()
                .filter(|pos| {
                    ch.equipment[pos.index()]
                        .and_then(|o| db.objs.get(o))
                        .map_or(false, |obj| match dots {
                            Dots::AllDot(name) => crate::handler::isname(name, &obj.name),
                            _ => true,
                        })
                })
                .collect();
            if worn.is_empty() {
                return Err(match dots {
                    Dots::AllDot(name) => MudError::not_found(format!("You don't seem to be using any {}s.", name)),
                    _ => MudError::not_found("You're not using anything."),
                });
            }
            for pos in worn {
                perform_remove(game, db, chid, pos)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interpreter::SCMD_WEAR;
    use crate::structs::ObjLocation;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(5),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Hoarder");
        db.char_to_room(chid, 3014).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        (game, db, chid, d)
    }

    fn load_to_room(db: &mut DB, vnum: i32, room: i32) -> DepotId {
        let oid = db.read_object(vnum).unwrap();
        db.obj_to_room(oid, room).unwrap();
        oid
    }

    #[test]
    fn get_and_drop_move_objects_between_room_and_inventory() {
        let (mut game, mut db, chid, d) = setup();
        let dagger = load_to_room(&mut db, 3020, 3014);

        do_get(&mut game, &mut db, chid, "dagger", 0, 0).unwrap();
        assert_eq!(db.objs.get(dagger).unwrap().location, ObjLocation::Carried(chid));
        assert_eq!(game.take_output(d), "You get a dagger.\r\n");

        let err = do_get(&mut game, &mut db, chid, "dagger", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You don't see a dagger here.");

        do_drop(&mut game, &mut db, chid, "dagger", 0, 0).unwrap();
        assert_eq!(db.objs.get(dagger).unwrap().location, ObjLocation::InRoom(3014));
        assert!(db.chars.get(chid).unwrap().carrying.is_empty());
    }

    #[test]
    fn get_all_takes_everything_visible() {
        let (mut game, mut db, chid, _d) = setup();
        let a = load_to_room(&mut db, 3020, 3014);
        let b = load_to_room(&mut db, 3040, 3014);
        do_get(&mut game, &mut db, chid, "all", 0, 0).unwrap();
        let carrying = &db.chars.get(chid).unwrap().carrying;
        assert!(carrying.contains(&a) && carrying.contains(&b));
        assert!(db.world[&3014].contents.is_empty());

        let err = do_get(&mut game, &mut db, chid, "all", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "There doesn't seem to be anything here.");
    }

    #[test]
    fn containers_hold_objects_up_to_capacity() {
        let (mut game, mut db, chid, d) = setup();
        let bag = db.read_object(3022).unwrap();
        let dagger = db.read_object(3020).unwrap();
        let sword = db.read_object(3021).unwrap();
        for oid in [bag, dagger, sword] {
            db.obj_to_char(oid, chid).unwrap();
        }
        db.objs.get_mut(bag).unwrap().value[0] = 5;

        do_put(&mut game, &mut db, chid, "dagger bag", 0, 0).unwrap();
        assert_eq!(db.objs.get(dagger).unwrap().location, ObjLocation::InObj(bag));
        game.take_output(d);

        do_put(&mut game, &mut db, chid, "sword bag", 0, 0).unwrap();
        assert_eq!(game.take_output(d), "a long sword won't fit in a small bag.\r\n");
        assert_eq!(db.objs.get(sword).unwrap().location, ObjLocation::Carried(chid));

        let err = do_put(&mut game, &mut db, chid, "bag bag", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You attempt to fold it into itself, but fail.");

        do_get(&mut game, &mut db, chid, "dagger bag", 0, 0).unwrap();
        assert_eq!(db.objs.get(dagger).unwrap().location, ObjLocation::Carried(chid));
    }

    #[test]
    fn coins_go_to_the_purse() {
        let (mut game, mut db, chid, d) = setup();
        let coins = db.objs.push(crate::fight::create_money(42));
        db.obj_to_room(coins, 3014).unwrap();
        do_get(&mut game, &mut db, chid, "coins", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().points.gold, 42);
        assert!(db.objs.get(coins).is_none());
        assert!(game.take_output(d).ends_with("There were 42 coins.\r\n"));
    }

    #[test]
    fn wearing_wielding_and_removing() {
        let (mut game, mut db, chid, _d) = setup();
        let jacket = db.read_object(3040).unwrap();
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_char(jacket, chid).unwrap();
        db.obj_to_char(dagger, chid).unwrap();

        do_wear(&mut game, &mut db, chid, "jacket", 0, SCMD_WEAR).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().equipment[WearPos::Body.index()], Some(jacket));

        let err = do_wear(&mut game, &mut db, chid, "jacket", 0, SCMD_WEAR).unwrap_err();
        assert_eq!(err.to_string(), "You don't seem to have a jacket.");

        do_wear(&mut game, &mut db, chid, "dagger", 0, SCMD_WIELD).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().equipment[WearPos::Wield.index()], Some(dagger));

        do_remove(&mut game, &mut db, chid, "all", 0, 0).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert!(ch.equipment.iter().all(|e| e.is_none()));
        assert_eq!(ch.carrying.len(), 2);
    }

    #[test]
    fn body_part_arguments_are_checked() {
        let (mut game, mut db, chid, _d) = setup();
        let jacket = db.read_object(3040).unwrap();
        db.obj_to_char(jacket, chid).unwrap();
        let err = do_wear(&mut game, &mut db, chid, "jacket tail", 0, SCMD_WEAR).unwrap_err();
        assert_eq!(err.to_string(), "'tail'?  What part of your body is THAT?");
        let err = do_wear(&mut game, &mut db, chid, "jacket", 0, SCMD_WIELD).unwrap_err();
        assert_eq!(err.to_string(), "You can't wield that.");
    }
}
