/* ************************************************************************
*   File: act_informative.rs                            Part of CircleMUD *
*  Usage: Player-level commands of an informative nature                  *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use regex::Regex;

use crate::class::{level_exp, ClassId};
use crate::constants::{AFFECTED_BITS, ROOM_BITS, WEAR_WHERE};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::feat_display_name;
use crate::fight::{compute_armor_class, compute_attack_bonus};
use crate::interpreter::{half_chop, is_abbrev, search_block};
use crate::structs::ConState::ConPlaying;
use crate::structs::{
    AffectFlags, CharData, CombatMode, Direction, ObjData, ObjType, Position, Stat, LVL_CAP,
    LVL_IMMORT, LVL_IMPL,
};
use crate::util::{an, cap, fname, sprintbit};
use crate::{Game, VictimRef, TO_NOTVICT, TO_VICT};

#[derive(Clone, Copy, PartialEq, Eq)]
enum ShowObj {
    Long,
    Short,
    Action,
}

fn show_obj_to_char(obj: &ObjData, mode: ShowObj) -> String {
    let mut buf = match mode {
        ShowObj::Long => obj.description.clone(),
        ShowObj::Short => obj.short_description.clone(),
        ShowObj::Action => match obj.obj_type {
            ObjType::Container | ObjType::Corpse => {
                format!("It can hold things; try 'look in {}'.", fname(&obj.name))
            }
            ObjType::Weapon => format!("It deals {}d{} damage.", obj.value[0], obj.value[1]),
            _ => "You see nothing special..".to_string(),
        },
    };
    buf.push_str("\r\n");
    buf
}

fn list_obj_to_char(db: &DB, list: &[DepotId], ch: &CharData, mode: ShowObj, show: bool) -> String {
    let mut buf = String::new();
    for obj in list.iter().filter_map(|o| db.objs.get(*o)) {
        if db.can_see_obj(ch, obj) {
            buf.push_str(&show_obj_to_char(obj, mode));
        }
    }
    if buf.is_empty() && show {
        buf.push_str(" Nothing.\r\n");
    }
    buf
}

const DIAGNOSIS: [(i32, &str); 8] = [
    (100, "is in excellent condition."),
    (90, "has a few scratches."),
    (75, "has some small wounds and bruises."),
    (50, "has quite a few wounds."),
    (30, "has some big nasty wounds and scratches."),
    (15, "looks pretty hurt."),
    (0, "is in awful condition."),
    (-1, "is bleeding awfully from big wounds."),
];

fn diag_char_to_char(db: &DB, i: &CharData, ch: &CharData) -> String {
    let percent = if i.points.max_hit > 0 {
        (100 * i.points.hit) / i.points.max_hit
    } else {
        /* must be 0 max hit points */
        -1
    };
    let text = DIAGNOSIS
        .iter()
        .find(|(limit, _)| percent >= *limit)
        .map_or(DIAGNOSIS[7].1, |(_, text)| *text);
    format!("{} {}\r\n", cap(db.pers(i, ch)), text)
}

fn look_at_char(game: &mut Game, db: &DB, i: &CharData, ch: &CharData) {
    if ch.desc.is_none() {
        return;
    }
    if !i.description.is_empty() {
        game.send_to_char(ch, &i.description);
    } else {
        game.act(db, "You see nothing special about $m.", false, Some(i), None, Some(VictimRef::Char(ch)), TO_VICT);
    }
    let diag = diag_char_to_char(db, i, ch);
    game.send_to_char(ch, &diag);

    if i.equipment.iter().any(|e| e.is_some()) {
        game.send_to_char(ch, "\r\n");
        game.act(db, "$n is using:", false, Some(i), None, Some(VictimRef::Char(ch)), TO_VICT);
        let mut buf = String::new();
        for (pos, oid) in i.equipment.iter().enumerate() {
            if let Some(obj) = oid.and_then(|o| db.objs.get(o)) {
                if db.can_see_obj(ch, obj) {
                    buf.push_str(WEAR_WHERE[pos]);
                    buf.push_str(&show_obj_to_char(obj, ShowObj::Short));
                }
            }
        }
        game.send_to_char(ch, &buf);
    }
}

fn position_string(pos: Position) -> &'static str {
    match pos {
        Position::Dead => " is lying here, dead.",
        Position::Sleeping => " is sleeping here.",
        Position::Resting => " is resting here.",
        Position::Sitting => " is sitting here.",
        Position::Fighting => "!FIGHTING!",
        Position::Standing => " is standing here.",
    }
}

fn list_one_char(db: &DB, i: &CharData, ch: &CharData) -> String {
    let mut buf = String::new();
    let at_rest = i.npc().map_or(false, |npc| i.position == npc.default_pos);
    if i.is_npc() && !i.long_descr.is_empty() && at_rest && !i.is_fighting() {
        if i.aff_flagged(AffectFlags::INVISIBLE) {
            buf.push_str("*");
        }
        buf.push_str(&i.long_descr);
        return buf;
    }

    if i.is_npc() {
        buf.push_str(&cap(&i.short_descr));
    } else if i.title.is_empty() {
        buf.push_str(&i.name);
    } else {
        buf.push_str(&format!("{} {}", i.name, i.title));
    }
    if i.aff_flagged(AffectFlags::INVISIBLE) {
        buf.push_str(" (invisible)");
    }
    if !i.is_npc() && i.desc.is_none() {
        buf.push_str(" (linkless)");
    }

    match i.fighting.and_then(|f| db.chars.get(f)) {
        Some(opponent) => {
            buf.push_str(" is here, fighting ");
            if opponent.id == ch.id {
                buf.push_str("YOU!");
            } else if opponent.in_room == i.in_room {
                buf.push_str(&format!("{}!", db.pers(opponent, ch)));
            } else {
                buf.push_str("someone who has already left!");
            }
        }
        None if i.position == Position::Fighting => {
            /* no opponent left */
            buf.push_str(" is here struggling with thin air.");
        }
        None => buf.push_str(position_string(i.position)),
    }
    buf.push_str("\r\n");
    buf
}

fn list_char_to_char(db: &DB, list: &[DepotId], ch: &CharData) -> String {
    let mut buf = String::new();
    for i in list.iter().filter_map(|id| db.chars.get(*id)) {
        if i.id != ch.id && !i.notdeadyet && db.can_see(ch, i) {
            buf.push_str(&list_one_char(db, i, ch));
        }
    }
    buf
}

fn auto_exits(db: &DB, ch: &CharData) -> String {
    let exits: Vec<&str> = match db.world.get(&ch.in_room) {
        Some(room) => Direction::ALL
            .iter()
            .filter(|d| room.exit(**d).map_or(false, |e| !e.is_closed()))
            .map(|d| d.name())
            .collect(),
        None => Vec::new(),
    };
    if exits.is_empty() {
        "[ Exits: None! ]\r\n".to_string()
    } else {
        format!("[ Exits: {} ]\r\n", exits.join(" "))
    }
}

impl Game {
    /* the room name, its description, its exits and what is in it */
    pub fn look_at_room(&mut self, db: &DB, chid: DepotId) {
        let ch = match db.chars.get(chid) {
            Some(ch) if ch.desc.is_some() => ch,
            _ => return,
        };
        let room = match db.world.get(&ch.in_room) {
            Some(room) => room,
            None => return,
        };

        if ch.aff_flagged(AffectFlags::BLIND) {
            self.send_to_char(ch, "You see nothing but infinite darkness...\r\n");
            return;
        }
        if !db.light_ok(ch) && !ch.is_immortal() {
            self.send_to_char(ch, "It is pitch black...\r\n");
            return;
        }

        let mut buf = if ch.is_immortal() {
            format!(
                "[{}] {} [{}]\r\n",
                room.number,
                room.name,
                sprintbit(room.room_flags.bits(), &ROOM_BITS)
            )
        } else {
            format!("{}\r\n", room.name)
        };
        buf.push_str(&room.description);
        buf.push_str(&auto_exits(db, ch));
        buf.push_str(&list_obj_to_char(db, &room.contents, ch, ShowObj::Long, false));
        buf.push_str(&list_char_to_char(db, &room.peoples, ch));
        self.send_to_char(ch, &buf);
    }
}

fn look_in_direction(game: &mut Game, db: &DB, ch: &CharData, dir: Direction) {
    let exit = db.world.get(&ch.in_room).and_then(|room| room.exit(dir));
    let exit = match exit {
        Some(exit) => exit,
        None => {
            game.send_to_char(ch, "Nothing special there...\r\n");
            return;
        }
    };
    let mut buf = match db.world.get(&exit.to_room) {
        Some(to) if !exit.is_closed() && db.is_light(exit.to_room) => format!("You see {}.\r\n", to.name),
        _ => "You see nothing special.\r\n".to_string(),
    };
    if !exit.keyword.is_empty() {
        if exit.is_closed() {
            buf.push_str(&format!("The {} is closed.\r\n", fname(&exit.keyword)));
        } else if exit.exit_info.contains(crate::structs::ExitFlags::ISDOOR) {
            buf.push_str(&format!("The {} is open.\r\n", fname(&exit.keyword)));
        }
    }
    game.send_to_char(ch, &buf);
}

#[derive(Clone, Copy)]
enum Found {
    Carried,
    Here,
    Used,
}

/* an object in the inventory, then the equipment, then the room */
fn find_obj_near(db: &DB, ch: &CharData, arg: &str) -> Option<(DepotId, Found)> {
    if let Some(oid) = db.get_obj_in_list_vis(ch, arg, &ch.carrying) {
        return Some((oid, Found::Carried));
    }
    if let Some((_, oid)) = db.get_obj_in_equip_vis(ch, arg) {
        return Some((oid, Found::Used));
    }
    let room = db.world.get(&ch.in_room)?;
    db.get_obj_in_list_vis(ch, arg, &room.contents)
        .map(|oid| (oid, Found::Here))
}

fn look_in_obj(game: &mut Game, db: &DB, ch: &CharData, arg: &str) -> MudResult<()> {
    if arg.is_empty() {
        return Err(MudError::invalid("Look in what?"));
    }
    let (oid, found) = find_obj_near(db, ch, arg)
        .ok_or_else(|| MudError::not_found(format!("There doesn't seem to be {} {} here.", an(arg), arg)))?;
    let obj = db.get_object(oid)?;
    if !matches!(obj.obj_type, ObjType::Container | ObjType::Corpse) {
        return Err(MudError::invalid("There's nothing inside that!"));
    }
    let mut buf = fname(&obj.name).to_string();
    buf.push_str(match found {
        Found::Carried => " (carried): \r\n",
        Found::Here => " (here): \r\n",
        Found::Used => " (used): \r\n",
    });
    buf.push_str(&list_obj_to_char(db, &obj.contains, ch, ShowObj::Short, true));
    game.send_to_char(ch, &buf);
    Ok(())
}

/*
 * Given the argument "look at <target>", figure out what object or char
 * matches the target.  First, see if there is another char in the room
 * with the name.  Then check the objects near the looker.
 */
fn look_at_target(game: &mut Game, db: &DB, ch: &CharData, arg: &str) -> MudResult<()> {
    if arg.is_empty() {
        return Err(MudError::invalid("Look at what?"));
    }

    if let Some(vict) = db.get_char_room_vis(ch, arg).and_then(|v| db.chars.get(v)) {
        look_at_char(game, db, vict, ch);
        if vict.id != ch.id {
            if db.can_see(vict, ch) {
                game.act(db, "$n looks at you.", true, Some(ch), None, Some(VictimRef::Char(vict)), TO_VICT);
            }
            game.act(db, "$n looks at $N.", true, Some(ch), None, Some(VictimRef::Char(vict)), TO_NOTVICT);
        }
        return Ok(());
    }

    let (oid, _) = find_obj_near(db, ch, arg).ok_or_else(|| MudError::not_found("You do not see that here."))?;
    let obj = db.get_object(oid)?;
    game.send_to_char(ch, &show_obj_to_char(obj, ShowObj::Action));
    Ok(())
}

pub fn do_look(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let db: &DB = db;
    let ch = db.get_character(chid)?;
    if ch.desc.is_none() {
        return Ok(());
    }
    if ch.position < Position::Sleeping {
        return Err(MudError::invalid("You can't see anything but stars!"));
    }
    if ch.aff_flagged(AffectFlags::BLIND) {
        return Err(MudError::invalid("You can't see a damned thing, you're blind!"));
    }
    if !db.light_ok(ch) && !ch.is_immortal() {
        game.send_to_char(ch, "It is pitch black...\r\n");
        let people = db.get_room(ch.in_room)?.peoples.clone();
        let buf = list_char_to_char(db, &people, ch);
        game.send_to_char(ch, &buf);
        return Ok(());
    }

    let mut arg = String::new();
    let mut arg2 = String::new();
    half_chop(argument, &mut arg, &mut arg2);

    let dirs: Vec<&str> = Direction::ALL.iter().map(|d| d.name()).collect();
    if arg.is_empty() {
        /* "look" alone, without an argument at all */
        game.look_at_room(db, chid);
        Ok(())
    } else if is_abbrev(&arg, "in") {
        look_in_obj(game, db, ch, &arg2)
    } else if let Some(dir) = search_block(&arg, &dirs, false) {
        look_in_direction(game, db, ch, Direction::ALL[dir]);
        Ok(())
    } else if is_abbrev(&arg, "at") {
        look_at_target(game, db, ch, &arg2)
    } else {
        look_at_target(game, db, ch, &arg)
    }
}

fn class_summary(ch: &CharData) -> String {
    if ch.class_levels.is_empty() {
        return "none".to_string();
    }
    ch.class_levels
        .iter()
        .map(|(class, level)| format!("{} {}", class.name(), level))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn do_score(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let p = match ch.player() {
        Some(p) => p,
        None => return Ok(()),
    };

    let mut buf = format!(
        "You are {}{}{}, a level {} {}.\r\n",
        ch.name,
        if ch.title.is_empty() { "" } else { " " },
        ch.title,
        ch.total_level(),
        ch.race.map_or("creature", |r| r.name())
    );
    buf.push_str(&format!("Classes: {}\r\n", class_summary(ch)));
    buf.push_str(&format!(
        "You have {}({}) hit, {}({}) mana and {}({}) movement points.\r\n",
        ch.points.hit,
        ch.points.max_hit,
        ch.points.mana,
        ch.points.max_mana,
        ch.points.movem,
        ch.points.max_move
    ));
    buf.push_str(&format!(
        "Your armor class is {}, your attack bonus is {:+}, and your alignment is {}.\r\n",
        compute_armor_class(ch),
        compute_attack_bonus(ch),
        ch.alignment
    ));
    let stats: Vec<String> = Stat::ALL
        .iter()
        .map(|s| format!("{}: {} ({:+})", s.name(), ch.get_stat(*s), ch.stat_bonus(*s)))
        .collect();
    buf.push_str(&stats.join("  "));
    buf.push_str("\r\n");
    buf.push_str(&format!(
        "You have scored {} exp, and have {} gold coins.\r\n",
        ch.points.exp, ch.points.gold
    ));
    if !ch.is_immortal() && ch.total_level() < LVL_CAP {
        let need = level_exp(ch.total_level() + 1) - ch.points.exp;
        if need > 0 {
            buf.push_str(&format!("You need {} exp to reach your next level.\r\n", need));
        } else {
            buf.push_str("You have enough experience to gain a level.\r\n");
        }
    }
    buf.push_str(&format!(
        "You have {} feat points, {} trains, {} practices and {} boosts.\r\n",
        p.feat_points, p.trains, p.practices, p.boosts
    ));
    if let Some(class) = p.premade_class {
        buf.push_str(&format!("You are following the premade {} build.\r\n", class.name()));
    }

    match ch.position {
        Position::Dead => buf.push_str("You are DEAD!\r\n"),
        Position::Sleeping => buf.push_str("You are sleeping.\r\n"),
        Position::Resting => buf.push_str("You are resting.\r\n"),
        Position::Sitting => buf.push_str("You are sitting.\r\n"),
        Position::Fighting => {
            let opponent = ch.fighting.and_then(|f| db.chars.get(f));
            buf.push_str(&format!(
                "You are fighting {}.\r\n",
                opponent.map_or("thin air", |o| db.pers(o, ch))
            ));
        }
        Position::Standing => buf.push_str("You are standing.\r\n"),
    }
    match ch.combat_mode {
        CombatMode::PowerAttack(n) => buf.push_str(&format!("You are attacking with power ({}).\r\n", n)),
        CombatMode::CombatExpertise(n) => buf.push_str(&format!("You are fighting defensively ({}).\r\n", n)),
        CombatMode::None => {}
    }
    if let Some(casting) = &ch.casting {
        buf.push_str(&format!("You are casting '{}'.\r\n", casting.spell.name()));
    }
    if !ch.aff_flags.is_empty() {
        buf.push_str(&format!(
            "Affected by: {}\r\n",
            sprintbit(ch.aff_flags.bits(), &AFFECTED_BITS)
        ));
    }
    for af in &ch.affected {
        buf.push_str(&format!(
            "Spell: ({:3}hr) {}\r\n",
            af.duration,
            af.spell.name()
        ));
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

pub fn do_inventory(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let mut buf = "You are carrying:\r\n".to_string();
    buf.push_str(&list_obj_to_char(db, &ch.carrying, ch, ShowObj::Short, true));
    game.send_to_char(ch, &buf);
    Ok(())
}

pub fn do_equipment(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let mut buf = "You are using:\r\n".to_string();
    let mut found = false;
    for (pos, oid) in ch.equipment.iter().enumerate() {
        if let Some(obj) = oid.and_then(|o| db.objs.get(o)) {
            found = true;
            buf.push_str(WEAR_WHERE[pos]);
            if db.can_see_obj(ch, obj) {
                buf.push_str(&show_obj_to_char(obj, ShowObj::Short));
            } else {
                buf.push_str("Something.\r\n");
            }
        }
    }
    if !found {
        buf.push_str(" Nothing.\r\n");
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

pub fn do_feats(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let mut buf = "You know the following feats:\r\n".to_string();
    let mut any = false;
    for (feat, rank) in ch.feats.known() {
        any = true;
        let name = feat_display_name(&ch.feats, feat);
        if rank > 1 {
            buf.push_str(&format!("  {} (rank {})\r\n", name, rank));
        } else {
            buf.push_str(&format!("  {}\r\n", name));
        }
    }
    if !any {
        buf.push_str("  None.\r\n");
    }
    if let Some(p) = ch.player() {
        buf.push_str(&format!("You have {} feat points to spend.\r\n", p.feat_points));
        if p.epic_feat_points > 0 {
            buf.push_str(&format!("You have {} epic feat points to spend.\r\n", p.epic_feat_points));
        }
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

pub fn do_skills(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let mut buf = "You have the following skills:\r\n".to_string();
    let trained: Vec<_> = ch.abilities.iter().filter(|(_, rank)| **rank > 0).collect();
    if trained.is_empty() {
        buf.push_str("  None.\r\n");
    }
    for (ability, rank) in trained {
        buf.push_str(&format!("  {:<20} {:2}\r\n", ability.name(), rank));
    }
    if let Some(p) = ch.player() {
        buf.push_str(&format!("You have {} trains left.\r\n", p.trains));
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

pub fn do_spells(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let known = match ch.player() {
        Some(p) if p.spells_known.values().any(|s| !s.is_empty()) => &p.spells_known,
        _ => return Err(MudError::invalid("You do not know any spells.")),
    };
    let mut buf = String::new();
    for (class, spells) in known {
        if spells.is_empty() {
            continue;
        }
        let top = crate::class::max_circle(*class, ch.class_level(*class));
        buf.push_str(&format!("{} spells:\r\n", class.name()));
        let mut list: Vec<(u8, &str)> = spells
            .iter()
            .map(|s| (s.info().circle(*class).unwrap_or(0), s.name()))
            .collect();
        list.sort();
        for (circle, name) in list {
            buf.push_str(&format!(
                "  [{}] {}{}\r\n",
                circle,
                name,
                if circle > top { " (not yet)" } else { "" }
            ));
        }
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

const WHO_FORMAT: &str = "format: who [minlev[-maxlev]] [-n name] [-r] [-z] [-s]";

/* "10" or "10-20" */
fn parse_level_range(arg: &str) -> Option<(u8, u8)> {
    let re = Regex::new(r"^(\d{1,3})(?:-(\d{1,3}))?$").ok()?;
    let caps = re.captures(arg)?;
    let low = caps[1].parse().ok()?;
    let high = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => LVL_IMPL,
    };
    Some((low, high))
}

fn class_abbrev(ch: &CharData) -> &'static str {
    ch.main_class().map_or("--", |c: ClassId| c.info().abbrev)
}

pub fn do_who(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut low = 0;
    let mut high = LVL_IMPL;
    let mut name_search = String::new();
    let mut who_room = false;
    let mut localwho = false;
    let mut short_list = false;

    let mut rest = argument.trim().to_string();
    while !rest.is_empty() {
        let mut arg = String::new();
        let mut buf1 = String::new();
        half_chop(&rest, &mut arg, &mut buf1);
        rest = buf1;
        if arg.starts_with(|c: char| c.is_ascii_digit()) {
            (low, high) = parse_level_range(&arg).ok_or_else(|| MudError::invalid(WHO_FORMAT))?;
            continue;
        }
        match arg.as_str() {
            "-z" => localwho = true,
            "-s" => short_list = true,
            "-r" => who_room = true,
            "-n" | "-l" => {
                let mut value = String::new();
                let mut buf2 = String::new();
                half_chop(&rest, &mut value, &mut buf2);
                rest = buf2;
                if arg == "-n" {
                    name_search = value;
                } else {
                    (low, high) = parse_level_range(&value).ok_or_else(|| MudError::invalid(WHO_FORMAT))?;
                }
            }
            _ => return Err(MudError::invalid(WHO_FORMAT)),
        }
    }

    let ch = db.get_character(chid)?;
    let zone = db.world.get(&ch.in_room).map(|r| r.zone);
    let mut buf = "Players\r\n-------\r\n".to_string();
    let mut num_can_see = 0;

    let playing: Vec<DepotId> = game
        .descriptors
        .iter()
        .filter(|d| d.state == ConPlaying)
        .filter_map(|d| d.character)
        .collect();
    for tch in playing.iter().filter_map(|id| db.chars.get(*id)) {
        if !name_search.is_empty() && !tch.name.eq_ignore_ascii_case(&name_search) && !tch.title.contains(&name_search) {
            continue;
        }
        if !db.can_see(ch, tch) || tch.get_level() < low || tch.get_level() > high {
            continue;
        }
        if localwho && db.world.get(&tch.in_room).map(|r| r.zone) != zone {
            continue;
        }
        if who_room && tch.in_room != ch.in_room {
            continue;
        }
        num_can_see += 1;
        if short_list {
            buf.push_str(&format!("[{:2} {}] {:12}", tch.get_level(), class_abbrev(tch), tch.name));
            if num_can_see % 4 == 0 {
                buf.push_str("\r\n");
            }
            continue;
        }
        buf.push_str(&format!("[{:2} {}] {}", tch.get_level(), class_abbrev(tch), tch.name));
        if !tch.title.is_empty() {
            buf.push(' ');
            buf.push_str(&tch.title);
        }
        if tch.aff_flagged(AffectFlags::INVISIBLE) {
            buf.push_str(" (invis)");
        }
        if tch.get_level() >= LVL_IMMORT {
            buf.push_str(" (immortal)");
        }
        buf.push_str("\r\n");
    }
    if short_list && num_can_see % 4 != 0 {
        buf.push_str("\r\n");
    }
    match num_can_see {
        0 => buf.push_str("\r\nNobody at all!\r\n"),
        1 => buf.push_str("\r\nOne lonely character displayed.\r\n"),
        n => buf.push_str(&format!("\r\n{} characters displayed.\r\n", n)),
    }
    game.send_to_char(ch, &buf);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feats::FeatId;
    use crate::spells::SpellId;
    use crate::structs::WearPos;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(7),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Looker");
        db.char_to_room(chid, 3014).unwrap();
        db.chars.get_mut(chid).unwrap().class_levels.insert(ClassId::Warrior, 3);
        let d = game.attach_test_desc(&mut db, chid);
        (game, db, chid, d)
    }

    #[test]
    fn the_room_shows_exits_objects_and_people() {
        let (mut game, mut db, chid, d) = setup();
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_room(dagger, 3014).unwrap();
        let fido = db.read_mobile(3062).unwrap();
        db.char_to_room(fido, 3014).unwrap();

        do_look(&mut game, &mut db, chid, "", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.starts_with("Market Square\r\n"));
        assert!(out.contains("[ Exits: north east ]\r\n"));
        assert!(out.contains("A dagger has been left here.\r\n"));
        assert!(out.contains(&db.chars.get(fido).unwrap().long_descr));
        assert!(!out.contains("Looker"));
    }

    #[test]
    fn closed_doors_hide_the_exit() {
        let (mut game, mut db, chid, d) = setup();
        db.move_character(chid, 3016).unwrap();
        do_look(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert!(game.take_output(d).contains("[ Exits: north ]"));
        do_look(&mut game, &mut db, chid, "east", 0, 0).unwrap();
        assert!(game.take_output(d).contains("The door is closed.\r\n"));
    }

    #[test]
    fn looking_at_people_diagnoses_them() {
        let (mut game, mut db, chid, d) = setup();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3014).unwrap();
        {
            let g = db.chars.get_mut(golem).unwrap();
            g.points.max_hit = 100;
            g.points.hit = 40;
        }
        do_look(&mut game, &mut db, chid, "at golem", 0, 0).unwrap();
        assert!(game.take_output(d).contains("has some big nasty wounds and scratches.\r\n"));

        let err = do_look(&mut game, &mut db, chid, "at dragon", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You do not see that here.");
    }

    #[test]
    fn containers_list_their_contents() {
        let (mut game, mut db, chid, d) = setup();
        let bag = db.read_object(3022).unwrap();
        let dagger = db.read_object(3020).unwrap();
        db.obj_to_char(bag, chid).unwrap();
        db.obj_to_obj(dagger, bag).unwrap();
        do_look(&mut game, &mut db, chid, "in bag", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.starts_with("bag (carried): \r\n"));
        assert!(out.contains(&db.objs.get(dagger).unwrap().short_description));

        let err = do_look(&mut game, &mut db, chid, "in dagger", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "There doesn't seem to be a dagger here.");
    }

    #[test]
    fn inventory_and_equipment_lists() {
        let (mut game, mut db, chid, d) = setup();
        do_inventory(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(game.take_output(d), "You are carrying:\r\n Nothing.\r\n");

        let jacket = db.read_object(3040).unwrap();
        db.obj_to_char(jacket, chid).unwrap();
        db.obj_from_char(jacket).unwrap();
        db.equip_char(chid, jacket, WearPos::Body).unwrap();
        do_equipment(&mut game, &mut db, chid, "", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.contains("<worn on body>       "));
        assert!(out.contains(&db.objs.get(jacket).unwrap().short_description));
    }

    #[test]
    fn score_names_the_character_and_classes() {
        let (mut game, mut db, chid, d) = setup();
        do_score(&mut game, &mut db, chid, "", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.starts_with("You are Looker, a level 3 "));
        assert!(out.contains("Classes: Warrior 3\r\n"));
        assert!(out.contains("You are standing.\r\n"));
    }

    #[test]
    fn feats_and_spells_are_listed() {
        let (mut game, mut db, chid, d) = setup();
        db.grant_feat(chid, FeatId::PowerAttack, None).unwrap();
        do_feats(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert!(game.take_output(d).contains(FeatId::PowerAttack.name()));

        let err = do_spells(&mut game, &mut db, chid, "", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You do not know any spells.");
        db.chars.get_mut(chid).unwrap().class_levels.insert(ClassId::Wizard, 1);
        db.learn_spell(chid, ClassId::Wizard, SpellId::MagicMissile).unwrap();
        do_spells(&mut game, &mut db, chid, "", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.contains("Wizard spells:\r\n"));
        assert!(out.contains(SpellId::MagicMissile.name()));
    }

    #[test]
    fn who_filters_by_level() {
        let (mut game, mut db, chid, d) = setup();
        let other = db.new_player("Sleepy");
        db.char_to_room(other, 3001).unwrap();
        db.chars.get_mut(other).unwrap().class_levels.insert(ClassId::Cleric, 10);
        game.attach_test_desc(&mut db, other);

        do_who(&mut game, &mut db, chid, "", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(out.contains("Looker") && out.contains("Sleepy"));
        assert!(out.ends_with("2 characters displayed.\r\n"));

        do_who(&mut game, &mut db, chid, "5-20", 0, 0).unwrap();
        let out = game.take_output(d);
        assert!(!out.contains("Looker") && out.contains("Sleepy"));

        assert!(do_who(&mut game, &mut db, chid, "-x", 0, 0).is_err());
    }
}
