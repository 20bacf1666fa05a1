/* ************************************************************************
*   File: spell_parser.rs                               Part of CircleMUD *
*  Usage: top-level magic routines; outside points of entry to magic sys. *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use crate::class::{max_circle, ClassId};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::events::{EventId, EventKind};
use crate::fight::pk_blocked;
use crate::interpreter::{any_one_arg, is_abbrev, one_argument};
use crate::spells::{mana_cost, SpellId, SpellInfo, SpellTarget, SPELL_INFO};
use crate::structs::{CastTarget, CastingData, CharData, Position, RoomFlags, PASSES_PER_SEC};
use crate::{Game, VictimRef, TO_CHAR, TO_ROOM, TO_VICT};

struct Syllable {
    org: &'static str,
    news: &'static str,
}

const SYLS: &[Syllable] = &[
    Syllable { org: " ", news: " " },
    Syllable { org: "ar", news: "abra" },
    Syllable { org: "ate", news: "i" },
    Syllable { org: "cau", news: "kada" },
    Syllable { org: "blind", news: "nose" },
    Syllable { org: "bur", news: "mosa" },
    Syllable { org: "cu", news: "judi" },
    Syllable { org: "de", news: "oculo" },
    Syllable { org: "dis", news: "mar" },
    Syllable { org: "ect", news: "kamina" },
    Syllable { org: "en", news: "uns" },
    Syllable { org: "gro", news: "cra" },
    Syllable { org: "light", news: "dies" },
    Syllable { org: "lo", news: "hi" },
    Syllable { org: "magi", news: "kari" },
    Syllable { org: "mon", news: "bar" },
    Syllable { org: "mor", news: "zak" },
    Syllable { org: "move", news: "sido" },
    Syllable { org: "ness", news: "lacri" },
    Syllable { org: "ning", news: "illa" },
    Syllable { org: "per", news: "duda" },
    Syllable { org: "ra", news: "gru" },
    Syllable { org: "re", news: "candus" },
    Syllable { org: "son", news: "sabru" },
    Syllable { org: "tect", news: "infra" },
    Syllable { org: "tri", news: "cula" },
    Syllable { org: "ven", news: "nofo" },
    Syllable { org: "a", news: "i" },
    Syllable { org: "b", news: "v" },
    Syllable { org: "c", news: "q" },
    Syllable { org: "d", news: "m" },
    Syllable { org: "e", news: "o" },
    Syllable { org: "f", news: "y" },
    Syllable { org: "g", news: "t" },
    Syllable { org: "h", news: "p" },
    Syllable { org: "i", news: "u" },
    Syllable { org: "j", news: "y" },
    Syllable { org: "k", news: "t" },
    Syllable { org: "l", news: "r" },
    Syllable { org: "m", news: "w" },
    Syllable { org: "n", news: "b" },
    Syllable { org: "o", news: "a" },
    Syllable { org: "p", news: "s" },
    Syllable { org: "q", news: "d" },
    Syllable { org: "r", news: "f" },
    Syllable { org: "s", news: "g" },
    Syllable { org: "t", news: "h" },
    Syllable { org: "u", news: "e" },
    Syllable { org: "v", news: "z" },
    Syllable { org: "w", news: "x" },
    Syllable { org: "x", news: "n" },
    Syllable { org: "y", news: "l" },
    Syllable { org: "z", news: "k" },
];

/* what people who don't know the spell hear */
pub fn garble(name: &str) -> String {
    let mut buf = String::new();
    let mut rest = name;
    while let Some(c) = rest.chars().next() {
        match SYLS.iter().find(|syl| rest.starts_with(syl.org)) {
            Some(syl) => {
                buf.push_str(syl.news);
                rest = &rest[syl.org.len()..];
            }
            None => {
                /* i.e., we didn't find a match in SYLS[] */
                buf.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    buf
}

/*
 * Spell names match whole or by abbreviated words, so "mag mi" finds
 * magic missile.
 */
pub fn find_spell(name: &str) -> Option<SpellId> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    SPELL_INFO
        .iter()
        .find(|info| is_abbrev(name, info.name))
        .or_else(|| {
            SPELL_INFO.iter().find(|info| {
                let mut words = info.name.split_whitespace();
                let mut rest = name;
                loop {
                    let mut first = String::new();
                    rest = any_one_arg(rest, &mut first);
                    if first.is_empty() {
                        return true;
                    }
                    match words.next() {
                        Some(word) if is_abbrev(&first, word) => {}
                        _ => return false,
                    }
                }
            })
        })
        .map(|info| info.id)
}

fn knows_spell(ch: &CharData, class: ClassId, spell: SpellId) -> bool {
    ch.player()
        .and_then(|p| p.spells_known.get(&class))
        .map_or(false, |known| known.contains(&spell))
}

/*
 * The class a character casts a spell with: the first one that knows it
 * and has the circle available.  Err carries the reason when none does.
 */
pub fn casting_class(ch: &CharData, spell: SpellId) -> MudResult<ClassId> {
    let info = spell.info();
    let mut known = false;
    for (class, level) in &ch.class_levels {
        if !knows_spell(ch, *class, spell) {
            continue;
        }
        known = true;
        if let Some(circle) = info.circle(*class) {
            if circle <= max_circle(*class, *level) {
                return Ok(*class);
            }
        }
    }
    if known {
        Err(MudError::invalid("You are not yet powerful enough to cast that spell."))
    } else {
        Err(MudError::invalid("You do not know that spell!"))
    }
}

fn position_message(pos: Position) -> &'static str {
    match pos {
        Position::Sleeping => "You dream about great magical powers.",
        Position::Resting => "You cannot concentrate while resting.",
        Position::Sitting => "You can't do this sitting!",
        Position::Fighting => "Impossible!  You can't concentrate enough!",
        _ => "You can't do much of anything like this!",
    }
}

/* finds the target of a spell from the argument typed after it */
fn find_spell_target(db: &DB, ch: &CharData, info: &SpellInfo, arg: &str) -> MudResult<CastTarget> {
    let not_found = || MudError::not_found("Cannot find the target of your spell!");
    match info.targets {
        SpellTarget::Ignore | SpellTarget::Area => Ok(CastTarget::None),
        SpellTarget::SelfOnly => {
            if !arg.is_empty() && db.get_char_room_vis(ch, arg) != Some(ch.id) {
                return Err(MudError::invalid("You can only cast this spell upon yourself!"));
            }
            Ok(CastTarget::Char(ch.id))
        }
        SpellTarget::ObjInv => {
            if arg.is_empty() {
                return Err(MudError::invalid("What should the spell be cast upon?"));
            }
            db.get_obj_in_list_vis(ch, arg, &ch.carrying)
                .map(CastTarget::Obj)
                .ok_or_else(not_found)
        }
        SpellTarget::CharDefensive => {
            if arg.is_empty() {
                /* if no target specified, and the spell isn't violent, default to self */
                return Ok(CastTarget::Char(ch.id));
            }
            db.get_char_room_vis(ch, arg)
                .map(CastTarget::Char)
                .ok_or_else(not_found)
        }
        SpellTarget::CharOffensive => {
            if arg.is_empty() {
                return ch
                    .fighting
                    .filter(|v| db.chars.get(*v).map_or(false, |v| v.in_room == ch.in_room))
                    .map(CastTarget::Char)
                    .ok_or_else(|| MudError::invalid("Upon whom should the spell be cast?"));
            }
            db.get_char_room_vis(ch, arg)
                .map(CastTarget::Char)
                .ok_or_else(not_found)
        }
    }
}

impl Game {
    fn say_spell(&mut self, db: &DB, chid: DepotId, spell: SpellId, target: CastTarget) {
        let ch = match db.chars.get(chid) {
            Some(ch) => ch,
            None => return,
        };
        let name = spell.name();
        let garbled = garble(name);
        let tch = match target {
            CastTarget::Char(v) if v != chid => db.chars.get(v).filter(|v| v.in_room == ch.in_room),
            _ => None,
        };
        let tobj = match target {
            CastTarget::Obj(o) => db.objs.get(o),
            _ => None,
        };
        let format = if tch.is_some() {
            "$n stares at $N and utters the words, '%s'."
        } else if tobj.is_some() {
            "$n stares at $p and utters the words, '%s'."
        } else if matches!(target, CastTarget::Char(_)) {
            "$n closes $s eyes and utters the words, '%s'."
        } else {
            "$n utters the words, '%s'."
        };
        let buf1 = format.replace("%s", name);
        let buf2 = format.replace("%s", &garbled);

        let listeners = match db.world.get(&ch.in_room) {
            Some(room) => room.peoples.clone(),
            None => return,
        };
        for lid in listeners {
            let listener = match db.chars.get(lid) {
                Some(l) => l,
                None => continue,
            };
            if lid == chid || Some(lid) == tch.map(|t| t.id) || listener.desc.is_none() || !listener.awake() {
                continue;
            }
            let knows = listener.class_levels.keys().any(|c| knows_spell(listener, *c, spell));
            let msg = if knows { &buf1 } else { &buf2 };
            self.deliver_act(db, msg, Some(ch), tobj, tch.map(VictimRef::Char), listener);
        }

        if let Some(tch) = tch {
            let knows = tch.class_levels.keys().any(|c| knows_spell(tch, *c, spell));
            let buf = format!(
                "$n stares at you and utters the words, '{}'.",
                if knows { name } else { &garbled }
            );
            self.act(db, &buf, false, Some(ch), None, Some(VictimRef::Char(tch)), TO_VICT);
        }
    }

    /* stops a casting in progress; false when there was none */
    pub fn abort_casting(&mut self, db: &mut DB, chid: DepotId) -> bool {
        let casting = match db.chars.get_mut(chid) {
            Some(ch) => ch.casting.take(),
            None => return false,
        };
        match casting {
            Some(casting) => {
                self.events.cancel(casting.event);
                true
            }
            None => false,
        }
    }

    /* the casting time is over: the spell goes off */
    pub fn finish_casting(&mut self, db: &mut DB, chid: DepotId, ev_id: EventId) -> MudResult<()> {
        let casting = match db.chars.get(chid) {
            Some(ch) if !ch.notdeadyet => ch.casting,
            _ => return Ok(()),
        };
        /* an event left over from an aborted casting */
        let casting = match casting {
            Some(casting) if casting.event == ev_id => casting,
            _ => return Ok(()),
        };
        db.get_character_mut(chid)?.casting = None;

        let info = casting.spell.info();
        let ch = db.get_character(chid)?;
        if ch.position < info.min_pos {
            self.send_to_char(ch, "You lose your concentration.\r\n");
            return Ok(());
        }
        let level = ch.class_level(casting.class);
        match self.call_magic(db, chid, casting.spell, level, casting.target) {
            Ok(()) => {}
            Err(err) if err.is_user_facing() => {
                self.send_to_char(db.get_character(chid)?, &format!("{}\r\n", err));
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        /* affect-only attack spells start the fight too */
        if let CastTarget::Char(victid) = casting.target {
            let both_alive = [chid, victid]
                .iter()
                .all(|id| db.chars.get(*id).map_or(false, |c| !c.notdeadyet && c.position > Position::Dead));
            if info.violent() && victid != chid && both_alive {
                self.set_fighting(db, chid, victid)?;
                self.set_fighting(db, victid, chid)?;
            }
        }
        Ok(())
    }
}

/*
 * do_cast is the entry point for PC-casted spells.  It parses the
 * arguments, determines the spell number and finds a target, spends the
 * mana and starts the casting timer.
 */
pub fn do_cast(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    if ch.is_npc() {
        return Ok(());
    }
    if ch.is_casting() {
        return Err(MudError::invalid("You are already casting a spell!"));
    }

    /* get: blank, spell name, target name */
    if argument.trim().is_empty() {
        return Err(MudError::invalid("Cast what where?"));
    }
    let mut parts = argument.splitn(3, '\'');
    parts.next();
    let name = parts.next().ok_or_else(|| {
        MudError::invalid("Spell names must be enclosed in the Holy Magic Symbols: '")
    })?;
    let spell = find_spell(name).ok_or_else(|| MudError::invalid("Cast what?!?"))?;
    let info = spell.info();
    let class = casting_class(ch, spell)?;
    if ch.position < info.min_pos {
        return Err(MudError::invalid(position_message(ch.position)));
    }

    let mut arg = String::new();
    one_argument(parts.next().unwrap_or(""), &mut arg);
    let target = find_spell_target(db, ch, info, &arg)?;

    if info.violent() {
        if db.get_room(ch.in_room)?.room_flags.contains(RoomFlags::PEACEFUL) {
            return Err(MudError::invalid(
                "A flash of white light fills the room, dispelling your violent magic!",
            ));
        }
        if let CastTarget::Char(victid) = target {
            if victid == chid {
                return Err(MudError::invalid("You can't cast that on yourself!"));
            }
            if pk_blocked(db, chid, victid) {
                return Err(MudError::invalid("You can't attack other players here."));
            }
        }
    }

    let circle = info.circle(class).unwrap_or_else(|| info.min_circle());
    let mana = mana_cost(circle);
    if ch.points.mana < mana && !ch.is_immortal() {
        return Err(MudError::invalid("You haven't the energy to cast that spell!"));
    }

    let delay = info.casting_time * PASSES_PER_SEC;
    let event = game.events.schedule(delay, EventKind::CastComplete { ch: chid });
    let due = game.pulse + delay.max(1);
    {
        let ch = db.get_character_mut(chid)?;
        if !ch.is_immortal() {
            ch.points.mana -= mana;
        }
        ch.casting = Some(CastingData {
            spell,
            class,
            target,
            due,
            event,
        });
    }
    game.say_spell(db, chid, spell, target);
    let ch = db.get_character(chid)?;
    game.act(
        db,
        &format!("You begin casting {}.", info.name),
        false,
        Some(ch),
        None,
        None,
        TO_CHAR,
    );
    Ok(())
}

pub fn do_abort(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    if !game.abort_casting(db, chid) {
        return Err(MudError::invalid("You aren't casting anything."));
    }
    let ch = db.get_character(chid)?;
    game.send_to_char(ch, "You abort your spell.\r\n");
    game.act(db, "$n stops chanting abruptly.", true, Some(ch), None, None, TO_ROOM);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::structs::CharAbilityData;

    fn wizard() -> (Game, DB, DepotId) {
        let game = Game::new(Config {
            seed: Some(3),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Mordo");
        db.chars.get_mut(chid).unwrap().real_abils = CharAbilityData::new([10, 12, 12, 18, 10, 10]);
        db.chars.get_mut(chid).unwrap().class_levels.insert(ClassId::Wizard, 3);
        db.learn_spell(chid, ClassId::Wizard, SpellId::MagicMissile).unwrap();
        db.learn_spell(chid, ClassId::Wizard, SpellId::Fireball).unwrap();
        {
            let ch = db.chars.get_mut(chid).unwrap();
            ch.base_points.max_mana = 50;
            ch.base_points.max_hit = 20;
            ch.points.mana = 50;
            ch.points.hit = 20;
        }
        db.affect_total(chid).unwrap();
        db.char_to_room(chid, 3016).unwrap();
        (game, db, chid)
    }

    #[test]
    fn spell_names_match_by_abbreviated_words() {
        assert_eq!(find_spell("magic missile"), Some(SpellId::MagicMissile));
        assert_eq!(find_spell("mag mi"), Some(SpellId::MagicMissile));
        assert_eq!(find_spell("fireb"), Some(SpellId::Fireball));
        assert_eq!(find_spell("cone of c"), Some(SpellId::ConeOfCold));
        assert_eq!(find_spell("xyzzy"), None);
        assert_eq!(find_spell(""), None);
    }

    #[test]
    fn garbling_uses_syllables() {
        assert_eq!(garble("bless"), "vrogg");
        assert_eq!(garble("cure light"), "judicandus dies");
    }

    #[test]
    fn unknown_and_too_high_spells_are_refused() {
        let (mut game, mut db, chid) = wizard();
        assert!(matches!(
            do_cast(&mut game, &mut db, chid, " 'shield'", 0, 0),
            Err(MudError::InvalidState(msg)) if msg == "You do not know that spell!"
        ));
        assert!(matches!(
            do_cast(&mut game, &mut db, chid, " 'fireball' golem", 0, 0),
            Err(MudError::InvalidState(msg)) if msg.contains("not yet powerful")
        ));
        assert!(matches!(
            do_cast(&mut game, &mut db, chid, " magic missile", 0, 0),
            Err(MudError::InvalidState(msg)) if msg.contains("Holy Magic Symbols")
        ));
    }

    #[test]
    fn casting_takes_time_and_costs_mana() {
        let (mut game, mut db, chid) = wizard();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();

        do_cast(&mut game, &mut db, chid, " 'magic missile' golem", 0, 0).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.points.mana, 40);
        assert!(ch.is_casting());
        assert!(db.move_character(chid, 3015).is_err());
        assert_eq!(db.chars.get(golem).unwrap().points.hit, 30);

        game.pulse += PASSES_PER_SEC;
        game.run_events(&mut db);
        assert!(!db.chars.get(chid).unwrap().is_casting());
        assert!(db.chars.get(golem).unwrap().points.hit < 30);
        assert_eq!(db.chars.get(chid).unwrap().fighting, Some(golem));
    }

    #[test]
    fn aborted_spells_never_go_off() {
        let (mut game, mut db, chid) = wizard();
        let golem = db.read_mobile(3070).unwrap();
        db.char_to_room(golem, 3016).unwrap();
        do_cast(&mut game, &mut db, chid, " 'magic missile' golem", 0, 0).unwrap();
        do_abort(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert!(do_abort(&mut game, &mut db, chid, "", 0, 0).is_err());

        game.pulse += 5 * PASSES_PER_SEC;
        game.run_events(&mut db);
        assert_eq!(db.chars.get(golem).unwrap().points.hit, 30);
        assert!(db.chars.get(chid).unwrap().fighting.is_none());
    }

    #[test]
    fn no_violent_magic_in_peaceful_rooms() {
        let (mut game, mut db, chid) = wizard();
        db.char_from_room(chid).unwrap();
        db.char_to_room(chid, 3001).unwrap();
        let rat = db.read_mobile(3071).unwrap();
        db.char_to_room(rat, 3001).unwrap();
        assert!(do_cast(&mut game, &mut db, chid, " 'magic missile' rat", 0, 0).is_err());
        assert_eq!(db.chars.get(chid).unwrap().points.mana, 50);
    }
}
