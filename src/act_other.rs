/* ************************************************************************
*   File: act_other.rs                                  Part of CircleMUD *
*  Usage: Miscellaneous player-level commands                             *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use log::info;

use crate::class::{level_exp, parse_class, ClassId};
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::interpreter::{one_argument, SCMD_QUIT};
use crate::structs::{Position, LVL_IMMORT};
use crate::util::NRM;
use crate::{Game, TO_ROOM};

pub fn do_quit(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, _cmd: usize, subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    if ch.is_npc() || ch.desc.is_none() {
        return Ok(());
    }

    if subcmd != SCMD_QUIT && !ch.is_immortal() {
        return Err(MudError::invalid("You have to type quit--no less, to quit!"));
    }
    if ch.position == Position::Fighting {
        return Err(MudError::invalid("No way!  You're fighting for your life!"));
    }

    game.act(db, "$n has left the game.", true, Some(ch), None, None, TO_ROOM);
    let msg = format!("{} has quit the game.", ch.get_name());
    game.mudlog(db, NRM, LVL_IMMORT, true, &msg);
    game.send_to_char(ch, "Goodbye, friend.. Come back soon!\r\n");

    /* the player is saved, and the link closed, when the extraction happens */
    db.extract_char(chid)
}

pub fn do_save(game: &mut Game, db: &mut DB, chid: DepotId, _argument: &str, cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    if ch.is_npc() {
        return Ok(());
    }

    /* only tell the char we're saving if they actually typed "save" */
    if cmd != 0 {
        let msg = format!("Saving {}.\r\n", ch.get_name());
        game.send_to_char(ch, &msg);
    }
    game.save_char(db, chid);
    Ok(())
}

/*
 * gain: take the next level once the experience is there.  Players on a
 * premade build level their build class and get the build's choices made
 * for them; everyone else names the class.
 */
pub fn do_gain(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let ch = db.get_character(chid)?;
    let p = ch
        .player()
        .ok_or_else(|| MudError::invalid("Mobiles don't gain levels."))?;
    if ch.is_immortal() {
        return Err(MudError::invalid("Immortals don't gain levels."));
    }
    let next = ch.total_level() + 1;
    let needed = level_exp(next);
    if ch.points.exp < needed {
        return Err(MudError::invalid(format!(
            "You need {} more experience to reach level {}.",
            needed - ch.points.exp,
            next
        )));
    }

    let premade = p.premade_class;
    let mut arg = String::new();
    one_argument(argument, &mut arg);
    let class = match premade {
        Some(class) => {
            if !arg.is_empty() && parse_class(&arg) != Some(class) {
                return Err(MudError::invalid(format!(
                    "Your premade build only levels as a {}.",
                    class.name()
                )));
            }
            class
        }
        None if arg.is_empty() => {
            return Err(MudError::invalid("Which class do you want to gain a level in?"));
        }
        None => parse_class(&arg).ok_or_else(|| MudError::not_found(format!("'{}' is not a class.", arg)))?,
    };

    let level = db.advance_level(&mut game.rng, chid, class)?;
    let ch = db.get_character(chid)?;
    info!("{} advanced to level {} ({} {})", ch.get_name(), ch.total_level(), class.name(), level);
    if premade.is_some() {
        return game.advance_premade_build(db, chid);
    }

    let msg = format!("You are now a level {} {}!\r\n", level, class.name());
    game.send_to_char(ch, &msg);
    game.save_char(db, chid);
    Ok(())
}

/*
 * premade <class>: let a first level character follow the premade build of
 * their class.  "premade off" goes back to building by hand.
 */
pub fn do_premade(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let mut arg = String::new();
    one_argument(argument, &mut arg);

    let ch = db.get_character(chid)?;
    let p = ch
        .player()
        .ok_or_else(|| MudError::invalid("Mobiles don't have builds."))?;
    if arg.is_empty() {
        let msg = match p.premade_class {
            Some(class) => format!("You are following the premade {} build.\r\n", class.name()),
            None => "You are not following a premade build.\r\n".to_string(),
        };
        game.send_to_char(ch, &msg);
        return Ok(());
    }

    if arg.eq_ignore_ascii_case("off") {
        if p.premade_class.is_none() {
            return Err(MudError::invalid("You are not following a premade build."));
        }
        game.send_to_char(ch, "You will choose your own feats and skills from now on.\r\n");
        if let Some(p) = db.get_character_mut(chid)?.player_mut() {
            p.premade_class = None;
        }
        return Ok(());
    }

    let class: ClassId = parse_class(&arg).ok_or_else(|| MudError::not_found(format!("'{}' is not a class.", arg)))?;
    if p.premade_class.is_some() {
        return Err(MudError::invalid("You are already following a premade build."));
    }
    if ch.total_level() != 1 || ch.class_level(class) != 1 {
        return Err(MudError::invalid(format!(
            "Only a first level {} can take up the premade {} build.",
            class.name(),
            class.name()
        )));
    }

    if let Some(p) = db.get_character_mut(chid)?.player_mut() {
        p.premade_class = Some(class);
    }
    game.advance_premade_build(db, chid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::race::RaceId;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(11),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let chid = db.new_player("Climber");
        db.do_start(&mut game.rng, chid, RaceId::Human, ClassId::Warrior).unwrap();
        db.char_to_room(chid, 3001).unwrap();
        let d = game.attach_test_desc(&mut db, chid);
        (game, db, chid, d)
    }

    #[test]
    fn gain_needs_the_experience_and_a_class() {
        let (mut game, mut db, chid, _d) = setup();
        let err = do_gain(&mut game, &mut db, chid, "warrior", 0, 0).unwrap_err();
        assert!(err.to_string().starts_with("You need"));

        db.chars.get_mut(chid).unwrap().points.exp = level_exp(2);
        let err = do_gain(&mut game, &mut db, chid, "", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "Which class do you want to gain a level in?");

        do_gain(&mut game, &mut db, chid, "wizard", 0, 0).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert_eq!(ch.class_level(ClassId::Warrior), 1);
        assert_eq!(ch.class_level(ClassId::Wizard), 1);
        assert_eq!(ch.total_level(), 2);
    }

    #[test]
    fn premade_players_gain_in_their_build_class() {
        let (mut game, mut db, chid, d) = setup();
        do_premade(&mut game, &mut db, chid, "warrior", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().player().unwrap().premade_class, Some(ClassId::Warrior));
        game.take_output(d);

        db.chars.get_mut(chid).unwrap().points.exp = level_exp(2);
        let err = do_gain(&mut game, &mut db, chid, "wizard", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "Your premade build only levels as a Warrior.");

        do_gain(&mut game, &mut db, chid, "", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().class_level(ClassId::Warrior), 2);
        assert!(game.take_output(d).contains("You are now a level 2 Warrior!"));

        do_premade(&mut game, &mut db, chid, "off", 0, 0).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().player().unwrap().premade_class, None);
    }

    #[test]
    fn quitting_takes_the_player_out_of_the_world() {
        let (mut game, mut db, chid, d) = setup();
        let err = do_quit(&mut game, &mut db, chid, "", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "You have to type quit--no less, to quit!");

        do_quit(&mut game, &mut db, chid, "", 0, SCMD_QUIT).unwrap();
        assert!(game.take_output(d).contains("Goodbye, friend.. Come back soon!"));
        assert!(db.extractions.contains(&chid));
        game.extract_pending_chars(&mut db);
        assert!(db.chars.get(chid).is_none());
    }
}
