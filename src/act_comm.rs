/* ************************************************************************
*   File: act_comm.rs                                   Part of CircleMUD *
*  Usage: Player-level communication commands                             *
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
use crate::interpreter::delete_doubledollar;
use crate::{Game, VictimRef, TO_ROOM};

pub fn do_say(game: &mut Game, db: &mut DB, chid: DepotId, argument: &str, _cmd: usize, _subcmd: i32) -> MudResult<()> {
    let argument = argument.trim();
    if argument.is_empty() {
        return Err(MudError::invalid("Yes, but WHAT do you want to say?"));
    }

    let said = delete_doubledollar(argument);
    let ch = db.get_character(chid)?;
    game.act(db, "$n says, '$T'", false, Some(ch), None, Some(VictimRef::Str(&said)), TO_ROOM);
    let msg = format!("You say, '{}'\r\n", said);
    game.send_to_char(ch, &msg);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn speech_reaches_the_room() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let alice = db.new_player("Alice");
        let bob = db.new_player("Bob");
        db.char_to_room(alice, 3001).unwrap();
        db.char_to_room(bob, 3001).unwrap();
        let d_alice = game.attach_test_desc(&mut db, alice);
        let d_bob = game.attach_test_desc(&mut db, bob);

        do_say(&mut game, &mut db, alice, "  hello $$there ", 0, 0).unwrap();
        assert_eq!(game.take_output(d_alice), "You say, 'hello $there'\r\n");
        assert_eq!(game.take_output(d_bob), "Alice says, 'hello $there'\r\n");

        let err = do_say(&mut game, &mut db, alice, "", 0, 0).unwrap_err();
        assert_eq!(err.to_string(), "Yes, but WHAT do you want to say?");
    }
}
