/* ************************************************************************
*   File: mobact.rs                                     Part of CircleMUD *
*  Usage: Functions for generating intelligent (?) behavior in mobiles    *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use log::{debug, error};

use crate::act_movement::perform_move;
use crate::db::DB;
use crate::depot::DepotId;
use crate::structs::{Direction, MobFlags, Position, RoomFlags, NUM_OF_DIRS};
use crate::Game;

impl Game {
    pub fn mobile_activity(&mut self, db: &mut DB) {
        let mobs: Vec<DepotId> = db
            .chars
            .iter()
            .filter(|ch| ch.is_npc() && !ch.notdeadyet)
            .map(|ch| ch.id)
            .collect();

        for chid in mobs {
            let ch = match db.chars.get(chid) {
                Some(ch) if !ch.notdeadyet => ch,
                _ => continue,
            };
            if ch.is_fighting() || !ch.awake() || ch.is_casting() {
                continue;
            }

            /* Mob Movement */
            let door = self.rng.rand_number(0, 18) as usize;
            if door < NUM_OF_DIRS
                && !ch.mob_flagged(MobFlags::SENTINEL)
                && ch.position == Position::Standing
            {
                let dir = Direction::ALL[door];
                if mob_may_wander(db, chid, dir) {
                    if let Err(err) = perform_move(self, db, chid, dir) {
                        debug!("mobile {} stays put: {}", chid, err);
                    }
                }
            }

            /* Aggressive Mobs */
            if let Err(err) = self.aggressive_strike(db, chid) {
                error!("SYSERR: mobile_activity for {}: {}", chid, err);
            }
        }
    }

    /* an aggressive mobile attacks the first player it sees; wimpy ones only jump sleepers */
    fn aggressive_strike(&mut self, db: &mut DB, chid: DepotId) -> crate::error::MudResult<()> {
        let ch = match db.chars.get(chid) {
            Some(ch) if !ch.notdeadyet && !ch.is_fighting() => ch,
            _ => return Ok(()),
        };
        if !ch.mob_flagged(MobFlags::AGGRESSIVE) {
            return Ok(());
        }
        let room = db.get_room(ch.in_room)?;
        if room.room_flags.contains(RoomFlags::PEACEFUL) {
            return Ok(());
        }
        let victim = room.peoples.iter().copied().find(|id| {
            db.chars.get(*id).map_or(false, |vict| {
                !vict.is_npc()
                    && !vict.notdeadyet
                    && !vict.is_immortal()
                    && db.can_see(ch, vict)
                    && !(ch.mob_flagged(MobFlags::WIMPY) && vict.awake())
            })
        });
        match victim {
            Some(victid) => {
                self.set_fighting(db, chid, victid)?;
                self.hit(db, chid, victid)
            }
            None => Ok(()),
        }
    }
}

/* mobiles stay out of no-mob rooms and death traps, and in their zone if told to */
fn mob_may_wander(db: &DB, chid: DepotId, dir: Direction) -> bool {
    let to_room = match db.check_exit(chid, dir) {
        Ok(room) => room,
        Err(_) => return false,
    };
    let (ch, here, there) = match (db.chars.get(chid), db.world.get(&to_room)) {
        (Some(ch), Some(there)) => match db.world.get(&ch.in_room) {
            Some(here) => (ch, here, there),
            None => return false,
        },
        _ => return false,
    };
    !there.room_flags.intersects(RoomFlags::NO_MOB | RoomFlags::DEATH)
        && (!ch.mob_flagged(MobFlags::STAY_ZONE) || here.zone == there.zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn setup() -> (Game, DB) {
        let game = Game::new(Config {
            seed: Some(17),
            ..Default::default()
        });
        (game, DB::test_world())
    }

    fn sturdy_player(db: &mut DB, room: i32) -> DepotId {
        let chid = db.new_player("Snack");
        let ch = db.chars.get_mut(chid).unwrap();
        ch.points.hit = 500;
        ch.base_points.max_hit = 500;
        ch.points.max_hit = 500;
        db.char_to_room(chid, room).unwrap();
        chid
    }

    #[test]
    fn wimpy_aggressors_only_jump_sleepers() {
        let (mut game, mut db) = setup();
        let rat = db.read_mobile(3071).unwrap();
        db.char_to_room(rat, 3017).unwrap();
        let player = sturdy_player(&mut db, 3017);

        game.mobile_activity(&mut db);
        assert!(db.chars.get(rat).unwrap().fighting.is_none());

        db.chars.get_mut(player).unwrap().position = Position::Sleeping;
        game.mobile_activity(&mut db);
        assert_eq!(db.chars.get(rat).unwrap().fighting, Some(player));
    }

    #[test]
    fn peaceful_rooms_calm_aggressors() {
        let (mut game, mut db) = setup();
        let rat = db.read_mobile(3071).unwrap();
        db.chars.get_mut(rat).unwrap().npc_mut().unwrap().mob_flags = MobFlags::AGGRESSIVE | MobFlags::SENTINEL;
        db.char_to_room(rat, 3001).unwrap();
        sturdy_player(&mut db, 3001);
        game.mobile_activity(&mut db);
        assert!(db.chars.get(rat).unwrap().fighting.is_none());
    }

    #[test]
    fn sentinels_stay_and_wanderers_roam_their_zone() {
        let (mut game, mut db) = setup();
        let guard = db.read_mobile(3060).unwrap();
        let fido = db.read_mobile(3062).unwrap();
        db.char_to_room(guard, 3014).unwrap();
        db.char_to_room(fido, 3014).unwrap();

        let zone = db.world[&3014].zone;
        let mut moved = false;
        for _ in 0..200 {
            game.mobile_activity(&mut db);
            let room = db.chars.get(fido).unwrap().in_room;
            assert_eq!(db.world[&room].zone, zone);
            moved |= room != 3014;
        }
        assert!(moved);
        assert_eq!(db.chars.get(guard).unwrap().in_room, 3014);
    }
}
