/* ************************************************************************
*   File: config.rs                                     Part of CircleMUD *
*  Usage: Configuration of various aspects of the game's operation        *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

/*
 * Below are several constants which you can change to alter certain aspects
 * of the way the game acts.  Options that an operator may want to flip without
 * a rebuild live in Config, which main() fills in from the command line.
 */

/****************************************************************************/

/* GAME PLAY OPTIONS */
use crate::structs::{RoomVnum, LVL_GOD};

/*
 * pk_allowed sets the tone of the entire game.  If pk_allowed is set to
 * false, then players will not be allowed to attack or cast violent spells
 * at other players.
 */
pub const PK_ALLOWED: bool = false;

/* exp change limits */
pub const MAX_EXP_GAIN: i64 = 100_000; /* max gainable per kill */
pub const MAX_EXP_LOSS: i64 = 500_000; /* max losable per death */

/* number of tics (usually 75 seconds) before PC/NPC corpses decompose */
pub const MAX_NPC_CORPSE_TIME: i32 = 5;
pub const MAX_PC_CORPSE_TIME: i32 = 10;

/* How many ticks before a player is sent to the void or idle-rented. */
pub const IDLE_VOID: i32 = 8;
pub const IDLE_RENT_TIME: i32 = 48;

/* This level and up is immune to idling. */
pub const IDLE_MAX_LEVEL: u8 = LVL_GOD;

/* "okay" etc. */
pub const OK: &str = "Okay.\r\n";
pub const NOPERSON: &str = "No-one by that name here.\r\n";
pub const NOEFFECT: &str = "Nothing seems to happen.\r\n";

/****************************************************************************/

/* RENT/CRASHSAVE OPTIONS */

/* how often (in minutes) should the MUD save everyone who is playing? */
pub const AUTOSAVE_TIME: i32 = 5;

/****************************************************************************/

/* ROOM NUMBERS */

/* virtual number of room that mortals should enter at */
pub const MORTAL_START_ROOM: RoomVnum = 3001;

/* virtual number of room that immorts should enter at by default */
pub const IMMORT_START_ROOM: RoomVnum = 1204;

/* where linkless and idle characters are parked */
pub const VOID_ROOM: RoomVnum = 0;

/****************************************************************************/

/* GAME OPERATION OPTIONS */

/* This is the default port on which the game should run if no port is given */
pub const DFLT_PORT: u16 = 4000;

/* default directory to use as data directory */
pub const DFLT_DIR: &str = "lib";

/* maximum number of players allowed before game starts to turn people away */
pub const MAX_PLAYING: usize = 300;

/* maximum number of password attempts before disconnection */
pub const MAX_BAD_PWS: u8 = 3;

/*
 * What to do with a command typed while the character is still recovering
 * from the previous one.  Queue keeps it until the wait-state runs out,
 * Reject throws it away with a message.
 */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WaitPolicy {
    #[default]
    Queue,
    Reject,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub dir: String,
    /* syntax check mode: boot the world and exit */
    pub scheck: bool,
    /* mini-mud: only the built-in zone */
    pub mini_mud: bool,
    /* quick boot: don't check player files */
    pub no_rent_check: bool,
    /* restrict game: no new players */
    pub circle_restrict: bool,
    /* no aggressive or scripted NPC behaviour */
    pub no_specials: bool,
    pub logfile: Option<String>,
    /* fixed random seed, for reproducible runs */
    pub seed: Option<u64>,
    /*
     * Some nameservers are very slow and cause the game to lag terribly every
     * time someone logs in.  Host names are resolved on the I/O thread, but
     * setting this still spares the lookup entirely.
     */
    pub nameserver_is_slow: bool,
    pub wait_policy: WaitPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DFLT_PORT,
            dir: DFLT_DIR.to_string(),
            scheck: false,
            mini_mud: false,
            no_rent_check: false,
            circle_restrict: false,
            no_specials: false,
            logfile: None,
            seed: None,
            nameserver_is_slow: false,
            wait_policy: WaitPolicy::Queue,
        }
    }
}

pub const WELC_MESSG: &str = "\r\n\
Welcome to the land of TickMUD!  May your visit here be... Interesting.\r\n\r\n";

pub const START_MESSG: &str = "Welcome.  This is your new character!  You can now earn gold,\r\n\
gain experience, find weapons and equipment, and much more -- while\r\n\
meeting people from around the world!\r\n";

pub const GREETINGS: &str = "\r\n\
                            T I C K M U D\r\n\
\r\n\
            Based on CircleMUD, created by Jeremy Elson\r\n\
   A derivative of DikuMUD (GAMMA 0.0), created by Hans-Henrik Staerfeldt,\r\n\
           Katja Nyboe, Tom Madsen, Michael Seifert, and Sebastian Hammer\r\n\
\r\n\
By what name do you wish to be known? ";
