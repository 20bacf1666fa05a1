/* ************************************************************************
*   File: main.rs                                       Part of CircleMUD *
*  Usage: Communication, socket handling, main(), central game loop       *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::{HashMap, VecDeque};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::class::ClassId;
use crate::comm::{init_socket, start_network, ConnId, NetCommand, NetEvent, NetHandle};
use crate::config::*;
use crate::constants::TICKMUD_VERSION;
use crate::db::{load_world_file, DB};
use crate::depot::{Depot, DepotId, HasId};
use crate::error::MudResult;
use crate::events::Scheduler;
use crate::interpreter::{command_interpreter, nanny};
use crate::objsave::{PlayerFile, SaveReply, SaveWorker};
use crate::race::RaceId;
use crate::structs::ConState::{ConClose, ConDisconnect, ConGetName, ConPassword, ConPlaying};
use crate::structs::*;
use crate::util::{fname, hmhr, hshr, hssh, sana, GameRng, CMP, NRM};

mod act_comm;
mod act_informative;
mod act_item;
mod act_movement;
mod act_offensive;
mod act_other;
mod act_wizard;
mod class;
mod comm;
mod config;
mod constants;
mod db;
mod depot;
mod error;
mod events;
mod feats;
mod fight;
mod handler;
mod interpreter;
mod limits;
mod magic;
mod mobact;
mod objsave;
mod premade;
mod race;
mod spell_parser;
mod spells;
mod structs;
mod telnet;
mod util;

pub const TO_ROOM: i32 = 1;
pub const TO_VICT: i32 = 2;
pub const TO_NOTVICT: i32 = 3;
pub const TO_CHAR: i32 = 4;
pub const TO_SLEEP: i32 = 128; /* to char, even if sleeping */

/* what a login collects before the character exists */
#[derive(Default)]
pub struct LoginData {
    pub name: String,
    pub passwd: [u8; 16],
    pub race: Option<RaceId>,
    pub class: Option<ClassId>,
    pub pending: Option<Box<PlayerFile>>,
    /* a linkless body waiting for its owner's password */
    pub reconnect: Option<DepotId>,
}

pub struct DescriptorData {
    pub id: DepotId,
    /* None for descriptors without a socket */
    pub conn: Option<ConnId>,
    pub host: String,
    pub state: ConState,
    pub character: Option<DepotId>,
    pub login: LoginData,
    pub input: VecDeque<String>,
    pub output: String,
    pub overflowed: bool,
    /* echo change still to be sent */
    pub echo: Option<bool>,
    pub idle_tics: u8,
    pub bad_pws: u8,
    pub has_prompt: bool,
    pub login_time: Instant,
}

impl Default for DescriptorData {
    fn default() -> Self {
        DescriptorData {
            id: DepotId::default(),
            conn: None,
            host: String::new(),
            state: ConGetName,
            character: None,
            login: LoginData::default(),
            input: VecDeque::new(),
            output: String::new(),
            overflowed: false,
            echo: None,
            idle_tics: 0,
            bad_pws: 0,
            has_prompt: false,
            login_time: Instant::now(),
        }
    }
}

impl HasId for DescriptorData {
    fn id(&self) -> DepotId {
        self.id
    }

    fn set_id(&mut self, id: DepotId) {
        self.id = id;
    }
}

impl DescriptorData {
    /* Add a new string to a player's output queue. */
    pub fn write_to_output(&mut self, txt: &str) {
        /* if we're in the overflow state already, ignore this new output */
        if self.overflowed || txt.is_empty() {
            return;
        }
        if self.output.len() + txt.len() > LARGE_BUFSIZE {
            self.output.push_str("**OVERFLOW**\r\n");
            self.overflowed = true;
            return;
        }
        self.output.push_str(txt);
    }

    pub fn echo_off(&mut self) {
        self.echo = Some(false);
    }

    pub fn echo_on(&mut self) {
        self.echo = Some(true);
    }
}

pub struct Game {
    pub config: Config,
    pub descriptors: Depot<DescriptorData>,
    pub conn_index: HashMap<ConnId, DepotId>,
    pub net: Option<NetHandle>,
    pub pulse: u64,
    pub events: Scheduler,
    pub rng: GameRng,
    pub saver: Option<SaveWorker>,
    pub circle_shutdown: bool,
    pub shutdown_flag: Arc<AtomicBool>,
    pub mins_since_crashsave: i32,
    pub boot_time: u64,
}

#[derive(Parser, Debug)]
#[command(name = "tickmud", version, about = "A tick-driven multi-user dungeon server")]
struct Cli {
    /// Boot the world, check it for errors and exit
    #[arg(short = 'c', long)]
    check: bool,
    /// Use DIR as the data directory
    #[arg(short = 'd', long, value_name = "DIR", default_value = DFLT_DIR)]
    dir: String,
    /// Only load the zones holding the start rooms
    #[arg(short = 'm', long)]
    mini: bool,
    /// Quick boot, the player files are not checked
    #[arg(short = 'q', long)]
    quick: bool,
    /// Restrict the game, no new players
    #[arg(short = 'r', long)]
    restrict: bool,
    /// Suppress special procedures and NPC behaviour
    #[arg(short = 's', long = "no-specials")]
    no_specials: bool,
    /// Also write the log to FILE
    #[arg(short = 'o', long, value_name = "FILE")]
    logfile: Option<String>,
    /// Fixed random seed
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Don't resolve the host names of new connections
    #[arg(long = "slow-nameserver")]
    slow_nameserver: bool,
    /// Refuse commands typed during a wait-state instead of queueing them
    #[arg(long = "reject-busy")]
    reject_busy: bool,
    /// Port to listen on
    port: Option<u16>,
}

/***********************************************************************
*  main game loop and related stuff                                    *
***********************************************************************/

fn main() -> ExitCode {
    let cli = Cli::parse();

    let port = cli.port.unwrap_or(DFLT_PORT);
    if port <= 1024 {
        eprintln!("SYSERR: Illegal port number {}.", port);
        return ExitCode::from(1);
    }

    if let Err(err) = setup_log(cli.logfile.as_deref()) {
        eprintln!("SYSERR: cannot set up logging: {}", err);
        return ExitCode::from(1);
    }

    let config = Config {
        port,
        dir: cli.dir,
        scheck: cli.check,
        mini_mud: cli.mini,
        no_rent_check: cli.quick,
        circle_restrict: cli.restrict,
        no_specials: cli.no_specials,
        logfile: cli.logfile,
        seed: cli.seed,
        nameserver_is_slow: cli.slow_nameserver,
        wait_policy: if cli.reject_busy {
            WaitPolicy::Reject
        } else {
            WaitPolicy::Queue
        },
    };

    info!("{}", TICKMUD_VERSION);
    info!("Using {} as data directory.", config.dir);
    if config.scheck {
        info!("Syntax check mode enabled.");
    }
    if config.mini_mud {
        info!("Running in minimized mode & with no specials.");
    }
    if config.no_rent_check {
        info!("Quick boot mode -- player files will not be checked.");
    }
    if config.circle_restrict {
        info!("Restricting game -- no new players allowed.");
    }
    if config.no_specials {
        info!("Suppressing assignment of special routines.");
    }

    let mut game = Game::new(config);
    let mut db = DB::new();

    let result = if game.config.scheck {
        game.check_world(&mut db)
    } else {
        info!("Running game on port {}.", port);
        game.init_game(&mut db)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("SYSERR: {}", err);
            ExitCode::from(1)
        }
    }
}

impl Game {
    pub fn new(config: Config) -> Game {
        let rng = match config.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };
        Game {
            config,
            descriptors: Depot::new(),
            conn_index: HashMap::new(),
            net: None,
            pulse: 0,
            events: Scheduler::new(),
            rng,
            saver: None,
            circle_shutdown: false,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            mins_since_crashsave: 0,
            boot_time: 0,
        }
    }

    /* boot the world with all its resets, then stop */
    fn check_world(&mut self, db: &mut DB) -> MudResult<()> {
        let world = load_world_file(&self.config.dir)?;
        db.boot_world(world, self.config.mini_mud)?;
        for zone in 0..db.zone_table.len() {
            db.reset_zone(zone);
        }
        info!(
            "Syntax check complete: {} zones, {} rooms, {} mobiles, {} objects.",
            db.zone_table.len(),
            db.world.len(),
            db.mob_protos.len(),
            db.obj_protos.len()
        );
        Ok(())
    }

    /* Init sockets, run game, and cleanup sockets */
    fn init_game(&mut self, db: &mut DB) -> MudResult<()> {
        info!("Finding player limit.");
        info!("   Setting player limit to {}.", MAX_PLAYING);

        info!("Opening mother connection.");
        let listener = init_socket(self.config.port)?;

        self.boot_db(db)?;

        info!("Signal trapping.");
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.shutdown_flag))?;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&self.shutdown_flag))?;

        self.saver = Some(SaveWorker::start(&self.config.dir)?);
        self.net = Some(start_network(
            listener,
            self.config.nameserver_is_slow,
            Arc::clone(&self.shutdown_flag),
        )?);

        self.arm_periodic_events();
        info!("Entering game loop.");
        self.game_loop(db);

        self.crash_save_all(db);

        info!("Closing all sockets.");
        for d_id in self.descriptors.ids() {
            self.close_socket(db, d_id);
        }
        if let Some(net) = self.net.take() {
            net.shutdown();
        }
        if let Some(saver) = self.saver.take() {
            saver.flush();
            saver.shutdown();
        }
        info!("Normal termination of game.");
        Ok(())
    }

    /*
     * game_loop covers the pulse timing: every OPT_USEC the queued input
     * is handled, the heartbeat runs, and the output goes out.
     */
    fn game_loop(&mut self, db: &mut DB) {
        let opt_time = Duration::from_micros(OPT_USEC);
        let mut last_time = Instant::now();

        while !self.circle_shutdown {
            /*
             * At this point, we have completed all input and output for this
             * pulse.  Now sleep until the next one is due.
             */
            let elapsed = last_time.elapsed();
            if elapsed < opt_time {
                thread::sleep(opt_time - elapsed);
            }
            let process_time = last_time.elapsed();
            let mut missed_pulses = (process_time.as_micros() / OPT_USEC as u128) as u64;
            last_time += opt_time * missed_pulses.max(1) as u32;

            /* If we missed more than 30 seconds worth of pulses, just do 30 secs */
            if missed_pulses > 30 * PASSES_PER_SEC {
                error!("SYSERR: Missed {} seconds worth of pulses.", missed_pulses / PASSES_PER_SEC);
                missed_pulses = 30 * PASSES_PER_SEC;
                last_time = Instant::now();
            }

            self.process_input(db);

            /* Now execute the heart beat as many times as necessary */
            for _ in 0..missed_pulses.max(1) {
                self.heartbeat(db);
            }

            self.process_output(db);

            if self.shutdown_flag.load(Ordering::Relaxed) {
                info!("Received shutdown signal, shutting down.");
                self.circle_shutdown = true;
            }
        }
    }

    /* one pulse without the sleep */
    pub fn run_pulse(&mut self, db: &mut DB) {
        self.process_input(db);
        self.heartbeat(db);
        self.process_output(db);
    }

    fn process_input(&mut self, db: &mut DB) {
        self.process_net_events(db);
        self.process_save_replies(db);
        self.process_commands(db);
    }

    fn process_output(&mut self, db: &mut DB) {
        self.flush_output(db);

        /* Kick out folks in the ConClose or ConDisconnect state */
        for d_id in self.descriptors.ids() {
            if matches!(
                self.descriptors.get(d_id).map(|d| d.state),
                Some(ConClose) | Some(ConDisconnect)
            ) {
                self.close_socket(db, d_id);
            }
        }
    }

    fn heartbeat(&mut self, db: &mut DB) {
        self.pulse += 1;
        self.run_events(db);
        if self.pulse % PULSE_VIOLENCE == 0 {
            self.perform_violence(db);
        }
        self.extract_pending_chars(db);
    }

    fn process_net_events(&mut self, db: &mut DB) {
        let events: Vec<NetEvent> = match &self.net {
            Some(net) => net.events.try_iter().collect(),
            None => return,
        };
        for event in events {
            match event {
                NetEvent::Connected { conn, host } => {
                    let d_id = self.new_descriptor(Some(conn), &host);
                    self.conn_index.insert(conn, d_id);
                    info!("New connection from [{}].", host);
                }
                NetEvent::Line { conn, line } => {
                    if let Some(d) = self
                        .conn_index
                        .get(&conn)
                        .copied()
                        .and_then(|d_id| self.descriptors.get_mut(d_id))
                    {
                        d.idle_tics = 0;
                        d.input.push_back(line);
                    }
                }
                NetEvent::Closed { conn } => {
                    if let Some(d_id) = self.conn_index.remove(&conn) {
                        if let Some(d) = self.descriptors.get_mut(d_id) {
                            d.conn = None;
                        }
                        self.close_socket(db, d_id);
                    }
                }
            }
        }
    }

    fn process_save_replies(&mut self, db: &mut DB) {
        let replies = match &self.saver {
            Some(saver) => saver.poll(),
            None => return,
        };
        for reply in replies {
            match reply {
                SaveReply::Loaded { desc, name, result } => self.player_loaded(db, desc, &name, result),
            }
        }
    }

    /* one line per descriptor and pulse, none while the character recovers */
    fn process_commands(&mut self, db: &mut DB) {
        for d_id in self.descriptors.ids() {
            let (chid, state) = match self.descriptors.get(d_id) {
                Some(d) => (d.character, d.state),
                None => continue,
            };
            if let Some(ch) = chid.and_then(|c| db.chars.get_mut(c)) {
                ch.wait = ch.wait.saturating_sub(1);
                if ch.wait > 0 {
                    if self.config.wait_policy == WaitPolicy::Reject {
                        self.reject_busy_input(d_id);
                    }
                    continue;
                }
            }

            let line = match self.descriptors.get_mut(d_id) {
                Some(d) => match d.input.pop_front() {
                    Some(line) => {
                        d.has_prompt = false;
                        line
                    }
                    None => continue,
                },
                None => continue,
            };

            if state != ConPlaying {
                nanny(self, db, d_id, &line);
                continue;
            }
            let chid = match chid {
                Some(chid) if db.chars.contains(chid) => chid,
                _ => continue,
            };
            if let Err(err) = self.return_from_void(db, chid) {
                error!("SYSERR: return from the void of {}: {}", chid, err);
            }
            command_interpreter(self, db, chid, &line);
        }
    }

    fn reject_busy_input(&mut self, d_id: DepotId) {
        if let Some(d) = self.descriptors.get_mut(d_id) {
            if !d.input.is_empty() {
                d.input.clear();
                d.write_to_output("You are busy; that command was not executed.\r\n");
            }
        }
    }

    /* typing anything resets the idle timer and brings the character back */
    fn return_from_void(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        let (was_in, in_room) = {
            let ch = db.get_character_mut(chid)?;
            ch.timer = 0;
            (ch.was_in_room, ch.in_room)
        };
        if was_in == NOWHERE {
            return Ok(());
        }
        if in_room != NOWHERE {
            db.char_from_room(chid)?;
        }
        db.char_to_room(chid, was_in)?;
        db.get_character_mut(chid)?.was_in_room = NOWHERE;
        let ch = db.get_character(chid)?;
        self.act(db, "$n has returned.", true, Some(ch), None, None, TO_ROOM);
        Ok(())
    }

    fn make_prompt(&self, db: &DB, d: &DescriptorData) -> Option<String> {
        if d.state != ConPlaying {
            return None;
        }
        let ch = d.character.and_then(|c| db.chars.get(c))?;
        Some(format!(
            "{}H {}M {}V > ",
            ch.points.hit, ch.points.mana, ch.points.movem
        ))
    }

    fn flush_output(&mut self, db: &DB) {
        let net = match &self.net {
            Some(net) => net,
            None => return,
        };
        for d_id in self.descriptors.ids() {
            let prompt = match self.descriptors.get(d_id) {
                Some(d) => self.make_prompt(db, d),
                None => continue,
            };
            let d = match self.descriptors.get_mut(d_id) {
                Some(d) => d,
                None => continue,
            };
            let conn = match d.conn {
                Some(conn) => conn,
                None => continue,
            };
            if let Some(on) = d.echo.take() {
                net.send(NetCommand::Echo { conn, on });
            }

            let mut text = String::new();
            if !d.output.is_empty() {
                /* output after a prompt starts on a fresh line */
                if d.has_prompt {
                    text.push_str("\r\n");
                }
                text.push_str(&d.output);
                d.output.clear();
                d.overflowed = false;
                d.has_prompt = false;
            }
            if !d.has_prompt {
                if let Some(prompt) = prompt {
                    text.push_str(&prompt);
                    d.has_prompt = true;
                }
            }
            if !text.is_empty() {
                net.send(NetCommand::Write { conn, text });
            }
        }
    }

    /* a descriptor for a fresh connection, waiting for a name */
    pub fn new_descriptor(&mut self, conn: Option<ConnId>, host: &str) -> DepotId {
        let mut d = DescriptorData {
            conn,
            host: host.to_string(),
            state: ConGetName,
            login_time: Instant::now(),
            ..Default::default()
        };
        d.write_to_output(GREETINGS);
        self.descriptors.push(d)
    }

    pub fn close_socket(&mut self, db: &mut DB, d_id: DepotId) {
        let d = match self.descriptors.remove(d_id) {
            Some(d) => d,
            None => return,
        };
        if let Some(conn) = d.conn {
            self.conn_index.remove(&conn);
            if let Some(net) = &self.net {
                if !d.output.is_empty() {
                    net.send(NetCommand::Write {
                        conn,
                        text: d.output.clone(),
                    });
                }
                net.send(NetCommand::Close { conn });
            }
        }

        match d.character.filter(|c| db.chars.contains(*c)) {
            Some(chid) if matches!(d.state, ConPlaying | ConDisconnect) => {
                self.save_char(db, chid);
                if let Some(ch) = db.chars.get(chid) {
                    self.act(db, "$n has lost $s link.", true, Some(ch), None, None, TO_ROOM);
                    let msg = format!("Closing link to: {}.", ch.get_name());
                    self.mudlog(db, NRM, LVL_IMMORT, true, &msg);
                }
                if let Some(ch) = db.chars.get_mut(chid) {
                    ch.desc = None;
                }
            }
            Some(chid) => {
                /* a body that never entered the world */
                if let Some(ch) = db.chars.get(chid) {
                    let msg = format!("Losing player: {}.", ch.get_name());
                    self.mudlog(db, CMP, LVL_IMMORT, true, &msg);
                }
                if db.chars.get(chid).map(|ch| ch.in_room) != Some(NOWHERE) {
                    if let Err(err) = db.char_from_room(chid) {
                        warn!("Losing player {}: {}", chid, err);
                    }
                }
                db.chars.remove(chid);
            }
            None => {
                self.mudlog(db, CMP, LVL_IMMORT, true, "Losing descriptor without char.");
            }
        }
    }

    pub fn check_idle_passwords(&mut self) {
        for d_id in self.descriptors.ids() {
            let d = match self.descriptors.get_mut(d_id) {
                Some(d) => d,
                None => continue,
            };
            if d.state != ConPassword && d.state != ConGetName {
                continue;
            }
            if d.idle_tics == 0 {
                d.idle_tics += 1;
                continue;
            }
            d.echo_on();
            d.write_to_output("\r\nTimed out... goodbye.\r\n");
            d.state = ConClose;
        }
    }
}

/* ****************************************************************
 *       Public routines for system-to-player-communication        *
 **************************************************************** */

impl Game {
    pub fn send_to_char(&mut self, ch: &CharData, messg: &str) {
        if let Some(d) = ch.desc.and_then(|d| self.descriptors.get_mut(d)) {
            d.write_to_output(messg);
        }
    }

    pub fn send_to_all(&mut self, messg: &str) {
        for d_id in self.descriptors.ids() {
            if let Some(d) = self.descriptors.get_mut(d_id) {
                if d.state == ConPlaying {
                    d.write_to_output(messg);
                }
            }
        }
    }

    pub fn send_to_room(&mut self, db: &DB, room: RoomVnum, msg: &str) {
        let people = match db.world.get(&room) {
            Some(room) => &room.peoples,
            None => return,
        };
        for &chid in people {
            if let Some(ch) = db.chars.get(chid) {
                self.send_to_char(ch, msg);
            }
        }
    }
}

const ACTNULL: &str = "<NULL>";

fn victim_char<'a>(vict_obj: Option<VictimRef<'a>>, bad: &'static str) -> Result<&'a CharData, &'static str> {
    match vict_obj {
        None => Err(ACTNULL),
        Some(VictimRef::Char(p)) => Ok(p),
        Some(_) => Err(bad),
    }
}

fn victim_obj<'a>(vict_obj: Option<VictimRef<'a>>, bad: &'static str) -> Result<&'a ObjData, &'static str> {
    match vict_obj {
        None => Err(ACTNULL),
        Some(VictimRef::Obj(p)) => Ok(p),
        Some(_) => Err(bad),
    }
}

fn victim_str<'a>(vict_obj: Option<VictimRef<'a>>) -> Result<&'a str, &'static str> {
    match vict_obj {
        None => Err(ACTNULL),
        Some(VictimRef::Str(p)) => Ok(p),
        Some(_) => Err("<INV_STR_REF>"),
    }
}

/* higher-level communication: the act() function */
pub fn perform_act(
    db: &DB,
    orig: &str,
    ch: Option<&CharData>,
    obj: Option<&ObjData>,
    vict_obj: Option<VictimRef>,
    to: &CharData,
) -> String {
    let mut uppercasenext = false;
    let mut buf = String::new();
    let mut chars = orig.chars();

    while let Some(c) = chars.next() {
        let i: String = if c == '$' {
            let code = chars.next().unwrap_or('\0');
            let word = match code {
                'n' => ch.map(|ch| db.pers(ch, to)).ok_or(ACTNULL),
                'N' => victim_char(vict_obj, "<INV_CHAR_REF>").map(|p| db.pers(p, to)),
                'm' => ch.map(hmhr).ok_or(ACTNULL),
                'M' => victim_char(vict_obj, "<INV_CHAR_DATA>").map(hmhr),
                's' => ch.map(hshr).ok_or(ACTNULL),
                'S' => victim_char(vict_obj, "<INV_CHAR_DATA>").map(hshr),
                'e' => ch.map(hssh).ok_or(ACTNULL),
                'E' => victim_char(vict_obj, "<INV_CHAR_DATA>").map(hssh),
                'o' => obj.map(|o| db.objn(o, to)).ok_or(ACTNULL),
                'O' => victim_obj(vict_obj, "<INV_OBJ_DATA>").map(|p| db.objn(p, to)),
                'p' => obj.map(|o| db.objs(o, to)).ok_or(ACTNULL),
                'P' => victim_obj(vict_obj, "<INV_OBJ_REF>").map(|p| db.objs(p, to)),
                'a' => obj.map(sana).ok_or(ACTNULL),
                'A' => victim_obj(vict_obj, "<INV_OBJ_REF>").map(sana),
                'T' => victim_str(vict_obj),
                'F' => victim_str(vict_obj).map(fname),
                /* uppercase previous word */
                'u' => {
                    let posi = buf.rfind(' ').map(|p| p + 1).unwrap_or(0);
                    let sec_part = buf.split_off(posi);
                    buf.push_str(&sec_part.to_uppercase());
                    Ok("")
                }
                /* uppercase next word */
                'U' => {
                    uppercasenext = true;
                    Ok("")
                }
                '$' => Ok("$"),
                _ => {
                    error!("SYSERR: Illegal $-code to act(): {}", orig);
                    Ok("")
                }
            };
            match word {
                Ok(w) => w.to_string(),
                Err(e) => e.to_string(),
            }
        } else {
            c.to_string()
        };

        for c in i.chars() {
            if uppercasenext && !c.is_whitespace() {
                buf.push(c.to_ascii_uppercase());
                uppercasenext = false;
            } else {
                buf.push(c);
            }
        }
    }

    buf.push_str("\r\n");
    buf
}

macro_rules! sendok {
    ($ch:expr, $to_sleeping:expr) => {
        (($ch).desc.is_some() && ($to_sleeping != 0 || ($ch).awake()))
    };
}

#[derive(Clone, Copy)]
pub enum VictimRef<'a> {
    Char(&'a CharData),
    Obj(&'a ObjData),
    Str(&'a str),
}

impl Game {
    fn deliver_act(
        &mut self,
        db: &DB,
        str: &str,
        ch: Option<&CharData>,
        obj: Option<&ObjData>,
        vict_obj: Option<VictimRef>,
        to: &CharData,
    ) {
        let buf = perform_act(db, str, ch, obj, vict_obj, to);
        self.send_to_char(to, &buf);
    }

    pub fn act(
        &mut self,
        db: &DB,
        str: &str,
        hide_invisible: bool,
        ch: Option<&CharData>,
        obj: Option<&ObjData>,
        vict_obj: Option<VictimRef>,
        _type: i32,
    ) {
        if str.is_empty() {
            return;
        }

        /*
         * TO_SLEEP is a single bit combined with exactly one other TO_x,
         * delivering the message even to sleeping characters.
         */
        let mut _type = _type;
        let to_sleeping = _type & TO_SLEEP;
        if to_sleeping != 0 {
            _type &= !TO_SLEEP;
        }

        if _type == TO_CHAR {
            if let Some(ch) = ch {
                if sendok!(ch, to_sleeping) {
                    self.deliver_act(db, str, Some(ch), obj, vict_obj, ch);
                }
            }
            return;
        }

        if _type == TO_VICT {
            match vict_obj {
                Some(VictimRef::Char(to_ch)) => {
                    if sendok!(to_ch, to_sleeping) {
                        self.deliver_act(db, str, ch, obj, vict_obj, to_ch);
                    }
                }
                Some(_) => error!("SYSERR: Invalid CharData ref for victim in act()."),
                None => {}
            }
            return;
        }

        /* at this point type must be TO_NOTVICT or TO_ROOM */
        let room = match (ch, obj) {
            (Some(ch), _) if ch.in_room != NOWHERE => ch.in_room,
            (_, Some(obj)) => match obj.location {
                ObjLocation::InRoom(room) => room,
                _ => {
                    error!("SYSERR: no valid target to act()!");
                    return;
                }
            },
            _ => {
                error!("SYSERR: no valid target to act()!");
                return;
            }
        };
        let char_list = match db.world.get(&room) {
            Some(room) => &room.peoples,
            None => return,
        };

        let vict_id = match vict_obj {
            Some(VictimRef::Char(p)) => Some(p.id),
            _ => None,
        };
        for &to_id in char_list {
            let to = match db.chars.get(to_id) {
                Some(to) => to,
                None => continue,
            };
            if !sendok!(to, to_sleeping) || ch.map(|c| c.id) == Some(to_id) {
                continue;
            }
            if hide_invisible {
                if let Some(ch) = ch {
                    if !db.can_see(to, ch) {
                        continue;
                    }
                }
            }
            if _type == TO_NOTVICT && vict_id == Some(to_id) {
                continue;
            }
            self.deliver_act(db, str, ch, obj, vict_obj, to);
        }
    }
}

fn setup_log(logfile: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
        .build();

    let mut config_builder =
        log4rs::config::Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout)));
    let mut root = Root::builder().appender("stdout");

    if let Some(logfile) = logfile {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .build(logfile)?;
        config_builder = config_builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }
    let config = config_builder.build(root.build(LevelFilter::Info))?;

    log4rs::init_config(config)?;
    Ok(())
}

#[cfg(test)]
impl Game {
    /* a socketless descriptor already playing the character */
    pub fn attach_test_desc(&mut self, db: &mut DB, chid: DepotId) -> DepotId {
        let d_id = self.new_descriptor(None, "localhost");
        let d = self.descriptors.get_mut(d_id).unwrap();
        d.state = ConPlaying;
        d.character = Some(chid);
        d.output.clear();
        db.chars.get_mut(chid).unwrap().desc = Some(d_id);
        d_id
    }

    pub fn queue_line(&mut self, d_id: DepotId, line: &str) {
        self.descriptors.get_mut(d_id).unwrap().input.push_back(line.to_string());
    }

    pub fn take_output(&mut self, d_id: DepotId) -> String {
        std::mem::take(&mut self.descriptors.get_mut(d_id).unwrap().output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Game, DB, DepotId, DepotId) {
        let mut game = Game::new(Config {
            seed: Some(3),
            ..Default::default()
        });
        let mut db = DB::test_world();
        let a = db.new_player("Alice");
        let b = db.new_player("Bob");
        db.char_to_room(a, 3001).unwrap();
        db.char_to_room(b, 3001).unwrap();
        game.attach_test_desc(&mut db, a);
        game.attach_test_desc(&mut db, b);
        (game, db, a, b)
    }

    #[test]
    fn act_expands_codes_per_viewer() {
        let (_game, db, a, b) = setup();
        let alice = db.chars.get(a).unwrap();
        let bob = db.chars.get(b).unwrap();
        let line = perform_act(
            &db,
            "$n hits $N with $s fist.$$",
            Some(alice),
            None,
            Some(VictimRef::Char(bob)),
            bob,
        );
        assert_eq!(line, "Alice hits Bob with her fist.$\r\n".replace("her", hshr(alice)));
        let line = perform_act(&db, "$U$n waves.", Some(alice), None, None, bob);
        assert_eq!(line, "Alice waves.\r\n");
        let line = perform_act(&db, "$N is missing.", Some(alice), None, None, bob);
        assert_eq!(line, "<NULL> is missing.\r\n");
    }

    #[test]
    fn act_to_room_skips_the_actor() {
        let (mut game, db, a, b) = setup();
        let (da, db_) = (db.chars.get(a).unwrap().desc.unwrap(), db.chars.get(b).unwrap().desc.unwrap());
        let alice = db.chars.get(a).unwrap();
        game.act(&db, "$n smiles.", false, Some(alice), None, None, TO_ROOM);
        assert_eq!(game.take_output(da), "");
        assert_eq!(game.take_output(db_), "Alice smiles.\r\n");
    }

    #[test]
    fn output_overflow_is_marked_once() {
        let mut d = DescriptorData::default();
        let chunk = "x".repeat(LARGE_BUFSIZE / 2 + 1);
        d.write_to_output(&chunk);
        d.write_to_output(&chunk);
        d.write_to_output("more");
        assert!(d.output.ends_with("**OVERFLOW**\r\n"));
        assert_eq!(d.output.len(), chunk.len() + "**OVERFLOW**\r\n".len());
    }

    #[test]
    fn idle_logins_time_out() {
        let mut game = Game::new(Config::default());
        let d_id = game.new_descriptor(None, "localhost");
        game.check_idle_passwords();
        assert_eq!(game.descriptors.get(d_id).unwrap().state, ConGetName);
        game.check_idle_passwords();
        let d = game.descriptors.get(d_id).unwrap();
        assert_eq!(d.state, ConClose);
        assert!(d.output.ends_with("Timed out... goodbye.\r\n"));
    }

    #[test]
    fn lost_link_keeps_the_body() {
        let (mut game, mut db, a, b) = setup();
        let da = db.chars.get(a).unwrap().desc.unwrap();
        let db_ = db.chars.get(b).unwrap().desc.unwrap();
        game.close_socket(&mut db, da);
        let alice = db.chars.get(a).unwrap();
        assert!(alice.desc.is_none());
        assert_eq!(alice.in_room, 3001);
        assert!(game.take_output(db_).contains("Alice has lost her link."
            .replace("her", hshr(alice))
            .as_str()));
    }
}
