/* ************************************************************************
*   File: db.rs                                         Part of CircleMUD *
*  Usage: Loading/saving chars, booting/resetting world, internal funcs   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::class::ClassId;
use crate::config::{IMMORT_START_ROOM, MORTAL_START_ROOM, VOID_ROOM};
use crate::depot::{Depot, DepotId};
use crate::error::{MudError, MudResult};
use crate::feats::{FeatId, FeatKind, SubChoice};
use crate::handler::MAX_ABILITY_SCORE;
use crate::objsave::{PlayerIndexEntry, PLR_DIR, PLR_SUFFIX};
use crate::premade::{ClassBuild, PREMADE_BUILDS};
use crate::race::RaceType;
use crate::spells::{DamType, Domain, SpellId, DOMAIN_LIST};
use crate::structs::{
    Ability, CharAbilityData, CharBasePoints, CharData, CharKind, CharPointData, Direction,
    Discovery, DraconicHeritage, ExitFlags, GrandDiscovery, MobFlags, MobVnum, NpcSpecials,
    ObjAffectedType, ObjData, ObjType, ObjVnum, PlayerSpecials, Position, ResetCommand,
    RoomData, RoomDirectionData, RoomFlags, RoomVnum, Sex, Stat, WearFlags, ZoneData, ZoneVnum,
    MAX_FAVORED_ENEMIES, NOWHERE, PASSES_PER_SEC, PULSE_ZONE,
};
use crate::util::{time_now, CMP};
use crate::Game;

pub const WORLD_FILE: &str = "world.json";

/* the world compiled into the server, used when the data directory has none */
static BUILTIN_WORLD: &str = include_str!("../lib/world.json");

fn default_abils() -> [i32; 6] {
    [11; 6]
}

fn default_moves() -> i32 {
    100
}

/* a mobile prototype as it appears in the world file */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MobProto {
    pub vnum: MobVnum,
    pub name: String,
    pub short_descr: String,
    pub long_descr: String,
    #[serde(default)]
    pub description: String,
    pub level: u8,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub alignment: i32,
    pub max_hit: i32,
    #[serde(default = "default_moves")]
    pub max_move: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub hitroll: i32,
    #[serde(default)]
    pub damroll: i32,
    pub damnodice: i32,
    pub damsizedice: i32,
    #[serde(default)]
    pub attack_type: usize,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub mob_flags: MobFlags,
    #[serde(default)]
    pub default_pos: Position,
    #[serde(default)]
    pub race_type: RaceType,
    /* STR, CON, INT, WIS, DEX, CHA */
    #[serde(default = "default_abils")]
    pub abils: [i32; 6],
    #[serde(default)]
    pub damage_reduction: i32,
    /* percent of damage of a given type that is ignored, negative for vulnerabilities */
    #[serde(default)]
    pub resistances: BTreeMap<DamType, i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjProto {
    pub vnum: ObjVnum,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub obj_type: ObjType,
    #[serde(default)]
    pub value: [i32; 4],
    #[serde(default)]
    pub wear_flags: WearFlags,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub affected: Vec<ObjAffectedType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomFile {
    pub vnum: RoomVnum,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub flags: RoomFlags,
    #[serde(default)]
    pub exits: BTreeMap<Direction, RoomDirectionData>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldFile {
    pub zones: Vec<ZoneData>,
    pub rooms: Vec<RoomFile>,
    #[serde(default)]
    pub mobiles: Vec<MobProto>,
    #[serde(default)]
    pub objects: Vec<ObjProto>,
}

pub struct DB {
    pub world: BTreeMap<RoomVnum, RoomData>,
    pub zone_table: Vec<ZoneData>,
    pub mob_protos: BTreeMap<MobVnum, MobProto>,
    pub obj_protos: BTreeMap<ObjVnum, ObjProto>,
    /* every character in the game, players and mobiles */
    pub chars: Depot<CharData>,
    pub objs: Depot<ObjData>,
    /* characters currently fighting, see fight.rs */
    pub combat_list: Vec<DepotId>,
    /* characters marked for extraction at the end of the pulse */
    pub extractions: Vec<DepotId>,
    /* lowercase player name -> idnum, for every player file */
    pub player_index: BTreeMap<String, i64>,
    /* highest idnum in use */
    pub top_idnum: i64,
    pub mortal_start_room: RoomVnum,
    pub immort_start_room: RoomVnum,
    pub void_room: RoomVnum,
    /* premade build tables, by class */
    pub builds: &'static [ClassBuild],
    zone_timer: u64,
    reset_q: VecDeque<usize>,
}

impl Default for DB {
    fn default() -> Self {
        DB::new()
    }
}

/* read the world file of the data directory, or fall back on the built-in world */
pub fn load_world_file(dir: &str) -> MudResult<WorldFile> {
    let path = Path::new(dir).join(WORLD_FILE);
    if path.exists() {
        info!("Reading world from {}.", path.display());
        let text = fs::read_to_string(&path)?;
        return Ok(serde_json::from_str(&text)?);
    }
    warn!("No {} found, booting the built-in world.", path.display());
    builtin_world()
}

pub fn builtin_world() -> MudResult<WorldFile> {
    Ok(serde_json::from_str(BUILTIN_WORLD)?)
}

impl DB {
    pub fn new() -> DB {
        DB {
            world: BTreeMap::new(),
            zone_table: vec![],
            mob_protos: BTreeMap::new(),
            obj_protos: BTreeMap::new(),
            chars: Depot::new(),
            objs: Depot::new(),
            combat_list: vec![],
            extractions: vec![],
            player_index: BTreeMap::new(),
            top_idnum: 0,
            mortal_start_room: MORTAL_START_ROOM,
            immort_start_room: IMMORT_START_ROOM,
            void_room: VOID_ROOM,
            builds: &PREMADE_BUILDS,
            zone_timer: 0,
            reset_q: VecDeque::new(),
        }
    }

    /* body of the db stuff: the world without its inhabitants */
    pub fn boot_world(&mut self, mut file: WorldFile, mini_mud: bool) -> MudResult<()> {
        if mini_mud {
            /* only the zones holding the start rooms */
            let keep = [self.mortal_start_room, self.immort_start_room, self.void_room];
            file.zones
                .retain(|z| keep.iter().any(|r| (z.bot..=z.top).contains(r)));
            let zones = file.zones.clone();
            file.rooms
                .retain(|r| zones.iter().any(|z| (z.bot..=z.top).contains(&r.vnum)));
        }

        info!("Loading zone table.");
        self.zone_table = file.zones;
        self.zone_table.sort_by_key(|z| z.number);

        info!("Loading rooms.");
        for room in file.rooms {
            let zone = self
                .zone_of(room.vnum)
                .ok_or_else(|| MudError::Corruption(format!("Room {} is outside of any zone.", room.vnum)))?;
            if self.world.contains_key(&room.vnum) {
                return Err(MudError::Corruption(format!("Duplicate room vnum {}.", room.vnum)));
            }
            let mut dir_option: [Option<RoomDirectionData>; 6] = Default::default();
            for (dir, exit) in room.exits {
                dir_option[dir as usize] = Some(exit);
            }
            self.world.insert(
                room.vnum,
                RoomData {
                    number: room.vnum,
                    zone,
                    name: room.name,
                    description: room.description,
                    room_flags: room.flags,
                    dir_option,
                    peoples: vec![],
                    contents: vec![],
                },
            );
        }

        info!("Loading mobs and generating index.");
        for mob in file.mobiles {
            if self.mob_protos.insert(mob.vnum, mob).is_some() {
                warn!("SYSERR: duplicate mobile prototype, keeping the last one.");
            }
        }

        info!("Loading objs and generating index.");
        for obj in file.objects {
            if self.obj_protos.insert(obj.vnum, obj).is_some() {
                warn!("SYSERR: duplicate object prototype, keeping the last one.");
            }
        }

        info!("Renumbering rooms.");
        self.renum_world();

        info!("Checking start rooms.");
        self.check_start_rooms()?;

        info!("Renumbering zone table.");
        self.renum_zone_table();
        Ok(())
    }

    fn zone_of(&self, room: RoomVnum) -> Option<ZoneVnum> {
        self.zone_table
            .iter()
            .find(|z| (z.bot..=z.top).contains(&room))
            .map(|z| z.number)
    }

    /* exits leading to rooms which don't exist are dropped */
    fn renum_world(&mut self) {
        let known: Vec<RoomVnum> = self.world.keys().copied().collect();
        for room in self.world.values_mut() {
            for (door, exit) in room.dir_option.iter_mut().enumerate() {
                if let Some(e) = exit {
                    if known.binary_search(&e.to_room).is_err() {
                        error!(
                            "SYSERR: Room {} exit {} leads to unknown room {}, removed.",
                            room.number, door, e.to_room
                        );
                        *exit = None;
                    }
                }
            }
        }
    }

    fn check_start_rooms(&mut self) -> MudResult<()> {
        if !self.world.contains_key(&self.mortal_start_room) {
            error!("SYSERR:  Mortal start room does not exist.  Change in config.rs.");
            return Err(MudError::ConfigMissing(format!(
                "mortal start room {}",
                self.mortal_start_room
            )));
        }
        if !self.world.contains_key(&self.immort_start_room) {
            error!("SYSERR:  Warning: Immort start room does not exist.  Change in config.rs.");
            self.immort_start_room = self.mortal_start_room;
        }
        if !self.world.contains_key(&self.void_room) {
            error!("SYSERR:  Warning: Void room does not exist.  Change in config.rs.");
            self.void_room = self.mortal_start_room;
        }
        Ok(())
    }

    /* reset commands naming unknown rooms or prototypes are disabled */
    fn renum_zone_table(&mut self) {
        for zone in &mut self.zone_table {
            let number = zone.number;
            let world = &self.world;
            let mobs = &self.mob_protos;
            let objs = &self.obj_protos;
            zone.cmd.retain(|c| {
                let bad = match &c.command {
                    ResetCommand::Mobile { vnum, room, .. } => {
                        (!mobs.contains_key(vnum)).then_some(*vnum).or_else(|| {
                            (!world.contains_key(room)).then_some(*room)
                        })
                    }
                    ResetCommand::Object { vnum, room, .. } => {
                        (!objs.contains_key(vnum)).then_some(*vnum).or_else(|| {
                            (!world.contains_key(room)).then_some(*room)
                        })
                    }
                    ResetCommand::Give { vnum, .. }
                    | ResetCommand::Equip { vnum, .. }
                    | ResetCommand::Put { vnum, .. } => (!objs.contains_key(vnum)).then_some(*vnum),
                    ResetCommand::Door { room, dir, .. } => {
                        let ok = world.get(room).map_or(false, |r| r.exit(*dir).is_some());
                        (!ok).then_some(*room)
                    }
                };
                if let Some(vnum) = bad {
                    error!("SYSERR: zone {}: Invalid vnum {}, cmd disabled", number, vnum);
                }
                bad.is_none()
            });
        }
    }

    /* create a new mobile from a prototype; it is nowhere until placed */
    pub fn read_mobile(&mut self, vnum: MobVnum) -> MudResult<DepotId> {
        let proto = self
            .mob_protos
            .get(&vnum)
            .ok_or_else(|| MudError::not_found("There is no monster with that number."))?;
        let ch = CharData {
            name: proto.name.clone(),
            short_descr: proto.short_descr.clone(),
            long_descr: proto.long_descr.clone(),
            description: proto.description.clone(),
            sex: proto.sex,
            alignment: proto.alignment,
            real_abils: CharAbilityData::new(proto.abils),
            aff_abils: CharAbilityData::new(proto.abils),
            base_points: CharBasePoints {
                max_hit: proto.max_hit,
                max_mana: 0,
                max_move: proto.max_move,
                armor: proto.armor,
                hitroll: proto.hitroll,
                damroll: proto.damroll,
                damage_reduction: proto.damage_reduction,
            },
            points: CharPointData {
                hit: proto.max_hit,
                movem: proto.max_move,
                exp: proto.exp,
                gold: proto.gold,
                ..Default::default()
            },
            resistances: proto.resistances.clone(),
            position: proto.default_pos,
            in_room: NOWHERE,
            was_in_room: NOWHERE,
            kind: CharKind::Npc(NpcSpecials {
                vnum,
                level: proto.level,
                damnodice: proto.damnodice,
                damsizedice: proto.damsizedice,
                attack_type: proto.attack_type,
                default_pos: proto.default_pos,
                mob_flags: proto.mob_flags,
                race_type: proto.race_type,
            }),
            ..Default::default()
        };
        let id = self.chars.push(ch);
        self.affect_total(id)?;
        Ok(id)
    }

    /* create a new object from a prototype */
    pub fn read_object(&mut self, vnum: ObjVnum) -> MudResult<DepotId> {
        let proto = self
            .obj_protos
            .get(&vnum)
            .ok_or_else(|| MudError::not_found("There is no object with that number."))?;
        let obj = ObjData {
            vnum,
            name: proto.name.clone(),
            short_description: proto.short_description.clone(),
            description: proto.description.clone(),
            obj_type: proto.obj_type,
            value: proto.value,
            wear_flags: proto.wear_flags,
            weight: proto.weight,
            timer: -1,
            affected: proto.affected.clone(),
            ..Default::default()
        };
        Ok(self.objs.push(obj))
    }

    /* a fresh player character, not yet in any room */
    pub fn new_player(&mut self, name: &str) -> DepotId {
        self.chars.push(CharData {
            name: name.to_string(),
            in_room: NOWHERE,
            was_in_room: NOWHERE,
            kind: CharKind::Player(Box::default()),
            ..Default::default()
        })
    }

    pub fn count_mobs(&self, vnum: MobVnum) -> usize {
        self.chars
            .iter()
            .filter(|c| !c.notdeadyet && c.npc().map_or(false, |n| n.vnum == vnum))
            .count()
    }

    pub fn count_objs(&self, vnum: ObjVnum) -> usize {
        self.objs.iter().filter(|o| o.vnum == vnum).count()
    }

    /* for use in reset_zone; return TRUE if zone 'nr' is free of PC's  */
    pub fn zone_is_empty(&self, zone: usize) -> bool {
        let number = match self.zone_table.get(zone) {
            Some(z) => z.number,
            None => return true,
        };
        !self.chars.iter().any(|c| {
            !c.is_npc()
                && c.desc.is_some()
                && self.world.get(&c.in_room).map_or(false, |r| r.zone == number)
        })
    }

    /* execute the reset command table of a given zone */
    pub fn reset_zone(&mut self, zone: usize) {
        let (number, cmds) = match self.zone_table.get(zone) {
            Some(z) => (z.number, z.cmd.clone()),
            None => return,
        };
        let mut last_cmd = false;
        let mut mob: Option<DepotId> = None;
        let mut obj: Option<DepotId> = None;
        let mut disabled = vec![];

        for (nr, c) in cmds.iter().enumerate() {
            if c.if_flag && !last_cmd {
                continue;
            }
            match self.reset_command(&c.command, &mut mob, &mut obj) {
                Ok(done) => last_cmd = done,
                Err(err) => {
                    error!("SYSERR: zone file: zone {} cmd {}: {}; command disabled", number, nr, err);
                    disabled.push(nr);
                    last_cmd = false;
                }
            }
        }

        if let Some(z) = self.zone_table.get_mut(zone) {
            for nr in disabled.into_iter().rev() {
                z.cmd.remove(nr);
            }
            z.age = 0;
        }
    }

    /* one reset command; Ok(false) when it had nothing to do */
    fn reset_command(
        &mut self,
        cmd: &ResetCommand,
        mob: &mut Option<DepotId>,
        obj: &mut Option<DepotId>,
    ) -> MudResult<bool> {
        match *cmd {
            ResetCommand::Mobile { vnum, max, room } => {
                if self.count_mobs(vnum) >= max {
                    return Ok(false);
                }
                self.get_room(room)?;
                let id = self.read_mobile(vnum)?;
                self.char_to_room(id, room)?;
                *mob = Some(id);
                Ok(true)
            }
            ResetCommand::Object { vnum, max, room } => {
                if self.count_objs(vnum) >= max {
                    return Ok(false);
                }
                self.get_room(room)?;
                let id = self.read_object(vnum)?;
                self.obj_to_room(id, room)?;
                *obj = Some(id);
                Ok(true)
            }
            ResetCommand::Give { vnum, max } => {
                let mob = mob.ok_or_else(|| MudError::invalid("attempt to give obj to non-existant mob"))?;
                if self.count_objs(vnum) >= max {
                    return Ok(false);
                }
                let id = self.read_object(vnum)?;
                self.obj_to_char(id, mob)?;
                Ok(true)
            }
            ResetCommand::Equip { vnum, max, pos } => {
                let mob = mob.ok_or_else(|| MudError::invalid("trying to equip non-existant mob"))?;
                if self.count_objs(vnum) >= max
                    || self.get_character(mob)?.equipment[pos.index()].is_some()
                {
                    return Ok(false);
                }
                let id = self.read_object(vnum)?;
                if let Err(err) = self.equip_char(mob, id, pos) {
                    self.extract_obj(id)?;
                    return Err(err);
                }
                Ok(true)
            }
            ResetCommand::Put { vnum, max } => {
                let container = obj.ok_or_else(|| MudError::invalid("target obj not found"))?;
                if self.count_objs(vnum) >= max {
                    return Ok(false);
                }
                let id = self.read_object(vnum)?;
                if let Err(err) = self.obj_to_obj(id, container) {
                    self.extract_obj(id)?;
                    return Err(err);
                }
                Ok(true)
            }
            ResetCommand::Door { room, dir, state } => {
                let exit = self.get_room_mut(room)?.dir_option[dir as usize]
                    .as_mut()
                    .ok_or_else(|| MudError::not_found("door does not exist"))?;
                match state {
                    0 => exit.exit_info.remove(ExitFlags::CLOSED | ExitFlags::LOCKED),
                    1 => {
                        exit.exit_info.insert(ExitFlags::CLOSED);
                        exit.exit_info.remove(ExitFlags::LOCKED);
                    }
                    2 => exit.exit_info.insert(ExitFlags::CLOSED | ExitFlags::LOCKED),
                    _ => return Err(MudError::invalid(format!("invalid door state {}", state))),
                }
                Ok(true)
            }
        }
    }

    /* names and idnums of every saved player */
    pub fn build_player_index(&mut self, dir: &str) -> MudResult<()> {
        self.player_index.clear();
        let plrdir = Path::new(dir).join(PLR_DIR);
        if !plrdir.exists() {
            fs::create_dir_all(&plrdir)?;
            return Ok(());
        }
        for entry in fs::read_dir(&plrdir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(&PLR_SUFFIX[1..]) {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(MudError::from)
                .and_then(|text| Ok(serde_json::from_str::<PlayerIndexEntry>(&text)?));
            match parsed {
                Ok(entry) => {
                    self.top_idnum = self.top_idnum.max(entry.idnum);
                    self.player_index.insert(entry.name.to_lowercase(), entry.idnum);
                }
                Err(err) => error!("SYSERR: player index: {}: {}", path.display(), err),
            }
        }
        info!("   {} players in database.", self.player_index.len());
        Ok(())
    }

    /* reserve an idnum for a newly created player */
    pub fn register_player(&mut self, name: &str) -> i64 {
        self.top_idnum += 1;
        self.player_index.insert(name.to_lowercase(), self.top_idnum);
        self.top_idnum
    }
}

impl Game {
    pub fn boot_db(&mut self, db: &mut DB) -> MudResult<()> {
        info!("Boot db -- BEGIN.");
        let world = load_world_file(&self.config.dir)?;
        db.boot_world(world, self.config.mini_mud)?;

        info!("Generating player index.");
        db.build_player_index(&self.config.dir)?;

        for zone in 0..db.zone_table.len() {
            let z = &db.zone_table[zone];
            info!("Resetting #{}: {} (rooms {}-{}).", z.number, z.name, z.bot, z.top);
            db.reset_zone(zone);
        }
        self.boot_time = time_now();
        info!("Boot db -- DONE.");
        Ok(())
    }

    /* update zone ages, queue for reset if necessary, and dequeue when possible */
    pub fn zone_update(&mut self, db: &mut DB) {
        /* jelson 10/22/92 */
        db.zone_timer += 1;
        if db.zone_timer * PULSE_ZONE / PASSES_PER_SEC >= 60 {
            /* one minute has passed */
            db.zone_timer = 0;
            for (i, zone) in db.zone_table.iter_mut().enumerate() {
                if zone.reset_mode == 0 {
                    continue;
                }
                if zone.age < zone.lifespan {
                    zone.age += 1;
                }
                if zone.age >= zone.lifespan && !db.reset_q.contains(&i) {
                    db.reset_q.push_back(i);
                }
            }
        }

        /* dequeue zones (if possible) and reset */
        for zone in std::mem::take(&mut db.reset_q) {
            if db.zone_table[zone].reset_mode == 2 || db.zone_is_empty(zone) {
                db.reset_zone(zone);
                let msg = format!("Auto zone reset: {}", db.zone_table[zone].name);
                self.mudlog(db, CMP, crate::structs::LVL_GOD, false, &msg);
            } else {
                db.reset_q.push_back(zone);
            }
        }
    }
}

/*
 * The build contract: every function validates first and only then
 * mutates, and granting something the character already has changes
 * nothing.  The boolean results tell whether anything changed.
 */
impl DB {
    fn build_of(&self, chid: DepotId) -> MudResult<&PlayerSpecials> {
        self.get_character(chid)?
            .player()
            .ok_or_else(|| MudError::invalid("Mobiles don't have builds."))
    }

    fn build_of_mut(&mut self, chid: DepotId) -> MudResult<&mut PlayerSpecials> {
        self.get_character_mut(chid)?
            .player_mut()
            .ok_or_else(|| MudError::invalid("Mobiles don't have builds."))
    }

    /* raise (or lower) a skill rank, returning the new rank */
    pub fn grant_ability_rank(&mut self, chid: DepotId, ability: Ability, delta: i32) -> MudResult<i32> {
        self.build_of(chid)?;
        let ch = self.get_character_mut(chid)?;
        let rank = ch.abilities.get(&ability).copied().unwrap_or(0) + delta;
        if rank < 0 {
            return Err(MudError::invalid(format!(
                "You don't have that many ranks in {}.",
                ability.name()
            )));
        }
        ch.abilities.insert(ability, rank);
        Ok(rank)
    }

    pub fn grant_feat(&mut self, chid: DepotId, feat: FeatId, sub: Option<SubChoice>) -> MudResult<bool> {
        self.build_of(chid)?;
        let info = feat.info();
        match (info.kind, sub) {
            (FeatKind::Plain, None)
            | (FeatKind::Combat, Some(SubChoice::Weapon(_)))
            | (FeatKind::School, Some(SubChoice::School(_))) => {}
            (FeatKind::Plain, Some(_)) => {
                return Err(MudError::invalid(format!("The {} feat takes no choice.", info.name)))
            }
            (FeatKind::Combat, _) => {
                return Err(MudError::invalid(format!("The {} feat needs a weapon family.", info.name)))
            }
            (FeatKind::School, _) => {
                return Err(MudError::invalid(format!("The {} feat needs a spell school.", info.name)))
            }
        }

        let ch = self.get_character_mut(chid)?;
        let level = ch.total_level() as i32;
        let new_feat = !ch.feats.has_feat(feat);
        if new_feat {
            ch.feats.set_feat(feat, 1);
        }
        let new_choice = match sub {
            Some(SubChoice::Weapon(family)) => ch.feats.set_combat_feat(feat, family),
            Some(SubChoice::School(school)) => ch.feats.set_school_feat(feat, school),
            None => false,
        };
        if new_feat && feat == FeatId::Toughness {
            ch.base_points.max_hit += level;
            ch.points.hit += level;
            self.affect_total(chid)?;
        }
        Ok(new_feat || new_choice)
    }

    pub fn set_base_ability_score(&mut self, chid: DepotId, stat: Stat, value: i32) -> MudResult<bool> {
        if !(3..=MAX_ABILITY_SCORE).contains(&value) {
            return Err(MudError::invalid(format!(
                "{} must be between 3 and {}.",
                stat.name(),
                MAX_ABILITY_SCORE
            )));
        }
        let ch = self.get_character_mut(chid)?;
        if ch.real_abils.get(stat) == value {
            return Ok(false);
        }
        ch.real_abils.set(stat, value);
        self.affect_total(chid)?;
        Ok(true)
    }

    pub fn learn_spell(&mut self, chid: DepotId, class: ClassId, spell: SpellId) -> MudResult<bool> {
        if spell.info().circle(class).is_none() {
            return Err(MudError::invalid(format!(
                "{} is not a {} spell.",
                spell.name(),
                class.name()
            )));
        }
        Ok(self
            .build_of_mut(chid)?
            .spells_known
            .entry(class)
            .or_default()
            .insert(spell))
    }

    pub fn set_domains(&mut self, chid: DepotId, first: Domain, second: Domain) -> MudResult<bool> {
        if first == second {
            return Err(MudError::invalid("You need two different domains."));
        }
        let p = self.build_of_mut(chid)?;
        let changed = p.domains != Some((first, second));
        p.domains = Some((first, second));
        Ok(changed)
    }

    /* the spells of the cleric's domains join the cleric spells known */
    pub fn assign_class_domain_spells(&mut self, chid: DepotId) -> MudResult<usize> {
        let (first, second) = self
            .build_of(chid)?
            .domains
            .ok_or_else(|| MudError::invalid("You haven't chosen your domains yet."))?;
        let known = self
            .build_of_mut(chid)?
            .spells_known
            .entry(ClassId::Cleric)
            .or_default();
        let mut added = 0;
        for spell in first.info().spells.iter().chain(second.info().spells) {
            if known.insert(*spell) {
                added += 1;
            }
        }
        Ok(added)
    }

    /* drops the feats of every domain, then grants those of the chosen ones */
    pub fn assign_domain_feats(&mut self, chid: DepotId) -> MudResult<()> {
        let (first, second) = self
            .build_of(chid)?
            .domains
            .ok_or_else(|| MudError::invalid("You haven't chosen your domains yet."))?;
        let ch = self.get_character_mut(chid)?;
        for domain in DOMAIN_LIST.iter() {
            ch.feats.set_feat(domain.granted_feat, 0);
        }
        for domain in [first, second] {
            ch.feats.set_feat(domain.info().granted_feat, 1);
        }
        Ok(())
    }

    pub fn set_favored_enemy(&mut self, chid: DepotId, slot: usize, race: RaceType) -> MudResult<bool> {
        if slot >= MAX_FAVORED_ENEMIES {
            return Err(MudError::invalid(format!("There is no favored enemy slot {}.", slot)));
        }
        let p = self.build_of_mut(chid)?;
        let changed = p.favored_enemies[slot] != Some(race);
        p.favored_enemies[slot] = Some(race);
        Ok(changed)
    }

    pub fn set_familiar(&mut self, chid: DepotId, vnum: MobVnum) -> MudResult<bool> {
        if !self.mob_protos.contains_key(&vnum) {
            return Err(MudError::ConfigMissing(format!("familiar mobile {}", vnum)));
        }
        let p = self.build_of_mut(chid)?;
        let changed = p.familiar != Some(vnum);
        p.familiar = Some(vnum);
        Ok(changed)
    }

    pub fn set_animal_companion(&mut self, chid: DepotId, vnum: MobVnum) -> MudResult<bool> {
        if !self.mob_protos.contains_key(&vnum) {
            return Err(MudError::ConfigMissing(format!("animal companion mobile {}", vnum)));
        }
        let p = self.build_of_mut(chid)?;
        let changed = p.animal_companion != Some(vnum);
        p.animal_companion = Some(vnum);
        Ok(changed)
    }

    pub fn learn_discovery(&mut self, chid: DepotId, discovery: Discovery) -> MudResult<bool> {
        Ok(self.build_of_mut(chid)?.discoveries.insert(discovery))
    }

    pub fn set_grand_discovery(&mut self, chid: DepotId, grand: GrandDiscovery) -> MudResult<bool> {
        let p = self.build_of_mut(chid)?;
        let changed = p.grand_discovery != Some(grand);
        p.grand_discovery = Some(grand);
        Ok(changed)
    }

    pub fn set_bloodline(&mut self, chid: DepotId, heritage: DraconicHeritage) -> MudResult<bool> {
        let p = self.build_of_mut(chid)?;
        let changed = p.bloodline != Some(heritage);
        p.bloodline = Some(heritage);
        Ok(changed)
    }
}

#[cfg(test)]
impl DB {
    /* the built-in world, booted but not yet reset */
    pub fn test_world() -> DB {
        /* log output shows up with --nocapture */
        let _ = env_logger::builder().is_test(true).try_init();
        let mut db = DB::new();
        db.boot_world(builtin_world().unwrap(), false).unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feats::WeaponFamily;
    use crate::spells::SpellSchool;

    #[test]
    fn builtin_world_boots_with_start_rooms() {
        let db = DB::test_world();
        assert!(db.world.contains_key(&MORTAL_START_ROOM));
        assert_eq!(db.world[&3001].zone, 30);
        assert!(db.world[&3016].exit(Direction::East).unwrap().is_closed());
    }

    #[test]
    fn missing_start_room_is_a_config_error() {
        let mut db = DB::new();
        db.mortal_start_room = 4242;
        assert!(matches!(
            db.boot_world(builtin_world().unwrap(), false),
            Err(MudError::ConfigMissing(_))
        ));
    }

    #[test]
    fn room_outside_every_zone_is_rejected() {
        let mut file = builtin_world().unwrap();
        file.rooms.push(RoomFile {
            vnum: 7777,
            name: "Nowhere".into(),
            description: String::new(),
            flags: RoomFlags::empty(),
            exits: BTreeMap::new(),
        });
        let mut db = DB::new();
        assert!(matches!(db.boot_world(file, false), Err(MudError::Corruption(_))));
    }

    #[test]
    fn mini_mud_keeps_only_the_start_zones() {
        let mut db = DB::new();
        db.boot_world(builtin_world().unwrap(), true).unwrap();
        assert!(db.world.contains_key(&MORTAL_START_ROOM));
        assert!(db.zone_table.iter().all(|z| [0, 12, 30].contains(&z.number)));
    }

    #[test]
    fn zone_reset_respects_maxima_and_if_flags() {
        let mut db = DB::test_world();
        let zone = db.zone_table.iter().position(|z| z.number == 30).unwrap();
        db.reset_zone(zone);
        db.reset_zone(zone);

        assert_eq!(db.count_mobs(3060), 1);
        assert_eq!(db.count_mobs(3062), 2);
        assert_eq!(db.count_mobs(3071), 3);
        /* one sword, worn by the single guard */
        assert_eq!(db.count_objs(3021), 1);
        let guard = db.world[&3005].peoples[0];
        assert!(db.chars.get(guard).unwrap().equipment[crate::structs::WearPos::Wield.index()].is_some());
        /* the dagger went into the bag, only while the bag was loaded */
        assert_eq!(db.count_objs(3022), 1);
        assert_eq!(db.count_objs(3020), 1);
        let bag = db.world[&3014].contents[0];
        assert_eq!(db.objs.get(bag).unwrap().contains.len(), 1);
    }

    #[test]
    fn door_resets_close_opened_doors() {
        let mut db = DB::test_world();
        let zone = db.zone_table.iter().position(|z| z.number == 30).unwrap();
        if let Some(exit) = db.world.get_mut(&3016).unwrap().dir_option[Direction::East as usize].as_mut() {
            exit.exit_info.remove(ExitFlags::CLOSED);
        }
        db.reset_zone(zone);
        assert!(db.world[&3016].exit(Direction::East).unwrap().is_closed());
    }

    #[test]
    fn build_contract_is_idempotent() {
        let mut db = DB::test_world();
        let chid = db.new_player("Builder");
        let heavy = Some(SubChoice::Weapon(WeaponFamily::HeavyBlade));
        assert!(db.grant_feat(chid, FeatId::WeaponFocus, heavy).unwrap());
        assert!(!db.grant_feat(chid, FeatId::WeaponFocus, heavy).unwrap());
        assert!(db
            .grant_feat(chid, FeatId::WeaponFocus, Some(SubChoice::Weapon(WeaponFamily::Axe)))
            .unwrap());
        assert!(db.learn_spell(chid, ClassId::Sorcerer, SpellId::Fireball).unwrap());
        assert!(!db.learn_spell(chid, ClassId::Sorcerer, SpellId::Fireball).unwrap());
        assert_eq!(db.grant_ability_rank(chid, Ability::Lore, 4).unwrap(), 4);
        assert_eq!(db.grant_ability_rank(chid, Ability::Lore, 1).unwrap(), 5);
    }

    #[test]
    fn build_contract_validates_before_mutating() {
        let mut db = DB::test_world();
        let chid = db.new_player("Careful");
        assert!(matches!(
            db.grant_feat(chid, FeatId::SpellFocus, Some(SubChoice::Weapon(WeaponFamily::Axe))),
            Err(MudError::InvalidState(_))
        ));
        assert!(!db.chars.get(chid).unwrap().feats.has_feat(FeatId::SpellFocus));
        assert!(db
            .grant_feat(chid, FeatId::SpellFocus, Some(SubChoice::School(SpellSchool::Evocation)))
            .unwrap());
        assert!(matches!(
            db.learn_spell(chid, ClassId::Bard, SpellId::MeteorSwarm),
            Err(MudError::InvalidState(_))
        ));
        assert!(matches!(db.set_familiar(chid, 99999), Err(MudError::ConfigMissing(_))));
        assert_eq!(db.chars.get(chid).unwrap().player().unwrap().familiar, None);
        assert!(matches!(
            db.set_base_ability_score(chid, Stat::Str, 99),
            Err(MudError::InvalidState(_))
        ));

        let rat = db.read_mobile(3071).unwrap();
        assert!(matches!(
            db.grant_feat(rat, FeatId::Dodge, None),
            Err(MudError::InvalidState(_))
        ));
    }

    #[test]
    fn domain_spells_need_domains() {
        let mut db = DB::test_world();
        let chid = db.new_player("Priest");
        assert!(db.assign_class_domain_spells(chid).is_err());
        db.set_domains(chid, Domain::War, Domain::Healing).unwrap();
        assert_eq!(db.assign_class_domain_spells(chid).unwrap(), 12);
        assert_eq!(db.assign_class_domain_spells(chid).unwrap(), 0);
        db.assign_domain_feats(chid).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert!(ch.feats.has_feat(FeatId::WarDomainWeaponFocus));
        assert!(ch.feats.has_feat(FeatId::HealingDomainEmpower));
    }
}
