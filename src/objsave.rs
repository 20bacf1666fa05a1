/* ************************************************************************
*   File: objsave.rs                                    Part of CircleMUD *
*  Usage: loading/saving player files and their objects                   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::class::ClassId;
use crate::config::AUTOSAVE_TIME;
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::CharFeats;
use crate::race::RaceId;
use crate::spells::DamType;
use crate::structs::{
    Ability, AffectedType, CharAbilityData, CharBasePoints, CharKind, CharPointData, ObjAffectedType,
    ObjData, ObjType, ObjVnum, PlayerSpecials, Position, RoomVnum, Sex, WearFlags,
    WearPos, NOWHERE,
};
use crate::Game;

pub const PLR_DIR: &str = "plrfiles";
pub const PLR_SUFFIX: &str = ".json";

/* bumped whenever PlayerFile changes incompatibly */
pub const SAVE_VERSION: u32 = 1;

/* the part of a player file the boot-time index needs */
#[derive(Clone, Debug, Deserialize)]
pub struct PlayerIndexEntry {
    pub name: String,
    pub idnum: i64,
}

/* where a saved object sits, relative to the player or to another saved object */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedParent {
    Carried,
    Worn(WearPos),
    In(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedObj {
    pub vnum: ObjVnum,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub obj_type: ObjType,
    pub value: [i32; 4],
    pub wear_flags: WearFlags,
    pub weight: i32,
    pub timer: i32,
    #[serde(default)]
    pub affected: Vec<ObjAffectedType>,
    pub parent: SavedParent,
}

impl SavedObj {
    fn from_obj(obj: &ObjData, parent: SavedParent) -> SavedObj {
        SavedObj {
            vnum: obj.vnum,
            name: obj.name.clone(),
            short_description: obj.short_description.clone(),
            description: obj.description.clone(),
            obj_type: obj.obj_type,
            value: obj.value,
            wear_flags: obj.wear_flags,
            weight: obj.weight,
            timer: obj.timer,
            affected: obj.affected.clone(),
            parent,
        }
    }

    fn to_obj(&self) -> ObjData {
        ObjData {
            vnum: self.vnum,
            name: self.name.clone(),
            short_description: self.short_description.clone(),
            description: self.description.clone(),
            obj_type: self.obj_type,
            value: self.value,
            wear_flags: self.wear_flags,
            weight: self.weight,
            timer: self.timer,
            affected: self.affected.clone(),
            ..Default::default()
        }
    }
}

/* everything about a player that survives a logout */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerFile {
    pub version: u32,
    pub saved_at: String,
    pub name: String,
    pub idnum: i64,
    pub title: String,
    pub description: String,
    pub sex: Sex,
    pub race: Option<RaceId>,
    pub class_levels: BTreeMap<ClassId, u8>,
    pub real_abils: CharAbilityData,
    pub points: CharPointData,
    pub base_points: CharBasePoints,
    pub feats: CharFeats,
    pub abilities: BTreeMap<Ability, i32>,
    pub affected: Vec<AffectedType>,
    #[serde(default)]
    pub resistances: BTreeMap<DamType, i32>,
    pub alignment: i32,
    pub position: Position,
    pub load_room: Option<RoomVnum>,
    pub specials: PlayerSpecials,
    pub objects: Vec<SavedObj>,
}

pub fn player_file_path(dir: &str, name: &str) -> PathBuf {
    Path::new(dir)
        .join(PLR_DIR)
        .join(format!("{}{}", name.to_lowercase(), PLR_SUFFIX))
}

pub fn load_player(dir: &str, name: &str) -> MudResult<PlayerFile> {
    let text = fs::read_to_string(player_file_path(dir, name))?;
    parse_player(&text)
}

pub fn parse_player(text: &str) -> MudResult<PlayerFile> {
    let file: PlayerFile = serde_json::from_str(text)?;
    if file.version != SAVE_VERSION {
        return Err(MudError::Corruption(format!(
            "{}: save version {} (expected {})",
            file.name, file.version, SAVE_VERSION
        )));
    }
    check_object_tree(&file.objects)?;
    Ok(file)
}

/* every parent index points at another saved object, no loops, one item per slot */
fn check_object_tree(objects: &[SavedObj]) -> MudResult<()> {
    let mut worn = HashSet::new();
    for (i, obj) in objects.iter().enumerate() {
        match obj.parent {
            SavedParent::Carried => {}
            SavedParent::Worn(pos) => {
                if !worn.insert(pos) {
                    return Err(MudError::Corruption(format!(
                        "object {} shares wear slot {:?}",
                        i, pos
                    )));
                }
            }
            SavedParent::In(_) => {
                let mut cur = i;
                for _ in 0..=objects.len() {
                    cur = match objects[cur].parent {
                        SavedParent::In(parent) if parent >= objects.len() => {
                            return Err(MudError::Corruption(format!(
                                "object {} is inside missing object {}",
                                cur, parent
                            )));
                        }
                        SavedParent::In(parent) => parent,
                        _ => break,
                    };
                    if cur == i {
                        return Err(MudError::Corruption(format!(
                            "object {} is inside itself",
                            i
                        )));
                    }
                }
                if let SavedParent::In(_) = objects[cur].parent {
                    return Err(MudError::Corruption(format!(
                        "object {} sits in a container loop",
                        i
                    )));
                }
            }
        }
    }
    Ok(())
}

impl DB {
    fn save_obj_tree(&self, objid: DepotId, parent: SavedParent, out: &mut Vec<SavedObj>) {
        let obj = match self.objs.get(objid) {
            Some(obj) => obj,
            None => return,
        };
        let idx = out.len();
        out.push(SavedObj::from_obj(obj, parent));
        for inner in &obj.contains {
            self.save_obj_tree(*inner, SavedParent::In(idx), out);
        }
    }

    /* a snapshot of the player, objects flattened in carrying order */
    pub fn build_player_file(&self, chid: DepotId) -> MudResult<PlayerFile> {
        let ch = self.get_character(chid)?;
        let specials = ch
            .player()
            .ok_or_else(|| MudError::invalid("Mobiles don't have player files."))?;

        let mut objects = vec![];
        for objid in &ch.carrying {
            self.save_obj_tree(*objid, SavedParent::Carried, &mut objects);
        }
        for pos in WearPos::ALL {
            if let Some(objid) = ch.equipment[pos.index()] {
                self.save_obj_tree(objid, SavedParent::Worn(pos), &mut objects);
            }
        }

        /* players parked in the void come back where they were */
        let room = if ch.was_in_room != NOWHERE { ch.was_in_room } else { ch.in_room };
        let position = match ch.position {
            Position::Fighting | Position::Dead => Position::Standing,
            pos => pos,
        };

        let load_room = (room != NOWHERE).then_some(room).or(specials.load_room);
        let mut specials = specials.clone();
        specials.load_room = load_room;

        Ok(PlayerFile {
            version: SAVE_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            name: ch.name.clone(),
            idnum: specials.idnum,
            title: ch.title.clone(),
            description: ch.description.clone(),
            sex: ch.sex,
            race: ch.race,
            class_levels: ch.class_levels.clone(),
            real_abils: ch.real_abils,
            points: ch.points,
            base_points: ch.base_points,
            feats: ch.feats.clone(),
            abilities: ch.abilities.clone(),
            affected: ch.affected.clone(),
            resistances: ch.resistances.clone(),
            alignment: ch.alignment,
            position,
            load_room,
            specials,
            objects,
        })
    }

    /* recreates a saved player and its objects, not yet placed in a room */
    pub fn restore_player(&mut self, file: &PlayerFile) -> MudResult<DepotId> {
        check_object_tree(&file.objects)?;

        let mut specials = file.specials.clone();
        specials.idnum = file.idnum;
        specials.load_room = file.load_room;
        specials.bad_pws = 0;

        let chid = self.new_player(&file.name);
        {
            let ch = self.get_character_mut(chid)?;
            ch.title = file.title.clone();
            ch.description = file.description.clone();
            ch.sex = file.sex;
            ch.race = file.race;
            ch.class_levels = file.class_levels.clone();
            ch.real_abils = file.real_abils;
            ch.aff_abils = file.real_abils;
            ch.points = file.points;
            ch.base_points = file.base_points;
            ch.feats = file.feats.clone();
            ch.abilities = file.abilities.clone();
            ch.affected = file.affected.clone();
            ch.resistances = file.resistances.clone();
            ch.alignment = file.alignment;
            ch.position = file.position;
            ch.kind = CharKind::Player(Box::new(specials));
        }

        let ids: Vec<DepotId> = file.objects.iter().map(|o| self.objs.push(o.to_obj())).collect();
        if let Err(err) = self.place_saved_objects(chid, file, &ids) {
            for objid in ids {
                self.objs.remove(objid);
            }
            self.chars.remove(chid);
            return Err(err);
        }

        /* equipping clamps the pools while the maxima are still partial */
        self.get_character_mut(chid)?.points = file.points;
        self.affect_total(chid)?;
        Ok(chid)
    }

    fn place_saved_objects(&mut self, chid: DepotId, file: &PlayerFile, ids: &[DepotId]) -> MudResult<()> {
        /* backwards, since every list grows at its head */
        for (i, saved) in file.objects.iter().enumerate().rev() {
            match saved.parent {
                SavedParent::Carried => self.obj_to_char(ids[i], chid)?,
                SavedParent::Worn(pos) => self.equip_char(chid, ids[i], pos)?,
                SavedParent::In(parent) => self.obj_to_obj(ids[i], ids[parent])?,
            }
        }
        Ok(())
    }
}

enum SaveJob {
    Save { name: String, json: String },
    Load { desc: DepotId, name: String },
    Flush(Sender<()>),
}

pub enum SaveReply {
    Loaded {
        desc: DepotId,
        name: String,
        result: MudResult<PlayerFile>,
    },
}

/*
 * Owns the disk.  The game thread hands it serialized player files to
 * write and names to read, and collects the loaded files with poll().
 */
pub struct SaveWorker {
    jobs: Sender<SaveJob>,
    replies: Receiver<SaveReply>,
    thread: Option<JoinHandle<()>>,
}

fn write_player(dir: &str, name: &str, json: &str) -> io::Result<()> {
    let path = player_file_path(dir, name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    /* write the new file aside, so a crash never leaves half a player */
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)
}

impl SaveWorker {
    pub fn start(dir: &str) -> io::Result<SaveWorker> {
        let (job_tx, job_rx) = mpsc::channel::<SaveJob>();
        let (reply_tx, reply_rx) = mpsc::channel();
        let dir = dir.to_string();
        let thread = thread::Builder::new().name("saver".to_string()).spawn(move || {
            for job in job_rx {
                match job {
                    SaveJob::Save { name, json } => {
                        if let Err(err) = write_player(&dir, &name, &json) {
                            error!("SYSERR: writing player file for {}: {}", name, err);
                        }
                    }
                    SaveJob::Load { desc, name } => {
                        let result = load_player(&dir, &name);
                        if reply_tx.send(SaveReply::Loaded { desc, name, result }).is_err() {
                            break;
                        }
                    }
                    SaveJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Save worker exiting.");
        })?;
        Ok(SaveWorker {
            jobs: job_tx,
            replies: reply_rx,
            thread: Some(thread),
        })
    }

    fn send(&self, job: SaveJob) {
        if self.jobs.send(job).is_err() {
            error!("SYSERR: the save worker is gone");
        }
    }

    pub fn save(&self, name: &str, json: String) {
        self.send(SaveJob::Save {
            name: name.to_lowercase(),
            json,
        });
    }

    pub fn request_load(&self, desc: DepotId, name: &str) {
        self.send(SaveJob::Load {
            desc,
            name: name.to_string(),
        });
    }

    pub fn poll(&self) -> Vec<SaveReply> {
        self.replies.try_iter().collect()
    }

    /* blocks until everything queued so far is on disk */
    pub fn flush(&self) {
        let (tx, rx) = mpsc::channel();
        self.send(SaveJob::Flush(tx));
        let _ = rx.recv();
    }

    pub fn shutdown(self) {
        let SaveWorker { jobs, thread, .. } = self;
        drop(jobs);
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("SYSERR: the save worker panicked");
            }
        }
    }
}

impl Game {
    /* queues the player file for writing; mobiles and tests without a saver do nothing */
    pub fn save_char(&mut self, db: &DB, chid: DepotId) {
        let saver = match &self.saver {
            Some(saver) => saver,
            None => return,
        };
        match db.get_character(chid) {
            Ok(ch) if ch.is_npc() => return,
            Ok(_) => {}
            Err(err) => {
                error!("SYSERR: save_char: {}", err);
                return;
            }
        }
        let json = db
            .build_player_file(chid)
            .and_then(|file| Ok((serde_json::to_string_pretty(&file)?, file.name)));
        match json {
            Ok((json, name)) => saver.save(&name, json),
            Err(err) => error!("SYSERR: save_char: {}", err),
        }
    }

    pub fn crash_save_all(&mut self, db: &DB) {
        let players: Vec<DepotId> = db
            .chars
            .iter()
            .filter(|ch| !ch.is_npc() && !ch.notdeadyet)
            .map(|ch| ch.id)
            .collect();
        debug!("Saving {} players.", players.len());
        for chid in players {
            self.save_char(db, chid);
        }
    }

    /* runs once a minute */
    pub fn autosave(&mut self, db: &DB) {
        self.mins_since_crashsave += 1;
        if self.mins_since_crashsave >= AUTOSAVE_TIME {
            self.mins_since_crashsave = 0;
            self.crash_save_all(db);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::structs::ObjLocation;

    fn outfitted(db: &mut DB) -> DepotId {
        let chid = db.new_player("Saver");
        {
            let ch = db.chars.get_mut(chid).unwrap();
            ch.class_levels.insert(ClassId::Wizard, 3);
            ch.base_points.max_hit = 30;
            ch.points.hit = 25;
            ch.player_mut().unwrap().idnum = 7;
        }
        db.char_to_room(chid, 3001).unwrap();
        let bag = db.read_object(3022).unwrap();
        let inner_bag = db.read_object(3022).unwrap();
        let dagger = db.read_object(3020).unwrap();
        let sword = db.read_object(3021).unwrap();
        db.obj_to_obj(dagger, inner_bag).unwrap();
        db.obj_to_obj(inner_bag, bag).unwrap();
        db.obj_to_char(bag, chid).unwrap();
        db.equip_char(chid, sword, WearPos::Wield).unwrap();
        db.affect_total(chid).unwrap();
        chid
    }

    #[test]
    fn round_trip_keeps_nested_containers_and_gear() {
        let mut db = DB::test_world();
        let chid = outfitted(&mut db);
        let file = db.build_player_file(chid).unwrap();
        assert_eq!(file.objects.len(), 4);
        assert_eq!(file.load_room, Some(3001));

        let json = serde_json::to_string(&file).unwrap();
        let parsed = parse_player(&json).unwrap();
        assert_eq!(parsed, file);

        let restored = db.restore_player(&parsed).unwrap();
        let mut again = db.build_player_file(restored).unwrap();
        again.saved_at = file.saved_at.clone();
        assert_eq!(again, file);

        let ch = db.chars.get(restored).unwrap();
        assert_eq!(ch.points.hit, 25);
        let wielded = ch.equipment[WearPos::Wield.index()].unwrap();
        assert_eq!(db.objs.get(wielded).unwrap().location, ObjLocation::Worn(restored, WearPos::Wield));
        let bag = db.objs.get(ch.carrying[0]).unwrap();
        let inner = db.objs.get(bag.contains[0]).unwrap();
        assert_eq!(inner.contains.len(), 1);
    }

    fn file_with(objects: Vec<SavedObj>) -> String {
        let mut db = DB::test_world();
        let chid = outfitted(&mut db);
        let mut file = db.build_player_file(chid).unwrap();
        file.objects = objects;
        serde_json::to_string(&file).unwrap()
    }

    fn bag(parent: SavedParent) -> SavedObj {
        SavedObj {
            vnum: 3022,
            name: "bag".into(),
            short_description: "a bag".into(),
            description: String::new(),
            obj_type: ObjType::Container,
            value: [0; 4],
            wear_flags: WearFlags::empty(),
            weight: 1,
            timer: -1,
            affected: vec![],
            parent,
        }
    }

    #[test]
    fn broken_object_trees_are_corrupt() {
        let cyclic = file_with(vec![bag(SavedParent::In(1)), bag(SavedParent::In(0))]);
        assert!(matches!(parse_player(&cyclic), Err(MudError::Corruption(_))));

        let own = file_with(vec![bag(SavedParent::In(0))]);
        assert!(matches!(parse_player(&own), Err(MudError::Corruption(_))));

        let dangling = file_with(vec![bag(SavedParent::Carried), bag(SavedParent::In(5))]);
        assert!(matches!(parse_player(&dangling), Err(MudError::Corruption(_))));

        let doubled = file_with(vec![
            bag(SavedParent::Worn(WearPos::Wield)),
            bag(SavedParent::Worn(WearPos::Wield)),
        ]);
        assert!(matches!(parse_player(&doubled), Err(MudError::Corruption(_))));

        let fine = file_with(vec![bag(SavedParent::Carried), bag(SavedParent::In(0))]);
        assert!(parse_player(&fine).is_ok());
    }

    #[test]
    fn old_versions_are_refused() {
        let mut db = DB::test_world();
        let chid = outfitted(&mut db);
        let mut file = db.build_player_file(chid).unwrap();
        file.version = SAVE_VERSION + 1;
        let json = serde_json::to_string(&file).unwrap();
        assert!(matches!(parse_player(&json), Err(MudError::Corruption(_))));
    }

    #[test]
    fn worker_writes_and_loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("tickmud-save-{}", std::process::id()));
        let dir = dir.to_string_lossy().to_string();
        let mut db = DB::test_world();
        let chid = outfitted(&mut db);

        let mut game = Game::new(Config {
            seed: Some(3),
            dir: dir.clone(),
            ..Default::default()
        });
        game.saver = Some(SaveWorker::start(&dir).unwrap());
        game.save_char(&db, chid);
        let saver = game.saver.take().unwrap();
        saver.flush();

        let desc = DepotId::default();
        saver.request_load(desc, "SAVER");
        let mut replies = vec![];
        while replies.is_empty() {
            replies = saver.poll();
            thread::yield_now();
        }
        match replies.pop() {
            Some(SaveReply::Loaded { name, result, .. }) => {
                assert_eq!(name, "SAVER");
                assert_eq!(result.unwrap().idnum, 7);
            }
            None => unreachable!(),
        }

        let mut index = DB::new();
        index.build_player_index(&dir).unwrap();
        assert_eq!(index.player_index.get("saver"), Some(&7));

        saver.shutdown();
        let _ = fs::remove_dir_all(&dir);
    }
}
