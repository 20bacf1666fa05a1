/* ************************************************************************
*   File: structs.rs                                    Part of CircleMUD *
*  Usage: Core structures: characters, objects, rooms, zones, affects     *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::class::ClassId;
use crate::depot::{DepotId, HasId};
use crate::events::EventId;
use crate::feats::CharFeats;
use crate::race::{RaceId, RaceType};
use crate::spells::{DamType, Domain, SpellId};

pub const OPT_USEC: u64 = 100_000;
pub const PASSES_PER_SEC: u64 = 1_000_000 / OPT_USEC;

pub const PULSE_ZONE: u64 = 10 * PASSES_PER_SEC;
pub const PULSE_MOBILE: u64 = 10 * PASSES_PER_SEC;
pub const PULSE_VIOLENCE: u64 = 2 * PASSES_PER_SEC;
pub const PULSE_AUTOSAVE: u64 = 60 * PASSES_PER_SEC;
pub const PULSE_IDLEPWD: u64 = 15 * PASSES_PER_SEC;
/* real-life seconds per mud hour; the affect and regeneration clock */
pub const SECS_PER_MUD_HOUR: u64 = 75;
pub const PULSE_TICK: u64 = SECS_PER_MUD_HOUR * PASSES_PER_SEC;

/* Variables for the output buffering system */
pub const MAX_SOCK_BUF: usize = 12 * 1024;
pub const MAX_PROMPT_LENGTH: usize = 96;
pub const GARBAGE_SPACE: usize = 32;
pub const LARGE_BUFSIZE: usize = MAX_SOCK_BUF - GARBAGE_SPACE - MAX_PROMPT_LENGTH;
pub const HISTORY_SIZE: usize = 5;
pub const MAX_INPUT_LENGTH: usize = 256;
pub const MAX_RAW_INPUT_LENGTH: usize = 512;
pub const MAX_NAME_LENGTH: usize = 20;
pub const MAX_PWD_LENGTH: usize = 16;
pub const MAX_FAVORED_ENEMIES: usize = 5;

/*
 * LVL_CAP is the highest mortal level reachable by adding class levels;
 * immortal levels are granted by 'advance' and kept apart from classes.
 */
pub const LVL_CAP: u8 = 30;
pub const LVL_EPIC: u8 = 20;
pub const LVL_IMMORT: u8 = 31;
pub const LVL_GOD: u8 = 32;
pub const LVL_GRGOD: u8 = 33;
pub const LVL_IMPL: u8 = 34;

pub type RoomVnum = i32;
pub type ObjVnum = i32;
pub type MobVnum = i32;
pub type ZoneVnum = i32;

pub const NOWHERE: RoomVnum = -1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConState {
    /* Playing - Nominal state */
    ConPlaying,
    /* User disconnect, remove character. */
    ConClose,
    /* By what name ..? */
    ConGetName,
    /* Waiting for the save worker to read the player file */
    ConLoading,
    /* Did I get that right, x? */
    ConNameCnfrm,
    /* Password: */
    ConPassword,
    /* Give me a password for x */
    ConNewpasswd,
    /* Please retype password: */
    ConCnfpasswd,
    /* Race? */
    ConQrace,
    /* Class? */
    ConQclass,
    /* Premade build? */
    ConQpremade,
    /* In-game link loss (leave character) */
    ConDisconnect,
}

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize,
)]
pub enum Position {
    Dead,
    Sleeping,
    Resting,
    Sitting,
    Fighting,
    #[default]
    Standing,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Neutral,
    Male,
    Female,
}

/* ability scores, in the order race modifier tables use */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Stat {
    Str,
    Con,
    Int,
    Wis,
    Dex,
    Cha,
}

impl Stat {
    pub const ALL: [Stat; 6] = [Stat::Str, Stat::Con, Stat::Int, Stat::Wis, Stat::Dex, Stat::Cha];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Str => "strength",
            Stat::Con => "constitution",
            Stat::Int => "intelligence",
            Stat::Wis => "wisdom",
            Stat::Dex => "dexterity",
            Stat::Cha => "charisma",
        }
    }
}

/* skills, called abilities on the score sheet */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Ability {
    Heal,
    Lore,
    Intimidate,
    Discipline,
    TotalDefense,
    Acrobatics,
    Bluff,
    DisableDevice,
    Perception,
    Stealth,
    SleightOfHand,
    Appraise,
    Ride,
    Swim,
    Spellcraft,
    Concentration,
    Climb,
    UseMagicDevice,
    SenseMotive,
    Survival,
    HandleAnimal,
    Perform,
}

impl Ability {
    pub fn name(self) -> &'static str {
        match self {
            Ability::Heal => "heal",
            Ability::Lore => "lore",
            Ability::Intimidate => "intimidate",
            Ability::Discipline => "discipline",
            Ability::TotalDefense => "total defense",
            Ability::Acrobatics => "acrobatics",
            Ability::Bluff => "bluff",
            Ability::DisableDevice => "disable device",
            Ability::Perception => "perception",
            Ability::Stealth => "stealth",
            Ability::SleightOfHand => "sleight of hand",
            Ability::Appraise => "appraise",
            Ability::Ride => "ride",
            Ability::Swim => "swim",
            Ability::Spellcraft => "spellcraft",
            Ability::Concentration => "concentration",
            Ability::Climb => "climb",
            Ability::UseMagicDevice => "use magic device",
            Ability::SenseMotive => "sense motive",
            Ability::Survival => "survival",
            Ability::HandleAnimal => "handle animal",
            Ability::Perform => "perform",
        }
    }
}

/* Modifier constants used with obj affects ('A' fields) and spells */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum ApplyType {
    #[default]
    None,
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
    MaxHit,
    MaxMove,
    MaxMana,
    Hitroll,
    Damroll,
    Ac,
    DamageReduction,
}

impl ApplyType {
    pub fn stat(stat: Stat) -> ApplyType {
        match stat {
            Stat::Str => ApplyType::Str,
            Stat::Con => ApplyType::Con,
            Stat::Int => ApplyType::Int,
            Stat::Wis => ApplyType::Wis,
            Stat::Dex => ApplyType::Dex,
            Stat::Cha => ApplyType::Cha,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ApplyType::None => "NONE",
            ApplyType::Str => "STR",
            ApplyType::Dex => "DEX",
            ApplyType::Con => "CON",
            ApplyType::Int => "INT",
            ApplyType::Wis => "WIS",
            ApplyType::Cha => "CHA",
            ApplyType::MaxHit => "MAXHIT",
            ApplyType::MaxMove => "MAXMOVE",
            ApplyType::MaxMana => "MAXMANA",
            ApplyType::Hitroll => "HITROLL",
            ApplyType::Damroll => "DAMROLL",
            ApplyType::Ac => "ARMOR",
            ApplyType::DamageReduction => "DR",
        }
    }
}

/*
 * Bonus types decide stacking: Untyped and Circumstance bonuses add up,
 * every other type only counts its best bonus and its worst penalty.
 */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum BonusType {
    #[default]
    Untyped,
    Circumstance,
    Dodge,
    Enhancement,
    Morale,
    Luck,
    Insight,
    Sacred,
    Competence,
    Racial,
    Armor,
    Shield,
    Deflection,
    NaturalArmor,
}

impl BonusType {
    pub fn stacks(self) -> bool {
        matches!(self, BonusType::Untyped | BonusType::Circumstance)
    }
}

bitflags! {
    /* Affect bits: used in char_data.aff_flags */
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
    pub struct AffectFlags: u32 {
        const INVISIBLE = 1 << 0;
        const DETECT_INVIS = 1 << 1;
        const HASTE = 1 << 2;
        const BLIND = 1 << 3;
        const POISON = 1 << 4;
        const SLEEP = 1 << 5;
        const CURSE = 1 << 6;
        const FIRE_SHIELD = 1 << 7;
        const ACID_SHEATH = 1 << 8;
        const MINOR_GLOBE = 1 << 9;
        const FEEBLEMIND = 1 << 10;
        const PROTECT_EVIL = 1 << 11;
        const PROTECT_GOOD = 1 << 12;
        const ENDURE_ELEMENTS = 1 << 13;
        const DAZED = 1 << 14;
    }
}

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
    pub struct RoomFlags: u32 {
        const DARK = 1 << 0;
        const NO_MOB = 1 << 1;
        const INDOORS = 1 << 2;
        const PEACEFUL = 1 << 3;
        const DEATH = 1 << 4;
        const PRIVATE = 1 << 5;
    }
}

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
    pub struct ExitFlags: u32 {
        const ISDOOR = 1 << 0;
        const CLOSED = 1 << 1;
        const LOCKED = 1 << 2;
    }
}

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
    pub struct MobFlags: u32 {
        /* Mob should not move */
        const SENTINEL = 1 << 0;
        /* Mob auto-attacks everybody nearby */
        const AGGRESSIVE = 1 << 1;
        /* Mob flees if severely injured */
        const WIMPY = 1 << 2;
        /* Mob shouldn't wander out of zone */
        const STAY_ZONE = 1 << 3;
    }
}

bitflags! {
    /* Take/Wear flags: where an object can be worn */
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
    pub struct WearFlags: u32 {
        const TAKE = 1 << 0;
        const FINGER = 1 << 1;
        const NECK = 1 << 2;
        const BODY = 1 << 3;
        const HEAD = 1 << 4;
        const LEGS = 1 << 5;
        const FEET = 1 << 6;
        const HANDS = 1 << 7;
        const ARMS = 1 << 8;
        const SHIELD = 1 << 9;
        const ABOUT = 1 << 10;
        const WAIST = 1 << 11;
        const WRIST = 1 << 12;
        const WIELD = 1 << 13;
        const HOLD = 1 << 14;
        const LIGHT = 1 << 15;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

pub const NUM_OF_DIRS: usize = 6;

impl Direction {
    pub const ALL: [Direction; NUM_OF_DIRS] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/* Character equipment positions: used as index for char_data.equipment[] */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum WearPos {
    Light,
    FingerR,
    FingerL,
    Neck1,
    Neck2,
    Body,
    Head,
    Legs,
    Feet,
    Hands,
    Arms,
    Shield,
    About,
    Waist,
    WristR,
    WristL,
    Wield,
}

pub const NUM_WEARS: usize = 17;

impl WearPos {
    pub const ALL: [WearPos; NUM_WEARS] = [
        WearPos::Light,
        WearPos::FingerR,
        WearPos::FingerL,
        WearPos::Neck1,
        WearPos::Neck2,
        WearPos::Body,
        WearPos::Head,
        WearPos::Legs,
        WearPos::Feet,
        WearPos::Hands,
        WearPos::Arms,
        WearPos::Shield,
        WearPos::About,
        WearPos::Waist,
        WearPos::WristR,
        WearPos::WristL,
        WearPos::Wield,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn wear_flag(self) -> WearFlags {
        match self {
            WearPos::Light => WearFlags::LIGHT,
            WearPos::FingerR | WearPos::FingerL => WearFlags::FINGER,
            WearPos::Neck1 | WearPos::Neck2 => WearFlags::NECK,
            WearPos::Body => WearFlags::BODY,
            WearPos::Head => WearFlags::HEAD,
            WearPos::Legs => WearFlags::LEGS,
            WearPos::Feet => WearFlags::FEET,
            WearPos::Hands => WearFlags::HANDS,
            WearPos::Arms => WearFlags::ARMS,
            WearPos::Shield => WearFlags::SHIELD,
            WearPos::About => WearFlags::ABOUT,
            WearPos::Waist => WearFlags::WAIST,
            WearPos::WristR | WearPos::WristL => WearFlags::WRIST,
            WearPos::Wield => WearFlags::WIELD,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ObjType {
    Light,
    Weapon,
    Armor,
    Container,
    Money,
    Corpse,
    #[default]
    Other,
}

/* where an object is; exactly one owner at a time */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ObjLocation {
    #[default]
    Nowhere,
    Carried(DepotId),
    Worn(DepotId, WearPos),
    InObj(DepotId),
    InRoom(RoomVnum),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ObjAffectedType {
    pub location: ApplyType,
    pub modifier: i32,
    #[serde(default)]
    pub bonus: BonusType,
}

/* ================== Memory Structure for Objects ================== */
#[derive(Clone, Debug, Default)]
pub struct ObjData {
    pub id: DepotId,
    /* prototype number, -1 for objects created at runtime */
    pub vnum: ObjVnum,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub obj_type: ObjType,
    /* type-dependent values; weapon: dice count, dice size, weapon family */
    pub value: [i32; 4],
    pub wear_flags: WearFlags,
    pub weight: i32,
    /* corpse decay, -1 for never */
    pub timer: i32,
    pub affected: Vec<ObjAffectedType>,
    pub location: ObjLocation,
    pub contains: Vec<DepotId>,
}

impl HasId for ObjData {
    fn id(&self) -> DepotId {
        self.id
    }

    fn set_id(&mut self, id: DepotId) {
        self.id = id;
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoomDirectionData {
    pub to_room: RoomVnum,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub exit_info: ExitFlags,
}

impl RoomDirectionData {
    pub fn is_closed(&self) -> bool {
        self.exit_info.contains(ExitFlags::CLOSED)
    }
}

/* ================== Memory Structure for room ======================= */
#[derive(Clone, Debug, Default)]
pub struct RoomData {
    pub number: RoomVnum,
    pub zone: ZoneVnum,
    pub name: String,
    pub description: String,
    pub room_flags: RoomFlags,
    pub dir_option: [Option<RoomDirectionData>; NUM_OF_DIRS],
    /* characters, newest first as in the old linked lists */
    pub peoples: Vec<DepotId>,
    pub contents: Vec<DepotId>,
}

impl RoomData {
    pub fn exit(&self, dir: Direction) -> Option<&RoomDirectionData> {
        self.dir_option[dir as usize].as_ref()
    }
}

/* zone reset command; each one runs only if the previous one succeeded when if_flag is set */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ResetCommand {
    /* load a mobile into a room */
    Mobile {
        vnum: MobVnum,
        max: usize,
        room: RoomVnum,
    },
    /* load an object into a room */
    Object {
        vnum: ObjVnum,
        max: usize,
        room: RoomVnum,
    },
    /* give an object to the last loaded mobile */
    Give { vnum: ObjVnum, max: usize },
    /* equip the last loaded mobile */
    Equip {
        vnum: ObjVnum,
        max: usize,
        pos: WearPos,
    },
    /* put an object into the last loaded object */
    Put { vnum: ObjVnum, max: usize },
    /* set a door: 0 open, 1 closed, 2 closed and locked */
    Door {
        room: RoomVnum,
        dir: Direction,
        state: u8,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetCom {
    #[serde(default)]
    pub if_flag: bool,
    pub command: ResetCommand,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneData {
    pub number: ZoneVnum,
    pub name: String,
    /* room vnum range */
    pub bot: RoomVnum,
    pub top: RoomVnum,
    /* in mud minutes */
    pub lifespan: i32,
    #[serde(skip)]
    pub age: i32,
    /* 0 never, 1 when no players are in the zone, 2 always */
    pub reset_mode: u8,
    #[serde(default)]
    pub cmd: Vec<ResetCom>,
}

/* An affect structure. */
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AffectedType {
    /* The spell that caused this */
    pub spell: SpellId,
    /* ticks left, -1 for permanent */
    pub duration: i32,
    pub modifier: i32,
    pub location: ApplyType,
    pub bitvector: AffectFlags,
    pub bonus: BonusType,
}

/* Char's abilities, indexed by Stat */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CharAbilityData {
    scores: [i32; 6],
}

impl CharAbilityData {
    pub fn new(scores: [i32; 6]) -> CharAbilityData {
        CharAbilityData { scores }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.scores[stat as usize]
    }

    pub fn set(&mut self, stat: Stat, val: i32) {
        self.scores[stat as usize] = val;
    }

    pub fn scores(&self) -> [i32; 6] {
        self.scores
    }
}

/* Char's points. The max_ values here include affects. */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CharPointData {
    pub mana: i32,
    pub max_mana: i32,
    pub hit: i32,
    pub max_hit: i32,
    pub movem: i32,
    pub max_move: i32,
    /* bonus to armor class from equipment and spells, 10 is added on use */
    pub armor: i32,
    pub hitroll: i32,
    pub damroll: i32,
    pub damage_reduction: i32,
    pub exp: i64,
    pub gold: i64,
}

/* points before affects and equipment are applied */
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CharBasePoints {
    pub max_hit: i32,
    pub max_mana: i32,
    pub max_move: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default)]
    pub hitroll: i32,
    #[serde(default)]
    pub damroll: i32,
    #[serde(default)]
    pub damage_reduction: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum CombatMode {
    #[default]
    None,
    PowerAttack(i32),
    CombatExpertise(i32),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FightState {
    #[default]
    Engaged,
    Fleeing,
    Ended,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CastTarget {
    None,
    Char(DepotId),
    Obj(DepotId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CastingData {
    pub spell: SpellId,
    pub class: ClassId,
    pub target: CastTarget,
    /* pulse at which the spell completes */
    pub due: u64,
    pub event: EventId,
}

/* Alchemist discoveries handed out by the premade alchemist build */
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Discovery {
    FireBrand,
    PsychokineticTincture,
    VestigialArm,
    FastBombs,
    GreaterMutagen,
    BlindingBombs,
    SunlightBombs,
    StickyBombs,
    HealingBombs,
    Infusion,
}

impl Discovery {
    pub fn name(self) -> &'static str {
        match self {
            Discovery::FireBrand => "fire brand",
            Discovery::PsychokineticTincture => "psychokinetic tincture",
            Discovery::VestigialArm => "vestigial arm",
            Discovery::FastBombs => "fast bombs",
            Discovery::GreaterMutagen => "greater mutagen",
            Discovery::BlindingBombs => "blinding bombs",
            Discovery::SunlightBombs => "sunlight bombs",
            Discovery::StickyBombs => "sticky bombs",
            Discovery::HealingBombs => "healing bombs",
            Discovery::Infusion => "infusion",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GrandDiscovery {
    TrueMutagen,
}

impl GrandDiscovery {
    pub fn name(self) -> &'static str {
        match self {
            GrandDiscovery::TrueMutagen => "true mutagen",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DraconicHeritage {
    Red,
    Gold,
}

impl DraconicHeritage {
    pub fn name(self) -> &'static str {
        match self {
            DraconicHeritage::Red => "red",
            DraconicHeritage::Gold => "gold",
        }
    }
}

/*
 * Specials needed only by PCs, not NPCs.  All of this is written to the
 * player file.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpecials {
    pub idnum: i64,
    /* pbkdf2 hash of the password */
    pub passwd: [u8; 16],
    /* immortal level, 0 for mortals */
    pub admin_level: u8,
    /* syslog verbosity for immortals (BRF/NRM/CMP), 0 is off */
    pub log_level: u8,
    pub feat_points: i32,
    pub class_feats: BTreeMap<ClassId, i32>,
    pub epic_feat_points: i32,
    pub epic_class_feats: BTreeMap<ClassId, i32>,
    pub practices: i32,
    pub trains: i32,
    pub boosts: i32,
    /* None when the player levels by hand */
    pub premade_class: Option<ClassId>,
    pub spells_known: BTreeMap<ClassId, std::collections::BTreeSet<SpellId>>,
    pub domains: Option<(Domain, Domain)>,
    pub familiar: Option<MobVnum>,
    pub animal_companion: Option<MobVnum>,
    pub favored_enemies: [Option<RaceType>; MAX_FAVORED_ENEMIES],
    pub discoveries: std::collections::BTreeSet<Discovery>,
    pub grand_discovery: Option<GrandDiscovery>,
    pub bloodline: Option<DraconicHeritage>,
    pub load_room: Option<RoomVnum>,
    pub bad_pws: u8,
}

/* Specials used by NPCs, not PCs */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NpcSpecials {
    pub vnum: MobVnum,
    pub level: u8,
    pub damnodice: i32,
    pub damsizedice: i32,
    pub attack_type: usize,
    pub default_pos: Position,
    pub mob_flags: MobFlags,
    pub race_type: RaceType,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CharKind {
    Player(Box<PlayerSpecials>),
    Npc(NpcSpecials),
}

impl Default for CharKind {
    fn default() -> Self {
        CharKind::Npc(NpcSpecials::default())
    }
}

/* ================== Structure for player/non-player ===================== */
#[derive(Clone, Debug, Default)]
pub struct CharData {
    pub id: DepotId,
    /* PC / NPC s name (kill ...  ) */
    pub name: String,
    /* for NPC 'actions' */
    pub short_descr: String,
    /* for 'look' */
    pub long_descr: String,
    pub description: String,
    pub title: String,
    pub sex: Sex,
    pub race: Option<RaceId>,
    pub class_levels: BTreeMap<ClassId, u8>,
    /* Abilities without modifiers */
    pub real_abils: CharAbilityData,
    /* Abils with spells/stones/etc */
    pub aff_abils: CharAbilityData,
    pub points: CharPointData,
    pub base_points: CharBasePoints,
    pub feats: CharFeats,
    pub abilities: BTreeMap<Ability, i32>,
    pub affected: Vec<AffectedType>,
    pub aff_flags: AffectFlags,
    pub resistances: BTreeMap<DamType, i32>,
    pub position: Position,
    /* wait for how many pulses */
    pub wait: u32,
    pub casting: Option<CastingData>,
    pub in_room: RoomVnum,
    /* location for linkdead people */
    pub was_in_room: RoomVnum,
    pub fighting: Option<DepotId>,
    pub fight_state: FightState,
    pub combat_mode: CombatMode,
    /* rolled when the fight starts, highest acts first */
    pub initiative: i32,
    /* +-1000 for alignments */
    pub alignment: i32,
    pub carrying: Vec<DepotId>,
    pub equipment: [Option<DepotId>; NUM_WEARS],
    /* NULL for mobiles */
    pub desc: Option<DepotId>,
    /* idle ticks */
    pub timer: i32,
    pub kind: CharKind,
    /* being extracted at the end of the pulse */
    pub notdeadyet: bool,
}

impl HasId for CharData {
    fn id(&self) -> DepotId {
        self.id
    }

    fn set_id(&mut self, id: DepotId) {
        self.id = id;
    }
}
