/* ************************************************************************
*   File: spells.rs                                     Part of CircleMUD *
*  Usage: Constants, spell table and manual spells of the spell system    *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use serde::{Deserialize, Serialize};

use crate::class::ClassId;
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::{FeatId, WeaponFamily};
use crate::structs::{
    AffectFlags, ApplyType, BonusType, ObjAffectedType, ObjType, Position,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl SpellSchool {
    pub fn name(self) -> &'static str {
        match self {
            SpellSchool::Abjuration => "abjuration",
            SpellSchool::Conjuration => "conjuration",
            SpellSchool::Divination => "divination",
            SpellSchool::Enchantment => "enchantment",
            SpellSchool::Evocation => "evocation",
            SpellSchool::Illusion => "illusion",
            SpellSchool::Necromancy => "necromancy",
            SpellSchool::Transmutation => "transmutation",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum DamType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Electric,
    Acid,
    Sound,
    Force,
    Holy,
    Unholy,
    Negative,
    Poison,
    Illusion,
    Energy,
}

impl DamType {
    /* damage reduction only soaks weapon damage */
    pub fn is_physical(self) -> bool {
        matches!(
            self,
            DamType::Slashing | DamType::Piercing | DamType::Bludgeoning
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Domain {
    War,
    Healing,
}

pub struct DomainInfo {
    pub id: Domain,
    pub name: &'static str,
    pub granted_feat: FeatId,
    /* domain spells, first circle first */
    pub spells: &'static [SpellId],
}

pub static DOMAIN_LIST: [DomainInfo; 2] = [
    DomainInfo {
        id: Domain::War,
        name: "war",
        granted_feat: FeatId::WarDomainWeaponFocus,
        spells: &[
            SpellId::MagicWeapon,
            SpellId::SpiritualWeapon,
            SpellId::MagicVestment,
            SpellId::DivinePower,
            SpellId::FlameStrike,
            SpellId::BladeBarrier,
        ],
    },
    DomainInfo {
        id: Domain::Healing,
        name: "healing",
        granted_feat: FeatId::HealingDomainEmpower,
        spells: &[
            SpellId::CureLight,
            SpellId::CureModerate,
            SpellId::CureSerious,
            SpellId::CureCritic,
            SpellId::MassCureLight,
            SpellId::Heal,
        ],
    },
];

impl Domain {
    pub fn info(self) -> &'static DomainInfo {
        &DOMAIN_LIST[self as usize]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum SpellId {
    MagicMissile,
    MageArmor,
    Shield,
    BurningHands,
    Identify,
    ScorchingRay,
    MirrorImage,
    ExpeditiousRetreat,
    Blur,
    Fireball,
    Haste,
    ShelgarnsBlade,
    Grace,
    Charisma,
    Stoneskin,
    PhantomSteed,
    FireShield,
    GreaterInvis,
    Strength,
    Firebrand,
    Endurance,
    Heroism,
    MinorGlobe,
    ConeOfCold,
    GreaterMirrorImage,
    IceStorm,
    FaithfulHound,
    FreezingSphere,
    MissileStorm,
    BallOfLightning,
    Transformation,
    Displacement,
    Sunburst,
    EnchantWeapon,
    HorridWilting,
    PrismaticSpray,
    Feeblemind,
    MeteorSwarm,
    ChainLightning,
    Ironskin,
    Gate,
    SummonCreature9,
    CureLight,
    HorizikaulsBoom,
    LightningBolt,
    CureSerious,
    CureCritic,
    RemoveCurse,
    AcidSheath,
    MassCureLight,
    EndureElements,
    MindFog,
    GreaterHeroism,
    DetectInvis,
    CircleAgainstGood,
    CircleAgainstEvil,
    RainbowPattern,
    MassCureModerate,
    Nightmare,
    CureModerate,
    Heal,
    MagicWeapon,
    SpiritualWeapon,
    MagicVestment,
    DivinePower,
    FlameStrike,
    BladeBarrier,
    Bless,
    Barkskin,
    CallLightning,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpellTarget {
    /* the caster, no argument taken */
    SelfOnly,
    /* a character in the room, the caster by default */
    CharDefensive,
    /* a character in the room, the current opponent by default */
    CharOffensive,
    /* everyone in the room on the other side */
    Area,
    /* an object in the caster's inventory */
    ObjInv,
    Ignore,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AffectTemplate {
    pub location: ApplyType,
    pub modifier: i32,
    pub bonus: BonusType,
    pub bitvector: AffectFlags,
    /* ticks, half the caster level is added */
    pub duration: i32,
}

const fn apply(location: ApplyType, modifier: i32, bonus: BonusType, duration: i32) -> AffectTemplate {
    AffectTemplate {
        location,
        modifier,
        bonus,
        bitvector: AffectFlags::empty(),
        duration,
    }
}

const fn flag(bitvector: AffectFlags, duration: i32) -> AffectTemplate {
    AffectTemplate {
        location: ApplyType::None,
        modifier: 0,
        bonus: BonusType::Untyped,
        bitvector,
        duration,
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SpellRoutine {
    /* (num + level / per_level) dice of size, at most max dice */
    Damage {
        num: i32,
        size: i32,
        per_level: i32,
        max: i32,
        dam_type: DamType,
    },
    /* dice plus one point per caster level up to max_bonus */
    Heal { num: i32, size: i32, max_bonus: i32 },
    Affect(&'static [AffectTemplate]),
    /* strips affects carrying these bits */
    Cure(AffectFlags),
    Identify,
    Enchant,
    Utility(&'static str),
}

pub struct SpellInfo {
    pub id: SpellId,
    pub name: &'static str,
    pub school: SpellSchool,
    /* seconds of casting before the spell goes off */
    pub casting_time: u64,
    pub min_pos: Position,
    pub targets: SpellTarget,
    pub routine: SpellRoutine,
    pub wear_off: Option<&'static str>,
    /* classes that can cast it, with the circle for each */
    pub classes: &'static [(ClassId, u8)],
}

impl SpellInfo {
    pub fn violent(&self) -> bool {
        match self.targets {
            SpellTarget::CharOffensive => true,
            SpellTarget::Area => !matches!(self.routine, SpellRoutine::Heal { .. }),
            _ => false,
        }
    }

    pub fn circle(&self, class: ClassId) -> Option<u8> {
        self.classes
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, circle)| *circle)
    }

    /* the lowest circle over all classes, used for domain and mana costs */
    pub fn min_circle(&self) -> u8 {
        self.classes.iter().map(|(_, c)| *c).min().unwrap_or(1)
    }
}

pub fn mana_cost(circle: u8) -> i32 {
    std::cmp::max(5, 10 * circle as i32)
}

use ApplyType as A;
use BonusType as B;
use ClassId::*;
use SpellRoutine::*;

static AFF_MAGE_ARMOR: [AffectTemplate; 1] = [apply(A::Ac, 4, B::Armor, 24)];
static AFF_SHIELD: [AffectTemplate; 1] = [apply(A::Ac, 4, B::Shield, 12)];
static AFF_MIRROR_IMAGE: [AffectTemplate; 1] = [apply(A::Ac, 2, B::Deflection, 12)];
static AFF_EXPEDITIOUS_RETREAT: [AffectTemplate; 1] = [apply(A::MaxMove, 30, B::Enhancement, 12)];
static AFF_BLUR: [AffectTemplate; 1] = [apply(A::Ac, 2, B::Insight, 12)];
static AFF_HASTE: [AffectTemplate; 3] = [
    apply(A::Ac, 1, B::Dodge, 6),
    apply(A::Hitroll, 1, B::Untyped, 6),
    flag(AffectFlags::HASTE, 6),
];
static AFF_GRACE: [AffectTemplate; 1] = [apply(A::Dex, 4, B::Enhancement, 12)];
static AFF_CHARISMA: [AffectTemplate; 1] = [apply(A::Cha, 4, B::Enhancement, 12)];
static AFF_STRENGTH: [AffectTemplate; 1] = [apply(A::Str, 4, B::Enhancement, 12)];
static AFF_ENDURANCE: [AffectTemplate; 1] = [apply(A::Con, 4, B::Enhancement, 12)];
static AFF_STONESKIN: [AffectTemplate; 1] = [apply(A::DamageReduction, 3, B::Untyped, 12)];
static AFF_IRONSKIN: [AffectTemplate; 1] = [apply(A::DamageReduction, 6, B::Untyped, 12)];
static AFF_PHANTOM_STEED: [AffectTemplate; 1] = [apply(A::MaxMove, 60, B::Enhancement, 24)];
static AFF_FIRE_SHIELD: [AffectTemplate; 1] = [flag(AffectFlags::FIRE_SHIELD, 6)];
static AFF_ACID_SHEATH: [AffectTemplate; 1] = [flag(AffectFlags::ACID_SHEATH, 6)];
static AFF_GREATER_INVIS: [AffectTemplate; 1] = [flag(AffectFlags::INVISIBLE, 12)];
static AFF_DETECT_INVIS: [AffectTemplate; 1] = [flag(AffectFlags::DETECT_INVIS, 24)];
static AFF_HEROISM: [AffectTemplate; 1] = [apply(A::Hitroll, 2, B::Morale, 12)];
static AFF_GREATER_HEROISM: [AffectTemplate; 2] = [
    apply(A::Hitroll, 4, B::Morale, 12),
    apply(A::MaxHit, 20, B::Morale, 12),
];
static AFF_MINOR_GLOBE: [AffectTemplate; 1] = [flag(AffectFlags::MINOR_GLOBE, 6)];
static AFF_GREATER_MIRROR_IMAGE: [AffectTemplate; 1] = [apply(A::Ac, 4, B::Deflection, 12)];
static AFF_TRANSFORMATION: [AffectTemplate; 3] = [
    apply(A::Str, 4, B::Enhancement, 6),
    apply(A::Con, 4, B::Enhancement, 6),
    apply(A::Hitroll, 2, B::Competence, 6),
];
static AFF_DISPLACEMENT: [AffectTemplate; 1] = [apply(A::Ac, 3, B::Insight, 6)];
static AFF_FEEBLEMIND: [AffectTemplate; 2] = [
    apply(A::Int, -6, B::Untyped, 6),
    flag(AffectFlags::FEEBLEMIND, 6),
];
static AFF_ENDURE_ELEMENTS: [AffectTemplate; 1] = [flag(AffectFlags::ENDURE_ELEMENTS, 24)];
static AFF_MIND_FOG: [AffectTemplate; 1] = [apply(A::Wis, -4, B::Untyped, 4)];
static AFF_CIRCLE_GOOD: [AffectTemplate; 2] = [
    apply(A::Ac, 2, B::Deflection, 12),
    flag(AffectFlags::PROTECT_GOOD, 12),
];
static AFF_CIRCLE_EVIL: [AffectTemplate; 2] = [
    apply(A::Ac, 2, B::Deflection, 12),
    flag(AffectFlags::PROTECT_EVIL, 12),
];
static AFF_RAINBOW_PATTERN: [AffectTemplate; 2] = [
    apply(A::Hitroll, -2, B::Untyped, 3),
    flag(AffectFlags::DAZED, 3),
];
static AFF_MAGIC_WEAPON: [AffectTemplate; 2] = [
    apply(A::Hitroll, 1, B::Enhancement, 12),
    apply(A::Damroll, 1, B::Enhancement, 12),
];
static AFF_MAGIC_VESTMENT: [AffectTemplate; 1] = [apply(A::Ac, 3, B::Enhancement, 24)];
static AFF_DIVINE_POWER: [AffectTemplate; 2] = [
    apply(A::Hitroll, 3, B::Luck, 6),
    apply(A::Damroll, 3, B::Luck, 6),
];
static AFF_BLESS: [AffectTemplate; 1] = [apply(A::Hitroll, 1, B::Morale, 12)];
static AFF_BARKSKIN: [AffectTemplate; 1] = [apply(A::Ac, 2, B::NaturalArmor, 24)];

macro_rules! spell {
    ($id:ident, $name:expr, $school:ident, $time:expr, $pos:ident, $targets:ident, $routine:expr,
     $wear:expr, [$(($class:ident, $circle:expr)),*]) => {
        SpellInfo {
            id: SpellId::$id,
            name: $name,
            school: SpellSchool::$school,
            casting_time: $time,
            min_pos: Position::$pos,
            targets: SpellTarget::$targets,
            routine: $routine,
            wear_off: $wear,
            classes: &[$(($class, $circle)),*],
        }
    };
}

const fn dam(num: i32, size: i32, per_level: i32, max: i32, dam_type: DamType) -> SpellRoutine {
    Damage {
        num,
        size,
        per_level,
        max,
        dam_type,
    }
}

pub static SPELL_INFO: [SpellInfo; 70] = [
    spell!(MagicMissile, "magic missile", Evocation, 1, Fighting, CharOffensive,
        dam(1, 4, 2, 5, DamType::Force), None,
        [(Wizard, 1), (Sorcerer, 1), (Bard, 1)]),
    spell!(MageArmor, "mage armor", Conjuration, 1, Fighting, CharDefensive,
        Affect(&AFF_MAGE_ARMOR), Some("You feel less protected."),
        [(Wizard, 1), (Sorcerer, 1)]),
    spell!(Shield, "shield", Abjuration, 1, Fighting, SelfOnly,
        Affect(&AFF_SHIELD), Some("Your force shield shimmers and fades away."),
        [(Wizard, 1), (Sorcerer, 1), (Bard, 1), (Alchemist, 1)]),
    spell!(BurningHands, "burning hands", Evocation, 1, Fighting, Area,
        dam(0, 4, 1, 5, DamType::Fire), None,
        [(Wizard, 1), (Sorcerer, 1)]),
    spell!(Identify, "identify", Divination, 2, Standing, ObjInv,
        Identify, None,
        [(Wizard, 1), (Sorcerer, 1), (Bard, 1), (Alchemist, 1)]),
    spell!(ScorchingRay, "scorching ray", Evocation, 1, Fighting, CharOffensive,
        dam(4, 6, 0, 4, DamType::Fire), None,
        [(Wizard, 2), (Sorcerer, 2)]),
    spell!(MirrorImage, "mirror image", Illusion, 1, Fighting, SelfOnly,
        Affect(&AFF_MIRROR_IMAGE), Some("You watch as your images vanish."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 2)]),
    spell!(ExpeditiousRetreat, "expeditious retreat", Transmutation, 1, Fighting, SelfOnly,
        Affect(&AFF_EXPEDITIOUS_RETREAT), Some("You feel your legs slow down."),
        [(Wizard, 1), (Sorcerer, 1), (Bard, 1), (Alchemist, 1)]),
    spell!(Blur, "blur", Illusion, 1, Fighting, CharDefensive,
        Affect(&AFF_BLUR), Some("Your outline comes back into focus."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 2), (Alchemist, 2)]),
    spell!(Fireball, "fireball", Evocation, 2, Fighting, Area,
        dam(0, 6, 1, 10, DamType::Fire), None,
        [(Wizard, 3), (Sorcerer, 3)]),
    spell!(Haste, "haste", Transmutation, 2, Fighting, CharDefensive,
        Affect(&AFF_HASTE), Some("You feel yourself slow down."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3), (Alchemist, 3)]),
    spell!(ShelgarnsBlade, "shelgarns blade", Conjuration, 2, Fighting, SelfOnly,
        Utility("A shimmering blade of force appears above your head, then slowly fades.\r\n"), None,
        [(Wizard, 3), (Sorcerer, 3)]),
    spell!(Grace, "grace", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_GRACE), Some("You feel less graceful."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 2), (Alchemist, 2), (Druid, 2), (Ranger, 2)]),
    spell!(Charisma, "charisma", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_CHARISMA), Some("You feel less charismatic."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 2), (Cleric, 2)]),
    spell!(Stoneskin, "stoneskin", Abjuration, 2, Fighting, CharDefensive,
        Affect(&AFF_STONESKIN), Some("Your skin returns to normal."),
        [(Wizard, 4), (Sorcerer, 4), (Bard, 4), (Alchemist, 4), (Druid, 5)]),
    spell!(PhantomSteed, "phantom steed", Conjuration, 2, Standing, SelfOnly,
        Affect(&AFF_PHANTOM_STEED), Some("Your phantom steed dissolves into mist."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3)]),
    spell!(FireShield, "fire shield", Evocation, 2, Fighting, SelfOnly,
        Affect(&AFF_FIRE_SHIELD), Some("The flames around you die away."),
        [(Wizard, 4), (Sorcerer, 4), (Alchemist, 4)]),
    spell!(GreaterInvis, "greater invisibility", Illusion, 2, Fighting, CharDefensive,
        Affect(&AFF_GREATER_INVIS), Some("You feel yourself exposed."),
        [(Wizard, 4), (Sorcerer, 4), (Bard, 4), (Alchemist, 4)]),
    spell!(Strength, "strength", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_STRENGTH), Some("You feel weaker."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 2), (Alchemist, 2), (Cleric, 2), (Druid, 2), (Paladin, 2)]),
    spell!(Firebrand, "firebrand", Evocation, 2, Fighting, Area,
        dam(0, 6, 1, 15, DamType::Fire), None,
        [(Wizard, 5), (Sorcerer, 5)]),
    spell!(Endurance, "endurance", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_ENDURANCE), Some("You feel less hardy."),
        [(Wizard, 2), (Sorcerer, 2), (Alchemist, 2), (Cleric, 2), (Druid, 2), (Ranger, 2)]),
    spell!(Heroism, "heroism", Enchantment, 1, Fighting, CharDefensive,
        Affect(&AFF_HEROISM), Some("You feel less heroic."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 2), (Alchemist, 3)]),
    spell!(MinorGlobe, "minor globe of invulnerability", Abjuration, 2, Fighting, SelfOnly,
        Affect(&AFF_MINOR_GLOBE), Some("The globe around you collapses."),
        [(Wizard, 4), (Sorcerer, 4)]),
    spell!(ConeOfCold, "cone of cold", Evocation, 2, Fighting, Area,
        dam(0, 6, 1, 15, DamType::Cold), None,
        [(Wizard, 5), (Sorcerer, 5), (Bard, 5)]),
    spell!(GreaterMirrorImage, "greater mirror image", Illusion, 2, Fighting, SelfOnly,
        Affect(&AFF_GREATER_MIRROR_IMAGE), Some("You watch as your images vanish."),
        [(Wizard, 6), (Sorcerer, 6)]),
    spell!(IceStorm, "ice storm", Evocation, 2, Fighting, Area,
        dam(5, 6, 0, 5, DamType::Cold), None,
        [(Wizard, 4), (Sorcerer, 4), (Bard, 4), (Druid, 4)]),
    spell!(FaithfulHound, "faithful hound", Conjuration, 3, Standing, SelfOnly,
        Utility("A phantom hound appears at your side and sniffs the air, then fades.\r\n"), None,
        [(Wizard, 5), (Sorcerer, 5)]),
    spell!(FreezingSphere, "freezing sphere", Evocation, 3, Fighting, Area,
        dam(0, 6, 1, 15, DamType::Cold), None,
        [(Wizard, 6), (Sorcerer, 6), (Bard, 6)]),
    spell!(MissileStorm, "missile storm", Evocation, 3, Fighting, CharOffensive,
        dam(0, 10, 1, 20, DamType::Force), None,
        [(Wizard, 7), (Sorcerer, 7)]),
    spell!(BallOfLightning, "ball of lightning", Evocation, 2, Fighting, CharOffensive,
        dam(0, 6, 1, 15, DamType::Electric), None,
        [(Wizard, 4), (Sorcerer, 4)]),
    spell!(Transformation, "transformation", Transmutation, 3, Fighting, SelfOnly,
        Affect(&AFF_TRANSFORMATION), Some("You feel your martial prowess fade."),
        [(Wizard, 6), (Sorcerer, 6), (Alchemist, 6)]),
    spell!(Displacement, "displacement", Illusion, 2, Fighting, CharDefensive,
        Affect(&AFF_DISPLACEMENT), Some("Your image snaps back into place."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3), (Alchemist, 3)]),
    spell!(Sunburst, "sunburst", Evocation, 3, Fighting, Area,
        dam(6, 6, 0, 6, DamType::Holy), None,
        [(Wizard, 8), (Sorcerer, 8), (Druid, 8)]),
    spell!(EnchantWeapon, "enchant weapon", Transmutation, 4, Standing, ObjInv,
        Enchant, None,
        [(Wizard, 3), (Sorcerer, 3)]),
    spell!(HorridWilting, "horrid wilting", Necromancy, 3, Fighting, Area,
        dam(0, 6, 1, 20, DamType::Negative), None,
        [(Wizard, 8), (Sorcerer, 8)]),
    spell!(PrismaticSpray, "prismatic spray", Evocation, 3, Fighting, Area,
        dam(0, 8, 1, 20, DamType::Energy), None,
        [(Wizard, 7), (Sorcerer, 7)]),
    spell!(Feeblemind, "feeblemind", Enchantment, 2, Fighting, CharOffensive,
        Affect(&AFF_FEEBLEMIND), Some("Your mind clears."),
        [(Wizard, 5), (Sorcerer, 5)]),
    spell!(MeteorSwarm, "meteor swarm", Evocation, 4, Fighting, Area,
        dam(0, 6, 1, 24, DamType::Fire), None,
        [(Wizard, 9), (Sorcerer, 9)]),
    spell!(ChainLightning, "chain lightning", Evocation, 3, Fighting, Area,
        dam(0, 6, 1, 20, DamType::Electric), None,
        [(Wizard, 6), (Sorcerer, 6)]),
    spell!(Ironskin, "ironskin", Transmutation, 3, Fighting, SelfOnly,
        Affect(&AFF_IRONSKIN), Some("Your skin loses its iron sheen."),
        [(Wizard, 9), (Sorcerer, 9)]),
    spell!(Gate, "gate", Conjuration, 4, Standing, Ignore,
        Utility("A shimmering portal flickers open before you, then collapses.\r\n"), None,
        [(Wizard, 9), (Sorcerer, 9), (Cleric, 9)]),
    spell!(SummonCreature9, "summon creature ix", Conjuration, 4, Standing, Ignore,
        Utility("A vast shape coalesces out of the air, bows, and is gone.\r\n"), None,
        [(Wizard, 9), (Sorcerer, 9), (Cleric, 9), (Druid, 9)]),
    spell!(CureLight, "cure light", Conjuration, 1, Fighting, CharDefensive,
        Heal { num: 1, size: 8, max_bonus: 5 }, None,
        [(Cleric, 1), (Druid, 1), (Paladin, 1), (Ranger, 2), (Bard, 1), (Alchemist, 1)]),
    spell!(HorizikaulsBoom, "horizikauls boom", Evocation, 1, Fighting, CharOffensive,
        dam(1, 4, 2, 5, DamType::Sound), None,
        [(Wizard, 1), (Sorcerer, 1), (Bard, 1)]),
    spell!(LightningBolt, "lightning bolt", Evocation, 2, Fighting, CharOffensive,
        dam(0, 6, 1, 10, DamType::Electric), None,
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3)]),
    spell!(CureSerious, "cure serious", Conjuration, 2, Fighting, CharDefensive,
        Heal { num: 3, size: 8, max_bonus: 15 }, None,
        [(Cleric, 3), (Druid, 4), (Paladin, 4), (Ranger, 4), (Bard, 3), (Alchemist, 3)]),
    spell!(CureCritic, "cure critic", Conjuration, 2, Fighting, CharDefensive,
        Heal { num: 4, size: 8, max_bonus: 20 }, None,
        [(Cleric, 4), (Druid, 5), (Bard, 4), (Alchemist, 4)]),
    spell!(RemoveCurse, "remove curse", Abjuration, 2, Standing, CharDefensive,
        Cure(AffectFlags::CURSE), None,
        [(Cleric, 3), (Wizard, 4), (Sorcerer, 4), (Bard, 3), (Paladin, 3)]),
    spell!(AcidSheath, "acid sheath", Conjuration, 2, Fighting, SelfOnly,
        Affect(&AFF_ACID_SHEATH), Some("The acid around you drips away."),
        [(Wizard, 5), (Sorcerer, 5), (Bard, 4)]),
    spell!(MassCureLight, "mass cure light", Conjuration, 2, Fighting, Area,
        Heal { num: 1, size: 8, max_bonus: 25 }, None,
        [(Cleric, 5), (Druid, 6), (Bard, 5)]),
    spell!(EndureElements, "endure elements", Abjuration, 1, Fighting, CharDefensive,
        Affect(&AFF_ENDURE_ELEMENTS), Some("You feel exposed to the elements."),
        [(Cleric, 1), (Druid, 1), (Paladin, 1), (Ranger, 1), (Wizard, 1), (Sorcerer, 1), (Bard, 1)]),
    spell!(MindFog, "mind fog", Enchantment, 2, Fighting, Area,
        Affect(&AFF_MIND_FOG), Some("The fog in your mind lifts."),
        [(Wizard, 5), (Sorcerer, 5), (Bard, 5)]),
    spell!(GreaterHeroism, "greater heroism", Enchantment, 2, Fighting, CharDefensive,
        Affect(&AFF_GREATER_HEROISM), Some("You feel less heroic."),
        [(Wizard, 6), (Sorcerer, 6), (Bard, 5)]),
    spell!(DetectInvis, "detect invisibility", Divination, 1, Fighting, CharDefensive,
        Affect(&AFF_DETECT_INVIS), Some("Your eyes stop tingling."),
        [(Wizard, 2), (Sorcerer, 2), (Bard, 3), (Alchemist, 2)]),
    spell!(CircleAgainstGood, "circle against good", Abjuration, 2, Fighting, SelfOnly,
        Affect(&AFF_CIRCLE_GOOD), Some("You feel less protected from good."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3), (Cleric, 4)]),
    spell!(CircleAgainstEvil, "circle against evil", Abjuration, 2, Fighting, SelfOnly,
        Affect(&AFF_CIRCLE_EVIL), Some("You feel less protected from evil."),
        [(Wizard, 3), (Sorcerer, 3), (Bard, 3), (Cleric, 4), (Paladin, 3)]),
    spell!(RainbowPattern, "rainbow pattern", Illusion, 2, Fighting, Area,
        Affect(&AFF_RAINBOW_PATTERN), Some("The colours fade from your vision."),
        [(Wizard, 4), (Sorcerer, 4), (Bard, 4)]),
    spell!(MassCureModerate, "mass cure moderate", Conjuration, 3, Fighting, Area,
        Heal { num: 2, size: 8, max_bonus: 30 }, None,
        [(Cleric, 6), (Druid, 7), (Bard, 6)]),
    spell!(Nightmare, "nightmare", Illusion, 3, Fighting, CharOffensive,
        dam(10, 4, 0, 10, DamType::Illusion), None,
        [(Wizard, 5), (Sorcerer, 5), (Bard, 5)]),
    spell!(CureModerate, "cure moderate", Conjuration, 1, Fighting, CharDefensive,
        Heal { num: 2, size: 8, max_bonus: 10 }, None,
        [(Cleric, 2), (Druid, 3), (Paladin, 3), (Ranger, 3), (Bard, 2), (Alchemist, 2)]),
    spell!(Heal, "heal", Conjuration, 3, Fighting, CharDefensive,
        Heal { num: 0, size: 0, max_bonus: 150 }, None,
        [(Cleric, 6), (Druid, 7)]),
    spell!(MagicWeapon, "magic weapon", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_MAGIC_WEAPON), Some("Your weapons feel less magical."),
        [(Wizard, 1), (Sorcerer, 1), (Cleric, 1), (Paladin, 1)]),
    spell!(SpiritualWeapon, "spiritual weapon", Evocation, 1, Fighting, CharOffensive,
        dam(1, 8, 3, 6, DamType::Force), None,
        [(Cleric, 2)]),
    spell!(MagicVestment, "magic vestment", Abjuration, 2, Fighting, CharDefensive,
        Affect(&AFF_MAGIC_VESTMENT), Some("Your armor stops glowing."),
        [(Cleric, 3), (Paladin, 3)]),
    spell!(DivinePower, "divine power", Evocation, 2, Fighting, SelfOnly,
        Affect(&AFF_DIVINE_POWER), Some("The divine power leaves you."),
        [(Cleric, 4)]),
    spell!(FlameStrike, "flame strike", Evocation, 2, Fighting, CharOffensive,
        dam(0, 6, 1, 15, DamType::Fire), None,
        [(Cleric, 5), (Druid, 4)]),
    spell!(BladeBarrier, "blade barrier", Evocation, 3, Fighting, Area,
        dam(0, 6, 1, 15, DamType::Slashing), None,
        [(Cleric, 6)]),
    spell!(Bless, "bless", Enchantment, 1, Fighting, CharDefensive,
        Affect(&AFF_BLESS), Some("You feel less righteous."),
        [(Cleric, 1), (Paladin, 1)]),
    spell!(Barkskin, "barkskin", Transmutation, 1, Fighting, CharDefensive,
        Affect(&AFF_BARKSKIN), Some("Your skin loses its bark-like texture."),
        [(Druid, 2), (Ranger, 2), (Alchemist, 2)]),
    spell!(CallLightning, "call lightning", Evocation, 2, Fighting, CharOffensive,
        dam(0, 6, 1, 10, DamType::Electric), None,
        [(Druid, 3)]),
];

impl SpellId {
    pub fn info(self) -> &'static SpellInfo {
        &SPELL_INFO[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}

/*
 * Special spells appear below.
 */
pub fn spell_identify(db: &DB, objid: DepotId) -> MudResult<String> {
    let obj = db.get_object(objid)?;
    let mut buf = format!(
        "Object '{}', Item type: {:?}\r\nWeight: {}\r\n",
        obj.short_description, obj.obj_type, obj.weight
    );
    if obj.obj_type == ObjType::Weapon {
        let family = WeaponFamily::from_index(obj.value[2])
            .map(|f| f.name())
            .unwrap_or("unknown weapons");
        buf.push_str(&format!(
            "Damage Dice is '{}D{}' ({}).\r\n",
            obj.value[0], obj.value[1], family
        ));
    }
    if obj.obj_type == ObjType::Armor {
        buf.push_str(&format!("AC-apply is {}\r\n", obj.value[0]));
    }
    if !obj.affected.is_empty() {
        buf.push_str("Can affect you as :\r\n");
        for af in &obj.affected {
            buf.push_str(&format!(
                "   Affects: {} By {} ({:?})\r\n",
                af.location.name(),
                af.modifier,
                af.bonus
            ));
        }
    }
    Ok(buf)
}

/* an enhancement bonus of +1 per 6 caster levels, at most +5 */
pub fn spell_enchant_weapon(db: &mut DB, level: u8, objid: DepotId) -> MudResult<()> {
    let obj = db.get_object_mut(objid)?;
    if obj.obj_type != ObjType::Weapon {
        return Err(MudError::invalid("You can only enchant weapons.\r\n"));
    }
    if obj
        .affected
        .iter()
        .any(|af| af.bonus == BonusType::Enhancement)
    {
        return Err(MudError::invalid("That weapon is already enchanted.\r\n"));
    }
    let bonus = std::cmp::min(5, 1 + level as i32 / 6);
    for location in [ApplyType::Hitroll, ApplyType::Damroll] {
        obj.affected.push(ObjAffectedType {
            location,
            modifier: bonus,
            bonus: BonusType::Enhancement,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spell_table_is_indexed_by_spell_id() {
        for (i, info) in SPELL_INFO.iter().enumerate() {
            assert_eq!(info.id as usize, i, "{} out of place", info.name);
            assert!(!info.classes.is_empty(), "{} has no class", info.name);
        }
    }

    #[test]
    fn area_heals_are_not_violent() {
        assert!(SpellId::Fireball.info().violent());
        assert!(SpellId::MagicMissile.info().violent());
        assert!(!SpellId::MassCureLight.info().violent());
        assert!(!SpellId::MageArmor.info().violent());
    }

    #[test]
    fn domain_spells_are_on_the_cleric_list() {
        for domain in [Domain::War, Domain::Healing] {
            for spell in domain.info().spells {
                assert!(
                    spell.info().circle(ClassId::Cleric).is_some(),
                    "{} missing for clerics",
                    spell.name()
                );
            }
        }
    }

    #[test]
    fn mana_cost_scales_with_circle() {
        assert_eq!(mana_cost(0), 5);
        assert_eq!(mana_cost(1), 10);
        assert_eq!(mana_cost(9), 90);
    }
}
