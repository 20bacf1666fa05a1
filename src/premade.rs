/* ************************************************************************
*   File: premade.rs                                    Part of CircleMUD *
*  Usage: Premade builds for players who don't build by hand              *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use log::error;

use crate::class::ClassId;
use crate::db::DB;
use crate::depot::DepotId;
use crate::error::{MudError, MudResult};
use crate::feats::{FeatId, FeatKind, SubChoice, WeaponFamily};
use crate::race::{RaceId, RaceType};
use crate::spells::{Domain, SpellId, SpellSchool};
use crate::structs::{Ability, Discovery, DraconicHeritage, GrandDiscovery, MobVnum, Stat};
use crate::Game;

/* premade builds stop here, the player levels by hand afterwards */
pub const PREMADE_MAX_LEVEL: u8 = 20;

/* levels at which the build raises its key ability score */
pub const BOOST_LEVELS: [u8; 5] = [4, 8, 12, 16, 20];

const PREMADE_END_MESSG: &str = "\r\n\r\nPremade builds only go up to level 20.  From here on, you will need to use the gain \
command to specify the class you want to level up in, and manually choose your skills and \
feats and ability score boosts.  You can respec if you like to create a custom build from \
level one as well.\r\n\r\n";

const PREMADE_ERROR_MESSG: &str = "ERROR.  Please inform staff, error code PREBLD001.\r\n";

/* one step of a premade build */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Grant {
    Feat(FeatId),
    CombatFeat(FeatId, WeaponFamily),
    SchoolFeat(FeatId, SpellSchool),
    /* only for human characters */
    HumanFeat(FeatId),
    /* granted without telling the player */
    SilentFeat(FeatId),
    Familiar(MobVnum),
    /* the companion's vnum and what the player is told it is */
    Companion(MobVnum, &'static str),
    FavoredEnemy(usize, RaceType),
    Domains(Domain, Domain),
    DomainSpells,
    DomainFeats,
    /* red for evil sorcerers, gold for everyone else */
    DraconicBloodline,
    Spell(SpellId),
    AlignedSpell { evil: SpellId, other: SpellId },
    Discovery(Discovery),
    GrandDiscovery(GrandDiscovery),
}

impl Grant {
    /* spells and discoveries are handed out after the skills */
    fn after_skills(&self) -> bool {
        matches!(
            self,
            Grant::Spell(_) | Grant::AlignedSpell { .. } | Grant::Discovery(_) | Grant::GrandDiscovery(_)
        )
    }
}

pub struct ClassBuild {
    pub class: ClassId,
    /* STR, CON, INT, WIS, DEX, CHA at level 1, before racial modifiers */
    pub base_stats: [i32; 6],
    /* the score raised at each of BOOST_LEVELS */
    pub boosts: [Stat; 5],
    pub levels: &'static [(u8, &'static [Grant])],
    /* skills raised every level */
    pub skills: &'static [Ability],
    pub human_skill: Ability,
    /* skills raised once the class level reaches the given level */
    pub gated_skills: &'static [(Ability, u8)],
}

impl ClassBuild {
    pub fn grants(&self, level: u8) -> &'static [Grant] {
        self.levels
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, g)| *g)
            .unwrap_or(&[])
    }
}

pub fn premade_grants(builds: &[ClassBuild], class: ClassId, level: u8) -> Option<&'static [Grant]> {
    if level == 0 || level > PREMADE_MAX_LEVEL {
        return None;
    }
    builds.iter().find(|b| b.class == class).map(|b| b.grants(level))
}

use Ability as Ab;
use FeatId::*;
use Grant::*;
use SpellId as Sp;
use Stat::{Cha, Int, Str, Wis};
use WeaponFamily::{Axe, Hammer, HeavyBlade, LightBlade, Monk};

pub static PREMADE_BUILDS: [ClassBuild; 12] = [
    ClassBuild {
        class: ClassId::Warrior,
        base_stats: [16, 16, 14, 10, 14, 8],
        boosts: [Str; 5],
        levels: &[
            (1, &[CombatFeat(WeaponFocus, HeavyBlade), Feat(LuckOfHeroes), HumanFeat(GreatFortitude)]),
            (2, &[Feat(PowerAttack)]),
            (3, &[Feat(Toughness)]),
            (4, &[CombatFeat(WeaponSpecialization, HeavyBlade)]),
            (6, &[Feat(LightningReflexes), Feat(Dodge)]),
            (8, &[CombatFeat(ImprovedCritical, HeavyBlade)]),
            (9, &[CombatFeat(PowerCritical, HeavyBlade)]),
            (10, &[CombatFeat(GreaterWeaponFocus, HeavyBlade)]),
            (12, &[Feat(FastHealer), Feat(ArmorSpecializationHeavy)]),
            (14, &[CombatFeat(GreaterWeaponSpecialization, HeavyBlade)]),
            (15, &[Feat(Mobility)]),
            (16, &[Feat(SpringAttack)]),
            (18, &[Feat(IronWill), Feat(CombatExpertise)]),
            (20, &[Feat(WhirlwindAttack)]),
        ],
        skills: &[Ab::Heal, Ab::Lore, Ab::Intimidate, Ab::Discipline],
        human_skill: Ab::TotalDefense,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Rogue,
        base_stats: [14, 10, 12, 12, 18, 8],
        boosts: [Stat::Dex; 5],
        levels: &[
            (1, &[Feat(TwoWeaponFighting), HumanFeat(Dodge)]),
            (3, &[CombatFeat(WeaponFocus, LightBlade)]),
            (6, &[Feat(ImprovedTwoWeaponFighting)]),
            (9, &[Feat(LuckOfHeroes)]),
            (12, &[Feat(GreaterTwoWeaponFighting)]),
            (15, &[Feat(Mobility)]),
            (18, &[Feat(SpringAttack)]),
        ],
        skills: &[
            Ab::Heal,
            Ab::Lore,
            Ab::Acrobatics,
            Ab::Bluff,
            Ab::DisableDevice,
            Ab::Perception,
            Ab::Stealth,
            Ab::SleightOfHand,
            Ab::Appraise,
        ],
        human_skill: Ab::Ride,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Monk,
        base_stats: [14, 10, 10, 16, 16, 8],
        boosts: [Wis; 5],
        levels: &[
            (1, &[Feat(LuckOfHeroes), HumanFeat(Toughness)]),
            (3, &[CombatFeat(WeaponFocus, Monk)]),
            (6, &[CombatFeat(PowerCritical, Monk)]),
            (9, &[Feat(PowerAttack)]),
            (12, &[CombatFeat(ImprovedCritical, Monk)]),
            (15, &[Feat(FastHealer)]),
            (18, &[Feat(Dodge)]),
        ],
        skills: &[Ab::Heal, Ab::Lore, Ab::Acrobatics, Ab::Discipline],
        human_skill: Ab::Swim,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Cleric,
        base_stats: [14, 12, 12, 16, 14, 8],
        boosts: [Wis, Wis, Wis, Str, Str],
        levels: &[
            (
                1,
                &[
                    Feat(LuckOfHeroes),
                    HumanFeat(Toughness),
                    Domains(Domain::War, Domain::Healing),
                    DomainSpells,
                    DomainFeats,
                ],
            ),
            (3, &[Feat(QuickChant)]),
            (6, &[Feat(FasterMemorization)]),
            (9, &[CombatFeat(WeaponFocus, Hammer)]),
            (12, &[CombatFeat(ImprovedCritical, Hammer)]),
            (15, &[CombatFeat(PowerCritical, Hammer)]),
            (18, &[Feat(PowerAttack)]),
        ],
        skills: &[Ab::Lore, Ab::Spellcraft, Ab::Concentration],
        human_skill: Ab::Heal,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Berserker,
        base_stats: [16, 16, 13, 8, 13, 8],
        boosts: [Str; 5],
        levels: &[
            (1, &[Feat(PowerAttack), HumanFeat(LuckOfHeroes)]),
            (3, &[Feat(Dodge)]),
            (6, &[Feat(Mobility)]),
            (9, &[CombatFeat(ImprovedCritical, Axe)]),
            (12, &[Feat(SpringAttack)]),
            (15, &[Feat(CombatExpertise)]),
            (18, &[Feat(WhirlwindAttack)]),
        ],
        skills: &[Ab::Heal, Ab::Lore, Ab::Discipline, Ab::Intimidate, Ab::Swim],
        human_skill: Ab::Climb,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Wizard,
        base_stats: [10, 14, 17, 11, 14, 8],
        boosts: [Int; 5],
        levels: &[
            (1, &[Feat(FasterMemorization), HumanFeat(LuckOfHeroes), Familiar(85)]),
            (3, &[Feat(CombatCasting)]),
            (5, &[Feat(EnhancedSpellDamage)]),
            (6, &[Feat(SpellPenetration)]),
            (9, &[SchoolFeat(SpellFocus, SpellSchool::Evocation)]),
            (10, &[Feat(MaximizeSpell)]),
            (12, &[Feat(GreaterSpellPenetration)]),
            (15, &[SchoolFeat(GreaterSpellFocus, SpellSchool::Evocation)]),
            (18, &[Feat(Toughness)]),
            (20, &[Feat(ImprovedFamiliar)]),
        ],
        skills: &[
            Ab::Heal,
            Ab::Lore,
            Ab::Discipline,
            Ab::Spellcraft,
            Ab::Concentration,
            Ab::Appraise,
        ],
        human_skill: Ab::SenseMotive,
        gated_skills: &[(Ab::UseMagicDevice, 4), (Ab::Swim, 12), (Ab::Ride, 20)],
    },
    ClassBuild {
        class: ClassId::Sorcerer,
        base_stats: [10, 12, 12, 8, 16, 16],
        boosts: [Cha; 5],
        levels: &[
            (
                1,
                &[
                    Feat(FasterMemorization),
                    HumanFeat(LuckOfHeroes),
                    Familiar(87),
                    SilentFeat(SorcererBloodlineDraconic),
                    SilentFeat(DraconicHeritageClaws),
                    SilentFeat(DraconicBloodlineArcana),
                    DraconicBloodline,
                    Spell(Sp::MagicMissile),
                    Spell(Sp::MageArmor),
                ],
            ),
            (2, &[Spell(Sp::Shield)]),
            (3, &[Feat(CombatCasting), Spell(Sp::BurningHands), Spell(Sp::Identify)]),
            (4, &[Spell(Sp::ScorchingRay), Spell(Sp::MirrorImage)]),
            (5, &[Feat(EnhancedSpellDamage), Spell(Sp::ExpeditiousRetreat), Spell(Sp::Blur)]),
            (6, &[Feat(SpellPenetration), Spell(Sp::Fireball), Spell(Sp::Haste)]),
            (7, &[Spell(Sp::ShelgarnsBlade), Spell(Sp::Grace), Spell(Sp::Charisma)]),
            (8, &[Spell(Sp::Stoneskin)]),
            (
                9,
                &[
                    SchoolFeat(SpellFocus, SpellSchool::Evocation),
                    Spell(Sp::PhantomSteed),
                    Spell(Sp::FireShield),
                    Spell(Sp::GreaterInvis),
                ],
            ),
            (10, &[Feat(MaximizeSpell), Spell(Sp::Strength), Spell(Sp::Firebrand)]),
            (
                11,
                &[
                    Spell(Sp::Endurance),
                    Spell(Sp::Heroism),
                    Spell(Sp::MinorGlobe),
                    Spell(Sp::ConeOfCold),
                ],
            ),
            (12, &[Feat(GreaterSpellPenetration), Spell(Sp::GreaterMirrorImage)]),
            (13, &[Spell(Sp::IceStorm), Spell(Sp::FaithfulHound), Spell(Sp::FreezingSphere)]),
            (14, &[Spell(Sp::MissileStorm)]),
            (
                15,
                &[
                    SchoolFeat(GreaterSpellFocus, SpellSchool::Evocation),
                    Spell(Sp::BallOfLightning),
                    Spell(Sp::Transformation),
                    Spell(Sp::Displacement),
                ],
            ),
            (16, &[Spell(Sp::Sunburst)]),
            (
                17,
                &[
                    Spell(Sp::EnchantWeapon),
                    Spell(Sp::HorridWilting),
                    Spell(Sp::PrismaticSpray),
                    Spell(Sp::Feeblemind),
                ],
            ),
            (18, &[Feat(Toughness), Spell(Sp::MeteorSwarm), Spell(Sp::ChainLightning)]),
            (19, &[Spell(Sp::Ironskin), Spell(Sp::Gate)]),
            (20, &[Feat(ImprovedFamiliar), Spell(Sp::SummonCreature9)]),
        ],
        skills: &[Ab::Heal, Ab::Lore, Ab::Spellcraft, Ab::Concentration],
        human_skill: Ab::Appraise,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Paladin,
        base_stats: [16, 12, 10, 12, 12, 14],
        boosts: [Wis, Wis, Str, Str, Str],
        levels: &[
            (1, &[CombatFeat(WeaponFocus, HeavyBlade), HumanFeat(Toughness)]),
            (3, &[Feat(LuckOfHeroes)]),
            (6, &[Feat(PowerAttack)]),
            (9, &[CombatFeat(ImprovedCritical, HeavyBlade)]),
            (12, &[Feat(ArmorSpecializationHeavy)]),
            (15, &[Feat(ExoticWeaponProficiency)]),
            (18, &[Feat(ArmorProficiencyTowerShield)]),
        ],
        skills: &[Ab::Ride, Ab::Lore],
        human_skill: Ab::Heal,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Druid,
        base_stats: [16, 12, 12, 16, 12, 8],
        boosts: [Wis; 5],
        levels: &[
            (1, &[Feat(FasterMemorization), HumanFeat(Toughness), Companion(62, "lion")]),
            (3, &[Feat(QuickChant)]),
            (6, &[Feat(NaturalSpell)]),
            (9, &[Feat(LuckOfHeroes)]),
            (12, &[Feat(TwoWeaponFighting)]),
            (15, &[Feat(ArmorSpecializationMedium)]),
            (18, &[Feat(EnhancedSpellDamage)]),
        ],
        skills: &[
            Ab::Spellcraft,
            Ab::Lore,
            Ab::Survival,
            Ab::HandleAnimal,
            Ab::Concentration,
        ],
        human_skill: Ab::Heal,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Ranger,
        base_stats: [14, 12, 12, 16, 12, 8],
        boosts: [Str; 5],
        levels: &[
            (
                1,
                &[
                    CombatFeat(WeaponFocus, LightBlade),
                    HumanFeat(Toughness),
                    Companion(65, "snow leopard"),
                    FavoredEnemy(0, RaceType::Humanoid),
                ],
            ),
            (3, &[Feat(LuckOfHeroes)]),
            (5, &[FavoredEnemy(1, RaceType::Animal)]),
            (6, &[Feat(PowerAttack)]),
            (9, &[CombatFeat(ImprovedCritical, LightBlade)]),
            (10, &[FavoredEnemy(2, RaceType::MonstrousHumanoid)]),
            (12, &[Feat(ArmorSpecializationLight)]),
            (15, &[CombatFeat(PowerCritical, LightBlade), FavoredEnemy(3, RaceType::Undead)]),
            (18, &[Feat(Dodge)]),
            (20, &[FavoredEnemy(4, RaceType::Outsider)]),
        ],
        skills: &[Ab::Heal, Ab::Lore, Ab::Survival, Ab::Discipline],
        human_skill: Ab::HandleAnimal,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Bard,
        base_stats: [14, 10, 10, 8, 16, 16],
        boosts: [Cha; 5],
        levels: &[
            (1, &[Feat(EfficientPerformance), HumanFeat(ArmoredSpellcasting)]),
            (3, &[Feat(TwoWeaponFighting), Spell(Sp::CureLight), Spell(Sp::Shield)]),
            (4, &[Spell(Sp::MagicMissile)]),
            (5, &[Spell(Sp::Grace), Spell(Sp::MirrorImage)]),
            (
                6,
                &[
                    CombatFeat(WeaponFocus, LightBlade),
                    Spell(Sp::HorizikaulsBoom),
                    Spell(Sp::Strength),
                ],
            ),
            (7, &[Spell(Sp::Charisma)]),
            (8, &[Spell(Sp::Haste)]),
            (9, &[Feat(LuckOfHeroes), Spell(Sp::LightningBolt)]),
            (11, &[Spell(Sp::CureSerious), Spell(Sp::GreaterInvis), Spell(Sp::IceStorm)]),
            (12, &[Feat(LingeringSong), Spell(Sp::CureCritic)]),
            (
                14,
                &[
                    Spell(Sp::RemoveCurse),
                    Spell(Sp::AcidSheath),
                    Spell(Sp::ConeOfCold),
                    Spell(Sp::MassCureLight),
                ],
            ),
            (15, &[CombatFeat(ImprovedCritical, LightBlade)]),
            (16, &[Spell(Sp::EndureElements), Spell(Sp::MindFog)]),
            (
                17,
                &[
                    Spell(Sp::Stoneskin),
                    Spell(Sp::GreaterHeroism),
                    Spell(Sp::DetectInvis),
                    Spell(Sp::FreezingSphere),
                ],
            ),
            (
                18,
                &[
                    Feat(ArmorSpecializationLight),
                    AlignedSpell {
                        evil: Sp::CircleAgainstGood,
                        other: Sp::CircleAgainstEvil,
                    },
                ],
            ),
            (19, &[Spell(Sp::RainbowPattern), Spell(Sp::MassCureModerate)]),
            (20, &[Spell(Sp::Nightmare)]),
        ],
        skills: &[
            Ab::Heal,
            Ab::Lore,
            Ab::Perform,
            Ab::Spellcraft,
            Ab::Concentration,
            Ab::UseMagicDevice,
        ],
        human_skill: Ab::Appraise,
        gated_skills: &[],
    },
    ClassBuild {
        class: ClassId::Alchemist,
        base_stats: [16, 12, 16, 8, 14, 8],
        boosts: [Int; 5],
        levels: &[
            (1, &[Feat(LuckOfHeroes), HumanFeat(Toughness)]),
            (2, &[Discovery(crate::structs::Discovery::FireBrand)]),
            (3, &[CombatFeat(WeaponFocus, HeavyBlade)]),
            (4, &[Discovery(crate::structs::Discovery::PsychokineticTincture)]),
            (6, &[Feat(PowerAttack), Discovery(crate::structs::Discovery::VestigialArm)]),
            (8, &[Discovery(crate::structs::Discovery::FastBombs)]),
            (9, &[Feat(FastHealer)]),
            (10, &[Discovery(crate::structs::Discovery::GreaterMutagen)]),
            (
                12,
                &[
                    CombatFeat(ImprovedCritical, HeavyBlade),
                    Discovery(crate::structs::Discovery::BlindingBombs),
                ],
            ),
            (14, &[Discovery(crate::structs::Discovery::SunlightBombs)]),
            (15, &[Feat(QuickChant)]),
            (16, &[Discovery(crate::structs::Discovery::StickyBombs)]),
            (
                18,
                &[
                    Feat(ArmorSpecializationLight),
                    Discovery(crate::structs::Discovery::HealingBombs),
                ],
            ),
            (
                20,
                &[
                    Discovery(crate::structs::Discovery::Infusion),
                    GrandDiscovery(crate::structs::GrandDiscovery::TrueMutagen),
                ],
            ),
        ],
        skills: &[
            Ab::Heal,
            Ab::Lore,
            Ab::DisableDevice,
            Ab::SleightOfHand,
            Ab::Discipline,
            Ab::Appraise,
            Ab::UseMagicDevice,
        ],
        human_skill: Ab::Perception,
        gated_skills: &[(Ab::Survival, 8), (Ab::SenseMotive, 16)],
    },
];

/* catches table mistakes before anything about the character changes */
fn validate_grant(db: &DB, class: ClassId, grant: &Grant) -> MudResult<()> {
    let feat_kind_ok = |feat: FeatId, kind: FeatKind| {
        if feat.info().kind == kind {
            Ok(())
        } else {
            Err(MudError::ConfigMissing(format!("premade feat {} has the wrong kind", feat.name())))
        }
    };
    match *grant {
        Grant::Feat(feat) | Grant::HumanFeat(feat) | Grant::SilentFeat(feat) => {
            feat_kind_ok(feat, FeatKind::Plain)
        }
        Grant::CombatFeat(feat, _) => feat_kind_ok(feat, FeatKind::Combat),
        Grant::SchoolFeat(feat, _) => feat_kind_ok(feat, FeatKind::School),
        Grant::Familiar(vnum) | Grant::Companion(vnum, _) => {
            if db.mob_protos.contains_key(&vnum) {
                Ok(())
            } else {
                Err(MudError::ConfigMissing(format!("premade pet mobile {}", vnum)))
            }
        }
        Grant::Spell(spell) => spell_ok(class, spell),
        Grant::AlignedSpell { evil, other } => spell_ok(class, evil).and(spell_ok(class, other)),
        _ => Ok(()),
    }
}

fn spell_ok(class: ClassId, spell: SpellId) -> MudResult<()> {
    match spell.info().circle(class) {
        Some(_) => Ok(()),
        None => Err(MudError::ConfigMissing(format!(
            "premade spell {} is not a {} spell",
            spell.name(),
            class.name()
        ))),
    }
}

/* hand out one grant, queueing what the player should be told */
fn apply_grant(
    db: &mut DB,
    chid: DepotId,
    class: ClassId,
    grant: &Grant,
    msgs: &mut Vec<String>,
) -> MudResult<()> {
    let (human, evil) = {
        let ch = db.get_character(chid)?;
        (ch.race == Some(RaceId::Human), ch.is_evil())
    };
    match *grant {
        Grant::Feat(feat) => {
            if db.grant_feat(chid, feat, None)? {
                msgs.push(format!("You have learned the {} feat.\r\n", feat.name()));
            }
        }
        Grant::HumanFeat(feat) => {
            if human && db.grant_feat(chid, feat, None)? {
                msgs.push(format!("You have learned the {} feat.\r\n", feat.name()));
            }
        }
        Grant::SilentFeat(feat) => {
            db.grant_feat(chid, feat, None)?;
        }
        Grant::CombatFeat(feat, family) => {
            if db.grant_feat(chid, feat, Some(SubChoice::Weapon(family)))? {
                msgs.push(format!(
                    "You have learned the {} ({}) feat.\r\n",
                    feat.name(),
                    family.name()
                ));
            }
        }
        Grant::SchoolFeat(feat, school) => {
            if db.grant_feat(chid, feat, Some(SubChoice::School(school)))? {
                msgs.push(format!(
                    "You have learned the {} ({}) feat.\r\n",
                    feat.name(),
                    school.name()
                ));
            }
        }
        Grant::Familiar(vnum) => {
            db.set_familiar(chid, vnum)?;
        }
        Grant::Companion(vnum, what) => {
            if db.set_animal_companion(chid, vnum)? {
                msgs.push(format!(
                    "You have a {} as your animal companion.  Type 'group new' and then 'call companion' to use your companion.\r\n",
                    what
                ));
            }
        }
        Grant::FavoredEnemy(slot, race) => {
            if db.set_favored_enemy(chid, slot, race)? {
                msgs.push(format!(
                    "You have added a new favored enemy of type: {}.\r\n",
                    race.name()
                ));
            }
        }
        Grant::Domains(first, second) => {
            db.set_domains(chid, first, second)?;
        }
        Grant::DomainSpells => {
            db.assign_class_domain_spells(chid)?;
        }
        Grant::DomainFeats => {
            db.assign_domain_feats(chid)?;
        }
        Grant::DraconicBloodline => {
            let heritage = if evil {
                DraconicHeritage::Red
            } else {
                DraconicHeritage::Gold
            };
            db.set_bloodline(chid, heritage)?;
        }
        Grant::Spell(spell) => {
            db.learn_spell(chid, class, spell)?;
        }
        Grant::AlignedSpell { evil: for_evil, other } => {
            db.learn_spell(chid, class, if evil { for_evil } else { other })?;
        }
        Grant::Discovery(discovery) => {
            if db.learn_discovery(chid, discovery)? {
                msgs.push(format!(
                    "You have learned the '{}' alchemist discovery!\r\n",
                    discovery.name()
                ));
            }
        }
        Grant::GrandDiscovery(grand) => {
            if db.set_grand_discovery(chid, grand)? {
                msgs.push(format!(
                    "You have learned the '{}' alchemist grand discovery!\r\n",
                    grand.name()
                ));
            }
        }
    }
    Ok(())
}

fn set_premade_stats(db: &mut DB, chid: DepotId, build: &ClassBuild, level: u8) -> MudResult<()> {
    if level == 1 {
        let mods = db
            .get_character(chid)?
            .race
            .map(|r| r.info().ability_mods)
            .unwrap_or([0; 6]);
        for stat in Stat::ALL {
            let i = stat as usize;
            db.set_base_ability_score(chid, stat, build.base_stats[i] + mods[i])?;
        }
    } else if let Some(i) = BOOST_LEVELS.iter().position(|l| *l == level) {
        let stat = build.boosts[i];
        let score = db.get_character(chid)?.real_abils.get(stat);
        db.set_base_ability_score(chid, stat, score + 1)?;
    }
    Ok(())
}

fn increase_skills(
    db: &mut DB,
    chid: DepotId,
    build: &ClassBuild,
    level: u8,
    msgs: &mut Vec<String>,
) -> MudResult<()> {
    let amount = if level == 1 { 4 } else { 1 };
    let human = db.get_character(chid)?.race == Some(RaceId::Human);
    let mut skills: Vec<Ability> = build.skills.to_vec();
    if human {
        skills.push(build.human_skill);
    }
    skills.extend(
        build
            .gated_skills
            .iter()
            .filter(|(_, min)| level >= *min)
            .map(|(a, _)| *a),
    );
    for skill in skills {
        db.grant_ability_rank(chid, skill, amount)?;
        msgs.push(format!(
            "You have improved your {} skill by {}.\r\n",
            skill.name(),
            amount
        ));
    }
    Ok(())
}

/* what a premade build resets before each level it hands out */
fn setup_premade_levelup(db: &mut DB, chid: DepotId, class: ClassId) -> MudResult<()> {
    let p = db
        .get_character_mut(chid)?
        .player_mut()
        .ok_or_else(|| MudError::invalid("Mobiles don't have builds."))?;
    p.feat_points = 0;
    p.class_feats.insert(class, 0);
    p.epic_feat_points = 0;
    p.epic_class_feats.insert(class, 0);
    p.practices = 0;
    p.trains = 0;
    p.boosts = 0;
    Ok(())
}

impl Game {
    /*
     * Hands out everything the premade build of the character's class gives
     * at its current class level.  All grants are checked first, then
     * applied, then the player is told, then the character is saved.
     */
    pub fn advance_premade_build(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        let result = self.premade_levelup(db, chid);
        if let Err(MudError::ConfigMissing(what)) = &result {
            error!("SYSERR: premade build for {}: {}", chid, what);
            if let Ok(ch) = db.get_character(chid) {
                self.send_to_char(ch, PREMADE_ERROR_MESSG);
            }
        }
        result
    }

    fn premade_levelup(&mut self, db: &mut DB, chid: DepotId) -> MudResult<()> {
        let ch = db.get_character(chid)?;
        let class = ch
            .player()
            .ok_or_else(|| MudError::invalid("Mobiles don't have builds."))?
            .premade_class
            .ok_or_else(|| MudError::invalid("You are not following a premade build."))?;
        let level = ch.class_level(class);

        let builds = db.builds;
        let build = builds
            .iter()
            .find(|b| b.class == class)
            .ok_or_else(|| MudError::ConfigMissing(format!("no premade build for {}", class.name())))?;
        let grants = premade_grants(builds, class, level).ok_or_else(|| {
            MudError::ConfigMissing(format!("no premade {} build for level {}", class.name(), level))
        })?;
        for grant in grants {
            validate_grant(db, class, grant)?;
        }

        let mut msgs = vec![];
        setup_premade_levelup(db, chid, class)?;
        set_premade_stats(db, chid, build, level)?;
        for grant in grants.iter().filter(|g| !g.after_skills()) {
            apply_grant(db, chid, class, grant, &mut msgs)?;
        }
        increase_skills(db, chid, build, level, &mut msgs)?;
        for grant in grants.iter().filter(|g| g.after_skills()) {
            apply_grant(db, chid, class, grant, &mut msgs)?;
        }

        msgs.push(format!("\r\nYou are now a level {} {}!\r\n", level, class.name()));
        if level >= PREMADE_MAX_LEVEL {
            msgs.push(PREMADE_END_MESSG.to_string());
            if let Some(p) = db.get_character_mut(chid)?.player_mut() {
                p.premade_class = None;
            }
        }

        let ch = db.get_character(chid)?;
        for msg in &msgs {
            self.send_to_char(ch, msg);
        }
        self.save_char(db, chid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::spells::SpellSchool;

    fn premade_player(db: &mut DB, race: RaceId, class: ClassId) -> DepotId {
        let chid = db.new_player("Premade");
        let ch = db.chars.get_mut(chid).unwrap();
        ch.race = Some(race);
        ch.class_levels.insert(class, 1);
        ch.player_mut().unwrap().premade_class = Some(class);
        chid
    }

    fn level_to(game: &mut Game, db: &mut DB, chid: DepotId, class: ClassId, level: u8) {
        for l in 1..=level {
            db.chars.get_mut(chid).unwrap().class_levels.insert(class, l);
            game.advance_premade_build(db, chid).unwrap();
        }
    }

    #[test]
    fn every_class_has_a_build() {
        for class in ClassId::ALL {
            assert!(PREMADE_BUILDS.iter().any(|b| b.class == class), "{:?}", class);
        }
    }

    #[test]
    fn build_tables_only_name_valid_grants() {
        let db = DB::test_world();
        for build in PREMADE_BUILDS.iter() {
            for level in 1..=PREMADE_MAX_LEVEL {
                for grant in build.grants(level) {
                    validate_grant(&db, build.class, grant).unwrap();
                }
            }
        }
    }

    #[test]
    fn warrior_level_one_uses_the_base_array() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Halfling, ClassId::Warrior);
        game.advance_premade_build(&mut db, chid).unwrap();

        let mods = RaceId::Halfling.info().ability_mods;
        let ch = db.chars.get(chid).unwrap();
        let expected: Vec<i32> = [16, 16, 14, 10, 14, 8]
            .iter()
            .zip(mods.iter())
            .map(|(b, m)| b + m)
            .collect();
        assert_eq!(ch.real_abils.scores().to_vec(), expected);
        assert!(ch.feats.has_combat_feat(FeatId::WeaponFocus, WeaponFamily::HeavyBlade));
        assert!(ch.feats.has_feat(FeatId::LuckOfHeroes));
        /* the human bonus feat and skill are not for halflings */
        assert!(!ch.feats.has_feat(FeatId::GreatFortitude));
        assert_eq!(ch.abilities.get(&Ability::Heal), Some(&4));
        assert_eq!(ch.abilities.get(&Ability::TotalDefense), None);
        let p = ch.player().unwrap();
        assert_eq!((p.practices, p.trains, p.feat_points), (0, 0, 0));
    }

    #[test]
    fn humans_get_the_bonus_feat_and_skill() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Human, ClassId::Warrior);
        game.advance_premade_build(&mut db, chid).unwrap();
        let ch = db.chars.get(chid).unwrap();
        assert!(ch.feats.has_feat(FeatId::GreatFortitude));
        assert_eq!(ch.abilities.get(&Ability::TotalDefense), Some(&4));
    }

    #[test]
    fn boost_levels_raise_the_key_score() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Human, ClassId::Cleric);
        let wis_at_1 = {
            game.advance_premade_build(&mut db, chid).unwrap();
            db.chars.get(chid).unwrap().real_abils.get(Stat::Wis)
        };
        level_to(&mut game, &mut db, chid, ClassId::Cleric, 16);
        let ch = db.chars.get(chid).unwrap();
        /* levels 4, 8 and 12 raise wisdom, 16 raises strength */
        assert_eq!(ch.real_abils.get(Stat::Wis), wis_at_1 + 3);
        assert!(ch.feats.has_feat(FeatId::WarDomainWeaponFocus));
        assert!(ch.player().unwrap().spells_known[&ClassId::Cleric].contains(&SpellId::Heal));
    }

    #[test]
    fn sorcerer_build_learns_spells_and_bloodline() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Elf, ClassId::Sorcerer);
        db.chars.get_mut(chid).unwrap().alignment = -500;
        level_to(&mut game, &mut db, chid, ClassId::Sorcerer, 6);
        let ch = db.chars.get(chid).unwrap();
        let p = ch.player().unwrap();
        let known = &p.spells_known[&ClassId::Sorcerer];
        assert!(known.contains(&SpellId::MagicMissile));
        assert!(known.contains(&SpellId::Fireball));
        assert!(!known.contains(&SpellId::ShelgarnsBlade));
        assert_eq!(p.familiar, Some(87));
        assert_eq!(p.bloodline, Some(DraconicHeritage::Red));
        assert!(ch.feats.has_feat(FeatId::DraconicHeritageClaws));
    }

    #[test]
    fn premade_path_ends_at_level_twenty() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Dwarf, ClassId::Alchemist);
        level_to(&mut game, &mut db, chid, ClassId::Alchemist, 20);
        let ch = db.chars.get(chid).unwrap();
        let p = ch.player().unwrap();
        assert_eq!(p.premade_class, None);
        assert_eq!(p.grand_discovery, Some(GrandDiscovery::TrueMutagen));
        assert_eq!(p.discoveries.len(), 10);
        assert!(ch.feats.has_combat_feat(FeatId::ImprovedCritical, WeaponFamily::HeavyBlade));
        assert!(!ch.feats.has_school_feat(FeatId::SpellFocus, SpellSchool::Evocation));
    }

    #[test]
    fn missing_build_is_reported_as_config_missing() {
        static ONLY_WARRIOR: [ClassBuild; 0] = [];
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        db.builds = &ONLY_WARRIOR;
        let chid = premade_player(&mut db, RaceId::Human, ClassId::Monk);
        assert!(matches!(
            game.advance_premade_build(&mut db, chid),
            Err(MudError::ConfigMissing(_))
        ));
        assert!(db.chars.get(chid).unwrap().feats.known().next().is_none());
    }

    #[test]
    fn rerunning_a_level_grants_no_feat_twice() {
        let mut game = Game::new(Config::default());
        let mut db = DB::test_world();
        let chid = premade_player(&mut db, RaceId::Gnome, ClassId::Ranger);
        game.advance_premade_build(&mut db, chid).unwrap();
        let feats: Vec<_> = db.chars.get(chid).unwrap().feats.known().collect();
        game.advance_premade_build(&mut db, chid).unwrap();
        assert_eq!(db.chars.get(chid).unwrap().feats.known().collect::<Vec<_>>(), feats);
        let p = db.chars.get(chid).unwrap().player().unwrap();
        assert_eq!(p.favored_enemies[0], Some(RaceType::Humanoid));
        assert_eq!(p.animal_companion, Some(65));
    }
}
