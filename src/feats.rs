/* ************************************************************************
*   File: feats.rs                                      Part of CircleMUD *
*  Usage: Feat list, weapon families and per-character feat sets          *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::spells::{DamType, SpellSchool};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum FeatId {
    WeaponFocus,
    GreaterWeaponFocus,
    WeaponSpecialization,
    GreaterWeaponSpecialization,
    ImprovedCritical,
    PowerCritical,
    LuckOfHeroes,
    GreatFortitude,
    IronWill,
    LightningReflexes,
    PowerAttack,
    CombatExpertise,
    Toughness,
    Dodge,
    Mobility,
    SpringAttack,
    WhirlwindAttack,
    FastHealer,
    ImprovedInitiative,
    ArmorSpecializationLight,
    ArmorSpecializationMedium,
    ArmorSpecializationHeavy,
    ArmorProficiencyTowerShield,
    ExoticWeaponProficiency,
    MartialWeaponProficiency,
    TwoWeaponFighting,
    ImprovedTwoWeaponFighting,
    GreaterTwoWeaponFighting,
    QuickChant,
    FasterMemorization,
    CombatCasting,
    EnhancedSpellDamage,
    SpellPenetration,
    GreaterSpellPenetration,
    SpellFocus,
    GreaterSpellFocus,
    MaximizeSpell,
    ImprovedFamiliar,
    SorcererBloodlineDraconic,
    DraconicHeritageClaws,
    DraconicBloodlineArcana,
    NaturalSpell,
    EfficientPerformance,
    ArmoredSpellcasting,
    LingeringSong,
    /* granted by cleric domains */
    WarDomainWeaponFocus,
    HealingDomainEmpower,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum WeaponFamily {
    HeavyBlade,
    LightBlade,
    Axe,
    Hammer,
    Club,
    Flail,
    Pick,
    Polearm,
    Spear,
    Monk,
    Bow,
    Crossbow,
    Thrown,
    Whip,
    Double,
}

impl WeaponFamily {
    pub const ALL: [WeaponFamily; 15] = [
        WeaponFamily::HeavyBlade,
        WeaponFamily::LightBlade,
        WeaponFamily::Axe,
        WeaponFamily::Hammer,
        WeaponFamily::Club,
        WeaponFamily::Flail,
        WeaponFamily::Pick,
        WeaponFamily::Polearm,
        WeaponFamily::Spear,
        WeaponFamily::Monk,
        WeaponFamily::Bow,
        WeaponFamily::Crossbow,
        WeaponFamily::Thrown,
        WeaponFamily::Whip,
        WeaponFamily::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeaponFamily::HeavyBlade => "heavy blades",
            WeaponFamily::LightBlade => "light blades",
            WeaponFamily::Axe => "axes",
            WeaponFamily::Hammer => "hammers",
            WeaponFamily::Club => "clubs",
            WeaponFamily::Flail => "flails",
            WeaponFamily::Pick => "picks",
            WeaponFamily::Polearm => "polearms",
            WeaponFamily::Spear => "spears",
            WeaponFamily::Monk => "monk weapons",
            WeaponFamily::Bow => "bows",
            WeaponFamily::Crossbow => "crossbows",
            WeaponFamily::Thrown => "thrown weapons",
            WeaponFamily::Whip => "whips",
            WeaponFamily::Double => "double weapons",
        }
    }

    /* object value 2 of a weapon stores the family index */
    pub fn from_index(idx: i32) -> Option<WeaponFamily> {
        if idx < 0 {
            return None;
        }
        WeaponFamily::ALL.get(idx as usize).copied()
    }

    pub fn dam_type(self) -> DamType {
        match self {
            WeaponFamily::HeavyBlade | WeaponFamily::Axe | WeaponFamily::Whip => DamType::Slashing,
            WeaponFamily::LightBlade
            | WeaponFamily::Pick
            | WeaponFamily::Polearm
            | WeaponFamily::Spear
            | WeaponFamily::Bow
            | WeaponFamily::Crossbow
            | WeaponFamily::Thrown => DamType::Piercing,
            WeaponFamily::Hammer
            | WeaponFamily::Club
            | WeaponFamily::Flail
            | WeaponFamily::Monk
            | WeaponFamily::Double => DamType::Bludgeoning,
        }
    }
}

/* what a feat's sub-selection ranges over */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeatKind {
    Plain,
    Combat,
    School,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SubChoice {
    Weapon(WeaponFamily),
    School(SpellSchool),
}

pub struct FeatInfo {
    pub id: FeatId,
    pub name: &'static str,
    pub kind: FeatKind,
    pub description: &'static str,
}

macro_rules! feat {
    ($id:ident, $name:expr, $kind:ident, $desc:expr) => {
        FeatInfo {
            id: FeatId::$id,
            name: $name,
            kind: FeatKind::$kind,
            description: $desc,
        }
    };
}

pub static FEAT_LIST: [FeatInfo; 47] = [
    feat!(WeaponFocus, "weapon focus", Combat, "+1 to hit with the chosen weapon family"),
    feat!(GreaterWeaponFocus, "greater weapon focus", Combat, "an additional +1 to hit with the chosen weapon family"),
    feat!(WeaponSpecialization, "weapon specialization", Combat, "+2 damage with the chosen weapon family"),
    feat!(GreaterWeaponSpecialization, "greater weapon specialization", Combat, "an additional +2 damage with the chosen weapon family"),
    feat!(ImprovedCritical, "improved critical", Combat, "doubles the threat range of the chosen weapon family"),
    feat!(PowerCritical, "power critical", Combat, "+4 to confirm critical hits with the chosen weapon family"),
    feat!(LuckOfHeroes, "luck of heroes", Plain, "+1 luck bonus to armor class"),
    feat!(GreatFortitude, "great fortitude", Plain, "+2 to fortitude saves"),
    feat!(IronWill, "iron will", Plain, "+2 to will saves"),
    feat!(LightningReflexes, "lightning reflexes", Plain, "+2 to reflex saves"),
    feat!(PowerAttack, "power attack", Plain, "trade attack bonus for damage"),
    feat!(CombatExpertise, "combat expertise", Plain, "trade attack bonus for armor class"),
    feat!(Toughness, "toughness", Plain, "+1 hit point per level"),
    feat!(Dodge, "dodge", Plain, "+1 dodge bonus to armor class"),
    feat!(Mobility, "mobility", Plain, "+4 dodge bonus against attacks of opportunity"),
    feat!(SpringAttack, "spring attack", Plain, "move before and after an attack"),
    feat!(WhirlwindAttack, "whirlwind attack", Plain, "attack every opponent in reach"),
    feat!(FastHealer, "fast healer", Plain, "faster natural hit point regeneration"),
    feat!(ImprovedInitiative, "improved initiative", Plain, "+4 to initiative"),
    feat!(ArmorSpecializationLight, "armor specialization (light)", Plain, "damage reduction in light armor"),
    feat!(ArmorSpecializationMedium, "armor specialization (medium)", Plain, "damage reduction in medium armor"),
    feat!(ArmorSpecializationHeavy, "armor specialization (heavy)", Plain, "damage reduction in heavy armor"),
    feat!(ArmorProficiencyTowerShield, "armor proficiency (tower shield)", Plain, "use tower shields without penalty"),
    feat!(ExoticWeaponProficiency, "exotic weapon proficiency", Plain, "use exotic weapons without penalty"),
    feat!(MartialWeaponProficiency, "martial weapon proficiency", Plain, "use martial weapons without penalty"),
    feat!(TwoWeaponFighting, "two weapon fighting", Plain, "reduced penalties when fighting with two weapons"),
    feat!(ImprovedTwoWeaponFighting, "improved two weapon fighting", Plain, "an extra off-hand attack"),
    feat!(GreaterTwoWeaponFighting, "greater two weapon fighting", Plain, "a third off-hand attack"),
    feat!(QuickChant, "quick chant", Plain, "halves spell casting time"),
    feat!(FasterMemorization, "faster memorization", Plain, "recover spells faster"),
    feat!(CombatCasting, "combat casting", Plain, "+4 to concentration while casting in combat"),
    feat!(EnhancedSpellDamage, "enhanced spell damage", Plain, "+1 damage per damage die of spells"),
    feat!(SpellPenetration, "spell penetration", Plain, "+2 to overcome spell resistance"),
    feat!(GreaterSpellPenetration, "greater spell penetration", Plain, "an additional +2 to overcome spell resistance"),
    feat!(SpellFocus, "spell focus", School, "+1 to spell save DCs of the chosen school"),
    feat!(GreaterSpellFocus, "greater spell focus", School, "an additional +1 to spell save DCs of the chosen school"),
    feat!(MaximizeSpell, "maximize spell", Plain, "spells can be cast for maximum effect"),
    feat!(ImprovedFamiliar, "improved familiar", Plain, "a stronger familiar"),
    feat!(SorcererBloodlineDraconic, "sorcerer bloodline (draconic)", Plain, "draconic blood flows in your veins"),
    feat!(DraconicHeritageClaws, "draconic heritage claws", Plain, "claw attacks of your draconic heritage"),
    feat!(DraconicBloodlineArcana, "draconic bloodline arcana", Plain, "extra damage with spells of your heritage"),
    feat!(NaturalSpell, "natural spell", Plain, "cast spells while wild shaped"),
    feat!(EfficientPerformance, "efficient performance", Plain, "start performances faster"),
    feat!(ArmoredSpellcasting, "armored spellcasting", Plain, "reduced arcane spell failure in armor"),
    feat!(LingeringSong, "lingering song", Plain, "bardic songs last longer"),
    feat!(WarDomainWeaponFocus, "war domain weapon focus", Plain, "+1 to hit, granted by the war domain"),
    feat!(HealingDomainEmpower, "empowered healing", Plain, "healing spells restore more hit points"),
];

impl FeatId {
    pub fn info(self) -> &'static FeatInfo {
        &FEAT_LIST[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }
}

/*
 * Feats a character knows, with their rank, plus the sub-selections of the
 * feats that range over weapon families or spell schools.  A combat feat
 * can be known for several families at once.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharFeats {
    ranks: BTreeMap<FeatId, u8>,
    #[serde(default)]
    combat: BTreeMap<FeatId, BTreeSet<WeaponFamily>>,
    #[serde(default)]
    school: BTreeMap<FeatId, BTreeSet<SpellSchool>>,
}

impl CharFeats {
    pub fn has_feat(&self, feat: FeatId) -> bool {
        self.rank(feat) > 0
    }

    pub fn rank(&self, feat: FeatId) -> u8 {
        self.ranks.get(&feat).copied().unwrap_or(0)
    }

    /* returns false when nothing changed */
    pub fn set_feat(&mut self, feat: FeatId, rank: u8) -> bool {
        if rank == 0 {
            return self.ranks.remove(&feat).is_some();
        }
        self.ranks.insert(feat, rank) != Some(rank)
    }

    pub fn has_combat_feat(&self, feat: FeatId, family: WeaponFamily) -> bool {
        self.combat
            .get(&feat)
            .map_or(false, |set| set.contains(&family))
    }

    pub fn set_combat_feat(&mut self, feat: FeatId, family: WeaponFamily) -> bool {
        self.combat.entry(feat).or_default().insert(family)
    }

    pub fn has_school_feat(&self, feat: FeatId, school: SpellSchool) -> bool {
        self.school
            .get(&feat)
            .map_or(false, |set| set.contains(&school))
    }

    pub fn set_school_feat(&mut self, feat: FeatId, school: SpellSchool) -> bool {
        self.school.entry(feat).or_default().insert(school)
    }

    pub fn combat_choices(&self, feat: FeatId) -> Vec<WeaponFamily> {
        self.combat
            .get(&feat)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn school_choices(&self, feat: FeatId) -> Vec<SpellSchool> {
        self.school
            .get(&feat)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn known(&self) -> impl Iterator<Item = (FeatId, u8)> + '_ {
        self.ranks.iter().map(|(f, r)| (*f, *r))
    }

    pub fn clear(&mut self) {
        self.ranks.clear();
        self.combat.clear();
        self.school.clear();
    }
}

/* "heavy blades" style text for a feat and its sub-selections */
pub fn feat_display_name(feats: &CharFeats, feat: FeatId) -> String {
    match feat.info().kind {
        FeatKind::Plain => feat.name().to_string(),
        FeatKind::Combat => {
            let choices: Vec<_> = feats.combat_choices(feat).iter().map(|f| f.name()).collect();
            if choices.is_empty() {
                feat.name().to_string()
            } else {
                format!("{} ({})", feat.name(), choices.join(", "))
            }
        }
        FeatKind::School => {
            let choices: Vec<_> = feats.school_choices(feat).iter().map(|s| s.name()).collect();
            if choices.is_empty() {
                feat.name().to_string()
            } else {
                format!("{} ({})", feat.name(), choices.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feat_table_is_indexed_by_feat_id() {
        for (i, info) in FEAT_LIST.iter().enumerate() {
            assert_eq!(info.id as usize, i, "{} out of place", info.name);
        }
    }

    #[test]
    fn combat_feats_hold_several_families() {
        let mut feats = CharFeats::default();
        assert!(feats.set_feat(FeatId::WeaponFocus, 1));
        assert!(feats.set_combat_feat(FeatId::WeaponFocus, WeaponFamily::HeavyBlade));
        assert!(feats.set_combat_feat(FeatId::WeaponFocus, WeaponFamily::Axe));
        assert!(!feats.set_combat_feat(FeatId::WeaponFocus, WeaponFamily::Axe));
        assert!(!feats.set_feat(FeatId::WeaponFocus, 1));

        assert!(feats.has_combat_feat(FeatId::WeaponFocus, WeaponFamily::HeavyBlade));
        assert!(feats.has_combat_feat(FeatId::WeaponFocus, WeaponFamily::Axe));
        assert!(!feats.has_combat_feat(FeatId::WeaponFocus, WeaponFamily::Bow));
        assert!(!feats.has_combat_feat(FeatId::ImprovedCritical, WeaponFamily::Axe));
        assert_eq!(
            feat_display_name(&feats, FeatId::WeaponFocus),
            "weapon focus (heavy blades, axes)"
        );
    }

    #[test]
    fn school_feats_are_separate_from_combat_feats() {
        let mut feats = CharFeats::default();
        feats.set_school_feat(FeatId::SpellFocus, SpellSchool::Evocation);
        assert!(feats.has_school_feat(FeatId::SpellFocus, SpellSchool::Evocation));
        assert!(!feats.has_school_feat(FeatId::SpellFocus, SpellSchool::Illusion));
        assert!(feats.combat_choices(FeatId::SpellFocus).is_empty());
    }
}
