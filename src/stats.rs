//! Character stat derivation.
//!
//! The portfolio front page presents the operator as an RPG character
//! sheet: six raw activity counts map through fixed threshold tables to
//! ability scores, and scores map to modifiers the usual tabletop way.
//! Everything here is pure; the counts come from
//! [`Database::character_counts`](crate::db::Database::character_counts).

use serde::{Deserialize, Serialize};

/// Raw activity counts feeding the six abilities.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterCounts {
    pub completed_quests: u32,
    /// Public achievement items count as unlocked.
    pub achievements: u32,
    pub devlogs: u32,
    /// Projects created within the last 365 days.
    pub projects_last_year: u32,
    pub abandoned_quests: u32,
    /// Projects carrying an external link.
    pub linked_projects: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Constitution => "constitution",
            Self::Intelligence => "intelligence",
            Self::Wisdom => "wisdom",
            Self::Charisma => "charisma",
        }
    }
}

/// (threshold, score) pairs. Scoring picks the last row whose threshold
/// does not exceed the raw count, so ascending tables reward higher
/// counts and the descending constitution table punishes them.
type Tiers = &'static [(u32, i32)];

/// Completed quests.
const STRENGTH_TIERS: Tiers = &[(0, 8), (1, 10), (3, 12), (5, 14), (10, 16), (20, 18), (40, 20)];
/// Projects created in the last year.
const DEXTERITY_TIERS: Tiers = &[(0, 8), (1, 10), (2, 12), (3, 14), (5, 16), (8, 18), (12, 20)];
/// Abandoned quests, inverted: more abandonment, lower score.
const CONSTITUTION_TIERS: Tiers = &[(0, 20), (1, 18), (2, 16), (4, 14), (6, 12), (10, 10), (15, 8)];
/// Devlogs written.
const INTELLIGENCE_TIERS: Tiers = &[(0, 8), (1, 10), (3, 12), (8, 14), (15, 16), (30, 18), (60, 20)];
/// Achievements unlocked.
const WISDOM_TIERS: Tiers = &[(0, 8), (1, 10), (3, 12), (6, 14), (10, 16), (15, 18), (25, 20)];
/// Projects with an external link.
const CHARISMA_TIERS: Tiers = &[(0, 8), (1, 10), (2, 12), (4, 14), (6, 16), (9, 18), (14, 20)];

fn tiers_for(ability: Ability) -> Tiers {
    match ability {
        Ability::Strength => STRENGTH_TIERS,
        Ability::Dexterity => DEXTERITY_TIERS,
        Ability::Constitution => CONSTITUTION_TIERS,
        Ability::Intelligence => INTELLIGENCE_TIERS,
        Ability::Wisdom => WISDOM_TIERS,
        Ability::Charisma => CHARISMA_TIERS,
    }
}

fn raw_for(ability: Ability, counts: &CharacterCounts) -> u32 {
    match ability {
        Ability::Strength => counts.completed_quests,
        Ability::Dexterity => counts.projects_last_year,
        Ability::Constitution => counts.abandoned_quests,
        Ability::Intelligence => counts.devlogs,
        Ability::Wisdom => counts.achievements,
        Ability::Charisma => counts.linked_projects,
    }
}

/// Map a raw count to its ability score: the score of the highest
/// threshold not exceeding the count. No interpolation between tiers.
pub fn ability_score(ability: Ability, raw: u32) -> i32 {
    let tiers = tiers_for(ability);
    let mut score = tiers[0].1;
    for &(threshold, tier_score) in tiers {
        if raw >= threshold {
            score = tier_score;
        } else {
            break;
        }
    }
    score
}

/// The tabletop modifier formula.
pub fn calculate_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Modifiers render with an explicit sign: `+2`, `+0`, `-1`.
pub fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}

/// One line of the character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityScore {
    pub ability: Ability,
    pub raw: u32,
    pub score: i32,
    pub modifier: i32,
    pub modifier_text: String,
}

/// The full derived character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub counts: CharacterCounts,
    pub abilities: Vec<AbilityScore>,
}

pub fn character_sheet(counts: CharacterCounts) -> CharacterSheet {
    let abilities = Ability::ALL
        .iter()
        .map(|&ability| {
            let raw = raw_for(ability, &counts);
            let score = ability_score(ability, raw);
            let modifier = calculate_modifier(score);
            AbilityScore {
                ability,
                raw,
                score,
                modifier,
                modifier_text: format_modifier(modifier),
            }
        })
        .collect();

    CharacterSheet { counts, abilities }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_pick_highest_applicable_tier() {
        assert_eq!(ability_score(Ability::Strength, 0), 8);
        assert_eq!(ability_score(Ability::Strength, 1), 10);
        assert_eq!(ability_score(Ability::Strength, 2), 10);
        assert_eq!(ability_score(Ability::Strength, 3), 12);
        assert_eq!(ability_score(Ability::Strength, 999), 20);
    }

    #[test]
    fn non_inverted_scores_are_monotonic() {
        for ability in [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ] {
            for raw in 0..100u32 {
                assert!(
                    ability_score(ability, raw + 1) >= ability_score(ability, raw),
                    "{:?} not monotonic at {}",
                    ability,
                    raw
                );
            }
        }
    }

    #[test]
    fn constitution_is_inverted() {
        for raw in 0..100u32 {
            assert!(ability_score(Ability::Constitution, raw + 1) <= ability_score(Ability::Constitution, raw));
        }
        assert_eq!(ability_score(Ability::Constitution, 0), 20);
        assert_eq!(ability_score(Ability::Constitution, 15), 8);
    }

    #[test]
    fn modifier_matches_tabletop_table() {
        // floor((score - 10) / 2) over the full sheet range
        let expected = [-1, -1, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5];
        for (i, score) in (8..=20).enumerate() {
            assert_eq!(calculate_modifier(score), expected[i], "score {}", score);
        }
    }

    #[test]
    fn modifier_formats_with_explicit_sign() {
        assert_eq!(format_modifier(2), "+2");
        assert_eq!(format_modifier(0), "+0");
        assert_eq!(format_modifier(-1), "-1");
    }

    #[test]
    fn sheet_covers_all_six_abilities() {
        let sheet = character_sheet(CharacterCounts {
            completed_quests: 5,
            achievements: 1,
            devlogs: 0,
            projects_last_year: 2,
            abandoned_quests: 1,
            linked_projects: 4,
        });
        assert_eq!(sheet.abilities.len(), 6);

        let strength = &sheet.abilities[0];
        assert_eq!(strength.score, 14);
        assert_eq!(strength.modifier, 2);
        assert_eq!(strength.modifier_text, "+2");

        let constitution = &sheet.abilities[2];
        assert_eq!(constitution.score, 18);
    }
}
