//! Finished battle records handed to the statistics layer

use usage_protocol::{GameType, Player};

use super::pokemon::PokemonInstance;

/// How a matchup between two simultaneously active Pokemon ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncounterOutcome {
    /// The subject fainted while the opponent was on the field
    KnockedOut,
    /// The subject left the field while the opponent stayed
    SwitchedOut,
    /// The opponent left the field first
    Neutral,
}

/// A closed matchup, from the point of view of its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encounter {
    /// Roster index on the subject's side
    pub subject: usize,
    /// Roster index on the opposing side
    pub opponent: usize,
    pub outcome: EncounterOutcome,
}

/// The side's first Pokemon sent out and the slot it went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lead {
    pub index: usize,
    pub slot: usize,
}

/// How the battle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `win` or `tie`; `winner` is `None` for a tie
    Completed { winner: Option<Player> },
    /// One player forfeited
    Forfeit { winner: Option<Player> },
    /// The announced winner matched neither side
    Unknown,
}

/// Everything observed about one side
#[derive(Debug, Clone, PartialEq)]
pub struct SideRecord {
    pub player: Player,
    pub username: Option<String>,
    pub rating: Option<i32>,
    /// Pokemon in first-seen order, at most six
    pub roster: Vec<PokemonInstance>,
    pub lead: Option<Lead>,
    pub encounters: Vec<Encounter>,
}

impl SideRecord {
    /// Distinct usage keys on this side, in roster order
    ///
    /// Two instances of the same forme count once.
    pub fn usage_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::with_capacity(self.roster.len());
        for poke in &self.roster {
            let key = poke.usage_key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// A fully replayed battle
#[derive(Debug, Clone, PartialEq)]
pub struct BattleRecord {
    /// Tier id from the `tier` line, if the log had one
    pub tier: Option<String>,
    pub game_type: GameType,
    /// Last turn number announced
    pub turns: u32,
    pub outcome: Outcome,
    /// p1 then p2
    pub sides: [SideRecord; 2],
}

impl BattleRecord {
    /// One side together with the roster it played against
    pub fn side(&self, player: Player) -> Option<SideView<'_>> {
        let (side, opponents) = match player {
            Player::P1 => (&self.sides[0], &self.sides[1]),
            Player::P2 => (&self.sides[1], &self.sides[0]),
            _ => return None,
        };
        Some(SideView {
            side,
            opponents: &opponents.roster,
        })
    }

    /// Both side views, p1 first
    pub fn side_views(&self) -> [SideView<'_>; 2] {
        [
            SideView {
                side: &self.sides[0],
                opponents: &self.sides[1].roster,
            },
            SideView {
                side: &self.sides[1],
                opponents: &self.sides[0].roster,
            },
        ]
    }
}

/// Read-only view of one side for folding into the aggregates
#[derive(Debug, Clone, Copy)]
pub struct SideView<'a> {
    pub side: &'a SideRecord,
    pub opponents: &'a [PokemonInstance],
}

impl<'a> SideView<'a> {
    pub fn player(&self) -> Player {
        self.side.player
    }

    pub fn rating(&self) -> Option<i32> {
        self.side.rating
    }

    pub fn roster(&self) -> &'a [PokemonInstance] {
        &self.side.roster
    }

    /// The lead Pokemon and its slot
    pub fn lead(&self) -> Option<(&'a PokemonInstance, usize)> {
        let lead = self.side.lead?;
        self.side.roster.get(lead.index).map(|poke| (poke, lead.slot))
    }

    /// Encounters resolved to (subject, opponent, outcome)
    ///
    /// Encounters whose indices don't resolve are skipped.
    pub fn encounters(
        &self,
    ) -> impl Iterator<Item = (&'a PokemonInstance, &'a PokemonInstance, EncounterOutcome)> + 'a
    {
        let roster = &self.side.roster;
        let opponents = self.opponents;
        self.side.encounters.iter().filter_map(move |e| {
            Some((roster.get(e.subject)?, opponents.get(e.opponent)?, e.outcome))
        })
    }
}
