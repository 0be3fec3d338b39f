//! Update logic for applying BattleEvents to the replay state

use usage_protocol::{BattleEvent, DecodeError, DecodeErrorKind, PokemonRef, SpeciesRef};

use super::battle::{BattleTracker, OpenEncounter, Phase, side_index};
use crate::error::{StructuralError, TrackError};
use crate::types::{
    BattleRecord, Encounter, EncounterOutcome, Lead, Outcome, PokemonInstance,
};

impl BattleTracker {
    /// Apply one decoded event
    ///
    /// `line` is the event's line number, used to stamp errors. Once the
    /// battle has ended, unrecognized events are ignored and anything else is
    /// a malformed line.
    pub fn apply(&mut self, event: &BattleEvent, line: usize) -> Result<(), TrackError> {
        if self.phase == Phase::Ended {
            if event.is_recognized() {
                return Err(DecodeError::new(
                    line,
                    DecodeErrorKind::Malformed("event after battle end".to_string()),
                )
                .into());
            }
            return Ok(());
        }

        if !matches!(event, BattleEvent::Faint(_) | BattleEvent::Unrecognized(_)) {
            self.recent_faints.clear();
        }

        match event {
            // === Battle Initialization ===
            BattleEvent::RatingReport {
                player,
                username,
                rating,
            } => {
                let side = &mut self.sides[side_index(*player)?];
                side.username = Some(username.clone());
                side.rating = *rating;
            }

            BattleEvent::TierTag(tier) => {
                self.tier = Some(tier.clone());
            }

            BattleEvent::GameType(game_type) => {
                self.set_game_type(*game_type);
            }

            BattleEvent::Turn(turn) => {
                self.turn = *turn;
            }

            // === Major Actions ===
            BattleEvent::Switch {
                pokemon,
                species,
                level,
            } => {
                self.handle_switch(pokemon, species, *level)?;
            }

            BattleEvent::Faint(pokemon) => {
                self.handle_faint(pokemon)?;
            }

            BattleEvent::Move { pokemon, move_id } => {
                let (side, idx) = self.resolve(pokemon)?;
                let poke = &mut self.sides[side].roster[idx];
                if !poke.record_move(move_id) && !poke.transformed {
                    tracing::debug!(
                        line,
                        pokemon = %poke.nickname,
                        move_id = %move_id,
                        "moveset already full, move dropped"
                    );
                }
            }

            // === Reveals ===
            BattleEvent::AbilityReveal {
                pokemon,
                ability,
                also,
            } => {
                let (side, idx) = self.resolve(pokemon)?;
                self.sides[side].roster[idx].record_ability(ability);
                if let Some(also) = also {
                    self.reveal_ability(&also.pokemon, &also.ability)?;
                }
            }

            BattleEvent::ItemReveal {
                pokemon,
                item,
                also,
            } => {
                let (side, idx) = self.resolve(pokemon)?;
                self.sides[side].roster[idx].record_item(item.as_deref());
                if let Some(also) = also {
                    self.reveal_ability(&also.pokemon, &also.ability)?;
                }
            }

            BattleEvent::FormeChange {
                pokemon,
                species,
                permanent,
                ability,
            } => {
                let (side, idx) = self.resolve(pokemon)?;
                let poke = &mut self.sides[side].roster[idx];
                // The triggering ability belongs to the forme it changed from
                if let Some(ability) = ability {
                    poke.record_ability(ability);
                }
                if *permanent {
                    poke.change_forme(species.clone());
                } else {
                    poke.show_forme(species.clone());
                }
            }

            BattleEvent::Transform { pokemon, ability } => {
                let (side, idx) = self.resolve(pokemon)?;
                let poke = &mut self.sides[side].roster[idx];
                // Recorded first: once transformed, reveals are the copy's
                if let Some(ability) = ability {
                    poke.record_ability(ability);
                }
                poke.transformed = true;
            }

            // === Battle End ===
            BattleEvent::Forfeit { username } => {
                self.forfeited = Some(username.clone());
            }

            BattleEvent::BattleEnd { winner } => {
                self.winner = winner.clone();
                // Matchups still running at the end decided nothing
                self.open.clear();
                self.phase = Phase::Ended;
            }

            BattleEvent::Unrecognized(_) => {
                // Doesn't affect tracked state
            }
        }

        Ok(())
    }

    /// Take the finished record
    ///
    /// Fails when the log never reached `win`/`tie` or a side never sent out
    /// a Pokemon.
    pub fn finish(self) -> Result<BattleRecord, TrackError> {
        if self.phase != Phase::Ended {
            return Err(StructuralError::Incomplete.into());
        }
        if let Some(side) = self.sides.iter().find(|s| s.roster.is_empty()) {
            return Err(StructuralError::EmptyRoster(side.player).into());
        }

        let outcome = match self.winner.as_deref() {
            None => Outcome::Completed { winner: None },
            Some(name) => match (self.player_named(name), self.forfeited.is_some()) {
                (Some(winner), true) => Outcome::Forfeit {
                    winner: Some(winner),
                },
                (Some(winner), false) => Outcome::Completed {
                    winner: Some(winner),
                },
                (None, _) => Outcome::Unknown,
            },
        };

        let [p1, p2] = self.sides;
        Ok(BattleRecord {
            tier: self.tier,
            game_type: self.game_type,
            turns: self.turn,
            outcome,
            sides: [p1.into_record(), p2.into_record()],
        })
    }

    fn reveal_ability(
        &mut self,
        pokemon: &PokemonRef,
        ability: &str,
    ) -> Result<(), StructuralError> {
        let (side, idx) = self.resolve(pokemon)?;
        self.sides[side].roster[idx].record_ability(ability);
        Ok(())
    }

    /// Handle a switch (or drag) event
    fn handle_switch(
        &mut self,
        pokemon: &PokemonRef,
        species: &SpeciesRef,
        level: Option<u8>,
    ) -> Result<(), StructuralError> {
        let side_idx = side_index(pokemon.player)?;
        let slot = pokemon.slot.unwrap_or(0);
        self.sides[side_idx].check_slot(slot)?;

        if self.phase == Phase::NotStarted {
            self.phase = Phase::InProgress;
        }

        // Find existing Pokemon or create new one
        let side = &mut self.sides[side_idx];
        let idx = match side.find_pokemon(&pokemon.nickname) {
            Some(idx) => {
                // Coming back in another forme means the old one is gone for good
                let poke = &mut side.roster[idx];
                if poke.usage_key() != species.forme {
                    poke.change_forme(species.clone());
                }
                idx
            }
            None => side.add_pokemon(PokemonInstance::new(
                pokemon.nickname.clone(),
                species.clone(),
                level,
            ))?,
        };

        if side.slot_of(idx) == Some(slot) {
            return Ok(());
        }

        if let Some(previous) = side.active(slot) {
            self.leave_field(side_idx, previous, EncounterOutcome::SwitchedOut);
        }

        let side = &mut self.sides[side_idx];
        if let Some(old_slot) = side.slot_of(idx) {
            side.set_active(old_slot, None);
        }
        side.set_active(slot, Some(idx));
        side.roster[idx].on_switch_in();

        if side.lead.is_none() {
            side.lead = Some(Lead { index: idx, slot });
            side.roster[idx].lead = true;
        }

        let other = 1 - side_idx;
        let opponents: Vec<usize> = self.sides[other].active_roster().collect();
        for opponent in opponents {
            self.open.push(OpenEncounter {
                side: side_idx,
                subject: idx,
                opponent,
            });
            self.open.push(OpenEncounter {
                side: other,
                subject: opponent,
                opponent: idx,
            });
        }

        Ok(())
    }

    /// Handle a faint event
    ///
    /// Faints from one action arrive back to back (Explosion, Destiny Bond,
    /// recoil). Matchups the earlier faint closed as neutral against this
    /// Pokemon become knockouts too.
    fn handle_faint(&mut self, pokemon: &PokemonRef) -> Result<(), StructuralError> {
        let (side, idx) = self.resolve(pokemon)?;

        let fainted_opponents: Vec<usize> = self
            .recent_faints
            .iter()
            .filter(|(fainted_side, _)| *fainted_side != side)
            .map(|(_, opponent)| *opponent)
            .collect();
        for opponent in fainted_opponents {
            if let Some(encounter) = self.sides[side].encounters.iter_mut().rev().find(|e| {
                e.subject == idx
                    && e.opponent == opponent
                    && e.outcome == EncounterOutcome::Neutral
            }) {
                encounter.outcome = EncounterOutcome::KnockedOut;
            }
        }

        self.leave_field(side, idx, EncounterOutcome::KnockedOut);
        self.sides[side].roster[idx].on_faint();
        self.recent_faints.push((side, idx));
        Ok(())
    }

    /// Take a Pokemon off the field, closing its encounters
    ///
    /// Its own encounters close with `outcome`; encounters where it was the
    /// opponent close as neutral.
    fn leave_field(&mut self, side: usize, idx: usize, outcome: EncounterOutcome) {
        let other = 1 - side;
        let open = std::mem::take(&mut self.open);
        for encounter in open {
            let closed = if encounter.side == side && encounter.subject == idx {
                Some(outcome)
            } else if encounter.side == other && encounter.opponent == idx {
                Some(EncounterOutcome::Neutral)
            } else {
                None
            };

            match closed {
                Some(outcome) => self.close(encounter, outcome),
                None => self.open.push(encounter),
            }
        }

        let state = &mut self.sides[side];
        if let Some(slot) = state.slot_of(idx) {
            state.set_active(slot, None);
        }
        state.roster[idx].on_switch_out();
    }

    fn close(&mut self, encounter: OpenEncounter, outcome: EncounterOutcome) {
        self.sides[encounter.side].encounters.push(Encounter {
            subject: encounter.subject,
            opponent: encounter.opponent,
            outcome,
        });
    }

    /// Find the roster entry an event refers to: active slot first, then nickname
    ///
    /// A nickname that is itself a species name adds a new Pokemon that hasn't
    /// been sent out yet.
    fn resolve(&mut self, pokemon: &PokemonRef) -> Result<(usize, usize), StructuralError> {
        let side_idx = side_index(pokemon.player)?;
        let side = &mut self.sides[side_idx];

        if let Some(slot) = pokemon.slot {
            side.check_slot(slot)?;
            if let Some(idx) = side.active(slot)
                && side.roster[idx].nickname == pokemon.nickname
            {
                return Ok((side_idx, idx));
            }
        }

        if let Some(idx) = side.find_pokemon(&pokemon.nickname) {
            return Ok((side_idx, idx));
        }

        match &pokemon.species_hint {
            Some(species) => {
                let idx = side.add_pokemon(PokemonInstance::new(
                    pokemon.nickname.clone(),
                    species.clone(),
                    None,
                ))?;
                Ok((side_idx, idx))
            }
            None => Err(StructuralError::UnknownPokemon {
                player: pokemon.player,
                nickname: pokemon.nickname.clone(),
            }),
        }
    }
}
