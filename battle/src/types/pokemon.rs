//! Per-Pokemon replay state

use usage_protocol::SpeciesRef;

/// Moves a Pokemon can know
pub const MAX_MOVES: usize = 4;

/// What was revealed about a Pokemon while it held one permanent forme
#[derive(Debug, Clone, PartialEq)]
pub struct FormeRecord {
    pub species: SpeciesRef,

    /// Distinct move ids in reveal order, at most [`MAX_MOVES`]
    pub moves: Vec<String>,

    pub ability: Option<String>,

    /// Last item seen; `None` after it was knocked off or stolen
    pub item: Option<String>,
}

impl FormeRecord {
    pub fn new(species: SpeciesRef) -> Self {
        Self {
            species,
            moves: Vec::new(),
            ability: None,
            item: None,
        }
    }

    /// Record a revealed move
    ///
    /// Returns `false` when the move was dropped because the record already
    /// holds [`MAX_MOVES`] other moves.
    pub fn record_move(&mut self, move_id: &str) -> bool {
        if self.moves.iter().any(|m| m == move_id) {
            return true;
        }
        if self.moves.len() >= MAX_MOVES {
            return false;
        }
        self.moves.push(move_id.to_string());
        true
    }

    /// Revealed moves sorted and comma-joined, `None` if nothing was revealed
    pub fn canonical_moves(&self) -> Option<String> {
        if self.moves.is_empty() {
            return None;
        }
        let mut moves: Vec<&str> = self.moves.iter().map(String::as_str).collect();
        moves.sort_unstable();
        Some(moves.join(","))
    }
}

/// One Pokemon on a side, followed across switches and forme changes
#[derive(Debug, Clone, PartialEq)]
pub struct PokemonInstance {
    pub nickname: String,

    pub level: Option<u8>,

    /// One record per permanent forme held, oldest first; never empty
    pub formes: Vec<FormeRecord>,

    /// Forme currently shown, including temporary changes
    pub displayed: SpeciesRef,

    /// First Pokemon its side sent out
    pub lead: bool,

    pub fainted: bool,

    /// Copied another Pokemon; its moves and ability aren't its own until it leaves
    pub transformed: bool,

    pub active: bool,
}

impl PokemonInstance {
    pub fn new(nickname: impl Into<String>, species: SpeciesRef, level: Option<u8>) -> Self {
        Self {
            nickname: nickname.into(),
            level,
            displayed: species.clone(),
            formes: vec![FormeRecord::new(species)],
            lead: false,
            fainted: false,
            transformed: false,
            active: false,
        }
    }

    /// Record for the permanent forme currently held
    pub fn current(&self) -> &FormeRecord {
        // `formes` starts with one record and only grows
        &self.formes[self.formes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut FormeRecord {
        let last = self.formes.len() - 1;
        &mut self.formes[last]
    }

    /// Forme id this instance is counted under
    pub fn usage_key(&self) -> &str {
        &self.current().species.forme
    }

    /// Permanent forme change (Mega Evolution, Primal Reversion, ...)
    ///
    /// Reveals made so far stay with the old forme. The held item carries over;
    /// a mega stone revealed just before evolving is still held afterwards.
    pub fn change_forme(&mut self, species: SpeciesRef) {
        self.displayed = species.clone();
        if self.current().species == species {
            return;
        }
        let item = self.current().item.clone();
        let mut record = FormeRecord::new(species);
        record.item = item;
        self.formes.push(record);
    }

    /// Temporary forme change; reverts on switch-out
    pub fn show_forme(&mut self, species: SpeciesRef) {
        self.displayed = species;
    }

    /// Returns `false` when the move was not recorded
    pub fn record_move(&mut self, move_id: &str) -> bool {
        if self.transformed {
            return false;
        }
        self.current_mut().record_move(move_id)
    }

    pub fn record_ability(&mut self, ability: &str) {
        if self.transformed {
            return;
        }
        self.current_mut().ability = Some(ability.to_string());
    }

    pub fn record_item(&mut self, item: Option<&str>) {
        self.current_mut().item = item.map(str::to_string);
    }

    pub fn on_switch_in(&mut self) {
        self.active = true;
    }

    pub fn on_switch_out(&mut self) {
        self.active = false;
        self.transformed = false;
        self.displayed = self.current().species.clone();
    }

    pub fn on_faint(&mut self) {
        self.on_switch_out();
        self.fainted = true;
    }
}
