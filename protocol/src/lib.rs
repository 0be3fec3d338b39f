//! Battle log decoding for Pokemon Showdown usage statistics.
//!
//! Turns one raw protocol line (`|switch|p1a: Pikachu|Pikachu, L50|100/100`)
//! into a typed [`BattleEvent`], normalizing species, move, ability and item
//! names against a [`Dex`] vocabulary.

use std::fmt;

use thiserror::Error;

pub mod dex;
pub mod log;

pub use dex::{Dex, DexError, SpeciesEntry, SpeciesRef, to_id};
pub use log::{
    BattleEvent, GameType, Player, PokemonDetails, PokemonRef, RevealedAbility, decode_line,
    decode_log,
};

/// Identifier category used when a name fails to resolve against the dex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Species,
    Move,
    Ability,
    Item,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Species => "species",
            Category::Move => "move",
            Category::Ability => "ability",
            Category::Item => "item",
        };
        f.write_str(name)
    }
}

/// Why a single line could not be decoded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeErrorKind {
    #[error("malformed line: {0}")]
    Malformed(String),

    #[error("unknown line type: {0}")]
    UnknownType(String),

    #[error("unresolved {category}: {name}")]
    UnresolvedIdentifier { category: Category, name: String },
}

impl DecodeErrorKind {
    /// Short machine-friendly label, used in run diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            DecodeErrorKind::Malformed(_) => "malformed",
            DecodeErrorKind::UnknownType(_) => "unknown_type",
            DecodeErrorKind::UnresolvedIdentifier { .. } => "unresolved_identifier",
        }
    }
}

/// A decode failure stamped with the line it happened on
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {kind}")]
pub struct DecodeError {
    /// 1-based line number within the log
    pub line: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(line: usize, kind: DecodeErrorKind) -> Self {
        Self { line, kind }
    }
}
