//! Identifiers shared by every tournament component.

/// Tournament ID type
pub type TournamentId = i64;

/// Player ID type (the external roster's player key)
pub type PlayerId = i64;
