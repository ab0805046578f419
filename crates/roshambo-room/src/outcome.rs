//! Round outcome resolution.
//!
//! Pure functions: given what each seat played (or didn't), decide who
//! won. No room state, no clocks. Seats are positional; the first player
//! to sit down is [`Seat::First`].

use roshambo_protocol::Move;

/// A position at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Index into the room's ordered player list.
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Same move, or nobody moved before the deadline.
    Draw,
    /// Both moved and this seat's move won.
    Win(Seat),
    /// Only this seat moved before the deadline.
    Forfeit(Seat),
}

impl Outcome {
    /// The seat that scores a point, if any. Every win is worth exactly one.
    pub fn winner(self) -> Option<Seat> {
        match self {
            Self::Draw => None,
            Self::Win(seat) | Self::Forfeit(seat) => Some(seat),
        }
    }

    /// Text shown to players: `"draw"`, `"Ada wins"`, or
    /// `"Ada wins (timeout)"`. Missing names fall back to the seat label.
    pub fn describe(self, first: Option<&str>, second: Option<&str>) -> String {
        let name = |seat: Seat| match seat {
            Seat::First => first.unwrap_or("player 1").to_string(),
            Seat::Second => second.unwrap_or("player 2").to_string(),
        };
        match self {
            Self::Draw => "draw".to_string(),
            Self::Win(seat) => format!("{} wins", name(seat)),
            Self::Forfeit(seat) => format!("{} wins (timeout)", name(seat)),
        }
    }
}

/// Compares two played moves.
///
/// Total over all nine pairs: equal moves draw, otherwise exactly one
/// side beats the other.
pub fn duel(first: Move, second: Move) -> Outcome {
    if first == second {
        Outcome::Draw
    } else if first.beats(second) {
        Outcome::Win(Seat::First)
    } else {
        Outcome::Win(Seat::Second)
    }
}

/// Resolves a round that hit its deadline.
///
/// Returns `None` when both seats moved: that round should already have
/// been resolved the moment the second move arrived, so reaching the
/// deadline with two moves on record is a bookkeeping bug the caller must
/// treat as such.
pub fn on_deadline(first: Option<Move>, second: Option<Move>) -> Option<Outcome> {
    match (first, second) {
        (None, None) => Some(Outcome::Draw),
        (Some(_), None) => Some(Outcome::Forfeit(Seat::First)),
        (None, Some(_)) => Some(Outcome::Forfeit(Seat::Second)),
        (Some(_), Some(_)) => None,
    }
}
