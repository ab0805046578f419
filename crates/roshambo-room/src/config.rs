//! Room configuration and lifecycle phase.

use std::time::Duration;

use roshambo_timer::DEFAULT_ROUND_DURATION;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room the registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Seats per room. Joins beyond this are rejected. The resolver only
    /// understands two seats, so values other than 2 are clamped.
    pub max_players: usize,

    /// Time budget of a single round.
    pub round_duration: Duration,

    /// Whether the first round waits for both seated players to send
    /// `playerReady`. When `false` the clock starts as soon as the second
    /// player sits down.
    pub require_ready: bool,
}

impl RoomConfig {
    /// The only seat count the round logic supports.
    pub const SEATS: usize = 2;

    /// Clamps out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.max_players != Self::SEATS {
            tracing::warn!(
                requested = self.max_players,
                seats = Self::SEATS,
                "rooms are two-seat only, clamping max_players"
            );
            self.max_players = Self::SEATS;
        }
        if self.round_duration.is_zero() {
            tracing::warn!("round_duration of zero, falling back to default");
            self.round_duration = DEFAULT_ROUND_DURATION;
        }
        self
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: Self::SEATS,
            round_duration: DEFAULT_ROUND_DURATION,
            require_ready: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// ```text
/// WaitingForPlayers → WaitingForReady → Playing
///         └──────────────────────────────↗
/// ```
///
/// - **WaitingForPlayers**: fewer than two seats taken, no clock yet.
/// - **WaitingForReady**: both seats taken but the room gates on
///   readiness and not everyone is ready. Only reachable with
///   `require_ready`.
/// - **Playing**: the round clock has started. A room never leaves this
///   phase; it keeps playing rounds (by forfeit, if someone left) until
///   the last player goes and the room is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    WaitingForPlayers,
    WaitingForReady,
    Playing,
}

impl RoomPhase {
    /// Returns `true` once the round clock has started.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::WaitingForReady => write!(f, "WaitingForReady"),
            Self::Playing => write!(f, "Playing"),
        }
    }
}
