//! Per-room game state: seats, moves, round counter, score, and deadline.
//!
//! [`Room`] is a plain synchronous state machine. Every input (join, ready,
//! move, deadline, leave) is a method that mutates the room and returns the
//! messages to broadcast to the room's players. The room actor feeds it and
//! delivers the output; tests drive it directly.

use std::collections::{BTreeMap, HashMap};

use roshambo_protocol::{Move, PlayerId, PlayerInfo, RoomId, ServerMessage};
use roshambo_timer::RoundTimer;

use crate::outcome::{self, Outcome, Seat};
use crate::{RoomConfig, RoomError, RoomPhase};

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

impl Participant {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ready: false,
        }
    }
}

impl From<&Participant> for PlayerInfo {
    fn from(p: &Participant) -> Self {
        PlayerInfo {
            id: p.id,
            name: p.name.clone(),
            ready: p.ready,
        }
    }
}

/// One game session between (at most) two players.
///
/// Invariants:
/// - `players.len() <= config.max_players`, order is seat order.
/// - every key of `moves` and `score` is a seated player.
/// - the timer is armed for `round` whenever the room is playing and the
///   round is unresolved. A resolved round re-arms for the next one, so a
///   round resolves exactly once.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    phase: RoomPhase,
    players: Vec<Participant>,
    moves: HashMap<PlayerId, Move>,
    round: u64,
    score: HashMap<PlayerId, u32>,
    timer: RoundTimer,
}

impl Room {
    /// Creates an empty room at round 1 with no deadline.
    pub fn new(id: RoomId, config: RoomConfig) -> Self {
        let timer = RoundTimer::new(config.round_duration);
        Self {
            id,
            config,
            phase: RoomPhase::WaitingForPlayers,
            players: Vec::with_capacity(RoomConfig::SEATS),
            moves: HashMap::new(),
            round: 1,
            score: HashMap::new(),
            timer,
        }
    }

    // -- Inputs ------------------------------------------------------------

    /// Seats a player and starts the round clock if this fills the table.
    ///
    /// # Errors
    /// `AlreadyInRoom` if the player is seated already, `RoomFull` if both
    /// seats are taken. The room is unchanged in either case.
    pub fn join(&mut self, player: Participant) -> Result<Vec<ServerMessage>, RoomError> {
        if self.is_seated(player.id) {
            return Err(RoomError::AlreadyInRoom(player.id, self.id.clone()));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        tracing::info!(
            room_id = %self.id,
            player_id = %player.id,
            name = %player.name,
            players = self.players.len() + 1,
            "player joined"
        );
        self.score.insert(player.id, 0);
        self.players.push(player);

        let mut out = vec![self.room_data()];
        self.start_clock_if_ready(&mut out);
        Ok(out)
    }

    /// Marks a player ready. Ignored for non-members and repeats.
    pub fn ready(&mut self, player_id: PlayerId) -> Vec<ServerMessage> {
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            tracing::debug!(room_id = %self.id, %player_id, "ready from non-member, ignoring");
            return Vec::new();
        };
        if player.ready {
            return Vec::new();
        }
        player.ready = true;
        tracing::debug!(room_id = %self.id, %player_id, "player ready");

        let mut out = vec![self.room_data()];
        self.start_clock_if_ready(&mut out);
        out
    }

    /// Records a move for the current round; the latest submission wins.
    ///
    /// When both seats have a move on record the round resolves on the
    /// spot: the deadline is cancelled, the result is broadcast, and the
    /// clock restarts for the next round. Rooms gated on readiness drop
    /// moves until the game has started.
    pub fn submit_move(&mut self, player_id: PlayerId, choice: Move) -> Vec<ServerMessage> {
        if !self.is_seated(player_id) {
            tracing::debug!(room_id = %self.id, %player_id, "move from non-member, ignoring");
            return Vec::new();
        }
        if self.config.require_ready && !self.phase.is_playing() {
            tracing::debug!(room_id = %self.id, %player_id, "move before game start, ignoring");
            return Vec::new();
        }

        self.moves.insert(player_id, choice);
        tracing::debug!(room_id = %self.id, %player_id, round = self.round, "move recorded");

        let (Some(first), Some(second)) = (self.seat_move(Seat::First), self.seat_move(Seat::Second))
        else {
            return Vec::new();
        };

        self.timer.cancel();
        vec![self.finish_round(outcome::duel(first, second))]
    }

    /// Resolves `round` because its deadline passed.
    ///
    /// Deadlines for any round other than the current, unresolved one are
    /// discarded, so a late or duplicate expiry can never resolve a round
    /// twice.
    pub fn expire(&mut self, round: u64) -> Vec<ServerMessage> {
        if round != self.round || !self.phase.is_playing() {
            tracing::warn!(
                room_id = %self.id,
                expired = round,
                current = self.round,
                phase = %self.phase,
                "stale deadline, ignoring"
            );
            return Vec::new();
        }

        let first = self.seat_move(Seat::First);
        let second = self.seat_move(Seat::Second);
        match outcome::on_deadline(first, second) {
            Some(outcome) => vec![self.finish_round(outcome)],
            None => {
                tracing::error!(
                    room_id = %self.id,
                    round,
                    "deadline reached with both moves on record, round left untouched"
                );
                Vec::new()
            }
        }
    }

    /// Removes a player together with their score and pending move.
    ///
    /// The round clock keeps running when one player remains: they keep
    /// playing rounds alone and win every one they submit a move for.
    /// When the last player leaves the deadline is cancelled and nothing is
    /// broadcast; the registry then deletes the room.
    ///
    /// # Errors
    /// `NotInRoom` if the player holds no seat here.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Vec<ServerMessage>, RoomError> {
        let pos = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| RoomError::NotInRoom(player_id, self.id.clone()))?;

        self.players.remove(pos);
        self.score.remove(&player_id);
        self.moves.remove(&player_id);

        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.timer.cancel();
            return Ok(Vec::new());
        }
        if self.phase == RoomPhase::WaitingForReady {
            self.phase = RoomPhase::WaitingForPlayers;
        }
        Ok(vec![self.room_data()])
    }

    // -- Accessors ---------------------------------------------------------

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Seated players in seat order.
    pub fn players(&self) -> &[Participant] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_seated(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// The current (unresolved) round number.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Moves on record for the current round.
    pub fn moves(&self) -> &HashMap<PlayerId, Move> {
        &self.moves
    }

    pub fn score_of(&self, player_id: PlayerId) -> Option<u32> {
        self.score.get(&player_id).copied()
    }

    pub fn scores(&self) -> BTreeMap<PlayerId, u32> {
        self.score.iter().map(|(id, n)| (*id, *n)).collect()
    }

    /// The round the active deadline belongs to, if one is armed.
    pub fn deadline_round(&self) -> Option<u64> {
        self.timer.armed_round()
    }

    pub(crate) fn timer_mut(&mut self) -> &mut RoundTimer {
        &mut self.timer
    }

    /// The current seat list as a `roomData` broadcast.
    pub fn room_data(&self) -> ServerMessage {
        ServerMessage::RoomData {
            room_id: self.id.clone(),
            players: self.players.iter().map(PlayerInfo::from).collect(),
        }
    }

    // -- Internals ---------------------------------------------------------

    fn seat_move(&self, seat: Seat) -> Option<Move> {
        self.players
            .get(seat.index())
            .and_then(|p| self.moves.get(&p.id))
            .copied()
    }

    fn seat_name(&self, seat: Seat) -> Option<&str> {
        self.players.get(seat.index()).map(|p| p.name.as_str())
    }

    /// Starts the round clock once both seats are filled (and, if the room
    /// gates on readiness, both players are ready). Never restarts a clock
    /// that is already running.
    fn start_clock_if_ready(&mut self, out: &mut Vec<ServerMessage>) {
        if self.timer.is_armed() || self.players.len() < RoomConfig::SEATS {
            return;
        }

        let first_start = !self.phase.is_playing();
        if first_start && self.config.require_ready && !self.players.iter().all(|p| p.ready) {
            self.phase = RoomPhase::WaitingForReady;
            return;
        }

        self.phase = RoomPhase::Playing;
        self.timer.arm(self.round);
        if first_start {
            tracing::info!(room_id = %self.id, round = self.round, "game started");
            out.push(ServerMessage::GameStart {
                room_id: self.id.clone(),
                round: self.round,
            });
        }
    }

    /// Applies an outcome, builds the `roundResult` broadcast, and moves on
    /// to the next round with a fresh deadline.
    fn finish_round(&mut self, outcome: Outcome) -> ServerMessage {
        let winner = outcome
            .winner()
            .and_then(|seat| self.players.get(seat.index()))
            .map(|p| p.id);
        if let Some(id) = winner {
            *self.score.entry(id).or_insert(0) += 1;
        }

        let round_result = outcome.describe(
            self.seat_name(Seat::First),
            self.seat_name(Seat::Second),
        );
        tracing::info!(
            room_id = %self.id,
            round = self.round,
            result = %round_result,
            "round resolved"
        );

        let msg = ServerMessage::RoundResult {
            room_id: self.id.clone(),
            round: self.round,
            moves: self.moves.iter().map(|(id, m)| (*id, *m)).collect(),
            round_result,
            winner,
            score: self.scores(),
        };

        self.moves.clear();
        self.round += 1;
        self.timer.arm(self.round);
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roshambo_protocol::Move::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn room() -> Room {
        Room::new(RoomId::from("r1"), RoomConfig::default())
    }

    fn gated_room() -> Room {
        Room::new(
            RoomId::from("r1"),
            RoomConfig {
                require_ready: true,
                ..RoomConfig::default()
            },
        )
    }

    /// A room with Ada (seat 1) and Bo (seat 2) and the clock running.
    fn full_room() -> Room {
        let mut r = room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        r.join(Participant::new(pid(2), "Bo")).unwrap();
        r
    }

    fn round_result(msgs: &[ServerMessage]) -> (u64, String, Option<PlayerId>) {
        match msgs {
            [ServerMessage::RoundResult {
                round,
                round_result,
                winner,
                ..
            }] => (*round, round_result.clone(), *winner),
            other => panic!("expected one roundResult, got {other:?}"),
        }
    }

    // -- join ---------------------------------------------------------------

    #[test]
    fn test_new_room_defaults() {
        let r = room();
        assert_eq!(r.round(), 1);
        assert!(r.is_empty());
        assert_eq!(r.phase(), RoomPhase::WaitingForPlayers);
        assert_eq!(r.deadline_round(), None);
    }

    #[test]
    fn test_first_join_broadcasts_room_data_without_clock() {
        let mut r = room();
        let out = r.join(Participant::new(pid(1), "Ada")).unwrap();

        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], ServerMessage::RoomData { players, .. } if players.len() == 1));
        assert_eq!(r.score_of(pid(1)), Some(0));
        assert_eq!(r.deadline_round(), None);
    }

    #[test]
    fn test_second_join_starts_round_one() {
        let mut r = room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        let out = r.join(Participant::new(pid(2), "Bo")).unwrap();

        assert!(matches!(&out[0], ServerMessage::RoomData { players, .. } if players.len() == 2));
        assert!(matches!(out[1], ServerMessage::GameStart { round: 1, .. }));
        assert_eq!(r.phase(), RoomPhase::Playing);
        assert_eq!(r.deadline_round(), Some(1));
    }

    #[test]
    fn test_third_join_rejected() {
        let mut r = full_room();
        let err = r.join(Participant::new(pid(3), "Cy")).unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
        assert_eq!(r.player_count(), 2);
        assert_eq!(r.score_of(pid(3)), None);
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut r = room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        let err = r.join(Participant::new(pid(1), "Ada")).unwrap_err();
        assert!(matches!(err, RoomError::AlreadyInRoom(..)));
        assert_eq!(r.player_count(), 1);
    }

    // -- both moved ---------------------------------------------------------

    #[test]
    fn test_single_move_does_not_resolve() {
        let mut r = full_room();
        assert!(r.submit_move(pid(1), Rock).is_empty());
        assert_eq!(r.moves().get(&pid(1)), Some(&Rock));
        assert_eq!(r.round(), 1);
        assert_eq!(r.deadline_round(), Some(1));
    }

    #[test]
    fn test_both_moved_resolves_immediately() {
        let mut r = full_room();
        r.submit_move(pid(1), Paper);
        let out = r.submit_move(pid(2), Rock);

        let (round, text, winner) = round_result(&out);
        assert_eq!(round, 1);
        assert_eq!(text, "Ada wins");
        assert_eq!(winner, Some(pid(1)));
        assert_eq!(r.score_of(pid(1)), Some(1));
        assert_eq!(r.score_of(pid(2)), Some(0));
        assert_eq!(r.round(), 2);
        assert!(r.moves().is_empty());
        assert_eq!(r.deadline_round(), Some(2), "clock restarts for round 2");
    }

    #[test]
    fn test_round_result_carries_moves_and_score() {
        let mut r = full_room();
        r.submit_move(pid(1), Scissors);
        let out = r.submit_move(pid(2), Rock);
        match &out[0] {
            ServerMessage::RoundResult { moves, score, round_result, .. } => {
                assert_eq!(moves.get(&pid(1)), Some(&Scissors));
                assert_eq!(moves.get(&pid(2)), Some(&Rock));
                assert_eq!(score.get(&pid(2)), Some(&1));
                assert_eq!(round_result, "Bo wins");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_draw_leaves_score_unchanged() {
        let mut r = full_room();
        r.submit_move(pid(1), Rock);
        let (_, text, winner) = round_result(&r.submit_move(pid(2), Rock));
        assert_eq!(text, "draw");
        assert_eq!(winner, None);
        assert_eq!(r.scores(), BTreeMap::from([(pid(1), 0), (pid(2), 0)]));
    }

    #[test]
    fn test_last_submission_wins() {
        let mut r = full_room();
        r.submit_move(pid(1), Rock);
        r.submit_move(pid(1), Scissors);
        let (_, text, _) = round_result(&r.submit_move(pid(2), Paper));
        assert_eq!(text, "Ada wins");
    }

    #[test]
    fn test_late_move_counts_for_next_round() {
        let mut r = full_room();
        r.submit_move(pid(1), Paper);
        r.submit_move(pid(2), Rock);
        // Bo changes their mind after the round closed.
        assert!(r.submit_move(pid(2), Scissors).is_empty());
        assert_eq!(r.round(), 2);
        assert_eq!(r.moves().get(&pid(2)), Some(&Scissors));
        assert_eq!(r.score_of(pid(2)), Some(0));
    }

    #[test]
    fn test_move_from_non_member_is_dropped() {
        let mut r = full_room();
        assert!(r.submit_move(pid(9), Rock).is_empty());
        assert!(!r.moves().contains_key(&pid(9)));
    }

    // -- deadline -----------------------------------------------------------

    #[test]
    fn test_deadline_with_no_moves_is_a_draw() {
        let mut r = full_room();
        let (round, text, winner) = round_result(&r.expire(1));
        assert_eq!((round, text.as_str(), winner), (1, "draw", None));
        assert_eq!(r.scores(), BTreeMap::from([(pid(1), 0), (pid(2), 0)]));
        assert_eq!(r.round(), 2);
        assert_eq!(r.deadline_round(), Some(2));
    }

    #[test]
    fn test_deadline_with_single_mover_is_a_forfeit() {
        let mut r = full_room();
        r.submit_move(pid(1), Rock);
        let (_, text, winner) = round_result(&r.expire(1));
        assert_eq!(text, "Ada wins (timeout)");
        assert_eq!(winner, Some(pid(1)));
        assert_eq!(r.score_of(pid(1)), Some(1));
        assert_eq!(r.score_of(pid(2)), Some(0));
    }

    #[test]
    fn test_deadline_second_seat_forfeit() {
        let mut r = full_room();
        r.submit_move(pid(2), Paper);
        let (_, text, winner) = round_result(&r.expire(1));
        assert_eq!(text, "Bo wins (timeout)");
        assert_eq!(winner, Some(pid(2)));
    }

    #[test]
    fn test_stale_deadline_is_ignored() {
        let mut r = full_room();
        r.submit_move(pid(1), Paper);
        r.submit_move(pid(2), Rock);
        // Round 1 already resolved; its deadline must not resolve again.
        assert!(r.expire(1).is_empty());
        assert_eq!(r.round(), 2);
        assert_eq!(r.score_of(pid(1)), Some(1));
    }

    #[test]
    fn test_deadline_before_start_is_ignored() {
        let mut r = room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        assert!(r.expire(1).is_empty());
        assert_eq!(r.round(), 1);
    }

    // -- leave --------------------------------------------------------------

    #[test]
    fn test_leave_removes_score_and_move() {
        let mut r = full_room();
        r.submit_move(pid(2), Rock);
        let out = r.leave(pid(2)).unwrap();

        assert!(matches!(&out[0], ServerMessage::RoomData { players, .. } if players.len() == 1));
        assert_eq!(r.score_of(pid(2)), None);
        assert!(r.moves().is_empty());
        assert_eq!(r.deadline_round(), Some(1), "clock keeps running");
    }

    #[test]
    fn test_remaining_mover_wins_by_timeout() {
        let mut r = full_room();
        r.submit_move(pid(1), Rock);
        r.leave(pid(2)).unwrap();

        let (_, text, winner) = round_result(&r.expire(1));
        assert_eq!(text, "Ada wins (timeout)");
        assert_eq!(winner, Some(pid(1)));
        assert_eq!(r.scores(), BTreeMap::from([(pid(1), 1)]));
        assert_eq!(r.deadline_round(), Some(2));
    }

    #[test]
    fn test_remaining_player_without_move_draws() {
        let mut r = full_room();
        r.leave(pid(1)).unwrap();
        let (_, text, _) = round_result(&r.expire(1));
        assert_eq!(text, "draw");
    }

    #[test]
    fn test_seat_shifts_after_first_player_leaves() {
        let mut r = full_room();
        r.leave(pid(1)).unwrap();
        r.join(Participant::new(pid(3), "Cy")).unwrap();
        assert_eq!(r.players()[0].id, pid(2));
        assert_eq!(r.players()[1].id, pid(3));
        // Clock was still running, join must not restart it.
        assert_eq!(r.deadline_round(), Some(1));

        r.submit_move(pid(2), Rock);
        let (_, text, _) = round_result(&r.submit_move(pid(3), Scissors));
        assert_eq!(text, "Bo wins");
    }

    #[test]
    fn test_last_leave_cancels_deadline() {
        let mut r = full_room();
        r.leave(pid(1)).unwrap();
        let out = r.leave(pid(2)).unwrap();
        assert!(out.is_empty());
        assert!(r.is_empty());
        assert_eq!(r.deadline_round(), None);
    }

    #[test]
    fn test_leave_non_member() {
        let mut r = full_room();
        assert!(matches!(r.leave(pid(7)), Err(RoomError::NotInRoom(..))));
    }

    // -- ready gating -------------------------------------------------------

    #[test]
    fn test_gated_room_waits_for_both_ready() {
        let mut r = gated_room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        let out = r.join(Participant::new(pid(2), "Bo")).unwrap();
        assert_eq!(out.len(), 1, "no gameStart yet");
        assert_eq!(r.phase(), RoomPhase::WaitingForReady);
        assert_eq!(r.deadline_round(), None);

        let out = r.ready(pid(1));
        assert_eq!(out.len(), 1);
        assert_eq!(r.deadline_round(), None);

        let out = r.ready(pid(2));
        assert!(matches!(out.last(), Some(ServerMessage::GameStart { round: 1, .. })));
        assert_eq!(r.phase(), RoomPhase::Playing);
        assert_eq!(r.deadline_round(), Some(1));
    }

    #[test]
    fn test_gated_room_ignores_moves_before_start() {
        let mut r = gated_room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        r.join(Participant::new(pid(2), "Bo")).unwrap();
        r.submit_move(pid(1), Rock);
        assert!(r.submit_move(pid(2), Paper).is_empty());
        assert!(r.moves().is_empty());
    }

    #[test]
    fn test_gated_room_ignores_move_made_while_seated_alone() {
        let mut r = gated_room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        assert!(r.submit_move(pid(1), Rock).is_empty());
        assert!(r.moves().is_empty());

        r.join(Participant::new(pid(2), "Bo")).unwrap();
        r.ready(pid(1));
        r.ready(pid(2));
        assert_eq!(r.phase(), RoomPhase::Playing);

        // Round 1 starts with a clean slate: Bo's move alone settles nothing.
        assert!(r.submit_move(pid(2), Scissors).is_empty());
        assert_eq!(r.round(), 1);
        assert_eq!(r.moves().len(), 1);
    }

    #[test]
    fn test_ungated_room_keeps_early_move() {
        let mut r = room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        r.submit_move(pid(1), Rock);
        r.join(Participant::new(pid(2), "Bo")).unwrap();
        let (round, text, _) = round_result(&r.submit_move(pid(2), Scissors));
        assert_eq!((round, text.as_str()), (1, "Ada wins"));
    }

    #[test]
    fn test_ready_is_reported_in_room_data() {
        let mut r = gated_room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        match r.ready(pid(1)).as_slice() {
            [ServerMessage::RoomData { players, .. }] => assert!(players[0].ready),
            other => panic!("unexpected {other:?}"),
        }
        assert!(r.ready(pid(1)).is_empty(), "repeat ready is a no-op");
    }

    #[test]
    fn test_gated_room_returns_to_lobby_when_player_leaves() {
        let mut r = gated_room();
        r.join(Participant::new(pid(1), "Ada")).unwrap();
        r.join(Participant::new(pid(2), "Bo")).unwrap();
        r.leave(pid(2)).unwrap();
        assert_eq!(r.phase(), RoomPhase::WaitingForPlayers);
    }
}
