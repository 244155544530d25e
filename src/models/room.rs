//! Room model and its lifecycle state machine
//!
//! A room moves `WAITING -> IN_PROGRESS -> FINISHED`. Multi-round rooms go
//! back to `WAITING` between rounds. All transitions are plain synchronous
//! methods; callers serialize them by holding the room's lock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::MIN_PARTICIPANTS_TO_START,
    error::{AppError, AppResult},
    models::{Principal, Verdict, VerdictKind},
};

/// Room lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

/// Participant status within the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    NotReady,
    Ready,
    InProgress,
    Done,
}

/// Problem played in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomProblem {
    pub id: Uuid,
    pub title: String,
    /// `None` runs the round in acceptance mode
    pub expected_output: Option<String>,
    /// Optional round deadline, counted from `start`
    pub time_limit_secs: Option<u64>,
}

/// Score recorded for one participant in one completed round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub round: u32,
    pub problem_id: Uuid,
    pub verdict: VerdictKind,
    pub score: u32,
    pub recorded_at: DateTime<Utc>,
}

/// A user's membership in a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user: Principal,
    pub status: ParticipantStatus,
    pub scores: Vec<RoundScore>,
    pub joined_at: DateTime<Utc>,
    /// Set while one of this participant's submissions is executing
    #[serde(skip)]
    in_flight: bool,
}

impl Participant {
    fn new(user: Principal) -> Self {
        Self {
            user,
            status: ParticipantStatus::NotReady,
            scores: Vec::new(),
            joined_at: Utc::now(),
            in_flight: false,
        }
    }

    pub fn total_score(&self) -> u32 {
        self.scores.iter().map(|s| s.score).sum()
    }

    pub fn score_for_round(&self, round: u32) -> Option<&RoundScore> {
        self.scores.iter().find(|s| s.round == round)
    }

    pub fn has_submission_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// What an accepted submission needs to know about its round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTicket {
    pub round: u32,
    pub problem_id: Uuid,
    pub expected_output: Option<String>,
}

/// Result of closing a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub next_status: RoomStatus,
    /// `(user id, score)` for every participant, in join order
    pub scores: Vec<(Uuid, u32)>,
}

/// Room aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub title: String,
    pub owner: Principal,
    pub capacity: usize,
    pub participants: Vec<Participant>,
    pub status: RoomStatus,
    pub problems: Vec<RoomProblem>,
    pub round_index: u32,
    pub round_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create a room in `WAITING`. The owner administers it without taking a seat.
    pub fn new(
        owner: Principal,
        title: impl Into<String>,
        capacity: usize,
        problems: Vec<RoomProblem>,
    ) -> AppResult<Self> {
        if capacity < MIN_PARTICIPANTS_TO_START {
            return Err(AppError::Validation(format!(
                "Capacity must be at least {}",
                MIN_PARTICIPANTS_TO_START
            )));
        }
        if problems.is_empty() {
            return Err(AppError::Validation(
                "A room needs at least one problem".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title: title.into(),
            owner,
            capacity,
            participants: Vec::new(),
            status: RoomStatus::Waiting,
            problems,
            round_index: 0,
            round_deadline: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn total_rounds(&self) -> u32 {
        self.problems.len() as u32
    }

    pub fn current_problem(&self) -> &RoomProblem {
        // round_index never passes the last problem: see complete_round
        &self.problems[self.round_index as usize]
    }

    pub fn is_owner(&self, user_id: &Uuid) -> bool {
        self.owner.id == *user_id
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity
    }

    pub fn participant(&self, user_id: &Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user.id == *user_id)
    }

    fn participant_mut(&mut self, user_id: &Uuid) -> AppResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.user.id == *user_id)
            .ok_or(AppError::NotParticipant)
    }

    fn require_status(&self, allowed: &[RoomStatus]) -> AppResult<()> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        let expected = allowed
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(AppError::InvalidRoomState {
            expected,
            actual: self.status.to_string(),
        })
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Add a participant with status `NOT_READY`
    pub fn join(&mut self, user: Principal) -> AppResult<()> {
        self.require_status(&[RoomStatus::Waiting])?;
        if self.participant(&user.id).is_some() {
            return Err(AppError::AlreadyJoined);
        }
        if self.is_full() {
            return Err(AppError::RoomFull);
        }

        self.participants.push(Participant::new(user));
        self.touch();
        Ok(())
    }

    /// Remove a participant. An emptied room stays in its current state.
    pub fn leave(&mut self, user_id: &Uuid) -> AppResult<()> {
        self.require_status(&[RoomStatus::Waiting, RoomStatus::InProgress])?;
        let before = self.participants.len();
        self.participants.retain(|p| p.user.id != *user_id);
        if self.participants.len() == before {
            return Err(AppError::NotParticipant);
        }
        self.touch();
        Ok(())
    }

    pub fn set_ready(&mut self, user_id: &Uuid) -> AppResult<()> {
        self.require_status(&[RoomStatus::Waiting])?;
        self.participant_mut(user_id)?.status = ParticipantStatus::Ready;
        self.touch();
        Ok(())
    }

    /// Start the current round. Only the owner may start, and only once
    /// every participant is ready and the minimum headcount is met.
    pub fn start(&mut self, initiator: &Uuid) -> AppResult<()> {
        self.require_status(&[RoomStatus::Waiting])?;
        if !self.is_owner(initiator) {
            return Err(AppError::Unauthorized);
        }
        if self.participants.len() < MIN_PARTICIPANTS_TO_START {
            return Err(AppError::NotAllReady(format!(
                "at least {} participants are required, {} joined",
                MIN_PARTICIPANTS_TO_START,
                self.participants.len()
            )));
        }
        let not_ready = self
            .participants
            .iter()
            .filter(|p| p.status != ParticipantStatus::Ready)
            .count();
        if not_ready > 0 {
            return Err(AppError::NotAllReady(format!(
                "{} participant(s) not ready",
                not_ready
            )));
        }

        for participant in &mut self.participants {
            participant.status = ParticipantStatus::InProgress;
            participant.in_flight = false;
        }
        self.status = RoomStatus::InProgress;
        self.round_deadline = self
            .current_problem()
            .time_limit_secs
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));
        self.touch();
        Ok(())
    }

    /// Gate a new submission and mark the participant in flight
    pub fn begin_submission(&mut self, user_id: &Uuid) -> AppResult<RoundTicket> {
        self.require_status(&[RoomStatus::InProgress])?;
        let participant = self.participant_mut(user_id)?;
        if participant.in_flight {
            return Err(AppError::SubmissionInFlight);
        }
        if participant.status != ParticipantStatus::InProgress {
            return Err(AppError::AlreadySubmitted);
        }
        participant.in_flight = true;

        let problem = self.current_problem();
        Ok(RoundTicket {
            round: self.round_index,
            problem_id: problem.id,
            expected_output: problem.expected_output.clone(),
        })
    }

    /// Release the in-flight mark after an infrastructure failure so the
    /// participant can retry. Stale rounds and departed users are ignored.
    pub fn abort_submission(&mut self, user_id: &Uuid, round: u32) {
        if round != self.round_index {
            return;
        }
        if let Ok(participant) = self.participant_mut(user_id) {
            participant.in_flight = false;
        }
    }

    /// Fold a terminal verdict into the round score
    pub fn record_verdict(&mut self, user_id: &Uuid, round: u32, verdict: &Verdict) -> AppResult<()> {
        if self.status != RoomStatus::InProgress || round != self.round_index {
            return Err(AppError::RoundClosed(round));
        }
        let problem_id = self.current_problem().id;
        let participant = self.participant_mut(user_id)?;
        if participant.status != ParticipantStatus::InProgress {
            return Err(AppError::AlreadySubmitted);
        }

        participant.in_flight = false;
        participant.status = ParticipantStatus::Done;
        participant.scores.push(RoundScore {
            round,
            problem_id,
            verdict: verdict.kind,
            score: verdict.score,
            recorded_at: Utc::now(),
        });
        self.touch();
        Ok(())
    }

    /// True once every (at least one) participant is `DONE`
    pub fn is_round_complete(&self) -> bool {
        self.status == RoomStatus::InProgress
            && !self.participants.is_empty()
            && self
                .participants
                .iter()
                .all(|p| p.status == ParticipantStatus::Done)
    }

    pub fn is_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.round_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Close the current round. Without `force` every participant must be
    /// `DONE`; with it, stragglers are scored as `DID_NOT_FINISH`.
    pub fn complete_round(&mut self, force: bool) -> AppResult<RoundOutcome> {
        self.require_status(&[RoomStatus::InProgress])?;
        if !force && !self.is_round_complete() {
            let pending = self
                .participants
                .iter()
                .filter(|p| p.status != ParticipantStatus::Done)
                .count();
            return Err(AppError::RoundNotComplete(format!(
                "{} participant(s) still playing",
                pending
            )));
        }

        let round = self.round_index;
        let problem_id = self.current_problem().id;
        let dnf = Verdict::did_not_finish();
        let now = Utc::now();
        for participant in &mut self.participants {
            if participant.status != ParticipantStatus::Done {
                participant.scores.push(RoundScore {
                    round,
                    problem_id,
                    verdict: dnf.kind,
                    score: dnf.score,
                    recorded_at: now,
                });
            }
            participant.in_flight = false;
        }

        let scores = self
            .participants
            .iter()
            .map(|p| {
                let score = p.score_for_round(round).map(|s| s.score).unwrap_or(0);
                (p.user.id, score)
            })
            .collect();

        if round + 1 < self.total_rounds() {
            self.round_index += 1;
            self.status = RoomStatus::Waiting;
            for participant in &mut self.participants {
                participant.status = ParticipantStatus::NotReady;
            }
        } else {
            self.status = RoomStatus::Finished;
            for participant in &mut self.participants {
                participant.status = ParticipantStatus::Done;
            }
        }
        self.round_deadline = None;
        self.touch();

        Ok(RoundOutcome {
            round,
            next_status: self.status,
            scores,
        })
    }

    /// Owner-only settings change while waiting
    pub fn update(
        &mut self,
        initiator: &Uuid,
        title: Option<String>,
        capacity: Option<usize>,
    ) -> AppResult<()> {
        if !self.is_owner(initiator) {
            return Err(AppError::Unauthorized);
        }
        self.require_status(&[RoomStatus::Waiting])?;

        if let Some(capacity) = capacity {
            if capacity < MIN_PARTICIPANTS_TO_START || capacity < self.participants.len() {
                return Err(AppError::Validation(format!(
                    "Capacity must be at least {} and not below the {} current participants",
                    MIN_PARTICIPANTS_TO_START,
                    self.participants.len()
                )));
            }
            self.capacity = capacity;
        }
        if let Some(title) = title {
            self.title = title;
        }
        self.touch();
        Ok(())
    }

    /// Deletion is allowed from any state, but only by the owner
    pub fn authorize_delete(&self, initiator: &Uuid) -> AppResult<()> {
        if self.is_owner(initiator) {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Participants ordered by total score, ties broken by join order
    pub fn standings(&self) -> Vec<&Participant> {
        let mut ordered: Vec<&Participant> = self.participants.iter().collect();
        // stable sort keeps join order for ties
        ordered.sort_by(|a, b| b.total_score().cmp(&a.total_score()));
        ordered
    }

    /// Scores recorded for `round`, in join order
    pub fn round_scores(&self, round: u32) -> Vec<(&Principal, &RoundScore)> {
        self.participants
            .iter()
            .filter_map(|p| p.score_for_round(round).map(|s| (&p.user, s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, ExecutionResult};

    fn user(name: &str) -> Principal {
        Principal::new(Uuid::new_v4(), name)
    }

    fn problem(time_limit_secs: Option<u64>) -> RoomProblem {
        RoomProblem {
            id: Uuid::new_v4(),
            title: "Echo".to_string(),
            expected_output: Some("hi".to_string()),
            time_limit_secs,
        }
    }

    fn accepted() -> Verdict {
        let result = ExecutionResult {
            classification: Classification::Success,
            exit_code: 0,
            stdout: "hi\n".to_string(),
            stdout_truncated: false,
            stderr: String::new(),
            stderr_truncated: false,
            wall_time_ms: 40,
        };
        Verdict::scored(VerdictKind::Accepted, 100, &result)
    }

    /// Owner plus two joined, ready participants
    fn ready_room(rounds: usize) -> (Room, Principal, Principal, Principal) {
        let owner = user("owner");
        let problems = (0..rounds).map(|_| problem(None)).collect();
        let mut room = Room::new(owner.clone(), "duel", 4, problems).unwrap();
        let a = user("alice");
        let b = user("bob");
        room.join(a.clone()).unwrap();
        room.join(b.clone()).unwrap();
        room.set_ready(&a.id).unwrap();
        room.set_ready(&b.id).unwrap();
        (room, owner, a, b)
    }

    #[test]
    fn test_start_moves_everyone_in_progress() {
        let (mut room, owner, _, _) = ready_room(1);

        room.start(&owner.id).unwrap();

        assert_eq!(room.status, RoomStatus::InProgress);
        assert!(room
            .participants
            .iter()
            .all(|p| p.status == ParticipantStatus::InProgress));
    }

    #[test]
    fn test_start_requires_everyone_ready() {
        let owner = user("owner");
        let mut room = Room::new(owner.clone(), "duel", 4, vec![problem(None)]).unwrap();
        let a = user("alice");
        let b = user("bob");
        room.join(a.clone()).unwrap();
        room.join(b.clone()).unwrap();
        room.set_ready(&a.id).unwrap();

        let err = room.start(&owner.id).unwrap_err();
        assert!(matches!(err, AppError::NotAllReady(_)));
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[test]
    fn test_start_requires_two_participants() {
        let owner = user("owner");
        let mut room = Room::new(owner.clone(), "solo", 4, vec![problem(None)]).unwrap();
        let a = user("alice");
        room.join(a.clone()).unwrap();
        room.set_ready(&a.id).unwrap();

        assert!(matches!(room.start(&owner.id), Err(AppError::NotAllReady(_))));
    }

    #[test]
    fn test_only_owner_can_start() {
        let (mut room, _, a, _) = ready_room(1);
        assert!(matches!(room.start(&a.id), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut room = Room::new(user("owner"), "full", 4, vec![problem(None)]).unwrap();
        for i in 0..4 {
            room.join(user(&format!("user{}", i))).unwrap();
        }

        let err = room.join(user("fifth")).unwrap_err();
        assert!(matches!(err, AppError::RoomFull));
        assert_eq!(room.participants.len(), 4);
    }

    #[test]
    fn test_join_twice_is_rejected() {
        let mut room = Room::new(user("owner"), "r", 4, vec![problem(None)]).unwrap();
        let a = user("alice");
        room.join(a.clone()).unwrap();
        assert!(matches!(room.join(a), Err(AppError::AlreadyJoined)));
    }

    #[test]
    fn test_join_only_while_waiting() {
        let (mut room, owner, _, _) = ready_room(1);
        room.start(&owner.id).unwrap();

        let err = room.join(user("late")).unwrap_err();
        assert!(matches!(err, AppError::InvalidRoomState { .. }));
    }

    #[test]
    fn test_leave_to_empty_keeps_state() {
        let (mut room, owner, a, b) = ready_room(1);
        room.start(&owner.id).unwrap();

        room.leave(&a.id).unwrap();
        room.leave(&b.id).unwrap();

        assert!(room.participants.is_empty());
        assert_eq!(room.status, RoomStatus::InProgress);
        assert!(!room.is_round_complete());
        assert!(matches!(room.leave(&a.id), Err(AppError::NotParticipant)));
    }

    #[test]
    fn test_second_submission_while_in_flight_is_rejected() {
        let (mut room, owner, a, _) = ready_room(1);
        room.start(&owner.id).unwrap();

        let ticket = room.begin_submission(&a.id).unwrap();
        assert_eq!(ticket.round, 0);
        assert_eq!(ticket.expected_output.as_deref(), Some("hi"));

        assert!(matches!(
            room.begin_submission(&a.id),
            Err(AppError::SubmissionInFlight)
        ));

        room.abort_submission(&a.id, ticket.round);
        assert!(room.begin_submission(&a.id).is_ok());
    }

    #[test]
    fn test_submission_requires_round_in_progress() {
        let (mut room, _, a, _) = ready_room(1);
        assert!(matches!(
            room.begin_submission(&a.id),
            Err(AppError::InvalidRoomState { .. })
        ));
    }

    #[test]
    fn test_recorded_verdict_finishes_participant() {
        let (mut room, owner, a, b) = ready_room(1);
        room.start(&owner.id).unwrap();

        let ticket = room.begin_submission(&a.id).unwrap();
        room.record_verdict(&a.id, ticket.round, &accepted()).unwrap();

        let alice = room.participant(&a.id).unwrap();
        assert_eq!(alice.status, ParticipantStatus::Done);
        assert_eq!(alice.total_score(), 100);
        assert!(matches!(
            room.begin_submission(&a.id),
            Err(AppError::AlreadySubmitted)
        ));
        assert!(!room.is_round_complete());

        let ticket = room.begin_submission(&b.id).unwrap();
        room.record_verdict(&b.id, ticket.round, &Verdict::did_not_finish())
            .unwrap();
        assert!(room.is_round_complete());

        let outcome = room.complete_round(false).unwrap();
        assert_eq!(outcome.next_status, RoomStatus::Finished);
        assert_eq!(outcome.scores, vec![(a.id, 100), (b.id, 0)]);
        assert_eq!(room.status, RoomStatus::Finished);
    }

    #[test]
    fn test_forced_completion_scores_stragglers() {
        let (mut room, owner, a, b) = ready_room(1);
        room.start(&owner.id).unwrap();
        let ticket = room.begin_submission(&a.id).unwrap();
        room.record_verdict(&a.id, ticket.round, &accepted()).unwrap();

        assert!(matches!(
            room.complete_round(false),
            Err(AppError::RoundNotComplete(_))
        ));

        room.complete_round(true).unwrap();
        let bob = room.participant(&b.id).unwrap();
        assert_eq!(bob.scores[0].verdict, VerdictKind::DidNotFinish);
        assert_eq!(bob.total_score(), 0);
    }

    #[test]
    fn test_late_verdict_for_closed_round_is_rejected() {
        let (mut room, owner, a, _) = ready_room(1);
        room.start(&owner.id).unwrap();
        let ticket = room.begin_submission(&a.id).unwrap();
        room.complete_round(true).unwrap();

        let err = room.record_verdict(&a.id, ticket.round, &accepted()).unwrap_err();
        assert!(matches!(err, AppError::RoundClosed(0)));
    }

    #[test]
    fn test_multi_round_returns_to_waiting() {
        let (mut room, owner, a, b) = ready_room(2);
        room.start(&owner.id).unwrap();
        room.complete_round(true).unwrap();

        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.round_index, 1);
        assert!(room
            .participants
            .iter()
            .all(|p| p.status == ParticipantStatus::NotReady));

        room.set_ready(&a.id).unwrap();
        room.set_ready(&b.id).unwrap();
        room.start(&owner.id).unwrap();
        room.complete_round(true).unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.participant(&a.id).unwrap().scores.len(), 2);
    }

    #[test]
    fn test_deadline_is_set_from_problem_limit() {
        let owner = user("owner");
        let mut room = Room::new(owner.clone(), "timed", 2, vec![problem(Some(60))]).unwrap();
        let a = user("alice");
        let b = user("bob");
        room.join(a.clone()).unwrap();
        room.join(b.clone()).unwrap();
        room.set_ready(&a.id).unwrap();
        room.set_ready(&b.id).unwrap();
        room.start(&owner.id).unwrap();

        assert!(room.round_deadline.is_some());
        assert!(!room.is_deadline_passed(Utc::now()));
        assert!(room.is_deadline_passed(Utc::now() + Duration::seconds(61)));
    }

    #[test]
    fn test_update_rules() {
        let (mut room, owner, a, _) = ready_room(1);

        assert!(matches!(
            room.update(&a.id, Some("x".into()), None),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            room.update(&owner.id, None, Some(1)),
            Err(AppError::Validation(_))
        ));

        room.update(&owner.id, Some("renamed".into()), Some(3)).unwrap();
        assert_eq!(room.title, "renamed");
        assert_eq!(room.capacity, 3);
    }

    #[test]
    fn test_standings_order_by_score_then_join() {
        let (mut room, owner, a, b) = ready_room(1);
        room.start(&owner.id).unwrap();
        let ticket = room.begin_submission(&b.id).unwrap();
        room.record_verdict(&b.id, ticket.round, &accepted()).unwrap();
        room.complete_round(true).unwrap();

        let standings: Vec<Uuid> = room.standings().iter().map(|p| p.user.id).collect();
        assert_eq!(standings, vec![b.id, a.id]);
    }

    #[test]
    fn test_delete_is_owner_only() {
        let (room, owner, a, _) = ready_room(1);
        assert!(room.authorize_delete(&owner.id).is_ok());
        assert!(matches!(room.authorize_delete(&a.id), Err(AppError::Unauthorized)));
    }
}
