//! Room service: room lifecycle and the submission pipeline

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::RoomConfig,
    db::{RoomRepository, SubmissionRepository},
    error::{AppError, AppResult},
    models::{
        Participant, Principal, Room, RoomProblem, RoomStatus, RoundOutcome, RoundScore,
        RoundTicket, Submission,
    },
    services::SubmissionEvaluator,
};

/// Input for creating a room
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub title: String,
    /// Falls back to the configured default
    pub capacity: Option<usize>,
    pub problems: Vec<RoomProblem>,
}

/// One line of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub user: Principal,
    pub total_score: u32,
    pub rounds_scored: usize,
}

/// Score of one participant for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundScoreEntry {
    pub user: Principal,
    #[serde(flatten)]
    pub score: RoundScore,
}

/// Coordinates room state with submission evaluation.
///
/// Holds no state of its own; rooms live in the repository behind their own
/// locks, and no room lock is ever held while code executes.
#[derive(Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    evaluator: Arc<SubmissionEvaluator>,
    config: RoomConfig,
}

impl RoomService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        evaluator: Arc<SubmissionEvaluator>,
        config: RoomConfig,
    ) -> Self {
        Self {
            rooms,
            submissions,
            evaluator,
            config,
        }
    }

    /// Create a room owned by `owner`
    pub async fn create(&self, owner: &Principal, input: NewRoom) -> AppResult<Room> {
        let capacity = input.capacity.unwrap_or(self.config.default_capacity);
        self.check_capacity(capacity)?;

        let room = Room::new(owner.clone(), input.title, capacity, input.problems)?;
        info!(room_id = %room.id, owner_id = %owner.id, capacity, rounds = room.total_rounds(), "Room created");

        let handle = self.rooms.insert(room).await?;
        let snapshot = handle.lock().await.clone();
        Ok(snapshot)
    }

    pub async fn get(&self, room_id: &Uuid) -> AppResult<Room> {
        let handle = self.rooms.get(room_id).await?;
        let room = handle.lock().await.clone();
        Ok(room)
    }

    pub async fn list(&self) -> AppResult<Vec<Room>> {
        self.rooms.list().await
    }

    /// Owner-only change of title and/or capacity while waiting
    pub async fn update(
        &self,
        principal: &Principal,
        room_id: &Uuid,
        title: Option<String>,
        capacity: Option<usize>,
    ) -> AppResult<Room> {
        if let Some(capacity) = capacity {
            self.check_capacity(capacity)?;
        }
        self.mutate(room_id, |room| room.update(&principal.id, title, capacity))
            .await
    }

    /// Owner-only removal, allowed from any state
    pub async fn delete(&self, principal: &Principal, room_id: &Uuid) -> AppResult<()> {
        let handle = self.rooms.get(room_id).await?;
        {
            let room = handle.lock().await;
            room.authorize_delete(&principal.id)?;
        }
        self.rooms.remove(room_id).await?;
        info!(room_id = %room_id, "Room deleted");
        Ok(())
    }

    pub async fn join(&self, principal: &Principal, room_id: &Uuid) -> AppResult<Room> {
        let user = principal.clone();
        let room = self.mutate(room_id, |room| room.join(user)).await?;
        debug!(room_id = %room_id, user_id = %principal.id, "Participant joined");
        Ok(room)
    }

    /// Leave the room. If the leaver was the last one still playing, the
    /// round closes as if their peers had just finished.
    pub async fn leave(&self, principal: &Principal, room_id: &Uuid) -> AppResult<Room> {
        let handle = self.rooms.get(room_id).await?;
        let mut room = handle.lock().await;
        room.leave(&principal.id)?;
        let completed = if room.is_round_complete() {
            Some(room.complete_round(false)?)
        } else {
            None
        };
        let snapshot = room.clone();
        drop(room);

        debug!(room_id = %room_id, user_id = %principal.id, "Participant left");
        if let Some(outcome) = completed {
            log_round_outcome(room_id, &outcome);
        }
        Ok(snapshot)
    }

    pub async fn ready(&self, principal: &Principal, room_id: &Uuid) -> AppResult<Room> {
        self.mutate(room_id, |room| room.set_ready(&principal.id))
            .await
    }

    /// Start the current round and arm its deadline, if any
    pub async fn start(&self, principal: &Principal, room_id: &Uuid) -> AppResult<Room> {
        let room = self
            .mutate(room_id, |room| room.start(&principal.id))
            .await?;
        info!(
            room_id = %room_id,
            round = room.round_index,
            participants = room.participants.len(),
            "Round started"
        );

        if let Some(deadline) = room.round_deadline {
            self.schedule_deadline(room.id, room.round_index, deadline);
        }
        Ok(room)
    }

    /// Evaluate a submission for the caller's current round.
    ///
    /// The room is locked only to admit the submission and to record its
    /// verdict; evaluation itself runs unlocked on its own task so that a
    /// dropped request cannot leave the participant stuck in flight.
    pub async fn submit(
        &self,
        principal: &Principal,
        room_id: &Uuid,
        language: &str,
        source: &str,
    ) -> AppResult<Submission> {
        self.evaluator.validate(language, source)?;

        let handle = self.rooms.get(room_id).await?;
        let ticket = {
            let mut room = handle.lock().await;
            // The deadline task may not have fired yet
            if room.is_deadline_passed(Utc::now()) {
                return Err(AppError::RoundClosed(room.round_index));
            }
            room.begin_submission(&principal.id)?
        };

        let submission = Submission::new(principal.id, *room_id, ticket.round, language, source);
        debug!(
            room_id = %room_id,
            user_id = %principal.id,
            submission_id = %submission.id(),
            round = ticket.round,
            "Submission admitted"
        );

        let service = self.clone();
        let user_id = principal.id;
        tokio::spawn(async move { service.finish_submission(user_id, ticket, submission).await })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("submission task failed: {}", e)))?
    }

    async fn finish_submission(
        &self,
        user_id: Uuid,
        ticket: RoundTicket,
        mut submission: Submission,
    ) -> AppResult<Submission> {
        let room_id = submission.room_id();
        let evaluated = self
            .evaluator
            .evaluate(&mut submission, ticket.expected_output.as_deref())
            .await;

        let handle = match self.rooms.get(&room_id).await {
            Ok(handle) => handle,
            Err(e) => {
                // Room deleted mid-evaluation; keep the user's history intact
                if evaluated.is_ok() {
                    self.submissions.save(submission).await?;
                }
                return Err(e);
            }
        };
        let mut room = handle.lock().await;

        let verdict = match evaluated {
            Ok(verdict) => verdict,
            Err(e) => {
                room.abort_submission(&user_id, ticket.round);
                warn!(room_id = %room_id, user_id = %user_id, "Submission not evaluated: {}", e);
                return Err(e);
            }
        };

        let recorded = room.record_verdict(&user_id, ticket.round, &verdict);
        let completed = if recorded.is_ok() && room.is_round_complete() {
            Some(room.complete_round(false)?)
        } else {
            None
        };
        drop(room);

        // Evaluated submissions are kept even when the round closed meanwhile
        self.submissions.save(submission.clone()).await?;
        recorded?;

        info!(
            room_id = %room_id,
            user_id = %user_id,
            submission_id = %submission.id(),
            verdict = ?verdict.kind,
            score = verdict.score,
            "Verdict recorded"
        );
        if let Some(outcome) = completed {
            log_round_outcome(&room_id, &outcome);
        }
        Ok(submission)
    }

    /// Force-close `round` if it is still open
    pub async fn expire_round(&self, room_id: &Uuid, round: u32) -> AppResult<Option<RoundOutcome>> {
        let handle = match self.rooms.get(room_id).await {
            Ok(handle) => handle,
            Err(AppError::RoomNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut room = handle.lock().await;
        if room.status != RoomStatus::InProgress || room.round_index != round {
            return Ok(None);
        }

        let outcome = room.complete_round(true)?;
        drop(room);

        log_round_outcome(room_id, &outcome);
        Ok(Some(outcome))
    }

    fn schedule_deadline(&self, room_id: Uuid, round: u32, deadline: DateTime<Utc>) {
        let service = self.clone();
        tokio::spawn(async move {
            let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match service.expire_round(&room_id, round).await {
                Ok(Some(_)) => debug!(room_id = %room_id, round, "Round closed by deadline"),
                Ok(None) => {}
                Err(e) => warn!(room_id = %room_id, round, "Failed to close round at deadline: {}", e),
            }
        });
    }

    pub async fn participants(&self, room_id: &Uuid) -> AppResult<Vec<Participant>> {
        Ok(self.get(room_id).await?.participants)
    }

    /// Scores for `round`, or for the latest scored round when `None`
    pub async fn round_scores(
        &self,
        room_id: &Uuid,
        round: Option<u32>,
    ) -> AppResult<Vec<RoundScoreEntry>> {
        let room = self.get(room_id).await?;
        let round = match round {
            Some(round) if round >= room.total_rounds() => {
                return Err(AppError::Validation(format!(
                    "Room has {} round(s), got round {}",
                    room.total_rounds(),
                    round
                )));
            }
            Some(round) => round,
            None => match latest_scored_round(&room) {
                Some(round) => round,
                None => return Ok(Vec::new()),
            },
        };

        Ok(room
            .round_scores(round)
            .into_iter()
            .map(|(user, score)| RoundScoreEntry {
                user: user.clone(),
                score: score.clone(),
            })
            .collect())
    }

    /// Leaderboard by total score; equal totals share a rank
    pub async fn standings(&self, room_id: &Uuid) -> AppResult<Vec<Standing>> {
        let room = self.get(room_id).await?;

        let mut standings: Vec<Standing> = Vec::with_capacity(room.participants.len());
        for (position, participant) in room.standings().into_iter().enumerate() {
            let total_score = participant.total_score();
            let rank = match standings.last() {
                Some(previous) if previous.total_score == total_score => previous.rank,
                _ => position + 1,
            };
            standings.push(Standing {
                rank,
                user: participant.user.clone(),
                total_score,
                rounds_scored: participant.scores.len(),
            });
        }
        Ok(standings)
    }

    /// Caller's own submissions, newest first
    pub async fn user_submissions(&self, principal: &Principal) -> AppResult<Vec<Submission>> {
        self.submissions.list_for_user(&principal.id).await
    }

    /// One of the caller's own submissions
    pub async fn get_submission(
        &self,
        principal: &Principal,
        submission_id: &Uuid,
    ) -> AppResult<Submission> {
        let submission = self.submissions.find_by_id(submission_id).await?;
        if submission.user_id() != principal.id {
            return Err(AppError::SubmissionNotFound(*submission_id));
        }
        Ok(submission)
    }

    /// Apply `change` under the room lock and return the resulting snapshot
    async fn mutate<F>(&self, room_id: &Uuid, change: F) -> AppResult<Room>
    where
        F: FnOnce(&mut Room) -> AppResult<()>,
    {
        let handle = self.rooms.get(room_id).await?;
        let mut room = handle.lock().await;
        change(&mut room)?;
        Ok(room.clone())
    }

    fn check_capacity(&self, capacity: usize) -> AppResult<()> {
        if capacity > self.config.max_capacity {
            return Err(AppError::Validation(format!(
                "Capacity cannot exceed {}",
                self.config.max_capacity
            )));
        }
        Ok(())
    }
}

fn latest_scored_round(room: &Room) -> Option<u32> {
    room.participants
        .iter()
        .flat_map(|p| p.scores.iter().map(|s| s.round))
        .max()
}

fn log_round_outcome(room_id: &Uuid, outcome: &RoundOutcome) {
    info!(
        room_id = %room_id,
        round = outcome.round,
        next_status = %outcome.next_status,
        scores = ?outcome.scores,
        "Round completed"
    );
}
