//! Drives each duel one round at a time.
//!
//! Rounds within a duel are strictly sequential; round N+1 opens only when
//! round N leaves `AWAITING_NUMBERS`. The second submission of a round
//! resolves it **in the same call**: the status flip from `AWAITING_NUMBERS`
//! is the linearization point, so the fairness engine runs exactly once per
//! round and the stored outcome is authoritative — reads never recompute it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use chipduel_fairness::{
    determine_winner, time_slot, validate_player_number, PlatformSecret, PlayerEntry, RoundSeed,
};
use chipduel_lobby::{BalanceManager, LedgerBook, MatchedPair, OrderBook, ReliabilityTracker};
use chipduel_types::{
    constants, ChipduelError, Duel, DuelId, DuelStatus, EngineConfig, NotificationEvent, Notifier,
    OrderId, PlayerSlot, ReliabilityEvent, Result, Round, RoundId, RoundStatus,
    SubmitNumberRequest, SubmitNumberResponse, UserId, VerifyRequest, VerifyResponse,
};

use crate::rewards::RewardSettler;
use crate::sweeper::{DeadlineQueue, DeadlineTask};

/// What a lapsed round deadline found.
enum TimeoutKind {
    SingleAbsent(PlayerSlot),
    BothAbsent,
}

/// Top-level coordinator for every live duel.
pub struct DuelOrchestrator {
    config: EngineConfig,
    duels: HashMap<DuelId, Duel>,
    rounds: HashMap<RoundId, Round>,
    queue: DeadlineQueue,
    settler: RewardSettler,
}

impl DuelOrchestrator {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let settler = RewardSettler::new(config.settlement_cache_size);
        Self {
            config,
            duels: HashMap::new(),
            rounds: HashMap::new(),
            queue: DeadlineQueue::new(),
            settler,
        }
    }

    /// Schedule a creator confirmation deadline for the sweep to enforce.
    /// Called by the composition root right after a successful join.
    pub fn schedule_confirmation(&mut self, order_id: OrderId, deadline: DateTime<Utc>) {
        self.queue
            .push(deadline, DeadlineTask::ConfirmOrder { order_id });
    }

    /// Spawn a duel from a confirmed order and open round 1.
    pub fn start_duel(
        &mut self,
        lobby: &mut OrderBook,
        notifier: &dyn Notifier,
        pair: MatchedPair,
        now: DateTime<Utc>,
    ) -> Result<DuelId> {
        lobby.mark_in_progress(pair.order_id, now)?;

        let duel_id = DuelId::new();
        let duel = Duel {
            id: duel_id,
            order_id: pair.order_id,
            player_a: pair.owner,
            player_b: pair.joiner,
            stake_per_game: pair.stake_per_game,
            status: DuelStatus::InProgress,
            winner: None,
            score: chipduel_types::SeriesScore::new(pair.games_planned),
            started_at: now,
            finished_at: None,
        };
        self.duels.insert(duel_id, duel);
        self.open_round(notifier, duel_id, 1, now, now);

        tracing::info!(
            %duel_id,
            order_id = %pair.order_id,
            player_a = %pair.owner,
            player_b = %pair.joiner,
            games = pair.games_planned,
            "duel started"
        );
        Ok(duel_id)
    }

    /// Submit one player's number for a round. Idempotency is per player:
    /// a second submission from the same player fails with
    /// `AlreadySubmitted`. When the second number lands the round resolves
    /// immediately and, if the series is over, settlement runs.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_number(
        &mut self,
        secret: &PlatformSecret,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        lobby: &mut OrderBook,
        notifier: &dyn Notifier,
        duel_id: DuelId,
        player: UserId,
        request: SubmitNumberRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmitNumberResponse> {
        validate_player_number(request.player_number)?;

        let duel = self
            .duels
            .get(&duel_id)
            .ok_or(ChipduelError::DuelNotFound(duel_id))?;
        let slot = duel.slot_of(player).ok_or(ChipduelError::NotADuelPlayer)?;

        let round_id = RoundId::derive(duel_id, request.round_index);
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(ChipduelError::RoundNotFound {
                duel_id,
                round_index: request.round_index,
            })?;

        if !round.status.is_open() {
            return Err(ChipduelError::RoundClosed {
                status: round.status,
            });
        }
        if round.deadline_passed(now) {
            // The sweep owns the forfeit; the submission is simply late.
            return Err(ChipduelError::DeadlinePassed);
        }
        if round.number_for(slot).is_some() {
            return Err(ChipduelError::AlreadySubmitted {
                round_index: request.round_index,
            });
        }

        round.set_number(slot, request.player_number);
        let both_ready = round.both_submitted();
        tracing::debug!(%duel_id, round = request.round_index, %player, both_ready, "number submitted");

        if both_ready {
            self.resolve_round(secret, notifier, duel_id, request.round_index, now)?;
            self.advance_series(balances, ledger, reliability, lobby, notifier, duel_id, now)?;
        }

        Ok(SubmitNumberResponse {
            submitted: true,
            both_ready,
            my_number: request.player_number,
        })
    }

    /// Enforce every lapsed deadline: confirmation windows via the lobby,
    /// round windows via forfeiture. Handlers are idempotent no-ops when
    /// the state already advanced. Returns how many timeouts acted.
    pub fn sweep(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        lobby: &mut OrderBook,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<u32> {
        let mut actions = 0;
        while let Some(task) = self.queue.pop_due(now) {
            let acted = match task {
                DeadlineTask::ConfirmOrder { order_id } => {
                    lobby.expire_confirmation(balances, ledger, reliability, order_id, now)?
                }
                DeadlineTask::RoundDeadline {
                    duel_id,
                    round_index,
                } => self.handle_round_timeout(
                    balances,
                    ledger,
                    reliability,
                    lobby,
                    notifier,
                    duel_id,
                    round_index,
                    now,
                )?,
            };
            if acted {
                actions += 1;
            }
        }
        Ok(actions)
    }

    /// Pass-through to the secret-free fairness verifier.
    pub fn verify(request: &VerifyRequest) -> Result<VerifyResponse> {
        chipduel_fairness::verify_outcome(
            &request.seed_slice,
            request.player_a_number,
            request.player_b_number,
            request.claimed_winner,
        )
    }

    /// Look up a duel.
    #[must_use]
    pub fn duel(&self, duel_id: DuelId) -> Option<&Duel> {
        self.duels.get(&duel_id)
    }

    /// Look up a stored round. Resolved rounds are authoritative — the
    /// engine is never re-run for a read.
    #[must_use]
    pub fn round(&self, duel_id: DuelId, round_index: u32) -> Option<&Round> {
        self.rounds.get(&RoundId::derive(duel_id, round_index))
    }

    /// The earliest pending deadline, for drivers that sleep between sweeps.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.queue.next_due()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Round deadline: submit window from `now`, clamped to the overall
    /// ceiling measured from duel start.
    fn round_deadline(&self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let by_window = now + self.config.submit_window();
        let by_ceiling = started_at + self.config.round_ceiling();
        by_window.min(by_ceiling)
    }

    fn open_round(
        &mut self,
        notifier: &dyn Notifier,
        duel_id: DuelId,
        round_index: u32,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        let deadline = self.round_deadline(started_at, now);
        let round = Round::open(duel_id, round_index, deadline);
        self.queue.push(
            deadline,
            DeadlineTask::RoundDeadline {
                duel_id,
                round_index,
            },
        );
        notifier.notify(&NotificationEvent::RoundStarted {
            duel_id,
            round_index,
            deadline,
        });
        tracing::debug!(%duel_id, round_index, %deadline, "round opened");
        self.rounds.insert(round.id, round);
    }

    /// Resolve a round whose second number just landed. The fairness engine
    /// runs exactly once; the `FINISHED` record it produces is final.
    fn resolve_round(
        &mut self,
        secret: &PlatformSecret,
        notifier: &dyn Notifier,
        duel_id: DuelId,
        round_index: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let round_id = RoundId::derive(duel_id, round_index);
        let duel = self
            .duels
            .get_mut(&duel_id)
            .ok_or(ChipduelError::DuelNotFound(duel_id))?;
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(ChipduelError::RoundNotFound {
                duel_id,
                round_index,
            })?;

        let (Some(number_a), Some(number_b)) = (round.player_a_number, round.player_b_number)
        else {
            return Err(ChipduelError::Internal(format!(
                "resolving round {round_index} of {duel_id} without both numbers"
            )));
        };

        let duel_key = duel.id.0.to_string();
        let player_a_key = duel.player_a.to_string();
        let player_b_key = duel.player_b.to_string();
        #[allow(clippy::cast_sign_loss)]
        let slot = time_slot(now.timestamp_millis().max(0) as u64);
        let seed = RoundSeed {
            duel_id: &duel_key,
            round_number: round_index,
            time_slot: slot,
            player_a: PlayerEntry {
                id: &player_a_key,
                number: number_a,
            },
            player_b: PlayerEntry {
                id: &player_b_key,
                number: number_b,
            },
        };
        let outcome = determine_winner(secret, &seed)?;

        round.status = RoundStatus::Finished;
        round.winner = outcome.winner.map(|s| duel.player_in(s));
        round.seed_slice = Some(outcome.seed_slice.clone());
        round.random_number = Some(outcome.random_number);
        round.resolved_at = Some(now);
        duel.score.record(outcome.winner);

        notifier.notify(&NotificationEvent::RoundResult {
            duel_id,
            round_index,
            winner: round.winner,
            seed_slice: outcome.seed_slice.clone(),
            random_number: outcome.random_number,
        });
        tracing::info!(
            %duel_id,
            round_index,
            random_number = outcome.random_number,
            seed_slice = %outcome.seed_slice,
            winner = ?round.winner,
            "round resolved"
        );
        Ok(())
    }

    /// After a resolved round: either settle the finished series or open
    /// the next round.
    #[allow(clippy::too_many_arguments)]
    fn advance_series(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        lobby: &mut OrderBook,
        notifier: &dyn Notifier,
        duel_id: DuelId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let duel = self
            .duels
            .get(&duel_id)
            .ok_or(ChipduelError::DuelNotFound(duel_id))?;
        if !duel.score.is_complete() {
            let started_at = duel.started_at;
            let next_index = duel.score.games_played + 1;
            self.open_round(notifier, duel_id, next_index, started_at, now);
            return Ok(());
        }

        let winner = self.settler.settle_completed(balances, ledger, duel)?;
        let duel = self
            .duels
            .get_mut(&duel_id)
            .ok_or(ChipduelError::DuelNotFound(duel_id))?;
        duel.status = DuelStatus::Completed;
        duel.winner = winner;
        duel.finished_at = Some(now);

        lobby.finalize_completed(duel.order_id, now)?;
        ledger.verify_disposition(duel.order_id)?;
        reliability.record(duel.player_a, ReliabilityEvent::DuelCompleted);
        reliability.record(duel.player_b, ReliabilityEvent::DuelCompleted);
        notifier.notify(&NotificationEvent::SeriesCompleted { duel_id, winner });
        tracing::info!(%duel_id, winner = ?winner, "series completed");
        Ok(())
    }

    /// A round deadline lapsed. Forfeit the absent side per the reward
    /// rules; a round everyone missed abandons the series.
    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn handle_round_timeout(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        lobby: &mut OrderBook,
        notifier: &dyn Notifier,
        duel_id: DuelId,
        round_index: u32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let round_id = RoundId::derive(duel_id, round_index);
        let Some(round) = self.rounds.get_mut(&round_id) else {
            return Ok(false);
        };
        if !round.status.is_open() || !round.deadline_passed(now) {
            return Ok(false);
        }
        let Some(duel) = self.duels.get_mut(&duel_id) else {
            return Ok(false);
        };
        if duel.status != DuelStatus::InProgress {
            return Ok(false);
        }

        let kind = match (round.player_a_number, round.player_b_number) {
            (Some(_), Some(_)) => return Ok(false),
            (Some(_), None) => TimeoutKind::SingleAbsent(PlayerSlot::B),
            (None, Some(_)) => TimeoutKind::SingleAbsent(PlayerSlot::A),
            (None, None) => TimeoutKind::BothAbsent,
        };

        match kind {
            TimeoutKind::SingleAbsent(absent) => {
                let present = absent.other();
                let forfeiter = duel.player_in(absent);
                let present_player = duel.player_in(present);
                // Completed games *before* this forfeit decide whether the
                // series terminates.
                let below_minimum = duel.score.games_played < constants::MIN_GAMES_REQUIRED;

                round.status = RoundStatus::Forfeited;
                round.winner = Some(present_player);
                round.resolved_at = Some(now);
                duel.score.record(Some(present));
                notifier.notify(&NotificationEvent::ForfeitApplied { duel_id, forfeiter });

                if below_minimum {
                    let opponent = self.settler.settle_forfeit(
                        balances,
                        ledger,
                        reliability,
                        duel,
                        forfeiter,
                    )?;
                    duel.status = DuelStatus::Completed;
                    duel.winner = Some(opponent);
                    duel.finished_at = Some(now);
                    lobby.finalize_completed(duel.order_id, now)?;
                    ledger.verify_disposition(duel.order_id)?;
                    reliability.record(opponent, ReliabilityEvent::DuelCompleted);
                    notifier.notify(&NotificationEvent::SeriesCompleted {
                        duel_id,
                        winner: Some(opponent),
                    });
                    tracing::warn!(%duel_id, %forfeiter, "series terminated by early forfeit");
                } else {
                    tracing::info!(%duel_id, round_index, %forfeiter, "round forfeited, series continues");
                    self.advance_series(
                        balances,
                        ledger,
                        reliability,
                        lobby,
                        notifier,
                        duel_id,
                        now,
                    )?;
                }
            }
            TimeoutKind::BothAbsent => {
                round.status = RoundStatus::Forfeited;
                round.resolved_at = Some(now);
                let player_a = duel.player_a;
                let player_b = duel.player_b;

                self.settler
                    .settle_abandoned(balances, ledger, reliability, duel)?;
                duel.status = DuelStatus::Completed;
                duel.winner = None;
                duel.finished_at = Some(now);
                lobby.finalize_completed(duel.order_id, now)?;
                ledger.verify_disposition(duel.order_id)?;
                for forfeiter in [player_a, player_b] {
                    notifier.notify(&NotificationEvent::ForfeitApplied { duel_id, forfeiter });
                }
                notifier.notify(&NotificationEvent::SeriesCompleted {
                    duel_id,
                    winner: None,
                });
                tracing::warn!(%duel_id, round_index, "series abandoned by both players");
            }
        }
        Ok(true)
    }
}
