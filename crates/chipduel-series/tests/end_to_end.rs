//! End-to-end integration tests across all three planes.
//!
//! These tests exercise the full wager lifecycle:
//! Stake Envelope (Lobby) -> Fairness Engine -> Finality Plane (Series)
//!
//! They verify that the planes work together correctly in realistic
//! scenarios: full series with payout, draw refunds, forfeits on both
//! sides of the minimum-games line, confirmation timeouts, join
//! exclusivity, and the ledger disposition invariant.

use chrono::{DateTime, TimeZone, Utc};

use chipduel_fairness::PlatformSecret;
use chipduel_lobby::{BalanceManager, LedgerBook, OrderBook, ReliabilityTracker};
use chipduel_series::{DuelOrchestrator, RecordingNotifier};
use chipduel_types::{
    ChipType, ChipduelError, DuelId, DuelStatus, EngineConfig, NotificationEvent, OrderId,
    OrderStatus, PlayerSlot, Points, RoundStatus, SubmitNumberRequest, UserId, VerifyRequest,
};

/// Fixed base instant so deadline arithmetic is exact in assertions.
fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn secs(n: i64) -> chrono::Duration {
    chrono::Duration::seconds(n)
}

/// Helper: the full wager pipeline — lobby, ledger, fairness, series.
struct DuelPipeline {
    lobby: OrderBook,
    balances: BalanceManager,
    ledger: LedgerBook,
    reliability: ReliabilityTracker,
    orchestrator: DuelOrchestrator,
    secret: PlatformSecret,
    notifier: RecordingNotifier,
    owner: UserId,
    joiner: UserId,
}

impl DuelPipeline {
    fn new() -> Self {
        let mut balances = BalanceManager::new();
        let owner = UserId::new();
        let joiner = UserId::new();
        balances.deposit(owner, 1_000);
        balances.deposit(joiner, 1_000);
        Self {
            lobby: OrderBook::new(EngineConfig::default()),
            balances,
            ledger: LedgerBook::new(),
            reliability: ReliabilityTracker::new(),
            orchestrator: DuelOrchestrator::new(EngineConfig::default()),
            secret: PlatformSecret::from_bytes(b"end-to-end-secret".to_vec()).unwrap(),
            notifier: RecordingNotifier::new(),
            owner,
            joiner,
        }
    }

    /// Create, join, confirm, and start a duel.
    fn open_duel(
        &mut self,
        chip: ChipType,
        games: u32,
        now: DateTime<Utc>,
    ) -> (OrderId, DuelId) {
        let order_id = self
            .lobby
            .create(
                &mut self.balances,
                &mut self.ledger,
                self.owner,
                chip,
                games,
                now,
            )
            .expect("create should succeed");
        let deadline = self
            .lobby
            .join(
                &mut self.balances,
                &mut self.ledger,
                &self.notifier,
                order_id,
                self.joiner,
                now,
            )
            .expect("join should succeed");
        self.orchestrator.schedule_confirmation(order_id, deadline);
        let pair = self
            .lobby
            .confirm(order_id, self.owner, now)
            .expect("confirm should succeed");
        let duel_id = self
            .orchestrator
            .start_duel(&mut self.lobby, &self.notifier, pair, now)
            .expect("start_duel should succeed");
        (order_id, duel_id)
    }

    fn submit(
        &mut self,
        duel_id: DuelId,
        player: UserId,
        round_index: u32,
        number: u32,
        now: DateTime<Utc>,
    ) -> chipduel_types::Result<chipduel_types::SubmitNumberResponse> {
        self.orchestrator.submit_number(
            &self.secret,
            &mut self.balances,
            &mut self.ledger,
            &mut self.reliability,
            &mut self.lobby,
            &self.notifier,
            duel_id,
            player,
            SubmitNumberRequest {
                round_index,
                player_number: number,
            },
            now,
        )
    }

    /// Both players submit; the round resolves on the second number.
    fn play_round(
        &mut self,
        duel_id: DuelId,
        round_index: u32,
        owner_number: u32,
        joiner_number: u32,
        now: DateTime<Utc>,
    ) {
        let owner = self.owner;
        let joiner = self.joiner;
        self.submit(duel_id, owner, round_index, owner_number, now)
            .expect("owner submission should succeed");
        let response = self
            .submit(duel_id, joiner, round_index, joiner_number, now)
            .expect("joiner submission should succeed");
        assert!(response.both_ready, "second submission must resolve");
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> u32 {
        self.orchestrator
            .sweep(
                &mut self.balances,
                &mut self.ledger,
                &mut self.reliability,
                &mut self.lobby,
                &self.notifier,
                now,
            )
            .expect("sweep should succeed")
    }

    fn available(&self, user: UserId) -> Points {
        self.balances.balance(user).available
    }
}

// =============================================================================
// Test: Full series across all three planes, stakes settled by round wins
// =============================================================================
#[test]
fn e2e_full_series_settles_by_round_wins() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, duel_id) = pipeline.open_duel(ChipType::Heart, 3, now);
    let total: Points = 30;

    // Both stakes escrowed while the series runs.
    assert_eq!(pipeline.available(pipeline.owner), 970);
    assert_eq!(pipeline.available(pipeline.joiner), 970);

    // Numbers differ so rounds are decisive (outcomes themselves are
    // HMAC-driven and read back from the stored rounds).
    pipeline.play_round(duel_id, 1, 100_000, 900_000, now);
    pipeline.play_round(duel_id, 2, 250_000, 750_000, now + secs(1));
    pipeline.play_round(duel_id, 3, 400_000, 600_000, now + secs(2));

    let duel = pipeline.orchestrator.duel(duel_id).unwrap().clone();
    assert_eq!(duel.status, DuelStatus::Completed);
    assert_eq!(duel.score.games_played, 3);
    assert_eq!(
        pipeline.lobby.get(order_id).unwrap().status,
        OrderStatus::Completed
    );

    // Settlement followed the aggregate score.
    match duel.score.leader() {
        Some(slot) => {
            let winner = duel.player_in(slot);
            let loser = duel.player_in(slot.other());
            assert_eq!(duel.winner, Some(winner));
            assert_eq!(pipeline.available(winner), 1_000 + total);
            assert_eq!(pipeline.available(loser), 1_000 - total);
        }
        None => {
            assert_eq!(duel.winner, None);
            assert_eq!(pipeline.available(pipeline.owner), 1_000);
            assert_eq!(pipeline.available(pipeline.joiner), 1_000);
        }
    }

    // Nothing left in escrow; every lock disposed exactly once.
    assert_eq!(pipeline.balances.balance(pipeline.owner).escrowed, 0);
    assert_eq!(pipeline.balances.balance(pipeline.joiner).escrowed, 0);
    pipeline.ledger.verify_disposition(order_id).unwrap();
    assert_eq!(pipeline.balances.total_points(), 2_000);

    // Both players completed the deal.
    assert_eq!(
        pipeline.reliability.record_of(pipeline.owner).completed_deals,
        1
    );
    assert_eq!(
        pipeline
            .reliability
            .record_of(pipeline.joiner)
            .completed_deals,
        1
    );
}

// =============================================================================
// Test: Draw at the minimum-games boundary is a net-zero transfer
// =============================================================================
#[test]
fn e2e_draw_series_returns_balances_to_premarch_levels() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, duel_id) = pipeline.open_duel(ChipType::Fire, 2, now);

    // Identical numbers are equidistant from any random number: every
    // round draws, so the series ends 0-0 after the planned two games.
    pipeline.play_round(duel_id, 1, 500_000, 500_000, now);
    pipeline.play_round(duel_id, 2, 123_123, 123_123, now + secs(1));

    let duel = pipeline.orchestrator.duel(duel_id).unwrap();
    assert_eq!(duel.status, DuelStatus::Completed);
    assert_eq!(duel.winner, None);
    assert_eq!(duel.score.draws, 2);

    assert_eq!(pipeline.available(pipeline.owner), 1_000);
    assert_eq!(pipeline.available(pipeline.joiner), 1_000);
    assert_eq!(pipeline.balances.balance(pipeline.owner).escrowed, 0);
    pipeline.ledger.verify_disposition(order_id).unwrap();
}

// =============================================================================
// Test: Forfeit before two completed games transfers both stakes
// =============================================================================
#[test]
fn e2e_forfeit_before_min_games_awards_both_stakes() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, duel_id) = pipeline.open_duel(ChipType::Fire, 5, now);
    let total: Points = 125;

    // Only the owner shows up for round 1.
    let owner = pipeline.owner;
    pipeline.submit(duel_id, owner, 1, 42, now).unwrap();

    let before_sweep = pipeline.available(pipeline.owner);
    let coefficient_before = pipeline.reliability.coefficient(pipeline.joiner);

    let actions = pipeline.sweep(now + secs(11));
    assert_eq!(actions, 1);

    // Opponent's balance rose by exactly 2 × stake × games planned.
    assert_eq!(
        pipeline.available(pipeline.owner) - before_sweep,
        2 * total
    );
    assert_eq!(pipeline.available(pipeline.owner), 1_000 + total);
    assert_eq!(pipeline.available(pipeline.joiner), 1_000 - total);
    assert_eq!(pipeline.balances.balance(pipeline.joiner).escrowed, 0);

    // Forfeiter's reliability strictly decreased.
    assert!(pipeline.reliability.coefficient(pipeline.joiner) < coefficient_before);

    let duel = pipeline.orchestrator.duel(duel_id).unwrap();
    assert_eq!(duel.status, DuelStatus::Completed);
    assert_eq!(duel.winner, Some(pipeline.owner));
    assert_eq!(
        pipeline.orchestrator.round(duel_id, 1).unwrap().status,
        RoundStatus::Forfeited
    );
    assert_eq!(
        pipeline.lobby.get(order_id).unwrap().status,
        OrderStatus::Completed
    );
    pipeline.ledger.verify_disposition(order_id).unwrap();
    assert_eq!(pipeline.balances.total_points(), 2_000);
}

// =============================================================================
// Test: A forfeited round after the minimum keeps the series alive
// =============================================================================
#[test]
fn e2e_forfeit_after_min_games_scores_round_and_continues() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, duel_id) = pipeline.open_duel(ChipType::Heart, 4, now);

    pipeline.play_round(duel_id, 1, 100, 200, now);
    pipeline.play_round(duel_id, 2, 300, 400, now + secs(1));

    // Round 3: the joiner goes silent.
    let owner = pipeline.owner;
    pipeline
        .submit(duel_id, owner, 3, 500, now + secs(2))
        .unwrap();
    pipeline.sweep(now + secs(13));

    let round3 = pipeline.orchestrator.round(duel_id, 3).unwrap();
    assert_eq!(round3.status, RoundStatus::Forfeited);
    assert_eq!(round3.winner, Some(pipeline.owner));
    assert!(round3.seed_slice.is_none(), "no fairness run for a forfeit");

    // The series carried on to round 4.
    let duel = pipeline.orchestrator.duel(duel_id).unwrap();
    assert_eq!(duel.status, DuelStatus::InProgress);
    assert_eq!(duel.score.games_played, 3);
    let round4 = pipeline.orchestrator.round(duel_id, 4).unwrap().clone();
    assert!(round4.status.is_open());

    // Finish it out and settle.
    let play_at = now + secs(14);
    assert!(!round4.deadline_passed(play_at));
    pipeline.play_round(duel_id, 4, 111_111, 888_888, play_at);

    let duel = pipeline.orchestrator.duel(duel_id).unwrap();
    assert_eq!(duel.status, DuelStatus::Completed);
    assert_eq!(duel.score.games_played, 4);
    pipeline.ledger.verify_disposition(order_id).unwrap();
    assert_eq!(pipeline.balances.total_points(), 2_000);
}

// =============================================================================
// Test: A round nobody played abandons the series with refunds
// =============================================================================
#[test]
fn e2e_abandoned_round_refunds_both_sides() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, duel_id) = pipeline.open_duel(ChipType::Smile, 3, now);

    let actions = pipeline.sweep(now + secs(11));
    assert_eq!(actions, 1);

    assert_eq!(pipeline.available(pipeline.owner), 1_000);
    assert_eq!(pipeline.available(pipeline.joiner), 1_000);
    assert!(pipeline.reliability.coefficient(pipeline.owner) < 1.0);
    assert!(pipeline.reliability.coefficient(pipeline.joiner) < 1.0);

    let duel = pipeline.orchestrator.duel(duel_id).unwrap();
    assert_eq!(duel.status, DuelStatus::Completed);
    assert_eq!(duel.winner, None);
    pipeline.ledger.verify_disposition(order_id).unwrap();
}

// =============================================================================
// Test: Confirmation timeout refunds the joiner and re-lists the order
// =============================================================================
#[test]
fn e2e_confirmation_timeout_relists_order() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let order_id = pipeline
        .lobby
        .create(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            pipeline.owner,
            ChipType::Heart,
            2,
            now,
        )
        .unwrap();
    let joiner = pipeline.joiner;
    let deadline = pipeline
        .lobby
        .join(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            &pipeline.notifier,
            order_id,
            joiner,
            now,
        )
        .unwrap();
    pipeline.orchestrator.schedule_confirmation(order_id, deadline);

    // The creator never confirms; the sweep resolves the timeout.
    let actions = pipeline.sweep(deadline + secs(1));
    assert_eq!(actions, 1);

    let order = pipeline.lobby.get(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.opponent, None);
    assert_eq!(pipeline.available(joiner), 1_000);
    assert_eq!(
        pipeline.reliability.record_of(pipeline.owner).total_deals,
        1
    );

    // A fresh joiner can take the re-listed order.
    let second = UserId::new();
    pipeline.balances.deposit(second, 100);
    pipeline
        .lobby
        .join(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            &pipeline.notifier,
            order_id,
            second,
            deadline + secs(2),
        )
        .unwrap();
    assert_eq!(
        pipeline.lobby.get(order_id).unwrap().status,
        OrderStatus::WaitingCreatorConfirm
    );
}

// =============================================================================
// Test: Join exclusivity — one winner, owner debited exactly once
// =============================================================================
#[test]
fn e2e_concurrent_join_exactly_one_succeeds() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let order_id = pipeline
        .lobby
        .create(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            pipeline.owner,
            ChipType::Ring,
            2,
            now,
        )
        .unwrap();

    let rivals: Vec<UserId> = (0..4).map(|_| UserId::new()).collect();
    for rival in &rivals {
        pipeline.balances.deposit(*rival, 1_000);
    }

    let mut successes = 0;
    for rival in &rivals {
        match pipeline.lobby.join(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            &pipeline.notifier,
            order_id,
            *rival,
            now,
        ) {
            Ok(_) => successes += 1,
            Err(err) => assert!(matches!(err, ChipduelError::OrderNotAvailable { .. })),
        }
    }
    assert_eq!(successes, 1, "exactly one join must win the race");

    // Owner's stake was debited exactly once, at creation.
    let owner_locks = pipeline
        .ledger
        .entries_for_order(order_id)
        .iter()
        .filter(|tx| tx.user_id == pipeline.owner && tx.kind.is_debit())
        .count();
    assert_eq!(owner_locks, 1);

    // Losing rivals keep their full balances.
    let winner_count = rivals
        .iter()
        .filter(|r| pipeline.available(**r) == 900)
        .count();
    assert_eq!(winner_count, 1);
}

// =============================================================================
// Test: Stored rounds verify publicly, without the platform secret
// =============================================================================
#[test]
fn e2e_stored_round_verifies_without_secret() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (_, duel_id) = pipeline.open_duel(ChipType::Heart, 2, now);

    pipeline.play_round(duel_id, 1, 314_159, 271_828, now);

    let duel = pipeline.orchestrator.duel(duel_id).unwrap().clone();
    let round = pipeline.orchestrator.round(duel_id, 1).unwrap().clone();
    let claimed: Option<PlayerSlot> = round.winner.and_then(|user| duel.slot_of(user));

    // Verification uses only public data: the slice, the numbers, the claim.
    let response = DuelOrchestrator::verify(&VerifyRequest {
        seed_slice: round.seed_slice.clone().unwrap(),
        player_a_number: round.player_a_number.unwrap(),
        player_b_number: round.player_b_number.unwrap(),
        claimed_winner: claimed,
    })
    .unwrap();
    assert!(response.agrees);
    assert_eq!(Some(response.random_number), round.random_number);

    // A tampered claim is flagged.
    let tampered = DuelOrchestrator::verify(&VerifyRequest {
        seed_slice: round.seed_slice.unwrap(),
        player_a_number: round.player_a_number.unwrap(),
        player_b_number: round.player_b_number.unwrap(),
        claimed_winner: claimed.map(PlayerSlot::other).or(Some(PlayerSlot::A)),
    })
    .unwrap();
    assert!(!tampered.agrees);
}

// =============================================================================
// Test: Notifications fire at every stage, in order
// =============================================================================
#[test]
fn e2e_notifications_cover_the_series() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (_, duel_id) = pipeline.open_duel(ChipType::Heart, 2, now);

    pipeline.play_round(duel_id, 1, 1, 2, now);
    pipeline.play_round(duel_id, 2, 3, 4, now + secs(1));

    let events = pipeline.notifier.events();
    assert!(matches!(events[0], NotificationEvent::OpponentFound { .. }));
    assert!(matches!(
        events[1],
        NotificationEvent::ConfirmationRequired { .. }
    ));
    let round_starts = events
        .iter()
        .filter(|e| matches!(e, NotificationEvent::RoundStarted { .. }))
        .count();
    let round_results = events
        .iter()
        .filter(|e| matches!(e, NotificationEvent::RoundResult { .. }))
        .count();
    assert_eq!(round_starts, 2);
    assert_eq!(round_results, 2);
    assert!(matches!(
        events.last(),
        Some(NotificationEvent::SeriesCompleted { duel_id: d, .. }) if *d == duel_id
    ));
}

// =============================================================================
// Test: Repeated sweeps never double-fire a timeout
// =============================================================================
#[test]
fn e2e_sweep_is_idempotent() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();
    let (order_id, _) = pipeline.open_duel(ChipType::Smile, 2, now);

    let first = pipeline.sweep(now + secs(11));
    assert_eq!(first, 1);
    let owner_after = pipeline.available(pipeline.owner);
    let joiner_after = pipeline.available(pipeline.joiner);

    // Sweeping again (and again) changes nothing.
    assert_eq!(pipeline.sweep(now + secs(12)), 0);
    assert_eq!(pipeline.sweep(now + secs(3_600)), 0);
    assert_eq!(pipeline.available(pipeline.owner), owner_after);
    assert_eq!(pipeline.available(pipeline.joiner), joiner_after);
    pipeline.ledger.verify_disposition(order_id).unwrap();
}

// =============================================================================
// Test: Ledger equality holds for every disposition path
// =============================================================================
#[test]
fn e2e_ledger_balances_across_mixed_outcomes() {
    let mut pipeline = DuelPipeline::new();
    let now = t0();

    // Path 1: cancelled order.
    let cancelled = pipeline
        .lobby
        .create(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            pipeline.owner,
            ChipType::Smile,
            2,
            now,
        )
        .unwrap();
    pipeline
        .lobby
        .cancel(
            &mut pipeline.balances,
            &mut pipeline.ledger,
            cancelled,
            pipeline.owner,
            now,
        )
        .unwrap();

    // Path 2: full series.
    let (settled, duel_id) = pipeline.open_duel(ChipType::Heart, 2, now);
    pipeline.play_round(duel_id, 1, 10, 20, now);
    pipeline.play_round(duel_id, 2, 30, 40, now + secs(1));

    // Path 3: early forfeit.
    let (forfeited, duel2) = pipeline.open_duel(ChipType::Fire, 3, now + secs(2));
    let owner = pipeline.owner;
    pipeline
        .submit(duel2, owner, 1, 7, now + secs(2))
        .unwrap();
    pipeline.sweep(now + secs(20));

    for order_id in [cancelled, settled, forfeited] {
        pipeline.ledger.verify_disposition(order_id).unwrap();
    }
    // Settlement only ever moves points between the two players.
    assert_eq!(pipeline.balances.total_points(), 2_000);
    assert_eq!(pipeline.balances.balance(pipeline.owner).escrowed, 0);
    assert_eq!(pipeline.balances.balance(pipeline.joiner).escrowed, 0);
}
