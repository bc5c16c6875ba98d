//! Reward settlement — disposes both escrowed stakes exactly once.
//!
//! Settlement paths:
//! 1. Completed series, strict leader: winner's own stake returns as a
//!    REFUND, the loser's stake transfers as a PAYOUT
//! 2. Completed series, equal wins: both stakes refunded (net-zero)
//! 3. Sub-minimum forfeit: opponent receives both full stakes as one
//!    FORFEIT_AWARD; the forfeiter's reliability takes the drop event
//! 4. Abandoned series (both missed): stakes refunded, both reliability
//!    records take the drop event
//!
//! Every path is guarded by [`SettlementGuard`] — a duel settles once.

use std::collections::{HashSet, VecDeque};

use chipduel_types::{
    constants, ChipduelError, Duel, DuelId, ReliabilityEvent, Result, TxKind, UserId,
};
use chipduel_lobby::{BalanceManager, LedgerBook, ReliabilityTracker};

// ---------------------------------------------------------------------------
// SettlementGuard
// ---------------------------------------------------------------------------

/// Prevents double-settlement of the same duel.
///
/// Internally stores a bounded set of settled `DuelId`s with LRU eviction.
/// When the set reaches `max_size`, the oldest entry is evicted to make room.
pub struct SettlementGuard {
    settled: HashSet<DuelId>,
    /// Insertion order for LRU eviction (front = oldest).
    order: VecDeque<DuelId>,
    max_size: usize,
}

impl SettlementGuard {
    /// Create a new guard with the given maximum cache size.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "SettlementGuard max_size must be > 0");
        Self {
            settled: HashSet::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Mark a duel as settled.
    ///
    /// # Errors
    /// Returns [`ChipduelError::DuelAlreadySettled`] on a repeat.
    pub fn mark_settled(&mut self, duel_id: DuelId) -> Result<()> {
        if self.settled.contains(&duel_id) {
            return Err(ChipduelError::DuelAlreadySettled(duel_id));
        }
        if self.settled.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.settled.remove(&oldest);
            }
        }
        self.settled.insert(duel_id);
        self.order.push_back(duel_id);
        Ok(())
    }

    /// Whether a duel has already been settled.
    #[must_use]
    pub fn is_settled(&self, duel_id: &DuelId) -> bool {
        self.settled.contains(duel_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RewardSettler
// ---------------------------------------------------------------------------

/// Executes stake disposition for finished series.
pub struct RewardSettler {
    guard: SettlementGuard,
}

impl RewardSettler {
    #[must_use]
    pub fn new(cache_size: usize) -> Self {
        Self {
            guard: SettlementGuard::new(cache_size),
        }
    }

    /// Settle a series that played out its planned games. Returns the
    /// series winner, or `None` for a drawn series.
    ///
    /// # Errors
    /// - `SeriesBelowMinimum` if fewer than the required games completed —
    ///   stakes stay escrowed and the series stays open
    /// - `DuelAlreadySettled` on a repeat settlement
    pub fn settle_completed(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        duel: &Duel,
    ) -> Result<Option<UserId>> {
        if duel.score.games_played < constants::MIN_GAMES_REQUIRED {
            return Err(ChipduelError::SeriesBelowMinimum {
                played: duel.score.games_played,
                required: constants::MIN_GAMES_REQUIRED,
            });
        }
        self.guard.mark_settled(duel.id)?;

        let total = duel.total_stake();
        match duel.score.leader() {
            Some(slot) => {
                let winner = duel.player_in(slot);
                let loser = duel.player_in(slot.other());

                // Winner's own stake comes home; the loser's transfers.
                balances.release_stake(winner, total)?;
                ledger.record(winner, TxKind::Refund, total, duel.order_id, Some(duel.id));
                balances.consume_stake(loser, total)?;
                balances.credit(winner, total);
                ledger.record(winner, TxKind::Payout, total, duel.order_id, Some(duel.id));

                tracing::info!(duel_id = %duel.id, %winner, payout = total, "series settled");
                Ok(Some(winner))
            }
            None => {
                // Equal wins: both stakes go back where they came from.
                for player in [duel.player_a, duel.player_b] {
                    balances.release_stake(player, total)?;
                    ledger.record(player, TxKind::Refund, total, duel.order_id, Some(duel.id));
                }
                tracing::info!(duel_id = %duel.id, "series drawn, stakes refunded");
                Ok(None)
            }
        }
    }

    /// Terminate a series on a sub-minimum forfeit: the opponent receives
    /// **both** full locked stakes; the forfeiter takes the drop event.
    /// Returns the awarded opponent.
    ///
    /// # Errors
    /// - `NotADuelPlayer` if the forfeiter is not in this duel
    /// - `DuelAlreadySettled` on a repeat settlement
    pub fn settle_forfeit(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        duel: &Duel,
        forfeiter: UserId,
    ) -> Result<UserId> {
        let slot = duel.slot_of(forfeiter).ok_or(ChipduelError::NotADuelPlayer)?;
        self.guard.mark_settled(duel.id)?;

        let opponent = duel.player_in(slot.other());
        let total = duel.total_stake();

        balances.consume_stake(forfeiter, total)?;
        balances.consume_stake(opponent, total)?;
        balances.credit(opponent, total * 2);
        ledger.record(
            opponent,
            TxKind::ForfeitAward,
            total * 2,
            duel.order_id,
            Some(duel.id),
        );
        reliability.record(forfeiter, ReliabilityEvent::DroppedBeforeMinGames);

        tracing::warn!(
            duel_id = %duel.id,
            %forfeiter,
            %opponent,
            award = total * 2,
            "series forfeited before minimum games"
        );
        Ok(opponent)
    }

    /// Terminate an abandoned series (both players missed the same
    /// deadline): stakes return to their owners, both records take the
    /// drop event.
    ///
    /// # Errors
    /// Returns `DuelAlreadySettled` on a repeat settlement.
    pub fn settle_abandoned(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        duel: &Duel,
    ) -> Result<()> {
        self.guard.mark_settled(duel.id)?;

        let total = duel.total_stake();
        for player in [duel.player_a, duel.player_b] {
            balances.release_stake(player, total)?;
            ledger.record(player, TxKind::Refund, total, duel.order_id, Some(duel.id));
            reliability.record(player, ReliabilityEvent::DroppedBeforeMinGames);
        }
        tracing::warn!(duel_id = %duel.id, "series abandoned by both players");
        Ok(())
    }

    /// Access the settlement guard.
    #[must_use]
    pub fn guard(&self) -> &SettlementGuard {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipduel_types::{DuelStatus, OrderId, PlayerSlot, SeriesScore};
    use chrono::Utc;

    fn make_duel(stake_per_game: i64, games_planned: u32) -> Duel {
        Duel {
            id: DuelId::new(),
            order_id: OrderId::new(),
            player_a: UserId::new(),
            player_b: UserId::new(),
            stake_per_game,
            status: DuelStatus::InProgress,
            winner: None,
            score: SeriesScore::new(games_planned),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Deposit and lock both players' stakes, as the lobby would have.
    fn fund_and_lock(
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        duel: &Duel,
        starting: i64,
    ) {
        for player in [duel.player_a, duel.player_b] {
            balances.deposit(player, starting);
            balances.lock_stake(player, duel.total_stake()).unwrap();
            ledger.record(
                player,
                TxKind::StakeLock,
                duel.total_stake(),
                duel.order_id,
                None,
            );
        }
    }

    #[test]
    fn win_transfers_losers_stake() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut settler = RewardSettler::new(100);
        let mut duel = make_duel(10, 3);
        fund_and_lock(&mut balances, &mut ledger, &duel, 100);
        duel.score.record(Some(PlayerSlot::A));
        duel.score.record(Some(PlayerSlot::A));
        duel.score.record(Some(PlayerSlot::B));

        let winner = settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap();
        assert_eq!(winner, Some(duel.player_a));

        // Winner nets +30, loser nets -30.
        assert_eq!(balances.balance(duel.player_a).available, 130);
        assert_eq!(balances.balance(duel.player_b).available, 70);
        assert_eq!(balances.balance(duel.player_a).escrowed, 0);
        assert_eq!(balances.balance(duel.player_b).escrowed, 0);
        ledger.verify_disposition(duel.order_id).unwrap();
    }

    #[test]
    fn draw_refunds_both_net_zero() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut settler = RewardSettler::new(100);
        let mut duel = make_duel(25, 2);
        fund_and_lock(&mut balances, &mut ledger, &duel, 200);
        duel.score.record(Some(PlayerSlot::A));
        duel.score.record(Some(PlayerSlot::B));

        let winner = settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap();
        assert_eq!(winner, None);
        assert_eq!(balances.balance(duel.player_a).available, 200);
        assert_eq!(balances.balance(duel.player_b).available, 200);
        ledger.verify_disposition(duel.order_id).unwrap();
    }

    #[test]
    fn below_minimum_keeps_stakes_escrowed() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut settler = RewardSettler::new(100);
        let mut duel = make_duel(10, 3);
        fund_and_lock(&mut balances, &mut ledger, &duel, 100);
        duel.score.record(Some(PlayerSlot::A));

        let err = settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap_err();
        assert!(matches!(
            err,
            ChipduelError::SeriesBelowMinimum {
                played: 1,
                required: 2
            }
        ));
        // Stakes untouched, duel not marked settled.
        assert_eq!(balances.balance(duel.player_a).escrowed, 30);
        assert!(!settler.guard().is_settled(&duel.id));
    }

    #[test]
    fn double_settlement_blocked() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut settler = RewardSettler::new(100);
        let mut duel = make_duel(10, 2);
        fund_and_lock(&mut balances, &mut ledger, &duel, 100);
        duel.score.record(Some(PlayerSlot::A));
        duel.score.record(Some(PlayerSlot::B));

        settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap();
        let err = settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap_err();
        assert!(matches!(err, ChipduelError::DuelAlreadySettled(_)));
    }

    #[test]
    fn forfeit_awards_both_stakes() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut reliability = ReliabilityTracker::new();
        let mut settler = RewardSettler::new(100);
        let duel = make_duel(10, 5);
        fund_and_lock(&mut balances, &mut ledger, &duel, 100);

        let before = balances.balance(duel.player_b).available;
        let awarded = settler
            .settle_forfeit(
                &mut balances,
                &mut ledger,
                &mut reliability,
                &duel,
                duel.player_a,
            )
            .unwrap();
        assert_eq!(awarded, duel.player_b);

        // Opponent's balance rises by exactly 2 × stake × games.
        assert_eq!(balances.balance(duel.player_b).available - before, 100);
        assert_eq!(balances.balance(duel.player_a).available, 50);
        assert_eq!(balances.balance(duel.player_a).escrowed, 0);

        // Forfeiter's coefficient strictly decreased.
        assert!(reliability.coefficient(duel.player_a) < 1.0);
        ledger.verify_disposition(duel.order_id).unwrap();
    }

    #[test]
    fn forfeit_by_stranger_rejected() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut reliability = ReliabilityTracker::new();
        let mut settler = RewardSettler::new(100);
        let duel = make_duel(10, 2);
        fund_and_lock(&mut balances, &mut ledger, &duel, 100);

        let err = settler
            .settle_forfeit(
                &mut balances,
                &mut ledger,
                &mut reliability,
                &duel,
                UserId::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ChipduelError::NotADuelPlayer));
        assert!(!settler.guard().is_settled(&duel.id));
    }

    #[test]
    fn abandoned_refunds_and_demotes_both() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut reliability = ReliabilityTracker::new();
        let mut settler = RewardSettler::new(100);
        let duel = make_duel(5, 2);
        fund_and_lock(&mut balances, &mut ledger, &duel, 50);

        settler
            .settle_abandoned(&mut balances, &mut ledger, &mut reliability, &duel)
            .unwrap();
        assert_eq!(balances.balance(duel.player_a).available, 50);
        assert_eq!(balances.balance(duel.player_b).available, 50);
        assert!(reliability.coefficient(duel.player_a) < 1.0);
        assert!(reliability.coefficient(duel.player_b) < 1.0);
        ledger.verify_disposition(duel.order_id).unwrap();
    }

    #[test]
    fn settlement_conserves_total_points() {
        let mut balances = BalanceManager::new();
        let mut ledger = LedgerBook::new();
        let mut settler = RewardSettler::new(100);
        let mut duel = make_duel(50, 10);
        fund_and_lock(&mut balances, &mut ledger, &duel, 1_000);
        for _ in 0..6 {
            duel.score.record(Some(PlayerSlot::B));
        }
        for _ in 0..4 {
            duel.score.record(Some(PlayerSlot::A));
        }

        let before = balances.total_points();
        settler
            .settle_completed(&mut balances, &mut ledger, &duel)
            .unwrap();
        assert_eq!(balances.total_points(), before);
    }

    #[test]
    fn guard_evicts_oldest() {
        let mut guard = SettlementGuard::new(2);
        let d1 = DuelId::new();
        let d2 = DuelId::new();
        let d3 = DuelId::new();
        guard.mark_settled(d1).unwrap();
        guard.mark_settled(d2).unwrap();
        guard.mark_settled(d3).unwrap();
        assert_eq!(guard.len(), 2);
        assert!(!guard.is_settled(&d1), "oldest entry should be evicted");
        assert!(guard.is_settled(&d2));
        assert!(guard.is_settled(&d3));
    }

    #[test]
    #[should_panic(expected = "max_size must be > 0")]
    fn zero_guard_size_panics() {
        let _ = SettlementGuard::new(0);
    }
}
