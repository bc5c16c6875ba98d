//! The order matching state machine.
//!
//! Every stake movement happens in the same atomic unit as the status
//! transition that caused it: all checks run first, and only then are the
//! balance, the ledger, and the order mutated together. A failed call
//! leaves no partial state behind.
//!
//! Concurrent `join` attempts on one open order are serialized by `&mut
//! self`; the status check is the compare-and-set — exactly one joiner
//! observes `OPEN`, the rest get `OrderNotAvailable`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use chipduel_types::{
    ChipType, ChipduelError, CreateOrderRequest, EngineConfig, NotificationEvent, Notifier, Order,
    OrderId, OrderStatus, Points, ReliabilityEvent, Result, TxKind, UserId,
};

use crate::balance_manager::BalanceManager;
use crate::ledger_book::LedgerBook;
use crate::reliability::ReliabilityTracker;

/// Everything the series plane needs to spawn a duel from a confirmed order.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair {
    pub order_id: OrderId,
    pub owner: UserId,
    pub joiner: UserId,
    pub stake_per_game: Points,
    pub games_planned: u32,
}

/// Holds every order and drives its lifecycle.
pub struct OrderBook {
    config: EngineConfig,
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            orders: HashMap::new(),
        }
    }

    /// Create an order, atomically debiting the owner's full stake.
    ///
    /// # Errors
    /// - `GamesOutOfRange` before any mutation
    /// - `InsufficientBalance` if the stake cannot be locked
    pub fn create(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        owner: UserId,
        chip: ChipType,
        games_planned: u32,
        now: DateTime<Utc>,
    ) -> Result<OrderId> {
        CreateOrderRequest {
            chip,
            games_planned,
        }
        .validate()?;

        let order_id = OrderId::new();
        let stake_per_game = chip.stake_per_game();
        let total_stake = stake_per_game * Points::from(games_planned);

        balances.lock_stake(owner, total_stake)?;
        ledger.record(owner, TxKind::StakeLock, total_stake, order_id, None);

        self.orders.insert(
            order_id,
            Order {
                id: order_id,
                owner,
                chip,
                stake_per_game,
                games_planned,
                status: OrderStatus::Open,
                opponent: None,
                confirmation_deadline: None,
                created_at: now,
                updated_at: now,
            },
        );
        tracing::info!(%order_id, %owner, chip = %chip, games_planned, total_stake, "order created");
        Ok(order_id)
    }

    /// Join an open order, atomically debiting the joiner's full stake and
    /// starting the creator confirmation window. Returns the deadline.
    ///
    /// # Errors
    /// - `OrderNotFound` / `OrderNotAvailable` / `SelfJoin` before any mutation
    /// - `InsufficientBalance` if the joiner's stake cannot be locked
    pub fn join(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        notifier: &dyn Notifier,
        order_id: OrderId,
        joiner: UserId,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let confirmation_window = self.config.confirmation_window();
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(ChipduelError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Open {
            return Err(ChipduelError::OrderNotAvailable {
                status: order.status,
            });
        }
        if joiner == order.owner {
            return Err(ChipduelError::SelfJoin);
        }

        let total_stake = order.total_stake();
        balances.lock_stake(joiner, total_stake)?;
        ledger.record(joiner, TxKind::StakeLock, total_stake, order_id, None);

        let deadline = now + confirmation_window;
        order.opponent = Some(joiner);
        order.confirmation_deadline = Some(deadline);
        transition(order, OrderStatus::WaitingCreatorConfirm, now)?;
        notifier.notify(&NotificationEvent::OpponentFound {
            order_id,
            owner: order.owner,
            joiner,
        });
        notifier.notify(&NotificationEvent::ConfirmationRequired {
            order_id,
            owner: order.owner,
            deadline,
        });
        tracing::info!(%order_id, %joiner, %deadline, "opponent joined, awaiting creator confirmation");
        Ok(deadline)
    }

    /// Creator confirms the joiner. Transitions to `MATCHED` and hands back
    /// the pair so the series plane can spawn the duel.
    ///
    /// # Errors
    /// - `OrderNotAvailable` outside `WAITING_CREATOR_CONFIRM`
    /// - `NotOrderOwner` for a non-owner caller
    /// - `ConfirmationExpired` past the deadline — the caller must resolve
    ///   the timeout via [`OrderBook::expire_confirmation`]
    pub fn confirm(
        &mut self,
        order_id: OrderId,
        caller: UserId,
        now: DateTime<Utc>,
    ) -> Result<MatchedPair> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(ChipduelError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::WaitingCreatorConfirm {
            return Err(ChipduelError::OrderNotAvailable {
                status: order.status,
            });
        }
        if caller != order.owner {
            return Err(ChipduelError::NotOrderOwner);
        }
        if order.confirmation_expired(now) {
            return Err(ChipduelError::ConfirmationExpired);
        }

        let joiner = order.opponent.ok_or_else(|| {
            ChipduelError::Internal(format!("order {order_id} awaiting confirm without joiner"))
        })?;

        transition(order, OrderStatus::Matched, now)?;
        tracing::info!(%order_id, owner = %order.owner, %joiner, "order matched");
        Ok(MatchedPair {
            order_id,
            owner: order.owner,
            joiner,
            stake_per_game: order.stake_per_game,
            games_planned: order.games_planned,
        })
    }

    /// Cancel an open order, refunding the owner's stake.
    ///
    /// # Errors
    /// - `NotOrderOwner` for a non-owner caller
    /// - `OrderNotCancellable` outside `OPEN` — an in-progress opponent is
    ///   handled by round timeouts, never by cancellation
    pub fn cancel(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        order_id: OrderId,
        caller: UserId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(ChipduelError::OrderNotFound(order_id))?;

        if caller != order.owner {
            return Err(ChipduelError::NotOrderOwner);
        }
        if order.status != OrderStatus::Open {
            return Err(ChipduelError::OrderNotCancellable {
                status: order.status,
            });
        }

        let total_stake = order.total_stake();
        balances.release_stake(order.owner, total_stake)?;
        ledger.record(order.owner, TxKind::Refund, total_stake, order_id, None);
        transition(order, OrderStatus::Cancelled, now)?;
        tracing::info!(%order_id, "order cancelled, stake refunded");
        Ok(())
    }

    /// Resolve a lapsed confirmation window: refund the joiner, charge the
    /// owner a missed confirmation, and re-list the order as `OPEN`.
    ///
    /// Idempotent — returns `Ok(false)` when the order already advanced or
    /// the deadline has not lapsed, so a late sweep is a no-op.
    pub fn expire_confirmation(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        reliability: &mut ReliabilityTracker,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(order) = self.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if order.status != OrderStatus::WaitingCreatorConfirm || !order.confirmation_expired(now) {
            return Ok(false);
        }

        let joiner = order.opponent.ok_or_else(|| {
            ChipduelError::Internal(format!("order {order_id} awaiting confirm without joiner"))
        })?;
        let total_stake = order.total_stake();

        balances.release_stake(joiner, total_stake)?;
        ledger.record(joiner, TxKind::Refund, total_stake, order_id, None);
        reliability.record(order.owner, ReliabilityEvent::MissedConfirmation);

        order.opponent = None;
        order.confirmation_deadline = None;
        transition(order, OrderStatus::Open, now)?;
        tracing::info!(%order_id, owner = %order.owner, "confirmation missed, order re-listed");
        Ok(true)
    }

    /// Reap an order past the open-order TTL, refunding every held stake.
    ///
    /// Idempotent — matched and terminal orders are left alone.
    pub fn expire_stale(
        &mut self,
        balances: &mut BalanceManager,
        ledger: &mut LedgerBook,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let ttl = self.config.open_order_ttl();
        let Some(order) = self.orders.get_mut(&order_id) else {
            return Ok(false);
        };
        if now <= order.created_at + ttl {
            return Ok(false);
        }
        if !matches!(
            order.status,
            OrderStatus::Open | OrderStatus::WaitingCreatorConfirm
        ) {
            return Ok(false);
        }

        let total_stake = order.total_stake();
        balances.release_stake(order.owner, total_stake)?;
        ledger.record(order.owner, TxKind::Refund, total_stake, order_id, None);
        if let Some(joiner) = order.opponent.take() {
            balances.release_stake(joiner, total_stake)?;
            ledger.record(joiner, TxKind::Refund, total_stake, order_id, None);
        }
        order.confirmation_deadline = None;
        transition(order, OrderStatus::Expired, now)?;
        tracing::info!(%order_id, "stale order expired, stakes refunded");
        Ok(true)
    }

    /// Flip a matched order to `IN_PROGRESS` when its duel starts.
    pub fn mark_in_progress(&mut self, order_id: OrderId, now: DateTime<Utc>) -> Result<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(ChipduelError::OrderNotFound(order_id))?;
        transition(order, OrderStatus::InProgress, now)
    }

    /// Finalize an in-progress order once its series has settled.
    pub fn finalize_completed(&mut self, order_id: OrderId, now: DateTime<Utc>) -> Result<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(ChipduelError::OrderNotFound(order_id))?;
        transition(order, OrderStatus::Completed, now)
    }

    /// Look up an order.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// All currently open orders.
    #[must_use]
    pub fn open_orders(&self) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.status == OrderStatus::Open)
            .collect()
    }

    /// Number of orders tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Enforce the lifecycle graph on every status write.
fn transition(order: &mut Order, to: OrderStatus, now: DateTime<Utc>) -> Result<()> {
    if !order.status.can_transition_to(to) {
        return Err(ChipduelError::InvalidTransition {
            from: order.status,
            to,
        });
    }
    order.status = to;
    order.updated_at = now;
    Ok(())
}
