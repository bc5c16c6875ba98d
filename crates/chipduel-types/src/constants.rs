//! System-wide constants for the ChipDuel engine.

/// Minimum rounds an order may plan.
pub const MIN_GAMES_PER_ORDER: u32 = 2;

/// Maximum rounds an order may plan.
pub const MAX_GAMES_PER_ORDER: u32 = 10;

/// Rounds that must complete before rewards are released.
pub const MIN_GAMES_REQUIRED: u32 = 2;

/// Largest player number accepted by the fairness engine.
pub const PLAYER_NUMBER_MAX: u32 = 999_999;

/// Modulus applied to the HMAC prefix to derive the round random number.
pub const RANDOM_MODULUS: u32 = 1_000_000;

/// Length of the published seed slice in hex characters (32 bits).
pub const SEED_SLICE_LEN: usize = 8;

/// Width of the outcome reproducibility window in milliseconds.
pub const TIME_SLOT_MS: u64 = 30_000;

/// Default creator confirmation window in seconds.
pub const DEFAULT_CONFIRMATION_WINDOW_SECS: u32 = 120;

/// Default per-round submission window in seconds.
pub const DEFAULT_SUBMIT_WINDOW_SECS: u32 = 10;

/// Default overall per-round ceiling in seconds, measured from duel start.
pub const DEFAULT_ROUND_CEILING_SECS: u32 = 300;

/// Default age after which an unmatched order is reaped, in seconds.
pub const DEFAULT_OPEN_ORDER_TTL_SECS: u32 = 86_400;

/// Settlement guard cache size (number of duel IDs to remember).
pub const SETTLEMENT_GUARD_CACHE_SIZE: usize = 100_000;

/// Environment variable holding the platform secret.
pub const PLATFORM_SECRET_ENV: &str = "CHIPDUEL_PLATFORM_SECRET";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "ChipDuel";
