//! System-wide constants for the OpenCarbon registry core.

/// Default delay between accepting a pre-auth order and filling it,
/// in milliseconds.
pub const DEFAULT_FILL_DELAY_MS: u64 = 3_000;

/// Default interval of the background sweep (expired orders, epoch
/// rotation), in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;

/// Default maximum retirement leaves per anchoring epoch before sealing.
pub const DEFAULT_MAX_LEAVES_PER_EPOCH: usize = 1_024;

/// Maximum MRV document references attachable to one batch.
pub const MAX_MRV_REPORTS_PER_BATCH: usize = 256;

/// Maximum ticker length after canonicalization.
pub const MAX_TICKER_LEN: usize = 16;

/// Domain prefix for deterministic burn transaction references.
pub const BURN_TX_DOMAIN: &[u8] = b"opencarbon:burn:v1:";

/// Domain prefix for deterministic mint/anchor transaction references.
pub const MINT_TX_DOMAIN: &[u8] = b"opencarbon:anchor:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core name.
pub const CORE_NAME: &str = "OpenCarbon";
