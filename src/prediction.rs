//! Client-side input prediction and reconciliation.
//!
//! [`PredictionReconciler`] keeps a bounded, ordered record of locally-applied
//! input commands. The game applies each input immediately (prediction) and
//! records it here; when an authoritative server state arrives, [`reconcile`]
//! trims every acknowledged entry from the history and hands the state to a
//! caller-supplied correction closure.
//!
//! The reconciliation policy is a *snap*: the correction fully replaces local
//! state, and unacknowledged inputs are NOT re-simulated on top of it. This is
//! a deliberate behavioral-parity decision, not an oversight - see
//! [`PredictionReconciler::reconcile`].
//!
//! [`reconcile`]: PredictionReconciler::reconcile

use std::collections::VecDeque;

use tracing::warn;

use crate::error::DriftlineError;
use crate::network::messages::GameStateUpdate;
use crate::{clock, Sequence};

/// Default maximum number of input records retained in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Authoritative server state that the reconciler can trim history against.
///
/// Implement this for whatever snapshot type your server sends. The only thing
/// the reconciler needs from it is the acknowledgment watermark.
pub trait AuthoritativeState {
    /// The highest local input sequence the server had processed when this
    /// state was captured. Return [`Sequence::NULL`] for "nothing processed
    /// yet" - the reconciler treats that as "nothing to reconcile".
    fn last_processed_input(&self) -> Sequence;
}

impl AuthoritativeState for GameStateUpdate {
    fn last_processed_input(&self) -> Sequence {
        self.last_processed_input
    }
}

/// One locally-applied input command in the prediction history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRecord<I> {
    /// Monotonic sequence number assigned by the input-producing side.
    pub sequence: Sequence,
    /// The opaque input payload; its structure is owned by gameplay code.
    pub input: I,
    /// Client-local wall-clock capture time, milliseconds since UNIX_EPOCH.
    /// Zero when the local clock was unusable at capture time.
    pub timestamp_ms: u64,
    /// Whether the input has been applied to the predicted local state.
    /// Always true at creation and never revised - prediction applies inputs
    /// unconditionally.
    pub applied: bool,
}

/// Configuration for [`PredictionReconciler`].
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. Use the
/// `..PredictionConfig::default()` pattern when constructing instances.
///
/// # Example
///
/// ```
/// use driftline::PredictionConfig;
///
/// // For high-latency connections, keep more unacknowledged history
/// let config = PredictionConfig {
///     history_limit: 200,
///     ..PredictionConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "PredictionConfig has no effect unless passed to PredictionReconciler::with_config()"]
pub struct PredictionConfig {
    /// Maximum number of input records retained. Once exceeded, the single
    /// oldest record is evicted per insertion, regardless of whether it has
    /// been acknowledged.
    ///
    /// Default: 100
    pub history_limit: usize,

    /// When false, [`reconcile`] is a complete no-op: history is untouched and
    /// the correction closure is never invoked.
    ///
    /// Default: true
    ///
    /// [`reconcile`]: PredictionReconciler::reconcile
    pub enable_reconciliation: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            enable_reconciliation: true,
        }
    }
}

impl PredictionConfig {
    /// Creates a new `PredictionConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration preset for high-latency connections.
    ///
    /// Retains more history so slow acknowledgments do not evict
    /// unacknowledged inputs.
    pub fn high_latency() -> Self {
        Self {
            history_limit: 240,
            enable_reconciliation: true,
        }
    }

    /// Configuration preset for minimal memory usage.
    pub fn minimal() -> Self {
        Self {
            history_limit: 32,
            enable_reconciliation: true,
        }
    }

    /// Configuration preset that records history but never corrects.
    ///
    /// Useful for offline play and replay capture, where there is no
    /// authoritative server to reconcile against.
    pub fn record_only() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            enable_reconciliation: false,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriftlineError::ConfigOutOfRange`] if `history_limit` is 0 or
    /// implausibly large.
    pub fn validate(&self) -> Result<(), DriftlineError> {
        const MAX_HISTORY_LIMIT: usize = 65536;
        if self.history_limit < 1 || self.history_limit > MAX_HISTORY_LIMIT {
            return Err(DriftlineError::ConfigOutOfRange {
                field: "history_limit",
                min: 1,
                max: MAX_HISTORY_LIMIT as u64,
                actual: self.history_limit as u64,
            });
        }
        Ok(())
    }
}

/// Bounded, ordered record of locally-applied inputs with snap reconciliation.
///
/// Generic over the input payload type `I`; the reconciler never interprets
/// the payload.
///
/// # Example
///
/// ```
/// use driftline::{GameStateUpdate, PredictionReconciler, Sequence};
///
/// let mut reconciler: PredictionReconciler<u8> = PredictionReconciler::new();
/// for seq in 0..5i64 {
///     reconciler.record_input(Sequence::new(seq), seq as u8);
/// }
///
/// let state = GameStateUpdate {
///     last_processed_input: Sequence::new(2),
///     ..GameStateUpdate::default()
/// };
/// let mut corrected = false;
/// reconciler.reconcile(&state, |_state| corrected = true);
///
/// assert!(corrected);
/// assert_eq!(reconciler.len(), 2); // sequences 3 and 4 remain
/// ```
#[derive(Debug)]
pub struct PredictionReconciler<I> {
    history: VecDeque<InputRecord<I>>,
    last_acknowledged: Sequence,
    /// Count of records evicted by the history bound before the server
    /// acknowledged them. Nonzero values mean reconciliation may reference
    /// inputs that are no longer recorded.
    unacked_evictions: u64,
    config: PredictionConfig,
}

impl<I> Default for PredictionReconciler<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> PredictionReconciler<I> {
    /// Creates a reconciler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(DEFAULT_HISTORY_LIMIT),
            last_acknowledged: Sequence::NULL,
            unacked_evictions: 0,
            config: PredictionConfig::default(),
        }
    }

    /// Creates a reconciler with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DriftlineError::ConfigOutOfRange`] if the configuration fails
    /// [`PredictionConfig::validate`].
    pub fn with_config(config: PredictionConfig) -> Result<Self, DriftlineError> {
        config.validate()?;
        Ok(Self {
            history: VecDeque::with_capacity(config.history_limit),
            last_acknowledged: Sequence::NULL,
            unacked_evictions: 0,
            config,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> PredictionConfig {
        self.config
    }

    /// Number of records currently in history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The highest sequence the server has acknowledged via [`reconcile`], or
    /// [`Sequence::NULL`] if nothing has been acknowledged yet.
    ///
    /// [`reconcile`]: Self::reconcile
    #[must_use]
    pub fn last_acknowledged(&self) -> Sequence {
        self.last_acknowledged
    }

    /// Count of records evicted by the history bound before acknowledgment.
    ///
    /// A nonzero value means the connection stalled (or the producer outran
    /// the server) long enough that reconciliation may reference inputs no
    /// longer in history.
    #[must_use]
    pub fn unacked_evictions(&self) -> u64 {
        self.unacked_evictions
    }

    /// Empties the history and resets acknowledgment tracking to the unset
    /// sentinel. Unconditional.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_acknowledged = Sequence::NULL;
    }

    /// Applies the history bound: evicts single oldest entries until the
    /// history fits `history_limit`. Eviction is unconditional - an entry can
    /// be evicted before the server acknowledged it, which is detected and
    /// counted but NOT prevented.
    fn enforce_history_limit(&mut self) {
        while self.history.len() > self.config.history_limit {
            if let Some(evicted) = self.history.pop_front() {
                if evicted.sequence > self.last_acknowledged {
                    if self.unacked_evictions == 0 {
                        warn!(
                            sequence = evicted.sequence.as_i64(),
                            "evicting input before server acknowledgment; history bound ({}) \
                             exceeded while acknowledgments lag",
                            self.config.history_limit
                        );
                    }
                    self.unacked_evictions += 1;
                }
            }
        }
    }
}

impl<I: Clone> PredictionReconciler<I> {
    /// Records one locally-applied input and returns the created record.
    ///
    /// The record is stamped with the current wall-clock time and
    /// `applied = true` (the predicted-applied assumption - the caller has
    /// already applied this input to local state). If the history exceeds the
    /// configured bound, the single oldest entry is evicted, acknowledged or
    /// not.
    ///
    /// Sequence numbers are not validated for uniqueness or monotonicity;
    /// that is the caller's responsibility.
    pub fn record_input(&mut self, sequence: Sequence, input: I) -> InputRecord<I> {
        let record = InputRecord {
            sequence,
            input,
            timestamp_ms: clock::millis_since_epoch().unwrap_or(0),
            applied: true,
        };
        self.history.push_back(record.clone());
        self.enforce_history_limit();
        record
    }

    /// Reconciles predicted local state against an authoritative server state.
    ///
    /// Reads the state's acknowledgment watermark; every history entry with
    /// `sequence <= last_processed_input` is removed, then `apply_correction`
    /// is invoked exactly once with the state. Returns the number of entries
    /// removed.
    ///
    /// No-ops (history unchanged, correction not invoked, returns 0) when
    /// reconciliation is disabled by configuration or when the state's
    /// watermark is [`Sequence::NULL`].
    ///
    /// # Known limitation
    ///
    /// This is a snap policy: the caller's correction fully replaces local
    /// state, and the remaining unacknowledged inputs are NOT re-simulated on
    /// top of the corrected state. Preserved deliberately for behavioral
    /// parity; do not "upgrade" to rollback-and-replay without a product
    /// decision.
    pub fn reconcile<S, F>(&mut self, state: &S, apply_correction: F) -> usize
    where
        S: AuthoritativeState,
        F: FnOnce(&S),
    {
        if !self.config.enable_reconciliation {
            return 0;
        }
        let acknowledged = state.last_processed_input();
        if !acknowledged.is_valid() {
            // Nothing to reconcile; not an error.
            return 0;
        }

        let before = self.history.len();
        self.history.retain(|record| record.sequence > acknowledged);
        let removed = before - self.history.len();

        if acknowledged > self.last_acknowledged {
            self.last_acknowledged = acknowledged;
        }

        apply_correction(state);
        removed
    }

    /// Returns a defensive copy of the current history, oldest-first.
    #[must_use]
    pub fn history(&self) -> Vec<InputRecord<I>> {
        self.history.iter().cloned().collect()
    }
}
