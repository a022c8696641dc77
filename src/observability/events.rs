//! Observable events
//!
//! Store lifecycle, recovery and mutation events. Diagnostics that do
//! not fit a lifecycle step go through `Logger` directly.

use std::fmt;

use super::logger::Severity;

/// Lifecycle and mutation events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Store open begins
    OpenBegin,
    /// Store open complete
    OpenComplete,
    /// Configuration file loaded
    ConfigLoaded,

    // Ledger
    /// Stat file absent, counters derived from existing data
    LedgerBootstrap,
    /// Counters adjusted after recovery
    LedgerReconciled,

    // Index
    /// Index file loaded
    IndexLoaded,
    /// Index file rejected, falling back to rebuild
    IndexInvalid,
    /// Index rebuilt from record scan
    IndexRebuilt,

    // Journal
    /// Interrupted mutation found on open
    JournalRecoveryBegin,
    /// Interrupted mutation rolled forward
    JournalRecoveryComplete,
    /// Torn journal discarded
    JournalDiscarded,

    // Mutations
    /// Record inserted
    RecordInserted,
    /// Record updated
    RecordUpdated,
    /// Record deleted
    RecordDeleted,
    /// Mutation rejected before any state changed
    MutationRejected,
    /// Mutation failed after partially applying
    MutationFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::OpenBegin => "STORE_OPEN_BEGIN",
            Event::OpenComplete => "STORE_OPEN_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::LedgerBootstrap => "LEDGER_BOOTSTRAP",
            Event::LedgerReconciled => "LEDGER_RECONCILED",
            Event::IndexLoaded => "INDEX_LOADED",
            Event::IndexInvalid => "INDEX_INVALID",
            Event::IndexRebuilt => "INDEX_REBUILT",
            Event::JournalRecoveryBegin => "JOURNAL_RECOVERY_BEGIN",
            Event::JournalRecoveryComplete => "JOURNAL_RECOVERY_COMPLETE",
            Event::JournalDiscarded => "JOURNAL_DISCARDED",
            Event::RecordInserted => "RECORD_INSERTED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::MutationRejected => "MUTATION_REJECTED",
            Event::MutationFailed => "MUTATION_FAILED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordInserted | Event::RecordUpdated | Event::RecordDeleted => {
                Severity::Trace
            }
            Event::IndexInvalid
            | Event::JournalRecoveryBegin
            | Event::JournalDiscarded
            | Event::MutationRejected => Severity::Warn,
            Event::MutationFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
