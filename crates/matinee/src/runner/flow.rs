//! Per-user pending-input state for a runner instance.
//!
//! The next free-text message from a user in one of these states is
//! interpreted as that state's input instead of going through normal
//! dispatch. No TTL; abandoned state sits until overwritten or cancelled.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    AwaitingAdminPassword,
    AwaitingPrimaryChannel,
    AwaitingGateChannel,
    AwaitingCatalogEntry,
    AwaitingMovieInfo,
}
