pub mod playlist;
pub mod report;

pub use playlist::{ChannelEntry, Playlist, UpstreamEntry};
pub use report::{DeadStream, Liveness, MatchSource, ProbeReport, ReconcileReport, StreamChange};
