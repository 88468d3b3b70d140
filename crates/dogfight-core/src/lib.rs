pub mod board;
pub mod net;
pub mod room;

/// Identifies one live transport connection. Allocated by the host.
pub type ConnectionId = u64;

/// Seat number inside a room: 0 for the creator, 1 for the joiner.
pub type PlayerIndex = u8;
