//! Wire protocols spoken by the relay.

pub mod rcon;
