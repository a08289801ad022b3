//! Registry configuration.

/// Configuration for the room registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of live rooms. `create_room` fails with
    /// `CapacityExceeded` once this many exist.
    pub max_rooms: usize,

    /// Length of generated room codes, in lowercase-alphanumeric chars.
    pub code_length: usize,

    /// Command channel size per room actor (backpressure bound).
    pub channel_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_rooms: 1024,
            code_length: 6,
            channel_size: 64,
        }
    }
}
