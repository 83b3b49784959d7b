/// Hard limits applied to configured values
/// Azure Service Bus hard limit for messages per receive or peek call
pub const AZURE_SERVICE_BUS_MAX_BATCH_SIZE: u32 = 2048;

/// Smallest usable batch size
pub const MIN_BATCH_SIZE: u32 = 1;

/// Maximum reasonable per-receive timeout (10 minutes)
pub const MAX_RECEIVE_TIMEOUT_SECS: u64 = 600;

/// A zero timeout would end every drain on its first receive
pub const MIN_RECEIVE_TIMEOUT_SECS: u64 = 1;
