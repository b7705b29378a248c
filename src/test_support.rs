use tokio::sync::Mutex as AsyncMutex;

/// Serializes tests that read or write `INFRADESK_*` environment variables.
/// Sync tests take it with `.blocking_lock()`, async tests with `.lock().await`.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());
