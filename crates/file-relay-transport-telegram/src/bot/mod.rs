/// Telegram media delivery for resolved links
pub mod delivery;
/// Mapping from Telegram messages to relay events
pub mod events;
/// Message handlers
pub mod handlers;
/// View layer for UI components (keyboards, messages)
pub mod views;
