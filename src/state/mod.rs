/// State management module
///
/// This module handles all application state, including:
/// - The persistent image cache (cache.rs)
/// - Shared data structures (data.rs)
/// - Revocable preview references (preview.rs)
/// - Turning picked paths into selected files (selection.rs)
/// - The owned session: selection, results, batch phase (session.rs)

pub mod cache;
pub mod data;
pub mod preview;
pub mod selection;
pub mod session;
