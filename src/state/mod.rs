/// State management module
///
/// This module handles all application state, including:
/// - The output aspect ratios (aspect.rs)
/// - The per-run session and its transitions (session.rs)

pub mod aspect;
pub mod session;
