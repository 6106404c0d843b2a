/// Reusable view pieces
///
/// - Canvas busy indicator (spinner.rs)
/// - Full-size preview overlay (modal.rs)

pub mod modal;
pub mod spinner;
