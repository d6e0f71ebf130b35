/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// Questions to ask, or boards to clear.
    pub target: u32,
    pub achieved: u32,
    pub remaining: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn new(target: u32, achieved: u32, is_complete: bool) -> Self {
        Self {
            target,
            achieved,
            remaining: target.saturating_sub(achieved),
            is_complete,
        }
    }
}
