/// Aggregated view of session progress, useful for UI.
///
/// `total` is the number of prepared questions, which may be less than requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// 0-based index of the question on screen; equals `total` once complete.
    pub current: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}
