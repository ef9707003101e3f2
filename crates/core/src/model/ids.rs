use std::fmt;

/// Identity of a question within a loaded bank.
///
/// Assigned at load time from the row position, so two rows with the same text are
/// still distinct questions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(u64);

impl QuestionId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_display_and_debug() {
        let id = QuestionId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "QuestionId(42)");
    }
}
