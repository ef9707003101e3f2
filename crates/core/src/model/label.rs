use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Most options a question may carry (labels `a` through `e`).
pub const MAX_OPTIONS: usize = 5;

/// Fewest options a question may carry.
pub const MIN_OPTIONS: usize = 2;

/// Separator between labels in a multi-answer field (`a&c`).
pub const LABEL_SEPARATOR: char = '&';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelError {
    #[error("invalid option label: {0:?}")]
    Invalid(String),

    #[error("option index {0} has no label")]
    OutOfRange(usize),

    #[error("no option labels given")]
    Empty,
}

/// Single-letter label of an option in its displayed position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionLabel(u8);

impl OptionLabel {
    /// Label for the option at `index` (0 → `a`).
    ///
    /// # Errors
    ///
    /// Returns `LabelError::OutOfRange` when `index >= MAX_OPTIONS`.
    pub fn from_index(index: usize) -> Result<Self, LabelError> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < MAX_OPTIONS)
            .map(Self)
            .ok_or(LabelError::OutOfRange(index))
    }

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    #[must_use]
    pub fn as_char(self) -> char {
        char::from(b'a' + self.0)
    }
}

impl TryFrom<char> for OptionLabel {
    type Error = LabelError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        let lower = value.to_ascii_lowercase();
        if !lower.is_ascii_lowercase() {
            return Err(LabelError::Invalid(value.to_string()));
        }
        Self::from_index(usize::from(lower as u8 - b'a'))
            .map_err(|_| LabelError::Invalid(value.to_string()))
    }
}

impl FromStr for OptionLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::try_from(c),
            (None, _) => Err(LabelError::Empty),
            _ => Err(LabelError::Invalid(trimmed.to_string())),
        }
    }
}

impl fmt::Debug for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionLabel({})", self.as_char())
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Ordered set of option labels; equality is exact set equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LabelSet(BTreeSet<OptionLabel>);

impl LabelSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(label: OptionLabel) -> Self {
        Self(BTreeSet::from([label]))
    }

    pub fn insert(&mut self, label: OptionLabel) -> bool {
        self.0.insert(label)
    }

    #[must_use]
    pub fn contains(&self, label: OptionLabel) -> bool {
        self.0.contains(&label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = OptionLabel> + '_ {
        self.0.iter().copied()
    }

    /// First label that does not address one of `option_count` options.
    #[must_use]
    pub fn first_out_of_range(&self, option_count: usize) -> Option<OptionLabel> {
        self.iter().find(|label| label.index() >= option_count)
    }
}

impl FromIterator<OptionLabel> for LabelSet {
    fn from_iter<T: IntoIterator<Item = OptionLabel>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "{LABEL_SEPARATOR}")?;
            }
            write!(f, "{label}")?;
        }
        Ok(())
    }
}

/// Parses the bank's answer field: labels joined by `&` (`b`, `a&c`).
impl FromStr for LabelSet {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(LabelError::Empty);
        }
        s.split(LABEL_SEPARATOR)
            .map(str::parse::<OptionLabel>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(c: char) -> OptionLabel {
        OptionLabel::try_from(c).unwrap()
    }

    #[test]
    fn label_maps_index_to_letter() {
        assert_eq!(OptionLabel::from_index(0).unwrap().as_char(), 'a');
        assert_eq!(OptionLabel::from_index(4).unwrap().as_char(), 'e');
        assert_eq!(
            OptionLabel::from_index(5).unwrap_err(),
            LabelError::OutOfRange(5)
        );
    }

    #[test]
    fn label_parses_case_insensitively() {
        assert_eq!(label('C').index(), 2);
        assert!(OptionLabel::try_from('f').is_err());
        assert!(OptionLabel::try_from('1').is_err());
        assert!("ab".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn set_parses_multi_answer_field() {
        let set: LabelSet = " c & a ".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(label('a')));
        assert!(set.contains(label('c')));
        assert_eq!(set.to_string(), "a&c");
    }

    #[test]
    fn set_rejects_empty_and_invalid_fields() {
        assert_eq!("".parse::<LabelSet>().unwrap_err(), LabelError::Empty);
        assert_eq!("a&".parse::<LabelSet>().unwrap_err(), LabelError::Empty);
        assert!("a&z".parse::<LabelSet>().is_err());
    }

    #[test]
    fn set_equality_is_exact() {
        let correct: LabelSet = "a&c".parse().unwrap();
        assert_ne!(correct, "a".parse().unwrap());
        assert_ne!(correct, "a&c&d".parse().unwrap());
        assert_eq!(correct, "c&a".parse().unwrap());
    }

    #[test]
    fn reports_first_out_of_range_label() {
        let set: LabelSet = "a&d".parse().unwrap();
        assert_eq!(set.first_out_of_range(3), Some(label('d')));
        assert_eq!(set.first_out_of_range(4), None);
    }
}
