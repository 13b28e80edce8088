// Homerow Layout Parser
// Turns a visual two-hand layout into per-hand key lists

use std::collections::HashMap;

use crate::key::{Hand, Key, PhysicalKey};

/// Token separating the left-hand group from the right-hand group in a row
pub const HAND_DELIMITER: char = '|';

/// Row index treated as the home row by convention
pub const HOME_ROW_INDEX: usize = 1;

/// Errors produced while parsing a layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout row {row} has no '|' between the hands: '{line}'")]
    MissingDelimiter { row: usize, line: String },

    #[error("layout row {row} has more than one '|': '{line}'")]
    ExtraDelimiter { row: usize, line: String },

    #[error("layout row {row} has no keys")]
    EmptyRow { row: usize },

    #[error("key '{key}' appears more than once in the layout")]
    DuplicateKey { key: Key },
}

/// A split keyboard layout.
///
/// Built from rows like `"q w e r t | y u i o p"`. Every key belongs to
/// exactly one hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    rows: Vec<Vec<Key>>,
    left: Vec<Key>,
    right: Vec<Key>,
    all: Vec<Key>,
    hands: HashMap<Key, Hand>,
}

impl KeyboardLayout {
    /// Parse layout rows
    ///
    /// # Examples
    /// ```
    /// use homerow_core::KeyboardLayout;
    /// let layout = KeyboardLayout::parse(&["q w e | i o p", "a s d | k l ;"]).unwrap();
    /// assert_eq!(layout.left().len(), 6);
    /// assert!(layout.is_opposite_hand("a", ";"));
    /// ```
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, LayoutError> {
        let mut layout = KeyboardLayout {
            rows: Vec::with_capacity(lines.len()),
            left: Vec::new(),
            right: Vec::new(),
            all: Vec::new(),
            hands: HashMap::new(),
        };

        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let groups: Vec<&str> = line.split(HAND_DELIMITER).collect();
            match groups.len() {
                1 => {
                    return Err(LayoutError::MissingDelimiter {
                        row,
                        line: line.to_string(),
                    })
                }
                2 => {}
                _ => {
                    return Err(LayoutError::ExtraDelimiter {
                        row,
                        line: line.to_string(),
                    })
                }
            }

            let mut row_keys = Vec::new();
            for (hand, group) in [(Hand::Left, groups[0]), (Hand::Right, groups[1])] {
                for token in group.split_whitespace() {
                    let key = Key::from(token);
                    if layout.hands.insert(key.clone(), hand).is_some() {
                        return Err(LayoutError::DuplicateKey { key });
                    }
                    match hand {
                        Hand::Left => layout.left.push(key.clone()),
                        Hand::Right => layout.right.push(key.clone()),
                    }
                    row_keys.push(key);
                }
            }

            if row_keys.is_empty() {
                return Err(LayoutError::EmptyRow { row });
            }
            layout.rows.push(row_keys);
        }

        layout.all = layout.left.iter().chain(layout.right.iter()).cloned().collect();
        Ok(layout)
    }

    /// Left-hand keys, row by row
    pub fn left(&self) -> &[Key] {
        &self.left
    }

    /// Right-hand keys, row by row
    pub fn right(&self) -> &[Key] {
        &self.right
    }

    /// All keys: left hand first, then right hand
    pub fn all(&self) -> &[Key] {
        &self.all
    }

    /// Keys of each row, left group then right group
    pub fn rows(&self) -> &[Vec<Key>] {
        &self.rows
    }

    /// The conventional home row (second row), if the layout has one
    pub fn home_row(&self) -> Option<&[Key]> {
        self.rows.get(HOME_ROW_INDEX).map(|row| row.as_slice())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.hands.contains_key(key)
    }

    /// The hand a key belongs to, or `None` for keys outside the layout
    pub fn hand_of(&self, key: &str) -> Option<Hand> {
        self.hands.get(key).copied()
    }

    /// Look up a key together with its hand
    pub fn physical_key(&self, key: &str) -> Option<PhysicalKey> {
        self.hands.get_key_value(key).map(|(key, &hand)| PhysicalKey {
            key: key.clone(),
            hand,
        })
    }

    /// True iff exactly one of the two keys is on the left hand.
    ///
    /// Keys outside the layout (thumb keys such as `spacebar`) count as
    /// not-left, so they pair with left-hand keys as opposite.
    pub fn is_opposite_hand(&self, key: &str, other: &str) -> bool {
        self.is_left(key) != self.is_left(other)
    }

    fn is_left(&self, key: &str) -> bool {
        self.hand_of(key) == Some(Hand::Left)
    }
}
