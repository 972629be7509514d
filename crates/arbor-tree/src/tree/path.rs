use std::fmt;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The location of a node relative to a root, as a sequence of zero-based
/// child indices. The empty path denotes the root itself.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(SmallVec<[usize; 8]>);

impl Path {
    /// Creates the empty (root) path.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn of(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Returns the child index of the last path element, `None` for the root path.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Returns the path of the parent node, `None` for the root path.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(SmallVec::from_slice(&self.0[..self.0.len() - 1])))
        }
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    /// Returns a new path with `other` appended to `self`.
    pub fn append(&self, other: &Path) -> Path {
        let mut path = self.clone();
        path.0.extend_from_slice(&other.0);
        path
    }
}

impl Index<usize> for Path {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self::of(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self::of(&indices)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(indices))
    }
}

impl FromIterator<usize> for Path {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", itertools::join(self.0.iter(), ", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Path::new(), None)]
    #[case(Path::of(&[3]), Some(Path::new()))]
    #[case(Path::of(&[0, 2, 1]), Some(Path::of(&[0, 2])))]
    fn test_parent(#[case] path: Path, #[case] expected: Option<Path>) {
        assert_eq!(path.parent(), expected);
    }

    #[test]
    fn test_append() {
        let path = Path::of(&[1, 2]).append(&Path::of(&[0]));
        assert_eq!(path, Path::from([1, 2, 0]));
        assert_eq!(path.last(), Some(0));
        assert_eq!(path[1], 2);
    }

    #[rstest]
    #[case(Path::new(), "[]")]
    #[case(Path::of(&[0, 11, 4]), "[0, 11, 4]")]
    fn test_display(#[case] path: Path, #[case] expected: &str) {
        assert_eq!(path.to_string(), expected);
    }
}
