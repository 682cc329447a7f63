//! Traverser path history.

use rove_core::Value;

/// One hop in a traverser's history: the value it held and the labels of the
/// step that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Labels attached to the producing step.
    pub labels: Vec<String>,
    /// The value at this position in the path.
    pub value: Value,
}

/// The ordered history of values a traverser has moved through.
///
/// Labeled segments support later lookup (`path.get("a")`); unlabeled
/// segments only contribute to the object sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value with the given labels.
    pub fn extend(&mut self, value: Value, labels: &[String]) {
        self.segments.push(PathSegment { labels: labels.to_vec(), value });
    }

    /// Returns the value most recently bound to `label`, if any.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.labels.iter().any(|l| l == label))
            .map(|segment| &segment.value)
    }

    /// Returns the number of segments in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates over the values in order.
    pub fn objects(&self) -> impl Iterator<Item = &Value> {
        self.segments.iter().map(|segment| &segment.value)
    }

    /// Iterates over the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            if segment.labels.is_empty() {
                write!(f, "{}", segment.value)?;
            } else {
                write!(f, "{}:{}", segment.labels.join(","), segment.value)?;
            }
        }
        Ok(())
    }
}
