use std::fmt;

/// Coarse horizontal location of a detection within the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    /// Bucket a horizontal centroid into thirds of the frame width.
    ///
    /// A centroid sitting exactly on a band boundary belongs to the outer
    /// band, so a detection hovering on the line cannot flicker between
    /// buckets from frame to frame.
    pub fn bucket(center_x: f32, frame_width: u32) -> Self {
        let w = frame_width as f32;
        if center_x * 3.0 <= w {
            Position::Left
        } else if center_x * 3.0 >= 2.0 * w {
            Position::Right
        } else {
            Position::Center
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Center => "center",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionKind {
    Object,
    Face,
    Text,
}

/// One recognized entity in a frame.
///
/// Detections are plain values: a perceptor creates them for a processed
/// frame, the controller turns them into an utterance, and they are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub kind: DetectionKind,
    /// Class name for objects, person name (or "Unknown") for faces,
    /// recognized text for text lines.
    pub label: String,
    pub confidence: f32,
    pub position: Position,
}

impl Detection {
    pub fn new(
        kind: DetectionKind,
        label: impl Into<String>,
        confidence: f32,
        position: Position,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            confidence,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirds_of_a_300px_frame() {
        assert_eq!(Position::bucket(5.0, 300), Position::Left);
        assert_eq!(Position::bucket(150.0, 300), Position::Center);
        assert_eq!(Position::bucket(290.0, 300), Position::Right);
    }

    #[test]
    fn boundaries_fall_outward() {
        assert_eq!(Position::bucket(100.0, 300), Position::Left);
        assert_eq!(Position::bucket(200.0, 300), Position::Right);
    }

    #[test]
    fn bucketing_is_stable_across_repeated_calls() {
        for _ in 0..100 {
            assert_eq!(Position::bucket(100.0, 300), Position::Left);
        }
    }
}
