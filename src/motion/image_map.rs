use std::collections::BTreeMap;

use tracing::warn;

/// Keyframe-to-image assignments for batch foregrounds.
///
/// Text form: `frame:index` records joined by `|`. Indices are kept signed so
/// a bad index can be detected and replaced with image 0 at lookup time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMap {
    entries: BTreeMap<u32, i64>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text form, skipping unreadable records with a warning
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();

        for record in text.split('|').map(str::trim).filter(|r| !r.is_empty()) {
            let parsed = record.split_once(':').and_then(|(frame, index)| {
                Some((frame.trim().parse::<u32>().ok()?, index.trim().parse::<i64>().ok()?))
            });

            match parsed {
                Some((frame, index)) => {
                    map.entries.insert(frame, index);
                }
                None => warn!("Skipping image map record '{}'", record),
            }
        }

        map
    }

    pub fn insert(&mut self, frame: u32, index: i64) {
        self.entries.insert(frame, index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the image to draw at `frame` out of `image_count` images.
    ///
    /// Uses the greatest mapped frame at or before `frame`, or the smallest
    /// mapped frame when `frame` precedes them all. Unmapped or out-of-range
    /// selections fall back to image 0.
    pub fn index_for_frame(&self, frame: u32, image_count: usize) -> usize {
        let selected = self
            .entries
            .range(..=frame)
            .next_back()
            .or_else(|| self.entries.iter().next())
            .map(|(_, index)| *index)
            .unwrap_or(0);

        match usize::try_from(selected) {
            Ok(index) if index < image_count => index,
            _ => 0,
        }
    }
}

impl FromIterator<(u32, i64)> for ImageMap {
    fn from_iter<I: IntoIterator<Item = (u32, i64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
