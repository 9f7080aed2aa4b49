//! Named segments of the signature vector.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::agreement::AGREEMENT_DIM;
use crate::config::SignatureConfig;

/// Values in the drive-transition segment.
pub const DRIVE_DIM: usize = 6;
/// Values in the scalar segment.
pub const SCALAR_DIM: usize = 8;
/// Values in the trajectory segment.
pub const TRAJECTORY_DIM: usize = 7;

/// Segment kinds, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Initial/final drive, delta, relative descent, cycle offset, event flag.
    Drive,
    /// Per-channel `after - before`.
    ChannelDeltas,
    /// One-hot of the final state label.
    FinalState,
    /// One-hot of the highest scoring after-channel.
    DominantChannel,
    /// Satisfaction, amplified urgency, counts and coverage.
    Scalars,
    /// Marker means, crisis, healing, activation.
    Trajectory,
    /// [`AgreementMetrics::to_block`](crate::agreement::AgreementMetrics::to_block).
    Agreement,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Drive => "drive",
            SegmentKind::ChannelDeltas => "channel_deltas",
            SegmentKind::FinalState => "final_state",
            SegmentKind::DominantChannel => "dominant_channel",
            SegmentKind::Scalars => "scalars",
            SegmentKind::Trajectory => "trajectory",
            SegmentKind::Agreement => "agreement",
        };
        write!(f, "{}", name)
    }
}

/// One named range of the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment kind.
    pub kind: SegmentKind,
    /// Index range within the vector.
    pub range: Range<usize>,
}

/// Segment layout for one [`SignatureConfig`].
///
/// With the default 12 channels and 4 state labels:
///
/// ```text
/// drive 6 | channel_deltas 12 | final_state 4 | dominant_channel 12
/// scalars 8 | trajectory 7 | agreement 8                   = 57
/// ```
///
/// ```
/// use archetype_core::config::SignatureConfig;
/// use archetype_core::signature::{SegmentKind, SignatureLayout};
///
/// let layout = SignatureLayout::from_config(&SignatureConfig::default());
/// assert_eq!(layout.dimension(), 57);
/// assert_eq!(layout.range(SegmentKind::ChannelDeltas), Some(6..18));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureLayout {
    segments: Vec<Segment>,
    channels: Vec<String>,
    dimension: usize,
}

impl SignatureLayout {
    /// Compute the layout for a configuration.
    pub fn from_config(config: &SignatureConfig) -> Self {
        let channels = config.channels.len();
        let mut sizes = vec![
            (SegmentKind::Drive, DRIVE_DIM),
            (SegmentKind::ChannelDeltas, channels),
            (SegmentKind::FinalState, config.state_vocabulary.len()),
            (SegmentKind::DominantChannel, channels),
            (SegmentKind::Scalars, SCALAR_DIM),
        ];
        if config.include_trajectory {
            sizes.push((SegmentKind::Trajectory, TRAJECTORY_DIM));
        }
        sizes.push((SegmentKind::Agreement, AGREEMENT_DIM));

        let mut offset = 0;
        let segments = sizes
            .into_iter()
            .map(|(kind, len)| {
                let range = offset..offset + len;
                offset += len;
                Segment { kind, range }
            })
            .collect();

        Self {
            segments,
            channels: config.channels.clone(),
            dimension: offset,
        }
    }

    /// Total vector length `D`.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Segments in vector order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Ordered channel names of the per-channel segments.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Index range of a segment, `None` when the segment is disabled.
    pub fn range(&self, kind: SegmentKind) -> Option<Range<usize>> {
        self.segments
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.range.clone())
    }

    /// Slice a segment out of a vector with this layout.
    pub fn slice<'a>(&self, vector: &'a [f32], kind: SegmentKind) -> Option<&'a [f32]> {
        self.range(kind).and_then(|r| vector.get(r))
    }

    /// Length of [`project_transition`](Self::project_transition) output.
    pub fn transition_dimension(&self) -> usize {
        DRIVE_DIM + self.channels.len()
    }

    /// Compact projection used by transition families: the drive segment
    /// followed by the channel deltas.
    ///
    /// Short input is zero-filled so the output length is always
    /// [`transition_dimension`](Self::transition_dimension).
    pub fn project_transition(&self, vector: &[f32]) -> Vec<f32> {
        let mut projected = Vec::with_capacity(self.transition_dimension());
        for kind in [SegmentKind::Drive, SegmentKind::ChannelDeltas] {
            if let Some(range) = self.range(kind) {
                projected.extend(range.map(|i| vector.get(i).copied().unwrap_or(0.0)));
            }
        }
        projected
    }

    /// Channels ranked by the magnitude of their delta in `vector`,
    /// largest first, at most `limit` of them. Zero deltas are skipped.
    pub fn top_channels(&self, vector: &[f32], limit: usize) -> Vec<String> {
        let deltas = match self.slice(vector, SegmentKind::ChannelDeltas) {
            Some(deltas) => deltas,
            None => return Vec::new(),
        };
        let mut ranked: Vec<(usize, f32)> = deltas
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite() && v.abs() > f32::EPSILON)
            .map(|(i, v)| (i, v.abs()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(limit)
            .filter_map(|(i, _)| self.channels.get(i).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_contiguous() {
        let layout = SignatureLayout::from_config(&SignatureConfig::default());
        let mut expected_start = 0;
        for segment in layout.segments() {
            assert_eq!(segment.range.start, expected_start);
            expected_start = segment.range.end;
        }
        assert_eq!(expected_start, layout.dimension());
        assert_eq!(layout.dimension(), 57);
    }

    #[test]
    fn test_trajectory_disabled() {
        let config = SignatureConfig {
            include_trajectory: false,
            ..Default::default()
        };
        let layout = SignatureLayout::from_config(&config);
        assert_eq!(layout.dimension(), 50);
        assert!(layout.range(SegmentKind::Trajectory).is_none());
        assert_eq!(layout.range(SegmentKind::Agreement), Some(42..50));
    }

    #[test]
    fn test_project_transition() {
        let layout = SignatureLayout::from_config(&SignatureConfig::default());
        let vector: Vec<f32> = (0..57).map(|i| i as f32).collect();
        let projected = layout.project_transition(&vector);
        assert_eq!(projected.len(), layout.transition_dimension());
        assert_eq!(projected, (0..18).map(|i| i as f32).collect::<Vec<_>>());

        let short = layout.project_transition(&[1.0, 2.0]);
        assert_eq!(short.len(), 18);
        assert_eq!(short[2], 0.0);
    }

    #[test]
    fn test_top_channels() {
        let layout = SignatureLayout::from_config(&SignatureConfig::default());
        let mut vector = vec![0.0; 57];
        vector[6] = 0.1; // safety
        vector[7] = -0.6; // connection
        vector[10] = 0.3; // grounding
        let top = layout.top_channels(&vector, 2);
        assert_eq!(top, vec!["connection".to_string(), "grounding".to_string()]);
        assert_eq!(layout.top_channels(&vector, 10).len(), 3);
    }
}
