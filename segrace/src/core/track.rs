use crate::core::error::SetupError;
use crate::core::race::SimConstants;
use serde::Deserialize;
use std::f64::consts::PI;

/// Corner radii below this value are clamped to it (negative radii encode the turn direction).
pub const MIN_CORNER_RADIUS: f64 = 1.0;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    Straight,
    Corner,
}

/// * `kind` - STRAIGHT or CORNER
/// * `length` - (m) Length of a straight (ignored for corners)
/// * `radius` - (m) Corner radius, the sign may encode the turn direction
/// * `angle` - (deg) Angle covered by a corner, the sign may encode the turn direction
#[derive(Debug, Deserialize, Clone)]
pub struct SegmentPars {
    pub kind: SegmentKind,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub angle: f64,
}

/// * `name` - Track name
/// * `segments` - Ordered list of segments, starting at the finish line
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TrackPars {
    pub name: String,
    pub segments: Vec<SegmentPars>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Straight { length: f64 },
    Corner { radius: f64, angle: f64, length: f64 },
}

impl Segment {
    /// corner creates a corner segment, its length is the arc length of the (clamped) radius.
    pub fn corner(radius: f64, angle: f64) -> Segment {
        let length = 2.0 * PI * clamp_radius(radius) * angle.abs() / 360.0;
        Segment::Corner {
            radius,
            angle,
            length,
        }
    }

    pub fn length(&self) -> f64 {
        match *self {
            Segment::Straight { length } => length,
            Segment::Corner { length, .. } => length,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Segment::Corner { .. })
    }

    /// speed_limit returns the maximum speed on the segment.
    ///
    /// * `straight`: the (already scaled) top speed of the car
    /// * `corner`: v = sqrt(r * g * grip)
    ///
    /// Both are limited by the physical speed ceiling.
    pub fn speed_limit(&self, v_straight: f64, grip: f64, sim_consts: &SimConstants) -> f64 {
        let v_max = match *self {
            Segment::Straight { .. } => v_straight,
            Segment::Corner { radius, .. } => {
                (clamp_radius(radius) * sim_consts.gravity * grip.max(0.0)).sqrt()
            }
        };
        v_max.min(sim_consts.v_ceiling).max(0.0)
    }
}

fn clamp_radius(radius: f64) -> f64 {
    radius.abs().max(MIN_CORNER_RADIUS)
}

#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub length: f64,
    segments: Vec<Segment>,
    s_seg_ends: Vec<f64>,
}

impl Track {
    pub fn new(track_pars: &TrackPars) -> Result<Track, SetupError> {
        if track_pars.segments.is_empty() {
            return Err(SetupError::EmptyTrack {
                name: track_pars.name.to_owned(),
            });
        }

        let mut segments = Vec::with_capacity(track_pars.segments.len());
        let mut s_seg_ends = Vec::with_capacity(track_pars.segments.len());
        let mut length = 0.0;

        for (idx, seg_pars) in track_pars.segments.iter().enumerate() {
            let segment = match seg_pars.kind {
                SegmentKind::Straight => Segment::Straight {
                    length: seg_pars.length,
                },
                SegmentKind::Corner => Segment::corner(seg_pars.radius, seg_pars.angle),
            };

            if !(segment.length() > 0.0 && segment.length().is_finite()) {
                return Err(SetupError::InvalidSegmentLength {
                    name: track_pars.name.to_owned(),
                    idx,
                    length: segment.length(),
                });
            }

            length += segment.length();
            segments.push(segment);
            s_seg_ends.push(length);
        }

        Ok(Track {
            name: track_pars.name.to_owned(),
            length,
            segments,
            s_seg_ends,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get_segment(&self, idx: usize) -> &Segment {
        &self.segments[idx]
    }

    /// segment_at returns the index of the segment containing the lap distance `s_lap` and the
    /// offset into that segment. Distances beyond the track length return the last segment, lap
    /// wrapping is the caller's job. Negative distances (grid stagger) return the first segment
    /// with a negative offset.
    pub fn segment_at(&self, s_lap: f64) -> (usize, f64) {
        let idx = self
            .s_seg_ends
            .iter()
            .position(|&s_end| s_end >= s_lap)
            .unwrap_or(self.segments.len() - 1);
        (idx, s_lap - self.seg_start(idx))
    }

    /// next_segment_idx returns the index of the segment after `idx`, wrapping to the first one.
    pub fn next_segment_idx(&self, idx: usize) -> usize {
        (idx + 1) % self.segments.len()
    }

    /// get_dist_to_seg_end returns the distance from `s_lap` to the end of segment `idx`.
    pub fn get_dist_to_seg_end(&self, idx: usize, s_lap: f64) -> f64 {
        self.s_seg_ends[idx] - s_lap
    }

    fn seg_start(&self, idx: usize) -> f64 {
        if idx == 0 {
            0.0
        } else {
            self.s_seg_ends[idx - 1]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(length: f64) -> SegmentPars {
        SegmentPars {
            kind: SegmentKind::Straight,
            length,
            radius: 0.0,
            angle: 0.0,
        }
    }

    fn corner(radius: f64, angle: f64) -> SegmentPars {
        SegmentPars {
            kind: SegmentKind::Corner,
            length: 0.0,
            radius,
            angle,
        }
    }

    fn oval() -> Track {
        Track::new(&TrackPars {
            name: "Oval".to_owned(),
            segments: vec![straight(500.0), corner(100.0, 180.0), straight(500.0), corner(100.0, 180.0)],
        })
        .unwrap()
    }

    #[test]
    fn corner_length_is_arc_length() {
        let seg = Segment::corner(100.0, -90.0);
        assert_relative_eq!(seg.length(), 50.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn total_length_is_precomputed() {
        let track = oval();
        assert_relative_eq!(track.length, 1000.0 + 200.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn segment_at_finds_containing_segment() {
        let track = oval();
        assert_eq!(track.segment_at(0.0), (0, 0.0));
        assert_eq!(track.segment_at(500.0), (0, 500.0));

        let (idx, offset) = track.segment_at(510.0);
        assert_eq!(idx, 1);
        assert_relative_eq!(offset, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn segment_at_beyond_track_returns_last_segment() {
        let track = oval();
        let (idx, _) = track.segment_at(track.length + 50.0);
        assert_eq!(idx, 3);
    }

    #[test]
    fn segment_at_negative_distance_returns_first_segment() {
        let track = oval();
        assert_eq!(track.segment_at(-8.0), (0, -8.0));
    }

    #[test]
    fn next_segment_wraps_to_start() {
        let track = oval();
        assert_eq!(track.next_segment_idx(1), 2);
        assert_eq!(track.next_segment_idx(3), 0);
    }

    #[test]
    fn empty_track_is_a_setup_error() {
        let res = Track::new(&TrackPars {
            name: "Nowhere".to_owned(),
            segments: vec![],
        });
        assert_eq!(
            res.unwrap_err(),
            SetupError::EmptyTrack {
                name: "Nowhere".to_owned()
            }
        );
    }

    #[test]
    fn zero_length_segment_is_a_setup_error() {
        let res = Track::new(&TrackPars {
            name: "Broken".to_owned(),
            segments: vec![straight(100.0), corner(50.0, 0.0)],
        });
        assert!(matches!(
            res,
            Err(SetupError::InvalidSegmentLength { idx: 1, .. })
        ));
    }

    #[test]
    fn corner_limit_follows_radius_and_grip() {
        let consts = SimConstants::default();
        let seg = Segment::corner(100.0, 90.0);
        let v = seg.speed_limit(80.0, 1.5, &consts);
        assert_relative_eq!(v, (100.0 * 9.81 * 1.5_f64).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn degenerate_radius_is_clamped() {
        let consts = SimConstants::default();
        let v_zero = Segment::corner(0.0, 90.0).speed_limit(80.0, 1.0, &consts);
        let v_neg = Segment::corner(-0.5, 90.0).speed_limit(80.0, 1.0, &consts);
        assert_relative_eq!(v_zero, 9.81_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(v_neg, 9.81_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn limits_never_exceed_ceiling() {
        let consts = SimConstants::default();
        assert_relative_eq!(
            Segment::Straight { length: 100.0 }.speed_limit(120.0, 1.0, &consts),
            consts.v_ceiling
        );
        assert_relative_eq!(
            Segment::corner(5000.0, 10.0).speed_limit(80.0, 2.0, &consts),
            consts.v_ceiling
        );
    }
}
