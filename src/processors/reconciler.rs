use crate::error::{ProcessingError, Result};
use crate::models::{Frame, GridPoint, PeriodFrames, Timeline};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Stitches the prior and current periods onto one canonical point set.
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Sorted union of both periods' points.
    pub fn canonical_points(&self, prior: &PeriodFrames, current: &PeriodFrames) -> Vec<GridPoint> {
        let union: BTreeSet<GridPoint> = prior
            .points
            .iter()
            .chain(current.points.iter())
            .copied()
            .collect();
        union.into_iter().collect()
    }

    pub fn reconcile(&self, prior: PeriodFrames, current: PeriodFrames) -> Result<Timeline> {
        let canonical = self.canonical_points(&prior, &current);
        let index: HashMap<GridPoint, usize> = canonical
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, i))
            .collect();

        let year_boundary_index = prior.frames.len();
        let mut frames = remap_frames(&prior, &index, canonical.len())?;
        frames.extend(remap_frames(&current, &index, canonical.len())?);

        info!(
            points = canonical.len(),
            frames = frames.len(),
            year_boundary_index,
            "Reconciled periods"
        );

        Ok(Timeline {
            points: canonical,
            frames,
            year_boundary_index,
        })
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Move each value of `period` from its local point index to the canonical
/// one. Values are copied untouched; canonical points the period lacks are
/// left as "no data".
pub fn remap_frames(
    period: &PeriodFrames,
    canonical_index: &HashMap<GridPoint, usize>,
    canonical_len: usize,
) -> Result<Vec<Frame>> {
    let targets: Vec<usize> = period
        .points
        .iter()
        .map(|p| {
            canonical_index
                .get(p)
                .copied()
                .ok_or_else(|| ProcessingError::RemapIntegrity {
                    period: period.label.clone(),
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
        })
        .collect::<Result<_>>()?;

    period
        .frames
        .iter()
        .map(|frame| {
            if frame.values.len() != targets.len() {
                return Err(ProcessingError::InvalidFormat(format!(
                    "{} frame {} has {} values for {} points",
                    period.label,
                    frame.date,
                    frame.values.len(),
                    targets.len()
                )));
            }

            let mut values = vec![None; canonical_len];
            for (&target, &value) in targets.iter().zip(frame.values.iter()) {
                values[target] = value;
            }
            Ok(Frame::new(frame.date, values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 1, d).unwrap()
    }

    fn period(label: &str, points: Vec<GridPoint>, frames: Vec<Frame>) -> PeriodFrames {
        PeriodFrames {
            label: label.to_string(),
            points,
            frames,
        }
    }

    #[test]
    fn test_reconcile_expands_missing_points() {
        let a = GridPoint::new(35.0, 139.0);
        let b = GridPoint::new(36.0, 139.0);

        let prior = period(
            "prior",
            vec![a, b],
            vec![
                Frame::new(date(2025, 7), vec![Some(10.0), Some(20.0)]),
                Frame::new(date(2025, 14), vec![Some(15.0), None]),
            ],
        );
        let current = period(
            "current",
            vec![a],
            vec![Frame::new(date(2026, 7), vec![Some(3.0)])],
        );

        let timeline = Reconciler::new().reconcile(prior, current).unwrap();
        assert_eq!(timeline.points, vec![a, b]);
        assert_eq!(timeline.year_boundary_index, 2);
        assert_eq!(timeline.frames.len(), 3);
        assert_eq!(timeline.frames[1].values, vec![Some(15.0), None]);
        assert_eq!(timeline.frames[2].values, vec![Some(3.0), None]);
    }

    #[test]
    fn test_remap_with_own_point_set_only_reorders() {
        let a = GridPoint::new(35.0, 139.0);
        let b = GridPoint::new(35.0, 140.0);
        let c = GridPoint::new(36.0, 138.0);

        // local order deliberately not canonical
        let local = period(
            "prior",
            vec![c, a, b],
            vec![Frame::new(date(2025, 7), vec![Some(3.0), Some(1.0), None])],
        );
        let canonical = vec![a, b, c];
        let index: HashMap<GridPoint, usize> =
            canonical.iter().enumerate().map(|(i, p)| (*p, i)).collect();

        let frames = remap_frames(&local, &index, canonical.len()).unwrap();
        assert_eq!(frames[0].values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(frames[0].date, date(2025, 7));
    }

    #[test]
    fn test_remap_unknown_point_is_fatal() {
        let a = GridPoint::new(35.0, 139.0);
        let stray = GridPoint::new(40.0, 141.0);
        let local = period(
            "current",
            vec![stray],
            vec![Frame::new(date(2026, 7), vec![Some(1.0)])],
        );
        let index: HashMap<GridPoint, usize> = vec![(a, 0)].into_iter().collect();

        let err = remap_frames(&local, &index, 1).unwrap_err();
        assert!(matches!(err, ProcessingError::RemapIntegrity { .. }));
    }

    #[test]
    fn test_empty_current_period() {
        let a = GridPoint::new(35.0, 139.0);
        let prior = period(
            "prior",
            vec![a],
            vec![Frame::new(date(2025, 7), vec![Some(1.0)])],
        );
        let timeline = Reconciler::new()
            .reconcile(prior, PeriodFrames::empty("current"))
            .unwrap();
        assert_eq!(timeline.year_boundary_index, 1);
        assert_eq!(timeline.len(), 1);
    }
}
