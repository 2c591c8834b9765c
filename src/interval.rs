//! Validity intervals derived from time ordered versions of an entity.
//!
//! Each version is valid from its own effective time until the effective time of the version
//! that follows it. The last version has no successor and is open ended.

use chrono::{DateTime, Utc};

use crate::resources::Versioned;

/// End of a validity interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offset {
    /// Superseded at this time.
    At(DateTime<Utc>),
    /// Still in effect.
    Open,
}

/// The time span a version was in effect, `[onset, offset)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityInterval {
    /// When the version took effect.
    pub onset: DateTime<Utc>,
    /// When the version was superseded, if it was.
    pub offset: Offset,
}

impl ValidityInterval {
    /// Is the interval still open?
    pub fn is_open(&self) -> bool {
        self.offset == Offset::Open
    }

    /// Is `time` inside `[onset, offset)`?
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        match self.offset {
            Offset::At(offset) => self.onset <= time && time < offset,
            Offset::Open => self.onset <= time,
        }
    }
}

/// A record paired with its validity interval.
#[derive(Debug, PartialEq)]
pub struct Timed<'a, T> {
    /// The version.
    pub record: &'a T,
    /// When it was in effect.
    pub interval: ValidityInterval,
}

impl<'a, T> Clone for Timed<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Timed<'a, T> {}

/// One interval per version, each closed by the effective time of the next version.
///
/// The versions must be sorted by effective time.
pub fn reconcile<T: Versioned>(versions: &[T]) -> Vec<ValidityInterval> {
    reconcile_by(versions, |_| ())
}

/// Like [`reconcile`], but a version is closed by the next later version with the same
/// identity. If there is none it is open ended.
///
/// This is for sequences that interleave several entities, e.g. memberships of different
/// stations in one network.
pub fn reconcile_by<T, K, F>(versions: &[T], identity: F) -> Vec<ValidityInterval>
where
    T: Versioned,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    versions
        .iter()
        .enumerate()
        .map(|(i, version)| {
            let id = identity(version);
            let offset = versions[i + 1..]
                .iter()
                .find(|next| identity(*next) == id)
                .map(|next| Offset::At(next.effective_time()))
                .unwrap_or(Offset::Open);

            ValidityInterval {
                onset: version.effective_time(),
                offset,
            }
        })
        .collect()
}

/// Merge runs of adjacent versions with the same identity into one continuous interval.
///
/// Returns the index of the first version of each run along with the merged interval. The
/// merged interval is closed by the first version of the following run.
pub fn collapse_by<T, K, F>(versions: &[T], identity: F) -> Vec<(usize, ValidityInterval)>
where
    T: Versioned,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    collapse_within(versions, |_| (), identity)
}

/// Like [`collapse_by`] for a sequence that interleaves the versions of several entities.
///
/// Only versions of the same entity are compared, and a run is closed by the next run of the
/// same entity. Versions of other entities never close it.
pub fn collapse_within<T, E, K, FE, FK>(
    versions: &[T],
    entity: FE,
    identity: FK,
) -> Vec<(usize, ValidityInterval)>
where
    T: Versioned,
    E: PartialEq,
    K: PartialEq,
    FE: Fn(&T) -> E,
    FK: Fn(&T) -> K,
{
    let mut runs: Vec<usize> = vec![];
    for (i, version) in versions.iter().enumerate() {
        let owner = entity(version);
        let continues = versions[..i]
            .iter()
            .rposition(|v| entity(v) == owner)
            .map(|prev| identity(&versions[prev]) == identity(version))
            .unwrap_or(false);
        if !continues {
            runs.push(i);
        }
    }

    runs.iter()
        .enumerate()
        .map(|(run, &first)| {
            let owner = entity(&versions[first]);
            let offset = runs[run + 1..]
                .iter()
                .find(|&&next| entity(&versions[next]) == owner)
                .map(|&next| Offset::At(versions[next].effective_time()))
                .unwrap_or(Offset::Open);

            (
                first,
                ValidityInterval {
                    onset: versions[first].effective_time(),
                    offset,
                },
            )
        })
        .collect()
}

/// Pair each version with the interval from [`reconcile`].
pub fn timed<T: Versioned>(versions: &[T]) -> Vec<Timed<'_, T>> {
    versions
        .iter()
        .zip(reconcile(versions))
        .map(|(record, interval)| Timed { record, interval })
        .collect()
}

/// Pair each version with the interval from [`reconcile_by`].
pub fn timed_by<T, K, F>(versions: &[T], identity: F) -> Vec<Timed<'_, T>>
where
    T: Versioned,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    versions
        .iter()
        .zip(reconcile_by(versions, identity))
        .map(|(record, interval)| Timed { record, interval })
        .collect()
}

/// Pair the first version of each run with the merged interval from [`collapse_by`].
pub fn timed_collapsed<T, K, F>(versions: &[T], identity: F) -> Vec<Timed<'_, T>>
where
    T: Versioned,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    timed_collapsed_within(versions, |_| (), identity)
}

/// Pair the first version of each run with the merged interval from [`collapse_within`].
pub fn timed_collapsed_within<T, E, K, FE, FK>(
    versions: &[T],
    entity: FE,
    identity: FK,
) -> Vec<Timed<'_, T>>
where
    T: Versioned,
    E: PartialEq,
    K: PartialEq,
    FE: Fn(&T) -> E,
    FK: Fn(&T) -> K,
{
    collapse_within(versions, entity, identity)
        .into_iter()
        .map(|(first, interval)| Timed {
            record: &versions[first],
            interval,
        })
        .collect()
}

/// The version in effect at `time`: the last one with an effective time at or before it, or
/// the first version if they all start later.
pub fn in_effect_at<T: Versioned>(versions: &[T], time: DateTime<Utc>) -> Option<&T> {
    versions
        .iter()
        .rev()
        .find(|v| v.effective_time() <= time)
        .or_else(|| versions.first())
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use chrono::TimeZone;

    #[derive(Debug)]
    struct Version {
        name: &'static str,
        time: DateTime<Utc>,
    }

    impl Versioned for Version {
        fn effective_time(&self) -> DateTime<Utc> {
            self.time
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn versions(seq: &[(&'static str, i64)]) -> Vec<Version> {
        seq.iter()
            .map(|&(name, secs)| Version {
                name,
                time: t(secs),
            })
            .collect()
    }

    #[test]
    fn test_reconcile_chains_onsets() {
        for n in 1..6 {
            let vs: Vec<Version> = (0..n)
                .map(|i| Version {
                    name: "BHZ",
                    time: t(1000 * i as i64),
                })
                .collect();
            let intervals = reconcile(&vs);

            assert_eq!(intervals.len(), vs.len());
            for i in 0..vs.len() {
                assert_eq!(intervals[i].onset, vs[i].time);
                if i + 1 < vs.len() {
                    assert_eq!(intervals[i].offset, Offset::At(vs[i + 1].time));
                } else {
                    assert_eq!(intervals[i].offset, Offset::Open);
                }
            }
        }
    }

    #[test]
    fn test_single_version_is_open() {
        let vs = versions(&[("BHZ", 10)]);
        assert_eq!(
            reconcile(&vs),
            vec![ValidityInterval {
                onset: t(10),
                offset: Offset::Open
            }]
        );
    }

    #[test]
    fn test_empty_sequence() {
        let vs: Vec<Version> = vec![];
        assert!(reconcile(&vs).is_empty());
        assert!(collapse_by(&vs, |v| v.name).is_empty());
    }

    #[test]
    fn test_reconcile_by_only_closes_same_identity() {
        let vs = versions(&[("A", 10), ("A", 20), ("B", 30)]);
        let intervals = reconcile_by(&vs, |v| v.name);

        assert_eq!(intervals[0].offset, Offset::At(t(20)));
        assert_eq!(intervals[1].offset, Offset::Open);
        assert_eq!(intervals[2].offset, Offset::Open);

        let interleaved = versions(&[("A", 10), ("B", 20), ("A", 30), ("B", 40)]);
        let intervals = reconcile_by(&interleaved, |v| v.name);
        assert_eq!(intervals[0].offset, Offset::At(t(30)));
        assert_eq!(intervals[1].offset, Offset::At(t(40)));
        assert!(intervals[2].is_open());
        assert!(intervals[3].is_open());
    }

    #[test]
    fn test_collapse_merges_adjacent_identical_names() {
        let vs = versions(&[("MK01", 10), ("MK01", 20), ("MK02", 30), ("MK01", 40)]);
        let runs = collapse_by(&vs, |v| v.name);

        assert_eq!(
            runs,
            vec![
                (
                    0,
                    ValidityInterval {
                        onset: t(10),
                        offset: Offset::At(t(30))
                    }
                ),
                (
                    2,
                    ValidityInterval {
                        onset: t(30),
                        offset: Offset::At(t(40))
                    }
                ),
                (
                    3,
                    ValidityInterval {
                        onset: t(40),
                        offset: Offset::Open
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_collapse_within_keeps_entities_apart() {
        // Entity is the first letter, identity the whole name.
        let vs = versions(&[("A1", 10), ("B1", 20), ("A1", 30), ("B2", 40), ("A1", 50)]);
        let runs = collapse_within(&vs, |v| v.name.as_bytes()[0], |v| v.name);

        assert_eq!(
            runs,
            vec![
                (
                    0,
                    ValidityInterval {
                        onset: t(10),
                        offset: Offset::Open
                    }
                ),
                (
                    1,
                    ValidityInterval {
                        onset: t(20),
                        offset: Offset::At(t(40))
                    }
                ),
                (
                    3,
                    ValidityInterval {
                        onset: t(40),
                        offset: Offset::Open
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_contains() {
        let closed = ValidityInterval {
            onset: t(10),
            offset: Offset::At(t(20)),
        };
        assert!(closed.contains(t(10)));
        assert!(closed.contains(t(19)));
        assert!(!closed.contains(t(20)));
        assert!(!closed.contains(t(9)));

        let open = ValidityInterval {
            onset: t(10),
            offset: Offset::Open,
        };
        assert!(open.contains(t(1_000_000)));
        assert!(open.is_open());
    }

    #[test]
    fn test_in_effect_at() {
        let vs = versions(&[("A", 10), ("B", 20), ("C", 30)]);
        assert_eq!(in_effect_at(&vs, t(25)).unwrap().name, "B");
        assert_eq!(in_effect_at(&vs, t(30)).unwrap().name, "C");
        assert_eq!(in_effect_at(&vs, t(5)).unwrap().name, "A");

        let none: Vec<Version> = vec![];
        assert!(in_effect_at(&none, t(5)).is_none());
    }
}
