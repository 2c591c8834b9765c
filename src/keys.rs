//! Synthetic primary keys for the legacy tables.
//!
//! Keys only mean something inside one export run. They are never persisted.

use chrono::{DateTime, Utc};

use crate::interval::ValidityInterval;

/// The kinds of keys handed out during an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// `chanid` in SITECHAN and SENSOR.
    Channel,
    /// `inid` in SENSOR and INSTRUMENT.
    Instrument,
}

impl KeyType {
    /// First key handed out for this type.
    pub const fn base(self) -> i64 {
        match self {
            KeyType::Channel => 400,
            KeyType::Instrument => 601,
        }
    }
}

/// A post-increment counter per key type, owned by a single export run.
///
/// The synthesizer does not detect repeats. Callers that want to reuse a key for the same
/// logical entity have to track it, see [`AdjacentKeys`].
#[derive(Debug)]
pub struct KeySynthesizer {
    next_channel: i64,
    next_instrument: i64,
}

impl Default for KeySynthesizer {
    fn default() -> Self {
        KeySynthesizer {
            next_channel: KeyType::Channel.base(),
            next_instrument: KeyType::Instrument.base(),
        }
    }
}

impl KeySynthesizer {
    /// Fresh counters at their base values.
    pub fn new() -> Self {
        KeySynthesizer::default()
    }

    /// Hand out the next key of this type.
    pub fn next(&mut self, key_type: KeyType) -> i64 {
        let counter = match key_type {
            KeyType::Channel => &mut self.next_channel,
            KeyType::Instrument => &mut self.next_instrument,
        };

        let key = *counter;
        *counter += 1;
        key
    }
}

/// Reuses the previous key while consecutive requests carry the same identity.
#[derive(Debug)]
pub struct AdjacentKeys<K> {
    key_type: KeyType,
    last: Option<(K, i64)>,
}

impl<K: PartialEq> AdjacentKeys<K> {
    /// Track identities for one key type.
    pub fn new(key_type: KeyType) -> Self {
        AdjacentKeys {
            key_type,
            last: None,
        }
    }

    /// The key for `identity`, the previous one if it matches the previous identity.
    pub fn key_for(&mut self, identity: K, synth: &mut KeySynthesizer) -> i64 {
        match self.last {
            Some((ref last, key)) if *last == identity => key,
            _ => {
                let key = synth.next(self.key_type);
                self.last = Some((identity, key));
                key
            }
        }
    }
}

/// A channel key along with the channel version it was assigned to.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelKey {
    /// The synthesized `chanid`.
    pub chanid: i64,
    /// Channel name, e.g. `BHZ`.
    pub name: String,
    /// Index of the channel version in the resolved channel sequence.
    pub version: usize,
    /// When that version was in effect.
    pub interval: ValidityInterval,
}

/// Channel keys established while writing SITECHAN, in channel version order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelKeys {
    entries: Vec<ChannelKey>,
}

impl ChannelKeys {
    /// Record a key.
    pub fn push(&mut self, key: ChannelKey) {
        self.entries.push(key);
    }

    /// The key of the channel version in effect at `time`, or the first one if `time` is
    /// before every version.
    pub fn key_at(&self, time: DateTime<Utc>) -> Option<&ChannelKey> {
        self.entries
            .iter()
            .find(|key| key.interval.contains(time))
            .or_else(|| self.entries.first())
    }

    /// All keys in order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelKey> {
        self.entries.iter()
    }

    /// Number of keyed channel versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no channel versions were keyed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An instrument key along with the sensor version it was assigned to.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentKey {
    /// The synthesized `inid`.
    pub inid: i64,
    /// Index of the sensor version in the resolved sensor sequence.
    pub sensor: usize,
    /// When that sensor version was in effect.
    pub interval: ValidityInterval,
}

/// Instrument keys established while writing SENSOR, in sensor version order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentKeys {
    entries: Vec<InstrumentKey>,
}

impl InstrumentKeys {
    /// Record a key.
    pub fn push(&mut self, key: InstrumentKey) {
        self.entries.push(key);
    }

    /// The key assigned to a sensor version.
    pub fn for_sensor(&self, sensor: usize) -> Option<&InstrumentKey> {
        self.entries.iter().find(|key| key.sensor == sensor)
    }

    /// Keys with repeats removed, first sensor version of each instrument.
    pub fn distinct(&self) -> impl Iterator<Item = &InstrumentKey> {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(i, key)| *i == 0 || self.entries[i - 1].inid != key.inid)
            .map(|(_, key)| key)
    }

    /// All keys in order.
    pub fn iter(&self) -> impl Iterator<Item = &InstrumentKey> {
        self.entries.iter()
    }

    /// Number of keyed sensor versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no sensor versions were keyed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
