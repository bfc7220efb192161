//! The closed set of musical keys a sample can be labelled with.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The twelve pitch classes, indexed from C.
///
/// Key estimation reports one of these; index order is the tie-break order.
pub const PITCH_CLASSES: [MusicalKey; 12] = [
    MusicalKey::C,
    MusicalKey::CSharp,
    MusicalKey::D,
    MusicalKey::DSharp,
    MusicalKey::E,
    MusicalKey::F,
    MusicalKey::FSharp,
    MusicalKey::G,
    MusicalKey::GSharp,
    MusicalKey::A,
    MusicalKey::ASharp,
    MusicalKey::B,
];

/// A musical key label: major keys with sharp and flat spellings plus their
/// minor counterparts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MusicalKey {
    C,
    CSharp,
    DFlat,
    D,
    DSharp,
    EFlat,
    E,
    F,
    FSharp,
    GFlat,
    G,
    GSharp,
    AFlat,
    A,
    ASharp,
    BFlat,
    B,
    CMinor,
    CSharpMinor,
    DFlatMinor,
    DMinor,
    DSharpMinor,
    EFlatMinor,
    EMinor,
    FMinor,
    FSharpMinor,
    GFlatMinor,
    GMinor,
    GSharpMinor,
    AFlatMinor,
    AMinor,
    ASharpMinor,
    BFlatMinor,
    BMinor,
}

impl MusicalKey {
    /// Every accepted key, in canonical order.
    pub const ALL: [MusicalKey; 34] = [
        Self::C,
        Self::CSharp,
        Self::DFlat,
        Self::D,
        Self::DSharp,
        Self::EFlat,
        Self::E,
        Self::F,
        Self::FSharp,
        Self::GFlat,
        Self::G,
        Self::GSharp,
        Self::AFlat,
        Self::A,
        Self::ASharp,
        Self::BFlat,
        Self::B,
        Self::CMinor,
        Self::CSharpMinor,
        Self::DFlatMinor,
        Self::DMinor,
        Self::DSharpMinor,
        Self::EFlatMinor,
        Self::EMinor,
        Self::FMinor,
        Self::FSharpMinor,
        Self::GFlatMinor,
        Self::GMinor,
        Self::GSharpMinor,
        Self::AFlatMinor,
        Self::AMinor,
        Self::ASharpMinor,
        Self::BFlatMinor,
        Self::BMinor,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::DFlat => "Db",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::EFlat => "Eb",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::GFlat => "Gb",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::AFlat => "Ab",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::BFlat => "Bb",
            Self::B => "B",
            Self::CMinor => "Cm",
            Self::CSharpMinor => "C#m",
            Self::DFlatMinor => "Dbm",
            Self::DMinor => "Dm",
            Self::DSharpMinor => "D#m",
            Self::EFlatMinor => "Ebm",
            Self::EMinor => "Em",
            Self::FMinor => "Fm",
            Self::FSharpMinor => "F#m",
            Self::GFlatMinor => "Gbm",
            Self::GMinor => "Gm",
            Self::GSharpMinor => "G#m",
            Self::AFlatMinor => "Abm",
            Self::AMinor => "Am",
            Self::ASharpMinor => "A#m",
            Self::BFlatMinor => "Bbm",
            Self::BMinor => "Bm",
        }
    }

    /// Parse from string. Matching is exact and case-sensitive.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidMusicalKey(s.to_string()))
    }

    /// Map a pitch class index (0 = C) to its natural or sharp key label.
    pub fn from_pitch_class(index: usize) -> Option<Self> {
        PITCH_CLASSES.get(index).copied()
    }
}

impl FromStr for MusicalKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MusicalKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MusicalKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_labels() {
        for key in MusicalKey::ALL {
            assert_eq!(MusicalKey::parse(key.as_str()).unwrap(), key);
        }
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = MusicalKey::ALL.iter().map(|k| k.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), MusicalKey::ALL.len());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(MusicalKey::parse("H").is_err());
        assert!(MusicalKey::parse("c").is_err());
        assert!(MusicalKey::parse("Cmaj").is_err());
        assert!(MusicalKey::parse("").is_err());
    }

    fn is_minor(key: &MusicalKey) -> bool {
        key.as_str().ends_with('m')
    }

    #[test]
    fn test_major_minor_split() {
        assert!(is_minor(&MusicalKey::AMinor));
        assert!(is_minor(&MusicalKey::BFlatMinor));
        assert!(!is_minor(&MusicalKey::BFlat));
        assert!(!is_minor(&MusicalKey::FSharp));
        assert_eq!(MusicalKey::ALL.iter().filter(|k| is_minor(k)).count(), 17);
    }

    #[test]
    fn test_pitch_classes() {
        assert_eq!(MusicalKey::from_pitch_class(0), Some(MusicalKey::C));
        assert_eq!(MusicalKey::from_pitch_class(9), Some(MusicalKey::A));
        assert_eq!(MusicalKey::from_pitch_class(11), Some(MusicalKey::B));
        assert_eq!(MusicalKey::from_pitch_class(12), None);
        assert!(PITCH_CLASSES.iter().all(|k| !is_minor(k)));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&MusicalKey::CSharpMinor).unwrap();
        assert_eq!(json, "\"C#m\"");

        let parsed: MusicalKey = serde_json::from_str("\"Eb\"").unwrap();
        assert_eq!(parsed, MusicalKey::EFlat);

        assert!(serde_json::from_str::<MusicalKey>("\"E flat\"").is_err());
    }
}
