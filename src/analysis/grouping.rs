/// Encryption bucketing.
///
/// Partitions validated observations into one ordered list of coordinates
/// per `EncryptionClass`. All five buckets always exist, possibly empty.
///
/// Observations whose encryption value matches none of the class tokens are
/// excluded from every bucket, including `Unknown`: only the literal value
/// `unknown` (any case) lands there. They are counted so the caller can
/// report them, but they neither get a marker nor move the map center.

use crate::model::{Coordinate, EncryptionClass, Observation};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// Grouped observations
// ---------------------------------------------------------------------------

/// Coordinates bucketed by encryption class, in input order within a bucket.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedObservations {
    /// Indexed by position of the class in `EncryptionClass::ALL`.
    buckets: [Vec<Coordinate>; 5],
    unclassified: usize,
}

impl GroupedObservations {
    fn slot(class: EncryptionClass) -> usize {
        match class {
            EncryptionClass::Open => 0,
            EncryptionClass::Wep => 1,
            EncryptionClass::Wpa => 2,
            EncryptionClass::Wpa2 => 3,
            EncryptionClass::Unknown => 4,
        }
    }

    /// The bucket for one class.
    pub fn get(&self, class: EncryptionClass) -> &[Coordinate] {
        &self.buckets[Self::slot(class)]
    }

    /// Buckets in canonical class order.
    pub fn iter(&self) -> impl Iterator<Item = (EncryptionClass, &[Coordinate])> {
        EncryptionClass::ALL
            .into_iter()
            .map(move |class| (class, self.get(class)))
    }

    /// Marker count per class, in canonical order.
    pub fn counts(&self) -> Vec<(EncryptionClass, usize)> {
        self.iter().map(|(class, coords)| (class, coords.len())).collect()
    }

    /// Number of observations placed in any bucket.
    pub fn classified_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Number of observations excluded for an unrecognized encryption value.
    pub fn unclassified(&self) -> usize {
        self.unclassified
    }

    /// Every bucketed coordinate, bucket order then row order.
    pub fn all_coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.buckets.iter().flatten()
    }
}

/// Serialized as `{"Open": [[lat, lng], ...], "WEP": [...], ...}` with keys
/// in canonical order.
impl Serialize for GroupedObservations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EncryptionClass::ALL.len()))?;
        for (class, coords) in self.iter() {
            map.serialize_entry(class.label(), coords)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Buckets observations by case-insensitive exact match on encryption.
pub fn group_by_encryption(observations: &[Observation]) -> GroupedObservations {
    let mut grouped = GroupedObservations::default();

    for obs in observations {
        match EncryptionClass::classify(&obs.encryption) {
            Some(class) => grouped.buckets[GroupedObservations::slot(class)].push(Coordinate {
                latitude: obs.latitude,
                longitude: obs.longitude,
            }),
            None => grouped.unclassified += 1,
        }
    }

    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(latitude: f64, longitude: f64, encryption: &str) -> Observation {
        Observation {
            latitude,
            longitude,
            encryption: encryption.to_string(),
        }
    }

    #[test]
    fn test_all_buckets_present_when_empty() {
        let grouped = group_by_encryption(&[]);
        let labels: Vec<_> = grouped.iter().map(|(class, _)| class.label()).collect();
        assert_eq!(labels, vec!["Open", "WEP", "WPA", "WPA2", "Unknown"]);
        assert!(grouped.iter().all(|(_, coords)| coords.is_empty()));
        assert_eq!(grouped.classified_count(), 0);
    }

    #[test]
    fn test_case_variants_share_a_bucket() {
        let grouped = group_by_encryption(&[
            obs(1.0, 1.0, "WPA2"),
            obs(2.0, 2.0, "wpa2"),
            obs(3.0, 3.0, "Wpa2"),
        ]);
        assert_eq!(grouped.get(EncryptionClass::Wpa2).len(), 3);
        assert_eq!(grouped.unclassified(), 0);
    }

    #[test]
    fn test_unrecognized_values_are_excluded_not_unknown() {
        // Pinned behavior: values that are not exactly a class token are
        // dropped from every bucket rather than falling into "Unknown".
        let grouped = group_by_encryption(&[
            obs(1.0, 1.0, "wpa2-personal"),
            obs(2.0, 2.0, "unknown-type"),
            obs(3.0, 3.0, "[WPA2-PSK-CCMP][ESS]"),
            obs(4.0, 4.0, "unknown"),
        ]);
        assert_eq!(grouped.unclassified(), 3);
        assert_eq!(grouped.classified_count(), 1);
        assert_eq!(
            grouped.get(EncryptionClass::Unknown),
            &[Coordinate { latitude: 4.0, longitude: 4.0 }]
        );
    }

    #[test]
    fn test_bucket_preserves_input_order() {
        let grouped = group_by_encryption(&[
            obs(3.0, 30.0, "wep"),
            obs(9.0, 90.0, "none"),
            obs(1.0, 10.0, "WEP"),
            obs(2.0, 20.0, "wep"),
        ]);
        let lats: Vec<_> = grouped
            .get(EncryptionClass::Wep)
            .iter()
            .map(|c| c.latitude)
            .collect();
        assert_eq!(lats, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_counts_account_for_every_row() {
        let input = [
            obs(1.0, 1.0, "none"),
            obs(1.0, 1.0, "wep"),
            obs(1.0, 1.0, "wpa"),
            obs(1.0, 1.0, "wpa"),
            obs(1.0, 1.0, "wpa3"),
        ];
        let grouped = group_by_encryption(&input);
        let total: usize = grouped.counts().iter().map(|(_, n)| n).sum();
        assert_eq!(total, grouped.classified_count());
        assert_eq!(input.len() - grouped.classified_count(), grouped.unclassified());
        assert_eq!(grouped.counts()[2], (EncryptionClass::Wpa, 2));
    }

    #[test]
    fn test_all_coordinates_follow_bucket_order() {
        let grouped = group_by_encryption(&[
            obs(5.0, 5.0, "unknown"),
            obs(1.0, 1.0, "none"),
            obs(3.0, 3.0, "wpa"),
        ]);
        let lats: Vec<_> = grouped.all_coordinates().map(|c| c.latitude).collect();
        assert_eq!(lats, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_serializes_labels_in_canonical_order() {
        let grouped = group_by_encryption(&[obs(37.0, -122.0, "none"), obs(37.2, -122.1, "WEP")]);
        let json = serde_json::to_string(&grouped).unwrap();
        assert_eq!(
            json,
            r#"{"Open":[[37.0,-122.0]],"WEP":[[37.2,-122.1]],"WPA":[],"WPA2":[],"Unknown":[]}"#
        );
    }
}
