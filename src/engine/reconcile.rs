use std::collections::HashSet;

use crate::domain::{normalize, OverlayEntry, UserRecord, PLACEHOLDER_AVATAR, UNKNOWN_NAME};

/// Merges overlay entries and remote users into one collection.
///
/// Overlay entries come first in insertion order, remote users follow in
/// response order, and only the first record seen for each id is kept, so the
/// overlay version of a user wins.
pub fn reconcile(overlay: &[OverlayEntry], remote: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen = HashSet::with_capacity(overlay.len() + remote.len());
    overlay
        .iter()
        .map(overlay_record)
        .chain(remote)
        .filter(|record| seen.insert(record.id))
        .collect()
}

/// Brings an overlay entry into `UserRecord` shape, filling whatever the entry
/// does not carry from its display name.
pub fn overlay_record(entry: &OverlayEntry) -> UserRecord {
    let derived = normalize(entry.name.as_deref().unwrap_or_default());

    UserRecord {
        id: entry.id,
        first_name: first_present(&[entry.first_name.as_deref(), Some(derived.first_name.as_str())])
            .unwrap_or(UNKNOWN_NAME)
            .to_string(),
        last_name: first_present(&[entry.last_name.as_deref(), Some(derived.last_name.as_str())])
            .unwrap_or(UNKNOWN_NAME)
            .to_string(),
        email: first_present(&[entry.email.as_deref()])
            .map(str::to_string)
            .unwrap_or(derived.email),
        avatar: first_present(&[entry.avatar.as_deref()])
            .unwrap_or(PLACEHOLDER_AVATAR)
            .to_string(),
    }
}

fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_user(id: i64, first_name: &str) -> UserRecord {
        UserRecord::new(
            id,
            first_name,
            "Remote",
            format!("{}@reqres.in", first_name.to_lowercase()),
        )
    }

    fn bare_entry(id: i64, name: &str) -> OverlayEntry {
        OverlayEntry {
            id,
            name: Some(name.to_string()),
            job: None,
            first_name: None,
            last_name: None,
            email: None,
            avatar: None,
            created_at: None,
        }
    }

    #[test]
    fn overlay_precedes_remote() {
        let overlay = vec![OverlayEntry::confirmed(100, "Ana Ruiz", "eng", "t".into())];
        let remote = (1..=6).map(|id| remote_user(id, "Remote")).collect();

        let merged = reconcile(&overlay, remote);

        let ids: Vec<i64> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![100, 1, 2, 3, 4, 5, 6]);
        assert_eq!(merged[0].first_name, "Ana");
        assert_eq!(merged[0].last_name, "Ruiz");
    }

    #[test]
    fn overlay_version_wins_on_shared_id() {
        let overlay = vec![OverlayEntry::confirmed(2, "Local Janet", "eng", "t".into())];
        let remote = vec![remote_user(1, "George"), remote_user(2, "Janet")];

        let merged = reconcile(&overlay, remote);

        assert_eq!(merged.len(), 2);
        let twos: Vec<&UserRecord> = merged.iter().filter(|r| r.id == 2).collect();
        assert_eq!(twos.len(), 1);
        assert_eq!(twos[0].first_name, "Local");
        assert_eq!(merged[1].id, 1);
    }

    #[test]
    fn duplicates_within_one_source_keep_the_first() {
        let remote = vec![remote_user(1, "First"), remote_user(1, "Second")];
        let merged = reconcile(&[], remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].first_name, "First");
    }

    #[test]
    fn reconcile_is_deterministic() {
        let overlay = vec![
            OverlayEntry::confirmed(9, "Zed Zulu", "ops", "t".into()),
            OverlayEntry::confirmed(3, "Tobias Funke", "actor", "t".into()),
        ];
        let remote: Vec<UserRecord> = (1..=4).map(|id| remote_user(id, "R")).collect();

        let first = reconcile(&overlay, remote.clone());
        let second = reconcile(&overlay, remote);
        assert_eq!(first, second);
    }

    #[test]
    fn bare_entries_are_filled_from_the_name() {
        let record = overlay_record(&bare_entry(5, "Bob"));
        assert_eq!(record.first_name, "Bob");
        assert_eq!(record.last_name, UNKNOWN_NAME);
        assert_eq!(record.email, "bob@example.com");
        assert_eq!(record.avatar, PLACEHOLDER_AVATAR);
    }

    #[test]
    fn stored_empty_last_name_reads_as_unknown() {
        let entry = OverlayEntry::confirmed(5, "Bob", "qa", "t".into());
        let record = overlay_record(&entry);
        assert_eq!(record.last_name, UNKNOWN_NAME);
        assert_eq!(record.email, "bob@example.com");
    }

    #[test]
    fn stored_fields_beat_derived_ones() {
        let mut entry = bare_entry(5, "Ana Ruiz");
        entry.email = Some("ana@corp.test".into());
        entry.first_name = Some("Anita".into());

        let record = overlay_record(&entry);
        assert_eq!(record.first_name, "Anita");
        assert_eq!(record.last_name, "Ruiz");
        assert_eq!(record.email, "ana@corp.test");
    }
}
