//! Export from one store, import into another.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use moneytalk_backup::{
    BackupDocument, build_year_report, export_document, import_file, render_pdf, write_backup,
    ReportMeta,
};
use moneytalk_store::{
    JournalStore, NewCategory, NewContact, NewConversation, NewTemplatePhrase,
    PassthroughPhotoProcessor,
};

fn store() -> JournalStore {
    JournalStore::open_in_memory()
        .unwrap()
        .with_photo_processor(PassthroughPhotoProcessor)
}

fn populated() -> JournalStore {
    let store = store();
    let dana = store
        .create_contact(
            NewContact::new("Dana")
                .with_relationship("Partner")
                .with_photo(vec![1, 2, 3, 4]),
        )
        .unwrap();
    let sam = store.create_contact(NewContact::new("Sam")).unwrap();
    let rent = store
        .create_category(NewCategory::new("Rent").with_icon("house").with_accent_color("#ff8800"))
        .unwrap();
    let debt = store.create_category(NewCategory::new("Debt")).unwrap();
    store
        .create_template_phrase(NewTemplatePhrase::new("Can we talk about rent?").with_category(rent.id))
        .unwrap();
    store
        .create_template_phrase(NewTemplatePhrase::new("I feel anxious about this"))
        .unwrap();

    store
        .create_conversation(
            NewConversation::new("Split the rent", Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap())
                .with_goal("Agree on a split")
                .with_outcome("60/40")
                .with_rating(8)
                .with_contacts([dana.id, sam.id])
                .with_category(rent.id)
                .resolved(true),
        )
        .unwrap();
    store
        .create_conversation(
            NewConversation::new("Card balance", Utc.with_ymd_and_hms(2025, 7, 9, 9, 0, 0).unwrap())
                .with_rating(3)
                .with_contacts([sam.id])
                .with_category(debt.id),
        )
        .unwrap();
    store
        .create_conversation(NewConversation::new(
            "Allowance",
            Utc.with_ymd_and_hms(2024, 12, 20, 20, 0, 0).unwrap(),
        ))
        .unwrap();
    store
}

#[test]
fn test_backup_restores_into_empty_store() {
    let source = populated();
    let dir = tempfile::tempdir().unwrap();
    let path = write_backup(&source.snapshot(), dir.path()).unwrap();

    let target = store();
    let report = import_file(&target, &path).unwrap();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.total_created(), 9);
    assert_eq!(report.dropped_references, 0);

    let before = source.snapshot();
    let after = target.snapshot();
    assert_eq!(after.conversations().len(), before.conversations().len());
    assert_eq!(after.contacts().len(), before.contacts().len());
    assert_eq!(after.categories().len(), before.categories().len());
    assert_eq!(after.template_phrases().len(), before.template_phrases().len());

    let contact_names = |s: &moneytalk_store::Snapshot| -> BTreeSet<String> {
        s.contacts().iter().map(|c| c.name.clone()).collect()
    };
    assert_eq!(contact_names(&after), contact_names(&before));

    let rent = after.categories().iter().find(|c| c.name == "Rent").unwrap();
    assert_eq!(rent.icon_name.as_deref(), Some("house"));
    assert_eq!(rent.accent_color.as_deref(), Some("FF8800"));

    let dana = after.contacts().iter().find(|c| c.name == "Dana").unwrap();
    assert_eq!(dana.photo_data.as_deref(), Some(&[1, 2, 3, 4][..]));

    // Relationships are rebuilt against the new ids
    let split = after
        .conversations()
        .iter()
        .find(|c| c.title == "Split the rent")
        .unwrap();
    let people: Vec<_> = after.contacts_of(split).iter().map(|c| c.name.as_str()).collect();
    assert_eq!(people, ["Dana", "Sam"]);
    assert_eq!(after.category_of(split).map(|c| c.name.as_str()), Some("Rent"));
    assert!(split.is_resolved);
    assert_eq!(split.outcome.as_deref(), Some("60/40"));

    let phrases = after.template_phrases_for(Some(rent.id));
    assert!(phrases.iter().any(|p| p.text == "Can we talk about rent?"));

    let stats_before = before.stats();
    let stats_after = after.stats();
    assert_eq!(stats_after, stats_before);
}

#[test]
fn test_export_is_stable_across_round_trip() {
    let source = populated();
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let first = export_document(&source.snapshot(), at);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");
    moneytalk_backup::write_backup_to(&first, &path).unwrap();

    let target = store();
    import_file(&target, &path).unwrap();
    let second = export_document(&target.snapshot(), at);

    let titles = |d: &BackupDocument| -> BTreeSet<String> {
        d.conversations.iter().map(|c| c.title.clone()).collect()
    };
    assert_eq!(titles(&first), titles(&second));
    assert_eq!(first.version, second.version);
    assert_ne!(first.contacts[0].id, second.contacts[0].id);
}

#[test]
fn test_report_after_restore() {
    let source = populated();
    let dir = tempfile::tempdir().unwrap();
    let path = write_backup(&source.snapshot(), dir.path()).unwrap();
    let target = store();
    import_file(&target, &path).unwrap();

    let report = build_year_report(&target.snapshot(), 2025, &Utc).unwrap();
    let titles: Vec<_> = report.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Split the rent", "Card balance"]);

    let pdf = render_pdf(&report, &ReportMeta::default()).unwrap();
    assert!(!pdf.is_empty());
    assert!(build_year_report(&target.snapshot(), 2023, &Utc).is_err());
}
