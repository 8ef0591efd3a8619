//! Integration tests for the SQLite contact store.

use cardscan::{Contact, ContactStore};
use serde_json::json;

fn contact(name: &str, email: Option<&str>, company: Option<&str>) -> Contact {
    Contact {
        name: Some(name.to_string()),
        email: email.map(String::from),
        company: company.map(String::from),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_and_get_round_trip() {
    let store = ContactStore::open_in_memory().unwrap();

    let mut extra = serde_json::Map::new();
    extra.insert("job_title".into(), json!("Director"));

    let created = store
        .create(Contact {
            phone: Some("+15551234567".into()),
            confidence: Some(0.87),
            extra: Some(extra),
            ..contact("Grace Hopper", Some("grace@navy.mil"), None)
        })
        .await
        .unwrap();
    assert!(created.id > 0);

    let fetched = store.get(created.id).await.unwrap().expect("row exists");
    assert_eq!(fetched.contact.name.as_deref(), Some("Grace Hopper"));
    assert_eq!(fetched.contact.confidence, Some(0.87));
    assert_eq!(
        fetched.contact.extra.as_ref().unwrap()["job_title"],
        json!("Director")
    );
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_missing_id_is_none() {
    let store = ContactStore::open_in_memory().unwrap();
    assert!(store.get(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn search_is_case_insensitive_substring_over_all_fields() {
    let store = ContactStore::open_in_memory().unwrap();
    store
        .create(contact("Olivia Wilson", Some("olivia@acme.com"), Some("ACME Corp")))
        .await
        .unwrap();
    store
        .create(contact("Mariana Anderson", Some("mariana@other.io"), Some("Other GmbH")))
        .await
        .unwrap();

    // Matches by company, lowercased query.
    let hits = store.search(Some("acme".into()), 100, 0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact.name.as_deref(), Some("Olivia Wilson"));

    // Matches by email domain substring.
    let hits = store.search(Some("other.io".into()), 100, 0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].contact.name.as_deref(), Some("Mariana Anderson"));

    let hits = store.search(Some("nomatch".into()), 100, 0).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn list_orders_newest_first_and_paginates() {
    let store = ContactStore::open_in_memory().unwrap();
    for i in 0..5 {
        store
            .create(contact(&format!("Person {i}"), None, None))
            .await
            .unwrap();
    }

    let all = store.search(None, 100, 0).await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].contact.name.as_deref(), Some("Person 4"));
    assert_eq!(all[4].contact.name.as_deref(), Some("Person 0"));

    let page = store.search(None, 2, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].contact.name.as_deref(), Some("Person 2"));
    assert_eq!(page[1].contact.name.as_deref(), Some("Person 1"));
}

#[tokio::test]
async fn update_replaces_fields_and_touches_updated_at() {
    let store = ContactStore::open_in_memory().unwrap();
    let created = store
        .create(contact("J0hn Sm1th", None, None))
        .await
        .unwrap();

    let updated = store
        .update(
            created.id,
            contact("John Smith", Some("john@acme.com"), Some("ACME Corp")),
        )
        .await
        .unwrap()
        .expect("row exists");

    assert_eq!(updated.contact.name.as_deref(), Some("John Smith"));
    assert_eq!(updated.contact.email.as_deref(), Some("john@acme.com"));
    assert!(updated.updated_at >= created.updated_at);

    // Unknown id updates nothing.
    assert!(store
        .update(9999, contact("Nobody", None, None))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_and_count() {
    let store = ContactStore::open_in_memory().unwrap();
    let a = store.create(contact("A", None, Some("ACME"))).await.unwrap();
    store.create(contact("B", None, Some("ACME"))).await.unwrap();

    assert_eq!(store.count(None).await.unwrap(), 2);
    assert_eq!(store.count(Some("ACME".into())).await.unwrap(), 2);
    assert_eq!(store.count(Some("zzz".into())).await.unwrap(), 0);

    assert!(store.delete(a.id).await.unwrap());
    assert!(!store.delete(a.id).await.unwrap(), "second delete is a no-op");
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.db");

    {
        let store = ContactStore::open(&path).unwrap();
        store
            .create(contact("Ada Lovelace", None, Some("Analytical Engines Ltd")))
            .await
            .unwrap();
    }

    let reopened = ContactStore::open(&path).unwrap();
    let all = reopened.search(None, 10, 0).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].contact.name.as_deref(), Some("Ada Lovelace"));
}
