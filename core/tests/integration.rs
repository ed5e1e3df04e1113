//! Full resource lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port with a pre-seeded store, then
//! drives every façade operation over real HTTP through `UreqTransport`.
//! Validates pagination across several pages, the filter variants, and the
//! partial-failure path of the batch envelope end-to-end.

use amocrm_core::{
    AmoCrm, ApiError, Contact, CrmConfig, ElementType, EntityRef, Lead, Note, Tag, UreqTransport,
};
use mock_server::{Db, NAME_REQUIRED, STALE_UPDATE};
use serde_json::json;

const FROZEN_ID: u64 = 999_999;

/// Start the mock server over `db` and return a client pointed at it.
fn start(db: Db) -> AmoCrm<UreqTransport> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, db).await
        })
        .unwrap();
    });

    let config = CrmConfig::new("test", "user@example.com", "secret")
        .with_base_url(&format!("http://{addr}/"));
    AmoCrm::from_config(&config).unwrap()
}

fn seeded_db() -> Db {
    let db = Db::default();
    {
        let mut store = db.try_write().unwrap();
        let contacts = (1..=1203u64)
            .map(|n| {
                let owner = if n <= 700 { 11 } else { 12 };
                json!({"id": n, "name": format!("Contact {n}"), "responsible_user_id": owner})
            })
            .collect();
        store.seed("contacts", contacts);
        // Modified "in the future", so any update from now is stale.
        store.seed(
            "contacts",
            vec![json!({"id": FROZEN_ID, "name": "Frozen", "updated_at": 4_102_444_800i64})],
        );
    }
    db
}

#[test]
fn contact_lifecycle() {
    let crm = start(seeded_db());
    let contacts = crm.contacts();

    // Step 1: list everything — three pages.
    let all = contacts.all().unwrap();
    assert_eq!(all.len(), 1204);
    assert_eq!(all[0].id, Some(1));
    assert_eq!(all[1202].id, Some(1203));

    // Step 2: list by responsible user — two pages, the second short.
    let owned = contacts.responsible(12).unwrap();
    assert_eq!(owned.len(), 503);
    assert!(owned.iter().all(|c| c.responsible_user_id == Some(12)));

    // Step 3: free-text query.
    let found = contacts.query("Contact 1202").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(1202));

    // Step 4: add with associations.
    let mut contact = contacts.create();
    contact.name = "Ivan".to_string();
    contact.company = EntityRef {
        id: Some(900),
        name: String::new(),
    };
    contact.tags = vec![Tag {
        id: 5,
        name: "vip".to_string(),
    }];
    let id = contacts.add(&contact).unwrap();
    assert!(id > FROZEN_ID);

    // Step 5: fetch it back.
    let mut stored = contacts.id(id).unwrap();
    assert_eq!(stored.name, "Ivan");
    assert_eq!(stored.company.id, Some(900));
    assert_eq!(stored.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![5]);
    assert!(stored.updated_at > 0);

    // Step 6: update and read back.
    stored.name = "Ivan Petrov".to_string();
    stored.responsible_user_id = Some(11);
    contacts.update(&stored).unwrap();
    let updated = contacts.id(id).unwrap();
    assert_eq!(updated.name, "Ivan Petrov");
    assert_eq!(updated.responsible_user_id, Some(11));

    // Step 7: stale update is a partial failure, not success.
    let frozen = contacts.id(FROZEN_ID).unwrap();
    match contacts.update(&frozen).unwrap_err() {
        ApiError::PartialMutation {
            operation,
            id,
            reason,
            ..
        } => {
            assert_eq!(operation, "update");
            assert_eq!(id, FROZEN_ID.to_string());
            assert_eq!(reason, STALE_UPDATE);
        }
        other => panic!("expected PartialMutation, got {other:?}"),
    }

    // Step 8: unknown id.
    let err = contacts.id(123_456_789).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { kind: "contact", id: 123_456_789 }));

    // Step 9: add without a name is rejected inside the envelope.
    match contacts.add(&Contact::default()).unwrap_err() {
        ApiError::PartialMutation { reason, .. } => assert_eq!(reason, NAME_REQUIRED),
        other => panic!("expected PartialMutation, got {other:?}"),
    }
}

#[test]
fn exact_page_multiple_terminates() {
    let db = Db::default();
    {
        let leads = (1..=1000u64)
            .map(|n| json!({"id": n, "name": format!("Lead {n}")}))
            .collect();
        db.try_write().unwrap().seed("leads", leads);
    }
    let crm = start(db);

    let leads: Vec<Lead> = crm.leads().all().unwrap();

    assert_eq!(leads.len(), 1000);
    assert_eq!(leads[999].id, Some(1000));
}

#[test]
fn notes_attach_to_contacts() {
    let crm = start(Db::default());

    let contact_id = crm
        .contacts()
        .add(&Contact {
            name: "Olga".to_string(),
            ..Contact::default()
        })
        .unwrap();
    let note_id = crm
        .notes()
        .add(&Note::common(ElementType::CONTACT, contact_id, "Called, no answer"))
        .unwrap();

    let mut note = crm.notes().id(note_id).unwrap();
    assert_eq!(note.element_id, contact_id);
    assert_eq!(note.element_type, ElementType::CONTACT);
    assert_eq!(note.text, "Called, no answer");

    note.text = "Called back".to_string();
    crm.notes().update(&note).unwrap();
    assert_eq!(crm.notes().all().unwrap()[0].text, "Called back");
}

#[test]
fn empty_account_lists_nothing() {
    let crm = start(Db::default());

    assert!(crm.companies().all().unwrap().is_empty());
    assert!(crm.leads().query("anything").unwrap().is_empty());
}
