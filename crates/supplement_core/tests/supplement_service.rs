use std::cell::RefCell;
use supplement_core::db::open_db_in_memory;
use supplement_core::{
    DocumentSupplementRepository, RepoError, RepoResult, ServiceError, SqliteSupplementRepository,
    Supplement, SupplementPatch, SupplementRepository, SupplementService,
};

const GTIN: &str = "1234567890123";

fn test_supplement() -> Supplement {
    Supplement {
        gtin: GTIN.to_string(),
        name: "Test".to_string(),
        brand: "Test".to_string(),
        flavor: "Test".to_string(),
        carbohydrates: 1.0,
        electrolytes: 1.0,
        maltodextrose: 1.0,
        fructose: 1.0,
        caffeine: 1.0,
        sodium: 1.0,
        protein: 1.0,
    }
}

/// Runs `check` once against each shipped backend.
fn for_each_backend(check: impl Fn(&dyn SupplementRepository)) {
    let conn = open_db_in_memory().unwrap();
    check(&SqliteSupplementRepository::new(&conn));

    let dir = tempfile::tempdir().unwrap();
    check(&DocumentSupplementRepository::new(
        dir.path().join("supplements.json"),
    ));
}

#[test]
fn create_find_update_delete_lifecycle() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        let created = test_supplement();

        service.create(&created).unwrap();
        assert_eq!(service.find_by_gtin(GTIN).unwrap(), created);

        let patch = SupplementPatch {
            name: Some("Updated".to_string()),
            ..SupplementPatch::default()
        };
        service.update(GTIN, &patch).unwrap();
        let updated = service.find_by_gtin(GTIN).unwrap();
        assert_eq!(
            updated,
            Supplement {
                name: "Updated".to_string(),
                ..created
            }
        );

        service.delete(GTIN).unwrap();
        assert!(matches!(
            service.find_by_gtin(GTIN).unwrap_err(),
            ServiceError::NotFound(ref gtin) if gtin == GTIN
        ));
    });
}

#[test]
fn second_create_with_same_gtin_already_exists() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        service.create(&test_supplement()).unwrap();

        let second = Supplement {
            brand: "Other".to_string(),
            ..test_supplement()
        };
        match service.create(&second).unwrap_err() {
            ServiceError::AlreadyExists(rejected) => assert_eq!(*rejected, second),
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(service.find_by_gtin(GTIN).unwrap(), test_supplement());
    });
}

#[test]
fn missing_gtin_is_not_found_for_find_update_and_delete() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);

        for err in [
            service.find_by_gtin(GTIN).unwrap_err(),
            service
                .update(GTIN, &SupplementPatch::default())
                .unwrap_err(),
            service.delete(GTIN).unwrap_err(),
        ] {
            assert!(
                matches!(err, ServiceError::NotFound(ref gtin) if gtin == GTIN),
                "unexpected error: {err}"
            );
        }
    });
}

#[test]
fn update_result_equals_apply_update_of_the_stored_record() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        let stored = test_supplement();
        service.create(&stored).unwrap();

        let patch = SupplementPatch {
            flavor: Some("Mango".to_string()),
            carbohydrates: Some(0.0),
            caffeine: Some(80.0),
            protein: Some(12.5),
            ..SupplementPatch::default()
        };
        service.update(GTIN, &patch).unwrap();

        assert_eq!(
            service.find_by_gtin(GTIN).unwrap(),
            stored.apply_update(&patch)
        );
    });
}

#[test]
fn empty_patch_keeps_the_record() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        service.create(&test_supplement()).unwrap();

        service.update(GTIN, &SupplementPatch::default()).unwrap();

        assert_eq!(service.find_by_gtin(GTIN).unwrap(), test_supplement());
    });
}

#[test]
fn update_validates_the_merged_record() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        service.create(&test_supplement()).unwrap();

        let patch = SupplementPatch {
            name: Some(String::new()),
            fructose: Some(-3.0),
            ..SupplementPatch::default()
        };
        match service.update(GTIN, &patch).unwrap_err() {
            ServiceError::InvalidSupplement(err) => {
                assert!(err.mentions("name"));
                assert!(err.mentions("fructose"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(service.find_by_gtin(GTIN).unwrap(), test_supplement());
    });
}

#[test]
fn create_with_short_gtin_is_invalid_and_mentions_gtin() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        let invalid = Supplement {
            gtin: "123".to_string(),
            ..test_supplement()
        };

        let err = service.create(&invalid).unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidSupplement(ref e) if e.mentions("gtin")),
            "unexpected error: {err}"
        );
        assert!(err.to_string().contains("13-digit"));
        assert!(service.list_all().unwrap().is_empty());
    });
}

#[test]
fn infinite_nutrient_never_reaches_the_document_store() {
    let dir = tempfile::tempdir().unwrap();
    let service = SupplementService::new(DocumentSupplementRepository::new(
        dir.path().join("supplements.json"),
    ));
    service.create(&test_supplement()).unwrap();

    let infinite = Supplement {
        gtin: "7613035422465".to_string(),
        carbohydrates: f32::INFINITY,
        ..test_supplement()
    };
    let create_err = service.create(&infinite).unwrap_err();
    let update_err = service
        .update(
            GTIN,
            &SupplementPatch {
                sodium: Some(f32::INFINITY),
                ..SupplementPatch::default()
            },
        )
        .unwrap_err();

    for (err, field) in [(create_err, "carbohydrates"), (update_err, "sodium")] {
        assert!(
            matches!(err, ServiceError::InvalidSupplement(ref e) if e.mentions(field)),
            "unexpected error: {err}"
        );
    }
    // serde_json would have written `null`, making every document unreadable.
    assert_eq!(service.list_all().unwrap(), vec![test_supplement()]);
}

#[test]
fn list_all_on_empty_store_is_empty_vec() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        assert_eq!(service.list_all().unwrap(), Vec::<Supplement>::new());
    });
}

#[test]
fn list_all_returns_every_record() {
    for_each_backend(|repo| {
        let service = SupplementService::new(repo);
        let other = Supplement {
            gtin: "7613035422465".to_string(),
            ..test_supplement()
        };
        service.create(&test_supplement()).unwrap();
        service.create(&other).unwrap();

        let mut gtins = service
            .list_all()
            .unwrap()
            .into_iter()
            .map(|s| s.gtin)
            .collect::<Vec<_>>();
        gtins.sort();
        assert_eq!(gtins, vec![GTIN.to_string(), other.gtin]);
    });
}

// Known limitation: the existence check and the write are separate calls with
// no lock or transaction around them. The tests below interleave a second
// writer between the two to pin down what each backend does in that window.

/// Repository wrapper that runs `interleave` once, right after the first
/// lookup returns.
struct Interleaving<'a, R> {
    inner: R,
    interleave: RefCell<Option<Box<dyn FnOnce() + 'a>>>,
}

impl<'a, R> Interleaving<'a, R> {
    fn new(inner: R, interleave: impl FnOnce() + 'a) -> Self {
        Self {
            inner,
            interleave: RefCell::new(Some(Box::new(interleave))),
        }
    }
}

impl<R: SupplementRepository> SupplementRepository for Interleaving<'_, R> {
    fn find_by_gtin(&self, gtin: &str) -> RepoResult<Option<Supplement>> {
        let found = self.inner.find_by_gtin(gtin)?;
        if let Some(interleave) = self.interleave.borrow_mut().take() {
            interleave();
        }
        Ok(found)
    }

    fn create(&self, supplement: &Supplement) -> RepoResult<()> {
        self.inner.create(supplement)
    }

    fn update(&self, supplement: &Supplement) -> RepoResult<()> {
        self.inner.update(supplement)
    }

    fn delete(&self, supplement: &Supplement) -> RepoResult<()> {
        self.inner.delete(supplement)
    }

    fn list_all(&self) -> RepoResult<Vec<Supplement>> {
        self.inner.list_all()
    }
}

#[test]
fn racing_create_on_sqlite_surfaces_as_store_error_not_already_exists() {
    let conn = open_db_in_memory().unwrap();
    let other_client = SqliteSupplementRepository::new(&conn);
    let winner = Supplement {
        name: "Winner".to_string(),
        ..test_supplement()
    };

    let repo = Interleaving::new(SqliteSupplementRepository::new(&conn), || {
        other_client.create(&winner).unwrap();
    });
    let service = SupplementService::new(repo);

    let err = service.create(&test_supplement()).unwrap_err();

    assert!(
        matches!(err, ServiceError::Store(ref e @ RepoError::Db(_)) if e.is_duplicate_key()),
        "unexpected error: {err}"
    );
    assert_eq!(service.find_by_gtin(GTIN).unwrap().name, "Winner");
}

#[test]
fn racing_create_on_document_store_surfaces_duplicate_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("supplements.json");
    let other_client = DocumentSupplementRepository::new(&path);

    let repo = Interleaving::new(DocumentSupplementRepository::new(&path), || {
        other_client.create(&test_supplement()).unwrap();
    });
    let service = SupplementService::new(repo);

    let err = service.create(&test_supplement()).unwrap_err();

    assert!(
        matches!(err, ServiceError::Store(RepoError::DuplicateKey(_))),
        "unexpected error: {err}"
    );
}

#[test]
fn update_racing_a_delete_reports_success_but_the_record_is_gone() {
    let conn = open_db_in_memory().unwrap();
    let other_client = SqliteSupplementRepository::new(&conn);
    other_client.create(&test_supplement()).unwrap();

    let repo = Interleaving::new(SqliteSupplementRepository::new(&conn), || {
        other_client.delete(&test_supplement()).unwrap();
    });
    let service = SupplementService::new(repo);

    let patch = SupplementPatch {
        name: Some("Lost".to_string()),
        ..SupplementPatch::default()
    };
    service.update(GTIN, &patch).unwrap();

    assert!(matches!(
        service.find_by_gtin(GTIN).unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn concurrent_updates_last_writer_wins_without_merge() {
    let conn = open_db_in_memory().unwrap();
    let other_client = SqliteSupplementRepository::new(&conn);
    other_client.create(&test_supplement()).unwrap();

    let repo = Interleaving::new(SqliteSupplementRepository::new(&conn), || {
        let concurrent = Supplement {
            brand: "Concurrent".to_string(),
            ..test_supplement()
        };
        other_client.update(&concurrent).unwrap();
    });
    let service = SupplementService::new(repo);

    let patch = SupplementPatch {
        name: Some("Mine".to_string()),
        ..SupplementPatch::default()
    };
    service.update(GTIN, &patch).unwrap();

    let stored = service.find_by_gtin(GTIN).unwrap();
    assert_eq!(stored.name, "Mine");
    // The concurrent brand change was overwritten by the stale read.
    assert_eq!(stored.brand, "Test");
}
