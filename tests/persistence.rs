#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use rbstore::{Customer, Database, Flight, StoreError, StoreOptions};
use tempfile::TempDir;

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data").join("data.dat")
}

fn seeded() -> Database {
    let mut db = Database::new();
    for (id, seats) in [("QF1", 300), ("AC101", 120), ("BA7", 250), ("NZ2", 0)] {
        assert!(db.flights_mut().insert(Flight::new(id, seats).unwrap()).is_none());
    }
    let people = [
        ("Zoe", "555-0100", "1 Long Rd", "QF1", 12),
        ("Ada", "555-0101", "2 Short St", "BA7", 3),
        ("Ada", "555-0000", "9 Other Ave", "", -1),
        ("Bob", "555-0102", "", "AC101", 0),
    ];
    for (name, phone, address, flight, seat) in people {
        let customer = Customer {
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            flight_id: flight.into(),
            seat,
        };
        assert!(db.customers_mut().insert(customer).is_none());
    }
    db
}

fn flight_ids(db: &Database) -> Vec<String> {
    let mut out = Vec::new();
    db.flights().for_each(|f| out.push(f.id.clone()));
    out
}

fn customer_keys(db: &Database) -> Vec<(String, String)> {
    let mut out = Vec::new();
    db.customers()
        .for_each(|c| out.push((c.name.clone(), c.phone.clone())));
    out
}

fn reopen(path: &Path) -> Database {
    Database::open(path, StoreOptions::default()).expect("reopen database")
}

#[test]
fn missing_file_opens_empty_and_save_creates_parents() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);

    let db = Database::open(&path, StoreOptions::default()).unwrap();
    assert!(db.flights().is_empty());
    assert!(db.customers().is_empty());
    assert!(!path.exists());

    db.save(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![0, 0]);
}

#[test]
fn save_and_reopen_preserves_records_and_order() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let db = seeded();
    db.save(&path).unwrap();

    let loaded = reopen(&path);
    assert_eq!(flight_ids(&loaded), vec!["AC101", "BA7", "NZ2", "QF1"]);
    assert_eq!(
        customer_keys(&loaded),
        vec![
            ("Ada".to_string(), "555-0000".to_string()),
            ("Ada".to_string(), "555-0101".to_string()),
            ("Bob".to_string(), "555-0102".to_string()),
            ("Zoe".to_string(), "555-0100".to_string()),
        ]
    );

    let zoe = loaded
        .customers()
        .get(&Customer::key("Zoe", "555-0100"))
        .unwrap();
    assert_eq!(zoe.address, "1 Long Rd");
    assert_eq!(zoe.flight_id, "QF1");
    assert_eq!(zoe.seat, 12);
    assert!(zoe.has_seat());

    let unbooked = loaded
        .customers()
        .get(&Customer::key("Ada", "555-0000"))
        .unwrap();
    assert!(!unbooked.has_seat());
    assert_eq!(loaded.flights().get(&Flight::key("NZ2")).unwrap().seats, 0);

    assert!(loaded.flights().verify().is_ok());
    assert!(loaded.customers().verify().is_ok());
}

#[test]
fn resaving_a_loaded_database_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.dat");
    let second = dir.path().join("second.dat");

    seeded().save(&first).unwrap();
    reopen(&first).save(&second).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn edits_survive_a_save_cycle() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    seeded().save(&path).unwrap();

    let mut db = reopen(&path);
    assert!(db.flights_mut().erase(&Flight::key("NZ2")).is_some());
    assert!(db
        .customers_mut()
        .erase(&Customer::key("Bob", "555-0102"))
        .is_some());
    assert!(db.flights_mut().insert(Flight::new("EK400", 480).unwrap()).is_none());
    db.save(&path).unwrap();

    let db = reopen(&path);
    assert_eq!(flight_ids(&db), vec!["AC101", "BA7", "EK400", "QF1"]);
    assert_eq!(db.customers().len(), 3);
    assert!(db.customers_on("AC101").is_empty());
    assert!(!path.with_file_name("data.dat.tmp").exists());
}

#[test]
fn every_truncation_is_reported_as_corrupt() {
    let mut bytes = Vec::new();
    seeded().write_to(&mut bytes).unwrap();
    for cut in 0..bytes.len() {
        let err = Database::read_from(&bytes[..cut], StoreOptions::default())
            .expect_err("truncated stream must not decode");
        assert!(
            matches!(err, StoreError::CorruptData(_)),
            "cut at {cut} gave {err:?}"
        );
    }
}

#[test]
fn oversized_string_length_is_rejected() {
    // flights present, black root, id length claims 1 MiB
    let mut bytes = vec![1u8, 0];
    bytes.extend_from_slice(&(1i32 << 20).to_le_bytes());
    bytes.extend_from_slice(b"AC");
    let options = StoreOptions::default().max_string_len(1024);
    let err = Database::read_from(&bytes[..], options).unwrap_err();
    assert!(err.is_corrupt(), "{err:?}");
}

#[test]
fn negative_string_length_is_rejected() {
    let mut bytes = vec![1u8, 0];
    bytes.extend_from_slice(&(-5i32).to_le_bytes());
    let err = Database::read_from(&bytes[..], StoreOptions::default()).unwrap_err();
    assert!(err.is_corrupt(), "{err:?}");
}

#[test]
fn unverified_load_accepts_a_red_root_that_verified_load_rejects() {
    let mut db = Database::new();
    let _ = db.flights_mut().insert(Flight::new("AC101", 1).unwrap());
    let mut bytes = Vec::new();
    db.write_to(&mut bytes).unwrap();
    // byte 0 is the presence flag, byte 1 the root colour
    bytes[1] = 1;

    let err = Database::read_from(&bytes[..], StoreOptions::default()).unwrap_err();
    assert!(err.is_corrupt());

    let relaxed = StoreOptions::default().verify_on_load(false);
    let loaded = Database::read_from(&bytes[..], relaxed).unwrap();
    assert_eq!(loaded.flights().len(), 1);
    assert!(matches!(
        loaded.flights().verify(),
        Err(StoreError::InvariantViolation(_))
    ));
}

#[test]
fn unreadable_path_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    // a directory cannot be opened as a database file
    let err = Database::open(dir.path(), StoreOptions::default());
    match err {
        Err(StoreError::Io(_)) => {}
        Err(StoreError::CorruptData(_)) => {}
        other => panic!("expected an error, got {other:?}"),
    }
}

#[test]
fn save_over_the_string_limit_fails_and_keeps_the_previous_file() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let options = StoreOptions::default().max_string_len(4);

    let mut db = Database::open(&path, options).unwrap();
    assert!(db.flights_mut().insert(Flight::new("QF1", 300).unwrap()).is_none());
    db.save(&path).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(db
        .flights_mut()
        .insert(Flight::new("LONGFLIGHT", 3).unwrap())
        .is_none());
    let err = db.save(&path).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)), "{err:?}");

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(!path.with_file_name("data.dat.tmp").exists());
    let reopened = Database::open(&path, options).unwrap();
    assert_eq!(flight_ids(&reopened), vec!["QF1"]);
}

#[test]
fn save_deeper_than_the_depth_limit_fails() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let options = StoreOptions::default().max_depth(2);

    let mut db = Database::open(&path, options).unwrap();
    for n in 0..16 {
        let _ = db
            .flights_mut()
            .insert(Flight::new(format!("F{n:02}"), n).unwrap());
    }
    assert!(db.flights().height() > 2);
    let err = db.save(&path).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)), "{err:?}");
    assert!(!path.exists());
    assert!(!path.with_file_name("data.dat.tmp").exists());
}

#[test]
fn failed_rename_removes_the_temporary_file() {
    let dir = TempDir::new().unwrap();
    // a non-empty directory at the target path makes the final rename fail
    let target = dir.path().join("blocked.dat");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep"), b"x").unwrap();

    let err = seeded().save(&target).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)), "{err:?}");
    assert!(!dir.path().join("blocked.dat.tmp").exists());
    assert!(target.join("keep").exists());
}
