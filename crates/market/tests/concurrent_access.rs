use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Barrier;
use std::thread;

use contentmart_auth::{InMemoryMembership, Role, RoleProvider};
use contentmart_core::DomainError;
use contentmart_infra::MarketConfig;
use contentmart_market::{MarketError, Marketplace, Selection, UploadRequest};
use contentmart_storage::{FileStorageProvider, FileUpload, InMemoryFileStorage};

const PASSWORD: &str = "long-enough-password";

/// Holds every writer of `notes.txt` until two of them have arrived.
struct GatedStorage {
    inner: InMemoryFileStorage,
    gate: Barrier,
}

impl GatedStorage {
    fn new() -> Self {
        Self {
            inner: InMemoryFileStorage::new(),
            gate: Barrier::new(2),
        }
    }
}

impl FileStorageProvider for GatedStorage {
    fn write(&self, path: &Path, source: Box<dyn Read + Send>) -> io::Result<u64> {
        if path.ends_with("notes.txt") {
            self.gate.wait();
        }
        self.inner.write(path, source)
    }

    fn read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        self.inner.read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        self.inner.delete(path)
    }
}

fn read_to_string(mut reader: Box<dyn Read + Send>) -> String {
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn racing_uploads_into_one_directory_never_touch_the_committed_files() {
    let market = Marketplace::new(
        MarketConfig::default(),
        GatedStorage::new(),
        InMemoryMembership::new(),
    );
    let admin = market.register("admin", "admin@example.com", PASSWORD).unwrap();
    market.membership().create_role(&Role::ADMIN).unwrap();
    market
        .membership()
        .add_user_to_role("admin", &Role::ADMIN)
        .unwrap();
    let country = market.define_property(admin.id, "Country", 1).unwrap();
    let seller = market.register("seller", "seller@example.com", PASSWORD).unwrap();
    market
        .upload(
            seller.id,
            UploadRequest::new("Seed", 0)
                .select(country.id, "Russia")
                .file(FileUpload::from_bytes("seed.txt", "seed")),
        )
        .unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ["A", "B"]
            .into_iter()
            .map(|caption| {
                let market = &market;
                scope.spawn(move || {
                    market.upload(
                        seller.id,
                        UploadRequest::new(caption, 10)
                            .select(country.id, "Russia")
                            .file(FileUpload::from_bytes("notes.txt", caption)),
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (won, lost): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    assert_eq!(won.len(), 1);
    assert_eq!(lost.len(), 1);
    let err = lost.into_iter().next().unwrap().unwrap_err();
    assert!(matches!(err, MarketError::Domain(DomainError::Conflict(_))));
    let winner = won.into_iter().next().unwrap().unwrap();

    let notes = winner.files.iter().find(|f| f.name == "notes.txt").unwrap();
    let (_, stream) = market.download(Some(seller.id), notes.id).unwrap();
    assert_eq!(read_to_string(stream), winner.package.caption);

    let directory = PathBuf::from(format!("{}_1", country.id));
    assert_eq!(
        market.storage().provider().inner.paths(),
        vec![directory.join("notes.txt"), directory.join("seed.txt")]
    );
    let found = market
        .search(&[Selection::new(country.id, "Russia")])
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn registrations_racing_other_commits_all_get_profiles() {
    let market = Marketplace::new(
        MarketConfig {
            starting_balance: 100,
            ..MarketConfig::default()
        },
        InMemoryFileStorage::new(),
        InMemoryMembership::new(),
    );
    let seller = market.register("seller", "seller@example.com", PASSWORD).unwrap();

    let users = thread::scope(|scope| {
        let market = &market;
        scope.spawn(move || {
            for n in 0..50 {
                let request = UploadRequest::new(format!("notes {n}"), 5)
                    .file(FileUpload::from_bytes(format!("notes-{n}.txt"), "x"));
                // Some of these lose commit races.
                let _ = market.upload(seller.id, request);
            }
        });

        let handles: Vec<_> = (0..8)
            .map(|n| {
                scope.spawn(move || {
                    let name = format!("buyer{n}");
                    market
                        .register(&name, &format!("{name}@example.com"), PASSWORD)
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(users.len(), 8);
    for user in users {
        assert_eq!(market.balance(user.id).unwrap(), 100);
    }
}
