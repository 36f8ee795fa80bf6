//! Integration tests for [`walletsign_keystore::KeyStore`].

use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};
use tempfile::TempDir;
use testresult::TestResult;
use walletsign_crypto::{
    codec::PublicKeyEncoding,
    key::{Key, SignatureScheme, create_ecdsa_key_pair, create_eddsa_key_pair},
};
use walletsign_keystore::{Error, KeyOutcome, KeyStore, KeyValueStore, SledStore, WriteBatch};
use zeroize::Zeroizing;

const ECDSA_PRIVATE_KEY: &str = "fb26155c1ff94bb97692793d1197d9c6c8091f25f8c8ac703f92695d32c5194b";
const ECDSA_COMPRESSED_PUBLIC_KEY: &str =
    "028846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc";
const ECDSA_UNCOMPRESSED_PUBLIC_KEY: &str = "048846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc9167a4b658b57b28211783cdee651caa8b5341b753fa39c995317670123f12d8";

#[fixture]
fn keystore() -> KeyStore<SledStore> {
    let store = SledStore::temporary().expect("a temporary sled database");
    KeyStore::new(store, PublicKeyEncoding::Uncompressed)
}

/// A [`KeyValueStore`] on top of a temporary [`SledStore`] whose operations fail on request.
#[derive(Debug)]
struct FailingStore {
    inner: SledStore,
    fail_get: bool,
    /// The number of successful puts before every further put fails.
    puts_before_failure: Option<usize>,
    puts: AtomicUsize,
    fail_batch: bool,
    fail_flush: bool,
}

impl FailingStore {
    fn new() -> TestResult<Self> {
        Ok(Self {
            inner: SledStore::temporary()?,
            fail_get: false,
            puts_before_failure: None,
            puts: AtomicUsize::new(0),
            fail_batch: false,
            fail_flush: false,
        })
    }
}

fn io_error(context: &'static str) -> Error {
    Error::StoreIo {
        context,
        source: sled::Error::Unsupported("injected failure".to_string()),
    }
}

impl KeyValueStore for FailingStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        let puts = self.puts.fetch_add(1, Ordering::SeqCst);
        if self
            .puts_before_failure
            .is_some_and(|successful| puts >= successful)
        {
            return Err(io_error("inserting a value"));
        }
        self.inner.put(key, value)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Zeroizing<Vec<u8>>>, Error> {
        if self.fail_get {
            return Err(io_error("reading a value"));
        }
        self.inner.get(key)
    }

    fn delete(&self, key: &[u8]) -> Result<bool, Error> {
        self.inner.delete(key)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<(), Error> {
        if self.fail_batch {
            return Err(io_error("applying a batch"));
        }
        self.inner.apply_batch(batch)
    }

    fn flush(&self) -> Result<(), Error> {
        if self.fail_flush {
            return Err(io_error("flushing the database"));
        }
        self.inner.flush()
    }
}

fn reference_ecdsa_key(public_key: &str) -> Key {
    Key::new(
        SignatureScheme::Ecdsa,
        public_key.to_string(),
        ECDSA_PRIVATE_KEY.to_string(),
    )
}

#[rstest]
fn unknown_public_key_is_not_found(keystore: KeyStore<SledStore>) -> TestResult {
    let result = keystore.get_private_key(SignatureScheme::Ecdsa, ECDSA_UNCOMPRESSED_PUBLIC_KEY);

    match result {
        Err(Error::KeyNotFound { public_key }) => {
            assert_eq!(public_key, ECDSA_UNCOMPRESSED_PUBLIC_KEY)
        }
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
    Ok(())
}

#[rstest]
#[case::not_hex(SignatureScheme::Ecdsa, "0xnothex")]
#[case::not_a_point(
    SignatureScheme::Ecdsa,
    "058846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc"
)]
#[case::short_ed25519_key(SignatureScheme::EdDsa, "39f523de")]
fn malformed_public_key_is_a_decode_error(
    keystore: KeyStore<SledStore>,
    #[case] scheme: SignatureScheme,
    #[case] public_key: &str,
) {
    assert!(matches!(
        keystore.get_private_key(scheme, public_key),
        Err(Error::Decode(_))
    ));
}

#[rstest]
#[case::stored_uncompressed_found_compressed(
    PublicKeyEncoding::Uncompressed,
    ECDSA_UNCOMPRESSED_PUBLIC_KEY,
    ECDSA_COMPRESSED_PUBLIC_KEY
)]
#[case::stored_compressed_found_uncompressed(
    PublicKeyEncoding::Uncompressed,
    ECDSA_COMPRESSED_PUBLIC_KEY,
    ECDSA_UNCOMPRESSED_PUBLIC_KEY
)]
#[case::compressed_store(
    PublicKeyEncoding::Compressed,
    "0x048846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc9167a4b658b57b28211783cdee651caa8b5341b753fa39c995317670123f12d8",
    ECDSA_COMPRESSED_PUBLIC_KEY
)]
fn ecdsa_lookup_is_independent_of_encoding(
    #[case] encoding: PublicKeyEncoding,
    #[case] stored_as: &str,
    #[case] looked_up_as: &str,
) -> TestResult {
    let keystore = KeyStore::new(SledStore::temporary()?, encoding);

    assert!(
        keystore
            .store_keys(&[reference_ecdsa_key(stored_as)])
            .is_complete()
    );
    let private_key = keystore.get_private_key(SignatureScheme::Ecdsa, looked_up_as)?;

    assert_eq!(private_key.expose_hex().as_str(), ECDSA_PRIVATE_KEY);
    Ok(())
}

#[rstest]
fn storing_twice_keeps_the_last_write(keystore: KeyStore<SledStore>) -> TestResult {
    let first = reference_ecdsa_key(ECDSA_UNCOMPRESSED_PUBLIC_KEY);
    let second = Key::new(
        SignatureScheme::Ecdsa,
        ECDSA_COMPRESSED_PUBLIC_KEY.to_string(),
        "0x01".to_string(),
    );

    assert!(keystore.store_keys(&[first.clone()]).is_complete());
    assert!(keystore.store_keys(&[first]).is_complete());
    assert_eq!(
        keystore
            .get_private_key(SignatureScheme::Ecdsa, ECDSA_COMPRESSED_PUBLIC_KEY)?
            .expose_hex()
            .as_str(),
        ECDSA_PRIVATE_KEY
    );

    assert!(keystore.store_keys(&[second]).is_complete());
    assert_eq!(
        keystore
            .get_private_key(SignatureScheme::Ecdsa, ECDSA_UNCOMPRESSED_PUBLIC_KEY)?
            .expose_bytes(),
        &[1]
    );
    Ok(())
}

#[rstest]
fn partial_batch_stops_at_first_failure(keystore: KeyStore<SledStore>) -> TestResult {
    let before = create_ecdsa_key_pair()?;
    let after = create_eddsa_key_pair()?;
    let before_public_key = before.uncompressed_public_key.clone();
    let after_public_key = after.public_key.clone();
    let invalid = Key::new(
        SignatureScheme::Ecdsa,
        ECDSA_COMPRESSED_PUBLIC_KEY.to_string(),
        "not hex".to_string(),
    );

    let report = keystore.store_keys(&[Key::from(before), invalid, Key::from(after)]);

    assert!(!report.is_complete());
    assert_eq!(report.stored(), 1);
    assert!(matches!(
        report.outcomes(),
        [
            KeyOutcome::Stored,
            KeyOutcome::Failed(Error::Decode(_)),
            KeyOutcome::Skipped
        ]
    ));
    assert_eq!(report.failure().map(|(index, _)| index), Some(1));
    assert!(
        keystore
            .get_private_key(SignatureScheme::Ecdsa, &before_public_key)
            .is_ok()
    );
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::Ecdsa, ECDSA_COMPRESSED_PUBLIC_KEY),
        Err(Error::KeyNotFound { .. })
    ));
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::EdDsa, &after_public_key),
        Err(Error::KeyNotFound { .. })
    ));
    Ok(())
}

#[rstest]
fn empty_batch_is_complete(keystore: KeyStore<SledStore>) {
    let report = keystore.store_keys(&[]);

    assert!(report.is_complete());
    assert!(report.outcomes().is_empty());
    assert!(report.failure().is_none());
}

#[rstest]
fn atomic_batch_stores_all_or_nothing(keystore: KeyStore<SledStore>) -> TestResult {
    let ecdsa = create_ecdsa_key_pair()?;
    let eddsa = create_eddsa_key_pair()?;
    let ecdsa_public_key = ecdsa.compressed_public_key.clone();
    let eddsa_public_key = eddsa.public_key.clone();
    let invalid = Key::new(
        SignatureScheme::EdDsa,
        "39f523de".to_string(),
        "00".to_string(),
    );
    let keys = [Key::from(ecdsa), Key::from(eddsa)];

    assert!(matches!(
        keystore.store_keys_atomic(&[keys[0].clone(), invalid, keys[1].clone()]),
        Err(Error::Decode(_))
    ));
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::Ecdsa, &ecdsa_public_key),
        Err(Error::KeyNotFound { .. })
    ));

    assert_eq!(keystore.store_keys_atomic(&keys)?, 2);
    assert!(
        keystore
            .get_private_key(SignatureScheme::Ecdsa, &ecdsa_public_key)
            .is_ok()
    );
    assert_eq!(
        keystore
            .get_private_key(SignatureScheme::EdDsa, &eddsa_public_key)?
            .expose_bytes()
            .len(),
        64
    );
    Ok(())
}

#[rstest]
fn deleted_key_is_not_found(keystore: KeyStore<SledStore>) -> TestResult {
    assert!(
        keystore
            .store_keys(&[reference_ecdsa_key(ECDSA_UNCOMPRESSED_PUBLIC_KEY)])
            .is_complete()
    );

    assert!(keystore.delete_key(SignatureScheme::Ecdsa, ECDSA_COMPRESSED_PUBLIC_KEY)?);
    assert!(!keystore.delete_key(SignatureScheme::Ecdsa, ECDSA_COMPRESSED_PUBLIC_KEY)?);
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::Ecdsa, ECDSA_UNCOMPRESSED_PUBLIC_KEY),
        Err(Error::KeyNotFound { .. })
    ));
    Ok(())
}

#[test]
fn keys_survive_reopening() -> TestResult {
    let dir = TempDir::new()?;
    let pair = create_eddsa_key_pair()?;
    let public_key = pair.public_key.clone();
    let private_key = pair.private_key.clone();

    {
        let keystore = KeyStore::open(dir.path(), PublicKeyEncoding::default())?;
        assert!(keystore.store_keys(&[Key::from(pair)]).is_complete());
    }

    let keystore = KeyStore::open(dir.path(), PublicKeyEncoding::default())?;
    assert_eq!(
        keystore
            .get_private_key(SignatureScheme::EdDsa, &public_key)?
            .expose_hex()
            .as_str(),
        private_key.as_str()
    );
    Ok(())
}

#[test]
fn read_failure_is_not_a_missing_key() -> TestResult {
    let mut store = FailingStore::new()?;
    store.fail_get = true;
    let keystore = KeyStore::new(store, PublicKeyEncoding::Uncompressed);

    assert!(matches!(
        keystore.get_private_key(SignatureScheme::Ecdsa, ECDSA_COMPRESSED_PUBLIC_KEY),
        Err(Error::StoreIo {
            context: "reading a value",
            ..
        })
    ));
    Ok(())
}

#[test]
fn write_failure_stops_storing() -> TestResult {
    let mut store = FailingStore::new()?;
    store.puts_before_failure = Some(1);
    let keystore = KeyStore::new(store, PublicKeyEncoding::Uncompressed);
    let first = create_ecdsa_key_pair()?;
    let second = create_eddsa_key_pair()?;
    let third = create_eddsa_key_pair()?;
    let first_public_key = first.compressed_public_key.clone();
    let second_public_key = second.public_key.clone();

    let report = keystore.store_keys(&[Key::from(first), Key::from(second), Key::from(third)]);

    assert!(matches!(
        report.outcomes(),
        [
            KeyOutcome::Stored,
            KeyOutcome::Failed(Error::StoreIo { .. }),
            KeyOutcome::Skipped
        ]
    ));
    assert!(
        keystore
            .get_private_key(SignatureScheme::Ecdsa, &first_public_key)
            .is_ok()
    );
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::EdDsa, &second_public_key),
        Err(Error::KeyNotFound { .. })
    ));
    assert!(matches!(
        report.into_result(),
        Err(Error::Incomplete {
            stored: 1,
            total: 3,
            index: 1,
            ..
        })
    ));
    Ok(())
}

#[test]
fn failed_atomic_batch_writes_nothing() -> TestResult {
    let mut store = FailingStore::new()?;
    store.fail_batch = true;
    let keystore = KeyStore::new(store, PublicKeyEncoding::Uncompressed);
    let ecdsa = create_ecdsa_key_pair()?;
    let eddsa = create_eddsa_key_pair()?;
    let ecdsa_public_key = ecdsa.uncompressed_public_key.clone();
    let eddsa_public_key = eddsa.public_key.clone();

    assert!(matches!(
        keystore.store_keys_atomic(&[Key::from(ecdsa), Key::from(eddsa)]),
        Err(Error::StoreIo {
            context: "applying a batch",
            ..
        })
    ));
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::Ecdsa, &ecdsa_public_key),
        Err(Error::KeyNotFound { .. })
    ));
    assert!(matches!(
        keystore.get_private_key(SignatureScheme::EdDsa, &eddsa_public_key),
        Err(Error::KeyNotFound { .. })
    ));
    Ok(())
}

#[test]
fn flush_failure_is_reported_as_the_cause() -> TestResult {
    let mut store = FailingStore::new()?;
    store.fail_flush = true;
    let keystore = KeyStore::new(store, PublicKeyEncoding::Uncompressed);

    let report = keystore.store_keys(&[Key::from(create_eddsa_key_pair()?)]);

    assert_eq!(report.stored(), 1);
    assert!(!report.is_complete());
    assert!(matches!(
        report.into_result(),
        Err(Error::StoreIo {
            context: "flushing the database",
            ..
        })
    ));
    Ok(())
}

#[rstest]
fn complete_report_yields_the_stored_count(keystore: KeyStore<SledStore>) -> TestResult {
    let report = keystore.store_keys(&[
        Key::from(create_ecdsa_key_pair()?),
        Key::from(create_eddsa_key_pair()?),
    ]);

    assert_eq!(report.into_result()?, 2);
    Ok(())
}
