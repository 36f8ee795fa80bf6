//! Integration tests for loading [`walletsign_config::Config`] from files.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use rstest::rstest;
use testresult::TestResult;
use walletsign_config::{Config, Error};
use walletsign_crypto::codec::PublicKeyEncoding;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn software_signing_config() -> TestResult {
    let config = Config::load(Some(&fixture("software.toml")))?;

    assert_eq!(
        config.storage_path,
        PathBuf::from("/var/lib/walletsign/test-keys")
    );
    assert_eq!(config.public_key_encoding, PublicKeyEncoding::Compressed);
    assert!(!config.hsm_enable);
    assert!(config.key_name.is_none());
    assert_eq!(config.rpc_server.host, "0.0.0.0");
    assert_eq!(config.rpc_server.port, 9000);
    assert_eq!(config.kms, Config::default().kms);
    Ok(())
}

#[test]
fn hsm_signing_config() -> TestResult {
    let config = Config::load(Some(&fixture("hsm.toml")))?;
    let key_name = config.key_name.as_ref().ok_or("key name is set")?;

    assert!(config.hsm_enable);
    assert_eq!(key_name.key_ring(), "signers");
    assert_eq!(key_name.version(), Some("1"));
    assert_eq!(
        config.credentials_file,
        Some(PathBuf::from("/etc/walletsign/service-account.json"))
    );
    assert_eq!(
        config.public_key_encoding,
        PublicKeyEncoding::Uncompressed
    );

    let options = config.kms_options()?;
    assert_eq!(options.endpoint.as_str(), "https://cloudkms.example.org/v1/");
    assert_eq!(options.timeout, Duration::from_secs(30));
    assert_eq!(options.retry.max_attempts, 5);
    assert_eq!(options.retry.backoff, Duration::from_millis(500));
    Ok(())
}

#[rstest]
#[case::missing_key_name("hsm-without-key-name.toml", "key_name")]
fn incomplete_hsm_config_is_rejected(
    #[case] file: &str,
    #[case] expected_setting: &str,
) {
    match Config::load(Some(&fixture(file))) {
        Err(Error::MissingHsmSetting { setting }) => assert_eq!(setting, expected_setting),
        other => panic!("expected a missing HSM setting, got {other:?}"),
    }
}

#[rstest]
#[case::invalid_toml("hsm_enable = maybe\n")]
#[case::invalid_key_name("key_name = \"projects/p/keyRings/r\"\n")]
#[case::invalid_encoding("public_key_encoding = \"hybrid\"\n")]
fn malformed_config_is_rejected(#[case] contents: &str) -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents)?;

    assert!(matches!(
        Config::load(Some(&path)),
        Err(Error::Load { .. })
    ));
    Ok(())
}

#[test]
fn missing_explicit_config_is_an_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");

    assert!(matches!(Config::load(Some(&path)), Err(Error::Missing(_))));
    // the file is not created as a side effect
    assert!(!path.exists());
    Ok(())
}

#[test]
fn unversioned_hsm_key_name_is_rejected() {
    match Config::load(Some(&fixture("hsm-unversioned-key-name.toml"))) {
        Err(Error::UnversionedKeyName { name }) => assert_eq!(
            name,
            "projects/wallet-prod/locations/global/keyRings/signers/cryptoKeys/hot"
        ),
        other => panic!("expected an unversioned key name, got {other:?}"),
    }
}
