use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fieldseal"))
}

// cheap scrypt cost keeps the suite responsive; the default cost path is
// covered by the library tests
const FAST_KDF: [&str; 2] = ["--scrypt-log-n", "10"];

#[test]
fn keygen_creates_secret_file() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("keygen")
        .assert()
        .success()
        .stdout(predicate::str::contains("master secret written"));

    assert!(secret_file.exists());
}

#[test]
fn keygen_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("keygen")
        .assert()
        .success();

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn encrypt_decrypt_roundtrip() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("keygen")
        .assert()
        .success();

    let assert = bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("encrypt")
        .arg("saldo:1500000")
        .args(FAST_KDF)
        .assert()
        .success();
    let record = String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string();

    assert!(record.len() > 192);
    assert!(record.chars().all(|c| c.is_ascii_hexdigit()));

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("decrypt")
        .arg(&record)
        .args(FAST_KDF)
        .assert()
        .success()
        .stdout(predicate::str::contains("saldo:1500000"));
}

#[test]
fn missing_secret_is_generated_with_a_warning() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("encrypt")
        .arg("value")
        .args(FAST_KDF)
        .assert()
        .success()
        .stderr(predicate::str::contains("generating a new one"));

    assert!(secret_file.exists());
}

#[test]
fn env_secret_overrides_the_file() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");
    let secret_hex = "ab".repeat(32);

    let assert = bin()
        .env("FIELDSEAL_SECRET", &secret_hex)
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("encrypt")
        .arg("hidden")
        .args(FAST_KDF)
        .assert()
        .success();
    let record = String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string();

    // env secret means nothing was persisted
    assert!(!secret_file.exists());

    bin()
        .env("FIELDSEAL_SECRET", &secret_hex)
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("decrypt")
        .arg(&record)
        .args(FAST_KDF)
        .assert()
        .success()
        .stdout(predicate::str::contains("hidden"));
}

#[test]
fn empty_plaintext_prints_nothing() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("encrypt")
        .arg("")
        .args(FAST_KDF)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn decrypt_garbage_fails_as_malformed() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("decrypt")
        .arg("deadbeef")
        .args(FAST_KDF)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed record"));
}

#[test]
fn decrypt_tampered_record_fails_authentication() {
    let dir = tempdir().unwrap();
    let secret_file = dir.path().join("master.key");

    let assert = bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("encrypt")
        .arg("amount=250")
        .args(FAST_KDF)
        .assert()
        .success();
    let record = String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string();

    let mut tampered: Vec<char> = record.chars().collect();
    tampered[0] = if tampered[0] == '0' { '1' } else { '0' };
    let tampered: String = tampered.into_iter().collect();

    bin()
        .arg("--secret-file")
        .arg(&secret_file)
        .arg("decrypt")
        .arg(&tampered)
        .args(FAST_KDF)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed authentication"));
}

#[test]
fn hash_pin_and_verify_pin_roundtrip() {
    let assert = bin()
        .env("FIELDSEAL_PIN", "123456")
        .arg("hash-pin")
        .assert()
        .success();
    let verifier = String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string();

    // salt_hex:hash_hex
    assert_eq!(verifier.len(), 32 + 1 + 128);

    bin()
        .env("FIELDSEAL_PIN", "123456")
        .arg("verify-pin")
        .arg(&verifier)
        .assert()
        .success()
        .stdout(predicate::str::contains("match"));

    bin()
        .env("FIELDSEAL_PIN", "654321")
        .arg("verify-pin")
        .arg(&verifier)
        .assert()
        .failure()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn hash_pin_reads_confirmation_from_stdin() {
    bin()
        .arg("hash-pin")
        .write_stdin("123456\n123456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(":"));
}

#[test]
fn hash_pin_mismatched_confirmation_fails() {
    bin()
        .arg("hash-pin")
        .write_stdin("123456\n999999\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("do not match"));
}

#[test]
fn verify_pin_rejects_malformed_verifier() {
    bin()
        .env("FIELDSEAL_PIN", "123456")
        .arg("verify-pin")
        .arg("not-a-verifier")
        .assert()
        .failure()
        .stdout(predicate::str::contains("no match"));
}
