// zonewalk/tests/cli_integration.rs

use assert_cmd::Command;
use domain::base::iana::Rtype;
use domain::base::name::Name;
use domain::base::{Message, MessageBuilder};
use domain::rdata::dnssec::RtypeBitmap;
use domain::rdata::Nsec;
use predicates::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

/// A zonewalk command isolated from the user's config files and ZW_* env.
fn zonewalk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("zonewalk").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    for var in [
        "ZW_CONCURRENCY",
        "ZW_RETRIES",
        "ZW_TIMEOUT",
        "ZW_ONLINE",
        "ZW_FEED_URL",
        "ZW_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn create_config_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    fs::write(file.path(), content).expect("Failed to write to temp file");
    file
}

fn lowercase_fqdn(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

/// Answer NSEC queries for `zone` (owner -> next) on a local UDP port until
/// the test process exits.
fn spawn_resolver(zone: &[(&str, &str)]) -> SocketAddr {
    let zone: HashMap<String, String> = zone
        .iter()
        .map(|(owner, next)| (owner.to_string(), next.to_string()))
        .collect();
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();

    thread::spawn(move || {
        let mut buf = vec![0u8; 512];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf) else {
                break;
            };
            let Ok(request) = Message::from_octets(buf[..len].to_vec()) else {
                continue;
            };
            let Some(question) = request.first_question() else {
                continue;
            };
            let qname = lowercase_fqdn(&question.qname().to_string());

            let mut builder = MessageBuilder::new_vec();
            builder.header_mut().set_id(request.header().id());
            builder.header_mut().set_qr(true);
            builder.header_mut().set_rd(true);
            builder.header_mut().set_ra(true);
            let mut builder = builder.question();
            builder.push(question).unwrap();
            let mut builder = builder.answer();

            if let Some(next) = zone.get(&qname) {
                let mut types = RtypeBitmap::<Vec<u8>>::builder();
                types.add(Rtype::A).unwrap();
                types.add(Rtype::NSEC).unwrap();
                let nsec = Nsec::new(Name::<Vec<u8>>::from_str(next).unwrap(), types.finalize());
                builder
                    .push((Name::<Vec<u8>>::from_str(&qname).unwrap(), 3600u32, nsec))
                    .unwrap();
            }

            let response = builder.into_message();
            let _ = socket.send_to(response.as_octets().as_slice(), peer);
        }
    });

    addr
}

#[test]
fn test_help_shows_flags() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--concurrency"))
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--online"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--feed-url"))
        .stdout(predicate::str::contains("--stats"));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .args(["-c", "0", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency must be between 1 and 1000"));
}

#[test]
fn test_invalid_seed_argument_is_rejected() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .arg("bad..example")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_unreachable_feed_fails_before_walking() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .args(["-o", "--feed-url", "http://127.0.0.1:9/nameservers.csv", "example.com"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_empty_stdin_exits_cleanly() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_seeds_are_skipped_with_warning() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .write_stdin("# nothing to walk here\n\nnot a domain\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Skipping seed"));
}

#[test]
fn test_stats_summary_is_json_on_stderr() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .arg("--stats")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"queries\":0"))
        .stderr(predicate::str::contains("\"submitted\":0"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config = create_config_file("[defaults]\nconcurrency = 0\n");

    zonewalk(&home)
        .arg("--config")
        .arg(config.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency must be between 1 and 1000"));
}

#[test]
fn test_missing_config_file_fails() {
    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .args(["--config", "does-not-exist.toml"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_walks_chain_from_local_resolver() {
    let resolver = spawn_resolver(&[
        ("a.example.", "b.example."),
        ("b.example.", "c.example."),
        ("c.example.", "a.example."),
    ]);
    let config = create_config_file(&format!(
        "[defaults]\nretries = 0\ntimeout = \"2s\"\n\n[resolvers]\nservers = [\"{}\"]\n",
        resolver
    ));

    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .arg("--config")
        .arg(config.path())
        .arg("A.Example")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout("b.example.\nc.example.\n");
}

#[test]
fn test_verbose_labels_discovered_names() {
    let resolver = spawn_resolver(&[("a.example.", "b.example.")]);
    let config = create_config_file(&format!(
        "[defaults]\nretries = 0\n\n[resolvers]\nservers = [\"{}\"]\n",
        resolver
    ));

    let home = TempDir::new().unwrap();
    zonewalk(&home)
        .arg("--config")
        .arg(config.path())
        .arg("-v")
        .write_stdin("a.example\n")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Next Domain: b.example."));
}

#[test]
fn test_local_config_file_is_discovered() {
    let resolver = spawn_resolver(&[("a.example.", "b.example.")]);
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("zonewalk.toml"),
        format!("[resolvers]\nservers = [\"{}\"]\n", resolver),
    )
    .unwrap();

    zonewalk(&home)
        .arg("a.example")
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout("b.example.\n");
}
