use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const LOGO: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1, 2, 3];

fn write_site(root: &Path) {
    fs::write(
        root.join("site.toml"),
        "[routes]\n\"/\" = \"home.html\"\n\"/about\" = \"about.html\"\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::create_dir_all(root.join("static")).unwrap();
    fs::write(root.join("templates/home.html"), "PATH={{path}}").unwrap();
    fs::write(root.join("templates/about.html"), "PATH={{path}}").unwrap();
    fs::write(root.join("static/logo.png"), LOGO).unwrap();
}

fn pagewright(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pagewright"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_build_renders_routes_and_copies_static() {
    let dir = tempdir().unwrap();
    write_site(dir.path());

    let output = pagewright(dir.path(), &["--output", "out", "--color", "never"]);
    assert!(
        output.status.success(),
        "build should succeed; stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = dir.path().join("out");
    assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "PATH=/");
    assert_eq!(fs::read_to_string(out.join("about/index.html")).unwrap(), "PATH=/about");
    assert_eq!(fs::read(out.join("static/logo.png")).unwrap(), LOGO);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 pages"), "summary missing; got:\n{stdout}");
}

#[test]
fn test_second_build_leaves_pages_unchanged() {
    let dir = tempdir().unwrap();
    write_site(dir.path());

    assert!(pagewright(dir.path(), &["-o", "out"]).status.success());
    let output = pagewright(dir.path(), &["-o", "out", "--color", "never"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(2 unchanged)"), "got:\n{stdout}");
}

#[test]
fn test_missing_template_fails_with_its_name() {
    let dir = tempdir().unwrap();
    write_site(dir.path());
    fs::remove_file(dir.path().join("templates/about.html")).unwrap();

    let output = pagewright(dir.path(), &["--output", "out"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("about.html"), "stderr should name the template; got:\n{stderr}");
}

#[test]
fn test_missing_static_dir_fails() {
    let dir = tempdir().unwrap();
    write_site(dir.path());
    fs::remove_dir_all(dir.path().join("static")).unwrap();

    let output = pagewright(dir.path(), &["--output", "out"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("static"), "got:\n{stderr}");
}

#[test]
fn test_invalid_route_is_rejected_before_building() {
    let dir = tempdir().unwrap();
    write_site(dir.path());
    fs::write(dir.path().join("site.toml"), "[routes]\n\"about\" = \"about.html\"\n").unwrap();

    let output = pagewright(dir.path(), &["--output", "out"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out/index.html").exists());
}

#[test]
fn test_explicit_missing_config_fails() {
    let dir = tempdir().unwrap();
    write_site(dir.path());

    let output = pagewright(dir.path(), &["--config", "nope.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.toml"));
}

#[cfg(unix)]
mod signals {
    use std::io::{BufRead, BufReader};
    use std::process::{Child, Command, Stdio};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    /// Start `--dev` on a free localhost port and wait until it is serving.
    fn spawn_dev(dir: &Path) -> Child {
        let config = fs::read_to_string(dir.join("site.toml")).unwrap();
        fs::write(
            dir.join("site.toml"),
            format!("{config}\n[serve]\ninterface = \"127.0.0.1\"\nport = 0\n"),
        )
        .unwrap();

        let mut child = Command::new(env!("CARGO_BIN_EXE_pagewright"))
            .current_dir(dir)
            .args(["--dev", "--output", "out", "--color", "never"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let stdout = child.stdout.take().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if line.contains("ready") {
                    let _ = tx.send(());
                }
            }
        });
        if rx.recv_timeout(Duration::from_secs(10)).is_err() {
            child.kill().ok();
            panic!("dev mode never became ready");
        }
        child
    }

    fn send(child: &Child, signal: &str) {
        let status = Command::new("kill")
            .args([signal, &child.id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn wait_exit(child: &mut Child, timeout: Duration) -> Option<i32> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().unwrap() {
                return status.code();
            }
            thread::sleep(Duration::from_millis(20));
        }
        child.kill().ok();
        panic!("process still running after {timeout:?}");
    }

    #[test]
    fn test_sigterm_stops_dev_mode_cleanly() {
        let dir = tempdir().unwrap();
        write_site(dir.path());
        let mut child = spawn_dev(dir.path());

        send(&child, "-TERM");
        assert_eq!(wait_exit(&mut child, Duration::from_secs(2)), Some(0));
        assert_eq!(
            fs::read_to_string(dir.path().join("out/index.html")).unwrap(),
            "PATH=/"
        );
    }

    #[test]
    fn test_sigint_stops_dev_mode_cleanly() {
        let dir = tempdir().unwrap();
        write_site(dir.path());
        let mut child = spawn_dev(dir.path());

        send(&child, "-INT");
        assert_eq!(wait_exit(&mut child, Duration::from_secs(2)), Some(0));
    }
}
