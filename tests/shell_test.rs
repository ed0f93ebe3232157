//! Shell runner test: output besar di dua pipe sekaligus
#![cfg(unix)]

use ringlat::shell::run;

#[test]
fn test_large_output_on_both_streams() {
    // Jauh lebih besar dari kapasitas pipe (biasanya 64KB): kalau salah satu
    // pipe tidak di-drain, child akan macet
    let output = run(
        "i=0; while [ $i -lt 4000 ]; do \
             echo 'stdout line padded to make it a little longer'; \
             echo 'stderr line padded to make it a little longer' 1>&2; \
             i=$((i+1)); \
         done",
    )
    .unwrap();

    assert!(output.success());
    let line = "stdout line padded to make it a little longer\n";
    assert_eq!(output.stdout.len(), 4000 * line.len());
    assert_eq!(output.stderr.len(), 4000 * line.len());
    assert!(output.stdout_lossy().lines().all(|l| l.starts_with("stdout")));
    assert!(output.stderr_lossy().lines().all(|l| l.starts_with("stderr")));
}

#[test]
fn test_mixed_exit_status() {
    let output = run("ls / ; ls /definitely/not/here/ringlat").unwrap();
    assert_ne!(output.exit_code, 0);
    assert!(!output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_no_output() {
    let output = run("true").unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}
