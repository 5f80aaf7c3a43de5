//! Search engine behavior over temporary directory trees.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use mcp_stdio_tools::search::{search, search_until, split_lines, Match, SearchError, MAX_MATCHES};

fn write_lines(path: &Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, lines.join("\n")).unwrap();
}

#[test]
fn finds_match_with_line_number_and_trimmed_snippet() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(
        &tmp.path().join("notes.txt"),
        &["first line", "second line", "   needle here   "],
    );

    let matches = search("needle", tmp.path()).unwrap();

    assert_eq!(
        matches,
        vec![Match {
            path: "notes.txt".into(),
            line: 3,
            snippet: "needle here".into(),
        }]
    );
    assert_eq!(matches[0].to_string(), "notes.txt:3: needle here");
}

#[test]
fn empty_pattern_returns_no_matches() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("a.txt"), &["anything at all"]);

    let matches = search("", tmp.path()).unwrap();
    assert!(matches.is_empty());
}

#[test]
fn invalid_pattern_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();

    let err = search("(", tmp.path()).unwrap_err();
    assert!(matches!(err, SearchError::InvalidPattern(_)));
    assert!(err.to_string().starts_with("Invalid regex pattern"));
}

#[test]
fn cap_applies_within_a_single_file() {
    let tmp = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..25).map(|i| format!("hit {i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_lines(&tmp.path().join("many.txt"), &refs);

    let matches = search("hit", tmp.path()).unwrap();

    assert_eq!(matches.len(), MAX_MATCHES);
    let numbers: Vec<usize> = matches.iter().map(|m| m.line).collect();
    assert_eq!(numbers, (1..=MAX_MATCHES).collect::<Vec<_>>());
}

#[test]
fn cap_applies_across_files_in_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..15).map(|i| format!("hit {i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_lines(&tmp.path().join("b.txt"), &refs);
    write_lines(&tmp.path().join("a.txt"), &refs);
    write_lines(&tmp.path().join("c.txt"), &refs);

    let matches = search("hit", tmp.path()).unwrap();

    assert_eq!(matches.len(), MAX_MATCHES);
    assert!(matches[..15].iter().all(|m| m.path == "a.txt"));
    assert!(matches[15..].iter().all(|m| m.path == "b.txt"));
    assert_eq!(matches[19].line, 5);
}

#[test]
fn descends_into_subdirectories_with_relative_paths() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("src/deep/mod.txt"), &["fn needle() {}"]);

    let matches = search(r"fn \w+", tmp.path()).unwrap();

    assert_eq!(matches.len(), 1);
    let expected = Path::new("src").join("deep").join("mod.txt");
    assert_eq!(matches[0].path, expected.to_string_lossy());
    assert_eq!(matches[0].snippet, "fn needle() {}");
}

#[test]
fn skips_hidden_names_but_walks_hidden_directories() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join(".hidden.txt"), &["needle"]);
    write_lines(&tmp.path().join(".github/workflows/ci.yml"), &["needle in ci"]);
    write_lines(&tmp.path().join(".github/.secret"), &["needle"]);
    write_lines(&tmp.path().join("visible.txt"), &["needle"]);

    let matches = search("needle", tmp.path()).unwrap();

    let ci = Path::new(".github").join("workflows").join("ci.yml");
    let paths: Vec<&str> = matches.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(paths, vec![ci.to_str().unwrap(), "visible.txt"]);
    assert_eq!(matches[0].snippet, "needle in ci");
}

#[cfg(unix)]
#[test]
fn reads_symlinked_files_but_not_dangling_links() {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("src/real.txt"), &["needle real"]);
    symlink(tmp.path().join("src/real.txt"), tmp.path().join("link.txt")).unwrap();
    symlink(tmp.path().join("gone.txt"), tmp.path().join("broken.txt")).unwrap();

    let matches = search("needle", tmp.path()).unwrap();

    let real = Path::new("src").join("real.txt");
    let rendered: Vec<String> = matches.iter().map(Match::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "link.txt:1: needle real".to_string(),
            format!("{}:1: needle real", real.display()),
        ]
    );
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_descended() {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("real/a.txt"), &["needle"]);
    symlink(tmp.path().join("real"), tmp.path().join("loop")).unwrap();

    let matches = search("needle", tmp.path()).unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].path.starts_with("real"));
}

#[test]
fn line_numbers_follow_every_line_boundary() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("mixed.txt"),
        "zero\rneedle cr\r\nthree\x0cneedle ff\u{2028}needle ls\n",
    )
    .unwrap();

    let matches = search("needle", tmp.path()).unwrap();

    let found: Vec<(usize, &str)> = matches.iter().map(|m| (m.line, m.snippet.as_str())).collect();
    assert_eq!(found, vec![(2, "needle cr"), (4, "needle ff"), (5, "needle ls")]);
}

#[test]
fn split_lines_matches_universal_newlines() {
    assert_eq!(split_lines(""), Vec::<&str>::new());
    assert_eq!(split_lines("a\n"), vec!["a"]);
    assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
    assert_eq!(split_lines("a\r\nb\rc"), vec!["a", "b", "c"]);
    assert_eq!(split_lines("a\r\r\nb"), vec!["a", "", "b"]);
    assert_eq!(split_lines("x\u{85}y\x1ez"), vec!["x", "y", "z"]);
}

#[test]
fn cancelled_search_stops_early() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("a.txt"), &["needle"]);

    let cancel = AtomicBool::new(true);
    let matches = search_until("needle", tmp.path(), &cancel).unwrap();
    assert!(matches.is_empty());

    let cancel = AtomicBool::new(false);
    assert_eq!(search_until("needle", tmp.path(), &cancel).unwrap().len(), 1);
}

#[test]
fn skips_files_that_are_not_utf8() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("binary.bin"), b"\xff\xfe needle \x00\x80").unwrap();
    write_lines(&tmp.path().join("text.txt"), &["needle"]);

    let matches = search("needle", tmp.path()).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].path, "text.txt");
}

#[test]
fn match_is_unanchored_substring_search() {
    let tmp = tempfile::tempdir().unwrap();
    write_lines(&tmp.path().join("a.txt"), &["prefix-needle-suffix", "nothing"]);

    let matches = search("needle", tmp.path()).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].snippet, "prefix-needle-suffix");
}

#[test]
fn repeated_searches_are_identical() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["z.txt", "m/a.txt", "a.txt", "m/z.txt"] {
        write_lines(&tmp.path().join(name), &["needle one", "needle two"]);
    }

    let first = search("needle", tmp.path()).unwrap();
    let second = search("needle", tmp.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].path, "a.txt");
}
