use permtemplate::ExclusionMatcher;

fn compile(patterns: &[&str]) -> ExclusionMatcher {
    ExclusionMatcher::compile(patterns).expect("patterns should compile")
}

// --- Wildcards ---

#[test]
fn test_star_matches_within_segment_at_any_depth() {
    let m = compile(&["*.log"]);
    assert!(m.matches("a.log"));
    assert!(m.matches("deep/nested/b.log"));
    assert!(!m.matches("b.txt"));
    assert!(!m.matches("a.log.txt"));
}

#[test]
fn test_question_mark_matches_one_character() {
    let m = compile(&["file?.txt"]);
    assert!(m.matches("file1.txt"));
    assert!(!m.matches("file10.txt"));
    assert!(!m.matches("file.txt"));
}

#[test]
fn test_star_does_not_cross_separator_in_anchored_pattern() {
    let m = compile(&["src/*.rs"]);
    assert!(m.matches("src/main.rs"));
    assert!(!m.matches("src/bin/tool.rs"));
}

#[test]
fn test_double_star_crosses_segments() {
    let m = compile(&["docs/**/*.md"]);
    assert!(m.matches("docs/a.md"));
    assert!(m.matches("docs/x/y/z.md"));
    assert!(!m.matches("other/docs.md"));

    let leading = compile(&["**/generated"]);
    assert!(leading.matches_dir("generated"));
    assert!(leading.matches("a/b/generated"));
}

// --- Anchoring ---

#[test]
fn test_leading_slash_anchors_to_root() {
    let m = compile(&["/build.log"]);
    assert!(m.matches("build.log"));
    assert!(!m.matches("sub/build.log"));
}

#[test]
fn test_unanchored_name_matches_anywhere() {
    let m = compile(&["build.log"]);
    assert!(m.matches("build.log"));
    assert!(m.matches("sub/build.log"));
}

// --- Directories ---

#[test]
fn test_trailing_slash_only_matches_directories() {
    let m = compile(&["cache/"]);
    assert!(m.matches_dir("cache"));
    assert!(!m.matches("cache"), "a file named cache is not a directory");
}

#[test]
fn test_files_below_excluded_directory_are_excluded() {
    let m = compile(&["cache/"]);
    assert!(m.matches("cache/data.bin"));
    assert!(m.matches("cache/deep/data.bin"));
    assert!(m.matches("sub/cache/data.bin"));
    assert!(!m.matches("cached.bin"));
}

// --- Ordering and negation ---

#[test]
fn test_negation_reinstates_file() {
    let m = compile(&["*.log", "!important.log"]);
    assert!(m.matches("a.log"));
    assert!(!m.matches("important.log"));
    assert!(!m.matches("b.txt"));
}

#[test]
fn test_later_pattern_wins() {
    let m = compile(&["!keep.log", "*.log"]);
    assert!(m.matches("keep.log"), "negation before the match has no effect");
}

#[test]
fn test_negation_cannot_reinclude_below_excluded_directory() {
    let m = compile(&["logs/", "!logs/keep.txt"]);
    assert!(m.matches("logs/keep.txt"));
}

#[test]
fn test_negation_works_with_directory_contents_pattern() {
    let m = compile(&["logs/*", "!logs/keep.txt"]);
    assert!(m.matches("logs/drop.txt"));
    assert!(!m.matches("logs/keep.txt"));
    assert!(!m.matches_dir("logs"));
}

// --- Edge cases ---

#[test]
fn test_empty_pattern_list_matches_nothing() {
    let m = ExclusionMatcher::compile(Vec::<String>::new()).unwrap();
    assert!(!m.matches("a.log"));
    assert!(!m.matches("x/y/z"));
}

#[test]
fn test_leading_dot_slash_is_ignored() {
    let m = compile(&["*.tmp"]);
    assert!(m.matches("./scratch.tmp"));
}

#[test]
fn test_invalid_pattern_is_an_error() {
    assert!(ExclusionMatcher::compile(["[unclosed"]).is_err());
}
