/*! End-to-end tests. */
#[cfg(feature = "config-file")]
use std::io::Write;

use bstr::ByteSlice;
use pretty_assertions::assert_eq;

#[cfg(feature = "config-file")]
use crate::config::{load_config_from_file, Config};
use crate::{Error, Machine, MatchResult, SyntaxError, TemplateError};

macro_rules! regexp_true {
    ($re:expr, $data:expr) => {{
        let machine = Machine::new($re).unwrap();
        assert!(
            machine.is_match($data).unwrap(),
            "\n\n`{}` should match {:?}",
            $re,
            $data.as_bstr()
        );
    }};
}

macro_rules! regexp_false {
    ($re:expr, $data:expr) => {{
        let machine = Machine::new($re).unwrap();
        assert!(
            !machine.is_match($data).unwrap(),
            "\n\n`{}` should not match {:?}",
            $re,
            $data.as_bstr()
        );
    }};
}

macro_rules! regexp_match {
    ($re:expr, $data:expr, $expected:expr) => {{
        let data: &[u8] = $data;
        let m = Machine::new($re)
            .unwrap()
            .find(data)
            .unwrap()
            .unwrap_or_else(|| panic!("`{}` should match", $re));
        assert_eq!(m.as_bytes(data).as_bstr(), $expected.as_bstr());
    }};
}

macro_rules! replace_eq {
    ($re:expr, $data:expr, $template:expr, $global:expr, $expected:expr) => {{
        let output = Machine::new($re)
            .unwrap()
            .replace($data, $template, $global)
            .unwrap();
        assert_eq!(output.as_bstr(), $expected.as_bytes().as_bstr());
    }};
}

#[test]
fn simple_no_anchor() {
    regexp_match!("a+b", b"cabd", b"ab");
    regexp_match!("a+b", b"aabcab", b"aab");
    regexp_false!("a+b", b"b");
    regexp_false!("a+b", b"cbaa");
}

#[test]
fn complex_no_anchor() {
    regexp_match!("(ab)+", b"cabd", b"ab");
    regexp_match!("(ab)+", b"cababad", b"abab");
    regexp_false!("(ab)+", b"ba");
    regexp_false!("(ab)+", b"a b");
}

#[test]
fn anchors() {
    regexp_match!("^a+b", b"ab", b"ab");
    regexp_match!("^a+b", b"aaabcc", b"aaab");
    regexp_false!("^a+b", b"cab");
    regexp_false!("^a+b", b"aa");

    regexp_match!("a+b$", b"ab", b"ab");
    regexp_match!("a+b$", b"caab", b"aab");
    regexp_false!("a+b$", b"abc");
    regexp_false!("a+b$", b"aa");

    regexp_true!("^$", b"");
    regexp_false!("^$", b"a");
    regexp_true!("a|^b", b"cb a");
    regexp_false!("x^", b"x");
}

#[test]
fn greedy_and_lazy() {
    regexp_match!("a*", b"aaab", b"aaa");
    regexp_match!("a|ab", b"ab", b"a");
    regexp_match!("<.+>", b"<a><b>", b"<a><b>");
    regexp_match!("<.+?>", b"<a><b>", b"<a>");
    regexp_match!("<.*?>", b"x<><b>", b"<>");
    regexp_match!("ab??", b"ab", b"a");
    regexp_match!("a{2}", b"aaaa", b"aa");
    regexp_match!("a{2,}", b"aaaa", b"aaaa");
    regexp_match!("a{2,3}", b"aaaa", b"aaa");
    regexp_match!("a{2,3}?", b"aaaa", b"aa");
    regexp_match!("x*", b"", b"");
    regexp_false!("a{3}", b"aab");
}

#[test]
fn classes() {
    regexp_match!(r"\d+", b"abc123", b"123");
    regexp_match!(r"\D+", b"12ab3", b"ab");
    regexp_match!(r"\s+", b"a \t\nb", b" \t\n");
    regexp_match!(r"\S+", b"  ab ", b"ab");
    regexp_match!(r"\w+", b"--a_1--", b"a_1");
    regexp_match!(r"\W+", b"ab-+cd", b"-+");
    regexp_match!("[a-c]+", b"xxabcabd", b"abcab");
    regexp_match!("[^a-c]+", b"abxyzc", b"xyz");
    regexp_match!("a.c", b"abcaxc", b"abc");
    regexp_match!("a.c", b"a\nc", b"a\nc");
}

#[test]
fn non_ascii_bytes() {
    regexp_match!("ñ+", "aññb".as_bytes(), "ñ".as_bytes());
    regexp_match!("(?:ñ)+", "aññb".as_bytes(), "ññ".as_bytes());
    regexp_true!("a", b"\xff\xfea");
}

#[test]
fn phone_numbers() {
    let re = r"^(\+\d{1,2}\s)?\(?\d{3}\)?(\s|-|.)\d{3}(\s|-|.)\d{4}$";

    regexp_true!(re, b"123-456-7890");
    regexp_true!(re, b"(123) 456-7890");
    regexp_true!(re, b"123 456 7890");
    regexp_true!(re, b"123.456.7890");
    regexp_true!(re, b"+1 123-456-7890");
    regexp_false!(re, b"123-45-6789");
}

#[test]
fn captures() {
    let machine = Machine::new("^(ab)+c(ef)$").unwrap();
    let m = machine.find("ababcef").unwrap().unwrap();
    assert_eq!(m.groups, vec![Some(2..4), Some(5..7)]);

    let machine = Machine::new("(ab+)").unwrap();
    let m = machine.find("abbb").unwrap().unwrap();
    assert_eq!(m.group_bytes(b"abbb", 1), Some(&b"abbb"[..]));

    let machine = Machine::new("(a)(b(c))").unwrap();
    let m = machine.find("abc").unwrap().unwrap();
    assert_eq!(machine.capture_count(), 3);
    assert_eq!(m.group(0), Some(0..3));
    assert_eq!(m.group(1), Some(0..1));
    assert_eq!(m.group(2), Some(1..3));
    assert_eq!(m.group(3), Some(2..3));

    let machine = Machine::new("www\\.(\\w+)\\.com").unwrap();
    let subject = b"https://www.google.com/search?q=Hello";
    let m = machine.find(subject).unwrap().unwrap();
    assert_eq!(m.as_bytes(subject), b"www.google.com");
    assert_eq!(m.group_bytes(subject, 1), Some(&b"google"[..]));

    // A group that doesn't participate in the match.
    let machine = Machine::new("(x)?(?:y)(z)").unwrap();
    let m = machine.find("yz").unwrap().unwrap();
    assert_eq!(m.groups, vec![None, Some(1..2)]);
}

#[test]
fn find_iter() {
    let machine = Machine::new("(a+)b").unwrap();
    let matches: Vec<_> = machine
        .find_iter("aabcdabe")
        .map(|m| m.unwrap())
        .map(|m| (m.range.clone(), m.group(1)))
        .collect();

    assert_eq!(matches, vec![(0..3, Some(0..2)), (5..7, Some(5..6))]);

    let machine = Machine::new("(ab)+").unwrap();
    let ranges: Vec<_> = machine
        .find_iter("dabcccababd")
        .map(|m| m.unwrap().range)
        .collect();

    assert_eq!(ranges, vec![1..3, 6..10]);
}

#[test]
fn search_iterator() {
    let machine = Machine::new("(ab)+").unwrap();
    let mut result = MatchResult::new();
    let subject = "dabcccababd";

    assert!(machine.search(subject, &mut result, true).unwrap());
    assert_eq!(result.begin(), Some(1));
    assert_eq!(result.end(), Some(3));
    assert!(machine.search(subject, &mut result, true).unwrap());
    assert_eq!(result.begin(), Some(6));
    assert_eq!(result.end(), Some(10));
    assert!(!machine.search(subject, &mut result, true).unwrap());
}

#[test]
fn empty_loops() {
    regexp_match!("(a*)*", b"aaab", b"aaa");
    regexp_match!("(a*)*", b"b", b"");
    regexp_match!("(a*)+b", b"aab", b"aab");
    regexp_match!("(a|b*)*c", b"abbac", b"abbac");
    regexp_match!("(?:a?)*?b", b"aab", b"aab");
    regexp_match!("(a*){2,5}", b"aa", b"aa");
    regexp_match!("(a??)*", b"aa", b"");
    regexp_match!("(?:a|b??)+c", b"abac", b"abac");

    let m = Machine::new("(a??)*").unwrap().find("aa").unwrap().unwrap();
    assert_eq!(m.range, 0..0);
    assert_eq!(m.group(1), Some(0..0));

    let m = Machine::new("(a*)*").unwrap().find("b").unwrap().unwrap();
    assert_eq!(m.group(1), Some(0..0));

    let subject = vec![b'a'; 5000];
    regexp_false!("(a*)*b", subject.as_slice());
    regexp_false!("(a|aa)*c", subject.as_slice());
}

#[test]
fn replace() {
    replace_eq!("a+b", "caabdabe", "ef", false, "cefdabe");
    replace_eq!("a+b", "caabdabe", "ef", true, "cefdefe");
    replace_eq!("a+b", "alice", "ef", true, "alice");

    replace_eq!("(a+)b", "caabdabe", "$1ff", false, "caaffdabe");
    replace_eq!("(a+)b", "caabdabe", "$1ff", true, "caaffdaffe");
    replace_eq!("(a+)b", "aabcdabe", "$0f", true, "aabfcdabfe");

    replace_eq!("a", "bab", "$$", true, "b$b");
    replace_eq!("a", "bab", "$x$", true, "b$x$b");
    replace_eq!("(x)?b", "ab", "[$1]", true, "a[]");
    replace_eq!("a*", "baab", "-", true, "-b--b-");
}

#[test]
fn replace_invalid_template() {
    let machine = Machine::new("(a+)b").unwrap();

    assert_eq!(
        machine.replace("xyz", "$2", true),
        Err(Error::Template(TemplateError { group: 2, captures: 1 }))
    );
    assert!(machine.replace("aab", "$1", true).is_ok());
}

#[test]
fn syntax_errors() {
    assert_eq!(
        Machine::new("(ab").unwrap_err(),
        Error::Syntax(SyntaxError::UnclosedParenthesis { pos: 0 })
    );
    assert_eq!(
        Machine::new("a|").unwrap_err(),
        Error::Syntax(SyntaxError::EmptyExpression { pos: 2 })
    );
    assert!(matches!(
        Machine::new("*a"),
        Err(Error::Syntax(SyntaxError::DanglingQuantifier { .. }))
    ));
    assert!(matches!(
        Machine::new("ab\\"),
        Err(Error::Syntax(SyntaxError::TrailingEscape { pos: 2 }))
    ));
}

#[test]
fn print_regexp_and_program() {
    let re = crate::parse("(a+)b").unwrap();
    let tree = re.to_string();

    assert!(tree.contains("regexp (1 captures)"));
    assert!(tree.contains("group 1"));
    assert!(tree.contains("plus"));
    assert!(tree.contains("literal 0x62 'b'"));

    assert_eq!(
        crate::compile(&re).unwrap().to_string(),
        r#"
00000: SAVE 0
00001: SAVE 2
00002: CHAR 0x61
00003: SPLIT(0) 00002 00004
00004: SAVE 3
00005: CHAR 0x62
00006: SAVE 1
00007: MATCH
"#
    );

    assert_eq!(
        Machine::new("(a+)b").unwrap().program(),
        &crate::compile(&re).unwrap()
    );
}

#[test]
fn resource_limits() {
    let deep = "(".repeat(200_000) + "a" + &")".repeat(200_000);
    assert_eq!(
        Machine::new(&deep).unwrap_err(),
        Error::Syntax(SyntaxError::NestingTooDeep { pos: 128, max: 128 })
    );

    assert_eq!(
        Machine::new("(?:(?:a{1000}){1000}){1000}").unwrap_err(),
        Error::TooLarge { limit: 100_000 }
    );
    assert_eq!(
        Machine::new("(?:a{0,1000}){0,1000}").unwrap_err(),
        Error::TooLarge { limit: 100_000 }
    );
}

#[test]
fn shared_between_threads() {
    let machine = Machine::new(r"(\d+)-(\d+)").unwrap();
    let subjects = ["1-2", "abc 10-20", "nothing", "300-4000 5-6"];

    let results: Vec<Option<_>> = std::thread::scope(|scope| {
        let handles: Vec<_> = subjects
            .iter()
            .map(|subject| {
                let machine = &machine;
                scope.spawn(move || {
                    machine.find(subject).unwrap().map(|m| m.range)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, vec![Some(0..3), Some(4..9), None, Some(0..8)]);
}

#[test]
#[cfg(feature = "config-file")]
fn machine_from_config_file() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"step_limit = 50\nmax_repetitions = 10\n").unwrap();

    let config = load_config_from_file(file.path()).unwrap();
    assert_eq!(
        config,
        Config {
            step_limit: Some(50),
            max_repetitions: 10,
            ..Config::default()
        }
    );

    assert!(Machine::with_config("a{11}", config.clone()).is_err());

    let machine = Machine::with_config("(a|b)*c", config).unwrap();
    assert_eq!(
        machine.find("ababababababababababab"),
        Err(Error::StepLimitExceeded { limit: 50 })
    );
    assert!(machine.is_match("abc").unwrap());
}
