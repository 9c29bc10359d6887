use templex::escape::{decode, encode, join, protect, split, unescape};

#[test]
fn encode_turns_escapes_into_triplets() {
    assert_eq!(encode(r"a \{b\} 100%"), "a %7Bb%7D 100%25");
    assert_eq!(encode(r"\#\@\|"), "%23%40%7C");
    // unescaped markers are structure and stay as they are
    assert_eq!(encode("{x} # @ |"), "{x} # @ |");
}

#[test]
fn decode_is_the_inverse_of_encode() {
    for text in [r"a \{b\}", "100%7B", r"%25 \| %", r"\\{x\\}", "plain"] {
        assert_eq!(decode(&encode(text)), text, "round trip of {}", text);
    }
}

#[test]
fn decode_runs_in_one_pass() {
    // an escaped percent followed by "7B" must not turn into a brace
    assert_eq!(decode("%257B"), "%7B");
    assert_eq!(unescape("%257B"), "%7B");
}

#[test]
fn unescape_gives_bare_characters() {
    assert_eq!(unescape("%7Bx%7D %23%40%7C %25"), "{x} #@| %");
}

#[test]
fn protected_text_survives_unescape() {
    let value = "50%7B off";
    assert_eq!(unescape(&protect(value)), value);
}

#[test]
fn split_honours_escaped_pipes() {
    assert_eq!(split(r"|a|b\|c|"), vec!["a", "b|c"]);
    assert_eq!(split("single"), vec!["single"]);
    assert_eq!(split("100%|7C"), vec!["100%", "7C"]);
}

#[test]
fn join_escapes_pipes_inside_pieces() {
    assert_eq!(join(&["a", "b|c"]), r"a|b\|c");
    assert_eq!(join(&[r"already\|escaped"]), r"already\|escaped");
    assert_eq!(split(&join(&["x|y", "z"])), vec!["x|y", "z"]);
}
