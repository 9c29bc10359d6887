use templex::pattern::{Anchor, Fragment, Span};
use templex::source::valid_identifier;
use templex::{
    calculate, extract, resolve, Extraction, ExtractionStrategy, MapSource, MsisdnFormat,
    MsisdnStrategy, NumberStrategy, Result, TemplexError, Value,
};

fn expected(pairs: &[(&str, Value)]) -> Extraction {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn extracts_from_a_piped_template() {
    let numbers = NumberStrategy::new(["index", "age"]);
    let found = extract(
        "Message#1: Hello, my name is John Doe, I am 30 years old.",
        r"Message\#{index-1}:|name is {name},|I am {age} years",
        &[&numbers],
    )
    .expect("extracts");
    assert_eq!(
        found,
        expected(&[
            ("index", Value::Int(0)),
            ("name", Value::Text("John Doe".into())),
            ("age", Value::Int(30)),
        ])
    );
}

#[test]
fn extracts_from_a_fragment_list() {
    let numbers = NumberStrategy::new(["index", "age"]);
    let found = extract(
        "Message#1: Hello, my name is Mr. John Doe, I am 30 years old.",
        vec![r"Message\#{index-1}:", "name is {name|remove(Mr. )},", "I am {age} years"],
        &[&numbers],
    )
    .expect("extracts");
    assert_eq!(found["name"], Value::Text("John Doe".into()));
    assert_eq!(found["index"], Value::Int(0));
}

#[test]
fn keys_keep_the_case_they_were_written_in() {
    let found = extract("NAME IS Bob.", "name is {Name}.", &[]).expect("extracts");
    assert_eq!(found, expected(&[("Name", Value::Text("Bob".into()))]));
}

#[test]
fn later_fragments_overwrite() {
    let found = extract("a=1 b=2", "a={v} |b={v}", &[]).expect("extracts");
    assert_eq!(found["v"], Value::Text("2".into()));
}

#[test]
fn two_placeholders_in_one_fragment_are_refused() {
    assert_eq!(
        extract("x and y", "{a} and {b}", &[]).unwrap_err(),
        TemplexError::MultipleIdentifier("{a} and {b}".into())
    );
}

#[test]
fn structural_fragments_must_match() {
    let text = "TRX 1 status:SUCCESSFUL";
    assert_eq!(extract(text, "status:successful", &[]).expect("asserts"), Extraction::new());
    assert_eq!(
        extract(text, "status:FAILED", &[]).unwrap_err(),
        TemplexError::UnmatchedFragment("status:FAILED".into())
    );
    assert_eq!(
        extract(text, "TRX {id} status:FAILED", &[]).unwrap_err(),
        TemplexError::UnmatchedFragment("TRX {id} status:FAILED".into())
    );
}

#[test]
fn escaped_wildcards_are_literal() {
    let numbers = NumberStrategy::new(["id"]);
    let found = extract("Order #12 @ home", r"Order \#{id} \@", &[&numbers]).expect("extracts");
    assert_eq!(found["id"], Value::Int(12));
}

#[test]
fn number_notation_decides_the_candidate() {
    let numbers = NumberStrategy::new(["amount"]);
    let dotted = extract("Total: 1.234,56", "Total: {amount}", &[&numbers]).expect("extracts");
    assert_eq!(dotted["amount"], Value::Float(1234.56));
    let commas = extract("Total: 1,234.56", "Total: {amount}", &[&numbers]).expect("extracts");
    assert_eq!(commas["amount"], Value::Float(1234.56));
    let plain = extract("Total: 250 paid", "Total: {amount} paid", &[&numbers]).expect("extracts");
    assert_eq!(plain["amount"], Value::Int(250));
}

#[test]
fn placeholder_at_end_runs_to_the_end_of_the_line() {
    let found = extract("first: one two\nsecond: three", "first: {a}|second: {b}", &[]).expect("extracts");
    assert_eq!(found["a"], Value::Text("one two".into()));
    assert_eq!(found["b"], Value::Text("three".into()));
}

#[test]
fn fragments_tokenize_in_tiers() {
    let fragment = Fragment::parse("{num:11} {any} {alpha} {alphanum:3}").expect("parses");
    assert_eq!(
        fragment.spans(),
        &[
            Span::Wildcard("[0-9]{11}".into()),
            Span::Literal(" ".into()),
            Span::Wildcard(".*?".into()),
            Span::Literal(" ".into()),
            Span::Wildcard(r"[a-z\s]+?".into()),
            Span::Literal(" ".into()),
            Span::Wildcard(r"[a-z0-9\s]{3}".into()),
        ]
    );
    assert!(fragment.placeholder().is_none());

    let fragment = Fragment::parse("### ({code}) @@").expect("parses");
    assert_eq!(fragment.placeholder(), Some(("code", "")));
    assert!(!fragment.at_end());
    assert_eq!(
        fragment.render(".+?", Anchor::Optional),
        r"(?im)[0-9]{3}\s+\((?P<value>.+?)?\)\s+[a-z]{2}"
    );
}

#[test]
fn trailing_whitespace_keeps_a_placeholder_off_the_end() {
    assert!(Fragment::parse("SaldoAkhir {balance}").expect("parses").at_end());
    assert!(!Fragment::parse("TRX {num}, {alpha} {denom} ").expect("parses").at_end());
    assert_eq!(Anchor::select(true, 0, 2), Anchor::Guarded);
    assert_eq!(Anchor::select(true, 1, 2), Anchor::EndOfLine);
    assert_eq!(Anchor::select(false, 0, 2), Anchor::Plain);
    assert_eq!(Anchor::select(false, 0, 1), Anchor::Optional);
}

/// Prepaid electricity tokens, grouped by four digits.
struct TokenStrategy {
    identifiers: Vec<String>,
}

impl ExtractionStrategy for TokenStrategy {
    fn owns(&self, identifier: &str) -> bool {
        valid_identifier(identifier, &self.identifiers)
    }
    fn candidates(&self) -> Vec<String> {
        vec![r"[0-9\s\-/\.]+".into()]
    }
    fn convert(&self, matched: &str, _index: usize) -> Result<Value> {
        let digits: Vec<char> = matched.chars().filter(char::is_ascii_digit).collect();
        let groups: Vec<String> = digits.chunks(4).map(|c| c.iter().collect()).collect();
        Ok(Value::Text(groups.join("-")))
    }
}

const RESPONSE: &str = "TRX 2189566, PLN Prepaid 20000 (507) ke 133312626789 Harga 20075 ke 133312626789 \
(MBOK DARMI               ) status:SUCCESSFUL TOKEN:1582.4499.3217.5678.1234 tarif:R1 / 2200 VA kwh:1260 KWM \
ref:9C10530281BA4A8783792C775BF55ABC rp:Rp18.181 ppj:Rp1.819 orderid:1729153652308900832 info: 081234567890 \
SaldoAwal 2925146, SaldoAkhir 2905071";

#[test]
fn extracts_a_payment_receipt() {
    let token = TokenStrategy { identifiers: vec!["token".into()] };
    let msisdn = MsisdnStrategy::new(62, MsisdnFormat::International, ["info"]);
    let numbers = NumberStrategy::new(["denom", "charge", "pln.kwh", "pln.tagihan", "pln.ppj", "balance"]);
    let mut data = extract(
        RESPONSE,
        vec![
            "TRX {id},",
            "TRX {num}, {product} {num}",
            "TRX {num}, {alpha} {denom} ",
            "ke {dest} Harga",
            "Harga {charge} ke",
            "ke {alphanum} ({pln.nama})",
            "status:SUCCESSFUL",
            "TOKEN:{token} tarif",
            "tarif:{pln.tarifdaya|delete( )} kwh",
            "kwh:{pln.kwh/100} KWM",
            "ref:{pln.ref} rp",
            "rp:Rp{pln.tagihan} ppj",
            "ppj:Rp{pln.ppj} orderid",
            "orderid:{orderid} info",
            "info: {info} SaldoAwal",
            "SaldoAkhir {balance}",
            "### ({code}) @@",
            "TRX {any} ({product.code}) ke {num:11}",
        ],
        &[&token, &msisdn, &numbers],
    )
    .expect("extracts");

    let text = |s: &str| Value::Text(s.into());
    assert_eq!(
        data,
        expected(&[
            ("id", text("2189566")),
            ("product", text("PLN Prepaid")),
            ("denom", Value::Int(20000)),
            ("dest", text("133312626789")),
            ("charge", Value::Int(20075)),
            ("pln.nama", text("MBOK DARMI")),
            ("token", text("1582-4499-3217-5678-1234")),
            ("pln.tarifdaya", text("R1/2200VA")),
            ("pln.kwh", Value::Float(12.6)),
            ("pln.ref", text("9C10530281BA4A8783792C775BF55ABC")),
            ("pln.tagihan", Value::Int(18181)),
            ("pln.ppj", Value::Int(1819)),
            ("orderid", text("1729153652308900832")),
            ("info", text("+6281234567890")),
            ("balance", Value::Int(2905071)),
            ("code", text("507")),
            ("product.code", text("507")),
        ])
    );

    let total = calculate("{pln.tagihan} + {pln.ppj}", &[&MapSource::from(data.clone())]).expect("adds up");
    assert_eq!(total, Value::Int(20000));
    data.insert("pln.total".into(), total);

    let bill = [
        "{product|center(36)}",
        "Nominal        : {denom}",
        "Nama Pelanggan : {pln.nama}",
        "KWH            : {pln.kwh} KWM",
        "Tagihan        : Rp. {pln.tagihan|money(,)|right(15)}",
        "Total          : Rp. {pln.total|money(,)|right(15)|post(YEY)|cut(-3)}",
        "{info|pre(Info: )|center(36)}",
    ]
    .join("\n");
    let bill = resolve(&bill, &[&MapSource::from(data)]).expect("resolves");
    let lines: Vec<&str> = bill.lines().collect();
    assert_eq!(lines[0], format!("{}PLN Prepaid{}", " ".repeat(12), " ".repeat(13)));
    assert_eq!(lines[1], "Nominal        : 20000");
    assert_eq!(lines[2], "Nama Pelanggan : MBOK DARMI");
    assert_eq!(lines[3], "KWH            : 12.6 KWM");
    assert_eq!(lines[4], "Tagihan        : Rp.          18.181");
    assert_eq!(lines[5], "Total          : Rp.          20.000");
    assert_eq!(lines[6], format!("{}Info: +6281234567890{}", " ".repeat(8), " ".repeat(8)));
}
