use critique_format::{format_report, split, SectionKind};
use proptest::prelude::*;
use serde_json::{Map, Value};

const FIELDS: [(&str, SectionKind); 5] = [
    ("code_quality", SectionKind::CodeQuality),
    ("best_practices", SectionKind::BestPractices),
    ("performance", SectionKind::Performance),
    ("readability", SectionKind::Readability),
    ("security_considerations", SectionKind::SecurityConsiderations),
];

/// Prose that never contains a fence or a function definition.
fn prose() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ,.]{0,40}"
}

fn snippet() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z]{1,8}").prop_map(|(name, arg)| {
        format!("function {name}({arg}) {{ if ({arg}) {{ return {arg}; }} }}")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn formatting_arbitrary_text_never_panics_or_comes_back_empty(raw in any::<String>()) {
        let sections = format_report(&raw);
        prop_assert!(!sections.is_empty());
        prop_assert!(sections.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn one_section_per_present_field_in_order(
        present in proptest::collection::vec(any::<bool>(), 5),
        texts in proptest::collection::vec(prose(), 5),
    ) {
        prop_assume!(present.iter().any(|p| *p));

        let mut obj = Map::new();
        let mut expected = Vec::new();
        for (i, (key, kind)) in FIELDS.iter().enumerate() {
            if present[i] {
                obj.insert((*key).to_string(), Value::String(texts[i].clone()));
                expected.push(*kind);
            } else if i % 2 == 0 {
                obj.insert((*key).to_string(), Value::String(String::new()));
            }
        }
        let payload = Value::Object(obj).to_string();

        let kinds: Vec<SectionKind> = format_report(&payload).iter().map(|s| s.kind).collect();
        prop_assert_eq!(kinds, expected);
    }

    #[test]
    fn keyword_split_extracts_the_whole_definition(
        before in prose(),
        code in snippet(),
        after in prose(),
    ) {
        let text = format!("{before} {code} {after}");
        let s = split(&text);
        prop_assert_eq!(s.before, before.trim());
        prop_assert_eq!(s.code.map(|c| c.source), Some(code));
        prop_assert_eq!(s.after, after.trim());
    }

    #[test]
    fn fenced_split_extracts_the_body(
        before in prose(),
        lang in "[a-z]{1,6}",
        body in "[a-z =;]{1,30}",
        after in prose(),
    ) {
        prop_assume!(!body.trim().is_empty());
        let text = format!("{before}\n```{lang}\n{body}\n```\n{after}");
        let s = split(&text);
        let code = s.code.expect("code block");
        prop_assert_eq!(code.language.as_deref(), Some(lang.as_str()));
        prop_assert_eq!(code.source, body.trim());
        prop_assert_eq!(s.before, before.trim());
        prop_assert_eq!(s.after, after.trim());
    }

    #[test]
    fn splitting_before_again_finds_nothing(
        before in prose(),
        code in snippet(),
        after in prose(),
        fenced in any::<bool>(),
    ) {
        let text = if fenced {
            format!("{before}\n```\n{code}\n```\n{after}")
        } else {
            format!("{before} {code} {after}")
        };
        let first = split(&text);
        let second = split(&first.before);
        prop_assert!(second.code.is_none());
        prop_assert_eq!(&second.before, &first.before);
        prop_assert_eq!(split(&text), first);
    }
}
