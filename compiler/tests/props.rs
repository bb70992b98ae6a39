use koinos_reflect_compiler::{
    compile_schema, decode_schema_json, error::ReflectError, parser::MAX_TARG_DEPTH,
    tokenizer::{Lexer, TokenKind},
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]
    #[test]
    fn lexer_never_panics_and_terminates(s in ".*") {
        let max_steps = s.len() + 2;
        let mut text = String::new();
        let mut steps = 0usize;
        let mut ended = false;

        for item in Lexer::new(&s) {
            steps += 1;
            prop_assert!(steps <= max_steps, "too many tokens for input={s:?}");
            prop_assert!(!ended, "token after end of stream input={s:?}");
            match item {
                Ok(tok) if tok.kind == TokenKind::Eof => ended = true,
                Ok(tok) => {
                    prop_assert!(!tok.text.is_empty(), "empty token {tok:?} input={s:?}");
                    text.push_str(&tok.text);
                }
                Err(ReflectError::LexError { position, .. }) => {
                    prop_assert_eq!(position, text.len());
                    ended = true;
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }
        }

        prop_assert!(ended, "stream ended without EOF or error input={s:?}");
        // Whatever lexed successfully is an exact prefix of the input.
        prop_assert!(s.starts_with(&text));
    }

    #[test]
    fn idl_like_input_lexes_completely(s in "[a-z_<>{}();,=0-9 \n]{0,64}") {
        let tokens: Vec<_> = Lexer::new(&s).collect::<Result<_, _>>().expect("lexes");
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(joined, s);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn sorted_schema_declares_dependencies_first(
        (deps, order) in (1usize..12).prop_flat_map(|n| {
            let deps = (0..n)
                .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
                .collect::<Vec<_>>();
            (deps, Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
        })
    ) {
        // Node `i` only ever depends on nodes with a smaller index, so the
        // graph is acyclic whatever order the declarations are written in.
        let mut text = String::new();
        for &i in &order {
            text.push_str(&format!("struct t{} {{", i));
            for (f, dep) in deps[i].iter().enumerate() {
                text.push_str(&format!(" t{} f{};", dep, f));
            }
            text.push_str(" };\n");
        }

        let (schema, _) = compile_schema(&text).expect("acyclic input compiles");
        let position = |name: &str| schema.names().position(|n| n.join("::") == name);
        prop_assert_eq!(schema.len(), order.len());

        for (i, node_deps) in deps.iter().enumerate() {
            let me = position(&format!("t{}", i)).expect("declared");
            for &dep in node_deps {
                let them = position(&format!("t{}", dep)).expect("declared");
                prop_assert!(them < me, "t{} emitted after its user t{}\n{}", dep, i, text);
            }
        }
    }

    #[test]
    fn nested_template_arguments_round_trip(
        levels in proptest::collection::vec((any::<bool>(), 0u64..1000), 1..=MAX_TARG_DEPTH)
    ) {
        // Build the type inside out; some levels carry an extra int argument.
        let mut tref = "u8".to_string();
        for &(with_int, n) in &levels {
            tref = if with_int { format!("v<{}, {}>", tref, n) } else { format!("v<{}>", tref) };
        }
        let text = format!("KOINOS_BASETYPE(u8) KOINOS_BASETYPE(v) typedef {} deep;", tref);

        let (schema, json) = compile_schema(&text).expect("nesting within the bound compiles");
        prop_assert_eq!(decode_schema_json(&json).expect("decodes"), schema.clone());
        let pretty = serde_json::to_string_pretty(&schema).expect("encodes");
        prop_assert_eq!(decode_schema_json(&pretty).expect("decodes"), schema);
    }
}
