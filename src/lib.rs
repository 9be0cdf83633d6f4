#[macro_use]
extern crate log;
extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod grammar;
pub use grammar::{Analysis, AnalysisOptions, Error, Grammar, Lookahead, Symbol};

use grammar::pretty_print::Output;

fn analyze_to_json<F>(grammar: &str, render: F) -> String
where
    F: FnOnce(&Analysis) -> grammar::Result<String>,
{
    let result = Grammar::parse(grammar).and_then(|g| {
        let analysis = g.analyze()?;
        render(&analysis)
    });
    match result {
        Ok(json) => json,
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

#[wasm_bindgen]
pub fn nullable_first_follow_to_json(grammar: &str) -> String {
    analyze_to_json(grammar, |analysis| {
        analysis.to_non_terminal_output_vec().to_json()
    })
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    analyze_to_json(grammar, |analysis| analysis.to_ll1_parsing_table().to_json())
}

#[wasm_bindgen]
pub fn conflicts_to_json(grammar: &str) -> String {
    analyze_to_json(grammar, |analysis| analysis.to_conflict_output_vec().to_json())
}

#[cfg(test)]
mod json_tests {
    use serde_json::Value;

    #[test]
    fn nullable_first_follow() {
        let json = crate::nullable_first_follow_to_json(
            "Sum -> Number Tail\nTail -> Plus Number Tail | ϵ",
        );
        let v: Value = serde_json::from_str(&json).unwrap();
        let data = v["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1]["name"], "Tail");
        assert_eq!(data[1]["nullable"], true);
        assert_eq!(data[1]["first"], serde_json::json!(["Plus", "ϵ"]));
        assert_eq!(data[1]["follow"], serde_json::json!(["$"]));
    }

    #[test]
    fn ll1_table() {
        let json = crate::ll1_table_to_json("Sum -> Number Tail\nTail -> Plus Number Tail | ϵ");
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["terminals"], serde_json::json!(["Number", "Plus", "$"]));
        let tail = &v["rows"][1];
        assert_eq!(tail["left"], "Tail");
        assert_eq!(tail["cells"][1]["rights"], serde_json::json!([["Plus", "Number", "Tail"]]));
        assert_eq!(tail["cells"][2]["rights"], serde_json::json!([["ϵ"]]));
        assert_eq!(tail["cells"][0]["rights"], serde_json::json!([]));
    }

    #[test]
    fn conflicts() {
        let json = crate::conflicts_to_json("Stmt -> kId kId | kId kAssign");
        let v: Value = serde_json::from_str(&json).unwrap();
        let conflicts = v["conflicts"].as_array().unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0]["nonterminal"], "Stmt");
        assert_eq!(conflicts[0]["lookahead"], "kId");
        assert_eq!(conflicts[0]["productions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn errors_are_reported_as_json() {
        let json = crate::ll1_table_to_json("S -> a -> b");
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["error"], "Line 1: too many \"->\"");
    }
}
