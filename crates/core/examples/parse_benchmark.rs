//! Lightweight parse benchmark harness for local baselines.
//!
//! Compares the packrat cache against plain backtracking on generated
//! mini-Java sources of growing size.
//!
//! Run from repository root:
//! `cargo run -p packrat_cst_core --example parse_benchmark --release`

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use packrat_cst_core::{Grammar, ParseStats, Parser, ParserConfig};

fn load_grammar() -> Result<Grammar, String> {
    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from("grammars/mini_java.jsonc"),
        PathBuf::from("../../grammars/mini_java.jsonc"),
    ];
    if let Ok(from_env) = std::env::var("PACKRAT_GRAMMAR") {
        candidates.insert(0, PathBuf::from(from_env));
    }
    for path in candidates {
        if !path.exists() {
            continue;
        }
        let jsonc = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read grammar at '{}': {e}", path.display()))?;
        return Grammar::from_jsonc(&jsonc)
            .map_err(|e| format!("failed to load grammar at '{}': {e}", path.display()));
    }
    Err("unable to locate mini_java.jsonc; set PACKRAT_GRAMMAR to its path".to_string())
}

/// A class with `members` fields whose initializers nest a little.
fn generate_source(members: usize) -> String {
    let mut out = String::from("package bench.generated;\n\n/* generated */\nclass Bench {\n");
    for i in 0..members {
        out.push_str(&format!(
            "  int f{i} = (f{i} + {i}) * (intx{i} - {i} / 2); // field {i}\n"
        ));
    }
    out.push_str("}\n");
    out
}

fn time_parses(parser: &Parser<'_>, input: &str, iterations: usize) -> (f64, ParseStats) {
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = parser.parse_with_diagnostics(input);
    }
    let per_iter = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;
    (per_iter, parser.parse_with_diagnostics(input).stats)
}

fn main() -> Result<(), String> {
    let grammar = load_grammar()?;
    let iterations = std::env::var("PACKRAT_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(50);

    let memo = Parser::with_config(&grammar, ParserConfig::default());
    let plain = Parser::with_config(&grammar, ParserConfig::default().with_memoize(false));

    for members in [10, 100, 1000] {
        let input = generate_source(members);
        let (memo_ms, memo_stats) = time_parses(&memo, &input, iterations);
        let (plain_ms, plain_stats) = time_parses(&plain, &input, iterations);

        println!("Benchmark: {members} members");
        println!("  input_bytes: {}", input.len());
        println!(
            "  memoized: per_iter={memo_ms:.3} ms, evaluations={}, cache_hits={}, cache_entries={}",
            memo_stats.evaluations, memo_stats.cache_hits, memo_stats.cache_entries
        );
        println!(
            "  plain:    per_iter={plain_ms:.3} ms, evaluations={}",
            plain_stats.evaluations
        );
    }

    Ok(())
}
