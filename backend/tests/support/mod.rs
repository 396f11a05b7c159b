#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use session_analytics::models::{AggregatedRecord, Dataset};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment, since tests run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// CSV export in the default layout.
///
/// Operator `A` has 150 units, `B` 40, `C` 0 (every row of `C` has weight 0).
pub const SAMPLE_CSV: &str = "\
duration,weight,source,campaign,operator
0,50,Google,Spring,A
12.5,30,Google,Spring,A
45,40,Bing,Spring,A
200,30,Google,Fall,A
0,10,Bing,Fall,B
75,20,Google,Fall,B
400,10,Bing,Spring,B
33,0,Google,Spring,C
";

/// Same table in the legacy spreadsheet layout, `;` separated, decimal comma.
pub const SAMPLE_LEGACY_CSV: &str = "\
Durée;Source recodifiée;Source recodifiée2;Campagne recodifiée;Visites
0;50;Google;Spring;A
12,5;30;Google;Spring;A
45;40;Bing;Spring;A
200;30;Google;Fall;A
0;10;Bing;Fall;B
75;20;Google;Fall;B
400;10;Bing;Spring;B
33;0;Google;Spring;C
";

/// Build a single-dimension dataset (`operator`) from `(operator, duration, weight)`.
pub fn operator_dataset(rows: &[(&str, f64, u64)]) -> Dataset {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, &(op, d, w))| AggregatedRecord::new(i, vec![op.to_string()], d, w))
        .collect();
    Dataset::new(vec!["operator".to_string()], 0, records)
}
