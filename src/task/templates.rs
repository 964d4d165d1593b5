//! Instruction templates for the `lena` sub-agent.
//!
//! Placeholders use `{name}` and are filled in a single pass by
//! [`render`]; substituted values are never scanned again.

use std::collections::BTreeMap;

pub const VERIFY: &str = "Use lena to audit the file {file} and check whether it follows \
security and quality best practices.";

pub const COMPARE: &str = r#"Use lena to:
1. ACTUALLY read the files {file1} and {file2}
2. Compare the two implementations
3. Identify the concrete differences (with line numbers)
4. Recommend which version is better (with evidence)
"#;

pub const SEARCH_FIX: &str = r#"Use lena to:
1. Analyze this error: {error_message}
2. Search Stack Overflow/GitHub automatically
3. Read the file {file_path} to understand the context
4. Propose a solution based on the search results
5. Apply the fix if approved
6. TEST that the fix works
"#;

pub const AUDIT: &str = r#"Use lena to run a complete security audit:
1. Scan all Python/JS files
2. Look for hardcoded secrets
3. Detect potential SQL injections
4. Check for dangerous eval/exec
5. Run bandit (Python) and npm audit (JS)
6. Provide a report with severities (🔴🟠🟡🟢)
"#;

/// Replace every `{name}` with `params[name]`.
///
/// Braces that do not enclose a known parameter name are copied through.
pub fn render(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}').and_then(|end| {
            params
                .get(&after[..end])
                .map(|value| (value, &after[end + 1..]))
        }) {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
