//! Dialect compliance scanner.
//!
//! The deployment platform accepts a restricted legacy scripting dialect: no
//! block-scoped declarations, no arrow syntax, no template strings, no class
//! or module syntax, no dynamic evaluation, no ambient console/timer host
//! calls, no promise combinators, and none of the newer operator syntax.
//! The scanner detects those constructs with line-oriented pattern tests.
//!
//! This is a best-effort static check, not a tokenizer: each line is stripped
//! of comment content naively and then matched against the rule table, so
//! string literals that resemble forbidden code can produce false positives
//! and constructs split across lines can be missed. That imprecision is part
//! of the contract; nothing is auto-corrected and the scan never fails.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identity of a forbidden-construct rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// `let` / `const` declarations.
    BlockScopedDeclaration,
    /// Arrow function syntax (`=>`).
    ArrowFunction,
    /// Template string syntax (backticks).
    TemplateString,
    /// `class` declarations.
    ClassSyntax,
    /// `import` / `export` / `require` module syntax.
    ModuleSyntax,
    /// `eval(...)` / `new Function(...)` dynamic evaluation.
    DynamicEval,
    /// `console.*` diagnostics (the platform provides its own log functions).
    ConsoleCall,
    /// Timer primitives (`setTimeout`, `setInterval`, ...).
    TimerCall,
    /// Promise combinators (`Promise.all`, `Promise.race`, ...).
    PromiseCombinator,
    /// Optional chaining (`?.`).
    OptionalChaining,
    /// Nullish coalescing (`??`).
    NullishCoalescing,
    /// Rest/spread syntax (`...`).
    SpreadRest,
    /// Destructuring assignment.
    DestructuringAssignment,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::BlockScopedDeclaration => "block-scoped-declaration",
            Self::ArrowFunction => "arrow-function",
            Self::TemplateString => "template-string",
            Self::ClassSyntax => "class-syntax",
            Self::ModuleSyntax => "module-syntax",
            Self::DynamicEval => "dynamic-eval",
            Self::ConsoleCall => "console-call",
            Self::TimerCall => "timer-call",
            Self::PromiseCombinator => "promise-combinator",
            Self::OptionalChaining => "optional-chaining",
            Self::NullishCoalescing => "nullish-coalescing",
            Self::SpreadRest => "spread-rest",
            Self::DestructuringAssignment => "destructuring-assignment",
        };
        write!(f, "{tag}")
    }
}

/// A detected use of a forbidden construct.
///
/// Immutable once produced; line numbers are 1-based and refer to the
/// original (uncommented) source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The rule that matched.
    pub rule: RuleId,
    /// 1-based source line of the match.
    pub line: u32,
    /// Human-readable description of the rule.
    pub message: String,
    /// The offending line, trimmed.
    pub snippet: String,
}

/// A violation tagged with the fragment it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentViolation {
    /// Name of the fragment (relative path).
    pub fragment: String,
    /// The violation itself.
    pub violation: Violation,
}

struct Rule {
    id: RuleId,
    pattern: Regex,
    message: &'static str,
}

/// The compiled forbidden-construct rule table.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compiles the rule table.
    #[must_use]
    pub fn new() -> Self {
        let table: &[(RuleId, &str, &str)] = &[
            (
                RuleId::BlockScopedDeclaration,
                r"\b(?:let|const)\s",
                "block-scoped declaration ('let'/'const'); use 'var'",
            ),
            (
                RuleId::ArrowFunction,
                r"=>",
                "arrow function syntax; use a named 'function'",
            ),
            (
                RuleId::TemplateString,
                "`",
                "template string syntax; use quoted strings and concatenation",
            ),
            (
                RuleId::ClassSyntax,
                r"\bclass\s+[A-Za-z_$]",
                "class syntax is not supported by the platform",
            ),
            (
                RuleId::ModuleSyntax,
                r"^\s*(?:import\s|export\s)",
                "module import/export syntax; fragments share one global scope",
            ),
            (
                RuleId::ModuleSyntax,
                r"\brequire\s*\(",
                "dynamic module loading is not available on the platform",
            ),
            (
                RuleId::DynamicEval,
                r"\beval\s*\(",
                "dynamic evaluation is not available on the platform",
            ),
            (
                RuleId::DynamicEval,
                r"\bnew\s+Function\s*\(",
                "dynamic evaluation is not available on the platform",
            ),
            (
                RuleId::ConsoleCall,
                r"\bconsole\s*\.",
                "console diagnostics; use logInfo/logWarn/logError",
            ),
            (
                RuleId::TimerCall,
                r"\b(?:setTimeout|setInterval|setImmediate|clearTimeout|clearInterval)\s*\(",
                "timer primitives are not available on the platform",
            ),
            (
                RuleId::PromiseCombinator,
                r"\bPromise\s*\.\s*(?:all|race|any|allSettled)\s*\(",
                "promise combinators are not supported by the platform runtime",
            ),
            (
                RuleId::OptionalChaining,
                r"\?\.",
                "optional chaining ('?.') is not supported",
            ),
            (
                RuleId::NullishCoalescing,
                r"\?\?",
                "nullish coalescing ('??') is not supported",
            ),
            (
                RuleId::SpreadRest,
                r"\.\.\.",
                "rest/spread syntax ('...') is not supported",
            ),
            (
                RuleId::DestructuringAssignment,
                r"^\s*(?:var\s+)?\[\s*[A-Za-z_$]",
                "array destructuring assignment is not supported",
            ),
            (
                RuleId::DestructuringAssignment,
                r"^\s*(?:var\s+)?\{[^}]*\}\s*=[^=]",
                "object destructuring assignment is not supported",
            ),
        ];

        let rules = table
            .iter()
            .map(|&(id, pattern, message)| Rule {
                id,
                // The table is static; a malformed pattern is a programming
                // error caught by the rule-table test below.
                pattern: Regex::new(pattern).expect("static rule pattern must compile"),
                message,
            })
            .collect();

        Self { rules }
    }

    /// Scans source text and returns every violation found.
    ///
    /// A line may match multiple rules; every match becomes a separate
    /// violation. Returns an empty list for compliant input and never fails.
    #[must_use]
    pub fn scan(&self, source: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut in_block_comment = false;

        for (idx, raw_line) in source.lines().enumerate() {
            let line_no = (idx + 1) as u32;
            let (stripped, still_open) = strip_comments(raw_line, in_block_comment);
            in_block_comment = still_open;

            if stripped.trim().is_empty() {
                continue;
            }

            for rule in &self.rules {
                if rule.pattern.is_match(&stripped) {
                    violations.push(Violation {
                        rule: rule.id,
                        line: line_no,
                        message: rule.message.to_string(),
                        snippet: raw_line.trim().to_string(),
                    });
                }
            }
        }

        violations
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans source text with a freshly compiled default rule table.
///
/// Convenience wrapper over [`RuleSet::scan`]; callers scanning many
/// fragments should hold one `RuleSet` instead.
#[must_use]
pub fn scan(source: &str) -> Vec<Violation> {
    RuleSet::new().scan(source)
}

/// Removes line-comment and block-comment content from a single line.
///
/// Best effort only: comment markers inside string literals are treated as
/// real markers. Returns the stripped line and whether a block comment is
/// still open at the end of it.
fn strip_comments(line: &str, mut in_block: bool) -> (String, bool) {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < bytes.len() {
        if in_block {
            if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                in_block = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if bytes[i] == b'/' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'/' => break,
                b'*' => {
                    in_block = true;
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }

        // Byte-wise copy is safe here: comment markers are ASCII, so we only
        // ever split the line at ASCII boundaries.
        let ch_len = utf8_len(bytes[i]);
        out.push_str(&line[i..i + ch_len]);
        i += ch_len;
    }

    (out, in_block)
}

const fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b < 0xE0 => 2,
        b if b < 0xF0 => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_compiles() {
        let set = RuleSet::new();
        assert!(!set.rules.is_empty());
    }

    #[test]
    fn const_declaration_is_reported_with_line() {
        let violations = scan("var a = 0;\nconst x = 1;\n");
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::BlockScopedDeclaration && v.line == 2));
    }

    #[test]
    fn let_declaration_is_reported() {
        let violations = scan("let y = 2;");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleId::BlockScopedDeclaration);
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[0].snippet, "let y = 2;");
    }

    #[test]
    fn compliant_legacy_source_is_clean() {
        let src = "\
var total = 0;

function addCharge(amount) {
    total = total + amount;
    logInfo('charge added', amount);
}

addCharge(10);
";
        assert!(scan(src).is_empty());
    }

    #[test]
    fn one_line_can_match_multiple_rules() {
        let violations = scan("const f = (x) => x ?? 0;");
        let rules: Vec<RuleId> = violations.iter().map(|v| v.rule).collect();
        assert!(rules.contains(&RuleId::BlockScopedDeclaration));
        assert!(rules.contains(&RuleId::ArrowFunction));
        assert!(rules.contains(&RuleId::NullishCoalescing));
    }

    #[test]
    fn line_comments_are_ignored() {
        assert!(scan("var a = 1; // let the record show\n").is_empty());
        assert!(scan("// const x = 1;\n").is_empty());
    }

    #[test]
    fn block_comments_are_ignored_across_lines() {
        let src = "/*\nlet hidden = 1;\nconst also = 2;\n*/\nvar ok = 3;\n";
        assert!(scan(src).is_empty());
    }

    #[test]
    fn code_after_block_comment_on_same_line_is_scanned() {
        let violations = scan("/* banner */ let x = 1;");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleId::BlockScopedDeclaration);
    }

    #[test]
    fn line_numbers_match_the_original_file() {
        let src = "var a = 1;\n/* note */\n\nsetTimeout(go, 100);\n";
        let violations = scan(src);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleId::TimerCall);
        assert_eq!(violations[0].line, 4);
    }

    #[test]
    fn template_class_module_and_eval_are_detected() {
        assert_eq!(scan("var s = `hi`;")[0].rule, RuleId::TemplateString);
        assert_eq!(scan("class Greeter {}")[0].rule, RuleId::ClassSyntax);
        assert_eq!(scan("import x from 'y';")[0].rule, RuleId::ModuleSyntax);
        assert_eq!(scan("var m = require('m');")[0].rule, RuleId::ModuleSyntax);
        assert_eq!(scan("eval('1+1');")[0].rule, RuleId::DynamicEval);
        assert_eq!(
            scan("var f = new Function('return 1');")[0].rule,
            RuleId::DynamicEval
        );
    }

    #[test]
    fn console_promise_and_operator_rules_are_detected() {
        assert_eq!(scan("console.log('x');")[0].rule, RuleId::ConsoleCall);
        assert_eq!(
            scan("Promise.all([a, b]);")[0].rule,
            RuleId::PromiseCombinator
        );
        assert_eq!(scan("var v = a?.b;")[0].rule, RuleId::OptionalChaining);
        assert_eq!(scan("var v = a ?? b;")[0].rule, RuleId::NullishCoalescing);
        assert_eq!(scan("fn(...args);")[0].rule, RuleId::SpreadRest);
    }

    #[test]
    fn destructuring_is_detected_but_indexing_is_not() {
        assert_eq!(
            scan("var [a, b] = pair;")[0].rule,
            RuleId::DestructuringAssignment
        );
        assert_eq!(
            scan("{ a, b } = obj;")[0].rule,
            RuleId::DestructuringAssignment
        );
        // Index assignment must not trip the array-destructuring pattern.
        assert!(scan("items[0] = 1;").is_empty());
    }

    #[test]
    fn string_literal_false_positive_is_accepted_behavior() {
        // Documented limitation: pattern tests do not understand strings.
        let violations = scan("var s = 'use => here';");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleId::ArrowFunction);
    }

    #[test]
    fn scan_never_fails_on_odd_input() {
        assert!(scan("").is_empty());
        assert!(scan("\n\n\n").is_empty());
        let _ = scan("var emoji = '🌍'; /* 多字节 */ var ok = 1;");
    }
}
