//! MSBuild `Condition` attribute grammar.
//!
//! `.vcxproj` files scope `ItemDefinitionGroup` and `PropertyGroup` elements
//! to one build configuration with conditions such as:
//!
//! - `'$(Configuration)|$(Platform)'=='Debug|Win32'`
//! - `'$(Configuration)'=='Release'`
//! - `'$(Configuration)|$(Platform)'=='Debug|x64' and Exists('local.props')`
//!
//! The grammar is parsed with [`chumsky`]; [`configuration_selector`] then
//! picks out the configuration (and optional platform) the condition selects.
//!
//! ```text
//! expr       = or_expr
//! or_expr    = and_expr ('or' and_expr)*
//! and_expr   = unary ('and' unary)*
//! unary      = '!' unary | atom
//! atom       = comparison | exists | '(' expr ')'
//! comparison = quoted ('==' | '!=') quoted
//! exists     = 'Exists' '(' quoted ')'
//! quoted     = "'" chars "'"
//! ```

use chumsky::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
//  AST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare { lhs: Vec<Fragment>, op: CompareOp, rhs: Vec<Fragment> },
    Exists(Vec<Fragment>),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
}

/// Piece of a quoted operand: literal text or a `$(Property)` reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Literal(String),
    Property(String),
}

fn split_fragments(s: &str) -> Vec<Fragment> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'(') {
            if !literal.is_empty() {
                parts.push(Fragment::Literal(std::mem::take(&mut literal)));
            }
            chars.next();
            let name: String = chars.by_ref().take_while(|&ch| ch != ')').collect();
            parts.push(Fragment::Property(name.trim().to_string()));
        } else {
            literal.push(c);
        }
    }

    if !literal.is_empty() {
        parts.push(Fragment::Literal(literal));
    }
    parts
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Parser
// ═══════════════════════════════════════════════════════════════════════════════

fn condition_parser<'a>() -> impl Parser<'a, &'a str, Condition, extra::Err<Simple<'a, char>>> {
    recursive(|expr| {
        let quoted = just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\''))
            .map(split_fragments);

        let op = just("==")
            .to(CompareOp::Equal)
            .or(just("!=").to(CompareOp::NotEqual));

        let comparison = quoted
            .padded()
            .then(op.padded())
            .then(quoted.padded())
            .map(|((lhs, op), rhs)| Condition::Compare { lhs, op, rhs });

        let word = any()
            .filter(|c: &char| c.is_ascii_alphabetic())
            .repeated()
            .at_least(1)
            .to_slice();

        let exists = word
            .filter(|w: &&str| w.eq_ignore_ascii_case("exists"))
            .ignore_then(just('(').padded())
            .ignore_then(quoted)
            .then_ignore(just(')').padded())
            .map(Condition::Exists);

        let group = expr.delimited_by(just('(').padded(), just(')').padded());

        let atom = choice((comparison, exists, group)).padded();

        let unary = recursive(|unary| {
            just('!')
                .padded()
                .ignore_then(unary)
                .map(|c| Condition::Not(Box::new(c)))
                .or(atom)
        });

        let and_kw = word.filter(|w: &&str| w.eq_ignore_ascii_case("and")).padded();
        let and_expr = unary.clone().foldl(and_kw.ignore_then(unary).repeated(), |l, r| {
            Condition::And(Box::new(l), Box::new(r))
        });

        let or_kw = word.filter(|w: &&str| w.eq_ignore_ascii_case("or")).padded();
        and_expr.clone().foldl(or_kw.ignore_then(and_expr).repeated(), |l, r| {
            Condition::Or(Box::new(l), Box::new(r))
        })
    })
}

/// Parse a `Condition` attribute value.
pub fn parse_condition(input: &str) -> Result<Condition, String> {
    condition_parser().parse(input).into_result().map_err(|errs| {
        let messages: Vec<String> = errs.iter().map(|e| format!("{e}")).collect();
        format!("failed to parse condition '{input}': {}", messages.join("; "))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Configuration selection
// ═══════════════════════════════════════════════════════════════════════════════

/// The build variant a condition restricts its group to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSelector {
    pub configuration: String,
    pub platform: Option<String>,
}

fn references_configuration(fragments: &[Fragment]) -> bool {
    fragments.iter().any(|f| {
        matches!(f, Fragment::Property(p) if p.eq_ignore_ascii_case("Configuration"))
    })
}

fn literal_text(fragments: &[Fragment]) -> Option<String> {
    fragments
        .iter()
        .map(|f| match f {
            Fragment::Literal(s) => Some(s.as_str()),
            Fragment::Property(_) => None,
        })
        .collect::<Option<Vec<&str>>>()
        .map(|parts| parts.concat())
}

fn find_selector(condition: &Condition) -> Option<ConfigSelector> {
    match condition {
        Condition::Compare { lhs, op: CompareOp::Equal, rhs } => {
            let (pattern, value) = if references_configuration(lhs) {
                (lhs, rhs)
            } else if references_configuration(rhs) {
                (rhs, lhs)
            } else {
                return None;
            };
            let value = literal_text(value)?;
            let mut segments = value.split('|');
            let configuration = segments.next()?.trim().to_string();
            if configuration.is_empty() {
                return None;
            }
            let platform = if pattern.len() > 1 {
                segments.next().map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
            } else {
                None
            };
            Some(ConfigSelector { configuration, platform })
        }
        Condition::And(a, b) => find_selector(a).or_else(|| find_selector(b)),
        _ => None,
    }
}

/// Extract the configuration a `Condition` attribute selects.
///
/// Recognizes `'$(Configuration)|$(Platform)'=='X|Y'` and
/// `'$(Configuration)'=='X'`, also inside `and` chains.  Conditions that do
/// not select a configuration, or do not parse, yield `None`.
pub fn configuration_selector(condition: &str) -> Option<ConfigSelector> {
    match parse_condition(condition) {
        Ok(expr) => find_selector(&expr),
        Err(message) => {
            tracing::debug!("{message}");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
