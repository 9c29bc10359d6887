//! Modifier chains: the transformations applied to a value after the
//! identifier of a placeholder, as in `{amount*100}` or `{name|sub(3)|post(.)}`.
//!
//! Three families are provided:
//! * [`FormatModifier`] – `money`, `left`, `center`, `right`.
//! * [`NumberModifier`] – arithmetic with `+ - * /` and parentheses.
//! * [`StringModifier`] – `pre`, `post`, `sub`, `cut`, `flip`, `remove`, `delete`.
//!
//! A [`Pipeline`] holds families in priority order and hands a chain to the
//! first one that claims it. A family that meets a step it does not know asks
//! the pipeline again for that step alone, which is how a single chain can mix
//! families (`money(,)|right(15)|post(!)`).

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{Result, TemplexError};
use crate::escape;
use crate::value::Value;

/// Resolver for a chain step a family does not recognize.
pub type Fallback<'a> = &'a dyn Fn(&str, &str) -> Result<Value>;

pub trait Modifier: Send + Sync {
    /// Name used when a pipeline is assembled from configuration.
    fn name(&self) -> &'static str;
    /// Whether the whole chain is written in this family's grammar.
    fn claims(&self, chain: &str) -> bool;
    fn modify(&self, value: &str, chain: &str, fallback: Option<Fallback>) -> Result<Value>;
}

lazy_static! {
    static ref NUMBER_CLAIM: Regex =
        Regex::new(r"^\s*[\*/\+\-][\s\.\*/\+\-\(\)0-9]*?[0-9\)]\s*$").unwrap();
    static ref PARENTHESIS: Regex =
        Regex::new(r"\(\s*((\-\s*)?[0-9]+(\.[0-9]+)?)?\s*\)").unwrap();
    static ref MULTIPLICATIVE: Regex = Regex::new(
        r"\s*([\*/\+\-\(])\s*((\-\s*)?[0-9]+(\.[0-9]+)?)\s*([\*/])\s*((\-\s*)?[0-9]+(\.[0-9]+)?)"
    )
    .unwrap();
    static ref ADDITIVE: Regex = Regex::new(
        r"\s*([\*/\+\-\(])\s*((\-\s*)?[0-9]+(\.[0-9]+)?)\s*([\+\-])\s*((\-\s*)?[0-9]+(\.[0-9]+)?)"
    )
    .unwrap();
    static ref STRING_CLAIM: Regex =
        Regex::new(r"(?i)^(\s*(pre|post|sub|cut|flip|remove|delete)\((.*?)\)\s*\|)+$").unwrap();
    static ref STRING_STEP: Regex =
        Regex::new(r"(?i)^\s*(pre|post|sub|cut|flip|remove|delete)\((.*?)\)\s*$").unwrap();
    static ref FORMAT_CLAIM: Regex =
        Regex::new(r"(?i)^(\s*(money|left|center|right)\((.*?)\)\s*\|)+$").unwrap();
    static ref FORMAT_STEP: Regex =
        Regex::new(r"(?i)^\s*(money|left|center|right)\((.*?)\)\s*$").unwrap();
    static ref MONEY: Regex = Regex::new(r"^\s*([\.,]([0-9]*))\s*$").unwrap();
    static ref THOUSANDS: Regex = Regex::new(r"^([1-9][0-9]*?)([0-9]{3})($|[\.,])").unwrap();
    static ref DEFAULT_PIPELINE: RwLock<Arc<Pipeline>> =
        RwLock::new(Arc::new(Pipeline::standard()));
}

// ------------- Pipeline -------------
#[derive(Clone)]
pub struct Pipeline {
    modifiers: Vec<Arc<dyn Modifier>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Pipeline {
    pub fn new(modifiers: Vec<Arc<dyn Modifier>>) -> Self {
        Self { modifiers }
    }
    /// Formatting first, then arithmetic, then string reshaping.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(FormatModifier::new()),
            Arc::new(NumberModifier::new()),
            Arc::new(StringModifier::new()),
        ])
    }
    /// Builds a pipeline from family names (`format`, `number`, `string`).
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut modifiers: Vec<Arc<dyn Modifier>> = Vec::new();
        for name in names {
            let modifier: Arc<dyn Modifier> = match name.as_ref().trim().to_lowercase().as_str() {
                "format" => Arc::new(FormatModifier::new()),
                "number" => Arc::new(NumberModifier::new()),
                "string" => Arc::new(StringModifier::new()),
                other => {
                    return Err(TemplexError::Config(format!("unknown modifier family \"{}\"", other)))
                }
            };
            modifiers.push(modifier);
        }
        Ok(Self::new(modifiers))
    }
    pub fn names(&self) -> Vec<&'static str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }
    /// Applies a modifier chain to a value. A blank chain leaves the value as is.
    pub fn apply(&self, value: &str, chain: &str) -> Result<Value> {
        if chain.trim_matches(|c: char| c.is_whitespace() || c == '|').is_empty() {
            return Ok(Value::Text(value.to_owned()));
        }
        let modifier = self
            .modifiers
            .iter()
            .find(|m| m.claims(chain))
            .ok_or_else(|| TemplexError::InvalidModifier(chain.to_owned()))?;
        trace!(modifier = modifier.name(), chain, "applying modifier chain");
        // the step has already been split out, so its pipes must stay literal
        let fallback: Fallback = &|value: &str, step: &str| self.apply(value, &escape::join(&[step]));
        modifier.modify(value, chain, Some(fallback))
    }
}

/// The pipeline used by every operation that does not pin one explicitly.
pub fn default_pipeline() -> Arc<Pipeline> {
    Arc::clone(&DEFAULT_PIPELINE.read().unwrap_or_else(PoisonError::into_inner))
}

/// Replaces the process-wide default pipeline. Meant for start-up configuration.
pub fn set_default_pipeline(pipeline: Pipeline) {
    *DEFAULT_PIPELINE.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(pipeline);
}

fn delegate(fallback: Option<Fallback>, value: &str, step: &str) -> Result<Value> {
    let invalid = || TemplexError::InvalidExpression(step.to_owned());
    match fallback {
        Some(resolve) => resolve(value, step).map_err(|e| {
            debug!(step, error = %e, "fallback failed");
            invalid()
        }),
        None => Err(invalid()),
    }
}

// Quotes the characters that would end or reshape a bracket class, so that
// ranges such as `0-9` keep working.
fn class_member(set: &str) -> String {
    let mut quoted = String::with_capacity(set.len());
    for c in set.chars() {
        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

fn steps(chain: &str) -> Vec<String> {
    escape::split(chain.trim_matches(|c: char| c == ' ' || c == '|'))
}

fn claimed(grammar: &Regex, chain: &str) -> bool {
    grammar.is_match(&format!("{}|", chain.trim_matches(|c: char| c == ' ' || c == '|')))
}

fn splice(text: &str, range: Range<usize>, with: &str) -> String {
    let mut spliced = String::with_capacity(text.len() + with.len());
    spliced.push_str(&text[..range.start]);
    spliced.push_str(with);
    spliced.push_str(&text[range.end..]);
    spliced
}

// ------------- Number -------------
#[derive(Debug, Default)]
pub struct NumberModifier;

impl NumberModifier {
    pub fn new() -> Self {
        Self
    }
}

impl Modifier for NumberModifier {
    fn name(&self) -> &'static str {
        "number"
    }
    fn claims(&self, chain: &str) -> bool {
        NUMBER_CLAIM.is_match(chain) && balanced(chain)
    }
    fn modify(&self, value: &str, chain: &str, _fallback: Option<Fallback>) -> Result<Value> {
        evaluate(&format!("{}{}", value, chain))
    }
}

fn balanced(text: &str) -> bool {
    text.matches('(').count() == text.matches(')').count()
}

/// Evaluates an arithmetic expression by repeated rewriting.
///
/// Every round first collapses parentheses around a single number, then
/// reduces the leftmost multiplication or division until none is left, then
/// the leftmost addition or subtraction likewise. A reduction only applies
/// when the left operand follows an operator or an opening parenthesis, so
/// parentheses are only ever removed once their content is a single number.
pub fn evaluate(expression: &str) -> Result<Value> {
    let invalid = || TemplexError::InvalidExpression(expression.to_owned());
    let mut syntax = format!("({})", expression);
    if !balanced(&syntax) {
        return Err(invalid());
    }
    loop {
        let mut found = false;
        while let Some(next) = collapse(&syntax)? {
            syntax = next;
            found = true;
        }
        for operator in [&*MULTIPLICATIVE, &*ADDITIVE] {
            while let Some(next) = reduce(&syntax, operator, expression)? {
                syntax = next;
                found = true;
            }
        }
        if !found || !syntax.contains('(') || !syntax.contains(')') {
            break;
        }
    }
    if syntax.contains('(') || syntax.contains(')') {
        return Err(invalid());
    }
    let residue: String = syntax.chars().filter(|c| !c.is_whitespace()).collect();
    debug!(expression, result = %residue, "evaluated");
    if residue.contains('.') {
        residue.parse::<f64>().map(Value::Float).map_err(|_| invalid())
    } else {
        residue.parse::<i64>().map(Value::Int).map_err(|_| invalid())
    }
}

fn collapse(syntax: &str) -> Result<Option<String>> {
    let Some(caps) = PARENTHESIS.captures(syntax) else {
        return Ok(None);
    };
    let group = caps.get_match();
    match caps.get(1) {
        Some(literal) => Ok(Some(splice(syntax, group.range(), literal.as_str()))),
        None => Err(TemplexError::InvalidExpression(group.as_str().to_owned())),
    }
}

fn reduce(syntax: &str, operator: &Regex, expression: &str) -> Result<Option<String>> {
    let Some(caps) = operator.captures(syntax) else {
        return Ok(None);
    };
    let (context, left, op, right) = (&caps[1], &caps[2], &caps[5], &caps[6]);
    let result = arithmetic(left, op, right)?;
    if !result.is_finite() {
        return Err(TemplexError::DivisionByZero(expression.to_owned()));
    }
    let rendered = if left.contains('.') || right.contains('.') {
        format!("{}{:.6}", context, result)
    } else {
        format!("{}{}", context, result)
    };
    trace!(reduced = caps.get_match().as_str(), into = %rendered);
    Ok(Some(splice(syntax, caps.get_match().range(), &rendered)))
}

fn number_of(text: &str) -> Result<f64> {
    let digits: String = text.chars().filter(|c| *c != ' ').collect();
    digits
        .parse::<f64>()
        .map_err(|_| TemplexError::InvalidExpression(text.to_owned()))
}

fn arithmetic(a: &str, op: &str, b: &str) -> Result<f64> {
    let x = number_of(a)?;
    let y = number_of(b)?;
    match op.trim() {
        "+" => Ok(x + y),
        "-" => Ok(x - y),
        "*" => Ok(x * y),
        "/" => Ok(x / y),
        other => Err(TemplexError::InvalidExpression(other.to_owned())),
    }
}

// ------------- String -------------
#[derive(Debug, Default)]
pub struct StringModifier;

impl StringModifier {
    pub fn new() -> Self {
        Self
    }
}

impl Modifier for StringModifier {
    fn name(&self) -> &'static str {
        "string"
    }
    fn claims(&self, chain: &str) -> bool {
        claimed(&STRING_CLAIM, chain)
    }
    fn modify(&self, value: &str, chain: &str, fallback: Option<Fallback>) -> Result<Value> {
        let mut result = Value::Text(value.to_owned());
        for step in steps(chain) {
            let value = result.to_string();
            let Some(caps) = STRING_STEP.captures(&step) else {
                result = delegate(fallback, &value, &step)?;
                continue;
            };
            let invalid = || TemplexError::InvalidExpression(step.clone());
            let argument = &caps[2];
            let chars: Vec<char> = value.chars().collect();
            let length = chars.len() as i64;
            let reshaped = match caps[1].to_lowercase().as_str() {
                "pre" if !argument.is_empty() => format!("{}{}", argument, value),
                "post" if !argument.is_empty() => format!("{}{}", value, argument),
                "sub" => {
                    let n = argument.parse::<i64>().map_err(|_| invalid())?;
                    if n < 0 {
                        chars[(length + n).max(0) as usize..].iter().collect()
                    } else {
                        chars[..n.min(length) as usize].iter().collect()
                    }
                }
                "cut" => {
                    let n = argument.parse::<i64>().map_err(|_| invalid())?;
                    if n == 0 {
                        return Err(invalid());
                    }
                    if n < 0 {
                        let keep = length + n;
                        if keep < 0 { String::new() } else { chars[..keep as usize].iter().collect() }
                    } else if n > length {
                        String::new()
                    } else {
                        chars[n as usize..].iter().collect()
                    }
                }
                "flip" if argument.is_empty() => chars.iter().rev().collect(),
                "remove" if !argument.is_empty() => value.replace(argument, ""),
                "delete" if !argument.is_empty() => {
                    let class = Regex::new(&format!("(?i)[{}]+", class_member(argument)))
                        .map_err(|_| invalid())?;
                    class.replace_all(&value, "").into_owned()
                }
                _ => return Err(invalid()),
            };
            result = Value::Text(reshaped);
        }
        Ok(result)
    }
}

// ------------- Format -------------
#[derive(Debug, Default)]
pub struct FormatModifier;

impl FormatModifier {
    pub fn new() -> Self {
        Self
    }
}

impl Modifier for FormatModifier {
    fn name(&self) -> &'static str {
        "format"
    }
    fn claims(&self, chain: &str) -> bool {
        claimed(&FORMAT_CLAIM, chain)
    }
    fn modify(&self, value: &str, chain: &str, fallback: Option<Fallback>) -> Result<Value> {
        let mut result = Value::Text(value.to_owned());
        for step in steps(chain) {
            let value = result.to_string();
            let Some(caps) = FORMAT_STEP.captures(&step) else {
                result = delegate(fallback, &value, &step)?;
                continue;
            };
            let invalid = || TemplexError::InvalidExpression(step.clone());
            let argument = &caps[2];
            let name = caps[1].to_lowercase();
            if name == "money" {
                result = Value::Text(money(&value, argument).ok_or_else(invalid)?);
                continue;
            }
            let width = match argument.trim().parse::<i64>() {
                Ok(n) if n > 0 => n as usize,
                _ => return Err(invalid()),
            };
            let chars: Vec<char> = value.chars().collect();
            let padding = width.saturating_sub(chars.len());
            let formatted: String = match name.as_str() {
                "left" if padding > 0 => format!("{}{}", value, " ".repeat(padding)),
                "center" if padding > 0 => {
                    let front = padding / 2;
                    format!("{}{}{}", " ".repeat(front), value, " ".repeat(padding - front))
                }
                "left" | "center" => chars[..width].iter().collect(),
                "right" if padding > 0 => format!("{}{}", " ".repeat(padding), value),
                "right" => chars[chars.len() - width..].iter().collect(),
                _ => return Err(invalid()),
            };
            result = Value::Text(formatted);
        }
        Ok(result)
    }
}

fn money(value: &str, argument: &str) -> Option<String> {
    let (mut separator, mut places) = ('.', 0usize);
    if !argument.is_empty() {
        let caps = MONEY.captures(argument)?;
        separator = caps[1].chars().next()?;
        places = caps[2].parse().unwrap_or(0);
    }
    let number = value.trim().parse::<f64>().ok()?;
    let mut rendered = format!("{:.*}", places, number.abs());
    let grouping = if separator == ',' {
        rendered = rendered.replace('.', ",");
        '.'
    } else {
        ','
    };
    let replacement = format!("${{1}}{}${{2}}${{3}}", grouping);
    while THOUSANDS.is_match(&rendered) {
        rendered = THOUSANDS.replace(&rendered, replacement.as_str()).into_owned();
    }
    if number.is_sign_negative() && number != 0.0 {
        rendered.insert(0, '-');
    }
    Some(rendered)
}
