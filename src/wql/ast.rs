//! The typed WQL expression tree.
//!
//! A parsed statement consists of an optional [`Filter`], an optional
//! [`Order`] and an optional [`Partitioning`]. Filters evaluate to sets of
//! record ids through an [`IndexSource`]; order and partitioning work on
//! materialized records. Every node implements `Display`, producing WQL
//! that parses back into an equivalent tree.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::culture::Culture;
use crate::document::{FieldValue, Record};
use crate::error::Result;
use crate::index::{IdSet, IndexSource, cap_results};
use crate::schema::Schema;
use crate::wql::condition::{ConditionKind, ConditionOperator, ConditionOptions};
use crate::wql::function::WqlFunction;

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Quoted or bare text.
    Text(String),
    /// Numeric literal, or the result of a numeric function.
    Number(f64),
}

impl Value {
    /// Text handed to a field analyzer when the value is searched in a term
    /// index.
    pub fn to_index_text(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::Number(number) => number.to_string(),
        }
    }

    /// The value as a number, parsing text with `culture`.
    pub fn as_number(&self, culture: &Culture) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => culture.parse_number(text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{number}"),
            Value::Text(text) if text.contains('\'') => write!(f, "\"{text}\""),
            Value::Text(text) => write!(f, "'{text}'"),
        }
    }
}

/// A reference to a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Field name as written in the statement.
    pub name: String,
}

impl Attribute {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Attribute { name: name.into() }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A function call in parameter position.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub function: Arc<dyn WqlFunction>,
    pub arguments: Vec<Parameter>,
}

impl FunctionCall {
    /// Evaluate the arguments, then the function.
    pub fn evaluate(&self, culture: &Culture) -> Result<Value> {
        let arguments = self
            .arguments
            .iter()
            .map(|argument| argument.resolve(culture))
            .collect::<Result<Vec<_>>>()?;
        self.function.evaluate(&arguments, culture)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function.name())?;
        write_list(f, &self.arguments)?;
        f.write_str(")")
    }
}

/// A condition parameter.
#[derive(Debug, Clone)]
pub enum Parameter {
    Value(Value),
    Function(FunctionCall),
}

impl Parameter {
    /// The value this parameter stands for at evaluation time.
    pub fn resolve(&self, culture: &Culture) -> Result<Value> {
        match self {
            Parameter::Value(value) => Ok(value.clone()),
            Parameter::Function(call) => call.evaluate(culture),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Value(value) => fmt::Display::fmt(value, f),
            Parameter::Function(call) => fmt::Display::fmt(call, f),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt::Display::fmt(item, f)?;
    }
    Ok(())
}

/// What a filter is evaluated against.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// Resolves attributes to reverse indexes.
    pub source: &'a dyn IndexSource,
    /// Culture used to evaluate function arguments.
    pub culture: &'a Culture,
    /// Cap applied to the result of every condition.
    pub max_results: Option<usize>,
}

impl<'a> EvalContext<'a> {
    pub fn new(source: &'a dyn IndexSource, culture: &'a Culture) -> Self {
        EvalContext {
            source,
            culture,
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }
}

/// `attribute op parameter [~similarity] [:distance]` or
/// `attribute op (parameter, ...)`.
#[derive(Debug, Clone)]
pub struct Condition {
    pub attribute: Attribute,
    pub operator: Arc<dyn ConditionOperator>,
    pub parameters: Vec<Parameter>,
    pub options: ConditionOptions,
}

impl Condition {
    /// Ids of the records matching this condition.
    pub fn evaluate(&self, context: &EvalContext<'_>) -> Result<IdSet> {
        let lookup = context.source.lookup(&self.attribute.name)?;
        let values = self
            .parameters
            .iter()
            .map(|parameter| -> Result<Value> {
                let value = parameter.resolve(context.culture)?;
                Ok(if lookup.is_numeric() {
                    numeric_parameter(value, context.culture)
                } else {
                    value
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let ids = self.operator.evaluate(lookup, &values, &self.options)?;
        trace!("condition '{self}' matched {} record(s)", ids.len());
        Ok(cap_results(ids, context.max_results))
    }
}

/// Quoted numbers aimed at a numeric field are read in the statement's
/// culture. Text that is not a number (dates, booleans) is left for the
/// field to interpret.
fn numeric_parameter(value: Value, culture: &Culture) -> Value {
    if let Value::Text(text) = &value {
        if let Some(number) = culture.parse_number(text) {
            return Value::Number(number);
        }
    }
    value
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.attribute, self.operator.symbol())?;
        match self.operator.kind() {
            ConditionKind::Set => {
                f.write_str("(")?;
                write_list(f, &self.parameters)?;
                f.write_str(")")?;
            }
            ConditionKind::Binary => write_list(f, &self.parameters)?,
        }
        if let Some(similarity) = self.options.similarity {
            write!(f, " ~{similarity}")?;
        }
        if let Some(distance) = self.options.distance {
            write!(f, " :{distance}")?;
        }
        Ok(())
    }
}

/// `and` / `or`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("and"),
            LogicalOp::Or => f.write_str("or"),
        }
    }
}

/// A boolean combination of conditions.
#[derive(Debug, Clone)]
pub enum Filter {
    Condition(Condition),
    Binary {
        op: LogicalOp,
        left: Box<Filter>,
        right: Box<Filter>,
    },
}

impl Filter {
    /// Combine two filters.
    pub fn binary(op: LogicalOp, left: Filter, right: Filter) -> Self {
        Filter::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Ids of the records matching this filter.
    ///
    /// Both sides of a binary filter are always evaluated: `and` is the
    /// intersection and `or` the union of the two id sets.
    pub fn evaluate(&self, context: &EvalContext<'_>) -> Result<IdSet> {
        match self {
            Filter::Condition(condition) => condition.evaluate(context),
            Filter::Binary { op, left, right } => {
                let left = left.evaluate(context)?;
                let right = right.evaluate(context)?;
                Ok(match op {
                    LogicalOp::And => left.intersection(&right).copied().collect(),
                    LogicalOp::Or => left.union(&right).copied().collect(),
                })
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Condition(condition) => fmt::Display::fmt(condition, f),
            Filter::Binary { op, left, right } => {
                // `and` binds tighter and both associate to the left, so
                // only these operands need parentheses to parse back
                let left_parens = matches!(
                    (op, left.as_ref()),
                    (LogicalOp::And, Filter::Binary { op: LogicalOp::Or, .. })
                );
                let right_parens = match right.as_ref() {
                    Filter::Condition(_) => false,
                    Filter::Binary { op: inner, .. } => {
                        !(*op == LogicalOp::Or && *inner == LogicalOp::And)
                    }
                };
                write_operand(f, left, left_parens)?;
                write!(f, " {op} ")?;
                write_operand(f, right, right_parens)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, filter: &Filter, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({filter})")
    } else {
        fmt::Display::fmt(filter, f)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// One sort key of an order clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub attribute: Attribute,
    pub direction: Direction,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.attribute),
            Direction::Descending => write!(f, "{} desc", self.attribute),
        }
    }
}

/// `order by a [asc|desc], b [asc|desc], ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub keys: Vec<OrderBy>,
}

impl Order {
    /// Stable sort of `records`; the first key is the primary key and later
    /// keys break ties.
    pub fn sort<R: Record>(&self, records: Vec<R>, schema: &Schema<R>) -> Result<Vec<R>> {
        let descriptors = self
            .keys
            .iter()
            .map(|key| schema.require(&key.attribute.name))
            .collect::<Result<Vec<_>>>()?;

        let mut keyed: Vec<(Vec<FieldValue>, R)> = records
            .into_iter()
            .map(|record| {
                let values = descriptors.iter().map(|d| d.value(&record)).collect();
                (values, record)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            for ((x, y), key) in a.iter().zip(b).zip(&self.keys) {
                let ordering = match key.direction {
                    Direction::Ascending => x.sort_cmp(y),
                    Direction::Descending => y.sort_cmp(x),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("order by ")?;
        write_list(f, &self.keys)
    }
}

/// A single `skip n` or `take n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Skip(usize),
    Take(usize),
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Skip(n) => write!(f, "skip {n}"),
            Partition::Take(n) => write!(f, "take {n}"),
        }
    }
}

/// Ordered skip/take steps, applied one after another exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioning {
    pub steps: Vec<Partition>,
}

impl Partitioning {
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        self.steps.iter().fold(items, |mut items, step| match *step {
            Partition::Skip(n) => items.into_iter().skip(n).collect(),
            Partition::Take(n) => {
                items.truncate(n);
                items
            }
        })
    }
}

impl fmt::Display for Partitioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            fmt::Display::fmt(step, f)?;
        }
        Ok(())
    }
}
