//! Recursive descent parser turning WQL text into a [`Statement`].
//!
//! ```text
//! WQL          ::= Filter? Order? Partitioning?
//! Filter       ::= "(" Filter ")" | Filter ("and" | "or") Filter | Condition
//! Condition    ::= Attribute BinaryOp Parameter Options
//!                | Attribute SetOp "(" Parameter ("," Parameter)* ")"
//! Parameter    ::= Function | Number | '"' String '"' | "'" String "'" | String
//! Function     ::= Name "(" (Parameter ("," Parameter)*)? ")"
//! Options      ::= ("~" Number)? (":" Number)?
//! Order        ::= ("order" "by" | "orderby") Attribute Direction? ("," Attribute Direction?)*
//! Partitioning ::= (("take" | "skip") Number)*
//! ```
//!
//! `and` binds tighter than `or`, both associate to the left, and every
//! keyword is case-insensitive. Nesting is bounded so that evaluating,
//! printing and dropping a parsed tree cannot exhaust the stack.

use log::debug;

use crate::culture::Culture;
use crate::schema::Schema;
use crate::wql::ast::{
    Attribute, Condition, Direction, Filter, FunctionCall, LogicalOp, Order, OrderBy, Parameter,
    Partition, Partitioning, Value,
};
use crate::wql::condition::{ConditionKind, ConditionOptions};
use crate::wql::error::{ErrorKind, WqlError};
use crate::wql::lexer::{QueryToken, TokenKind, tokenize};
use crate::wql::registry::Registry;
use crate::wql::statement::Statement;

type ParseResult<T> = std::result::Result<T, WqlError>;

/// Deepest nesting of parentheses and function calls.
pub const MAX_NESTING: usize = 128;

/// Deepest filter tree, counting every `and`/`or` between a condition and
/// the root.
pub const MAX_FILTER_DEPTH: usize = 512;

/// Parses WQL against a schema and a registry of operators and functions.
#[derive(Debug)]
pub struct WqlParser<'a, R> {
    registry: &'a Registry,
    schema: &'a Schema<R>,
    culture: Culture,
}

impl<'a, R> WqlParser<'a, R> {
    /// Create a parser using the invariant culture.
    pub fn new(registry: &'a Registry, schema: &'a Schema<R>) -> Self {
        WqlParser {
            registry,
            schema,
            culture: Culture::invariant(),
        }
    }

    /// Read numeric literals according to `culture`.
    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    /// Parse `input`. Errors are recorded on the returned statement.
    pub fn parse(&self, input: &str) -> Statement {
        let tokens = match tokenize(input) {
            Ok(tokens) => tokens,
            Err(error) => {
                debug!("failed to tokenize '{input}': {error}");
                return Statement::failed(input, self.culture.clone(), error);
            }
        };

        let mut parser = StatementParser {
            registry: self.registry,
            schema: self.schema,
            culture: &self.culture,
            tokens: tokens.into(),
            pos: 0,
            end: input.chars().count(),
            nesting: 0,
        };

        match parser.parse_statement() {
            Ok((filter, order, partitioning)) => {
                Statement::parsed(input, self.culture.clone(), filter, order, partitioning)
            }
            Err(error) => {
                debug!("failed to parse '{input}': {error}");
                Statement::failed(input, self.culture.clone(), error)
            }
        }
    }
}

/// Depth of a binary filter over two subtrees, bounded by
/// [`MAX_FILTER_DEPTH`].
fn combined_depth(operator: &QueryToken, left: usize, right: usize) -> ParseResult<usize> {
    let depth = left.max(right) + 1;
    if depth > MAX_FILTER_DEPTH {
        Err(operator.error(ErrorKind::NestingTooDeep))
    } else {
        Ok(depth)
    }
}

/// The error that got further into the input; the first one on a tie.
fn furthest(first: WqlError, second: WqlError) -> WqlError {
    if second.offset > first.offset {
        second
    } else {
        first
    }
}

struct StatementParser<'a, R> {
    registry: &'a Registry,
    schema: &'a Schema<R>,
    culture: &'a Culture,
    tokens: Vec<QueryToken>,
    pos: usize,
    end: usize,
    nesting: usize,
}

impl<R> StatementParser<'_, R> {
    fn parse_statement(
        &mut self,
    ) -> ParseResult<(Option<Filter>, Option<Order>, Option<Partitioning>)> {
        let filter = if self.at_end() || self.at_order() || self.at_partitioning() {
            None
        } else {
            Some(self.parse_or_expression()?.0)
        };
        let order = if self.at_order() {
            Some(self.parse_order()?)
        } else {
            None
        };
        let partitioning = if self.at_partitioning() {
            Some(self.parse_partitioning()?)
        } else {
            None
        };

        match self.peek() {
            Some(token) => Err(token.error(ErrorKind::UnexpectedToken)),
            None => Ok((filter, order, partitioning)),
        }
    }

    // Filters travel with the depth of their tree; a condition has depth 0.

    fn parse_or_expression(&mut self) -> ParseResult<(Filter, usize)> {
        let (mut left, mut depth) = self.parse_and_expression()?;
        while self.peek_is("or") {
            let operator = self.next_token("'or'")?;
            let (right, right_depth) = self.parse_and_expression()?;
            depth = combined_depth(&operator, depth, right_depth)?;
            left = Filter::binary(LogicalOp::Or, left, right);
        }
        Ok((left, depth))
    }

    fn parse_and_expression(&mut self) -> ParseResult<(Filter, usize)> {
        let (mut left, mut depth) = self.parse_primary()?;
        while self.peek_is("and") {
            let operator = self.next_token("'and'")?;
            let (right, right_depth) = self.parse_primary()?;
            depth = combined_depth(&operator, depth, right_depth)?;
            left = Filter::binary(LogicalOp::And, left, right);
        }
        Ok((left, depth))
    }

    /// A parenthesized filter is tried first; if that fails the position is
    /// rewound and a condition is parsed instead.
    fn parse_primary(&mut self) -> ParseResult<(Filter, usize)> {
        if self.peek_kind() != Some(TokenKind::OpenParen) {
            return self.parse_condition().map(|c| (Filter::Condition(c), 0));
        }

        let start = self.pos;
        match self.parse_parenthesized() {
            Ok(filter) => Ok(filter),
            Err(paren_error) => {
                self.pos = start;
                self.parse_condition()
                    .map(|c| (Filter::Condition(c), 0))
                    .map_err(|condition_error| furthest(paren_error, condition_error))
            }
        }
    }

    fn parse_parenthesized(&mut self) -> ParseResult<(Filter, usize)> {
        let open = self.expect(TokenKind::OpenParen, "'('")?;
        let filter = self.nested(&open, |parser| parser.parse_or_expression())?;
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok(filter)
    }

    /// Run `parse` one nesting level deeper, refusing to go past
    /// [`MAX_NESTING`] at the `open` token.
    fn nested<T>(
        &mut self,
        open: &QueryToken,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(open.error(ErrorKind::NestingTooDeep));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn parse_condition(&mut self) -> ParseResult<Condition> {
        let attribute = self.expect(TokenKind::Word, "attribute")?;
        let descriptor = self
            .schema
            .field(&attribute.text)
            .ok_or_else(|| attribute.error(ErrorKind::UnknownAttribute))?;
        if !descriptor.is_indexed() {
            return Err(attribute.error(ErrorKind::AttributeNotIndexed));
        }

        let (operator, consumed) = self
            .registry
            .match_condition(&self.tokens[self.pos..])
            .ok_or_else(|| self.error_here(ErrorKind::UnknownCondition))?;
        self.pos += consumed;

        let (parameters, options) = match operator.kind() {
            ConditionKind::Binary => {
                let parameter = self.parse_parameter()?;
                (vec![parameter], self.parse_options()?)
            }
            ConditionKind::Set => {
                self.expect(TokenKind::OpenParen, "'('")?;
                let parameters = self.parse_parameter_list()?;
                self.expect(TokenKind::CloseParen, "')'")?;
                (parameters, ConditionOptions::default())
            }
        };

        Ok(Condition {
            attribute: Attribute::new(attribute.text),
            operator,
            parameters,
            options,
        })
    }

    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut parameters = vec![self.parse_parameter()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.pos += 1;
            parameters.push(self.parse_parameter()?);
        }
        Ok(parameters)
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let token = self.next_token("parameter")?;
        match token.kind {
            TokenKind::Quote => {
                let content = self.expect(TokenKind::Quoted, "quoted text")?;
                self.expect(TokenKind::Quote, "closing quote")?;
                Ok(Parameter::Value(Value::Text(content.text)))
            }
            TokenKind::Word if self.peek_kind() == Some(TokenKind::OpenParen) => {
                self.parse_function(token).map(Parameter::Function)
            }
            TokenKind::Word => Ok(Parameter::Value(
                match self.culture.parse_number(&token.text) {
                    Some(number) => Value::Number(number),
                    None => Value::Text(token.text),
                },
            )),
            _ => Err(token.error(ErrorKind::UnexpectedToken)),
        }
    }

    fn parse_function(&mut self, name: QueryToken) -> ParseResult<FunctionCall> {
        let function = self
            .registry
            .function(&name.text)
            .cloned()
            .ok_or_else(|| name.error(ErrorKind::UnknownFunction))?;

        let open = self.expect(TokenKind::OpenParen, "'('")?;
        let arguments = if self.peek_kind() == Some(TokenKind::CloseParen) {
            Vec::new()
        } else {
            self.nested(&open, |parser| parser.parse_parameter_list())?
        };
        self.expect(TokenKind::CloseParen, "')'")?;

        if !function.arity().contains(&arguments.len()) {
            return Err(name.error(ErrorKind::WrongArgumentCount));
        }
        Ok(FunctionCall {
            function,
            arguments,
        })
    }

    fn parse_options(&mut self) -> ParseResult<ConditionOptions> {
        let mut options = ConditionOptions::default();

        if self.peek_kind() == Some(TokenKind::Operator) && self.peek_is("~") {
            self.pos += 1;
            let token = self.next_token("similarity")?;
            let similarity = self
                .culture
                .parse_number(&token.text)
                .filter(|similarity| *similarity >= 0.0)
                .ok_or_else(|| token.error(ErrorKind::InvalidNumber))?;
            options.similarity = Some(similarity);
        }

        // `:2` arrives as one word, `: 2` as two
        if let Some(marker) = self.peek().filter(|t| {
            t.kind == TokenKind::Word && t.text.starts_with(':')
        }) {
            let marker = marker.clone();
            self.pos += 1;
            let token = if marker.text == ":" {
                self.next_token("distance")?
            } else {
                marker
            };
            let digits = token.text.trim_start_matches(':');
            let distance = digits
                .parse::<u32>()
                .map_err(|_| token.error(ErrorKind::InvalidNumber))?;
            options.distance = Some(distance);
        }

        Ok(options)
    }

    fn parse_order(&mut self) -> ParseResult<Order> {
        // either `orderby` or `order by`
        if self.peek_is("orderby") {
            self.pos += 1;
        } else {
            self.pos += 2;
        }

        let mut keys = Vec::new();
        loop {
            let attribute = self.expect(TokenKind::Word, "attribute")?;
            if self.schema.field(&attribute.text).is_none() {
                return Err(attribute.error(ErrorKind::UnknownAttribute));
            }

            let direction = if self.peek_is("asc") || self.peek_is("ascending") {
                self.pos += 1;
                Direction::Ascending
            } else if self.peek_is("desc") || self.peek_is("descending") {
                self.pos += 1;
                Direction::Descending
            } else {
                Direction::Ascending
            };

            keys.push(OrderBy {
                attribute: Attribute::new(attribute.text),
                direction,
            });

            if self.peek_kind() == Some(TokenKind::Comma) {
                self.pos += 1;
            } else {
                break;
            }
        }

        Ok(Order { keys })
    }

    fn parse_partitioning(&mut self) -> ParseResult<Partitioning> {
        let mut steps = Vec::new();
        while self.at_partitioning() {
            let keyword = self.next_token("'take' or 'skip'")?;
            let count = self.next_token("number")?;
            let n = count
                .text
                .parse::<usize>()
                .map_err(|_| count.error(ErrorKind::InvalidNumber))?;
            steps.push(if keyword.is("take") {
                Partition::Take(n)
            } else {
                Partition::Skip(n)
            });
        }
        Ok(Partitioning { steps })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_order(&self) -> bool {
        let next_is_word = self.peek_kind_at(1) == Some(TokenKind::Word);
        (self.peek_is("orderby") && next_is_word)
            || (self.peek_is("order") && self.peek_at(1).is_some_and(|t| t.is("by")))
    }

    fn at_partitioning(&self) -> bool {
        (self.peek_is("take") || self.peek_is("skip"))
            && self.peek_kind_at(1) == Some(TokenKind::Word)
    }

    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&QueryToken> {
        self.tokens.get(self.pos + ahead)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<TokenKind> {
        self.peek_at(ahead).map(|t| t.kind)
    }

    fn peek_is(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is(keyword))
    }

    fn end_error(&self, expected: &str) -> WqlError {
        WqlError::new(ErrorKind::Expected(expected.to_string()), self.end, 0, "")
    }

    fn error_here(&self, kind: ErrorKind) -> WqlError {
        match self.peek() {
            Some(token) => token.error(kind),
            None => WqlError::new(ErrorKind::UnexpectedEnd, self.end, 0, ""),
        }
    }

    fn next_token(&mut self, expected: &str) -> ParseResult<QueryToken> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.end_error(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<QueryToken> {
        let token = self.next_token(expected)?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(token.error(ErrorKind::Expected(expected.to_string())))
        }
    }
}
