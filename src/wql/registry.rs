//! Registry of condition operators and functions known to the parser.

use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use crate::error::{Result, TesseraError};
use crate::wql::condition::{
    Comparison, ConditionOperator, Equal, In, Like, NotEqual, NotIn,
};
use crate::wql::function::{Day, Lower, Now, Today, Upper, WqlFunction};
use crate::wql::lexer::{QueryToken, TokenKind};

/// One spelling of a registered operator, split into words.
#[derive(Debug, Clone)]
struct Spelling {
    words: Vec<String>,
    operator: Arc<dyn ConditionOperator>,
}

impl Spelling {
    fn text_len(&self) -> usize {
        self.words.iter().map(String::len).sum()
    }

    fn matches(&self, tokens: &[QueryToken]) -> bool {
        tokens.len() >= self.words.len()
            && self
                .words
                .iter()
                .zip(tokens)
                .all(|(word, token)| {
                    matches!(token.kind, TokenKind::Word | TokenKind::Operator)
                        && token.text.to_lowercase() == *word
                })
    }
}

fn normalize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Maps operator spellings and function names to their implementations.
///
/// # Examples
///
/// ```
/// use tessera::wql::Registry;
/// use tessera::wql::condition::Equal;
///
/// let mut registry = Registry::with_builtins();
/// assert!(registry.register_condition_type::<Equal>().is_err());
/// assert!(registry.remove_condition("=").is_some());
/// assert!(registry.register_condition_type::<Equal>().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    spellings: Vec<Spelling>,
    functions: AHashMap<String, Arc<dyn WqlFunction>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in condition and function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let conditions: [Arc<dyn ConditionOperator>; 9] = [
            Arc::new(Equal),
            Arc::new(NotEqual),
            Arc::new(Like),
            Arc::new(Comparison::greater_than()),
            Arc::new(Comparison::greater_than_or_equal()),
            Arc::new(Comparison::less_than()),
            Arc::new(Comparison::less_than_or_equal()),
            Arc::new(In),
            Arc::new(NotIn),
        ];
        let functions: [Arc<dyn WqlFunction>; 5] = [
            Arc::new(Now),
            Arc::new(Today),
            Arc::new(Day),
            Arc::new(Lower),
            Arc::new(Upper),
        ];

        // The built-in spellings and names are distinct, so registration
        // into the empty registry cannot collide.
        for condition in conditions {
            registry.insert_condition(condition);
        }
        for function in functions {
            registry
                .functions
                .insert(function.name().to_lowercase(), function);
        }
        registry
    }

    /// Register a condition operator under all of its spellings.
    ///
    /// Fails with [`TesseraError::DuplicateRegistration`] if any spelling
    /// is already taken; the registry is left unchanged in that case.
    pub fn register_condition(&mut self, operator: Arc<dyn ConditionOperator>) -> Result<()> {
        for text in operator.operators() {
            let words = normalize(text);
            if words.is_empty() {
                return Err(TesseraError::invalid_argument(
                    "condition operator spelling cannot be empty",
                ));
            }
            if self.spellings.iter().any(|s| s.words == words) {
                return Err(TesseraError::duplicate(format!("condition operator '{text}'")));
            }
        }
        self.insert_condition(operator);
        Ok(())
    }

    /// Register a condition operator type.
    pub fn register_condition_type<T>(&mut self) -> Result<()>
    where
        T: ConditionOperator + Default + 'static,
    {
        self.register_condition(Arc::new(T::default()))
    }

    fn insert_condition(&mut self, operator: Arc<dyn ConditionOperator>) {
        debug!("registering condition operator {:?}", operator.operators());
        for text in operator.operators() {
            self.spellings.push(Spelling {
                words: normalize(text),
                operator: Arc::clone(&operator),
            });
        }
    }

    /// Remove the operator registered under `text`, including its other
    /// spellings.
    pub fn remove_condition(&mut self, text: &str) -> Option<Arc<dyn ConditionOperator>> {
        let words = normalize(text);
        let operator = self
            .spellings
            .iter()
            .find(|s| s.words == words)
            .map(|s| Arc::clone(&s.operator))?;
        self.spellings
            .retain(|s| !Arc::ptr_eq(&s.operator, &operator));
        Some(operator)
    }

    /// Register a function.
    ///
    /// Fails with [`TesseraError::DuplicateRegistration`] if the name is
    /// already taken.
    pub fn register_function(&mut self, function: Arc<dyn WqlFunction>) -> Result<()> {
        let name = function.name().to_lowercase();
        if name.is_empty() {
            return Err(TesseraError::invalid_argument("function name cannot be empty"));
        }
        if self.functions.contains_key(&name) {
            return Err(TesseraError::duplicate(format!("function '{name}'")));
        }
        debug!("registering function '{name}'");
        self.functions.insert(name, function);
        Ok(())
    }

    /// Register a function type.
    pub fn register_function_type<T>(&mut self) -> Result<()>
    where
        T: WqlFunction + Default + 'static,
    {
        self.register_function(Arc::new(T::default()))
    }

    /// Remove a function by name.
    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn WqlFunction>> {
        self.functions.remove(&name.to_lowercase())
    }

    /// Find the function called `name`.
    pub fn function(&self, name: &str) -> Option<&Arc<dyn WqlFunction>> {
        self.functions.get(&name.to_lowercase())
    }

    /// Find the operator starting at `tokens[0]`.
    ///
    /// The longest matching spelling wins, measured in words and then in
    /// characters, so `not in` beats `in` and `>=` beats `>`. Returns the
    /// operator and the number of tokens it spans.
    pub fn match_condition(
        &self,
        tokens: &[QueryToken],
    ) -> Option<(Arc<dyn ConditionOperator>, usize)> {
        self.spellings
            .iter()
            .filter(|spelling| spelling.matches(tokens))
            .max_by_key(|spelling| (spelling.words.len(), spelling.text_len()))
            .map(|spelling| (Arc::clone(&spelling.operator), spelling.words.len()))
    }

    /// Every registered function name.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
