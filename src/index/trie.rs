//! Character trie term index with positional postings.
//!
//! Every stored term is a path of characters from the root; the node where
//! a term ends holds the [`Postings`] of the records containing it. Nodes
//! live in an arena and refer to their children by index. Children are
//! kept sorted by character, which gives at most one child per character
//! and lets a depth-first walk visit terms in lexicographic order.
//!
//! ```
//! use tessera::analysis::token::tokens_from_words;
//! use tessera::index::trie::TermTrie;
//! use tessera::index::options::{RetrieveMethod, RetrieveOptions};
//! use uuid::Uuid;
//!
//! let a = Uuid::new_v4();
//! let mut trie = TermTrie::new();
//! trie.add(a, &tokens_from_words(["hello", "helena"]));
//!
//! let found = trie.retrieve(&["hel".to_string()], &RetrieveOptions::method(RetrieveMethod::Prefix));
//! assert!(found.contains(&a));
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use uuid::Uuid;

use crate::analysis::token::Token;
use crate::index::options::{RetrieveMethod, RetrieveOptions};
use crate::index::posting::Postings;
use crate::index::{IdSet, cap_results};

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct TrieNode {
    ch: char,
    children: Vec<(char, usize)>,
    postings: Option<Postings>,
}

impl TrieNode {
    fn new(ch: char) -> Self {
        TrieNode {
            ch,
            children: Vec::new(),
            postings: None,
        }
    }

    fn child(&self, ch: char) -> Option<usize> {
        self.children
            .binary_search_by(|(c, _)| c.cmp(&ch))
            .ok()
            .map(|slot| self.children[slot].1)
    }
}

/// Statistics about a term trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieStats {
    /// Number of nodes including the root.
    pub nodes: usize,
    /// Number of distinct terms with at least one posting.
    pub terms: usize,
    /// Total number of postings across all terms.
    pub postings: usize,
    /// Number of distinct records.
    pub records: usize,
}

/// A reverse index from terms to positional postings.
#[derive(Debug, Clone)]
pub struct TermTrie {
    nodes: Vec<TrieNode>,
    /// Number of postings held per record, used for `all()`.
    members: BTreeMap<Uuid, usize>,
}

impl Default for TermTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl TermTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        TermTrie {
            nodes: vec![TrieNode::new('\0')],
            members: BTreeMap::new(),
        }
    }

    /// Index the given tokens for record `id`.
    pub fn add(&mut self, id: Uuid, tokens: &[Token]) {
        for token in tokens {
            if token.text.is_empty() {
                continue;
            }
            let node = self.descend_or_create(&token.text);
            let postings = self.nodes[node].postings.get_or_insert_with(Postings::new);
            if postings.add(id, token.position) {
                *self.members.entry(id).or_insert(0) += 1;
            }
        }
    }

    /// Remove the postings of record `id` for the given tokens.
    ///
    /// Only the terminal node of each token is touched; postings for other
    /// terms sharing a prefix stay intact. Unknown terms are ignored.
    pub fn delete(&mut self, id: Uuid, tokens: &[Token]) {
        for token in tokens {
            let Some(node) = self.find(&token.text) else {
                continue;
            };
            let Some(postings) = self.nodes[node].postings.as_mut() else {
                continue;
            };
            if !postings.remove(&id) {
                continue;
            }
            if postings.is_empty() {
                self.nodes[node].postings = None;
            }
            if let Some(count) = self.members.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    self.members.remove(&id);
                }
            }
        }
    }

    /// Remove every term and posting.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[ROOT] = TrieNode::new('\0');
        self.members.clear();
    }

    /// All record ids that have at least one posting.
    pub fn all(&self) -> IdSet {
        self.members.keys().copied().collect()
    }

    /// Whether the trie holds any posting.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Postings stored for exactly `term`.
    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.find(term)
            .and_then(|node| self.nodes[node].postings.as_ref())
    }

    /// Retrieve the records matching `terms` (already analyzed, in query
    /// order) with the given options.
    pub fn retrieve(&self, terms: &[String], options: &RetrieveOptions) -> IdSet {
        if terms.is_empty() {
            return IdSet::new();
        }

        let result = match options.method {
            RetrieveMethod::Default => self.intersect_terms(terms, |term| self.exact(term)),
            RetrieveMethod::Phrase => self.positional(terms, 1),
            RetrieveMethod::Proximity => self.positional(terms, options.distance.max(1)),
            RetrieveMethod::Prefix => self.intersect_terms(terms, |term| self.prefixed(term)),
            RetrieveMethod::Fuzzy => {
                let max_edits = options.similarity.max(0.0).floor() as usize;
                self.intersect_terms(terms, |term| self.fuzzy(term, max_edits))
            }
            method => self.intersect_terms(terms, |term| self.compared(term, method)),
        };

        trace!(
            "trie retrieve {:?} with {:?}: {} match(es)",
            terms,
            options.method,
            result.len()
        );
        cap_results(result, options.max_results)
    }

    /// Distinct stored terms in lexicographic order.
    pub fn terms(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(ROOT, &mut String::new(), &mut |term, _| out.push(term.to_string()));
        out
    }

    /// Collect statistics about the trie.
    pub fn stats(&self) -> TrieStats {
        let mut terms = 0;
        let mut postings = 0;
        for node in &self.nodes {
            if let Some(p) = &node.postings {
                terms += 1;
                postings += p.len();
            }
        }
        TrieStats {
            nodes: self.nodes.len(),
            terms,
            postings,
            records: self.members.len(),
        }
    }

    fn descend_or_create(&mut self, term: &str) -> usize {
        let mut node = ROOT;
        for ch in term.chars() {
            node = match self.nodes[node].children.binary_search_by(|(c, _)| c.cmp(&ch)) {
                Ok(slot) => self.nodes[node].children[slot].1,
                Err(slot) => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::new(ch));
                    self.nodes[node].children.insert(slot, (ch, child));
                    child
                }
            };
        }
        node
    }

    fn find(&self, term: &str) -> Option<usize> {
        let mut node = ROOT;
        for ch in term.chars() {
            node = self.nodes[node].child(ch)?;
        }
        Some(node)
    }

    fn intersect_terms<F>(&self, terms: &[String], matcher: F) -> IdSet
    where
        F: Fn(&str) -> IdSet,
    {
        let mut iter = terms.iter();
        let Some(first) = iter.next() else {
            return IdSet::new();
        };
        let mut result = matcher(first);
        for term in iter {
            if result.is_empty() {
                break;
            }
            let next = matcher(term);
            result.retain(|id| next.contains(id));
        }
        result
    }

    fn exact(&self, term: &str) -> IdSet {
        let mut out = IdSet::new();
        if let Some(postings) = self.postings(term) {
            postings.collect_into(&mut out);
        }
        out
    }

    fn prefixed(&self, prefix: &str) -> IdSet {
        let mut out = IdSet::new();
        if let Some(node) = self.find(prefix) {
            self.collect_subtree(node, &mut out);
        }
        out
    }

    fn collect_subtree(&self, node: usize, out: &mut IdSet) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(postings) = &self.nodes[current].postings {
                postings.collect_into(out);
            }
            stack.extend(self.nodes[current].children.iter().map(|(_, child)| *child));
        }
    }

    fn fuzzy(&self, term: &str, max_edits: usize) -> IdSet {
        let query: Vec<char> = term.chars().collect();
        let first_row: Vec<usize> = (0..=query.len()).collect();
        let mut out = IdSet::new();
        self.fuzzy_walk(ROOT, &query, &first_row, max_edits, &mut out);
        out
    }

    /// Depth-first Levenshtein walk: each child extends the previous
    /// dynamic-programming row by one character.
    fn fuzzy_walk(
        &self,
        node: usize,
        query: &[char],
        prev_row: &[usize],
        max_edits: usize,
        out: &mut IdSet,
    ) {
        for &(ch, child) in &self.nodes[node].children {
            let mut row = Vec::with_capacity(prev_row.len());
            row.push(prev_row[0] + 1);
            for j in 1..prev_row.len() {
                let cost = if query[j - 1] == ch { 0 } else { 1 };
                let value = (row[j - 1] + 1)
                    .min(prev_row[j] + 1)
                    .min(prev_row[j - 1] + cost);
                row.push(value);
            }

            if row[query.len()] <= max_edits {
                if let Some(postings) = &self.nodes[child].postings {
                    postings.collect_into(out);
                }
            }
            if row.iter().copied().min().unwrap_or(usize::MAX) <= max_edits {
                self.fuzzy_walk(child, query, &row, max_edits, out);
            }
        }
    }

    fn compared(&self, term: &str, method: RetrieveMethod) -> IdSet {
        let mut out = IdSet::new();
        self.walk(ROOT, &mut String::new(), &mut |stored, postings| {
            let ordering = stored.cmp(term);
            let keep = match method {
                RetrieveMethod::GreaterThan => ordering == Ordering::Greater,
                RetrieveMethod::GreaterThanOrEqual => ordering != Ordering::Less,
                RetrieveMethod::LessThan => ordering == Ordering::Less,
                RetrieveMethod::LessThanOrEqual => ordering != Ordering::Greater,
                _ => ordering == Ordering::Equal,
            };
            if keep {
                postings.collect_into(&mut out);
            }
        });
        out
    }

    fn walk<F>(&self, node: usize, prefix: &mut String, visit: &mut F)
    where
        F: FnMut(&str, &Postings),
    {
        if let Some(postings) = &self.nodes[node].postings {
            visit(prefix, postings);
        }
        for &(ch, child) in &self.nodes[node].children {
            prefix.push(ch);
            self.walk(child, prefix, visit);
            prefix.pop();
        }
    }

    /// Records containing every term with term *k* positioned after term
    /// *k-1* by at most `max_gap` positions (exactly 1 for phrases).
    fn positional(&self, terms: &[String], max_gap: u32) -> IdSet {
        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings(term) {
                Some(postings) => lists.push(postings),
                None => return IdSet::new(),
            }
        }

        let mut candidates: IdSet = lists[0].ids().copied().collect();
        for postings in &lists[1..] {
            candidates.retain(|id| postings.contains(id));
        }

        candidates
            .into_iter()
            .filter(|id| {
                let positions: Vec<&BTreeSet<u32>> = lists
                    .iter()
                    .filter_map(|postings| postings.positions(id))
                    .collect();
                positions_chain(&positions, max_gap)
            })
            .collect()
    }
}

/// Whether there is a chain `p0 < p1 < … ` with `pk ∈ lists[k]` and
/// `pk - pk-1 <= max_gap`. With `max_gap == 1` this is exact adjacency.
pub(crate) fn positions_chain(lists: &[&BTreeSet<u32>], max_gap: u32) -> bool {
    fn extend(lists: &[&BTreeSet<u32>], previous: u32, max_gap: u32) -> bool {
        let Some((next, rest)) = lists.split_first() else {
            return true;
        };
        let upper = previous.saturating_add(max_gap);
        next.range(previous.saturating_add(1)..=upper)
            .any(|&position| extend(rest, position, max_gap))
    }

    let Some((first, rest)) = lists.split_first() else {
        return false;
    };
    first
        .iter()
        .any(|&position| extend(rest, position, max_gap))
}
