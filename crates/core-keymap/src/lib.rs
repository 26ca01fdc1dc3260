//! core-keymap: key-mapping resolution.
//!
//! Design principles:
//! - Pure and deterministic: resolution depends only on the table, the mode
//!   and the keys supplied.
//! - Mappings compiled into a trie per remap mode for cache locality.
//! - Ambiguity surfaced as `MappingResult::NeedsMoreInput` when the keys are a
//!   strict prefix of one or more mappings.
//! - No side effects: logging only at TRACE for traversal steps.
//!
//! The filter layers never interpret mappings themselves; they only ask
//! whether a key resolves to exactly one key (`try_resolve_single`).

use core_events::KeyEvent;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

/// Vim's default `maxmapdepth`.
pub const MAX_MAP_DEPTH: usize = 1000;

pub type KeySet = SmallVec<[KeyEvent; 2]>;

// -------------------------------------------------------------------------------------------------
// Resolution result
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingResult {
    /// The input maps to this key sequence (one or more keys).
    Mapped(KeySet),
    /// Strict prefix of at least one mapping; the engine buffers and waits.
    NeedsMoreInput,
    /// Expansion exceeded `MAX_MAP_DEPTH`.
    Recursive,
    NoMapping,
}

/// Anything that can answer mapping queries for the current mode. Implemented
/// by the modal engine.
pub trait MappingSource {
    /// Resolve `key` as the next input after whatever is currently buffered.
    fn key_input_mapping(&self, key: KeyEvent) -> MappingResult;
    /// Keys held from an earlier, still incomplete, multi-key mapping attempt.
    fn buffered_key_inputs(&self) -> &[KeyEvent];
}

/// Map `key` to exactly one resulting key, or fail when the outcome would be
/// anything other than a single key.
///
/// `NoMapping` is identity unless earlier input is buffered: in that case the
/// engine will replay at least two keys, not one.
pub fn try_resolve_single<S: MappingSource + ?Sized>(source: &S, key: KeyEvent) -> Option<KeyEvent> {
    let result = source.key_input_mapping(key);
    let single = match &result {
        MappingResult::Mapped(keys) => {
            debug_assert!(!keys.is_empty(), "Mapped result must carry at least one key");
            match keys.as_slice() {
                [only] => Some(*only),
                _ => None,
            }
        }
        MappingResult::NeedsMoreInput | MappingResult::Recursive => None,
        MappingResult::NoMapping => {
            if source.buffered_key_inputs().is_empty() {
                Some(key)
            } else {
                None
            }
        }
    };
    trace!(target: "input.map", key = %key, ?result, resolved = ?single.map(|k| k.to_string()), "try_resolve_single");
    single
}

// -------------------------------------------------------------------------------------------------
// Mapping table
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemapMode {
    Normal,
    Visual,
    Insert,
    Command,
}

impl RemapMode {
    const ALL: [RemapMode; 4] = [
        RemapMode::Normal,
        RemapMode::Visual,
        RemapMode::Insert,
        RemapMode::Command,
    ];

    fn index(self) -> usize {
        match self {
            RemapMode::Normal => 0,
            RemapMode::Visual => 1,
            RemapMode::Insert => 2,
            RemapMode::Command => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingSpec {
    pub lhs: Vec<KeyEvent>,
    pub rhs: Vec<KeyEvent>,
    /// `map` (true) versus `noremap` (false).
    pub remap: bool,
}

#[derive(Debug, Clone)]
struct Edge {
    key: KeyEvent,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node {
    terminal: Option<usize>, // index into mappings vec
    edges: SmallVec<[Edge; 4]>,
}

impl Node {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct MappingTrie {
    nodes: Vec<Node>,
    mappings: Vec<MappingSpec>,
}

enum Lookup {
    Terminal(usize),
    Prefix,
    Miss,
}

impl MappingTrie {
    fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            mappings: Vec::new(),
        }
    }

    fn insert(&mut self, spec: MappingSpec) {
        let mut cur = 0usize;
        for key in &spec.lhs {
            // find or create edge
            let next = if let Some(e) = self.nodes[cur].edges.iter().find(|e| e.key == *key) {
                e.next
            } else {
                let new_idx = self.nodes.len();
                self.nodes.push(Node::new());
                self.nodes[cur].edges.push(Edge {
                    key: *key,
                    next: new_idx,
                });
                new_idx
            };
            cur = next;
        }
        let idx = self.mappings.len();
        if self.nodes[cur].terminal.is_some() {
            // Later mapping overrides earlier.
            trace!(
                target: "input.map",
                mapping_index = idx,
                node = cur,
                "terminal_override"
            );
        }
        self.mappings.push(spec);
        self.nodes[cur].terminal = Some(idx);
    }

    fn remove(&mut self, lhs: &[KeyEvent]) -> bool {
        match self.walk(lhs) {
            Some(node) if self.nodes[node].terminal.is_some() => {
                // Mapping storage is append-only; unlinking the terminal is enough.
                self.nodes[node].terminal = None;
                true
            }
            _ => false,
        }
    }

    fn walk(&self, keys: &[KeyEvent]) -> Option<usize> {
        let mut node_idx = 0usize;
        for (i, key) in keys.iter().enumerate() {
            let edge = self.nodes[node_idx].edges.iter().find(|e| e.key == *key)?;
            node_idx = edge.next;
            trace!(target: "input.map", step = i, key = %key, node = node_idx, "advance");
        }
        Some(node_idx)
    }

    fn has_longer_candidates(&self, node: usize) -> bool {
        let mut stack = vec![node];
        let mut first = true;
        while let Some(n) = stack.pop() {
            if !first && self.nodes[n].terminal.is_some() {
                return true;
            }
            first = false;
            stack.extend(self.nodes[n].edges.iter().map(|e| e.next));
        }
        false
    }

    fn lookup(&self, keys: &[KeyEvent]) -> Lookup {
        match self.walk(keys) {
            None => Lookup::Miss,
            Some(node) => {
                if self.has_longer_candidates(node) {
                    Lookup::Prefix
                } else if let Some(mi) = self.nodes[node].terminal {
                    Lookup::Terminal(mi)
                } else {
                    // Dangling edges left behind by unmap.
                    Lookup::Miss
                }
            }
        }
    }
}

/// Key-mapping table with one trie per remap mode.
#[derive(Debug, Clone)]
pub struct KeyMap {
    tries: [MappingTrie; 4],
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            tries: std::array::from_fn(|_| MappingTrie::new()),
        }
    }

    /// Add or replace a mapping. Either side empty is ignored: an empty RHS
    /// would resolve to `Mapped` with no keys.
    pub fn map(&mut self, mode: RemapMode, lhs: Vec<KeyEvent>, rhs: Vec<KeyEvent>, remap: bool) {
        if lhs.is_empty() || rhs.is_empty() {
            warn!(
                target: "input.map",
                ?mode,
                lhs = lhs.len(),
                rhs = rhs.len(),
                "empty_side_ignored"
            );
            return;
        }
        debug!(target: "input.map", ?mode, lhs = lhs.len(), rhs = rhs.len(), remap, "map");
        self.tries[mode.index()].insert(MappingSpec { lhs, rhs, remap });
    }

    pub fn unmap(&mut self, mode: RemapMode, lhs: &[KeyEvent]) -> bool {
        self.tries[mode.index()].remove(lhs)
    }

    pub fn clear(&mut self) {
        for mode in RemapMode::ALL {
            self.tries[mode.index()] = MappingTrie::new();
        }
    }

    /// Resolve an input sequence (buffered keys plus the newest key).
    pub fn resolve(&self, mode: RemapMode, keys: &[KeyEvent]) -> MappingResult {
        if keys.is_empty() {
            return MappingResult::NoMapping;
        }
        self.resolve_at_depth(mode, keys, 0)
    }

    fn resolve_at_depth(&self, mode: RemapMode, keys: &[KeyEvent], depth: usize) -> MappingResult {
        if depth >= MAX_MAP_DEPTH {
            debug!(target: "input.map", ?mode, depth, "recursive_mapping");
            return MappingResult::Recursive;
        }
        let trie = &self.tries[mode.index()];
        let mi = match trie.lookup(keys) {
            Lookup::Miss => return MappingResult::NoMapping,
            Lookup::Prefix => return MappingResult::NeedsMoreInput,
            Lookup::Terminal(mi) => mi,
        };
        let spec = &trie.mappings[mi];
        if !spec.remap || spec.rhs.is_empty() {
            return MappingResult::Mapped(spec.rhs.iter().copied().collect());
        }
        // An RHS that begins with its own LHS expands that prefix literally.
        let (literal, rest): (&[KeyEvent], &[KeyEvent]) = if spec.rhs.starts_with(&spec.lhs) {
            spec.rhs.split_at(spec.lhs.len())
        } else {
            (&[], &spec.rhs[..])
        };
        let mut out: KeySet = literal.iter().copied().collect();
        let mut remaining = rest;
        while !remaining.is_empty() {
            match self.expand_prefix(mode, remaining, depth + 1) {
                Ok((consumed, keys)) => {
                    out.extend(keys);
                    remaining = &remaining[consumed..];
                }
                Err(recursive) => return recursive,
            }
        }
        MappingResult::Mapped(out)
    }

    /// Expand the longest mapped prefix of `keys`, or pass the first key
    /// through. Returns the number of input keys consumed.
    fn expand_prefix(
        &self,
        mode: RemapMode,
        keys: &[KeyEvent],
        depth: usize,
    ) -> Result<(usize, KeySet), MappingResult> {
        for len in (1..=keys.len()).rev() {
            let trie = &self.tries[mode.index()];
            if let Some(node) = trie.walk(&keys[..len])
                && trie.nodes[node].terminal.is_some()
            {
                return match self.resolve_at_depth(mode, &keys[..len], depth) {
                    MappingResult::Mapped(out) => Ok((len, out)),
                    MappingResult::Recursive => Err(MappingResult::Recursive),
                    // Inside an RHS there is no more input to wait for.
                    MappingResult::NeedsMoreInput | MappingResult::NoMapping => {
                        Ok((len, keys[..len].iter().copied().collect()))
                    }
                };
            }
        }
        let mut single = KeySet::new();
        single.push(keys[0]);
        Ok((1, single))
    }
}
