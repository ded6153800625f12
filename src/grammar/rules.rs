use crate::error::{GpError, Result};
use crate::functions::symbol::{Symbol, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Child legality applied to a parent that has no explicit child rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChildFallback {
    /// Every grammar symbol except the parent itself
    #[default]
    AllExceptParent,
    /// Every grammar symbol, self-recursion included
    AllSymbols,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarEvent {
    SymbolAdded(String),
    SymbolRemoved(String),
    SymbolUpdated(String),
    RulesChanged,
}

type Listener = Arc<dyn Fn(&GrammarEvent) + Send + Sync>;

/// Vocabulary plus the rules deciding which symbol may appear where.
#[derive(Clone)]
pub struct Grammar {
    symbols: Vec<Arc<Symbol>>,
    start_symbols: BTreeSet<String>,
    // parent name -> legal child names, indexed by child position
    allowed_children: HashMap<String, Vec<BTreeSet<String>>>,
    fallback: ChildFallback,
    min_length: usize,
    max_length: usize,
    min_depth: usize,
    max_depth: usize,
    revision: u64,
    listeners: Vec<Listener>,
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            start_symbols: BTreeSet::new(),
            allowed_children: HashMap::new(),
            fallback: ChildFallback::default(),
            min_length: 1,
            max_length: 50,
            min_depth: 1,
            max_depth: 10,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    /// Grammar where every symbol is a start symbol and children follow the fallback policy.
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Result<Self> {
        let mut grammar = Self::new();
        for symbol in symbols {
            let name = symbol.name().to_string();
            grammar.add_symbol(symbol)?;
            grammar.add_start_symbol(&name)?;
        }
        Ok(grammar)
    }

    // --- Symbols ---

    pub fn add_symbol(&mut self, symbol: Symbol) -> Result<Arc<Symbol>> {
        if self.get_symbol(symbol.name()).is_some() {
            return Err(GpError::InvalidGrammar(format!(
                "symbol {} already exists",
                symbol.name()
            )));
        }
        let symbol = Arc::new(symbol);
        self.symbols.push(Arc::clone(&symbol));
        self.notify(GrammarEvent::SymbolAdded(symbol.name().to_string()));
        Ok(symbol)
    }

    /// Remove a symbol and every start-symbol entry and child rule that mentions it.
    pub fn remove_symbol(&mut self, name: &str) -> Option<Arc<Symbol>> {
        let index = self.symbols.iter().position(|s| s.name() == name)?;
        let removed = self.symbols.remove(index);

        self.start_symbols.remove(name);
        self.allowed_children.remove(name);
        for positions in self.allowed_children.values_mut() {
            for allowed in positions.iter_mut() {
                allowed.remove(name);
            }
        }

        self.notify(GrammarEvent::SymbolRemoved(name.to_string()));
        Some(removed)
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Arc<Symbol>> {
        self.symbols.iter().find(|s| s.name() == name)
    }

    pub fn symbols(&self) -> &[Arc<Symbol>] {
        &self.symbols
    }

    pub fn enabled_symbols(&self) -> impl Iterator<Item = &Arc<Symbol>> {
        self.symbols.iter().filter(|s| s.enabled())
    }

    pub fn terminal_symbols(&self) -> impl Iterator<Item = &Arc<Symbol>> {
        self.symbols.iter().filter(|s| s.is_terminal())
    }

    pub fn function_symbols(&self) -> impl Iterator<Item = &Arc<Symbol>> {
        self.symbols.iter().filter(|s| !s.is_terminal())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.update_symbol(name, |s| s.set_enabled(enabled))
    }

    pub fn set_frequency(&mut self, name: &str, frequency: f64) -> Result<()> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(GpError::InvalidGrammar(format!(
                "frequency of {} must be finite and non-negative, got {}",
                name, frequency
            )));
        }
        self.update_symbol(name, |s| s.set_frequency(frequency))
    }

    // Trees built earlier keep the previous Arc, the grammar gets a fresh copy
    fn update_symbol(&mut self, name: &str, edit: impl FnOnce(&mut Symbol)) -> Result<()> {
        let slot = self
            .symbols
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| GpError::InvalidGrammar(format!("unknown symbol {}", name)))?;
        edit(Arc::make_mut(slot));
        self.notify(GrammarEvent::SymbolUpdated(name.to_string()));
        Ok(())
    }

    /// Union of the names offered by all enabled variable symbols, in first-seen order
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for symbol in self.enabled_symbols() {
            if let SymbolKind::Variable { variable_names } = symbol.kind() {
                for name in variable_names {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    // --- Start symbols ---

    pub fn add_start_symbol(&mut self, name: &str) -> Result<()> {
        self.require_symbol(name)?;
        self.start_symbols.insert(name.to_string());
        self.notify(GrammarEvent::RulesChanged);
        Ok(())
    }

    pub fn remove_start_symbol(&mut self, name: &str) -> bool {
        let removed = self.start_symbols.remove(name);
        if removed {
            self.notify(GrammarEvent::RulesChanged);
        }
        removed
    }

    /// Start symbols in grammar order
    pub fn start_symbols(&self) -> Vec<Arc<Symbol>> {
        self.symbols
            .iter()
            .filter(|s| self.start_symbols.contains(s.name()))
            .cloned()
            .collect()
    }

    pub fn is_start_symbol(&self, symbol: &Symbol) -> bool {
        self.start_symbols.contains(symbol.name())
    }

    // --- Child rules ---

    /// Allow `child` below `parent` at every child position of `parent`.
    pub fn add_allowed_child_symbol(&mut self, parent: &str, child: &str) -> Result<()> {
        let arity = self.require_symbol(parent)?.max_arity();
        for position in 0..arity {
            self.insert_child_rule(parent, child, position)?;
        }
        self.notify(GrammarEvent::RulesChanged);
        Ok(())
    }

    pub fn add_allowed_child_symbol_at(
        &mut self,
        parent: &str,
        child: &str,
        position: usize,
    ) -> Result<()> {
        self.insert_child_rule(parent, child, position)?;
        self.notify(GrammarEvent::RulesChanged);
        Ok(())
    }

    /// Remove a child rule at one position, or at all positions when `position` is `None`.
    pub fn remove_allowed_child_symbol(
        &mut self,
        parent: &str,
        child: &str,
        position: Option<usize>,
    ) -> bool {
        let Some(positions) = self.allowed_children.get_mut(parent) else {
            return false;
        };
        let removed = match position {
            Some(p) => positions.get_mut(p).map_or(false, |set| set.remove(child)),
            None => positions
                .iter_mut()
                .fold(false, |acc, set| set.remove(child) || acc),
        };
        if removed {
            self.notify(GrammarEvent::RulesChanged);
        }
        removed
    }

    fn insert_child_rule(&mut self, parent: &str, child: &str, position: usize) -> Result<()> {
        let arity = self.require_symbol(parent)?.max_arity();
        self.require_symbol(child)?;
        if position >= arity {
            return Err(GpError::InvalidGrammar(format!(
                "{} has no child position {} (maximum arity {})",
                parent, position, arity
            )));
        }
        let positions = self
            .allowed_children
            .entry(parent.to_string())
            .or_insert_with(|| vec![BTreeSet::new(); arity]);
        positions[position].insert(child.to_string());
        Ok(())
    }

    pub fn has_child_rules(&self, parent: &str) -> bool {
        self.allowed_children.contains_key(parent)
    }

    pub fn set_child_fallback(&mut self, fallback: ChildFallback) {
        self.fallback = fallback;
        self.notify(GrammarEvent::RulesChanged);
    }

    pub fn child_fallback(&self) -> ChildFallback {
        self.fallback
    }

    /// Symbols legal at child slot `position` of `parent`, in grammar order.
    pub fn allowed_child_symbols(&self, parent: &Symbol, position: usize) -> Vec<Arc<Symbol>> {
        if position >= parent.max_arity() {
            return Vec::new();
        }
        self.symbols
            .iter()
            .filter(|child| self.is_allowed_child_symbol(parent, child, position))
            .cloned()
            .collect()
    }

    /// The single legality check every tree edit must pass.
    pub fn is_allowed_child_symbol(&self, parent: &Symbol, child: &Symbol, position: usize) -> bool {
        if position >= parent.max_arity() || self.get_symbol(child.name()).is_none() {
            return false;
        }
        match self.allowed_children.get(parent.name()) {
            Some(positions) => positions
                .get(position)
                .map_or(false, |set| set.contains(child.name())),
            None => match self.fallback {
                ChildFallback::AllExceptParent => parent.name() != child.name(),
                ChildFallback::AllSymbols => true,
            },
        }
    }

    /// Legal symbols for a slot: start symbols for the root, child rules otherwise.
    pub fn candidates_for(&self, slot: Option<(&Symbol, usize)>) -> Vec<Arc<Symbol>> {
        match slot {
            None => self.start_symbols(),
            Some((parent, position)) => self.allowed_child_symbols(parent, position),
        }
    }

    pub fn is_allowed_at(&self, slot: Option<(&Symbol, usize)>, symbol: &Symbol) -> bool {
        match slot {
            None => self.is_start_symbol(symbol),
            Some((parent, position)) => self.is_allowed_child_symbol(parent, symbol, position),
        }
    }

    // --- Bounds ---

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_length_bounds(&mut self, min_length: usize, max_length: usize) {
        self.min_length = min_length;
        self.max_length = max_length;
    }

    pub fn set_depth_bounds(&mut self, min_depth: usize, max_depth: usize) {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
    }

    // --- Notifications ---

    /// Called for every later change to symbols or rules.
    pub fn subscribe(&mut self, listener: impl Fn(&GrammarEvent) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Incremented on every change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn notify(&mut self, event: GrammarEvent) {
        self.revision += 1;
        log::trace!("grammar revision {}: {:?}", self.revision, event);
        for listener in &self.listeners {
            listener(&event);
        }
    }

    fn require_symbol(&self, name: &str) -> Result<&Arc<Symbol>> {
        self.get_symbol(name)
            .ok_or_else(|| GpError::InvalidGrammar(format!("unknown symbol {}", name)))
    }

    /// Reject grammars that cannot produce a tree.
    pub fn validate(&self) -> Result<()> {
        if self.start_symbols.is_empty() {
            return Err(GpError::InvalidGrammar("grammar has no start symbols".to_string()));
        }
        if self.terminal_symbols().next().is_none() {
            return Err(GpError::InvalidGrammar("grammar has no terminal symbols".to_string()));
        }
        if self.min_length > self.max_length {
            return Err(GpError::InvalidGrammar(format!(
                "minimum length {} exceeds maximum length {}",
                self.min_length, self.max_length
            )));
        }
        if self.min_depth > self.max_depth {
            return Err(GpError::InvalidGrammar(format!(
                "minimum depth {} exceeds maximum depth {}",
                self.min_depth, self.max_depth
            )));
        }
        for symbol in self.function_symbols() {
            for position in 0..symbol.min_arity().max(1) {
                if self.allowed_child_symbols(symbol, position).is_empty() {
                    return Err(GpError::InvalidGrammar(format!(
                        "function symbol {} has no allowed children at position {}",
                        symbol.name(),
                        position
                    )));
                }
            }
        }
        for symbol in self.terminal_symbols() {
            match symbol.kind() {
                SymbolKind::Variable { variable_names } if variable_names.is_empty() => {
                    return Err(GpError::InvalidGrammar(format!(
                        "variable symbol {} has no variable names",
                        symbol.name()
                    )));
                }
                SymbolKind::Constant { min_value, max_value } if min_value > max_value => {
                    return Err(GpError::InvalidGrammar(format!(
                        "constant symbol {} has min value {} above max value {}",
                        symbol.name(),
                        min_value,
                        max_value
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.symbols.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("start_symbols", &self.start_symbols)
            .field("allowed_children", &self.allowed_children)
            .field("fallback", &self.fallback)
            .field("length", &(self.min_length..=self.max_length))
            .field("depth", &(self.min_depth..=self.max_depth))
            .field("revision", &self.revision)
            .finish()
    }
}
