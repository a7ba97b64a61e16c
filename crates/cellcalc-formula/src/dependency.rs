//! Dependency tracking between formula cells

use crate::ast::FormulaExpr;
use cellcalc_core::{CellAddress, CellRange};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Key for a cell of the sheet being calculated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn from_address(addr: &CellAddress) -> Self {
        Self::new(addr.row, addr.col)
    }

    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}

/// Dependency graph for formula cells
///
/// An edge runs from a precedent to each cell whose formula reads it.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → cells that depend on it
    dependents: HashMap<CellKey, HashSet<CellKey>>,
    /// Cell → cells it depends on
    precedents: HashMap<CellKey, HashSet<CellKey>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph between formula cells
    ///
    /// A formula depends on every other formula cell its references cover,
    /// including itself when a reference covers its own cell. Constant cells
    /// never change during a calculation and are not tracked.
    pub fn from_formulas<'a, I>(formulas: I) -> Self
    where
        I: IntoIterator<Item = (CellKey, &'a FormulaExpr)>,
    {
        let formulas: Vec<(CellKey, Vec<CellRange>)> = formulas
            .into_iter()
            .map(|(key, expr)| (key, expr.references()))
            .collect();

        // Formula rows per column, so a reference only visits the cells it covers
        let mut by_column: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
        for (key, _) in &formulas {
            by_column.entry(key.col).or_default().insert(key.row);
        }

        let mut graph = Self::new();
        for (dependent, references) in &formulas {
            for range in references {
                let (first_col, last_col) = ordered(range.start.col, range.end.col);
                let (first_row, last_row) = ordered(range.start.row, range.end.row);
                for (&col, rows) in by_column.range(first_col..=last_col) {
                    for &row in rows.range(first_row..=last_row) {
                        graph.add_dependency(CellKey::new(row, col), *dependent);
                    }
                }
            }
        }
        graph
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellKey, dependent: CellKey) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Cells that depend on the given cell
    pub fn get_dependents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Cells the given cell depends on
    pub fn get_precedents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Precedents in key order, so walks do not depend on hashing
    fn sorted_precedents(&self, cell: CellKey) -> std::vec::IntoIter<CellKey> {
        let mut cells: Vec<CellKey> = self.get_precedents(cell).collect();
        cells.sort_unstable();
        cells.into_iter()
    }

    fn reads_itself(&self, cell: CellKey) -> bool {
        self.precedents
            .get(&cell)
            .map_or(false, |set| set.contains(&cell))
    }

    /// Order in which to calculate `cells` so that every precedent comes
    /// before the cells reading it
    ///
    /// Cells on a cycle are still listed once, in an arbitrary position
    /// relative to the rest of their cycle.
    pub fn calculation_order<I>(&self, cells: I) -> Vec<CellKey>
    where
        I: IntoIterator<Item = CellKey>,
    {
        let mut order = Vec::new();
        let mut entered = HashSet::new();

        for root in cells {
            if !entered.insert(root) {
                continue;
            }
            // Depth-first post-order with an explicit stack; chains can be
            // as long as the sheet
            let mut stack = vec![(root, self.sorted_precedents(root))];
            loop {
                let Some((cell, pending)) = stack.last_mut() else {
                    break;
                };
                let cell = *cell;
                match pending.next() {
                    Some(next) => {
                        if entered.insert(next) {
                            stack.push((next, self.sorted_precedents(next)));
                        }
                    }
                    None => {
                        stack.pop();
                        order.push(cell);
                    }
                }
            }
        }
        order
    }

    /// Every cell that lies on a cycle, reading itself directly or through
    /// other cells
    pub fn cycle_members(&self) -> BTreeSet<CellKey> {
        let mut search = ComponentSearch::new(self);
        let mut roots: Vec<CellKey> = self.precedents.keys().copied().collect();
        roots.sort_unstable();
        for root in roots {
            if !search.index.contains_key(&root) {
                search.run(root);
            }
        }
        search.cyclic
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

/// Tarjan's strongly connected components, iterative
struct ComponentSearch<'a> {
    graph: &'a DependencyGraph,
    index: HashMap<CellKey, usize>,
    low: HashMap<CellKey, usize>,
    stack: Vec<CellKey>,
    on_stack: HashSet<CellKey>,
    cyclic: BTreeSet<CellKey>,
}

impl<'a> ComponentSearch<'a> {
    fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            index: HashMap::new(),
            low: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            cyclic: BTreeSet::new(),
        }
    }

    fn enter(&mut self, cell: CellKey) -> std::vec::IntoIter<CellKey> {
        let index = self.index.len();
        self.index.insert(cell, index);
        self.low.insert(cell, index);
        self.stack.push(cell);
        self.on_stack.insert(cell);
        self.graph.sorted_precedents(cell)
    }

    fn lower(&mut self, cell: CellKey, to: usize) {
        if let Some(low) = self.low.get_mut(&cell) {
            *low = (*low).min(to);
        }
    }

    fn run(&mut self, root: CellKey) {
        let first = self.enter(root);
        let mut work = vec![(root, first)];
        loop {
            let Some((cell, pending)) = work.last_mut() else {
                break;
            };
            let cell = *cell;
            match pending.next() {
                Some(next) => match self.index.get(&next) {
                    None => {
                        let neighbours = self.enter(next);
                        work.push((next, neighbours));
                    }
                    Some(&index) => {
                        if self.on_stack.contains(&next) {
                            self.lower(cell, index);
                        }
                    }
                },
                None => {
                    work.pop();
                    let low = self.low.get(&cell).copied().unwrap_or_default();
                    if let Some(&(parent, _)) = work.last() {
                        self.lower(parent, low);
                    }
                    if self.index.get(&cell) == Some(&low) {
                        self.close_component(cell);
                    }
                }
            }
        }
    }

    fn close_component(&mut self, root: CellKey) {
        let mut component = Vec::new();
        while let Some(cell) = self.stack.pop() {
            self.on_stack.remove(&cell);
            component.push(cell);
            if cell == root {
                break;
            }
        }
        if component.len() > 1 || self.graph.reads_itself(root) {
            self.cyclic.extend(component);
        }
    }
}
