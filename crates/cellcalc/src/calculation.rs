//! Sheet calculation engine
//!
//! Caller data may contain formula cells: text starting with `=`. Before a
//! formula is evaluated against such data, the formula cells are calculated
//! in dependency order into a computed copy of the sheet, with circular
//! references detected up front.
//!
//! # Example
//!
//! ```rust
//! use cellcalc::calculation::{recalculate, CalculationOptions};
//! use cellcalc::{CellValue, Sheet};
//!
//! let sheet = Sheet::new(
//!     vec![],
//!     vec![
//!         vec![CellValue::from(10)],
//!         vec![CellValue::from(20)],
//!         vec![CellValue::from("=A1+A2")],
//!     ],
//! );
//!
//! let (computed, stats) = recalculate(&sheet, &CalculationOptions::default()).unwrap();
//! assert_eq!(computed.value_at(2, 0), CellValue::Number(30.0));
//! assert_eq!(stats.cells_calculated, 1);
//! ```

use crate::{
    evaluate, parse_formula, CellError, CellValue, ErrorKind, EvaluationContext,
    EvaluationOptions, FormulaExpr, Result, Sheet,
};
use cellcalc_formula::dependency::{CellKey, DependencyGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Options for sheet calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculationOptions {
    /// Treat text cells starting with `=` as formulas and calculate them
    pub formula_cells: bool,
    /// Limits applied to every evaluation
    pub evaluation: EvaluationOptions,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            formula_cells: true,
            evaluation: EvaluationOptions::default(),
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells calculated
    pub cells_calculated: usize,
    /// Number of cells on a circular reference
    pub circular_references: usize,
    /// Number of formula cells whose result is an error value
    pub errors: usize,
}

/// Calculate every formula cell of `sheet` into a computed copy
///
/// Cells on a cycle become `#REF!`, formula text that does not parse becomes
/// `#VALUE!`. A fatal failure (depth limit) inside any formula cell is
/// returned as [`Error::Formula`](crate::Error::Formula).
pub fn recalculate(sheet: &Sheet, options: &CalculationOptions) -> Result<(Sheet, CalculationStats)> {
    let mut engine = CalculationEngine::new(options.clone());
    engine.calculate_all(sheet)
}

/// Whether a cell holds formula text
pub fn is_formula_cell(value: &CellValue) -> bool {
    value
        .as_text()
        .map_or(false, |text| text.trim_start().starts_with('='))
}

/// The calculation engine
struct CalculationEngine {
    options: CalculationOptions,
    /// Dependency graph built from formulas
    dependency_graph: DependencyGraph,
    /// Parsed formula ASTs, keyed by cell
    parsed_formulas: BTreeMap<CellKey, FormulaExpr>,
    /// Cells whose formula text failed to parse, with the parse message
    unparsed: BTreeMap<CellKey, String>,
    /// Cells involved in circular references
    circular_cells: BTreeSet<CellKey>,
}

impl CalculationEngine {
    fn new(options: CalculationOptions) -> Self {
        Self {
            options,
            dependency_graph: DependencyGraph::new(),
            parsed_formulas: BTreeMap::new(),
            unparsed: BTreeMap::new(),
            circular_cells: BTreeSet::new(),
        }
    }

    fn calculate_all(&mut self, sheet: &Sheet) -> Result<(Sheet, CalculationStats)> {
        let mut stats = CalculationStats::default();
        let mut computed = sheet.clone();

        if !self.options.formula_cells {
            return Ok((computed, stats));
        }

        // Phase 1: collect and parse formulas, build the dependency graph
        self.collect_formulas(sheet, &mut stats);
        if stats.formula_count == 0 {
            return Ok((computed, stats));
        }

        for (key, message) in &self.unparsed {
            computed.set_value_at(
                key.row,
                key.col,
                CellValue::Error(CellError::with_detail(ErrorKind::InvalidValue, message)),
            );
        }

        // Phase 2: circular references
        self.circular_cells = self.dependency_graph.cycle_members();
        stats.circular_references = self.circular_cells.len();
        for key in &self.circular_cells {
            warn!(cell = %key.address(), "circular reference");
            computed.set_value_at(
                key.row,
                key.col,
                CellValue::Error(CellError::with_detail(
                    ErrorKind::InvalidReference,
                    "circular reference",
                )),
            );
        }

        // Phase 3: calculate in dependency order
        let order = self
            .dependency_graph
            .calculation_order(self.parsed_formulas.keys().copied());
        self.calculate_cells(&mut computed, &order, &mut stats)?;

        stats.errors += self.unparsed.len() + self.circular_cells.len();
        debug!(
            formulas = stats.formula_count,
            calculated = stats.cells_calculated,
            circular = stats.circular_references,
            "sheet calculated"
        );
        Ok((computed, stats))
    }

    fn collect_formulas(&mut self, sheet: &Sheet, stats: &mut CalculationStats) {
        for (addr, value) in sheet.iter_cells() {
            if !is_formula_cell(value) {
                continue;
            }
            stats.formula_count += 1;

            let key = CellKey::from_address(&addr);
            let text = value.as_text().unwrap_or_default();
            match parse_formula(text) {
                Ok(ast) => {
                    self.parsed_formulas.insert(key, ast);
                }
                Err(e) => {
                    debug!(cell = %addr, error = %e, "formula cell does not parse");
                    self.unparsed.insert(key, e.to_string());
                }
            }
        }

        self.dependency_graph = DependencyGraph::from_formulas(
            self.parsed_formulas.iter().map(|(key, ast)| (*key, ast)),
        );
    }

    fn calculate_cells(
        &self,
        computed: &mut Sheet,
        order: &[CellKey],
        stats: &mut CalculationStats,
    ) -> Result<()> {
        for key in order {
            if self.circular_cells.contains(key) {
                continue;
            }
            let Some(ast) = self.parsed_formulas.get(key) else {
                continue;
            };

            let value = {
                let ctx = EvaluationContext::with_options(computed, self.options.evaluation);
                CellValue::from(evaluate(ast, &ctx)?)
            };
            if value.is_error() {
                stats.errors += 1;
            }
            computed.set_value_at(key.row, key.col, value);
            stats.cells_calculated += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormulaError;
    use pretty_assertions::assert_eq;

    fn column(values: &[CellValue]) -> Sheet {
        Sheet::new(vec![], values.iter().map(|v| vec![v.clone()]).collect())
    }

    #[test]
    fn test_formulas_calculate_in_dependency_order() {
        // A4 reads A3, which is further down the evaluation order by position
        let sheet = column(&[
            CellValue::from(10),
            CellValue::from("=A4*2"),
            CellValue::from(5),
            CellValue::from("=A1+A3"),
        ]);

        let (computed, stats) = recalculate(&sheet, &CalculationOptions::default()).unwrap();
        assert_eq!(computed.value_at(3, 0), CellValue::Number(15.0));
        assert_eq!(computed.value_at(1, 0), CellValue::Number(30.0));
        assert_eq!(
            stats,
            CalculationStats {
                formula_count: 2,
                cells_calculated: 2,
                circular_references: 0,
                errors: 0,
            }
        );
    }

    #[test]
    fn test_circular_references_become_ref_errors() {
        let sheet = column(&[
            CellValue::from("=A2+1"),
            CellValue::from("=A1+1"),
            CellValue::from("=A1*2"),
            CellValue::from("=SUM(A4)"),
        ]);

        let (computed, stats) = recalculate(&sheet, &CalculationOptions::default()).unwrap();
        assert_eq!(computed.value_at(0, 0), CellValue::error(ErrorKind::InvalidReference));
        assert_eq!(computed.value_at(1, 0), CellValue::error(ErrorKind::InvalidReference));
        assert_eq!(computed.value_at(3, 0), CellValue::error(ErrorKind::InvalidReference));
        // Reads a cycle member without being on the cycle
        assert_eq!(computed.value_at(2, 0), CellValue::error(ErrorKind::InvalidReference));
        assert_eq!(stats.circular_references, 3);
        assert_eq!(stats.cells_calculated, 1);
    }

    #[test]
    fn test_unparseable_formula_cell_is_value_error() {
        let sheet = column(&[CellValue::from("=1+"), CellValue::from("=A1")]);
        let (computed, stats) = recalculate(&sheet, &CalculationOptions::default()).unwrap();
        assert_eq!(computed.value_at(0, 0), CellValue::error(ErrorKind::InvalidValue));
        assert_eq!(computed.value_at(1, 0), CellValue::error(ErrorKind::InvalidValue));
        assert_eq!(stats.errors, 2);
    }

    #[test]
    fn test_formula_cells_can_be_disabled() {
        let sheet = column(&[CellValue::from("=1+1")]);
        let options = CalculationOptions {
            formula_cells: false,
            ..Default::default()
        };
        let (computed, stats) = recalculate(&sheet, &options).unwrap();
        assert_eq!(computed.value_at(0, 0), CellValue::from("=1+1"));
        assert_eq!(stats.formula_count, 0);
    }

    #[test]
    fn test_fatal_failure_propagates() {
        let sheet = column(&[CellValue::from("=ABS(ABS(ABS(1)))")]);
        let mut options = CalculationOptions::default();
        options.evaluation.max_call_depth = 2;
        let err = recalculate(&sheet, &options).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Formula(FormulaError::DepthExceeded { .. })
        ));
    }
}
