use anyhow::Result;

use crate::record::schema::Schema;

use super::constant::Constant;
use super::scan::Scan;
use super::term::Term;

/// A conjunction/disjunction of terms, evaluated strictly left to right with
/// no operator precedence: `t0 op0 t1 op1 t2 ...` folds as
/// `((t0 op0 t1) op1 t2) ...`, matching how it was entered rather than
/// applying `and`-before-`or`.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    terms: Vec<Term>,
    logic_ops: Vec<String>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(term: Term) -> Self {
        Self {
            terms: vec![term],
            logic_ops: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Appends a term joined to the existing terms by `logic_op` ("and" or
    /// "or"). Has no effect on the first term added.
    pub fn add_term(&mut self, term: Term, logic_op: &str) {
        if !self.terms.is_empty() {
            self.logic_ops.push(logic_op.to_string());
        }
        self.terms.push(term);
    }

    /// Merges another predicate's terms onto this one, each joined by "and".
    pub fn conjoin_with(&mut self, other: Predicate) {
        for (i, term) in other.terms.into_iter().enumerate() {
            let op = if i == 0 {
                "and".to_string()
            } else {
                other.logic_ops[i - 1].clone()
            };
            if self.terms.is_empty() && i == 0 {
                self.terms.push(term);
            } else {
                self.logic_ops.push(op);
                self.terms.push(term);
            }
        }
    }

    pub fn is_satisfied(&self, scan: &mut dyn Scan) -> Result<bool> {
        if self.terms.is_empty() {
            return Ok(true);
        }

        let mut cur_res = self.terms[0].is_satisfied(scan)?;
        for i in 0..self.terms.len() - 1 {
            let new_res = self.terms[i + 1].is_satisfied(scan)?;
            cur_res = match self.logic_ops[i].as_str() {
                "and" => new_res && cur_res,
                "or" => new_res || cur_res,
                other => anyhow::bail!("unrecognized logic operator: {}", other),
            };
        }
        Ok(cur_res)
    }

    /// The sub-predicate applicable to `schema` alone, for pushing selection
    /// down to a single table's scan.
    pub fn select_sub_predicate(&self, schema: &Schema) -> Option<Predicate> {
        let matching: Vec<Term> = self
            .terms
            .iter()
            .filter(|term| term.applies_to(schema))
            .cloned()
            .collect();
        Self::from_terms(matching)
    }

    /// The sub-predicate that only becomes evaluable once `schema_1` and
    /// `schema_2` are joined — neither side alone satisfies it.
    pub fn join_sub_predicate(&self, schema_1: &Schema, schema_2: &Schema) -> Option<Predicate> {
        let mut combined = Schema::new();
        combined.add_all(schema_1);
        combined.add_all(schema_2);

        let matching: Vec<Term> = self
            .terms
            .iter()
            .filter(|term| {
                !term.applies_to(schema_1) && !term.applies_to(schema_2) && term.applies_to(&combined)
            })
            .cloned()
            .collect();
        Self::from_terms(matching)
    }

    pub fn equates_with_constant(&self, field_name: &str) -> Option<Constant> {
        self.terms.iter().find_map(|term| term.equates_with_constant(field_name))
    }

    pub fn equates_with_field(&self, field_name: &str) -> Option<String> {
        self.terms.iter().find_map(|term| term.equates_with_field(field_name))
    }

    fn from_terms(terms: Vec<Term>) -> Option<Predicate> {
        if terms.is_empty() {
            return None;
        }
        let logic_ops = vec!["and".to_string(); terms.len().saturating_sub(1)];
        Some(Predicate { terms, logic_ops })
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return Ok(());
        }
        write!(f, "{}", self.terms[0])?;
        for i in 0..self.terms.len() - 1 {
            write!(f, " {} {}", self.logic_ops[i], self.terms[i + 1])?;
        }
        Ok(())
    }
}
