//! Statutory CPF contribution split for a monthly wage.
//!
//! Only the part of the wage up to the Ordinary-Wage ceiling attracts contributions,
//! so every wage at or above the ceiling contributes the same capped amount. Rates
//! come from an age-banded [`CpfRateTable`] supplied through configuration.

use once_cell::sync::Lazy;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    domain::FinancialItem,
    errors::{EngineError, EngineResult},
    schedule::frequency::monthly_equivalent,
};

const CONTRIBUTION_SCALE: u32 = 2;

static DEFAULT_RATE_TABLE: Lazy<CpfRateTable> = Lazy::new(|| CpfRateTable {
    ordinary_wage_ceiling: Decimal::from(8000),
    bands: vec![
        CpfAgeBand::new(Some(55), Decimal::new(20, 2), Decimal::new(17, 2)),
        CpfAgeBand::new(Some(60), Decimal::new(17, 2), Decimal::new(155, 3)),
        CpfAgeBand::new(Some(65), Decimal::new(115, 3), Decimal::new(12, 2)),
        CpfAgeBand::new(Some(70), Decimal::new(75, 3), Decimal::new(9, 2)),
        CpfAgeBand::new(None, Decimal::new(5, 2), Decimal::new(75, 3)),
    ],
});

/// Contribution rates for members up to and including `up_to_age`.
/// The last band has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpfAgeBand {
    pub up_to_age: Option<u32>,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
}

impl CpfAgeBand {
    pub fn new(up_to_age: Option<u32>, employee_rate: Decimal, employer_rate: Decimal) -> Self {
        Self {
            up_to_age,
            employee_rate,
            employer_rate,
        }
    }

    fn covers(&self, age: u32) -> bool {
        self.up_to_age.map_or(true, |limit| age <= limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpfRateTable {
    pub ordinary_wage_ceiling: Decimal,
    pub bands: Vec<CpfAgeBand>,
}

impl Default for CpfRateTable {
    fn default() -> Self {
        DEFAULT_RATE_TABLE.clone()
    }
}

impl CpfRateTable {
    /// Rejects tables that cannot price every age.
    pub fn validate(&self) -> EngineResult<()> {
        if self.ordinary_wage_ceiling <= Decimal::ZERO {
            return Err(EngineError::CpfConfig(format!(
                "ordinary wage ceiling must be positive, got {}",
                self.ordinary_wage_ceiling
            )));
        }
        if self.bands.is_empty() {
            return Err(EngineError::CpfConfig("rate table has no age bands".into()));
        }
        let mut previous: Option<u32> = None;
        for (index, band) in self.bands.iter().enumerate() {
            for (label, rate) in [
                ("employee", band.employee_rate),
                ("employer", band.employer_rate),
            ] {
                if rate < Decimal::ZERO || rate > Decimal::ONE {
                    return Err(EngineError::CpfConfig(format!(
                        "band {index}: {label} rate {rate} outside 0..=1"
                    )));
                }
            }
            let is_last = index + 1 == self.bands.len();
            match (band.up_to_age, is_last) {
                (None, true) => {}
                (None, false) => {
                    return Err(EngineError::CpfConfig(format!(
                        "band {index}: only the last band may be open-ended"
                    )))
                }
                (Some(_), true) => {
                    return Err(EngineError::CpfConfig(
                        "last band must be open-ended".into(),
                    ))
                }
                (Some(limit), false) => {
                    if previous.is_some_and(|prev| limit <= prev) {
                        return Err(EngineError::CpfConfig(format!(
                            "band {index}: age limits must be strictly ascending"
                        )));
                    }
                    previous = Some(limit);
                }
            }
        }
        Ok(())
    }

    pub fn band_for(&self, age: u32) -> Option<&CpfAgeBand> {
        self.bands.iter().find(|band| band.covers(age))
    }
}

/// Result of a CPF computation for one month's wage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpfBreakdown {
    pub gross_wage: Decimal,
    /// Portion of the wage subject to contributions (capped at the ceiling).
    pub contributory_wage: Decimal,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
    pub employee_contribution: Decimal,
    pub employer_contribution: Decimal,
    pub total_contribution: Decimal,
    pub net_take_home: Decimal,
}

/// Pure CPF calculator over a validated rate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpfCalculator {
    table: CpfRateTable,
}

impl Default for CpfCalculator {
    fn default() -> Self {
        Self {
            table: CpfRateTable::default(),
        }
    }
}

impl CpfCalculator {
    pub fn new(table: CpfRateTable) -> EngineResult<Self> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &CpfRateTable {
        &self.table
    }

    pub fn ceiling(&self) -> Decimal {
        self.table.ordinary_wage_ceiling
    }

    pub fn compute(&self, gross_monthly_wage: Decimal, age: u32) -> EngineResult<CpfBreakdown> {
        if gross_monthly_wage < Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "wage must not be negative, got {gross_monthly_wage}"
            )));
        }
        let band = self.table.band_for(age).ok_or_else(|| {
            EngineError::CpfConfig(format!("no rate band covers age {age}"))
        })?;
        let contributory_wage = gross_monthly_wage.min(self.ceiling());
        let employee_contribution = round_contribution(contributory_wage * band.employee_rate);
        let employer_contribution = round_contribution(contributory_wage * band.employer_rate);
        Ok(CpfBreakdown {
            gross_wage: gross_monthly_wage,
            contributory_wage,
            employee_rate: band.employee_rate,
            employer_rate: band.employer_rate,
            employee_contribution,
            employer_contribution,
            total_contribution: employee_contribution + employer_contribution,
            net_take_home: gross_monthly_wage - employee_contribution,
        })
    }
}

static DEFAULT_CALCULATOR: Lazy<CpfCalculator> = Lazy::new(CpfCalculator::default);

/// Shared calculator over the built-in rate table.
pub fn default_calculator() -> &'static CpfCalculator {
    &DEFAULT_CALCULATOR
}

/// Computes the split with the built-in rate table.
pub fn compute_cpf(gross_monthly_wage: Decimal, age: u32) -> EngineResult<CpfBreakdown> {
    default_calculator().compute(gross_monthly_wage, age)
}

pub(crate) fn round_contribution(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CONTRIBUTION_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Stored employee contribution on an income next to the value the current table
/// would produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpfReconciliation {
    pub stored: Option<Decimal>,
    pub computed: Decimal,
    pub diverges: bool,
}

/// Compares an income's stored contribution with a fresh computation. Returns `None`
/// for items that are not CPF-subject incomes.
pub fn reconcile(
    item: &FinancialItem,
    calculator: &CpfCalculator,
    age: u32,
) -> EngineResult<Option<CpfReconciliation>> {
    let Some(details) = item.income.as_ref().filter(|details| details.subject_to_cpf) else {
        return Ok(None);
    };
    let wage = monthly_equivalent(item.amount, item.frequency).ok_or_else(|| {
        EngineError::InvalidInput(format!("monthly wage of {} overflows", item.name))
    })?;
    let computed = calculator.compute(wage, age)?.employee_contribution;
    let stored = details.employee_cpf_contribution;
    Ok(Some(CpfReconciliation {
        stored,
        computed,
        diverges: stored.is_some_and(|value| value != computed),
    }))
}
