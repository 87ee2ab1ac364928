//! Property-based test generators using proptest.
//!
//! Provides strategies for parameter containers that satisfy a given
//! [`ValidationRules`], and for sequences of store operations.

use chrono::{Duration, NaiveDate};
use filecab_core::{ParametersContainer, ValidationRules};
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Strategy for capitalized ASCII names whose length lies within `min..=max`.
pub fn name_strategy(min: usize, max: usize) -> impl Strategy<Value = String> {
    let min = min.max(1);
    let max = max.max(min);
    prop::string::string_regex(&format!("[A-Z][a-z]{{{},{}}}", min - 1, max - 1))
        .expect("Invalid regex")
}

/// Strategy for dates within `min..=max`.
pub fn date_strategy(min: NaiveDate, max: NaiveDate) -> impl Strategy<Value = NaiveDate> {
    let span = (max - min).num_days().max(0);
    (0..=span).prop_map(move |days| min + Duration::days(days))
}

/// Strategy for two-decimal amounts within `min..=max`.
pub fn income_strategy(min: Decimal, max: Decimal) -> impl Strategy<Value = Decimal> {
    let cents = |value: Decimal| {
        (value * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or(0)
    };
    let (low, high) = (cents(min), cents(max));
    (low..=high.max(low)).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for parameter containers accepted by `rules`.
pub fn valid_parameters_strategy(
    rules: &ValidationRules,
) -> impl Strategy<Value = ParametersContainer> {
    (
        name_strategy(rules.first_name.min, rules.first_name.max),
        name_strategy(rules.last_name.min, rules.last_name.max),
        date_strategy(rules.date_of_birth.min, rules.date_of_birth.max),
        rules.working_hours.min..=rules.working_hours.max,
        income_strategy(rules.annual_income.min, rules.annual_income.max),
        prop::sample::select(rules.driver_license_categories.clone()),
    )
        .prop_map(|(first, last, dob, hours, income, category)| {
            ParametersContainer::new(first, last, dob, hours, income, category)
        })
}

/// Strategy for parameter containers whose first name is too short for
/// `rules`.
pub fn short_first_name_strategy(
    rules: &ValidationRules,
) -> impl Strategy<Value = ParametersContainer> {
    let too_short = rules.first_name.min.saturating_sub(1);
    (
        valid_parameters_strategy(rules),
        prop::string::string_regex(&format!("[a-z]{{0,{too_short}}}")).expect("Invalid regex"),
    )
        .prop_map(|(mut params, first)| {
            params.first_name = first;
            params
        })
}

/// Store operations for differential testing.
///
/// Records are addressed by position among the live records so the same
/// operation means the same thing to stores that assign different ids.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Create a record.
    Create(ParametersContainer),
    /// Insert a record under an explicit id.
    Insert {
        /// Id to insert under.
        id: i32,
        /// Record fields.
        params: ParametersContainer,
    },
    /// Edit the live record at `index % live`.
    Edit {
        /// Position hint.
        index: usize,
        /// Replacement fields.
        params: ParametersContainer,
    },
    /// Remove the live record at `index % live`.
    Remove {
        /// Position hint.
        index: usize,
    },
    /// Purge deleted records.
    Purge,
}

/// Strategy for generating store operations valid under `rules`.
pub fn store_operation_strategy(
    rules: &ValidationRules,
) -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => valid_parameters_strategy(rules).prop_map(StoreOperation::Create),
        1 => (10_000..10_050i32, valid_parameters_strategy(rules))
            .prop_map(|(id, params)| StoreOperation::Insert { id, params }),
        2 => (any::<usize>(), valid_parameters_strategy(rules))
            .prop_map(|(index, params)| StoreOperation::Edit { index, params }),
        2 => any::<usize>().prop_map(|index| StoreOperation::Remove { index }),
        1 => Just(StoreOperation::Purge),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    rules: &ValidationRules,
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(rules), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecab_core::{Field, RuleSet, ValidationError, Validator};

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_parameters_pass_custom_rules(
            params in valid_parameters_strategy(&ValidationRules::custom_rules())
        ) {
            prop_assert!(Validator::for_set(RuleSet::Custom).validate(&params).is_ok());
        }

        #[test]
        fn generated_parameters_pass_default_rules(
            params in valid_parameters_strategy(&ValidationRules::default_rules())
        ) {
            prop_assert!(Validator::for_set(RuleSet::Default).validate(&params).is_ok());
        }

        #[test]
        fn short_first_names_fail_first(
            params in short_first_name_strategy(&ValidationRules::custom_rules())
        ) {
            let err = Validator::for_set(RuleSet::Custom).validate(&params).unwrap_err();
            prop_assert!(
                matches!(err, ValidationError::Length { field: Field::FirstName, .. }),
                "expected FirstName length error, got {:?}",
                err
            );
        }
    }

    #[test]
    fn default_config_values() {
        let config = PropTestConfig::default();
        assert_eq!(config.cases, 256);
        assert_eq!(config.to_proptest_config().cases, 256);
    }
}
