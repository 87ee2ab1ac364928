//! Field validation.
//!
//! A [`Validator`] is built from a flat [`ValidationRules`] value and runs a
//! fixed sequence of field checks, stopping at the first violation:
//!
//! 1. first name length
//! 2. last name length
//! 3. date of birth range
//! 4. working hours range
//! 5. annual income range
//! 6. driver license category membership
//!
//! Two presets exist, [`RuleSet::Default`] and [`RuleSet::Custom`]; any other
//! combination of bounds is just another `ValidationRules` value.

use crate::record::{Field, ParametersContainer};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Inclusive `[min, max]` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds<T> {
    /// Smallest accepted value.
    pub min: T,
    /// Largest accepted value.
    pub max: T,
}

impl<T: PartialOrd> Bounds<T> {
    /// Creates new bounds.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Returns whether `value` lies within the bounds.
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

/// The bounds consulted by every field validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    /// First name length in characters.
    pub first_name: Bounds<usize>,
    /// Last name length in characters.
    pub last_name: Bounds<usize>,
    /// Accepted birth dates.
    pub date_of_birth: Bounds<NaiveDate>,
    /// Accepted working hours per week.
    pub working_hours: Bounds<i16>,
    /// Accepted annual income.
    pub annual_income: Bounds<Decimal>,
    /// Accepted driver license categories.
    pub driver_license_categories: Vec<char>,
}

impl ValidationRules {
    /// Wide bounds, categories A through D.
    #[must_use]
    pub fn default_rules() -> Self {
        Self {
            first_name: Bounds::new(2, 60),
            last_name: Bounds::new(2, 60),
            date_of_birth: Bounds::new(date(1950, 1, 1), date(2024, 12, 31)),
            working_hours: Bounds::new(1, 100),
            annual_income: Bounds::new(Decimal::ZERO, Decimal::from(1_000_000)),
            driver_license_categories: vec!['A', 'B', 'C', 'D'],
        }
    }

    /// Narrow bounds, categories A and B.
    #[must_use]
    pub fn custom_rules() -> Self {
        Self {
            first_name: Bounds::new(5, 10),
            last_name: Bounds::new(5, 10),
            date_of_birth: Bounds::new(date(1960, 1, 1), date(2010, 12, 31)),
            working_hours: Bounds::new(20, 30),
            annual_income: Bounds::new(Decimal::from(500), Decimal::from(1500)),
            driver_license_categories: vec!['A', 'B'],
        }
    }

    /// Returns the preset for a named rule set.
    #[must_use]
    pub fn for_set(rule_set: RuleSet) -> Self {
        match rule_set {
            RuleSet::Default => Self::default_rules(),
            RuleSet::Custom => Self::custom_rules(),
        }
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::default_rules()
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Name of a rule set preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuleSet {
    /// Wide bounds.
    #[default]
    Default,
    /// Narrow bounds.
    Custom,
}

impl RuleSet {
    /// Returns the key used for this set in a rules document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown rule set '{other}', expected 'default' or 'custom'")),
        }
    }
}

/// A field that fell outside the active rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A name is too short or too long.
    #[error("{field} must be {min} to {max} characters long, got {actual}")]
    Length {
        /// The offending field.
        field: Field,
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
        /// Actual length.
        actual: usize,
    },

    /// A value is outside its configured range.
    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        /// The offending field.
        field: Field,
        /// Configured minimum, formatted.
        min: String,
        /// Configured maximum, formatted.
        max: String,
        /// Actual value, formatted.
        actual: String,
    },

    /// The driver license category is not in the allowed set.
    #[error("{field} must be one of {allowed}, got '{actual}'")]
    NotAllowed {
        /// The offending field.
        field: Field,
        /// Allowed values, comma separated.
        allowed: String,
        /// Actual value.
        actual: char,
    },
}

impl ValidationError {
    /// Returns the field that failed validation.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::Length { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::NotAllowed { field, .. } => *field,
        }
    }
}

/// Checks a single field of a parameter container.
pub trait FieldValidator: fmt::Debug + Send + Sync {
    /// Validates one field.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the field and the violated bound.
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError>;
}

#[derive(Debug)]
struct NameLengthValidator {
    field: Field,
    bounds: Bounds<usize>,
}

impl FieldValidator for NameLengthValidator {
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        let name = match self.field {
            Field::LastName => &params.last_name,
            _ => &params.first_name,
        };
        let actual = name.chars().count();
        if self.bounds.contains(&actual) {
            return Ok(());
        }
        Err(ValidationError::Length {
            field: self.field,
            min: self.bounds.min,
            max: self.bounds.max,
            actual,
        })
    }
}

#[derive(Debug)]
struct DateOfBirthValidator {
    bounds: Bounds<NaiveDate>,
}

impl FieldValidator for DateOfBirthValidator {
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        check_range(Field::DateOfBirth, &self.bounds, &params.date_of_birth)
    }
}

#[derive(Debug)]
struct WorkingHoursValidator {
    bounds: Bounds<i16>,
}

impl FieldValidator for WorkingHoursValidator {
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        check_range(Field::WorkingHours, &self.bounds, &params.working_hours_per_week)
    }
}

#[derive(Debug)]
struct AnnualIncomeValidator {
    bounds: Bounds<Decimal>,
}

impl FieldValidator for AnnualIncomeValidator {
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        check_range(Field::AnnualIncome, &self.bounds, &params.annual_income)
    }
}

#[derive(Debug)]
struct CategoryValidator {
    allowed: Vec<char>,
}

impl FieldValidator for CategoryValidator {
    fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        let actual = params.driver_license_category;
        if self.allowed.contains(&actual) {
            return Ok(());
        }
        Err(ValidationError::NotAllowed {
            field: Field::DriverLicenseCategory,
            allowed: self
                .allowed
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            actual,
        })
    }
}

fn check_range<T: PartialOrd + fmt::Display>(
    field: Field,
    bounds: &Bounds<T>,
    actual: &T,
) -> Result<(), ValidationError> {
    if bounds.contains(actual) {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field,
        min: bounds.min.to_string(),
        max: bounds.max.to_string(),
        actual: actual.to_string(),
    })
}

/// Composite validator: runs every field validator in order, fail-fast.
#[derive(Debug)]
pub struct Validator {
    rules: ValidationRules,
    validators: Vec<Box<dyn FieldValidator>>,
}

impl Validator {
    /// Builds the validator chain for a set of rules.
    #[must_use]
    pub fn new(rules: ValidationRules) -> Self {
        let validators: Vec<Box<dyn FieldValidator>> = vec![
            Box::new(NameLengthValidator {
                field: Field::FirstName,
                bounds: rules.first_name,
            }),
            Box::new(NameLengthValidator {
                field: Field::LastName,
                bounds: rules.last_name,
            }),
            Box::new(DateOfBirthValidator {
                bounds: rules.date_of_birth,
            }),
            Box::new(WorkingHoursValidator {
                bounds: rules.working_hours,
            }),
            Box::new(AnnualIncomeValidator {
                bounds: rules.annual_income,
            }),
            Box::new(CategoryValidator {
                allowed: rules.driver_license_categories.clone(),
            }),
        ];
        Self { rules, validators }
    }

    /// Builds the validator for a preset rule set.
    #[must_use]
    pub fn for_set(rule_set: RuleSet) -> Self {
        Self::new(ValidationRules::for_set(rule_set))
    }

    /// Returns the rules this validator enforces.
    #[must_use]
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validates a parameter container.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] in validator order.
    pub fn validate(&self, params: &ParametersContainer) -> Result<(), ValidationError> {
        self.validators
            .iter()
            .try_for_each(|validator| validator.validate(params))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationRules::default_rules())
    }
}

impl Clone for Validator {
    fn clone(&self) -> Self {
        Self::new(self.rules.clone())
    }
}
