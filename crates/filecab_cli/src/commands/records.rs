//! Record commands.

use super::parse_date;
use filecab_core::{Field, ParametersContainer, Record, RecordStore};
use rust_decimal::Decimal;
use std::error::Error;

/// Runs the create command.
pub fn create(store: &mut dyn RecordStore, params: &ParametersContainer) -> Result<(), Box<dyn Error>> {
    let id = store.create(params)?;
    println!("Record #{id} is created.");
    Ok(())
}

/// Runs the edit command.
pub fn edit(store: &mut dyn RecordStore, id: i32, params: &ParametersContainer) -> Result<(), Box<dyn Error>> {
    store.edit(id, params)?;
    println!("Record #{id} is updated.");
    Ok(())
}

/// Runs the remove command.
pub fn remove(store: &mut dyn RecordStore, id: i32) -> Result<(), Box<dyn Error>> {
    store.remove(id)?;
    println!("Record #{id} is removed.");
    Ok(())
}

/// Runs the list command.
pub fn list(store: &dyn RecordStore) -> Result<(), Box<dyn Error>> {
    let records = store.get_records()?;
    if records.is_empty() {
        println!("No records.");
    }
    print_records(&records);
    Ok(())
}

/// Runs the find command.
pub fn find(store: &dyn RecordStore, field: Field, value: &str) -> Result<(), Box<dyn Error>> {
    let records = query(store, field, value)?;
    if records.is_empty() {
        println!("No records with {field} '{value}'.");
    }
    print_records(&records);
    Ok(())
}

/// Runs the stat command.
pub fn stat(store: &dyn RecordStore) -> Result<(), Box<dyn Error>> {
    let stat = store.get_stat()?;
    println!("{stat}.");
    Ok(())
}

/// Runs the purge command.
pub fn purge(store: &mut dyn RecordStore) -> Result<(), Box<dyn Error>> {
    let total = store.get_stat()?.total;
    let purged = store.purge()?;
    println!("Data file processing is completed: {purged} of {total} records were purged.");
    Ok(())
}

/// Parses `value` for `field` and runs the matching finder.
pub fn query(store: &dyn RecordStore, field: Field, value: &str) -> Result<Vec<Record>, Box<dyn Error>> {
    let found = match field {
        Field::FirstName => store.find_by_first_name(value)?,
        Field::LastName => store.find_by_last_name(value)?,
        Field::DateOfBirth => store.find_by_date_of_birth(parse_date(value)?)?,
        Field::WorkingHours => store.find_by_working_hours(value.trim().parse()?)?,
        Field::AnnualIncome => store.find_by_annual_income(value.trim().parse::<Decimal>()?)?,
        Field::DriverLicenseCategory => {
            let mut chars = value.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(category), None) => store.find_by_driver_category(category)?,
                _ => return Err(format!("category '{value}' must be one character").into()),
            }
        }
    };
    Ok(found.collect())
}

fn print_records(records: &[Record]) {
    for record in records {
        println!("{record}");
    }
}
