//! Fixed-size slot encoding.
//!
//! Every record occupies exactly [`RECORD_SIZE`] bytes. All integers are
//! little-endian:
//!
//! ```text
//! | status (2) | id (4) | first name (120) | last name (120) |
//! | year (4) | month (4) | day (4) | hours (2) | income (16) | category (2) |
//! ```
//!
//! Names are UTF-8, NUL padded. Income is a .NET `System.Decimal`: three
//! 32-bit words of 96-bit magnitude (lo, mid, hi) followed by a flags word
//! holding the scale in bits 16..24 and the sign in bit 31. The category is a
//! single UTF-16 code unit.

use crate::error::{StoreError, StoreResult};
use crate::record::{ParametersContainer, Record, STATUS_LIVE};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Size of one slot in bytes.
pub const RECORD_SIZE: usize = 278;
/// Size of each fixed-width name field.
pub const NAME_SIZE: usize = 120;
/// Status written while a slot is being filled.
///
/// A slot left with this status by an interrupted write decodes as corrupt.
pub const STATUS_PENDING: i16 = 0x7FFF;

const STATUS_OFFSET: usize = 0;
const ID_OFFSET: usize = 2;
const FIRST_NAME_OFFSET: usize = 6;
const LAST_NAME_OFFSET: usize = FIRST_NAME_OFFSET + NAME_SIZE;
const YEAR_OFFSET: usize = LAST_NAME_OFFSET + NAME_SIZE;
const MONTH_OFFSET: usize = YEAR_OFFSET + 4;
const DAY_OFFSET: usize = MONTH_OFFSET + 4;
const HOURS_OFFSET: usize = DAY_OFFSET + 4;
const INCOME_OFFSET: usize = HOURS_OFFSET + 2;
const CATEGORY_OFFSET: usize = INCOME_OFFSET + 16;

const DECIMAL_SCALE_MASK: u32 = 0x00FF_0000;
const DECIMAL_SIGN_MASK: u32 = 0x8000_0000;
const DECIMAL_MAX_SCALE: u32 = 28;

/// Returns the byte offset of a slot.
#[must_use]
pub const fn slot_offset(slot: u64) -> u64 {
    slot * RECORD_SIZE as u64
}

/// Encodes a record into a slot with the given status word.
///
/// # Errors
///
/// Returns `InvalidArgument` if a name does not fit its field or the
/// category is outside the Basic Multilingual Plane.
pub fn encode(record: &Record, status: i16) -> StoreResult<[u8; RECORD_SIZE]> {
    let mut buf = [0u8; RECORD_SIZE];

    put(&mut buf, STATUS_OFFSET, &status.to_le_bytes());
    put(&mut buf, ID_OFFSET, &record.id().to_le_bytes());
    put_name(&mut buf, FIRST_NAME_OFFSET, record.first_name())?;
    put_name(&mut buf, LAST_NAME_OFFSET, record.last_name())?;

    let date = record.date_of_birth();
    put(&mut buf, YEAR_OFFSET, &date.year().to_le_bytes());
    put(&mut buf, MONTH_OFFSET, &(date.month() as i32).to_le_bytes());
    put(&mut buf, DAY_OFFSET, &(date.day() as i32).to_le_bytes());

    put(&mut buf, HOURS_OFFSET, &record.working_hours_per_week().to_le_bytes());
    put(&mut buf, INCOME_OFFSET, &encode_decimal(record.annual_income()));

    let category = record.driver_license_category();
    let code = u16::try_from(u32::from(category))
        .ok()
        .filter(|_| category.len_utf16() == 1)
        .ok_or_else(|| {
            StoreError::invalid_argument(format!("category '{category}' is not a UTF-16 unit"))
        })?;
    put(&mut buf, CATEGORY_OFFSET, &code.to_le_bytes());

    Ok(buf)
}

/// Reads the status word of a slot.
#[must_use]
pub fn decode_status(bytes: &[u8]) -> Option<i16> {
    (bytes.len() >= 2).then(|| read_i16(bytes, STATUS_OFFSET))
}

/// Decodes one slot.
///
/// Deleted slots decode normally with their status preserved; callers decide
/// whether to surface them.
///
/// # Errors
///
/// Returns `CorruptRecord` if the slot is truncated, was left pending, or
/// holds an impossible field value.
pub fn decode(slot: u64, bytes: &[u8]) -> StoreResult<Record> {
    let corrupt = |reason: &str| StoreError::corrupt_record(slot, reason);

    if bytes.len() != RECORD_SIZE {
        return Err(corrupt(&format!(
            "truncated slot: {} of {RECORD_SIZE} bytes",
            bytes.len()
        )));
    }

    let status = read_i16(bytes, STATUS_OFFSET);
    if status == STATUS_PENDING {
        return Err(corrupt("incomplete write"));
    }

    let id = read_i32(bytes, ID_OFFSET);
    if id < 1 {
        return Err(corrupt(&format!("invalid id {id}")));
    }

    let first_name = read_name(bytes, FIRST_NAME_OFFSET).ok_or_else(|| corrupt("first name is not UTF-8"))?;
    let last_name = read_name(bytes, LAST_NAME_OFFSET).ok_or_else(|| corrupt("last name is not UTF-8"))?;

    let (year, month, day) = (
        read_i32(bytes, YEAR_OFFSET),
        read_i32(bytes, MONTH_OFFSET),
        read_i32(bytes, DAY_OFFSET),
    );
    let date_of_birth = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| corrupt(&format!("invalid date {year}-{month}-{day}")))?;

    let working_hours = read_i16(bytes, HOURS_OFFSET);

    let mut income = [0u8; 16];
    income.copy_from_slice(&bytes[INCOME_OFFSET..INCOME_OFFSET + 16]);
    let annual_income = decode_decimal(&income).ok_or_else(|| corrupt("invalid decimal flags"))?;

    let code = u16::from_le_bytes([bytes[CATEGORY_OFFSET], bytes[CATEGORY_OFFSET + 1]]);
    let category = char::from_u32(u32::from(code))
        .filter(|c| *c != '\0')
        .ok_or_else(|| corrupt(&format!("invalid category code {code:#06x}")))?;

    let params = ParametersContainer::new(
        first_name,
        last_name,
        date_of_birth,
        working_hours,
        annual_income,
        category,
    );
    let record = Record::from_parameters(id, &params);
    Ok(if status == STATUS_LIVE {
        record
    } else {
        record.with_status(status)
    })
}

/// Encodes a decimal in the .NET four-word layout.
#[must_use]
pub fn encode_decimal(value: Decimal) -> [u8; 16] {
    let magnitude = value.mantissa().unsigned_abs();
    let lo = (magnitude & 0xFFFF_FFFF) as u32;
    let mid = ((magnitude >> 32) & 0xFFFF_FFFF) as u32;
    let hi = ((magnitude >> 64) & 0xFFFF_FFFF) as u32;
    let mut flags = (value.scale() << 16) & DECIMAL_SCALE_MASK;
    if value.is_sign_negative() && !value.is_zero() {
        flags |= DECIMAL_SIGN_MASK;
    }

    let mut out = [0u8; 16];
    out[0..4].copy_from_slice(&lo.to_le_bytes());
    out[4..8].copy_from_slice(&mid.to_le_bytes());
    out[8..12].copy_from_slice(&hi.to_le_bytes());
    out[12..16].copy_from_slice(&flags.to_le_bytes());
    out
}

/// Decodes a .NET four-word decimal, rejecting malformed flags.
#[must_use]
pub fn decode_decimal(bytes: &[u8; 16]) -> Option<Decimal> {
    let lo = read_u32(bytes, 0);
    let mid = read_u32(bytes, 4);
    let hi = read_u32(bytes, 8);
    let flags = read_u32(bytes, 12);

    if flags & !(DECIMAL_SCALE_MASK | DECIMAL_SIGN_MASK) != 0 {
        return None;
    }
    let scale = (flags & DECIMAL_SCALE_MASK) >> 16;
    if scale > DECIMAL_MAX_SCALE {
        return None;
    }
    let negative = flags & DECIMAL_SIGN_MASK != 0;
    Some(Decimal::from_parts(lo, mid, hi, negative, scale))
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn put_name(buf: &mut [u8], offset: usize, name: &str) -> StoreResult<()> {
    let bytes = name.as_bytes();
    if bytes.len() > NAME_SIZE {
        return Err(StoreError::invalid_argument(format!(
            "name '{name}' takes {} bytes, the slot holds {NAME_SIZE}",
            bytes.len()
        )));
    }
    put(buf, offset, bytes);
    Ok(())
}

fn read_name(bytes: &[u8], offset: usize) -> Option<String> {
    let field = &bytes[offset..offset + NAME_SIZE];
    let end = field.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
    std::str::from_utf8(&field[..end]).ok().map(str::to_string)
}

fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::STATUS_DELETED;
    use proptest::prelude::*;

    fn petro(id: i32) -> Record {
        Record::from_parameters(
            id,
            &ParametersContainer::new(
                "Petro",
                "Semenov",
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                21,
                Decimal::new(110030, 2),
                'A',
            ),
        )
    }

    #[test]
    fn layout_offsets() {
        assert_eq!(CATEGORY_OFFSET + 2, RECORD_SIZE);
        assert_eq!(YEAR_OFFSET, 246);
        assert_eq!(INCOME_OFFSET, 260);
    }

    #[test]
    fn encode_writes_fields_at_fixed_offsets() {
        let bytes = encode(&petro(7), STATUS_LIVE).unwrap();

        assert_eq!(&bytes[0..2], &[0, 0]);
        assert_eq!(&bytes[2..6], &7i32.to_le_bytes());
        assert_eq!(&bytes[6..11], b"Petro");
        assert!(bytes[11..126].iter().all(|&b| b == 0));
        assert_eq!(&bytes[126..133], b"Semenov");
        assert_eq!(&bytes[246..250], &1990i32.to_le_bytes());
        assert_eq!(&bytes[250..254], &1i32.to_le_bytes());
        assert_eq!(&bytes[254..258], &1i32.to_le_bytes());
        assert_eq!(&bytes[258..260], &21i16.to_le_bytes());
        assert_eq!(&bytes[276..278], &[b'A', 0]);
    }

    #[test]
    fn decimal_matches_dotnet_bits() {
        // decimal.GetBits(1100.30m) == { 110030, 0, 0, 0x00020000 }
        let bytes = encode_decimal(Decimal::new(110030, 2));
        assert_eq!(&bytes[0..4], &110030u32.to_le_bytes());
        assert_eq!(&bytes[4..12], &[0u8; 8]);
        assert_eq!(&bytes[12..16], &0x0002_0000u32.to_le_bytes());

        // decimal.GetBits(-1.5m) == { 15, 0, 0, 0x80010000 }
        let bytes = encode_decimal(Decimal::new(-15, 1));
        assert_eq!(&bytes[12..16], &0x8001_0000u32.to_le_bytes());
        assert_eq!(decode_decimal(&bytes), Some(Decimal::new(-15, 1)));
    }

    #[test]
    fn decimal_uses_all_three_words() {
        let value = Decimal::MAX;
        assert_eq!(decode_decimal(&encode_decimal(value)), Some(value));
    }

    #[test]
    fn decimal_rejects_bad_flags() {
        let mut bytes = encode_decimal(Decimal::ONE);
        bytes[12..16].copy_from_slice(&(29u32 << 16).to_le_bytes());
        assert_eq!(decode_decimal(&bytes), None);

        bytes[12..16].copy_from_slice(&1u32.to_le_bytes());
        assert_eq!(decode_decimal(&bytes), None);
    }

    #[test]
    fn decode_round_trips_and_keeps_status() {
        let record = petro(3);
        let live = decode(0, &encode(&record, STATUS_LIVE).unwrap()).unwrap();
        assert_eq!(live, record);

        let deleted = decode(0, &encode(&record, STATUS_DELETED).unwrap()).unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(deleted.id(), 3);
    }

    #[test]
    fn multibyte_names_survive() {
        let record = Record::from_parameters(
            1,
            &ParametersContainer::new(
                "Олександр",
                "Шевченко",
                NaiveDate::from_ymd_opt(1970, 5, 20).unwrap(),
                40,
                Decimal::from(5000),
                'C',
            ),
        );
        let decoded = decode(0, &encode(&record, STATUS_LIVE).unwrap()).unwrap();
        assert_eq!(decoded.first_name(), "Олександр");
        assert_eq!(decoded.last_name(), "Шевченко");
    }

    #[test]
    fn encode_rejects_oversized_name() {
        let record = Record::from_parameters(
            1,
            &ParametersContainer::new(
                "Ж".repeat(61),
                "Semenov",
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                21,
                Decimal::ONE,
                'A',
            ),
        );
        assert!(matches!(
            encode(&record, STATUS_LIVE),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn decode_rejects_truncated_slot() {
        let bytes = encode(&petro(1), STATUS_LIVE).unwrap();
        let err = decode(4, &bytes[..100]).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { slot: 4, .. }));
    }

    #[test]
    fn decode_rejects_pending_slot() {
        let bytes = encode(&petro(1), STATUS_PENDING).unwrap();
        assert!(matches!(
            decode(0, &bytes),
            Err(StoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn decode_rejects_impossible_date() {
        let mut bytes = encode(&petro(1), STATUS_LIVE).unwrap();
        bytes[MONTH_OFFSET..MONTH_OFFSET + 4].copy_from_slice(&13i32.to_le_bytes());
        assert!(matches!(
            decode(0, &bytes),
            Err(StoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn decode_rejects_zeroed_slot() {
        assert!(decode(0, &[0u8; RECORD_SIZE]).is_err());
    }

    proptest! {
        #[test]
        fn decimal_survives_dotnet_layout(mantissa in any::<i64>(), scale in 0u32..=28) {
            let value = Decimal::new(mantissa, scale);
            prop_assert_eq!(decode_decimal(&encode_decimal(value)), Some(value));
        }

        #[test]
        fn arbitrary_slot_bytes_decode_or_report_corruption(
            bytes in prop::collection::vec(any::<u8>(), RECORD_SIZE),
            slot in 0u64..1000,
        ) {
            match decode(slot, &bytes) {
                Ok(record) => {
                    prop_assert!(record.id() >= 1);
                    prop_assert_ne!(record.status(), STATUS_PENDING);
                }
                Err(StoreError::CorruptRecord { slot: reported, .. }) => {
                    prop_assert_eq!(reported, slot);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
