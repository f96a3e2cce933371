// SPDX-License-Identifier: Apache-2.0

use crate::{like_pattern, next_id, storage_err, Registry};
use civireg_core::RegistryError;
use civireg_model::{NewResident, Resident, ResidentId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

/// Fixed cap on directory search results.
pub const SEARCH_PAGE_SIZE: usize = 20;

/// Minimum query length; shorter terms return empty without touching the
/// store.
pub const MIN_SEARCH_LEN: usize = 2;

const RESIDENT_COLUMNS: &str = "id, first_name, last_name, middle_name, birth_date, \
     mobile_number, landline_number, email, complete_address, is_household_head";

impl Registry {
    /// Case-insensitive OR match over names, address, mobile and email.
    pub fn search_residents(&self, term: &str) -> Result<Vec<Resident>, RegistryError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let pattern = like_pattern(term);
        self.read(|conn| {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {RESIDENT_COLUMNS} FROM resident
                     WHERE lower(first_name) LIKE ?1 ESCAPE '\\'
                        OR lower(last_name) LIKE ?1 ESCAPE '\\'
                        OR lower(coalesce(middle_name, '')) LIKE ?1 ESCAPE '\\'
                        OR lower(complete_address) LIKE ?1 ESCAPE '\\'
                        OR lower(coalesce(mobile_number, '')) LIKE ?1 ESCAPE '\\'
                        OR lower(coalesce(email, '')) LIKE ?1 ESCAPE '\\'
                     ORDER BY last_name, first_name, id
                     LIMIT ?2"
                ))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![pattern, SEARCH_PAGE_SIZE as i64], resident_from_row)
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn get_resident(&self, id: &ResidentId) -> Result<Resident, RegistryError> {
        self.read(|conn| fetch_resident(conn, id))
    }

    /// Advisory duplicate probe: conjunction of case-insensitive name
    /// equality and exact birth date. Never blocks a write.
    pub fn find_potential_duplicates(
        &self,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
    ) -> Result<Vec<Resident>, RegistryError> {
        self.read(|conn| {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {RESIDENT_COLUMNS} FROM resident
                     WHERE lower(first_name) = lower(?1)
                       AND lower(last_name) = lower(?2)
                       AND birth_date = ?3
                     ORDER BY id"
                ))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params![first_name, last_name, birth_date], resident_from_row)
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn create_resident(&self, intake: &NewResident) -> Result<Resident, RegistryError> {
        intake
            .validate()
            .map_err(|e| RegistryError::validation_field(e.field(), e.to_string()))?;
        self.mutate(|tx| {
            let id = next_id(tx, "r")?;
            tx.execute(
                "INSERT INTO resident (id, first_name, last_name, middle_name, birth_date,
                     mobile_number, landline_number, email, complete_address, is_household_head)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
                params![
                    id,
                    intake.first_name,
                    intake.last_name,
                    intake.middle_name,
                    intake.birth_date,
                    intake.mobile_number,
                    intake.landline_number,
                    intake.email,
                    intake.complete_address,
                ],
            )
            .map_err(storage_err)?;
            info!(resident_id = %id, "resident created");
            let id = ResidentId::parse(&id)
                .map_err(|e| RegistryError::storage(e.to_string()))?;
            fetch_resident(tx, &id)
        })
    }

    /// Replaces the intake-owned fields; `is_household_head` stays as the
    /// membership engine last set it.
    pub fn update_resident(
        &self,
        id: &ResidentId,
        intake: &NewResident,
    ) -> Result<Resident, RegistryError> {
        intake
            .validate()
            .map_err(|e| RegistryError::validation_field(e.field(), e.to_string()))?;
        self.mutate(|tx| {
            let changed = tx
                .execute(
                    "UPDATE resident SET first_name = ?2, last_name = ?3, middle_name = ?4,
                         birth_date = ?5, mobile_number = ?6, landline_number = ?7,
                         email = ?8, complete_address = ?9
                     WHERE id = ?1",
                    params![
                        id.as_str(),
                        intake.first_name,
                        intake.last_name,
                        intake.middle_name,
                        intake.birth_date,
                        intake.mobile_number,
                        intake.landline_number,
                        intake.email,
                        intake.complete_address,
                    ],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Err(RegistryError::not_found("resident", id.as_str()));
            }
            fetch_resident(tx, id)
        })
    }
}

pub(crate) fn fetch_resident(
    conn: &Connection,
    id: &ResidentId,
) -> Result<Resident, RegistryError> {
    conn.query_row(
        &format!("SELECT {RESIDENT_COLUMNS} FROM resident WHERE id = ?1"),
        params![id.as_str()],
        resident_from_row,
    )
    .optional()
    .map_err(storage_err)?
    .ok_or_else(|| RegistryError::not_found("resident", id.as_str()))
}

pub(crate) fn resident_from_row(row: &Row<'_>) -> rusqlite::Result<Resident> {
    let raw_id: String = row.get(0)?;
    let id = ResidentId::parse(&raw_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Resident {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        middle_name: row.get(3)?,
        birth_date: row.get(4)?,
        mobile_number: row.get(5)?,
        landline_number: row.get(6)?,
        email: row.get(7)?,
        complete_address: row.get(8)?,
        is_household_head: row.get::<_, i64>(9)? != 0,
    })
}
