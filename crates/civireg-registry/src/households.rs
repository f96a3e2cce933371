// SPDX-License-Identifier: Apache-2.0

use crate::directory::fetch_resident;
use crate::{like_pattern, next_id, storage_err, Registry};
use civireg_core::RegistryError;
use civireg_model::{
    ClassificationFlags, Household, HouseholdId, HouseholdMember, IncomeBracket, NewHousehold,
    Relationship, ResidentId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;

pub const DEFAULT_PER_PAGE: u64 = 15;
pub const MAX_PER_PAGE: u64 = 100;

const HOUSEHOLD_COLUMNS: &str = "id, household_number, head_resident_id, four_ps_beneficiary, \
     indigent_family, has_senior_citizen, has_pwd_member, monthly_income, income_source, \
     house_type, ownership_status, has_water_supply, has_electricity, has_sanitary_toilet, \
     complete_address";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub four_ps_beneficiary: Option<bool>,
    pub indigent_family: Option<bool>,
    pub has_senior_citizen: Option<bool>,
    pub has_pwd_member: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub per_page: u64,
    pub search: Option<String>,
    pub filters: ListFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseholdSummary {
    pub id: HouseholdId,
    pub household_number: String,
    pub head_resident_id: Option<ResidentId>,
    pub head_name: Option<String>,
    pub member_count: u64,
    #[serde(flatten)]
    pub classification: ClassificationFlags,
    pub complete_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseholdPage {
    pub items: Vec<HouseholdSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HouseholdStatistics {
    pub total_households: u64,
    pub four_ps_beneficiaries: u64,
    pub with_senior_citizens: u64,
    pub indigent_families: u64,
    pub with_pwd_members: u64,
}

/// Where a resident currently sits in the household graph; used to report
/// descriptive conflicts for the uniqueness invariant.
enum Membership {
    Head(String),
    Member(String),
}

impl Registry {
    /// Creates a household, validating the full initial set (exclusivity,
    /// cross-household uniqueness, referential integrity, unique number)
    /// before anything is written. A violation anywhere rejects the whole
    /// creation.
    pub fn create_household(&self, payload: &NewHousehold) -> Result<Household, RegistryError> {
        payload
            .validate()
            .map_err(|e| RegistryError::validation_field(e.field(), e.to_string()))?;
        self.mutate(|tx| {
            let taken: Option<String> = tx
                .query_row(
                    "SELECT id FROM household WHERE household_number = ?1",
                    params![payload.household_number],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_err)?;
            if taken.is_some() {
                return Err(RegistryError::conflict_with(
                    format!("household number '{}' is already taken", payload.household_number),
                    "household_number",
                    &payload.household_number,
                ));
            }
            if let Some(head) = &payload.head_resident_id {
                ensure_unattached(tx, head)?;
            }
            for member in &payload.members {
                ensure_unattached(tx, &member.resident_id)?;
            }

            let id = next_id(tx, "h")?;
            tx.execute(
                "INSERT INTO household (id, household_number, head_resident_id,
                     four_ps_beneficiary, indigent_family, has_senior_citizen, has_pwd_member,
                     monthly_income, income_source, house_type, ownership_status,
                     has_water_supply, has_electricity, has_sanitary_toilet, complete_address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    id,
                    payload.household_number,
                    payload.head_resident_id.as_ref().map(ResidentId::as_str),
                    payload.classification.four_ps_beneficiary,
                    payload.classification.indigent_family,
                    payload.classification.has_senior_citizen,
                    payload.classification.has_pwd_member,
                    payload.monthly_income.map(IncomeBracket::as_str),
                    payload.income_source,
                    payload.house_type,
                    payload.ownership_status,
                    payload.has_water_supply,
                    payload.has_electricity,
                    payload.has_sanitary_toilet,
                    payload.complete_address,
                ],
            )
            .map_err(storage_err)?;
            for member in &payload.members {
                tx.execute(
                    "INSERT INTO household_member (household_id, resident_id, relationship)
                     VALUES (?1, ?2, ?3)",
                    params![id, member.resident_id.as_str(), member.relationship.as_str()],
                )
                .map_err(storage_err)?;
            }
            if let Some(head) = &payload.head_resident_id {
                set_head_flag(tx, head, true)?;
            }
            info!(household_id = %id, household_number = %payload.household_number, "household created");
            let id = HouseholdId::parse(&id).map_err(|e| RegistryError::storage(e.to_string()))?;
            load_household(tx, &id)
        })
    }

    /// Assigns the head, atomically with both `is_household_head` flag
    /// updates. Rejects rather than silently moving a resident who is
    /// already attached anywhere, including this household's member set.
    pub fn assign_head(
        &self,
        household_id: &HouseholdId,
        resident_id: &ResidentId,
    ) -> Result<Household, RegistryError> {
        self.mutate(|tx| {
            let household = load_household(tx, household_id)?;
            fetch_resident(tx, resident_id)?;
            if household
                .members
                .iter()
                .any(|m| &m.resident_id == resident_id)
            {
                return Err(RegistryError::conflict_with(
                    format!(
                        "resident {resident_id} is a member of household {} and cannot also be its head",
                        household.household_number
                    ),
                    "resident_id",
                    resident_id.as_str(),
                ));
            }
            ensure_unattached(tx, resident_id)?;

            if let Some(previous) = &household.head_resident_id {
                set_head_flag(tx, previous, false)?;
            }
            tx.execute(
                "UPDATE household SET head_resident_id = ?2 WHERE id = ?1",
                params![household_id.as_str(), resident_id.as_str()],
            )
            .map_err(storage_err)?;
            set_head_flag(tx, resident_id, true)?;
            info!(household_id = %household_id, resident_id = %resident_id, "head assigned");
            load_household(tx, household_id)
        })
    }

    /// Clears the head and its flag. A household with no head is returned
    /// unchanged; that is a no-op, not an error.
    pub fn remove_head(&self, household_id: &HouseholdId) -> Result<Household, RegistryError> {
        self.mutate(|tx| {
            let household = load_household(tx, household_id)?;
            let Some(head) = &household.head_resident_id else {
                return Ok(household);
            };
            set_head_flag(tx, head, false)?;
            tx.execute(
                "UPDATE household SET head_resident_id = NULL WHERE id = ?1",
                params![household_id.as_str()],
            )
            .map_err(storage_err)?;
            info!(household_id = %household_id, resident_id = %head, "head removed");
            load_household(tx, household_id)
        })
    }

    /// Adds a member. A repeated add is a Conflict, never a silent no-op;
    /// callers change a relationship through `update_member_relationship`.
    pub fn add_member(
        &self,
        household_id: &HouseholdId,
        resident_id: &ResidentId,
        relationship: Relationship,
    ) -> Result<Household, RegistryError> {
        self.mutate(|tx| {
            let household = load_household(tx, household_id)?;
            fetch_resident(tx, resident_id)?;
            if household.head_resident_id.as_ref() == Some(resident_id) {
                return Err(RegistryError::conflict_with(
                    format!(
                        "resident {resident_id} is the head of household {} and cannot also be a member",
                        household.household_number
                    ),
                    "resident_id",
                    resident_id.as_str(),
                ));
            }
            if household
                .members
                .iter()
                .any(|m| &m.resident_id == resident_id)
            {
                return Err(RegistryError::conflict_with(
                    format!(
                        "resident {resident_id} is already a member of household {}",
                        household.household_number
                    ),
                    "resident_id",
                    resident_id.as_str(),
                ));
            }
            ensure_unattached(tx, resident_id)?;
            tx.execute(
                "INSERT INTO household_member (household_id, resident_id, relationship)
                 VALUES (?1, ?2, ?3)",
                params![
                    household_id.as_str(),
                    resident_id.as_str(),
                    relationship.as_str()
                ],
            )
            .map_err(storage_err)?;
            info!(household_id = %household_id, resident_id = %resident_id,
                  relationship = %relationship, "member added");
            load_household(tx, household_id)
        })
    }

    pub fn update_member_relationship(
        &self,
        household_id: &HouseholdId,
        resident_id: &ResidentId,
        relationship: Relationship,
    ) -> Result<Household, RegistryError> {
        self.mutate(|tx| {
            load_household(tx, household_id)?;
            let changed = tx
                .execute(
                    "UPDATE household_member SET relationship = ?3
                     WHERE household_id = ?1 AND resident_id = ?2",
                    params![
                        household_id.as_str(),
                        resident_id.as_str(),
                        relationship.as_str()
                    ],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Err(RegistryError::not_found(
                    "household member",
                    resident_id.as_str(),
                ));
            }
            load_household(tx, household_id)
        })
    }

    pub fn remove_member(
        &self,
        household_id: &HouseholdId,
        resident_id: &ResidentId,
    ) -> Result<Household, RegistryError> {
        self.mutate(|tx| {
            load_household(tx, household_id)?;
            let removed = tx
                .execute(
                    "DELETE FROM household_member
                     WHERE household_id = ?1 AND resident_id = ?2",
                    params![household_id.as_str(), resident_id.as_str()],
                )
                .map_err(storage_err)?;
            if removed == 0 {
                return Err(RegistryError::not_found(
                    "household member",
                    resident_id.as_str(),
                ));
            }
            info!(household_id = %household_id, resident_id = %resident_id, "member removed");
            load_household(tx, household_id)
        })
    }

    /// Deletes an empty household. A remaining head or member is a
    /// Conflict so resident flags are never silently orphaned.
    pub fn delete_household(&self, household_id: &HouseholdId) -> Result<(), RegistryError> {
        self.mutate(|tx| {
            let household = load_household(tx, household_id)?;
            if household.head_resident_id.is_some() || !household.members.is_empty() {
                return Err(RegistryError::conflict_with(
                    format!(
                        "household {} still has a head or members; detach them first",
                        household.household_number
                    ),
                    "household_id",
                    household_id.as_str(),
                ));
            }
            tx.execute(
                "DELETE FROM household WHERE id = ?1",
                params![household_id.as_str()],
            )
            .map_err(storage_err)?;
            info!(household_id = %household_id, "household deleted");
            Ok(())
        })
    }

    pub fn get_household(&self, household_id: &HouseholdId) -> Result<Household, RegistryError> {
        self.read(|conn| load_household(conn, household_id))
    }

    /// Paginated listing. Search matches the household number or the head
    /// resident's name; past-the-end pages return empty items with the
    /// totals intact. Count and items run under one connection lock, so a
    /// page is a consistent snapshot of the table at read time.
    pub fn list_households(&self, params: &ListParams) -> Result<HouseholdPage, RegistryError> {
        let page = params.page.max(1);
        let per_page = params.per_page.clamp(1, MAX_PER_PAGE);

        let mut clauses: Vec<String> = Vec::new();
        let mut bind: Vec<Value> = Vec::new();
        if let Some(term) = params.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                let pattern = like_pattern(term);
                bind.push(Value::Text(pattern));
                let n = bind.len();
                clauses.push(format!(
                    "(lower(h.household_number) LIKE ?{n} ESCAPE '\\'
                      OR lower(coalesce(r.first_name, '')) LIKE ?{n} ESCAPE '\\'
                      OR lower(coalesce(r.last_name, '')) LIKE ?{n} ESCAPE '\\'
                      OR lower(coalesce(r.first_name || ' ' || r.last_name, '')) LIKE ?{n} ESCAPE '\\')"
                ));
            }
        }
        for (column, wanted) in [
            ("four_ps_beneficiary", params.filters.four_ps_beneficiary),
            ("indigent_family", params.filters.indigent_family),
            ("has_senior_citizen", params.filters.has_senior_citizen),
            ("has_pwd_member", params.filters.has_pwd_member),
        ] {
            if let Some(wanted) = wanted {
                bind.push(Value::Integer(i64::from(wanted)));
                clauses.push(format!("h.{column} = ?{}", bind.len()));
            }
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        self.read(|conn| {
            let count_sql = format!(
                "SELECT COUNT(*) FROM household h
                 LEFT JOIN resident r ON r.id = h.head_resident_id {where_sql}"
            );
            let total: i64 = conn
                .query_row(&count_sql, params_from_iter(bind.iter()), |row| row.get(0))
                .map_err(storage_err)?;
            let total = u64::try_from(total).unwrap_or(0);
            let total_pages = total.div_ceil(per_page);

            let offset = (page - 1)
                .saturating_mul(per_page)
                .min(i64::MAX as u64) as i64;
            let mut page_bind = bind.clone();
            page_bind.push(Value::Integer(per_page as i64));
            let limit_pos = page_bind.len();
            page_bind.push(Value::Integer(offset));
            let offset_pos = page_bind.len();
            let items_sql = format!(
                "SELECT h.id, h.household_number, h.head_resident_id,
                        r.first_name, r.middle_name, r.last_name,
                        (SELECT COUNT(*) FROM household_member m WHERE m.household_id = h.id),
                        h.four_ps_beneficiary, h.indigent_family, h.has_senior_citizen,
                        h.has_pwd_member, h.complete_address
                 FROM household h
                 LEFT JOIN resident r ON r.id = h.head_resident_id
                 {where_sql}
                 ORDER BY h.household_number
                 LIMIT ?{limit_pos} OFFSET ?{offset_pos}"
            );
            let mut stmt = conn.prepare_cached(&items_sql).map_err(storage_err)?;
            let rows = stmt
                .query_map(params_from_iter(page_bind.iter()), summary_from_row)
                .map_err(storage_err)?;
            let items = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage_err)?;

            Ok(HouseholdPage {
                items,
                page,
                per_page,
                total,
                total_pages,
            })
        })
    }

    /// Counting aggregates over the caller-set classification flags; never
    /// derived from member resident data.
    pub fn household_statistics(&self) -> Result<HouseholdStatistics, RegistryError> {
        self.read(|conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(four_ps_beneficiary), 0),
                        COALESCE(SUM(has_senior_citizen), 0),
                        COALESCE(SUM(indigent_family), 0),
                        COALESCE(SUM(has_pwd_member), 0)
                 FROM household",
                [],
                |row| {
                    Ok(HouseholdStatistics {
                        total_households: row.get::<_, i64>(0)? as u64,
                        four_ps_beneficiaries: row.get::<_, i64>(1)? as u64,
                        with_senior_citizens: row.get::<_, i64>(2)? as u64,
                        indigent_families: row.get::<_, i64>(3)? as u64,
                        with_pwd_members: row.get::<_, i64>(4)? as u64,
                    })
                },
            )
            .map_err(storage_err)
        })
    }
}

/// Rejects a resident who is already a head or member anywhere. The
/// household graph allows each resident at most one seat (invariant B).
fn ensure_unattached(conn: &Connection, resident_id: &ResidentId) -> Result<(), RegistryError> {
    fetch_resident(conn, resident_id)?;
    match membership_of(conn, resident_id)? {
        None => Ok(()),
        Some(Membership::Head(number)) => Err(RegistryError::conflict_with(
            format!("resident {resident_id} is already the head of household {number}"),
            "resident_id",
            resident_id.as_str(),
        )),
        Some(Membership::Member(number)) => Err(RegistryError::conflict_with(
            format!("resident {resident_id} is already a member of household {number}"),
            "resident_id",
            resident_id.as_str(),
        )),
    }
}

fn membership_of(
    conn: &Connection,
    resident_id: &ResidentId,
) -> Result<Option<Membership>, RegistryError> {
    let head_of: Option<String> = conn
        .query_row(
            "SELECT household_number FROM household WHERE head_resident_id = ?1",
            params![resident_id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_err)?;
    if let Some(number) = head_of {
        return Ok(Some(Membership::Head(number)));
    }
    let member_of: Option<String> = conn
        .query_row(
            "SELECT h.household_number FROM household_member m
             JOIN household h ON h.id = m.household_id
             WHERE m.resident_id = ?1",
            params![resident_id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_err)?;
    Ok(member_of.map(Membership::Member))
}

fn set_head_flag(
    conn: &Connection,
    resident_id: &ResidentId,
    value: bool,
) -> Result<(), RegistryError> {
    conn.execute(
        "UPDATE resident SET is_household_head = ?2 WHERE id = ?1",
        params![resident_id.as_str(), value],
    )
    .map_err(storage_err)?;
    Ok(())
}

pub(crate) fn load_household(
    conn: &Connection,
    household_id: &HouseholdId,
) -> Result<Household, RegistryError> {
    let raw = conn
        .query_row(
            &format!("SELECT {HOUSEHOLD_COLUMNS} FROM household WHERE id = ?1"),
            params![household_id.as_str()],
            raw_household_from_row,
        )
        .optional()
        .map_err(storage_err)?;
    let raw =
        raw.ok_or_else(|| RegistryError::not_found("household", household_id.as_str()))?;
    let mut household = raw.into_household()?;

    let mut stmt = conn
        .prepare_cached(
            "SELECT resident_id, relationship FROM household_member
             WHERE household_id = ?1 ORDER BY resident_id",
        )
        .map_err(storage_err)?;
    let members = stmt
        .query_map(params![household_id.as_str()], |row| {
            let resident_id: String = row.get(0)?;
            let relationship: String = row.get(1)?;
            Ok((resident_id, relationship))
        })
        .map_err(storage_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(storage_err)?;
    for (resident_id, relationship) in members {
        household.members.push(HouseholdMember {
            resident_id: ResidentId::parse(&resident_id)
                .map_err(|e| RegistryError::storage(e.to_string()))?,
            relationship: Relationship::parse(&relationship)
                .map_err(|e| RegistryError::storage(e.to_string()))?,
        });
    }
    Ok(household)
}

struct RawHousehold {
    id: String,
    household_number: String,
    head_resident_id: Option<String>,
    four_ps_beneficiary: i64,
    indigent_family: i64,
    has_senior_citizen: i64,
    has_pwd_member: i64,
    monthly_income: Option<String>,
    income_source: Option<String>,
    house_type: Option<String>,
    ownership_status: Option<String>,
    has_water_supply: i64,
    has_electricity: i64,
    has_sanitary_toilet: i64,
    complete_address: String,
}

impl RawHousehold {
    fn into_household(self) -> Result<Household, RegistryError> {
        let id =
            HouseholdId::parse(&self.id).map_err(|e| RegistryError::storage(e.to_string()))?;
        let head_resident_id = self
            .head_resident_id
            .as_deref()
            .map(ResidentId::parse)
            .transpose()
            .map_err(|e| RegistryError::storage(e.to_string()))?;
        let monthly_income = self
            .monthly_income
            .as_deref()
            .map(IncomeBracket::parse)
            .transpose()
            .map_err(|e| RegistryError::storage(e.to_string()))?;
        Ok(Household {
            id,
            household_number: self.household_number,
            head_resident_id,
            members: Vec::new(),
            classification: ClassificationFlags {
                four_ps_beneficiary: self.four_ps_beneficiary != 0,
                indigent_family: self.indigent_family != 0,
                has_senior_citizen: self.has_senior_citizen != 0,
                has_pwd_member: self.has_pwd_member != 0,
            },
            monthly_income,
            income_source: self.income_source,
            house_type: self.house_type,
            ownership_status: self.ownership_status,
            has_water_supply: self.has_water_supply != 0,
            has_electricity: self.has_electricity != 0,
            has_sanitary_toilet: self.has_sanitary_toilet != 0,
            complete_address: self.complete_address,
        })
    }
}

fn raw_household_from_row(row: &Row<'_>) -> rusqlite::Result<RawHousehold> {
    Ok(RawHousehold {
        id: row.get(0)?,
        household_number: row.get(1)?,
        head_resident_id: row.get(2)?,
        four_ps_beneficiary: row.get(3)?,
        indigent_family: row.get(4)?,
        has_senior_citizen: row.get(5)?,
        has_pwd_member: row.get(6)?,
        monthly_income: row.get(7)?,
        income_source: row.get(8)?,
        house_type: row.get(9)?,
        ownership_status: row.get(10)?,
        has_water_supply: row.get(11)?,
        has_electricity: row.get(12)?,
        has_sanitary_toilet: row.get(13)?,
        complete_address: row.get(14)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<HouseholdSummary> {
    let raw_id: String = row.get(0)?;
    let id = HouseholdId::parse(&raw_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let head: Option<String> = row.get(2)?;
    let head_resident_id = match head.as_deref() {
        Some(raw) => Some(ResidentId::parse(raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    let first: Option<String> = row.get(3)?;
    let middle: Option<String> = row.get(4)?;
    let last: Option<String> = row.get(5)?;
    let head_name = first.zip(last).map(|(first, last)| {
        match middle.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{first} {middle} {last}"),
            None => format!("{first} {last}"),
        }
    });
    Ok(HouseholdSummary {
        id,
        household_number: row.get(1)?,
        head_resident_id,
        head_name,
        member_count: row.get::<_, i64>(6)? as u64,
        classification: ClassificationFlags {
            four_ps_beneficiary: row.get::<_, i64>(7)? != 0,
            indigent_family: row.get::<_, i64>(8)? != 0,
            has_senior_citizen: row.get::<_, i64>(9)? != 0,
            has_pwd_member: row.get::<_, i64>(10)? != 0,
        },
        complete_address: row.get(11)?,
    })
}
