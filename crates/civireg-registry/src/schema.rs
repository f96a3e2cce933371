// SPDX-License-Identifier: Apache-2.0

/// Persisted layout: flat resident table, flat household table with a
/// nullable head reference, and a member join table unique on the
/// (household, resident) pair. The extra unique index on
/// household_member.resident_id is the storage-level backstop for the
/// "member of at most one household" invariant; the engine still checks it
/// first so callers get a Conflict instead of a constraint failure.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS registry_meta (
  key   TEXT PRIMARY KEY,
  value INTEGER NOT NULL
);
INSERT OR IGNORE INTO registry_meta (key, value) VALUES ('next_id', 1);

CREATE TABLE IF NOT EXISTS resident (
  id                TEXT PRIMARY KEY,
  first_name        TEXT NOT NULL,
  last_name         TEXT NOT NULL,
  middle_name       TEXT,
  birth_date        TEXT NOT NULL,
  mobile_number     TEXT,
  landline_number   TEXT,
  email             TEXT,
  complete_address  TEXT NOT NULL,
  is_household_head INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_resident_last_name ON resident(last_name);
CREATE INDEX IF NOT EXISTS idx_resident_names_birth
  ON resident(first_name, last_name, birth_date);

CREATE TABLE IF NOT EXISTS household (
  id                  TEXT PRIMARY KEY,
  household_number    TEXT NOT NULL UNIQUE,
  head_resident_id    TEXT REFERENCES resident(id),
  four_ps_beneficiary INTEGER NOT NULL DEFAULT 0,
  indigent_family     INTEGER NOT NULL DEFAULT 0,
  has_senior_citizen  INTEGER NOT NULL DEFAULT 0,
  has_pwd_member      INTEGER NOT NULL DEFAULT 0,
  monthly_income      TEXT,
  income_source       TEXT,
  house_type          TEXT,
  ownership_status    TEXT,
  has_water_supply    INTEGER NOT NULL DEFAULT 0,
  has_electricity     INTEGER NOT NULL DEFAULT 0,
  has_sanitary_toilet INTEGER NOT NULL DEFAULT 0,
  complete_address    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_household_head ON household(head_resident_id);

CREATE TABLE IF NOT EXISTS household_member (
  household_id TEXT NOT NULL REFERENCES household(id),
  resident_id  TEXT NOT NULL REFERENCES resident(id),
  relationship TEXT NOT NULL,
  PRIMARY KEY (household_id, resident_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_member_single_household
  ON household_member(resident_id);
";
