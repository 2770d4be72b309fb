//! Database queries for members.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    error::is_unique_violation,
    member::{Member, MemberId, MemberOption, NewMember},
    pagination::{Page, empty_page, page_limit, page_offset},
};

/// Create the member table.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS member (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            join_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_member_name ON member(name);",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error, email: &str) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateMemberEmail(email.to_owned())
    } else {
        error.into()
    }
}

/// Create a member and return it with its generated ID and timestamps.
///
/// # Errors
///
/// Returns [Error::DuplicateMemberEmail] if the email is already taken, including
/// by a deleted member.
pub fn create_member(member: &NewMember, connection: &Connection) -> Result<Member, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO member (name, email, phone, join_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            (
                &member.name,
                &member.email,
                &member.phone,
                member.join_date,
                now,
            ),
        )
        .map_err(|error| map_unique_violation(error, &member.email))?;

    Ok(Member {
        id: connection.last_insert_rowid(),
        name: member.name.clone(),
        email: member.email.clone(),
        phone: member.phone.clone(),
        join_date: member.join_date,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a member that has not been deleted.
pub fn get_member(member_id: MemberId, connection: &Connection) -> Result<Member, Error> {
    connection
        .prepare(
            "SELECT id, name, email, phone, join_date, created_at, updated_at
            FROM member
            WHERE id = :id AND deleted_at IS NULL",
        )?
        .query_row(&[(":id", &member_id)], map_row)
        .map_err(|error| error.into())
}

/// Overwrite a member's fields.
///
/// # Errors
///
/// Returns [Error::UpdateMissingMember] if there is no live member with
/// `member_id`, or [Error::DuplicateMemberEmail] if another member has the email.
pub fn update_member(
    member_id: MemberId,
    member: &NewMember,
    connection: &Connection,
) -> Result<Member, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE member
            SET name = ?1, email = ?2, phone = ?3, join_date = ?4, updated_at = ?5
            WHERE id = ?6 AND deleted_at IS NULL",
            (
                &member.name,
                &member.email,
                &member.phone,
                member.join_date,
                OffsetDateTime::now_utc(),
                member_id,
            ),
        )
        .map_err(|error| map_unique_violation(error, &member.email))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingMember);
    }

    get_member(member_id, connection)
}

/// Soft delete a member and unlink it from every transaction item.
///
/// Returns the number of transaction items that referenced the member.
///
/// # Errors
///
/// Returns [Error::DeleteMissingMember] if there is no live member with
/// `member_id`.
pub fn delete_member(member_id: MemberId, connection: &Connection) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction.execute(
        "UPDATE member SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (OffsetDateTime::now_utc(), member_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingMember);
    }

    let unlinked_items = transaction.execute(
        "UPDATE transaction_item SET member_id = NULL WHERE member_id = ?1",
        (member_id,),
    )?;

    transaction.commit()?;

    Ok(unlinked_items)
}

/// Retrieve one page of live members ordered by name.
pub fn get_members_page(
    page: u64,
    page_size: u64,
    connection: &Connection,
) -> Result<Page<Member>, Error> {
    let total_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM member WHERE deleted_at IS NULL",
        [],
        |row| row.get(0),
    )?;

    let offset = match page_offset(page, page_size) {
        Some(offset) if offset < total_count => offset,
        _ => return Ok(empty_page(page, page_size, total_count)),
    };

    let items = connection
        .prepare(
            "SELECT id, name, email, phone, join_date, created_at, updated_at
            FROM member
            WHERE deleted_at IS NULL
            ORDER BY name ASC, id ASC
            LIMIT ?1 OFFSET ?2",
        )?
        .query_map((page_limit(page_size), offset), map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        number: page.max(1),
        size: page_size,
        total_count: total_count.unsigned_abs(),
    })
}

/// The ID and name of every live member, ordered by name.
pub fn get_member_options(connection: &Connection) -> Result<Vec<MemberOption>, Error> {
    connection
        .prepare("SELECT id, name FROM member WHERE deleted_at IS NULL ORDER BY name ASC, id ASC")?
        .query_map([], |row| {
            Ok(MemberOption {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .map(|maybe_option| maybe_option.map_err(Error::from))
        .collect()
}

fn map_row(row: &Row) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        join_date: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
