//! Writes transactions together with their items.
//!
//! Every write runs in one SQL transaction, so a transaction is never stored
//! without its items and its total always matches the items that were written.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    database_id::TransactionId,
    transaction::{NewTransaction, NewTransactionItem, Transaction, TransactionItem},
};

/// Create the transaction and transaction item tables.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            total_amount TEXT NOT NULL,
            transaction_date TEXT NOT NULL,
            payment_method TEXT NOT NULL,
            description TEXT,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            client_id INTEGER NOT NULL REFERENCES client(id) ON DELETE RESTRICT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(transaction_date);
        CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);

        CREATE TABLE IF NOT EXISTS transaction_item (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL REFERENCES \"transaction\"(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE RESTRICT,
            item_amount TEXT NOT NULL,
            item_description TEXT,
            member_id INTEGER REFERENCES member(id) ON DELETE SET NULL,
            reference_months TEXT,
            vehicle_type TEXT,
            deleted_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_item_transaction_id
            ON transaction_item(transaction_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_item_member_id
            ON transaction_item(member_id);",
    )?;

    Ok(())
}

/// Create a transaction and its items, recorded by `user_id`.
///
/// The total amount is the exact sum of the item amounts.
///
/// # Errors
///
/// Returns a validation error if there are no items or an item amount is not
/// positive, and [Error::InvalidUser], [Error::InvalidClient],
/// [Error::InvalidCategory] or [Error::InvalidMember] if a reference does not
/// exist. Nothing is written when an error is returned.
pub fn create_transaction_with_items(
    new_transaction: &NewTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    new_transaction.validate()?;

    let transaction = connection.unchecked_transaction()?;

    if !exists(&transaction, "SELECT 1 FROM user WHERE id = ?1", user_id.as_i64())? {
        return Err(Error::InvalidUser);
    }
    check_references(new_transaction, &transaction)?;

    let now = OffsetDateTime::now_utc();
    transaction.execute(
        "INSERT INTO \"transaction\"
            (total_amount, transaction_date, payment_method, description, user_id, client_id,
             created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        (
            new_transaction.total_amount(),
            new_transaction.transaction_date,
            new_transaction.payment_method,
            &new_transaction.description,
            user_id.as_i64(),
            new_transaction.client_id,
            now,
        ),
    )?;
    let transaction_id = transaction.last_insert_rowid();

    insert_items(transaction_id, &new_transaction.items, &transaction)?;

    let created = get_transaction(transaction_id, &transaction)?;
    transaction.commit()?;

    Ok(created)
}

/// Overwrite a transaction and replace its items with `new_transaction.items`.
///
/// The previous items are soft deleted, not merged with the new ones.
///
/// # Errors
///
/// Returns [Error::UpdateMissingTransaction] if there is no live transaction
/// with `transaction_id`, and otherwise the same errors as
/// [create_transaction_with_items].
pub fn update_transaction_with_items(
    transaction_id: TransactionId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    new_transaction.validate()?;

    let transaction = connection.unchecked_transaction()?;

    check_references(new_transaction, &transaction)?;

    let now = OffsetDateTime::now_utc();
    let rows_affected = transaction.execute(
        "UPDATE \"transaction\"
        SET total_amount = ?1, transaction_date = ?2, payment_method = ?3, description = ?4,
            client_id = ?5, updated_at = ?6
        WHERE id = ?7 AND deleted_at IS NULL",
        (
            new_transaction.total_amount(),
            new_transaction.transaction_date,
            new_transaction.payment_method,
            &new_transaction.description,
            new_transaction.client_id,
            now,
            transaction_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    transaction.execute(
        "UPDATE transaction_item SET deleted_at = ?1
        WHERE transaction_id = ?2 AND deleted_at IS NULL",
        (now, transaction_id),
    )?;
    insert_items(transaction_id, &new_transaction.items, &transaction)?;

    let updated = get_transaction(transaction_id, &transaction)?;
    transaction.commit()?;

    Ok(updated)
}

/// Soft delete a transaction and its items.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if there is no live transaction
/// with `transaction_id`, including one that was already deleted.
pub fn delete_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    let now = OffsetDateTime::now_utc();

    let rows_affected = transaction.execute(
        "UPDATE \"transaction\" SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (now, transaction_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    transaction.execute(
        "UPDATE transaction_item SET deleted_at = ?1
        WHERE transaction_id = ?2 AND deleted_at IS NULL",
        (now, transaction_id),
    )?;

    transaction.commit()?;

    Ok(())
}

/// Retrieve a live transaction with its live items, ordered as they were entered.
pub fn get_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let mut transaction = connection
        .prepare(
            "SELECT t.id, t.total_amount, t.transaction_date, t.payment_method, t.description,
                t.user_id, user.name, t.client_id, client.name, t.created_at, t.updated_at
            FROM \"transaction\" t
            INNER JOIN user ON user.id = t.user_id
            INNER JOIN client ON client.id = t.client_id
            WHERE t.id = :id AND t.deleted_at IS NULL",
        )?
        .query_row(&[(":id", &transaction_id)], map_transaction_row)?;

    transaction.items = connection
        .prepare(
            "SELECT item.id, item.category_id, category.name, item.item_amount,
                item.item_description, item.member_id, member.name, item.reference_months,
                item.vehicle_type
            FROM transaction_item item
            INNER JOIN category ON category.id = item.category_id
            LEFT JOIN member ON member.id = item.member_id AND member.deleted_at IS NULL
            WHERE item.transaction_id = :id AND item.deleted_at IS NULL
            ORDER BY item.id ASC",
        )?
        .query_map(&[(":id", &transaction_id)], map_item_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transaction)
}

fn check_references(new_transaction: &NewTransaction, connection: &Connection) -> Result<(), Error> {
    let client_id = new_transaction.client_id;
    if !exists(connection, "SELECT 1 FROM client WHERE id = ?1", client_id)? {
        return Err(Error::InvalidClient(client_id));
    }

    check_item_references(&new_transaction.items, connection)
}

/// Check that every item's category and member exist.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] or [Error::InvalidMember] for the first
/// item with a reference that does not exist.
pub(super) fn check_item_references(
    items: &[NewTransactionItem],
    connection: &Connection,
) -> Result<(), Error> {
    for item in items {
        if !exists(connection, "SELECT 1 FROM category WHERE id = ?1", item.category_id)? {
            return Err(Error::InvalidCategory(item.category_id));
        }

        let Some(member_id) = item.member_id else {
            continue;
        };

        if !exists(
            connection,
            "SELECT 1 FROM member WHERE id = ?1 AND deleted_at IS NULL",
            member_id,
        )? {
            return Err(Error::InvalidMember(member_id));
        }
    }

    Ok(())
}

fn exists(connection: &Connection, query: &str, id: i64) -> Result<bool, Error> {
    connection
        .prepare_cached(query)?
        .exists((id,))
        .map_err(Error::from)
}

fn insert_items(
    transaction_id: TransactionId,
    items: &[NewTransactionItem],
    connection: &Connection,
) -> Result<(), Error> {
    let mut statement = connection.prepare_cached(
        "INSERT INTO transaction_item
            (transaction_id, category_id, item_amount, item_description, member_id,
             reference_months, vehicle_type)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for item in items {
        statement.execute((
            transaction_id,
            item.category_id,
            item.item_amount,
            &item.item_description,
            item.member_id,
            &item.reference_months,
            &item.vehicle_type,
        ))?;
    }

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        total_amount: row.get(1)?,
        transaction_date: row.get(2)?,
        payment_method: row.get(3)?,
        description: row.get(4)?,
        user_id: UserID::new(row.get(5)?),
        user_name: row.get(6)?,
        client_id: row.get(7)?,
        client_name: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        items: Vec::new(),
    })
}

fn map_item_row(row: &Row) -> Result<TransactionItem, rusqlite::Error> {
    Ok(TransactionItem {
        id: row.get(0)?,
        category_id: row.get(1)?,
        category_name: row.get(2)?,
        item_amount: row.get(3)?,
        item_description: row.get(4)?,
        member_id: row.get(5)?,
        member_name: row.get(6)?,
        reference_months: row.get(7)?,
        vehicle_type: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, UserID,
        client::{ClientName, create_client},
        db::initialize,
        member::{NewMember, create_member, delete_member},
        money::Money,
        transaction::{
            NewTransaction, NewTransactionItem, PaymentMethod, create_transaction_with_items,
            delete_transaction, get_transaction, update_transaction_with_items,
        },
        user::create_user,
    };

    struct Fixture {
        connection: Connection,
        user_id: UserID,
        client_id: i64,
    }

    fn fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user("Operador", "operador@example.com", &connection).unwrap();
        let client = create_client(ClientName::new_unchecked("Acme"), &connection).unwrap();

        Fixture {
            connection,
            user_id: user.id,
            client_id: client.id,
        }
    }

    fn category_id(name: &str, connection: &Connection) -> i64 {
        connection
            .query_row("SELECT id FROM category WHERE name = ?1", (name,), |row| {
                row.get(0)
            })
            .unwrap()
    }

    fn new_transaction(client_id: i64, amounts: &[i64], connection: &Connection) -> NewTransaction {
        let mensalidade = category_id("Mensalidade", connection);

        NewTransaction {
            transaction_date: date!(2025 - 01 - 15),
            payment_method: PaymentMethod::Pix,
            description: Some("Janeiro".to_owned()),
            client_id,
            items: amounts
                .iter()
                .map(|cents| NewTransactionItem::new(mensalidade, Money::from_cents(*cents)))
                .collect(),
        }
    }

    fn count(connection: &Connection, query: &str) -> i64 {
        connection.query_row(query, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn total_is_exact_sum_of_items() {
        let f = fixture();

        let created = create_transaction_with_items(
            &new_transaction(f.client_id, &[1250, 725], &f.connection),
            f.user_id,
            &f.connection,
        )
        .unwrap();

        assert_eq!(created.total_amount, Money::from_cents(1975));
        assert_eq!(created.total_amount.to_string(), "19.75");
        let stored: String = f
            .connection
            .query_row(
                "SELECT total_amount FROM \"transaction\" WHERE id = ?1",
                (created.id,),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, "19.75");
    }

    #[test]
    fn create_then_get_returns_items() {
        let f = fixture();
        let member = create_member(
            &NewMember {
                name: "Ana".to_owned(),
                email: "ana@example.com".to_owned(),
                phone: None,
                join_date: date!(2024 - 01 - 01),
            },
            &f.connection,
        )
        .unwrap();
        let mut input = new_transaction(f.client_id, &[5000, 1500], &f.connection);
        input.items[0].member_id = Some(member.id);
        input.items[0].reference_months = Some("Jan/2025".to_owned());
        input.items[1].vehicle_type = Some("car".to_owned());

        let created = create_transaction_with_items(&input, f.user_id, &f.connection).unwrap();
        let got = get_transaction(created.id, &f.connection).unwrap();

        assert_eq!(got, created);
        assert_eq!(got.user_name, "Operador");
        assert_eq!(got.client_name, "Acme");
        let mut got_items: Vec<(Money, Option<i64>, Option<String>, Option<String>)> = got
            .items
            .into_iter()
            .map(|item| {
                (
                    item.item_amount,
                    item.member_id,
                    item.reference_months,
                    item.vehicle_type,
                )
            })
            .collect();
        let mut want_items: Vec<(Money, Option<i64>, Option<String>, Option<String>)> = input
            .items
            .into_iter()
            .map(|item| {
                (
                    item.item_amount,
                    item.member_id,
                    item.reference_months,
                    item.vehicle_type,
                )
            })
            .collect();
        got_items.sort_by_key(|item| item.0);
        want_items.sort_by_key(|item| item.0);
        assert_eq!(got_items, want_items);
    }

    #[test]
    fn create_without_items_fails_and_writes_nothing() {
        let f = fixture();

        let result = create_transaction_with_items(
            &new_transaction(f.client_id, &[], &f.connection),
            f.user_id,
            &f.connection,
        );

        assert_eq!(result, Err(Error::NoTransactionItems));
        assert_eq!(count(&f.connection, "SELECT COUNT(*) FROM \"transaction\""), 0);
    }

    #[test]
    fn create_with_total_too_large_writes_nothing() {
        let f = fixture();

        let result = create_transaction_with_items(
            &new_transaction(f.client_id, &[9_999_999_999, 9_999_999_999], &f.connection),
            f.user_id,
            &f.connection,
        );

        assert!(matches!(result, Err(Error::TotalAmountTooLarge(_))));
        assert_eq!(count(&f.connection, "SELECT COUNT(*) FROM \"transaction\""), 0);
    }

    #[test]
    fn create_with_unknown_references_fails() {
        let f = fixture();

        let unknown_client = create_transaction_with_items(
            &new_transaction(999, &[100], &f.connection),
            f.user_id,
            &f.connection,
        );
        assert_eq!(unknown_client, Err(Error::InvalidClient(999)));

        let mut input = new_transaction(f.client_id, &[100, 200], &f.connection);
        input.items[1].category_id = 999;
        assert_eq!(
            create_transaction_with_items(&input, f.user_id, &f.connection),
            Err(Error::InvalidCategory(999))
        );

        let mut input = new_transaction(f.client_id, &[100], &f.connection);
        input.items[0].member_id = Some(999);
        assert_eq!(
            create_transaction_with_items(&input, f.user_id, &f.connection),
            Err(Error::InvalidMember(999))
        );

        assert_eq!(
            create_transaction_with_items(
                &new_transaction(f.client_id, &[100], &f.connection),
                UserID::new(999),
                &f.connection
            ),
            Err(Error::InvalidUser)
        );

        assert_eq!(count(&f.connection, "SELECT COUNT(*) FROM \"transaction\""), 0);
        assert_eq!(count(&f.connection, "SELECT COUNT(*) FROM transaction_item"), 0);
    }

    #[test]
    fn update_replaces_items() {
        let f = fixture();
        let created = create_transaction_with_items(
            &new_transaction(f.client_id, &[1000, 2000], &f.connection),
            f.user_id,
            &f.connection,
        )
        .unwrap();
        let bazar = category_id("Bazar", &f.connection);
        let mut changes = new_transaction(f.client_id, &[4550], &f.connection);
        changes.items[0].category_id = bazar;
        changes.payment_method = PaymentMethod::Cash;

        let updated = update_transaction_with_items(created.id, &changes, &f.connection).unwrap();

        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].category_name, "Bazar");
        assert_eq!(updated.total_amount, Money::from_cents(4550));
        assert_eq!(updated.payment_method, PaymentMethod::Cash);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(
            count(
                &f.connection,
                "SELECT COUNT(*) FROM transaction_item WHERE deleted_at IS NULL"
            ),
            1
        );
        assert_eq!(count(&f.connection, "SELECT COUNT(*) FROM transaction_item"), 3);
    }

    #[test]
    fn invalid_update_keeps_existing_items() {
        let f = fixture();
        let created = create_transaction_with_items(
            &new_transaction(f.client_id, &[1000, 2000], &f.connection),
            f.user_id,
            &f.connection,
        )
        .unwrap();
        let mut changes = new_transaction(f.client_id, &[500], &f.connection);
        changes.items[0].category_id = 999;

        let result = update_transaction_with_items(created.id, &changes, &f.connection);

        assert_eq!(result, Err(Error::InvalidCategory(999)));
        assert_eq!(get_transaction(created.id, &f.connection), Ok(created));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let f = fixture();

        let result = update_transaction_with_items(
            42,
            &new_transaction(f.client_id, &[100], &f.connection),
            &f.connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_soft_deletes_transaction_and_items() {
        let f = fixture();
        let created = create_transaction_with_items(
            &new_transaction(f.client_id, &[1000, 2000], &f.connection),
            f.user_id,
            &f.connection,
        )
        .unwrap();

        delete_transaction(created.id, &f.connection).unwrap();

        assert_eq!(get_transaction(created.id, &f.connection), Err(Error::NotFound));
        assert_eq!(
            count(
                &f.connection,
                "SELECT COUNT(*) FROM \"transaction\" WHERE deleted_at IS NOT NULL"
            ),
            1
        );
        assert_eq!(
            count(
                &f.connection,
                "SELECT COUNT(*) FROM transaction_item WHERE deleted_at IS NOT NULL"
            ),
            2
        );
    }

    #[test]
    fn deleting_twice_fails() {
        let f = fixture();
        let created = create_transaction_with_items(
            &new_transaction(f.client_id, &[1000], &f.connection),
            f.user_id,
            &f.connection,
        )
        .unwrap();
        delete_transaction(created.id, &f.connection).unwrap();

        assert_eq!(
            delete_transaction(created.id, &f.connection),
            Err(Error::DeleteMissingTransaction)
        );
        assert_eq!(
            update_transaction_with_items(
                created.id,
                &new_transaction(f.client_id, &[100], &f.connection),
                &f.connection
            ),
            Err(Error::UpdateMissingTransaction)
        );
    }

    #[test]
    fn deleting_member_unlinks_items() {
        let f = fixture();
        let member = create_member(
            &NewMember {
                name: "Ana".to_owned(),
                email: "ana@example.com".to_owned(),
                phone: None,
                join_date: date!(2024 - 01 - 01),
            },
            &f.connection,
        )
        .unwrap();
        let mut input = new_transaction(f.client_id, &[1000], &f.connection);
        input.items[0].member_id = Some(member.id);
        let created = create_transaction_with_items(&input, f.user_id, &f.connection).unwrap();

        let unlinked = delete_member(member.id, &f.connection).unwrap();

        assert_eq!(unlinked, 1);
        let got = get_transaction(created.id, &f.connection).unwrap();
        assert_eq!(got.items.len(), 1);
        assert_eq!(got.items[0].member_id, None);
        assert_eq!(got.total_amount, created.total_amount);
    }
}
