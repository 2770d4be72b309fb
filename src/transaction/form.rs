//! The transaction form: parsing the submitted fields and rendering the form.
//!
//! Item fields are submitted as repeated keys (`category_id`, `item_amount`,
//! ...), one value per item row, and are matched up by position.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error,
    client::{ClientName, get_or_create_client},
    date::parse_iso_date,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, BUTTON_DELETE_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, field_error,
    },
    money::Money,
    transaction::{
        NewTransaction, NewTransactionItem, PaymentMethod, Transaction, TransactionItem,
        core::validate_items, db::check_item_references, query::TransactionLookups,
    },
};

const MAX_TEXT_LENGTH: usize = 255;

/// The raw transaction form fields, kept as submitted so the form can be shown
/// again with the user's input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionFormData {
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub description: String,
    /// The ID of an existing client, set by the client picker.
    #[serde(default)]
    pub client_id: String,
    /// The client's name, used to create the client when `client_id` is blank.
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub category_id: Vec<String>,
    #[serde(default)]
    pub item_amount: Vec<String>,
    #[serde(default)]
    pub item_description: Vec<String>,
    #[serde(default)]
    pub member_id: Vec<String>,
    #[serde(default)]
    pub reference_months: Vec<String>,
    #[serde(default)]
    pub vehicle_type: Vec<String>,
}

impl From<&Transaction> for TransactionFormData {
    fn from(transaction: &Transaction) -> Self {
        let items = &transaction.items;
        let column = |value: fn(&TransactionItem) -> String| {
            items.iter().map(value).collect::<Vec<_>>()
        };

        Self {
            transaction_date: transaction.transaction_date.to_string(),
            payment_method: transaction.payment_method.to_string(),
            description: transaction.description.clone().unwrap_or_default(),
            client_id: transaction.client_id.to_string(),
            client_name: transaction.client_name.clone(),
            category_id: column(|item| item.category_id.to_string()),
            item_amount: column(|item| item.item_amount.to_string()),
            item_description: column(|item| item.item_description.clone().unwrap_or_default()),
            member_id: column(|item| {
                item.member_id
                    .map(|member_id| member_id.to_string())
                    .unwrap_or_default()
            }),
            reference_months: column(|item| item.reference_months.clone().unwrap_or_default()),
            vehicle_type: column(|item| item.vehicle_type.clone().unwrap_or_default()),
        }
    }
}

/// The fields of one item row, as submitted.
#[derive(Debug, Default, PartialEq)]
struct ItemRow<'a> {
    category_id: &'a str,
    item_amount: &'a str,
    item_description: &'a str,
    member_id: &'a str,
    reference_months: &'a str,
    vehicle_type: &'a str,
}

impl TransactionFormData {
    /// The number of item rows, zero if no row was submitted.
    fn item_count(&self) -> usize {
        self.category_id.len().max(self.item_amount.len())
    }

    /// Split the repeated item fields into rows.
    ///
    /// Optional fields may be left out entirely, otherwise every field needs
    /// one value per row.
    fn item_rows(&self) -> Result<Vec<ItemRow<'_>>, Error> {
        let count = self.item_count();
        let columns = [
            &self.category_id,
            &self.item_amount,
            &self.item_description,
            &self.member_id,
            &self.reference_months,
            &self.vehicle_type,
        ];

        let is_aligned = |column: &Vec<String>, optional: bool| {
            column.len() == count || (optional && column.is_empty())
        };
        if !columns
            .iter()
            .enumerate()
            .all(|(i, column)| is_aligned(*column, i >= 2))
        {
            return Err(Error::InvalidField {
                field: "items",
                reason: "Every item needs a value for each item field".to_owned(),
            });
        }

        Ok((0..count)
            .map(|i| ItemRow {
                category_id: value_at(&self.category_id, i),
                item_amount: value_at(&self.item_amount, i),
                item_description: value_at(&self.item_description, i),
                member_id: value_at(&self.member_id, i),
                reference_months: value_at(&self.reference_months, i),
                vehicle_type: value_at(&self.vehicle_type, i),
            })
            .collect())
    }

    /// Validate the form and resolve the client into a [NewTransaction].
    ///
    /// A blank `client_id` with a `client_name` selects the client with that
    /// name, creating it if needed. The client is only created after the items
    /// and their categories and members have been checked.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first field that failed, or a
    /// store error if the client could not be created.
    pub fn to_new_transaction(&self, connection: &Connection) -> Result<NewTransaction, Error> {
        let transaction_date =
            parse_iso_date(&self.transaction_date).ok_or_else(|| Error::InvalidField {
                field: "transaction_date",
                reason: "Date must be a date in the format YYYY-MM-DD".to_owned(),
            })?;
        let payment_method: PaymentMethod = self.payment_method.parse()?;
        let description = optional_text("description", "Description", &self.description)?;

        let items = self
            .item_rows()?
            .into_iter()
            .enumerate()
            .map(|(index, row)| parse_item(index, &row))
            .collect::<Result<Vec<_>, _>>()?;
        validate_items(&items)?;

        let client_id = match self.client_id.trim() {
            "" => {
                let name = ClientName::new(&self.client_name).map_err(|_| Error::InvalidField {
                    field: "client_id",
                    reason: "Choose a client or type the name of a new one".to_owned(),
                })?;
                // A new client is only stored once the rest of the form is known to be valid.
                check_item_references(&items, connection)?;
                get_or_create_client(name, connection)?.id
            }
            text => parse_id("client_id", "Client", text)?,
        };

        Ok(NewTransaction {
            transaction_date,
            payment_method,
            description,
            client_id,
            items,
        })
    }
}

fn value_at(column: &[String], index: usize) -> &str {
    column.get(index).map(String::as_str).unwrap_or_default()
}

fn parse_item(index: usize, row: &ItemRow) -> Result<NewTransactionItem, Error> {
    let number = index + 1;

    if row.category_id.trim().is_empty() {
        return Err(Error::InvalidField {
            field: "category_id",
            reason: format!("Item {number} needs a category"),
        });
    }
    let category_id = parse_id("category_id", "Category", row.category_id)?;

    let item_amount: Money = row.item_amount.parse()?;
    if !item_amount.is_positive() {
        return Err(Error::NonPositiveItemAmount {
            index,
            amount: item_amount,
        });
    }

    let member_id = match row.member_id.trim() {
        "" => None,
        text => Some(parse_id("member_id", "Member", text)?),
    };

    Ok(NewTransactionItem {
        category_id,
        item_amount,
        item_description: optional_text("item_description", "Item description", row.item_description)?,
        member_id,
        reference_months: optional_text("reference_months", "Reference months", row.reference_months)?,
        vehicle_type: optional_text("vehicle_type", "Vehicle type", row.vehicle_type)?,
    })
}

fn parse_id(field: &'static str, label: &str, text: &str) -> Result<i64, Error> {
    text.trim().parse().map_err(|_| Error::InvalidField {
        field,
        reason: format!("{label} \"{text}\" is not a valid ID"),
    })
}

fn optional_text(field: &'static str, label: &str, text: &str) -> Result<Option<String>, Error> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(None);
    }

    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(Error::InvalidField {
            field,
            reason: format!("{label} cannot be longer than {MAX_TEXT_LENGTH} characters"),
        });
    }

    Ok(Some(text.to_owned()))
}

/// Where and how the transaction form is submitted.
pub(super) enum TransactionFormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// Render the transaction form.
///
/// A form without item rows gets one empty row. `error` is shown under the
/// field it names, or above the submit button otherwise.
pub(super) fn transaction_form_view(
    action: TransactionFormAction,
    form: &TransactionFormData,
    lookups: &TransactionLookups,
    error: Option<&Error>,
) -> Markup {
    let message = error.map(|error| format!("Error: {error}"));
    let error_field = error.and_then(Error::field);
    let error_for = |fields: &[&str]| {
        message
            .as_deref()
            .filter(|_| error_field.is_some_and(|field| fields.contains(&field)))
    };
    let item_fields = [
        "items",
        "category_id",
        "item_amount",
        "item_description",
        "member_id",
        "reference_months",
        "vehicle_type",
    ];
    let general_error = message.as_deref().filter(|_| {
        !error_field.is_some_and(|field| {
            ["transaction_date", "payment_method", "description", "client_id"].contains(&field)
                || item_fields.contains(&field)
        })
    });

    let (post_url, put_url, submit_text) = match action {
        TransactionFormAction::Create(url) => (Some(url), None, "Save Transaction"),
        TransactionFormAction::Update(url) => (None, Some(url), "Update Transaction"),
    };

    let rows = match form.item_rows() {
        Ok(rows) if !rows.is_empty() => rows,
        _ => vec![ItemRow::default()],
    };

    html! {
        form
            hx-post=[post_url]
            hx-put=[put_url]
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div class="grid grid-cols-1 gap-4 md:grid-cols-2"
            {
                div
                {
                    label for="transaction_date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        id="transaction_date"
                        type="date"
                        name="transaction_date"
                        value=(form.transaction_date)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    (field_error(error_for(&["transaction_date"])))
                }

                div
                {
                    label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment Method" }

                    select
                        id="payment_method"
                        name="payment_method"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "Select" }
                        @for method in PaymentMethod::ALL {
                            option
                                value=(method.label())
                                selected[form.payment_method == method.label()]
                            {
                                (method.label())
                            }
                        }
                    }

                    (field_error(error_for(&["payment_method"])))
                }

                div
                {
                    label for="client_name" class=(FORM_LABEL_STYLE) { "Client" }

                    input type="hidden" name="client_id" value=(form.client_id) data-client-id;

                    input
                        id="client_name"
                        type="text"
                        name="client_name"
                        value=(form.client_name)
                        list="client-options"
                        autocomplete="off"
                        placeholder="Search or type a new client"
                        required
                        data-client-search
                        class=(FORM_TEXT_INPUT_STYLE);

                    datalist id="client-options"
                    {
                        @for client in &lookups.clients {
                            option value=(client.name) data-id=(client.id) {}
                        }
                    }

                    (field_error(error_for(&["client_id", "name"])))
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description (optional)" }

                    input
                        id="description"
                        type="text"
                        name="description"
                        value=(form.description)
                        maxlength="255"
                        class=(FORM_TEXT_INPUT_STYLE);

                    (field_error(error_for(&["description"])))
                }
            }

            section class="space-y-3"
            {
                header class="flex items-center justify-between"
                {
                    h2 class="text-lg font-semibold" { "Items" }

                    button type="button" class=(BUTTON_SECONDARY_STYLE) data-add-item
                    {
                        "Add Item"
                    }
                }

                div id="transaction-items" class="space-y-3"
                {
                    @for row in &rows {
                        (item_row_view(row, lookups))
                    }
                }

                template id="item-row-template"
                {
                    (item_row_view(&ItemRow::default(), lookups))
                }

                (field_error(error_for(&item_fields)))
            }

            (field_error(general_error))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

fn item_row_view(row: &ItemRow, lookups: &TransactionLookups) -> Markup {
    html! {
        fieldset
            class="grid grid-cols-1 gap-3 rounded border border-gray-200 p-3 md:grid-cols-3 dark:border-gray-700"
            data-item-row
        {
            label class=(FORM_LABEL_STYLE)
            {
                "Category"
                select name="category_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select" }
                    @for category in &lookups.categories {
                        option
                            value=(category.id)
                            selected[row.category_id == category.id.to_string()]
                        {
                            (category.name)
                        }
                    }
                }
            }

            label class=(FORM_LABEL_STYLE)
            {
                "Amount"
                input
                    type="number"
                    name="item_amount"
                    value=(row.item_amount)
                    step="0.01"
                    min="0.01"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            label class=(FORM_LABEL_STYLE)
            {
                "Member (optional)"
                select name="member_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "None" }
                    @for member in &lookups.members {
                        option
                            value=(member.id)
                            selected[row.member_id == member.id.to_string()]
                        {
                            (member.name)
                        }
                    }
                }
            }

            label class=(FORM_LABEL_STYLE)
            {
                "Item description (optional)"
                input
                    type="text"
                    name="item_description"
                    value=(row.item_description)
                    maxlength="255"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            label class=(FORM_LABEL_STYLE)
            {
                "Reference months (optional)"
                input
                    type="text"
                    name="reference_months"
                    value=(row.reference_months)
                    placeholder="Jan/2025"
                    maxlength="255"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            label class=(FORM_LABEL_STYLE)
            {
                "Vehicle type (optional)"
                input
                    type="text"
                    name="vehicle_type"
                    value=(row.vehicle_type)
                    maxlength="255"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-3 text-right"
            {
                button type="button" class=(BUTTON_DELETE_STYLE) data-remove-item { "Remove" }
            }
        }
    }
}
