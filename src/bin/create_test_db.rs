use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use bookkeeper_rs::{
    Category, ClientName, Money, NewMember, NewTransaction, NewTransactionItem, PaymentMethod,
    create_member, create_transaction_with_items, get_all_categories, get_or_create_client,
    get_or_create_user, initialize_db,
};

/// A utility for creating a test database for the bookkeeper_rs server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const MEMBER_NAMES: [&str; 10] = [
    "Ana Souza",
    "Bruno Lima",
    "Carla Mendes",
    "Daniel Rocha",
    "Elisa Ferreira",
    "Fábio Costa",
    "Gabriela Alves",
    "Heitor Ribeiro",
    "Isabela Martins",
    "João Pereira",
];

const CLIENT_NAMES: [&str; 4] = [
    "Padaria Central",
    "Livraria Aurora",
    "Oficina do Zé",
    "Visitante",
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating operator user...");
    let operator = get_or_create_user("Operador", "operador@localhost.localdomain", &connection)?;

    let today = OffsetDateTime::now_utc().date();

    println!("Creating members...");
    let mut member_ids = Vec::with_capacity(MEMBER_NAMES.len());
    for (index, name) in MEMBER_NAMES.into_iter().enumerate() {
        let first_name = name.split(' ').next().unwrap_or(name).to_lowercase();
        let member = create_member(
            &NewMember {
                name: name.to_owned(),
                email: format!("{first_name}.{index}@example.com"),
                phone: (index % 3 != 0).then(|| format!("+55 11 9{index:04}-{index:04}")),
                join_date: days_before(today, 30 * (index as i64 + 1)),
            },
            &connection,
        )?;
        member_ids.push(member.id);
    }

    println!("Creating clients...");
    let mut client_ids = Vec::with_capacity(CLIENT_NAMES.len());
    for name in CLIENT_NAMES {
        let client = get_or_create_client(ClientName::new(name)?, &connection)?;
        client_ids.push(client.id);
    }

    println!("Creating transactions...");
    let categories = get_all_categories(&connection)?;
    let membership_fee = find_category(&categories, "Mensalidade")?;
    let parking = find_category(&categories, "Estacionamento")?;
    let bazaar = find_category(&categories, "Bazar")?;
    let payment = find_category(&categories, "Pagamento")?;

    for (index, member_id) in member_ids.iter().enumerate() {
        let mut membership = NewTransactionItem::new(membership_fee, Money::from_cents(5000))
            .member_id(Some(*member_id));
        membership.reference_months = Some("01/2025".to_owned());

        let mut items = vec![membership];
        if index % 2 == 0 {
            let mut parking_item = NewTransactionItem::new(parking, Money::from_cents(1500))
                .member_id(Some(*member_id));
            parking_item.vehicle_type = Some("Carro".to_owned());
            items.push(parking_item);
        }

        create_transaction_with_items(
            &NewTransaction {
                transaction_date: days_before(today, index as i64),
                payment_method: PaymentMethod::ALL[index % PaymentMethod::ALL.len()],
                description: None,
                client_id: client_ids[index % client_ids.len()],
                items,
            },
            operator.id,
            &connection,
        )?;
    }

    let mut bazaar_item = NewTransactionItem::new(bazaar, Money::from_cents(12_345));
    bazaar_item.item_description = Some("Venda de roupas".to_owned());
    create_transaction_with_items(
        &NewTransaction {
            transaction_date: today,
            payment_method: PaymentMethod::Cash,
            description: Some("Bazar de domingo".to_owned()),
            client_id: client_ids[3],
            items: vec![bazaar_item],
        },
        operator.id,
        &connection,
    )?;

    let mut repair = NewTransactionItem::new(payment, Money::from_cents(30_000));
    repair.item_description = Some("Conserto do portão".to_owned());
    create_transaction_with_items(
        &NewTransaction {
            transaction_date: days_before(today, 3),
            payment_method: PaymentMethod::Pix,
            description: Some("Manutenção".to_owned()),
            client_id: client_ids[2],
            items: vec![repair],
        },
        operator.id,
        &connection,
    )?;

    println!("Success!");

    Ok(())
}

fn days_before(date: Date, days: i64) -> Date {
    date.checked_sub(Duration::days(days)).unwrap_or(date)
}

fn find_category(categories: &[Category], name: &str) -> Result<i64, String> {
    categories
        .iter()
        .find(|category| category.name == name)
        .map(|category| category.id)
        .ok_or_else(|| format!("the category {name} was not seeded"))
}
