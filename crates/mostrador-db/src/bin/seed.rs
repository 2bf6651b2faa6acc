//! # Seed Data Generator
//!
//! Loads a small demo store for development: the seller, a few customers,
//! a stationery catalog, and opening stock posted as "Compra" movements.
//!
//! ## Usage
//! ```bash
//! cargo run -p mostrador-db --bin seed
//!
//! # Specify database path
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db
//! ```

use std::env;

use anyhow::{bail, Context};
use mostrador_core::{CustomerInput, Money, NewMovement, ProductInput, Seller, TaxRate};
use mostrador_db::{Database, DbConfig};
use serde_json::json;

/// Movement type seeded by the initial migration for purchases.
const COMPRA: i64 = 1;

/// (codigo, nombre, costo, precio, exento, existencias iniciales)
const PRODUCTS: &[(&str, &str, i64, i64, bool, i64)] = &[
    ("P001", "Cuaderno argollado 100 hojas", 1000, 1500, false, 120),
    ("P002", "Lápiz negro No. 2", 300, 600, false, 500),
    ("P003", "Borrador de nata", 250, 500, false, 300),
    ("P004", "Resma papel carta", 14000, 19500, false, 40),
    ("P005", "Cartilla de lectura", 6000, 9000, true, 25),
    ("P006", "Marcador permanente", 1800, 2900, false, 150),
    ("P007", "Tijeras punta roma", 2200, 3800, false, 60),
    ("P008", "Pegante en barra 40g", 1500, 2600, false, 90),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mostrador_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mostrador POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./mostrador_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("Argumento desconocido: {other}"),
        }
        i += 1;
    }

    println!("🌱 Mostrador POS Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("no se pudo abrir la base de datos")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list(false).await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Seller
    db.seller()
        .upsert(&Seller {
            nit: "900123456-7".into(),
            nombre_o_razon_social: "Papelería El Mostrador SAS".into(),
            direccion: "Carrera 43A # 1-50".into(),
            telefono: "6044440000".into(),
            municipio: "Medellín".into(),
            responsabilidad_fiscal: "R-99-PN".into(),
        })
        .await?;
    println!("✓ Seller configured");

    // Customers
    let customers = [
        CustomerInput {
            identificacion: "1017123456".into(),
            tipo: "natural".into(),
            primer_nombre: Some("Ana".into()),
            otros_nombres: Some("María".into()),
            primer_apellido: Some("Gómez".into()),
            segundo_apellido: Some("Restrepo".into()),
            ciudad: Some("Medellín".into()),
            correo: Some("ana.gomez@example.com".into()),
            ..Default::default()
        },
        CustomerInput {
            identificacion: "900373115".into(),
            tipo: "juridico".into(),
            razon_social: Some("Colegio San José SAS".into()),
            direccion: Some("Calle 50 # 45-10".into()),
            ciudad: Some("Envigado".into()),
            telefono: Some("6043330000".into()),
            ..Default::default()
        },
        CustomerInput {
            identificacion: "222222222222".into(),
            tipo: "natural".into(),
            primer_nombre: Some("Consumidor".into()),
            primer_apellido: Some("Final".into()),
            ..Default::default()
        },
    ];
    for input in customers {
        let customer = input.into_customer(None)?;
        db.customers().upsert(&customer).await?;
    }
    println!("✓ 3 customers created");

    // Products
    let mut opening = Vec::with_capacity(PRODUCTS.len());
    for &(codigo, nombre, costo, precio, exento, existencias) in PRODUCTS {
        let product = ProductInput {
            codigo: codigo.into(),
            nombre: nombre.into(),
            costo: Some(Money::from_units(costo)),
            precio: Some(Money::from_units(precio)),
            tasa_iva: Some(TaxRate::DEFAULT_IVA),
            exento,
            ..Default::default()
        }
        .into_product(None)?;
        db.products().create(&product).await?;

        opening.push(NewMovement {
            fecha: None,
            cantidad: json!(existencias),
            codigo_tipo_movimiento: COMPRA,
            codigo_producto: codigo.into(),
            observacion: Some("Inventario inicial".into()),
        });
    }
    println!("✓ {} products created", PRODUCTS.len());

    let posted = db.inventory().post_batch(opening).await?;
    println!("✓ {} opening stock movements posted", posted);

    println!();
    println!("Verifying stock...");
    for &(codigo, _, _, _, _, existencias) in PRODUCTS.iter().take(3) {
        let stock = db.inventory().current_stock(codigo).await?;
        println!("  {}: {} (esperado {})", codigo, stock, existencias);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
