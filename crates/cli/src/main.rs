//! Tidewater CLI - catalog inspection and order status tools.
//!
//! # Usage
//!
//! ```bash
//! # List the first page of products, cheapest first
//! tw-cli products list --sort price-low
//!
//! # Show a single product
//! tw-cli products show 64b7f0c2e4a1
//!
//! # Mark an order paid / delivered (needs TIDEWATER_API_TOKEN)
//! tw-cli orders pay 65a1c9d2f00b1234 --email shopper@example.com
//! tw-cli orders deliver 65a1c9d2f00b1234
//!
//! # Show what the storefront would charge for a subtotal
//! tw-cli quote 42.50
//! ```
//!
//! # Commands
//!
//! - `products` - Read the catalog through the storefront's API client
//! - `orders` - Status mutations no storefront page exposes
//! - `quote` - Shipping, tax and total for a subtotal

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tidewater CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Update order status
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Price a subtotal the way checkout does
    Quote {
        /// Items subtotal in dollars, e.g. `42.50`
        subtotal: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one catalog page
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Page size (12, 24, 48 or 96)
        #[arg(short, long, default_value_t = 12)]
        limit: u32,

        /// Category to filter on
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order (`featured`, `newest`, `price-low`, `price-high`, `rating`)
        #[arg(short, long, default_value = "featured")]
        sort: String,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Mark an order paid
    Pay {
        /// Order id
        id: String,

        /// Payer email recorded with the payment result
        #[arg(short, long)]
        email: String,

        /// Payment reference (generated when omitted)
        #[arg(long)]
        reference: Option<String>,
    },
    /// Mark an order delivered
    Deliver {
        /// Order id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                page,
                limit,
                category,
                sort,
            } => commands::products::list(page, limit, category.as_deref(), &sort).await?,
            ProductsAction::Show { id } => commands::products::show(&id).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Pay {
                id,
                email,
                reference,
            } => commands::orders::pay(&id, &email, reference).await?,
            OrdersAction::Deliver { id } => commands::orders::deliver(&id).await?,
        },
        Commands::Quote { subtotal } => commands::quote::run(&subtotal)?,
    }
    Ok(())
}
