use std::error::Error;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use booking_server::cache::CachedGateway;
use booking_server::carrier::{CarrierClient, CarrierGateway, LabelStore, MockCarrier};
use booking_server::config::ServerConfig;
use booking_server::store::{
    SqliteAddressBook, SqliteBookingStore, SqliteCustomerDirectory, SqliteQuotationStore, connect,
    migrate,
};
use booking_server::web::{AppState, create_router};
use booking_server::workflow::{BookingStores, BookingWorkflow, QuotationWorkflow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let pool = connect(&config.database_url, config.database_max_connections).await?;
    migrate(&pool).await?;

    let labels = LabelStore::new(config.label_dir.clone());
    tokio::fs::create_dir_all(labels.dir()).await?;

    let gateway: Arc<dyn CarrierGateway> = if config.mock_carrier {
        warn!("CARRIER_MOCK set, carrier calls are answered locally");
        Arc::new(MockCarrier::new())
    } else {
        let client = CarrierClient::new(config.carrier.clone(), labels)?;
        Arc::new(CachedGateway::new(Arc::new(client), &config.token_cache))
    };

    let quotations = Arc::new(SqliteQuotationStore::new(pool.clone()));
    let stores = BookingStores {
        bookings: Arc::new(SqliteBookingStore::new(pool.clone())),
        quotations: quotations.clone(),
        customers: Arc::new(SqliteCustomerDirectory::new(pool.clone())),
        address_book: Arc::new(SqliteAddressBook::new(pool)),
    };

    let state = AppState::new(
        QuotationWorkflow::new(gateway.clone(), quotations, config.account.clone()),
        BookingWorkflow::new(gateway, stores, config.account.clone()),
    );
    let app = create_router(state, &config.label_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, carrier = %config.carrier.base_url, "booking server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
