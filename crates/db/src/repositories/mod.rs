//! Repository abstractions for data access.

pub mod comprobante;
pub mod emission;
pub mod ledger;
pub mod sale;

pub use comprobante::ComprobanteRepository;
pub use emission::EmissionCoordinator;
pub use ledger::LedgerQuery;
pub use sale::SaleRepository;
