pub mod price_record;
pub mod response;

pub use price_record::PriceRecord;
pub use response::{EodResponse, Pagination};
